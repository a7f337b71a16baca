//! Math primitives shared by the scene and the simulator.
//!
//! Vectors and matrices come from [`glam`] (column-major, like the GPU side
//! expects). This module adds what glam does not carry:
//! - [`aabb`] – axis-aligned box with containment and overlap tests
//! - [`matrix`] – fixed-offset accessors into an entity's world matrix

pub mod aabb;
pub mod matrix;

pub use aabb::Aabb;
pub use glam::{Mat2, Mat3, Mat4, Vec2};
