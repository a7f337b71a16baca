//! Data types attached to scene entities and simulated bodies.
//!
//! Submodules overview:
//! - [`entity`] – renderable scene entity with its world matrix, plus draw layer
//! - [`simbody`] – simulated body state (position, velocity, force list)
//! - [`collision`] – unordered pair keys and the collision responder interface

pub mod collision;
pub mod entity;
pub mod simbody;
