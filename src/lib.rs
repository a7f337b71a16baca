//! quadsim library.
//!
//! A small 2D rigid-body simulator for quads and ellipses living in a
//! renderer's scene, plus a headless demo match that drives it. Exposed as a
//! library for integration tests and embedding hosts.

pub mod components;
pub mod game;
pub mod math;
pub mod resources;
pub mod systems;
