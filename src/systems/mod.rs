//! Engine systems.
//!
//! Submodules overview
//! - [`simulator`] – body registry, force/velocity integration, position
//!   write-back and brute-force pairwise collision dispatch
//! - [`response`] – built-in collision responders (quad/quad, quad/ellipse,
//!   ellipse/ellipse)

pub mod response;
pub mod simulator;
