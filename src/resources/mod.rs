//! Long-lived state the simulator and the demo match depend on.
//!
//! Overview
//! - `clock` – microsecond clocks (wall clock and hand-driven)
//! - `gameconfig` – INI-backed tuning for the demo match
//! - `scene` – ECS-backed entity storage and the `EntityStore` interface
pub mod clock;
pub mod gameconfig;
pub mod scene;
