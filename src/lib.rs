//! Cyber Arcade - simulation core for an arcade-style first-person game
//!
//! Core modules:
//! - `sim`: Entity lifecycle, hit-groups, height-field terrain and body physics
//! - `renderer`: Read-only sprite snapshot handed to the GPU side after a step
//! - `settings`: Data-driven run configuration

pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

/// Simulation constants
pub mod consts {
    /// Gravitational acceleration along z (units/s²)
    pub const GRAVITY: f32 = -10.0;
    /// Speed cap applied before every collision phase (units/s)
    pub const MAX_VELOCITY: f32 = 8.0;
    /// Tallest ledge a stepping body climbs without treating it as a wall
    pub const STEP_HEIGHT: f32 = 0.3;
    /// Reach tolerance for bodies that cannot step
    pub const FLOOR_TOLERANCE: f32 = 0.1;
    /// Largest frame delta the clock hands to the stepper (seconds)
    pub const MAX_FRAME_DT: f32 = 0.25;
    /// Number of hit-group buckets
    pub const HIT_GROUP_COUNT: usize = 5;
}
