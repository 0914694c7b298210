//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - The caller supplies every frame delta
//! - Seeded RNG only
//! - Stable iteration order (live list order, children pre-order)
//! - No rendering or platform dependencies

pub mod actors;
pub mod body;
pub mod clock;
pub mod entity;
pub mod groups;
pub mod terrain;
pub mod trace;
pub mod world;

pub use actors::{Brain, Chaff, Face, Projectile, Swarm, Walker};
pub use body::PhysicsBody;
pub use clock::FrameClock;
pub use entity::{Actor, Behavior, Entity, EntityId, Inert, Sprite, pack_color};
pub use groups::{GroupMask, HitGroup, HitGroups};
pub use terrain::{HeightField, TerrainError, cell_of, cells_covering};
pub use trace::trace_sphere;
pub use world::{Scene, StepContext, World};
