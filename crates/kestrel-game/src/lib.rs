//! Kestrel Game - Stock components and systems
//!
//! Provides 2D transform and velocity capabilities, particles, health,
//! interval spawners, and the movement, removal and render systems built on them.

pub mod health;
pub mod movement;
pub mod physical;
pub mod removal;
pub mod render;
pub mod spawner;

pub use health::{apply_damage, Health, HealthEvent};
pub use movement::MovementSystem;
pub use physical::{Particle, Transform, Velocity};
pub use removal::{EntityRemovalSystem, REMOVAL_THRESHOLD};
pub use render::{RenderSystem, Renderable, Sprite, Surface};
pub use spawner::{
    spawner_system, EntitySpawner, EntitySpawnerSystem, SpawnEmitter, MAX_SPAWNS_PER_FRAME,
};
