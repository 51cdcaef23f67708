//! Kestrel Core - Core types and utilities for the Kestrel runtime
//!
//! This crate provides the foundational types used throughout the runtime:
//! - 2D math primitives (re-exported from glam)
//! - Axis-aligned world bounds
//! - Frame time tracking fed to the scheduler and systems
//! - Configuration loading errors

pub mod config;
pub mod time;
pub mod types;

pub use config::{load_toml, ConfigError};
pub use glam::Vec2;
pub use time::{GameTime, TimeConfig};
pub use types::Bounds;
