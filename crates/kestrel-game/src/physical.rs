//! Physical capabilities and the particle component
//!
//! `Transform` and `Velocity` are capabilities: any component may provide them,
//! and systems look them up as `dyn Transform` / `dyn Velocity` without caring
//! which concrete component sits behind the lookup.

use glam::Vec2;
use kestrel_ecs::{Attach, Capabilities, Component};
use serde::{Deserialize, Serialize};

/// Placement of an entity in the world.
pub trait Transform: Send + Sync {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);

    /// Rotation in radians.
    fn rotation(&self) -> f32;
    fn set_rotation(&mut self, rotation: f32);

    /// Pivot for rotation and drawing, relative to the position.
    fn origin(&self) -> Vec2 {
        Vec2::ZERO
    }
}

/// Rate of change of a [`Transform`].
pub trait Velocity: Send + Sync {
    fn linear_velocity(&self) -> Vec2;
    fn set_linear_velocity(&mut self, velocity: Vec2);

    /// Angular velocity in radians per second.
    fn angular_velocity(&self) -> f32;
    fn set_angular_velocity(&mut self, velocity: f32);
}

/// A point body with no collision shape. Provides both [`Transform`] and
/// [`Velocity`] and claims both lookups when attached.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec2,
    pub rotation: f32,
    pub origin: Vec2,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
}

impl Particle {
    /// A particle at rest.
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_velocity(mut self, linear: Vec2, angular: f32) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }
}

impl Transform for Particle {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn rotation(&self) -> f32 {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    fn origin(&self) -> Vec2 {
        self.origin
    }
}

impl Velocity for Particle {
    fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.linear_velocity = velocity;
    }

    fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, velocity: f32) {
        self.angular_velocity = velocity;
    }
}

impl Component for Particle {
    fn capabilities(caps: &mut Capabilities<Self>) {
        caps.provide::<dyn Transform>(|p| p, |p| p)
            .provide::<dyn Velocity>(|p| p, |p| p);
    }

    fn on_add(&mut self, attach: &mut Attach<'_>) {
        attach.register_as::<dyn Transform>();
        attach.register_as::<dyn Velocity>();
    }
}
