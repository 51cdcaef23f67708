//! Draw contract between entities and the host renderer
//!
//! The runtime never owns a graphics context. The host hands a [`Surface`] to
//! [`RenderSystem::draw_all`] once per frame, and every [`Renderable`]
//! capability draws itself onto it.

use glam::Vec2;
use kestrel_ecs::{Capabilities, Component, EntityManager};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::physical::Transform;

/// Whatever the host draws into.
pub trait Surface {
    fn draw_texture(
        &mut self,
        texture: &str,
        position: Vec2,
        rotation: f32,
        origin: Vec2,
        scale: Vec2,
    );
}

/// Anything that can draw itself.
pub trait Renderable: Send + Sync {
    fn draw(&self, surface: &mut dyn Surface, delta: f32);

    /// Follow the entity's transform. Called before every draw.
    fn set_placement(&mut self, _position: Vec2, _rotation: f32) {}
}

/// A single textured quad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub texture: String,
    pub position: Vec2,
    pub rotation: f32,
    pub origin: Vec2,
    pub scale: Vec2,
    pub visible: bool,
}

impl Sprite {
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            texture: texture.into(),
            position: Vec2::ZERO,
            rotation: 0.0,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            visible: true,
        }
    }
}

impl Renderable for Sprite {
    fn draw(&self, surface: &mut dyn Surface, _delta: f32) {
        if self.visible {
            surface.draw_texture(
                &self.texture,
                self.position,
                self.rotation,
                self.origin,
                self.scale,
            );
        }
    }

    fn set_placement(&mut self, position: Vec2, rotation: f32) {
        self.position = position;
        self.rotation = rotation;
    }
}

impl Component for Sprite {
    fn capabilities(caps: &mut Capabilities<Self>) {
        caps.provide::<dyn Renderable>(|s| s, |s| s);
    }
}

/// Draws every live entity that provides [`Renderable`], in registry order.
#[derive(Debug, Default)]
pub struct RenderSystem {
    frames: u64,
}

impl RenderSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one frame. Returns how many renderables were drawn.
    pub fn draw_all(
        &mut self,
        entities: &mut EntityManager,
        surface: &mut dyn Surface,
        delta: f32,
    ) -> usize {
        let mut drawn = 0;
        for index in 0..entities.len() {
            let entity = entities.entities()[index];
            let Some(data) = entities.get_mut(entity) else {
                continue;
            };
            let components = data.components_mut();
            let placement = components
                .get_component::<dyn Transform>()
                .map(|t| (t.position(), t.rotation()));
            let Some(renderable) = components.get_component_mut::<dyn Renderable>() else {
                continue;
            };
            if let Some((position, rotation)) = placement {
                renderable.set_placement(position, rotation);
            }
            renderable.draw(surface, delta);
            drawn += 1;
        }
        self.frames += 1;
        trace!(frame = self.frames, drawn, "Frame drawn");
        drawn
    }

    /// Number of frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physical::Particle;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(String, Vec2, f32)>,
    }

    impl Surface for Recorder {
        fn draw_texture(
            &mut self,
            texture: &str,
            position: Vec2,
            rotation: f32,
            _origin: Vec2,
            _scale: Vec2,
        ) {
            self.calls.push((texture.to_string(), position, rotation));
        }
    }

    #[test]
    fn draws_renderables_at_their_transform() {
        let mut entities = EntityManager::new();
        let ship = entities.spawn("ship", "", "");
        {
            let components = entities.get_mut(ship).unwrap().components_mut();
            components.add_component(Particle::new(Vec2::new(3.0, 4.0), 1.5));
            components.add_component(Sprite::new("ship.png"));
        }
        let decal = entities.spawn("decal", "", "");
        entities
            .get_mut(decal)
            .unwrap()
            .components_mut()
            .add_component(Sprite::new("decal.png"));
        entities.spawn("invisible", "", "");

        let mut surface = Recorder::default();
        let mut system = RenderSystem::new();
        assert_eq!(system.draw_all(&mut entities, &mut surface, 0.016), 2);
        assert_eq!(
            surface.calls,
            vec![
                ("ship.png".to_string(), Vec2::new(3.0, 4.0), 1.5),
                ("decal.png".to_string(), Vec2::ZERO, 0.0),
            ]
        );
        assert_eq!(system.frames(), 1);
    }

    #[test]
    fn hidden_sprites_are_skipped() {
        let mut sprite = Sprite::new("ghost.png");
        sprite.visible = false;
        let mut surface = Recorder::default();
        sprite.draw(&mut surface, 0.016);
        assert!(surface.calls.is_empty());
    }
}
