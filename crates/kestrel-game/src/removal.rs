use kestrel_core::Bounds;
use kestrel_ecs::{Entity, EntityData, EntitySystem, SystemContext};
use tracing::trace;

use crate::physical::Transform;

/// How far outside the world an entity may travel before it is deleted.
/// Positions describe centers, so the margin keeps large sprites from vanishing
/// while still on screen.
pub const REMOVAL_THRESHOLD: f32 = 200.0;

/// Deletes entities whose transform has left the padded world bounds.
#[derive(Debug, Clone)]
pub struct EntityRemovalSystem {
    bounds: Bounds,
}

impl EntityRemovalSystem {
    /// Remove entities outside `world` padded by [`REMOVAL_THRESHOLD`].
    pub fn new(world: Bounds) -> Self {
        Self::with_padding(world, REMOVAL_THRESHOLD)
    }

    pub fn with_padding(world: Bounds, padding: f32) -> Self {
        Self {
            bounds: world.padded(padding),
        }
    }

    /// The padded removal area.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl EntitySystem for EntityRemovalSystem {
    fn can_process(&self, data: &EntityData) -> bool {
        data.components().has_component::<dyn Transform>()
    }

    fn process(&mut self, entity: Entity, data: &mut EntityData, _ctx: &mut SystemContext<'_>) {
        let Some(transform) = data.components().get_component::<dyn Transform>() else {
            return;
        };
        let position = transform.position();
        if !self.bounds.contains(position) && !data.is_deleted() {
            trace!(%entity, x = position.x, y = position.y, "Entity left the world");
            data.delete();
        }
    }

    fn name(&self) -> &str {
        "entity_removal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use kestrel_ecs::{EntityManager, SystemSchedule};

    use crate::physical::Particle;

    fn spawn_at(entities: &mut EntityManager, position: Vec2) -> Entity {
        let e = entities.spawn("", "", "");
        entities
            .get_mut(e)
            .unwrap()
            .components_mut()
            .add_component(Particle::new(position, 0.0));
        e
    }

    #[test]
    fn bounds_are_padded() {
        let system = EntityRemovalSystem::new(Bounds::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(system.bounds(), Bounds::new(-200.0, -200.0, 500.0, 450.0));
    }

    #[test]
    fn deletes_only_entities_outside_padding() {
        let mut entities = EntityManager::new();
        let inside = spawn_at(&mut entities, Vec2::new(50.0, 25.0));
        let margin = spawn_at(&mut entities, Vec2::new(-150.0, 25.0));
        let edge = spawn_at(&mut entities, Vec2::new(300.0, 250.0));
        let outside = spawn_at(&mut entities, Vec2::new(301.0, 25.0));
        let bare = entities.spawn("", "", "");

        let mut schedule = SystemSchedule::new();
        schedule.add_system(EntityRemovalSystem::new(Bounds::new(0.0, 0.0, 100.0, 50.0)));
        schedule.run_all(&mut entities, 0.016, |_, _| {});

        let deleted = |e| entities.get(e).unwrap().is_deleted();
        assert!(!deleted(inside));
        assert!(!deleted(margin));
        assert!(!deleted(edge));
        assert!(deleted(outside));
        assert!(!deleted(bare));

        entities.process();
        assert!(!entities.contains(outside));
        assert_eq!(entities.len(), 4);
    }
}
