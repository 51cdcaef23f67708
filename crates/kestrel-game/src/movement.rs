use glam::Vec2;
use kestrel_ecs::{Entity, EntityData, EntitySystem, SystemContext};

use crate::physical::{Transform, Velocity};

/// Integrates every [`Velocity`] into the [`Transform`] of the same entity.
#[derive(Debug, Default, Clone, Copy)]
pub struct MovementSystem;

impl EntitySystem for MovementSystem {
    fn can_process(&self, data: &EntityData) -> bool {
        let components = data.components();
        components.has_component::<dyn Velocity>() && components.has_component::<dyn Transform>()
    }

    fn process(&mut self, _entity: Entity, data: &mut EntityData, ctx: &mut SystemContext<'_>) {
        let Some(velocity) = data.components().get_component::<dyn Velocity>() else {
            return;
        };
        let linear = velocity.linear_velocity();
        let angular = velocity.angular_velocity();
        if linear == Vec2::ZERO && angular == 0.0 {
            return;
        }

        let delta = ctx.delta();
        if let Some(transform) = data.components_mut().get_component_mut::<dyn Transform>() {
            let position = transform.position() + linear * delta;
            let rotation = transform.rotation() + angular * delta;
            transform.set_position(position);
            transform.set_rotation(rotation);
            data.mark_changed();
        }
    }

    fn name(&self) -> &str {
        "movement"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ecs::{EntityManager, SystemSchedule};

    use crate::physical::Particle;

    #[test]
    fn integrates_velocity() {
        let mut entities = EntityManager::new();
        let e = entities.spawn("", "", "");
        entities
            .get_mut(e)
            .unwrap()
            .components_mut()
            .add_component(
                Particle::new(Vec2::new(1.0, 1.0), 0.0).with_velocity(Vec2::new(2.0, -4.0), 1.0),
            );

        let mut schedule = SystemSchedule::new();
        schedule.add_system(MovementSystem);
        schedule.run_all(&mut entities, 0.5, |_, _| {});

        let data = entities.get(e).unwrap();
        let particle = data.components().get_component::<Particle>().unwrap();
        assert_eq!(particle.position, Vec2::new(2.0, -1.0));
        assert_eq!(particle.rotation, 0.5);
        assert!(data.was_changed());
    }

    #[test]
    fn resting_entities_are_not_marked_changed() {
        let mut entities = EntityManager::new();
        let e = entities.spawn("", "", "");
        entities
            .get_mut(e)
            .unwrap()
            .components_mut()
            .add_component(Particle::new(Vec2::ZERO, 0.0));

        let mut schedule = SystemSchedule::new();
        schedule.add_system(MovementSystem);
        schedule.run_all(&mut entities, 0.5, |_, _| {});

        assert!(!entities.get(e).unwrap().was_changed());
    }
}
