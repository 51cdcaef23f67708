use kestrel_ecs::{
    Component, ComponentSystem, Entity, EntityData, EntityProcessor, SpawnArgs, SystemContext,
};
use tracing::trace;

/// Upper bound on the spawns a single spawner requests in one frame. A
/// backlog beyond it is dropped.
pub const MAX_SPAWNS_PER_FRAME: u32 = 64;

/// Periodically requests a new entity from a named template.
#[derive(Debug, Clone)]
pub struct EntitySpawner {
    template: String,
    args: SpawnArgs,
    interval: f32,
    elapsed: f32,
}

impl EntitySpawner {
    /// Spawn from `template` every `interval` seconds. A non-positive interval
    /// never fires.
    pub fn new(template: impl Into<String>, args: SpawnArgs, interval: f32) -> Self {
        Self {
            template: template.into(),
            args,
            interval,
            elapsed: 0.0,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn args(&self) -> &SpawnArgs {
        &self.args
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Advance the timer and return how many intervals elapsed, at most
    /// [`MAX_SPAWNS_PER_FRAME`].
    pub fn advance(&mut self, delta: f32) -> u32 {
        if self.interval.is_nan() || self.interval <= 0.0 {
            return 0;
        }
        if delta.is_finite() {
            self.elapsed += delta.max(0.0);
        }
        if self.elapsed < self.interval {
            return 0;
        }

        let due = (self.elapsed / self.interval).floor();
        self.elapsed = self.elapsed.rem_euclid(self.interval);
        due.min(MAX_SPAWNS_PER_FRAME as f32) as u32
    }
}

impl Component for EntitySpawner {}

/// Emits the spawn requests of every [`EntitySpawner`] it visits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpawnEmitter;

impl EntityProcessor for SpawnEmitter {
    fn process(&mut self, entity: Entity, data: &mut EntityData, ctx: &mut SystemContext<'_>) {
        let delta = ctx.delta();
        let Some(spawner) = data.components_mut().get_component_mut::<EntitySpawner>() else {
            return;
        };
        let due = spawner.advance(delta);
        for _ in 0..due {
            ctx.spawn(spawner.template.clone(), spawner.args.clone());
        }
        if due > 0 {
            trace!(%entity, template = %spawner.template, due, "Spawner fired");
        }
    }
}

pub type EntitySpawnerSystem = ComponentSystem<EntitySpawner, SpawnEmitter>;

/// System driving every [`EntitySpawner`] in the world.
pub fn spawner_system() -> EntitySpawnerSystem {
    ComponentSystem::new(SpawnEmitter)
}
