//! Kestrel - A 2D entity-component-system runtime
//!
//! Headless driver: builds a small particle world, runs it for a fixed number
//! of frames and reports what the registry and scheduler did.

mod settings;

use std::f32::consts::TAU;

use anyhow::{Context, Result};
use glam::Vec2;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kestrel_ecs::{
    Delay, Entity, EntityData, EntityManager, EntityWorld, ProcessControl, ProcessNode, SpawnArgs,
};
use kestrel_game::{
    apply_damage, spawner_system, EntityRemovalSystem, EntitySpawner, Health, MovementSystem,
    Particle, RenderSystem, Sprite, Surface,
};

use settings::Settings;

/// Surface that only counts draw calls.
#[derive(Default)]
struct HeadlessSurface {
    draws: u64,
}

impl Surface for HeadlessSurface {
    fn draw_texture(
        &mut self,
        _texture: &str,
        _position: Vec2,
        _rotation: f32,
        _origin: Vec2,
        _scale: Vec2,
    ) {
        self.draws += 1;
    }
}

fn spark(_entity: Entity, data: &mut EntityData, args: &SpawnArgs) {
    let position = args.get::<Vec2>(0).copied().unwrap_or_default();
    let velocity = args.get::<Vec2>(1).copied().unwrap_or_default();
    data.set_group("sparks");
    let components = data.components_mut();
    components.add_component(Particle::new(position, 0.0).with_velocity(velocity, 1.0));
    components.add_component(Health::new(10.0));
    components.add_component(Sprite::new("spark.png"));
    data.on_delete(|entity, data| debug!(%entity, group = data.group(), "Spark removed"));
}

fn emitter(_entity: Entity, data: &mut EntityData, args: &SpawnArgs) {
    let position = args.get::<Vec2>(0).copied().unwrap_or_default();
    let interval = args.get::<f32>(2).copied().unwrap_or(1.0);
    let spark_args = SpawnArgs::new()
        .with(position)
        .with(args.get::<Vec2>(1).copied().unwrap_or_default());
    let components = data.components_mut();
    components.add_component(Particle::new(position, 0.0));
    components.add_component(EntitySpawner::new("spark", spark_args, interval));
}

/// Once the warm-up delay is over, wear every spark down a little each tick.
fn storm(entities: &mut EntityManager, delta: f32, _control: &mut ProcessControl<EntityManager>) {
    let sparks: Vec<Entity> = entities.entities().to_vec();
    for entity in sparks {
        if let Some(data) = entities.get_mut(entity) {
            if data.group() == "sparks" {
                apply_damage(data, 4.0 * delta);
            }
        }
    }
}

fn build_world(settings: &Settings) -> EntityWorld {
    let mut world = EntityWorld::with_time(settings.time.clone());
    world.register_template("spark", spark);
    world.register_template("emitter", emitter);

    world.add_system(spawner_system());
    world.add_system(MovementSystem);
    world.add_system(EntityRemovalSystem::with_padding(
        settings.world.bounds,
        settings.world.removal_padding,
    ));

    let emitters = settings.simulation.emitters.max(1);
    for i in 0..emitters {
        let angle = TAU * i as f32 / emitters as f32;
        let direction = Vec2::from_angle(angle);
        let args = SpawnArgs::new()
            .with(Vec2::ZERO)
            .with(direction * 120.0)
            .with(settings.simulation.spawn_interval);
        if let Err(e) = world.create_entity("emitter", &args) {
            warn!("Failed to place emitter: {}", e);
        }
    }

    world.attach(ProcessNode::new(Delay::new(2.0)).then(ProcessNode::new(storm)));
    world
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Kestrel runtime...");

    let settings = Settings::load();
    let mut world = build_world(&settings);
    let mut renderer = RenderSystem::new();
    let mut surface = HeadlessSurface::default();

    let frames = settings.simulation.frames;
    let mut peak: usize = 0;
    let mut removed: usize = 0;
    for frame in 1..=frames {
        world.tick(settings.simulation.frame_delta);
        let delta = world.time().delta_time;
        renderer.draw_all(world.entities_mut(), &mut surface, delta);

        let entities = world.entities();
        peak = peak.max(entities.len());
        removed += entities.removed().len();

        if frame % 60 == 0 {
            info!(
                frame,
                live = entities.len(),
                added = entities.added().len(),
                removed = entities.removed().len(),
                processes = world.processes().len(),
                "Frame stats"
            );
        }
    }

    info!(
        frames,
        game_time = world.time().total_time,
        peak_entities = peak,
        removed_entities = removed,
        draws = surface.draws,
        "Simulation finished"
    );
    Ok(())
}
