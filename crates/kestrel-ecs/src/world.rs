use kestrel_core::{GameTime, TimeConfig};
use tracing::{trace, warn};

use crate::entity::{Entity, EntityData};
use crate::error::WorldError;
use crate::manager::EntityManager;
use crate::process::{ProcessId, ProcessManager, ProcessNode};
use crate::spawn::{EntityTemplate, SpawnArgs, TemplateRegistry};
use crate::system::{Commands, EntitySystem, SystemSchedule};

/// The central ECS container. Owns the entity registry, the process scheduler,
/// the system schedule and the entity templates of one game world.
pub struct EntityWorld {
    entities: EntityManager,
    processes: ProcessManager<EntityManager>,
    systems: SystemSchedule,
    templates: TemplateRegistry,
    time: GameTime,
}

impl EntityWorld {
    pub fn new() -> Self {
        Self::with_time(TimeConfig::default())
    }

    pub fn with_time(config: TimeConfig) -> Self {
        Self {
            entities: EntityManager::new(),
            processes: ProcessManager::new(),
            systems: SystemSchedule::new(),
            templates: TemplateRegistry::new(),
            time: GameTime::new(config),
        }
    }

    /// Advance one frame.
    ///
    /// Order: frame time, entity epoch, processes, then each system followed by
    /// the commands it queued.
    pub fn tick(&mut self, raw_delta: f32) {
        self.time.update(raw_delta);
        let delta = self.time.delta_time;

        self.entities.process();
        self.processes.process(&mut self.entities, delta);

        let Self {
            entities,
            processes,
            systems,
            templates,
            ..
        } = self;
        systems.run_all(entities, delta, |entities, commands| {
            Self::apply_commands(entities, processes, templates, commands);
        });
        trace!(frame = self.time.frame_count, live = self.entities.len(), "World ticked");
    }

    fn apply_commands(
        entities: &mut EntityManager,
        processes: &mut ProcessManager<EntityManager>,
        templates: &TemplateRegistry,
        commands: &mut Commands,
    ) {
        for end in commands.take_process_ends() {
            end.apply(processes);
        }
        let (spawns, attached) = commands.drain();
        for request in spawns {
            if let Err(err) = templates.spawn(&request.template, entities, &request.args) {
                warn!(%err, "Dropping spawn request");
            }
        }
        for node in attached {
            processes.attach(node);
        }
    }

    // ---- Entities ----

    /// Create an entity from a registered template and add it.
    pub fn create_entity(
        &mut self,
        template: &str,
        args: &SpawnArgs,
    ) -> Result<Entity, WorldError> {
        self.templates.spawn(template, &mut self.entities, args)
    }

    pub fn register_template<T: EntityTemplate + 'static>(
        &mut self,
        name: impl Into<String>,
        template: T,
    ) {
        self.templates.register(name, template);
    }

    pub fn entity(&self, entity: Entity) -> Option<&EntityData> {
        self.entities.get(entity)
    }

    pub fn entity_mut(&mut self, entity: Entity) -> Option<&mut EntityData> {
        self.entities.get_mut(entity)
    }

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    // ---- Processes ----

    pub fn attach(&mut self, node: ProcessNode<EntityManager>) -> ProcessId {
        self.processes.attach(node)
    }

    pub fn processes(&self) -> &ProcessManager<EntityManager> {
        &self.processes
    }

    pub fn processes_mut(&mut self) -> &mut ProcessManager<EntityManager> {
        &mut self.processes
    }

    // ---- Systems ----

    pub fn add_system<S: EntitySystem + 'static>(&mut self, system: S) {
        self.systems.add_system(system);
    }

    pub fn systems(&self) -> &SystemSchedule {
        &self.systems
    }

    // ---- Time ----

    pub fn time(&self) -> &GameTime {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut GameTime {
        &mut self.time
    }
}

impl Default for EntityWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::component::Component;
    use crate::process::{Delay, Process, ProcessControl, ProcessState};
    use crate::system::{EntityProcessor, SystemContext, TypeSystem};

    struct Fuse(f32);
    impl Component for Fuse {}

    type Log = Arc<Mutex<Vec<String>>>;

    /// Runs until ended from outside and records how it ended.
    struct Guard(Log);

    impl Process<EntityManager> for Guard {
        fn update(
            &mut self,
            _world: &mut EntityManager,
            _delta: f32,
            _control: &mut ProcessControl<EntityManager>,
        ) {
        }

        fn on_end(&mut self, _world: &mut EntityManager, state: ProcessState) {
            self.0.lock().unwrap().push(format!("guard {state:?}"));
        }
    }

    /// Runs `end` for every "alarm" entity, then deletes it.
    fn alarm<F>(end: F) -> TypeSystem<impl EntityProcessor>
    where
        F: Fn(&mut SystemContext<'_>) + Send + Sync + 'static,
    {
        TypeSystem::new(
            "alarm",
            move |_: Entity, data: &mut EntityData, ctx: &mut SystemContext<'_>| {
                end(ctx);
                data.delete();
            },
        )
    }

    #[test]
    fn tick_advances_time() {
        let mut world = EntityWorld::new();
        world.tick(0.1);
        world.tick(10.0);
        assert_eq!(world.time().frame_count, 2);
        assert_eq!(world.time().delta_time, 0.25);
    }

    #[test]
    fn create_entity_through_template() {
        let mut world = EntityWorld::new();
        world.register_template("crate", |_: Entity, data: &mut EntityData, _: &SpawnArgs| {
            data.set_tag("loot");
        });

        let e = world.create_entity("crate", &SpawnArgs::new()).unwrap();
        assert_eq!(world.entity(e).unwrap().tag(), "loot");
        assert_eq!(world.entities().try_get_entity("loot", "", "crate"), Some(e));

        assert!(matches!(
            world.create_entity("barrel", &SpawnArgs::new()),
            Err(WorldError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn system_spawns_apply_the_same_frame() {
        let mut world = EntityWorld::new();
        world.register_template("spark", |_: Entity, _: &mut EntityData, _: &SpawnArgs| {});
        world.register_template("bomb", |_: Entity, data: &mut EntityData, _: &SpawnArgs| {
            data.components_mut().add_component(Fuse(0.05));
        });
        world.add_system(TypeSystem::new(
            "bomb",
            |_: Entity, data: &mut EntityData, ctx: &mut SystemContext<'_>| {
                let delta = ctx.delta();
                if let Some(fuse) = data.components_mut().get_component_mut::<Fuse>() {
                    fuse.0 -= delta;
                    if fuse.0 <= 0.0 {
                        data.delete();
                        ctx.spawn("spark", SpawnArgs::new());
                        ctx.spawn("dud", SpawnArgs::new());
                    }
                }
            },
        ));

        let bomb = world.create_entity("bomb", &SpawnArgs::new()).unwrap();
        world.tick(0.1);
        assert_eq!(world.entities().len(), 2);
        assert!(world.entities().try_get_entity("", "", "spark").is_some());

        world.tick(0.1);
        assert!(!world.entities().contains(bomb));
        assert_eq!(world.entities().len(), 1);
    }

    #[test]
    fn processes_see_entity_registry() {
        let mut world = EntityWorld::new();
        let target = world.entities_mut().spawn("target", "", "");
        let id = world.attach(ProcessNode::new(
            move |entities: &mut EntityManager,
                  _delta: f32,
                  control: &mut ProcessControl<EntityManager>| {
                if let Some(data) = entities.get_mut(target) {
                    data.delete();
                }
                control.succeed();
            },
        ));

        world.tick(0.016);
        assert_eq!(world.processes().state(id), Some(ProcessState::Succeeded));
        assert!(world.entities().contains(target));

        world.tick(0.016);
        assert!(!world.entities().contains(target));
        assert!(world.processes().is_empty());
    }

    #[test]
    fn systems_can_attach_processes() {
        let ticks = Arc::new(Mutex::new(0u32));
        let sink = ticks.clone();
        let mut world = EntityWorld::new();
        world.entities_mut().spawn("", "", "beacon");
        world.add_system(TypeSystem::new(
            "beacon",
            move |_: Entity, data: &mut EntityData, ctx: &mut SystemContext<'_>| {
                let sink = sink.clone();
                ctx.attach(ProcessNode::new(
                    move |_: &mut EntityManager,
                          _: f32,
                          control: &mut ProcessControl<EntityManager>| {
                        *sink.lock().unwrap() += 1;
                        control.succeed();
                    },
                ));
                data.delete();
            },
        ));

        world.tick(0.016);
        assert_eq!(world.processes().len(), 1);
        assert_eq!(*ticks.lock().unwrap(), 0);

        world.tick(0.016);
        assert_eq!(*ticks.lock().unwrap(), 1);
        assert_eq!(world.systems().len(), 1);
    }

    #[test]
    fn systems_can_abort_every_process() {
        let log = Log::default();
        let mut world = EntityWorld::new();
        let guard = world.attach(ProcessNode::new(Guard(log.clone())));
        let delay = world.attach(ProcessNode::new(Delay::new(100.0)));
        world.entities_mut().spawn("", "", "alarm");
        world.add_system(alarm(|ctx| ctx.abort_all()));

        world.tick(0.016);
        assert_eq!(world.processes().state(guard), Some(ProcessState::Aborted));
        assert_eq!(world.processes().state(delay), Some(ProcessState::Aborted));
        assert!(log.lock().unwrap().is_empty());

        world.tick(0.016);
        assert_eq!(*log.lock().unwrap(), vec!["guard Aborted".to_string()]);
        assert!(world.processes().is_empty());
    }

    #[test]
    fn systems_can_end_processes_by_type() {
        let log = Log::default();
        let mut world = EntityWorld::new();
        let guard = world.attach(ProcessNode::new(Guard(log.clone())));
        let delay = world.attach(ProcessNode::new(Delay::new(100.0)));
        world.entities_mut().spawn("", "", "alarm");
        world.add_system(alarm(|ctx| {
            ctx.end_all::<Delay>(ProcessState::Running);
            ctx.end_all::<Guard>(ProcessState::Failed);
        }));

        world.tick(0.016);
        assert_eq!(world.processes().state(guard), Some(ProcessState::Failed));
        assert_eq!(world.processes().state(delay), Some(ProcessState::Running));
        assert!(log.lock().unwrap().is_empty());

        world.tick(0.016);
        assert_eq!(*log.lock().unwrap(), vec!["guard Failed".to_string()]);
        assert_eq!(world.processes().len(), 1);
        assert!(world.processes().contains(delay));
    }
}
