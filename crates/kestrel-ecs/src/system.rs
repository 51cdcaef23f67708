use std::any::TypeId;
use std::marker::PhantomData;

use tracing::trace;

use crate::entity::{Entity, EntityData};
use crate::manager::EntityManager;
use crate::process::{ProcessManager, ProcessNode, ProcessState};
use crate::spawn::SpawnArgs;

/// A system that filters the live entities each frame and updates the ones it accepts.
pub trait EntitySystem: Send + Sync {
    fn can_process(&self, data: &EntityData) -> bool;

    fn process(&mut self, entity: Entity, data: &mut EntityData, ctx: &mut SystemContext<'_>);

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Per-entity update step shared by the stock system kinds.
pub trait EntityProcessor: Send + Sync {
    fn process(&mut self, entity: Entity, data: &mut EntityData, ctx: &mut SystemContext<'_>);
}

/// Blanket implementation so closures can be used as processors.
impl<F> EntityProcessor for F
where
    F: FnMut(Entity, &mut EntityData, &mut SystemContext<'_>) + Send + Sync,
{
    fn process(&mut self, entity: Entity, data: &mut EntityData, ctx: &mut SystemContext<'_>) {
        (self)(entity, data, ctx);
    }
}

/// Processes every entity whose components provide capability `C`.
pub struct ComponentSystem<C: ?Sized, P> {
    processor: P,
    _capability: PhantomData<fn(&C)>,
}

impl<C: ?Sized + 'static, P: EntityProcessor> ComponentSystem<C, P> {
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            _capability: PhantomData,
        }
    }
}

impl<C: ?Sized + 'static, P: EntityProcessor> EntitySystem for ComponentSystem<C, P> {
    fn can_process(&self, data: &EntityData) -> bool {
        data.components().has_component::<C>()
    }

    fn process(&mut self, entity: Entity, data: &mut EntityData, ctx: &mut SystemContext<'_>) {
        self.processor.process(entity, data, ctx);
    }
}

/// Processes every entity of one kind, e.g. all "bullet" entities.
pub struct TypeSystem<P> {
    kind: String,
    processor: P,
}

impl<P: EntityProcessor> TypeSystem<P> {
    pub fn new(kind: impl Into<String>, processor: P) -> Self {
        Self {
            kind: kind.into(),
            processor,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl<P: EntityProcessor> EntitySystem for TypeSystem<P> {
    fn can_process(&self, data: &EntityData) -> bool {
        data.kind() == self.kind
    }

    fn process(&mut self, entity: Entity, data: &mut EntityData, ctx: &mut SystemContext<'_>) {
        self.processor.process(entity, data, ctx);
    }
}

/// A deferred request to build an entity from a named template.
pub struct SpawnRequest {
    pub template: String,
    pub args: SpawnArgs,
}

/// A deferred request to end attached processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessEnd {
    /// End every attached process.
    All(ProcessState),
    /// End every attached process of one concrete type.
    Type(TypeId, ProcessState),
}

impl ProcessEnd {
    /// Apply the request, returning how many processes it ended.
    pub fn apply<W>(self, processes: &mut ProcessManager<W>) -> usize {
        match self {
            ProcessEnd::All(state) => processes.end_every(state),
            ProcessEnd::Type(type_id, state) => processes.end_all_of(type_id, state),
        }
    }
}

/// World changes queued by systems, applied once the queuing system finishes.
#[derive(Default)]
pub struct Commands {
    spawns: Vec<SpawnRequest>,
    processes: Vec<ProcessNode<EntityManager>>,
    ends: Vec<ProcessEnd>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, template: impl Into<String>, args: SpawnArgs) {
        self.spawns.push(SpawnRequest {
            template: template.into(),
            args,
        });
    }

    pub fn attach(&mut self, node: ProcessNode<EntityManager>) {
        self.processes.push(node);
    }

    /// Abort every attached process once this system finishes.
    pub fn abort_all(&mut self) {
        self.ends.push(ProcessEnd::All(ProcessState::Aborted));
    }

    /// End every attached process of type `P` with `state` once this system
    /// finishes. Ending with `Running` does nothing.
    pub fn end_all<P: 'static>(&mut self, state: ProcessState) {
        self.ends.push(ProcessEnd::Type(TypeId::of::<P>(), state));
    }

    pub fn spawns(&self) -> &[SpawnRequest] {
        &self.spawns
    }

    pub fn process_ends(&self) -> &[ProcessEnd] {
        &self.ends
    }

    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty() && self.processes.is_empty() && self.ends.is_empty()
    }

    /// Take the queued process end requests, in the order they were made.
    pub fn take_process_ends(&mut self) -> Vec<ProcessEnd> {
        std::mem::take(&mut self.ends)
    }

    /// Take the queued spawns and attachments, leaving them empty.
    pub fn drain(&mut self) -> (Vec<SpawnRequest>, Vec<ProcessNode<EntityManager>>) {
        (
            std::mem::take(&mut self.spawns),
            std::mem::take(&mut self.processes),
        )
    }
}

/// What a system sees besides the entity it is processing.
pub struct SystemContext<'a> {
    delta: f32,
    commands: &'a mut Commands,
}

impl<'a> SystemContext<'a> {
    pub fn new(delta: f32, commands: &'a mut Commands) -> Self {
        Self { delta, commands }
    }

    /// Scaled frame delta in seconds.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn spawn(&mut self, template: impl Into<String>, args: SpawnArgs) {
        self.commands.spawn(template, args);
    }

    pub fn attach(&mut self, node: ProcessNode<EntityManager>) {
        self.commands.attach(node);
    }

    pub fn abort_all(&mut self) {
        self.commands.abort_all();
    }

    pub fn end_all<P: 'static>(&mut self, state: ProcessState) {
        self.commands.end_all::<P>(state);
    }

    pub fn commands(&mut self) -> &mut Commands {
        self.commands
    }
}

/// An ordered list of systems to run each frame.
pub struct SystemSchedule {
    systems: Vec<Box<dyn EntitySystem>>,
}

impl SystemSchedule {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Add a system to the end of the schedule.
    pub fn add_system<S: EntitySystem + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Run every system in order over the live entities.
    ///
    /// Each system walks a snapshot taken when it starts, so entities spawned by
    /// an earlier system are visible to later ones. `apply` receives the
    /// commands a system queued right after that system finishes.
    pub fn run_all(
        &mut self,
        entities: &mut EntityManager,
        delta: f32,
        mut apply: impl FnMut(&mut EntityManager, &mut Commands),
    ) {
        let mut commands = Commands::new();
        for system in &mut self.systems {
            let snapshot = entities.entities().to_vec();
            let mut visited = 0usize;
            for entity in snapshot {
                let Some(data) = entities.get_mut(entity) else {
                    continue;
                };
                if !system.can_process(data) {
                    continue;
                }
                let mut ctx = SystemContext::new(delta, &mut commands);
                system.process(entity, data, &mut ctx);
                visited += 1;
            }
            trace!(system = system.name(), visited, "System ran");
            if !commands.is_empty() {
                apply(entities, &mut commands);
            }
        }
    }

    /// Number of systems in the schedule.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl Default for SystemSchedule {
    fn default() -> Self {
        Self::new()
    }
}
