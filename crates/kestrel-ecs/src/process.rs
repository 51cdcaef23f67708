use std::any::TypeId;
use std::fmt;

use tracing::{debug, trace};

/// Lifecycle of an attached process. Everything but `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    Running,
    Succeeded,
    Failed,
    Aborted,
}

impl ProcessState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProcessState::Running)
    }
}

/// Handle to a process attached to a [`ProcessManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "process#{}", self.0)
    }
}

/// Cooperative background work advanced once per tick.
///
/// A process ends itself by setting a terminal state through its
/// [`ProcessControl`]. The manager then calls [`on_end`](Process::on_end) on the
/// next tick and, for `Succeeded`, attaches the children queued on its node.
pub trait Process<W>: Send {
    /// Called once when attached, before the first update.
    fn start(&mut self, _control: &mut ProcessControl<W>) {}

    fn update(&mut self, world: &mut W, delta: f32, control: &mut ProcessControl<W>);

    /// Called exactly once with the terminal state, then the process is dropped.
    fn on_end(&mut self, _world: &mut W, _state: ProcessState) {}
}

/// Blanket implementation so closures can be used as processes.
impl<W, F> Process<W> for F
where
    F: FnMut(&mut W, f32, &mut ProcessControl<W>) + Send,
{
    fn update(&mut self, world: &mut W, delta: f32, control: &mut ProcessControl<W>) {
        (self)(world, delta, control);
    }
}

/// What a hook may do to its own process and to the scheduler.
pub struct ProcessControl<W> {
    state: ProcessState,
    attached: Vec<ProcessNode<W>>,
}

impl<W> ProcessControl<W> {
    fn new(state: ProcessState) -> Self {
        Self {
            state,
            attached: Vec::new(),
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn succeed(&mut self) {
        self.state = ProcessState::Succeeded;
    }

    pub fn fail(&mut self) {
        self.state = ProcessState::Failed;
    }

    pub fn abort(&mut self) {
        self.state = ProcessState::Aborted;
    }

    /// Set the state directly.
    pub fn end(&mut self, state: ProcessState) {
        self.state = state;
    }

    /// Attach another process as soon as the current hook returns.
    pub fn attach(&mut self, node: ProcessNode<W>) {
        self.attached.push(node);
    }
}

/// A process together with the children it owns until it succeeds.
pub struct ProcessNode<W> {
    process: Box<dyn Process<W>>,
    type_id: TypeId,
    name: &'static str,
    children: Vec<ProcessNode<W>>,
}

impl<W> ProcessNode<W> {
    pub fn new<P: Process<W> + 'static>(process: P) -> Self {
        Self {
            process: Box::new(process),
            type_id: TypeId::of::<P>(),
            name: std::any::type_name::<P>(),
            children: Vec::new(),
        }
    }

    /// Queue a child to attach when this process succeeds.
    pub fn then(mut self, child: ProcessNode<W>) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(&self) -> &[ProcessNode<W>] {
        &self.children
    }

    /// Whether the wrapped process is of concrete type `P`.
    pub fn is<P: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<P>()
    }
}

struct Attached<W> {
    id: ProcessId,
    node: ProcessNode<W>,
    state: ProcessState,
    ended: bool,
}

/// Runs the forest of processes attached to one world.
pub struct ProcessManager<W> {
    attached: Vec<Attached<W>>,
    next_id: u64,
}

impl<W> ProcessManager<W> {
    pub fn new() -> Self {
        Self {
            attached: Vec::new(),
            next_id: 0,
        }
    }

    /// Start a process and add it to the attached set. Processes its start hook
    /// attaches are started right after it.
    pub fn attach(&mut self, mut node: ProcessNode<W>) -> ProcessId {
        let id = ProcessId(self.next_id);
        self.next_id += 1;

        let mut control = ProcessControl::new(ProcessState::Running);
        node.process.start(&mut control);
        trace!(%id, process = node.name, "Process attached");
        self.attached.push(Attached {
            id,
            node,
            state: control.state,
            ended: false,
        });
        for spawned in control.attached {
            self.attach(spawned);
        }
        id
    }

    /// Abort every attached process. `on_end` fires on the next tick.
    pub fn abort_all(&mut self) -> usize {
        self.end_every(ProcessState::Aborted)
    }

    /// End every attached process of concrete type `P` with `state`. `on_end`
    /// fires on the next tick. Ending with `Running` is a no-op.
    pub fn end_all<P: 'static>(&mut self, state: ProcessState) -> usize {
        self.end_all_of(TypeId::of::<P>(), state)
    }

    pub(crate) fn end_every(&mut self, state: ProcessState) -> usize {
        self.end_where(|_| true, state)
    }

    pub(crate) fn end_all_of(&mut self, type_id: TypeId, state: ProcessState) -> usize {
        self.end_where(|node| node.type_id == type_id, state)
    }

    fn end_where(
        &mut self,
        filter: impl Fn(&ProcessNode<W>) -> bool,
        state: ProcessState,
    ) -> usize {
        if !state.is_terminal() {
            return 0;
        }
        let mut count = 0;
        for entry in self.attached.iter_mut().filter(|e| !e.ended && filter(&e.node)) {
            entry.state = state;
            count += 1;
        }
        if count > 0 {
            debug!(count, ?state, "Ended attached processes");
        }
        count
    }

    /// Advance every process attached when the tick begins.
    ///
    /// Processes attached during the tick (children of a success, or by a hook)
    /// are started immediately but first updated on the next tick. Finished
    /// processes are dropped after the pass.
    pub fn process(&mut self, world: &mut W, delta: f32) {
        let pending = self.attached.len();
        for index in 0..pending {
            let state = self.attached[index].state;
            if state == ProcessState::Running {
                let entry = &mut self.attached[index];
                let mut control = ProcessControl::new(state);
                entry.node.process.update(world, delta, &mut control);
                entry.state = control.state;
                for spawned in control.attached {
                    self.attach(spawned);
                }
                continue;
            }

            let children = std::mem::take(&mut self.attached[index].node.children);
            if state == ProcessState::Succeeded {
                for child in children {
                    self.attach(child);
                }
            } else if !children.is_empty() {
                debug!(
                    discarded = children.len(),
                    ?state,
                    "Dropping children of unsuccessful process"
                );
            }

            let entry = &mut self.attached[index];
            entry.node.process.on_end(world, state);
            entry.ended = true;
            trace!(id = %entry.id, process = entry.node.name, ?state, "Process ended");
        }
        self.attached.retain(|entry| !entry.ended);
    }

    /// State of an attached process, `None` once it has been dropped.
    pub fn state(&self, id: ProcessId) -> Option<ProcessState> {
        self.attached.iter().find(|e| e.id == id).map(|e| e.state)
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.attached.iter().any(|e| e.id == id)
    }

    /// Number of attached processes.
    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

impl<W> Default for ProcessManager<W> {
    fn default() -> Self {
        Self::new()
    }
}

/// Succeeds after a fixed amount of time. Useful as the head of a chain.
#[derive(Debug, Clone)]
pub struct Delay {
    remaining: f32,
}

impl Delay {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

impl<W> Process<W> for Delay {
    fn update(&mut self, _world: &mut W, delta: f32, control: &mut ProcessControl<W>) {
        self.remaining -= delta;
        if self.remaining <= 0.0 {
            control.succeed();
        }
    }
}
