//! Kestrel ECS - entity bookkeeping and scheduling for 2D games
//!
//! Entities are pooled records that own a [`ComponentContainer`]. Components
//! are looked up by concrete type or by any capability trait they declare, and
//! the container caches where each capability was last found. The
//! [`EntityManager`] tracks what was added, changed and removed each epoch, the
//! [`ProcessManager`] runs cooperative background work, and systems filter the
//! live entities once per frame. [`EntityWorld`] wires the three together.

mod capability;
mod component;
mod entity;
mod error;
mod manager;
mod process;
mod spawn;
mod system;
mod world;

pub use capability::{Capabilities, CapabilityId};
pub use component::{AsAny, Attach, Component, ComponentContainer};
pub use entity::{DeleteHandler, Entity, EntityData, EntityPool, EntityState};
pub use error::WorldError;
pub use manager::EntityManager;
pub use process::{
    Delay, Process, ProcessControl, ProcessId, ProcessManager, ProcessNode, ProcessState,
};
pub use spawn::{EntityTemplate, SpawnArgs, TemplateRegistry};
pub use system::{
    Commands, ComponentSystem, EntityProcessor, EntitySystem, ProcessEnd, SpawnRequest,
    SystemContext, SystemSchedule, TypeSystem,
};
pub use world::EntityWorld;
