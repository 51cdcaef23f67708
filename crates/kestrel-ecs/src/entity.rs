use std::fmt;

use crate::component::ComponentContainer;

/// A generational entity handle. Uses compact u32 index + generation for cache performance.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// Create an entity from raw parts (mainly for testing).
    pub fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index of this entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation of this entity (incremented on reuse).
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Callback fired once when the registry removes a deleted entity.
pub type DeleteHandler = Box<dyn FnOnce(Entity, &mut EntityData) + Send + Sync>;

/// The pooled record behind an [`Entity`] handle.
#[derive(Default)]
pub struct EntityData {
    tag: String,
    group: String,
    kind: String,
    deleted: bool,
    changed: bool,
    on_delete: Option<DeleteHandler>,
    components: ComponentContainer,
}

impl EntityData {
    /// Unique-ish name used for lookups such as "player" or "boss".
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    /// Collection the entity belongs to, e.g. "enemies".
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn set_group(&mut self, group: impl Into<String>) {
        self.group = group.into();
    }

    /// Template or archetype name, e.g. "bullet".
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn set_kind(&mut self, kind: impl Into<String>) {
        self.kind = kind.into();
    }

    /// Flag the entity for removal on the next registry pass.
    pub fn delete(&mut self) {
        self.deleted = true;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Report the entity in the next pass's changed set.
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn was_changed(&self) -> bool {
        self.changed
    }

    pub(crate) fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Install the callback fired when the registry removes this entity after
    /// [`delete`](Self::delete). Replaces any previous callback.
    pub fn on_delete(
        &mut self,
        handler: impl FnOnce(Entity, &mut EntityData) + Send + Sync + 'static,
    ) {
        self.on_delete = Some(Box::new(handler));
    }

    pub(crate) fn take_delete_handler(&mut self) -> Option<DeleteHandler> {
        self.on_delete.take()
    }

    pub fn components(&self) -> &ComponentContainer {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentContainer {
        &mut self.components
    }

    /// Return the record to its freshly-pooled state, detaching every component.
    fn reset(&mut self) {
        self.components.clear_components();
        self.tag.clear();
        self.group.clear();
        self.kind.clear();
        self.deleted = false;
        self.changed = false;
        self.on_delete = None;
    }
}

/// Where a pooled record currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// On the free list, waiting to be obtained.
    Pooled,
    /// Obtained from the pool but not registered with an entity manager.
    Detached,
    /// Registered with the entity manager.
    Live,
    /// Removed this epoch; still inspectable until the next pass recycles it.
    Removed,
}

struct EntitySlot {
    generation: u32,
    state: EntityState,
    data: EntityData,
}

/// Recycles entity records with generational tracking.
pub struct EntityPool {
    slots: Vec<EntitySlot>,
    free_list: Vec<u32>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Obtain a detached record, reusing a freed slot if available.
    pub fn obtain(&mut self) -> Entity {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.state = EntityState::Detached;
            Entity {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(EntitySlot {
                generation: 0,
                state: EntityState::Detached,
                data: EntityData::default(),
            });
            Entity {
                index,
                generation: 0,
            }
        }
    }

    /// Reset a record and put it back on the free list. Returns `false` for stale
    /// or already pooled handles.
    pub fn free(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slot_mut(entity) else {
            return false;
        };
        slot.data.reset();
        slot.state = EntityState::Pooled;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(entity.index);
        true
    }

    /// Lifecycle state of a handle, `None` if stale or pooled.
    pub fn state(&self, entity: Entity) -> Option<EntityState> {
        self.slot(entity).map(|s| s.state)
    }

    pub(crate) fn set_state(&mut self, entity: Entity, state: EntityState) {
        if let Some(slot) = self.slot_mut(entity) {
            slot.state = state;
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&EntityData> {
        self.slot(entity).map(|s| &s.data)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut EntityData> {
        self.slot_mut(entity).map(|s| &mut s.data)
    }

    /// Number of records waiting on the free list.
    pub fn pooled(&self) -> usize {
        self.free_list.len()
    }

    /// Number of records ever allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, entity: Entity) -> Option<&EntitySlot> {
        self.slots
            .get(entity.index as usize)
            .filter(|s| s.generation == entity.generation && s.state != EntityState::Pooled)
    }

    fn slot_mut(&mut self, entity: Entity) -> Option<&mut EntitySlot> {
        self.slots
            .get_mut(entity.index as usize)
            .filter(|s| s.generation == entity.generation && s.state != EntityState::Pooled)
    }
}

impl Default for EntityPool {
    fn default() -> Self {
        Self::new()
    }
}
