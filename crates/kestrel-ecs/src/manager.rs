use tracing::{debug, trace};

use crate::entity::{Entity, EntityData, EntityPool, EntityState};

/// Owns every entity of a world and tracks what happened to them each epoch.
///
/// Removal is two-phase. A deleted entity leaves the live set during the
/// [`process`](Self::process) call that notices it and sits in the removed set
/// until the following pass, which recycles it into the pool. Collaborators such
/// as spatial indices get exactly one epoch to observe the tombstone.
pub struct EntityManager {
    pool: EntityPool,
    entities: Vec<Entity>,
    added: Vec<Entity>,
    changed: Vec<Entity>,
    removed: Vec<Entity>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self {
            pool: EntityPool::new(),
            entities: Vec::new(),
            added: Vec::new(),
            changed: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Obtain a detached entity from the pool. It joins the world on [`add`](Self::add).
    pub fn create(&mut self) -> Entity {
        self.pool.obtain()
    }

    /// Create a labelled entity and add it in one step.
    pub fn spawn(&mut self, tag: &str, group: &str, kind: &str) -> Entity {
        let entity = self.create();
        if let Some(data) = self.pool.get_mut(entity) {
            data.set_tag(tag);
            data.set_group(group);
            data.set_kind(kind);
        }
        self.add(entity);
        entity
    }

    /// Register a detached entity. Returns `false` for any other state.
    pub fn add(&mut self, entity: Entity) -> bool {
        if self.pool.state(entity) != Some(EntityState::Detached) {
            return false;
        }
        self.pool.set_state(entity, EntityState::Live);
        self.entities.push(entity);
        self.added.push(entity);
        trace!(%entity, "Entity added");
        true
    }

    /// Move a live entity to the removed set. Its record is recycled on the pass
    /// after next. Returns `false` if the entity was not live.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(index) = self.entities.iter().position(|&e| e == entity) else {
            return false;
        };
        self.detach_at(index);
        true
    }

    fn detach_at(&mut self, index: usize) {
        let entity = self.entities.remove(index);
        self.pool.set_state(entity, EntityState::Removed);
        self.removed.push(entity);
        trace!(%entity, "Entity removed");
    }

    /// Advance one epoch: recycle last epoch's removals, then sweep deleted and
    /// changed entities into this epoch's sets.
    pub fn process(&mut self) {
        self.added.clear();
        self.changed.clear();

        let recycled = self.removed.len();
        for entity in self.removed.drain(..) {
            self.pool.free(entity);
        }

        for index in (0..self.entities.len()).rev() {
            let entity = self.entities[index];
            let Some(data) = self.pool.get_mut(entity) else {
                continue;
            };

            let deleted = data.is_deleted();
            if deleted {
                if let Some(handler) = data.take_delete_handler() {
                    handler(entity, data);
                }
            }
            let changed = data.take_changed();

            if deleted {
                self.detach_at(index);
            }
            if changed {
                self.changed.push(entity);
            }
        }

        if recycled > 0 || !self.removed.is_empty() {
            debug!(
                recycled,
                removed = self.removed.len(),
                live = self.entities.len(),
                "Entity epoch processed"
            );
        }
    }

    /// First live entity matching every non-empty criterion. An empty string skips
    /// that field; all three empty never matches.
    pub fn try_get_entity(&self, tag: &str, group: &str, kind: &str) -> Option<Entity> {
        if tag.is_empty() && group.is_empty() && kind.is_empty() {
            return None;
        }
        self.entities.iter().copied().find(|&entity| {
            self.pool.get(entity).is_some_and(|data| {
                (tag.is_empty() || data.tag() == tag)
                    && (group.is_empty() || data.group() == group)
                    && (kind.is_empty() || data.kind() == kind)
            })
        })
    }

    /// Record of a live, detached or just-removed entity.
    pub fn get(&self, entity: Entity) -> Option<&EntityData> {
        self.pool.get(entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut EntityData> {
        self.pool.get_mut(entity)
    }

    pub fn state(&self, entity: Entity) -> Option<EntityState> {
        self.pool.state(entity)
    }

    /// Whether the entity is currently live.
    pub fn contains(&self, entity: Entity) -> bool {
        self.pool.state(entity) == Some(EntityState::Live)
    }

    /// Live entities, oldest first.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entities added since the last pass.
    pub fn added(&self) -> &[Entity] {
        &self.added
    }

    /// Entities reported changed by the last pass.
    pub fn changed(&self) -> &[Entity] {
        &self.changed
    }

    /// Entities removed since the last pass began, awaiting recycling.
    pub fn removed(&self) -> &[Entity] {
        &self.removed
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of recycled records ready for reuse.
    pub fn pooled(&self) -> usize {
        self.pool.pooled()
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
