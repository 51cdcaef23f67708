use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::entity::{Entity, EntityData};
use crate::error::WorldError;
use crate::manager::EntityManager;

/// Heterogeneous, cheaply clonable argument list handed to an [`EntityTemplate`].
#[derive(Clone, Default)]
pub struct SpawnArgs {
    values: Vec<Arc<dyn Any + Send + Sync>>,
}

impl SpawnArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`push`](Self::push).
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.push(Arc::new(value));
    }

    /// The argument at `index` if it has type `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for SpawnArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnArgs")
            .field("len", &self.values.len())
            .finish()
    }
}

/// Factory that fills in a freshly obtained entity.
pub trait EntityTemplate: Send + Sync {
    fn build(&self, entity: Entity, data: &mut EntityData, args: &SpawnArgs);
}

impl<F> EntityTemplate for F
where
    F: Fn(Entity, &mut EntityData, &SpawnArgs) + Send + Sync,
{
    fn build(&self, entity: Entity, data: &mut EntityData, args: &SpawnArgs) {
        (self)(entity, data, args);
    }
}

/// Named entity factories.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Box<dyn EntityTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any previous one with the same name.
    pub fn register<T: EntityTemplate + 'static>(
        &mut self,
        name: impl Into<String>,
        template: T,
    ) {
        let name = name.into();
        if self.templates.insert(name.clone(), Box::new(template)).is_some() {
            debug!(template = %name, "Replaced entity template");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Build an entity from the named template and add it to `entities`.
    ///
    /// The entity's kind defaults to the template name; the template may
    /// overwrite it.
    pub fn spawn(
        &self,
        name: &str,
        entities: &mut EntityManager,
        args: &SpawnArgs,
    ) -> Result<Entity, WorldError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| WorldError::UnknownTemplate(name.to_string()))?;

        let entity = entities.create();
        if let Some(data) = entities.get_mut(entity) {
            data.set_kind(name);
            template.build(entity, data, args);
        }
        entities.add(entity);
        Ok(entity)
    }
}
