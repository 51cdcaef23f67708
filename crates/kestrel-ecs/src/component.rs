use std::any::{Any, TypeId};
use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::capability::{Capabilities, CapabilityId, CapabilityTable};

/// Upcast helper so erased components can be downcast to their concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of data or behavior attached to exactly one entity.
///
/// A component is always resolvable by its concrete type. Anything else it can be
/// looked up as (usually a capability trait such as `dyn Transform`) is declared in
/// [`Component::capabilities`].
pub trait Component: AsAny + Send + Sync {
    /// Declare the capabilities of this component type beyond its concrete type.
    fn capabilities(_caps: &mut Capabilities<Self>)
    where
        Self: Sized,
    {
    }

    /// Called before the component is stored. Bridges (physics, spatial indices)
    /// create their counterparts here.
    fn on_add(&mut self, _attach: &mut Attach<'_>) {}

    /// Called once the component has left the container, which no longer lists it.
    fn on_remove(&mut self, _container: &ComponentContainer) {}
}

/// View of the container handed to [`Component::on_add`].
pub struct Attach<'a> {
    container: &'a ComponentContainer,
    aliases: Vec<CapabilityId>,
}

impl Attach<'_> {
    /// The container the component is being added to.
    pub fn container(&self) -> &ComponentContainer {
        self.container
    }

    /// Claim lookups for `C` eagerly, overriding whichever component they resolved
    /// to before. `C` must be one of the component's declared capabilities;
    /// undeclared aliases are ignored.
    pub fn register_as<C: ?Sized + 'static>(&mut self) {
        self.aliases.push(CapabilityId::of::<C>());
    }
}

struct Slot {
    component: Box<dyn Component>,
    type_id: TypeId,
    table: CapabilityTable,
}

/// Per-entity component storage with a lazily filled capability lookup cache.
///
/// Slots keep insertion order, which is also the tie-break when several
/// components satisfy the same capability: the earliest one wins and stays
/// cached until it is removed.
#[derive(Default)]
pub struct ComponentContainer {
    slots: Vec<Slot>,
    cache: Mutex<HashMap<CapabilityId, usize>>,
}

impl ComponentContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component and return it. A component of the same concrete type is
    /// replaced in place.
    pub fn add_component<T: Component>(&mut self, mut component: T) -> &mut T {
        let table = Capabilities::<T>::collect();
        let mut attach = Attach {
            container: self,
            aliases: Vec::new(),
        };
        component.on_add(&mut attach);
        let aliases = attach.aliases;

        let type_id = TypeId::of::<T>();
        let slot = Slot {
            component: Box::new(component),
            type_id,
            table,
        };

        let index = match self.slots.iter().position(|s| s.type_id == type_id) {
            Some(index) => {
                let mut replaced = std::mem::replace(&mut self.slots[index], slot);
                debug!(
                    component = std::any::type_name::<T>(),
                    "Replacing component of the same type"
                );
                replaced.component.on_remove(self);
                index
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };

        let cache = self.cache.get_mut();
        for alias in aliases {
            if self.slots[index].table.provides(alias) {
                cache.insert(alias, index);
            } else {
                debug!(
                    component = std::any::type_name::<T>(),
                    alias = alias.name(),
                    "Ignoring alias the component does not provide"
                );
            }
        }

        trace!(component = std::any::type_name::<T>(), index, "Component added");
        (*self.slots[index].component)
            .as_any_mut()
            .downcast_mut::<T>()
            .expect("slot holds the component just inserted")
    }

    /// Remove the component that `C` resolves to. Returns `false` if nothing matches.
    pub fn remove_component<C: ?Sized + 'static>(&mut self) -> bool {
        let Some(index) = self.resolve_mut(CapabilityId::of::<C>()) else {
            return false;
        };
        let mut slot = self.slots.remove(index);

        let cache = self.cache.get_mut();
        for id in slot.table.ids() {
            if cache.get(id) == Some(&index) {
                cache.remove(id);
            }
        }
        for cached in cache.values_mut() {
            if *cached > index {
                *cached -= 1;
            }
        }
        debug_assert!(cache.values().all(|&i| i < self.slots.len()));

        trace!(capability = std::any::type_name::<C>(), index, "Component removed");
        slot.component.on_remove(self);
        true
    }

    /// Look up the component satisfying `C`.
    pub fn get_component<C: ?Sized + 'static>(&self) -> Option<&C> {
        let index = self.resolve(CapabilityId::of::<C>())?;
        let slot = &self.slots[index];
        slot.table.cast::<C>((*slot.component).as_any())
    }

    /// Look up the component satisfying `C` for mutation.
    pub fn get_component_mut<C: ?Sized + 'static>(&mut self) -> Option<&mut C> {
        let index = self.resolve_mut(CapabilityId::of::<C>())?;
        let slot = &mut self.slots[index];
        slot.table.cast_mut::<C>((*slot.component).as_any_mut())
    }

    pub fn has_component<C: ?Sized + 'static>(&self) -> bool {
        self.resolve(CapabilityId::of::<C>()).is_some()
    }

    /// Detach every component and forget all cached lookups.
    pub fn clear_components(&mut self) {
        let slots = std::mem::take(&mut self.slots);
        self.cache.get_mut().clear();
        for mut slot in slots {
            slot.component.on_remove(self);
        }
    }

    /// Number of attached components.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Capabilities of every attached component, in insertion order.
    pub fn capability_ids(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.slots.iter().flat_map(|s| s.table.ids().iter().copied())
    }

    fn resolve(&self, id: CapabilityId) -> Option<usize> {
        let mut cache = self.cache.lock();
        if let Some(&index) = cache.get(&id) {
            return Some(index);
        }
        let index = self.slots.iter().position(|s| s.table.provides(id))?;
        trace!(capability = id.name(), index, "Caching component lookup");
        cache.insert(id, index);
        Some(index)
    }

    fn resolve_mut(&mut self, id: CapabilityId) -> Option<usize> {
        let cache = self.cache.get_mut();
        if let Some(&index) = cache.get(&id) {
            return Some(index);
        }
        let index = self.slots.iter().position(|s| s.table.provides(id))?;
        cache.insert(id, index);
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    trait Shape {
        fn area(&self) -> f32;
    }

    trait Tinted {
        fn tint(&self) -> u32;
    }

    #[derive(Debug, PartialEq)]
    struct Square {
        side: f32,
    }

    impl Shape for Square {
        fn area(&self) -> f32 {
            self.side * self.side
        }
    }

    impl Tinted for Square {
        fn tint(&self) -> u32 {
            0xff0000
        }
    }

    impl Component for Square {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.provide::<dyn Shape>(|s| s, |s| s)
                .provide::<dyn Tinted>(|s| s, |s| s);
        }
    }

    struct Circle {
        radius: f32,
    }

    impl Shape for Circle {
        fn area(&self) -> f32 {
            3.0 * self.radius * self.radius
        }
    }

    impl Component for Circle {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.provide::<dyn Shape>(|c| c, |c| c);
        }
    }

    /// Records hook calls and claims `dyn Shape` eagerly.
    struct Eager {
        log: Arc<StdMutex<Vec<String>>>,
    }

    impl Shape for Eager {
        fn area(&self) -> f32 {
            -1.0
        }
    }

    impl Component for Eager {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.provide::<dyn Shape>(|e| e, |e| e);
        }

        fn on_add(&mut self, attach: &mut Attach<'_>) {
            let seen = attach.container().len();
            self.log.lock().unwrap().push(format!("add:{seen}"));
            attach.register_as::<dyn Shape>();
            attach.register_as::<dyn Tinted>();
        }

        fn on_remove(&mut self, container: &ComponentContainer) {
            let seen = container.len();
            self.log.lock().unwrap().push(format!("remove:{seen}"));
        }
    }

    #[test]
    fn lookup_by_concrete_and_capability() {
        let mut container = ComponentContainer::new();
        container.add_component(Square { side: 2.0 });

        assert_eq!(container.get_component::<Square>(), Some(&Square { side: 2.0 }));
        assert_eq!(container.get_component::<dyn Shape>().unwrap().area(), 4.0);
        assert_eq!(container.get_component::<dyn Tinted>().unwrap().tint(), 0xff0000);
        assert!(container.get_component::<Circle>().is_none());
        assert!(!container.has_component::<Circle>());
    }

    #[test]
    fn removing_component_clears_every_capability() {
        let mut container = ComponentContainer::new();
        container.add_component(Square { side: 1.0 });
        assert!(container.get_component::<dyn Shape>().is_some());

        assert!(container.remove_component::<Square>());
        assert!(!container.has_component::<dyn Shape>());
        assert!(!container.has_component::<dyn Tinted>());
        assert!(!container.has_component::<Square>());
        assert!(container.is_empty());
    }

    #[test]
    fn cached_lookup_survives_second_match() {
        let mut container = ComponentContainer::new();
        container.add_component(Square { side: 2.0 });
        assert_eq!(container.get_component::<dyn Shape>().unwrap().area(), 4.0);

        container.add_component(Circle { radius: 1.0 });
        assert_eq!(container.get_component::<dyn Shape>().unwrap().area(), 4.0);

        container.remove_component::<Square>();
        assert_eq!(container.get_component::<dyn Shape>().unwrap().area(), 3.0);
    }

    #[test]
    fn removing_one_of_two_keeps_capability() {
        let mut container = ComponentContainer::new();
        container.add_component(Square { side: 2.0 });
        container.add_component(Circle { radius: 1.0 });
        // Cache the circle under its concrete type and the square under the trait.
        assert!(container.has_component::<Circle>());
        assert!(container.has_component::<dyn Shape>());

        assert!(container.remove_component::<Circle>());
        assert!(container.has_component::<dyn Shape>());
        assert_eq!(container.get_component::<dyn Shape>().unwrap().area(), 4.0);

        assert!(container.remove_component::<dyn Shape>());
        assert!(!container.has_component::<dyn Shape>());
    }

    #[test]
    fn removal_shifts_cached_indices() {
        let mut container = ComponentContainer::new();
        container.add_component(Square { side: 1.0 });
        container.add_component(Circle { radius: 2.0 });
        assert_eq!(container.get_component::<Circle>().unwrap().radius, 2.0);

        container.remove_component::<Square>();
        assert_eq!(container.get_component::<Circle>().unwrap().radius, 2.0);
        assert_eq!(container.get_component::<dyn Shape>().unwrap().area(), 12.0);
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut container = ComponentContainer::new();
        assert!(!container.remove_component::<Square>());
        assert!(!container.remove_component::<dyn Shape>());
    }

    #[test]
    fn mutable_lookup_through_capability() {
        let mut container = ComponentContainer::new();
        container.add_component(Square { side: 1.0 }).side = 3.0;
        assert_eq!(container.get_component::<dyn Shape>().unwrap().area(), 9.0);

        container.get_component_mut::<Square>().unwrap().side = 4.0;
        assert_eq!(container.get_component_mut::<dyn Shape>().unwrap().area(), 16.0);
    }

    #[test]
    fn same_type_overwrites_in_place() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut container = ComponentContainer::new();
        container.add_component(Square { side: 1.0 });
        container.add_component(Eager { log: log.clone() });
        container.add_component(Eager { log: log.clone() });

        assert_eq!(container.len(), 2);
        assert_eq!(*log.lock().unwrap(), vec!["add:1", "add:2", "remove:2"]);
    }

    #[test]
    fn eager_alias_overrides_earlier_component() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut container = ComponentContainer::new();
        container.add_component(Square { side: 2.0 });
        assert_eq!(container.get_component::<dyn Shape>().unwrap().area(), 4.0);

        container.add_component(Eager { log });
        assert_eq!(container.get_component::<dyn Shape>().unwrap().area(), -1.0);
        // Undeclared alias is ignored: Tinted still resolves to the square.
        assert_eq!(container.get_component::<dyn Tinted>().unwrap().tint(), 0xff0000);

        container.remove_component::<Eager>();
        assert_eq!(container.get_component::<dyn Shape>().unwrap().area(), 4.0);
    }

    #[test]
    fn hooks_see_container_without_removed_component() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut container = ComponentContainer::new();
        container.add_component(Eager { log: log.clone() });
        container.add_component(Square { side: 1.0 });
        container.remove_component::<Eager>();

        assert_eq!(*log.lock().unwrap(), vec!["add:0", "remove:1"]);
    }

    #[test]
    fn clear_detaches_everything() {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut container = ComponentContainer::new();
        container.add_component(Eager { log: log.clone() });
        container.add_component(Square { side: 1.0 });
        assert!(container.has_component::<dyn Shape>());

        container.clear_components();
        assert!(container.is_empty());
        assert!(!container.has_component::<dyn Shape>());
        assert_eq!(*log.lock().unwrap(), vec!["add:0", "remove:0"]);
    }

    #[test]
    fn capability_ids_follow_insertion_order() {
        let mut container = ComponentContainer::new();
        container.add_component(Circle { radius: 1.0 });
        container.add_component(Square { side: 1.0 });
        let ids: Vec<_> = container.capability_ids().collect();
        assert_eq!(
            ids,
            vec![
                CapabilityId::of::<Circle>(),
                CapabilityId::of::<dyn Shape>(),
                CapabilityId::of::<Square>(),
                CapabilityId::of::<dyn Shape>(),
                CapabilityId::of::<dyn Tinted>(),
            ]
        );
    }
}
