use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::component::Component;

/// Identifies something a component can be looked up as: its own concrete type
/// or a capability trait object such as `dyn Transform`.
#[derive(Clone, Copy)]
pub struct CapabilityId {
    id: TypeId,
    name: &'static str,
}

impl CapabilityId {
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    /// Human-readable type name, for logging.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for CapabilityId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CapabilityId {}

impl Hash for CapabilityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilityId({})", self.name)
    }
}

/// Type-erased view from a concrete component to one capability.
trait ErasedCast<C: ?Sized>: Send + Sync {
    fn cast<'a>(&self, component: &'a dyn Any) -> Option<&'a C>;
    fn cast_mut<'a>(&self, component: &'a mut dyn Any) -> Option<&'a mut C>;
}

struct TypedCast<T, C: ?Sized> {
    view: fn(&T) -> &C,
    view_mut: fn(&mut T) -> &mut C,
}

impl<T: 'static, C: ?Sized + 'static> ErasedCast<C> for TypedCast<T, C> {
    fn cast<'a>(&self, component: &'a dyn Any) -> Option<&'a C> {
        component.downcast_ref::<T>().map(self.view)
    }

    fn cast_mut<'a>(&self, component: &'a mut dyn Any) -> Option<&'a mut C> {
        component.downcast_mut::<T>().map(self.view_mut)
    }
}

/// Builder handed to [`Component::capabilities`] to declare what a component type
/// can be looked up as.
///
/// ```ignore
/// impl Component for Particle {
///     fn capabilities(caps: &mut Capabilities<Self>) {
///         caps.provide::<dyn Transform>(|p| p, |p| p)
///             .provide::<dyn Velocity>(|p| p, |p| p);
///     }
/// }
/// ```
pub struct Capabilities<T> {
    table: CapabilityTable,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> Capabilities<T> {
    /// Collect the full table for `T`: its concrete type first, then its declarations.
    pub(crate) fn collect() -> CapabilityTable {
        let mut caps = Self {
            table: CapabilityTable::default(),
            _marker: PhantomData,
        };
        caps.provide::<T>(|t| t, |t| t);
        T::capabilities(&mut caps);
        caps.table
    }

    /// Declare that `T` can be viewed as `C`. Declaring the same capability twice
    /// keeps the latest views.
    pub fn provide<C: ?Sized + 'static>(
        &mut self,
        view: fn(&T) -> &C,
        view_mut: fn(&mut T) -> &mut C,
    ) -> &mut Self {
        let id = CapabilityId::of::<C>();
        let cast: Box<dyn ErasedCast<C>> = Box::new(TypedCast { view, view_mut });
        if self.table.casts.insert(id, Box::new(cast)).is_none() {
            self.table.ids.push(id);
        }
        self
    }
}

/// Erased capability table of one concrete component type.
#[derive(Default)]
pub(crate) struct CapabilityTable {
    ids: Vec<CapabilityId>,
    casts: HashMap<CapabilityId, Box<dyn Any + Send + Sync>>,
}

impl CapabilityTable {
    /// Every capability of the component, its concrete type first.
    pub fn ids(&self) -> &[CapabilityId] {
        &self.ids
    }

    pub fn provides(&self, id: CapabilityId) -> bool {
        self.casts.contains_key(&id)
    }

    pub fn cast<'a, C: ?Sized + 'static>(&self, component: &'a dyn Any) -> Option<&'a C> {
        self.casts
            .get(&CapabilityId::of::<C>())?
            .downcast_ref::<Box<dyn ErasedCast<C>>>()?
            .cast(component)
    }

    pub fn cast_mut<'a, C: ?Sized + 'static>(
        &self,
        component: &'a mut dyn Any,
    ) -> Option<&'a mut C> {
        self.casts
            .get(&CapabilityId::of::<C>())?
            .downcast_ref::<Box<dyn ErasedCast<C>>>()?
            .cast_mut(component)
    }
}
