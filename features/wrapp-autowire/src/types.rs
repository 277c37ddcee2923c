use std::{
    any::{Any, TypeId},
    fmt::Debug,
    sync::Arc,
};

use crate::component::{Autowire, Component};

/// Anything that lives in an object graph may be shared across threads
/// So injectable values need to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// Address and concrete type of an object
///
/// Two values are the same object only if they share both, equal contents do not matter. The
/// type tells apart a struct and its first field, which live at the same address.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Identity {
    address: usize,
    type_id: TypeId,
}
impl Identity {
    /// Identity of a component, borrowed or held in an [Arc]
    pub fn of(component: &dyn Component) -> Self {
        Identity {
            address: std::ptr::from_ref(component).cast::<()>() as usize,
            type_id: component.type_info().type_id,
        }
    }
}

/// A resolved object, as handed out by a [crate::ServiceResolver]
///
/// Holds two views of the same allocation: the concrete [Component] used to walk its members,
/// and the value it is provided as (which may be a `dyn Trait`).
#[derive(Clone)]
pub struct Instance {
    /// Concrete type of the object
    pub info: TypeInfo,
    /// Type the object is provided as
    pub provides: TypeInfo,
    component: Arc<dyn Component>,
    provided: Arc<dyn Any + Send + Sync>,
}
impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.info.type_name)
            .field("provides", &self.provides.type_name)
            .finish()
    }
}

impl Instance {
    /// Provides the object as its own concrete type
    pub fn new<T: Autowire>(instance: Arc<T>) -> Self {
        Self::aliased(instance, |instance| instance)
    }

    /// Provides the object as `A` - usually a `dyn Trait` the object implements
    ///
    /// ```ignore
    /// let instance = Instance::aliased(Arc::new(English), |english| english as Arc<dyn Greeter>);
    /// ```
    pub fn aliased<T: Autowire, A: ?Sized + Injectable>(
        instance: Arc<T>,
        alias: impl FnOnce(Arc<T>) -> Arc<A>,
    ) -> Self {
        let provided: Arc<A> = alias(instance.clone());
        Instance {
            info: TypeInfo::of::<T>(),
            provides: TypeInfo::of::<A>(),
            component: instance,
            provided: Arc::new(provided),
        }
    }

    /// Returns the provided value, or the name of the provided type if it is not an `A`
    pub fn downcast<A: ?Sized + 'static>(&self) -> Result<Arc<A>, &'static str> {
        self.provided
            .downcast_ref::<Arc<A>>()
            .cloned()
            .ok_or(self.provides.type_name)
    }

    pub fn identity(&self) -> Identity {
        Identity::of(&*self.component)
    }

    pub fn component(&self) -> &Arc<dyn Component> {
        &self.component
    }
}

/// All instances resolved for one type
///
/// The collection is a single shared allocation with an [Identity] of its own.
#[derive(Clone, Debug)]
pub struct Services(Arc<[Instance]>);
impl Default for Services {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
impl From<Vec<Instance>> for Services {
    fn from(instances: Vec<Instance>) -> Self {
        Self::new(instances)
    }
}
impl FromIterator<Instance> for Services {
    fn from_iter<I: IntoIterator<Item = Instance>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Services {
    pub fn new(instances: Vec<Instance>) -> Self {
        Services(instances.into())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn identity(&self) -> Identity {
        Identity {
            address: Arc::as_ptr(&self.0).cast::<()>() as usize,
            type_id: TypeId::of::<[Instance]>(),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<[Instance]> {
        &self.0
    }
}
impl<'a> IntoIterator for &'a Services {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
