use std::{
    any::Any,
    fmt::Debug,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{
    inspector::{self, InjectionTarget, Members},
    types::{Injectable, TypeInfo},
};

/// Declares which members of a type are injected
///
/// Types without injectable members only need an empty impl.
///
/// # Example
/// ```ignore
/// #[derive(Default)]
/// struct Controller {
///     greeter: Autowired<Arc<dyn Greeter>>,
///     plugins: Autowired<Vec<Arc<dyn Plugin>>>,
/// }
/// impl Autowire for Controller {
///     fn autowire(members: &mut Members<Self>) {
///         members
///             .autowire("greeter", |c| &c.greeter)
///             .autowire("plugins", |c| &c.plugins);
///     }
/// }
/// ```
pub trait Autowire: Injectable + Sized {
    fn autowire(_members: &mut Members<Self>) {}
}

/// Object safe view of an [Autowire] type, used while walking the graph
pub trait Component: Injectable {
    fn type_info(&self) -> TypeInfo;

    /// Injectable members of the concrete type, taken from the process wide cache
    fn injection_targets(&self) -> Arc<[InjectionTarget]>;

    fn as_any(&self) -> &(dyn Any + Send + Sync);
}
impl<T: Autowire> Component for T {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn injection_targets(&self) -> Arc<[InjectionTarget]> {
        inspector::members::<T>()
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

/// A member slot filled in by the graph resolver
///
/// Should only be accessed after autowiring has completed.
pub struct Autowired<D> {
    value: RwLock<Option<D>>,
}
impl<D> Default for Autowired<D> {
    fn default() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }
}
impl<D: Debug> Debug for Autowired<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.value.read().unwrap_or_else(PoisonError::into_inner);
        match &*value {
            Some(value) => f.debug_tuple("Autowired").field(value).finish(),
            None => f.debug_tuple("Autowired").field(&"Unset").finish(),
        }
    }
}

impl<D> Autowired<D> {
    pub fn is_wired(&self) -> bool {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn set(&self, value: D) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }
}
impl<D: Clone> Autowired<D> {
    /// Accesses the injected value
    ///
    /// # Panics
    /// - When accessed before the member was autowired
    pub fn get(&self) -> D {
        self.try_get()
            .expect("Autowired member accessed before it was injected")
    }

    /// Try to access the injected value
    pub fn try_get(&self) -> Option<D> {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
