//! Member inspection
//!
//! Turns the [Autowire] declaration of a type into a list of [InjectionTarget]s.
//! Member layout never changes once a type exists, so every list is computed once and kept for the
//! rest of the process.

use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    fmt::Debug,
    marker::PhantomData,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use crate::{
    component::{Autowire, Autowired, Component},
    errors::InjectError,
    resolver::{Dependency, Resolved},
    types::{Injectable, TypeInfo},
};

type Assign = dyn Fn(&dyn Component, &Resolved) -> Result<(), InjectError> + Send + Sync;

/// A member of a type which receives a value from the resolver
#[derive(Clone)]
pub struct InjectionTarget {
    /// Type the member is declared on - the base type for inherited members
    pub declaring_type: TypeInfo,
    pub member: &'static str,
    /// Type looked up on the resolver - the element type for collections
    pub target_type: TypeInfo,
    pub is_collection: bool,
    assign: Arc<Assign>,
}
impl Debug for InjectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionTarget")
            .field("declaring_type", &self.declaring_type.type_name)
            .field("member", &self.member)
            .field("target_type", &self.target_type.type_name)
            .field("is_collection", &self.is_collection)
            .finish()
    }
}
impl InjectionTarget {
    /// Writes the resolved value into the member of `object`
    ///
    /// `object` must be of the type the target was inspected from.
    pub fn assign(&self, object: &dyn Component, resolved: &Resolved) -> Result<(), InjectError> {
        (self.assign)(object, resolved)
    }
}

/// Collects the injectable members of `T`
pub struct Members<T> {
    targets: Vec<InjectionTarget>,
    _marker: PhantomData<fn(&T)>,
}
impl<T: Autowire> Members<T> {
    fn new() -> Self {
        Self {
            targets: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Injects the member using the type of its slot
    pub fn autowire<D: Dependency>(
        &mut self,
        member: &'static str,
        slot: fn(&T) -> &Autowired<D>,
    ) -> &mut Self {
        self.autowire_as::<D, D>(member, slot, |value| value)
    }

    /// Injects the member by looking up `R` instead of the slot type
    ///
    /// `R` also decides whether the member is a collection.
    pub fn autowire_as<R: Dependency, D: Injectable>(
        &mut self,
        member: &'static str,
        slot: fn(&T) -> &Autowired<D>,
        convert: fn(R) -> D,
    ) -> &mut Self {
        let dependency = R::dependency_info();
        let assign: Arc<Assign> = Arc::new(
            move |object: &dyn Component, resolved: &Resolved| -> Result<(), InjectError> {
                let object = downcast_object::<T>(object)?;
                let value = R::from_resolved(resolved)?;
                slot(object).set(convert(value));
                Ok(())
            },
        );

        self.targets.push(InjectionTarget {
            declaring_type: TypeInfo::of::<T>(),
            member,
            target_type: dependency.type_info,
            is_collection: dependency.collection,
            assign,
        });
        self
    }

    /// Adds all injectable members of an embedded base type
    pub fn inherit<B: Autowire>(&mut self, base: fn(&T) -> &B) -> &mut Self {
        for target in members::<B>().iter() {
            let inner = target.assign.clone();
            let assign: Arc<Assign> = Arc::new(
                move |object: &dyn Component, resolved: &Resolved| -> Result<(), InjectError> {
                    let embedded: &dyn Component = base(downcast_object::<T>(object)?);
                    inner(embedded, resolved)
                },
            );

            self.targets.push(InjectionTarget {
                assign,
                ..target.clone()
            });
        }
        self
    }
}

fn downcast_object<T: Autowire>(object: &dyn Component) -> Result<&T, InjectError> {
    object
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| InjectError::DowncastFailed {
            required_type: type_name::<T>(),
            actual_type: object.type_info().type_name,
        })
}

type MemberCache = RwLock<HashMap<TypeId, Arc<[InjectionTarget]>>>;

/// Process wide, only ever grows
static MEMBER_CACHE: OnceLock<MemberCache> = OnceLock::new();

/// Returns the injectable members of `T`, in declaration order
///
/// The first call for a type computes the list; every later call returns the cached one.
/// Threads racing on the first call all end up with the list that was published first.
pub fn members<T: Autowire>() -> Arc<[InjectionTarget]> {
    let cache = MEMBER_CACHE.get_or_init(Default::default);
    let type_id = TypeId::of::<T>();

    let cached = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .cloned();
    if let Some(targets) = cached {
        return targets;
    }

    // Computed without holding the lock - `inherit` looks up other types
    let mut declared = Members::<T>::new();
    T::autowire(&mut declared);
    let computed: Arc<[InjectionTarget]> = declared.targets.into();

    tracing::trace!(
        "Inspected {} with {} injectable members",
        type_name::<T>(),
        computed.len()
    );

    cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(type_id)
        .or_insert(computed)
        .clone()
}
