use crate::{
    errors::InjectError,
    types::{Instance, Services, TypeInfo},
};

pub mod arc;
pub mod collection;

/// Backing lookup for injected values
///
/// Pure lookup only - implementations hand out existing instances.
#[cfg_attr(test, mockall::automock)]
pub trait ServiceResolver {
    /// One instance of the requested type, if any is known
    fn resolve_one(&self, service: TypeInfo) -> Option<Instance>;

    /// All instances of the requested type, possibly none
    fn resolve_all(&self, service: TypeInfo) -> Services;
}

/// What the resolver returned for a member
#[derive(Debug, Clone)]
pub enum Resolved {
    One(Instance),
    All(Services),
}
impl Resolved {
    pub fn type_name(&self) -> &'static str {
        match self {
            Resolved::One(instance) => instance.provides.type_name,
            Resolved::All(_) => std::any::type_name::<Services>(),
        }
    }
}

/// Information about what a member needs from the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyInfo {
    /// The type to look up - the element type for collections
    pub type_info: TypeInfo,
    /// If all instances are injected, instead of exactly one
    pub collection: bool,
}

/// A value type which can be stored in an injected member
pub trait Dependency: Sized + Send + Sync + 'static {
    fn dependency_info() -> DependencyInfo;

    /// Converts the resolved value into the member's value
    fn from_resolved(resolved: &Resolved) -> Result<Self, InjectError>;
}
