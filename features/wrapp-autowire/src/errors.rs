use thiserror::Error;

use crate::types::TypeInfo;

/// Errors while autowiring an object graph
///
/// Any error aborts the whole resolve call. Members assigned before the error stay assigned,
/// so the graph must not be used afterwards.
#[derive(Error, Debug, Clone)]
pub enum InjectError {
    /// A single value member could not be satisfied by the resolver
    #[error("Unable to resolve dependency '{dependency}' for member '{member}' of '{required_by}'")]
    UnresolvedDependency {
        dependency: TypeInfo,
        required_by: TypeInfo,
        member: &'static str,
    },

    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
}
