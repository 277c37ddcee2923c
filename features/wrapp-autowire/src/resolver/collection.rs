use std::{any::type_name, sync::Arc};

use crate::{
    errors::InjectError,
    resolver::{Dependency, DependencyInfo, Resolved},
    types::{Injectable, TypeInfo},
};

/// Collections inject every instance of their element type
impl<T: ?Sized + Injectable> Dependency for Vec<Arc<T>> {
    fn dependency_info() -> DependencyInfo {
        DependencyInfo {
            type_info: TypeInfo::of::<T>(),
            collection: true,
        }
    }

    fn from_resolved(resolved: &Resolved) -> Result<Self, InjectError> {
        let Resolved::All(services) = resolved else {
            return Err(InjectError::DowncastFailed {
                required_type: type_name::<Self>(),
                actual_type: resolved.type_name(),
            });
        };

        services
            .iter()
            .map(|instance| {
                instance
                    .downcast::<T>()
                    .map_err(|actual_type| InjectError::DowncastFailed {
                        required_type: type_name::<T>(),
                        actual_type,
                    })
            })
            .collect()
    }
}
