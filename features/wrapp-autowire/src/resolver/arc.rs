use std::{any::type_name, sync::Arc};

use crate::{
    errors::InjectError,
    resolver::{Dependency, DependencyInfo, Resolved},
    types::{Injectable, TypeInfo},
};

impl<T: ?Sized + Injectable> Dependency for Arc<T> {
    fn dependency_info() -> DependencyInfo {
        DependencyInfo {
            type_info: TypeInfo::of::<T>(),
            collection: false,
        }
    }

    fn from_resolved(resolved: &Resolved) -> Result<Self, InjectError> {
        let Resolved::One(instance) = resolved else {
            return Err(InjectError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type: resolved.type_name(),
            });
        };

        instance
            .downcast::<T>()
            .map_err(|actual_type| InjectError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            })
    }
}
