use std::{
    any::TypeId,
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, OnceLock},
};

use wrapp_autowire::{Autowire, Injectable, Instance, ServiceResolver, Services, TypeInfo};

/// A provider of already built services.
///
/// Services are registered and looked up by the type they are provided as. A type may be
/// registered more than once: single lookups return the latest registration, collection
/// lookups return all of them in registration order.
#[derive(Default)]
pub struct ServiceProvider {
    services: HashMap<TypeId, Registration>,
}

struct Registration {
    info: TypeInfo,
    instances: Vec<Instance>,
    /// Built on the first collection lookup after a registration, the same allocation is
    /// handed out until the next one
    snapshot: OnceLock<Services>,
}
impl Registration {
    fn push(&mut self, instance: Instance) {
        self.instances.push(instance);
        self.snapshot = OnceLock::new();
    }

    fn snapshot(&self) -> Services {
        self.snapshot
            .get_or_init(|| Services::new(self.instances.clone()))
            .clone()
    }
}

impl Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("ServiceProvider");
        for registration in self.services.values() {
            map.field(registration.info.type_name, &registration.instances.len());
        }
        map.finish()
    }
}

impl ServiceProvider {
    /// Initializes an empty Service Provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service as its own concrete type
    pub fn add<T: Autowire>(&mut self, service: Arc<T>) -> &mut Self {
        self.add_instance(Instance::new(service))
    }

    /// Register a service as `A`, usually a `dyn Trait` it implements
    ///
    /// ```ignore
    /// provider.add_as(Arc::new(English), |english| english as Arc<dyn Greeter>);
    /// ```
    pub fn add_as<T: Autowire, A: ?Sized + Injectable>(
        &mut self,
        service: Arc<T>,
        alias: impl FnOnce(Arc<T>) -> Arc<A>,
    ) -> &mut Self {
        self.add_instance(Instance::aliased(service, alias))
    }

    /// Can optionally register a service.
    ///
    /// If the service provided is `Some(T)`, it will be the same as calling [`ServiceProvider::add`]
    /// If the service provided is `None`, then the function just returns `self` for chaining
    pub fn maybe_add<T: Autowire>(&mut self, service: Option<Arc<T>>) -> &mut Self {
        match service {
            Some(service) => self.add(service),
            None => self,
        }
    }

    /// Register an already wrapped instance
    pub fn add_instance(&mut self, instance: Instance) -> &mut Self {
        tracing::debug!("Registered {} as {}", instance.info, instance.provides);

        let provides = instance.provides;
        let registration = self
            .services
            .entry(provides.type_id)
            .or_insert_with(|| Registration {
                info: provides,
                instances: Vec::new(),
                snapshot: OnceLock::new(),
            });
        registration.push(instance);
        self
    }

    /// Retrieve the latest service registered as `A`
    pub fn get<A: ?Sized + Injectable>(&self) -> Option<Arc<A>> {
        self.resolve_one(TypeInfo::of::<A>())
            .and_then(|instance| instance.downcast().ok())
    }

    /// Retrieve every service registered as `A`
    pub fn get_all<A: ?Sized + Injectable>(&self) -> Vec<Arc<A>> {
        self.resolve_all(TypeInfo::of::<A>())
            .iter()
            .filter_map(|instance| instance.downcast().ok())
            .collect()
    }
}

impl ServiceResolver for ServiceProvider {
    fn resolve_one(&self, service: TypeInfo) -> Option<Instance> {
        self.services
            .get(&service.type_id)
            .and_then(|registration| registration.instances.last().cloned())
    }

    fn resolve_all(&self, service: TypeInfo) -> Services {
        self.services
            .get(&service.type_id)
            .map(Registration::snapshot)
            .unwrap_or_default()
    }
}
