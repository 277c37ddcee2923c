//! Wrapp Autowire injects marked members of an object, and of every object injected into it.
//!
//! Autowire is split into two major parts:
//! 1. The inspector: turns the [Autowire] declaration of a type into a cached list of members
//! 2. The graph resolver: walks the object graph breadth first, asking a [ServiceResolver] for
//!    the value of every member
//!
//! # Examples
//!
//! ```ignore
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct Controller {
//!     greeter: Autowired<Arc<dyn Greeter>>,
//!     plugins: Autowired<Vec<Arc<dyn Plugin>>>,
//! }
//! impl Autowire for Controller {
//!     fn autowire(members: &mut Members<Self>) {
//!         members
//!             .autowire("greeter", |c| &c.greeter)
//!             .autowire("plugins", |c| &c.plugins);
//!     }
//! }
//!
//! let controller = Controller::default();
//! wrapp_autowire::resolve(&resolver, &controller)?;
//! println!("{}", controller.greeter.get().greet());
//! ```
//!
//! Objects are walked at most once per resolve call, so cycles between injected objects are fine.
//! A single value member without a matching service aborts with
//! [InjectError::UnresolvedDependency]; a collection member without services is just empty.

pub mod component;
pub mod errors;
pub mod graph;
pub mod inspector;
pub mod resolver;
pub mod types;

pub use component::{Autowire, Autowired, Component};
pub use errors::InjectError;
pub use graph::{CollectionTracking, GraphResolver};
pub use inspector::{members, InjectionTarget, Members};
pub use resolver::{Dependency, DependencyInfo, Resolved, ServiceResolver};
pub use types::{Identity, Injectable, Instance, Services, TypeInfo};

/// Injects `root` and everything reachable from it, using the default [GraphResolver]
pub fn resolve<R: ServiceResolver + ?Sized>(
    resolver: &R,
    root: &dyn Component,
) -> Result<(), InjectError> {
    GraphResolver::default().resolve(resolver, root)
}
