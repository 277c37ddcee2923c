//! Wrapp Services provides an in memory registry of already built services, which the autowire
//! graph resolver can look up.
//!
//! # Examples
//!
//! ```ignore
//! let mut provider = ServiceProvider::new();
//! provider
//!     .add_as(Arc::new(English), |english| english as Arc<dyn Greeter>)
//!     .add(Arc::new(AuditLog::default()));
//!
//! let controller = Controller::default();
//! wrapp_autowire::resolve(&provider, &controller)?;
//! ```

pub mod provider;

pub use provider::ServiceProvider;
