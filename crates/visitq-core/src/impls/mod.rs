//! Impls - port implementations for local runs and tests.
//!
//! Production deployments plug their own database, resolver and chat
//! client in behind the same ports.

pub mod device_catalog;
pub mod inmem_store;
pub mod log_messenger;
pub mod offloaded_resolver;
pub mod static_owners;

pub use self::device_catalog::{CatalogError, DeviceCatalog};
pub use self::inmem_store::InMemoryStore;
pub use self::log_messenger::LogMessenger;
pub use self::offloaded_resolver::OffloadedResolver;
pub use self::static_owners::StaticOwnerDirectory;
