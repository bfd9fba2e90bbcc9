//! Nav Cache - slug resolution and existence caching for navigation
//!
//! Resolves human-friendly project and document identifiers to canonical
//! entities, remembers what exists in a bounded LRU/TTL store, and warms that
//! store ahead of navigation without duplicating in-flight work.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod existence;
pub mod models;
pub mod prefetch;
pub mod resolver;
pub mod slug;
pub mod store;
pub mod tasks;

mod lock;

pub use api::AppState;
pub use config::Config;
pub use existence::{Existence, ExistenceCache};
pub use prefetch::{PrefetchCoordinator, PrefetchOutcome};
pub use resolver::{Resolution, SlugResolver};
pub use store::{BoundedStore, SharedStore};
pub use tasks::spawn_sweep_task;
