//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the process is up.
//!
//! # Tasks
//! - In-flight sweep: drops expired prefetch markers so the guard stays bounded

mod sweep;

pub use sweep::spawn_sweep_task;
