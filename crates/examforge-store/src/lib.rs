//! examforge-store — Profile persistence.
//!
//! Implementations of the `ProfileStore` trait (in-memory and JSON-file
//! backed, both versioned for conditional writes) plus the
//! `MasteryTracker`, the one component in the engine that writes shared
//! state.

pub mod json;
pub mod memory;
pub mod tracker;

pub use json::JsonFileProfileStore;
pub use memory::MemoryProfileStore;
pub use tracker::MasteryTracker;
