//! Storage Adapters
//!
//! Implementations of the LocalStore port.
//!
//! ## Available Adapters
//!
//! - **FileLocalStore** - One JSON file per key on disk
//! - **InMemoryLocalStore** - Process-local map (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileLocalStore, InMemoryLocalStore};
//!
//! // Production: survives restarts
//! let store = FileLocalStore::new("./data/onboarding");
//!
//! // Testing: in-memory
//! let store = InMemoryLocalStore::new();
//! ```

mod file_local_store;
mod in_memory_local_store;

pub use file_local_store::FileLocalStore;
pub use in_memory_local_store::InMemoryLocalStore;
