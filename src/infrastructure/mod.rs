//! Infrastructure layer
//!
//! Concrete document store implementations (Appwrite REST, in-memory).

pub mod storage;

pub use storage::{AppwriteStore, InMemoryStore};
