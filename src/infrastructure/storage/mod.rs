//! Document store backends

pub mod appwrite;
pub mod memory;

pub use appwrite::AppwriteStore;
pub use memory::InMemoryStore;
