//! Document store contract
//!
//! Contains the generic document shape and the store interface the
//! simulator is written against.

pub mod model;
pub mod store;

pub use model::{Document, DocumentId, Fields, Filter};
pub use store::DocumentStore;
