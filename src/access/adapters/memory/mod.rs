//! In-memory access store.

mod store;

pub use store::InMemoryAccessStore;
