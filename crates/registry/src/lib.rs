//! Storage layer: the raw object store contract, an in-memory backend, and
//! strategy-driven generic REST storage.

pub mod error;
pub mod generic;
pub mod memory;
pub mod storage;
pub mod storageclass;
pub mod strategy;

pub use error::StorageError;
pub use generic::GenericStore;
pub use memory::InMemoryStorage;
pub use storage::{Storage, WatchEvent, WatchStream};
pub use strategy::RestStrategy;
