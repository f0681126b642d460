//! Raw object storage boundary.
//!
//! `Storage<T>` is what every layer above consumes: the in-memory backend, the
//! strategy-driven [`GenericStore`](crate::GenericStore), and the RBAC
//! policy-enforcing decorators all implement it, so they stack freely.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use warden_core::{Object, ObjectKey, SelectionPredicate};

use crate::error::StorageError;

/// Change notification delivered to watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "object")]
pub enum WatchEvent<T> {
    Added(T),
    Modified(T),
    Deleted(T),
}

impl<T> WatchEvent<T> {
    pub fn object(&self) -> &T {
        match self {
            WatchEvent::Added(o) | WatchEvent::Modified(o) | WatchEvent::Deleted(o) => o,
        }
    }
}

/// A subscription to changes of one resource kind.
///
/// Ends (`recv` returns `None`) once the backend drops its sender.
#[derive(Debug)]
pub struct WatchStream<T> {
    rx: Receiver<WatchEvent<T>>,
}

impl<T> WatchStream<T> {
    pub fn new(rx: Receiver<WatchEvent<T>>) -> Self {
        Self { rx }
    }

    pub fn recv(&self) -> Option<WatchEvent<T>> {
        self.rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<WatchEvent<T>, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<WatchEvent<T>, TryRecvError> {
        self.rx.try_recv()
    }
}

/// CRUD + watch storage for one resource kind.
///
/// Implementations must:
/// - reject `create` of an existing key with `AlreadyExists`
/// - reject `update` whose non-zero `resource_version` differs from the stored one with `Conflict`
/// - assign a fresh `resource_version` on every write
pub trait Storage<T: Object>: Send + Sync {
    fn get(&self, key: &ObjectKey) -> Result<T, StorageError>;

    /// List objects, optionally restricted to one namespace.
    fn list(
        &self,
        namespace: Option<&str>,
        predicate: &SelectionPredicate,
    ) -> Result<Vec<T>, StorageError>;

    fn create(&self, obj: T) -> Result<T, StorageError>;

    fn update(&self, obj: T) -> Result<T, StorageError>;

    /// Delete and return the last stored state.
    fn delete(&self, key: &ObjectKey) -> Result<T, StorageError>;

    fn watch(&self, namespace: Option<&str>) -> Result<WatchStream<T>, StorageError>;
}

impl<T, S> Storage<T> for Arc<S>
where
    T: Object,
    S: Storage<T> + ?Sized,
{
    fn get(&self, key: &ObjectKey) -> Result<T, StorageError> {
        (**self).get(key)
    }

    fn list(
        &self,
        namespace: Option<&str>,
        predicate: &SelectionPredicate,
    ) -> Result<Vec<T>, StorageError> {
        (**self).list(namespace, predicate)
    }

    fn create(&self, obj: T) -> Result<T, StorageError> {
        (**self).create(obj)
    }

    fn update(&self, obj: T) -> Result<T, StorageError> {
        (**self).update(obj)
    }

    fn delete(&self, key: &ObjectKey) -> Result<T, StorageError> {
        (**self).delete(key)
    }

    fn watch(&self, namespace: Option<&str>) -> Result<WatchStream<T>, StorageError> {
        (**self).watch(namespace)
    }
}
