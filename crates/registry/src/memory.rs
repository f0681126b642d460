use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock, mpsc};

use chrono::Utc;

use warden_core::{Object, ObjectKey, SelectionPredicate, Uid};

use crate::error::StorageError;
use crate::storage::{Storage, WatchEvent, WatchStream};

#[derive(Debug)]
struct State<T> {
    objects: BTreeMap<ObjectKey, T>,
    /// Last assigned resource version (shared by all objects of the kind).
    revision: u64,
}

#[derive(Debug)]
struct Watcher<T> {
    namespace: Option<String>,
    tx: mpsc::Sender<WatchEvent<T>>,
}

/// In-memory object store.
///
/// Intended for tests/dev. Honours the full [`Storage`] contract: name
/// uniqueness, optimistic concurrency on `resource_version`, server-assigned
/// UIDs/timestamps, and watch fan-out.
#[derive(Debug)]
pub struct InMemoryStorage<T> {
    state: RwLock<State<T>>,
    watchers: Mutex<Vec<Watcher<T>>>,
}

impl<T> InMemoryStorage<T> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                objects: BTreeMap::new(),
                revision: 0,
            }),
            watchers: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Default for InMemoryStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Object> InMemoryStorage<T> {
    /// Number of stored objects (all namespaces).
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn not_found(key: &ObjectKey) -> StorageError {
        StorageError::NotFound {
            resource: T::RESOURCE,
            key: key.clone(),
        }
    }

    // Called with the state write lock held so watchers observe writes in order.
    fn notify(&self, event: WatchEvent<T>) {
        let Ok(mut watchers) = self.watchers.lock() else {
            return;
        };
        let namespace = event.object().namespace().map(str::to_owned);

        // Drop any dead watchers while publishing.
        watchers.retain(|w| match &w.namespace {
            Some(ns) if Some(ns) != namespace.as_ref() => true,
            _ => w.tx.send(event.clone()).is_ok(),
        });
    }
}

impl<T: Object> Storage<T> for InMemoryStorage<T> {
    fn get(&self, key: &ObjectKey) -> Result<T, StorageError> {
        let state = self.state.read().map_err(|_| StorageError::poisoned())?;
        state.objects.get(key).cloned().ok_or_else(|| Self::not_found(key))
    }

    fn list(
        &self,
        namespace: Option<&str>,
        predicate: &SelectionPredicate,
    ) -> Result<Vec<T>, StorageError> {
        let state = self.state.read().map_err(|_| StorageError::poisoned())?;

        Ok(state
            .objects
            .iter()
            .filter(|(key, _)| namespace.is_none() || key.namespace.as_deref() == namespace)
            .filter(|(_, obj)| predicate.matches(*obj))
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    fn create(&self, mut obj: T) -> Result<T, StorageError> {
        let key = obj.key();
        let mut state = self.state.write().map_err(|_| StorageError::poisoned())?;

        if state.objects.contains_key(&key) {
            return Err(StorageError::AlreadyExists {
                resource: T::RESOURCE,
                key,
            });
        }

        state.revision += 1;
        let meta = obj.metadata_mut();
        meta.uid = Some(Uid::new());
        meta.resource_version = state.revision;
        meta.creation_timestamp = Some(Utc::now());

        state.objects.insert(key, obj.clone());
        self.notify(WatchEvent::Added(obj.clone()));
        Ok(obj)
    }

    fn update(&self, mut obj: T) -> Result<T, StorageError> {
        let key = obj.key();
        let mut state = self.state.write().map_err(|_| StorageError::poisoned())?;

        let (uid, created, current) = match state.objects.get(&key) {
            Some(existing) => {
                let meta = existing.metadata();
                (meta.uid, meta.creation_timestamp, meta.resource_version)
            }
            None => return Err(Self::not_found(&key)),
        };

        let requested = obj.metadata().resource_version;
        if requested != 0 && requested != current {
            return Err(StorageError::Conflict {
                resource: T::RESOURCE,
                key,
                message: format!(
                    "the object has been modified (expected resource version {requested}, found {current})"
                ),
            });
        }

        state.revision += 1;
        let meta = obj.metadata_mut();
        meta.uid = uid;
        meta.creation_timestamp = created;
        meta.resource_version = state.revision;

        state.objects.insert(key, obj.clone());
        self.notify(WatchEvent::Modified(obj.clone()));
        Ok(obj)
    }

    fn delete(&self, key: &ObjectKey) -> Result<T, StorageError> {
        let mut state = self.state.write().map_err(|_| StorageError::poisoned())?;
        let removed = state.objects.remove(key).ok_or_else(|| Self::not_found(key))?;
        state.revision += 1;
        self.notify(WatchEvent::Deleted(removed.clone()));
        Ok(removed)
    }

    fn watch(&self, namespace: Option<&str>) -> Result<WatchStream<T>, StorageError> {
        let (tx, rx) = mpsc::channel();
        let mut watchers = self.watchers.lock().map_err(|_| StorageError::poisoned())?;
        watchers.push(Watcher {
            namespace: namespace.map(str::to_owned),
            tx,
        });
        Ok(WatchStream::new(rx))
    }
}
