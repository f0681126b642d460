//! Strategy-driven storage: validation and normalization in front of a raw backend.

use std::marker::PhantomData;

use tracing::debug;

use warden_core::{Object, ObjectKey, SelectionPredicate};

use crate::error::StorageError;
use crate::storage::{Storage, WatchStream};
use crate::strategy::RestStrategy;

/// Generic REST storage for one kind.
///
/// Runs the kind's [`RestStrategy`] on create/update and delegates to the
/// backend. Reads, deletes and watches pass straight through.
pub struct GenericStore<T, B, S> {
    backend: B,
    strategy: S,
    _kind: PhantomData<fn() -> T>,
}

impl<T, B, S> GenericStore<T, B, S> {
    pub fn new(backend: B, strategy: S) -> Self {
        Self {
            backend,
            strategy,
            _kind: PhantomData,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}

impl<T, B, S> GenericStore<T, B, S>
where
    T: Object,
    B: Storage<T>,
    S: RestStrategy<T>,
{
    fn check_scope(&self, obj: &mut T) -> Result<(), StorageError> {
        if self.strategy.namespace_scoped() {
            if obj.namespace().is_none_or(str::is_empty) {
                return Err(StorageError::BadRequest(format!(
                    "{} \"{}\": namespace is required",
                    T::RESOURCE,
                    obj.name()
                )));
            }
        } else {
            obj.metadata_mut().namespace = None;
        }
        Ok(())
    }

    fn invalid(obj: &T, errors: warden_core::ErrorList) -> StorageError {
        debug!(resource = T::RESOURCE, name = obj.name(), errors = errors.len(), "rejected invalid object");
        StorageError::Invalid {
            resource: T::RESOURCE,
            name: obj.name().to_string(),
            errors,
        }
    }
}

impl<T, B, S> Storage<T> for GenericStore<T, B, S>
where
    T: Object,
    B: Storage<T>,
    S: RestStrategy<T>,
{
    fn get(&self, key: &ObjectKey) -> Result<T, StorageError> {
        self.backend.get(key)
    }

    fn list(
        &self,
        namespace: Option<&str>,
        predicate: &SelectionPredicate,
    ) -> Result<Vec<T>, StorageError> {
        self.backend.list(namespace, predicate)
    }

    fn create(&self, mut obj: T) -> Result<T, StorageError> {
        self.check_scope(&mut obj)?;
        self.strategy.prepare_for_create(&mut obj);

        let errors = self.strategy.validate(&obj);
        if !errors.is_empty() {
            return Err(Self::invalid(&obj, errors));
        }

        self.strategy.canonicalize(&mut obj);
        self.backend.create(obj)
    }

    fn update(&self, mut obj: T) -> Result<T, StorageError> {
        self.check_scope(&mut obj)?;
        let key = obj.key();

        let old = match self.backend.get(&key) {
            Ok(old) => old,
            Err(e) if e.is_not_found() && self.strategy.allow_create_on_update() => {
                debug!(resource = T::RESOURCE, key = %key, "update of missing object creates it");
                return self.create(obj);
            }
            Err(e) => return Err(e),
        };

        if obj.metadata().resource_version == 0 && !self.strategy.allow_unconditional_update() {
            return Err(StorageError::Conflict {
                resource: T::RESOURCE,
                key,
                message: "resourceVersion must be specified for an update".to_string(),
            });
        }

        self.strategy.prepare_for_update(&mut obj, &old);

        let errors = self.strategy.validate_update(&obj, &old);
        if !errors.is_empty() {
            return Err(Self::invalid(&obj, errors));
        }

        self.strategy.canonicalize(&mut obj);
        self.backend.update(obj)
    }

    fn delete(&self, key: &ObjectKey) -> Result<T, StorageError> {
        self.backend.delete(key)
    }

    fn watch(&self, namespace: Option<&str>) -> Result<WatchStream<T>, StorageError> {
        self.backend.watch(namespace)
    }
}

#[cfg(test)]
mod tests {
    use warden_core::{ErrorList, ObjectMeta};

    use super::*;
    use crate::memory::InMemoryStorage;
    use crate::storageclass::StorageClass;

    /// Strict strategy: upserts allowed, preconditions required.
    struct Strict;

    impl RestStrategy<StorageClass> for Strict {
        fn namespace_scoped(&self) -> bool {
            false
        }
        fn prepare_for_create(&self, _obj: &mut StorageClass) {}
        fn validate(&self, _obj: &StorageClass) -> ErrorList {
            ErrorList::new()
        }
        fn allow_create_on_update(&self) -> bool {
            true
        }
        fn prepare_for_update(&self, _obj: &mut StorageClass, _old: &StorageClass) {}
        fn validate_update(&self, _obj: &StorageClass, _old: &StorageClass) -> ErrorList {
            ErrorList::new()
        }
        fn allow_unconditional_update(&self) -> bool {
            false
        }
    }

    fn class(name: &str) -> StorageClass {
        StorageClass::new(ObjectMeta::cluster(name), "example.com/disk")
    }

    #[test]
    fn update_of_missing_object_creates_when_allowed() {
        let store: GenericStore<StorageClass, _, _> = GenericStore::new(InMemoryStorage::new(), Strict);
        let created = store.update(class("fresh")).unwrap();
        assert_eq!(created.metadata.resource_version, 1);
        assert_eq!(store.backend().len(), 1);
    }

    #[test]
    fn unconditional_update_requires_precondition_when_disallowed() {
        let store: GenericStore<StorageClass, _, _> = GenericStore::new(InMemoryStorage::new(), Strict);
        let created = store.create(class("fast")).unwrap();

        let err = store.update(class("fast")).unwrap_err();
        assert!(err.is_conflict());

        assert!(store.update(created).is_ok());
    }
}
