use warden_core::ErrorList;

use super::validation::{validate_storage_class, validate_storage_class_update};
use super::StorageClass;
use crate::strategy::RestStrategy;

/// Create/update behaviour for [`StorageClass`] objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct StorageClassStrategy;

impl RestStrategy<StorageClass> for StorageClassStrategy {
    fn namespace_scoped(&self) -> bool {
        false
    }

    /// Clears server-managed fields; clients may not set them on creation.
    fn prepare_for_create(&self, obj: &mut StorageClass) {
        obj.metadata.clear_system_fields();
    }

    fn validate(&self, obj: &StorageClass) -> ErrorList {
        validate_storage_class(obj)
    }

    fn allow_create_on_update(&self) -> bool {
        false
    }

    /// Server-managed fields always come from the stored object.
    fn prepare_for_update(&self, obj: &mut StorageClass, old: &StorageClass) {
        obj.metadata.uid = old.metadata.uid;
        obj.metadata.creation_timestamp = old.metadata.creation_timestamp;
    }

    fn validate_update(&self, obj: &StorageClass, old: &StorageClass) -> ErrorList {
        let mut errs = validate_storage_class(obj);
        errs.extend(validate_storage_class_update(obj, old));
        errs
    }

    fn allow_unconditional_update(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use warden_core::{ObjectKey, ObjectMeta, Uid};

    use super::*;
    use crate::{GenericStore, InMemoryStorage, Storage, StorageError};

    fn store() -> GenericStore<StorageClass, InMemoryStorage<StorageClass>, StorageClassStrategy> {
        GenericStore::new(InMemoryStorage::new(), StorageClassStrategy)
    }

    fn class(name: &str) -> StorageClass {
        StorageClass::new(ObjectMeta::cluster(name), "kubernetes.io/aws-ebs")
            .with_parameter("type", "gp2")
    }

    #[test]
    fn strategy_declares_scope_and_update_policy() {
        let s = StorageClassStrategy;
        assert!(!s.namespace_scoped());
        assert!(!s.allow_create_on_update());
        assert!(s.allow_unconditional_update());
    }

    #[test]
    fn prepare_for_create_clears_client_supplied_system_fields() {
        let mut obj = class("fast");
        let forged = Uid::new();
        obj.metadata.uid = Some(forged);
        obj.metadata.resource_version = 99;
        obj.metadata.creation_timestamp = Some(Utc::now());

        StorageClassStrategy.prepare_for_create(&mut obj);
        assert_eq!(obj.metadata.uid, None);
        assert_eq!(obj.metadata.resource_version, 0);
        assert_eq!(obj.metadata.creation_timestamp, None);

        let mut obj = class("fast");
        obj.metadata.uid = Some(forged);
        let created = store().create(obj).unwrap();
        assert_ne!(created.metadata.uid, Some(forged));
    }

    #[test]
    fn invalid_create_writes_nothing() {
        let store = store();
        let mut bad = class("fast");
        bad.provisioner.clear();

        match store.create(bad).unwrap_err() {
            StorageError::Invalid { resource, name, errors } => {
                assert_eq!(resource, "storageclasses");
                assert_eq!(name, "fast");
                assert_eq!(errors.len(), 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.backend().is_empty());
    }

    #[test]
    fn namespace_is_dropped_for_cluster_scoped_kind() {
        let mut obj = class("fast");
        obj.metadata.namespace = Some("default".into());
        let created = store().create(obj).unwrap();
        assert_eq!(created.metadata.namespace, None);
    }

    #[test]
    fn update_rejects_immutable_field_changes() {
        let store = store();
        store.create(class("fast")).unwrap();

        let mut changed = class("fast");
        changed.parameters.insert("type".into(), "io1".into());
        let err = store.update(changed).unwrap_err();
        assert!(matches!(err, StorageError::Invalid { .. }));

        let stored = store.get(&ObjectKey::cluster("fast")).unwrap();
        assert_eq!(stored.parameters.get("type").map(String::as_str), Some("gp2"));
    }

    #[test]
    fn unconditional_update_is_permitted_and_keeps_uid() {
        let store = store();
        let created = store.create(class("fast")).unwrap();

        let mut relabel = class("fast");
        relabel.metadata.labels.insert("tier".into(), "ssd".into());
        relabel.metadata.uid = Some(Uid::new());
        assert_eq!(relabel.metadata.resource_version, 0);

        let updated = store.update(relabel).unwrap();
        assert_eq!(updated.metadata.uid, created.metadata.uid);
        assert_eq!(updated.metadata.labels.get("tier").map(String::as_str), Some("ssd"));
    }

    #[test]
    fn update_of_missing_class_does_not_create() {
        let store = store();
        assert!(store.update(class("ghost")).unwrap_err().is_not_found());
        assert!(store.backend().is_empty());
    }
}
