//! StorageClass: cluster-scoped description of a volume provisioner.
//!
//! The provisioner and its parameters are fixed once the class exists.

pub mod strategy;
pub mod validation;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use warden_core::object::object_meta_fields;
use warden_core::{FieldSelector, LabelSelector, Object, ObjectMeta, SelectionPredicate};

pub use strategy::StorageClassStrategy;

pub const GROUP_NAME: &str = "storage.k8s.io";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClass {
    pub metadata: ObjectMeta,

    /// Name of the volume plugin that provisions volumes of this class.
    pub provisioner: String,

    /// Opaque provisioner-specific settings.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl StorageClass {
    pub fn new(metadata: ObjectMeta, provisioner: impl Into<String>) -> Self {
        Self {
            metadata,
            provisioner: provisioner.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

impl Object for StorageClass {
    const RESOURCE: &'static str = "storageclasses";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn selectable_fields(&self) -> BTreeMap<String, String> {
        object_meta_fields(&self.metadata, false)
    }
}

/// Labels and selectable fields of a class, for filtering.
pub fn get_attrs(class: &StorageClass) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    (class.metadata.labels.clone(), class.selectable_fields())
}

/// Selection predicate over storage classes.
pub fn match_storage_classes(label: LabelSelector, field: FieldSelector) -> SelectionPredicate {
    SelectionPredicate::new(label, field)
}
