//! Object trait: identity + metadata access for persisted API objects.

use std::collections::BTreeMap;

use crate::meta::{ObjectKey, ObjectMeta};

/// Persisted API object with standard metadata.
pub trait Object: Clone + Send + Sync + core::fmt::Debug + 'static {
    /// Plural, lower-case resource name (e.g. `"clusterroles"`).
    const RESOURCE: &'static str;

    fn metadata(&self) -> &ObjectMeta;

    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    fn name(&self) -> &str {
        &self.metadata().name
    }

    fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    fn key(&self) -> ObjectKey {
        self.metadata().key()
    }

    /// Fields usable in field selectors. Defaults to the metadata fields.
    fn selectable_fields(&self) -> BTreeMap<String, String> {
        object_meta_fields(self.metadata(), self.metadata().namespace.is_some())
    }
}

/// `metadata.name` (and `metadata.namespace` for namespaced kinds).
pub fn object_meta_fields(meta: &ObjectMeta, namespaced: bool) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert("metadata.name".to_string(), meta.name.clone());
    if namespaced {
        fields.insert(
            "metadata.namespace".to_string(),
            meta.namespace.clone().unwrap_or_default(),
        );
    }
    fields
}
