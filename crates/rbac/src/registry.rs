//! Read adapters the rule resolver uses to reach RBAC storage.
//!
//! The resolver only needs point lookups of roles and full listings of
//! bindings; narrowing it to these traits keeps it independent of how the
//! storages are stacked (raw, strategy-wrapped or policy-checked).

use std::sync::Arc;

use warden_core::{ObjectKey, SelectionPredicate};
use warden_registry::{Storage, StorageError};

use crate::types::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};

pub trait RoleGetter: Send + Sync {
    fn get_role(&self, namespace: &str, name: &str) -> Result<Role, StorageError>;
}

pub trait RoleBindingLister: Send + Sync {
    fn list_role_bindings(&self, namespace: &str) -> Result<Vec<RoleBinding>, StorageError>;
}

pub trait ClusterRoleGetter: Send + Sync {
    fn get_cluster_role(&self, name: &str) -> Result<ClusterRole, StorageError>;
}

pub trait ClusterRoleBindingLister: Send + Sync {
    fn list_cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>, StorageError>;
}

/// Roles, read through a [`Storage`].
pub struct RoleRegistry {
    storage: Arc<dyn Storage<Role>>,
}

impl RoleRegistry {
    pub fn new(storage: Arc<dyn Storage<Role>>) -> Self {
        Self { storage }
    }
}

impl RoleGetter for RoleRegistry {
    fn get_role(&self, namespace: &str, name: &str) -> Result<Role, StorageError> {
        self.storage.get(&ObjectKey::namespaced(namespace, name))
    }
}

/// RoleBindings, read through a [`Storage`].
pub struct RoleBindingRegistry {
    storage: Arc<dyn Storage<RoleBinding>>,
}

impl RoleBindingRegistry {
    pub fn new(storage: Arc<dyn Storage<RoleBinding>>) -> Self {
        Self { storage }
    }
}

impl RoleBindingLister for RoleBindingRegistry {
    fn list_role_bindings(&self, namespace: &str) -> Result<Vec<RoleBinding>, StorageError> {
        self.storage.list(Some(namespace), &SelectionPredicate::everything())
    }
}

/// ClusterRoles, read through a [`Storage`].
pub struct ClusterRoleRegistry {
    storage: Arc<dyn Storage<ClusterRole>>,
}

impl ClusterRoleRegistry {
    pub fn new(storage: Arc<dyn Storage<ClusterRole>>) -> Self {
        Self { storage }
    }
}

impl ClusterRoleGetter for ClusterRoleRegistry {
    fn get_cluster_role(&self, name: &str) -> Result<ClusterRole, StorageError> {
        self.storage.get(&ObjectKey::cluster(name))
    }
}

/// ClusterRoleBindings, read through a [`Storage`].
pub struct ClusterRoleBindingRegistry {
    storage: Arc<dyn Storage<ClusterRoleBinding>>,
}

impl ClusterRoleBindingRegistry {
    pub fn new(storage: Arc<dyn Storage<ClusterRoleBinding>>) -> Self {
        Self { storage }
    }
}

impl ClusterRoleBindingLister for ClusterRoleBindingRegistry {
    fn list_cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>, StorageError> {
        self.storage.list(None, &SelectionPredicate::everything())
    }
}
