//! Create/update behaviour shared by the four RBAC kinds.

use std::marker::PhantomData;

use warden_core::{ErrorList, Object};
use warden_registry::RestStrategy;

use crate::types::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use crate::validation;

/// An RBAC kind: scope plus its validator.
pub trait RbacObject: Object {
    const NAMESPACED: bool;

    fn validate(&self) -> ErrorList;
}

impl RbacObject for Role {
    const NAMESPACED: bool = true;

    fn validate(&self) -> ErrorList {
        validation::validate_role(self)
    }
}

impl RbacObject for ClusterRole {
    const NAMESPACED: bool = false;

    fn validate(&self) -> ErrorList {
        validation::validate_cluster_role(self)
    }
}

impl RbacObject for RoleBinding {
    const NAMESPACED: bool = true;

    fn validate(&self) -> ErrorList {
        validation::validate_role_binding(self)
    }
}

impl RbacObject for ClusterRoleBinding {
    const NAMESPACED: bool = false;

    fn validate(&self) -> ErrorList {
        validation::validate_cluster_role_binding(self)
    }
}

/// RBAC objects may be upserted and updated without a precondition.
pub struct RbacStrategy<T> {
    _kind: PhantomData<fn() -> T>,
}

impl<T> RbacStrategy<T> {
    pub const fn new() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<T> Default for RbacStrategy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RbacObject> RestStrategy<T> for RbacStrategy<T> {
    fn namespace_scoped(&self) -> bool {
        T::NAMESPACED
    }

    fn prepare_for_create(&self, obj: &mut T) {
        obj.metadata_mut().clear_system_fields();
    }

    fn validate(&self, obj: &T) -> ErrorList {
        obj.validate()
    }

    fn allow_create_on_update(&self) -> bool {
        true
    }

    fn prepare_for_update(&self, obj: &mut T, old: &T) {
        let old = old.metadata();
        let meta = obj.metadata_mut();
        meta.uid = old.uid;
        meta.creation_timestamp = old.creation_timestamp;
    }

    fn validate_update(&self, obj: &T, _old: &T) -> ErrorList {
        obj.validate()
    }

    fn allow_unconditional_update(&self) -> bool {
        true
    }
}
