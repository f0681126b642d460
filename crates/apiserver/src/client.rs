//! In-process RBAC client used by server-internal components.

use std::sync::Arc;

use warden_core::SelectionPredicate;
use warden_rbac::user::SYSTEM_PRIVILEGED_GROUP;
use warden_rbac::{
    ClusterRole, ClusterRoleBinding, ClusterRoleBindingStorage, ClusterRoleStorage, RbacError, RequestContext,
    UserInfo,
};

/// User name of the server's own loopback connections.
pub const LOOPBACK_USER: &str = "system:apiserver";

/// The cluster-scoped RBAC operations bootstrap needs.
pub trait RbacClient: Send + Sync {
    fn list_cluster_roles(&self) -> Result<Vec<ClusterRole>, RbacError>;

    fn create_cluster_role(&self, role: ClusterRole) -> Result<ClusterRole, RbacError>;

    fn list_cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>, RbacError>;

    fn create_cluster_role_binding(&self, binding: ClusterRoleBinding) -> Result<ClusterRoleBinding, RbacError>;
}

impl<C> RbacClient for Arc<C>
where
    C: RbacClient + ?Sized,
{
    fn list_cluster_roles(&self) -> Result<Vec<ClusterRole>, RbacError> {
        (**self).list_cluster_roles()
    }

    fn create_cluster_role(&self, role: ClusterRole) -> Result<ClusterRole, RbacError> {
        (**self).create_cluster_role(role)
    }

    fn list_cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>, RbacError> {
        (**self).list_cluster_role_bindings()
    }

    fn create_cluster_role_binding(&self, binding: ClusterRoleBinding) -> Result<ClusterRoleBinding, RbacError> {
        (**self).create_cluster_role_binding(binding)
    }
}

/// Talks to the policy-checked storages directly, as the privileged
/// `system:apiserver` user.
pub struct LoopbackClient {
    ctx: RequestContext,
    cluster_roles: Arc<ClusterRoleStorage>,
    cluster_role_bindings: Arc<ClusterRoleBindingStorage>,
}

impl LoopbackClient {
    pub fn new(cluster_roles: Arc<ClusterRoleStorage>, cluster_role_bindings: Arc<ClusterRoleBindingStorage>) -> Self {
        Self {
            ctx: RequestContext::new(loopback_user()),
            cluster_roles,
            cluster_role_bindings,
        }
    }

    pub fn user(&self) -> &UserInfo {
        &self.ctx.user
    }
}

pub fn loopback_user() -> UserInfo {
    UserInfo::new(LOOPBACK_USER).with_group(SYSTEM_PRIVILEGED_GROUP)
}

impl RbacClient for LoopbackClient {
    fn list_cluster_roles(&self) -> Result<Vec<ClusterRole>, RbacError> {
        self.cluster_roles.list(&self.ctx, None, &SelectionPredicate::everything())
    }

    fn create_cluster_role(&self, role: ClusterRole) -> Result<ClusterRole, RbacError> {
        self.cluster_roles.create(&self.ctx, role)
    }

    fn list_cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>, RbacError> {
        self.cluster_role_bindings.list(&self.ctx, None, &SelectionPredicate::everything())
    }

    fn create_cluster_role_binding(&self, binding: ClusterRoleBinding) -> Result<ClusterRoleBinding, RbacError> {
        self.cluster_role_bindings.create(&self.ctx, binding)
    }
}
