//! Escalation-checking storage for RBAC kinds.
//!
//! Creating or updating a role or binding is only allowed when the requester
//! already holds every rule the object would grant, in the namespace the
//! object lives in (cluster scope for cluster kinds). Reads, deletes and
//! watches are not checked here.

use std::sync::Arc;

use tracing::{debug, warn};

use warden_core::{Object, ObjectKey, SelectionPredicate};
use warden_registry::{Storage, WatchStream};

use crate::error::RbacError;
use crate::escalation::EscalationPolicy;
use crate::resolver::RuleResolver;
use crate::rule::PolicyRule;
use crate::types::{ClusterRole, ClusterRoleBinding, Role, RoleBinding, RoleRefKind};
use crate::user::UserInfo;

/// Per-request caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user: UserInfo,
}

impl RequestContext {
    pub fn new(user: UserInfo) -> Self {
        Self { user }
    }
}

/// An object whose write grants rules.
pub trait GrantsRules: Object {
    /// Rules that writing this object would grant.
    fn granted_rules(&self, resolver: &RuleResolver) -> Result<Vec<PolicyRule>, RbacError>;

    /// Namespace the grant takes effect in; `None` for cluster scope.
    fn escalation_namespace(&self) -> Option<&str> {
        self.namespace()
    }
}

impl GrantsRules for Role {
    fn granted_rules(&self, _resolver: &RuleResolver) -> Result<Vec<PolicyRule>, RbacError> {
        Ok(self.rules.clone())
    }
}

impl GrantsRules for ClusterRole {
    fn granted_rules(&self, _resolver: &RuleResolver) -> Result<Vec<PolicyRule>, RbacError> {
        Ok(self.rules.clone())
    }

    fn escalation_namespace(&self) -> Option<&str> {
        None
    }
}

impl GrantsRules for RoleBinding {
    fn granted_rules(&self, resolver: &RuleResolver) -> Result<Vec<PolicyRule>, RbacError> {
        resolver.role_reference_rules(&self.role_ref, self.namespace())
    }
}

impl GrantsRules for ClusterRoleBinding {
    fn granted_rules(&self, resolver: &RuleResolver) -> Result<Vec<PolicyRule>, RbacError> {
        if self.role_ref.kind != RoleRefKind::ClusterRole {
            return Ok(Vec::new());
        }
        resolver.role_reference_rules(&self.role_ref, None)
    }

    fn escalation_namespace(&self) -> Option<&str> {
        None
    }
}

/// Storage decorator that refuses writes granting more than the caller holds.
pub struct PolicyBasedStorage<T: Object> {
    inner: Arc<dyn Storage<T>>,
    resolver: Arc<RuleResolver>,
    policy: EscalationPolicy,
}

pub type RoleStorage = PolicyBasedStorage<Role>;
pub type RoleBindingStorage = PolicyBasedStorage<RoleBinding>;
pub type ClusterRoleStorage = PolicyBasedStorage<ClusterRole>;
pub type ClusterRoleBindingStorage = PolicyBasedStorage<ClusterRoleBinding>;

impl<T: GrantsRules> PolicyBasedStorage<T> {
    pub fn new(inner: Arc<dyn Storage<T>>, resolver: Arc<RuleResolver>, policy: EscalationPolicy) -> Self {
        Self { inner, resolver, policy }
    }

    pub fn resolver(&self) -> &Arc<RuleResolver> {
        &self.resolver
    }

    fn confirm(&self, ctx: &RequestContext, obj: &T) -> Result<(), RbacError> {
        if self.policy.escalation_allowed(&ctx.user) {
            debug!(
                resource = T::RESOURCE,
                name = obj.name(),
                user = %ctx.user.name,
                "escalation check bypassed"
            );
            return Ok(());
        }

        let granted = obj.granted_rules(&self.resolver)?;
        let result = self
            .resolver
            .confirm_no_escalation(&ctx.user, obj.escalation_namespace(), &granted);

        if let Err(RbacError::Escalation { missing, .. }) = &result {
            warn!(
                resource = T::RESOURCE,
                name = obj.name(),
                namespace = obj.escalation_namespace().unwrap_or_default(),
                user = %ctx.user.name,
                missing = missing.len(),
                "privilege escalation denied"
            );
        }
        result
    }

    pub fn get(&self, _ctx: &RequestContext, key: &ObjectKey) -> Result<T, RbacError> {
        Ok(self.inner.get(key)?)
    }

    pub fn list(
        &self,
        _ctx: &RequestContext,
        namespace: Option<&str>,
        predicate: &SelectionPredicate,
    ) -> Result<Vec<T>, RbacError> {
        Ok(self.inner.list(namespace, predicate)?)
    }

    pub fn create(&self, ctx: &RequestContext, obj: T) -> Result<T, RbacError> {
        self.confirm(ctx, &obj)?;
        Ok(self.inner.create(obj)?)
    }

    pub fn update(&self, ctx: &RequestContext, obj: T) -> Result<T, RbacError> {
        self.confirm(ctx, &obj)?;
        Ok(self.inner.update(obj)?)
    }

    pub fn delete(&self, _ctx: &RequestContext, key: &ObjectKey) -> Result<T, RbacError> {
        Ok(self.inner.delete(key)?)
    }

    pub fn watch(&self, _ctx: &RequestContext, namespace: Option<&str>) -> Result<WatchStream<T>, RbacError> {
        Ok(self.inner.watch(namespace)?)
    }
}
