//! `warden-rbac`: role-based access control for the `rbac.authorization.k8s.io` group.
//!
//! API types, rule matching, the cross-resource rule resolver, and the
//! policy-enforcing storage that blocks privilege escalation.

pub mod bootstrappolicy;
pub mod error;
pub mod escalation;
pub mod policybased;
pub mod registry;
pub mod resolver;
pub mod rule;
pub mod strategy;
pub mod types;
pub mod user;
pub mod validation;

pub use error::RbacError;
pub use escalation::EscalationPolicy;
pub use policybased::{
    ClusterRoleBindingStorage, ClusterRoleStorage, GrantsRules, PolicyBasedStorage,
    RequestContext, RoleBindingStorage, RoleStorage,
};
pub use registry::{
    ClusterRoleBindingLister, ClusterRoleBindingRegistry, ClusterRoleGetter, ClusterRoleRegistry,
    RoleBindingLister, RoleBindingRegistry, RoleGetter, RoleRegistry,
};
pub use resolver::{RuleResolver, RuleSource};
pub use rule::{covers, PolicyRule};
pub use strategy::RbacStrategy;
pub use types::{
    ClusterRole, ClusterRoleBinding, Role, RoleBinding, RoleRef, RoleRefKind, Subject, SubjectKind,
};
pub use user::UserInfo;

/// API group served by this crate.
pub const GROUP_NAME: &str = "rbac.authorization.k8s.io";

/// Served version of the group.
pub const VERSION: &str = "v1alpha1";
