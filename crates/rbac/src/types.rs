//! RBAC API objects.

use serde::{Deserialize, Serialize};

use warden_core::{Object, ObjectMeta};

use crate::rule::PolicyRule;
use crate::user::{service_account_username, UserInfo};
use crate::GROUP_NAME;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::User => "User",
            SubjectKind::Group => "Group",
            SubjectKind::ServiceAccount => "ServiceAccount",
        }
    }
}

/// An entry in a binding's subject list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub kind: SubjectKind,
    pub name: String,
    /// Only meaningful for service accounts; defaults to the binding's namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Subject {
    pub fn user(name: impl Into<String>) -> Self {
        Self { kind: SubjectKind::User, name: name.into(), namespace: None }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self { kind: SubjectKind::Group, name: name.into(), namespace: None }
    }

    pub fn service_account(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::ServiceAccount,
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Whether this subject names `user`, given the binding's namespace.
    pub fn applies_to(&self, user: &UserInfo, binding_namespace: Option<&str>) -> bool {
        match self.kind {
            SubjectKind::User => self.name == user.name,
            SubjectKind::Group => user.in_group(&self.name),
            SubjectKind::ServiceAccount => {
                match self.namespace.as_deref().or(binding_namespace) {
                    Some(ns) if !ns.is_empty() => service_account_username(ns, &self.name) == user.name,
                    _ => false,
                }
            }
        }
    }
}

/// Whether any of `subjects` names `user`.
pub fn applies_to(user: &UserInfo, subjects: &[Subject], binding_namespace: Option<&str>) -> bool {
    subjects.iter().any(|s| s.applies_to(user, binding_namespace))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleRefKind {
    Role,
    ClusterRole,
}

impl RoleRefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleRefKind::Role => "Role",
            RoleRefKind::ClusterRole => "ClusterRole",
        }
    }
}

fn default_api_group() -> String {
    GROUP_NAME.to_string()
}

/// Reference from a binding to the role whose rules it grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    #[serde(default = "default_api_group")]
    pub api_group: String,
    pub kind: RoleRefKind,
    pub name: String,
}

impl RoleRef {
    pub fn role(name: impl Into<String>) -> Self {
        Self { api_group: default_api_group(), kind: RoleRefKind::Role, name: name.into() }
    }

    pub fn cluster_role(name: impl Into<String>) -> Self {
        Self {
            api_group: default_api_group(),
            kind: RoleRefKind::ClusterRole,
            name: name.into(),
        }
    }
}

/// Namespaced collection of rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// Cluster-scoped collection of rules; usable cluster-wide or from any namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRole {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// Grants a Role or ClusterRole to subjects inside one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    pub role_ref: RoleRef,
}

/// Grants a ClusterRole to subjects cluster-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    pub role_ref: RoleRef,
}

impl Role {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, rules: Vec<PolicyRule>) -> Self {
        Self { metadata: ObjectMeta::namespaced(namespace, name), rules }
    }
}

impl ClusterRole {
    pub fn new(name: impl Into<String>, rules: Vec<PolicyRule>) -> Self {
        Self { metadata: ObjectMeta::cluster(name), rules }
    }
}

impl RoleBinding {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        role_ref: RoleRef,
        subjects: Vec<Subject>,
    ) -> Self {
        Self { metadata: ObjectMeta::namespaced(namespace, name), subjects, role_ref }
    }
}

impl ClusterRoleBinding {
    pub fn new(name: impl Into<String>, role_ref: RoleRef, subjects: Vec<Subject>) -> Self {
        Self { metadata: ObjectMeta::cluster(name), subjects, role_ref }
    }
}

macro_rules! impl_object {
    ($t:ty, $resource:literal) => {
        impl Object for $t {
            const RESOURCE: &'static str = $resource;

            fn metadata(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut ObjectMeta {
                &mut self.metadata
            }
        }
    };
}

impl_object!(Role, "roles");
impl_object!(ClusterRole, "clusterroles");
impl_object!(RoleBinding, "rolebindings");
impl_object!(ClusterRoleBinding, "clusterrolebindings");
