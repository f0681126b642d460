//! Validation for RBAC objects.

use warden_core::validation::{is_path_segment_name, validate_object_meta};
use warden_core::{ErrorList, FieldError, FieldPath};

use crate::rule::PolicyRule;
use crate::types::{
    ClusterRole, ClusterRoleBinding, Role, RoleBinding, RoleRef, RoleRefKind, Subject, SubjectKind,
};
use crate::GROUP_NAME;

/// Role and binding names are path segments; `system:` style names are fine.
fn validate_rbac_name(name: &str) -> Vec<String> {
    is_path_segment_name(name)
}

fn validate_policy_rule(rule: &PolicyRule, namespaced: bool, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();

    if rule.verbs.is_empty() {
        errs.push(FieldError::required(path.child("verbs"), "verbs must contain at least one value"));
    }

    if !rule.non_resource_urls.is_empty() {
        if namespaced {
            errs.push(FieldError::invalid(
                path.child("nonResourceURLs"),
                "namespaced rules cannot apply to non-resource URLs",
            ));
        }
        if !rule.api_groups.is_empty() || !rule.resources.is_empty() {
            errs.push(FieldError::invalid(
                path.child("nonResourceURLs"),
                "rules cannot apply to both regular resources and non-resource URLs",
            ));
        }
        return errs;
    }

    if rule.api_groups.is_empty() {
        errs.push(FieldError::required(
            path.child("apiGroups"),
            "resource rules must supply at least one api group",
        ));
    }
    if rule.resources.is_empty() {
        errs.push(FieldError::required(
            path.child("resources"),
            "resource rules must supply at least one resource",
        ));
    }
    errs
}

fn validate_rules(rules: &[PolicyRule], namespaced: bool, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    for (i, rule) in rules.iter().enumerate() {
        errs.extend(validate_policy_rule(rule, namespaced, &path.index(i)));
    }
    errs
}

fn validate_role_ref(role_ref: &RoleRef, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if role_ref.api_group != GROUP_NAME {
        errs.push(FieldError::not_supported(path.child("apiGroup"), &role_ref.api_group, &[GROUP_NAME]));
    }
    if role_ref.name.is_empty() {
        errs.push(FieldError::required(path.child("name"), "role reference name is required"));
    } else {
        for msg in validate_rbac_name(&role_ref.name) {
            errs.push(FieldError::invalid(path.child("name"), format!("'{}': {msg}", role_ref.name)));
        }
    }
    errs
}

fn validate_subject(subject: &Subject, namespaced: bool, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if subject.name.is_empty() {
        errs.push(FieldError::required(path.child("name"), "subject name is required"));
    }

    match subject.kind {
        SubjectKind::ServiceAccount => {
            for msg in warden_core::validation::is_dns1123_subdomain(&subject.name) {
                errs.push(FieldError::invalid(path.child("name"), format!("'{}': {msg}", subject.name)));
            }
            if !namespaced && subject.namespace.as_deref().is_none_or(str::is_empty) {
                errs.push(FieldError::required(
                    path.child("namespace"),
                    "service account subjects of cluster bindings must name a namespace",
                ));
            }
        }
        SubjectKind::User | SubjectKind::Group => {
            if subject.namespace.is_some() {
                errs.push(FieldError::invalid(
                    path.child("namespace"),
                    format!("namespace is only allowed for ServiceAccount subjects, not {}", subject.kind.as_str()),
                ));
            }
        }
    }
    errs
}

fn validate_subjects(subjects: &[Subject], namespaced: bool, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    for (i, subject) in subjects.iter().enumerate() {
        errs.extend(validate_subject(subject, namespaced, &path.index(i)));
    }
    errs
}

pub fn validate_role(role: &Role) -> ErrorList {
    let mut errs = validate_object_meta(&role.metadata, true, validate_rbac_name, &FieldPath::new("metadata"));
    errs.extend(validate_rules(&role.rules, true, &FieldPath::new("rules")));
    errs
}

pub fn validate_cluster_role(role: &ClusterRole) -> ErrorList {
    let mut errs = validate_object_meta(&role.metadata, false, validate_rbac_name, &FieldPath::new("metadata"));
    errs.extend(validate_rules(&role.rules, false, &FieldPath::new("rules")));
    errs
}

pub fn validate_role_binding(binding: &RoleBinding) -> ErrorList {
    let mut errs = validate_object_meta(&binding.metadata, true, validate_rbac_name, &FieldPath::new("metadata"));
    errs.extend(validate_role_ref(&binding.role_ref, &FieldPath::new("roleRef")));
    errs.extend(validate_subjects(&binding.subjects, true, &FieldPath::new("subjects")));
    errs
}

pub fn validate_cluster_role_binding(binding: &ClusterRoleBinding) -> ErrorList {
    let mut errs = validate_object_meta(&binding.metadata, false, validate_rbac_name, &FieldPath::new("metadata"));

    let role_ref_path = FieldPath::new("roleRef");
    if binding.role_ref.kind != RoleRefKind::ClusterRole {
        errs.push(FieldError::not_supported(
            role_ref_path.child("kind"),
            binding.role_ref.kind.as_str(),
            &[RoleRefKind::ClusterRole.as_str()],
        ));
    }
    errs.extend(validate_role_ref(&binding.role_ref, &role_ref_path));
    errs.extend(validate_subjects(&binding.subjects, false, &FieldPath::new("subjects")));
    errs
}
