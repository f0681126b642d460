//! Reusable name/metadata validators.

use crate::error::{ErrorList, FieldError, FieldPath};
use crate::meta::ObjectMeta;

pub const DNS1123_LABEL_MAX_LEN: usize = 63;
pub const DNS1123_SUBDOMAIN_MAX_LEN: usize = 253;
const QUALIFIED_NAME_MAX_LEN: usize = 63;

/// Name validator: returns human-readable problems, empty when valid.
pub type NameValidator = fn(&str) -> Vec<String>;

fn is_dns_label_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

/// RFC 1123 label: lower-case alphanumerics and `-`, alphanumeric at both ends.
pub fn is_dns1123_label(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > DNS1123_LABEL_MAX_LEN {
        errs.push(format!("must be no more than {DNS1123_LABEL_MAX_LEN} characters"));
    }
    let starts_ok = value.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = value.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if value.is_empty() || !starts_ok || !ends_ok || !value.chars().all(is_dns_label_char) {
        errs.push(
            "a DNS-1123 label must consist of lower case alphanumeric characters or '-', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    errs
}

/// RFC 1123 subdomain: dot-separated DNS labels.
pub fn is_dns1123_subdomain(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > DNS1123_SUBDOMAIN_MAX_LEN {
        errs.push(format!("must be no more than {DNS1123_SUBDOMAIN_MAX_LEN} characters"));
    }
    if value.is_empty() || value.split('.').any(|label| !is_dns1123_label(label).is_empty()) {
        errs.push(
            "a DNS-1123 subdomain must consist of lower case alphanumeric characters, '-' or '.', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    errs
}

/// Path segment names: anything except `.`, `..`, or names containing `/` or `%`.
pub fn is_path_segment_name(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value == "." || value == ".." {
        errs.push(format!("may not be '{value}'"));
    }
    for forbidden in ["/", "%"] {
        if value.contains(forbidden) {
            errs.push(format!("may not contain '{forbidden}'"));
        }
    }
    errs
}

/// Qualified name: optional DNS subdomain prefix plus `/`, then a name of
/// alphanumerics, `-`, `_` or `.` (e.g. `example.com/fast-disk`).
pub fn is_qualified_name(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    let name = match value.split_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty() {
                errs.push("prefix part must be non-empty".to_string());
            } else {
                errs.extend(is_dns1123_subdomain(prefix).into_iter().map(|e| format!("prefix part {e}")));
            }
            name
        }
        None => value,
    };

    if name.is_empty() {
        errs.push("name part must be non-empty".to_string());
        return errs;
    }
    if name.len() > QUALIFIED_NAME_MAX_LEN {
        errs.push(format!("name part must be no more than {QUALIFIED_NAME_MAX_LEN} characters"));
    }
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    let body_ok = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !edge_ok(name.chars().next()) || !edge_ok(name.chars().last()) || !body_ok {
        errs.push(
            "name part must consist of alphanumeric characters, '-', '_' or '.', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    errs
}

/// Validate `metadata` for a namespaced or cluster-scoped object.
pub fn validate_object_meta(
    meta: &ObjectMeta,
    namespaced: bool,
    name_validator: NameValidator,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = ErrorList::new();

    if meta.name.is_empty() {
        errs.push(FieldError::required(path.child("name"), "name is required"));
    } else {
        for msg in name_validator(&meta.name) {
            errs.push(FieldError::invalid(path.child("name"), format!("'{}': {msg}", meta.name)));
        }
    }

    match (&meta.namespace, namespaced) {
        (None, true) => errs.push(FieldError::required(path.child("namespace"), "namespace is required")),
        (Some(ns), true) => {
            for msg in is_dns1123_label(ns) {
                errs.push(FieldError::invalid(path.child("namespace"), format!("'{ns}': {msg}")));
            }
        }
        (Some(_), false) => errs.push(FieldError::forbidden(
            path.child("namespace"),
            "not allowed on this type",
        )),
        (None, false) => {}
    }

    errs
}
