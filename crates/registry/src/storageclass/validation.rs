use warden_core::validation::{is_dns1123_subdomain, is_qualified_name, validate_object_meta};
use warden_core::{ErrorList, FieldError, FieldPath};

use super::StorageClass;

pub const MAX_PROVISIONER_PARAMETER_LEN: usize = 512;
pub const MAX_PROVISIONER_PARAMETER_SIZE: usize = 256 * (1 << 10);

pub fn validate_storage_class(class: &StorageClass) -> ErrorList {
    let mut errs = validate_object_meta(
        &class.metadata,
        false,
        is_dns1123_subdomain,
        &FieldPath::new("metadata"),
    );
    errs.extend(validate_provisioner(&class.provisioner, &FieldPath::new("provisioner")));
    errs.extend(validate_parameters(&class.parameters, &FieldPath::new("parameters")));
    errs
}

/// Update-only checks: provisioner and parameters are immutable.
pub fn validate_storage_class_update(class: &StorageClass, old: &StorageClass) -> ErrorList {
    let mut errs = ErrorList::new();
    if class.parameters != old.parameters {
        errs.push(FieldError::forbidden(
            FieldPath::new("parameters"),
            "updates to parameters are forbidden.",
        ));
    }
    if class.provisioner != old.provisioner {
        errs.push(FieldError::forbidden(
            FieldPath::new("provisioner"),
            "updates to provisioner are forbidden.",
        ));
    }
    errs
}

fn validate_provisioner(provisioner: &str, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if provisioner.is_empty() {
        errs.push(FieldError::required(path.clone(), ""));
        return errs;
    }
    for msg in is_qualified_name(&provisioner.to_lowercase()) {
        errs.push(FieldError::invalid(path.clone(), format!("'{provisioner}': {msg}")));
    }
    errs
}

fn validate_parameters(
    params: &std::collections::BTreeMap<String, String>,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = ErrorList::new();

    if params.len() > MAX_PROVISIONER_PARAMETER_LEN {
        errs.push(FieldError::too_many(path.clone(), params.len(), MAX_PROVISIONER_PARAMETER_LEN));
        return errs;
    }

    let mut total = 0usize;
    for (key, value) in params {
        if key.is_empty() {
            errs.push(FieldError::invalid(path.clone(), "field can not be empty."));
        }
        total += key.len() + value.len();
    }
    if total > MAX_PROVISIONER_PARAMETER_SIZE {
        errs.push(FieldError::too_long(path.clone(), MAX_PROVISIONER_PARAMETER_SIZE));
    }
    errs
}
