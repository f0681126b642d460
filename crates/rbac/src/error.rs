use thiserror::Error;

use warden_registry::StorageError;

use crate::rule::PolicyRule;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RbacError {
    /// The requester tried to grant rules they do not hold themselves.
    #[error(
        "user \"{user}\" is attempting to grant RBAC permissions not currently held{}: {}",
        scope(.namespace.as_deref()),
        render(.missing)
    )]
    Escalation {
        user: String,
        namespace: Option<String>,
        missing: Vec<PolicyRule>,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RbacError {
    pub fn is_escalation(&self) -> bool {
        matches!(self, RbacError::Escalation { .. })
    }

    /// The underlying storage error, if any.
    pub fn storage(&self) -> Option<&StorageError> {
        match self {
            RbacError::Storage(e) => Some(e),
            RbacError::Escalation { .. } => None,
        }
    }
}

fn scope(namespace: Option<&str>) -> String {
    namespace.map(|ns| format!(" in namespace \"{ns}\"")).unwrap_or_default()
}

fn render(rules: &[PolicyRule]) -> String {
    let rendered: Vec<String> = rules.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(" "))
}
