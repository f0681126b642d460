use serde::{Deserialize, Serialize};

use crate::user::{UserInfo, SYSTEM_PRIVILEGED_GROUP};

/// Who may write RBAC objects without the escalation check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationPolicy {
    /// Optional user name treated as a super-user.
    #[serde(default)]
    pub super_user: Option<String>,
}

impl EscalationPolicy {
    pub fn new(super_user: Option<String>) -> Self {
        Self { super_user }
    }

    /// Members of `system:masters` and the configured super-user bypass the check.
    pub fn escalation_allowed(&self, user: &UserInfo) -> bool {
        if user.in_group(SYSTEM_PRIVILEGED_GROUP) {
            return true;
        }
        self.super_user
            .as_deref()
            .is_some_and(|su| !su.is_empty() && su == user.name)
    }
}
