use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Group the API server uses for privileged loopback connections.
pub const SYSTEM_PRIVILEGED_GROUP: &str = "system:masters";
pub const ALL_AUTHENTICATED: &str = "system:authenticated";
pub const ALL_UNAUTHENTICATED: &str = "system:unauthenticated";

const SERVICE_ACCOUNT_USERNAME_PREFIX: &str = "system:serviceaccount:";

/// Identity of the caller a request is authorized against.
///
/// Produced by authentication (outside this crate); immutable per request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl UserInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: BTreeSet::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// User identity of a service account.
    pub fn service_account(namespace: &str, name: &str) -> Self {
        Self::new(service_account_username(namespace, name))
    }
}

impl core::fmt::Display for UserInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let groups: Vec<&str> = self.groups.iter().map(String::as_str).collect();
        write!(f, "{} (groups={:?})", self.name, groups)
    }
}

/// `system:serviceaccount:<namespace>:<name>`
pub fn service_account_username(namespace: &str, name: &str) -> String {
    format!("{SERVICE_ACCOUNT_USERNAME_PREFIX}{namespace}:{name}")
}
