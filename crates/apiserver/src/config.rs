//! Server configuration and API enablement.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use warden_rbac::EscalationPolicy;

use crate::error::ApiServerError;

pub const ENV_DISABLED_RESOURCES: &str = "WARDEN_DISABLED_RESOURCES";
pub const ENV_RBAC_SUPER_USER: &str = "WARDEN_RBAC_SUPER_USER";
pub const ENV_SKIP_BOOTSTRAP: &str = "WARDEN_SKIP_BOOTSTRAP";

/// An API group at one version, e.g. `rbac.authorization.k8s.io/v1alpha1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self { group: group.into(), version: version.into() }
    }

    pub fn rbac() -> Self {
        Self::new(warden_rbac::GROUP_NAME, warden_rbac::VERSION)
    }

    pub fn storage() -> Self {
        Self::new(warden_registry::storageclass::GROUP_NAME, "v1beta1")
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct VersionConfig {
    enabled: bool,
    enabled_resources: BTreeSet<String>,
    disabled_resources: BTreeSet<String>,
}

/// Which group versions and resources the server installs.
///
/// A resource is served when its version is enabled and the resource is not
/// disabled, or when its version is disabled but the resource is explicitly
/// enabled. Unknown versions serve nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceConfig {
    versions: BTreeMap<GroupVersion, VersionConfig>,
}

impl ResourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// RBAC and storage versions enabled with all their resources.
    pub fn default_enabled() -> Self {
        let mut config = Self::new();
        config.enable_versions([GroupVersion::rbac(), GroupVersion::storage()]);
        config
    }

    pub fn enable_versions(&mut self, versions: impl IntoIterator<Item = GroupVersion>) {
        for gv in versions {
            self.versions.entry(gv).or_default().enabled = true;
        }
    }

    pub fn disable_versions(&mut self, versions: impl IntoIterator<Item = GroupVersion>) {
        for gv in versions {
            self.versions.entry(gv).or_default().enabled = false;
        }
    }

    pub fn enable_resource(&mut self, version: &GroupVersion, resource: &str) {
        let entry = self.versions.entry(version.clone()).or_default();
        entry.disabled_resources.remove(resource);
        entry.enabled_resources.insert(resource.to_string());
    }

    pub fn disable_resource(&mut self, version: &GroupVersion, resource: &str) {
        let entry = self.versions.entry(version.clone()).or_default();
        entry.enabled_resources.remove(resource);
        entry.disabled_resources.insert(resource.to_string());
    }

    pub fn version_enabled(&self, version: &GroupVersion) -> bool {
        self.versions.get(version).is_some_and(|v| v.enabled)
    }

    pub fn resource_enabled(&self, version: &GroupVersion, resource: &str) -> bool {
        match self.versions.get(version) {
            Some(v) if v.enabled => !v.disabled_resources.contains(resource),
            Some(v) => v.enabled_resources.contains(resource),
            None => false,
        }
    }

    pub fn any_resources_for_version_enabled(&self, version: &GroupVersion) -> bool {
        match self.versions.get(version) {
            Some(v) => v.enabled || !v.enabled_resources.is_empty(),
            None => false,
        }
    }
}

/// Process configuration, read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiServerConfig {
    /// Entries are `<resource>` (an RBAC resource) or
    /// `<group>/<version>/<resource>`; `*` as resource disables the version.
    pub disabled_resources: Vec<String>,
    pub rbac_super_user: Option<String>,
    pub skip_bootstrap: bool,
}

impl ApiServerConfig {
    pub fn from_env() -> Result<Self, ApiServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let disabled_resources = lookup(ENV_DISABLED_RESOURCES)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let rbac_super_user = lookup(ENV_RBAC_SUPER_USER).filter(|s| !s.is_empty());

        let skip_bootstrap = match lookup(ENV_SKIP_BOOTSTRAP).as_deref().map(str::trim) {
            None | Some("") => false,
            Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            Some(other) => {
                return Err(ApiServerError::Config {
                    key: ENV_SKIP_BOOTSTRAP,
                    message: format!("expected true/false, got \"{other}\""),
                });
            }
        };

        let config = Self { disabled_resources, rbac_super_user, skip_bootstrap };
        config.resource_config()?;
        Ok(config)
    }

    pub fn escalation_policy(&self) -> EscalationPolicy {
        EscalationPolicy::new(self.rbac_super_user.clone())
    }

    /// Default enablement with the configured resources switched off.
    pub fn resource_config(&self) -> Result<ResourceConfig, ApiServerError> {
        let mut config = ResourceConfig::default_enabled();

        for entry in &self.disabled_resources {
            let parts: Vec<&str> = entry.split('/').collect();
            match parts.as_slice() {
                [resource] => config.disable_resource(&GroupVersion::rbac(), resource),
                [group, version, "*"] => config.disable_versions([GroupVersion::new(*group, *version)]),
                [group, version, resource] if !resource.is_empty() => {
                    config.disable_resource(&GroupVersion::new(*group, *version), resource)
                }
                _ => {
                    return Err(ApiServerError::Config {
                        key: ENV_DISABLED_RESOURCES,
                        message: format!("cannot parse \"{entry}\""),
                    });
                }
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_enable_everything() {
        let config = ApiServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiServerConfig::default());

        let resources = config.resource_config().unwrap();
        assert!(resources.resource_enabled(&GroupVersion::rbac(), "clusterroles"));
        assert!(resources.resource_enabled(&GroupVersion::storage(), "storageclasses"));
        assert!(!resources.any_resources_for_version_enabled(&GroupVersion::new("apps", "v1")));
    }

    #[test]
    fn disabled_resources_are_parsed() {
        let config = ApiServerConfig::from_lookup(lookup(&[
            (ENV_DISABLED_RESOURCES, "roles, storage.k8s.io/v1beta1/*"),
            (ENV_RBAC_SUPER_USER, "root"),
            (ENV_SKIP_BOOTSTRAP, "true"),
        ]))
        .unwrap();
        assert!(config.skip_bootstrap);
        assert_eq!(config.escalation_policy(), EscalationPolicy::new(Some("root".into())));

        let resources = config.resource_config().unwrap();
        assert!(!resources.resource_enabled(&GroupVersion::rbac(), "roles"));
        assert!(resources.resource_enabled(&GroupVersion::rbac(), "rolebindings"));
        assert!(!resources.any_resources_for_version_enabled(&GroupVersion::storage()));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = ApiServerConfig::from_lookup(lookup(&[(ENV_SKIP_BOOTSTRAP, "maybe")])).unwrap_err();
        assert!(matches!(err, ApiServerError::Config { key: ENV_SKIP_BOOTSTRAP, .. }));

        let err = ApiServerConfig::from_lookup(lookup(&[(ENV_DISABLED_RESOURCES, "a/b")])).unwrap_err();
        assert!(matches!(err, ApiServerError::Config { key: ENV_DISABLED_RESOURCES, .. }));
    }

    #[test]
    fn explicitly_enabled_resource_survives_disabled_version() {
        let mut config = ResourceConfig::default_enabled();
        config.disable_versions([GroupVersion::rbac()]);
        assert!(!config.any_resources_for_version_enabled(&GroupVersion::rbac()));

        config.enable_resource(&GroupVersion::rbac(), "clusterroles");
        assert!(config.any_resources_for_version_enabled(&GroupVersion::rbac()));
        assert!(config.resource_enabled(&GroupVersion::rbac(), "clusterroles"));
        assert!(!config.resource_enabled(&GroupVersion::rbac(), "roles"));
    }
}
