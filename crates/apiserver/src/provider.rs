//! REST storage providers: build the storages of one API group.
//!
//! The RBAC storages are built lazily and only once. The four kinds share
//! one rule resolver, and the policy-checked storage of every kind reads the
//! others through it, so they must all come from the same construction.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use warden_rbac::{
    ClusterRole, ClusterRoleBinding, ClusterRoleBindingRegistry, ClusterRoleBindingStorage, ClusterRoleRegistry,
    ClusterRoleStorage, EscalationPolicy, PolicyBasedStorage, RbacStrategy, Role, RoleBinding,
    RoleBindingRegistry, RoleBindingStorage, RoleRegistry, RoleStorage, RuleResolver,
};
use warden_registry::storageclass::{StorageClass, StorageClassStrategy};
use warden_registry::{GenericStore, InMemoryStorage, Storage, StorageError};

use crate::bootstrap::BootstrapReconciler;
use crate::client::LoopbackClient;
use crate::config::{GroupVersion, ResourceConfig};
use crate::hooks::{PostStartHookContext, PostStartHookFn};

/// Name of the hook seeding the default RBAC policy.
pub const BOOTSTRAP_ROLES_HOOK: &str = "rbac/bootstrap-roles";

/// Storage served for one resource.
#[derive(Clone)]
pub enum ResourceStorage {
    Roles(Arc<RoleStorage>),
    RoleBindings(Arc<RoleBindingStorage>),
    ClusterRoles(Arc<ClusterRoleStorage>),
    ClusterRoleBindings(Arc<ClusterRoleBindingStorage>),
    StorageClasses(Arc<dyn Storage<StorageClass>>),
}

impl ResourceStorage {
    pub fn resource(&self) -> &'static str {
        use warden_core::Object;

        match self {
            ResourceStorage::Roles(_) => Role::RESOURCE,
            ResourceStorage::RoleBindings(_) => RoleBinding::RESOURCE,
            ResourceStorage::ClusterRoles(_) => ClusterRole::RESOURCE,
            ResourceStorage::ClusterRoleBindings(_) => ClusterRoleBinding::RESOURCE,
            ResourceStorage::StorageClasses(_) => StorageClass::RESOURCE,
        }
    }
}

/// Resource name to storage map for one group version.
#[derive(Clone)]
pub struct ApiGroupInfo {
    pub group_version: GroupVersion,
    pub resources: BTreeMap<&'static str, ResourceStorage>,
}

impl ApiGroupInfo {
    pub fn new(group_version: GroupVersion) -> Self {
        Self { group_version, resources: BTreeMap::new() }
    }

    fn insert(&mut self, storage: ResourceStorage) {
        self.resources.insert(storage.resource(), storage);
    }

    pub fn get(&self, resource: &str) -> Option<&ResourceStorage> {
        self.resources.get(resource)
    }

    pub fn resource_names(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Builds the storages of one API group for the enabled resources.
pub trait RestStorageProvider: Send + Sync {
    fn group_name(&self) -> &'static str;

    fn new_rest_storage(&self, config: &ResourceConfig) -> Result<ApiGroupInfo, StorageError>;
}

/// Raw (strategy-checked, not policy-checked) storages for the RBAC kinds.
#[derive(Clone)]
pub struct RbacBackends {
    pub roles: Arc<dyn Storage<Role>>,
    pub role_bindings: Arc<dyn Storage<RoleBinding>>,
    pub cluster_roles: Arc<dyn Storage<ClusterRole>>,
    pub cluster_role_bindings: Arc<dyn Storage<ClusterRoleBinding>>,
}

impl RbacBackends {
    /// In-memory backends with the RBAC strategy in front (tests/dev).
    pub fn in_memory() -> Self {
        fn store<T: warden_rbac::strategy::RbacObject>() -> Arc<dyn Storage<T>> {
            Arc::new(GenericStore::<T, _, _>::new(InMemoryStorage::new(), RbacStrategy::new()))
        }

        Self {
            roles: store(),
            role_bindings: store(),
            cluster_roles: store(),
            cluster_role_bindings: store(),
        }
    }
}

/// Produces the RBAC backends; invoked at most once successfully per provider.
pub trait RbacStorageFactory: Send + Sync {
    fn build(&self) -> Result<RbacBackends, StorageError>;
}

impl<F> RbacStorageFactory for F
where
    F: Fn() -> Result<RbacBackends, StorageError> + Send + Sync,
{
    fn build(&self) -> Result<RbacBackends, StorageError> {
        self()
    }
}

/// Everything the RBAC group serves, built together.
pub struct RbacStorageSet {
    pub backends: RbacBackends,
    pub resolver: Arc<RuleResolver>,
    pub roles: Arc<RoleStorage>,
    pub role_bindings: Arc<RoleBindingStorage>,
    pub cluster_roles: Arc<ClusterRoleStorage>,
    pub cluster_role_bindings: Arc<ClusterRoleBindingStorage>,
}

impl RbacStorageSet {
    fn new(backends: RbacBackends, policy: EscalationPolicy) -> Self {
        let resolver = Arc::new(RuleResolver::new(
            Arc::new(RoleRegistry::new(backends.roles.clone())),
            Arc::new(RoleBindingRegistry::new(backends.role_bindings.clone())),
            Arc::new(ClusterRoleRegistry::new(backends.cluster_roles.clone())),
            Arc::new(ClusterRoleBindingRegistry::new(backends.cluster_role_bindings.clone())),
        ));

        Self {
            roles: Arc::new(PolicyBasedStorage::new(backends.roles.clone(), resolver.clone(), policy.clone())),
            role_bindings: Arc::new(PolicyBasedStorage::new(
                backends.role_bindings.clone(),
                resolver.clone(),
                policy.clone(),
            )),
            cluster_roles: Arc::new(PolicyBasedStorage::new(
                backends.cluster_roles.clone(),
                resolver.clone(),
                policy.clone(),
            )),
            cluster_role_bindings: Arc::new(PolicyBasedStorage::new(
                backends.cluster_role_bindings.clone(),
                resolver.clone(),
                policy,
            )),
            backends,
            resolver,
        }
    }
}

/// REST storage provider for `rbac.authorization.k8s.io`.
pub struct RbacStorageProvider {
    factory: Box<dyn RbacStorageFactory>,
    policy: EscalationPolicy,
    storage: OnceCell<RbacStorageSet>,
}

impl RbacStorageProvider {
    pub fn new(factory: Box<dyn RbacStorageFactory>, policy: EscalationPolicy) -> Self {
        Self { factory, policy, storage: OnceCell::new() }
    }

    pub fn in_memory(policy: EscalationPolicy) -> Self {
        Self::new(Box::new(|| -> Result<RbacBackends, StorageError> { Ok(RbacBackends::in_memory()) }), policy)
    }

    /// The shared storage set, building it on first use.
    ///
    /// Concurrent first callers block until one construction finishes. A
    /// failed construction is returned to its caller and leaves the provider
    /// uninitialized.
    pub fn storage_set(&self) -> Result<&RbacStorageSet, StorageError> {
        self.storage.get_or_try_init(|| {
            let backends = self.factory.build()?;
            info!(group = warden_rbac::GROUP_NAME, "initialized rbac storage");
            Ok(RbacStorageSet::new(backends, self.policy.clone()))
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.storage.get().is_some()
    }

    /// Hook seeding the default policy through a loopback client.
    pub fn post_start_hook(self: &Arc<Self>) -> (&'static str, PostStartHookFn) {
        let provider = Arc::clone(self);
        let hook: PostStartHookFn = Box::new(move |ctx: &PostStartHookContext| -> anyhow::Result<()> {
            let set = match provider.storage_set() {
                Ok(set) => set,
                Err(err) => {
                    ctx.sink()
                        .handle_error(&anyhow::Error::new(err).context("unable to initialize rbac storage"));
                    return Ok(());
                }
            };
            let client = LoopbackClient::new(set.cluster_roles.clone(), set.cluster_role_bindings.clone());
            let report = BootstrapReconciler::new(client, ctx.sink().clone()).run();
            info!(
                created = report.created(),
                failures = report.failures,
                list_failed = ?report.list_failed,
                "rbac bootstrap finished"
            );
            Ok(())
        });
        (BOOTSTRAP_ROLES_HOOK, hook)
    }
}

impl RestStorageProvider for RbacStorageProvider {
    fn group_name(&self) -> &'static str {
        warden_rbac::GROUP_NAME
    }

    fn new_rest_storage(&self, config: &ResourceConfig) -> Result<ApiGroupInfo, StorageError> {
        let gv = GroupVersion::rbac();
        let mut info = ApiGroupInfo::new(gv.clone());
        if !config.any_resources_for_version_enabled(&gv) {
            debug!(group_version = %gv, "no resources enabled");
            return Ok(info);
        }

        let enabled = |resource: &str| config.resource_enabled(&gv, resource);
        if enabled("roles") {
            info.insert(ResourceStorage::Roles(self.storage_set()?.roles.clone()));
        }
        if enabled("rolebindings") {
            info.insert(ResourceStorage::RoleBindings(self.storage_set()?.role_bindings.clone()));
        }
        if enabled("clusterroles") {
            info.insert(ResourceStorage::ClusterRoles(self.storage_set()?.cluster_roles.clone()));
        }
        if enabled("clusterrolebindings") {
            info.insert(ResourceStorage::ClusterRoleBindings(self.storage_set()?.cluster_role_bindings.clone()));
        }
        Ok(info)
    }
}

/// REST storage provider for `storage.k8s.io`.
pub struct StorageRestProvider {
    storage_classes: Arc<dyn Storage<StorageClass>>,
}

impl StorageRestProvider {
    pub fn new(storage_classes: Arc<dyn Storage<StorageClass>>) -> Self {
        Self { storage_classes }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(GenericStore::<StorageClass, _, _>::new(
            InMemoryStorage::new(),
            StorageClassStrategy,
        )))
    }
}

impl RestStorageProvider for StorageRestProvider {
    fn group_name(&self) -> &'static str {
        warden_registry::storageclass::GROUP_NAME
    }

    fn new_rest_storage(&self, config: &ResourceConfig) -> Result<ApiGroupInfo, StorageError> {
        let gv = GroupVersion::storage();
        let mut info = ApiGroupInfo::new(gv.clone());
        if config.resource_enabled(&gv, "storageclasses") {
            info.insert(ResourceStorage::StorageClasses(self.storage_classes.clone()));
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_provider(builds: Arc<AtomicUsize>) -> RbacStorageProvider {
        RbacStorageProvider::new(
            Box::new(move || -> Result<RbacBackends, StorageError> {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(RbacBackends::in_memory())
            }),
            EscalationPolicy::default(),
        )
    }

    #[test]
    fn storage_set_is_built_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let provider = counting_provider(builds.clone());
        assert!(!provider.is_initialized());

        let first = provider.storage_set().unwrap() as *const RbacStorageSet;
        let second = provider.storage_set().unwrap() as *const RbacStorageSet;
        assert_eq!(first, second);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_group_never_initializes() {
        let builds = Arc::new(AtomicUsize::new(0));
        let provider = counting_provider(builds.clone());
        let mut config = ResourceConfig::default_enabled();
        config.disable_versions([GroupVersion::rbac()]);

        let info = provider.new_rest_storage(&config).unwrap();
        assert!(info.is_empty());
        assert!(!provider.is_initialized());
        assert_eq!(builds.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn only_enabled_resources_are_installed() {
        let builds = Arc::new(AtomicUsize::new(0));
        let provider = counting_provider(builds.clone());
        let mut config = ResourceConfig::default_enabled();
        config.disable_resource(&GroupVersion::rbac(), "roles");

        let info = provider.new_rest_storage(&config).unwrap();
        assert_eq!(info.resource_names(), vec!["clusterrolebindings", "clusterroles", "rolebindings"]);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_initialization_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let provider = RbacStorageProvider::new(
            Box::new(move || -> Result<RbacBackends, StorageError> {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(StorageError::Unavailable("not yet".into()))
                } else {
                    Ok(RbacBackends::in_memory())
                }
            }),
            EscalationPolicy::default(),
        );

        assert!(matches!(provider.storage_set(), Err(StorageError::Unavailable(_))));
        assert!(!provider.is_initialized());
        assert!(provider.storage_set().is_ok());
        assert!(provider.storage_set().is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn storage_group_serves_storage_classes() {
        let provider = StorageRestProvider::in_memory();
        let info = provider.new_rest_storage(&ResourceConfig::default_enabled()).unwrap();
        assert_eq!(info.group_version.to_string(), "storage.k8s.io/v1beta1");
        assert!(matches!(info.get("storageclasses"), Some(ResourceStorage::StorageClasses(_))));
    }
}
