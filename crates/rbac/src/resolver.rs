//! Cross-resource rule resolution.
//!
//! A subject's effective rules in a namespace are the union of the rules of
//! every role referenced by a RoleBinding in that namespace naming the
//! subject, plus those referenced by ClusterRoleBindings naming the subject.
//! Nothing is cached: every call re-reads the registries, so bindings always
//! grant their referenced role's current rules.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::RbacError;
use crate::registry::{ClusterRoleBindingLister, ClusterRoleGetter, RoleBindingLister, RoleGetter};
use crate::rule::{covers, PolicyRule};
use crate::types::{ClusterRole, Role, RoleRef, RoleRefKind};
use crate::user::UserInfo;

/// The role a binding points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Role(Role),
    ClusterRole(ClusterRole),
}

impl RuleSource {
    pub fn rules(&self) -> &[PolicyRule] {
        match self {
            RuleSource::Role(r) => &r.rules,
            RuleSource::ClusterRole(r) => &r.rules,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RuleSource::Role(r) => &r.metadata.name,
            RuleSource::ClusterRole(r) => &r.metadata.name,
        }
    }
}

pub struct RuleResolver {
    roles: Arc<dyn RoleGetter>,
    role_bindings: Arc<dyn RoleBindingLister>,
    cluster_roles: Arc<dyn ClusterRoleGetter>,
    cluster_role_bindings: Arc<dyn ClusterRoleBindingLister>,
}

impl RuleResolver {
    pub fn new(
        roles: Arc<dyn RoleGetter>,
        role_bindings: Arc<dyn RoleBindingLister>,
        cluster_roles: Arc<dyn ClusterRoleGetter>,
        cluster_role_bindings: Arc<dyn ClusterRoleBindingLister>,
    ) -> Self {
        Self { roles, role_bindings, cluster_roles, cluster_role_bindings }
    }

    /// Fetch the role `role_ref` points at.
    ///
    /// `Role` references resolve in `binding_namespace`; a `Role` reference
    /// without one (only possible on a malformed cluster binding) and a
    /// missing role both yield `None`.
    pub fn rule_source(
        &self,
        role_ref: &RoleRef,
        binding_namespace: Option<&str>,
    ) -> Result<Option<RuleSource>, RbacError> {
        let fetched = match (role_ref.kind, binding_namespace) {
            (RoleRefKind::ClusterRole, _) => {
                self.cluster_roles.get_cluster_role(&role_ref.name).map(RuleSource::ClusterRole)
            }
            (RoleRefKind::Role, Some(ns)) => self.roles.get_role(ns, &role_ref.name).map(RuleSource::Role),
            (RoleRefKind::Role, None) => return Ok(None),
        };

        match fetched {
            Ok(source) => Ok(Some(source)),
            Err(e) if e.is_not_found() => {
                debug!(kind = role_ref.kind.as_str(), name = %role_ref.name, "role reference does not resolve");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rules granted through `role_ref`; empty when it dangles.
    pub fn role_reference_rules(
        &self,
        role_ref: &RoleRef,
        binding_namespace: Option<&str>,
    ) -> Result<Vec<PolicyRule>, RbacError> {
        Ok(self
            .rule_source(role_ref, binding_namespace)?
            .map(|source| source.rules().to_vec())
            .unwrap_or_default())
    }

    /// Effective rules of `user` in `namespace` (cluster scope when `None`).
    ///
    /// The result is a deduplicated union; its order carries no meaning.
    pub fn resolve_rules(&self, user: &UserInfo, namespace: Option<&str>) -> Result<Vec<PolicyRule>, RbacError> {
        let mut rules = BTreeSet::new();

        for binding in self.cluster_role_bindings.list_cluster_role_bindings()? {
            if !crate::types::applies_to(user, &binding.subjects, None) {
                continue;
            }
            rules.extend(self.role_reference_rules(&binding.role_ref, None)?);
        }

        if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
            for binding in self.role_bindings.list_role_bindings(ns)? {
                if !crate::types::applies_to(user, &binding.subjects, Some(ns)) {
                    continue;
                }
                rules.extend(self.role_reference_rules(&binding.role_ref, Some(ns))?);
            }
        }

        Ok(rules.into_iter().collect())
    }

    /// Whether `user`'s current rules in `namespace` cover all of `candidate`.
    pub fn covers_rules(
        &self,
        user: &UserInfo,
        namespace: Option<&str>,
        candidate: &[PolicyRule],
    ) -> Result<bool, RbacError> {
        let owned = self.resolve_rules(user, namespace)?;
        Ok(covers(&owned, candidate).0)
    }

    /// Like [`covers_rules`](Self::covers_rules), but reports what is missing.
    pub fn confirm_no_escalation(
        &self,
        user: &UserInfo,
        namespace: Option<&str>,
        candidate: &[PolicyRule],
    ) -> Result<(), RbacError> {
        let owned = self.resolve_rules(user, namespace)?;
        let (covered, missing) = covers(&owned, candidate);
        if covered {
            return Ok(());
        }
        Err(RbacError::Escalation {
            user: user.name.clone(),
            namespace: namespace.map(str::to_owned),
            missing,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use warden_core::{ObjectKey, SelectionPredicate};
    use warden_registry::{InMemoryStorage, Storage, StorageError, WatchStream};

    use super::*;
    use crate::registry::{ClusterRoleBindingRegistry, ClusterRoleRegistry, RoleBindingRegistry, RoleRegistry};
    use crate::types::{ClusterRoleBinding, RoleBinding, Subject};

    pub(crate) struct Fixture {
        pub roles: Arc<InMemoryStorage<Role>>,
        pub role_bindings: Arc<InMemoryStorage<RoleBinding>>,
        pub cluster_roles: Arc<InMemoryStorage<ClusterRole>>,
        pub cluster_role_bindings: Arc<InMemoryStorage<ClusterRoleBinding>>,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                roles: Arc::new(InMemoryStorage::new()),
                role_bindings: Arc::new(InMemoryStorage::new()),
                cluster_roles: Arc::new(InMemoryStorage::new()),
                cluster_role_bindings: Arc::new(InMemoryStorage::new()),
            }
        }

        pub fn resolver(&self) -> RuleResolver {
            RuleResolver::new(
                Arc::new(RoleRegistry::new(self.roles.clone())),
                Arc::new(RoleBindingRegistry::new(self.role_bindings.clone())),
                Arc::new(ClusterRoleRegistry::new(self.cluster_roles.clone())),
                Arc::new(ClusterRoleBindingRegistry::new(self.cluster_role_bindings.clone())),
            )
        }
    }

    fn pods(verbs: &[&str]) -> PolicyRule {
        PolicyRule::new(verbs).groups(&[""]).resources(&["pods"])
    }

    fn sorted(mut rules: Vec<PolicyRule>) -> Vec<PolicyRule> {
        rules.sort();
        rules
    }

    #[test]
    fn alice_gets_namespace_rules_only_in_that_namespace() {
        let fx = Fixture::new();
        let alice = UserInfo::new("alice");
        fx.roles.create(Role::new("ns1", "pod-reader", vec![pods(&["get"])])).unwrap();
        fx.role_bindings
            .create(RoleBinding::new("ns1", "read", RoleRef::role("pod-reader"), vec![Subject::user("alice")]))
            .unwrap();

        let resolver = fx.resolver();
        assert_eq!(resolver.resolve_rules(&alice, Some("ns1")).unwrap(), vec![pods(&["get"])]);
        assert!(resolver.resolve_rules(&alice, Some("ns2")).unwrap().is_empty());
        assert!(resolver.resolve_rules(&alice, None).unwrap().is_empty());

        assert!(resolver.covers_rules(&alice, Some("ns1"), &[pods(&["get"])]).unwrap());
        let err = resolver.confirm_no_escalation(&alice, Some("ns1"), &[pods(&["get", "delete"])]).unwrap_err();
        match err {
            RbacError::Escalation { missing, .. } => assert_eq!(missing, vec![pods(&["delete"])]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cluster_bindings_apply_everywhere_and_role_bindings_may_use_cluster_roles() {
        let fx = Fixture::new();
        let dev = UserInfo::new("bob").with_group("dev");
        fx.cluster_roles.create(ClusterRole::new("view", vec![pods(&["get", "list"])])).unwrap();
        fx.cluster_roles.create(ClusterRole::new("editor", vec![pods(&["update"])])).unwrap();
        fx.cluster_role_bindings
            .create(ClusterRoleBinding::new("viewers", RoleRef::cluster_role("view"), vec![Subject::group("dev")]))
            .unwrap();
        fx.role_bindings
            .create(RoleBinding::new("ns1", "edit", RoleRef::cluster_role("editor"), vec![Subject::group("dev")]))
            .unwrap();

        let resolver = fx.resolver();
        assert_eq!(resolver.resolve_rules(&dev, None).unwrap(), vec![pods(&["get", "list"])]);
        assert_eq!(
            sorted(resolver.resolve_rules(&dev, Some("ns1")).unwrap()),
            sorted(vec![pods(&["get", "list"]), pods(&["update"])])
        );
    }

    #[test]
    fn bindings_see_current_role_rules() {
        let fx = Fixture::new();
        let alice = UserInfo::new("alice");
        let created = fx.cluster_roles.create(ClusterRole::new("ops", vec![pods(&["get"])])).unwrap();
        fx.cluster_role_bindings
            .create(ClusterRoleBinding::new("ops", RoleRef::cluster_role("ops"), vec![Subject::user("alice")]))
            .unwrap();
        let resolver = fx.resolver();
        assert!(!resolver.covers_rules(&alice, None, &[pods(&["delete"])]).unwrap());

        let mut updated = created;
        updated.rules = vec![pods(&["get", "delete"])];
        fx.cluster_roles.update(updated).unwrap();
        assert!(resolver.covers_rules(&alice, None, &[pods(&["delete"])]).unwrap());
    }

    #[test]
    fn dangling_references_contribute_nothing() {
        let fx = Fixture::new();
        let alice = UserInfo::new("alice");
        fx.cluster_role_bindings
            .create(ClusterRoleBinding::new("ghost", RoleRef::cluster_role("ghost"), vec![Subject::user("alice")]))
            .unwrap();
        fx.role_bindings
            .create(RoleBinding::new("ns1", "ghost", RoleRef::role("ghost"), vec![Subject::user("alice")]))
            .unwrap();

        assert!(fx.resolver().resolve_rules(&alice, Some("ns1")).unwrap().is_empty());
    }

    #[test]
    fn duplicate_grants_are_deduplicated() {
        let fx = Fixture::new();
        let alice = UserInfo::new("alice").with_group("dev");
        fx.cluster_roles.create(ClusterRole::new("view", vec![pods(&["get"])])).unwrap();
        for (name, subject) in [("by-user", Subject::user("alice")), ("by-group", Subject::group("dev"))] {
            fx.cluster_role_bindings
                .create(ClusterRoleBinding::new(name, RoleRef::cluster_role("view"), vec![subject]))
                .unwrap();
        }
        assert_eq!(fx.resolver().resolve_rules(&alice, None).unwrap(), vec![pods(&["get"])]);
    }

    /// Role storage whose reads always fail.
    struct Unavailable;

    impl Storage<ClusterRole> for Unavailable {
        fn get(&self, _key: &ObjectKey) -> Result<ClusterRole, StorageError> {
            Err(StorageError::Unavailable("etcd down".into()))
        }
        fn list(&self, _ns: Option<&str>, _p: &SelectionPredicate) -> Result<Vec<ClusterRole>, StorageError> {
            Err(StorageError::Unavailable("etcd down".into()))
        }
        fn create(&self, _obj: ClusterRole) -> Result<ClusterRole, StorageError> {
            Err(StorageError::Unavailable("etcd down".into()))
        }
        fn update(&self, _obj: ClusterRole) -> Result<ClusterRole, StorageError> {
            Err(StorageError::Unavailable("etcd down".into()))
        }
        fn delete(&self, _key: &ObjectKey) -> Result<ClusterRole, StorageError> {
            Err(StorageError::Unavailable("etcd down".into()))
        }
        fn watch(&self, _ns: Option<&str>) -> Result<WatchStream<ClusterRole>, StorageError> {
            Err(StorageError::Unavailable("etcd down".into()))
        }
    }

    #[test]
    fn storage_failures_propagate() {
        let fx = Fixture::new();
        fx.cluster_role_bindings
            .create(ClusterRoleBinding::new("view", RoleRef::cluster_role("view"), vec![Subject::user("alice")]))
            .unwrap();
        let resolver = RuleResolver::new(
            Arc::new(RoleRegistry::new(fx.roles.clone())),
            Arc::new(RoleBindingRegistry::new(fx.role_bindings.clone())),
            Arc::new(ClusterRoleRegistry::new(Arc::new(Unavailable))),
            Arc::new(ClusterRoleBindingRegistry::new(fx.cluster_role_bindings.clone())),
        );

        let err = resolver.resolve_rules(&UserInfo::new("alice"), None).unwrap_err();
        assert!(matches!(err, RbacError::Storage(StorageError::Unavailable(_))));
    }

    fn arb_rule() -> impl Strategy<Value = PolicyRule> {
        (
            prop::sample::subsequence(vec!["get", "list", "create", "delete"], 1..=2),
            prop::sample::subsequence(vec!["pods", "secrets", "services"], 1..=2),
        )
            .prop_map(|(verbs, resources)| PolicyRule::new(&verbs).groups(&[""]).resources(&resources))
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        /// Namespace resolution is exactly the cluster-wide grants plus the
        /// namespace's own bindings.
        #[test]
        fn namespace_rules_are_union_of_cluster_and_local_grants(
            cluster_rules in prop::collection::vec(arb_rule(), 0..4),
            local_rules in prop::collection::vec(arb_rule(), 0..4),
            other_rules in prop::collection::vec(arb_rule(), 0..4),
        ) {
            let fx = Fixture::new();
            let alice = UserInfo::new("alice");
            fx.cluster_roles.create(ClusterRole::new("global", cluster_rules.clone())).unwrap();
            fx.cluster_role_bindings
                .create(ClusterRoleBinding::new("global", RoleRef::cluster_role("global"), vec![Subject::user("alice")]))
                .unwrap();
            fx.roles.create(Role::new("ns1", "local", local_rules.clone())).unwrap();
            fx.role_bindings
                .create(RoleBinding::new("ns1", "local", RoleRef::role("local"), vec![Subject::user("alice")]))
                .unwrap();
            fx.roles.create(Role::new("ns2", "other", other_rules)).unwrap();
            fx.role_bindings
                .create(RoleBinding::new("ns2", "other", RoleRef::role("other"), vec![Subject::user("alice")]))
                .unwrap();

            let expected: BTreeSet<PolicyRule> = cluster_rules.into_iter().chain(local_rules).collect();
            let resolved: BTreeSet<PolicyRule> =
                fx.resolver().resolve_rules(&alice, Some("ns1")).unwrap().into_iter().collect();
            prop_assert_eq!(resolved, expected);
        }

        /// Whatever a subject holds, they may grant.
        #[test]
        fn held_rules_are_always_covered(rules in prop::collection::vec(arb_rule(), 1..4), pick in any::<prop::sample::Index>()) {
            let fx = Fixture::new();
            let alice = UserInfo::new("alice");
            fx.roles.create(Role::new("ns1", "r", rules.clone())).unwrap();
            fx.role_bindings
                .create(RoleBinding::new("ns1", "b", RoleRef::role("r"), vec![Subject::user("alice")]))
                .unwrap();

            let resolver = fx.resolver();
            let held = resolver.resolve_rules(&alice, Some("ns1")).unwrap();
            prop_assert!(resolver.covers_rules(&alice, Some("ns1"), &held).unwrap());
            prop_assert!(resolver.confirm_no_escalation(&alice, Some("ns1"), &[pick.get(&rules).clone()]).is_ok());
        }
    }
}
