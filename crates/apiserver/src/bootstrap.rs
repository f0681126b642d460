//! Seeds the default cluster roles and bindings into an empty cluster.
//!
//! Each phase lists what exists and only creates the defaults when nothing
//! is there, so operator edits survive restarts. The two phases run
//! independently. Nothing here fails the caller: every problem is handed to
//! the error sink and the reconciler carries on with the next object or
//! phase.

use std::sync::Arc;

use anyhow::Context as _;
use tracing::info;

use warden_core::Object;
use warden_observability::ErrorSink;
use warden_rbac::bootstrappolicy;
use warden_rbac::{ClusterRole, ClusterRoleBinding, RbacError, GROUP_NAME};

use crate::client::RbacClient;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    ClusterRoles,
    ClusterRoleBindings,
}

/// What one bootstrap run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub created_cluster_roles: Vec<String>,
    pub created_cluster_role_bindings: Vec<String>,
    /// Phases skipped because objects of that kind already existed.
    pub skipped: Vec<Phase>,
    /// Errors handed to the sink.
    pub failures: usize,
    /// Phases stopped early because listing existing objects failed.
    pub list_failed: Vec<Phase>,
}

impl BootstrapReport {
    pub fn created(&self) -> usize {
        self.created_cluster_roles.len() + self.created_cluster_role_bindings.len()
    }
}

pub struct BootstrapReconciler<C> {
    client: C,
    sink: Arc<dyn ErrorSink>,
    cluster_roles: Vec<ClusterRole>,
    cluster_role_bindings: Vec<ClusterRoleBinding>,
}

impl<C: RbacClient> BootstrapReconciler<C> {
    /// Reconciler seeding the built-in default policy.
    pub fn new(client: C, sink: Arc<dyn ErrorSink>) -> Self {
        let cluster_roles = bootstrappolicy::cluster_roles()
            .into_iter()
            .chain(bootstrappolicy::controller_roles())
            .collect();
        let cluster_role_bindings = bootstrappolicy::cluster_role_bindings()
            .into_iter()
            .chain(bootstrappolicy::controller_role_bindings())
            .collect();
        Self::with_policy(client, sink, cluster_roles, cluster_role_bindings)
    }

    pub fn with_policy(
        client: C,
        sink: Arc<dyn ErrorSink>,
        cluster_roles: Vec<ClusterRole>,
        cluster_role_bindings: Vec<ClusterRoleBinding>,
    ) -> Self {
        Self { client, sink, cluster_roles, cluster_role_bindings }
    }

    pub fn run(&self) -> BootstrapReport {
        let mut report = BootstrapReport::default();

        self.seed(
            &mut report,
            Phase::ClusterRoles,
            "clusterroles",
            || self.client.list_cluster_roles().map(|existing| existing.is_empty()),
            &self.cluster_roles,
            |role| self.client.create_cluster_role(role),
        );
        self.seed(
            &mut report,
            Phase::ClusterRoleBindings,
            "clusterrolebindings",
            || self.client.list_cluster_role_bindings().map(|existing| existing.is_empty()),
            &self.cluster_role_bindings,
            |binding| self.client.create_cluster_role_binding(binding),
        );
        report
    }

    fn seed<T, L, F>(
        &self,
        report: &mut BootstrapReport,
        phase: Phase,
        resource: &str,
        list_is_empty: L,
        defaults: &[T],
        create: F,
    )
    where
        T: Object,
        L: FnOnce() -> Result<bool, RbacError>,
        F: Fn(T) -> Result<T, RbacError>,
    {
        let empty = match list_is_empty() {
            Ok(empty) => empty,
            Err(err) => {
                report.failures += 1;
                report.list_failed.push(phase);
                self.sink
                    .handle_error(&anyhow::Error::new(err).context(format!("unable to initialize {resource}")));
                return;
            }
        };

        if !empty {
            report.skipped.push(phase);
            return;
        }

        for obj in defaults {
            let name = obj.name().to_string();
            match create(obj.clone()).with_context(|| format!("unable to initialize {resource} \"{name}\"")) {
                Ok(_) => {
                    info!("created {}.{GROUP_NAME}/{name}", T::RESOURCE.trim_end_matches('s'));
                    match phase {
                        Phase::ClusterRoles => report.created_cluster_roles.push(name),
                        Phase::ClusterRoleBindings => report.created_cluster_role_bindings.push(name),
                    }
                }
                Err(err) => {
                    report.failures += 1;
                    self.sink.handle_error(&err);
                }
            }
        }
    }
}
