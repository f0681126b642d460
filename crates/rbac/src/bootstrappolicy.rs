//! Default roles and bindings every cluster starts with.

use crate::rule::PolicyRule;
use crate::types::{ClusterRole, ClusterRoleBinding, RoleRef, Subject};
use crate::user::{ALL_AUTHENTICATED, ALL_UNAUTHENTICATED, SYSTEM_PRIVILEGED_GROUP};

const LEGACY_GROUP: &str = "";
const APPS_GROUP: &str = "apps";
const AUTOSCALING_GROUP: &str = "autoscaling";
const BATCH_GROUP: &str = "batch";
const EXTENSIONS_GROUP: &str = "extensions";
const POLICY_GROUP: &str = "policy";
const RBAC_GROUP: &str = crate::GROUP_NAME;
const STORAGE_GROUP: &str = "storage.k8s.io";
const AUTHORIZATION_GROUP: &str = "authorization.k8s.io";

/// Namespace controller service accounts live in.
pub const CONTROLLER_NAMESPACE: &str = "kube-system";
const CONTROLLER_ROLE_PREFIX: &str = "system:controller:";

const READ: &[&str] = &["get", "list", "watch"];
const READ_WRITE: &[&str] = &["get", "list", "watch", "create", "update", "patch", "delete", "deletecollection"];

fn workload_resources() -> Vec<PolicyRule> {
    vec![
        PolicyRule::new(READ_WRITE).groups(&[LEGACY_GROUP]).resources(&[
            "pods",
            "pods/attach",
            "pods/proxy",
            "pods/exec",
            "pods/portforward",
            "replicationcontrollers",
            "replicationcontrollers/scale",
            "serviceaccounts",
            "services",
            "services/proxy",
            "endpoints",
            "persistentvolumeclaims",
            "configmaps",
            "secrets",
        ]),
        PolicyRule::new(READ).groups(&[LEGACY_GROUP]).resources(&[
            "limitranges",
            "resourcequotas",
            "bindings",
            "events",
            "pods/status",
            "resourcequotas/status",
            "namespaces/status",
            "replicationcontrollers/status",
            "pods/log",
        ]),
        PolicyRule::new(READ).groups(&[LEGACY_GROUP]).resources(&["namespaces"]),
        PolicyRule::new(READ_WRITE).groups(&[APPS_GROUP]).resources(&["petsets"]),
        PolicyRule::new(READ_WRITE).groups(&[AUTOSCALING_GROUP]).resources(&["horizontalpodautoscalers"]),
        PolicyRule::new(READ_WRITE).groups(&[BATCH_GROUP]).resources(&["jobs", "scheduledjobs"]),
        PolicyRule::new(READ_WRITE).groups(&[EXTENSIONS_GROUP]).resources(&[
            "jobs",
            "daemonsets",
            "horizontalpodautoscalers",
            "replicationcontrollers/scale",
            "replicasets",
            "replicasets/scale",
            "deployments",
            "deployments/scale",
        ]),
    ]
}

/// Default cluster roles.
pub fn cluster_roles() -> Vec<ClusterRole> {
    let view_rules = vec![
        PolicyRule::new(READ).groups(&[LEGACY_GROUP]).resources(&[
            "pods",
            "replicationcontrollers",
            "replicationcontrollers/scale",
            "serviceaccounts",
            "services",
            "endpoints",
            "persistentvolumeclaims",
            "configmaps",
            "limitranges",
            "resourcequotas",
            "bindings",
            "events",
            "pods/status",
            "resourcequotas/status",
            "namespaces/status",
            "replicationcontrollers/status",
            "pods/log",
        ]),
        PolicyRule::new(READ).groups(&[LEGACY_GROUP]).resources(&["namespaces"]),
        PolicyRule::new(READ).groups(&[APPS_GROUP]).resources(&["petsets"]),
        PolicyRule::new(READ).groups(&[AUTOSCALING_GROUP]).resources(&["horizontalpodautoscalers"]),
        PolicyRule::new(READ).groups(&[BATCH_GROUP]).resources(&["jobs", "scheduledjobs"]),
        PolicyRule::new(READ).groups(&[EXTENSIONS_GROUP]).resources(&[
            "jobs",
            "daemonsets",
            "horizontalpodautoscalers",
            "replicationcontrollers/scale",
            "replicasets",
            "replicasets/scale",
            "deployments",
            "deployments/scale",
        ]),
    ];

    let mut admin_rules = workload_resources();
    admin_rules.push(PolicyRule::new(READ_WRITE).groups(&[RBAC_GROUP]).resources(&["roles", "rolebindings"]));
    admin_rules.push(
        PolicyRule::new(&["create"])
            .groups(&[AUTHORIZATION_GROUP])
            .resources(&["localsubjectaccessreviews"]),
    );
    admin_rules.push(PolicyRule::new(READ_WRITE).groups(&[POLICY_GROUP]).resources(&["poddisruptionbudgets"]));

    vec![
        ClusterRole::new(
            "cluster-admin",
            vec![
                PolicyRule::new(&["*"]).groups(&["*"]).resources(&["*"]),
                PolicyRule::new(&["*"]).urls(&["*"]),
            ],
        ),
        ClusterRole::new(
            "system:discovery",
            vec![PolicyRule::new(&["get"]).urls(&["/version", "/api", "/api/*", "/apis", "/apis/*"])],
        ),
        ClusterRole::new(
            "system:basic-user",
            vec![PolicyRule::new(&["create"])
                .groups(&[AUTHORIZATION_GROUP])
                .resources(&["selfsubjectaccessreviews"])],
        ),
        ClusterRole::new("admin", admin_rules),
        ClusterRole::new("edit", workload_resources()),
        ClusterRole::new("view", view_rules),
    ]
}

struct ControllerPolicy {
    name: &'static str,
    rules: fn() -> Vec<PolicyRule>,
}

const CONTROLLERS: &[ControllerPolicy] = &[
    ControllerPolicy {
        name: "namespace-controller",
        rules: || {
            vec![
                PolicyRule::new(&["get", "list", "watch", "delete"]).groups(&[LEGACY_GROUP]).resources(&["namespaces"]),
                PolicyRule::new(&["update"])
                    .groups(&[LEGACY_GROUP])
                    .resources(&["namespaces/finalize", "namespaces/status"]),
                PolicyRule::new(&["get", "list", "delete", "deletecollection"]).groups(&["*"]).resources(&["*"]),
            ]
        },
    },
    ControllerPolicy {
        name: "replication-controller",
        rules: || {
            vec![
                PolicyRule::new(&["get", "list", "watch", "update"])
                    .groups(&[LEGACY_GROUP])
                    .resources(&["replicationcontrollers"]),
                PolicyRule::new(&["update"]).groups(&[LEGACY_GROUP]).resources(&["replicationcontrollers/status"]),
                PolicyRule::new(&["list", "watch", "create", "delete"]).groups(&[LEGACY_GROUP]).resources(&["pods"]),
                PolicyRule::new(&["create", "update", "patch"]).groups(&[LEGACY_GROUP]).resources(&["events"]),
            ]
        },
    },
    ControllerPolicy {
        name: "job-controller",
        rules: || {
            vec![
                PolicyRule::new(&["get", "list", "watch", "update"])
                    .groups(&[BATCH_GROUP, EXTENSIONS_GROUP])
                    .resources(&["jobs"]),
                PolicyRule::new(&["update"]).groups(&[BATCH_GROUP, EXTENSIONS_GROUP]).resources(&["jobs/status"]),
                PolicyRule::new(&["list", "watch", "create", "delete"]).groups(&[LEGACY_GROUP]).resources(&["pods"]),
                PolicyRule::new(&["create", "update", "patch"]).groups(&[LEGACY_GROUP]).resources(&["events"]),
            ]
        },
    },
    ControllerPolicy {
        name: "endpoint-controller",
        rules: || {
            vec![
                PolicyRule::new(READ).groups(&[LEGACY_GROUP]).resources(&["services", "pods"]),
                PolicyRule::new(&["get", "list", "create", "update", "delete"])
                    .groups(&[LEGACY_GROUP])
                    .resources(&["endpoints"]),
                PolicyRule::new(&["create"]).groups(&[LEGACY_GROUP]).resources(&["endpoints/restricted"]),
            ]
        },
    },
    ControllerPolicy {
        name: "persistent-volume-binder",
        rules: || {
            vec![
                PolicyRule::new(&["get", "list", "watch", "update", "create", "delete"])
                    .groups(&[LEGACY_GROUP])
                    .resources(&["persistentvolumes"]),
                PolicyRule::new(&["update"]).groups(&[LEGACY_GROUP]).resources(&["persistentvolumes/status"]),
                PolicyRule::new(&["get", "list", "watch", "update"])
                    .groups(&[LEGACY_GROUP])
                    .resources(&["persistentvolumeclaims"]),
                PolicyRule::new(&["update"]).groups(&[LEGACY_GROUP]).resources(&["persistentvolumeclaims/status"]),
                PolicyRule::new(READ).groups(&[STORAGE_GROUP]).resources(&["storageclasses"]),
                PolicyRule::new(&["create", "update", "patch"]).groups(&[LEGACY_GROUP]).resources(&["events"]),
            ]
        },
    },
    ControllerPolicy {
        name: "service-account-controller",
        rules: || {
            vec![
                PolicyRule::new(&["create"]).groups(&[LEGACY_GROUP]).resources(&["serviceaccounts"]),
                PolicyRule::new(&["create", "update", "patch"]).groups(&[LEGACY_GROUP]).resources(&["events"]),
            ]
        },
    },
    ControllerPolicy {
        name: "generic-garbage-collector",
        rules: || vec![PolicyRule::new(&["get", "list", "watch", "patch", "update", "delete"]).groups(&["*"]).resources(&["*"])],
    },
];

/// `system:controller:<name>`
pub fn controller_role_name(controller: &str) -> String {
    format!("{CONTROLLER_ROLE_PREFIX}{controller}")
}

/// One cluster role per built-in controller.
pub fn controller_roles() -> Vec<ClusterRole> {
    CONTROLLERS
        .iter()
        .map(|c| ClusterRole::new(controller_role_name(c.name), (c.rules)()))
        .collect()
}

/// Default cluster role bindings.
pub fn cluster_role_bindings() -> Vec<ClusterRoleBinding> {
    vec![
        ClusterRoleBinding::new(
            "cluster-admin",
            RoleRef::cluster_role("cluster-admin"),
            vec![Subject::group(SYSTEM_PRIVILEGED_GROUP)],
        ),
        ClusterRoleBinding::new(
            "system:discovery",
            RoleRef::cluster_role("system:discovery"),
            vec![Subject::group(ALL_AUTHENTICATED), Subject::group(ALL_UNAUTHENTICATED)],
        ),
        ClusterRoleBinding::new(
            "system:basic-user",
            RoleRef::cluster_role("system:basic-user"),
            vec![Subject::group(ALL_AUTHENTICATED)],
        ),
    ]
}

/// Binds each controller role to the controller's service account in `kube-system`.
pub fn controller_role_bindings() -> Vec<ClusterRoleBinding> {
    CONTROLLERS
        .iter()
        .map(|c| {
            let name = controller_role_name(c.name);
            ClusterRoleBinding::new(
                name.clone(),
                RoleRef::cluster_role(name),
                vec![Subject::service_account(CONTROLLER_NAMESPACE, c.name)],
            )
        })
        .collect()
}
