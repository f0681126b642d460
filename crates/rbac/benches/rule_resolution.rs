use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use warden_rbac::bootstrappolicy::{cluster_role_bindings, cluster_roles, controller_role_bindings, controller_roles};
use warden_rbac::{
    covers, ClusterRole, ClusterRoleBinding, ClusterRoleBindingRegistry, ClusterRoleRegistry, PolicyRule, Role,
    RoleBinding, RoleBindingRegistry, RoleRef, RoleRegistry, RuleResolver, Subject, UserInfo,
};
use warden_registry::{InMemoryStorage, Storage};

/// Resolver over the default policy plus `bindings` extra RoleBindings in `ns1`.
fn setup_resolver(bindings: usize) -> RuleResolver {
    let roles = Arc::new(InMemoryStorage::<Role>::new());
    let role_bindings = Arc::new(InMemoryStorage::<RoleBinding>::new());
    let cluster_roles_store = Arc::new(InMemoryStorage::<ClusterRole>::new());
    let cluster_role_bindings_store = Arc::new(InMemoryStorage::<ClusterRoleBinding>::new());

    for role in cluster_roles().into_iter().chain(controller_roles()) {
        cluster_roles_store.create(role).unwrap();
    }
    for binding in cluster_role_bindings().into_iter().chain(controller_role_bindings()) {
        cluster_role_bindings_store.create(binding).unwrap();
    }

    for i in 0..bindings {
        let pod = format!("pod-{i}");
        let rule = PolicyRule::new(&["get", "list"]).groups(&[""]).resources(&["pods"]).names(&[pod.as_str()]);
        roles.create(Role::new("ns1", format!("role-{i}"), vec![rule])).unwrap();
        role_bindings
            .create(RoleBinding::new(
                "ns1",
                format!("binding-{i}"),
                RoleRef::role(format!("role-{i}")),
                vec![Subject::user("alice"), Subject::group("dev")],
            ))
            .unwrap();
    }

    RuleResolver::new(
        Arc::new(RoleRegistry::new(roles)),
        Arc::new(RoleBindingRegistry::new(role_bindings)),
        Arc::new(ClusterRoleRegistry::new(cluster_roles_store)),
        Arc::new(ClusterRoleBindingRegistry::new(cluster_role_bindings_store)),
    )
}

fn bench_resolve_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_rules");
    let alice = UserInfo::new("alice").with_group("system:authenticated");

    for bindings in [1usize, 10, 100].iter() {
        let resolver = setup_resolver(*bindings);
        group.throughput(Throughput::Elements(*bindings as u64));
        group.bench_with_input(BenchmarkId::from_parameter(bindings), bindings, |b, _| {
            b.iter(|| black_box(resolver.resolve_rules(&alice, Some("ns1")).unwrap()));
        });
    }
    group.finish();
}

fn bench_covers(c: &mut Criterion) {
    let mut group = c.benchmark_group("covers");
    let defaults = cluster_roles();
    let admin = &defaults[0].rules;
    let edit = defaults.iter().find(|r| r.metadata.name == "edit").map(|r| r.rules.clone()).unwrap_or_default();
    let view = defaults.iter().find(|r| r.metadata.name == "view").map(|r| r.rules.clone()).unwrap_or_default();

    group.bench_function("cluster_admin_covers_edit", |b| {
        b.iter(|| black_box(covers(admin, &edit)))
    });
    group.bench_function("edit_covers_view", |b| {
        b.iter(|| black_box(covers(&edit, &view)))
    });
    group.finish();
}

criterion_group!(benches, bench_resolve_rules, bench_covers);
criterion_main!(benches);
