use std::sync::Arc;

use anyhow::Context as _;
use warden_apiserver::{
    ApiServerConfig, PostStartHookContext, PostStartHooks, RbacStorageProvider, RestStorageProvider,
    StorageRestProvider,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    warden_observability::init();

    let config = ApiServerConfig::from_env()?;
    tracing::info!(config = %serde_json::to_string(&config)?, "loaded configuration");
    let resource_config = config.resource_config()?;

    let rbac = Arc::new(RbacStorageProvider::in_memory(config.escalation_policy()));
    let providers: Vec<Arc<dyn RestStorageProvider>> = vec![rbac.clone(), Arc::new(StorageRestProvider::in_memory())];

    for provider in &providers {
        let group = match provider
            .new_rest_storage(&resource_config)
            .with_context(|| format!("unable to install api group {}", provider.group_name()))
        {
            Ok(group) => group,
            Err(err) => {
                warden_observability::handle_error(err);
                continue;
            }
        };
        if group.is_empty() {
            tracing::info!(group = provider.group_name(), "api group disabled");
            continue;
        }
        tracing::info!(
            group_version = %group.group_version,
            resources = ?group.resource_names(),
            "installed api group"
        );
    }

    let mut hooks = PostStartHooks::new();
    if config.skip_bootstrap {
        tracing::warn!("{} is set; default rbac policy will not be seeded", warden_apiserver::config::ENV_SKIP_BOOTSTRAP);
    } else {
        let (name, hook) = rbac.post_start_hook();
        hooks.add(name, hook)?;
    }

    let sink = Arc::new(warden_observability::LoggingErrorSink::new());
    hooks.run_all(&PostStartHookContext::new(sink.clone()));

    let failures = sink.handled() + warden_observability::process_sink().handled();
    tracing::info!(hooks = ?hooks.names().collect::<Vec<_>>(), failures, "ready");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
