//! `warden-apiserver`: wires RBAC and storage-class storage into a server.
//!
//! Storage providers per API group, the lazily built RBAC storage set, the
//! bootstrap post-start hook and process configuration.

pub mod bootstrap;
pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod provider;

pub use bootstrap::{BootstrapReconciler, BootstrapReport, Phase};
pub use client::{loopback_user, LoopbackClient, RbacClient};
pub use config::{ApiServerConfig, GroupVersion, ResourceConfig};
pub use error::ApiServerError;
pub use hooks::{PostStartHookContext, PostStartHookFn, PostStartHooks};
pub use provider::{
    ApiGroupInfo, RbacBackends, RbacStorageFactory, RbacStorageProvider, RbacStorageSet, ResourceStorage,
    RestStorageProvider, StorageRestProvider, BOOTSTRAP_ROLES_HOOK,
};
