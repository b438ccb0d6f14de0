mod apps;
mod build;
mod cluster;
mod deploy;
mod destroy;
mod preload;
mod state;

use std::path::Path;
use std::sync::Arc;

use binder::cluster::{ClusterEnv, KubernetesBackend};
use binder::{App, AppSpec, BinderConfig, Service, StaticCatalog, resolve_services};

pub use apps::apps;
pub use build::build;
pub use cluster::{cluster_start, cluster_stop};
pub use deploy::deploy;
pub use destroy::destroy;
pub use preload::{preload, preload_all};
pub use state::state;

/// Load binder.toml from the working directory.
pub(crate) fn load_config() -> anyhow::Result<BinderConfig> {
    Ok(BinderConfig::load(Path::new("."))?)
}

pub(crate) fn backend(config: &BinderConfig) -> KubernetesBackend {
    KubernetesBackend::from_config(config.clone(), ClusterEnv::from_env())
}

/// Read an app description and resolve the services it declares.
pub(crate) fn load_app(
    spec: &Path,
    config: &BinderConfig,
) -> anyhow::Result<(App, Vec<Arc<dyn Service>>)> {
    let spec = AppSpec::from_file(spec)?;
    let app = App::new(spec, &config.paths.apps_dir)?;
    // the CLI ships without service implementations
    let services = resolve_services(&app, &StaticCatalog::new())?;
    Ok((app, services))
}
