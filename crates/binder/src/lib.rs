//! Build and deploy Jupyter notebook apps on a Kubernetes cluster.
//!
//! This is the facade crate: it owns the app pipelines and re-exports the
//! Binder sub-crates.
//!
//! | Module | Crate | Description |
//! |--------|-------|-------------|
//! | root | `binder-core` | Configuration, app model, build state, manifest templates |
//! | [`build`] | `binder-build` | Build workspaces, Dockerfile recipes, image build/push |
//! | [`cluster`] | `binder-cluster` | Cluster backends, preload, proxy route registration |
//! | [`pipeline`] | this crate | The app build and deploy pipelines |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use binder::{App, AppSpec, BinderConfig, FileStateStore};
//! use binder::build::HttpRepoProbe;
//! use binder::cluster::{ClusterEnv, KubernetesBackend};
//! use binder::exec::RealExecutor;
//! use binder::pipeline::{BuildOptions, BuildPipeline, DeployPipeline};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BinderConfig::load(Path::new("."))?;
//! let app = App::new(AppSpec::from_file(Path::new("demo.json"))?, &config.paths.apps_dir)?;
//! let backend = KubernetesBackend::from_config(config.clone(), ClusterEnv::from_env());
//! let states = FileStateStore::new(config.build_state_path());
//!
//! let probe = HttpRepoProbe::new();
//! let build = BuildPipeline::new(&config, &RealExecutor, &probe, &backend, &states);
//! build.run(&app, &[], BuildOptions::default()).await;
//!
//! let url = DeployPipeline::new(&config, &backend).run(&app, &[], None).await;
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod service;

pub use binder_core::*;

/// Build workspaces, Dockerfile recipes, and image build/push.
pub mod build {
    pub use binder_build::*;
}

/// Cluster backends, image preload, and proxy route registration.
pub mod cluster {
    pub use binder_cluster::*;
}

pub use service::{
    Service, ServiceCatalog, ServiceError, StaticCatalog, UnknownService, resolve_services,
};
