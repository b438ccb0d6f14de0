//! Core types and configuration for binder.
//!
//! This crate defines the `binder.toml` schema ([`BinderConfig`]), the app
//! model ([`App`], [`AppSpec`]), build-state tracking ([`BuildState`]), the
//! manifest renderer ([`template`]), persisted cluster info files
//! ([`ProxyInfo`], [`RegistryInfo`]), the external-command seam
//! ([`CommandExecutor`]) and shared error types.

pub mod app;
pub mod config;
pub mod error;
pub mod exec;
pub mod info;
pub mod state;
pub mod template;

pub use app::{App, AppId, AppSpec, DOCKERFILE_DEPENDENCY, NOTEBOOK_PORT, ServiceRef, validate_name};
pub use config::{
    BinderConfig, BootstrapConfig, ClusterConfig, PathsConfig, PreloadConfig, ProxyConfig,
    RegistryConfig,
};
pub use error::{Error, Result};
pub use exec::{CommandError, CommandExecutor, RealExecutor};
pub use info::{ProxyInfo, RegistryInfo};
pub use state::{BuildState, BuildStateStore, FileStateStore};
pub use template::{Params, TemplateError, TemplateSet};
