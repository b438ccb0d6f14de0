use std::fmt;
use std::path::Path;

use binder_core::exec::CommandError;
use binder_core::template::TemplateError;

use crate::preload::{PreloadError, PreloadReport};

/// Capability set every cluster technology provides to the pipelines.
///
/// Operations a backend cannot perform return [`BackendError::Unsupported`].
#[allow(async_fn_in_trait)]
pub trait ClusterBackend: Send + Sync {
    /// Bring up a cluster of `num_minions` nodes with its proxy and registry.
    async fn start(&self, num_minions: u32, provider: &str)
    -> Result<BootstrapReport, BackendError>;

    async fn stop(&self, provider: &str) -> Result<(), BackendError>;

    /// Apply every manifest in `deploy_dir` for `app_id` and route to it.
    async fn deploy_app(&self, app_id: &str, deploy_dir: &Path) -> AppDeployment;

    async fn destroy_app(&self, app_id: &str) -> Result<(), BackendError> {
        let _ = app_id;
        Err(BackendError::Unsupported {
            operation: "destroy_app",
        })
    }

    async fn list_apps(&self) -> Result<Vec<String>, BackendError> {
        Err(BackendError::Unsupported {
            operation: "list_apps",
        })
    }

    async fn preload_image(&self, image_name: &str) -> Result<PreloadReport, BackendError> {
        let _ = image_name;
        Err(BackendError::Unsupported {
            operation: "preload_image",
        })
    }
}

/// Outcome of [`ClusterBackend::deploy_app`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppDeployment {
    /// Externally reachable lookup URL, reported even if routing failed.
    pub url: Option<String>,
    /// Every manifest was accepted by the cluster.
    pub applied: bool,
    /// The proxy accepted the app's route.
    pub routed: bool,
}

impl AppDeployment {
    pub fn succeeded(&self) -> bool {
        self.applied && self.routed && self.url.is_some()
    }
}

/// Per-step record of a cluster bootstrap.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub steps: Vec<BootstrapStep>,
}

#[derive(Debug, Clone)]
pub struct BootstrapStep {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl BootstrapStep {
    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

impl BootstrapReport {
    /// Record a step outcome, logging failures.
    pub fn record(&mut self, name: &'static str, result: Result<String, BackendError>) {
        let step = match result {
            Ok(detail) => BootstrapStep {
                name,
                passed: true,
                detail,
            },
            Err(e) => {
                tracing::error!(step = name, error = %e, "bootstrap step failed");
                BootstrapStep {
                    name,
                    passed: false,
                    detail: e.to_string(),
                }
            }
        };
        self.steps.push(step);
    }

    pub fn all_passed(&self) -> bool {
        self.steps.iter().all(|s| s.passed)
    }
}

impl fmt::Display for BootstrapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cluster bootstrap")?;
        writeln!(f, "-----------------")?;
        for step in &self.steps {
            writeln!(f, "{:<20}{}  {}", step.name, step.icon(), step.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{operation} is not supported by this cluster backend")]
    Unsupported { operation: &'static str },

    #[error("{step} failed")]
    Command {
        step: &'static str,
        source: CommandError,
    },

    #[error("could not discover the address of service '{service}' after {attempts} attempts")]
    Discovery { service: String, attempts: u32 },

    #[error(transparent)]
    Preload(#[from] PreloadError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Core(#[from] binder_core::Error),

    #[error("failed to prepare {path}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}
