//! Pull an image onto every cluster node ahead of scheduling.
//!
//! The fan-out is at-least-attempted, not at-least-delivered: every node is
//! tried once with a bounded number of concurrent pulls, failures are
//! recorded per node, and the operation as a whole succeeds once dispatched.

use binder_core::exec::{CommandError, CommandExecutor};
use futures_util::stream::{self, StreamExt};

/// Provider whose nodes can be reached for preloading.
pub const GCE_PROVIDER: &str = "gce";

/// Provider-related environment read at process start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterEnv {
    /// `KUBERNETES_PROVIDER`
    pub provider: Option<String>,
    /// `KUBE_GCE_ZONE`
    pub gce_zone: Option<String>,
}

impl ClusterEnv {
    pub fn from_env() -> Self {
        Self {
            provider: non_empty_var("KUBERNETES_PROVIDER"),
            gce_zone: non_empty_var("KUBE_GCE_ZONE"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Per-node outcome of a preload.
#[derive(Debug, Clone, Default)]
pub struct PreloadReport {
    pub image: String,
    pub pulled: Vec<String>,
    pub failed: Vec<NodeFailure>,
}

impl PreloadReport {
    pub fn all_pulled(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct NodeFailure {
    pub node: String,
    pub error: String,
}

/// Run `docker pull <image_ref>` over `gcloud compute ssh` on every node,
/// at most `concurrency` at a time.
pub async fn fan_out<E: CommandExecutor>(
    executor: &E,
    nodes: &[String],
    zone: &str,
    image_ref: &str,
    concurrency: usize,
) -> PreloadReport {
    let results: Vec<(String, Result<String, CommandError>)> = stream::iter(nodes)
        .map(|node| async move {
            tracing::info!(image = image_ref, node = %node, "preloading");
            let cmd = vec![
                "compute".to_owned(),
                "ssh".to_owned(),
                node.clone(),
                "--zone".to_owned(),
                zone.to_owned(),
                "--command".to_owned(),
                format!("sudo docker pull {image_ref}"),
            ];
            (node.clone(), executor.exec("gcloud", &cmd).await)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = PreloadReport {
        image: image_ref.to_owned(),
        ..Default::default()
    };
    for (node, result) in results {
        match result {
            Ok(_) => report.pulled.push(node),
            Err(e) => {
                tracing::warn!(image = image_ref, node = %node, error = %e, "preload failed on node");
                report.failed.push(NodeFailure {
                    node,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        image = image_ref,
        pulled = report.pulled.len(),
        failed = report.failed.len(),
        "preload dispatched to all nodes"
    );
    report
}

#[derive(Debug, thiserror::Error)]
pub enum PreloadError {
    #[error("KUBERNETES_PROVIDER is not set")]
    ProviderNotSet,

    #[error("preloading is not supported for provider '{0}' (supported: gce)")]
    UnsupportedProvider(String),

    #[error("could not locate the Kubernetes checkout to read the default zone")]
    KubernetesHomeUnknown,

    #[error("failed to read zone config {path}")]
    ZoneConfig {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("zone could not be determined; set KUBE_GCE_ZONE")]
    ZoneUnknown,

    #[error("failed to list cluster nodes")]
    ListNodes { source: CommandError },
}
