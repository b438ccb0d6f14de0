use std::path::Path;

use binder_core::exec::{self, CommandError, CommandExecutor};

/// Pre-flight check that a repository URL exists before cloning it.
#[allow(async_fn_in_trait)]
pub trait RepoProbe: Send + Sync {
    /// `Ok(false)` only when the host answers 404.
    async fn exists(&self, url: &str) -> Result<bool, FetchError>;
}

/// Probe that issues a plain HTTP GET.
#[derive(Default)]
pub struct HttpRepoProbe {
    client: reqwest::Client,
}

impl HttpRepoProbe {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepoProbe for HttpRepoProbe {
    async fn exists(&self, url: &str) -> Result<bool, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Probe {
                url: url.to_owned(),
                source: e,
            })?;
        Ok(response.status() != reqwest::StatusCode::NOT_FOUND)
    }
}

/// Clone `url` into `dest`, replacing any stale clone.
pub async fn fetch_repo<E, P>(
    executor: &E,
    probe: &P,
    url: &str,
    dest: &Path,
) -> Result<(), FetchError>
where
    E: CommandExecutor,
    P: RepoProbe,
{
    if !probe.exists(url).await? {
        return Err(FetchError::Missing {
            url: url.to_owned(),
        });
    }

    if dest.is_dir() {
        std::fs::remove_dir_all(dest).map_err(|e| FetchError::Cleanup {
            path: dest.to_path_buf(),
            source: e,
        })?;
    }

    let dest_arg = exec::path_arg(dest).map_err(|e| FetchError::Clone { source: e })?;
    executor
        .exec_streaming(
            "git",
            &["clone".to_owned(), url.to_owned(), dest_arg],
            &[],
        )
        .await
        .map_err(|e| FetchError::Clone { source: e })?;

    tracing::debug!(url, dest = %dest.display(), "repository cloned");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to probe repository {url}")]
    Probe { url: String, source: reqwest::Error },

    #[error("repository {url} does not exist")]
    Missing { url: String },

    #[error("failed to remove stale clone at {path}")]
    Cleanup {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("git clone failed")]
    Clone { source: CommandError },
}
