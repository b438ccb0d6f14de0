use std::path::{Path, PathBuf};

use binder_core::exec::{self, CommandError, CommandExecutor};

/// Builds images with the docker CLI and pushes them through the
/// squash-and-push helper.
pub struct ImageBuilder<'a, E: CommandExecutor> {
    executor: &'a E,
    push_script: PathBuf,
}

impl<'a, E: CommandExecutor> ImageBuilder<'a, E> {
    pub fn new(executor: &'a E, push_script: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            push_script: push_script.into(),
        }
    }

    /// `docker build -t <tag> <context>`
    pub async fn build(&self, tag: &str, context: &Path) -> Result<(), ImageError> {
        let context_arg = exec::path_arg(context).map_err(|e| ImageError::Build {
            image: tag.to_owned(),
            source: e,
        })?;

        tracing::info!(image = tag, context = %context.display(), "building image");
        self.executor
            .exec_streaming(
                "docker",
                &["build".to_owned(), "-t".to_owned(), tag.to_owned(), context_arg],
                &[],
            )
            .await
            .map_err(|e| ImageError::Build {
                image: tag.to_owned(),
                source: e,
            })
    }

    /// Squash `image` and push it to the private registry.
    pub async fn push(&self, image: &str) -> Result<(), ImageError> {
        let script = exec::path_arg(&self.push_script).map_err(|e| ImageError::Push {
            image: image.to_owned(),
            source: e,
        })?;

        tracing::info!(image, "squashing and pushing to private registry");
        self.executor
            .exec_streaming(&script, &[image.to_owned()], &[])
            .await
            .map_err(|e| ImageError::Push {
                image: image.to_owned(),
                source: e,
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("docker build of {image} failed")]
    Build { image: String, source: CommandError },

    #[error("could not push {image} to the private registry")]
    Push { image: String, source: CommandError },
}
