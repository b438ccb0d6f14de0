use std::path::{Path, PathBuf};
use std::sync::Arc;

use binder_build::recipe::{self, RecipeGenerator, ServiceClient};
use binder_build::{
    FetchError, ImageBuilder, ImageError, RepoProbe, WorkspaceError, copy_tree, fetch_repo,
    make_clean_dir, stage_image_assets,
};
use binder_cluster::ClusterBackend;
use binder_core::exec::CommandExecutor;
use binder_core::{App, BinderConfig, BuildState, BuildStateStore, DOCKERFILE_DEPENDENCY};

use crate::service::{Service, ServiceError};

/// Switches for a single build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Also rebuild and push the shared base image.
    pub build_base: bool,
    /// Pull the finished app image onto every cluster node.
    pub preload: bool,
}

/// Builds an app image and pushes it to the private registry.
///
/// Every run records `BUILDING` and finishes with `COMPLETED` or `FAILED`.
/// Nothing is rolled back on failure; the next run starts from a clean
/// build directory.
pub struct BuildPipeline<'a, E, P, B>
where
    E: CommandExecutor,
    P: RepoProbe,
    B: ClusterBackend,
{
    config: &'a BinderConfig,
    executor: &'a E,
    probe: &'a P,
    backend: &'a B,
    states: &'a dyn BuildStateStore,
}

impl<'a, E, P, B> BuildPipeline<'a, E, P, B>
where
    E: CommandExecutor,
    P: RepoProbe,
    B: ClusterBackend,
{
    pub fn new(
        config: &'a BinderConfig,
        executor: &'a E,
        probe: &'a P,
        backend: &'a B,
        states: &'a dyn BuildStateStore,
    ) -> Self {
        Self {
            config,
            executor,
            probe,
            backend,
            states,
        }
    }

    /// Run the build and return the recorded end state.
    pub async fn run(
        &self,
        app: &App,
        services: &[Arc<dyn Service>],
        options: BuildOptions,
    ) -> BuildState {
        self.record(app, BuildState::Building);

        let state = match self.build(app, services, options).await {
            Ok(()) => {
                tracing::info!(app = app.name(), "app built successfully");
                BuildState::Completed
            }
            Err(e) => {
                tracing::error!(app = app.name(), error = %e, "build failed");
                BuildState::Failed
            }
        };

        self.record(app, state);
        state
    }

    fn record(&self, app: &App, state: BuildState) {
        if let Err(e) = self.states.set(app.name(), state) {
            tracing::error!(app = app.name(), %state, error = %e, "could not record build state");
        }
    }

    async fn build(
        &self,
        app: &App,
        services: &[Arc<dyn Service>],
        options: BuildOptions,
    ) -> Result<(), BuildError> {
        let build_dir = app.build_dir();
        make_clean_dir(&build_dir)?;

        tracing::info!(app = app.name(), repo = app.repo_url(), "fetching repository");
        fetch_repo(self.executor, self.probe, app.repo_url(), &app.repo_dir()).await?;

        tracing::info!(app = app.name(), count = services.len(), "building service dependencies");
        for service in services {
            service
                .build()
                .await
                .map_err(|source| BuildError::Service {
                    service: service.full_name(),
                    source,
                })?;
        }

        tracing::info!(app = app.name(), "copying image assets and filling templates");
        stage_image_assets(
            &self.config.images_dir(),
            &build_dir,
            &app.spec().template_params(),
        )?;

        let images = ImageBuilder::new(self.executor, self.config.push_script());
        let base_image = self.config.base_image_ref();

        if options.build_base {
            images
                .build(&base_image, &build_dir.join("base"))
                .await
                .map_err(BuildError::BaseImage)?;
            images
                .push(&base_image)
                .await
                .map_err(BuildError::BaseImage)?;
        }

        let app_dir = build_dir.join("app");
        let repo_copy = app_dir.join("repo");
        copy_tree(&app.repo_dir(), &repo_copy)?;

        let suffix = read(&build_dir.join("suffix").join("Dockerfile"))?;
        let image = self.config.app_image_ref(app.name());

        let context = if app.has_dependency(DOCKERFILE_DEPENDENCY) {
            tracing::info!(app = app.name(), "building app image with its own Dockerfile");
            let dockerfile = repo_copy.join("Dockerfile");
            let adapted = recipe::adapt_dockerfile(
                &read(&dockerfile)?,
                &base_image,
                &self.config.registry.base_image,
                app.notebooks_path(),
                &suffix,
            );
            if adapted.base_mismatch() {
                tracing::warn!(
                    app = app.name(),
                    from = ?adapted.foreign_bases,
                    expected = %base_image,
                    "Dockerfile does not build on the base image; building may fail"
                );
            }
            write(&dockerfile, &adapted.content)?;
            repo_copy
        } else {
            tracing::info!(app = app.name(), "building app image from a generated recipe");
            let clients: Vec<ServiceClient<'_>> = services
                .iter()
                .map(|s| ServiceClient {
                    name: s.name(),
                    client: s.client(),
                })
                .collect();
            let content = RecipeGenerator::new(&base_image, app.dependencies(), &clients, &suffix)
                .notebooks(app.notebooks_path())
                .render();
            write(&app_dir.join("Dockerfile"), &content)?;
            app_dir
        };

        images.build(&image, &context).await?;
        images.push(&image).await?;

        if options.preload {
            // best-effort, failures are only logged
            match self.backend.preload_image(&app.name().to_lowercase()).await {
                Ok(report) => tracing::info!(
                    app = app.name(),
                    pulled = report.pulled.len(),
                    failed = report.failed.len(),
                    "app image preloaded"
                ),
                Err(e) => tracing::warn!(app = app.name(), error = %e, "could not preload app image"),
            }
        }

        Ok(())
    }
}

fn read(path: &Path) -> Result<String, BuildError> {
    std::fs::read_to_string(path).map_err(|e| BuildError::RecipeRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write(path: &Path, content: &str) -> Result<(), BuildError> {
    std::fs::write(path, content).map_err(|e| BuildError::RecipeWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("could not prepare build workspace")]
    Workspace(#[from] WorkspaceError),

    #[error("could not fetch repository")]
    Fetch(#[from] FetchError),

    #[error("could not build service {service}")]
    Service {
        service: String,
        source: ServiceError,
    },

    #[error("could not build the base image")]
    BaseImage(#[source] ImageError),

    #[error("failed to read {path}")]
    RecipeRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    RecipeWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Image(#[from] ImageError),
}
