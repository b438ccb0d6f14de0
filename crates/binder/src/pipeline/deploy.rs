use std::path::Path;
use std::sync::Arc;

use binder_build::{WorkspaceError, make_clean_dir};
use binder_cluster::ClusterBackend;
use binder_core::{App, BinderConfig, TemplateError, TemplateSet};

use crate::service::Service;

/// Mode every service must support.
pub const DEFAULT_MODE: &str = "single-node";

/// Documents rendered for every app, whatever its services.
const APP_MANIFESTS: [&str; 2] = ["namespace.json", "notebook.json"];

/// Renders an app's manifests and hands them to the cluster backend.
pub struct DeployPipeline<'a, B: ClusterBackend> {
    config: &'a BinderConfig,
    backend: &'a B,
}

impl<'a, B: ClusterBackend> DeployPipeline<'a, B> {
    pub fn new(config: &'a BinderConfig, backend: &'a B) -> Self {
        Self { config, backend }
    }

    /// Deploy `app` and return its URL, or `None` if any step failed.
    ///
    /// Every service is asked to deploy even after an earlier one fails.
    pub async fn run(
        &self,
        app: &App,
        services: &[Arc<dyn Service>],
        mode: Option<&str>,
    ) -> Option<String> {
        let mode = mode.unwrap_or(DEFAULT_MODE);
        let deploy_dir = app.deploy_dir();

        let templates = match self.render_app_manifests(app, &deploy_dir) {
            Ok(templates) => templates,
            Err(e) => {
                tracing::error!(app = app.name(), error = %e, "could not render manifests");
                return None;
            }
        };

        let mut success = true;
        for service in services {
            if let Err(e) = service.deploy(mode, &deploy_dir, app, &templates).await {
                tracing::error!(
                    app = app.name(),
                    service = %service.full_name(),
                    error = %e,
                    "could not deploy service"
                );
                success = false;
            }
        }

        let deployment = self.backend.deploy_app(app.id().as_str(), &deploy_dir).await;
        success = success && deployment.succeeded();

        if success {
            tracing::info!(
                app = app.name(),
                app_id = %app.id(),
                url = deployment.url.as_deref().unwrap_or_default(),
                mode,
                "app deployed"
            );
            deployment.url
        } else {
            tracing::error!(
                app = app.name(),
                app_id = %app.id(),
                applied = deployment.applied,
                routed = deployment.routed,
                "app deployment failed"
            );
            None
        }
    }

    fn render_app_manifests(&self, app: &App, deploy_dir: &Path) -> Result<TemplateSet, DeployError> {
        make_clean_dir(deploy_dir)?;

        let templates = TemplateSet::load(&self.config.templates_dir())?;
        let params = app.params(&self.config.app_image_ref(app.name()));
        for name in APP_MANIFESTS {
            templates.render_to(name, &params, deploy_dir)?;
        }
        Ok(templates)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}
