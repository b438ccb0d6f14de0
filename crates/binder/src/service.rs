use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use binder_core::{App, ServiceRef, TemplateSet};

/// A backing service an app can depend on (a database, a compute engine, ...).
///
/// Services are heterogeneous and resolved at runtime, so the trait is
/// object safe and used as `Arc<dyn Service>`.
#[async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn full_name(&self) -> String {
        format!("{}-{}", self.name(), self.version())
    }

    /// Dockerfile lines installing this service's client into app images.
    fn client(&self) -> Option<&str> {
        None
    }

    /// Make sure the service's own images exist.
    async fn build(&self) -> Result<(), ServiceError>;

    /// Write this service's manifests for `app` into `deploy_dir`.
    async fn deploy(
        &self,
        mode: &str,
        deploy_dir: &Path,
        app: &App,
        templates: &TemplateSet,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, thiserror::Error)]
#[error("{service}: {reason}")]
pub struct ServiceError {
    pub service: String,
    pub reason: String,
}

/// Lookup from an app's service references to implementations.
pub trait ServiceCatalog: Send + Sync {
    fn resolve(&self, service: &ServiceRef) -> Option<Arc<dyn Service>>;
}

/// Catalog over a fixed set of services, keyed by name and version.
#[derive(Default, Clone)]
pub struct StaticCatalog {
    services: BTreeMap<(String, String), Arc<dyn Service>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, service: Arc<dyn Service>) {
        let key = (service.name().to_owned(), service.version().to_owned());
        self.services.insert(key, service);
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceCatalog for StaticCatalog {
    fn resolve(&self, service: &ServiceRef) -> Option<Arc<dyn Service>> {
        self.services
            .get(&(service.name.clone(), service.version.clone()))
            .cloned()
    }
}

/// Resolve every service `app` declares, in declaration order.
pub fn resolve_services(
    app: &App,
    catalog: &dyn ServiceCatalog,
) -> Result<Vec<Arc<dyn Service>>, UnknownService> {
    app.service_refs()
        .iter()
        .map(|r| {
            catalog.resolve(r).ok_or_else(|| UnknownService {
                name: r.name.clone(),
                version: r.version.clone(),
            })
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
#[error("no service named {name} at version {version} is available")]
pub struct UnknownService {
    pub name: String,
    pub version: String,
}
