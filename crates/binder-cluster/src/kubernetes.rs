use std::path::{Path, PathBuf};

use binder_core::exec::{self, CommandExecutor, RealExecutor};
use binder_core::template::{Params, TemplateSet};
use binder_core::{BinderConfig, ProxyInfo, RegistryInfo};
use tokio::sync::OnceCell;

use crate::backend::{AppDeployment, BackendError, BootstrapReport, ClusterBackend};
use crate::describe;
use crate::kubectl::Kubectl;
use crate::preload::{self, ClusterEnv, GCE_PROVIDER, PreloadError, PreloadReport};
use crate::proxy::{HttpRouteApi, ProxyClient, RouteApi};

/// Service the proxy accepts route registrations on.
pub const PROXY_REGISTRATION_SERVICE: &str = "proxy-registration";
/// Service users reach deployed apps through.
pub const PROXY_LOOKUP_SERVICE: &str = "proxy-lookup";
pub const REGISTRY_SERVICE: &str = "registry";
pub const NAMESPACE_MANIFEST: &str = "namespace.json";

/// [`ClusterBackend`] driving a Kubernetes cluster through its control
/// scripts.
pub struct KubernetesBackend<E: CommandExecutor = RealExecutor, H: RouteApi = HttpRouteApi> {
    kubectl: Kubectl<E>,
    proxy: ProxyClient<H>,
    config: BinderConfig,
    env: ClusterEnv,
    home: OnceCell<Option<PathBuf>>,
}

impl KubernetesBackend {
    pub fn from_config(config: BinderConfig, env: ClusterEnv) -> Self {
        Self::new(RealExecutor, HttpRouteApi::new(), config, env)
    }
}

impl<E: CommandExecutor, H: RouteApi> KubernetesBackend<E, H> {
    pub fn new(executor: E, api: H, config: BinderConfig, env: ClusterEnv) -> Self {
        let kubectl = Kubectl::new(executor, config.cluster.kubectl.clone());
        let proxy = ProxyClient::from_config(api, &config);
        Self {
            kubectl,
            proxy,
            config,
            env,
            home: OnceCell::new(),
        }
    }

    pub fn kubectl(&self) -> &Kubectl<E> {
        &self.kubectl
    }

    /// Base URL apps are reachable under, if the lookup service is up.
    pub async fn lookup_url(&self) -> Option<String> {
        self.kubectl
            .service_address(PROXY_LOOKUP_SERVICE)
            .await
            .map(|host| format!("http://{host}"))
    }

    /// Preload the base image, then every named app image.
    pub async fn preload_all(&self, app_names: &[String]) -> Vec<Result<PreloadReport, BackendError>> {
        let mut images = vec![self.config.registry.base_image.clone()];
        images.extend(app_names.iter().map(|name| name.to_lowercase()));

        let mut reports = Vec::with_capacity(images.len());
        for image in &images {
            reports.push(self.preload_image(image).await);
        }
        reports
    }

    /// Kubernetes checkout: configured, or derived from the control tool
    /// location once and then remembered.
    async fn kubernetes_home(&self) -> Option<&Path> {
        self.home
            .get_or_init(|| async {
                if let Some(home) = &self.config.cluster.kubernetes_home {
                    return Some(home.clone());
                }
                let home = self.kubectl.kubernetes_home().await.map(PathBuf::from);
                if home.is_none() {
                    tracing::warn!(program = %self.config.cluster.kubectl, "could not locate Kubernetes home");
                }
                home
            })
            .await
            .as_deref()
    }

    async fn zone(&self) -> Result<String, PreloadError> {
        if let Some(zone) = &self.env.gce_zone {
            return Ok(zone.clone());
        }
        let home = self
            .kubernetes_home()
            .await
            .ok_or(PreloadError::KubernetesHomeUnknown)?;
        let path = home.join("cluster/gce/config-default.sh");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| PreloadError::ZoneConfig { path, source: e })?;
        describe::default_zone(&content).ok_or(PreloadError::ZoneUnknown)
    }

    async fn preload_on(
        &self,
        image_name: &str,
        provider: Option<&str>,
    ) -> Result<PreloadReport, BackendError> {
        let provider = provider.ok_or(PreloadError::ProviderNotSet)?;
        if provider != GCE_PROVIDER {
            tracing::warn!(provider, image = image_name, "preload unsupported for provider");
            return Err(PreloadError::UnsupportedProvider(provider.to_owned()).into());
        }

        let zone = self.zone().await?;
        let nodes = self
            .kubectl
            .nodes()
            .await
            .map_err(|source| PreloadError::ListNodes { source })?;
        let image_ref = format!("{}/{image_name}", self.config.registry.name);

        Ok(preload::fan_out(
            self.kubectl.executor(),
            &nodes,
            &zone,
            &image_ref,
            self.config.preload.concurrency,
        )
        .await)
    }

    /// Look up a load-balanced service's address, pausing before each attempt.
    async fn discover(&self, service: &str) -> Result<String, BackendError> {
        let bootstrap = &self.config.bootstrap;
        for attempt in 1..=bootstrap.discovery_attempts {
            tracing::info!(
                service,
                attempt,
                pause_secs = bootstrap.discovery_pause_secs,
                "waiting before address lookup"
            );
            tokio::time::sleep(bootstrap.discovery_pause()).await;
            if let Some(address) = self.kubectl.service_address(service).await {
                tracing::info!(service, %address, "service address discovered");
                return Ok(address);
            }
        }
        Err(BackendError::Discovery {
            service: service.to_owned(),
            attempts: bootstrap.discovery_attempts,
        })
    }

    async fn create(&self, file: &Path, namespace: Option<&str>) -> Result<(), BackendError> {
        self.kubectl
            .create(file, namespace)
            .await
            .map_err(|source| BackendError::Command {
                step: "create",
                source,
            })
    }

    /// Render the proxy's manifests with a fresh auth token and create them.
    async fn start_proxy(&self) -> Result<String, BackendError> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let proxy_dir = self.config.proxy_dir();
        let deploy_dir = proxy_dir.join("deploy");
        recreate_dir(&deploy_dir)?;

        let templates = TemplateSet::load_dir(&proxy_dir.join("deployment"))?;
        let params = Params::from([("token".to_owned(), token.clone())]);
        let names: Vec<String> = templates.names().map(str::to_owned).collect();
        for name in &names {
            let path = templates.render_to(name, &params, &deploy_dir)?;
            self.create(&path, None).await?;
        }

        let host = self.discover(PROXY_REGISTRATION_SERVICE).await?;
        ProxyInfo::new(host.clone(), token).write(self.proxy.info_path())?;
        Ok(format!("proxy registration at {host}"))
    }

    async fn start_registry(&self) -> Result<String, BackendError> {
        for file in manifest_files(&self.config.registry_dir())? {
            self.create(&file, None).await?;
        }

        let settle = self.config.bootstrap.registry_settle();
        tracing::info!(settle_secs = settle.as_secs(), "waiting for registry launch");
        tokio::time::sleep(settle).await;

        let url = self.discover(REGISTRY_SERVICE).await?;
        RegistryInfo { url: url.clone() }.write(&self.config.registry_info_path())?;
        Ok(format!("registry at {url}"))
    }

    /// Copy the public base image into the private registry.
    async fn seed_registry(&self) -> Result<String, BackendError> {
        let registry = &self.config.registry;
        let public = format!("{}/{}", registry.docker_hub_user, registry.base_image);
        let private = self.config.base_image_ref();

        let steps: [(&'static str, Vec<String>); 3] = [
            ("docker pull", exec::args(["pull", public.as_str()])),
            ("docker tag", exec::args(["tag", public.as_str(), private.as_str()])),
            ("docker push", exec::args(["push", private.as_str()])),
        ];
        for (step, cmd) in steps {
            self.kubectl
                .executor()
                .exec_streaming("docker", &cmd, &[])
                .await
                .map_err(|source| BackendError::Command { step, source })?;
        }
        Ok(format!("seeded {private} from {public}"))
    }
}

impl<E: CommandExecutor, H: RouteApi> ClusterBackend for KubernetesBackend<E, H> {
    async fn start(
        &self,
        num_minions: u32,
        provider: &str,
    ) -> Result<BootstrapReport, BackendError> {
        let envs = vec![
            ("NUM_MINIONS".to_owned(), num_minions.to_string()),
            ("KUBERNETES_PROVIDER".to_owned(), provider.to_owned()),
        ];
        tracing::info!(num_minions, provider, "starting cluster");
        self.kubectl
            .executor()
            .exec_streaming(&self.config.cluster.kube_up, &[], &envs)
            .await
            .map_err(|source| BackendError::Command {
                step: "kube-up",
                source,
            })?;

        let mut report = BootstrapReport::default();

        tracing::info!("launching proxy server");
        report.record("proxy", self.start_proxy().await);

        tracing::info!("launching private registry");
        report.record("registry", self.start_registry().await);

        tracing::info!("seeding registry with base image");
        report.record("seed registry", self.seed_registry().await);

        tracing::info!("preloading base image onto all nodes");
        let preloaded = self
            .preload_on(&self.config.registry.base_image, Some(provider))
            .await
            .map(|r| format!("{} pulled, {} failed", r.pulled.len(), r.failed.len()));
        report.record("preload base image", preloaded);

        if report.all_passed() {
            tracing::info!("cluster started");
        } else {
            tracing::error!("cluster started with failed steps");
        }
        Ok(report)
    }

    async fn stop(&self, provider: &str) -> Result<(), BackendError> {
        let envs = vec![("KUBERNETES_PROVIDER".to_owned(), provider.to_owned())];
        self.kubectl
            .executor()
            .exec_streaming(&self.config.cluster.kube_down, &[], &envs)
            .await
            .map_err(|source| BackendError::Command {
                step: "kube-down",
                source,
            })
    }

    async fn deploy_app(&self, app_id: &str, deploy_dir: &Path) -> AppDeployment {
        let mut applied = true;

        if let Err(e) = self.create(&deploy_dir.join(NAMESPACE_MANIFEST), None).await {
            tracing::error!(app_id, error = %e, "could not create namespace");
            applied = false;
        }

        match manifest_files(deploy_dir) {
            Ok(files) => {
                for file in files.iter().filter(|f| !is_namespace_manifest(f)) {
                    if let Err(e) = self.create(file, Some(app_id)).await {
                        tracing::error!(app_id, file = %file.display(), error = %e, "could not apply manifest");
                        applied = false;
                    }
                }
            }
            Err(e) => {
                tracing::error!(app_id, error = %e, "could not list manifests");
                applied = false;
            }
        }

        let routed = match self.proxy.register_route(&self.kubectl, app_id).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(app_id, error = %e, "could not register route");
                false
            }
        };

        let url = self
            .lookup_url()
            .await
            .map(|base| format!("{base}/{app_id}"));
        match &url {
            Some(url) => tracing::info!(app_id, %url, "app reachable"),
            None => tracing::warn!(app_id, "lookup address unavailable"),
        }

        AppDeployment {
            url,
            applied,
            routed,
        }
    }

    async fn destroy_app(&self, app_id: &str) -> Result<(), BackendError> {
        self.kubectl
            .delete_namespace(app_id)
            .await
            .map_err(|source| BackendError::Command {
                step: "delete namespace",
                source,
            })?;
        if let Err(e) = self.proxy.unregister_route(app_id).await {
            tracing::warn!(app_id, error = %e, "could not remove proxy route");
        }
        tracing::info!(app_id, "app destroyed");
        Ok(())
    }

    async fn list_apps(&self) -> Result<Vec<String>, BackendError> {
        self.kubectl
            .app_namespaces()
            .await
            .map_err(|source| BackendError::Command {
                step: "get namespaces",
                source,
            })
    }

    async fn preload_image(&self, image_name: &str) -> Result<PreloadReport, BackendError> {
        self.preload_on(image_name, self.env.provider.as_deref()).await
    }
}

fn is_namespace_manifest(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == NAMESPACE_MANIFEST)
}

/// Regular files in `dir`, sorted by name.
fn manifest_files(dir: &Path) -> Result<Vec<PathBuf>, BackendError> {
    let io_err = |source| BackendError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn recreate_dir(dir: &Path) -> Result<(), BackendError> {
    let io_err = |source| BackendError::Io {
        path: dir.to_path_buf(),
        source,
    };
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(io_err)?;
    }
    std::fs::create_dir_all(dir).map_err(io_err)
}
