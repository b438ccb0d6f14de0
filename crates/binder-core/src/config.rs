use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// binder.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinderConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub preload: PreloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Resource root holding `images/`, `templates/`, `proxy/`, `registry/`,
    /// `util/` and the persisted `.proxy_info` / `.registry_info` files.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Directory under which each app gets its own build/deploy workspace.
    #[serde(default = "default_apps_dir")]
    pub apps_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Private registry prefix every image is tagged with
    #[serde(default = "default_registry_name")]
    pub name: String,
    /// Name of the shared base image (without registry prefix)
    #[serde(default = "default_base_image")]
    pub base_image: String,
    /// Public Docker Hub account the base image is seeded from
    #[serde(default = "default_docker_hub_user")]
    pub docker_hub_user: String,
    /// Squash-and-push helper, relative to the resource root
    #[serde(default = "default_push_script")]
    pub push_script: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster provider passed to the bootstrap scripts
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Number of worker nodes started by `cluster start`
    #[serde(default = "default_num_minions")]
    pub num_minions: u32,
    /// Cluster control tool
    #[serde(default = "default_kubectl")]
    pub kubectl: String,
    #[serde(default = "default_kube_up")]
    pub kube_up: String,
    #[serde(default = "default_kube_down")]
    pub kube_down: String,
    /// Kubernetes checkout; derived from the control tool location when unset
    #[serde(default)]
    pub kubernetes_home: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Route registration attempts before giving up
    #[serde(default = "default_proxy_attempts")]
    pub attempts: u32,
    /// Seconds between registration attempts
    #[serde(default = "default_proxy_pause_secs")]
    pub pause_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Address discovery attempts for the proxy and registry services
    #[serde(default = "default_discovery_attempts")]
    pub discovery_attempts: u32,
    #[serde(default = "default_discovery_pause_secs")]
    pub discovery_pause_secs: u64,
    /// Grace period after creating the registry resources
    #[serde(default = "default_registry_settle_secs")]
    pub registry_settle_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Number of nodes pulled onto concurrently
    #[serde(default = "default_preload_concurrency")]
    pub concurrency: usize,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            apps_dir: default_apps_dir(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: default_registry_name(),
            base_image: default_base_image(),
            docker_hub_user: default_docker_hub_user(),
            push_script: default_push_script(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            num_minions: default_num_minions(),
            kubectl: default_kubectl(),
            kube_up: default_kube_up(),
            kube_down: default_kube_down(),
            kubernetes_home: None,
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            attempts: default_proxy_attempts(),
            pause_secs: default_proxy_pause_secs(),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            discovery_attempts: default_discovery_attempts(),
            discovery_pause_secs: default_discovery_pause_secs(),
            registry_settle_secs: default_registry_settle_secs(),
        }
    }
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            concurrency: default_preload_concurrency(),
        }
    }
}

impl BinderConfig {
    /// Load from binder.toml in the given directory, or return defaults if not found.
    ///
    /// Relative paths in `[paths]` are resolved against `dir`.
    pub fn load(dir: &Path) -> crate::Result<Self> {
        let config_path = dir.join("binder.toml");
        let mut config = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })?
        } else {
            Self::default()
        };

        if config.paths.root.is_relative() {
            config.paths.root = dir.join(&config.paths.root);
        }
        if config.paths.apps_dir.is_relative() {
            config.paths.apps_dir = dir.join(&config.paths.apps_dir);
        }
        Ok(config)
    }

    /// `<registry>/<base-image>`, the canonical base image reference.
    pub fn base_image_ref(&self) -> String {
        format!("{}/{}", self.registry.name, self.registry.base_image)
    }

    /// Fully qualified, lower-cased image reference for an app.
    pub fn app_image_ref(&self, app_name: &str) -> String {
        format!("{}/{}", self.registry.name, app_name).to_lowercase()
    }

    pub fn images_dir(&self) -> PathBuf {
        self.paths.root.join("images")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.paths.root.join("templates")
    }

    pub fn proxy_dir(&self) -> PathBuf {
        self.paths.root.join("proxy")
    }

    pub fn registry_dir(&self) -> PathBuf {
        self.paths.root.join("registry")
    }

    pub fn push_script(&self) -> PathBuf {
        self.paths.root.join(&self.registry.push_script)
    }

    pub fn proxy_info_path(&self) -> PathBuf {
        self.paths.root.join(crate::info::PROXY_INFO_FILE)
    }

    pub fn registry_info_path(&self) -> PathBuf {
        self.paths.root.join(crate::info::REGISTRY_INFO_FILE)
    }

    pub fn build_state_path(&self) -> PathBuf {
        self.paths.apps_dir.join("build-state.json")
    }
}

impl ProxyConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_secs)
    }
}

impl BootstrapConfig {
    pub fn discovery_pause(&self) -> Duration {
        Duration::from_secs(self.discovery_pause_secs)
    }

    pub fn registry_settle(&self) -> Duration {
        Duration::from_secs(self.registry_settle_secs)
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_apps_dir() -> PathBuf {
    PathBuf::from(".binder/apps")
}

fn default_registry_name() -> String {
    "localhost:5000".to_owned()
}

fn default_base_image() -> String {
    "binder-base".to_owned()
}

fn default_docker_hub_user() -> String {
    "binder".to_owned()
}

fn default_push_script() -> PathBuf {
    PathBuf::from("util/squash-and-push")
}

fn default_provider() -> String {
    "gce".to_owned()
}

fn default_num_minions() -> u32 {
    3
}

fn default_kubectl() -> String {
    "kubectl.sh".to_owned()
}

fn default_kube_up() -> String {
    "kube-up.sh".to_owned()
}

fn default_kube_down() -> String {
    "kube-down.sh".to_owned()
}

fn default_proxy_attempts() -> u32 {
    20
}

fn default_proxy_pause_secs() -> u64 {
    5
}

fn default_discovery_attempts() -> u32 {
    5
}

fn default_discovery_pause_secs() -> u64 {
    20
}

fn default_registry_settle_secs() -> u64 {
    10
}

fn default_preload_concurrency() -> usize {
    5
}
