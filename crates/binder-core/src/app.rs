use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::template::{self, Params};

/// Port the notebook server listens on inside every app pod.
pub const NOTEBOOK_PORT: u16 = 8888;

/// Dependency tag that switches the build to the repository's own Dockerfile.
pub const DOCKERFILE_DEPENDENCY: &str = "dockerfile";

/// Reference to a service an app depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    pub name: String,
    pub version: String,
}

/// Declarative app description, as stored in the app index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSpec {
    pub name: String,
    /// Source repository URL
    pub repo: String,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Path of the notebook content inside the repository
    #[serde(default)]
    pub notebooks: Option<String>,
}

/// Check that an app name is a single plain path component: only
/// `[A-Za-z0-9._-]`, and no leading `.`.
pub fn validate_name(name: &str) -> crate::Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.starts_with('.') {
        Some("name must not start with '.'")
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        Some("only letters, digits, '.', '_' and '-' are allowed")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(crate::Error::InvalidAppName {
            name: name.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}

#[derive(Deserialize)]
struct SpecFile {
    app: AppSpec,
}

impl AppSpec {
    /// Read an app description. Both `{"app": {...}}` and a bare object are accepted.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::AppSpecRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let spec = match serde_json::from_str::<SpecFile>(&content) {
            Ok(file) => file.app,
            Err(_) => serde_json::from_str::<AppSpec>(&content).map_err(|e| {
                crate::Error::AppSpecParse {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?,
        };

        if spec.name.trim().is_empty() {
            return Err(crate::Error::MissingAppName {
                path: path.to_path_buf(),
            });
        }
        validate_name(&spec.name)?;
        Ok(spec)
    }

    /// Parameters used to fill image assets: the description's own top-level fields.
    pub fn template_params(&self) -> Params {
        let mut params = Params::new();
        params.insert("name".to_owned(), self.name.clone());
        params.insert("repo".to_owned(), self.repo.clone());
        if let Some(notebooks) = &self.notebooks {
            params.insert("notebooks".to_owned(), notebooks.clone());
        }
        params.insert("dependencies".to_owned(), self.dependencies.join(","));
        params.insert(
            "services".to_owned(),
            self.services
                .iter()
                .map(|s| format!("{}:{}", s.name, s.version))
                .collect::<Vec<_>>()
                .join(","),
        );
        params
    }
}

/// Run-unique deployment identifier; also the app's cluster namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppId(String);

impl AppId {
    /// Mint a fresh identifier from a random UUID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AppId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An app ready to be built or deployed.
#[derive(Debug, Clone)]
pub struct App {
    spec: AppSpec,
    dependencies: Vec<String>,
    id: AppId,
    dir: PathBuf,
}

impl App {
    /// Create the app and its workspace directory under `apps_dir`.
    pub fn new(spec: AppSpec, apps_dir: &Path) -> crate::Result<Self> {
        validate_name(&spec.name)?;
        let dir = apps_dir.join(&spec.name);
        std::fs::create_dir_all(&dir).map_err(|e| crate::Error::AppDir {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self::with_id(spec, AppId::generate(), dir))
    }

    /// Construct without touching the filesystem.
    pub fn with_id(spec: AppSpec, id: AppId, dir: PathBuf) -> Self {
        let dependencies = spec.dependencies.iter().map(|d| d.to_lowercase()).collect();
        Self {
            spec,
            dependencies,
            id,
            dir,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn id(&self) -> &AppId {
        &self.id
    }

    pub fn spec(&self) -> &AppSpec {
        &self.spec
    }

    pub fn repo_url(&self) -> &str {
        &self.spec.repo
    }

    pub fn service_refs(&self) -> &[ServiceRef] {
        &self.spec.services
    }

    /// Lower-cased dependency tags.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn has_dependency(&self, tag: &str) -> bool {
        self.dependencies.iter().any(|d| d == tag)
    }

    pub fn notebooks_path(&self) -> Option<&str> {
        self.spec.notebooks.as_deref()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.dir.join("repo")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.dir.join("build")
    }

    pub fn deploy_dir(&self) -> PathBuf {
        self.dir.join("deploy")
    }

    /// App-scoped manifest parameters (`app.name`, `app.id`, ...).
    pub fn params(&self, image_ref: &str) -> Params {
        template::namespace_params(
            "app",
            [
                ("name", self.spec.name.clone()),
                ("id", self.id.to_string()),
                ("notebooks-image", image_ref.to_owned()),
                ("notebooks-port", NOTEBOOK_PORT.to_string()),
            ],
        )
    }
}
