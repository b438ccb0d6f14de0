#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use binder::build::{FetchError, RepoProbe};
use binder::cluster::{AppDeployment, BackendError, BootstrapReport, ClusterBackend, PreloadReport};
use binder::exec::{CommandError, CommandExecutor};
use binder::{
    App, AppId, AppSpec, BinderConfig, BuildState, BuildStateStore, Service, ServiceError,
    ServiceRef, TemplateSet,
};
use mockall::mock;

mock! {
    pub Executor {}

    impl CommandExecutor for Executor {
        async fn exec(&self, program: &str, args: &[String]) -> Result<String, CommandError>;
        async fn exec_streaming(
            &self,
            program: &str,
            args: &[String],
            envs: &[(String, String)],
        ) -> Result<(), CommandError>;
    }
}

mock! {
    pub Probe {}

    impl RepoProbe for Probe {
        async fn exists(&self, url: &str) -> Result<bool, FetchError>;
    }
}

mock! {
    pub Backend {}

    impl ClusterBackend for Backend {
        async fn start(&self, num_minions: u32, provider: &str)
            -> Result<BootstrapReport, BackendError>;
        async fn stop(&self, provider: &str) -> Result<(), BackendError>;
        async fn deploy_app(&self, app_id: &str, deploy_dir: &Path) -> AppDeployment;
        async fn preload_image(&self, image_name: &str) -> Result<PreloadReport, BackendError>;
    }
}

/// Resource root with image assets and manifest templates.
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub config: BinderConfig,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        write(root, "images/base/Dockerfile", "FROM jupyter/base\nLABEL app={{name}}\n");
        write(root, "images/suffix/Dockerfile", "USER main\nCMD [\"notebook\"]\n");

        write(
            root,
            "templates/namespace.json",
            r#"{"kind": "Namespace", "metadata": {"name": "{{app.id}}"}}"#,
        );
        write(
            root,
            "templates/notebook.json",
            r#"{"image": "{{app.notebooks-image}}", "port": {{app.notebooks-port}}, "app": "{{app.name}}"}"#,
        );
        for name in ["pod.json", "service-pod.json", "controller.json", "service.json"] {
            write(root, &format!("templates/{name}"), "{}");
        }

        let mut config = BinderConfig::default();
        config.paths.root = root.to_path_buf();
        config.paths.apps_dir = root.join("apps");

        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn push_script(&self) -> String {
        self.config.push_script().to_string_lossy().into_owned()
    }

    pub fn app(&self, dependencies: &[&str]) -> App {
        let spec = AppSpec {
            name: "Demo".to_owned(),
            repo: "https://github.com/example/demo".to_owned(),
            services: vec![],
            dependencies: dependencies.iter().map(|d| (*d).to_owned()).collect(),
            notebooks: None,
        };
        App::with_id(spec, AppId::from("app-1"), self.config.paths.apps_dir.join("Demo"))
    }
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Executor whose `git clone` materializes `repo_files` and which logs every
/// streamed command as `program arg...`.
pub fn executor(
    repo_files: &'static [(&'static str, &'static str)],
    log: Arc<Mutex<Vec<String>>>,
) -> MockExecutor {
    let mut mock = MockExecutor::new();
    mock.expect_exec_streaming()
        .returning(move |program, args, _| {
            log.lock()
                .unwrap()
                .push(format!("{program} {}", args.join(" ")));
            if program == "git" {
                let dest = PathBuf::from(&args[2]);
                for (name, content) in repo_files {
                    write(&dest, name, content);
                }
            }
            Ok(())
        });
    mock
}

pub fn existing_repo() -> MockProbe {
    let mut probe = MockProbe::new();
    probe.expect_exists().returning(|_| Ok(true));
    probe
}

/// Build-state store that remembers every transition.
#[derive(Default)]
pub struct RecordingStore {
    pub transitions: Mutex<Vec<(String, BuildState)>>,
}

impl RecordingStore {
    pub fn states(&self) -> Vec<BuildState> {
        self.transitions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, s)| *s)
            .collect()
    }
}

impl BuildStateStore for RecordingStore {
    fn get(&self, app: &str) -> binder::Result<Option<BuildState>> {
        Ok(self
            .transitions
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| name == app)
            .map(|(_, s)| *s))
    }

    fn set(&self, app: &str, state: BuildState) -> binder::Result<()> {
        self.transitions
            .lock()
            .unwrap()
            .push((app.to_owned(), state));
        Ok(())
    }
}

/// In-process service with scripted outcomes.
pub struct FakeService {
    pub name: String,
    pub version: String,
    pub client: Option<String>,
    pub fail_build: bool,
    pub fail_deploy: bool,
    pub builds: AtomicU32,
    pub deploy_modes: Mutex<Vec<String>>,
}

impl FakeService {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: "1.0".to_owned(),
            client: None,
            fail_build: false,
            fail_deploy: false,
            builds: AtomicU32::new(0),
            deploy_modes: Mutex::new(Vec::new()),
        }
    }

    pub fn service_ref(&self) -> ServiceRef {
        ServiceRef {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }

    pub fn builds(&self) -> u32 {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn modes(&self) -> Vec<String> {
        self.deploy_modes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Service for FakeService {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn client(&self) -> Option<&str> {
        self.client.as_deref()
    }

    async fn build(&self) -> Result<(), ServiceError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if self.fail_build {
            return Err(ServiceError {
                service: self.full_name(),
                reason: "image build failed".to_owned(),
            });
        }
        Ok(())
    }

    async fn deploy(
        &self,
        mode: &str,
        deploy_dir: &Path,
        app: &App,
        templates: &TemplateSet,
    ) -> Result<(), ServiceError> {
        self.deploy_modes.lock().unwrap().push(mode.to_owned());
        if self.fail_deploy {
            return Err(ServiceError {
                service: self.full_name(),
                reason: "no capacity".to_owned(),
            });
        }
        let params = app.params("unused");
        let rendered = templates.render("service.json", &params).unwrap();
        std::fs::write(deploy_dir.join(format!("{}-service.json", self.name)), rendered).unwrap();
        Ok(())
    }
}
