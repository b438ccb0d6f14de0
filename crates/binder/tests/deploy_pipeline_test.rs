mod common;

use std::path::PathBuf;
use std::sync::Arc;

use binder::cluster::AppDeployment;
use binder::pipeline::DeployPipeline;
use binder::{Service, StaticCatalog, resolve_services};
use common::{FakeService, MockBackend, Workspace};

fn deployed(app_id: &str) -> AppDeployment {
    AppDeployment {
        url: Some(format!("http://35.1.1.1/{app_id}")),
        applied: true,
        routed: true,
    }
}

#[tokio::test]
async fn deploy_without_services_returns_url() {
    let ws = Workspace::new();
    let app = ws.app(&[]);

    let mut backend = MockBackend::new();
    backend
        .expect_deploy_app()
        .withf(|app_id, dir| {
            app_id == "app-1" && dir.join("namespace.json").is_file() && dir.join("notebook.json").is_file()
        })
        .times(1)
        .returning(|app_id, _| deployed(app_id));

    let pipeline = DeployPipeline::new(&ws.config, &backend);
    let url = pipeline.run(&app, &[], None).await;

    assert_eq!(url.as_deref(), Some("http://35.1.1.1/app-1"));

    let deploy_dir = app.deploy_dir();
    let namespace = std::fs::read_to_string(deploy_dir.join("namespace.json")).unwrap();
    assert!(namespace.contains(r#""name": "app-1""#));
    let notebook = std::fs::read_to_string(deploy_dir.join("notebook.json")).unwrap();
    assert_eq!(
        notebook,
        r#"{"image": "localhost:5000/demo", "port": 8888, "app": "Demo"}"#
    );
    // only app documents are written when there are no services
    assert_eq!(std::fs::read_dir(&deploy_dir).unwrap().count(), 2);
}

#[tokio::test]
async fn deploy_dir_is_rebuilt_from_scratch() {
    let ws = Workspace::new();
    let app = ws.app(&[]);
    common::write(&app.deploy_dir(), "stale.json", "{}");

    let mut backend = MockBackend::new();
    backend
        .expect_deploy_app()
        .returning(|app_id, _| deployed(app_id));

    let pipeline = DeployPipeline::new(&ws.config, &backend);
    assert!(pipeline.run(&app, &[], None).await.is_some());
    assert!(!app.deploy_dir().join("stale.json").exists());
}

#[tokio::test]
async fn services_deploy_in_default_mode() {
    let ws = Workspace::new();
    let app = ws.app(&[]);
    let spark = Arc::new(FakeService::new("spark"));
    let services: Vec<Arc<dyn Service>> = vec![spark.clone()];

    let mut backend = MockBackend::new();
    backend
        .expect_deploy_app()
        .withf(|_, dir| dir.join("spark-service.json").is_file())
        .times(1)
        .returning(|app_id, _| deployed(app_id));

    let pipeline = DeployPipeline::new(&ws.config, &backend);
    assert!(pipeline.run(&app, &services, None).await.is_some());
    assert_eq!(spark.modes(), ["single-node"]);
}

#[tokio::test]
async fn explicit_mode_is_passed_to_services() {
    let ws = Workspace::new();
    let app = ws.app(&[]);
    let spark = Arc::new(FakeService::new("spark"));
    let services: Vec<Arc<dyn Service>> = vec![spark.clone()];

    let mut backend = MockBackend::new();
    backend
        .expect_deploy_app()
        .returning(|app_id, _| deployed(app_id));

    let pipeline = DeployPipeline::new(&ws.config, &backend);
    pipeline.run(&app, &services, Some("multi-node")).await;
    assert_eq!(spark.modes(), ["multi-node"]);
}

#[tokio::test]
async fn failed_service_does_not_stop_others_or_backend() {
    let ws = Workspace::new();
    let app = ws.app(&[]);
    let mut broken = FakeService::new("postgres");
    broken.fail_deploy = true;
    let broken = Arc::new(broken);
    let redis = Arc::new(FakeService::new("redis"));
    let services: Vec<Arc<dyn Service>> = vec![broken.clone(), redis.clone()];

    let mut backend = MockBackend::new();
    backend
        .expect_deploy_app()
        .times(1)
        .returning(|app_id, _| deployed(app_id));

    let pipeline = DeployPipeline::new(&ws.config, &backend);
    let url = pipeline.run(&app, &services, None).await;

    assert_eq!(url, None);
    assert_eq!(broken.modes().len(), 1);
    assert_eq!(redis.modes().len(), 1);
}

#[tokio::test]
async fn unrouted_deployment_yields_no_url() {
    let ws = Workspace::new();
    let app = ws.app(&[]);

    let mut backend = MockBackend::new();
    backend.expect_deploy_app().returning(|app_id, _| AppDeployment {
        url: Some(format!("http://35.1.1.1/{app_id}")),
        applied: true,
        routed: false,
    });

    let pipeline = DeployPipeline::new(&ws.config, &backend);
    assert_eq!(pipeline.run(&app, &[], None).await, None);
}

#[tokio::test]
async fn missing_templates_skip_backend() {
    let ws = Workspace::new();
    let app = ws.app(&[]);
    std::fs::remove_file(ws.root().join("templates/controller.json")).unwrap();

    let mut backend = MockBackend::new();
    backend.expect_deploy_app().never();

    let pipeline = DeployPipeline::new(&ws.config, &backend);
    assert_eq!(pipeline.run(&app, &[], None).await, None);
}

#[tokio::test]
async fn bundled_notebook_manifest_serves_under_app_id() {
    let ws = Workspace::new();
    let resources = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../resources");
    let mut config = ws.config.clone();
    config.paths.root = resources.clone();
    let app = ws.app(&[]);

    let mut backend = MockBackend::new();
    backend
        .expect_deploy_app()
        .returning(|app_id, _| deployed(app_id));

    let pipeline = DeployPipeline::new(&config, &backend);
    assert!(pipeline.run(&app, &[], None).await.is_some());

    let rendered = std::fs::read_to_string(app.deploy_dir().join("notebook.json")).unwrap();
    let notebook: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    let container = &notebook["spec"]["containers"][0];
    assert_eq!(container["image"], "localhost:5000/demo");
    let env = container["env"].as_array().unwrap();
    assert!(
        env.iter()
            .any(|var| var["name"] == "BASE_URL" && var["value"] == "/app-1/")
    );

    // the image takes its base URL from the pod, not from build-time fields
    let suffix = std::fs::read_to_string(resources.join("images/suffix/Dockerfile")).unwrap();
    assert!(suffix.contains("$BASE_URL"));
    assert!(!suffix.contains("{{name}}"));
}

// ── Service resolution ──

#[test]
fn services_resolve_by_name_and_version() {
    let ws = Workspace::new();
    let spark: Arc<dyn Service> = Arc::new(FakeService::new("spark"));

    let mut catalog = StaticCatalog::new();
    catalog.register(spark);

    let mut spec = ws.app(&[]).spec().clone();
    spec.services = vec![FakeService::new("spark").service_ref()];
    let app = binder::App::with_id(spec, "app-1".into(), ws.root().join("apps/Demo"));

    let resolved = resolve_services(&app, &catalog).unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].full_name(), "spark-1.0");
}

#[test]
fn unknown_service_is_reported() {
    let ws = Workspace::new();
    let mut spec = ws.app(&[]).spec().clone();
    spec.services = vec![binder::ServiceRef {
        name: "hadoop".to_owned(),
        version: "2.7".to_owned(),
    }];
    let app = binder::App::with_id(spec, "app-1".into(), ws.root().join("apps/Demo"));

    let err = resolve_services(&app, &StaticCatalog::new()).err().unwrap();
    assert_eq!(err.name, "hadoop");
    assert_eq!(err.version, "2.7");
}
