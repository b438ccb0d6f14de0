use binder_core::{App, AppSpec, ProxyInfo, RegistryInfo};
use tempfile::TempDir;

#[test]
fn proxy_info_round_trips_through_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(".proxy_info");

    ProxyInfo::new("104.154.1.2", "s3cret").write(&path).unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "104.154.1.2\ns3cret\n"
    );

    let info = ProxyInfo::read(&path).unwrap();
    assert_eq!(info.host, "104.154.1.2");
    assert_eq!(info.token, "s3cret");
    assert_eq!(info.routes_url(), "http://104.154.1.2/api/routes");
}

#[test]
fn proxy_info_without_token_is_malformed() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(".proxy_info");
    std::fs::write(&path, "104.154.1.2\n").unwrap();

    let err = ProxyInfo::read(&path).unwrap_err();
    assert!(err.to_string().contains("missing auth token"), "got: {err}");
}

#[test]
fn missing_proxy_info_reports_read_error() {
    let tmp = TempDir::new().unwrap();
    let err = ProxyInfo::read(&tmp.path().join(".proxy_info")).unwrap_err();
    assert!(matches!(err, binder_core::Error::InfoRead { .. }));
}

#[test]
fn registry_info_reads_first_line() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(".registry_info");

    RegistryInfo {
        url: "130.211.9.9".to_owned(),
    }
    .write(&path)
    .unwrap();

    assert_eq!(RegistryInfo::read(&path).unwrap().url, "130.211.9.9");
}

#[test]
fn app_spec_accepts_wrapped_and_bare_descriptions() {
    let tmp = TempDir::new().unwrap();

    let wrapped = tmp.path().join("wrapped.json");
    std::fs::write(
        &wrapped,
        r#"{"app": {"name": "demo", "repo": "https://github.com/x/demo",
            "services": [{"name": "spark", "version": "1.4.1"}],
            "dependencies": ["requirements.txt"]}}"#,
    )
    .unwrap();
    let spec = AppSpec::from_file(&wrapped).unwrap();
    assert_eq!(spec.name, "demo");
    assert_eq!(spec.services.len(), 1);
    assert_eq!(spec.services[0].version, "1.4.1");

    let bare = tmp.path().join("bare.json");
    std::fs::write(&bare, r#"{"name": "plain", "repo": "https://github.com/x/p"}"#).unwrap();
    let spec = AppSpec::from_file(&bare).unwrap();
    assert_eq!(spec.name, "plain");
    assert!(spec.services.is_empty());
    assert!(spec.dependencies.is_empty());
}

#[test]
fn app_spec_requires_a_name() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("noname.json");
    std::fs::write(&path, r#"{"name": " ", "repo": "https://github.com/x/p"}"#).unwrap();

    let err = AppSpec::from_file(&path).unwrap_err();
    assert!(matches!(err, binder_core::Error::MissingAppName { .. }));
}

#[test]
fn app_spec_rejects_names_that_escape_the_apps_dir() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("escape.json");

    for name in ["../victim", "/", "a/b", "a\\b", "..", ".hidden", "my app"] {
        let body = serde_json::json!({"name": name, "repo": "https://github.com/x/p"});
        std::fs::write(&path, body.to_string()).unwrap();

        let err = AppSpec::from_file(&path).unwrap_err();
        assert!(
            matches!(err, binder_core::Error::InvalidAppName { .. }),
            "{name} was accepted"
        );
    }
}

#[test]
fn app_spec_accepts_plain_names() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ok.json");
    std::fs::write(
        &path,
        r#"{"name": "Demo_app-2.0", "repo": "https://github.com/x/p"}"#,
    )
    .unwrap();

    assert_eq!(AppSpec::from_file(&path).unwrap().name, "Demo_app-2.0");
}

#[test]
fn app_outside_apps_dir_is_refused_before_touching_disk() {
    let tmp = TempDir::new().unwrap();
    let victim = tmp.path().join("victim/build");
    std::fs::create_dir_all(&victim).unwrap();
    std::fs::write(victim.join("precious.txt"), "keep").unwrap();

    let spec = AppSpec {
        name: "../victim".to_owned(),
        repo: "https://github.com/x/p".to_owned(),
        services: vec![],
        dependencies: vec![],
        notebooks: None,
    };
    let err = App::new(spec, &tmp.path().join("apps")).unwrap_err();

    assert!(matches!(err, binder_core::Error::InvalidAppName { .. }));
    assert!(!tmp.path().join("apps").exists());
    assert!(victim.join("precious.txt").exists());
}
