use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use binder_cluster::proxy::{
    PodLocator, ProxyClient, RetryPolicy, RouteApi, RouteApiError, RouteError, RouteTarget,
};
use binder_core::ProxyInfo;
use mockall::mock;

mock! {
    Api {}

    impl RouteApi for Api {
        async fn register(
            &self,
            url: &str,
            token: &str,
            target: &RouteTarget,
        ) -> Result<u16, RouteApiError>;
        async fn unregister(&self, url: &str, token: &str) -> Result<u16, RouteApiError>;
    }
}

mock! {
    Locator {}

    impl PodLocator for Locator {
        async fn pod_ip(&self, app_id: &str) -> Option<String>;
    }
}

fn policy(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        pause: Duration::from_secs(5),
    }
}

fn write_info(dir: &Path) -> std::path::PathBuf {
    let path = dir.join(".proxy_info");
    ProxyInfo::new("104.197.43.12", "s3cret").write(&path).unwrap();
    path
}

// ── Registration ──

#[tokio::test(start_paused = true)]
async fn registers_after_ip_appears() {
    let tmp = tempfile::tempdir().unwrap();
    let info_path = write_info(tmp.path());

    let calls = Arc::new(AtomicU32::new(0));
    let mut locator = MockLocator::new();
    let counter = Arc::clone(&calls);
    locator.expect_pod_ip().times(3).returning(move |_| {
        // no IP for the first two lookups
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
            None
        } else {
            Some("10.244.1.7".to_owned())
        }
    });

    let mut api = MockApi::new();
    api.expect_register()
        .withf(|url, token, target| {
            url == "http://104.197.43.12/api/routes/app-1"
                && token == "s3cret"
                && target.target == "http://10.244.1.7:8888"
        })
        .times(1)
        .returning(|_, _, _| Ok(201));

    let client = ProxyClient::new(api, info_path, policy(20));
    let target = client.register_route(&locator, "app-1").await.unwrap();

    assert_eq!(target, "http://10.244.1.7:8888");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn non_created_status_fails_without_retry() {
    let tmp = tempfile::tempdir().unwrap();
    let info_path = write_info(tmp.path());

    let mut locator = MockLocator::new();
    locator
        .expect_pod_ip()
        .times(1)
        .returning(|_| Some("10.244.1.7".to_owned()));

    let mut api = MockApi::new();
    api.expect_register().times(1).returning(|_, _, _| Ok(403));

    let client = ProxyClient::new(api, info_path, policy(20));
    let result = client.register_route(&locator, "app-1").await;

    assert!(matches!(result, Err(RouteError::Rejected { status: 403, .. })));
}

#[tokio::test(start_paused = true)]
async fn connection_refused_is_retried() {
    let tmp = tempfile::tempdir().unwrap();
    let info_path = write_info(tmp.path());

    let mut locator = MockLocator::new();
    locator
        .expect_pod_ip()
        .times(2)
        .returning(|_| Some("10.244.1.7".to_owned()));

    let posts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&posts);
    let mut api = MockApi::new();
    api.expect_register().times(2).returning(move |url, _, _| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(RouteApiError::Connect {
                url: url.to_owned(),
                detail: "connection refused".to_owned(),
            })
        } else {
            Ok(201)
        }
    });

    let client = ProxyClient::new(api, info_path, policy(20));
    assert!(client.register_route(&locator, "app-1").await.is_ok());
    assert_eq!(posts.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn other_request_errors_are_terminal() {
    let tmp = tempfile::tempdir().unwrap();
    let info_path = write_info(tmp.path());

    let mut locator = MockLocator::new();
    locator
        .expect_pod_ip()
        .times(1)
        .returning(|_| Some("10.244.1.7".to_owned()));

    let mut api = MockApi::new();
    api.expect_register().times(1).returning(|url, _, _| {
        Err(RouteApiError::Request {
            url: url.to_owned(),
            detail: "timed out".to_owned(),
        })
    });

    let client = ProxyClient::new(api, info_path, policy(20));
    let result = client.register_route(&locator, "app-1").await;

    assert!(matches!(result, Err(RouteError::Request(_))));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_budget() {
    let tmp = tempfile::tempdir().unwrap();
    let info_path = write_info(tmp.path());

    let mut locator = MockLocator::new();
    locator.expect_pod_ip().times(4).returning(|_| None);

    let mut api = MockApi::new();
    api.expect_register().never();

    let client = ProxyClient::new(api, info_path, policy(4));
    let started = tokio::time::Instant::now();
    let result = client.register_route(&locator, "app-1").await;

    assert!(matches!(result, Err(RouteError::Exhausted { attempts: 4 })));
    // pauses between attempts only
    assert_eq!(started.elapsed(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn missing_proxy_info_is_terminal() {
    let tmp = tempfile::tempdir().unwrap();

    let mut locator = MockLocator::new();
    locator
        .expect_pod_ip()
        .times(1)
        .returning(|_| Some("10.244.1.7".to_owned()));

    let mut api = MockApi::new();
    api.expect_register().never();

    let client = ProxyClient::new(api, tmp.path().join(".proxy_info"), policy(20));
    let result = client.register_route(&locator, "app-1").await;

    assert!(matches!(result, Err(RouteError::ProxyInfo(_))));
}

// ── Removal ──

#[tokio::test]
async fn unregister_accepts_any_success_status() {
    let tmp = tempfile::tempdir().unwrap();
    let info_path = write_info(tmp.path());

    let mut api = MockApi::new();
    api.expect_unregister()
        .withf(|url, token| url == "http://104.197.43.12/api/routes/app-1" && token == "s3cret")
        .times(1)
        .returning(|_, _| Ok(204));

    let client = ProxyClient::new(api, info_path, policy(1));
    assert!(client.unregister_route("app-1").await.is_ok());
}

#[tokio::test]
async fn unregister_reports_rejection() {
    let tmp = tempfile::tempdir().unwrap();
    let info_path = write_info(tmp.path());

    let mut api = MockApi::new();
    api.expect_unregister().returning(|_, _| Ok(404));

    let client = ProxyClient::new(api, info_path, policy(1));
    let result = client.unregister_route("app-1").await;

    assert!(matches!(result, Err(RouteError::Rejected { status: 404, .. })));
}

#[test]
fn route_target_points_at_notebook_port() {
    let body = serde_json::to_value(RouteTarget::notebook("10.0.0.3")).unwrap();
    assert_eq!(body, serde_json::json!({ "target": "http://10.0.0.3:8888" }));
}
