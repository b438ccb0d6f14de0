//! Route registration with the routing proxy.
//!
//! ```text
//! POST http://<proxy host>/api/routes/<app id>
//! Authorization: token <token>
//! {"target": "http://<pod ip>:8888"}
//! ```
//!
//! The pod address is polled until it appears. A refused connection to the
//! proxy counts the same as "not yet available". Any answer other than
//! `201 Created` ends the registration immediately.

use std::path::PathBuf;
use std::time::Duration;

use binder_core::exec::CommandExecutor;
use binder_core::{BinderConfig, NOTEBOOK_PORT, ProxyInfo};
use serde::Serialize;

use crate::kubectl::Kubectl;

/// Request body for a route registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTarget {
    pub target: String,
}

impl RouteTarget {
    /// Target the notebook server on `ip`.
    pub fn notebook(ip: &str) -> Self {
        Self {
            target: format!("http://{ip}:{NOTEBOOK_PORT}"),
        }
    }
}

/// HTTP surface of the routing proxy.
#[allow(async_fn_in_trait)]
pub trait RouteApi: Send + Sync {
    /// Returns the HTTP status code of the proxy's answer.
    async fn register(
        &self,
        url: &str,
        token: &str,
        target: &RouteTarget,
    ) -> Result<u16, RouteApiError>;

    async fn unregister(&self, url: &str, token: &str) -> Result<u16, RouteApiError>;
}

/// [`RouteApi`] over reqwest.
#[derive(Default)]
pub struct HttpRouteApi {
    client: reqwest::Client,
}

impl HttpRouteApi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteApi for HttpRouteApi {
    async fn register(
        &self,
        url: &str,
        token: &str,
        target: &RouteTarget,
    ) -> Result<u16, RouteApiError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, format!("token {token}"))
            .json(target)
            .send()
            .await
            .map_err(|e| RouteApiError::from_reqwest(url, e))?;
        Ok(response.status().as_u16())
    }

    async fn unregister(&self, url: &str, token: &str) -> Result<u16, RouteApiError> {
        let response = self
            .client
            .delete(url)
            .header(reqwest::header::AUTHORIZATION, format!("token {token}"))
            .send()
            .await
            .map_err(|e| RouteApiError::from_reqwest(url, e))?;
        Ok(response.status().as_u16())
    }
}

/// Source of the address a route should point at.
#[allow(async_fn_in_trait)]
pub trait PodLocator: Send + Sync {
    async fn pod_ip(&self, app_id: &str) -> Option<String>;
}

impl<E: CommandExecutor> PodLocator for Kubectl<E> {
    async fn pod_ip(&self, app_id: &str) -> Option<String> {
        self.notebook_pod_ip(app_id).await
    }
}

/// Fixed attempt budget with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub pause: Duration,
}

/// Registers app routes with the proxy recorded in `.proxy_info`.
pub struct ProxyClient<H: RouteApi> {
    api: H,
    info_path: PathBuf,
    policy: RetryPolicy,
}

impl<H: RouteApi> ProxyClient<H> {
    pub fn new(api: H, info_path: impl Into<PathBuf>, policy: RetryPolicy) -> Self {
        Self {
            api,
            info_path: info_path.into(),
            policy,
        }
    }

    pub fn from_config(api: H, config: &BinderConfig) -> Self {
        Self::new(
            api,
            config.proxy_info_path(),
            RetryPolicy {
                attempts: config.proxy.attempts,
                pause: config.proxy.pause(),
            },
        )
    }

    pub fn info_path(&self) -> &std::path::Path {
        &self.info_path
    }

    /// Route `<proxy>/api/routes/<app_id>` to the app's notebook pod.
    pub async fn register_route<L: PodLocator>(
        &self,
        locator: &L,
        app_id: &str,
    ) -> Result<String, RouteError> {
        for attempt in 1..=self.policy.attempts {
            match locator.pod_ip(app_id).await {
                Some(ip) => {
                    let info = ProxyInfo::read(&self.info_path).map_err(RouteError::ProxyInfo)?;
                    let url = format!("{}/{app_id}", info.routes_url());
                    let target = RouteTarget::notebook(&ip);

                    match self.api.register(&url, &info.token, &target).await {
                        Ok(201) => {
                            tracing::info!(route = %url, target = %target.target, "route registered");
                            return Ok(target.target);
                        }
                        Ok(status) => return Err(RouteError::Rejected { url, status }),
                        Err(RouteApiError::Connect { url, detail }) => {
                            tracing::warn!(%url, %detail, attempt, "proxy unreachable");
                        }
                        Err(e) => return Err(RouteError::Request(e)),
                    }
                }
                None => {
                    tracing::info!(
                        app_id,
                        attempt,
                        pause_secs = self.policy.pause.as_secs(),
                        "app not yet assigned an IP address"
                    );
                }
            }

            if attempt < self.policy.attempts {
                tokio::time::sleep(self.policy.pause).await;
            }
        }

        Err(RouteError::Exhausted {
            attempts: self.policy.attempts,
        })
    }

    /// Remove an app's route. Any 2xx answer counts as success.
    pub async fn unregister_route(&self, app_id: &str) -> Result<(), RouteError> {
        let info = ProxyInfo::read(&self.info_path).map_err(RouteError::ProxyInfo)?;
        let url = format!("{}/{app_id}", info.routes_url());
        let status = self
            .api
            .unregister(&url, &info.token)
            .await
            .map_err(RouteError::Request)?;
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(RouteError::Rejected { url, status })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouteApiError {
    #[error("could not connect to proxy at {url}: {detail}")]
    Connect { url: String, detail: String },

    #[error("request to proxy at {url} failed: {detail}")]
    Request { url: String, detail: String },
}

impl RouteApiError {
    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        let url = url.to_owned();
        let detail = e.to_string();
        if e.is_connect() {
            Self::Connect { url, detail }
        } else {
            Self::Request { url, detail }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("could not read proxy connection info")]
    ProxyInfo(#[source] binder_core::Error),

    #[error("proxy rejected route {url} with status {status}")]
    Rejected { url: String, status: u16 },

    #[error(transparent)]
    Request(RouteApiError),

    #[error("app never became routable after {attempts} attempts")]
    Exhausted { attempts: u32 },
}
