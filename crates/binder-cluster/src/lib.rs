pub mod backend;
pub mod describe;
pub mod kubectl;
pub mod kubernetes;
pub mod preload;
pub mod proxy;

pub use backend::{AppDeployment, BackendError, BootstrapReport, BootstrapStep, ClusterBackend};
pub use kubectl::Kubectl;
pub use kubernetes::KubernetesBackend;
pub use preload::{ClusterEnv, NodeFailure, PreloadError, PreloadReport};
pub use proxy::{
    HttpRouteApi, PodLocator, ProxyClient, RetryPolicy, RouteApi, RouteApiError, RouteError,
    RouteTarget,
};
