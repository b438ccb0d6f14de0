//! Parsers for the control tool's human-readable output.
//!
//! The cluster CLI has no stable machine format for the fields needed here,
//! so addresses are scraped from fixed-format text. Every parser returns
//! `None` (or an empty list) when the expected field is absent.

use std::sync::LazyLock;

use regex::Regex;

static INGRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*LoadBalancer Ingress:[ \t]*(?P<ip>[^\n]*)$")
        .expect("ingress pattern is valid")
});

static POD_IP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*IP:[ \t]*(?P<ip>[^\n]*)$").expect("pod ip pattern is valid")
});

static DEFAULT_ZONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ZONE=\$\{KUBE_GCE_ZONE:-(?P<zone>[^}]*)\}").expect("zone pattern is valid")
});

/// Namespaces the cluster creates for itself.
const SYSTEM_NAMESPACES: &[&str] = &["default", "kube-system", "kube-public", "kube-node-lease"];

/// External address from `describe service` output.
pub fn load_balancer_ingress(output: &str) -> Option<String> {
    capture(&INGRESS, output, "ip")
}

/// Pod address from `describe pod` output.
pub fn pod_ip(output: &str) -> Option<String> {
    capture(&POD_IP, output, "ip")
}

/// Default zone from the provider's `config-default.sh`.
pub fn default_zone(config: &str) -> Option<String> {
    capture(&DEFAULT_ZONE, config, "zone")
}

/// Node names from `get nodes` output (first column, header skipped).
pub fn node_names(output: &str) -> Vec<String> {
    first_column(output)
}

/// App namespaces from `get namespaces` output.
pub fn app_namespaces(output: &str) -> Vec<String> {
    first_column(output)
        .into_iter()
        .filter(|ns| !SYSTEM_NAMESPACES.contains(&ns.as_str()))
        .collect()
}

/// Kubernetes checkout derived from the location of `kubectl.sh`.
pub fn kubernetes_home(which_output: &str) -> Option<String> {
    let path = which_output.trim();
    let (home, _) = path.split_once("/cluster/kubectl.sh")?;
    Some(home.to_owned())
}

fn capture(re: &Regex, text: &str, group: &str) -> Option<String> {
    let value = re.captures(text)?.name(group)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_owned())
}

fn first_column(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_owned)
        .collect()
}
