use std::path::Path;

use binder_core::exec::{self, CommandError, CommandExecutor};

use crate::describe;

/// Name of the pod running an app's notebook server.
pub const NOTEBOOK_POD: &str = "notebook-server";

/// Typed operations on the cluster control tool, parameterized over the
/// executor for testability.
pub struct Kubectl<E: CommandExecutor> {
    executor: E,
    program: String,
}

impl<E: CommandExecutor> Kubectl<E> {
    pub fn new(executor: E, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
        }
    }

    /// The underlying executor, for commands other than the control tool.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// `create -f <file> [--namespace=<ns>]`
    pub async fn create(&self, file: &Path, namespace: Option<&str>) -> Result<(), CommandError> {
        let mut cmd = vec!["create".to_owned(), "-f".to_owned(), exec::path_arg(file)?];
        if let Some(ns) = namespace {
            cmd.push(format!("--namespace={ns}"));
        }
        let output = self.executor.exec(&self.program, &cmd).await?;
        tracing::debug!(file = %file.display(), namespace, output = output.trim(), "resource created");
        Ok(())
    }

    /// `describe <kind> <name> [--namespace=<ns>]`
    pub async fn describe(
        &self,
        kind: &str,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<String, CommandError> {
        let mut cmd = exec::args(["describe", kind, name]);
        if let Some(ns) = namespace {
            cmd.push(format!("--namespace={ns}"));
        }
        self.executor.exec(&self.program, &cmd).await
    }

    /// External address of a load-balanced service, if provisioned.
    pub async fn service_address(&self, service: &str) -> Option<String> {
        match self.describe("service", service, None).await {
            Ok(output) => {
                let address = describe::load_balancer_ingress(&output);
                if address.is_none() {
                    tracing::debug!(service, "no ingress address in service description");
                }
                address
            }
            Err(e) => {
                tracing::debug!(service, error = %e, "could not describe service");
                None
            }
        }
    }

    /// Address of an app's notebook pod, if assigned.
    pub async fn notebook_pod_ip(&self, app_id: &str) -> Option<String> {
        match self.describe("pod", NOTEBOOK_POD, Some(app_id)).await {
            Ok(output) => describe::pod_ip(&output),
            Err(e) => {
                tracing::debug!(app_id, error = %e, "could not describe notebook pod");
                None
            }
        }
    }

    pub async fn nodes(&self) -> Result<Vec<String>, CommandError> {
        let output = self
            .executor
            .exec(&self.program, &exec::args(["get", "nodes"]))
            .await?;
        Ok(describe::node_names(&output))
    }

    pub async fn app_namespaces(&self) -> Result<Vec<String>, CommandError> {
        let output = self
            .executor
            .exec(&self.program, &exec::args(["get", "namespaces"]))
            .await?;
        Ok(describe::app_namespaces(&output))
    }

    pub async fn delete_namespace(&self, namespace: &str) -> Result<(), CommandError> {
        self.executor
            .exec(&self.program, &exec::args(["delete", "namespace", namespace]))
            .await?;
        Ok(())
    }

    /// Locate the Kubernetes checkout the control tool lives in.
    pub async fn kubernetes_home(&self) -> Option<String> {
        let output = self
            .executor
            .exec("which", std::slice::from_ref(&self.program))
            .await
            .ok()?;
        describe::kubernetes_home(&output)
    }
}
