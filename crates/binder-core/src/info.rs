//! Connection details persisted by cluster bootstrap and read on every deploy.
//!
//! Both files are newline-terminated plain text:
//!
//! ```text
//! .proxy_info      <proxy host>\n<auth token>\n
//! .registry_info   <registry url>\n
//! ```

use std::path::Path;

pub const PROXY_INFO_FILE: &str = ".proxy_info";
pub const REGISTRY_INFO_FILE: &str = ".registry_info";

/// Routing-proxy registration endpoint and its auth token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyInfo {
    pub host: String,
    pub token: String,
}

impl ProxyInfo {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
        }
    }

    /// Base URL for route registration.
    pub fn routes_url(&self) -> String {
        format!("http://{}/api/routes", self.host)
    }

    pub fn read(path: &Path) -> crate::Result<Self> {
        let content = read_info(path)?;
        let mut lines = content.lines().map(str::trim);
        let host = lines.next().filter(|l| !l.is_empty());
        let token = lines.next().filter(|l| !l.is_empty());
        match (host, token) {
            (Some(host), Some(token)) => Ok(Self::new(host, token)),
            (None, _) => Err(crate::Error::InfoMalformed {
                path: path.to_path_buf(),
                reason: "missing proxy host",
            }),
            (_, None) => Err(crate::Error::InfoMalformed {
                path: path.to_path_buf(),
                reason: "missing auth token",
            }),
        }
    }

    pub fn write(&self, path: &Path) -> crate::Result<()> {
        write_info(path, &format!("{}\n{}\n", self.host, self.token))
    }
}

/// Address of the private image registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryInfo {
    pub url: String,
}

impl RegistryInfo {
    /// Read back the address saved by cluster start. Nothing in the build or
    /// deploy path needs it; it is kept for external tooling that talks to
    /// the registry directly.
    pub fn read(path: &Path) -> crate::Result<Self> {
        let content = read_info(path)?;
        let url = content
            .lines()
            .next()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| crate::Error::InfoMalformed {
                path: path.to_path_buf(),
                reason: "missing registry url",
            })?;
        Ok(Self {
            url: url.to_owned(),
        })
    }

    pub fn write(&self, path: &Path) -> crate::Result<()> {
        write_info(path, &format!("{}\n", self.url))
    }
}

fn read_info(path: &Path) -> crate::Result<String> {
    std::fs::read_to_string(path).map_err(|e| crate::Error::InfoRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_info(path: &Path, content: &str) -> crate::Result<()> {
    std::fs::write(path, content).map_err(|e| crate::Error::InfoWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
