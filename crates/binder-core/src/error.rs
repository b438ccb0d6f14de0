use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── App descriptions ──
    #[error("failed to read app description {path}")]
    AppSpecRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse app description {path}")]
    AppSpecParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("app description {path} has no name")]
    MissingAppName { path: PathBuf },

    #[error("invalid app name {name:?}: {reason}")]
    InvalidAppName { name: String, reason: &'static str },

    #[error("failed to create app directory {path}")]
    AppDir {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Build state ──
    #[error("failed to read build state from {path}")]
    StateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("build state at {path} is corrupt")]
    StateParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write build state to {path}")]
    StateWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Persisted cluster info ──
    #[error("failed to read {path}; has the cluster been started?")]
    InfoRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is malformed: {reason}")]
    InfoMalformed { path: PathBuf, reason: &'static str },

    #[error("failed to write {path}")]
    InfoWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
