//! Placeholder substitution for deployment manifests and image assets.
//!
//! Placeholders are written `{{key}}` (inner whitespace allowed). Keys are
//! flat strings, conventionally namespaced with dots (`app.name`, `app.id`).
//!
//! A placeholder whose key is missing from the parameter table is left in the
//! output verbatim. Callers that need a fully resolved document can check
//! [`unresolved_placeholders`] afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Manifest templates every deployment loads, in a fixed order.
pub const TEMPLATE_NAMES: [&str; 6] = [
    "namespace.json",
    "pod.json",
    "service-pod.json",
    "notebook.json",
    "controller.json",
    "service.json",
];

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Flat parameter table used to fill templates.
pub type Params = BTreeMap<String, String>;

/// Prefix every key with `<namespace>.`.
///
/// ```
/// use binder_core::template::namespace_params;
///
/// let params = namespace_params("app", [("name", "demo"), ("id", "abc")]);
/// assert_eq!(params["app.name"], "demo");
/// assert_eq!(params["app.id"], "abc");
/// ```
pub fn namespace_params<I, K, V>(namespace: &str, params: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: ToString,
{
    params
        .into_iter()
        .map(|(k, v)| (format!("{namespace}.{}", k.as_ref()), v.to_string()))
        .collect()
}

/// Substitute every known placeholder in `template`.
pub fn render(template: &str, params: &Params) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_owned(),
        })
        .into_owned()
}

/// Keys of placeholders still present in `text`, in order of appearance.
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(text)
        .map(|caps| caps[1].to_owned())
        .collect()
}

/// Fill placeholders in a file in place.
///
/// Files that are not valid UTF-8 are left untouched. Returns whether the
/// file content changed.
pub fn render_file(path: &Path, params: &Params) -> Result<bool, TemplateError> {
    let bytes = std::fs::read(path).map_err(|e| TemplateError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let Ok(content) = String::from_utf8(bytes) else {
        return Ok(false);
    };
    let rendered = render(&content, params);
    if rendered == content {
        return Ok(false);
    }
    std::fs::write(path, rendered).map_err(|e| TemplateError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(true)
}

/// Manifest templates loaded once per deployment.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: BTreeMap<String, String>,
}

impl TemplateSet {
    /// Load every name in [`TEMPLATE_NAMES`] from `dir`.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let mut templates = BTreeMap::new();
        for name in TEMPLATE_NAMES {
            let path = dir.join(name);
            let content = std::fs::read_to_string(&path)
                .map_err(|e| TemplateError::Read { path, source: e })?;
            templates.insert(name.to_owned(), content);
        }
        Ok(Self { templates })
    }

    /// Load every regular file in `dir`, keyed by file name.
    pub fn load_dir(dir: &Path) -> Result<Self, TemplateError> {
        let entries = std::fs::read_dir(dir).map_err(|e| TemplateError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut templates = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| TemplateError::Read {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| TemplateError::Read {
                path: path.clone(),
                source: e,
            })?;
            templates.insert(entry.file_name().to_string_lossy().into_owned(), content);
        }
        Ok(Self { templates })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            templates: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn render(&self, name: &str, params: &Params) -> Result<String, TemplateError> {
        let template = self
            .get(name)
            .ok_or_else(|| TemplateError::Unknown(name.to_owned()))?;
        Ok(render(template, params))
    }

    /// Render `name` and write it as `dir/name`.
    pub fn render_to(
        &self,
        name: &str,
        params: &Params,
        dir: &Path,
    ) -> Result<PathBuf, TemplateError> {
        let rendered = self.render(name, params)?;
        let path = dir.join(name);
        std::fs::write(&path, rendered).map_err(|e| TemplateError::Write {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read template {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write rendered template {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no template named {0}")]
    Unknown(String),
}
