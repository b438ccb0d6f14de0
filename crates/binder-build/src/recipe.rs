//! Dockerfile recipes for app images.
//!
//! An app image is built either from a recipe synthesized out of the app's
//! dependency tags and service clients ([`RecipeGenerator`]), or from the
//! repository's own Dockerfile rewritten onto the base image
//! ([`adapt_dockerfile`]). Both end with the shared suffix staged from
//! `images/suffix/Dockerfile`.

/// User every app image runs as.
pub const TRUSTED_USER: &str = "main";

/// Client code a service contributes to the app image.
#[derive(Debug, Clone, Copy)]
pub struct ServiceClient<'a> {
    pub name: &'a str,
    pub client: Option<&'a str>,
}

/// Directives for a recognized dependency tag; `None` for unknown tags.
pub fn dependency_block(tag: &str) -> Option<&'static str> {
    match tag {
        "requirements.txt" => Some(
            "ADD repo/requirements.txt requirements.txt\n\
             RUN pip install -r requirements.txt\n\
             RUN /home/main/anaconda/envs/python3/bin/pip install -r requirements.txt\n",
        ),
        _ => None,
    }
}

/// Synthesizes a Dockerfile for apps without one.
pub struct RecipeGenerator<'a> {
    base_image: &'a str,
    dependencies: &'a [String],
    services: &'a [ServiceClient<'a>],
    notebooks: Option<&'a str>,
    suffix: &'a str,
}

impl<'a> RecipeGenerator<'a> {
    pub fn new(
        base_image: &'a str,
        dependencies: &'a [String],
        services: &'a [ServiceClient<'a>],
        suffix: &'a str,
    ) -> Self {
        Self {
            base_image,
            dependencies,
            services,
            notebooks: None,
            suffix,
        }
    }

    /// Notebook directory relative to the build context (default `repo`).
    pub fn notebooks(mut self, path: Option<&'a str>) -> Self {
        self.notebooks = path;
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!("FROM {}\n\n", self.base_image);

        for tag in self.dependencies {
            match dependency_block(tag) {
                Some(block) => {
                    out.push_str(block);
                    out.push('\n');
                }
                None => tracing::debug!(tag = %tag, "no recipe block for dependency"),
            }
        }

        for service in self.services {
            out.push_str(&format!("# {} client\n", service.name));
            out.push_str(service.client.unwrap_or_default());
            out.push('\n');
        }

        out.push_str(&format!(
            "ADD {} $HOME/notebooks\n\n",
            self.notebooks.unwrap_or("repo")
        ));
        out.push_str(self.suffix);
        out.push('\n');
        out
    }
}

/// Result of rewriting a repository's Dockerfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedDockerfile {
    pub content: String,
    /// FROM targets of the original that do not look like the base image.
    pub foreign_bases: Vec<String>,
}

impl AdaptedDockerfile {
    pub fn base_mismatch(&self) -> bool {
        !self.foreign_bases.is_empty()
    }
}

/// Rewrite `original` so it builds on `base_image`.
///
/// Every `FROM` line is dropped and a single `FROM <base_image>` is placed
/// first. Original targets not ending in `/<base_name>` are reported in
/// [`AdaptedDockerfile::foreign_bases`]. The trusted user, the notebook `ADD`
/// (default `.`, since the repository is the build context) and `suffix` are
/// appended.
pub fn adapt_dockerfile(
    original: &str,
    base_image: &str,
    base_name: &str,
    notebooks: Option<&str>,
    suffix: &str,
) -> AdaptedDockerfile {
    let mut foreign_bases = Vec::new();
    let mut out = format!("FROM {base_image}\n");

    for line in original.lines() {
        if let Some(target) = from_target(line) {
            let expected = format!("/{base_name}");
            if !(target.ends_with(&expected) || target == base_name) {
                foreign_bases.push(target.to_owned());
            }
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&format!("USER {TRUSTED_USER}\n\n"));
    out.push_str(&format!(
        "ADD {} $HOME/notebooks\n\n",
        notebooks.unwrap_or(".")
    ));
    out.push_str(suffix);
    out.push('\n');

    AdaptedDockerfile {
        content: out,
        foreign_bases,
    }
}

/// Image named by a `FROM` instruction, if `line` is one.
fn from_target(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let (instruction, rest) = trimmed.split_once(char::is_whitespace)?;
    if !instruction.eq_ignore_ascii_case("FROM") {
        return None;
    }
    rest.split_whitespace().next()
}
