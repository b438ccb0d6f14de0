//! Build workspaces, Dockerfile recipes, and image build/push for binder.
//!
//! # Build layout
//!
//! ```text
//! <apps_dir>/<app>/
//!   repo/              ── git clone of the app repository
//!   build/
//!     base/            ── images/base, placeholders filled
//!     suffix/          ── images/suffix, placeholders filled
//!     app/
//!       repo/          ── copy of the clone (Dockerfile rewritten in place
//!                         when the app ships its own)
//!       Dockerfile     ── synthesized recipe otherwise
//! ```
//!
//! # Recipe strategy
//!
//! - `dockerfile` dependency: the repository's Dockerfile is adapted onto the
//!   base image and the repository itself is the build context
//! - otherwise: a recipe is synthesized and `build/app` is the build context

pub mod image;
pub mod recipe;
pub mod source;
pub mod workspace;

pub use image::{ImageBuilder, ImageError};
pub use recipe::{AdaptedDockerfile, RecipeGenerator, ServiceClient, adapt_dockerfile};
pub use source::{FetchError, HttpRepoProbe, RepoProbe, fetch_repo};
pub use workspace::{WorkspaceError, copy_tree, make_clean_dir, stage_image_assets};
