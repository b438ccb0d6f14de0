use std::path::{Path, PathBuf};

use binder_core::template::{self, Params, TemplateError};

/// Remove `path` if present and recreate it empty.
pub fn make_clean_dir(path: &Path) -> Result<(), WorkspaceError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| WorkspaceError::Cleanup {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::create_dir_all(path).map_err(|e| WorkspaceError::Create {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Recursively copy `src` into `dst`, creating `dst` and any parents.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<(), WorkspaceError> {
    std::fs::create_dir_all(dst).map_err(|e| WorkspaceError::Create {
        path: dst.to_path_buf(),
        source: e,
    })?;

    let entries = std::fs::read_dir(src).map_err(|e| WorkspaceError::ReadDir {
        path: src.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| WorkspaceError::ReadDir {
            path: src.to_path_buf(),
            source: e,
        })?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if from.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            std::fs::copy(&from, &to).map_err(|e| WorkspaceError::CopyFile {
                path: from,
                source: e,
            })?;
        }
    }

    Ok(())
}

/// Copy every image definition under `images_dir` into `build_dir` and fill
/// placeholders in each copied file with `params`.
///
/// Returns the staged image directories.
pub fn stage_image_assets(
    images_dir: &Path,
    build_dir: &Path,
    params: &Params,
) -> Result<Vec<PathBuf>, WorkspaceError> {
    let entries = std::fs::read_dir(images_dir).map_err(|e| WorkspaceError::ReadDir {
        path: images_dir.to_path_buf(),
        source: e,
    })?;

    let mut staged = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| WorkspaceError::ReadDir {
            path: images_dir.to_path_buf(),
            source: e,
        })?;
        let src = entry.path();
        if !src.is_dir() {
            continue;
        }

        let dst = build_dir.join(entry.file_name());
        copy_tree(&src, &dst)?;
        fill_tree(&dst, params)?;
        staged.push(dst);
    }

    staged.sort();
    Ok(staged)
}

fn fill_tree(dir: &Path, params: &Params) -> Result<(), WorkspaceError> {
    let entries = std::fs::read_dir(dir).map_err(|e| WorkspaceError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| WorkspaceError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            fill_tree(&path, params)?;
        } else {
            template::render_file(&path, params)?;
        }
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to clean up directory {path}")]
    Cleanup {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {path}")]
    Create {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read directory {path}")]
    ReadDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy file {path}")]
    CopyFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to fill template")]
    Template(#[from] TemplateError),
}
