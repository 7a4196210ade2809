//! Export directory guard and cleanup.
//!
//! Export replaces the whole output directory, so the target is resolved
//! lexically and refused unless it lies inside the configured root. Before
//! anything is removed, every existing path component below the root is
//! checked so a symbolic link cannot redirect the export elsewhere.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{ConsistencyError, ExportError};

/// Resolves `.` and `..` without touching the filesystem.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let climbs_out = matches!(
                    out.components().next_back(),
                    None | Some(Component::ParentDir)
                );
                if climbs_out {
                    out.push("..");
                } else if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolves `dir` against `root` and checks that it stays inside it.
///
/// Relative `dir` values are joined onto `root`. The root itself is an
/// acceptable target.
///
/// # Errors
/// `ConsistencyError::OutputOutsideRoot` if the resolved path escapes `root`.
pub fn resolve_output_dir(root: &Path, dir: &Path) -> Result<PathBuf, ConsistencyError> {
    let root = normalize(root);
    let resolved = normalize(&root.join(dir));
    let escapes = resolved
        .components()
        .zip(root.components())
        .any(|(a, b)| a != b)
        || resolved.components().count() < root.components().count()
        || resolved
            .components()
            .skip(root.components().count())
            .any(|c| c == Component::ParentDir);
    if escapes {
        return Err(ConsistencyError::OutputOutsideRoot {
            dir: resolved,
            root,
        });
    }
    Ok(resolved)
}

/// Resolves `dir` like [`resolve_output_dir`] and refuses symbolic links.
///
/// Every path component from just below `root` down to the target is
/// inspected without following links. The root itself is trusted.
///
/// # Errors
/// - `ConsistencyError::OutputOutsideRoot` if the path escapes `root`
/// - `ConsistencyError::SymlinkedOutput` for the first component that is a link
pub fn guard_output_dir(root: &Path, dir: &Path) -> Result<PathBuf, ConsistencyError> {
    let resolved = resolve_output_dir(root, dir)?;
    let mut current = normalize(root);
    let depth = current.components().count();
    for component in resolved.components().skip(depth) {
        current.push(component.as_os_str());
        let is_link = fs::symlink_metadata(&current).is_ok_and(|m| m.file_type().is_symlink());
        if is_link {
            return Err(ConsistencyError::SymlinkedOutput { path: current });
        }
    }
    Ok(resolved)
}

/// Empties `dir`, creating it if missing.
///
/// # Errors
/// `ExportError::Io` if an entry cannot be removed or the directory created.
pub fn clean_directory(dir: &Path) -> Result<(), ExportError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ExportError::Io { path, source }
    };

    if dir.is_dir() {
        for entry in fs::read_dir(dir).map_err(io_err(dir))? {
            let entry = entry.map_err(io_err(dir))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(io_err(&path))?;
            if file_type.is_dir() {
                fs::remove_dir_all(&path).map_err(io_err(&path))?;
            } else {
                fs::remove_file(&path).map_err(io_err(&path))?;
            }
        }
        Ok(())
    } else {
        fs::create_dir_all(dir).map_err(io_err(dir))
    }
}
