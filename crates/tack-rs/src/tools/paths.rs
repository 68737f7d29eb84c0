//! Path helpers shared by the file tools.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `cwd`.
///
/// Absolute paths are used as-is, relative paths are joined onto `cwd`.
/// `.` and `..` components are folded lexically; the filesystem is not
/// consulted, so the result may name a path that does not exist yet.
pub fn resolve_path(cwd: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Create every missing parent directory of `path`.
pub async fn ensure_parent_directory(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_joins_cwd() {
        let cwd = Path::new("/work/repo");
        assert_eq!(resolve_path(cwd, "src/lib.rs"), PathBuf::from("/work/repo/src/lib.rs"));
        assert_eq!(resolve_path(cwd, "./a/../b.txt"), PathBuf::from("/work/repo/b.txt"));
        assert_eq!(resolve_path(cwd, "../other"), PathBuf::from("/work/other"));
    }

    #[test]
    fn absolute_is_kept() {
        let cwd = Path::new("/work/repo");
        assert_eq!(resolve_path(cwd, "/etc/hosts"), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn root_parent_stays_at_root() {
        assert_eq!(resolve_path(Path::new("/"), "../.."), PathBuf::from("/"));
    }

    #[tokio::test]
    async fn creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/c.txt");
        ensure_parent_directory(&target).await.unwrap();
        assert!(dir.path().join("a/b").is_dir());
        assert!(!target.exists());
    }
}
