//! Runtime configuration
//!
//! Resolved from the environment at startup. Nothing here changes how
//! measurements are calculated.

use std::path::{Path, PathBuf};

/// Overrides the database location
pub const DATABASE_PATH_ENV: &str = "NUTRISYS_DATABASE_PATH";

/// Directive added to `RUST_LOG` so the crate logs at info by default
pub const DEFAULT_LOG_DIRECTIVE: &str = "nutrisys=info";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let database_path = std::env::var(DATABASE_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        Self { database_path }
    }
}

/// `<project>/data/nutrisys.db`, where the project root is found by walking up
/// from `target/release` or `target/debug` when running from a build tree.
fn default_database_path() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    project_root(&exe_dir).join("data").join("nutrisys.db")
}

fn project_root(exe_dir: &Path) -> PathBuf {
    if exe_dir.ends_with("release") || exe_dir.ends_with("debug") {
        if let Some(root) = exe_dir.parent().and_then(Path::parent) {
            return root.to_path_buf();
        }
    }
    exe_dir.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_root_from_build_tree() {
        let root = project_root(Path::new("/work/nutrisys/target/release"));
        assert_eq!(root, PathBuf::from("/work/nutrisys"));

        let root = project_root(Path::new("/work/nutrisys/target/debug"));
        assert_eq!(root, PathBuf::from("/work/nutrisys"));
    }

    #[test]
    fn test_project_root_installed() {
        let root = project_root(Path::new("/usr/local/bin"));
        assert_eq!(root, PathBuf::from("/usr/local/bin"));
    }

    #[test]
    fn test_default_path_file_name() {
        let path = default_database_path();
        assert!(path.ends_with("data/nutrisys.db"));
    }
}
