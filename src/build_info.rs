//! Build metadata
//!
//! `build.rs` stamps each compile with a build number and a UTC timestamp.

use std::path::Path;

use serde::Serialize;

/// Package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    /// 0 when built without the build script's stamp
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            build_number: option_env!("NUTRISYS_BUILD_NUMBER")
                .and_then(|n| n.parse().ok())
                .unwrap_or(0),
            build_timestamp: option_env!("NUTRISYS_BUILD_TIMESTAMP").unwrap_or("unknown"),
        }
    }
}

fn banner_lines(info: &BuildInfo, database_path: &Path, schema_version: i32) -> Vec<String> {
    vec![
        format!("Nutrisys {} (build {}, {})", info.version, info.build_number, info.build_timestamp),
        format!("Database: {} (schema v{})", database_path.display(), schema_version),
    ]
}

/// Startup banner on stderr; stdout belongs to the MCP transport
pub fn print_startup_banner(database_path: &Path, schema_version: i32) {
    for line in banner_lines(&BuildInfo::current(), database_path, schema_version) {
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_uses_package_version() {
        let info = BuildInfo::current();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.build_timestamp.is_empty());
    }

    #[test]
    fn test_banner_names_database_and_schema() {
        let info = BuildInfo {
            version: "1.0.0",
            build_number: 42,
            build_timestamp: "2026-01-15T09:30:00Z",
        };
        let lines = banner_lines(&info, Path::new("/data/nutrisys.db"), 2);
        assert_eq!(lines[0], "Nutrisys 1.0.0 (build 42, 2026-01-15T09:30:00Z)");
        assert_eq!(lines[1], "Database: /data/nutrisys.db (schema v2)");
    }
}
