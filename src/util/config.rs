//! Toolchain override configuration.
//!
//! OVO supports two configuration file locations:
//! - Global: `<platform config dir>/ovo/toolchain.toml` - user-wide compiler overrides
//! - Project: `.ovo/toolchain.toml` - project-specific overrides
//!
//! Project config takes precedence over global config, following the same
//! precedence chain the rest of the ambient stack uses for its own config.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "ovo", "ovo"));

/// Per-compiler path overrides, read from a toolchain config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainOverride {
    pub cc: Option<PathBuf>,
    pub cxx: Option<PathBuf>,
    pub ar: Option<PathBuf>,
    /// Explicit target triple, when cross-compiling.
    pub target: Option<String>,
}

/// Toolchain configuration, as loaded from `.ovo/toolchain.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub toolchain: ToolchainOverride,
}

impl ToolchainConfig {
    /// Whether any override field was actually set (an empty/missing file
    /// parses to an all-`None` config, which detection should ignore).
    pub fn has_overrides(&self) -> bool {
        self.toolchain.cc.is_some() || self.toolchain.cxx.is_some() || self.toolchain.ar.is_some()
    }

    /// Load configuration from a single file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load with fallback to an empty config if the file is missing or
    /// unparsable; a corrupt toolchain file should not block detection.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load toolchain config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one; `other`'s fields take precedence
    /// wherever they are set.
    pub fn merge(&mut self, other: ToolchainConfig) {
        if other.toolchain.cc.is_some() {
            self.toolchain.cc = other.toolchain.cc;
        }
        if other.toolchain.cxx.is_some() {
            self.toolchain.cxx = other.toolchain.cxx;
        }
        if other.toolchain.ar.is_some() {
            self.toolchain.ar = other.toolchain.ar;
        }
        if other.toolchain.target.is_some() {
            self.toolchain.target = other.toolchain.target;
        }
    }
}

/// Project-level toolchain config path: `<project_root>/.ovo/toolchain.toml`.
pub fn project_toolchain_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".ovo").join("toolchain.toml")
}

/// Global toolchain config path: `<config dir>/ovo/toolchain.toml`, per the
/// platform's own convention (`ProjectDirs`'s `config_dir()` — XDG on Linux,
/// `Library/Application Support` on macOS, `%APPDATA%` on Windows).
pub fn global_toolchain_config_path() -> Option<PathBuf> {
    PROJECT_DIRS.as_ref().map(|dirs| dirs.config_dir().join("toolchain.toml"))
}

/// Load merged toolchain configuration from global and project locations.
///
/// Order of precedence (highest to lowest): project, global, defaults.
pub fn load_toolchain_config(global_path: &Path, project_path: &Path) -> ToolchainConfig {
    let mut config = ToolchainConfig::default();

    if global_path.as_os_str().len() > 0 && global_path.exists() {
        config.merge(ToolchainConfig::load_or_default(global_path));
    }
    if project_path.exists() {
        config.merge(ToolchainConfig::load_or_default(project_path));
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_has_no_overrides() {
        assert!(!ToolchainConfig::default().has_overrides());
    }

    #[test]
    fn test_load_and_has_overrides() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("toolchain.toml");
        std::fs::write(&path, "[toolchain]\ncc = \"/usr/bin/clang\"\n").unwrap();

        let config = ToolchainConfig::load(&path).unwrap();
        assert!(config.has_overrides());
        assert_eq!(config.toolchain.cc, Some(PathBuf::from("/usr/bin/clang")));
    }

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");

        std::fs::write(&global, "[toolchain]\ncc = \"/usr/bin/gcc\"\nar = \"/usr/bin/ar\"\n").unwrap();
        std::fs::write(&project, "[toolchain]\ncc = \"/usr/bin/clang\"\n").unwrap();

        let config = load_toolchain_config(&global, &project);
        assert_eq!(config.toolchain.cc, Some(PathBuf::from("/usr/bin/clang")));
        assert_eq!(config.toolchain.ar, Some(PathBuf::from("/usr/bin/ar")));
    }

    #[test]
    fn test_missing_files_yield_default() {
        let config = load_toolchain_config(Path::new("/nonexistent/a"), Path::new("/nonexistent/b"));
        assert!(!config.has_overrides());
    }
}
