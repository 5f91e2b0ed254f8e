//! XDG-compliant path resolution for progreval.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(progreval::paths::no_home),
        help("Set the HOME environment variable, XDG_CONFIG_HOME, or pass --config explicitly.")
    )]
    NoHome,
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Global directories for progreval.
#[derive(Debug, Clone)]
pub struct ProgrevalPaths {
    /// `$XDG_CONFIG_HOME/progreval/`
    pub config_dir: PathBuf,
}

impl ProgrevalPaths {
    /// Resolve from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let config_root = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .map_err(|_| PathError::NoHome)?,
        };
        Ok(Self::with_config_root(config_root))
    }

    pub fn with_config_root(root: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: root.into().join("progreval"),
        }
    }

    /// `config_dir/config.toml`
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_under_app_dir() {
        let paths = ProgrevalPaths::with_config_root("/tmp/cfg");
        assert_eq!(paths.config_dir, PathBuf::from("/tmp/cfg/progreval"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/cfg/progreval/config.toml"));
    }
}
