//! Settings read from a TOML file, adjusting how scripts are interpreted.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::language::Dialect;

/// Name of the settings file looked for in the current directory when none
/// is given explicitly.
pub const DEFAULT_FILENAME: &str = "nfstructure.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Force a dialect rather than detecting it from the script.
    pub dialect: Option<Dialect>,

    /// Names to accept as channel operators beyond the built in ones.
    pub operators: Vec<String>,

    /// Cap on the rounds of any one extraction pass.
    pub iteration_limit: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Invalid(#[from] toml::de::Error),
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = Settings::from_toml(&content)?;
        debug!(?settings, "Loaded {}", path.display());
        Ok(settings)
    }

    /// Load the given file, or the default file if present, or else fall
    /// back to the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Settings, ConfigError> {
        match path {
            Some(path) => Settings::load(path),
            None => {
                let path = Path::new(DEFAULT_FILENAME);
                if path.exists() {
                    Settings::load(path)
                } else {
                    Ok(Settings::default())
                }
            }
        }
    }
}
