//! Config file discovery and loading.
//!
//! 1. Pick the file: the explicit path, else `TETHER_CONFIG`
//! 2. Parse it (a named file that does not exist is an error)
//! 3. Overlay environment variables
//! 4. Validate

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::CONFIG_PATH_VAR;
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// A loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The validated configuration.
    pub config: Config,
    /// The file that was read, if any.
    pub loaded_file: Option<PathBuf>,
    /// How many environment variables were applied.
    pub env_overrides: usize,
}

/// Load configuration, resolving variables through `lookup`.
///
/// With neither `explicit` nor `TETHER_CONFIG` the built-in defaults are
/// used.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the named file cannot be read or parsed, an
/// environment variable is malformed, or the result fails validation.
pub fn load_with<F>(explicit: Option<&Path>, lookup: F) -> ConfigResult<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| lookup(CONFIG_PATH_VAR).map(PathBuf::from));

    let mut config = match &path {
        Some(path) => {
            let config = parse_file(path)?;
            info!(path = %path.display(), "loaded config file");
            config
        },
        None => {
            debug!("no config file named, using defaults");
            Config::default()
        },
    };

    let env_overrides = config.apply_env_with(lookup)?;
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_file: path,
        env_overrides,
    })
}

/// Load a config from a specific file path (no environment overlay).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed or
/// validated.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let config = parse_file(path)?;
    validate::validate(&config)?;
    Ok(config)
}

fn parse_file(path: &Path) -> ConfigResult<Config> {
    let unreadable = |source: std::io::Error| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let size = std::fs::metadata(path).map_err(unreadable)?.len();
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_CONFIG_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(unreadable)?;
    toml::from_str(&content).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
