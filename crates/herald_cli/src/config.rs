//! Configuration file support for herald.
//!
//! Options are loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `HERALD_`, e.g., `HERALD_TOKEN`)
//! 3. Config file (./herald.toml, then ~/.config/herald/config.toml)
//! 4. Built-in defaults
//!
//! Every layer only supplies raw strings; validation happens once, in
//! [`herald::RunConfiguration::resolve`].
//!
//! Example config file:
//! ```toml
//! username = "octocat"
//! token = "ghp_..."  # or use HERALD_TOKEN env var
//! mark_as_read = true
//! add_release_details = true
//! regex_filter_tag = "^v[0-9]+\\."
//! expected_receive_period_in_days = 2
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config as Settings, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use herald::config::keys;
use herald::{RawOptions, RunResult, default_options};

const APP_NAME: &str = "herald";

const ENV_PREFIX: &str = "HERALD";

const LOCAL_CONFIG_FILE: &str = "herald.toml";

const STATE_FILE: &str = "state.json";

/// Load raw options from every layer below the command line.
pub fn load() -> Result<RawOptions, ConfigError> {
    let mut builder = with_defaults()?;

    if let Some(xdg_config) = default_config_path()
        && xdg_config.exists()
    {
        tracing::debug!("Loading config from {:?}", xdg_config);
        builder = builder.add_source(
            File::from(xdg_config)
                .format(FileFormat::Toml)
                .required(false),
        );
    }

    let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
    if local_config.exists() {
        tracing::debug!("Loading config from ./{}", LOCAL_CONFIG_FILE);
        builder = builder.add_source(
            File::from(local_config)
                .format(FileFormat::Toml)
                .required(false),
        );
    }

    // No separator: HERALD_MARK_AS_READ -> mark_as_read
    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));

    extract(builder.build()?)
}

/// A builder seeded with the options a fresh instance starts out with.
fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    default_options()
        .into_iter()
        .try_fold(Settings::builder(), |builder, (key, value)| {
            builder.set_default(key, value)
        })
}

/// Pull the recognised keys out of the merged settings as strings.
///
/// TOML booleans and integers are rendered back to text; unknown keys are
/// ignored.
fn extract(settings: Settings) -> Result<RawOptions, ConfigError> {
    let mut raw = RawOptions::new();
    for key in keys::ALL {
        match settings.get_string(key) {
            Ok(value) => {
                raw.insert(key.to_string(), value);
            }
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(raw)
}

/// Apply command-line overrides on top of the loaded options.
pub fn apply_overrides(
    raw: &mut RawOptions,
    overrides: impl IntoIterator<Item = (&'static str, Option<String>)>,
) {
    for (key, value) in overrides {
        if let Some(value) = value {
            raw.insert(key.to_string(), value);
        }
    }
}

/// Get the default config file path.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Get the default state directory path.
///
/// On Linux, this is `$XDG_STATE_HOME/herald` or `~/.local/state/herald`.
/// On macOS/Windows, falls back to the data directory.
pub fn default_state_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| {
        // state_dir() returns None on macOS/Windows, fall back to data_dir
        dirs.state_dir()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| dirs.data_dir().to_path_buf())
    })
}

/// Where the result of the last run is kept between invocations.
pub fn default_state_path() -> Option<PathBuf> {
    default_state_dir().map(|dir| dir.join(STATE_FILE))
}

/// Read the result of the previous run. A missing file means no run yet.
pub fn load_state(path: &Path) -> io::Result<Option<RunResult>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Invalid state file: {e}")))
}

/// Persist the result of a run, creating parent directories as needed.
pub fn save_state(path: &Path, result: &RunResult) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(result)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)
}
