use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use config::FileFormat;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Environment variable that points at an explicit configuration file.
const CONFIG_FILE_ENV_NAME: &str = "APP_CONFIG_FILE";

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Separator between environment variable prefix and key segments.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested configuration keys in environment variables.
const ENV_SEPARATOR: &str = "__";

/// Trait implemented by configuration structures that are loaded from an INI file.
pub trait Config {
    /// File looked up in the working directory when `APP_CONFIG_FILE` is not set.
    const DEFAULT_FILE_NAME: &'static str;
}

/// Errors that can occur while loading configuration files and overrides.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    /// Failed to determine the current working directory.
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    /// The configuration file does not exist.
    #[error("configuration file `{0}` does not exist")]
    MissingConfigurationFile(PathBuf),

    /// The configuration file could not be read.
    #[error("failed to read configuration file `{path}`: {source}")]
    ConfigurationFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file existed but could not be parsed.
    #[error("failed to parse configuration file `{path}`: {source}")]
    ConfigurationFileLoad {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    /// The configuration was parsed but deserialization failed.
    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] config::ConfigError),
}

/// Loads configuration from the INI file and `APP_`-prefixed environment variables.
///
/// The file is `APP_CONFIG_FILE` when set, otherwise `T::DEFAULT_FILE_NAME` in the current
/// directory. Nested keys in environment variables use double underscores, so
/// `APP_CLUSTER__DB_PASSWORD` overrides `DB_PASSWORD` in the `[CLUSTER]` section.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let path = match std::env::var_os(CONFIG_FILE_ENV_NAME) {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir()
            .map_err(LoadConfigError::CurrentDir)?
            .join(T::DEFAULT_FILE_NAME),
    };

    load_config_from_path(&path)
}

/// Loads configuration from an explicit INI file plus environment variable overrides.
pub fn load_config_from_path<T>(path: &Path) -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    load_config_with_env(path, None)
}

/// Loads configuration from `path`, reading overrides from `env` instead of the process
/// environment when it is provided.
pub(crate) fn load_config_with_env<T>(
    path: &Path,
    env: Option<HashMap<String, String>>,
) -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    if !path.is_file() {
        return Err(LoadConfigError::MissingConfigurationFile(
            path.to_path_buf(),
        ));
    }

    let contents =
        fs::read_to_string(path).map_err(|source| LoadConfigError::ConfigurationFileRead {
            path: path.to_path_buf(),
            source,
        })?;
    let normalized = normalize_ini_keys(&contents);

    let environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .source(env);

    let settings = config::Config::builder()
        .add_source(config::File::from_str(&normalized, FileFormat::Ini))
        .add_source(environment_source)
        .build()
        .map_err(|source| LoadConfigError::ConfigurationFileLoad {
            path: path.to_path_buf(),
            source,
        })?;

    settings
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

/// Lowercases section headers and keys of an INI document, leaving values untouched.
///
/// Section and key names in `dwh.cfg` are conventionally upper case while environment overrides
/// arrive lower case, so both are folded to one case before they are merged.
fn normalize_ini_keys(contents: &str) -> String {
    let mut normalized = String::with_capacity(contents.len());

    for line in contents.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('[') {
            normalized.push_str(&line.to_lowercase());
        } else if trimmed.starts_with(';') || trimmed.starts_with('#') {
            normalized.push_str(line);
        } else if let Some(index) = line.find(['=', ':']) {
            let (key, value) = line.split_at(index);
            normalized.push_str(&key.to_lowercase());
            normalized.push_str(value);
        } else {
            normalized.push_str(line);
        }

        normalized.push('\n');
    }

    normalized
}
