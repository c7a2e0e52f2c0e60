//! # Configuration Management
//!
//! [`Settings`] are layered with the `config` crate, later sources winning:
//!
//! 1. built-in defaults
//! 2. a TOML/YAML/JSON file: the path in `SERVICEKIT_CONFIG` (required to
//!    exist) or `./servicekit.toml` (optional)
//! 3. `SERVICEKIT__*` environment variables, `__` separating nested keys
//!    (`SERVICEKIT__ENV__NAME=dev1`, `SERVICEKIT__SECRETS__BACKEND=vault`)
//!
//! The merged result is validated before it is returned.

pub mod settings;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, File};
use tracing::debug;

use crate::errors::Result;
use crate::secrets::naming::{DEFAULT_KEY_FMT, DEFAULT_PREFIX_FMT};

pub use settings::{
    AwsSettings, DatadogSettings, EnvSettings, EnvironmentType, LoggingSettings, SecretsSettings, Settings,
    VaultSettings,
};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "SERVICEKIT_CONFIG";
/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "SERVICEKIT";
/// Separator between the prefix and nested key segments.
pub const ENV_SEPARATOR: &str = "__";
/// File picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "servicekit.toml";

/// Canonical spelling of multi-word keys. Environment variable names carry
/// no case, so `SERVICEKIT__SECRETS__PREFIXFMT` must be mapped back.
const CAMEL_CASE_KEYS: &[(&str, &str)] = &[
    ("appname", "appName"),
    ("prefixfmt", "prefixFmt"),
    ("keyfmt", "keyFmt"),
    ("cachettlseconds", "cacheTtlSeconds"),
    ("mountpath", "mountPath"),
];

/// Translate `SERVICEKIT__A__B` variables into `(a.b, value)` overrides.
pub fn env_overrides<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let prefix = format!("{}{}", ENV_PREFIX, ENV_SEPARATOR);
    let mut overrides: Vec<(String, String)> = vars
        .into_iter()
        .filter_map(|(name, value)| {
            let rest = name.strip_prefix(&prefix)?;
            if rest.is_empty() {
                return None;
            }
            let key = rest
                .split(ENV_SEPARATOR)
                .map(|segment| {
                    let lower = segment.to_ascii_lowercase();
                    CAMEL_CASE_KEYS
                        .iter()
                        .find(|(from, _)| *from == lower)
                        .map(|(_, to)| to.to_string())
                        .unwrap_or(lower)
                })
                .collect::<Vec<_>>()
                .join(".");
            Some((key, value))
        })
        .collect();
    overrides.sort();
    overrides
}

impl Settings {
    /// Load from the process environment and the default file locations.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(explicit.as_deref(), None)
    }

    /// Load with an explicit file and, for tests, an environment snapshot in
    /// place of the process environment.
    ///
    /// With `file = None` the optional `servicekit.toml` is consulted.
    pub fn load_from(file: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("secrets.prefixFmt", DEFAULT_PREFIX_FMT)?
            .set_default("secrets.keyFmt", DEFAULT_KEY_FMT)?
            .set_default("secrets.backend", "env")?
            .set_default("secrets.cacheTtlSeconds", 0)?
            .set_default("secrets.vault.mountPath", "secret")?
            .set_default("datadog.tracing", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?;

        builder = match file {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let vars = match env {
            Some(vars) => env_overrides(vars),
            None => env_overrides(std::env::vars()),
        };
        for (key, value) in vars {
            builder = builder.set_override(key, value)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        debug!(
            app_name = %settings.app_name,
            env_name = %settings.env.name,
            env_type = %settings.env.kind,
            backend = %settings.secrets.backend,
            "Configuration loaded"
        );
        Ok(settings)
    }
}
