//! Configuration management.
//!
//! Settings are layered with the `config` crate: a TOML file first, then
//! environment overrides. The storage layer consumes [`DatabaseSettings`] as
//! opaque input; nothing else in the crate reads the file directly.
//!
//! # File resolution
//!
//! 1. Explicit `--config` path (must exist)
//! 2. `./calendar.toml`
//! 3. `./configs/calendar.toml`
//! 4. `<user config dir>/calendar/config.toml`
//! 5. Built-in defaults
//!
//! # Environment overrides
//!
//! Every key can be overridden. Variables use the `CALENDAR_` prefix with
//! `__` between sections, e.g. `CALENDAR_DATABASE__WORKMODE=sqlite` or
//! `CALENDAR_DATABASE__SQLITE__POOL__CONN_MAX_LIFETIME=5m`. Empty values are
//! ignored.

use crate::error::{Error, Result};
use ::config::builder::{ConfigBuilder, DefaultState};
use ::config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MAX_OPEN_CONNS: u32 = 20;
pub const DEFAULT_MAX_IDLE_CONNS: u32 = 10;
pub const DEFAULT_CONN_MAX_LIFETIME: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_CONN_MAX_IDLE_TIME: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const ENV_PREFIX: &str = "CALENDAR";

/// Complete application settings.
///
/// Unknown top-level sections (e.g. `[server]` in a file shared with other
/// services) are ignored; unknown keys inside known sections are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: AppSettings,
    pub logger: LoggerSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppSettings {
    pub name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "calendar".to_string(),
        }
    }
}

/// Logging settings, consumed by the binary when installing the subscriber.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerSettings {
    /// `trace`, `debug`, `info`, `warn` or `error` (any `EnvFilter` directive works)
    pub level: String,
    /// Log file; logs go to stderr when unset
    pub file: Option<PathBuf>,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Which storage backend is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Workmode {
    /// Volatile in-process store
    #[default]
    Memory,
    /// SQLite database behind a connection pool
    Sqlite,
}

impl Workmode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Workmode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Workmode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Config(format!(
                "unknown workmode '{other}' (expected memory or sqlite)"
            ))),
        }
    }
}

impl TryFrom<String> for Workmode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Database settings handed to the storage layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    pub workmode: Workmode,
    pub sqlite: SqliteSettings,
}

/// Connection settings for the SQLite backend.
///
/// A non-empty `dsn` wins; otherwise the database file is `<dir>/<name>.db`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqliteSettings {
    /// Database path, `:memory:`, or `file:` URI
    pub dsn: String,
    /// Directory holding the database file when `dsn` is empty
    pub dir: PathBuf,
    /// Database file stem when `dsn` is empty
    pub name: String,
    pub pool: PoolSettings,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            dir: PathBuf::from("."),
            name: "calendar".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

impl SqliteSettings {
    /// Resolve the connection string.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if neither a DSN nor a database name is set.
    pub fn connection_string(&self) -> Result<String> {
        let dsn = self.dsn.trim();
        if !dsn.is_empty() {
            return Ok(dsn.to_string());
        }

        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::Config("empty DSN: no dsn and no database name".into()));
        }

        Ok(self
            .dir
            .join(format!("{name}.db"))
            .to_string_lossy()
            .into_owned())
    }
}

/// Connection pool tuning.
///
/// Zero durations mean "no limit".
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Upper bound on open connections (0 = default)
    pub max_open_conns: u32,
    /// Idle connections the pool keeps ready
    pub max_idle_conns: u32,
    #[serde(deserialize_with = "humantime_duration")]
    pub conn_max_lifetime: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub conn_max_idle_time: Duration,
    /// How long an operation waits for a free connection
    #[serde(deserialize_with = "humantime_duration")]
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_open_conns: DEFAULT_MAX_OPEN_CONNS,
            max_idle_conns: DEFAULT_MAX_IDLE_CONNS,
            conn_max_lifetime: DEFAULT_CONN_MAX_LIFETIME,
            conn_max_idle_time: DEFAULT_CONN_MAX_IDLE_TIME,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

fn humantime_duration<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

impl Settings {
    /// Parse settings from TOML text. Missing keys fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid settings TOML.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        deserialize(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    /// Read and parse a settings file, without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        deserialize(Config::builder().add_source(toml_file(path)))
    }

    /// Layer an optional settings file and environment overrides.
    ///
    /// `vars` stands in for the process environment when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or invalid, or an override
    /// has a value of the wrong type.
    pub fn layered(file: Option<&Path>, vars: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(toml_file(path));
        }
        deserialize(builder.add_source(environment(vars)))
    }
}

fn toml_file(path: &Path) -> impl ::config::Source + Send + Sync + 'static + use<> {
    File::from(path).format(FileFormat::Toml).required(true)
}

fn environment(vars: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .ignore_empty(true)
        .source(vars)
}

fn deserialize(builder: ConfigBuilder<DefaultState>) -> Result<Settings> {
    Ok(builder.build()?.try_deserialize()?)
}

/// Candidate settings files, in lookup order.
#[must_use]
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("calendar.toml"),
        PathBuf::from("configs").join("calendar.toml"),
    ];
    if let Some(base) = directories::BaseDirs::new() {
        paths.push(base.config_dir().join("calendar").join("config.toml"));
    }
    paths
}

/// Resolve which settings file to read, if any.
///
/// # Errors
///
/// Returns `Error::Config` if an explicit path does not exist.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    Ok(default_config_paths().into_iter().find(|p| p.is_file()))
}

/// Load settings: file (if any), then environment overrides.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable or invalid, or an
/// environment override is invalid.
pub fn load_settings(explicit_path: Option<&Path>) -> Result<Settings> {
    let path = resolve_config_path(explicit_path)?;
    if let Some(path) = &path {
        debug!(path = %path.display(), "Loading settings");
    }
    Settings::layered(path.as_deref(), None)
}
