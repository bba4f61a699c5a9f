use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::valuation::AggregationPolicy;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub valuation: ValuationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValuationConfig {
    pub weights_ttl_hours: i64,
    pub nearest_limit: usize,
    pub aggregation_limit: usize,
    pub proposal_validity_days: u64,
    pub default_policy: AggregationPolicy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub default_policy: Option<AggregationPolicy>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://casevalue.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            valuation: ValuationConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            weights_ttl_hours: 24,
            nearest_limit: 5,
            aggregation_limit: 25,
            proposal_validity_days: 7,
            default_policy: AggregationPolicy::RangeMedian,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("casevalue.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(valuation) = patch.valuation {
            if let Some(weights_ttl_hours) = valuation.weights_ttl_hours {
                self.valuation.weights_ttl_hours = weights_ttl_hours;
            }
            if let Some(nearest_limit) = valuation.nearest_limit {
                self.valuation.nearest_limit = nearest_limit;
            }
            if let Some(aggregation_limit) = valuation.aggregation_limit {
                self.valuation.aggregation_limit = aggregation_limit;
            }
            if let Some(proposal_validity_days) = valuation.proposal_validity_days {
                self.valuation.proposal_validity_days = proposal_validity_days;
            }
            if let Some(default_policy) = valuation.default_policy {
                self.valuation.default_policy = default_policy;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CASEVALUE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("CASEVALUE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("CASEVALUE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CASEVALUE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("CASEVALUE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CASEVALUE_VALUATION_WEIGHTS_TTL_HOURS") {
            self.valuation.weights_ttl_hours =
                parse_env("CASEVALUE_VALUATION_WEIGHTS_TTL_HOURS", &value)?;
        }
        if let Some(value) = read_env("CASEVALUE_VALUATION_NEAREST_LIMIT") {
            self.valuation.nearest_limit = parse_env("CASEVALUE_VALUATION_NEAREST_LIMIT", &value)?;
        }
        if let Some(value) = read_env("CASEVALUE_VALUATION_AGGREGATION_LIMIT") {
            self.valuation.aggregation_limit =
                parse_env("CASEVALUE_VALUATION_AGGREGATION_LIMIT", &value)?;
        }
        if let Some(value) = read_env("CASEVALUE_VALUATION_PROPOSAL_VALIDITY_DAYS") {
            self.valuation.proposal_validity_days =
                parse_env("CASEVALUE_VALUATION_PROPOSAL_VALIDITY_DAYS", &value)?;
        }
        if let Some(value) = read_env("CASEVALUE_VALUATION_DEFAULT_POLICY") {
            self.valuation.default_policy =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "CASEVALUE_VALUATION_DEFAULT_POLICY".to_string(),
                    value: value.clone(),
                })?;
        }

        let log_level =
            read_env("CASEVALUE_LOGGING_LEVEL").or_else(|| read_env("CASEVALUE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CASEVALUE_LOGGING_FORMAT").or_else(|| read_env("CASEVALUE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(default_policy) = overrides.default_policy {
            self.valuation.default_policy = default_policy;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_valuation(&self.valuation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("casevalue.toml"), PathBuf::from("config/casevalue.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_valuation(valuation: &ValuationConfig) -> Result<(), ConfigError> {
    if valuation.weights_ttl_hours <= 0 || valuation.weights_ttl_hours > 24 * 365 {
        return Err(ConfigError::Validation(
            "valuation.weights_ttl_hours must be in range 1..=8760".to_string(),
        ));
    }

    if valuation.nearest_limit == 0 {
        return Err(ConfigError::Validation(
            "valuation.nearest_limit must be greater than zero".to_string(),
        ));
    }

    if valuation.aggregation_limit == 0 {
        return Err(ConfigError::Validation(
            "valuation.aggregation_limit must be greater than zero".to_string(),
        ));
    }

    if valuation.nearest_limit > valuation.aggregation_limit {
        return Err(ConfigError::Validation(
            "valuation.nearest_limit must not exceed valuation.aggregation_limit".to_string(),
        ));
    }

    if valuation.proposal_validity_days == 0 || valuation.proposal_validity_days > 365 {
        return Err(ConfigError::Validation(
            "valuation.proposal_validity_days must be in range 1..=365".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    valuation: Option<ValuationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ValuationPatch {
    weights_ttl_hours: Option<i64>,
    nearest_limit: Option<usize>,
    aggregation_limit: Option<usize>,
    proposal_validity_days: Option<u64>,
    default_policy: Option<AggregationPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
