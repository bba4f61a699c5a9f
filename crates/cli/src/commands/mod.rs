pub mod comparables;
pub mod config;
pub mod doctor;
pub mod migrate;
pub mod propose;
pub mod risk;
pub mod seed;
pub mod value;
pub mod weights;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use casevalue_core::config::{AppConfig, LoadOptions};
use casevalue_core::domain::case::{HistoricalCase, QueryCase};
use casevalue_core::errors::ApplicationError;
use casevalue_core::valuation::ValuationError;
use casevalue_db::repositories::HistoricalCaseRepository;
use casevalue_db::{connect_with_config, migrations, SqlHistoricalCaseRepository};
use serde::Serialize;
use tracing::info;

/// Error triple threaded through command pipelines: class, message, exit code.
pub(crate) type CommandFailure = (&'static str, String, u8);

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub(crate) fn from_failure(command: &str, (class, message, exit_code): CommandFailure) -> Self {
        Self::failure(command, class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config() -> Result<AppConfig, CommandFailure> {
    AppConfig::load(LoadOptions::default())
        .map_err(|error| ("config_validation", format!("configuration issue: {error}"), 2))
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CommandFailure> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| ("runtime_init", format!("failed to initialize async runtime: {error}"), 3))
}

/// Connects, applies pending migrations and reads the whole corpus.
///
/// A failed read is reported as missing data rather than a database fault.
pub(crate) async fn load_corpus(config: &AppConfig) -> Result<Vec<HistoricalCase>, CommandFailure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;

    let cases = SqlHistoricalCaseRepository::new(pool.clone()).list_all().await;
    pool.close().await;

    let cases = cases.map_err(|error| {
        let error = ApplicationError::from(ValuationError::no_data(format!(
            "historical corpus could not be read: {error}"
        )));
        (error.reason_code(), error.to_string(), 7u8)
    })?;
    info!(event_name = "cli.corpus.loaded", corpus_size = cases.len(), "historical corpus loaded");
    Ok(cases)
}

/// Reads a claim description. `.toml` files are parsed as TOML, everything else as JSON.
pub(crate) fn read_query(path: &Path) -> anyhow::Result<QueryCase> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read query file `{}`", path.display()))?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let query: QueryCase = if is_toml {
        toml::from_str(&raw)
            .with_context(|| format!("could not parse TOML query `{}`", path.display()))?
    } else {
        serde_json::from_str(&raw)
            .with_context(|| format!("could not parse JSON query `{}`", path.display()))?
    };

    if query.venue.trim().is_empty() && query.injuries.trim().is_empty() {
        bail!("query `{}` names neither a venue nor injuries", path.display());
    }
    Ok(query)
}

pub(crate) fn query_failure(error: anyhow::Error) -> CommandFailure {
    ("query_input", format!("{error:#}"), 2)
}

pub(crate) fn to_data<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}
