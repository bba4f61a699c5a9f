use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use casevalue_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let entries: [(&str, String, &[&str]); 10] = [
        ("database.url", config.database.url.clone(), &["CASEVALUE_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["CASEVALUE_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["CASEVALUE_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "valuation.weights_ttl_hours",
            config.valuation.weights_ttl_hours.to_string(),
            &["CASEVALUE_VALUATION_WEIGHTS_TTL_HOURS"],
        ),
        (
            "valuation.nearest_limit",
            config.valuation.nearest_limit.to_string(),
            &["CASEVALUE_VALUATION_NEAREST_LIMIT"],
        ),
        (
            "valuation.aggregation_limit",
            config.valuation.aggregation_limit.to_string(),
            &["CASEVALUE_VALUATION_AGGREGATION_LIMIT"],
        ),
        (
            "valuation.proposal_validity_days",
            config.valuation.proposal_validity_days.to_string(),
            &["CASEVALUE_VALUATION_PROPOSAL_VALIDITY_DAYS"],
        ),
        (
            "valuation.default_policy",
            config.valuation.default_policy.to_string(),
            &["CASEVALUE_VALUATION_DEFAULT_POLICY"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["CASEVALUE_LOGGING_LEVEL", "CASEVALUE_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["CASEVALUE_LOGGING_FORMAT", "CASEVALUE_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in &entries {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, value, source));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    ["casevalue.toml", "config/casevalue.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source};

    #[test]
    fn nested_keys_are_found_in_file_documents() {
        let doc: toml::Value = "[valuation]\nnearest_limit = 3\n".parse().expect("toml");
        assert!(contains_path(&doc, "valuation.nearest_limit"));
        assert!(!contains_path(&doc, "valuation.aggregation_limit"));
        assert!(!contains_path(&doc, "database.url"));
    }

    #[test]
    fn file_source_names_the_path_and_unset_keys_fall_back_to_default() {
        let doc: toml::Value = "[logging]\nlevel = \"debug\"\n".parse().expect("toml");
        let path = std::path::Path::new("config/casevalue.toml");

        assert_eq!(
            field_source("logging.level", &["CASEVALUE_TEST_UNSET_KEY"], Some(&doc), Some(path)),
            "file (config/casevalue.toml)"
        );
        assert_eq!(
            field_source("logging.format", &["CASEVALUE_TEST_UNSET_KEY"], Some(&doc), Some(path)),
            "default"
        );
    }
}
