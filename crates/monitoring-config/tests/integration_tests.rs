use monitoring_config::{Config, ConfigError, ConfigFormat, ConfigLoader, Validator};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

const TOML_CONFIG: &str = r#"
backend = "prometheus"

[server]
bind_address = "0.0.0.0"
port = 2112

[logging]
level = "debug"
format = "compact"

[[metrics]]
name = "gauge_metric_test"
help = "average of the sampled values"
kind = "gauge"
operation = "set"
interval_ms = 3000
producer = "average"

[[metrics]]
name = "counter_metric_test"
help = "incremented by one every five seconds"
kind = "counter"
operation = "increment"
interval_ms = 5000
"#;

#[tokio::test]
async fn test_load_toml_config() {
    let config = ConfigLoader::new()
        .load_from_string(TOML_CONFIG, ConfigFormat::Toml)
        .unwrap();

    assert_eq!(config.server.socket_addr(), "0.0.0.0:2112");
    assert_eq!(config.logging.level.as_deref(), Some("debug"));
    assert_eq!(config.logging.format, "compact");
    assert_eq!(config.metrics.len(), 2);
    assert_eq!(config.metrics[0].producer.as_deref(), Some("average"));
    assert_eq!(config.metrics[1].interval(), Duration::from_secs(5));
}

#[tokio::test]
async fn test_load_yaml_config() {
    let yaml = r#"
server:
  port: 9100
metrics:
  - name: counter_metric_test_add_by_3
    help: incremented by a constant
    kind: counter
    operation: add
    interval_ms: 10000
    value: 3
"#;

    let config = ConfigLoader::new()
        .load_from_string(yaml, ConfigFormat::Yaml)
        .unwrap();

    assert_eq!(config.backend, "prometheus");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.metrics[0].value, Some(3.0));
}

#[tokio::test]
async fn test_load_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitoring.json");
    fs::write(
        &path,
        r#"{"metrics": [{"name": "temp", "kind": "gauge", "operation": "add", "interval_ms": 250}]}"#,
    )
    .unwrap();

    let config = ConfigLoader::new().load_file(&path).await.unwrap();
    assert_eq!(config.metrics[0].name, "temp");
    assert!(config.metrics[0].help.is_empty());
}

#[tokio::test]
async fn test_missing_file() {
    let result = ConfigLoader::new().load_file("/nonexistent/monitoring.toml").await;
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[tokio::test]
async fn test_invalid_metric_rejected_at_load() {
    let toml = r#"
[[metrics]]
name = "bad name"
kind = "gauge"
operation = "set"
interval_ms = 1000
"#;

    let result = ConfigLoader::new().load_from_string(toml, ConfigFormat::Toml);
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[tokio::test]
async fn test_env_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitoring.toml");
    fs::write(&path, TOML_CONFIG).unwrap();

    std::env::set_var("MONITORING_PORT", "9555");
    std::env::set_var("MONITORING_LOG_FORMAT", "json");
    let config = ConfigLoader::new().load_with_overrides(&path).await.unwrap();
    std::env::remove_var("MONITORING_PORT");
    std::env::remove_var("MONITORING_LOG_FORMAT");

    assert_eq!(config.server.port, 9555);
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert!(config.logging.level.is_none());
}

#[tokio::test]
async fn test_counter_with_set_rejected_at_load() {
    let toml = r#"
[[metrics]]
name = "jobs_total"
kind = "counter"
operation = "set"
interval_ms = 1000
"#;

    let result = ConfigLoader::new().load_from_string(toml, ConfigFormat::Toml);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidValue { field, .. }) if field == "metrics.jobs_total.operation"
    ));
}
