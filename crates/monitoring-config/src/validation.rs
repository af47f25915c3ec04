use crate::error::{ConfigError, ConfigResult};
use crate::schema::*;
use std::collections::HashSet;

/// Backends this SDK can drive
pub const SUPPORTED_BACKENDS: &[&str] = &["prometheus"];

/// Metric kinds
pub const METRIC_KINDS: &[&str] = &["counter", "gauge"];

/// Operation names
pub const OPERATIONS: &[&str] = &["set", "add", "sub", "increment", "decrement"];

/// Operations a counter accepts
pub const COUNTER_OPERATIONS: &[&str] = &["add", "increment"];

/// Validator for configuration settings
pub trait Validator {
    /// Check the settings, returning the first problem found
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        if !SUPPORTED_BACKENDS.contains(&self.backend.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "backend",
                format!("must be one of: {}", SUPPORTED_BACKENDS.join(", ")),
            ));
        }

        self.server.validate()?;
        self.logging.validate()?;

        let mut seen = HashSet::new();
        for metric in &self.metrics {
            metric.validate()?;
            if !seen.insert(metric.name.as_str()) {
                return Err(ConfigError::DuplicateMetric(metric.name.clone()));
            }
        }

        Ok(())
    }
}

impl Validator for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.bind_address.is_empty() {
            return Err(ConfigError::MissingRequired("server.bind_address".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "server.port",
                format!("port must be between 1 and 65535, got {}", self.port),
            ));
        }

        if !self.path.starts_with('/') || self.path.len() < 2 {
            return Err(ConfigError::invalid_value(
                "server.path",
                format!("must be an absolute path such as /metrics, got '{}'", self.path),
            ));
        }

        if self.path == "/health" {
            return Err(ConfigError::invalid_value(
                "server.path",
                "/health is reserved for the liveness probe",
            ));
        }

        Ok(())
    }
}

impl Validator for LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if let Some(level) = &self.level {
            if !valid_levels.contains(&level.to_lowercase().as_str()) {
                return Err(ConfigError::invalid_value(
                    "logging.level",
                    format!("must be one of: {}", valid_levels.join(", ")),
                ));
            }
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        Ok(())
    }
}

impl Validator for MetricSpec {
    fn validate(&self) -> ConfigResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::MissingRequired("metrics.name".to_string()));
        }

        if !is_valid_metric_name(&self.name) {
            return Err(ConfigError::invalid_value(
                format!("metrics.{}.name", self.name),
                "must match [a-zA-Z_:][a-zA-Z0-9_:]*",
            ));
        }

        if !METRIC_KINDS.contains(&self.kind.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                format!("metrics.{}.kind", self.name),
                format!("must be one of: {}", METRIC_KINDS.join(", ")),
            ));
        }

        if !OPERATIONS.contains(&self.operation.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                format!("metrics.{}.operation", self.name),
                format!("must be one of: {}", OPERATIONS.join(", ")),
            ));
        }

        if self.kind.eq_ignore_ascii_case("counter")
            && !COUNTER_OPERATIONS.contains(&self.operation.to_lowercase().as_str())
        {
            return Err(ConfigError::invalid_value(
                format!("metrics.{}.operation", self.name),
                format!(
                    "counters only support: {}, got '{}'",
                    COUNTER_OPERATIONS.join(", "),
                    self.operation
                ),
            ));
        }

        if self.interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                format!("metrics.{}.interval_ms", self.name),
                "must be greater than zero",
            ));
        }

        if self.producer.is_some() && self.value.is_some() {
            return Err(ConfigError::invalid_value(
                format!("metrics.{}", self.name),
                "set either 'producer' or 'value', not both",
            ));
        }

        if let Some(value) = self.value {
            if !value.is_finite() {
                return Err(ConfigError::invalid_value(
                    format!("metrics.{}.value", self.name),
                    "must be a finite number",
                ));
            }
        }

        Ok(())
    }
}

/// Prometheus metric name rule
fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
