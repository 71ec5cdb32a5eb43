//! Client configuration
//!
//! Everything a [`crate::PistonClient`] needs is captured here at construction and
//! never changes afterwards. Configurations are built programmatically or loaded
//! from YAML; any key left out falls back to its default.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::errors::PistonError;

pub const DEFAULT_BASE_URL: &str = "https://emkc.org/api/v2/piston";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub limits: ExecutionLimits,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            retries: default_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            request_timeout_ms: None,
            limits: ExecutionLimits::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base_ms = saturating_millis(backoff_base);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(saturating_millis(timeout));
        self
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Delay before the second attempt; doubled for every attempt after that
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Parse a configuration from YAML and validate it
    pub fn from_yaml_str(content: &str) -> Result<Self, PistonError> {
        let mut config: ClientConfig = serde_yaml::from_str(content)
            .map_err(|e| PistonError::Config(format!("Failed to parse YAML config: {}", e)))?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PistonError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            PistonError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), PistonError> {
        if self.retries == 0 {
            return Err(PistonError::Config(
                "retries must allow at least one attempt".to_string(),
            ));
        }

        if self.request_timeout_ms == Some(0) {
            return Err(PistonError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        let url = Url::parse(&self.base_url).map_err(|e| {
            PistonError::Config(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(PistonError::Config(format!(
                "Unsupported base URL scheme '{}'",
                scheme
            ))),
        }
    }
}

/// Resource limits forwarded to the execution service
///
/// Unset limits are left out of the request entirely so the service applies its
/// own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLimits {
    #[serde(default)]
    pub compile_timeout: Option<i64>,
    #[serde(default)]
    pub run_timeout: Option<i64>,
    #[serde(default)]
    pub compile_cpu_time: Option<i64>,
    #[serde(default)]
    pub run_cpu_time: Option<i64>,
    #[serde(default)]
    pub compile_memory_limit: Option<i64>,
    #[serde(default)]
    pub run_memory_limit: Option<i64>,
}

impl ExecutionLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile_timeout(mut self, millis: i64) -> Self {
        self.compile_timeout = Some(millis);
        self
    }

    pub fn run_timeout(mut self, millis: i64) -> Self {
        self.run_timeout = Some(millis);
        self
    }

    pub fn compile_cpu_time(mut self, millis: i64) -> Self {
        self.compile_cpu_time = Some(millis);
        self
    }

    pub fn run_cpu_time(mut self, millis: i64) -> Self {
        self.run_cpu_time = Some(millis);
        self
    }

    pub fn compile_memory_limit(mut self, bytes: i64) -> Self {
        self.compile_memory_limit = Some(bytes);
        self
    }

    pub fn run_memory_limit(mut self, bytes: i64) -> Self {
        self.run_memory_limit = Some(bytes);
        self
    }

    /// Write every set limit into a request body under its wire name
    pub(crate) fn apply_to(&self, body: &mut Value) {
        let limits = [
            ("compile_timeout", self.compile_timeout),
            ("run_timeout", self.run_timeout),
            ("compile_cpu_time", self.compile_cpu_time),
            ("run_cpu_time", self.run_cpu_time),
            ("compile_memory_limit", self.compile_memory_limit),
            ("run_memory_limit", self.run_memory_limit),
        ];

        for (key, limit) in limits {
            if let Some(limit) = limit {
                body[key] = limit.into();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://emkc.org/api/v2/piston");
        assert_eq!(config.retries, 3);
        assert_eq!(config.backoff_base(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.limits, ExecutionLimits::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let config = ClientConfig::default()
            .with_base_url("http://localhost:2000/api/v2/piston/")
            .with_retries(5)
            .with_backoff_base(Duration::from_millis(10))
            .with_request_timeout(Duration::from_secs(30));

        assert_eq!(config.base_url, "http://localhost:2000/api/v2/piston");
        assert_eq!(config.retries, 5);
        assert_eq!(config.backoff_base_ms, 10);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_sub_second_durations_keep_precision() {
        let config = ClientConfig::default()
            .with_request_timeout(Duration::from_millis(500))
            .with_backoff_base(Duration::from_micros(1500));

        assert_eq!(config.request_timeout_ms, Some(500));
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(config.backoff_base(), Duration::from_millis(1));
        assert!(config.validate().is_ok());

        let huge = ClientConfig::default().with_backoff_base(Duration::MAX);
        assert_eq!(huge.backoff_base_ms, u64::MAX);
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let config = ClientConfig::default().with_request_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(PistonError::Config(_))));

        assert!(matches!(
            ClientConfig::from_yaml_str("request_timeout_ms: 0"),
            Err(PistonError::Config(_))
        ));
        let yaml = ClientConfig::from_yaml_str("request_timeout_ms: 750").unwrap();
        assert_eq!(yaml.request_timeout(), Some(Duration::from_millis(750)));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_retries = ClientConfig::default().with_retries(0);
        assert!(matches!(
            zero_retries.validate(),
            Err(PistonError::Config(_))
        ));

        let relative = ClientConfig::default().with_base_url("api/v2/piston");
        assert!(matches!(relative.validate(), Err(PistonError::Config(_))));

        let ftp = ClientConfig::default().with_base_url("ftp://emkc.org/api");
        assert!(matches!(ftp.validate(), Err(PistonError::Config(_))));
    }

    #[test]
    fn test_from_yaml_with_partial_keys() {
        let config = ClientConfig::from_yaml_str(
            r#"
base_url: "http://127.0.0.1:2000/api/v2/piston/"
retries: 5
limits:
  run_timeout: 3000
  compile_memory_limit: 100000000
"#,
        )
        .unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:2000/api/v2/piston");
        assert_eq!(config.retries, 5);
        assert_eq!(config.backoff_base_ms, 1000);
        assert_eq!(config.limits.run_timeout, Some(3000));
        assert_eq!(config.limits.compile_memory_limit, Some(100000000));
        assert_eq!(config.limits.compile_timeout, None);
    }

    #[test]
    fn test_from_yaml_rejects_invalid() {
        assert!(matches!(
            ClientConfig::from_yaml_str("retries: 0"),
            Err(PistonError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::from_yaml_str("retries: [1, 2]"),
            Err(PistonError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "retries: 7\nbackoff_base_ms: 250").unwrap();

        let config = ClientConfig::from_file(file.path()).await.unwrap();
        assert_eq!(config.retries, 7);
        assert_eq!(config.backoff_base(), Duration::from_millis(250));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        let missing = ClientConfig::from_file("/nonexistent/piston.yaml").await;
        assert!(matches!(missing, Err(PistonError::Config(_))));
    }

    #[test]
    fn test_limits_apply_only_set_values() {
        let mut body = json!({"language": "ruby"});
        ExecutionLimits::new()
            .run_timeout(3000)
            .compile_memory_limit(-1)
            .apply_to(&mut body);

        assert_eq!(
            body,
            json!({"language": "ruby", "run_timeout": 3000, "compile_memory_limit": -1})
        );
    }
}
