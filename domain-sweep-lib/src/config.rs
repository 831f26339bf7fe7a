//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files, reading the
//! `DS_*` environment variables and merging configurations with proper
//! precedence rules.

use crate::error::DomainSweepError;
use crate::types::{FailurePolicy, SweepConfig, TimeoutPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// batch_size = 50
/// idle_timeout = "5s"
/// on_failure = "skip"
///
/// [inputs]
/// tlds = "domain_extensions.csv"
/// prices = "tld_prices.csv"
///
/// [output]
/// ledger = "ws_domain_status.csv"
/// priced = "priced.csv"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for sweep options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Status service connection settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceFileConfig>,

    /// Input table locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<InputsConfig>,

    /// Output file locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Idle timeout (as string, e.g., "5", "2.5s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<DurationValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_tlds: Option<bool>,

    /// Connection failure policy ("fail-fast" or "skip")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<String>,

    /// Partial-base policy ("discard" or "sidecar")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_timeout: Option<String>,
}

/// Status service settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<DurationValue>,
}

/// Input table paths.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tlds: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<PathBuf>,
}

/// Output file paths.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priced: Option<PathBuf>,
}

/// A duration written either as a bare number of seconds or as a string.
///
/// `idle_timeout = 5`, `idle_timeout = 2.5` and `idle_timeout = "500ms"` are
/// all accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(f64),
    Text(String),
}

impl DurationValue {
    pub fn to_duration(&self) -> Option<Duration> {
        match self {
            DurationValue::Seconds(secs) => seconds_to_duration(*secs),
            DurationValue::Text(text) => parse_duration_string(text),
        }
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which config files were found
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if parsing or validation fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainSweepError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainSweepError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainSweepError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DomainSweepError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;
        debug!(path = %path.display(), "loaded configuration file");

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest, then the home directory, then the current
    /// directory. Files that fail to load are reported and ignored.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainSweepError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring configuration file"),
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            for (i, path) in loaded_files.iter().enumerate() {
                let status = if i == loaded_files.len() - 1 {
                    "highest precedence"
                } else {
                    "overridden where set above"
                };
                info!(path = %path.display(), status, "configuration file");
            }
        }

        Ok(merged_config)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./domain-sweep.toml", "./.domain-sweep.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".domain-sweep.toml", "domain-sweep.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-sweep").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values set in `higher` win.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: merge_section(lower.defaults, higher.defaults, |lower, higher| {
                DefaultsConfig {
                    batch_size: higher.batch_size.or(lower.batch_size),
                    idle_timeout: higher.idle_timeout.or(lower.idle_timeout),
                    no_tlds: higher.no_tlds.or(lower.no_tlds),
                    on_failure: higher.on_failure.or(lower.on_failure),
                    on_timeout: higher.on_timeout.or(lower.on_timeout),
                }
            }),
            service: merge_section(lower.service, higher.service, |lower, higher| {
                ServiceFileConfig {
                    url: higher.url.or(lower.url),
                    origin: higher.origin.or(lower.origin),
                    user_agent: higher.user_agent.or(lower.user_agent),
                    connect_timeout: higher.connect_timeout.or(lower.connect_timeout),
                }
            }),
            inputs: merge_section(lower.inputs, higher.inputs, |lower, higher| InputsConfig {
                tlds: higher.tlds.or(lower.tlds),
                prices: higher.prices.or(lower.prices),
                categories: higher.categories.or(lower.categories),
            }),
            output: merge_section(lower.output, higher.output, |lower, higher| OutputConfig {
                ledger: higher.ledger.or(lower.ledger),
                available: higher.available.or(lower.available),
                priced: higher.priced.or(lower.priced),
            }),
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainSweepError> {
        if let Some(defaults) = &config.defaults {
            if defaults.batch_size == Some(0) {
                return Err(DomainSweepError::config("batch_size must be at least 1"));
            }

            if let Some(timeout) = &defaults.idle_timeout {
                if timeout.to_duration().is_none() {
                    return Err(DomainSweepError::config(format!(
                        "Invalid idle_timeout {:?}. Use a positive value like 5, '2.5s' or '500ms'",
                        timeout
                    )));
                }
            }

            if let Some(policy) = &defaults.on_failure {
                policy
                    .parse::<FailurePolicy>()
                    .map_err(DomainSweepError::config)?;
            }

            if let Some(policy) = &defaults.on_timeout {
                policy
                    .parse::<TimeoutPolicy>()
                    .map_err(DomainSweepError::config)?;
            }
        }

        if let Some(service) = &config.service {
            if let Some(url) = &service.url {
                if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                    return Err(DomainSweepError::config(format!(
                        "Service URL '{}' must start with ws:// or wss://",
                        url
                    )));
                }
            }

            if let Some(timeout) = &service.connect_timeout {
                if timeout.to_duration().is_none() {
                    return Err(DomainSweepError::config(format!(
                        "Invalid connect_timeout {:?}",
                        timeout
                    )));
                }
            }
        }

        Ok(())
    }
}

fn merge_section<T>(lower: Option<T>, higher: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (lower, higher) {
        (Some(lower), Some(higher)) => Some(merge(lower, higher)),
        (lower, higher) => higher.or(lower),
    }
}

impl FileConfig {
    /// Apply the file's settings on top of `config`.
    ///
    /// Values were validated when the file was loaded.
    pub fn apply_to(&self, mut config: SweepConfig) -> SweepConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(batch_size) = defaults.batch_size {
                config = config.with_batch_size(batch_size);
            }
            if let Some(timeout) = defaults.idle_timeout.as_ref().and_then(DurationValue::to_duration) {
                config = config.with_idle_timeout(timeout);
            }
            if let Some(no_tlds) = defaults.no_tlds {
                config = config.with_no_tlds(no_tlds);
            }
            if let Some(Ok(policy)) = defaults.on_failure.as_deref().map(str::parse::<FailurePolicy>) {
                config = config.with_failure_policy(policy);
            }
            if let Some(Ok(policy)) = defaults.on_timeout.as_deref().map(str::parse::<TimeoutPolicy>) {
                config = config.with_timeout_policy(policy);
            }
        }

        if let Some(service) = &self.service {
            if let Some(url) = &service.url {
                config.service.url = url.clone();
            }
            if let Some(origin) = &service.origin {
                config.service.origin = origin.clone();
            }
            if let Some(user_agent) = &service.user_agent {
                config.service.user_agent = user_agent.clone();
            }
            if let Some(timeout) = service.connect_timeout.as_ref().and_then(DurationValue::to_duration) {
                config.service.connect_timeout = timeout;
            }
        }

        if let Some(output) = &self.output {
            if let Some(ledger) = &output.ledger {
                config.output.ledger = ledger.clone();
            }
            if let Some(available) = &output.available {
                config.output.available = Some(available.clone());
            }
            if let Some(priced) = &output.priced {
                config.output.priced = Some(priced.clone());
            }
        }

        config
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via DS_* environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub batch_size: Option<usize>,
    pub idle_timeout: Option<Duration>,
    pub no_tlds: Option<bool>,
    pub url: Option<String>,
    pub out: Option<PathBuf>,
    pub available_out: Option<PathBuf>,
    pub priced_out: Option<PathBuf>,
    pub on_failure: Option<FailurePolicy>,
    pub on_timeout: Option<TimeoutPolicy>,
    pub tlds: Option<PathBuf>,
    pub prices: Option<PathBuf>,
    pub categories: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl EnvConfig {
    /// Apply the environment's settings on top of `config`.
    pub fn apply_to(&self, mut config: SweepConfig) -> SweepConfig {
        if let Some(batch_size) = self.batch_size {
            config = config.with_batch_size(batch_size);
        }
        if let Some(timeout) = self.idle_timeout {
            config = config.with_idle_timeout(timeout);
        }
        if let Some(no_tlds) = self.no_tlds {
            config = config.with_no_tlds(no_tlds);
        }
        if let Some(url) = &self.url {
            config = config.with_service_url(url.clone());
        }
        if let Some(out) = &self.out {
            config = config.with_ledger(out.clone());
        }
        if let Some(path) = &self.available_out {
            config = config.with_available_out(path.clone());
        }
        if let Some(path) = &self.priced_out {
            config = config.with_priced_out(path.clone());
        }
        if let Some(policy) = self.on_failure {
            config = config.with_failure_policy(policy);
        }
        if let Some(policy) = self.on_timeout {
            config = config.with_timeout_policy(policy);
        }
        config
    }
}

/// Load configuration from environment variables.
///
/// Parses all DS_* environment variables. Invalid values are logged as
/// warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`], reading variables through `lookup`.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("DS_BATCH_SIZE") {
        match val.trim().parse::<usize>() {
            Ok(size) if size > 0 => env_config.batch_size = Some(size),
            _ => warn!(value = %val, "invalid DS_BATCH_SIZE, must be a positive integer"),
        }
    }

    if let Some(val) = lookup("DS_IDLE_TIMEOUT") {
        match parse_duration_string(&val) {
            Some(timeout) => env_config.idle_timeout = Some(timeout),
            None => warn!(value = %val, "invalid DS_IDLE_TIMEOUT, use a value like 5, 2.5s or 500ms"),
        }
    }

    if let Some(val) = lookup("DS_NO_TLDS") {
        match parse_bool(&val) {
            Some(flag) => env_config.no_tlds = Some(flag),
            None => warn!(value = %val, "invalid DS_NO_TLDS, use true/false"),
        }
    }

    if let Some(val) = lookup("DS_URL") {
        let url = val.trim();
        if url.starts_with("ws://") || url.starts_with("wss://") {
            env_config.url = Some(url.to_string());
        } else if !url.is_empty() {
            warn!(value = %val, "invalid DS_URL, must start with ws:// or wss://");
        }
    }

    if let Some(val) = lookup("DS_ON_FAILURE") {
        match val.parse::<FailurePolicy>() {
            Ok(policy) => env_config.on_failure = Some(policy),
            Err(e) => warn!("invalid DS_ON_FAILURE: {}", e),
        }
    }

    if let Some(val) = lookup("DS_ON_TIMEOUT") {
        match val.parse::<TimeoutPolicy>() {
            Ok(policy) => env_config.on_timeout = Some(policy),
            Err(e) => warn!("invalid DS_ON_TIMEOUT: {}", e),
        }
    }

    env_config.out = path_var(&lookup, "DS_OUT");
    env_config.available_out = path_var(&lookup, "DS_AVAILABLE_OUT");
    env_config.priced_out = path_var(&lookup, "DS_PRICED_OUT");
    env_config.tlds = path_var(&lookup, "DS_TLDS");
    env_config.prices = path_var(&lookup, "DS_PRICES");
    env_config.categories = path_var(&lookup, "DS_CATEGORIES");
    env_config.config = path_var(&lookup, "DS_CONFIG");

    env_config
}

fn path_var<F>(lookup: &F, key: &str) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
        .map(|val| {
            debug!(key, value = %val, "using environment path");
            PathBuf::from(val)
        })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a duration like "5", "5.0", "2.5s", "500ms" or "2m".
///
/// A bare number is seconds. Zero, negative and non-finite values are
/// rejected.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    let (number, scale) = if let Some(ms) = value.strip_suffix("ms") {
        (ms, 0.001)
    } else if let Some(s) = value.strip_suffix('s') {
        (s, 1.0)
    } else if let Some(m) = value.strip_suffix('m') {
        (m, 60.0)
    } else {
        (value.as_str(), 1.0)
    };

    let number: f64 = number.trim().parse().ok()?;
    seconds_to_duration(number * scale)
}

fn seconds_to_duration(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_duration_string() {
        assert_eq!(parse_duration_string("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration_string("5.0"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration_string("2.5s"), Some(Duration::from_millis(2500)));
        assert_eq!(parse_duration_string("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration_string("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration_string("0"), None);
        assert_eq!(parse_duration_string("-1"), None);
        assert_eq!(parse_duration_string("soon"), None);
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(
            r#"
[defaults]
batch_size = 25
idle_timeout = 2.5
on_failure = "skip"

[service]
url = "ws://127.0.0.1:9000/ws"

[inputs]
prices = "tld_prices.csv"

[output]
ledger = "out/status.csv"
available = "out/available.csv"
"#,
        );

        let config = ConfigManager::new(false).load_file(file.path()).unwrap();
        let sweep = config.apply_to(SweepConfig::default());

        assert_eq!(sweep.batch_size, 25);
        assert_eq!(sweep.idle_timeout, Duration::from_millis(2500));
        assert_eq!(sweep.failure_policy, FailurePolicy::SkipAndContinue);
        assert_eq!(sweep.timeout_policy, TimeoutPolicy::Discard);
        assert_eq!(sweep.service.url, "ws://127.0.0.1:9000/ws");
        assert_eq!(sweep.output.ledger, PathBuf::from("out/status.csv"));
        assert_eq!(sweep.output.available, Some(PathBuf::from("out/available.csv")));
        assert_eq!(
            config.inputs.unwrap().prices,
            Some(PathBuf::from("tld_prices.csv"))
        );
    }

    #[test]
    fn test_string_durations_in_config() {
        let file = write_config("[defaults]\nidle_timeout = \"750ms\"\n");
        let config = ConfigManager::new(false).load_file(file.path()).unwrap();
        assert_eq!(
            config.apply_to(SweepConfig::default()).idle_timeout,
            Duration::from_millis(750)
        );
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let manager = ConfigManager::new(false);
        for content in [
            "[defaults]\nbatch_size = 0\n",
            "[defaults]\nidle_timeout = \"later\"\n",
            "[defaults]\nidle_timeout = 0\n",
            "[defaults]\non_failure = \"retry\"\n",
            "[defaults]\non_timeout = \"keep\"\n",
            "[service]\nurl = \"https://example.com\"\n",
            "not toml at all [",
        ] {
            let file = write_config(content);
            assert!(manager.load_file(file.path()).is_err(), "accepted: {}", content);
        }
    }

    #[test]
    fn test_missing_config_file() {
        let err = ConfigManager::new(false)
            .load_file("/nonexistent/domain-sweep.toml")
            .unwrap_err();
        assert!(matches!(err, DomainSweepError::FileError { .. }));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                batch_size: Some(10),
                on_failure: Some("skip".to_string()),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                ledger: Some(PathBuf::from("lower.csv")),
                ..Default::default()
            }),
            ..Default::default()
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                batch_size: Some(25),
                ..Default::default()
            }),
            inputs: Some(InputsConfig {
                tlds: Some(PathBuf::from("tlds.csv")),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();

        assert_eq!(defaults.batch_size, Some(25)); // Higher wins
        assert_eq!(defaults.on_failure, Some("skip".to_string())); // Lower preserved
        assert_eq!(merged.output.unwrap().ledger, Some(PathBuf::from("lower.csv")));
        assert_eq!(merged.inputs.unwrap().tlds, Some(PathBuf::from("tlds.csv")));
    }

    #[test]
    fn test_env_config() {
        let vars: HashMap<&str, &str> = [
            ("DS_BATCH_SIZE", "20"),
            ("DS_IDLE_TIMEOUT", "1.5s"),
            ("DS_NO_TLDS", "yes"),
            ("DS_ON_TIMEOUT", "sidecar"),
            ("DS_OUT", " results.csv "),
            ("DS_PRICES", "prices.csv"),
            ("DS_AVAILABLE_OUT", ""),
        ]
        .into_iter()
        .collect();

        let env_config = load_env_config_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env_config.batch_size, Some(20));
        assert_eq!(env_config.idle_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(env_config.no_tlds, Some(true));
        assert_eq!(env_config.on_timeout, Some(TimeoutPolicy::Sidecar));
        assert_eq!(env_config.prices, Some(PathBuf::from("prices.csv")));
        assert_eq!(env_config.available_out, None);

        let sweep = env_config.apply_to(SweepConfig::default());
        assert_eq!(sweep.batch_size, 20);
        assert!(sweep.no_tlds);
        assert_eq!(sweep.output.ledger, PathBuf::from("results.csv"));
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let vars: HashMap<&str, &str> = [
            ("DS_BATCH_SIZE", "0"),
            ("DS_IDLE_TIMEOUT", "forever"),
            ("DS_NO_TLDS", "maybe"),
            ("DS_URL", "http://example.com"),
            ("DS_ON_FAILURE", "retry"),
        ]
        .into_iter()
        .collect();

        let env_config = load_env_config_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env_config.batch_size, None);
        assert_eq!(env_config.idle_timeout, None);
        assert_eq!(env_config.no_tlds, None);
        assert_eq!(env_config.url, None);
        assert_eq!(env_config.on_failure, None);
    }
}
