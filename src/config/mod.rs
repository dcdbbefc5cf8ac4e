//! Configuration for the fathom crawler
//!
//! Configuration is optional: every knob has a default matching the CLI
//! defaults, and a TOML file can override them. Command-line positional
//! arguments in turn override whatever the file provided.

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
}

/// Concurrency limits for one crawler instance
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent page downloads
    pub downloaders: usize,

    /// Maximum number of concurrent link extractions
    pub extractors: usize,

    /// Maximum number of concurrent downloads per origin host
    #[serde(rename = "per-host")]
    pub per_host: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            downloaders: 1,
            extractors: 1,
            per_host: 2,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Overall per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("fathom/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates concurrency limits
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    for (name, value) in [
        ("downloaders", config.downloaders),
        ("extractors", config.extractors),
        ("per-host", config.per_host),
    ] {
        if value < 1 || value > 1024 {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 1024, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> ConfigResult<()> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.crawler.downloaders, 1);
        assert_eq!(config.crawler.extractors, 1);
        assert_eq!(config.crawler.per_host, 2);
        assert_eq!(config.http.request_timeout_secs, 30);
        assert!(config.http.user_agent.starts_with("fathom/"));
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
downloaders = 16
extractors = 8
per-host = 4

[http]
user-agent = "TestCrawler/1.0"
request-timeout-secs = 5
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.downloaders, 16);
        assert_eq!(config.crawler.extractors, 8);
        assert_eq!(config.crawler.per_host, 4);
        assert_eq!(config.http.user_agent, "TestCrawler/1.0");
        assert_eq!(config.http.request_timeout_secs, 5);
        // Unset keys keep their defaults
        assert_eq!(config.http.connect_timeout_secs, 10);
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.crawler.downloaders, 1);
        assert_eq!(config.crawler.per_host, 2);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_downloaders_rejected() {
        let config_content = r#"
[crawler]
downloaders = 0
"#;
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let config_content = r#"
[http]
user-agent = ""
"#;
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
