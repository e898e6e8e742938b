use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

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
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use site_link_audit::config::load_config;
///
/// let config = load_config(Path::new("audit.toml")).unwrap();
/// println!("Max pages: {}", config.crawl.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Reads and parses a configuration file without validating it
///
/// Used when command-line overrides are applied before validation.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(sha256_hex(content.as_bytes()))
}

/// Loads a configuration and returns both the config and its file hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Hashes the effective configuration
///
/// Unlike [`compute_config_hash`], this covers command-line overrides too,
/// because the configuration is re-serialized before hashing. The hash is
/// stored with every report so two runs can be told apart.
pub fn config_fingerprint(config: &Config) -> Result<String, ConfigError> {
    let serialized = toml::to_string(config)?;
    Ok(sha256_hex(serialized.as_bytes()))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
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
    fn test_load_valid_config() {
        let config_content = r#"
[crawl]
start-url = "https://example.com/"
max-pages = 40
max-depth = 3
delay-ms = 600
include-subdomains = true
pattern-exclude = "/logout"

[network]
timeout-ms = 5000
respect-robots = false

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"

[output]
database-path = "./test.db"
summary-path = "./summary.md"
screenshots = true
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawl.max_pages, 40);
        assert_eq!(config.crawl.max_depth, 3);
        assert!(config.crawl.include_subdomains);
        assert_eq!(config.crawl.pattern_exclude.as_deref(), Some("/logout"));
        assert_eq!(config.network.timeout_ms, 5000);
        assert!(!config.network.respect_robots);
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
        assert!(config.output.screenshots);
        assert!(config.compare.is_none());
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let file = create_temp_config("[crawl]\nstart-url = \"https://example.com\"\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawl.max_pages, 30);
        assert_eq!(config.crawl.max_links_per_page, 300);
        assert_eq!(config.crawl.max_total_links, 3000);
        assert_eq!(config.crawl.max_depth, 2);
        assert_eq!(config.crawl.delay_ms, 500);
        assert!(config.crawl.same_domain_only);
        assert_eq!(config.network.timeout_ms, 8000);
        assert!(config.network.resolve_links);
    }

    #[test]
    fn test_load_compare_section() {
        let config_content = r#"
[crawl]
start-url = "https://old.example.com/"

[compare]
baseline-url = "https://old.example.com/"
upgraded-url = "https://new.example.com/"
compare-by = "absolute-url"
"#;
        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();
        let compare = config.compare.unwrap();
        assert_eq!(compare.compare_by, crate::config::CompareBy::AbsoluteUrl);
        assert_eq!(compare.upgraded_url, "https://new.example.com/");
    }

    #[test]
    fn test_read_config_skips_validation() {
        let file = create_temp_config(
            r#"
[compare]
baseline-url = "https://old.example.com/"
upgraded-url = "https://new.example.com/"
"#,
        );

        let config = read_config(file.path()).unwrap();
        assert!(config.crawl.start_url.is_empty());
        assert!(config.compare.is_some());
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawl]
start-url = "https://example.com/"
max-pages = 0
"#;
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_fingerprint_tracks_overrides() {
        let mut config = Config::for_start_url("https://example.com/");
        let before = config_fingerprint(&config).unwrap();
        config.crawl.max_pages = 99;
        let after = config_fingerprint(&config).unwrap();

        assert_eq!(before.len(), 64);
        assert_ne!(before, after);
    }
}
