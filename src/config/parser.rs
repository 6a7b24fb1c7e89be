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
/// use lemma_search::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Snippet interval: {}", config.search.snippet_interval);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a crawl can be tied to the configuration it ran with.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok((Config, String))` - Successfully loaded configuration and its hash
/// * `Err(ConfigError)` - Failed to load or parse the configuration
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
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

    const VALID_CONFIG: &str = r#"
[crawler]
fetch-workers = 2
batch-size = 100
comfortable-batch-size = 20

[search]
word-rank-limit = 50
snippet-interval = 40

[storage]
database-path = "./test.db"

[morphology]
dictionary-path = "./dict.opcorpora.txt"

[[sites]]
url = "https://lenta.ru"
name = "Лента.ру"

[[sites]]
url = "https://skillbox.ru"
name = "Skillbox"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.fetch_workers, Some(2));
        assert_eq!(config.crawler.batch_size, 100);
        assert_eq!(config.search.word_rank_limit, 50);
        assert_eq!(config.search.snippet_interval, 40);
        assert_eq!(config.sites.len(), 2);
        assert_eq!(config.sites[0].name, "Лента.ру");
    }

    #[test]
    fn test_defaults_applied() {
        let config_content = r#"
[storage]
database-path = "./test.db"

[morphology]
dictionary-path = "./dict.opcorpora.txt"

[[sites]]
url = "https://lenta.ru"
name = "Lenta"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.fetch_workers, None);
        assert_eq!(config.crawler.batch_size, 200);
        assert_eq!(config.crawler.comfortable_batch_size, 50);
        assert_eq!(config.crawler.initial_fetch_delay_ms, 400);
        assert_eq!(config.crawler.site_time_budget_secs, 2400);
        assert!(config.user_agent.agents.is_empty());
        assert_eq!(
            config.morphology.dictionary_path.as_deref(),
            Some("./dict.opcorpora.txt")
        );
    }

    #[test]
    fn test_missing_dictionary_rejected() {
        let config_content = r#"
[storage]
database-path = "./test.db"

[[sites]]
url = "https://lenta.ru"
name = "Lenta"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
batch-size = 0

[storage]
database-path = "./test.db"

[[sites]]
url = "https://lenta.ru"
name = "Lenta"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_config_with_hash() {
        let file = create_temp_config(VALID_CONFIG);
        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.sites.len(), 2);
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }

    #[test]
    fn test_config_hash_follows_content() {
        let first = create_temp_config(VALID_CONFIG);
        let same = create_temp_config(VALID_CONFIG);
        let edited = create_temp_config(&VALID_CONFIG.replace("fetch-workers = 2", "fetch-workers = 4"));

        let hash = compute_config_hash(first.path()).unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, compute_config_hash(same.path()).unwrap());
        assert_ne!(hash, compute_config_hash(edited.path()).unwrap());
    }
}
