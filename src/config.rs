use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_QUOTE_ENDPOINT: &str = "https://dummyjson.com/quotes/random";
pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// How two quotes are judged "the same favorite".
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteMatch {
    /// Content only. Two authors with identical text collide.
    #[default]
    Content,
    ContentAndAuthor,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub quote_endpoint: String,
    pub translate_endpoint: String,
    pub source_language: String,
    pub target_language: String,
    /// Where the key/value store lives. `None` means the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub favorite_match: FavoriteMatch,
    /// Probe the quote endpoint before every fetch.
    pub preflight_probe: bool,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            quote_endpoint: DEFAULT_QUOTE_ENDPOINT.to_string(),
            translate_endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            source_language: "en".to_string(),
            target_language: "fa".to_string(),
            data_dir: None,
            favorite_match: FavoriteMatch::Content,
            preflight_probe: false,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Resolves the store directory, falling back to `<data dir>/quotebook`
    /// and finally to `./quotebook-data` when the platform has no data dir.
    pub fn store_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        match dirs::data_dir() {
            Some(base) => base.join("quotebook"),
            None => PathBuf::from("quotebook-data"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("Failed to parse {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

/// Loads `file_path`. A missing file yields the compiled-in defaults.
pub fn load_config_from_file(file_path: &Path) -> Result<Config, ConfigError> {
    let path_display = file_path.display().to_string();
    let contents = match fs::read_to_string(file_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("{} not found, using built-in defaults", path_display);
            return Ok(Config::default());
        }
        Err(e) => return Err(ConfigError::Read { path: path_display, source: e }),
    };
    parse_config(&contents).map_err(|e| ConfigError::Parse { path: path_display, source: e })
}

pub fn parse_config(contents: &str) -> Result<Config, toml::de::Error> {
    let config: Config = toml::from_str(contents)?;
    if config.request_timeout_secs == 0 {
        warn!("request_timeout_secs = 0 is not usable, treating it as 1");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config = parse_config("target_language = \"de\"\npreflight_probe = true\n").unwrap();
        assert_eq!(config.target_language, "de");
        assert!(config.preflight_probe);
        assert_eq!(config.quote_endpoint, DEFAULT_QUOTE_ENDPOINT);
        assert_eq!(config.favorite_match, FavoriteMatch::Content);
    }

    #[test]
    fn favorite_match_is_snake_case() {
        let config = parse_config("favorite_match = \"content_and_author\"").unwrap();
        assert_eq!(config.favorite_match, FavoriteMatch::ContentAndAuthor);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "request_timeout_secs = \"soon\"").unwrap();
        match load_config_from_file(&path) {
            Err(ConfigError::Parse { .. }) => {}
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn explicit_data_dir_wins() {
        let config = Config { data_dir: Some(PathBuf::from("/tmp/qb")), ..Config::default() };
        assert_eq!(config.store_dir(), PathBuf::from("/tmp/qb"));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }
}
