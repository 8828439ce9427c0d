use reqwest::Url;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SERVER: &str = "http://localhost:8000";
const LOG_FILE_NAME: &str = "library-explorer.log";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid server URL '{url}': {reason}")]
    InvalidServer { url: String, reason: String },

    #[error("unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server base URL, always ending in `/`.
    pub server: Url,
    pub log_path: PathBuf,
}

impl Config {
    pub fn new(server: &str, log_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            server: parse_server(server)?,
            log_path: log_file.unwrap_or_else(default_log_path),
        })
    }
}

fn parse_server(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidServer {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_log_path() -> PathBuf {
    directories::ProjectDirs::from("com", "plex-library", "library-explorer")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir)
        .join(LOG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_is_valid() {
        let config = Config::new(DEFAULT_SERVER, None).unwrap();
        assert_eq!(config.server.as_str(), "http://localhost:8000/");
        assert!(config.log_path.ends_with(LOG_FILE_NAME));
    }

    #[test]
    fn test_server_path_gets_trailing_slash() {
        let config = Config::new("https://media.example/plex?x=1#top", None).unwrap();
        assert_eq!(config.server.as_str(), "https://media.example/plex/");
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = Config::new("ftp://media.example", None).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(ref s) if s == "ftp"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Config::new("not a url", None),
            Err(ConfigError::InvalidServer { .. })
        ));
    }

    #[test]
    fn test_explicit_log_file_wins() {
        let config = Config::new(DEFAULT_SERVER, Some(PathBuf::from("/tmp/explorer.log"))).unwrap();
        assert_eq!(config.log_path, PathBuf::from("/tmp/explorer.log"));
    }
}
