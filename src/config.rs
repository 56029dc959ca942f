//! Process configuration
//!
//! Credentials and cache location come from the environment.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::api::DEFAULT_PAGE_SIZE;
use crate::client::Credentials;

pub const ENV_CLIENT_ID: &str = "GPHOTO_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "GPHOTO_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "GPHOTO_REFRESH_TOKEN";
pub const ENV_ACCESS_TOKEN: &str = "GPHOTO_ACCESS_TOKEN";
pub const ENV_DB_PATH: &str = "GPHOTO_DB_PATH";
pub const ENV_PAGE_SIZE: &str = "GPHOTO_PAGE_SIZE";

/// Cache file name inside the cache directory
const DB_FILE_NAME: &str = "gphoto.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Photo cache file
    pub db_path: PathBuf,
    /// Media items per search page
    pub page_size: u32,
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let required = [ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_REFRESH_TOKEN];
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(anyhow!(
                "Missing required environment variables: {}",
                missing.join(", ")
            ));
        }

        let page_size = match get(ENV_PAGE_SIZE) {
            Some(value) => value
                .parse::<u32>()
                .with_context(|| format!("Invalid {}: {}", ENV_PAGE_SIZE, value))?,
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            credentials: Credentials {
                client_id: get(ENV_CLIENT_ID).unwrap_or_default(),
                client_secret: get(ENV_CLIENT_SECRET).unwrap_or_default(),
                refresh_token: get(ENV_REFRESH_TOKEN).unwrap_or_default(),
                access_token: get(ENV_ACCESS_TOKEN).unwrap_or_default(),
            },
            db_path: get(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            page_size,
        })
    }
}

/// `<cache dir>/gphoto-cache/gphoto.db`
pub fn default_db_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("gphoto-cache")
        .join(DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_required_only() {
        let config = Config::from_lookup(lookup(&[
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_REFRESH_TOKEN, "refresh"),
        ]))
        .unwrap();

        assert_eq!(config.credentials.client_id, "id");
        assert_eq!(config.credentials.refresh_token, "refresh");
        assert_eq!(config.credentials.access_token, "");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.db_path.ends_with("gphoto-cache/gphoto.db"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_REFRESH_TOKEN, "refresh"),
            (ENV_ACCESS_TOKEN, "seeded"),
            (ENV_DB_PATH, "/var/cache/photos.db"),
            (ENV_PAGE_SIZE, "25"),
        ]))
        .unwrap();

        assert_eq!(config.credentials.access_token, "seeded");
        assert_eq!(config.db_path, PathBuf::from("/var/cache/photos.db"));
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn test_missing_reported_together() {
        let err = Config::from_lookup(lookup(&[(ENV_CLIENT_ID, "id"), (ENV_REFRESH_TOKEN, "")]))
            .unwrap_err()
            .to_string();

        assert!(err.contains(ENV_CLIENT_SECRET));
        assert!(err.contains(ENV_REFRESH_TOKEN));
        assert!(!err.contains(ENV_CLIENT_ID));
    }

    #[test]
    fn test_invalid_page_size() {
        let result = Config::from_lookup(lookup(&[
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_REFRESH_TOKEN, "refresh"),
            (ENV_PAGE_SIZE, "lots"),
        ]));

        assert!(result.is_err());
    }
}
