use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::StatError;

pub const CONFIG_FILE_NAME: &str = "statee.json";
pub const DEFAULT_BASE_URL: &str = "http://pub.stat.ee/px-web.2001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub root_categories: Option<Vec<String>>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Extra headers sent with the download POST.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders(Vec<(String, String)>);

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        match self
            .0
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.0.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_header_map(&self) -> Result<HeaderMap, StatError> {
        let mut map = HeaderMap::new();
        for (name, value) in self.iter() {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| StatError::InvalidHeader(name.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| StatError::InvalidHeader(format!("{name}: {value}")))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub root_categories: Vec<String>,
    pub headers: RequestHeaders,
    pub timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            root_categories: default_root_categories(),
            headers: default_headers(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl PortalConfig {
    pub fn tree_script_url(&self, category: &str) -> String {
        format!("{}/Database/{}/databasetreeNodes.js", self.base_url, category)
    }

    pub fn listing_url(&self, locator: &str) -> String {
        format!(
            "{}/Database/{}",
            self.base_url,
            locator.trim_start_matches('/')
        )
    }

    pub fn download_url(&self) -> String {
        format!("{}/Dialog/Saveshow.asp", self.base_url)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist. Without one, `./statee.json` and then the
    /// per-user config file are tried before falling back to defaults.
    pub fn resolve(path: Option<&str>) -> Result<PortalConfig, StatError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::discover(),
        };

        let Some(config_path) = config_path else {
            tracing::debug!("no config file found, using defaults");
            return Self::resolve_config(Config::default());
        };

        Self::resolve_file(&config_path)
    }

    pub fn resolve_file(config_path: &Path) -> Result<PortalConfig, StatError> {
        let content = fs::read_to_string(config_path)
            .map_err(|_| StatError::ConfigRead(config_path.to_path_buf()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| StatError::ConfigParse(err.to_string()))?;
        tracing::debug!(path = %config_path.display(), "loaded config");

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<PortalConfig, StatError> {
        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if base_url.is_empty() {
            return Err(StatError::ConfigParse("base_url must not be empty".to_string()));
        }

        let root_categories = config
            .root_categories
            .unwrap_or_else(default_root_categories)
            .into_iter()
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty())
            .collect::<Vec<_>>();
        if root_categories.is_empty() {
            return Err(StatError::ConfigParse(
                "root_categories must name at least one category".to_string(),
            ));
        }

        let timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(StatError::ConfigParse(
                "timeout_secs must be positive".to_string(),
            ));
        }

        let mut headers = default_headers();
        for (name, value) in config.headers.unwrap_or_default() {
            headers.insert(&name, &value);
        }
        headers.to_header_map()?;

        Ok(PortalConfig {
            base_url,
            root_categories,
            headers,
            timeout_secs,
        })
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("ee", "stat", "statee")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }
}

pub fn default_root_categories() -> Vec<String> {
    vec![
        "Majandus".to_string(),
        "Keskkond".to_string(),
        "Rahvastik".to_string(),
        "Sotsiaalelu".to_string(),
    ]
}

pub fn default_headers() -> RequestHeaders {
    RequestHeaders::new().with(
        "User-Agent",
        &format!("statee/{}", env!("CARGO_PKG_VERSION")),
    )
}
