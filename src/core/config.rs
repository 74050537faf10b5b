use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Environment variable that overrides the configured research provider token.
pub const ACCESS_TOKEN_ENV: &str = "FUNDSCOPE_ACCESS_TOKEN";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MfApiProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MorningstarProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

impl MorningstarProviderConfig {
    /// Token from the environment if set, otherwise from the config file.
    /// Blank values count as unset.
    pub fn resolved_access_token(&self) -> Option<String> {
        let non_blank = |t: &String| !t.trim().is_empty();
        std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(non_blank)
            .or_else(|| self.access_token.clone().filter(non_blank))
    }
}

fn default_client_id() -> String {
    "RSIN_SAL".to_string()
}

fn default_morningstar() -> MorningstarProviderConfig {
    MorningstarProviderConfig {
        base_url: "https://api-global.morningstar.com".to_string(),
        access_token: None,
        client_id: default_client_id(),
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub mfapi: Option<MfApiProviderConfig>,
    pub morningstar: Option<MorningstarProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            mfapi: Some(MfApiProviderConfig {
                base_url: "https://api.mfapi.in".to_string(),
            }),
            morningstar: Some(default_morningstar()),
        }
    }
}

/// HTTP behaviour shared by all providers.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RequestConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> usize {
    2
}

impl Default for RequestConfig {
    fn default() -> Self {
        RequestConfig {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub request: RequestConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("in", "fundscope", "fundscope")
            .context("Could not determine project directories")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    /// Location of the fund catalog CSV.
    pub fn catalog_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.catalog_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.data_dir().join("funds.csv"))
    }

    pub fn mfapi_base_url(&self) -> &str {
        self.providers
            .mfapi
            .as_ref()
            .map_or("https://api.mfapi.in", |p| &p.base_url)
    }

    pub fn morningstar(&self) -> MorningstarProviderConfig {
        self.providers
            .morningstar
            .clone()
            .unwrap_or_else(default_morningstar)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
