use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transcript provider settings
    pub transcript: TranscriptConfig,

    /// Model probe settings
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// YouTube origin (overridable for testing)
    pub base_url: String,

    /// Language requested when none is given on the command line
    pub default_language: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Accept-Language header; keeps the watch page markup stable
    pub accept_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Generative-language API root
    pub base_url: String,

    /// Key-value file holding the API key
    pub env_file: PathBuf,

    /// Key looked up in the env file
    pub key_name: String,

    /// Models sent the test prompt, in order
    pub models: Vec<String>,

    /// Fixed test prompt
    pub prompt: String,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            default_language: "ko".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US".to_string(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            env_file: PathBuf::from(".env.local"),
            key_name: "GEMINI_API_KEY".to_string(),
            models: vec![
                "gemini-3-flash-preview".to_string(),
                "gemini-3-pro-preview".to_string(),
            ],
            prompt: "Hello! Are you working?".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, or fall back to defaults.
    ///
    /// Nothing is written back: both tools must leave the filesystem untouched.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        // Current directory wins for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("transcript-tools").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.transcript.base_url)
            .context("Invalid transcript.base_url")?;
        validate_base_url(&self.probe.base_url)
            .context("Invalid probe.base_url")?;

        if self.transcript.default_language.trim().is_empty() {
            anyhow::bail!("transcript.default_language must not be empty");
        }

        if self.probe.models.is_empty() {
            anyhow::bail!("probe.models must list at least one model");
        }

        if self.probe.key_name.is_empty() || self.probe.key_name.contains('=') {
            anyhow::bail!("probe.key_name must be a non-empty name without '='");
        }

        Ok(())
    }
}

fn validate_base_url(raw: &str) -> Result<()> {
    let parsed = Url::parse(raw)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", raw))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(())
}
