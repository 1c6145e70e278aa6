use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::defaults::{
    DEFAULT_ASSISTANT_LABEL, DEFAULT_MODEL, DEFAULT_USER_AGENT, DEFAULT_USER_LABEL,
    GEMINI_API_BASE,
};

/// Environment variable holding the Gemini credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub model: ModelConfig,
    pub session: SessionConfig,
    pub web: WebConfig,
    pub files: FilesConfig,
    pub output: OutputConfig,
    pub persona: PersonaConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelConfig {
    pub name: String,
    pub api_base: String,
    /// Used only when `GEMINI_API_KEY` is absent from the environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    pub chats_dir: String,
    pub system_prompt_file: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WebConfig {
    pub timeout_secs: f64,
    pub max_content_chars: usize,
    pub max_links: usize,
    pub user_agent: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilesConfig {
    pub uploads_enabled: bool,
    pub drop_dir: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub use_colors: bool,
    pub history_limit: usize,
    pub offer_links: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PersonaConfig {
    pub user_label: String,
    pub assistant_label: String,
}

impl WebConfig {
    /// Page fetch timeout; must be a finite, non-negative number of seconds.
    pub fn timeout(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.timeout_secs)
            .with_context(|| format!("web.timeout_secs = {} is not a valid timeout", self.timeout_secs))
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path_static()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let settings: Settings = toml::from_str(&content)
                .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
            settings
                .web
                .timeout()
                .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
            Ok(settings)
        } else {
            // Return default settings if config doesn't exist
            Ok(Self::default())
        }
    }

    pub fn get_config_path(&self) -> Result<PathBuf> {
        Self::get_config_path_static()
    }

    /// Root of everything ayre keeps on disk (`~/.ayre`).
    pub fn data_dir() -> Result<PathBuf> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;

        Ok(home_dir.join(".ayre"))
    }

    fn get_config_path_static() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("config.toml"))
    }

    pub fn chats_dir(&self) -> PathBuf {
        expand_home(&self.session.chats_dir)
    }

    pub fn system_prompt_path(&self) -> PathBuf {
        expand_home(&self.session.system_prompt_file)
    }

    pub fn drop_dir(&self) -> PathBuf {
        expand_home(&self.files.drop_dir)
    }

    /// Resolves the API key: environment first, then the config file.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                self.model
                    .api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty())
            })
    }
}

/// Expands a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                name: DEFAULT_MODEL.to_string(),
                api_base: GEMINI_API_BASE.to_string(),
                api_key: None,
            },
            session: SessionConfig {
                chats_dir: "~/.ayre/chats".to_string(),
                system_prompt_file: "~/.ayre/system_prompt.txt".to_string(),
            },
            web: WebConfig {
                timeout_secs: 10.0,
                max_content_chars: 5000,
                max_links: 10,
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            files: FilesConfig {
                uploads_enabled: false,
                drop_dir: "~/.ayre/drop".to_string(),
            },
            output: OutputConfig {
                use_colors: true,
                history_limit: 10,
                offer_links: true,
            },
            persona: PersonaConfig {
                user_label: DEFAULT_USER_LABEL.to_string(),
                assistant_label: DEFAULT_ASSISTANT_LABEL.to_string(),
            },
        }
    }
}
