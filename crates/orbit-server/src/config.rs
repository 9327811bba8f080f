//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::budget::CategoryCap;

/// Configuration for the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub openai: OpenAiConfig,
    /// Supabase project backing the groceries and tasks tables
    pub supabase: Option<SupabaseConfig>,
    /// Google OAuth credentials for Calendar access
    pub google: Option<GoogleConfig>,
    /// TrueLayer credentials for Open Banking access
    pub truelayer: Option<TrueLayerConfig>,
    pub home_assistant: Option<HomeAssistantConfig>,
    pub budget: BudgetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    /// API key (alternative to the OPENAI_API_KEY environment variable)
    pub api_key: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            temperature: 0.3,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrueLayerConfig {
    /// "sandbox" or "live"
    pub environment: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl Default for TrueLayerConfig {
    fn default() -> Self {
        Self {
            environment: "sandbox".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeAssistantConfig {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub categories: Vec<CategoryCap>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            categories: crate::budget::default_caps(),
        }
    }
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("orbit")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for ORBIT_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("ORBIT_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from an explicit path, or the default location
    pub fn load(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(Self::config_path);
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Get the OpenAI API key, checking config then env
    pub fn openai_api_key(&self) -> Option<String> {
        if let Some(key) = &self.openai.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("OPENAI_API_KEY").ok()
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# orbit-server configuration file
# Place at ~/.config/orbit/config.toml, or point ORBIT_CONFIG_PATH at it

[server]
host = "0.0.0.0"
port = 8000

[openai]
model = "gpt-4o-mini"
temperature = 0.3
# api_key = "sk-..."   # or set OPENAI_API_KEY

# [supabase]
# url = "https://xyzcompany.supabase.co"
# service_key = "..."

# [google]
# client_id = "..."
# client_secret = "..."
# refresh_token = "..."

# [truelayer]
# environment = "sandbox"
# client_id = "..."
# client_secret = "..."
# refresh_token = "..."

# [home_assistant]
# base_url = "http://homeassistant.local:8123"
# token = "..."

# [[budget.categories]]
# name = "Food"
# cap = 140.0
"#
}
