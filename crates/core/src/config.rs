use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    pub model: ModelConfig,
    pub upstream: UpstreamConfig,
    pub insights: InsightsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed browser origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model_path: String,
    pub scaler_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub stats_base_url: String,
    pub live_base_url: String,
    pub season: String,
    pub timeout_secs: u64,
    pub standings_ttl_secs: u64,
    pub season_stats_ttl_secs: u64,
    pub scoreboard_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Bearer token for the text-generation API. Absent selects the static generator.
    pub api_key: Option<String>,
    pub api_url: String,
    /// PEM bundle trusted in addition to the system roots.
    pub ca_bundle: Option<String>,
    pub timeout_secs: u64,
    pub max_output_tokens: u32,
    pub temperature: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
                "http://localhost:3003".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:3001".to_string(),
                "http://127.0.0.1:3003".to_string(),
            ],
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: "data/raw_nba_dataset.csv".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: "models/lstm_points_model.json".to_string(),
            scaler_path: "models/minmax_scaler.json".to_string(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            stats_base_url: "https://stats.nba.com/stats".to_string(),
            live_base_url: "https://stats.nba.com/stats".to_string(),
            season: "2025-26".to_string(),
            timeout_secs: 10,
            standings_ttl_secs: 15 * 60,
            season_stats_ttl_secs: 15 * 60,
            scoreboard_ttl_secs: 60,
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.generative.googleapis.com/v1/models/gemini-1.0:generate"
                .to_string(),
            ca_bundle: None,
            timeout_secs: 10,
            max_output_tokens: 256,
            temperature: 0.2,
        }
    }
}

impl InsightsConfig {
    /// Returns the API key when one is configured and non-blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl ServerConfig {
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
