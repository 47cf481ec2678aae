use crate::ai::Language;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub storage: StorageConfig,
    pub invoice: InvoiceConfig,
}

/// Generative endpoint configuration (shared by the portfolio advisor and
/// the invoice extractor)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Falls back to the GEMINI_API_KEY environment variable when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_language")]
    pub language: Language,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Invoice intake configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvoiceConfig {
    /// Line items whose description starts with one of these (case
    /// insensitive) are marked selected.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_language() -> Language {
    Language::En
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_keywords() -> Vec<String> {
    [
        "ВОДООТВЕДЕНИЕ",
        "ГОРЯЧЕЕ В/С",
        "ХОЛОДНОЕ В/С",
        "ЭЛЕКТРОСНАБЖЕНИЕ ОДН",
        "ЭЛЕКТРИЧЕСТВО",
    ]
    .map(String::from)
    .to_vec()
}
fn default_concurrency() -> usize {
    4
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("FINSIGHT").separator("__"))
            .build()?;

        let mut app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|_| AppConfig::default());

        if app_cfg.ai.api_key.is_none() {
            app_cfg.ai.api_key = std::env::var("GEMINI_API_KEY").ok();
        }

        Ok(app_cfg)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai: AiConfig {
                base_url: default_base_url(),
                model: default_model(),
                api_key: None,
                timeout_secs: default_timeout_secs(),
                language: default_language(),
            },
            storage: StorageConfig {
                data_dir: default_data_dir(),
            },
            invoice: InvoiceConfig {
                keywords: default_keywords(),
                concurrency: default_concurrency(),
            },
        }
    }
}
