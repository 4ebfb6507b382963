//! Environment configuration.

use chrono::format::{Item, StrftimeItems};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::document::format::{DigitGrouping, FormatConfig};
use crate::document::render::PageLayout;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

/// Where generated documents are shared.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    /// Files are written under `dir` and served from `/files`.
    Local {
        dir: PathBuf,
        public_base_url: String,
    },
    Supabase(SupabaseConfig),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub storage: StorageConfig,
    /// Folder inside the storage backend that receives generated PDFs.
    pub documents_folder: String,
    pub typst_bin: String,
    pub format: FormatConfig,
    pub layout: PageLayout,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let database_url = require("DATABASE_URL")?;
        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let backend = get("STORAGE_BACKEND").unwrap_or_else(|| "local".to_string());
        let storage = match backend.trim().to_ascii_lowercase().as_str() {
            "local" => StorageConfig::Local {
                dir: PathBuf::from(
                    get("LOCAL_STORAGE_DIR").unwrap_or_else(|| "./generated".to_string()),
                ),
                public_base_url: get("PUBLIC_BASE_URL")
                    .unwrap_or_else(|| format!("http://{}/files", bind_addr))
                    .trim_end_matches('/')
                    .to_string(),
            },
            "supabase" => StorageConfig::Supabase(SupabaseConfig {
                url: require("SUPABASE_URL")?.trim_end_matches('/').to_string(),
                service_key: require("SUPABASE_SERVICE_KEY")?,
                bucket: require("BUCKET_NAME")?,
            }),
            _ => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: backend,
                })
            }
        };

        let mut format = FormatConfig::default();
        if let Some(symbol) = lookup("CURRENCY_SYMBOL") {
            format.currency_symbol = symbol;
        }
        if let Some(value) = get("DIGIT_GROUPING") {
            format.grouping = DigitGrouping::from_str(&value).ok_or(ConfigError::Invalid {
                name: "DIGIT_GROUPING",
                value,
            })?;
        }
        if let Some(value) = get("DATE_FORMAT") {
            if StrftimeItems::new(&value).any(|item| matches!(item, Item::Error)) {
                return Err(ConfigError::Invalid {
                    name: "DATE_FORMAT",
                    value,
                });
            }
            format.date_format = value;
        }

        let mut layout = PageLayout::default();
        if let Some(value) = get("BLANK_TOP_MARGIN_CM") {
            layout.blank_top_margin_cm = value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or(ConfigError::Invalid {
                    name: "BLANK_TOP_MARGIN_CM",
                    value,
                })?;
        }

        Ok(Self {
            database_url,
            bind_addr,
            storage,
            documents_folder: get("DOCUMENTS_FOLDER")
                .unwrap_or_else(|| "documents".to_string())
                .trim_matches('/')
                .to_string(),
            typst_bin: get("TYPST_BIN").unwrap_or_else(|| "typst".to_string()),
            format,
            layout,
        })
    }
}
