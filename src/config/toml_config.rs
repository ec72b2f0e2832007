use crate::core::catalog::{CatalogSettings, DEFAULT_EXERCISE_LIMIT, DEFAULT_IMAGE_BASE_URL};
use crate::core::grading::GradingPolicy;
use crate::core::levels::{LevelSelector, LevelStatus};
use crate::domain::model::LevelType;
use crate::utils::error::{PracticeError, Result};
use crate::utils::validation::{
    validate_dump_path, validate_endpoint, validate_limit, validate_required_field,
    validate_storage_root, validate_timeout, validate_token, Validate,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub blobs: Option<BlobConfig>,
    pub catalog: Option<CatalogConfig>,
    pub grading: Option<GradingConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "dump" (directory or .zip) or "http"
    pub r#type: String,
    pub path: Option<String>,
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// "local" or "http"
    pub r#type: String,
    pub path: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub default_limit: Option<usize>,
    pub image_base_url: Option<String>,
    pub default_level: Option<String>,
    pub disabled_levels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    /// "lenient" or "strict"
    pub mode: Option<String>,
    pub case_sensitive: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "compact" or "json"
    pub format: Option<String>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PracticeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PracticeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Configuration for a local dump when no file is given.
    pub fn for_dump(path: &str) -> Self {
        Self {
            store: StoreConfig {
                r#type: "dump".to_string(),
                path: Some(path.to_string()),
                endpoint: None,
                token: None,
                timeout_seconds: None,
            },
            blobs: None,
            catalog: None,
            grading: None,
            logging: None,
        }
    }

    /// 替換環境變數 (例如 ${CONTENT_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PracticeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        match self.store.r#type.as_str() {
            "dump" => {
                let path = validate_required_field("store.path", &self.store.path)?;
                validate_dump_path("store.path", path)?;
            }
            "http" => {
                let endpoint = validate_required_field("store.endpoint", &self.store.endpoint)?;
                validate_endpoint("store.endpoint", endpoint)?;
                if let Some(token) = &self.store.token {
                    validate_token("store.token", token)?;
                }
            }
            other => {
                return Err(PracticeError::InvalidConfigValueError {
                    field: "store.type".to_string(),
                    value: other.to_string(),
                    reason: "Supported store types: dump, http".to_string(),
                })
            }
        }
        validate_timeout("store.timeout_seconds", self.store_timeout())?;

        if let Some(blobs) = &self.blobs {
            match blobs.r#type.as_str() {
                "local" => {
                    let path = validate_required_field("blobs.path", &blobs.path)?;
                    validate_storage_root("blobs.path", path)?;
                }
                "http" => {
                    let endpoint = validate_required_field("blobs.endpoint", &blobs.endpoint)?;
                    validate_endpoint("blobs.endpoint", endpoint)?;
                }
                other => {
                    return Err(PracticeError::InvalidConfigValueError {
                        field: "blobs.type".to_string(),
                        value: other.to_string(),
                        reason: "Supported blob storage types: local, http".to_string(),
                    })
                }
            }
        }

        if let Some(catalog) = &self.catalog {
            if let Some(limit) = catalog.default_limit {
                validate_limit("catalog.default_limit", limit)?;
            }
            if let Some(url) = &catalog.image_base_url {
                validate_endpoint("catalog.image_base_url", url)?;
            }
            if let Some(level) = &catalog.default_level {
                level.parse::<LevelType>()?;
            }
            for level in catalog.disabled_levels.iter().flatten() {
                level.parse::<LevelType>()?;
            }
        }

        if let Some(mode) = self.grading.as_ref().and_then(|g| g.mode.as_deref()) {
            if !["lenient", "strict"].contains(&mode) {
                return Err(PracticeError::InvalidConfigValueError {
                    field: "grading.mode".to_string(),
                    value: mode.to_string(),
                    reason: "Supported modes: lenient, strict".to_string(),
                });
            }
        }

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(PracticeError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: "Supported formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn store_timeout(&self) -> u64 {
        self.store.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn catalog_settings(&self) -> CatalogSettings {
        let catalog = self.catalog.as_ref();
        CatalogSettings {
            default_limit: catalog
                .and_then(|c| c.default_limit)
                .unwrap_or(DEFAULT_EXERCISE_LIMIT),
            image_base_url: catalog
                .and_then(|c| c.image_base_url.clone())
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
        }
    }

    pub fn grading_policy(&self) -> GradingPolicy {
        let grading = self.grading.as_ref();
        let strict = grading.and_then(|g| g.mode.as_deref()) == Some("strict");
        GradingPolicy {
            strict,
            case_sensitive: grading
                .and_then(|g| g.case_sensitive)
                .unwrap_or(strict),
        }
    }

    /// Level selector seeded with the configured default and disabled levels.
    pub fn level_selector(&self) -> LevelSelector {
        let catalog = self.catalog.as_ref();
        let default_level = catalog
            .and_then(|c| c.default_level.as_deref())
            .and_then(|level| level.parse::<LevelType>().ok())
            .unwrap_or(LevelType::C1);

        let mut selector = LevelSelector::new(default_level);
        let statuses: Vec<LevelStatus> = catalog
            .and_then(|c| c.disabled_levels.as_ref())
            .map(|levels| {
                levels
                    .iter()
                    .map(|id| LevelStatus::from_document(id, &json!({"enabled": false})))
                    .collect()
            })
            .unwrap_or_default();
        selector.apply_statuses(&statuses);
        selector
    }

    pub fn json_logging(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.format.as_deref()) == Some("json")
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
