use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, path::PathBuf, str::FromStr};

use crate::constants::{
    DEFAULT_HISTORY_PAGE_SIZE, DEFAULT_INITIAL_PAGE_SIZE, DEFAULT_JPEG_QUALITY, MAX_PAGE_SIZE,
};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,

    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    #[serde(default)]
    pub public_base_url: Option<String>,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: f32,

    #[serde(default = "default_initial_page_size")]
    pub initial_page_size: u32,

    #[serde(default = "default_history_page_size")]
    pub history_page_size: u32,

    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default = "default_true")]
    pub profile_complete: bool,

    #[serde(default)]
    pub log_json: bool,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Scan-Ingest".to_string()
}
fn default_storage_root() -> PathBuf {
    PathBuf::from("data/storage")
}
fn default_scratch_dir() -> PathBuf {
    env::temp_dir().join("scan_ingest")
}
fn default_jpeg_quality() -> f32 {
    DEFAULT_JPEG_QUALITY
}
fn default_initial_page_size() -> u32 {
    DEFAULT_INITIAL_PAGE_SIZE
}
fn default_history_page_size() -> u32 {
    DEFAULT_HISTORY_PAGE_SIZE
}
fn default_user_id() -> String {
    "local-user".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            storage_root: default_storage_root(),
            scratch_dir: default_scratch_dir(),
            public_base_url: None,
            jpeg_quality: default_jpeg_quality(),
            initial_page_size: default_initial_page_size(),
            history_page_size: default_history_page_size(),
            user_id: default_user_id(),
            display_name: None,
            email: None,
            profile_complete: true,
            log_json: false,
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("SCAN_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid SCAN_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(Environment::with_prefix("SCAN").prefix_separator("_").try_parsing(true).ignore_empty(true));

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            errors.push("JPEG_QUALITY must be in (0, 1]".to_string());
        }
        if self.initial_page_size == 0 || self.initial_page_size > MAX_PAGE_SIZE {
            errors.push(format!("INITIAL_PAGE_SIZE must be between 1 and {}", MAX_PAGE_SIZE));
        }
        if self.history_page_size == 0 || self.history_page_size > MAX_PAGE_SIZE {
            errors.push(format!("HISTORY_PAGE_SIZE must be between 1 and {}", MAX_PAGE_SIZE));
        }
        if self.user_id.trim().is_empty() {
            errors.push("USER_ID cannot be empty".to_string());
        }
        if let Some(base) = &self.public_base_url {
            if url::Url::parse(base).is_err() {
                errors.push(format!("PUBLIC_BASE_URL is not a valid URL: {}", base));
            }
        }
        if self.is_production() && self.public_base_url.is_none() {
            errors.push("PUBLIC_BASE_URL is required in production".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self {
            None => "[MISSING]",
            Some(_) => "[REDACTED]",
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("storage_root", &self.storage_root)
            .field("scratch_dir", &self.scratch_dir)
            .field("public_base_url", &self.public_base_url)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("initial_page_size", &self.initial_page_size)
            .field("history_page_size", &self.history_page_size)
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .field("email", &self.email.redact())
            .field("profile_complete", &self.profile_complete)
            .field("log_json", &self.log_json)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!(AppEnvironment::from_str("Production").unwrap(), AppEnvironment::Production);
        assert!(AppEnvironment::from_str("staging").is_err());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_collects_every_problem() {
        let config = AppConfig {
            jpeg_quality: 1.5,
            history_page_size: 0,
            ..AppConfig::default()
        };
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("JPEG_QUALITY"));
        assert!(message.contains("HISTORY_PAGE_SIZE"));
    }

    #[test]
    fn production_requires_public_url() {
        let config = AppConfig {
            env: AppEnvironment::Production,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_email() {
        let config = AppConfig {
            email: Some("jane@example.com".into()),
            ..AppConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("jane@example.com"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
