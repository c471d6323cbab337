use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::request::RequestCategory;

const ENV_LOG_LEVEL: &str = "MANDATE_LOG_LEVEL";
const ENV_MAX_CHAIN_DEPTH: &str = "MANDATE_MAX_CHAIN_DEPTH";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub routing: RoutingConfig,
    pub delegation: DelegationConfig,
    pub logging: LoggingConfig,
}

/// Optional per-category candidate-group overrides. Overrides replace the
/// group label for a tier; the tier thresholds themselves are fixed and
/// shared by every category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub capital_expenditure: TierGroupOverrides,
    pub procurement: TierGroupOverrides,
    pub asset_transfer: TierGroupOverrides,
}

impl RoutingConfig {
    pub fn overrides_for(&self, category: RequestCategory) -> &TierGroupOverrides {
        match category {
            RequestCategory::CapitalExpenditure => &self.capital_expenditure,
            RequestCategory::Procurement => &self.procurement,
            RequestCategory::AssetTransfer => &self.asset_transfer,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierGroupOverrides {
    pub tier_1: Option<String>,
    pub tier_2: Option<String>,
    pub tier_3: Option<String>,
    pub tier_4: Option<String>,
}

impl TierGroupOverrides {
    pub fn group_for(&self, tier: u8) -> Option<&str> {
        match tier {
            1 => self.tier_1.as_deref(),
            2 => self.tier_2.as_deref(),
            3 => self.tier_3.as_deref(),
            4 => self.tier_4.as_deref(),
            _ => None,
        }
    }

    fn entries(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("tier_1", self.tier_1.as_deref()),
            ("tier_2", self.tier_2.as_deref()),
            ("tier_3", self.tier_3.as_deref()),
            ("tier_4", self.tier_4.as_deref()),
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegationConfig {
    /// Upper bound on `chain_position`. Off by default so repeated
    /// re-delegation keeps matching the behavior of the live system.
    pub max_chain_depth: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl EngineConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match &options.config_path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) if options.require_file => {
                return Err(ConfigError::MissingConfigFile(path.clone()));
            }
            _ => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        toml::from_str(&raw)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(level) = env::var(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }

        if let Ok(raw) = env::var(ENV_MAX_CHAIN_DEPTH) {
            let depth: u32 = raw.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: ENV_MAX_CHAIN_DEPTH.to_string(),
                value: raw.clone(),
            })?;
            self.delegation.max_chain_depth = Some(depth);
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.delegation.max_chain_depth == Some(0) {
            return Err(ConfigError::Validation(
                "delegation.max_chain_depth must be at least 1 when set".to_string(),
            ));
        }

        for (category, overrides) in [
            ("capital_expenditure", &self.routing.capital_expenditure),
            ("procurement", &self.routing.procurement),
            ("asset_transfer", &self.routing.asset_transfer),
        ] {
            for (tier, group) in overrides.entries() {
                if let Some(group) = group {
                    if group.trim().is_empty() {
                        return Err(ConfigError::Validation(format!(
                            "routing.{category}.{tier} must not be an empty group name"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::{ConfigError, EngineConfig, LoadOptions, LogFormat};
    use crate::domain::request::RequestCategory;

    #[test]
    fn defaults_have_no_overrides_and_no_depth_guard() {
        let config = EngineConfig::default();
        assert!(config.delegation.max_chain_depth.is_none());
        assert!(config.routing.procurement.group_for(2).is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn parses_category_overrides_and_depth_guard_from_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            [routing.procurement]
            tier_2 = "procurement_leads"

            [delegation]
            max_chain_depth = 5

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .expect("config should parse");

        assert_eq!(
            config.routing.overrides_for(RequestCategory::Procurement).group_for(2),
            Some("procurement_leads")
        );
        assert!(config.routing.overrides_for(RequestCategory::CapitalExpenditure)
            .group_for(2)
            .is_none());
        assert_eq!(config.delegation.max_chain_depth, Some(5));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn zero_chain_depth_fails_validation() {
        let mut config = EngineConfig::default();
        config.delegation.max_chain_depth = Some(0);
        let error = config.validate().expect_err("zero depth should be rejected");
        assert!(matches!(error, ConfigError::Validation(_)));
    }

    #[test]
    fn empty_override_group_fails_validation() {
        let mut config = EngineConfig::default();
        config.routing.asset_transfer.tier_4 = Some("  ".to_string());
        let error = config.validate().expect_err("blank group should be rejected");
        assert!(matches!(error, ConfigError::Validation(_)));
    }

    #[test]
    fn invalid_depth_env_override_is_rejected() {
        env::set_var("MANDATE_MAX_CHAIN_DEPTH", "not-a-number");
        let result = EngineConfig::load(LoadOptions::default());
        env::remove_var("MANDATE_MAX_CHAIN_DEPTH");

        assert!(matches!(result, Err(ConfigError::InvalidEnvOverride { .. })));
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let options = LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            require_file: true,
        };
        assert!(matches!(
            EngineConfig::load(options),
            Err(ConfigError::MissingConfigFile(_))
        ));
    }
}
