//! Pipeline configuration.
//!
//! Read from a TOML file given on the command line or through the
//! `CRM_CONFIG` environment variable; every field has a default.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CRM_CONFIG";

/// Longest accepted conversion window, in days.
pub const MAX_CONVERSION_WINDOW_DAYS: i64 = 36_500;

/// What derivation does with a request or quote whose client is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Leave the record out and report it.
    #[default]
    Exclude,
    /// Abort the whole derivation pass.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Window, in days, for the conversion-rate metric.
    pub conversion_window_days: i64,
    pub orphan_policy: OrphanPolicy,
    /// Sample requests pinned to a user-managed stage (request ID → stage ID).
    pub distribution: BTreeMap<String, String>,
    /// Time-limit overrides (stage ID → days).
    pub stage_time_limits: BTreeMap<String, u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let distribution = [("req-1003", "contacted"), ("req-1006", "followup")]
            .into_iter()
            .map(|(request, stage)| (request.to_string(), stage.to_string()))
            .collect();

        Self {
            conversion_window_days: 30,
            orphan_policy: OrphanPolicy::default(),
            distribution,
            stage_time_limits: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document.
    pub fn from_toml(s: &str) -> PipelineResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        debug!(path = %path.display(), "Loading pipeline config");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from an explicit path, else from `CRM_CONFIG`, else defaults.
    pub fn resolve(path: Option<&Path>) -> PipelineResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> PipelineResult<()> {
        if !(1..=MAX_CONVERSION_WINDOW_DAYS).contains(&self.conversion_window_days) {
            return Err(PipelineError::config(format!(
                "conversion_window_days must be between 1 and {}, got {}",
                MAX_CONVERSION_WINDOW_DAYS, self.conversion_window_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.conversion_window_days, 30);
        assert_eq!(config.orphan_policy, OrphanPolicy::Exclude);
        assert_eq!(config.distribution.get("req-1003").map(String::as_str), Some("contacted"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
orphan_policy = "fail"

[stage_time_limits]
contacted = 10
"#,
        )
        .unwrap();
        assert_eq!(config.orphan_policy, OrphanPolicy::Fail);
        assert_eq!(config.conversion_window_days, 30);
        assert_eq!(config.stage_time_limits.get("contacted"), Some(&10));
    }

    #[test]
    fn test_invalid_window_rejected() {
        let err = PipelineConfig::from_toml("conversion_window_days = 0").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(PipelineConfig::from_toml("conversion_window_days = \"x\"").is_err());

        let err = PipelineConfig::from_toml("conversion_window_days = 9223372036854775807").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(PipelineConfig::from_toml("conversion_window_days = 36500").is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "conversion_window_days = 7").unwrap();
        writeln!(file, "[distribution]").unwrap();
        writeln!(file, "req-9 = \"followup\"").unwrap();

        let config = PipelineConfig::resolve(Some(file.path())).unwrap();
        assert_eq!(config.conversion_window_days, 7);
        assert_eq!(config.distribution.len(), 1);
    }
}
