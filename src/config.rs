//! Report service configuration, loaded from the environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

use crate::reports::options::{merge_report_options, validate_margins};
use crate::reports::types::{RenderOptions, ReportOptions};
use crate::reports::ReportError;

const DEFAULT_OUTPUT_DIR: &str = "./generated-reports";
const DEFAULT_FILENAME_PREFIX: &str = "report";
const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// PDF quality tier. Reserved; the browser engine prints at a single quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PdfQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl std::str::FromStr for PdfQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(PdfQuality::Low),
            "medium" => Ok(PdfQuality::Medium),
            "high" => Ok(PdfQuality::High),
            other => Err(format!("expected low, medium or high, got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub output_dir: String,
    pub filename_prefix: String,
    pub include_timestamp: bool,
    /// Write every generated PDF to `output_dir`.
    pub save_to_disk: bool,
    pub quality: PdfQuality,
    /// Printed in the header of every report.
    pub institution_name: String,
    pub default_options: RenderOptions,
    pub settle_delay_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chromium_path: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            include_timestamp: true,
            save_to_disk: false,
            quality: PdfQuality::default(),
            institution_name: String::new(),
            default_options: RenderOptions::default(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            chromium_path: None,
        }
    }
}

impl ReportConfig {
    /// Load from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match lookup("REPORT_OUTPUT_DIR") {
            Some(dir) if !dir.trim().is_empty() => config.output_dir = dir,
            _ => log::info!(
                "REPORT_OUTPUT_DIR not set, using default: {}",
                config.output_dir
            ),
        }
        if let Some(prefix) = lookup("REPORT_FILENAME_PREFIX") {
            config.filename_prefix = prefix;
        }
        if let Some(value) = lookup("REPORT_INCLUDE_TIMESTAMP") {
            config.include_timestamp = parse_bool("REPORT_INCLUDE_TIMESTAMP", &value)?;
        }
        if let Some(value) = lookup("REPORT_SAVE_TO_DISK") {
            config.save_to_disk = parse_bool("REPORT_SAVE_TO_DISK", &value)?;
        }
        if let Some(value) = lookup("REPORT_PDF_QUALITY") {
            config.quality = value.parse().map_err(|reason| ConfigError::Invalid {
                key: "REPORT_PDF_QUALITY".to_string(),
                value: value.clone(),
                reason,
            })?;
        }
        match lookup("REPORT_INSTITUTION_NAME") {
            Some(name) => config.institution_name = name,
            None => log::warn!("REPORT_INSTITUTION_NAME not set, reports will show a placeholder"),
        }
        if let Some(value) = lookup("REPORT_SETTLE_DELAY_MS") {
            config.settle_delay_ms = value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "REPORT_SETTLE_DELAY_MS".to_string(),
                value: value.clone(),
                reason: "expected a whole number of milliseconds".to_string(),
            })?;
        }
        config.chromium_path = lookup("CHROMIUM_PATH").filter(|p| !p.trim().is_empty());

        Ok(config)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Apply a partial update. `default_options` is merged with the same
    /// per-side margin rule as request options. Nothing changes when the
    /// merged margins are not valid lengths.
    pub fn apply(&mut self, update: ReportConfigUpdate) -> Result<(), ReportError> {
        let default_options = match &update.default_options {
            Some(options) => {
                let merged = merge_report_options(Some(options), &self.default_options);
                validate_margins(&merged.margins)?;
                Some(merged)
            }
            None => None,
        };

        if let Some(prefix) = update.filename_prefix {
            self.filename_prefix = prefix;
        }
        if let Some(include) = update.include_timestamp {
            self.include_timestamp = include;
        }
        if let Some(save) = update.save_to_disk {
            self.save_to_disk = save;
        }
        if let Some(quality) = update.quality {
            self.quality = quality;
        }
        if let Some(name) = update.institution_name {
            self.institution_name = name;
        }
        if let Some(options) = default_options {
            self.default_options = options;
        }
        if let Some(delay) = update.settle_delay_ms {
            self.settle_delay_ms = delay;
        }
        Ok(())
    }
}

/// Partial configuration update. The output directory and Chromium path are
/// fixed at startup and cannot be changed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportConfigUpdate {
    #[serde(default)]
    pub filename_prefix: Option<String>,
    #[serde(default)]
    pub include_timestamp: Option<bool>,
    #[serde(default)]
    pub save_to_disk: Option<bool>,
    #[serde(default)]
    pub quality: Option<PdfQuality>,
    #[serde(default)]
    pub institution_name: Option<String>,
    #[serde(default)]
    pub default_options: Option<ReportOptions>,
    #[serde(default)]
    pub settle_delay_ms: Option<u64>,
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::types::{MarginOverrides, Orientation};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ReportConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.default_options.margins.top, "15mm");
        assert_eq!(config.settle_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_reads_variables() {
        let config = ReportConfig::from_lookup(lookup(&[
            ("REPORT_OUTPUT_DIR", "/var/reports"),
            ("REPORT_FILENAME_PREFIX", "school"),
            ("REPORT_INCLUDE_TIMESTAMP", "no"),
            ("REPORT_SAVE_TO_DISK", "1"),
            ("REPORT_PDF_QUALITY", "High"),
            ("REPORT_INSTITUTION_NAME", "វិទ្យាល័យ"),
            ("REPORT_SETTLE_DELAY_MS", "500"),
            ("CHROMIUM_PATH", "/usr/bin/chromium"),
        ]))
        .unwrap();

        assert_eq!(config.output_dir, "/var/reports");
        assert_eq!(config.filename_prefix, "school");
        assert!(!config.include_timestamp);
        assert!(config.save_to_disk);
        assert_eq!(config.quality, PdfQuality::High);
        assert_eq!(config.settle_delay_ms, 500);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
    }

    #[test]
    fn test_malformed_values_are_errors() {
        let err = ReportConfig::from_lookup(lookup(&[("REPORT_SAVE_TO_DISK", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "REPORT_SAVE_TO_DISK"));
        assert!(ReportConfig::from_lookup(lookup(&[("REPORT_SETTLE_DELAY_MS", "2s")])).is_err());
        assert!(ReportConfig::from_lookup(lookup(&[("REPORT_PDF_QUALITY", "ultra")])).is_err());
    }

    #[test]
    fn test_apply_update_merges_default_margins() {
        let mut config = ReportConfig::default();
        config
            .apply(ReportConfigUpdate {
                filename_prefix: Some("card".to_string()),
                default_options: Some(ReportOptions {
                    orientation: Some(Orientation::Landscape),
                    margins: Some(MarginOverrides {
                        bottom: Some("20mm".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.filename_prefix, "card");
        assert_eq!(config.default_options.orientation, Orientation::Landscape);
        assert_eq!(config.default_options.margins.bottom, "20mm");
        assert_eq!(config.default_options.margins.top, "15mm");
        assert!(config.include_timestamp);
    }

    #[test]
    fn test_apply_rejects_bad_margin_and_keeps_config() {
        let mut config = ReportConfig::default();
        let before = config.clone();

        let err = config
            .apply(ReportConfigUpdate {
                filename_prefix: Some("changed".to_string()),
                default_options: Some(ReportOptions {
                    margins: Some(MarginOverrides {
                        left: Some("lots".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(err, ReportError::InvalidOptions(_)));
        assert_eq!(config, before);
    }

    #[test]
    fn test_update_cannot_move_output_dir() {
        let parsed = serde_json::from_value::<ReportConfigUpdate>(serde_json::json!({
            "outputDir": "/etc",
            "saveToDisk": true
        }));
        assert!(parsed.is_err());
    }
}
