//! Engine configuration.
//!
//! All knobs are plain numbers. The engine never reads global state: an
//! [`AnalysisConfig`] is built here (defaults, or a TOML file) and passed
//! explicitly into the services and algorithm functions.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::domain::RiskKind;

/// Numeric knobs consumed by the timing and risk engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum technical break between consecutive blocks, in minutes.
    #[serde(default = "default_min_tech_break_min")]
    pub min_tech_break_min: i64,
    /// Coefficient applied to each equipment complexity score when widening
    /// technical breaks.
    #[serde(default = "default_equipment_complexity")]
    pub equipment_complexity: f64,
    /// Recommended extra buffer between days of a multi-day schedule.
    #[serde(default = "default_multiday_buffer_min")]
    pub multiday_buffer_min: i64,
    #[serde(default = "default_weather_risk_multiplier")]
    pub weather_risk_multiplier: f64,
    #[serde(default = "default_human_risk_multiplier")]
    pub human_risk_multiplier: f64,
    #[serde(default = "default_equipment_risk_multiplier")]
    pub equipment_risk_multiplier: f64,
    /// Base coefficient for complexity-driven risk contributions.
    #[serde(default = "default_equipment_risk_base")]
    pub equipment_risk_base: f64,
}

fn default_min_tech_break_min() -> i64 {
    15
}

fn default_equipment_complexity() -> f64 {
    0.5
}

fn default_multiday_buffer_min() -> i64 {
    30
}

fn default_weather_risk_multiplier() -> f64 {
    1.2
}

fn default_human_risk_multiplier() -> f64 {
    1.1
}

fn default_equipment_risk_multiplier() -> f64 {
    1.3
}

fn default_equipment_risk_base() -> f64 {
    0.05
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_tech_break_min: default_min_tech_break_min(),
            equipment_complexity: default_equipment_complexity(),
            multiday_buffer_min: default_multiday_buffer_min(),
            weather_risk_multiplier: default_weather_risk_multiplier(),
            human_risk_multiplier: default_human_risk_multiplier(),
            equipment_risk_multiplier: default_equipment_risk_multiplier(),
            equipment_risk_base: default_equipment_risk_base(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file with an `[analysis]` table.
    /// Missing keys fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&contents)?;
        Ok(file.analysis)
    }

    /// Multiplier applied to a risk factor of the given kind.
    pub fn risk_multiplier(&self, kind: RiskKind) -> f64 {
        match kind {
            RiskKind::Weather => self.weather_risk_multiplier,
            RiskKind::Human => self.human_risk_multiplier,
            RiskKind::Equipment => self.equipment_risk_multiplier,
            RiskKind::Other => 1.0,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    analysis: AnalysisConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = AnalysisConfig::default();
        assert_eq!(config.min_tech_break_min, 15);
        assert!(config.equipment_risk_base > 0.0);
        assert_eq!(config.risk_multiplier(RiskKind::Other), 1.0);
    }

    #[test]
    fn from_file_reads_partial_tables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[analysis]\nmin_tech_break_min = 20\nweather_risk_multiplier = 2.0"
        )
        .unwrap();

        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.min_tech_break_min, 20);
        assert_eq!(config.weather_risk_multiplier, 2.0);
        // Unlisted keys keep their defaults.
        assert_eq!(config.multiday_buffer_min, 30);
    }

    #[test]
    fn from_file_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis\nmin_tech_break_min = 20").unwrap();

        assert!(matches!(
            AnalysisConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn risk_multipliers_match_kind() {
        let config = AnalysisConfig {
            weather_risk_multiplier: 1.5,
            human_risk_multiplier: 1.25,
            equipment_risk_multiplier: 1.75,
            ..AnalysisConfig::default()
        };
        assert_eq!(config.risk_multiplier(RiskKind::Weather), 1.5);
        assert_eq!(config.risk_multiplier(RiskKind::Human), 1.25);
        assert_eq!(config.risk_multiplier(RiskKind::Equipment), 1.75);
    }
}
