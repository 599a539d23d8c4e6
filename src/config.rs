//! Planner configuration

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// How an explicit production goal constrains its item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalPolicy {
    /// Net production must equal the target
    #[default]
    Exact,
    /// Net production must reach at least the target
    AtLeast,
}

/// How power consumption scales with fractional throughput
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerModel {
    /// Whole buildings at full rate plus one overclocked remainder
    #[default]
    Overclock,
    /// Power proportional to throughput
    Linear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub goal_policy: GoalPolicy,
    pub power_model: PowerModel,
    /// Item whose net draw is charged with pumping power
    pub coolant_item: String,
    /// Power of one pump (MW)
    pub pump_power: f64,
    /// Output of one pump (per minute)
    pub pump_rate: f64,
    /// Solved values below this magnitude count as zero
    pub zero_threshold: f64,
    pub round_digits: u32,
    pub relative_gap: f64,
    pub timeout_secs: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            goal_policy: GoalPolicy::Exact,
            power_model: PowerModel::Overclock,
            coolant_item: "Water".to_string(),
            pump_power: 20.0,
            pump_rate: 120.0,
            zero_threshold: 1e-4,
            round_digits: 3,
            relative_gap: 1e-7,
            timeout_secs: None,
        }
    }
}

impl PlannerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.pump_rate > 0.0) {
            bail!("pump_rate must be positive, got {}", self.pump_rate);
        }
        if !(self.pump_power >= 0.0) {
            bail!("pump_power must not be negative, got {}", self.pump_power);
        }
        if !(self.zero_threshold >= 0.0) {
            bail!("zero_threshold must not be negative, got {}", self.zero_threshold);
        }
        if self.round_digits > 9 {
            bail!("round_digits must be at most 9, got {}", self.round_digits);
        }
        if self.coolant_item.trim().is_empty() {
            bail!("coolant_item must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PlannerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.goal_policy, GoalPolicy::Exact);
        assert_eq!(config.power_model, PowerModel::Overclock);
        assert_eq!(config.coolant_item, "Water");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "goal_policy = \"at-least\"").unwrap();
        writeln!(file, "power_model = \"linear\"").unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();

        let config = PlannerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.goal_policy, GoalPolicy::AtLeast);
        assert_eq!(config.power_model, PowerModel::Linear);
        assert_eq!(config.timeout_secs, Some(5));
        assert_eq!(config.pump_rate, 120.0);
        assert_eq!(config.round_digits, 3);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pump_rate = 0.0").unwrap();
        assert!(PlannerConfig::from_file(file.path()).is_err());

        let config = PlannerConfig {
            round_digits: 12,
            ..PlannerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
