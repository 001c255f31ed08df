// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine and rule configuration
//!
//! Rules never read process-wide state. Everything they may depend on is in
//! the [`RuleConfig`] handed to each invocation.
//!
//! ```yaml
//! region: CAT
//! workers: 4
//! rule_timeout_secs: 10
//! providers: [walls, slabs]
//! thresholds:
//!   door_width_mm: 850
//! ```

use crate::error::{ConfigError, RuleError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

pub const DEFAULT_REGION: &str = "ES";
pub const DEFAULT_RULE_TIMEOUT_SECS: u64 = 30;
const MAX_DEFAULT_WORKERS: usize = 8;

/// Built-in thresholds
///
/// Millimetre values are suffixed `_mm`; U-values are W/(m2.K), loads and
/// bearing capacities kN/m2.
pub const DEFAULT_THRESHOLDS: &[(&str, f64)] = &[
    ("wall_thickness_mm", 100.0),
    ("wall_max_u_value", 0.80),
    ("slab_thickness_min_mm", 100.0),
    ("slab_thickness_max_mm", 200.0),
    ("roof_slab_thickness_min_mm", 200.0),
    ("roof_slab_thickness_max_mm", 350.0),
    ("door_width_mm", 800.0),
    ("window_height_mm", 1200.0),
    ("beam_depth_mm", 200.0),
    ("beam_width_mm", 150.0),
    ("column_min_dim_mm", 250.0),
    ("foundation_min_mm", 300.0),
    ("bearing_beam_min_mm", 300.0),
    ("floor_load_kn_m2", 7.0),
    ("bearing_capacity_kn_m2", 150.0),
];

/// Built-in value of a threshold
pub fn default_threshold(key: &str) -> Option<f64> {
    DEFAULT_THRESHOLDS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| *value)
}

/// Worker count used when none is configured
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}

/// Immutable parameters passed to every rule invocation
#[derive(Clone, Debug, PartialEq)]
pub struct RuleConfig {
    region: String,
    overrides: BTreeMap<String, f64>,
    deadline: Option<Instant>,
}

impl RuleConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into().trim().to_ascii_uppercase(),
            overrides: BTreeMap::new(),
            deadline: None,
        }
    }

    pub fn with_threshold(mut self, key: impl Into<String>, value: f64) -> Self {
        self.overrides.insert(key.into(), value);
        self
    }

    /// Point in time after which the rule must give up
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cooperative cancellation point
    ///
    /// Rules call this once per element so that a rule whose budget ran out
    /// stops instead of running on detached.
    pub fn check_deadline(&self) -> Result<(), RuleError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(RuleError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Region code ("ES", "CAT")
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Configured value, falling back to the built-in default
    ///
    /// Asking for a threshold that has neither is a defect in the rule.
    pub fn threshold(&self, key: &str) -> Result<f64, RuleError> {
        self.overrides
            .get(key)
            .copied()
            .or_else(|| default_threshold(key))
            .ok_or_else(|| RuleError::UnknownThreshold(key.to_string()))
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

/// Engine settings as read from a YAML file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub region: String,
    pub workers: usize,
    pub rule_timeout_secs: u64,
    /// Overrides of [`DEFAULT_THRESHOLDS`]
    pub thresholds: BTreeMap<String, f64>,
    /// Run only these providers (all when absent)
    pub providers: Option<Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            workers: default_workers(),
            rule_timeout_secs: DEFAULT_RULE_TIMEOUT_SECS,
            thresholds: BTreeMap::new(),
            providers: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate YAML
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::invalid("region", "must not be empty"));
        }
        if self.workers == 0 {
            return Err(ConfigError::invalid("workers", "must be at least 1"));
        }
        if self.rule_timeout_secs == 0 {
            return Err(ConfigError::invalid("rule_timeout_secs", "must be at least 1"));
        }
        for (key, value) in &self.thresholds {
            if default_threshold(key).is_none() {
                return Err(ConfigError::UnknownThreshold(key.clone()));
            }
            if !value.is_finite() || *value <= 0.0 {
                return Err(ConfigError::invalid(
                    format!("thresholds.{key}"),
                    format!("{value} is not a positive number"),
                ));
            }
        }
        Ok(())
    }

    pub fn rule_config(&self) -> RuleConfig {
        self.thresholds
            .iter()
            .fold(RuleConfig::new(&self.region), |config, (key, value)| {
                config.with_threshold(key.clone(), *value)
            })
    }

    pub fn rule_timeout(&self) -> Duration {
        Duration::from_secs(self.rule_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_threshold_fallback() {
        let config = RuleConfig::new("es").with_threshold("door_width_mm", 850.0);
        assert_eq!(config.region(), "ES");
        assert_eq!(config.threshold("door_width_mm"), Ok(850.0));
        assert_eq!(config.threshold("beam_depth_mm"), Ok(200.0));
        assert_eq!(
            config.threshold("door_widht_mm"),
            Err(RuleError::UnknownThreshold("door_widht_mm".into()))
        );
    }

    #[test]
    fn test_deadline() {
        let open = RuleConfig::default();
        assert_eq!(open.deadline(), None);
        assert_eq!(open.check_deadline(), Ok(()));

        let later = RuleConfig::default().with_deadline(Instant::now() + Duration::from_secs(60));
        assert_eq!(later.check_deadline(), Ok(()));

        let passed = RuleConfig::default().with_deadline(Instant::now());
        assert_eq!(passed.check_deadline(), Err(RuleError::DeadlineExceeded));
    }

    #[test]
    fn test_yaml_overrides() {
        let config = EngineConfig::from_yaml(
            "region: CAT\nworkers: 2\nthresholds:\n  slab_thickness_max_mm: 250\n",
        )
        .unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.rule_timeout_secs, DEFAULT_RULE_TIMEOUT_SECS);
        assert_eq!(config.providers, None);

        let rules = config.rule_config();
        assert_eq!(rules.region(), "CAT");
        assert_eq!(rules.threshold("slab_thickness_max_mm"), Ok(250.0));
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            EngineConfig::from_yaml("thresholds:\n  door_width: 900\n"),
            Err(ConfigError::UnknownThreshold(key)) if key == "door_width"
        ));
        assert!(matches!(
            EngineConfig::from_yaml("workers: 0\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            EngineConfig::from_yaml("thresholds:\n  door_width_mm: -1\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            EngineConfig::from_yaml("colour: blue\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rule_timeout_secs: 5\nproviders: [walls, slabs]").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.rule_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.providers,
            Some(vec!["walls".to_string(), "slabs".to_string()])
        );

        assert!(matches!(
            EngineConfig::load("/nonexistent/ifcore.yaml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_defaults_are_positive() {
        assert!(DEFAULT_THRESHOLDS.iter().all(|(_, v)| *v > 0.0));
        assert!(default_workers() >= 1);
        assert!(EngineConfig::default().validate().is_ok());
    }
}
