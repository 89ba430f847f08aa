//! Soft economy tunables loaded from the embedded JSON asset.
use serde::{Deserialize, Serialize};

const DEFAULT_ECONOMY_DATA: &str = include_str!("../assets/economy.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EconomyConfig {
    #[serde(default)]
    pub distraction: DistractionCfg,
    #[serde(default)]
    pub eligibility: EligibilityCfg,
    #[serde(default)]
    pub projection: ProjectionCfg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionCfg {
    #[serde(default = "default_allowance")]
    pub default_allowance_minutes: u32,
    /// Fraction of the allowance at which status turns to a warning.
    #[serde(default = "default_warning_ratio")]
    pub warning_ratio: f64,
}

impl Default for DistractionCfg {
    fn default() -> Self {
        Self {
            default_allowance_minutes: default_allowance(),
            warning_ratio: default_warning_ratio(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityCfg {
    #[serde(default = "default_eligibility_minutes")]
    pub productive_minutes_required: u32,
}

impl Default for EligibilityCfg {
    fn default() -> Self {
        Self {
            productive_minutes_required: default_eligibility_minutes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionCfg {
    #[serde(default = "default_age")]
    pub default_age: i32,
    #[serde(default = "default_life_expectancy")]
    pub life_expectancy_years: i32,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_leisure_limit")]
    pub daily_leisure_limit_hours: f64,
    #[serde(default = "default_critical_years")]
    pub critical_years: f64,
    #[serde(default = "default_warning_years")]
    pub warning_years: f64,
}

impl Default for ProjectionCfg {
    fn default() -> Self {
        Self {
            default_age: default_age(),
            life_expectancy_years: default_life_expectancy(),
            lookback_days: default_lookback_days(),
            daily_leisure_limit_hours: default_leisure_limit(),
            critical_years: default_critical_years(),
            warning_years: default_warning_years(),
        }
    }
}

impl EconomyConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_ECONOMY_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn default_config() -> Self {
        Self::load_from_static()
    }
}

const fn default_allowance() -> u32 {
    60
}

const fn default_warning_ratio() -> f64 {
    0.8
}

const fn default_eligibility_minutes() -> u32 {
    120
}

const fn default_age() -> i32 {
    25
}

const fn default_life_expectancy() -> i32 {
    80
}

const fn default_lookback_days() -> u32 {
    7
}

const fn default_leisure_limit() -> f64 {
    1.0
}

const fn default_critical_years() -> f64 {
    5.0
}

const fn default_warning_years() -> f64 {
    2.0
}
