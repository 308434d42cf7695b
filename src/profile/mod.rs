use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::errors::AdvisorError;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilType {
    Clay,
    Sandy,
    Loamy,
    Silt,
    Peat,
}

impl SoilType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Clay => "clay",
            SoilType::Sandy => "sandy",
            SoilType::Loamy => "loamy",
            SoilType::Silt => "silt",
            SoilType::Peat => "peat",
        }
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterAvailability {
    /// Natural water sources
    Abundant,
    /// Irrigation system
    Moderate,
    /// Rainfall dependent
    Limited,
}

impl WaterAvailability {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaterAvailability::Abundant => "abundant",
            WaterAvailability::Moderate => "moderate",
            WaterAvailability::Limited => "limited",
        }
    }
}

impl fmt::Display for WaterAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the farmer told us about their land. One current profile at a
/// time; re-submission replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmProfile {
    pub soil_type: SoilType,
    /// Acres.
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub land_size: f64,
    pub location: String,
    pub water_availability: WaterAvailability,
    #[serde(default)]
    pub previous_crops: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<String>,
}

impl FarmProfile {
    /// Intake-boundary check. Runs before a profile is stored or used.
    pub fn validate(&self) -> Result<(), AdvisorError> {
        if !self.land_size.is_finite() || self.land_size <= 0.0 {
            return Err(AdvisorError::Validation(format!(
                "land size must be a positive number of acres (got {})",
                self.land_size
            )));
        }
        if self.location.trim().is_empty() {
            return Err(AdvisorError::Validation("location is required".into()));
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Issues text, if the farmer gave any that is not blank.
    pub fn current_issues(&self) -> Option<&str> {
        self.issues
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// Profiles written by the web form carry landSize as a string ("2.5").
fn number_or_numeric_string<'de, D>(de: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    match Raw::deserialize(de)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("landSize is not a number: {s:?}"))),
    }
}
