use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// ========================================
/// Shapes exchanged with the model and the UI
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaterNeeds {
    Low,
    #[default]
    Medium,
    High,
}

impl WaterNeeds {
    /// Case-insensitive match against the labels the model is asked to use.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(WaterNeeds::Low),
            "medium" => Some(WaterNeeds::Medium),
            "high" => Some(WaterNeeds::High),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WaterNeeds::Low => "Low",
            WaterNeeds::Medium => "Medium",
            WaterNeeds::High => "High",
        }
    }
}

impl fmt::Display for WaterNeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sunlight {
    #[default]
    #[serde(rename = "Full Sun")]
    FullSun,
    #[serde(rename = "Partial Shade")]
    PartialShade,
    #[serde(rename = "Full Shade")]
    FullShade,
}

impl Sunlight {
    pub fn parse(s: &str) -> Option<Self> {
        let norm: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "fullsun" => Some(Sunlight::FullSun),
            "partialshade" => Some(Sunlight::PartialShade),
            "fullshade" => Some(Sunlight::FullShade),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sunlight::FullSun => "Full Sun",
            Sunlight::PartialShade => "Partial Shade",
            Sunlight::FullShade => "Full Shade",
        }
    }
}

impl fmt::Display for Sunlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Step-by-step organic cultivation, one list per phase, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrganicGuide {
    pub preparation: Vec<String>,
    pub planting: Vec<String>,
    pub maintenance: Vec<String>,
    pub harvesting: Vec<String>,
}

impl OrganicGuide {
    pub fn phases(&self) -> [(&'static str, &[String]); 4] {
        [
            ("Preparation", self.preparation.as_slice()),
            ("Planting", self.planting.as_slice()),
            ("Maintenance", self.maintenance.as_slice()),
            ("Harvesting", self.harvesting.as_slice()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.phases().iter().all(|(_, steps)| steps.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropSuggestion {
    pub name: String,
    /// 0..=100
    pub confidence: u8,
    pub water_needs: WaterNeeds,
    pub sunlight: Sunlight,
    pub temperature: String,
    pub description: String,
    pub organic_guide: OrganicGuide,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Turn the message belongs to. A bot placeholder and the reply that
    /// replaces it share the id of the user message that triggered them.
    pub id: Uuid,
    pub text: String,
    pub is_bot: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ChatMessage {
    pub fn bot(id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            is_bot: true,
            timestamp: Utc::now(),
            loading: false,
            image_url: None,
        }
    }

    pub fn user(id: Uuid, text: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            id,
            text: text.into(),
            is_bot: false,
            timestamp: Utc::now(),
            loading: false,
            image_url,
        }
    }

    pub fn placeholder(id: Uuid) -> Self {
        Self {
            loading: true,
            ..Self::bot(id, "")
        }
    }
}
