//! Turns raw model text into data the UI can always render.
//!
//! The model is asked for a strict JSON shape but nothing here assumes it
//! complied. Suggestions are decoded field by field with explicit defaults;
//! anything that cannot be decoded at all becomes a fixed fallback record.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::wire::{CropSuggestion, OrganicGuide, Sunlight, WaterNeeds};

/// Reply shown in chat when the provider call fails.
pub const CHAT_APOLOGY: &str =
    "Namaste! 🙏 Sorry, I'm having some trouble right now. Please ask your question again in a moment.";

pub const FALLBACK_NAME: &str = "Unable to get suggestions";
pub const FALLBACK_DESCRIPTION: &str =
    "There was an error processing the AI response. Please try again later.";

const DEFAULT_NAME: &str = "Unknown Crop";
const DEFAULT_TEMPERATURE: &str = "N/A";
const DEFAULT_DESCRIPTION: &str = "No description available";

/// Result of the decode step, before any per-field defaulting.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A non-empty JSON array. Elements are unchecked.
    Records(Vec<Value>),
    /// Why the payload was rejected.
    Malformed(String),
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"```[A-Za-z]*[ \t]*\r?\n?|\r?\n?```").expect("fence pattern is valid")
    })
}

/// Remove markdown code fences (```` ```json ```` … ```` ``` ````) the model
/// may have wrapped around its payload.
pub fn strip_code_fences(raw: &str) -> String {
    fence_re().replace_all(raw, "").trim().to_string()
}

pub fn decode(raw: &str) -> Decoded {
    let text = strip_code_fences(raw);

    // Strict: prose around an array is not searched.
    let parsed = match serde_json::from_str::<Value>(&text) {
        Ok(v) => v,
        Err(e) => return Decoded::Malformed(format!("not JSON: {e}")),
    };

    match parsed {
        Value::Array(items) if items.is_empty() => Decoded::Malformed("empty array".into()),
        Value::Array(items) => Decoded::Records(items),
        other => Decoded::Malformed(format!("expected an array, got {}", kind_of(&other))),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Never fails and never returns an empty list.
pub fn normalize_suggestions(raw: &str) -> Vec<CropSuggestion> {
    match decode(raw) {
        Decoded::Records(items) => items.iter().map(suggestion_from_value).collect(),
        Decoded::Malformed(reason) => {
            tracing::warn!(%reason, raw = %raw, "failed to decode crop suggestions, using fallback");
            vec![fallback_suggestion()]
        }
    }
}

pub fn fallback_suggestion() -> CropSuggestion {
    CropSuggestion {
        name: FALLBACK_NAME.into(),
        confidence: 0,
        water_needs: WaterNeeds::Medium,
        sunlight: Sunlight::FullSun,
        temperature: DEFAULT_TEMPERATURE.into(),
        description: FALLBACK_DESCRIPTION.into(),
        organic_guide: OrganicGuide::default(),
    }
}

fn suggestion_from_value(v: &Value) -> CropSuggestion {
    let empty = Map::new();
    let obj = v.as_object().unwrap_or(&empty);

    CropSuggestion {
        name: text_field(obj, "name").unwrap_or_else(|| DEFAULT_NAME.into()),
        confidence: coerce_confidence(obj.get("confidence")),
        water_needs: text_field(obj, "waterNeeds")
            .and_then(|s| WaterNeeds::parse(&s))
            .unwrap_or_default(),
        sunlight: text_field(obj, "sunlight")
            .and_then(|s| Sunlight::parse(&s))
            .unwrap_or_default(),
        temperature: text_field(obj, "temperature").unwrap_or_else(|| DEFAULT_TEMPERATURE.into()),
        description: text_field(obj, "description").unwrap_or_else(|| DEFAULT_DESCRIPTION.into()),
        organic_guide: obj.get("organicGuide").map(guide_from_value).unwrap_or_default(),
    }
}

/// Non-empty text. Numbers are accepted and rendered as text.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers and numeric strings, rounded and clamped to 0..=100; 0 otherwise.
fn coerce_confidence(v: Option<&Value>) -> u8 {
    let n = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => n.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

fn guide_from_value(v: &Value) -> OrganicGuide {
    let Some(obj) = v.as_object() else {
        return OrganicGuide::default();
    };
    OrganicGuide {
        preparation: string_list(obj.get("preparation")),
        planting: string_list(obj.get("planting")),
        maintenance: string_list(obj.get("maintenance")),
        harvesting: string_list(obj.get("harvesting")),
    }
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = v else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// Chat replies are free prose: success passes through untouched, any
/// provider failure becomes [`CHAT_APOLOGY`].
pub fn normalize_chat(result: anyhow::Result<String>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "chat request failed");
            CHAT_APOLOGY.to_string()
        }
    }
}
