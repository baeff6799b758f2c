//! Records exchanged between the model, the fallback generator and callers.
//!
//! Deserialization is deliberately lenient: model output routinely mixes
//! numbers and strings, so scalar text fields accept either.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::normalize::comparison_price;

/// Price/deal marker for a platform that does not carry the product.
pub const NOT_AVAILABLE: &str = "Not Available";

/// The retail destinations every product record lists, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Amazon,
    Flipkart,
    Myntra,
    Meesho,
    Ajio,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Amazon,
        Platform::Flipkart,
        Platform::Myntra,
        Platform::Meesho,
        Platform::Ajio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Amazon => "Amazon",
            Platform::Flipkart => "Flipkart",
            Platform::Myntra => "Myntra",
            Platform::Meesho => "Meesho",
            Platform::Ajio => "Ajio",
        }
    }

    /// Case-insensitive lookup, ignoring surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|platform| platform.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformOffer {
    pub name: String,
    /// Formatted amount such as `₹4,999`, or [`NOT_AVAILABLE`].
    #[serde(deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(deserialize_with = "lenient_string")]
    pub deal: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
}

impl PlatformOffer {
    pub fn unavailable(platform: Platform, url: impl Into<String>) -> Self {
        Self {
            name: platform.name().to_string(),
            price: NOT_AVAILABLE.to_string(),
            deal: NOT_AVAILABLE.to_string(),
            url: url.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.price != NOT_AVAILABLE && self.deal != NOT_AVAILABLE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDetail {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub category: String,
    pub specifications: Vec<String>,
    pub features: Vec<String>,
    pub uses: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub rating_value: String,
    #[serde(deserialize_with = "lenient_string")]
    pub rating_count: String,
    #[serde(deserialize_with = "lenient_string")]
    pub image_keywords: String,
    pub platforms: Vec<PlatformOffer>,
    #[serde(deserialize_with = "lenient_string")]
    pub price_analysis: String,
}

/// One candidate in a requirements-driven comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonItem {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    /// Lowest price found, in rupees.  Unparsable input becomes `0.0`.
    #[serde(deserialize_with = "lenient_price")]
    pub price: f64,
    #[serde(deserialize_with = "lenient_string")]
    pub original_price: String,
    #[serde(deserialize_with = "lenient_string")]
    pub desc: String,
    /// Clamped to `0.0..=5.0`.
    #[serde(deserialize_with = "lenient_rating")]
    pub rating: f64,
    #[serde(deserialize_with = "lenient_string")]
    pub img_keyword: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
}

/// A quick search-box suggestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Suggestion {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub desc: String,
    #[serde(deserialize_with = "lenient_string")]
    pub price: String,
}

// ── lenient field decoders ───────────────────────────────────────────────────

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    })
}

fn lenient_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(comparison_price(&Value::deserialize(deserializer)?))
}

fn lenient_rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let rating = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => leading_number(&text),
        _ => 0.0,
    };
    Ok(rating.clamp(0.0, 5.0))
}

/// Numeric prefix of `text` ("4.5 out of 5" reads as 4.5), or 0.
fn leading_number(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().unwrap_or(0.0)
}
