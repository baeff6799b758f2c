//! Pull a JSON value out of free-form model text.
//!
//! The span runs from the FIRST opening bracket of the requested shape to the
//! LAST closing bracket anywhere after it.  Brackets are not balanced, so two
//! separate JSON blocks in one reply are captured together and fail to parse.
//! The product flows rely on that failure to fall back to mock data.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl JsonShape {
    fn brackets(self) -> (char, char) {
        match self {
            JsonShape::Array => ('[', ']'),
            JsonShape::Object => ('{', '}'),
        }
    }
}

impl fmt::Display for JsonShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonShape::Array => f.write_str("array"),
            JsonShape::Object => f.write_str("object"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no JSON {0} found in model output")]
    NoSpan(JsonShape),
    #[error("extracted span is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("JSON does not match the expected record shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// The greedy first-open to last-close substring, if there is one.
pub fn extraction_span(raw_text: &str, shape: JsonShape) -> Option<&str> {
    let (open, close) = shape.brackets();
    let start = raw_text.find(open)?;
    let end = raw_text.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&raw_text[start..=end])
}

pub fn extract_json(raw_text: &str, shape: JsonShape) -> Result<Value, ExtractionError> {
    let span = extraction_span(raw_text, shape).ok_or(ExtractionError::NoSpan(shape))?;
    serde_json::from_str(span).map_err(ExtractionError::InvalidJson)
}

/// [`extract_json`] followed by decoding into `T`.
pub fn extract_as<T: DeserializeOwned>(raw_text: &str, shape: JsonShape) -> Result<T, ExtractionError> {
    let value = extract_json(raw_text, shape)?;
    serde_json::from_value(value).map_err(ExtractionError::Shape)
}

// ── Tests ────────────────────────────────────────────────────────────────────
