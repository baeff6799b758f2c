//! The CartScribe core: turn a product query into a priced, normalized record.
//!
//! A request builds a prompt ([`prompt`]), makes one model call through the
//! injected [`cartscribe_llm::Generator`], pulls JSON out of the reply
//! ([`extract`]), substitutes synthetic data on any failure ([`fallback`]) and
//! finally cleans up links and ordering ([`normalize`]).  [`Scribe`] wires the
//! steps together and never returns an error for a product flow.

pub mod extract;
pub mod fallback;
pub mod model;
pub mod normalize;
pub mod prompt;
mod service;

pub use extract::{ExtractionError, JsonShape, extract_json};
pub use model::{ComparisonItem, NOT_AVAILABLE, Platform, PlatformOffer, ProductDetail, Suggestion};
pub use normalize::{Category, categorize, normalize, normalize_comparison};
pub use prompt::is_product_url;
pub use service::Scribe;
