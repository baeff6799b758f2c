//! Request flows: prompt, one model call, extraction, fallback, clean-up.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use cartscribe_llm::{GenerationError, Generator};

use crate::extract::{ExtractionError, JsonShape, extract_as};
use crate::fallback::{
    generate_mock_comparison, generate_mock_product, generate_mock_suggestions,
    unconfigured_comparison, unconfigured_product, unconfigured_suggestions,
};
use crate::model::{ComparisonItem, ProductDetail, Suggestion};
use crate::normalize::{categorize, normalize, normalize_comparison};
use crate::prompt::{build_compare_prompt, build_product_prompt, build_suggestion_prompt, is_product_url};

/// Either way a model round-trip can fail.  Never leaves this module.
#[derive(Debug, Error)]
enum Failure {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Shared entry point for the product, compare and suggestion flows.
///
/// Cheap to share behind an `Arc`: it holds no per-request state.
pub struct Scribe {
    generator: Arc<dyn Generator>,
    mock_seed: Option<u64>,
}

impl Scribe {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            mock_seed: None,
        }
    }

    /// Seed the fallback generator so mock records are reproducible.
    pub fn with_mock_seed(mut self, seed: Option<u64>) -> Self {
        self.mock_seed = seed;
        self
    }

    pub fn generator_label(&self) -> String {
        self.generator.label()
    }

    fn mock_rng(&self) -> StdRng {
        match self.mock_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    async fn ask<T: DeserializeOwned>(&self, prompt: &str, shape: JsonShape) -> Result<T, Failure> {
        let raw = self.generator.generate(prompt).await?;
        debug!(chars = raw.len(), %shape, "model replied");
        Ok(extract_as(&raw, shape)?)
    }

    /// Product page record for a name or a pasted link.  Always returns a
    /// record with all five platforms, cheapest first.
    pub async fn product_detail(&self, query: &str) -> ProductDetail {
        let category = categorize(query);
        let is_url = is_product_url(query);
        if !self.generator.is_configured() {
            debug!(query, "no model configured; serving demo product");
            return normalize(unconfigured_product(query, is_url, category));
        }
        let prompt = build_product_prompt(query, is_url);

        let mut detail = match self.ask::<ProductDetail>(&prompt, JsonShape::Object).await {
            Ok(detail) => {
                info!(query, name = %detail.name, "product details generated");
                detail
            }
            Err(err) => {
                warn!(query, %err, "product generation failed; using mock data");
                generate_mock_product(query, category, &mut self.mock_rng())
            }
        };
        detail.category = category.to_string();
        normalize(detail)
    }

    /// Candidates matching free-text requirements, cheapest first.
    pub async fn comparison(&self, requirements: &str) -> Vec<ComparisonItem> {
        if !self.generator.is_configured() {
            return normalize_comparison(unconfigured_comparison());
        }
        let prompt = build_compare_prompt(requirements);

        let items = match self.ask::<Vec<ComparisonItem>>(&prompt, JsonShape::Array).await {
            Ok(items) => {
                info!(items = items.len(), "comparison generated");
                items
            }
            Err(err) => {
                warn!(%err, "comparison generation failed; using mock data");
                generate_mock_comparison(requirements)
            }
        };
        normalize_comparison(items)
    }

    pub async fn suggestions(&self, query: &str) -> Vec<Suggestion> {
        if !self.generator.is_configured() {
            return unconfigured_suggestions(query);
        }
        let prompt = build_suggestion_prompt(query);

        match self.ask::<Vec<Suggestion>>(&prompt, JsonShape::Array).await {
            Ok(suggestions) => {
                info!(query, items = suggestions.len(), "suggestions generated");
                suggestions
            }
            Err(err) => {
                warn!(query, %err, "suggestion generation failed; using mock data");
                generate_mock_suggestions(query)
            }
        }
    }

    /// Diagnostic round-trip.  Unlike the product flows this reports failure.
    pub async fn ping(&self) -> Result<String, GenerationError> {
        self.generator.generate("Say 'API is alive'").await
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::model::{NOT_AVAILABLE, Platform};
    use crate::normalize::platform_price;

    /// Replays one canned outcome and records the prompts it saw.
    struct FakeGenerator {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(reason.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(GenerationError::NotConfigured)
        }

        fn label(&self) -> String {
            "fake".to_string()
        }
    }

    fn assert_well_formed(detail: &ProductDetail) {
        assert_eq!(detail.platforms.len(), 5);
        for platform in Platform::ALL {
            assert_eq!(
                detail.platforms.iter().filter(|o| o.name == platform.name()).count(),
                1
            );
        }
        for offer in &detail.platforms {
            assert_eq!(offer.price == NOT_AVAILABLE, offer.deal == NOT_AVAILABLE);
        }
        let keys = detail
            .platforms
            .iter()
            .map(|o| platform_price(&o.price))
            .collect::<Vec<_>>();
        assert!(keys.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    // ── product_detail ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn product_detail_uses_model_output() {
        let generator = FakeGenerator::replying(
            r#"Sure! Here is the analysis:
```json
{"name": "Nike Air Max 270", "description": "Cushioned.", "category": "Footwear",
 "specifications": ["Mesh upper"], "features": ["Air unit"], "uses": ["Running"],
 "rating_value": "4.4", "rating_count": "3,100+",
 "platforms": [
   {"name": "Amazon", "price": "₹8,995", "deal": "10% off", "url": "Direct Amazon search link"},
   {"name": "Flipkart", "price": "₹8,499", "deal": "Bank offer", "url": ""},
   {"name": "Myntra", "price": "₹8,799", "deal": "Not Available", "url": "https://www.myntra.com/nike"},
   {"name": "Meesho", "price": "Not Available", "deal": "Not Available", "url": ""},
   {"name": "Ajio", "price": "₹9,100", "deal": "Coupon", "url": ""}
 ],
 "price_analysis": "Flipkart is cheapest."}
```"#,
        );
        let scribe = Scribe::new(generator.clone());
        let detail = scribe.product_detail("red running shoe").await;

        assert!(generator.last_prompt().contains("User input: \"red running shoe\""));
        assert_eq!(detail.name, "Nike Air Max 270");
        assert_eq!(detail.category, "fashion");
        assert_eq!(detail.price_analysis, "Flipkart is cheapest.");
        assert_well_formed(&detail);

        let names = detail.platforms.iter().map(|o| o.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Flipkart", "Amazon", "Ajio", "Myntra", "Meesho"]);
        assert_eq!(
            detail.platforms[1].url,
            "https://www.amazon.in/s?k=Nike+Air+Max+270"
        );
        assert_eq!(detail.platforms[3].url, "https://www.myntra.com/nike");
    }

    #[tokio::test]
    async fn product_detail_falls_back_on_generation_error() {
        let scribe = Scribe::new(FakeGenerator::failing("quota exceeded")).with_mock_seed(Some(11));
        let detail = scribe.product_detail("Headphones").await;

        assert_eq!(detail.name, "Headphones");
        assert_eq!(detail.category, "electronics");
        assert_well_formed(&detail);
        let myntra = detail.platforms.last().unwrap();
        assert_eq!(myntra.name, "Myntra");
        assert_eq!(myntra.price, NOT_AVAILABLE);
        assert_eq!(detail.platforms[0].name, "Meesho");
    }

    #[tokio::test]
    async fn product_detail_falls_back_on_unparsable_output() {
        let scribe = Scribe::new(FakeGenerator::replying("I cannot help with that."));
        let detail = scribe.product_detail("granite kitchen table").await;
        assert_eq!(detail.name, "Granite Kitchen Table");
        assert_eq!(detail.category, "home");
        assert_well_formed(&detail);
    }

    #[tokio::test]
    async fn product_detail_falls_back_when_two_objects_are_emitted() {
        let scribe = Scribe::new(FakeGenerator::replying(r#"{"name": "A"} or {"name": "B"}"#));
        let detail = scribe.product_detail("xyz123").await;
        assert_eq!(detail.name, "Xyz123");
        assert_eq!(detail.category, "general");
    }

    #[tokio::test]
    async fn product_detail_repairs_incomplete_platform_lists() {
        let scribe = Scribe::new(FakeGenerator::replying(
            r#"{"name": "Desk Lamp", "platforms": [
                {"name": "amazon", "price": "₹1,299", "deal": "Deal"},
                {"name": "Croma", "price": "₹999", "deal": "Deal"}
            ]}"#,
        ));
        let detail = scribe.product_detail("desk lamp").await;
        assert_well_formed(&detail);
        assert_eq!(detail.platforms[0].name, "Amazon");
        assert_eq!(detail.platforms[0].url, "https://www.amazon.in/s?k=Desk+Lamp");
        assert!(detail.platforms[1..].iter().all(|o| !o.is_available()));
    }

    #[tokio::test]
    async fn seeded_fallback_is_reproducible() {
        let first = Scribe::new(FakeGenerator::failing("down"))
            .with_mock_seed(Some(99))
            .product_detail("Headphones")
            .await;
        let second = Scribe::new(FakeGenerator::failing("down"))
            .with_mock_seed(Some(99))
            .product_detail("Headphones")
            .await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn url_query_switches_prompt_wording() {
        let generator = FakeGenerator::failing("down");
        let scribe = Scribe::new(generator.clone());
        scribe
            .product_detail("https://www.flipkart.com/some-phone/p/itm123")
            .await;
        assert!(generator.last_prompt().contains("deep scribe analysis"));
    }

    // ── comparison ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn comparison_sorts_model_items_with_unparsable_prices_first() {
        let scribe = Scribe::new(FakeGenerator::replying(
            r#"Results: [
                {"name": "ThinkPad E14", "price": 62000, "original_price": "₹62,000", "desc": "Solid.", "rating": 4.4, "img_keyword": "laptop"},
                {"name": "Acer Aspire 7", "price": "₹54,990", "desc": "Value.", "rating": "4.1"},
                {"name": "Mystery Box", "price": "ask seller", "desc": "?", "rating": 3}
            ]"#,
        ));
        let items = scribe.comparison("laptop under 65k").await;
        let names = items.iter().map(|i| i.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Mystery Box", "Acer Aspire 7", "ThinkPad E14"]);
        assert_eq!(items[1].price, 54990.0);
        assert_eq!(items[1].img_keyword, "Acer");
        assert_eq!(items[1].url, "https://www.google.com/search?q=Acer+Aspire+7");
    }

    #[tokio::test]
    async fn comparison_falls_back_and_sorts_mock_items() {
        let scribe = Scribe::new(FakeGenerator::failing("invalid key"));
        let items = scribe.comparison("budget phone").await;
        let prices = items.iter().map(|i| i.price).collect::<Vec<_>>();
        assert_eq!(prices, vec![12000.0, 15000.0, 25000.0]);
        assert_eq!(items[1].name, "Top Match for budget phone");
    }

    #[tokio::test]
    async fn comparison_falls_back_when_items_are_not_objects() {
        let scribe = Scribe::new(FakeGenerator::replying("[1, 2, 3]"));
        let items = scribe.comparison("anything").await;
        assert_eq!(items.len(), 3);
    }

    // ── suggestions + ping ─────────────────────────────────────────────────

    #[tokio::test]
    async fn suggestions_from_model_and_fallback() {
        let scribe = Scribe::new(FakeGenerator::replying(
            r#"[{"name": "Eco Lamp Air", "desc": "Light.", "price": "$49"}]"#,
        ));
        let suggestions = scribe.suggestions("lamp").await;
        assert_eq!(suggestions[0].name, "Eco Lamp Air");

        let scribe = Scribe::new(FakeGenerator::failing("down"));
        let suggestions = scribe.suggestions("lamp").await;
        assert_eq!(suggestions[0].name, "AI Result for lamp");
    }

    #[tokio::test]
    async fn ping_surfaces_generation_errors() {
        let scribe = Scribe::new(FakeGenerator::replying("API is alive"));
        assert_eq!(scribe.ping().await.unwrap(), "API is alive");

        let scribe = Scribe::new(FakeGenerator::failing("no key"));
        assert!(scribe.ping().await.is_err());
        assert_eq!(scribe.generator_label(), "fake");
    }

    // ── mock mode ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn unconfigured_generator_serves_demo_data() {
        let scribe = Scribe::new(Arc::new(cartscribe_llm::Unconfigured::new("no key")));

        let suggestions = scribe.suggestions("Kettle").await;
        assert_eq!(suggestions.len(), 4);
        assert_eq!(suggestions[0].name, "Premium Kettle Pro");

        let items = scribe.comparison("any laptop").await;
        let names = items.iter().map(|item| item.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Budget Option", "Mid-Range Choice", "Premium Pick"]);
        assert!(items.iter().all(|item| item.url.starts_with("https://www.google.com/")));

        let detail = scribe.product_detail("Headphones").await;
        assert_eq!(detail.category, "electronics");
        assert_eq!(detail.platforms[0].name, "Meesho");
        assert_eq!(detail.platforms[0].url, "https://www.meesho.com/search?q=Headphones");
        assert_well_formed(&detail);
    }
}
