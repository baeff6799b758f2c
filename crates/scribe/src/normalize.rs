//! Presentation clean-up applied to every record before it leaves the crate,
//! whether it came from the model or from the fallback generator.

use std::fmt;

use serde_json::Value;

use crate::model::{ComparisonItem, NOT_AVAILABLE, Platform, PlatformOffer, ProductDetail};

// ── search links ─────────────────────────────────────────────────────────────

/// Search link for `product_name` on the named platform.
///
/// Spaces become `+`; nothing else is escaped.  Platform names are matched
/// case-insensitively and unknown names get a Google search link.
pub fn search_url(platform_name: &str, product_name: &str) -> String {
    let query = product_name.replace(' ', "+");
    match Platform::from_name(platform_name) {
        Some(Platform::Amazon) => format!("https://www.amazon.in/s?k={query}"),
        Some(Platform::Flipkart) => format!("https://www.flipkart.com/search?q={query}"),
        Some(Platform::Myntra) => format!("https://www.myntra.com/{query}"),
        Some(Platform::Meesho) => format!("https://www.meesho.com/search?q={query}"),
        Some(Platform::Ajio) => format!("https://www.ajio.com/search/?text={query}"),
        None => format!("https://www.google.com/search?q={query}"),
    }
}

/// Empty links, bare `#` anchors and template text such as
/// "Direct Amazon search link" all count as missing.
fn is_placeholder_url(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url == "#" || url.to_lowercase().contains("search link")
}

// ── categories ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Fashion,
    Electronics,
    Home,
    Beauty,
    Sports,
    Grocery,
    General,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Fashion => "fashion",
            Category::Electronics => "electronics",
            Category::Home => "home",
            Category::Beauty => "beauty",
            Category::Sports => "sports",
            Category::Grocery => "grocery",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword rules in priority order; the first category with a matching
/// keyword wins.
pub const CATEGORY_RULES: &[(Category, &[&str])] = &[
    (
        Category::Fashion,
        &["shirt", "pant", "dress", "shoe", "wear", "clothing", "watch", "bag", "jewelry"],
    ),
    (
        Category::Electronics,
        &["phone", "laptop", "camera", "tech", "gadget", "electron", "tv", "audio"],
    ),
    (
        Category::Home,
        &["furniture", "decor", "kitchen", "appliance", "bed", "sofa", "table"],
    ),
    (
        Category::Beauty,
        &["serum", "cream", "makeup", "skincare", "perfume", "hair"],
    ),
    (
        Category::Sports,
        &["gym", "yoga", "cycle", "ball", "fitness", "outdoor"],
    ),
    (
        Category::Grocery,
        &["food", "drink", "organic", "snack", "health"],
    ),
];

/// Substring match against the lower-cased query.
pub fn categorize(query: &str) -> Category {
    let query = query.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| query.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

// ── price keys ───────────────────────────────────────────────────────────────

fn numeric_part(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Sort key for a platform offer: the digits of the price, with the sentinel
/// and anything unparsable sorting last.
pub fn platform_price(price: &str) -> f64 {
    if price == NOT_AVAILABLE {
        return f64::INFINITY;
    }
    numeric_part(price).parse().unwrap_or(f64::INFINITY)
}

/// Price of a comparison item as the model emitted it.  Strings are reduced
/// to their digits; anything that does not parse counts as zero.
pub fn comparison_price(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => numeric_part(text).parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

// ── product records ──────────────────────────────────────────────────────────

/// Make the offer list contain each platform exactly once.
///
/// Unknown names are dropped, names are canonicalized, the first offer for a
/// platform wins, and missing platforms are appended as unavailable.  An
/// offer with either half of the sentinel gets both halves.
pub fn conform_platforms(offers: Vec<PlatformOffer>) -> Vec<PlatformOffer> {
    let mut seen = Vec::with_capacity(Platform::ALL.len());
    let mut conformed = Vec::with_capacity(Platform::ALL.len());

    for mut offer in offers {
        let Some(platform) = Platform::from_name(&offer.name) else {
            continue;
        };
        if seen.contains(&platform) {
            continue;
        }
        seen.push(platform);
        offer.name = platform.name().to_string();
        if offer.price == NOT_AVAILABLE || offer.deal == NOT_AVAILABLE {
            offer.price = NOT_AVAILABLE.to_string();
            offer.deal = NOT_AVAILABLE.to_string();
        }
        conformed.push(offer);
    }

    for platform in Platform::ALL {
        if !seen.contains(&platform) {
            conformed.push(PlatformOffer::unavailable(platform, String::new()));
        }
    }
    conformed
}

/// Conform the platform list, backfill missing links from the product name,
/// and order offers cheapest first.  Idempotent.
pub fn normalize(mut detail: ProductDetail) -> ProductDetail {
    let mut platforms = conform_platforms(std::mem::take(&mut detail.platforms));

    for offer in &mut platforms {
        if is_placeholder_url(&offer.url) {
            offer.url = search_url(&offer.name, &detail.name);
        }
    }

    // `sort_by` is stable, so equal prices keep their incoming order.
    platforms.sort_by(|a, b| platform_price(&a.price).total_cmp(&platform_price(&b.price)));
    detail.platforms = platforms;
    detail
}

// ── comparison records ───────────────────────────────────────────────────────

/// Backfill link and image keyword, then order cheapest first.
pub fn normalize_comparison(mut items: Vec<ComparisonItem>) -> Vec<ComparisonItem> {
    for item in &mut items {
        if item.url.trim().is_empty() {
            item.url = search_url("Google", &item.name);
        }
        if item.img_keyword.trim().is_empty() {
            item.img_keyword = item
                .name
                .split_whitespace()
                .next()
                .unwrap_or("product")
                .to_string();
        }
    }
    items.sort_by(|a, b| a.price.total_cmp(&b.price));
    items
}

// ── Tests ────────────────────────────────────────────────────────────────────
