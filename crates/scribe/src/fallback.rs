//! Synthetic records served whenever the model call or its parsing fails.
//!
//! Shapes are fixed; only prices and rating counts vary, and all of that
//! variation comes from the caller's `Rng` so tests can seed it.
//!
//! The `unconfigured_*` set is static demo data for running with no model
//! backend at all.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{ComparisonItem, Platform, PlatformOffer, ProductDetail, Suggestion};
use crate::normalize::{Category, search_url};

/// Candidate base prices in rupees; the cheapest mock offer uses one of these.
pub const BASE_PRICES: [u32; 6] = [999, 1499, 2999, 7999, 12999, 24999];

/// Per-platform markup over the base price and the deal text shown with it.
/// Myntra is absent: the mock always lists it as unavailable.
const MOCK_OFFERS: [(Platform, u32, &str); 4] = [
    (Platform::Amazon, 500, "Market Price"),
    (Platform::Flipkart, 200, "Bank Offer"),
    (Platform::Meesho, 0, "Lowest Price"),
    (Platform::Ajio, 350, "Coupon Applied"),
];

/// Rupee amount with comma thousands separators, e.g. `₹24,999`.
pub fn format_inr(amount: u32) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("₹{grouped}")
}

/// Capitalize the first letter of every word and lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

pub fn generate_mock_product<R: Rng + ?Sized>(
    query: &str,
    category: Category,
    rng: &mut R,
) -> ProductDetail {
    let base_price = BASE_PRICES.choose(rng).copied().unwrap_or(BASE_PRICES[0]);

    let platforms = Platform::ALL
        .into_iter()
        .map(|platform| {
            let url = search_url(platform.name(), query);
            match MOCK_OFFERS.iter().find(|(p, _, _)| *p == platform) {
                Some((_, markup, deal)) => PlatformOffer {
                    name: platform.name().to_string(),
                    price: format_inr(base_price + markup),
                    deal: deal.to_string(),
                    url,
                },
                None => PlatformOffer::unavailable(platform, url),
            }
        })
        .collect();

    let name = if query.chars().count() < 40 {
        title_case(query)
    } else {
        "Scribed Product".to_string()
    };
    let image_keywords = if query.chars().count() < 20 {
        query.to_string()
    } else {
        "product".to_string()
    };

    ProductDetail {
        name,
        description: "Our AI is currently optimizing results. Based on market trends, this \
                      product offers excellent value and durability for its category."
            .to_string(),
        category: category.to_string(),
        specifications: strings(&[
            "Verified Quality",
            "Standard Warranty",
            "Fast Shipping",
            "Genuine Item",
        ]),
        features: strings(&["High Durability", "Modern Design", "Reliable Tech"]),
        uses: strings(&["Personal use", "Professional gift"]),
        rating_value: "4.3".to_string(),
        rating_count: format!("{}+", rng.gen_range(500..=5000)),
        image_keywords,
        platforms,
        price_analysis: format!(
            "Market analysis suggests Meesho currently offers the best deal at {}. Flipkart \
             is the next best option with bank discounts. Stock levels appear healthy across \
             major platforms.",
            format_inr(base_price)
        ),
    }
}

pub fn generate_mock_comparison(requirements: &str) -> Vec<ComparisonItem> {
    let topic = requirements.chars().take(20).collect::<String>();
    vec![
        mock_item(
            &format!("Top Match for {topic}"),
            15000,
            "Great general purpose balanced choice.",
            4.5,
        ),
        mock_item(
            "Value Alternative",
            12000,
            "Best budget-friendly option for your needs.",
            4.1,
        ),
        mock_item(
            "Performance Edition",
            25000,
            "High-end version with superior build quality.",
            4.8,
        ),
    ]
}

fn mock_item(name: &str, price: u32, desc: &str, rating: f64) -> ComparisonItem {
    ComparisonItem {
        name: name.to_string(),
        price: f64::from(price),
        original_price: format_inr(price),
        desc: desc.to_string(),
        rating,
        ..ComparisonItem::default()
    }
}

pub fn generate_mock_suggestions(query: &str) -> Vec<Suggestion> {
    vec![Suggestion {
        name: format!("AI Result for {query}"),
        desc: "Smart product finding is currently limited. Please check back soon!".to_string(),
        price: "N/A".to_string(),
    }]
}

// ── Mock mode (no backend) ───────────────────────────────────────────────────

/// Demo record for a product query when no model is configured.
pub fn unconfigured_product(query: &str, is_url: bool, category: Category) -> ProductDetail {
    let offer = |platform: Platform, price: &str, deal: &str| PlatformOffer {
        name: platform.name().to_string(),
        price: price.to_string(),
        deal: deal.to_string(),
        url: String::new(),
    };

    ProductDetail {
        name: if is_url {
            "Analyzed Product".to_string()
        } else {
            title_case(query)
        },
        description: format!("A high-quality product analyzed from: {query}."),
        category: category.to_string(),
        specifications: strings(&["Premium Quality", "Durable Build"]),
        features: strings(&["Quick connectivity", "Long battery life", "Premium finish"]),
        uses: strings(&["Daily office work", "Entertainment", "Travel"]),
        rating_value: "4.5".to_string(),
        rating_count: "1,240".to_string(),
        image_keywords: String::new(),
        platforms: vec![
            offer(Platform::Amazon, "₹4,999", "Standard Price"),
            offer(Platform::Flipkart, "₹4,799", "Special Offer"),
            PlatformOffer::unavailable(Platform::Myntra, ""),
            offer(Platform::Meesho, "₹4,699", "Lowest Price"),
            offer(Platform::Ajio, "₹4,899", "New User Discount"),
        ],
        price_analysis: "Currently, Meesho offers the lowest price at ₹4,699. Flipkart is a \
                         close second with a special offer, while Myntra does not seem to have \
                         this item in stock."
            .to_string(),
    }
}

pub fn unconfigured_comparison() -> Vec<ComparisonItem> {
    vec![
        mock_item(
            "Budget Option",
            45000,
            "Good value for entry level requirements.",
            4.1,
        ),
        mock_item("Mid-Range Choice", 62000, "Balanced performance and cost.", 4.4),
        mock_item(
            "Premium Pick",
            89000,
            "Top tier specs for demanding users.",
            4.8,
        ),
    ]
}

pub fn unconfigured_suggestions(query: &str) -> Vec<Suggestion> {
    let suggestion = |name: String, desc: &str, price: &str| Suggestion {
        name,
        desc: desc.to_string(),
        price: price.to_string(),
    };
    vec![
        suggestion(
            format!("Premium {query} Pro"),
            "The ultimate choice for professionals seeking performance and style.",
            "$999",
        ),
        suggestion(
            format!("Eco {query} Air"),
            "Lightweight, sustainable, and surprisingly powerful for everyday use.",
            "$499",
        ),
        suggestion(
            format!("Elite {query} Ultra"),
            "Boundary-pushing technology with a sleek minimalist design.",
            "$749",
        ),
        suggestion(
            format!("Classic {query} Plus"),
            "Reliable, durable, and packed with the features you love.",
            "$299",
        ),
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────
