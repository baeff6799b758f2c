//! Terminal rendering for scribe results.

use std::fmt::Write as _;

use anyhow::Result;
use serde_json::json;

use cartscribe_scribe::{ComparisonItem, ProductDetail, Suggestion};

pub fn product_json(detail: &ProductDetail, source_url: Option<&str>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({
        "product": detail,
        "source_url": source_url,
    }))?)
}

pub fn product_text(detail: &ProductDetail, source_url: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  [{}]", detail.name, detail.category);
    if !detail.rating_value.is_empty() {
        let _ = writeln!(
            out,
            "★ {} ({} ratings)",
            detail.rating_value, detail.rating_count
        );
    }
    if let Some(url) = source_url {
        let _ = writeln!(out, "source: {url}");
    }
    if !detail.description.is_empty() {
        let _ = writeln!(out, "\n{}", detail.description);
    }

    bullet_section(&mut out, "Specifications", &detail.specifications);
    bullet_section(&mut out, "Features", &detail.features);
    bullet_section(&mut out, "Uses", &detail.uses);

    let _ = writeln!(out, "\nPrices");
    for offer in &detail.platforms {
        let _ = writeln!(out, "  {:<10} {:<14} {}", offer.name, offer.price, offer.deal);
        let _ = writeln!(out, "  {:<10} {}", "", offer.url);
    }

    if !detail.price_analysis.is_empty() {
        let _ = writeln!(out, "\n{}", detail.price_analysis);
    }
    out
}

fn bullet_section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title}");
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
}

pub fn comparison_json(requirements: &str, items: &[ComparisonItem]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({
        "requirements": requirements,
        "results": items,
    }))?)
}

pub fn comparison_text(requirements: &str, items: &[ComparisonItem]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Matches for \"{requirements}\"");
    for (rank, item) in items.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n{}. {}  {}  ★ {:.1}",
            rank + 1,
            item.name,
            item.original_price,
            item.rating
        );
        if !item.desc.is_empty() {
            let _ = writeln!(out, "   {}", item.desc);
        }
        let _ = writeln!(out, "   {}", item.url);
    }
    out
}

pub fn suggestions_json(suggestions: &[Suggestion]) -> Result<String> {
    Ok(serde_json::to_string_pretty(suggestions)?)
}

pub fn suggestions_text(suggestions: &[Suggestion]) -> String {
    let mut out = String::new();
    for suggestion in suggestions {
        let _ = writeln!(out, "{}  ({})", suggestion.name, suggestion.price);
        let _ = writeln!(out, "  {}", suggestion.desc);
    }
    out
}
