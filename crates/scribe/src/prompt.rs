//! Instruction text sent to the model.
//!
//! Each prompt embeds a literal example of the JSON it expects back so the
//! extractor can rely on a predictable shape.

/// Domains whose presence marks a query as a pasted product link.
const PRODUCT_DOMAINS: &[&str] = &["flipkart.com", "amazon.in", "amzn.to", "myntra.com", "meesho.com"];

/// True for queries that look like a product link rather than a product name.
pub fn is_product_url(query: &str) -> bool {
    let lowered = query.to_lowercase();
    query.starts_with("http") || PRODUCT_DOMAINS.iter().any(|domain| lowered.contains(domain))
}

const PRODUCT_SCHEMA: &str = r#"{
    "name": "Full Commercial Product Name",
    "description": "3-sentence premium marketing summary.",
    "category": "Broad category",
    "specifications": ["Spec 1", "Spec 2", "Spec 3", "Spec 4"],
    "features": ["Feature 1", "Feature 2", "Feature 3"],
    "uses": ["Use 1", "Use 2"],
    "rating_value": "4.2",
    "rating_count": "1,250+",
    "image_keywords": "brand,model,color,product",
    "platforms": [
        {"name": "Amazon", "price": "₹XX,XXX or Not Available", "deal": "Deal info or Not Available", "url": "Direct Amazon search link"},
        {"name": "Flipkart", "price": "₹XX,XXX or Not Available", "deal": "Deal info or Not Available", "url": "Direct Flipkart search link"},
        {"name": "Myntra", "price": "₹XX,XXX or Not Available", "deal": "Deal info or Not Available", "url": "Direct Myntra search link"},
        {"name": "Meesho", "price": "₹XX,XXX or Not Available", "deal": "Deal info or Not Available", "url": "Direct Meesho search link"},
        {"name": "Ajio", "price": "₹XX,XXX or Not Available", "deal": "Deal info or Not Available", "url": "Direct Ajio search link"}
    ],
    "price_analysis": "A detailed comparison of price drops and best platform to buy from."
}"#;

pub fn build_product_prompt(query: &str, is_url: bool) -> String {
    let task = if is_url {
        "The user has provided a link. Perform a deep scribe analysis of this specific product."
    } else {
        "Find and analyze the best version of this product."
    };

    format!(
        "Act as CartScribe AI Expert.\n\
         User input: \"{query}\"\n\
         {task}\n\n\
         Provide a comprehensive JSON response:\n\
         {PRODUCT_SCHEMA}\n\n\
         Important: If a product is NOT available on a specific platform, set its \"price\" \
         and \"deal\" to EXACTLY \"Not Available\".\n\n\
         Return ONLY valid JSON."
    )
}

pub fn build_compare_prompt(requirements: &str) -> String {
    format!(
        "Act as CartScribe Agent.\n\
         User Requirements: \"{requirements}\"\n\
         Find 5 actual or realistic products that match these requirements across major \
         Indian platforms (Amazon, Flipkart, Myntra, Meesho, Ajio).\n\
         Return a JSON array of objects. Each object MUST have:\n\
         1. \"name\": Product name.\n\
         2. \"price\": Numeric lowest price found in INR (e.g. 54000).\n\
         3. \"original_price\": String lowest price with currency (e.g. \"₹54,000\").\n\
         4. \"desc\": 1 sentence why it matches.\n\
         5. \"rating\": Rating out of 5 (e.g. 4.3).\n\
         6. \"img_keyword\": 1-2 words for image search (e.g. \"laptop\", \"shirt\").\n\n\
         Example:\n\
         [{{\"name\": \"Product\", \"price\": 54000, \"original_price\": \"₹54,000\", \
         \"desc\": \"Why it matches.\", \"rating\": 4.3, \"img_keyword\": \"laptop\"}}]\n\n\
         Sort the response by price from LOW to HIGH.\n\
         Return ONLY valid JSON."
    )
}

pub fn build_suggestion_prompt(query: &str) -> String {
    format!(
        "Act as a professional shopping assistant named CartScribe.\n\
         User is searching for: \"{query}\"\n\
         Provide 4 highly relevant, creatively named product suggestions.\n\
         Return only a JSON array of objects with \"name\", \"desc\", and \"price\" keys, e.g.\n\
         [{{\"name\": \"Product Name\", \"desc\": \"Short premium description.\", \"price\": \"₹4,999\"}}]\n\
         Keep descriptions short and premium. Use realistic but appealing prices."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{JsonShape, extract_json};

    #[test]
    fn url_detection() {
        assert!(is_product_url("https://example.com/item/1"));
        assert!(is_product_url("www.Flipkart.com/some-phone/p/itm123"));
        assert!(is_product_url("amzn.to/3xYz"));
        assert!(!is_product_url("Nike Air Max"));
        assert!(!is_product_url("a shoe from HTTP street"));
    }

    #[test]
    fn product_prompt_wording_depends_on_url_flag() {
        let by_name = build_product_prompt("Nike Air Max", false);
        assert!(by_name.contains("User input: \"Nike Air Max\""));
        assert!(by_name.contains("Find and analyze the best version"));

        let by_link = build_product_prompt("https://www.amazon.in/dp/B0", true);
        assert!(by_link.contains("deep scribe analysis"));
    }

    #[test]
    fn product_prompt_is_deterministic() {
        assert_eq!(build_product_prompt("x", false), build_product_prompt("x", false));
    }

    #[test]
    fn embedded_schemas_extract_as_their_shapes() {
        let product = extract_json(&build_product_prompt("", false), JsonShape::Object).unwrap();
        assert_eq!(product["platforms"].as_array().unwrap().len(), 5);

        let compare = build_compare_prompt("a laptop under 60k");
        let example = extract_json(compare.split("Example:").nth(1).unwrap(), JsonShape::Array).unwrap();
        assert_eq!(example[0]["price"], 54000);
    }

    #[test]
    fn suggestion_prompt_mentions_query_and_keys() {
        let prompt = build_suggestion_prompt("desk lamp");
        assert!(prompt.contains("\"desk lamp\""));
        assert!(prompt.contains("\"name\", \"desc\", and \"price\""));
    }
}
