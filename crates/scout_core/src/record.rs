use serde::{Deserialize, Serialize};

/// One extracted product listing.
///
/// A record is *valid* iff `identifier` and `title` are non-empty and
/// `price > 0`; invalid records never reach the session registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub identifier: String,
    pub title: String,
    /// May be empty; many category layouts carry no separate brand node.
    #[serde(default)]
    pub brand: String,
    /// Current price in whole currency units, digits only.
    pub price: u64,
    /// Defaults to `price` when the listing shows no strike-through price.
    pub original_price: u64,
    /// Derived, 0..=100.
    pub discount_percent: u8,
    pub rating_score: f32,
    pub rating_count: u64,
    pub in_stock: bool,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub product_url: String,
    pub page_number: u32,
    /// RFC 3339 capture timestamp.
    pub captured_at: String,
}

impl ProductRecord {
    /// Validity gate applied before a record may be admitted.
    pub fn is_valid(&self) -> bool {
        !self.identifier.is_empty() && !self.title.is_empty() && self.price > 0
    }
}

/// Discount as a floored percentage of the original price.
///
/// Zero unless `0 < current < original`.
pub fn discount_percent(current: u64, original: u64) -> u8 {
    if original > 0 && current > 0 && current < original {
        // Widened so pathological strike prices near u64::MAX cannot
        // overflow the multiply.
        ((u128::from(original - current) * 100) / u128::from(original)) as u8
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ProductRecord {
        ProductRecord {
            identifier: "ITM123".into(),
            title: "Widget".into(),
            brand: String::new(),
            price: 1299,
            original_price: 1299,
            discount_percent: 0,
            rating_score: 4.3,
            rating_count: 120,
            in_stock: true,
            image_url: String::new(),
            product_url: String::new(),
            page_number: 1,
            captured_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn validity_requires_id_title_and_positive_price() {
        assert!(record().is_valid());

        let mut no_id = record();
        no_id.identifier.clear();
        assert!(!no_id.is_valid());

        let mut no_title = record();
        no_title.title.clear();
        assert!(!no_title.is_valid());

        let mut free = record();
        free.price = 0;
        assert!(!free.is_valid());
    }

    #[test]
    fn discount_is_floored_and_bounded() {
        assert_eq!(discount_percent(750, 1000), 25);
        // 1 - 999/1000 = 0.1% floors to 0.
        assert_eq!(discount_percent(999, 1000), 0);
        assert_eq!(discount_percent(1, 1000), 99);
    }

    #[test]
    fn discount_survives_enormous_strike_prices() {
        // Digit-stripping can concatenate several prices into one huge
        // number; the bound must still hold without overflow.
        assert_eq!(discount_percent(1, 18_000_000_000_000_000_000), 99);
        assert_eq!(discount_percent(u64::MAX - 1, u64::MAX), 0);
        assert_eq!(discount_percent(1, u64::MAX), 99);
    }

    #[test]
    fn discount_is_zero_without_a_real_markdown() {
        assert_eq!(discount_percent(1000, 0), 0);
        assert_eq!(discount_percent(0, 1000), 0);
        assert_eq!(discount_percent(1000, 1000), 0);
        // Price above "original" means the markup was inconsistent, not a deal.
        assert_eq!(discount_percent(1200, 1000), 0);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("originalPrice").is_some());
        assert!(json.get("ratingScore").is_some());
        assert!(json.get("capturedAt").is_some());
    }
}
