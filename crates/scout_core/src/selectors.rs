use std::collections::BTreeMap;

/// Semantic fields a listing node can be queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SelectorField {
    /// Candidate listing container.
    Container,
    Title,
    Brand,
    CurrentPrice,
    OriginalPrice,
    Rating,
    RatingCount,
    OutOfStock,
    Image,
    /// Product detail link.
    Link,
    /// Lazy-load spinner shown while more results stream in.
    LoadingIndicator,
}

/// Immutable mapping from semantic field to an ordered list of CSS lookup
/// strategies, most specific first.
///
/// Listing markup differs per product category and per backend, so a single
/// selector per field is not enough; resolution walks the list until one
/// strategy matches.
#[derive(Debug, Clone)]
pub struct SelectorCatalog {
    fields: BTreeMap<SelectorField, Vec<String>>,
}

impl SelectorCatalog {
    /// Build a catalog from explicit per-field strategy lists.
    pub fn new(fields: BTreeMap<SelectorField, Vec<String>>) -> Self {
        Self { fields }
    }

    /// Ordered strategies for a field. Empty slice if the field is unmapped.
    pub fn strategies(&self, field: SelectorField) -> &[String] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All strategies for a field joined into one comma-separated selector
    /// list, for backends that evaluate alternatives in a single query.
    pub fn combined(&self, field: SelectorField) -> String {
        self.strategies(field).join(", ")
    }
}

impl Default for SelectorCatalog {
    /// Selector stack tuned against flipkart.com search listings.
    fn default() -> Self {
        let mut fields = BTreeMap::new();

        fields.insert(
            SelectorField::Container,
            vec![
                "div[data-id], div._2kHMtA, div._13oc-S, div._1AtVbE[data-id], div._1fQZEK"
                    .to_string(),
            ],
        );
        fields.insert(
            SelectorField::Title,
            strs(&[
                "a.KrRmtj",
                "a.wfMR5l",
                "a.VJA3rP",
                "div.KzDlHZ",
                "a[title]",
                "div[class*=\"title\"]",
                "a._2rpwqI",
                "div._4rR01T",
                "a.s1Q9rs",
            ]),
        );
        fields.insert(
            SelectorField::Brand,
            strs(&[
                "div.Fo1I0b",
                "div._1rcHFq",
                "div._1W9f5C",
                "div._2WkVRV",
                "div[class*=\"brand\"]",
                "span.brand",
                "div.brand",
            ]),
        );
        fields.insert(
            SelectorField::CurrentPrice,
            strs(&[
                "div.hZ3P6w",
                "div.Nx9bqj",
                "div._30jeq3",
                "div[class*=\"price\"]",
                "span[class*=\"price\"]",
                "div._25b18c",
            ]),
        );
        fields.insert(
            SelectorField::OriginalPrice,
            strs(&[
                "div.kRYCnD",
                "div._3I9_wc",
                "div._3yAjsT",
                "div[class*=\"original\"]",
                "span[class*=\"original\"]",
            ]),
        );
        fields.insert(
            SelectorField::Rating,
            strs(&["div.XQDdHH", "div._3LWZlK", "span[class*=\"rating\"]", "div._3UAT2v"]),
        );
        fields.insert(
            SelectorField::RatingCount,
            strs(&["div.Wphh3N", "div._2_R_DZ", "span[class*=\"reviews\"]"]),
        );
        fields.insert(
            SelectorField::OutOfStock,
            strs(&[
                "div.bgFu62",
                "span.fRrrYo",
                "div._2d4i2x",
                "div[class*=\"out-of-stock\"]",
                "span[class*=\"unavailable\"]",
            ]),
        );
        fields.insert(
            SelectorField::Image,
            strs(&[
                "img.DByuf4",
                "img._53J4C-",
                "img._2r_T1I",
                "img[src*=\".jpg\"]",
                "img[src*=\".png\"]",
            ]),
        );
        fields.insert(
            SelectorField::Link,
            vec!["a[href*=\"/p/\"], a[href*=\"pid=\"], a._1fQZEK, a.s1Q9rs".to_string()],
        );
        fields.insert(SelectorField::LoadingIndicator, strs(&["div._2bnFzA"]));

        Self { fields }
    }
}

fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
