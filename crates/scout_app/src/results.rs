//! Results file output and the end-of-run console summary.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use scout_core::{ProductRecord, SessionCounters};
use scout_engine::{slugify, AtomicJsonWriter, PersistError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultsMetadata<'a> {
    query: &'a str,
    total_products: usize,
    counters: &'a SessionCounters,
    timestamp: String,
}

#[derive(Serialize)]
struct ResultsFile<'a> {
    metadata: ResultsMetadata<'a>,
    products: &'a [ProductRecord],
}

/// Writes the full result set as one pretty-printed JSON file,
/// `scout_<query>_<YYYYmmdd_HHMMSS>.json` under `dir`.
pub fn write_results(
    dir: &Path,
    query: &str,
    records: &[ProductRecord],
    counters: &SessionCounters,
) -> Result<PathBuf, PersistError> {
    let filename = format!(
        "scout_{}_{}.json",
        slugify(query),
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let payload = ResultsFile {
        metadata: ResultsMetadata {
            query,
            total_products: records.len(),
            counters,
            timestamp: Local::now().to_rfc3339(),
        },
        products: records,
    };
    AtomicJsonWriter::new(dir.to_path_buf()).write(&filename, &payload)
}

/// Prints the human-readable run summary to stdout.
pub fn print_summary(query: &str, records: &[ProductRecord], counters: &SessionCounters) {
    println!();
    println!("Results for '{query}'");
    println!("  pages scraped:   {}", counters.pages_scraped);
    println!("  products found:  {}", counters.products_found);
    println!("  unique products: {}", records.len());
    println!("  errors:          {}", counters.errors);

    if records.is_empty() {
        println!("  no products matched the query.");
        return;
    }

    let in_stock = records.iter().filter(|r| r.in_stock).count();
    println!(
        "  in stock:        {} ({:.0}%)",
        in_stock,
        in_stock as f64 * 100.0 / records.len() as f64
    );

    let avg_price = records.iter().map(|r| r.price).sum::<u64>() / records.len() as u64;
    println!("  average price:   {avg_price}");

    let avg_discount =
        records.iter().map(|r| r.discount_percent as u64).sum::<u64>() / records.len() as u64;
    println!("  average discount: {avg_discount}%");

    let rated: Vec<f32> = records
        .iter()
        .filter(|r| r.rating_score > 0.0)
        .map(|r| r.rating_score)
        .collect();
    if !rated.is_empty() {
        let avg = rated.iter().sum::<f32>() / rated.len() as f32;
        println!("  average rating:  {avg:.1} ({} rated)", rated.len());
    }

    let brands: BTreeSet<&str> = records
        .iter()
        .map(|r| r.brand.as_str())
        .filter(|b| !b.is_empty())
        .collect();
    if !brands.is_empty() {
        println!("  brands:          {}", brands.len());
    }

    let mut deals: Vec<&ProductRecord> =
        records.iter().filter(|r| r.discount_percent > 0).collect();
    deals.sort_by(|a, b| b.discount_percent.cmp(&a.discount_percent));
    if !deals.is_empty() {
        println!();
        println!("Top deals:");
        for record in deals.iter().take(10) {
            println!(
                "  {:>3}% off  {:>8}  {}",
                record.discount_percent,
                record.price,
                truncate(&record.title, 60)
            );
        }
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, discount: u8) -> ProductRecord {
        ProductRecord {
            identifier: id.to_string(),
            title: format!("item {id}"),
            brand: "acme".to_string(),
            price: 900,
            original_price: 1000,
            discount_percent: discount,
            rating_score: 4.2,
            rating_count: 10,
            in_stock: true,
            image_url: String::new(),
            product_url: String::new(),
            page_number: 1,
            captured_at: String::new(),
        }
    }

    #[test]
    fn results_file_lands_with_query_slug_in_name() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![sample("a", 10)];
        let counters = SessionCounters::default();

        let path = write_results(dir.path(), "gaming laptop", &records, &counters).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("scout_gaming_laptop_"), "{name}");
        assert!(name.ends_with(".json"));

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["metadata"]["query"], "gaming laptop");
        assert_eq!(parsed["metadata"]["totalProducts"], 1);
        assert_eq!(parsed["products"][0]["identifier"], "a");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("héllo wörld", 5), "héllo");
    }
}
