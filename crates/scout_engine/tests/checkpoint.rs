use scout_core::{Admission, ProductRecord, ScrapeSession};
use scout_engine::{slugify, CheckpointMark, CheckpointWriter};

fn record(id: &str, page: u32) -> ProductRecord {
    ProductRecord {
        identifier: id.to_string(),
        title: format!("item {id}"),
        brand: String::new(),
        price: 100,
        original_price: 100,
        discount_percent: 0,
        rating_score: 0.0,
        rating_count: 0,
        in_stock: true,
        image_url: String::new(),
        product_url: String::new(),
        page_number: page,
        captured_at: String::new(),
    }
}

#[test]
fn page_checkpoint_lands_named_and_parseable() {
    let dir = tempfile::tempdir().unwrap();
    let writer = CheckpointWriter::new(dir.path().to_path_buf());

    let mut session = ScrapeSession::new();
    session.note_found(2);
    assert_eq!(session.admit(record("a", 1)), Admission::Accepted);
    assert_eq!(session.admit(record("b", 2)), Admission::Accepted);
    session.note_page_scraped();

    let path = writer
        .write("gaming laptop", CheckpointMark::Page(2), &session.snapshot(100))
        .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("checkpoint_gaming_laptop_p2_"), "{name}");
    assert!(name.ends_with(".json"));

    let text = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["query"], "gaming laptop");
    assert_eq!(parsed["page"], 2);
    assert_eq!(parsed["counters"]["productsValid"], 2);
    assert_eq!(parsed["products"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["products"][0]["identifier"], "a");
}

#[test]
fn terminal_checkpoint_uses_final_label() {
    let dir = tempfile::tempdir().unwrap();
    let writer = CheckpointWriter::new(dir.path().to_path_buf());
    let session = ScrapeSession::new();

    let path = writer
        .write("shoes", CheckpointMark::FINAL, &session.snapshot(100))
        .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("checkpoint_shoes_pfinal_"), "{name}");

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed["page"], "final");
}

#[test]
fn snapshot_holds_only_admitted_records() {
    let mut session = ScrapeSession::new();
    session.note_found(3);
    session.admit(record("a", 1));
    session.admit(record("a", 1)); // duplicate
    session.admit(record("", 1)); // invalid

    let snapshot = session.snapshot(100);
    assert_eq!(snapshot.products.len(), 1);
    assert_eq!(snapshot.counters.products_valid, 1);
    assert_eq!(snapshot.counters.products_found, 3);
    assert!(snapshot.products.iter().all(|r| r.is_valid()));
}

#[test]
fn slugify_replaces_awkward_characters() {
    assert_eq!(slugify("gaming laptop"), "gaming_laptop");
    assert_eq!(slugify("4k tv & más"), "4k_tv___más");
    assert_eq!(slugify("plain"), "plain");
}
