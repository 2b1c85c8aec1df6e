use scout_core::{Admission, ProductRecord, ScrapeSession};

fn record(id: &str) -> ProductRecord {
    ProductRecord {
        identifier: id.to_string(),
        title: "Thing".into(),
        brand: String::new(),
        price: 100,
        original_price: 100,
        discount_percent: 0,
        rating_score: 0.0,
        rating_count: 0,
        in_stock: true,
        image_url: String::new(),
        product_url: String::new(),
        page_number: 1,
        captured_at: String::new(),
    }
}

#[test]
fn admits_first_occurrence_only() {
    scout_logging::initialize_for_tests();
    let mut session = ScrapeSession::new();
    session.note_found(2);
    assert_eq!(session.admit(record("ITM123")), Admission::Accepted);
    assert_eq!(session.admit(record("ITM123")), Admission::Duplicate);
    assert_eq!(session.records().len(), 1);
    assert_eq!(session.counters().products_found, 2);
    assert_eq!(session.counters().products_valid, 1);
}

#[test]
fn no_two_accumulated_records_share_an_identifier() {
    let mut session = ScrapeSession::new();
    for id in ["a", "b", "a", "c", "b", "a"] {
        session.admit(record(id));
    }
    let mut ids: Vec<_> = session
        .records()
        .iter()
        .map(|r| r.identifier.clone())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), session.records().len());
    assert_eq!(session.unique_count(), 3);
}

#[test]
fn rejects_invalid_records_before_dedup() {
    let mut session = ScrapeSession::new();
    let mut bad = record("ITM9");
    bad.price = 0;
    assert_eq!(session.admit(bad), Admission::Invalid);
    // The invalid attempt must not poison the identifier set.
    assert_eq!(session.admit(record("ITM9")), Admission::Accepted);
}

#[test]
fn every_accumulated_record_is_valid() {
    let mut session = ScrapeSession::new();
    let mut untitled = record("u1");
    untitled.title.clear();
    session.admit(untitled);
    session.admit(record("u2"));
    assert!(session.records().iter().all(|r| r.is_valid()));
}

#[test]
fn checkpoint_due_fires_per_interval() {
    let mut session = ScrapeSession::new();
    for i in 0..3 {
        session.admit(record(&format!("id{i}")));
    }
    assert!(!session.take_checkpoint_due(4));
    session.admit(record("id3"));
    assert!(session.take_checkpoint_due(4));
    // Window restarts after a checkpoint.
    assert!(!session.take_checkpoint_due(4));
}

#[test]
fn snapshot_keeps_most_recent_window_and_counters() {
    let mut session = ScrapeSession::new();
    for i in 0..5 {
        session.admit(record(&format!("id{i}")));
    }
    session.note_page_scraped();
    session.note_error();

    let snap = session.snapshot(2);
    let ids: Vec<_> = snap.products.iter().map(|p| p.identifier.as_str()).collect();
    assert_eq!(ids, vec!["id3", "id4"]);
    assert_eq!(snap.counters.products_valid, 5);
    assert_eq!(snap.counters.pages_scraped, 1);
    assert_eq!(snap.counters.errors, 1);
}
