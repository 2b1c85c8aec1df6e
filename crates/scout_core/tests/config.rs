use scout_core::{ConfigError, RunConfig, SelectorCatalog, SelectorField};

#[test]
fn default_config_is_valid() {
    assert_eq!(RunConfig::default().validate(), Ok(()));
}

#[test]
fn rejects_inverted_delay_range() {
    let config = RunConfig {
        min_delay_ms: 500,
        max_delay_ms: 100,
        ..RunConfig::default()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::DelayRange { min: 500, max: 100 })
    );
}

#[test]
fn rejects_zero_bounds() {
    let config = RunConfig {
        max_pages: 0,
        ..RunConfig::default()
    };
    assert_eq!(config.validate(), Err(ConfigError::MaxPages));

    let config = RunConfig {
        checkpoint_interval: 0,
        ..RunConfig::default()
    };
    assert_eq!(config.validate(), Err(ConfigError::CheckpointInterval));

    let config = RunConfig {
        page_timeout_ms: 0,
        ..RunConfig::default()
    };
    assert_eq!(config.validate(), Err(ConfigError::PageTimeout));
}

#[test]
fn listing_url_encodes_query_and_skips_page_one() {
    let config = RunConfig::default();
    let first = config.listing_url("gaming laptop", 1).unwrap();
    assert_eq!(first, "https://www.flipkart.com/search?q=gaming+laptop");
    let third = config.listing_url("gaming laptop", 3).unwrap();
    assert!(third.ends_with("&page=3"));
}

#[test]
fn default_catalog_orders_strategies_most_specific_first() {
    let catalog = SelectorCatalog::default();
    let titles = catalog.strategies(SelectorField::Title);
    assert_eq!(titles.first().map(String::as_str), Some("a.KrRmtj"));
    assert!(titles.len() > 1);
}

#[test]
fn combined_joins_alternatives() {
    let catalog = SelectorCatalog::default();
    let combined = catalog.combined(SelectorField::OutOfStock);
    assert!(combined.contains("div.bgFu62, span.fRrrYo"));
}

#[test]
fn unmapped_field_is_empty() {
    let catalog = SelectorCatalog::new(Default::default());
    assert!(catalog.strategies(SelectorField::Title).is_empty());
    assert_eq!(catalog.combined(SelectorField::Link), "");
}
