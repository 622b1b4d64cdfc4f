//! End-to-end pricing through configuration and file-backed storage.

use std::sync::Arc;

use onroad_core::{EnergyType, LocationSelection, Money, PriceItem, PriceRequest};
use onroad_engine::config::read_config_file;
use onroad_engine::{
    LocationContext, PricingConfig, PricingContext, StorageArea, StorageLocationStore,
};

fn file_context(config: &PricingConfig) -> PricingContext {
    let path = config.storage_path().expect("storage path configured");
    let area = Arc::new(StorageArea::json_file(path));
    let store = StorageLocationStore::new(area, config.storage_key());
    PricingContext::from_config(config, Arc::new(store))
}

#[test]
fn selection_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PricingConfig::default();
    config.storage.path = Some(dir.path().join("storage.json"));

    let first_run = file_context(&config);
    first_run
        .select_location(&LocationSelection::new("Hyderabad", "Telangana"))
        .unwrap();
    drop(first_run);

    let second_run = file_context(&config);
    let location = second_run.current_location();
    assert!(location.is_set);
    assert_eq!(location.city(), "Hyderabad");

    let raw = std::fs::read_to_string(dir.path().join("storage.json")).unwrap();
    assert!(raw.contains("\"selectedCity\": \"Hyderabad, Telangana\""));
}

#[test]
fn configured_default_and_overrides_apply() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("onroad.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[location]
storage_key = "city"
default_location = "Panaji, Goa"

[storage]
path = "{}"

[[rates]]
region = "Goa"
petrol = 1000
diesel = 1000
cng = 1000
electric = 0
"#,
            dir.path().join("storage.json").display()
        ),
    )
    .unwrap();

    let config = read_config_file(&config_path).unwrap();
    config.validate().unwrap();
    let ctx = file_context(&config);

    let quote = ctx.quote(&PriceRequest::new(Money::from_rupees(1_000_000), "Electric").with_breakup());
    assert!(!quote.is_location_set);
    assert_eq!(quote.city, "Panaji");
    assert_eq!(quote.region_charge, Some(Money::zero()));
    // 10,00,000 + 0 + 0 + 46,000 + 10,000 + 4,000
    assert_eq!(quote.total_price, Money::from_rupees(1_060_000));
}

#[test]
fn unknown_region_and_energy_fall_back() {
    let ctx = PricingContext::new(
        Arc::new(onroad_engine::PricingEngine::builtin()),
        LocationContext::new(Arc::new(onroad_engine::MemoryLocationStore::new())),
    );
    let base = Money::from_rupees(1_000_000);

    ctx.select_location(&LocationSelection::new("Somewhere", "Atlantis")).unwrap();
    let atlantis = ctx.quote(&PriceRequest::new(base, "Hybrid"));

    ctx.select_location(&LocationSelection::new("Mumbai", "Maharashtra")).unwrap();
    let mumbai = ctx.quote(&PriceRequest::new(base, EnergyType::Petrol));

    assert_eq!(atlantis.region, "Atlantis");
    assert_eq!(atlantis.total_price, mumbai.total_price);
}

#[test]
fn bounded_cache_still_prices_correctly() {
    let mut config = PricingConfig::default();
    config.cache.max_entries = Some(2);
    let ctx = PricingContext::from_config(
        &config,
        Arc::new(onroad_engine::MemoryLocationStore::new()),
    );

    let items: Vec<_> = (1..=5)
        .map(|i| PriceItem::new(format!("v{i}"), Money::from_rupees(200_000 * i), "Petrol"))
        .collect();

    let first = ctx.batch_price(&items);
    let second = ctx.batch_price(&items);
    assert_eq!(first, second);

    let stats = ctx.engine().cache_stats();
    assert_eq!(stats.len, 2);
    assert!(stats.evictions >= 3);
}
