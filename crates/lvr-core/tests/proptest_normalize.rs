use chrono::{TimeZone, Utc};
use lvr_core::market::MarketCatalog;
use lvr_core::normalize::normalize_value;
use lvr_core::store::projections;
use lvr_core::store::PutOutcome;
use proptest::prelude::*;

use generators::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn normalization_is_idempotent(payload in arb_payload()) {
        let markets = MarketCatalog::builtin();
        let first = normalize_value(payload, &markets).expect("generated payload is valid");
        let canonical = serde_json::to_value(&first.record).expect("serialize record");
        let second = normalize_value(canonical, &markets).expect("canonical record is valid");
        prop_assert_eq!(&first.record, &second.record);
        prop_assert_eq!(first.owner_slug, second.owner_slug);
    }

    #[test]
    fn slug_is_stable_across_shapes(address in arb_address()) {
        let markets = MarketCatalog::builtin();
        let nested = normalize_value(base_payload(&address), &markets).expect("nested");

        let mut flat = base_payload(&address);
        let property = flat["property"].take();
        flat["address"] = property["address"].clone();
        flat["bedrooms"] = property["bedrooms"].clone();
        flat["bathrooms"] = property["bathrooms"].clone();
        let flat = normalize_value(flat, &markets).expect("flat");

        prop_assert_eq!(nested.slug(), flat.slug());
        prop_assert!(lvr_core::slug::is_slug(nested.slug()));
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    #[test]
    fn store_round_trips_normalized_records(payload in arb_payload()) {
        let conn = lvr_core::db::open_in_memory().expect("db");
        let submission = normalize_value(payload, &MarketCatalog::builtin()).expect("valid");
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("date");

        projections::put(&conn, &submission.owner_slug, &submission.record, now).expect("put");
        let stored = projections::get_by_slug(&conn, submission.slug())
            .expect("get")
            .expect("present");
        prop_assert_eq!(stored.data, submission.record);
    }

    #[test]
    fn last_write_wins(first in arb_payload(), second in arb_payload()) {
        let conn = lvr_core::db::open_in_memory().expect("db");
        let markets = MarketCatalog::builtin();
        let a = normalize_value(first, &markets).expect("valid");
        let mut b = normalize_value(second, &markets).expect("valid").record;
        b.meta.slug = a.record.meta.slug.clone();

        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("date");
        let t1 = t0 + chrono::Duration::seconds(30);
        let (_, outcome) = projections::put(&conn, "owner-a", &a.record, t0).expect("put a");
        prop_assert_eq!(outcome, PutOutcome::Created);
        let (_, outcome) = projections::put(&conn, "owner-b", &b, t1).expect("put b");
        prop_assert_eq!(outcome, PutOutcome::Updated);

        let stored = projections::get_by_slug(&conn, &b.meta.slug)
            .expect("get")
            .expect("present");
        prop_assert_eq!(&stored.data, &b);
        prop_assert_eq!(stored.owner_slug.as_str(), "owner-b");
        prop_assert_eq!(stored.created_at, t0);
        prop_assert_eq!(stored.updated_at, t1);
    }
}
