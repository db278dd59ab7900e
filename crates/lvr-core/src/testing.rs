//! Shared fixtures for unit tests.

use serde_json::{Value, json};

use crate::market::MarketCatalog;
use crate::model::record::ProjectionRecord;
use crate::normalize::normalize_value;

pub fn sample_payload(address: &str) -> Value {
    let months: Vec<Value> = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ]
    .iter()
    .map(|m| json!({ "month": m, "low": 1500, "high": 2500.5 }))
    .collect();

    json!({
        "meta": {
            "leadId": "00Q5f000001",
            "homeownerFirstName": "Dana",
            "homeownerFullName": "Dana Whitfield"
        },
        "property": {
            "internalId": "LVR-30A-10293",
            "address": address,
            "bedrooms": 4,
            "bathrooms": 3.5,
            "squareFeet": 2400,
            "city": "Seacrest Beach",
            "state": "FL"
        },
        "projections": {
            "lowRevenue": 80000,
            "expectedRevenue": 100000.25,
            "highRevenue": 120000
        },
        "monthlyRevenue": months,
        "cta": {
            "aeName": "Kaci Wolkers",
            "aeTitle": "Account Executive",
            "aePhone": "(850) 641-1001",
            "aeEmail": "kaci.wolkers@golocalvr.com"
        }
    })
}

pub fn sample_record(address: &str) -> ProjectionRecord {
    normalize_value(sample_payload(address), &MarketCatalog::builtin())
        .expect("sample payload normalizes")
        .record
}
