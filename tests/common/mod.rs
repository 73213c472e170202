//! Shared test fixtures for integration tests.

use pv_advisor::config::EngineConfig;
use pv_advisor::request::CalcRequest;
use serde_json::json;

/// Default engine configuration (reference catalogue values).
pub fn default_config() -> EngineConfig {
    EngineConfig::default()
}

/// Temperate-climate production profile, January first (kWh).
pub fn production_months() -> Vec<f64> {
    vec![
        500.0, 450.0, 600.0, 650.0, 700.0, 750.0, 780.0, 740.0, 600.0, 550.0, 480.0, 420.0,
    ]
}

/// Flat consumption profile (kWh).
pub fn consumption_months() -> Vec<f64> {
    vec![580.0; 12]
}

/// Baseline request: fixed price, no battery, no overrides.
pub fn baseline_request() -> CalcRequest {
    request_with(json!({}))
}

/// Baseline request with extra top-level fields merged in. A field in
/// `extra` replaces the whole baseline field of the same name.
pub fn request_with(extra: serde_json::Value) -> CalcRequest {
    let mut value = json!({
        "production": { "monthly_kwh": production_months() },
        "consumption": { "monthly_kwh": consumption_months() },
        "tariffs": { "effective_price_eur_kwh": 0.1952 }
    });
    if let (Some(base), Some(add)) = (value.as_object_mut(), extra.as_object()) {
        for (k, v) in add {
            base.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(value).expect("request fixture should parse")
}
