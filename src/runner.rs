use crate::audit::audit_scenarios;
use crate::config::EngineConfig;
use crate::error::CalcError;
use crate::optimizer::search;
use crate::request::CalcRequest;
use crate::response::{CalcResponse, ResponseContext, build_response};
use crate::scenario::{ScenarioPlan, assemble, resolve_battery_units};
use crate::sim::engine::EvaluationInputs;

/// Runs the full pipeline: validate, size, simulate the four scenarios,
/// audit and shape the response. Audit errors abort the run.
pub fn run_calculation(
    request: &CalcRequest,
    base_config: &EngineConfig,
) -> Result<CalcResponse, CalcError> {
    request.validate()?;
    let config = request.apply_overrides(base_config);

    let production = request
        .production_profile()
        .ok_or_else(|| CalcError::invalid_input("production.monthly_kwh", "must have 12 entries"))?;
    let consumption = request
        .consumption_profile()
        .ok_or_else(|| CalcError::invalid_input("consumption.monthly_kwh", "must have 12 entries"))?;

    let price_eur_per_kwh = request.effective_price(&config.tariffs);
    let feed_in_enabled = request.feed_in_enabled();
    let reference_kwc = request
        .production
        .reference_kwc
        .unwrap_or(config.simulation.reference_kwc);

    let inputs = EvaluationInputs {
        production: &production,
        consumption: &consumption,
        reference_kwc,
        price_eur_per_kwh,
        feed_in_enabled,
    };

    let forced = request.forced.as_ref();
    let with_battery_units = resolve_battery_units(
        request.battery.enabled,
        request.battery.units_requested,
        forced.and_then(|f| f.battery_units),
        forced.and_then(|f| f.variant),
        config.battery.max_units,
    );

    // A forced size pins both candidates and bypasses the sweep.
    let (plan, outcome) = match forced.and_then(|f| f.kwc) {
        Some(kwc) => {
            let panels = ((kwc / config.optimizer.panel_kwc).round() as u32).max(1);
            let plan = ScenarioPlan {
                panels_a: panels,
                kwc_a: kwc,
                panels_b: panels,
                kwc_b: kwc,
                with_battery_units,
            };
            (plan, None)
        }
        None => {
            let outcome = search(&inputs, &config, request.max_panels, request.budget_eur)?;
            let plan = ScenarioPlan {
                panels_a: outcome.a.panels,
                kwc_a: outcome.a.kwc,
                panels_b: outcome.b.panels,
                kwc_b: outcome.b.kwc,
                with_battery_units,
            };
            (plan, Some(outcome))
        }
    };

    let set = assemble(&inputs, &plan, &config);

    let report = audit_scenarios(&set, &config);
    if !report.ok {
        return Err(CalcError::AuditFailed {
            issues: report.issues,
        });
    }

    let ctx = ResponseContext {
        set: &set,
        candidates: outcome.as_ref().map(|o| (&o.a, &o.b)),
        audit: &report,
        price_eur_per_kwh,
        feed_in_enabled,
        battery_enabled: request.battery.enabled,
        battery_units_requested: request.battery.units_requested,
        forced,
        config: &config,
    };
    Ok(build_response(&ctx))
}

#[cfg(test)]
mod tests {
    use super::run_calculation;
    use crate::config::EngineConfig;
    use crate::error::CalcError;
    use crate::request::CalcRequest;
    use serde_json::json;

    fn fixture_json() -> serde_json::Value {
        json!({
            "production": {
                "monthly_kwh": [500.0, 450.0, 600.0, 650.0, 700.0, 750.0,
                                780.0, 740.0, 600.0, 550.0, 480.0, 420.0]
            },
            "consumption": { "monthly_kwh": vec![580.0; 12] },
            "tariffs": { "effective_price_eur_kwh": 0.1952 }
        })
    }

    fn fixture_request() -> CalcRequest {
        serde_json::from_value(fixture_json()).expect("fixture parses")
    }

    #[test]
    fn fixture_request_completes() {
        let config = EngineConfig::default();
        let resp = run_calculation(&fixture_request(), &config).expect("pipeline runs");
        assert!(resp.ok);
        assert!(resp.audit.ok);
        assert_eq!(resp.scenarios.a1.months.len(), 12);
        assert_eq!(resp.scenarios.b2.projection.len(), 25);
        assert!(resp.selection.a.score.is_some());
        assert!(resp.scenarios.a1.kpi.payback_years.is_some());
        assert!(resp.forced.is_none());
    }

    #[test]
    fn two_runs_serialize_identically() {
        let config = EngineConfig::default();
        let request = fixture_request();
        let first = serde_json::to_string(&run_calculation(&request, &config).expect("first run"))
            .expect("serializes");
        let second = serde_json::to_string(&run_calculation(&request, &config).expect("second run"))
            .expect("serializes");
        assert_eq!(first, second);
    }

    #[test]
    fn forced_size_pins_both_candidates() {
        let config = EngineConfig::default();
        let mut value = fixture_json();
        value["forced"] = json!({ "kwc": 4.85 });
        let request: CalcRequest = serde_json::from_value(value).expect("parses");
        let resp = run_calculation(&request, &config).expect("forced run");
        assert_eq!(resp.selection.a.kwc, 4.85);
        assert_eq!(resp.selection.b.kwc, 4.85);
        assert!(resp.selection.a.score.is_none());
        assert_eq!(resp.scenarios.a1.panels, 10);
        assert!(resp.forced.is_some());
    }

    #[test]
    fn budget_caps_selected_capex() {
        let config = EngineConfig::default();
        let mut value = fixture_json();
        value["budget_eur"] = json!(10_000.0);
        let request: CalcRequest = serde_json::from_value(value).expect("parses");
        let resp = run_calculation(&request, &config).expect("budget run");
        assert!(resp.selection.a.capex_eur <= 10_000.0);
        assert!(resp.selection.b.capex_eur <= 10_000.0);
    }

    #[test]
    fn forced_variant_disables_storage_everywhere() {
        let config = EngineConfig::default();
        let mut value = fixture_json();
        value["battery"] = json!({ "enabled": true, "units_requested": 2 });
        value["forced"] = json!({ "variant": "without_battery" });
        let request: CalcRequest = serde_json::from_value(value).expect("parses");
        let resp = run_calculation(&request, &config).expect("runs");
        assert_eq!(resp.scenarios.a2.battery_units, 0);
        assert_eq!(resp.scenarios.b2.battery_units, 0);
    }

    #[test]
    fn short_profile_is_rejected() {
        let config = EngineConfig::default();
        let request: CalcRequest = serde_json::from_value(json!({
            "production": { "monthly_kwh": [500.0, 450.0] },
            "consumption": { "monthly_kwh": vec![580.0; 12] }
        }))
        .expect("parses");
        match run_calculation(&request, &config) {
            Err(CalcError::InvalidInput { field, .. }) => {
                assert!(field.contains("production"));
            }
            other => panic!("expected invalid input, got {other:?}"),
        }
    }
}
