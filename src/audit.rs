//! Consistency audit: re-derives annual sums and cross-checks every
//! scenario against energy identities, tariff rules and KPI sanity
//! bounds. Reports issues, never mutates results.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::scenario::{Scenario, ScenarioSet};

const EPS: f64 = 1e-6;
/// Tolerance on tier feed-in rates (EUR/kWh).
const RATE_EPS: f64 = 0.0005;
/// Tolerance on premium and battery prices (EUR).
const PRICE_EPS: f64 = 1.0;
/// Tolerance on the annual energy identities (kWh).
const IDENTITY_TOLERANCE: f64 = 0.5;

/// Whether an issue blocks the response or only annotates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One audit finding, attached to the scenario it concerns.
#[derive(Debug, Clone, Serialize)]
pub struct AuditIssue {
    pub severity: Severity,
    /// Stable machine-readable code.
    pub code: String,
    pub message: String,
    /// Scenario label the issue concerns.
    pub scenario: String,
}

/// Aggregate outcome over a batch of scenarios.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// True when no error-severity issue fired anywhere.
    pub ok: bool,
    pub issues: Vec<AuditIssue>,
}

/// Adaptive tolerance for comparing a re-derived sum to a reported total.
fn annual_tolerance(target: f64) -> f64 {
    (0.001 * target.abs().max(1.0)).max(0.05)
}

fn error(issues: &mut Vec<AuditIssue>, label: &str, code: &str, message: String) {
    issues.push(AuditIssue {
        severity: Severity::Error,
        code: code.to_string(),
        message,
        scenario: label.to_string(),
    });
}

fn warning(issues: &mut Vec<AuditIssue>, label: &str, code: &str, message: String) {
    issues.push(AuditIssue {
        severity: Severity::Warning,
        code: code.to_string(),
        message,
        scenario: label.to_string(),
    });
}

fn check_monthly(sc: &Scenario, issues: &mut Vec<AuditIssue>) {
    let label = sc.label.as_str();
    let months = &sc.evaluation.months;
    if months.len() != 12 {
        error(
            issues,
            label,
            "MONTH_LEN",
            format!("monthly series holds {} entries, expected 12", months.len()),
        );
        return;
    }

    let fields: [(&str, fn(&crate::sim::types::MonthlyResult) -> f64); 5] = [
        ("production_kwh", |m| m.production_kwh),
        ("consumption_kwh", |m| m.consumption_kwh),
        ("self_consumption_kwh", |m| m.self_consumption_kwh),
        ("surplus_kwh", |m| m.surplus_kwh),
        ("grid_import_kwh", |m| m.grid_import_kwh),
    ];
    for (name, get) in fields {
        if months.iter().any(|m| get(m) < -EPS) {
            error(
                issues,
                label,
                &format!("MONTH_NEG_{}", name.to_uppercase()),
                format!("{name} holds negative monthly values"),
            );
        }
    }

    for m in months {
        if m.self_consumption_kwh > m.production_kwh + IDENTITY_TOLERANCE {
            error(
                issues,
                label,
                "SELF_ABOVE_PRODUCTION",
                format!(
                    "month {}: self-consumption {:.2} exceeds production {:.2}",
                    m.month, m.self_consumption_kwh, m.production_kwh
                ),
            );
        }
        if m.self_consumption_kwh > m.consumption_kwh + IDENTITY_TOLERANCE {
            error(
                issues,
                label,
                "SELF_ABOVE_CONSUMPTION",
                format!(
                    "month {}: self-consumption {:.2} exceeds consumption {:.2}",
                    m.month, m.self_consumption_kwh, m.consumption_kwh
                ),
            );
        }
    }
}

fn check_annual(sc: &Scenario, issues: &mut Vec<AuditIssue>) {
    let label = sc.label.as_str();
    let months = &sc.evaluation.months;
    let totals = &sc.evaluation.totals;

    let resummed: [(&str, f64, f64); 5] = [
        (
            "production_kwh",
            months.iter().map(|m| m.production_kwh).sum(),
            totals.production_kwh,
        ),
        (
            "consumption_kwh",
            months.iter().map(|m| m.consumption_kwh).sum(),
            totals.consumption_kwh,
        ),
        (
            "self_consumption_kwh",
            months.iter().map(|m| m.self_consumption_kwh).sum(),
            totals.self_consumption_kwh,
        ),
        (
            "surplus_kwh",
            months.iter().map(|m| m.surplus_kwh).sum(),
            totals.surplus_kwh,
        ),
        (
            "grid_import_kwh",
            months.iter().map(|m| m.grid_import_kwh).sum(),
            totals.grid_import_kwh,
        ),
    ];
    for (name, from_months, reported) in resummed {
        let diff = (from_months - reported).abs();
        if diff > annual_tolerance(reported) {
            error(
                issues,
                label,
                &format!("ANNUAL_MISMATCH_{}", name.to_uppercase()),
                format!(
                    "monthly sum of {name} ({from_months:.2}) differs from reported annual ({reported:.2})"
                ),
            );
        }
    }

    if (totals.production_kwh - (totals.self_consumption_kwh + totals.surplus_kwh)).abs()
        > IDENTITY_TOLERANCE
    {
        error(
            issues,
            label,
            "IDENTITY_PRODUCTION",
            "production_kwh must equal self_consumption_kwh + surplus_kwh (±0.5 kWh)".to_string(),
        );
    }
    if (totals.consumption_kwh - (totals.self_consumption_kwh + totals.grid_import_kwh)).abs()
        > IDENTITY_TOLERANCE
    {
        error(
            issues,
            label,
            "IDENTITY_CONSUMPTION",
            "consumption_kwh must equal self_consumption_kwh + grid_import_kwh (±0.5 kWh)"
                .to_string(),
        );
    }

    let ratios = [
        ("RATIO_SELF_CONSUMPTION", totals.self_consumption_pct),
        ("RATIO_SELF_PRODUCTION", totals.self_production_pct),
    ];
    for (code, pct) in ratios {
        if !(-EPS..=100.0 + EPS).contains(&pct) {
            error(
                issues,
                label,
                code,
                format!("ratio out of bounds (0-100): {pct:.2}%"),
            );
        }
    }
}

fn check_tariffs(sc: &Scenario, config: &EngineConfig, issues: &mut Vec<AuditIssue>) {
    let label = sc.label.as_str();
    let eval = &sc.evaluation;
    let kwc = eval.installation.kwc;

    if kwc <= 0.0 {
        error(
            issues,
            label,
            "KWC_NOT_POSITIVE",
            format!("nameplate power must be > 0 kWc, got {kwc}"),
        );
    }

    let expected_rate = if eval.feed_in_enabled {
        config.tariffs.feed_in_rate_for(kwc)
    } else {
        0.0
    };
    if (eval.feed_in_rate_eur_per_kwh - expected_rate).abs() > RATE_EPS {
        error(
            issues,
            label,
            "FEED_IN_RATE",
            format!(
                "feed-in rate {} EUR/kWh does not match the tier rule for {kwc} kWc (expected {})",
                eval.feed_in_rate_eur_per_kwh, expected_rate
            ),
        );
    }

    let expected_premium = config.tariffs.premium_for(kwc);
    if (eval.premium_eur - expected_premium).abs() > PRICE_EPS {
        error(
            issues,
            label,
            "PREMIUM",
            format!(
                "premium {:.2} EUR does not match the tiered rule (expected ~{:.2} EUR)",
                eval.premium_eur, expected_premium
            ),
        );
    }
}

fn check_battery(sc: &Scenario, config: &EngineConfig, issues: &mut Vec<AuditIssue>) {
    let label = sc.label.as_str();
    let battery = &sc.evaluation.installation.battery;

    if battery.units > config.battery.max_units {
        error(
            issues,
            label,
            "BATTERY_UNITS",
            format!(
                "battery unit count {} above maximum {}",
                battery.units, config.battery.max_units
            ),
        );
    }
    if battery.units > 0 {
        if battery.unit_kwh <= 0.0 {
            error(
                issues,
                label,
                "BATTERY_CAPACITY",
                "battery unit capacity must be > 0 kWh".to_string(),
            );
        }
        if (battery.unit_price_eur - config.battery.unit_price_eur).abs() > PRICE_EPS {
            error(
                issues,
                label,
                "BATTERY_PRICE",
                format!(
                    "battery unit price {:.2} EUR does not match the reference {:.2} EUR",
                    battery.unit_price_eur, config.battery.unit_price_eur
                ),
            );
        }
    }
}

fn check_projection(sc: &Scenario, config: &EngineConfig, issues: &mut Vec<AuditIssue>) {
    let label = sc.label.as_str();
    let projection = &sc.evaluation.projection;
    let horizon = config.tariffs.horizon_years as usize;

    if projection.len() != horizon {
        error(
            issues,
            label,
            "PROJECTION_LEN",
            format!(
                "projection holds {} years, expected {horizon}",
                projection.len()
            ),
        );
    }
    for pair in projection.windows(2) {
        if pair[1].cumulative_gain_eur < pair[0].cumulative_gain_eur - EPS {
            error(
                issues,
                label,
                "CUMULATIVE_DECREASING",
                format!(
                    "cumulative gain decreases from year {} to year {}",
                    pair[0].year, pair[1].year
                ),
            );
            break;
        }
    }
}

fn check_economics(sc: &Scenario, issues: &mut Vec<AuditIssue>) {
    let label = sc.label.as_str();
    let kpi = &sc.evaluation.kpi;

    if !kpi.horizon_gains_eur.is_finite() {
        error(
            issues,
            label,
            "HORIZON_GAINS",
            "horizon gains missing or non-finite".to_string(),
        );
    }
    if kpi.lcoe_eur_per_kwh < 0.0 {
        error(
            issues,
            label,
            "LCOE_NEGATIVE",
            format!("LCOE cannot be negative, got {:.4}", kpi.lcoe_eur_per_kwh),
        );
    }
    if kpi.payback_years.is_none() {
        warning(
            issues,
            label,
            "PAYBACK_NOT_REACHED",
            "no payback within the projection horizon".to_string(),
        );
    }
    if kpi.irr_pct < -100.0 {
        warning(
            issues,
            label,
            "IRR_VERY_LOW",
            format!("IRR extremely low ({:.2}%)", kpi.irr_pct),
        );
    }
}

/// Runs every check against one scenario.
pub fn audit_scenario(sc: &Scenario, config: &EngineConfig) -> Vec<AuditIssue> {
    let mut issues = Vec::new();
    check_monthly(sc, &mut issues);
    check_annual(sc, &mut issues);
    check_tariffs(sc, config, &mut issues);
    check_battery(sc, config, &mut issues);
    check_projection(sc, config, &mut issues);
    check_economics(sc, &mut issues);
    issues
}

/// Audits every scenario of a set. The aggregate is ok only when every
/// scenario passed without an error-severity issue.
pub fn audit_scenarios(set: &ScenarioSet, config: &EngineConfig) -> AuditReport {
    let mut issues = Vec::new();
    for sc in &set.scenarios {
        issues.extend(audit_scenario(sc, config));
    }
    let ok = !issues.iter().any(|i| i.severity == Severity::Error);
    AuditReport { ok, issues }
}
