//! Outbound payload: wire structures, chart aggregates and the output
//! rounding contract. The core computes on unrounded values; rounding
//! happens here and nowhere else.

use serde::Serialize;

use crate::audit::{AuditReport, Severity};
use crate::config::EngineConfig;
use crate::optimizer::Candidate;
use crate::request::ForcedOverride;
use crate::scenario::{Scenario, ScenarioLabel, ScenarioSet};
use crate::sim::types::MONTH_NAMES;

/// Two decimals: currency and energy amounts.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Four decimals: unit rates (EUR/kWh).
fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Five decimals: composite scores.
fn round5(v: f64) -> f64 {
    (v * 100_000.0).round() / 100_000.0
}

/// Everything the response builder needs from the pipeline.
pub struct ResponseContext<'a> {
    pub set: &'a ScenarioSet,
    /// Ranked candidates behind sizes A and B; absent under forced sizing.
    pub candidates: Option<(&'a Candidate, &'a Candidate)>,
    pub audit: &'a AuditReport,
    pub price_eur_per_kwh: f64,
    pub feed_in_enabled: bool,
    pub battery_enabled: bool,
    pub battery_units_requested: u8,
    pub forced: Option<&'a ForcedOverride>,
    pub config: &'a EngineConfig,
}

/// Top-level calculation response.
#[derive(Debug, Clone, Serialize)]
pub struct CalcResponse {
    pub ok: bool,
    pub meta: Meta,
    pub selection: Selection,
    pub winner: Winner,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced: Option<ForcedEcho>,
    pub scenarios: Scenarios,
    pub charts: Charts,
    pub audit: AuditReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    /// Identifier of the ranking rule.
    pub algorithm: String,
    pub effective_price_eur_kwh: f64,
    pub horizon_years: u32,
    pub feed_in: FeedInMeta,
    pub battery: BatteryMeta,
    /// Boundary marker: "unchecked" from the core, rewritten by the
    /// boundary after schema validation.
    pub schema_validation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedInMeta {
    pub enabled: bool,
    pub rate_low_eur_kwh: f64,
    pub rate_high_eur_kwh: f64,
    pub tier_threshold_kwc: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatteryMeta {
    pub enabled: bool,
    pub units_requested: u8,
    pub unit_kwh: f64,
    pub unit_price_eur: f64,
    pub max_units: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub a: SelectedSize,
    pub b: SelectedSize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedSize {
    pub panels: u32,
    pub kwc: f64,
    pub variant: String,
    pub capex_eur: f64,
    pub irr_pct: f64,
    /// Composite sweep score; absent under forced sizing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Winner {
    pub code: String,
    pub reason: String,
}

/// Echo of the applied forced override.
#[derive(Debug, Clone, Serialize)]
pub struct ForcedEcho {
    pub kwc: Option<f64>,
    pub battery_units: Option<u8>,
    pub variant: Option<String>,
    pub feed_in_enabled: Option<bool>,
}

/// The four scenarios under their fixed codes.
#[derive(Debug, Clone, Serialize)]
pub struct Scenarios {
    #[serde(rename = "A1")]
    pub a1: ScenarioPayload,
    #[serde(rename = "A2")]
    pub a2: ScenarioPayload,
    #[serde(rename = "B1")]
    pub b1: ScenarioPayload,
    #[serde(rename = "B2")]
    pub b2: ScenarioPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioPayload {
    pub label: String,
    pub panels: u32,
    pub kwc: f64,
    pub battery_units: u8,
    pub battery_capacity_kwh: f64,
    pub feed_in_rate_eur_kwh: f64,
    pub premium_eur: f64,
    pub months: Vec<MonthRow>,
    pub annual: AnnualBlock,
    pub capex: CapexBlock,
    pub projection: Vec<YearBlock>,
    pub kpi: KpiBlock,
    /// True when no error-severity audit issue concerns this scenario.
    pub audit_ok: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthRow {
    pub month: &'static str,
    pub production_kwh: f64,
    pub consumption_kwh: f64,
    pub self_consumption_kwh: f64,
    pub surplus_kwh: f64,
    pub grid_import_kwh: f64,
    pub saving_eur: f64,
    pub feed_in_eur: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnualBlock {
    pub production_kwh: f64,
    pub consumption_kwh: f64,
    pub self_consumption_kwh: f64,
    pub surplus_kwh: f64,
    pub grid_import_kwh: f64,
    pub saving_eur: f64,
    pub feed_in_eur: f64,
    pub self_consumption_pct: f64,
    pub self_production_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapexBlock {
    pub materials_before_tax_eur: f64,
    pub materials_after_tax_eur: f64,
    pub labor_before_tax_eur: f64,
    pub labor_after_tax_eur: f64,
    pub total_eur: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearBlock {
    pub year: u32,
    pub production_kwh: f64,
    pub saving_eur: f64,
    pub feed_in_eur: f64,
    pub gain_eur: f64,
    pub cumulative_gain_eur: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiBlock {
    pub payback_years: Option<u32>,
    pub annual_roi_pct: f64,
    pub irr_pct: f64,
    pub lcoe_eur_per_kwh: f64,
    pub self_consumption_pct: f64,
    pub self_production_pct: f64,
    pub year1_gains_eur: f64,
    pub horizon_gains_eur: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Charts {
    /// Monthly production split for scenario A1.
    pub monthly_stacked: Vec<StackedMonthRow>,
    /// Gains over the horizon for scenario A1.
    pub cumulative_gains: Vec<CumulativeGainRow>,
    pub kpi_comparison: Vec<KpiComparisonRow>,
    pub battery_impact_a: BatteryImpact,
    pub battery_impact_b: BatteryImpact,
}

#[derive(Debug, Clone, Serialize)]
pub struct StackedMonthRow {
    pub month: &'static str,
    pub production_kwh: f64,
    pub consumption_kwh: f64,
    pub self_consumption_kwh: f64,
    pub surplus_kwh: f64,
    pub grid_import_kwh: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CumulativeGainRow {
    pub year: u32,
    pub annual_gain_eur: f64,
    pub cumulative_gain_eur: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiComparisonRow {
    pub scenario: String,
    pub annual_roi_pct: f64,
    pub irr_pct: f64,
    pub lcoe_eur_per_kwh: f64,
    pub horizon_gains_eur: f64,
}

/// One size with and without storage, plus the deltas between the two.
#[derive(Debug, Clone, Serialize)]
pub struct BatteryImpact {
    pub without_battery: ImpactSide,
    pub with_battery: ImpactSide,
    pub deltas: ImpactSide,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpactSide {
    pub self_production_pct: f64,
    pub annual_roi_pct: f64,
    pub irr_pct: f64,
    pub surplus_kwh: f64,
}

fn month_row(m: &crate::sim::types::MonthlyResult) -> MonthRow {
    MonthRow {
        month: MONTH_NAMES[m.month - 1],
        production_kwh: round2(m.production_kwh),
        consumption_kwh: round2(m.consumption_kwh),
        self_consumption_kwh: round2(m.self_consumption_kwh),
        surplus_kwh: round2(m.surplus_kwh),
        grid_import_kwh: round2(m.grid_import_kwh),
        saving_eur: round2(m.saving_eur),
        feed_in_eur: round2(m.feed_in_eur),
    }
}

fn scenario_audit_ok(audit: &AuditReport, label: ScenarioLabel) -> bool {
    !audit
        .issues
        .iter()
        .any(|i| i.severity == Severity::Error && i.scenario == label.as_str())
}

fn scenario_payload(sc: &Scenario, audit_ok: bool) -> ScenarioPayload {
    let eval = &sc.evaluation;
    let totals = &eval.totals;
    ScenarioPayload {
        label: sc.label.as_str().to_string(),
        panels: eval.installation.panels,
        kwc: round2(eval.installation.kwc),
        battery_units: eval.installation.battery.units,
        battery_capacity_kwh: round2(eval.installation.battery.capacity_kwh()),
        feed_in_rate_eur_kwh: round4(eval.feed_in_rate_eur_per_kwh),
        premium_eur: round2(eval.premium_eur),
        months: eval.months.iter().map(month_row).collect(),
        annual: AnnualBlock {
            production_kwh: round2(totals.production_kwh),
            consumption_kwh: round2(totals.consumption_kwh),
            self_consumption_kwh: round2(totals.self_consumption_kwh),
            surplus_kwh: round2(totals.surplus_kwh),
            grid_import_kwh: round2(totals.grid_import_kwh),
            saving_eur: round2(totals.saving_eur),
            feed_in_eur: round2(totals.feed_in_eur),
            self_consumption_pct: round2(totals.self_consumption_pct),
            self_production_pct: round2(totals.self_production_pct),
        },
        capex: CapexBlock {
            materials_before_tax_eur: round2(eval.capex.materials_before_tax_eur),
            materials_after_tax_eur: round2(eval.capex.materials_after_tax_eur),
            labor_before_tax_eur: round2(eval.capex.labor_before_tax_eur),
            labor_after_tax_eur: round2(eval.capex.labor_after_tax_eur),
            total_eur: round2(eval.capex.total_eur),
        },
        projection: eval
            .projection
            .iter()
            .map(|y| YearBlock {
                year: y.year,
                production_kwh: round2(y.production_kwh),
                saving_eur: round2(y.saving_eur),
                feed_in_eur: round2(y.feed_in_eur),
                gain_eur: round2(y.gain_eur),
                cumulative_gain_eur: round2(y.cumulative_gain_eur),
            })
            .collect(),
        kpi: KpiBlock {
            payback_years: eval.kpi.payback_years,
            annual_roi_pct: round2(eval.kpi.annual_roi_pct),
            irr_pct: round2(eval.kpi.irr_pct),
            lcoe_eur_per_kwh: round4(eval.kpi.lcoe_eur_per_kwh),
            self_consumption_pct: round2(eval.kpi.self_consumption_pct),
            self_production_pct: round2(eval.kpi.self_production_pct),
            year1_gains_eur: round2(eval.kpi.year1_gains_eur),
            horizon_gains_eur: round2(eval.kpi.horizon_gains_eur),
        },
        audit_ok,
    }
}

fn selected_size(candidate: Option<&Candidate>, fallback: &Scenario) -> SelectedSize {
    match candidate {
        Some(c) => SelectedSize {
            panels: c.panels,
            kwc: round2(c.kwc),
            variant: c.variant.as_str().to_string(),
            capex_eur: round2(c.capex_eur),
            irr_pct: round2(c.irr_pct),
            score: Some(round5(c.score)),
        },
        None => {
            let eval = &fallback.evaluation;
            SelectedSize {
                panels: eval.installation.panels,
                kwc: round2(eval.installation.kwc),
                variant: fallback.label.variant().as_str().to_string(),
                capex_eur: round2(eval.capex.total_eur),
                irr_pct: round2(eval.kpi.irr_pct),
                score: None,
            }
        }
    }
}

fn impact_side(sc: &Scenario) -> ImpactSide {
    ImpactSide {
        self_production_pct: round2(sc.evaluation.totals.self_production_pct),
        annual_roi_pct: round2(sc.evaluation.kpi.annual_roi_pct),
        irr_pct: round2(sc.evaluation.kpi.irr_pct),
        surplus_kwh: round2(sc.evaluation.totals.surplus_kwh),
    }
}

fn battery_impact(without: &Scenario, with: &Scenario) -> BatteryImpact {
    let lhs = impact_side(without);
    let rhs = impact_side(with);
    let deltas = ImpactSide {
        self_production_pct: round2(
            with.evaluation.totals.self_production_pct
                - without.evaluation.totals.self_production_pct,
        ),
        annual_roi_pct: round2(
            with.evaluation.kpi.annual_roi_pct - without.evaluation.kpi.annual_roi_pct,
        ),
        irr_pct: round2(with.evaluation.kpi.irr_pct - without.evaluation.kpi.irr_pct),
        surplus_kwh: round2(
            with.evaluation.totals.surplus_kwh - without.evaluation.totals.surplus_kwh,
        ),
    };
    BatteryImpact {
        without_battery: lhs,
        with_battery: rhs,
        deltas,
    }
}

fn forced_echo(forced: &ForcedOverride) -> ForcedEcho {
    ForcedEcho {
        kwc: forced.kwc,
        battery_units: forced.battery_units,
        variant: forced.variant.map(|v| v.as_str().to_string()),
        feed_in_enabled: forced.feed_in_enabled,
    }
}

/// Maps the pipeline outcome onto the wire payload.
pub fn build_response(ctx: &ResponseContext<'_>) -> CalcResponse {
    let set = ctx.set;
    let a1 = set.get(ScenarioLabel::A1);
    let a2 = set.get(ScenarioLabel::A2);
    let b1 = set.get(ScenarioLabel::B1);
    let b2 = set.get(ScenarioLabel::B2);

    let monthly_stacked = a1
        .evaluation
        .months
        .iter()
        .map(|m| StackedMonthRow {
            month: MONTH_NAMES[m.month - 1],
            production_kwh: round2(m.production_kwh),
            consumption_kwh: round2(m.consumption_kwh),
            self_consumption_kwh: round2(m.self_consumption_kwh),
            surplus_kwh: round2(m.surplus_kwh),
            grid_import_kwh: round2(m.grid_import_kwh),
        })
        .collect();

    let cumulative_gains = a1
        .evaluation
        .projection
        .iter()
        .map(|y| CumulativeGainRow {
            year: y.year,
            annual_gain_eur: round2(y.gain_eur),
            cumulative_gain_eur: round2(y.cumulative_gain_eur),
        })
        .collect();

    let kpi_comparison = set
        .scenarios
        .iter()
        .map(|sc| KpiComparisonRow {
            scenario: sc.label.as_str().to_string(),
            annual_roi_pct: round2(sc.evaluation.kpi.annual_roi_pct),
            irr_pct: round2(sc.evaluation.kpi.irr_pct),
            lcoe_eur_per_kwh: round4(sc.evaluation.kpi.lcoe_eur_per_kwh),
            horizon_gains_eur: round2(sc.evaluation.kpi.horizon_gains_eur),
        })
        .collect();

    let tariffs = &ctx.config.tariffs;
    let battery = &ctx.config.battery;

    CalcResponse {
        ok: true,
        meta: Meta {
            algorithm: "IRR>ROI>Gains + self-production score".to_string(),
            effective_price_eur_kwh: round4(ctx.price_eur_per_kwh),
            horizon_years: tariffs.horizon_years,
            feed_in: FeedInMeta {
                enabled: ctx.feed_in_enabled,
                rate_low_eur_kwh: round4(tariffs.feed_in_rate_low_eur_per_kwh),
                rate_high_eur_kwh: round4(tariffs.feed_in_rate_high_eur_per_kwh),
                tier_threshold_kwc: tariffs.tier_threshold_kwc,
            },
            battery: BatteryMeta {
                enabled: ctx.battery_enabled,
                units_requested: ctx.battery_units_requested,
                unit_kwh: battery.unit_kwh,
                unit_price_eur: battery.unit_price_eur,
                max_units: battery.max_units,
            },
            schema_validation: "unchecked".to_string(),
        },
        selection: Selection {
            a: selected_size(ctx.candidates.map(|(a, _)| a), a1),
            b: selected_size(ctx.candidates.map(|(_, b)| b), b1),
        },
        winner: Winner {
            code: set.winner.as_str().to_string(),
            reason: set.winner_reason.clone(),
        },
        forced: ctx.forced.map(forced_echo),
        scenarios: Scenarios {
            a1: scenario_payload(a1, scenario_audit_ok(ctx.audit, ScenarioLabel::A1)),
            a2: scenario_payload(a2, scenario_audit_ok(ctx.audit, ScenarioLabel::A2)),
            b1: scenario_payload(b1, scenario_audit_ok(ctx.audit, ScenarioLabel::B1)),
            b2: scenario_payload(b2, scenario_audit_ok(ctx.audit, ScenarioLabel::B2)),
        },
        charts: Charts {
            monthly_stacked,
            cumulative_gains,
            kpi_comparison,
            battery_impact_a: battery_impact(a1, a2),
            battery_impact_b: battery_impact(b1, b2),
        },
        audit: ctx.audit.clone(),
    }
}
