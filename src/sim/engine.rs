//! One-candidate evaluation: balance, pricing, projection and KPIs for a
//! single installation. Shared by the optimizer sweep and the scenario
//! assembler.

use crate::config::EngineConfig;
use crate::sim::balance::{BalanceParams, TransferModel, simulate_months};
use crate::sim::capex::compute_capex;
use crate::sim::finance::{KpiSet, project_years};
use crate::sim::types::{
    AnnualTotals, BatterySpec, CapexBreakdown, Installation, MonthlyProfile, MonthlyResult, YearRow,
};

/// Request-level inputs shared by every candidate of one computation.
#[derive(Debug, Clone)]
pub struct EvaluationInputs<'a> {
    /// Monthly production profile at the reference power (kWh).
    pub production: &'a MonthlyProfile,
    /// Monthly consumption profile (kWh).
    pub consumption: &'a MonthlyProfile,
    /// Nameplate power the production profile is quoted at (kWc).
    pub reference_kwc: f64,
    /// Effective purchase price (EUR/kWh).
    pub price_eur_per_kwh: f64,
    /// Whether surplus is sold at the tier rate.
    pub feed_in_enabled: bool,
}

/// One fully evaluated installation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// The sized installation.
    pub installation: Installation,
    /// Whether feed-in was active for this evaluation.
    pub feed_in_enabled: bool,
    /// Feed-in rate actually applied (EUR/kWh, 0 when disabled).
    pub feed_in_rate_eur_per_kwh: f64,
    /// Purchase price actually applied (EUR/kWh).
    pub price_eur_per_kwh: f64,
    /// Year-1 incentive premium (EUR).
    pub premium_eur: f64,
    /// Twelve monthly balance rows.
    pub months: Vec<MonthlyResult>,
    /// Annual sums and coverage ratios.
    pub totals: AnnualTotals,
    /// Upfront cost breakdown.
    pub capex: CapexBreakdown,
    /// Year-by-year projection over the horizon.
    pub projection: Vec<YearRow>,
    /// Headline indicators.
    pub kpi: KpiSet,
}

/// Nameplate power of a panel count, rounded to the 2 decimals candidate
/// sizes are quoted in.
pub fn nameplate_kwc(panels: u32, panel_kwc: f64) -> f64 {
    (f64::from(panels) * panel_kwc * 100.0).round() / 100.0
}

/// Builds the installation for a panel count and battery unit count using
/// the configured catalogue.
pub fn installation_for(panels: u32, battery_units: u8, config: &EngineConfig) -> Installation {
    Installation {
        panels,
        kwc: nameplate_kwc(panels, config.optimizer.panel_kwc),
        battery: BatterySpec {
            units: battery_units,
            unit_kwh: config.battery.unit_kwh,
            unit_price_eur: config.battery.unit_price_eur,
        },
    }
}

/// Runs the full pipeline for one installation.
pub fn evaluate(
    inputs: &EvaluationInputs<'_>,
    installation: Installation,
    config: &EngineConfig,
) -> Evaluation {
    let feed_in_rate_eur_per_kwh = if inputs.feed_in_enabled {
        config.tariffs.feed_in_rate_for(installation.kwc)
    } else {
        0.0
    };
    let transfer_model = TransferModel::from_name(&config.simulation.transfer_model)
        .unwrap_or(TransferModel::DailyCycle);

    // production is quoted at the reference power and restated per size
    let production = inputs.production.scaled(installation.kwc / inputs.reference_kwc);

    let params = BalanceParams {
        price_eur_per_kwh: inputs.price_eur_per_kwh,
        feed_in_rate_eur_per_kwh,
        battery_capacity_kwh: installation.battery.capacity_kwh(),
        depth_of_discharge: config.battery.depth_of_discharge,
        cycles_per_day: config.battery.cycles_per_day,
        transfer_model,
        self_consumption_factor: config.simulation.self_consumption_factor,
    };
    let months = simulate_months(&production, inputs.consumption, &params);
    let totals = AnnualTotals::from_months(&months);

    let capex = compute_capex(&installation, &config.pricing);
    let premium_eur = config.tariffs.premium_for(installation.kwc);
    let projection = project_years(
        &totals,
        premium_eur,
        inputs.price_eur_per_kwh,
        feed_in_rate_eur_per_kwh,
        &config.tariffs,
    );
    let kpi = KpiSet::from_projection(&totals, &projection, capex.total_eur);

    Evaluation {
        installation,
        feed_in_enabled: inputs.feed_in_enabled,
        feed_in_rate_eur_per_kwh,
        price_eur_per_kwh: inputs.price_eur_per_kwh,
        premium_eur,
        months,
        totals,
        capex,
        projection,
        kpi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROD: [f64; 12] = [
        500.0, 450.0, 600.0, 650.0, 700.0, 750.0, 780.0, 740.0, 600.0, 550.0, 480.0, 420.0,
    ];

    fn inputs<'a>(
        production: &'a MonthlyProfile,
        consumption: &'a MonthlyProfile,
    ) -> EvaluationInputs<'a> {
        EvaluationInputs {
            production,
            consumption,
            reference_kwc: 3.4,
            price_eur_per_kwh: 0.1952,
            feed_in_enabled: true,
        }
    }

    #[test]
    fn nameplate_rounds_to_two_decimals() {
        assert_eq!(nameplate_kwc(6, 0.485), 2.91);
        assert_eq!(nameplate_kwc(19, 0.485), 9.22);
        assert_eq!(nameplate_kwc(74, 0.485), 35.89);
    }

    #[test]
    fn evaluation_is_internally_consistent() {
        let config = EngineConfig::default();
        let production = MonthlyProfile::new(PROD);
        let consumption = MonthlyProfile::new([580.0; 12]);
        let eval = evaluate(
            &inputs(&production, &consumption),
            installation_for(6, 0, &config),
            &config,
        );

        assert_eq!(eval.months.len(), 12);
        assert_eq!(eval.projection.len(), 25);
        assert!(eval.capex.total_eur > 0.0);
        assert!(eval.kpi.lcoe_eur_per_kwh > 0.0);

        let monthly_prod: f64 = eval.months.iter().map(|m| m.production_kwh).sum();
        assert!((monthly_prod - eval.totals.production_kwh).abs() < 1e-9);
        let monthly_self: f64 = eval.months.iter().map(|m| m.self_consumption_kwh).sum();
        assert!((monthly_self - eval.totals.self_consumption_kwh).abs() < 1e-9);
    }

    #[test]
    fn low_tier_rate_below_threshold() {
        let config = EngineConfig::default();
        let production = MonthlyProfile::new(PROD);
        let consumption = MonthlyProfile::new([580.0; 12]);
        let eval = evaluate(
            &inputs(&production, &consumption),
            installation_for(6, 0, &config),
            &config,
        );
        assert!((eval.feed_in_rate_eur_per_kwh - 0.04).abs() < 1e-12);
        assert!((eval.premium_eur - 2.91 * 80.0).abs() < 1e-9);
    }

    #[test]
    fn high_tier_rate_at_threshold() {
        let config = EngineConfig::default();
        let production = MonthlyProfile::new(PROD);
        let consumption = MonthlyProfile::new([580.0; 12]);
        // 19 panels = 9.22 kWc, at/above the 9 kWc tier
        let eval = evaluate(
            &inputs(&production, &consumption),
            installation_for(19, 0, &config),
            &config,
        );
        assert!((eval.feed_in_rate_eur_per_kwh - 0.0617).abs() < 1e-12);
        assert!((eval.premium_eur - 9.22 * 180.0).abs() < 1e-9);
    }

    #[test]
    fn feed_in_disabled_zeroes_rate_not_premium() {
        let config = EngineConfig::default();
        let production = MonthlyProfile::new(PROD);
        let consumption = MonthlyProfile::new([580.0; 12]);
        let mut inp = inputs(&production, &consumption);
        inp.feed_in_enabled = false;
        let eval = evaluate(&inp, installation_for(6, 0, &config), &config);
        assert_eq!(eval.feed_in_rate_eur_per_kwh, 0.0);
        assert_eq!(eval.totals.feed_in_eur, 0.0);
        assert!(eval.premium_eur > 0.0);
    }

    #[test]
    fn battery_raises_self_consumption_and_capex() {
        let config = EngineConfig::default();
        let production = MonthlyProfile::new(PROD);
        let consumption = MonthlyProfile::new([580.0; 12]);
        let inp = inputs(&production, &consumption);
        let without = evaluate(&inp, installation_for(6, 0, &config), &config);
        let with = evaluate(&inp, installation_for(6, 1, &config), &config);
        assert!(with.totals.self_consumption_kwh > without.totals.self_consumption_kwh);
        assert!(with.capex.total_eur > without.capex.total_eur);
    }

    #[test]
    fn production_scales_with_nameplate_power() {
        let config = EngineConfig::default();
        let production = MonthlyProfile::new(PROD);
        let consumption = MonthlyProfile::new([580.0; 12]);
        let inp = inputs(&production, &consumption);
        let small = evaluate(&inp, installation_for(6, 0, &config), &config);
        let large = evaluate(&inp, installation_for(12, 0, &config), &config);

        // 6 panels = 2.91 kWc on a 3.4 kWc reference profile
        let expected = production.total() * 2.91 / 3.4;
        assert!((small.totals.production_kwh - expected).abs() < 1e-9);
        // doubling the panel count doubles production
        let ratio = large.totals.production_kwh / small.totals.production_kwh;
        assert!((ratio - 5.82 / 2.91).abs() < 1e-9);
    }
}
