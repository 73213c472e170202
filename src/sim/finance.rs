//! Multi-year financial projection and the headline KPI set.

use std::fmt;

use crate::config::TariffConfig;
use crate::sim::irr;
use crate::sim::types::{AnnualTotals, YearRow};

/// Projects year-1 totals over the configured horizon.
///
/// Self-consumption and surplus scale with the degraded production; the
/// purchase price inflates annually while the feed-in rate stays fixed at
/// its tier value. The premium lands in year 1 only. Every term is
/// non-negative, so the cumulative column never decreases.
pub fn project_years(
    totals: &AnnualTotals,
    premium_eur: f64,
    price_eur_per_kwh: f64,
    feed_in_rate_eur_per_kwh: f64,
    tariffs: &TariffConfig,
) -> Vec<YearRow> {
    let horizon = tariffs.horizon_years;
    let mut rows = Vec::with_capacity(horizon as usize);
    let mut cumulative = 0.0;
    for year in 1..=horizon {
        let scale = (1.0 - tariffs.production_degradation_rate).powi(year as i32 - 1);
        let price_year = price_eur_per_kwh * (1.0 + tariffs.price_inflation_rate).powi(year as i32 - 1);
        let saving_eur = totals.self_consumption_kwh * scale * price_year;
        let feed_in_eur = totals.surplus_kwh * scale * feed_in_rate_eur_per_kwh;
        let premium = if year == 1 { premium_eur } else { 0.0 };
        let gain_eur = saving_eur + feed_in_eur + premium;
        cumulative += gain_eur;
        rows.push(YearRow {
            year,
            production_kwh: totals.production_kwh * scale,
            saving_eur,
            feed_in_eur,
            gain_eur,
            cumulative_gain_eur: cumulative,
        });
    }
    rows
}

/// Headline indicators of one evaluated installation.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSet {
    /// First year whose cumulative gains reach the CAPEX, if any.
    pub payback_years: Option<u32>,
    /// Year-1 gains relative to CAPEX (%).
    pub annual_roi_pct: f64,
    /// Internal rate of return over the horizon (%).
    pub irr_pct: f64,
    /// CAPEX per lifetime-produced kWh (EUR/kWh).
    pub lcoe_eur_per_kwh: f64,
    /// Share of production consumed on-site (%).
    pub self_consumption_pct: f64,
    /// Share of consumption covered by production (%).
    pub self_production_pct: f64,
    /// Gains in the first year, premium included (EUR).
    pub year1_gains_eur: f64,
    /// Cumulative gains over the whole horizon (EUR).
    pub horizon_gains_eur: f64,
}

impl KpiSet {
    /// Derives the KPI set from a projection and its upfront cost.
    ///
    /// Denominators are floored (CAPEX guard for ROI, 1 kWh for LCOE) so
    /// degenerate inputs yield zeros instead of division errors.
    pub fn from_projection(totals: &AnnualTotals, projection: &[YearRow], capex_total_eur: f64) -> Self {
        let year1_gains_eur = projection.first().map_or(0.0, |r| r.gain_eur);
        let horizon_gains_eur = projection.last().map_or(0.0, |r| r.cumulative_gain_eur);

        let payback_years = projection
            .iter()
            .find(|r| r.cumulative_gain_eur >= capex_total_eur)
            .map(|r| r.year);

        let annual_roi_pct = if capex_total_eur > 0.0 {
            year1_gains_eur / capex_total_eur * 100.0
        } else {
            0.0
        };

        let lifetime_production_kwh: f64 = projection.iter().map(|r| r.production_kwh).sum();
        let lcoe_eur_per_kwh = capex_total_eur / lifetime_production_kwh.max(1.0);

        let mut cashflows = Vec::with_capacity(projection.len() + 1);
        cashflows.push(-capex_total_eur);
        cashflows.extend(projection.iter().map(|r| r.gain_eur));
        let irr_pct = irr::internal_rate_of_return(&cashflows) * 100.0;

        Self {
            payback_years,
            annual_roi_pct,
            irr_pct,
            lcoe_eur_per_kwh,
            self_consumption_pct: totals.self_consumption_pct,
            self_production_pct: totals.self_production_pct,
            year1_gains_eur,
            horizon_gains_eur,
        }
    }
}

impl fmt::Display for KpiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payback = match self.payback_years {
            Some(y) => format!("{y} y"),
            None => "n/a".to_string(),
        };
        write!(
            f,
            "payback={payback}  roi={:.2}%/y  irr={:.2}%  lcoe={:.3} EUR/kWh  \
             self-cons={:.1}%  self-prod={:.1}%  gains y1={:.0} EUR  horizon={:.0} EUR",
            self.annual_roi_pct,
            self.irr_pct,
            self.lcoe_eur_per_kwh,
            self.self_consumption_pct,
            self.self_production_pct,
            self.year1_gains_eur,
            self.horizon_gains_eur,
        )
    }
}
