//! Core engine types: monthly profiles, balance results, projections, CAPEX.

/// Month display labels, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One calendar year of monthly energy values (kWh), January first.
///
/// # Examples
///
/// ```
/// use pv_advisor::sim::types::MonthlyProfile;
///
/// let flat = MonthlyProfile::new([580.0; 12]);
/// assert_eq!(flat.total(), 580.0 * 12.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyProfile([f64; 12]);

impl MonthlyProfile {
    /// Creates a profile from twelve monthly values.
    pub fn new(values: [f64; 12]) -> Self {
        Self(values)
    }

    /// Creates a profile from a slice, or `None` when the slice does not
    /// hold exactly twelve values.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let arr: [f64; 12] = values.try_into().ok()?;
        Some(Self(arr))
    }

    /// The twelve monthly values.
    pub fn values(&self) -> &[f64; 12] {
        &self.0
    }

    /// Sum over the twelve months.
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Profile with every month multiplied by `factor`. Used to restate a
    /// reference production profile for a differently sized installation.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.map(|v| v * factor))
    }
}

/// Battery sizing of one installation, with the catalogue values it was
/// priced against.
#[derive(Debug, Clone, PartialEq)]
pub struct BatterySpec {
    /// Installed unit count (0 = no battery).
    pub units: u8,
    /// Capacity of one unit (kWh).
    pub unit_kwh: f64,
    /// Price of one unit before VAT (EUR).
    pub unit_price_eur: f64,
}

impl BatterySpec {
    /// Nominal installed capacity (kWh).
    pub fn capacity_kwh(&self) -> f64 {
        f64::from(self.units) * self.unit_kwh
    }
}

/// A sized installation: panel count, nameplate power, battery.
#[derive(Debug, Clone, PartialEq)]
pub struct Installation {
    /// Number of photovoltaic modules.
    pub panels: u32,
    /// Nameplate power (kWc).
    pub kwc: f64,
    /// Battery sizing.
    pub battery: BatterySpec,
}

/// Energy balance and money flows for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyResult {
    /// Month index, 1 = January.
    pub month: usize,
    /// Production (kWh).
    pub production_kwh: f64,
    /// Consumption (kWh).
    pub consumption_kwh: f64,
    /// Production consumed on-site, after battery transfer (kWh).
    pub self_consumption_kwh: f64,
    /// Production exported to the grid (kWh).
    pub surplus_kwh: f64,
    /// Consumption drawn from the grid (kWh).
    pub grid_import_kwh: f64,
    /// Avoided purchase cost (EUR).
    pub saving_eur: f64,
    /// Feed-in revenue on the surplus (EUR).
    pub feed_in_eur: f64,
}

/// Annual sums of the monthly results plus derived coverage ratios.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualTotals {
    /// Production (kWh).
    pub production_kwh: f64,
    /// Consumption (kWh).
    pub consumption_kwh: f64,
    /// Self-consumption (kWh).
    pub self_consumption_kwh: f64,
    /// Exported surplus (kWh).
    pub surplus_kwh: f64,
    /// Grid import (kWh).
    pub grid_import_kwh: f64,
    /// Avoided purchase cost (EUR).
    pub saving_eur: f64,
    /// Feed-in revenue (EUR).
    pub feed_in_eur: f64,
    /// Share of production consumed on-site (%).
    pub self_consumption_pct: f64,
    /// Share of consumption covered by production (%).
    pub self_production_pct: f64,
}

impl AnnualTotals {
    /// Sums twelve monthly results. Ratio denominators are floored at
    /// 1 kWh so empty profiles yield 0 % instead of a division error.
    pub fn from_months(months: &[MonthlyResult]) -> Self {
        let mut production_kwh = 0.0;
        let mut consumption_kwh = 0.0;
        let mut self_consumption_kwh = 0.0;
        let mut surplus_kwh = 0.0;
        let mut grid_import_kwh = 0.0;
        let mut saving_eur = 0.0;
        let mut feed_in_eur = 0.0;
        for m in months {
            production_kwh += m.production_kwh;
            consumption_kwh += m.consumption_kwh;
            self_consumption_kwh += m.self_consumption_kwh;
            surplus_kwh += m.surplus_kwh;
            grid_import_kwh += m.grid_import_kwh;
            saving_eur += m.saving_eur;
            feed_in_eur += m.feed_in_eur;
        }
        let self_consumption_pct = 100.0 * self_consumption_kwh / production_kwh.max(1.0);
        let self_production_pct = 100.0 * self_consumption_kwh / consumption_kwh.max(1.0);
        Self {
            production_kwh,
            consumption_kwh,
            self_consumption_kwh,
            surplus_kwh,
            grid_import_kwh,
            saving_eur,
            feed_in_eur,
            self_consumption_pct,
            self_production_pct,
        }
    }
}

/// One year of the financial projection.
#[derive(Debug, Clone, PartialEq)]
pub struct YearRow {
    /// Year index, 1 = first year of operation.
    pub year: u32,
    /// Degraded production (kWh).
    pub production_kwh: f64,
    /// Inflated avoided purchase cost (EUR).
    pub saving_eur: f64,
    /// Feed-in revenue at the fixed tier rate (EUR).
    pub feed_in_eur: f64,
    /// Total gain for the year, including the year-1 premium (EUR).
    pub gain_eur: f64,
    /// Running sum of gains through this year (EUR).
    pub cumulative_gain_eur: f64,
}

/// Upfront cost split into materials and installation labor.
#[derive(Debug, Clone, PartialEq)]
pub struct CapexBreakdown {
    /// Materials before tax (EUR).
    pub materials_before_tax_eur: f64,
    /// Materials after tax (EUR).
    pub materials_after_tax_eur: f64,
    /// Installation labor before tax (EUR).
    pub labor_before_tax_eur: f64,
    /// Installation labor after tax (EUR).
    pub labor_after_tax_eur: f64,
    /// Total upfront cost, tax inclusive (EUR).
    pub total_eur: f64,
}
