//! Monthly energy balance: on-site use, surplus, grid import, and the
//! simplified battery transfer between surplus and deficit.

use crate::sim::types::{MonthlyProfile, MonthlyResult};

/// Days per month, civil calendar without leap days.
pub const DAYS_IN_MONTH: [f64; 12] = [
    31.0, 28.0, 31.0, 30.0, 31.0, 30.0, 31.0, 31.0, 30.0, 31.0, 30.0, 31.0,
];

/// How the battery's monthly usable transfer is derived from its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferModel {
    /// capacity × depth of discharge × cycles per day × days in month.
    DailyCycle,
    /// Capacity taken as a flat monthly cap, no day-count weighting.
    FlatMonthly,
}

impl TransferModel {
    /// Parses the configuration name for a transfer model.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "daily_cycle" => Some(Self::DailyCycle),
            "flat_monthly" => Some(Self::FlatMonthly),
            _ => None,
        }
    }
}

/// Pricing and battery inputs for one simulated year.
#[derive(Debug, Clone)]
pub struct BalanceParams {
    /// Effective purchase price (EUR/kWh).
    pub price_eur_per_kwh: f64,
    /// Feed-in rate applied to exported surplus (EUR/kWh); 0 when feed-in
    /// is disabled.
    pub feed_in_rate_eur_per_kwh: f64,
    /// Nominal battery capacity (kWh); 0 disables the transfer.
    pub battery_capacity_kwh: f64,
    /// Usable fraction of nominal capacity per cycle.
    pub depth_of_discharge: f64,
    /// Full equivalent cycles per day.
    pub cycles_per_day: f64,
    /// Monthly transfer derivation.
    pub transfer_model: TransferModel,
    /// Fraction of min(production, consumption) consumed on-site before
    /// battery transfer.
    pub self_consumption_factor: f64,
}

/// Usable battery transfer for one month (kWh).
pub fn monthly_usable_capacity(params: &BalanceParams, month_index: usize) -> f64 {
    if params.battery_capacity_kwh <= 0.0 {
        return 0.0;
    }
    match params.transfer_model {
        TransferModel::DailyCycle => {
            params.battery_capacity_kwh
                * params.depth_of_discharge
                * params.cycles_per_day
                * DAYS_IN_MONTH[month_index]
        }
        TransferModel::FlatMonthly => params.battery_capacity_kwh,
    }
}

/// Simulates one year month by month.
///
/// Per month: base self-consumption is `factor × min(production,
/// consumption)`; the battery then shifts up to `min(surplus, deficit,
/// usable capacity)` from surplus into deficit. The conservation
/// identities `self + surplus = production` and `self + import =
/// consumption` hold for every month and any parameter values.
pub fn simulate_months(
    production: &MonthlyProfile,
    consumption: &MonthlyProfile,
    params: &BalanceParams,
) -> Vec<MonthlyResult> {
    let mut months = Vec::with_capacity(12);
    for m in 0..12 {
        let prod = production.values()[m];
        let conso = consumption.values()[m];

        let base_self = params.self_consumption_factor * prod.min(conso);
        let surplus = (prod - base_self).max(0.0);
        let deficit = (conso - base_self).max(0.0);

        let usable = monthly_usable_capacity(params, m);
        let transfer = surplus.min(deficit).min(usable).max(0.0);

        let self_consumption = base_self + transfer;
        let final_surplus = surplus - transfer;
        let grid_import = conso - self_consumption;

        months.push(MonthlyResult {
            month: m + 1,
            production_kwh: prod,
            consumption_kwh: conso,
            self_consumption_kwh: self_consumption,
            surplus_kwh: final_surplus,
            grid_import_kwh: grid_import,
            saving_eur: self_consumption * params.price_eur_per_kwh,
            feed_in_eur: final_surplus * params.feed_in_rate_eur_per_kwh,
        });
    }
    months
}
