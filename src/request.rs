//! Inbound payload: typed request structure, shape validation and
//! override resolution.

use serde::Deserialize;

use crate::config::{EngineConfig, PricingConfig, TariffConfig};
use crate::error::CalcError;
use crate::optimizer::Variant;
use crate::sim::types::MonthlyProfile;

/// One calculation request.
///
/// `production` and `consumption` are required; everything else falls
/// back to the engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalcRequest {
    /// Monthly production profile.
    pub production: ProductionSection,
    /// Monthly consumption profile.
    pub consumption: ConsumptionSection,
    /// Purchase tariff fields.
    #[serde(default)]
    pub tariffs: TariffSection,
    /// Battery request.
    #[serde(default)]
    pub battery: BatterySection,
    /// CAPEX ceiling applied during the sweep (EUR).
    #[serde(default)]
    pub budget_eur: Option<f64>,
    /// Upper bound of the panel sweep.
    #[serde(default)]
    pub max_panels: Option<u32>,
    /// Replacement pricing catalogue for this request.
    #[serde(default)]
    pub pricing: Option<PricingConfig>,
    /// Caller override pinning sizing decisions.
    #[serde(default)]
    pub forced: Option<ForcedOverride>,
}

/// Production profile, quoted at a reference nameplate power.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductionSection {
    /// Twelve monthly production values (kWh), January first.
    pub monthly_kwh: Vec<f64>,
    /// Power the profile was measured or estimated at (kWc). Falls back
    /// to the configured reference.
    #[serde(default)]
    pub reference_kwc: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumptionSection {
    /// Twelve monthly consumption values (kWh), January first.
    pub monthly_kwh: Vec<f64>,
}

/// Tariff fields of the request. Absent fields fall back to the engine
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffSection {
    /// Explicit purchase price (EUR/kWh).
    pub effective_price_eur_kwh: Option<f64>,
    /// Whether the caller is on a variable (peak/off-peak) contract.
    pub variable_pricing: bool,
    /// Averaged variable price (EUR/kWh), used only with
    /// `variable_pricing`.
    pub variable_price_avg_eur_kwh: Option<f64>,
    /// Whether surplus is sold at the tiered feed-in rate.
    pub feed_in_enabled: Option<bool>,
    /// Override of the configured annual price inflation.
    pub price_inflation_rate: Option<f64>,
    /// Override of the configured annual production degradation.
    pub production_degradation_rate: Option<f64>,
    /// Override of the configured projection horizon.
    pub horizon_years: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatterySection {
    /// Whether the caller wants storage in the with-battery scenarios.
    pub enabled: bool,
    /// Requested unit count, clamped to the configured maximum.
    pub units_requested: u8,
}

impl Default for BatterySection {
    fn default() -> Self {
        Self {
            enabled: false,
            units_requested: 0,
        }
    }
}

/// Caller override pinning parts of the sizing. A present, valid field
/// wins over the computed value; absent fields fall back.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForcedOverride {
    /// Pin both sizes to this nameplate power, skipping the sweep.
    pub kwc: Option<f64>,
    /// Pin the with-battery scenarios to this unit count.
    pub battery_units: Option<u8>,
    /// Pin the battery variant for the with-battery scenarios.
    pub variant: Option<Variant>,
    /// Override the feed-in enable flag.
    pub feed_in_enabled: Option<bool>,
}

fn check_profile(field: &str, values: &[f64]) -> Result<(), CalcError> {
    if values.len() != 12 {
        return Err(CalcError::invalid_input(
            field,
            format!("must hold exactly 12 monthly values, got {}", values.len()),
        ));
    }
    for (i, v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(CalcError::invalid_input(
                field,
                format!("month {} is not a finite number", i + 1),
            ));
        }
        if *v < 0.0 {
            return Err(CalcError::invalid_input(
                field,
                format!("month {} is negative ({v})", i + 1),
            ));
        }
    }
    Ok(())
}

fn check_positive(field: &str, value: Option<f64>) -> Result<(), CalcError> {
    if let Some(v) = value {
        if !v.is_finite() || v <= 0.0 {
            return Err(CalcError::invalid_input(field, format!("must be > 0, got {v}")));
        }
    }
    Ok(())
}

impl CalcRequest {
    /// Built-in demonstration request: a temperate-climate production
    /// curve against a flat consumption profile.
    pub fn sample() -> Self {
        Self {
            production: ProductionSection {
                monthly_kwh: vec![
                    500.0, 450.0, 600.0, 650.0, 700.0, 750.0, 780.0, 740.0, 600.0, 550.0, 480.0,
                    420.0,
                ],
                reference_kwc: None,
            },
            consumption: ConsumptionSection {
                monthly_kwh: vec![580.0; 12],
            },
            tariffs: TariffSection {
                effective_price_eur_kwh: Some(0.1952),
                ..TariffSection::default()
            },
            battery: BatterySection::default(),
            budget_eur: None,
            max_panels: None,
            pricing: None,
            forced: None,
        }
    }

    /// Shape validation. Returns the first offending field.
    pub fn validate(&self) -> Result<(), CalcError> {
        check_profile("production.monthly_kwh", &self.production.monthly_kwh)?;
        check_profile("consumption.monthly_kwh", &self.consumption.monthly_kwh)?;
        check_positive("production.reference_kwc", self.production.reference_kwc)?;
        check_positive(
            "tariffs.effective_price_eur_kwh",
            self.tariffs.effective_price_eur_kwh,
        )?;
        check_positive(
            "tariffs.variable_price_avg_eur_kwh",
            self.tariffs.variable_price_avg_eur_kwh,
        )?;
        check_positive("budget_eur", self.budget_eur)?;
        if let Some(rate) = self.tariffs.price_inflation_rate {
            if !rate.is_finite() || rate <= -1.0 {
                return Err(CalcError::invalid_input(
                    "tariffs.price_inflation_rate",
                    format!("must be > -1, got {rate}"),
                ));
            }
        }
        if let Some(rate) = self.tariffs.production_degradation_rate {
            if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
                return Err(CalcError::invalid_input(
                    "tariffs.production_degradation_rate",
                    format!("must be in [0, 1), got {rate}"),
                ));
            }
        }
        if self.tariffs.horizon_years == Some(0) {
            return Err(CalcError::invalid_input(
                "tariffs.horizon_years",
                "must be at least 1",
            ));
        }
        if let Some(forced) = &self.forced {
            check_positive("forced.kwc", forced.kwc)?;
        }
        Ok(())
    }

    /// Production profile. Call after [`CalcRequest::validate`].
    pub fn production_profile(&self) -> Option<MonthlyProfile> {
        MonthlyProfile::from_slice(&self.production.monthly_kwh)
    }

    /// Consumption profile. Call after [`CalcRequest::validate`].
    pub fn consumption_profile(&self) -> Option<MonthlyProfile> {
        MonthlyProfile::from_slice(&self.consumption.monthly_kwh)
    }

    /// Purchase price for this request: the explicit price when given,
    /// else the variable-pricing average when that contract is flagged,
    /// else the configured default.
    pub fn effective_price(&self, tariffs: &TariffConfig) -> f64 {
        if let Some(price) = self.tariffs.effective_price_eur_kwh {
            return price;
        }
        if self.tariffs.variable_pricing {
            if let Some(avg) = self.tariffs.variable_price_avg_eur_kwh {
                return avg;
            }
        }
        tariffs.default_price_eur_per_kwh
    }

    /// Feed-in enable flag after the forced override.
    pub fn feed_in_enabled(&self) -> bool {
        if let Some(forced) = &self.forced {
            if let Some(flag) = forced.feed_in_enabled {
                return flag;
            }
        }
        self.tariffs.feed_in_enabled.unwrap_or(true)
    }

    /// Engine configuration with this request's overrides applied.
    pub fn apply_overrides(&self, base: &EngineConfig) -> EngineConfig {
        let mut config = base.clone();
        if let Some(pricing) = &self.pricing {
            config.pricing = pricing.clone();
        }
        if let Some(rate) = self.tariffs.price_inflation_rate {
            config.tariffs.price_inflation_rate = rate;
        }
        if let Some(rate) = self.tariffs.production_degradation_rate {
            config.tariffs.production_degradation_rate = rate;
        }
        if let Some(years) = self.tariffs.horizon_years {
            config.tariffs.horizon_years = years;
        }
        config
    }
}
