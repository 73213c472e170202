//! TOML-based engine configuration: tariffs, battery, pricing catalogue,
//! optimizer tuning.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level engine configuration parsed from TOML.
///
/// All fields have defaults matching the reference catalogue. Load from
/// TOML with [`EngineConfig::from_toml_file`] or use
/// [`EngineConfig::default`] for the built-in values.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Energy-balance simulation parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Purchase tariff, feed-in tiers and projection parameters.
    #[serde(default)]
    pub tariffs: TariffConfig,
    /// Battery storage reference parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Hardware and labor pricing catalogue.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Candidate sweep and scoring parameters.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            tariffs: TariffConfig::default(),
            battery: BatteryConfig::default(),
            pricing: PricingConfig::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

/// Energy-balance simulation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Fraction of min(production, consumption) consumed on-site before
    /// battery transfer (0.0–1.0). Below 1.0 the residual shows up as both
    /// surplus and import in the same month, which is what the battery
    /// transfer feeds on.
    pub self_consumption_factor: f64,
    /// Battery transfer model: `"daily_cycle"` (capacity × DoD × cycles ×
    /// days in month) or `"flat_monthly"` (capacity as a flat monthly cap).
    pub transfer_model: String,
    /// Nameplate power the request's production profile is quoted at (kWc).
    /// Candidate production is the profile scaled by kwc / reference_kwc.
    pub reference_kwc: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            self_consumption_factor: 0.85,
            transfer_model: "daily_cycle".to_string(),
            reference_kwc: 3.4,
        }
    }
}

/// Purchase tariff, feed-in tiers and projection parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Fallback purchase price when the request carries none (EUR/kWh).
    pub default_price_eur_per_kwh: f64,
    /// Feed-in rate below the tier threshold (EUR/kWh).
    pub feed_in_rate_low_eur_per_kwh: f64,
    /// Feed-in rate at or above the tier threshold (EUR/kWh).
    pub feed_in_rate_high_eur_per_kwh: f64,
    /// Nameplate power separating the two feed-in/premium tiers (kWc).
    pub tier_threshold_kwc: f64,
    /// Whether the one-time year-1 incentive premium is paid at all.
    pub premium_enabled: bool,
    /// Premium below the tier threshold (EUR per kWc).
    pub premium_low_eur_per_kwc: f64,
    /// Premium at or above the tier threshold (EUR per kWc).
    pub premium_high_eur_per_kwc: f64,
    /// Annual electricity price inflation (fraction per year).
    pub price_inflation_rate: f64,
    /// Annual production degradation (fraction per year).
    pub production_degradation_rate: f64,
    /// Projection horizon in years.
    pub horizon_years: u32,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            default_price_eur_per_kwh: 0.1952,
            feed_in_rate_low_eur_per_kwh: 0.04,
            feed_in_rate_high_eur_per_kwh: 0.0617,
            tier_threshold_kwc: 9.0,
            premium_enabled: true,
            premium_low_eur_per_kwc: 80.0,
            premium_high_eur_per_kwc: 180.0,
            price_inflation_rate: 0.04,
            production_degradation_rate: 0.005,
            horizon_years: 25,
        }
    }
}

impl TariffConfig {
    /// Feed-in rate for a nameplate power: low tier strictly below the
    /// threshold, high tier at or above it.
    pub fn feed_in_rate_for(&self, kwc: f64) -> f64 {
        if kwc < self.tier_threshold_kwc {
            self.feed_in_rate_low_eur_per_kwh
        } else {
            self.feed_in_rate_high_eur_per_kwh
        }
    }

    /// One-time incentive premium for a nameplate power (EUR), tiered at
    /// the same threshold as the feed-in rate. Zero when disabled.
    pub fn premium_for(&self, kwc: f64) -> f64 {
        if !self.premium_enabled {
            return 0.0;
        }
        let rate = if kwc < self.tier_threshold_kwc {
            self.premium_low_eur_per_kwc
        } else {
            self.premium_high_eur_per_kwc
        };
        kwc * rate
    }
}

/// Battery storage reference parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Capacity of one battery unit (kWh).
    pub unit_kwh: f64,
    /// Price of one battery unit before VAT (EUR).
    pub unit_price_eur: f64,
    /// Maximum installable unit count.
    pub max_units: u8,
    /// Usable fraction of nominal capacity per cycle (0.0–1.0).
    pub depth_of_discharge: f64,
    /// Full equivalent cycles per day.
    pub cycles_per_day: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            unit_kwh: 7.0,
            unit_price_eur: 3750.0,
            max_units: 3,
            depth_of_discharge: 0.90,
            cycles_per_day: 1.0,
        }
    }
}

impl BatteryConfig {
    /// Nominal capacity for a unit count (kWh).
    pub fn capacity_kwh(&self, units: u8) -> f64 {
        f64::from(units) * self.unit_kwh
    }
}

/// Hardware and labor pricing catalogue. All amounts are before VAT.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    /// Price of one photovoltaic module (EUR).
    pub module_eur: f64,
    /// Inverter price (EUR).
    pub inverter_eur: f64,
    /// Energy management unit price (EUR).
    pub energy_manager_eur: f64,
    /// Installation labor up to 3 kWc (EUR).
    pub labor_upto_3_kwc_eur: f64,
    /// Installation labor up to 6 kWc (EUR).
    pub labor_upto_6_kwc_eur: f64,
    /// Installation labor up to 9 kWc (EUR).
    pub labor_upto_9_kwc_eur: f64,
    /// Additional labor per kWc beyond 9 kWc (EUR).
    pub labor_per_kwc_above_9_eur: f64,
    /// VAT rate applied to materials (fraction).
    pub vat_materials: f64,
    /// VAT rate applied to labor (fraction).
    pub vat_labor: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            module_eur: 250.0,
            inverter_eur: 1650.0,
            energy_manager_eur: 710.0,
            labor_upto_3_kwc_eur: 1500.0,
            labor_upto_6_kwc_eur: 2200.0,
            labor_upto_9_kwc_eur: 2700.0,
            labor_per_kwc_above_9_eur: 300.0,
            vat_materials: 0.20,
            vat_labor: 0.10,
        }
    }
}

/// Candidate sweep and scoring parameters.
///
/// The score weights and the self-production bonus are deliberate
/// product choices carried over as-is; they are configuration, not
/// derived quantities.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Smallest panel count considered by the sweep.
    pub min_panels: u32,
    /// Nameplate ceiling the default sweep upper bound derives from (kWc).
    pub max_kwc: f64,
    /// Nameplate power of one panel (kWc).
    pub panel_kwc: f64,
    /// Score weight of the normalized internal rate of return.
    pub weight_irr: f64,
    /// Score weight of the normalized annual ROI.
    pub weight_roi: f64,
    /// Score weight of the normalized horizon-total gains.
    pub weight_gains: f64,
    /// Score weight of the normalized self-production percentage.
    pub weight_self_production: f64,
    /// Flat score bonus when self-production reaches the threshold.
    pub self_production_bonus: f64,
    /// Self-production percentage unlocking the bonus.
    pub self_production_bonus_threshold_pct: f64,
    /// Minimum relative nameplate divergence between the two chosen
    /// sizes (fraction).
    pub min_size_divergence: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_panels: 6,
            max_kwc: 36.0,
            panel_kwc: 0.485,
            weight_irr: 0.50,
            weight_roi: 0.20,
            weight_gains: 0.20,
            weight_self_production: 0.10,
            self_production_bonus: 0.05,
            self_production_bonus_threshold_pct: 60.0,
            min_size_divergence: 0.10,
        }
    }
}

impl OptimizerConfig {
    /// Default sweep upper bound: the largest panel count whose nameplate
    /// power stays within the configured ceiling.
    pub fn max_panels(&self) -> u32 {
        (self.max_kwc / self.panel_kwc).floor() as u32
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"tariffs.horizon_years"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl EngineConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let sim = &self.simulation;
        if !(0.0..=1.0).contains(&sim.self_consumption_factor) {
            errors.push(ConfigError {
                field: "simulation.self_consumption_factor".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }
        if sim.transfer_model != "daily_cycle" && sim.transfer_model != "flat_monthly" {
            errors.push(ConfigError {
                field: "simulation.transfer_model".into(),
                message: format!(
                    "must be \"daily_cycle\" or \"flat_monthly\", got \"{}\"",
                    sim.transfer_model
                ),
            });
        }
        if !sim.reference_kwc.is_finite() || sim.reference_kwc <= 0.0 {
            errors.push(ConfigError {
                field: "simulation.reference_kwc".into(),
                message: "must be > 0".into(),
            });
        }

        let t = &self.tariffs;
        if t.default_price_eur_per_kwh <= 0.0 {
            errors.push(ConfigError {
                field: "tariffs.default_price_eur_per_kwh".into(),
                message: "must be > 0".into(),
            });
        }
        if t.feed_in_rate_low_eur_per_kwh < 0.0 || t.feed_in_rate_high_eur_per_kwh < 0.0 {
            errors.push(ConfigError {
                field: "tariffs.feed_in_rate_low_eur_per_kwh".into(),
                message: "feed-in rates must be >= 0".into(),
            });
        }
        if t.tier_threshold_kwc <= 0.0 {
            errors.push(ConfigError {
                field: "tariffs.tier_threshold_kwc".into(),
                message: "must be > 0".into(),
            });
        }
        if !(0.0..1.0).contains(&t.production_degradation_rate) {
            errors.push(ConfigError {
                field: "tariffs.production_degradation_rate".into(),
                message: "must be in [0.0, 1.0)".into(),
            });
        }
        if t.price_inflation_rate <= -1.0 {
            errors.push(ConfigError {
                field: "tariffs.price_inflation_rate".into(),
                message: "must be > -1.0".into(),
            });
        }
        if t.horizon_years == 0 {
            errors.push(ConfigError {
                field: "tariffs.horizon_years".into(),
                message: "must be >= 1".into(),
            });
        }

        let bat = &self.battery;
        if bat.unit_kwh <= 0.0 {
            errors.push(ConfigError {
                field: "battery.unit_kwh".into(),
                message: "must be > 0".into(),
            });
        }
        if bat.unit_price_eur < 0.0 {
            errors.push(ConfigError {
                field: "battery.unit_price_eur".into(),
                message: "must be >= 0".into(),
            });
        }
        if bat.max_units == 0 {
            errors.push(ConfigError {
                field: "battery.max_units".into(),
                message: "must be >= 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&bat.depth_of_discharge) || bat.depth_of_discharge == 0.0 {
            errors.push(ConfigError {
                field: "battery.depth_of_discharge".into(),
                message: "must be in (0.0, 1.0]".into(),
            });
        }
        if bat.cycles_per_day <= 0.0 {
            errors.push(ConfigError {
                field: "battery.cycles_per_day".into(),
                message: "must be > 0".into(),
            });
        }

        let p = &self.pricing;
        for (field, value) in [
            ("pricing.module_eur", p.module_eur),
            ("pricing.inverter_eur", p.inverter_eur),
            ("pricing.energy_manager_eur", p.energy_manager_eur),
            ("pricing.labor_upto_3_kwc_eur", p.labor_upto_3_kwc_eur),
            ("pricing.labor_upto_6_kwc_eur", p.labor_upto_6_kwc_eur),
            ("pricing.labor_upto_9_kwc_eur", p.labor_upto_9_kwc_eur),
            ("pricing.labor_per_kwc_above_9_eur", p.labor_per_kwc_above_9_eur),
        ] {
            if value < 0.0 {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be >= 0".into(),
                });
            }
        }
        if !(0.0..1.0).contains(&p.vat_materials) {
            errors.push(ConfigError {
                field: "pricing.vat_materials".into(),
                message: "must be in [0.0, 1.0)".into(),
            });
        }
        if !(0.0..1.0).contains(&p.vat_labor) {
            errors.push(ConfigError {
                field: "pricing.vat_labor".into(),
                message: "must be in [0.0, 1.0)".into(),
            });
        }

        let opt = &self.optimizer;
        if opt.min_panels == 0 {
            errors.push(ConfigError {
                field: "optimizer.min_panels".into(),
                message: "must be >= 1".into(),
            });
        }
        if opt.panel_kwc <= 0.0 {
            errors.push(ConfigError {
                field: "optimizer.panel_kwc".into(),
                message: "must be > 0".into(),
            });
        }
        if opt.max_kwc <= 0.0 {
            errors.push(ConfigError {
                field: "optimizer.max_kwc".into(),
                message: "must be > 0".into(),
            });
        } else if opt.panel_kwc > 0.0 && opt.max_panels() < opt.min_panels {
            errors.push(ConfigError {
                field: "optimizer.max_kwc".into(),
                message: "ceiling admits fewer panels than optimizer.min_panels".into(),
            });
        }
        for (field, value) in [
            ("optimizer.weight_irr", opt.weight_irr),
            ("optimizer.weight_roi", opt.weight_roi),
            ("optimizer.weight_gains", opt.weight_gains),
            ("optimizer.weight_self_production", opt.weight_self_production),
            ("optimizer.self_production_bonus", opt.self_production_bonus),
        ] {
            if value < 0.0 {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be >= 0".into(),
                });
            }
        }
        if !(0.0..=100.0).contains(&opt.self_production_bonus_threshold_pct) {
            errors.push(ConfigError {
                field: "optimizer.self_production_bonus_threshold_pct".into(),
                message: "must be in [0.0, 100.0]".into(),
            });
        }
        if !(0.0..=1.0).contains(&opt.min_size_divergence) || opt.min_size_divergence == 0.0 {
            errors.push(ConfigError {
                field: "optimizer.min_size_divergence".into(),
                message: "must be in (0.0, 1.0]".into(),
            });
        }

        errors
    }
}
