//! Upfront cost model: materials, installation labor, VAT.

use crate::config::PricingConfig;
use crate::sim::types::{CapexBreakdown, Installation};

/// Installation labor before tax (EUR), tiered by nameplate power with a
/// linear surcharge beyond 9 kWc.
pub fn labor_before_tax(kwc: f64, pricing: &PricingConfig) -> f64 {
    if kwc <= 3.0 {
        pricing.labor_upto_3_kwc_eur
    } else if kwc <= 6.0 {
        pricing.labor_upto_6_kwc_eur
    } else if kwc <= 9.0 {
        pricing.labor_upto_9_kwc_eur
    } else {
        pricing.labor_upto_9_kwc_eur + pricing.labor_per_kwc_above_9_eur * (kwc - 9.0)
    }
}

/// Prices an installation against the catalogue.
///
/// Materials cover the modules, the inverter, the energy management unit
/// and any battery units; labor follows the power tier table. The two
/// lines carry different VAT rates.
pub fn compute_capex(installation: &Installation, pricing: &PricingConfig) -> CapexBreakdown {
    let battery = &installation.battery;
    let materials_before_tax_eur = pricing.module_eur * f64::from(installation.panels)
        + pricing.inverter_eur
        + pricing.energy_manager_eur
        + f64::from(battery.units) * battery.unit_price_eur;
    let materials_after_tax_eur = materials_before_tax_eur * (1.0 + pricing.vat_materials);

    let labor_before_tax_eur = labor_before_tax(installation.kwc, pricing);
    let labor_after_tax_eur = labor_before_tax_eur * (1.0 + pricing.vat_labor);

    CapexBreakdown {
        materials_before_tax_eur,
        materials_after_tax_eur,
        labor_before_tax_eur,
        labor_after_tax_eur,
        total_eur: materials_after_tax_eur + labor_after_tax_eur,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::BatterySpec;

    fn installation(panels: u32, kwc: f64, units: u8) -> Installation {
        Installation {
            panels,
            kwc,
            battery: BatterySpec {
                units,
                unit_kwh: 7.0,
                unit_price_eur: 3750.0,
            },
        }
    }

    #[test]
    fn labor_tier_boundaries() {
        let p = PricingConfig::default();
        assert_eq!(labor_before_tax(2.91, &p), 1500.0);
        assert_eq!(labor_before_tax(3.0, &p), 1500.0);
        assert_eq!(labor_before_tax(3.01, &p), 2200.0);
        assert_eq!(labor_before_tax(6.0, &p), 2200.0);
        assert_eq!(labor_before_tax(9.0, &p), 2700.0);
        // one extra kWc past the last tier
        assert!((labor_before_tax(10.0, &p) - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn capex_small_installation_without_battery() {
        let p = PricingConfig::default();
        let capex = compute_capex(&installation(6, 2.91, 0), &p);
        // 6 × 250 + 1650 + 710 = 3860 before tax
        assert!((capex.materials_before_tax_eur - 3860.0).abs() < 1e-9);
        assert!((capex.materials_after_tax_eur - 3860.0 * 1.2).abs() < 1e-9);
        assert!((capex.labor_after_tax_eur - 1500.0 * 1.1).abs() < 1e-9);
        assert!((capex.total_eur - (3860.0 * 1.2 + 1650.0)).abs() < 1e-9);
    }

    #[test]
    fn battery_units_add_materials_cost() {
        let p = PricingConfig::default();
        let without = compute_capex(&installation(6, 2.91, 0), &p);
        let with_one = compute_capex(&installation(6, 2.91, 1), &p);
        let with_two = compute_capex(&installation(6, 2.91, 2), &p);
        let unit_after_tax = 3750.0 * 1.2;
        assert!((with_one.total_eur - without.total_eur - unit_after_tax).abs() < 1e-9);
        assert!((with_two.total_eur - without.total_eur - 2.0 * unit_after_tax).abs() < 1e-9);
        // labor does not depend on the battery
        assert_eq!(without.labor_after_tax_eur, with_two.labor_after_tax_eur);
    }

    #[test]
    fn capex_total_is_sum_of_lines() {
        let p = PricingConfig::default();
        let capex = compute_capex(&installation(19, 9.22, 1), &p);
        let expected = capex.materials_after_tax_eur + capex.labor_after_tax_eur;
        assert!((capex.total_eur - expected).abs() < 1e-9);
    }
}
