//! Scenario assembly: two chosen sizes crossed with battery variants,
//! and the global winner pick.

use std::fmt;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::optimizer::{Variant, outranks};
use crate::sim::engine::{Evaluation, EvaluationInputs, evaluate};
use crate::sim::types::{BatterySpec, Installation};

/// Tie-break rule applied when picking the winner, quoted verbatim in
/// the response.
pub const WINNER_RULE: &str = "max IRR, then annual ROI, then horizon gains";

/// The four scenario codes. Suffix 1 is without battery, suffix 2 with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioLabel {
    A1,
    A2,
    B1,
    B2,
}

impl ScenarioLabel {
    /// Fixed assembly and tie-break order.
    pub const ALL: [ScenarioLabel; 4] = [
        ScenarioLabel::A1,
        ScenarioLabel::A2,
        ScenarioLabel::B1,
        ScenarioLabel::B2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioLabel::A1 => "A1",
            ScenarioLabel::A2 => "A2",
            ScenarioLabel::B1 => "B1",
            ScenarioLabel::B2 => "B2",
        }
    }

    /// Which of the two chosen sizes this label belongs to.
    pub fn size_code(&self) -> char {
        match self {
            ScenarioLabel::A1 | ScenarioLabel::A2 => 'A',
            ScenarioLabel::B1 | ScenarioLabel::B2 => 'B',
        }
    }

    /// Battery variant carried by this label.
    pub fn variant(&self) -> Variant {
        match self {
            ScenarioLabel::A1 | ScenarioLabel::B1 => Variant::WithoutBattery,
            ScenarioLabel::A2 | ScenarioLabel::B2 => Variant::WithBattery,
        }
    }
}

impl fmt::Display for ScenarioLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One assembled scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub label: ScenarioLabel,
    pub evaluation: Evaluation,
}

/// Resolved sizing for the four scenarios. Sizes normally come from the
/// optimizer; a forced override pins both to the same power.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPlan {
    /// Size A panel count.
    pub panels_a: u32,
    /// Size A nameplate power (kWc).
    pub kwc_a: f64,
    /// Size B panel count.
    pub panels_b: u32,
    /// Size B nameplate power (kWc).
    pub kwc_b: f64,
    /// Battery units installed in the with-battery scenarios.
    pub with_battery_units: u8,
}

/// The four scenarios in assembly order plus the winner pick.
#[derive(Debug, Clone)]
pub struct ScenarioSet {
    /// A1, A2, B1, B2 in that order.
    pub scenarios: Vec<Scenario>,
    pub winner: ScenarioLabel,
    /// The rule the winner was picked by.
    pub winner_reason: String,
}

impl ScenarioSet {
    pub fn get(&self, label: ScenarioLabel) -> &Scenario {
        // assembly order is fixed, so the index is the label's position
        &self.scenarios[ScenarioLabel::ALL
            .iter()
            .position(|l| *l == label)
            .unwrap_or(0)]
    }
}

/// Battery unit count for the with-battery scenarios.
///
/// Without an override: max(1, requested) when the battery is enabled,
/// else 1, so the battery impact comparison never degenerates. A forced
/// unit count replaces that; a forced without-battery variant zeroes it
/// regardless of any forced count.
pub fn resolve_battery_units(
    enabled: bool,
    requested: u8,
    forced_units: Option<u8>,
    forced_variant: Option<Variant>,
    max_units: u8,
) -> u8 {
    if forced_variant == Some(Variant::WithoutBattery) {
        return 0;
    }
    let base = match forced_units {
        Some(n) => n,
        None => {
            if enabled {
                requested.max(1)
            } else {
                1
            }
        }
    };
    let base = if forced_variant == Some(Variant::WithBattery) {
        base.max(1)
    } else {
        base
    };
    base.min(max_units)
}

fn installation(panels: u32, kwc: f64, units: u8, config: &EngineConfig) -> Installation {
    Installation {
        panels,
        kwc,
        battery: BatterySpec {
            units,
            unit_kwh: config.battery.unit_kwh,
            unit_price_eur: config.battery.unit_price_eur,
        },
    }
}

/// Evaluates the four scenarios of a plan and picks the global winner.
pub fn assemble(
    inputs: &EvaluationInputs<'_>,
    plan: &ScenarioPlan,
    config: &EngineConfig,
) -> ScenarioSet {
    let mut scenarios = Vec::with_capacity(4);
    for label in ScenarioLabel::ALL {
        let (panels, kwc) = match label.size_code() {
            'A' => (plan.panels_a, plan.kwc_a),
            _ => (plan.panels_b, plan.kwc_b),
        };
        let units = match label.variant() {
            Variant::WithoutBattery => 0,
            Variant::WithBattery => plan.with_battery_units,
        };
        let evaluation = evaluate(inputs, installation(panels, kwc, units, config), config);
        scenarios.push(Scenario { label, evaluation });
    }

    let mut winner = &scenarios[0];
    for s in &scenarios[1..] {
        if outranks(&s.evaluation.kpi, &winner.evaluation.kpi) {
            winner = s;
        }
    }
    let winner = winner.label;

    ScenarioSet {
        scenarios,
        winner,
        winner_reason: WINNER_RULE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::MonthlyProfile;

    const PROD: [f64; 12] = [
        500.0, 450.0, 600.0, 650.0, 700.0, 750.0, 780.0, 740.0, 600.0, 550.0, 480.0, 420.0,
    ];

    fn profiles() -> (MonthlyProfile, MonthlyProfile) {
        (MonthlyProfile::new(PROD), MonthlyProfile::new([580.0; 12]))
    }

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

    fn plan() -> ScenarioPlan {
        ScenarioPlan {
            panels_a: 6,
            kwc_a: 2.91,
            panels_b: 12,
            kwc_b: 5.82,
            with_battery_units: 1,
        }
    }

    #[test]
    fn four_scenarios_in_fixed_order() {
        let config = EngineConfig::default();
        let (prod, conso) = profiles();
        let set = assemble(&inputs(&prod, &conso), &plan(), &config);

        let labels: Vec<ScenarioLabel> = set.scenarios.iter().map(|s| s.label).collect();
        assert_eq!(labels, ScenarioLabel::ALL.to_vec());

        for s in &set.scenarios {
            let expected_units = match s.label.variant() {
                Variant::WithoutBattery => 0,
                Variant::WithBattery => 1,
            };
            assert_eq!(s.evaluation.installation.battery.units, expected_units);
        }
    }

    #[test]
    fn winner_is_unbeaten() {
        let config = EngineConfig::default();
        let (prod, conso) = profiles();
        let set = assemble(&inputs(&prod, &conso), &plan(), &config);
        let winner = set.get(set.winner);
        for s in &set.scenarios {
            assert!(
                !outranks(&s.evaluation.kpi, &winner.evaluation.kpi),
                "{} outranks winner {}",
                s.label,
                set.winner
            );
        }
        assert_eq!(set.winner_reason, WINNER_RULE);
    }

    #[test]
    fn forced_plan_pins_both_sizes() {
        let config = EngineConfig::default();
        let (prod, conso) = profiles();
        let forced = ScenarioPlan {
            panels_a: 10,
            kwc_a: 4.85,
            panels_b: 10,
            kwc_b: 4.85,
            with_battery_units: 2,
        };
        let set = assemble(&inputs(&prod, &conso), &forced, &config);
        for s in &set.scenarios {
            assert!((s.evaluation.installation.kwc - 4.85).abs() < 1e-12);
        }
        let a1 = set.get(ScenarioLabel::A1);
        let a2 = set.get(ScenarioLabel::A2);
        assert_eq!(a2.evaluation.installation.battery.units, 2);
        assert!(a2.evaluation.capex.total_eur > a1.evaluation.capex.total_eur);
    }

    #[test]
    fn battery_units_follow_request_when_enabled() {
        assert_eq!(resolve_battery_units(true, 0, None, None, 3), 1);
        assert_eq!(resolve_battery_units(true, 2, None, None, 3), 2);
        assert_eq!(resolve_battery_units(false, 2, None, None, 3), 1);
    }

    #[test]
    fn forced_units_replace_requested() {
        assert_eq!(resolve_battery_units(true, 2, Some(3), None, 3), 3);
        assert_eq!(resolve_battery_units(false, 0, Some(2), None, 3), 2);
        // forced count above the catalogue maximum is clamped
        assert_eq!(resolve_battery_units(true, 0, Some(5), None, 3), 3);
    }

    #[test]
    fn forced_variant_wins_over_forced_units() {
        let without = Some(Variant::WithoutBattery);
        assert_eq!(resolve_battery_units(true, 2, Some(3), without, 3), 0);
        let with = Some(Variant::WithBattery);
        assert_eq!(resolve_battery_units(false, 0, Some(0), with, 3), 1);
        assert_eq!(resolve_battery_units(false, 0, None, with, 3), 1);
    }

    #[test]
    fn labels_expose_size_and_variant() {
        assert_eq!(ScenarioLabel::A1.size_code(), 'A');
        assert_eq!(ScenarioLabel::B2.size_code(), 'B');
        assert_eq!(ScenarioLabel::A1.variant(), Variant::WithoutBattery);
        assert_eq!(ScenarioLabel::B2.variant(), Variant::WithBattery);
        assert_eq!(ScenarioLabel::B1.to_string(), "B1");
    }
}
