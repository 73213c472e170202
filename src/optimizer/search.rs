//! Panel-count sweep and the selection of two distinct sizes.

use std::cmp::Ordering;

use thiserror::Error;

use crate::config::EngineConfig;
use crate::optimizer::Variant;
use crate::optimizer::score::{MetricSet, composite_score, min_max};
use crate::sim::engine::{Evaluation, EvaluationInputs, evaluate, installation_for};
use crate::sim::finance::KpiSet;

/// Search failure, reported as data to the caller.
#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    /// Every panel count was excluded by the budget, or the range was empty.
    #[error("no viable candidate within the panel range and budget")]
    NoViableCandidate,
    /// No second size diverges enough from the top-ranked one.
    #[error(
        "no second size diverges by at least {:.0}% from {kwc_a} kWc",
        .min_divergence * 100.0
    )]
    NoDistinctSecondSize {
        /// Nameplate power of the top-ranked candidate (kWc).
        kwc_a: f64,
        /// Required relative divergence (fraction).
        min_divergence: f64,
    },
}

/// Best variant of one panel count, with the indicators it is ranked on.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Panel count.
    pub panels: u32,
    /// Nameplate power (kWc).
    pub kwc: f64,
    /// The variant these indicators belong to.
    pub variant: Variant,
    /// Internal rate of return (%).
    pub irr_pct: f64,
    /// Annual ROI (%).
    pub roi_pct: f64,
    /// Cumulative gains over the horizon (EUR).
    pub horizon_gains_eur: f64,
    /// Self-production share (%).
    pub self_production_pct: f64,
    /// Upfront cost of the variant (EUR).
    pub capex_eur: f64,
    /// Composite score after pool normalization.
    pub score: f64,
}

impl Candidate {
    fn metrics(&self) -> MetricSet {
        MetricSet {
            irr_pct: self.irr_pct,
            roi_pct: self.roi_pct,
            horizon_gains_eur: self.horizon_gains_eur,
            self_production_pct: self.self_production_pct,
        }
    }
}

/// The two chosen sizes plus the sweep bounds they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Top-ranked candidate.
    pub a: Candidate,
    /// Highest-ranked candidate diverging enough from A.
    pub b: Candidate,
    /// Lower sweep bound actually used.
    pub min_panels: u32,
    /// Upper sweep bound actually used.
    pub max_panels: u32,
    /// Budget ceiling applied, if any (EUR).
    pub budget_eur: Option<f64>,
}

/// Priority order shared by the variant pick and the scenario winner:
/// IRR, then annual ROI, then horizon gains. Strict comparison, so ties
/// keep the incumbent.
pub fn outranks(a: &KpiSet, b: &KpiSet) -> bool {
    if a.irr_pct != b.irr_pct {
        return a.irr_pct > b.irr_pct;
    }
    if a.annual_roi_pct != b.annual_roi_pct {
        return a.annual_roi_pct > b.annual_roi_pct;
    }
    a.horizon_gains_eur > b.horizon_gains_eur
}

fn candidate_from(panels: u32, variant: Variant, eval: &Evaluation) -> Candidate {
    Candidate {
        panels,
        kwc: eval.installation.kwc,
        variant,
        irr_pct: eval.kpi.irr_pct,
        roi_pct: eval.kpi.annual_roi_pct,
        horizon_gains_eur: eval.kpi.horizon_gains_eur,
        self_production_pct: eval.kpi.self_production_pct,
        capex_eur: eval.capex.total_eur,
        score: 0.0,
    }
}

/// Sweeps the panel range, scores the per-count best variants, and picks
/// two sizes whose nameplate powers diverge by the configured minimum.
///
/// Each count is tried without battery and with one unit; a count
/// survives the budget filter when at least one variant fits. The pool
/// is normalized per metric before scoring, so a score only means
/// something relative to its own sweep.
pub fn search(
    inputs: &EvaluationInputs<'_>,
    config: &EngineConfig,
    max_panels_override: Option<u32>,
    budget_eur: Option<f64>,
) -> Result<SearchOutcome, SearchError> {
    let min_panels = config.optimizer.min_panels;
    let max_panels = match max_panels_override {
        Some(m) => m.max(min_panels),
        None => config.optimizer.max_panels(),
    };

    let mut candidates = Vec::new();
    for panels in min_panels..=max_panels {
        let without = evaluate(inputs, installation_for(panels, 0, config), config);
        let with = evaluate(inputs, installation_for(panels, 1, config), config);

        let fits = |e: &Evaluation| budget_eur.is_none_or(|b| e.capex.total_eur <= b);
        let without_fits = fits(&without);
        let with_fits = fits(&with);

        let best = match (without_fits, with_fits) {
            (false, false) => continue,
            (true, false) => candidate_from(panels, Variant::WithoutBattery, &without),
            (false, true) => candidate_from(panels, Variant::WithBattery, &with),
            (true, true) => {
                if outranks(&with.kpi, &without.kpi) {
                    candidate_from(panels, Variant::WithBattery, &with)
                } else {
                    candidate_from(panels, Variant::WithoutBattery, &without)
                }
            }
        };
        candidates.push(best);
    }

    if candidates.is_empty() {
        return Err(SearchError::NoViableCandidate);
    }

    let metrics: Vec<MetricSet> = candidates.iter().map(Candidate::metrics).collect();
    let (lo, hi) = min_max(&metrics);
    for c in &mut candidates {
        c.score = composite_score(&c.metrics(), &lo, &hi, &config.optimizer);
    }
    // stable sort: equal scores keep ascending panel order
    candidates.sort_by(|x, y| y.score.partial_cmp(&x.score).unwrap_or(Ordering::Equal));

    let a = candidates[0].clone();
    let min_divergence = config.optimizer.min_size_divergence;
    let b = candidates
        .iter()
        .find(|c| (c.kwc - a.kwc).abs() / a.kwc >= min_divergence)
        .cloned()
        .ok_or(SearchError::NoDistinctSecondSize {
            kwc_a: a.kwc,
            min_divergence,
        })?;

    Ok(SearchOutcome {
        a,
        b,
        min_panels,
        max_panels,
        budget_eur,
    })
}
