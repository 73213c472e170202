//! Min-max KPI normalization and the composite candidate score.

use crate::config::OptimizerConfig;

/// The four indicators a candidate is scored on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSet {
    /// Internal rate of return (%).
    pub irr_pct: f64,
    /// Annual ROI (%).
    pub roi_pct: f64,
    /// Cumulative gains over the horizon (EUR).
    pub horizon_gains_eur: f64,
    /// Self-production share (%).
    pub self_production_pct: f64,
}

/// Per-metric minima and maxima over a candidate pool.
pub fn min_max(metrics: &[MetricSet]) -> (MetricSet, MetricSet) {
    let mut lo = MetricSet {
        irr_pct: f64::INFINITY,
        roi_pct: f64::INFINITY,
        horizon_gains_eur: f64::INFINITY,
        self_production_pct: f64::INFINITY,
    };
    let mut hi = MetricSet {
        irr_pct: f64::NEG_INFINITY,
        roi_pct: f64::NEG_INFINITY,
        horizon_gains_eur: f64::NEG_INFINITY,
        self_production_pct: f64::NEG_INFINITY,
    };
    for m in metrics {
        lo.irr_pct = lo.irr_pct.min(m.irr_pct);
        lo.roi_pct = lo.roi_pct.min(m.roi_pct);
        lo.horizon_gains_eur = lo.horizon_gains_eur.min(m.horizon_gains_eur);
        lo.self_production_pct = lo.self_production_pct.min(m.self_production_pct);
        hi.irr_pct = hi.irr_pct.max(m.irr_pct);
        hi.roi_pct = hi.roi_pct.max(m.roi_pct);
        hi.horizon_gains_eur = hi.horizon_gains_eur.max(m.horizon_gains_eur);
        hi.self_production_pct = hi.self_production_pct.max(m.self_production_pct);
    }
    (lo, hi)
}

/// Min-max scaling to [0, 1]. A degenerate range (max <= min) maps to 0.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Weighted composite of the normalized indicators, plus the flat
/// self-production bonus. Rounded to 5 decimals, the precision scores
/// are ranked and reported at.
pub fn composite_score(
    metrics: &MetricSet,
    lo: &MetricSet,
    hi: &MetricSet,
    config: &OptimizerConfig,
) -> f64 {
    let irr_n = normalize(metrics.irr_pct, lo.irr_pct, hi.irr_pct);
    let roi_n = normalize(metrics.roi_pct, lo.roi_pct, hi.roi_pct);
    let gains_n = normalize(
        metrics.horizon_gains_eur,
        lo.horizon_gains_eur,
        hi.horizon_gains_eur,
    );
    let self_prod_n = normalize(
        metrics.self_production_pct,
        lo.self_production_pct,
        hi.self_production_pct,
    );
    let bonus = if metrics.self_production_pct >= config.self_production_bonus_threshold_pct {
        config.self_production_bonus
    } else {
        0.0
    };
    let score = config.weight_irr * irr_n
        + config.weight_roi * roi_n
        + config.weight_gains * gains_n
        + config.weight_self_production * self_prod_n
        + bonus;
    (score * 1e5).round() / 1e5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(irr: f64, roi: f64, gains: f64, self_prod: f64) -> MetricSet {
        MetricSet {
            irr_pct: irr,
            roi_pct: roi,
            horizon_gains_eur: gains,
            self_production_pct: self_prod,
        }
    }

    #[test]
    fn normalize_scales_and_clamps() {
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalize(-3.0, 0.0, 10.0), 0.0);
        assert_eq!(normalize(42.0, 0.0, 10.0), 1.0);
    }

    #[test]
    fn normalize_degenerate_range_is_zero() {
        assert_eq!(normalize(7.0, 7.0, 7.0), 0.0);
        assert_eq!(normalize(7.0, 9.0, 3.0), 0.0);
    }

    #[test]
    fn min_max_covers_pool() {
        let pool = [
            metrics(4.0, 6.0, 20_000.0, 40.0),
            metrics(6.0, 5.0, 25_000.0, 55.0),
            metrics(5.0, 7.0, 15_000.0, 70.0),
        ];
        let (lo, hi) = min_max(&pool);
        assert_eq!(lo.irr_pct, 4.0);
        assert_eq!(hi.irr_pct, 6.0);
        assert_eq!(lo.horizon_gains_eur, 15_000.0);
        assert_eq!(hi.horizon_gains_eur, 25_000.0);
        assert_eq!(lo.self_production_pct, 40.0);
        assert_eq!(hi.self_production_pct, 70.0);
    }

    #[test]
    fn best_on_every_metric_scores_full_weights() {
        let config = OptimizerConfig::default();
        let top = metrics(6.0, 7.0, 25_000.0, 70.0);
        let bottom = metrics(4.0, 5.0, 15_000.0, 40.0);
        let (lo, hi) = min_max(&[top, bottom]);
        // all four normalize to 1 and the 60 % bonus applies
        let score = composite_score(&top, &lo, &hi, &config);
        assert!((score - 1.05).abs() < 1e-9, "got {score}");
        let score = composite_score(&bottom, &lo, &hi, &config);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn bonus_requires_threshold() {
        let config = OptimizerConfig::default();
        let a = metrics(5.0, 5.0, 20_000.0, 59.9);
        let b = metrics(5.0, 5.0, 20_000.0, 60.0);
        let (lo, hi) = min_max(&[a, b]);
        let score_a = composite_score(&a, &lo, &hi, &config);
        let score_b = composite_score(&b, &lo, &hi, &config);
        // identical on the weighted terms except the normalized self-production
        assert!(score_b > score_a);
        assert!((score_b - (config.weight_self_production + config.self_production_bonus)).abs() < 1e-9);
    }

    #[test]
    fn single_candidate_scores_only_its_bonus() {
        let config = OptimizerConfig::default();
        let only = metrics(5.0, 5.0, 20_000.0, 65.0);
        let (lo, hi) = min_max(&[only]);
        let score = composite_score(&only, &lo, &hi, &config);
        assert_eq!(score, config.self_production_bonus);
    }

    #[test]
    fn score_rounds_to_five_decimals() {
        let config = OptimizerConfig::default();
        let a = metrics(3.0, 5.0, 20_000.0, 30.0);
        let b = metrics(10.0, 5.0, 20_000.0, 30.0);
        let c = metrics(4.0, 5.0, 20_000.0, 30.0);
        let (lo, hi) = min_max(&[a, b, c]);
        // irr normalizes to 1/7, weighted by 0.5
        let score = composite_score(&c, &lo, &hi, &config);
        assert_eq!(score, 0.07143);
    }
}
