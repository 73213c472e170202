//! Net present value and a bounded bisection solver for the internal
//! rate of return.

/// Default bracket lower bound (0 %).
pub const DEFAULT_LO: f64 = 0.0;
/// Default bracket upper bound (50 %).
pub const DEFAULT_HI: f64 = 0.5;
/// Default bisection iteration count.
pub const DEFAULT_ITERATIONS: u32 = 60;
/// Absolute NPV below which the bisection stops early (EUR).
pub const NPV_TOLERANCE: f64 = 1e-2;

/// Net present value of a cash-flow series at a discount rate.
///
/// Index 0 is discounted by (1+r)^0, so the upfront outlay is taken at
/// face value.
pub fn npv(rate: f64, cashflows: &[f64]) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(i, cf)| cf / (1.0 + rate).powi(i as i32))
        .sum()
}

/// Internal rate of return over the default bracket.
pub fn internal_rate_of_return(cashflows: &[f64]) -> f64 {
    bisect_irr(cashflows, DEFAULT_LO, DEFAULT_HI, DEFAULT_ITERATIONS)
}

/// Bisects NPV(r) = 0 over [lo, hi].
///
/// NPV is assumed monotonically decreasing in the rate over the bracket.
/// When both endpoints share a sign the true root lies outside the
/// bracket and the nearer boundary is returned; callers must read a
/// boundary result as "no precise rate", not as a converged solution.
pub fn bisect_irr(cashflows: &[f64], mut lo: f64, mut hi: f64, iterations: u32) -> f64 {
    let npv_lo = npv(lo, cashflows);
    let npv_hi = npv(hi, cashflows);
    if npv_lo <= 0.0 && npv_hi <= 0.0 {
        return lo;
    }
    if npv_lo >= 0.0 && npv_hi >= 0.0 {
        return hi;
    }
    for _ in 0..iterations {
        let mid = 0.5 * (lo + hi);
        let v = npv(mid, cashflows);
        if v.abs() < NPV_TOLERANCE {
            return mid;
        }
        if v > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}
