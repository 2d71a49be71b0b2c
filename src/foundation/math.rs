/// Default tolerance used when comparing accumulated floating-point weights.
pub const EPSILON: f64 = 1e-9;

/// Replace non-finite input with `0.0`.
pub(crate) fn sanitize(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Clamp `v` into `[lo, hi]`; NaN maps to `hi` (the upper bound is always 0 for translations).
pub(crate) fn clamp_or_max(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        return hi;
    }
    v.max(lo).min(hi)
}

/// `num / den`, or `0.0` when the denominator is zero or the result is not finite.
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        return 0.0;
    }
    sanitize(num / den)
}

/// Approximate equality with an absolute tolerance.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
