//! Human-readable formatting of nanosecond values and percentages.

const SUFFIXES: [&str; 4] = ["ns", "μs", "ms", "s"];

// Keeps values like 2.3 from truncating to 2.29 after the fractional multiply.
const TRUNC_NUDGE: f64 = 1e-9;

/// Format a nanosecond value, stepping by 1000 through ns, μs, ms and s.
///
/// The fractional part is truncated (not rounded) to two digits. Zero renders as `"0"`.
/// Negative values carry a leading `-`.
pub fn time_units(ns: f64) -> String {
    if ns == 0.0 || !ns.is_finite() {
        return "0".to_string();
    }
    if ns < 0.0 {
        return format!("-{}", time_units(-ns));
    }

    let mut v = ns;
    let mut i = 0;
    while v > 1000.0 && i < SUFFIXES.len() - 1 {
        v /= 1000.0;
        i += 1;
    }

    let (whole, frac) = split_two_digits(v);
    format!("{whole}.{frac:02}{}", SUFFIXES[i])
}

/// Format a signed delta with an explicit `+` for non-negative values.
pub fn signed_time_units(ns: f64) -> String {
    if ns < 0.0 {
        time_units(ns)
    } else {
        format!("+{}", time_units(ns))
    }
}

/// Format a percentage truncated to two decimals, e.g. `66.66%`.
pub fn percent(p: f64) -> String {
    if !p.is_finite() || p <= 0.0 {
        return "0.00%".to_string();
    }
    let (whole, frac) = split_two_digits(p);
    format!("{whole}.{frac:02}%")
}

fn split_two_digits(v: f64) -> (u64, u64) {
    let whole = v.floor();
    let frac = (((v - whole) * 100.0) + TRUNC_NUDGE).floor().min(99.0);
    (whole as u64, frac as u64)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/units.rs"]
mod tests;
