/// Floating point type used throughout system
pub type Real = f64;

/// Decimal order of magnitude, `floor(log10(|v|))`.
///
/// Returns `None` for zero and non-finite values.
pub fn order_of_magnitude(v: Real) -> Option<i32> {
    if v == 0.0 || !v.is_finite() {
        return None;
    }
    Some(v.abs().log10().floor() as i32)
}

/// Signed displacement of minimum magnitude modulo `period`.
///
/// `dz - L * round(dz / L)`, with halves rounded up so that `+L/2` maps to `-L/2`.
pub fn minimum_image(dz: Real, period: Real) -> Real {
    dz - period * (dz / period + 0.5).floor()
}

/// Largest absolute value in a sequence (0 for an empty one).
pub fn max_abs<I: IntoIterator<Item = Real>>(values: I) -> Real {
    values.into_iter().fold(0.0, |acc, v| acc.max(v.abs()))
}
