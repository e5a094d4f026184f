#![forbid(unsafe_code)]

/// Map a unit float from `Math.random()` onto `0..n`.
///
/// Out-of-range inputs are clamped, so the result is always below `n`
/// (and `0` when `n == 0`).
#[must_use]
pub fn scale_unit(unit: f64, n: u32) -> u32 {
    if n == 0 || !unit.is_finite() {
        return 0;
    }
    let scaled = (unit.clamp(0.0, 1.0) * f64::from(n)).floor();
    // Truncation is exact: `scaled` is an integer in 0..=n.
    (scaled as u32).min(n - 1)
}
