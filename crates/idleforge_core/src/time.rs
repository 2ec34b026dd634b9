//! Time units and duration helpers.

/// Milliseconds on the session's logical clock.
pub type Millis = u64;

/// Lowest speed factor accepted by the duration formula.
///
/// Keeps a misconfigured negative modifier from producing an infinite or
/// negative duration.
pub const MIN_SPEED_FACTOR: f64 = 0.05;

/// `1 + scale * (level - 1)`, floored at [`MIN_SPEED_FACTOR`].
#[inline]
#[must_use]
pub fn level_speed_multiplier(level: u32, scale: f64) -> f64 {
    let raw = 1.0 + scale * f64::from(level.saturating_sub(1));
    if raw.is_finite() && raw > MIN_SPEED_FACTOR {
        raw
    } else {
        MIN_SPEED_FACTOR
    }
}

/// Rounds a raw duration to whole milliseconds, never below `floor_ms`.
///
/// Non-finite inputs collapse to the floor.
#[inline]
#[must_use]
pub fn clamp_duration_ms(floor_ms: Millis, raw_ms: f64) -> Millis {
    if !raw_ms.is_finite() || raw_ms <= floor_ms as f64 {
        return floor_ms;
    }
    (raw_ms.round() as Millis).max(floor_ms)
}
