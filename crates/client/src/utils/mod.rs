// Helper utilities, easing and math functions

/// Clamp a value between min and max
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Smoothstep ease, `3t² - 2t³`. Expects `t` in `[0, 1]`.
pub fn smooth_step(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}
