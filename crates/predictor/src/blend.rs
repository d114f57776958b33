//! Blending of the de-scaled model output with recent form.

/// Weight of the model's de-scaled prediction. Tunable in future versions.
pub const MODEL_WEIGHT: f64 = 0.6;
/// Weight of the recent average points.
pub const RECENT_FORM_WEIGHT: f64 = 0.4;

/// `MODEL_WEIGHT * model + RECENT_FORM_WEIGHT * recent`, or the model value
/// unchanged when no recent average exists.
#[must_use]
pub fn blend(model_points: f64, recent_avg: Option<f64>) -> f64 {
    match recent_avg.filter(|v| v.is_finite()) {
        Some(recent) => MODEL_WEIGHT * model_points + RECENT_FORM_WEIGHT * recent,
        None => model_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_weights() {
        assert!((blend(20.0, Some(10.0)) - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_blend_without_recent_average() {
        assert_eq!(blend(18.5, None), 18.5);
        assert_eq!(blend(18.5, Some(f64::NAN)), 18.5);
    }

    #[test]
    fn test_weights_sum_to_one() {
        assert!((MODEL_WEIGHT + RECENT_FORM_WEIGHT - 1.0).abs() < 1e-12);
    }
}
