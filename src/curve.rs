// ==============================================================================
// curve.rs — SPEED RESPONSE CURVES
// ------------------------------------------------------------------------------
// Tuning curves mapping a speed (m/s) to a normalized factor. Used for:
// - drive power vs forward speed
// - steering authority vs speed
//
// Evaluation clamps to the first/last key outside the key range, so a curve
// never extrapolates past its authored values.
// ==============================================================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseCurve {
    /// Straight line between two keys.
    Linear { x0: f32, y0: f32, x1: f32, y1: f32 },
    /// Smoothstep between two keys (flat tangents at both ends).
    EaseInOut { x0: f32, y0: f32, x1: f32, y1: f32 },
    /// Piecewise-linear keys, sorted by x.
    Keys { points: Vec<[f32; 2]> },
}

impl ResponseCurve {
    pub fn linear(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        ResponseCurve::Linear { x0, y0, x1, y1 }
    }

    pub fn ease_in_out(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        ResponseCurve::EaseInOut { x0, y0, x1, y1 }
    }

    pub fn constant(y: f32) -> Self {
        ResponseCurve::Keys { points: vec![[0.0, y]] }
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        match self {
            ResponseCurve::Linear { x0, y0, x1, y1 } => {
                let t = segment_t(*x0, *x1, x);
                y0 + (y1 - y0) * t
            }
            ResponseCurve::EaseInOut { x0, y0, x1, y1 } => {
                let t = segment_t(*x0, *x1, x);
                let s = t * t * (3.0 - 2.0 * t);
                y0 + (y1 - y0) * s
            }
            ResponseCurve::Keys { points } => evaluate_keys(points, x),
        }
    }

    /// Structural check used by config validation. Returns a reason on failure.
    pub fn check(&self) -> Result<(), &'static str> {
        let keys: Vec<[f32; 2]> = match self {
            ResponseCurve::Linear { x0, y0, x1, y1 }
            | ResponseCurve::EaseInOut { x0, y0, x1, y1 } => {
                if x1 <= x0 {
                    return Err("x1 must be greater than x0");
                }
                vec![[*x0, *y0], [*x1, *y1]]
            }
            ResponseCurve::Keys { points } => points.clone(),
        };

        if keys.is_empty() {
            return Err("curve has no keys");
        }
        if keys.iter().flatten().any(|v| !v.is_finite()) {
            return Err("curve contains a non-finite value");
        }
        if keys.windows(2).any(|w| w[1][0] <= w[0][0]) {
            return Err("curve keys must be strictly increasing in x");
        }
        if keys.iter().any(|k| !(0.0..=1.0).contains(&k[1])) {
            return Err("curve outputs must lie in [0, 1]");
        }
        Ok(())
    }
}

#[inline]
fn segment_t(x0: f32, x1: f32, x: f32) -> f32 {
    let span = x1 - x0;
    if span.abs() < 1e-6 {
        return if x < x0 { 0.0 } else { 1.0 };
    }
    ((x - x0) / span).clamp(0.0, 1.0)
}

fn evaluate_keys(points: &[[f32; 2]], x: f32) -> f32 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return 0.0;
    };
    if x <= first[0] {
        return first[1];
    }
    if x >= last[0] {
        return last[1];
    }
    for w in points.windows(2) {
        let ([xa, ya], [xb, yb]) = (w[0], w[1]);
        if x <= xb {
            let t = segment_t(xa, xb, x);
            return ya + (yb - ya) * t;
        }
    }
    last[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_clamps_outside_range() {
        let c = ResponseCurve::linear(0.0, 1.0, 30.0, 0.4);
        assert_eq!(c.evaluate(-5.0), 1.0);
        assert!((c.evaluate(15.0) - 0.7).abs() < 1e-6);
        assert!((c.evaluate(90.0) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn ease_in_out_is_flat_at_ends_and_monotonic() {
        let c = ResponseCurve::ease_in_out(0.0, 1.0, 30.0, 0.3);
        assert!((c.evaluate(0.0) - 1.0).abs() < 1e-6);
        assert!((c.evaluate(30.0) - 0.3).abs() < 1e-6);
        assert!((c.evaluate(15.0) - 0.65).abs() < 1e-5);

        let mut prev = c.evaluate(0.0);
        for i in 1..=60 {
            let y = c.evaluate(i as f32 * 0.5);
            assert!(y <= prev + 1e-6);
            prev = y;
        }
    }

    #[test]
    fn keys_interpolate_between_neighbours() {
        let c = ResponseCurve::Keys { points: vec![[0.0, 1.0], [10.0, 0.5], [20.0, 0.5], [30.0, 0.0]] };
        assert!((c.evaluate(5.0) - 0.75).abs() < 1e-6);
        assert!((c.evaluate(15.0) - 0.5).abs() < 1e-6);
        assert!((c.evaluate(25.0) - 0.25).abs() < 1e-6);
        assert_eq!(c.evaluate(100.0), 0.0);
    }

    #[test]
    fn check_rejects_bad_curves() {
        assert!(ResponseCurve::Keys { points: vec![] }.check().is_err());
        assert!(ResponseCurve::linear(10.0, 1.0, 5.0, 0.5).check().is_err());
        assert!(ResponseCurve::linear(0.0, 1.5, 5.0, 0.5).check().is_err());
        assert!(ResponseCurve::Keys { points: vec![[0.0, 1.0], [0.0, 0.5]] }.check().is_err());
        assert!(ResponseCurve::ease_in_out(0.0, 1.0, 30.0, 0.3).check().is_ok());
    }

    #[test]
    fn curve_round_trips_through_json() {
        let json = r#"{ "kind": "linear", "x0": 0.0, "y0": 1.0, "x1": 30.0, "y1": 0.4 }"#;
        let c: ResponseCurve = serde_json::from_str(json).unwrap();
        assert_eq!(c, ResponseCurve::linear(0.0, 1.0, 30.0, 0.4));
    }
}
