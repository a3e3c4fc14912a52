//! Guards for untrusted authored coordinates and a float ordering that
//! sorting code can rely on.

use core::cmp::Ordering;

/// Largest accepted domain coordinate magnitude; anything beyond is clamped.
pub const MAX_DOMAIN_COORDINATE: f64 = 1.0e9;

/// Outcome of sanitizing one authored coordinate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Sanitized {
    Exact(f64),
    /// Out of range, pulled back to the nearest bound.
    Clamped(f64),
    /// NaN or infinite.
    Invalid,
}

pub fn sanitize_coordinate(v: f64, limit: f64) -> Sanitized {
    if !v.is_finite() {
        return Sanitized::Invalid;
    }
    // -0.0 -> 0.0
    let v = if v == 0.0 { 0.0 } else { v };
    if v.abs() > limit {
        Sanitized::Clamped(v.clamp(-limit, limit))
    } else {
        Sanitized::Exact(v)
    }
}

/// Total order for depth and hit distances. NaN sorts last; `-0.0 == 0.0`.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_DOMAIN_COORDINATE, Sanitized, sanitize_coordinate, stable_total_cmp_f64};
    use core::cmp::Ordering;

    #[test]
    fn ordering_handles_zero_signs_and_nan() {
        assert_eq!(stable_total_cmp_f64(1.0, 2.0), Ordering::Less);
        assert_eq!(stable_total_cmp_f64(-0.0, 0.0), Ordering::Equal);
        assert_eq!(stable_total_cmp_f64(f64::NAN, 1.0e300), Ordering::Greater);
        assert_eq!(stable_total_cmp_f64(f64::NAN, f64::NAN), Ordering::Equal);
    }

    #[test]
    fn sanitize_rejects_non_finite_and_clamps_extremes() {
        assert_eq!(sanitize_coordinate(f64::NAN, 10.0), Sanitized::Invalid);
        assert_eq!(sanitize_coordinate(f64::INFINITY, 10.0), Sanitized::Invalid);
        assert_eq!(sanitize_coordinate(-25.0, 10.0), Sanitized::Clamped(-10.0));
        assert_eq!(
            sanitize_coordinate(79_228.4, MAX_DOMAIN_COORDINATE),
            Sanitized::Exact(79_228.4)
        );
        match sanitize_coordinate(-0.0, 10.0) {
            Sanitized::Exact(v) => assert!(v.is_sign_positive()),
            other => panic!("unexpected {other:?}"),
        }
    }
}
