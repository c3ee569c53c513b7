//! Centralized handling of the "may be invalid" numeric sentinels shared by the cost model,
//! fill-time estimator and analyzer. The source this crate is modeled on clamped NaN/negative
//! values ad hoc at each call site; here it's one helper per context so every caller agrees on
//! what "invalid" collapses to.

use serde::Serializer;

/// A cost or time that turns out unobtainable/infeasible collapses to `+∞`, never NaN, so
/// downstream comparisons (`a < b`) keep working without special-casing.
pub fn sanitize_cost(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 || value == f64::NEG_INFINITY {
        f64::INFINITY
    } else {
        value
    }
}

/// Ancillary diagnostic quantities (RR, IF, Δratio) collapse invalid results to NaN, since
/// they're reported rather than compared or summed. `+∞` is a legitimate value here (e.g. IF
/// when the order side never fills) and passes through unchanged.
pub fn sanitize_ancillary(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 || value == f64::NEG_INFINITY {
        f64::NAN
    } else {
        value
    }
}

/// True once a cost has collapsed to the unobtainable sentinel.
pub fn is_unobtainable(cost: f64) -> bool {
    !cost.is_finite()
}

/// serde helper: emit `null` for non-finite floats instead of a literal the JSON spec forbids.
/// Grounded on the teacher's `serialize_rational32_to_f64`, generalized to plain `f64` and to
/// pass non-finite values through as `null` rather than rounding them.
pub fn serialize_f64_or_null<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

/// Same, for `Option<f64>` fields where the inner value may additionally be absent outright.
pub fn serialize_opt_f64_or_null<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) if v.is_finite() => serializer.serialize_f64(*v),
        _ => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_cost_maps_invalid_to_positive_infinity() {
        assert_eq!(sanitize_cost(f64::NAN), f64::INFINITY);
        assert_eq!(sanitize_cost(-1.0), f64::INFINITY);
        assert_eq!(sanitize_cost(f64::NEG_INFINITY), f64::INFINITY);
        assert_eq!(sanitize_cost(f64::INFINITY), f64::INFINITY);
        assert_eq!(sanitize_cost(42.0), 42.0);
    }

    #[test]
    fn sanitize_ancillary_preserves_positive_infinity_but_not_negative() {
        assert!(sanitize_ancillary(f64::NAN).is_nan());
        assert!(sanitize_ancillary(-5.0).is_nan());
        assert_eq!(sanitize_ancillary(f64::INFINITY), f64::INFINITY);
        assert_eq!(sanitize_ancillary(3.5), 3.5);
    }
}
