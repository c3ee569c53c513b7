//! FillTime — predicts wall-clock seconds to fill a resting buy order or to insta-sell, from
//! the same flow-rate metrics C10M uses.

use crate::cost_model;
use crate::metrics::ProductMetrics;
use crate::numeric;

/// Fixed rate-to-seconds scaling factor. No documented units in the source this was modeled on;
/// preserved here as an opaque constant per the open question in the design notes rather than
/// inlined as a magic number.
pub const FILL_RATE_SCALING_CONSTANT: f64 = 20.0;

#[derive(Debug, Clone)]
pub struct FillTimeResult {
    pub seconds: f64,
    pub rr: f64,
    pub error_message: Option<String>,
}

impl FillTimeResult {
    fn instant() -> Self {
        FillTimeResult {
            seconds: 0.0,
            rr: f64::NAN,
            error_message: None,
        }
    }
}

/// Time to insta-sell `qty` units, from the rolling 7-day buy volume scalar.
pub fn insta_sell(qty: f64, buy_moving_week: f64) -> FillTimeResult {
    if qty == 0.0 {
        return FillTimeResult::instant();
    }

    if buy_moving_week <= 0.0 || !buy_moving_week.is_finite() {
        return FillTimeResult {
            seconds: f64::INFINITY,
            rr: f64::NAN,
            error_message: Some("no buy volume to insta-sell against".to_string()),
        };
    }

    let rate_per_second = buy_moving_week / 604_800.0;
    FillTimeResult {
        seconds: numeric::sanitize_cost(qty / rate_per_second),
        rr: f64::NAN,
        error_message: None,
    }
}

/// Time to fill a resting buy order for `qty` units.
pub fn buy_order(qty: f64, metrics: &ProductMetrics) -> FillTimeResult {
    if qty == 0.0 {
        return FillTimeResult::instant();
    }

    let delta_net = metrics.sell_size * metrics.sell_frequency - metrics.order_size * metrics.order_frequency;

    if delta_net > 0.0 {
        // RR is computed identically to §4.3, but only for reporting — it does not affect the
        // fill-time formula on this branch.
        let (_, rr) = cost_model::instafill_and_relist_rounds(qty, metrics);
        let seconds = FILL_RATE_SCALING_CONSTANT * qty / delta_net;
        return FillTimeResult {
            seconds: numeric::sanitize_cost(seconds),
            rr: numeric::sanitize_ancillary(rr),
            error_message: None,
        };
    }

    let (_, rr) = cost_model::instafill_and_relist_rounds(qty, metrics);

    if metrics.order_frequency <= 0.0 || rr.is_infinite() {
        return FillTimeResult {
            seconds: f64::INFINITY,
            rr: numeric::sanitize_ancillary(rr),
            error_message: Some("insufficient order flow to estimate fill time".to_string()),
        };
    }

    let seconds = FILL_RATE_SCALING_CONSTANT * rr * qty / metrics.order_frequency;
    FillTimeResult {
        seconds: numeric::sanitize_cost(seconds),
        rr: numeric::sanitize_ancillary(rr),
        error_message: None,
    }
}
