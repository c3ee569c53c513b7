//! C10M — "cost of 10 million": expected acquisition cost of N units via either a resting buy
//! order (Primary) or an immediate market purchase (Secondary). The hardest single piece of the
//! crate; every branch below is named after the corresponding clause in the formula it
//! implements rather than abstracted away, so the formula stays checkable against the spec it
//! came from.

use crate::id;
use crate::metrics::{MetricsView, ProductMetrics};
use crate::numeric;
use crate::price::PriceView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMethod {
    Primary,
    Secondary,
    NotAvailable,
}

/// For a single item + quantity: which method wins, its cost, and the diagnostic quantities
/// that explain why.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub method: AcquisitionMethod,
    pub best_cost: f64,
    pub associated_cost: f64,
    pub rr: f64,
    pub instafill: f64,
    pub delta_ratio: f64,
    pub error_message: Option<String>,
}

impl Acquisition {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Acquisition {
            method: AcquisitionMethod::NotAvailable,
            best_cost: f64::INFINITY,
            associated_cost: f64::INFINITY,
            rr: f64::NAN,
            instafill: f64::NAN,
            delta_ratio: f64::NAN,
            error_message: Some(message.into()),
        }
    }
}

/// The two raw candidate costs plus the quantities computed along the way, before either is
/// picked as "best".
#[derive(Debug, Clone, Copy)]
pub struct CostBreakdown {
    pub primary: f64,
    pub secondary: f64,
    pub delta_ratio: f64,
    pub instafill: f64,
    pub relist_rounds: f64,
}

/// IF (InstaFill equivalent) and RR (Relist Rounds) as defined in this section — shared with
/// the fill-time estimator, which reports the same pair for diagnostic purposes (§4.4).
pub fn instafill_and_relist_rounds(qty: f64, metrics: &ProductMetrics) -> (f64, f64) {
    let instafill = if metrics.order_frequency > 0.0 {
        (metrics.sell_size * metrics.sell_frequency / metrics.order_frequency).max(0.0)
    } else {
        0.0
    };

    let relist_rounds = if instafill <= 0.0 {
        f64::INFINITY
    } else {
        (qty / instafill).ceil().max(1.0)
    };

    (instafill, relist_rounds)
}

/// Computes Primary cost, Secondary cost, and the derived Δratio/IF/RR quantities for
/// `(qty, sellP, buyP, metrics)`. Callers must ensure `qty > 0`, `sellP > 0`, `buyP > 0` —
/// `getBestC10M` is the entry point that enforces this and handles the N/A case.
pub fn compute(qty: f64, sell_p: f64, buy_p: f64, metrics: &ProductMetrics) -> CostBreakdown {
    let supply_rate = metrics.sell_size * metrics.sell_frequency;
    let demand_rate = metrics.order_size * metrics.order_frequency;

    let delta_ratio = if demand_rate == 0.0 && supply_rate == 0.0 {
        1.0
    } else if demand_rate == 0.0 {
        f64::INFINITY
    } else {
        supply_rate / demand_rate
    };

    let base = qty * sell_p;

    let (primary, instafill, relist_rounds) = if delta_ratio > 1.0 {
        // supply-dominated: the resting buy order fills immediately at the top of book.
        (base, f64::INFINITY, 1.0)
    } else {
        let (instafill, relist_rounds) = instafill_and_relist_rounds(qty, metrics);

        if relist_rounds.is_infinite() {
            (f64::INFINITY, instafill, relist_rounds)
        } else {
            let adjustment = if relist_rounds > 1.0 {
                1.0 - 1.0 / relist_rounds
            } else {
                0.0
            };
            let k = relist_rounds.floor();
            let sum_k = k * (k + 1.0) / 2.0;
            // Open question in the source spec: numerically volatile for large RR. Preserve the
            // formula verbatim and clamp any negative result to 0 rather than inventing a
            // different closed form.
            let extra = sell_p * (qty * relist_rounds - instafill * sum_k).max(0.0);
            (base + adjustment * extra, instafill, relist_rounds)
        }
    };

    let secondary = qty * buy_p;

    CostBreakdown {
        primary: numeric::sanitize_cost(primary),
        secondary: numeric::sanitize_cost(secondary),
        delta_ratio,
        instafill: numeric::sanitize_ancillary(instafill),
        relist_rounds: numeric::sanitize_ancillary(relist_rounds),
    }
}

/// Computes the Primary and Secondary candidates independently, without picking a winner.
/// `DualPerspective` (§4.8) needs both sides even when only one of them ends up chosen, so this
/// is the shared core that both `get_best` and the perspective module build on.
///
/// Returns `(None, None)` when price data is absent or non-positive. Returns `(None, Some(_))`
/// when metrics are absent — Primary cannot be costed without them, so only Secondary is
/// returned, carrying the "metrics not found" note.
pub fn get_candidates(
    item_id: &str,
    qty: f64,
    price_view: &PriceView,
    metrics_view: &MetricsView,
) -> (Option<Acquisition>, Option<Acquisition>) {
    let canonical = id::canon(item_id);
    let sell_p = price_view.sell_price(canonical.as_str());
    let buy_p = price_view.buy_price(canonical.as_str());

    if sell_p <= 0.0 || buy_p <= 0.0 || !sell_p.is_finite() || !buy_p.is_finite() {
        return (None, None);
    }

    let metrics = match metrics_view.get(canonical.as_str()) {
        Some(metrics) => metrics,
        None => {
            let secondary_cost = numeric::sanitize_cost(qty * buy_p);
            let secondary = Acquisition {
                method: AcquisitionMethod::Secondary,
                best_cost: secondary_cost,
                associated_cost: secondary_cost,
                rr: f64::NAN,
                instafill: f64::NAN,
                delta_ratio: f64::NAN,
                error_message: Some("metrics not found".to_string()),
            };
            return (None, Some(secondary));
        }
    };

    let breakdown = compute(qty, sell_p, buy_p, metrics);

    let primary = Acquisition {
        method: AcquisitionMethod::Primary,
        best_cost: breakdown.primary,
        associated_cost: numeric::sanitize_cost(qty * sell_p),
        rr: breakdown.relist_rounds,
        instafill: breakdown.instafill,
        delta_ratio: breakdown.delta_ratio,
        error_message: None,
    };
    let secondary = Acquisition {
        method: AcquisitionMethod::Secondary,
        best_cost: breakdown.secondary,
        associated_cost: numeric::sanitize_cost(qty * buy_p),
        rr: f64::NAN,
        instafill: f64::NAN,
        delta_ratio: breakdown.delta_ratio,
        error_message: None,
    };
    (Some(primary), Some(secondary))
}

/// Chooses between Primary and Secondary acquisition for `(item, qty)`, canonicalizing the id
/// and looking up price/metrics itself.
pub fn get_best(
    item_id: &str,
    qty: f64,
    price_view: &PriceView,
    metrics_view: &MetricsView,
) -> Acquisition {
    match get_candidates(item_id, qty, price_view, metrics_view) {
        (None, None) => Acquisition::unavailable("API data not found"),
        (None, Some(secondary)) => secondary,
        (Some(primary), Some(secondary)) => {
            // Tie rule: primary <= secondary picks Primary. RR/IF are reported only when
            // Primary wins.
            if primary.best_cost <= secondary.best_cost {
                primary
            } else {
                secondary
            }
        }
        (Some(_), None) => unreachable!("get_candidates never returns (Some, None)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::{PriceSnapshot, ProductPrice, QuickStatus};

    fn price(sell: f64, buy: f64) -> ProductPrice {
        ProductPrice {
            product_id: "X".to_string(),
            sell_summary: vec![],
            buy_summary: vec![],
            quick_status: QuickStatus {
                buy_price: buy,
                sell_price: sell,
                buy_moving_week: 0.0,
                sell_moving_week: 0.0,
            },
        }
    }

    #[test]
    fn supply_dominated_single_item() {
        let metrics = ProductMetrics {
            sell_size: 10.0,
            sell_frequency: 1.0,
            order_size: 1.0,
            order_frequency: 1.0,
        };
        let breakdown = compute(50.0, 100.0, 110.0, &metrics);
        assert_eq!(breakdown.delta_ratio, 10.0);
        assert_eq!(breakdown.primary, 5000.0);
        assert_eq!(breakdown.instafill, f64::INFINITY);
        assert_eq!(breakdown.relist_rounds, 1.0);
        assert_eq!(breakdown.secondary, 5500.0);
    }

    #[test]
    fn demand_heavy_requires_relisting() {
        let metrics = ProductMetrics {
            sell_size: 1.0,
            sell_frequency: 1.0,
            order_size: 10.0,
            order_frequency: 10.0,
        };
        let breakdown = compute(20.0, 100.0, 110.0, &metrics);
        assert!((breakdown.delta_ratio - 0.01).abs() < 1e-9);
        assert_eq!(breakdown.instafill, 0.1);
        assert_eq!(breakdown.relist_rounds, 200.0);
        assert_eq!(breakdown.primary, 200005.0);
        assert_eq!(breakdown.secondary, 2200.0);
    }

    #[test]
    fn missing_metrics_falls_back_to_secondary() {
        let snapshot = PriceSnapshot::mock(vec![("ITEM", price(50.0, 55.0))]);
        let price_view = PriceView::new(&snapshot);
        let metrics = crate::metrics::Metrics::mock(vec![]);
        let metrics_view = MetricsView::new(&metrics);

        let acquisition = get_best("ITEM", 10.0, &price_view, &metrics_view);
        assert_eq!(acquisition.method, AcquisitionMethod::Secondary);
        assert_eq!(acquisition.best_cost, 550.0);
        assert!(acquisition.rr.is_nan());
        assert!(acquisition.instafill.is_nan());
        assert_eq!(acquisition.error_message.as_deref(), Some("metrics not found"));
    }

    #[test]
    fn missing_price_data_is_not_available() {
        let snapshot = PriceSnapshot::mock(vec![]);
        let price_view = PriceView::new(&snapshot);
        let metrics = crate::metrics::Metrics::mock(vec![]);
        let metrics_view = MetricsView::new(&metrics);

        let acquisition = get_best("ITEM", 10.0, &price_view, &metrics_view);
        assert_eq!(acquisition.method, AcquisitionMethod::NotAvailable);
        assert_eq!(acquisition.error_message.as_deref(), Some("API data not found"));
    }

    #[test]
    fn method_dominance_best_cost_never_exceeds_either_candidate() {
        let metrics = ProductMetrics {
            sell_size: 4.0,
            sell_frequency: 2.0,
            order_size: 3.0,
            order_frequency: 5.0,
        };
        let breakdown = compute(30.0, 12.0, 15.0, &metrics);
        let best = breakdown.primary.min(breakdown.secondary);
        assert!(best <= breakdown.primary && best <= breakdown.secondary);
    }
}
