//! Per-pass result document, failed-items report, and status document (§6). Every field that
//! may be NaN/±∞ serializes as JSON `null` via `numeric::serialize_f64_or_null`, grounded on the
//! teacher's `OutputRow`/`serialize_rational32_to_f64` in the old `main.rs`, generalized from
//! rounding a `Rational32` to emitting `null` for a plain `f64`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::id::CanonicalId;
use crate::numeric;
use crate::optimizer::OptimizerRecord;

/// Wraps the ranked record list with the run-level metadata §6 requires.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_timestamp: DateTime<Utc>,
    pub api_last_updated: Option<DateTime<Utc>>,
    pub total_items_considered: usize,
    pub items_successfully_calculated: usize,
    pub items_with_calculation_errors: usize,
    pub max_allowed_cycle_time_seconds: u64,
    pub max_initial_search_quantity: u32,
    pub records: Vec<OutputRecord>,
}

impl RunSummary {
    pub fn from_records(
        run_timestamp: DateTime<Utc>,
        api_last_updated: Option<DateTime<Utc>>,
        max_allowed_cycle_time_seconds: u64,
        max_initial_search_quantity: u32,
        records: &[OptimizerRecord],
    ) -> Self {
        let items_successfully_calculated = records.iter().filter(|r| r.calc_possible).count();
        RunSummary {
            run_timestamp,
            api_last_updated,
            total_items_considered: records.len(),
            items_successfully_calculated,
            items_with_calculation_errors: records.len() - items_successfully_calculated,
            max_allowed_cycle_time_seconds,
            max_initial_search_quantity,
            records: records.iter().map(OutputRecord::from).collect(),
        }
    }
}

/// Wire form of `OptimizerRecord` (§3/§6): identical fields, but every maybe-invalid float
/// routes through the shared null-sentinel serializer instead of serializing NaN/∞ directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub item: CanonicalId,
    pub max_feasible_qty: u32,
    #[serde(serialize_with = "numeric::serialize_f64_or_null")]
    pub cost_at_opt: f64,
    #[serde(serialize_with = "numeric::serialize_f64_or_null")]
    pub revenue_at_opt: f64,
    #[serde(serialize_with = "numeric::serialize_f64_or_null")]
    pub max_profit: f64,
    #[serde(serialize_with = "numeric::serialize_f64_or_null")]
    pub acq_time: f64,
    #[serde(serialize_with = "numeric::serialize_f64_or_null")]
    pub sale_time: f64,
    #[serde(serialize_with = "numeric::serialize_f64_or_null")]
    pub total_cycle_time: f64,
    pub bottleneck: Option<CanonicalId>,
    pub calc_possible: bool,
    pub error_message: Option<String>,
}

impl From<&OptimizerRecord> for OutputRecord {
    fn from(record: &OptimizerRecord) -> Self {
        OutputRecord {
            item: record.item.clone(),
            max_feasible_qty: record.max_feasible_qty,
            cost_at_opt: record.cost_at_opt,
            revenue_at_opt: record.revenue_at_opt,
            max_profit: record.max_profit,
            acq_time: record.acq_time,
            sale_time: record.sale_time,
            total_cycle_time: record.total_cycle_time,
            bottleneck: record.bottleneck.clone(),
            calc_possible: record.calc_possible,
            error_message: record.error_message.clone(),
        }
    }
}

/// One entry per `calcPossible = false` record (§6).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    pub item_name: CanonicalId,
    pub error_message: String,
}

impl FailedItem {
    pub fn collect(records: &[OptimizerRecord]) -> Vec<FailedItem> {
        records
            .iter()
            .filter(|r| !r.calc_possible)
            .map(|r| FailedItem {
                item_name: r.item.clone(),
                error_message: r
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "calculation failed".to_string()),
            })
            .collect()
    }
}

/// Current timestamps, last-attempt status strings, `isCurrentlyOptimizing`, and upstream
/// freshness (§6). Published under the same reader-writer discipline as the price snapshot and
/// metrics map (§5).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDocument {
    pub last_metrics_refresh: Option<DateTime<Utc>>,
    pub last_metrics_attempt_status: String,
    pub last_optimization_pass: Option<DateTime<Utc>>,
    pub last_optimization_attempt_status: String,
    pub is_currently_optimizing: bool,
    pub price_source_freshness_seconds: Option<i64>,
}

impl Default for StatusDocument {
    fn default() -> Self {
        StatusDocument {
            last_metrics_refresh: None,
            last_metrics_attempt_status: "not yet attempted".to_string(),
            last_optimization_pass: None,
            last_optimization_attempt_status: "not yet attempted".to_string(),
            is_currently_optimizing: false,
            price_source_freshness_seconds: None,
        }
    }
}

/// Writes the ranked record list to a CSV file, mirroring the teacher's `--output-csv` flag
/// (`csv::Writer::from_path` + `serialize` per row in the old `main.rs`).
pub fn write_csv(path: &std::path::Path, records: &[OutputRecord]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct CsvRow {
    item: String,
    max_feasible_qty: u32,
    cost_at_opt: f64,
    revenue_at_opt: f64,
    max_profit: f64,
    total_cycle_time: f64,
    calc_possible: bool,
}

impl From<&OutputRecord> for CsvRow {
    fn from(record: &OutputRecord) -> Self {
        // CSV has no null sentinel; finite-clamp so the file stays parseable by plain CSV tools.
        let clamp = |v: f64| if v.is_finite() { v } else { -1.0 };
        CsvRow {
            item: record.item.as_str().to_string(),
            max_feasible_qty: record.max_feasible_qty,
            cost_at_opt: clamp(record.cost_at_opt),
            revenue_at_opt: clamp(record.revenue_at_opt),
            max_profit: clamp(record.max_profit),
            total_cycle_time: clamp(record.total_cycle_time),
            calc_possible: record.calc_possible,
        }
    }
}
