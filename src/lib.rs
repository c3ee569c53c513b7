//! Bazaar crafting/acquisition profit engine: for each tradable item, decides whether to craft
//! or buy each ingredient, estimates how long acquisition and resale will take, and ranks items
//! by the largest profitable quantity it can move within a cycle-time budget.
//!
//! Module layout mirrors the pipeline: `id` canonicalizes item ids, `price`/`metrics`/`recipe`
//! are the three input views, `cost_model`/`fill_time` are the per-node cost and timing
//! primitives, `expander`/`analyzer`/`perspective` build and evaluate crafting trees, and
//! `optimizer` turns a tree evaluation into a ranked batch result. `config`, `providers`,
//! `scheduler`, and `output` are the ambient service layer around that core.

pub mod analyzer;
pub mod config;
pub mod cost_model;
pub mod error;
pub mod expander;
pub mod fill_time;
pub mod id;
pub mod metrics;
pub mod numeric;
pub mod optimizer;
pub mod output;
pub mod perspective;
pub mod price;
pub mod providers;
pub mod recipe;
pub mod scheduler;
