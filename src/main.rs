use std::collections::HashMap;
use std::sync::Arc;

use colored::Colorize;
use structopt::StructOpt;

use bazaar_arbitrage::config::{Config, Opt, CONFIG};
use bazaar_arbitrage::expander::{self, CraftingNode, NodeContent};
use bazaar_arbitrage::id::CanonicalId;
use bazaar_arbitrage::optimizer;
use bazaar_arbitrage::output;
use bazaar_arbitrage::price::PriceView;
use bazaar_arbitrage::providers::{
    CachedMetricsProvider, FileRecipeStore, HttpPriceProvider, MetricsProvider,
    PriceSnapshotProvider,
};
use bazaar_arbitrage::recipe::RecipeStore;
use bazaar_arbitrage::scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opt = Opt::from_args();
    let config: &'static Config = if opt.config_file.is_some() {
        Box::leak(Box::new(Config::from_env_and_file(&opt.config_file)))
    } else {
        &CONFIG
    };

    let price_provider: Arc<dyn PriceSnapshotProvider> =
        Arc::new(HttpPriceProvider::new(config.price_snapshot_url.clone()));
    let metrics_provider: Arc<dyn MetricsProvider> = Arc::new(CachedMetricsProvider::new(
        config.metrics_remote_url.clone(),
        config.metrics_cache_file.clone(),
    ));
    let recipe_store = Arc::new(RecipeStore::new(Arc::new(FileRecipeStore::new(
        config.recipe_directory.clone(),
    ))));

    match &opt.item_id {
        Some(item_id) => run_one_shot(item_id, &opt, config, &price_provider, &metrics_provider, &recipe_store).await,
        None => run_service(&opt, config, price_provider, metrics_provider, recipe_store).await,
    }
}

/// Evaluates a single item and prints its crafting decision, shopping list, and profit
/// breakdown — mirrors the teacher's `item_id` one-shot branch in the old `main.rs`.
async fn run_one_shot(
    item_id: &str,
    opt: &Opt,
    config: &Config,
    price_provider: &Arc<dyn PriceSnapshotProvider>,
    metrics_provider: &Arc<dyn MetricsProvider>,
    recipe_store: &Arc<RecipeStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Fetching price snapshot");
    let snapshot = price_provider.fetch().await?;
    println!("Fetching metrics");
    let metrics = metrics_provider.fetch().await?;

    let price_view = PriceView::new(&snapshot);
    let metrics_view = bazaar_arbitrage::metrics::MetricsView::new(&metrics);

    let max_cycle_time = opt
        .max_cycle_time
        .map(std::time::Duration::from_secs)
        .unwrap_or(config.max_cycle_time);
    let qty_max = opt.count.unwrap_or(config.max_search_qty);

    let record = optimizer::optimize_item(
        item_id,
        qty_max,
        max_cycle_time,
        &price_view,
        &metrics_view,
        recipe_store,
    );

    if !record.calc_possible {
        println!(
            "{}",
            format!(
                "Item is not profitable to craft or buy: {}",
                record.error_message.as_deref().unwrap_or("unknown error")
            )
            .red()
        );
        return Ok(());
    }

    let tree = expander::expand_tree(
        item_id,
        record.max_feasible_qty.max(1) as f64,
        &price_view,
        &metrics_view,
        recipe_store,
    );

    println!("============");
    println!("Shopping list for {} x {}", record.max_feasible_qty, record.item);
    println!("============");
    let mut shopping_list = HashMap::new();
    collect_shopping_list(&tree, &mut shopping_list);
    let mut entries: Vec<_> = shopping_list.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    for (item, qty) in entries {
        println!("{:<40} {:>15.2}", item.to_string(), qty);
    }

    println!("============");
    println!("Cost at optimum:     {:.2}", record.cost_at_opt);
    println!("Revenue at optimum:  {:.2}", record.revenue_at_opt);
    println!("Max profit:          {:.2}", record.max_profit);
    println!(
        "Cycle time:          {:.0}s (acquire {:.0}s + sell {:.0}s)",
        record.total_cycle_time, record.acq_time, record.sale_time
    );
    if let Some(bottleneck) = &record.bottleneck {
        println!("Bottleneck:          {}", bottleneck);
    }

    if let Some(path) = &opt.output_csv {
        output::write_csv(path, &[output::OutputRecord::from(&record)])?;
    }

    Ok(())
}

fn collect_shopping_list(node: &CraftingNode, totals: &mut HashMap<CanonicalId, f64>) {
    match &node.content {
        NodeContent::Base { .. } => {
            *totals.entry(node.item.clone()).or_insert(0.0) += node.qty_needed;
        }
        NodeContent::Internal { ingredients, .. } => {
            for child in ingredients {
                collect_shopping_list(child, totals);
            }
        }
    }
}

/// Runs one batch pass immediately for local inspection, prints the ranked table, then hands
/// the scheduler off to its persistent background loop — mirrors the teacher's "load, compute,
/// print, then keep the process alive" shape, generalized to a long-running service.
async fn run_service(
    opt: &Opt,
    config: &'static Config,
    price_provider: Arc<dyn PriceSnapshotProvider>,
    metrics_provider: Arc<dyn MetricsProvider>,
    recipe_store: Arc<RecipeStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = Arc::new(Scheduler::new(
        config,
        price_provider,
        metrics_provider,
        recipe_store,
    ));

    println!("Running initial optimization pass");
    scheduler.refresh_metrics().await;
    let ran = scheduler.run_optimization_pass().await;
    if !ran {
        println!("{}", "Initial pass was skipped; see status for details".yellow());
    }

    if let Some(summary) = scheduler.latest_results().await {
        print_table(&summary);
        if let Some(path) = &opt.output_csv {
            output::write_csv(path, &summary.records)?;
        }
    }

    println!("Entering service mode; refreshing on the configured intervals");
    scheduler.run_forever().await;
    Ok(())
}

fn print_table(summary: &output::RunSummary) {
    let mut line_colors = [
        colored::Color::Red,
        colored::Color::Green,
        colored::Color::Yellow,
        colored::Color::Magenta,
        colored::Color::Cyan,
    ]
    .iter()
    .cycle();

    let header = format!(
        "{:<30} {:>12} {:>15} {:>15} {:>15} {:>15}",
        "Item", "Max qty", "Cost", "Revenue", "Profit", "Cycle time (s)",
    );
    println!("{}", header);
    println!("{}", "=".repeat(header.len()));

    for record in &summary.records {
        if !record.calc_possible {
            continue;
        }
        let line = format!(
            "{:<30} {:>12} {:>15.2} {:>15.2} {:>15.2} {:>15.0}",
            record.item.to_string(),
            record.max_feasible_qty,
            record.cost_at_opt,
            record.revenue_at_opt,
            record.max_profit,
            record.total_cycle_time,
        );
        println!("{}", line.color(*line_colors.next().unwrap()));
    }

    println!("{}", "=".repeat(header.len()));
    println!(
        "Considered {} items, {} succeeded, {} failed",
        summary.total_items_considered,
        summary.items_successfully_calculated,
        summary.items_with_calculation_errors
    );
}
