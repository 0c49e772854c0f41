//! # Cairn Bench
//!
//! Plans the crafting demonstration goal once, then times repeated planning
//! of the same goal on one planner instance.

use std::env;
use std::time::Instant;

use anyhow::Context;
use cairn_planner::{Planner, PlannerConfig, RegressionPlanner};
use tracing::info;
use tracing::subscriber::NoSubscriber;
use tracing_subscriber::EnvFilter;

mod crafting;

const DEFAULT_ITERATIONS: u32 = 10_000;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match env::var("CAIRN_PLANNER_CONFIG") {
        Ok(json) => PlannerConfig::from_json(&json).context("parsing CAIRN_PLANNER_CONFIG")?,
        Err(_) => PlannerConfig::default(),
    };
    let iterations = match env::var("CAIRN_BENCH_ITERATIONS") {
        Ok(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("parsing CAIRN_BENCH_ITERATIONS={raw}"))?,
        Err(_) => DEFAULT_ITERATIONS,
    };

    let domain = crafting::domain().context("building crafting domain")?;
    let goal = crafting::goal(&domain).context("building crafting goal")?;
    let mut planner = RegressionPlanner::with_config(&domain, config);

    let plan = planner.plan(&goal)?;
    for bind in &plan.actions {
        info!("  {}", domain.describe(bind, &plan.values));
    }
    info!("Plan cost {} valid: {}", plan.cost, planner.validate_plan(&plan, &goal));
    println!("{}", plan.to_json()?);

    // Keep per-plan logging out of the timing.
    let begin = Instant::now();
    tracing::subscriber::with_default(NoSubscriber::default(), || -> anyhow::Result<()> {
        for _ in 0..iterations {
            planner.plan(&goal)?;
        }
        Ok(())
    })?;
    let elapsed = begin.elapsed();

    info!(
        "Planned {} times in {}ms ({:.1}us per plan)",
        iterations,
        elapsed.as_millis(),
        elapsed.as_secs_f64() * 1e6 / f64::from(iterations.max(1))
    );

    Ok(())
}
