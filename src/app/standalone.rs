use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mrwc::corpus::DiskCorpus;
use mrwc::standalone::engine::{read_totals, run_in_process};
use mrwc::standalone::Args;
use mrwc::store::LocalStore;
use mrwc::telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing()?;
    let args = Args::parse();
    let layout = args.layout.layout();

    let corpus = DiskCorpus::from_glob(&layout.inputs)
        .with_context(|| format!("failed to list inputs {:?}", layout.inputs))?;
    let store = Arc::new(LocalStore::new(layout));

    let run = run_in_process(
        Arc::new(corpus),
        Arc::clone(&store),
        args.n_map as usize,
        args.n_reduce,
        args.workers,
        args.max_workers,
    )
    .await?;
    if let Some(path) = &args.plan_out {
        run.plan.save(path)?;
        info!(path = %path.display(), "plan written");
    }

    let totals = read_totals(&*store, args.n_reduce)?;
    println!(
        "{} distinct words, {} occurrences, {} bytes read",
        totals.len(),
        totals.values().sum::<u64>(),
        run.plan.total_bytes
    );
    Ok(())
}
