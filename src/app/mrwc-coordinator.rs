use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mrwc::cmd::coordinator::Args;
use mrwc::coordinator::{self, Scheduler};
use mrwc::corpus::{Corpus, DiskCorpus};
use mrwc::planner::{self, PlanReport};
use mrwc::telemetry;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing()?;
    let args = Args::parse();
    let layout = args.layout.layout();

    let corpus = DiskCorpus::from_glob(&layout.inputs)
        .with_context(|| format!("failed to list inputs {:?}", layout.inputs))?;
    if corpus.file_count() == 0 {
        warn!(inputs = %layout.inputs, "no input files matched");
    }

    let plans = planner::plan(&corpus, args.n_map as usize)?;
    let report = PlanReport::new(&corpus, &plans)?;
    info!(
        files = corpus.file_count(),
        bytes = report.total_bytes,
        n_map = args.n_map,
        "corpus planned"
    );
    for task in &report.tasks {
        debug!(
            task = task.task_id,
            bytes = task.bytes,
            chunks = task.chunks.len(),
            "map task load"
        );
    }
    if let Some(path) = &args.plan_out {
        report.save(path)?;
        info!(path = %path.display(), "plan written");
    }

    let scheduler = Arc::new(Scheduler::new(plans, args.n_reduce, args.max_workers)?);
    let listener = TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;
    coordinator::serve(scheduler, listener).await?;
    Ok(())
}
