use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mrwc::cmd::worker::Args;
use mrwc::corpus::{Corpus, DiskCorpus};
use mrwc::store::LocalStore;
use mrwc::telemetry;
use mrwc::worker::{Exit, RpcSource, Worker};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

async fn run(args: Args) -> Result<()> {
    let layout = args.layout.layout();
    let corpus = DiskCorpus::from_glob(&layout.inputs)
        .with_context(|| format!("failed to list inputs {:?}", layout.inputs))?;
    info!(join = %args.join, files = corpus.file_count(), "worker starting");

    let source = RpcSource::connect(&args.join, Duration::from_secs(args.connect_timeout))
        .await
        .with_context(|| format!("could not reach coordinator at {}", args.join))?;
    let store = LocalStore::new(layout);

    let summary = Worker::new(source, Arc::new(corpus), Arc::new(store)).run().await?;
    if let Exit::Disconnected(reason) = &summary.exit {
        warn!(%reason, tasks = summary.tasks(), "coordinator went away");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing()?;
    let args = Args::parse();
    let span = info_span!("worker", id = %Uuid::new_v4());
    run(args).instrument(span).await
}
