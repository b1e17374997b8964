use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use crate::coordinator::Scheduler;
use crate::corpus::Corpus;
use crate::planner::{self, PlanReport};
use crate::store::ShuffleStore;
use crate::wordcount::parse_output;
use crate::worker::{Worker, WorkerSummary};
use crate::{Error, Result};

/// What an in-process run did.
#[derive(Debug)]
pub struct StandaloneRun {
    pub plan: PlanReport,
    pub workers: Vec<WorkerSummary>,
}

/// Plans `corpus` into `n_map` tasks and runs the job with `workers`
/// worker tasks pulling from one scheduler.
pub async fn run_in_process<C, S>(
    corpus: Arc<C>,
    store: Arc<S>,
    n_map: usize,
    n_reduce: u32,
    workers: usize,
    max_concurrent: usize,
) -> Result<StandaloneRun>
where
    C: Corpus + Send + Sync + ?Sized + 'static,
    S: ShuffleStore + ?Sized + 'static,
{
    if workers == 0 {
        return Err(Error::Config("at least one worker is required".into()));
    }
    let plans = planner::plan(&*corpus, n_map)?;
    let plan = PlanReport::new(&*corpus, &plans)?;
    let scheduler = Arc::new(Scheduler::new(plans, n_reduce, max_concurrent)?);
    info!(n_map, n_reduce, workers, bytes = plan.total_bytes, "starting in-process run");

    let handles: Vec<_> = (0..workers)
        .map(|id| {
            let worker = Worker::new(
                Arc::clone(&scheduler),
                Arc::clone(&corpus),
                Arc::clone(&store),
            );
            tokio::spawn(worker.run().instrument(info_span!("worker", id)))
        })
        .collect();

    let mut summaries = Vec::with_capacity(workers);
    for handle in handles {
        summaries.push(handle.await??);
    }
    Ok(StandaloneRun {
        plan,
        workers: summaries,
    })
}

/// Merges every output bucket into one word table.
///
/// Fails if a word shows up in two buckets.
pub fn read_totals<S>(store: &S, n_reduce: u32) -> Result<BTreeMap<String, u64>>
where
    S: ShuffleStore + ?Sized,
{
    let mut totals = BTreeMap::new();
    for bucket in 0..n_reduce {
        for (word, count) in parse_output(&store.get_output(bucket)?)? {
            if totals.insert(word.clone(), count).is_some() {
                return Err(Error::Config(format!("{word:?} appears in more than one bucket")));
            }
        }
    }
    Ok(totals)
}
