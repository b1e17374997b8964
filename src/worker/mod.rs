//! The worker loop: request a task, run it, report it, repeat.

use std::sync::Arc;
use std::time::Duration;

use tokio::task;
use tokio::time::sleep;
use tracing::{info, warn, Span};

use crate::corpus::Corpus;
use crate::store::ShuffleStore;
use crate::task::Assignment;
use crate::Result;

pub mod exec;
mod source;

pub use exec::{run_map, run_reduce, MapStats, ReduceStats};
pub use source::{RpcSource, TaskSource};

const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(500);

/// Delay between retries: 10ms doubling up to 500ms.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            current: INITIAL_BACKOFF,
        }
    }
}

impl Backoff {
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(MAX_BACKOFF);
        delay
    }

    pub fn reset(&mut self) {
        self.current = INITIAL_BACKOFF;
    }
}

/// Outcome of one request/execute/report round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Mapped(u32),
    Reduced(u32),
    Retried,
    Shutdown,
}

/// Why a worker stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    /// The coordinator said the job is finished.
    Shutdown,
    /// The coordinator could not be reached any more.
    Disconnected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    pub maps: Vec<u32>,
    pub reduces: Vec<u32>,
    pub retries: u64,
    pub exit: Exit,
}

impl WorkerSummary {
    pub fn tasks(&self) -> usize {
        self.maps.len() + self.reduces.len()
    }
}

pub struct Worker<T, C: ?Sized, S: ?Sized> {
    source: T,
    corpus: Arc<C>,
    store: Arc<S>,
    backoff: Backoff,
}

impl<T, C, S> Worker<T, C, S>
where
    T: TaskSource,
    C: Corpus + Send + Sync + ?Sized + 'static,
    S: ShuffleStore + ?Sized + 'static,
{
    pub fn new(source: T, corpus: Arc<C>, store: Arc<S>) -> Self {
        Self {
            source,
            corpus,
            store,
            backoff: Backoff::default(),
        }
    }

    /// Requests one task and, if it is real work, runs and reports it.
    pub async fn step(&mut self) -> Result<Step> {
        let step = match self.source.request_task().await? {
            Assignment::Map(map) => {
                let id = map.id;
                let (corpus, store) = (Arc::clone(&self.corpus), Arc::clone(&self.store));
                let span = Span::current();
                let stats = task::spawn_blocking(move || {
                    span.in_scope(|| run_map(&*corpus, &*store, &map))
                })
                .await??;
                info!(task = id, words = stats.words, "map task done");
                Step::Mapped(id)
            }
            Assignment::Reduce(reduce) => {
                let store = Arc::clone(&self.store);
                let span = Span::current();
                let stats =
                    task::spawn_blocking(move || span.in_scope(|| run_reduce(&*store, &reduce)))
                        .await??;
                info!(
                    task = reduce.id,
                    distinct = stats.distinct_words,
                    "reduce task done"
                );
                Step::Reduced(reduce.id)
            }
            Assignment::Retry => return Ok(Step::Retried),
            Assignment::Shutdown => return Ok(Step::Shutdown),
        };
        self.source.report_done().await?;
        Ok(step)
    }

    /// Runs until the coordinator says shutdown or goes away.
    ///
    /// Losing the coordinator is a normal way to end; any other failure
    /// is returned as an error.
    pub async fn run(mut self) -> Result<WorkerSummary> {
        let mut maps = Vec::new();
        let mut reduces = Vec::new();
        let mut retries = 0;

        let exit = loop {
            match self.step().await {
                Ok(Step::Mapped(id)) => {
                    maps.push(id);
                    self.backoff.reset();
                }
                Ok(Step::Reduced(id)) => {
                    reduces.push(id);
                    self.backoff.reset();
                }
                Ok(Step::Retried) => {
                    retries += 1;
                    sleep(self.backoff.next_delay()).await;
                }
                Ok(Step::Shutdown) => break Exit::Shutdown,
                Err(e) if e.is_transport() => {
                    warn!(error = %e, "lost the coordinator");
                    break Exit::Disconnected(e.to_string());
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            maps = maps.len(),
            reduces = reduces.len(),
            retries,
            ?exit,
            "worker finished"
        );
        Ok(WorkerSummary {
            maps,
            reduces,
            retries,
            exit,
        })
    }
}
