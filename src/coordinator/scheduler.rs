//! Task assignment state machine.
//!
//! ```text
//! MapAssign --(N handed out)--> MapBarrier --(N reported)--> ReduceAssign --(M handed out)--> Done
//! ```
//!
//! All state lives in one record behind one mutex; every transition and
//! counter update happens inside a single short critical section, and the
//! lock is never held across an `.await`.
//!
//! While in `MapBarrier`, callers of [`Scheduler::request_task`] are parked
//! until the last map task reports completion. At most
//! `max_concurrent_workers - 1` callers may be parked at once, so one
//! handler slot always stays free to carry that final report. Callers
//! beyond the bound are handed [`Assignment::Retry`] instead.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::planner::ChunkPlan;
use crate::task::{Assignment, MapTask, ReduceTask, MAX_WIRE_INDEX};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    MapAssign,
    MapBarrier,
    ReduceAssign,
    Done,
}

#[derive(Debug)]
struct State {
    phase: Phase,
    next_task_id: u32,
    tasks_done: u32,
    waiting_workers: usize,
}

/// Point-in-time copy of the scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub phase: Phase,
    pub next_task_id: u32,
    pub tasks_done: u32,
    pub waiting_workers: usize,
}

pub struct Scheduler {
    plans: Vec<ChunkPlan>,
    n_map: u32,
    n_reduce: u32,
    max_concurrent_workers: usize,
    state: Mutex<State>,
    /// Flipped to `true` exactly once, when the last map task reports.
    maps_done: watch::Sender<bool>,
    /// Flipped to `true` once every task has been handed out and reported.
    stop: watch::Sender<bool>,
}

impl Scheduler {
    /// Creates a scheduler for one map task per plan and `n_reduce`
    /// reduce buckets.
    pub fn new(
        plans: Vec<ChunkPlan>,
        n_reduce: u32,
        max_concurrent_workers: usize,
    ) -> Result<Self> {
        let n_map = u32::try_from(plans.len())
            .map_err(|_| Error::Config(format!("too many map tasks: {}", plans.len())))?;
        if n_map == 0 {
            return Err(Error::Config("at least one map task is required".into()));
        }
        if n_reduce == 0 {
            return Err(Error::Config("at least one reduce bucket is required".into()));
        }
        if max_concurrent_workers == 0 {
            return Err(Error::Config(
                "at least one concurrent worker slot is required".into(),
            ));
        }
        if n_map > MAX_WIRE_INDEX || n_reduce > MAX_WIRE_INDEX {
            return Err(Error::Config(format!(
                "task counts above {MAX_WIRE_INDEX} do not fit the wire format"
            )));
        }
        let max_file = plans.iter().flatten().map(|c| c.file_index).max();
        if max_file.is_some_and(|i| i > MAX_WIRE_INDEX as usize) {
            return Err(Error::Config(format!(
                "file indices above {MAX_WIRE_INDEX} do not fit the wire format"
            )));
        }

        Ok(Self {
            plans,
            n_map,
            n_reduce,
            max_concurrent_workers,
            state: Mutex::new(State {
                phase: Phase::MapAssign,
                next_task_id: 0,
                tasks_done: 0,
                waiting_workers: 0,
            }),
            maps_done: watch::Sender::new(false),
            stop: watch::Sender::new(false),
        })
    }

    pub fn n_map(&self) -> u32 {
        self.n_map
    }

    pub fn n_reduce(&self) -> u32 {
        self.n_reduce
    }

    pub fn max_concurrent_workers(&self) -> usize {
        self.max_concurrent_workers
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            phase: state.phase,
            next_task_id: state.next_task_id,
            tasks_done: state.tasks_done,
            waiting_workers: state.waiting_workers,
        }
    }

    /// Hands out the next task.
    ///
    /// May wait for an unbounded time at the map-completion barrier.
    /// Dropping the returned future while it waits gives up the caller's
    /// barrier slot.
    pub async fn request_task(&self) -> Assignment {
        loop {
            let mut released = {
                let mut state = self.lock();
                match state.phase {
                    Phase::MapAssign => return self.next_map_task(&mut state),
                    Phase::ReduceAssign => return self.next_reduce_task(&mut state),
                    Phase::Done => {
                        self.check_finished(&state);
                        return Assignment::Shutdown;
                    }
                    Phase::MapBarrier if *self.maps_done.borrow() => {
                        state.phase = Phase::ReduceAssign;
                        return self.next_reduce_task(&mut state);
                    }
                    Phase::MapBarrier => {
                        if state.waiting_workers >= self.max_concurrent_workers - 1 {
                            debug!(waiting = state.waiting_workers, "barrier full, sending retry");
                            return Assignment::Retry;
                        }
                        state.waiting_workers += 1;
                        debug!(waiting = state.waiting_workers, "parked at map barrier");
                        self.maps_done.subscribe()
                    }
                }
            };

            let _slot = BarrierSlot { state: &self.state };
            // The sender lives as long as `self`, so this only returns once
            // the flag is set.
            let _ = released.wait_for(|done| *done).await;
        }
    }

    fn next_map_task(&self, state: &mut State) -> Assignment {
        let id = state.next_task_id;
        state.next_task_id += 1;
        if state.next_task_id == self.n_map {
            state.next_task_id = 0;
            if state.tasks_done >= self.n_map {
                // Reports already cover every map task, so nobody would
                // ever release the barrier.
                state.phase = Phase::ReduceAssign;
                info!(n_map = self.n_map, "all map tasks assigned and reported");
            } else {
                state.phase = Phase::MapBarrier;
                info!(n_map = self.n_map, "all map tasks assigned, waiting for completion");
            }
        }
        debug!(task = id, "assigning map task");
        Assignment::Map(MapTask {
            id,
            chunks: self.plans[id as usize].clone(),
            n_reduce: self.n_reduce,
        })
    }

    fn next_reduce_task(&self, state: &mut State) -> Assignment {
        let id = state.next_task_id;
        state.next_task_id += 1;
        if state.next_task_id == self.n_reduce {
            state.phase = Phase::Done;
            info!(n_reduce = self.n_reduce, "all reduce tasks assigned");
        }
        debug!(task = id, "assigning reduce task");
        Assignment::Reduce(ReduceTask {
            id,
            n_map: self.n_map,
        })
    }

    /// Records one task completion.
    ///
    /// The `N`th report releases every caller parked at the barrier.
    pub fn report_done(&self) {
        let mut state = self.lock();
        let total = self.n_map + self.n_reduce;
        if state.tasks_done == total {
            warn!(total, "ignoring completion report beyond the task count");
            return;
        }
        state.tasks_done += 1;
        debug!(done = state.tasks_done, total, "task reported done");

        if state.tasks_done == self.n_map {
            if state.phase == Phase::MapBarrier {
                state.phase = Phase::ReduceAssign;
            }
            info!(
                released = state.waiting_workers,
                "all map tasks done, starting reduce phase"
            );
            self.maps_done.send_replace(true);
        }
        self.check_finished(&state);
    }

    fn check_finished(&self, state: &State) {
        if state.phase == Phase::Done
            && state.tasks_done == self.n_map + self.n_reduce
            && !*self.stop.borrow()
        {
            info!("all tasks done, stopping");
            self.stop.send_replace(true);
        }
    }

    /// Resolves once every map and reduce task has been handed out and
    /// reported done.
    pub fn stopped(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut stop = self.stop.subscribe();
        async move {
            let _ = stop.wait_for(|stop| *stop).await;
        }
    }
}

/// One caller parked at the barrier. Dropping it frees the slot, also
/// when the waiting future is cancelled.
struct BarrierSlot<'a> {
    state: &'a Mutex<State>,
}

impl Drop for BarrierSlot<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.waiting_workers -= 1;
    }
}
