//! Units of work handed from the coordinator to workers.
//!
//! On the wire a task is a flat [`rpc::Task`] message; inside the crate
//! it is an [`Assignment`], so nothing downstream has to interpret
//! sentinel ids or flags.

use crate::corpus::Extent;
use crate::planner::{Chunk, ChunkPlan};
use crate::rpc::{self, TaskKind};
use crate::{Error, Result};

/// Task id carried by retry and shutdown tasks on the wire.
const NO_TASK: i32 = -1;

/// Wire length meaning "read to end of file".
const TO_END: i64 = -1;

/// Largest task count, task id or file index the wire's `int32` fields
/// can carry.
pub const MAX_WIRE_INDEX: u32 = i32::MAX as u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTask {
    pub id: u32,
    pub chunks: ChunkPlan,
    /// Number of reduce buckets (`M`).
    pub n_reduce: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceTask {
    /// Bucket this task reduces.
    pub id: u32,
    /// Number of map tasks whose output must be read (`N`).
    pub n_map: u32,
}

/// What a worker is told to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Map(MapTask),
    Reduce(ReduceTask),
    /// Nothing to hand out right now; ask again shortly.
    Retry,
    /// The job is finished; stop asking.
    Shutdown,
}

impl Assignment {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Map(_) => "map",
            Self::Reduce(_) => "reduce",
            Self::Retry => "retry",
            Self::Shutdown => "shutdown",
        }
    }
}

/////////////////////////////////////////////////////////////////////////////
// Wire conversion
/////////////////////////////////////////////////////////////////////////////

impl From<&Chunk> for rpc::MetaData {
    fn from(chunk: &Chunk) -> Self {
        rpc::MetaData {
            file_index: chunk.file_index as i32,
            start_offset: chunk.start as i64,
            length: match chunk.extent {
                Extent::Bytes(n) => n as i64,
                Extent::ToEnd => TO_END,
            },
        }
    }
}

impl TryFrom<&rpc::MetaData> for Chunk {
    type Error = Error;

    fn try_from(meta: &rpc::MetaData) -> Result<Self> {
        let file_index = usize::try_from(meta.file_index)
            .map_err(|_| Error::InvalidTask(format!("negative file index {}", meta.file_index)))?;
        let start = u64::try_from(meta.start_offset)
            .map_err(|_| Error::InvalidTask(format!("negative offset {}", meta.start_offset)))?;
        let extent = match meta.length {
            TO_END => Extent::ToEnd,
            n => Extent::Bytes(
                u64::try_from(n).map_err(|_| Error::InvalidTask(format!("bad chunk length {n}")))?,
            ),
        };
        Ok(Chunk {
            file_index,
            start,
            extent,
        })
    }
}

impl From<Assignment> for rpc::Task {
    fn from(assignment: Assignment) -> Self {
        match assignment {
            Assignment::Map(task) => rpc::Task {
                is_map_task: true,
                task_id: task.id as i32,
                chunks: task.chunks.iter().map(rpc::MetaData::from).collect(),
                task_param: task.n_reduce as i32,
                kind: TaskKind::Map as i32,
            },
            Assignment::Reduce(task) => rpc::Task {
                is_map_task: false,
                task_id: task.id as i32,
                chunks: Vec::new(),
                task_param: task.n_map as i32,
                kind: TaskKind::Reduce as i32,
            },
            Assignment::Retry => idle_task(TaskKind::Retry),
            Assignment::Shutdown => idle_task(TaskKind::Shutdown),
        }
    }
}

fn idle_task(kind: TaskKind) -> rpc::Task {
    rpc::Task {
        is_map_task: false,
        task_id: NO_TASK,
        chunks: Vec::new(),
        task_param: NO_TASK,
        kind: kind as i32,
    }
}

fn positive(value: i32, what: &str) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| Error::InvalidTask(format!("{what} must be positive, got {value}")))
}

fn task_id(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::InvalidTask(format!("negative task id {value}")))
}

impl TryFrom<rpc::Task> for Assignment {
    type Error = Error;

    fn try_from(task: rpc::Task) -> Result<Self> {
        let kind = TaskKind::try_from(task.kind)
            .map_err(|_| Error::InvalidTask(format!("unknown task kind {}", task.kind)))?;
        match kind {
            TaskKind::Map => {
                if !task.is_map_task {
                    return Err(Error::InvalidTask("map task without map flag".into()));
                }
                Ok(Assignment::Map(MapTask {
                    id: task_id(task.task_id)?,
                    chunks: task.chunks.iter().map(Chunk::try_from).collect::<Result<_>>()?,
                    n_reduce: positive(task.task_param, "bucket count")?,
                }))
            }
            TaskKind::Reduce => Ok(Assignment::Reduce(ReduceTask {
                id: task_id(task.task_id)?,
                n_map: positive(task.task_param, "map task count")?,
            })),
            TaskKind::Retry => Ok(Assignment::Retry),
            TaskKind::Shutdown => Ok(Assignment::Shutdown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_keeps_the_legacy_sentinel_id() {
        let wire = rpc::Task::from(Assignment::Retry);
        assert_eq!(wire.task_id, -1);
        assert!(!wire.is_map_task);
        assert_eq!(Assignment::try_from(wire).unwrap(), Assignment::Retry);
    }

    #[test]
    fn map_tasks_carry_chunks_and_bucket_count() {
        let task = MapTask {
            id: 2,
            chunks: vec![
                Chunk::new(0, 14, Extent::ToEnd),
                Chunk::new(1, 0, Extent::Bytes(5)),
            ],
            n_reduce: 2,
        };
        let wire = rpc::Task::from(Assignment::Map(task.clone()));
        assert!(wire.is_map_task);
        assert_eq!(wire.task_param, 2);
        assert_eq!(wire.chunks[0].length, -1);
        assert_eq!(wire.chunks[1].length, 5);
        assert_eq!(Assignment::try_from(wire).unwrap(), Assignment::Map(task));
    }

    #[test]
    fn reduce_tasks_carry_map_count() {
        let wire = rpc::Task::from(Assignment::Reduce(ReduceTask { id: 1, n_map: 3 }));
        assert_eq!((wire.task_id, wire.task_param), (1, 3));
        assert_eq!(wire.kind(), TaskKind::Reduce);
    }

    #[test]
    fn inconsistent_wire_tasks_are_rejected() {
        let mut wire = rpc::Task::from(Assignment::Reduce(ReduceTask { id: 0, n_map: 1 }));
        wire.task_param = 0;
        assert!(matches!(Assignment::try_from(wire), Err(Error::InvalidTask(_))));

        let mut wire = rpc::Task::from(Assignment::Map(MapTask {
            id: 0,
            chunks: vec![Chunk::new(0, 0, Extent::ToEnd)],
            n_reduce: 1,
        }));
        wire.chunks[0].length = -7;
        assert!(Assignment::try_from(wire).is_err());

        let wire = rpc::Task { kind: 42, ..Default::default() };
        assert!(Assignment::try_from(wire).is_err());
    }
}
