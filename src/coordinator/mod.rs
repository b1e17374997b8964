//! The coordinator: a gRPC front end over the [`Scheduler`].

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::rpc::coordinator_server::{Coordinator, CoordinatorServer};
use crate::rpc::{Ack, DoneReport, Task, TaskRequest};
use crate::Error;

mod scheduler;

pub use scheduler::{Phase, Scheduler, Snapshot};

/// gRPC service handing out tasks from a shared [`Scheduler`].
///
/// Requests are served by at most `max_concurrent_workers` handlers at a
/// time; the rest queue for a free slot. A request parked at the map
/// barrier keeps its slot, which is why the scheduler never lets every
/// slot park.
pub struct CoordinatorService {
    scheduler: Arc<Scheduler>,
    slots: Arc<Semaphore>,
}

impl CoordinatorService {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        let slots = Arc::new(Semaphore::new(scheduler.max_concurrent_workers()));
        Self { scheduler, slots }
    }
}

#[tonic::async_trait]
impl Coordinator for CoordinatorService {
    async fn request_task(&self, request: Request<TaskRequest>) -> Result<Response<Task>, Status> {
        let _slot = self
            .slots
            .acquire()
            .await
            .map_err(|_| Status::unavailable("coordinator is shutting down"))?;
        let assignment = self.scheduler.request_task().await;
        debug!(peer = ?request.remote_addr(), kind = assignment.kind(), "task requested");
        Ok(Response::new(assignment.into()))
    }

    async fn report_done(&self, _request: Request<DoneReport>) -> Result<Response<Ack>, Status> {
        let _slot = self
            .slots
            .acquire()
            .await
            .map_err(|_| Status::unavailable("coordinator is shutting down"))?;
        self.scheduler.report_done();
        Ok(Response::new(Ack {}))
    }
}

/// Serves the coordinator protocol on `listener` until every task has
/// been handed out and reported done.
pub async fn serve(scheduler: Arc<Scheduler>, listener: TcpListener) -> crate::Result<()> {
    let addr = listener.local_addr().map_err(|e| Error::Io {
        context: "failed to read listener address".into(),
        source: e,
    })?;
    info!(
        %addr,
        n_map = scheduler.n_map(),
        n_reduce = scheduler.n_reduce(),
        max_workers = scheduler.max_concurrent_workers(),
        "coordinator listening"
    );

    let shutdown = scheduler.stopped();
    Server::builder()
        .add_service(CoordinatorServer::new(CoordinatorService::new(scheduler)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    info!("coordinator stopped");
    Ok(())
}
