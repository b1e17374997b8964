//! Where a worker gets its tasks from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use super::Backoff;
use crate::coordinator::Scheduler;
use crate::rpc::coordinator_client::CoordinatorClient;
use crate::rpc::{DoneReport, TaskRequest};
use crate::task::Assignment;
use crate::Result;

/// The worker's view of the coordinator protocol.
#[async_trait]
pub trait TaskSource: Send {
    /// Asks for the next task. May wait at the map barrier.
    async fn request_task(&mut self) -> Result<Assignment>;

    /// Reports that the most recently received task finished.
    async fn report_done(&mut self) -> Result<()>;
}

/// A coordinator reached over gRPC.
#[derive(Debug, Clone)]
pub struct RpcSource {
    client: CoordinatorClient<Channel>,
}

impl RpcSource {
    /// Connects to the coordinator at `addr` (`host:port`), retrying until
    /// `timeout` has passed.
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint(addr)?;
        let deadline = Instant::now() + timeout;
        let mut backoff = Backoff::default();
        loop {
            match endpoint.connect().await {
                Ok(channel) => return Ok(Self::from_channel(channel)),
                Err(e) if Instant::now() >= deadline => return Err(e.into()),
                Err(e) => {
                    debug!(%addr, error = %e, "coordinator not reachable yet");
                    sleep(backoff.next_delay()).await;
                }
            }
        }
    }

    /// Builds a source without connecting; the first call connects.
    pub fn lazy(addr: &str) -> Result<Self> {
        Ok(Self::from_channel(endpoint(addr)?.connect_lazy()))
    }

    fn from_channel(channel: Channel) -> Self {
        Self {
            client: CoordinatorClient::new(channel),
        }
    }
}

fn endpoint(addr: &str) -> Result<Endpoint> {
    let uri = if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    };
    Ok(Endpoint::from_shared(uri)?)
}

#[async_trait]
impl TaskSource for RpcSource {
    async fn request_task(&mut self) -> Result<Assignment> {
        let task = self.client.request_task(TaskRequest {}).await?.into_inner();
        Assignment::try_from(task)
    }

    async fn report_done(&mut self) -> Result<()> {
        self.client.report_done(DoneReport {}).await?;
        Ok(())
    }
}

/// In-process access to a scheduler, with no RPC hop.
#[async_trait]
impl TaskSource for Arc<Scheduler> {
    async fn request_task(&mut self) -> Result<Assignment> {
        Ok(Scheduler::request_task(self).await)
    }

    async fn report_done(&mut self) -> Result<()> {
        Scheduler::report_done(self);
        Ok(())
    }
}
