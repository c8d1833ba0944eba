use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::AsyncBufRead;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{drain, feeder, lowercase, message, rotate};

/// Capacity of the drain tap; enough to buffer a whole interactive session.
const TAP_CHAN_CAP: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageExit {
    /// Stopped after seeing (and forwarding) the sentinel.
    Sentinel,
    /// Input source or upstream channel is gone.
    Closed,
    /// Stopped by the cancellation token.
    Cancelled,
    /// Did not stop within the grace period and was aborted.
    Forced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineReport {
    pub feeder: StageExit,
    pub lowercase: StageExit,
    pub rotate: StageExit,
    pub drain: StageExit,
}

#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    /// Minimum interval between two stage-1 forwards.
    pub rate_limit: Duration,
    /// How long shutdown waits for a loop before aborting it.
    pub shutdown_grace: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rate_limit: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

/// Pipeline: feeder -> lowercase -> rotate -> drain over two queues and a
/// single-slot stage link, all watching one cancellation token.
pub struct Pipeline {
    config: PipelineConfig,
    cancel: CancellationToken,
    started: AtomicBool,
    tap: broadcast::Sender<String>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, cancel: CancellationToken) -> Self {
        let (tap, _) = broadcast::channel(TAP_CHAN_CAP);
        Self {
            config,
            cancel,
            started: AtomicBool::new(false),
            tap,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check if shutdown has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Subscribe to the messages the drain reports, in drain order.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tap.subscribe()
    }

    /// Runs the pipeline over `input` until it shuts down, then reports how
    /// each loop stopped.
    pub async fn run<R>(&self, input: R) -> anyhow::Result<PipelineReport>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        if self.started.swap(true, Ordering::Relaxed) {
            anyhow::bail!("pipeline already started");
        }
        log::info!("pipeline starting");

        let (in_tx, in_rx) = message::queue();
        let (link_tx, link_rx) = message::pipe();
        let (out_tx, out_rx) = message::queue();

        let feeder = tokio::spawn(feeder::run_feeder(
            input,
            in_tx.clone(),
            self.cancel.clone(),
        ));
        let stage1 = tokio::spawn(lowercase::run_lowercase(
            in_rx,
            link_tx,
            self.config.rate_limit,
            self.cancel.clone(),
        ));
        let stage2 = tokio::spawn(rotate::run_rotate(link_rx, out_tx, self.cancel.clone()));
        let drain = tokio::spawn(drain::run_drain(out_rx, self.tap.clone()));

        // Keep a producer handle so the inbound queue stays open when the
        // feeder stops without a sentinel; the stages then idle on the token
        // instead of seeing the queue close under them.
        let _inbound = in_tx;

        let feeder_exit = join(feeder).await;

        let report = if feeder_exit == StageExit::Sentinel {
            // Sentinel is in flight; the drain stops once it propagates, and
            // the stages are already done (or about to be) when it does.
            let drain_exit = join(drain).await;
            let deadline = Instant::now() + self.config.shutdown_grace;
            PipelineReport {
                feeder: feeder_exit,
                lowercase: join_by("lowercase", stage1, deadline).await,
                rotate: join_by("rotate", stage2, deadline).await,
                drain: drain_exit,
            }
        } else {
            // No sentinel entered the pipeline. Wait for a shutdown request,
            // then give every loop the grace period before aborting it.
            self.cancel.cancelled().await;
            let deadline = Instant::now() + self.config.shutdown_grace;
            PipelineReport {
                feeder: feeder_exit,
                lowercase: join_by("lowercase", stage1, deadline).await,
                rotate: join_by("rotate", stage2, deadline).await,
                drain: join_by("drain", drain, deadline).await,
            }
        };

        self.started.store(false, Ordering::Relaxed);
        log::info!("pipeline finished: {:?}", report);
        Ok(report)
    }
}

async fn join(handle: JoinHandle<StageExit>) -> StageExit {
    handle.await.unwrap_or(StageExit::Forced)
}

async fn join_by(name: &str, mut handle: JoinHandle<StageExit>, deadline: Instant) -> StageExit {
    match tokio::time::timeout_at(deadline, &mut handle).await {
        Ok(result) => result.unwrap_or(StageExit::Forced),
        Err(_) => {
            log::warn!("{}: still running after grace period, aborting", name);
            handle.abort();
            let _ = handle.await;
            StageExit::Forced
        }
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
