//! Paced pipeline worker.
//!
//! The runner owns the frame source and the [`DetectionPipeline`] and drives
//! them on a blocking thread at the configured frame rate. Everything else
//! talks to it through a [`PipelineHandle`]: encoded frames go out on a
//! broadcast channel, status on a watch channel, and commands come in on an
//! mpsc queue that is drained between frames.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sentinelx_media::{encode_jpeg, fallback_jpeg, Frame, FrameSource, SnapshotWriter, SourceEvent};
use sentinelx_models::DetectorStatus;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::alert_store::AlertStore;
use crate::clock::{Clock, SystemClock};
use crate::metrics;
use crate::pipeline::DetectionPipeline;

/// How long [`PipelineHandle::reset`] waits for the worker before clearing
/// the alert store itself.
pub const RESET_ACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Slow stream clients lag (and skip frames) past this many queued frames.
const FRAME_CHANNEL_CAPACITY: usize = 8;

/// Encoded JPEG shared between stream clients.
pub type JpegFrame = Arc<Vec<u8>>;

/// Commands applied by the worker between frames.
#[derive(Debug)]
pub enum PipelineCommand {
    /// External reset; the ack carries the number of alerts cleared.
    Reset { ack: oneshot::Sender<usize> },
    Shutdown,
}

/// Statistics returned when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub read_errors: u64,
    pub deadline_misses: u64,
    pub worst_cycle: Duration,
    pub stream_restarts: u64,
    pub resets: u64,
}

enum Control {
    Continue,
    Stop,
}

pub struct PipelineRunner<C: Clock = SystemClock> {
    pipeline: DetectionPipeline<C>,
    source: Box<dyn FrameSource>,
    snapshots: Arc<dyn SnapshotWriter>,
    frames: broadcast::Sender<JpegFrame>,
    status: watch::Sender<DetectorStatus>,
    commands: mpsc::UnboundedReceiver<PipelineCommand>,
    frame_budget: Duration,
    restart_delay: Duration,
    jpeg_quality: u8,
    summary: RunSummary,
}

impl<C: Clock + 'static> PipelineRunner<C> {
    /// Wire a runner and its control handle.
    pub fn new(
        pipeline: DetectionPipeline<C>,
        source: Box<dyn FrameSource>,
        snapshots: Arc<dyn SnapshotWriter>,
    ) -> (Self, PipelineHandle) {
        let (frames, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(pipeline.status());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let handle = PipelineHandle {
            commands: command_tx,
            frames: frames.clone(),
            status: status_rx,
            store: pipeline.store().clone(),
        };

        let frame_budget = pipeline.config().frame_budget();
        let restart_delay = pipeline.config().restart_delay;
        let jpeg_quality = pipeline.config().jpeg_quality;

        let runner = Self {
            pipeline,
            source,
            snapshots,
            frames,
            status: status_tx,
            commands: command_rx,
            frame_budget,
            restart_delay,
            jpeg_quality,
            summary: RunSummary::default(),
        };

        (runner, handle)
    }

    /// Run on tokio's blocking pool.
    pub fn spawn(self) -> JoinHandle<RunSummary> {
        tokio::task::spawn_blocking(move || self.run())
    }

    /// Drive the pipeline until the source ends for good, a shutdown is
    /// requested, or every handle is dropped.
    pub fn run(mut self) -> RunSummary {
        let span = self.pipeline.logger().create_span();
        let _guard = span.enter();

        info!(
            source = %self.source.describe(),
            frame_budget_ms = self.frame_budget.as_millis() as u64,
            "Detection pipeline started"
        );

        loop {
            let cycle_start = Instant::now();

            if let Control::Stop = self.drain_commands() {
                info!("Detection pipeline shutting down");
                break;
            }

            match self.source.next_frame() {
                Ok(SourceEvent::Frame(frame)) => self.handle_frame(&frame),
                Ok(SourceEvent::EndOfStream) => {
                    if let Err(e) = self.source.rewind() {
                        self.pipeline.mark_stopped(&format!("rewind failed: {e}"));
                        break;
                    }
                    self.pipeline.on_stream_restart();
                    self.summary.stream_restarts += 1;
                    self.publish_status();
                    thread::sleep(self.restart_delay);
                    continue;
                }
                Err(e) if e.is_permanent() => {
                    self.pipeline.mark_stopped(&e.to_string());
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Frame read failed, skipping");
                    self.summary.read_errors += 1;
                    self.publish_fallback();
                }
            }

            self.pace(cycle_start);
        }

        self.publish_status();
        info!(
            frames = self.summary.frames,
            restarts = self.summary.stream_restarts,
            deadline_misses = self.summary.deadline_misses,
            "Detection pipeline exited"
        );
        self.summary
    }

    fn drain_commands(&mut self) -> Control {
        loop {
            match self.commands.try_recv() {
                Ok(PipelineCommand::Reset { ack }) => {
                    // A closed ack means the handle gave up waiting and has
                    // already cleared the store for this reset.
                    if ack.is_closed() {
                        self.pipeline.on_late_reset();
                    } else {
                        let cleared = self.pipeline.on_external_reset();
                        if ack.send(cleared).is_err() {
                            debug!("Reset requester went away before acknowledgement");
                        }
                    }
                    self.summary.resets += 1;
                    self.publish_status();
                }
                Ok(PipelineCommand::Shutdown) => return Control::Stop,
                Err(TryRecvError::Empty) => return Control::Continue,
                Err(TryRecvError::Disconnected) => return Control::Stop,
            }
        }
    }

    fn handle_frame(&mut self, frame: &Frame) {
        self.pipeline.process_frame(frame, self.snapshots.as_ref());
        self.summary.frames += 1;
        self.publish_frame(frame);
        self.publish_status();
    }

    fn publish_frame(&self, frame: &Frame) {
        if self.frames.receiver_count() == 0 {
            return;
        }

        let jpeg = match encode_jpeg(frame, self.jpeg_quality) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                debug!(error = %e, "Frame encode failed, sending fallback image");
                match fallback_jpeg() {
                    Some(fallback) => fallback.to_vec(),
                    None => return,
                }
            }
        };
        // Every receiver may have gone away since the count check.
        let _ = self.frames.send(Arc::new(jpeg));
    }

    fn publish_fallback(&self) {
        if self.frames.receiver_count() == 0 {
            return;
        }
        if let Some(fallback) = fallback_jpeg() {
            let _ = self.frames.send(Arc::new(fallback.to_vec()));
        }
    }

    fn publish_status(&self) {
        self.status.send_replace(self.pipeline.status());
    }

    fn pace(&mut self, cycle_start: Instant) {
        let elapsed = cycle_start.elapsed();
        metrics::record_frame(elapsed.as_secs_f64());
        self.summary.worst_cycle = self.summary.worst_cycle.max(elapsed);

        match self.frame_budget.checked_sub(elapsed) {
            Some(remaining) if !remaining.is_zero() => thread::sleep(remaining),
            _ => {
                self.summary.deadline_misses += 1;
                metrics::record_deadline_miss();
            }
        }
    }
}

/// Cloneable control surface for a running pipeline.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    commands: mpsc::UnboundedSender<PipelineCommand>,
    frames: broadcast::Sender<JpegFrame>,
    status: watch::Receiver<DetectorStatus>,
    store: AlertStore,
}

impl PipelineHandle {
    /// Request an external reset and wait for the worker to apply it.
    ///
    /// The reset is applied between two frames, so no frame is processed
    /// against a half-reset state. If the worker has exited or does not
    /// answer within [`RESET_ACK_TIMEOUT`], the alert history is cleared
    /// here and the worker only recalibrates when it picks the command up,
    /// so alerts raised in between are kept.
    /// Returns the number of alerts cleared.
    pub async fn reset(&self) -> usize {
        let (ack, done) = oneshot::channel();

        if self.commands.send(PipelineCommand::Reset { ack }).is_ok() {
            match tokio::time::timeout(RESET_ACK_TIMEOUT, done).await {
                Ok(Ok(cleared)) => return cleared,
                Ok(Err(_)) => warn!("Pipeline dropped reset request, clearing alerts directly"),
                Err(_) => warn!(
                    timeout_ms = RESET_ACK_TIMEOUT.as_millis() as u64,
                    "Pipeline did not acknowledge reset, clearing alerts directly"
                ),
            }
        } else {
            debug!("Pipeline not running, clearing alerts directly");
        }

        let cleared = self.store.clear();
        metrics::record_reset();
        cleared
    }

    /// Receive encoded frames from now on.
    pub fn subscribe_frames(&self) -> broadcast::Receiver<JpegFrame> {
        self.frames.subscribe()
    }

    /// Latest published status.
    pub fn status(&self) -> DetectorStatus {
        let mut status = self.status.borrow().clone();
        status.alert_count = self.store.len();
        status
    }

    pub fn alerts(&self) -> &AlertStore {
        &self.store
    }

    /// Ask the worker to exit after the current frame.
    pub fn shutdown(&self) {
        if self.commands.send(PipelineCommand::Shutdown).is_err() {
            debug!("Pipeline already stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}
