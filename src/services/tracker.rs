// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Async driver for a tracking session.
//!
//! One tokio task owns the [`TrackingSession`] and is the only writer. It
//! multiplexes three inputs:
//! - commands from the [`SessionHandle`] (stop / cancel)
//! - samples pushed by the location source
//! - a 1-second timer tick that refreshes elapsed time
//!
//! The sample receiver and the timer live inside the task, so every way the
//! task ends (stop, cancel, handle dropped) releases both.

use crate::models::{ActivityKind, ActivitySummary, GeoSample};
use crate::services::policy::ValidationPolicy;
use crate::services::session::{
    AcquisitionError, SessionProgress, StartError, StopError, TrackingSession,
};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const TICK_INTERVAL: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 4;

/// A push-style source of position samples.
///
/// `acquire` is the only operation that may wait (e.g. for a permission
/// prompt). Once granted, samples arrive on the returned channel; dropping the
/// receiver is the unsubscribe.
pub trait LocationSource: Send + Sync {
    fn acquire(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<GeoSample>, AcquisitionError>> + Send;
}

/// Location source fed through an mpsc channel by an external producer.
pub struct ChannelLocationSource {
    receiver: Mutex<Option<mpsc::Receiver<GeoSample>>>,
    denied: bool,
}

impl ChannelLocationSource {
    /// Create a source and the sender its producer pushes samples into.
    pub fn new(buffer: usize) -> (Self, mpsc::Sender<GeoSample>) {
        let (tx, rx) = mpsc::channel(buffer);
        let source = Self {
            receiver: Mutex::new(Some(rx)),
            denied: false,
        };
        (source, tx)
    }

    /// A source whose permission prompt was refused.
    pub fn denied() -> Self {
        Self {
            receiver: Mutex::new(None),
            denied: true,
        }
    }
}

impl LocationSource for ChannelLocationSource {
    async fn acquire(&self) -> Result<mpsc::Receiver<GeoSample>, AcquisitionError> {
        if self.denied {
            return Err(AcquisitionError::PermissionDenied);
        }
        // Single subscription: a second acquire finds the receiver gone.
        self.receiver
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .ok_or(AcquisitionError::Unavailable)
    }
}

/// Errors talking to a running session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Stop(#[from] StopError),

    #[error("session task is no longer running")]
    Closed,
}

enum Command {
    Stop(oneshot::Sender<Result<ActivitySummary, StopError>>),
    Cancel(oneshot::Sender<()>),
}

/// Handle to a running session task.
///
/// Dropping the handle aborts the task, which releases the location
/// subscription and the timer.
pub struct SessionHandle {
    session_id: String,
    kind: ActivityKind,
    user_id: String,
    commands: mpsc::Sender<Command>,
    progress: watch::Receiver<SessionProgress>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Acquire the location source and begin tracking.
    ///
    /// Fails, without spawning anything, when the user is not identified or
    /// the source cannot be acquired.
    pub async fn start<S: LocationSource>(
        kind: ActivityKind,
        user_id: &str,
        policy: &ValidationPolicy,
        source: &S,
    ) -> Result<Self, StartError> {
        let mut session = TrackingSession::new(kind, user_id, policy.segment_filter(kind));
        session.ensure_identity()?;

        let acquired = source.acquire().await;
        if let Err(e) = &acquired {
            tracing::warn!(user_id = %session.user_id(), %kind, error = %e, "Location acquisition failed");
        }
        session.start(Instant::now(), acquired.as_ref().map(|_| ()).map_err(|e| *e))?;
        let samples = acquired?;

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (progress_tx, progress_rx) = watch::channel(SessionProgress::default());

        let session_id = session.id().to_string();
        let user_id = session.user_id().to_string();
        tracing::info!(session_id = %session_id, user_id = %user_id, %kind, "Session started");

        let task = tokio::spawn(run_session(session, samples, commands_rx, progress_tx));

        Ok(Self {
            session_id,
            kind,
            user_id,
            commands: commands_tx,
            progress: progress_rx,
            task,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Live progress updates (elapsed, distance, average speed).
    pub fn progress(&self) -> watch::Receiver<SessionProgress> {
        self.progress.clone()
    }

    /// Stop tracking and return the frozen summary.
    ///
    /// Handled by the session task itself, so any sample or tick not applied
    /// before this returns is excluded.
    pub async fn stop(&self) -> Result<ActivitySummary, TrackerError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Stop(tx))
            .await
            .map_err(|_| TrackerError::Closed)?;
        Ok(rx.await.map_err(|_| TrackerError::Closed)??)
    }

    /// Abort the attempt; nothing is produced for submission.
    pub async fn cancel(&self) -> Result<(), TrackerError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Cancel(tx))
            .await
            .map_err(|_| TrackerError::Closed)?;
        rx.await.map_err(|_| TrackerError::Closed)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_session(
    mut session: TrackingSession,
    mut samples: mpsc::Receiver<GeoSample>,
    mut commands: mpsc::Receiver<Command>,
    progress: watch::Sender<SessionProgress>,
) {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut source_open = true;

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                // Unsubscribe before replying so no sample can land after stop returns.
                match command {
                    Some(Command::Stop(reply)) => {
                        let result = session.stop(Instant::now());
                        samples.close();
                        let _ = reply.send(result);
                    }
                    Some(Command::Cancel(reply)) => {
                        session.cancel(Instant::now());
                        samples.close();
                        let _ = reply.send(());
                    }
                    None => session.cancel(Instant::now()),
                }
                break;
            }

            sample = samples.recv(), if source_open => {
                match sample {
                    Some(sample) => {
                        session.offer(sample);
                        progress.send_replace(session.progress(Instant::now()));
                    }
                    None => {
                        // The clock keeps running; a stall is not fraud.
                        source_open = false;
                        tracing::warn!(session_id = %session.id(), "Location stream closed");
                    }
                }
            }

            _ = ticker.tick() => {
                progress.send_replace(session.tick(Instant::now()));
            }
        }
    }

    drop(samples);
    tracing::debug!(session_id = %session.id(), state = ?session.state(), "Session task finished");
}
