//! Start / stop / set-rate command interface.
//!
//! [`Controller`] is what a control surface talks to. Every operation returns
//! promptly: rate updates are a single atomic store, stop is a flag store, and
//! start opens the devices and hands them to a freshly spawned processing
//! thread. The only wait on the control side is joining a session that was
//! already told to stop, which is bounded by one block of device I/O.
//!
//! Session transitions are published as [`SessionEvent`]s so the control
//! surface can report a session that ended on a device error.

use crate::processing::{ProcessingLoop, SessionStats};
use crate::{AudioBackend, AudioStreamManager, Error, Result, StreamConfig};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tsunami_core::{RateControl, TsunamiEngine, WaveShaper};

/// Stop signal observed by the processing thread once per block.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// New, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Processing state as seen from the control side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No session; no device handles held.
    Idle,
    /// A processing thread owns the open streams.
    Running,
}

/// Session lifecycle notification.
#[derive(Debug)]
pub enum SessionEvent {
    /// Streams opened and the processing thread was spawned.
    Started {
        /// Backend the session runs on.
        backend: String,
    },
    /// The session observed a stop request and released its streams.
    Stopped(SessionStats),
    /// The session ended on a stream error and released its streams.
    Terminated {
        /// What went wrong.
        error: Error,
        /// Counters up to the failure.
        stats: SessionStats,
    },
}

/// Processing thread; yields the manager back when the session ends.
type Worker = JoinHandle<Option<AudioStreamManager>>;

/// Command interface over one audio backend.
pub struct Controller {
    config: StreamConfig,
    shaper: WaveShaper,
    rate: Arc<RateControl>,
    cancel: CancellationFlag,
    running: Arc<AtomicBool>,
    manager: Option<AudioStreamManager>,
    worker: Option<Worker>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl Controller {
    /// Create an idle controller. The target rate starts at the default.
    pub fn new(backend: Box<dyn AudioBackend>, config: StreamConfig) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            config,
            shaper: WaveShaper::new(),
            rate: Arc::new(RateControl::default()),
            cancel: CancellationFlag::new(),
            running: Arc::new(AtomicBool::new(false)),
            manager: Some(AudioStreamManager::new(backend)),
            worker: None,
            events_tx,
            events_rx,
        }
    }

    /// Use a different shaper for sessions started from now on.
    pub fn with_shaper(mut self, shaper: WaveShaper) -> Self {
        self.shaper = shaper;
        self
    }

    /// Stream configuration used by [`start`](Self::start).
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// The shared rate control, for surfaces that want to read it directly.
    pub fn rate_control(&self) -> Arc<RateControl> {
        Arc::clone(&self.rate)
    }

    /// Current target rate in Hz.
    pub fn target_rate(&self) -> u32 {
        self.rate.get()
    }

    /// Update the target rate. Out-of-range values are rejected and the
    /// previous rate stays in effect.
    pub fn set_rate(&self, rate: i64) -> Result<()> {
        self.rate.set(rate).map_err(|e| {
            tracing::warn!(requested = rate, current = self.rate.get(), "rate update rejected");
            Error::from(e)
        })?;
        tracing::info!(rate, divisor = self.rate.divisor(), "target rate set");
        Ok(())
    }

    /// Current processing state.
    pub fn state(&self) -> LoopState {
        if self.running.load(Ordering::Acquire) {
            LoopState::Running
        } else {
            LoopState::Idle
        }
    }

    /// Whether a running session was told to stop and has not finished yet.
    pub fn stop_pending(&self) -> bool {
        self.state() == LoopState::Running && self.cancel.is_cancelled()
    }

    /// Receiver for session events. All clones share one queue.
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events_rx.clone()
    }

    /// Open the streams and start processing. No-op while already running.
    ///
    /// Device failures are returned here and the state stays
    /// [`LoopState::Idle`]. Opening the devices happens on the calling thread.
    /// A session that was told to stop but has not finished yet is joined
    /// first: normally that takes at most one block, but a stalled device holds
    /// it up to [`StreamConfig::io_timeout`] plus the block in flight.
    ///
    /// If the processing thread cannot be spawned the opened streams are
    /// closed again, [`Error::Worker`] is returned, and a later start may retry.
    pub fn start(&mut self) -> Result<()> {
        if self.state() == LoopState::Running && !self.stop_pending() {
            tracing::debug!("start ignored, already running");
            return Ok(());
        }
        self.reclaim()?;

        let mut manager = self
            .manager
            .take()
            .ok_or_else(|| Error::Worker("stream manager was lost by a panicked session".into()))?;
        if let Err(e) = manager.open(&self.config) {
            tracing::error!(error = %e, "failed to open audio streams");
            self.manager = Some(manager);
            return Err(e);
        }

        self.cancel.reset();
        self.running.store(true, Ordering::Release);

        let session = ProcessingLoop::new(
            manager,
            TsunamiEngine::with_shaper(self.config.block_size, self.shaper),
            Arc::clone(&self.rate),
            self.cancel.clone(),
            &self.config,
        );
        let _ = self.events_tx.send(SessionEvent::Started {
            backend: session.backend_name().to_string(),
        });
        let spawned = launch(
            session,
            Arc::clone(&self.running),
            self.events_tx.clone(),
            |body| {
                thread::Builder::new()
                    .name("tsunami-processing".into())
                    .spawn(body)
            },
        );

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err((e, session)) => {
                self.running.store(false, Ordering::Release);
                if let Some(session) = session {
                    let mut manager = session.into_manager();
                    manager.close();
                    self.manager = Some(manager);
                }
                let reason = format!("failed to spawn processing thread: {e}");
                tracing::error!(%reason, "session not started");
                let _ = self.events_tx.send(SessionEvent::Terminated {
                    error: Error::Worker(reason.clone()),
                    stats: SessionStats::default(),
                });
                Err(Error::Worker(reason))
            }
        }
    }

    /// Ask the processing thread to stop. Returns immediately.
    ///
    /// The streams are released by the processing thread within one block;
    /// watch [`state`](Self::state) or [`events`](Self::events) to know when.
    pub fn stop(&self) {
        if self.state() == LoopState::Running && !self.stop_pending() {
            tracing::info!("stop requested");
        }
        self.cancel.cancel();
    }

    /// Stop and wait for the processing thread to release the streams.
    ///
    /// Idempotent; also run on drop.
    pub fn shutdown(&mut self) -> Result<()> {
        self.stop();
        self.reclaim()
    }

    /// Join a finished or stopping session and take its manager back.
    fn reclaim(&mut self) -> Result<()> {
        if let Some(worker) = self.worker.take() {
            let manager = worker
                .join()
                .map_err(|_| Error::Worker("processing thread panicked".into()))?;
            if manager.is_some() {
                self.manager = manager;
            }
        }
        Ok(())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!(error = %e, "shutdown failed");
        }
    }
}

/// Body run on the processing thread.
type SessionBody = Box<dyn FnOnce() -> Option<AudioStreamManager> + Send>;

/// Run `session` on a thread made by `spawn`.
///
/// The session goes through a one-slot hand-off queue rather than into the
/// closure, so a failed spawn returns it to the caller along with the error.
fn launch<F>(
    session: ProcessingLoop,
    running: Arc<AtomicBool>,
    events: Sender<SessionEvent>,
    spawn: F,
) -> std::result::Result<Worker, (std::io::Error, Option<ProcessingLoop>)>
where
    F: FnOnce(SessionBody) -> std::io::Result<Worker>,
{
    let (handoff, pickup) = bounded(1);
    let unclaimed = pickup.clone();
    let _ = handoff.send(session);

    let body: SessionBody = Box::new(move || {
        let mut session: ProcessingLoop = pickup.recv().ok()?;
        let event = match session.run() {
            Ok(stats) => SessionEvent::Stopped(stats),
            Err(error) => SessionEvent::Terminated {
                error,
                stats: session.stats(),
            },
        };
        let manager = session.into_manager();
        running.store(false, Ordering::Release);
        let _ = events.send(event);
        Some(manager)
    });

    spawn(body).map_err(|e| (e, unclaimed.try_recv().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    #[test]
    fn test_cancellation_flag() {
        let flag = CancellationFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
        flag.reset();
        assert!(!observer.is_cancelled());
    }

    fn opened_session(backend: MockBackend, cancel: &CancellationFlag) -> ProcessingLoop {
        let config = StreamConfig::default();
        let mut manager = AudioStreamManager::new(Box::new(backend));
        manager.open(&config).unwrap();
        ProcessingLoop::new(
            manager,
            TsunamiEngine::new(config.block_size),
            Arc::new(RateControl::default()),
            cancel.clone(),
            &config,
        )
    }

    #[test]
    fn test_failed_spawn_returns_session() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let (events_tx, events_rx) = unbounded();

        let result = launch(
            opened_session(backend, &CancellationFlag::new()),
            Arc::new(AtomicBool::new(true)),
            events_tx,
            |_body| Err(std::io::Error::other("thread limit reached")),
        );
        let Err((err, Some(session))) = result else {
            panic!("a failed spawn must hand the session back");
        };
        assert_eq!(err.to_string(), "thread limit reached");
        assert!(events_rx.try_recv().is_err());

        let mut manager = session.into_manager();
        assert!(manager.is_open());
        manager.close();
        assert_eq!((probe.open_inputs(), probe.open_outputs()), (0, 0));
    }

    #[test]
    fn test_launched_session_returns_manager() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let cancel = CancellationFlag::new();
        let session = opened_session(backend, &cancel);
        let running = Arc::new(AtomicBool::new(true));
        let (events_tx, events_rx) = unbounded();

        let worker = launch(session, Arc::clone(&running), events_tx, |body| {
            thread::Builder::new().spawn(body)
        })
        .map_err(|(e, _)| e)
        .unwrap();
        cancel.cancel();

        let manager = worker.join().unwrap().unwrap();
        assert!(!manager.is_open());
        assert!(!running.load(Ordering::Acquire));
        assert!(matches!(events_rx.try_recv(), Ok(SessionEvent::Stopped(_))));
        assert_eq!(probe.open_inputs(), 0);
    }
}
