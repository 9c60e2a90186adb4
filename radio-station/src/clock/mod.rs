//! Playback clock
//!
//! A duration-driven virtual clock: the station never decodes audio, so
//! "playing" a track means counting one-second ticks until the declared
//! duration is reached, then jumping to a uniformly random track.
//!
//! **State machine:** `Empty → Playing` when a track loads,
//! `Playing → Advancing → Playing` when the duration elapses or on skip, and
//! back to `Empty` when nothing in the catalog can be loaded. An empty clock
//! retries once per tick.
//!
//! **Concurrency:** the state sits behind one mutex that is never held across
//! an `.await`. While the advance loop runs it is the only mutator of the
//! elapsed counter and the cursor; `skip()` is delivered to it as a command.
//! Observers are notified after the lock is released.

mod observers;
mod state;

pub use observers::{event_bus_observer, Observer, ObserverRegistry};
pub use state::{ClockStatus, PlaybackSnapshot};

use crate::catalog::TrackCatalog;
use crate::config::ClockConfig;
use crate::publisher::PositionPublisher;
use crate::track::TrackDescriptor;
use radio_common::api::StartReference;
use radio_common::events::RadioEvent;
use rand::seq::SliceRandom;
use rand::Rng;
use state::PlaybackState;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Session tokens are drawn from this range
pub const SESSION_TOKEN_MIN: u32 = 1111;
pub const SESSION_TOKEN_MAX: u32 = 9999;

/// Intents delivered to the running advance loop
#[derive(Debug)]
enum ClockCommand {
    Skip,
}

struct LoopHandle {
    shutdown_tx: watch::Sender<bool>,
    command_tx: mpsc::UnboundedSender<ClockCommand>,
    join: JoinHandle<()>,
}

/// Shared core used by both the public handle and the loop task
struct ClockCore {
    catalog: Arc<TrackCatalog>,
    publisher: Arc<PositionPublisher>,
    observers: ObserverRegistry,
    state: Mutex<PlaybackState>,
    config: ClockConfig,
}

/// Handle to the station's single playback clock
pub struct PlaybackClock {
    core: Arc<ClockCore>,
    /// Serializes start/stop/skip against each other
    loop_handle: tokio::sync::Mutex<Option<LoopHandle>>,
}

impl PlaybackClock {
    pub fn new(
        catalog: Arc<TrackCatalog>,
        publisher: Arc<PositionPublisher>,
        config: ClockConfig,
    ) -> Self {
        Self {
            core: Arc::new(ClockCore {
                catalog,
                publisher,
                observers: ObserverRegistry::new(),
                state: Mutex::new(PlaybackState::new()),
                config,
            }),
            loop_handle: tokio::sync::Mutex::new(None),
        }
    }

    /// Register a callback for `song_changed` / `time_update` events
    pub fn add_observer(&self, observer: Observer) -> usize {
        self.core.observers.register(observer)
    }

    /// Start the advance loop. No-op if it is already running.
    ///
    /// Loads a track before returning so the state is populated before the
    /// first tick.
    pub async fn start(&self) {
        let mut guard = self.loop_handle.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.join.is_finished() {
                info!("Playback clock already running");
                return;
            }
        }

        self.core.load_and_notify();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let core = Arc::clone(&self.core);
        let join = tokio::spawn(async move {
            core.run(shutdown_rx, command_rx).await;
        });

        *guard = Some(LoopHandle {
            shutdown_tx,
            command_tx,
            join,
        });
        info!("Playback clock started");
    }

    /// Stop the advance loop and wait for it, bounded by the configured
    /// timeout. A loop that does not exit in time is aborted.
    pub async fn stop(&self) {
        let mut guard = self.loop_handle.lock().await;
        let Some(mut handle) = guard.take() else {
            debug!("Playback clock not running");
            return;
        };

        let _ = handle.shutdown_tx.send(true);
        match tokio::time::timeout(self.core.config.stop_timeout, &mut handle.join).await {
            Ok(Ok(())) => info!("Playback clock stopped"),
            Ok(Err(e)) => error!("Advance loop task failed: {}", e),
            Err(_) => {
                warn!(
                    "Advance loop did not stop within {:?}, aborting",
                    self.core.config.stop_timeout
                );
                handle.join.abort();
            }
        }
    }

    /// Full reset: cursor back to 0, session token and elapsed counter
    /// discarded, loop restarted.
    pub async fn restart(&self) {
        info!("Restarting playback clock");
        self.stop().await;
        *self.core.lock_state() = PlaybackState::new();
        self.start().await;
    }

    /// Switch to a random track now
    pub async fn skip(&self) {
        let guard = self.loop_handle.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.join.is_finished() && handle.command_tx.send(ClockCommand::Skip).is_ok() {
                debug!("Skip delivered to advance loop");
                return;
            }
        }
        // Not running: nothing else mutates the state while we hold the guard
        self.core.advance_and_notify();
    }

    pub async fn is_running(&self) -> bool {
        self.loop_handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.join.is_finished())
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.core.lock_state().snapshot()
    }

    pub fn status(&self) -> ClockStatus {
        self.core.lock_state().status
    }

    /// Raw record of the loaded track
    pub fn current_track_blob(&self) -> Option<String> {
        self.core
            .lock_state()
            .current
            .as_ref()
            .map(|t| t.raw().to_string())
    }
}

impl ClockCore {
    fn lock_state(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn run(
        &self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut command_rx: mpsc::UnboundedReceiver<ClockCommand>,
    ) {
        debug!("Advance loop running (tick {:?})", self.config.tick_interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                Some(command) = command_rx.recv() => match command {
                    ClockCommand::Skip => self.advance_and_notify(),
                },
                _ = tokio::time::sleep(self.config.tick_interval) => self.tick_and_notify(),
            }
        }
        debug!("Advance loop exited");
    }

    fn notify(&self, events: Vec<RadioEvent>) {
        for event in &events {
            self.observers.notify(event);
        }
    }

    fn load_and_notify(&self) {
        let event = {
            let mut state = self.lock_state();
            self.load_track(&mut state)
        };
        self.notify(event.into_iter().collect());
    }

    fn advance_and_notify(&self) {
        let event = {
            let mut state = self.lock_state();
            self.advance(&mut state)
        };
        self.notify(event.into_iter().collect());
    }

    fn tick_and_notify(&self) {
        let events = self.tick();
        self.notify(events);
    }

    /// One advance-loop step
    fn tick(&self) -> Vec<RadioEvent> {
        let mut state = self.lock_state();
        let mut events = Vec::new();

        let Some(duration) = state.current.as_ref().map(TrackDescriptor::duration) else {
            debug!("No current track, loading...");
            events.extend(self.load_track(&mut state));
            return events;
        };

        state.elapsed += 1;
        events.push(RadioEvent::TimeUpdate {
            current_time: state.elapsed,
            total_duration: duration,
        });

        if state.elapsed >= duration {
            info!("Track ended, loading next...");
            events.extend(self.advance(&mut state));
            state.elapsed = 0;
        } else {
            debug!(
                "Cursor: {} | Time: {}/{} | Session: {}",
                state.cursor, state.elapsed, duration, state.session_token
            );
        }
        events
    }

    /// Move the cursor to a random track and load it
    fn advance(&self, state: &mut PlaybackState) -> Option<RadioEvent> {
        state.status = ClockStatus::Advancing;
        if let Some(cursor) = self.random_cursor() {
            state.cursor = cursor;
        }
        self.load_track(state)
    }

    fn random_cursor(&self) -> Option<usize> {
        let count = self.catalog.count();
        if count == 0 {
            None
        } else {
            Some(rand::thread_rng().gen_range(0..count))
        }
    }

    /// Load the record at the cursor, falling back to every other index once,
    /// in random order.
    ///
    /// A cursor left out of range by a shrunken catalog is skipped. The state
    /// degrades to `Empty` only when no index yields a playable record.
    fn load_track(&self, state: &mut PlaybackState) -> Option<RadioEvent> {
        for cursor in load_order(state.cursor, self.catalog.count()) {
            state.cursor = cursor;
            match self.catalog.get_entry(cursor) {
                Some((id, blob)) => match TrackDescriptor::parse(id, blob) {
                    Ok(track) => return Some(self.begin_track(state, track)),
                    Err(e) => warn!("Failed to load track: {}", e),
                },
                None => debug!("No track data at cursor {}", cursor),
            }
        }

        if state.status != ClockStatus::Empty || state.current.is_some() {
            warn!("No playable tracks in catalog, clock is empty");
        }
        state.clear_track();
        None
    }

    /// The only place a start reference and session token are produced
    fn begin_track(&self, state: &mut PlaybackState, track: TrackDescriptor) -> RadioEvent {
        let start_reference = StartReference::now(self.config.modulus);
        let session_token = rand::thread_rng().gen_range(SESSION_TOKEN_MIN..=SESSION_TOKEN_MAX);

        self.publisher.publish_start_reference(start_reference);
        self.publisher.publish_session_token(session_token);

        info!(
            track_id = track.id(),
            title = track.title(),
            duration = %track.formatted_duration(),
            cursor = state.cursor,
            "Track started at t={:.3} (mod {})",
            start_reference.t,
            start_reference.modulus
        );

        let event = RadioEvent::SongChanged {
            track_id: track.id().to_string(),
            title: track.title().to_string(),
            artist: track.artist().to_string(),
            duration: track.duration(),
            cursor: state.cursor,
            session_token,
            start_reference,
            timestamp: radio_common::time::now(),
        };

        state.current = Some(track);
        state.start_reference = start_reference;
        state.session_token = session_token;
        state.elapsed = 0;
        state.status = ClockStatus::Playing;
        event
    }
}

/// Indices to try when loading: `cursor` first if it is still in range,
/// then every other index exactly once, shuffled.
fn load_order(cursor: usize, count: usize) -> Vec<usize> {
    let mut rest: Vec<usize> = (0..count).filter(|&i| i != cursor).collect();
    rest.shuffle(&mut rand::thread_rng());
    if cursor < count {
        rest.insert(0, cursor);
    }
    rest
}
