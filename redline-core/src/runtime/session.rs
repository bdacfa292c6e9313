//! Race Session
//!
//! Runs one race attempt in real time. A single driver task owns the
//! attempt and processes host commands and ticker messages one at a
//! time, so tick handling never interleaves. Three tickers feed it:
//!
//! - countdown (1 s), alive from `Begin` until the clock starts
//! - clock (10 ms) and speed (200 ms), alive while the clock runs
//!
//! Each ticker is a [`PeriodicTask`] owned by the driver and dropped on
//! every transition that leaves its state. Ticks already queued from a
//! dropped ticker carry a stale id and are ignored.

use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::game::events::RaceEvent;
use crate::game::race::{
    RaceAttempt, RaceCompletion, RaceConfig, RaceOutcome, RacePhase, RaceRequest, RaceSetupError,
    TickResult,
};
use crate::game::store::SharedStore;
use crate::runtime::scheduler::PeriodicTask;
use crate::storage::Storage;
use crate::{COUNTDOWN_TICK_MS, SPEED_TICK_MS, TIMER_TICK_MS};

/// Configuration for a race session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Countdown ticker period.
    pub countdown_period: Duration,
    /// Elapsed-time ticker period.
    pub timer_period: Duration,
    /// Speed ticker period.
    pub speed_period: Duration,
    /// Buffered events per subscriber.
    pub event_capacity: usize,
    /// Buffered commands and ticks.
    pub command_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown_period: Duration::from_millis(COUNTDOWN_TICK_MS),
            timer_period: Duration::from_millis(TIMER_TICK_MS),
            speed_period: Duration::from_millis(SPEED_TICK_MS),
            event_capacity: 256,
            command_capacity: 64,
        }
    }
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The driver task has stopped.
    #[error("Session closed")]
    SessionClosed,

    /// The attempt could not be set up.
    #[error("Race setup failed: {0}")]
    Setup(#[from] RaceSetupError),
}

/// Host commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start the countdown.
    Begin,
    /// Halt the clock.
    Pause,
    /// Restart the clock.
    Resume,
    /// Return to the pre-countdown state.
    Reset,
    /// Stop the driver.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickKind {
    Countdown,
    Clock,
    Speed,
}

#[derive(Debug)]
enum SessionMessage {
    Command(SessionCommand),
    Tick { kind: TickKind, ticker: u64 },
}

/// A live ticker and the id stamped on its messages.
struct Ticker {
    id: u64,
    _task: PeriodicTask,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Host-side handle to a running session.
///
/// Dropping the handle tears the session down.
pub struct RaceSessionHandle {
    id: Uuid,
    commands: mpsc::Sender<SessionMessage>,
    events: broadcast::Sender<RaceEvent>,
    outcome: watch::Receiver<Option<RaceOutcome>>,
    task: JoinHandle<()>,
}

impl RaceSessionHandle {
    /// Session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receive race events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RaceEvent> {
        self.events.subscribe()
    }

    /// Send a command to the driver.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(SessionMessage::Command(command))
            .await
            .map_err(|_| SessionError::SessionClosed)
    }

    /// Start the countdown.
    pub async fn begin(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Begin).await
    }

    /// Halt the clock.
    pub async fn pause(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Pause).await
    }

    /// Restart the clock.
    pub async fn resume(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Resume).await
    }

    /// Return the attempt to its pre-countdown state.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Reset).await
    }

    /// Wait for the attempt to finish.
    ///
    /// Returns immediately if it already has and was not reset since.
    pub async fn outcome(&mut self) -> Result<RaceOutcome, SessionError> {
        let outcome = self
            .outcome
            .wait_for(Option::is_some)
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        outcome.clone().ok_or(SessionError::SessionClosed)
    }

    /// Stop the driver and wait for it to exit.
    pub async fn shutdown(mut self) {
        if self.send(SessionCommand::Shutdown).await.is_ok() {
            if let Err(e) = (&mut self.task).await {
                warn!("Session {} ended abnormally: {}", self.id, e);
            }
        }
    }
}

impl Drop for RaceSessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Entry point for running attempts.
pub struct RaceSession;

impl RaceSession {
    /// Set up an attempt and spawn its driver.
    ///
    /// The attempt is resolved against the current profile; the store is
    /// written once more, when the attempt finishes.
    pub async fn spawn<S: Storage + 'static>(
        catalog: Catalog,
        request: RaceRequest,
        store: SharedStore<S>,
        race_config: RaceConfig,
        config: SessionConfig,
    ) -> Result<RaceSessionHandle, SessionError> {
        let attempt = {
            let guard = store.read().await;
            RaceAttempt::setup(&catalog, &request, guard.state(), race_config)?
        };

        let id = Uuid::new_v4();
        let (commands, receiver) = mpsc::channel(config.command_capacity.max(1));
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (outcome_tx, outcome) = watch::channel(None);

        let driver = SessionDriver {
            id,
            attempt,
            store,
            catalog,
            config,
            origin: Instant::now(),
            ticks: commands.downgrade(),
            events: events.clone(),
            outcome: outcome_tx,
            countdown: None,
            clock: None,
            speed: None,
            next_ticker_id: 0,
        };

        info!(
            "Session {} created: {} / {} in {}",
            id, request.race_mode_id, request.track_id, request.vehicle_id
        );

        let task = tokio::spawn(driver.run(receiver));

        Ok(RaceSessionHandle { id, commands, events, outcome, task })
    }
}

// =============================================================================
// DRIVER
// =============================================================================

struct SessionDriver<S: Storage> {
    id: Uuid,
    attempt: RaceAttempt,
    store: SharedStore<S>,
    catalog: Catalog,
    config: SessionConfig,
    origin: Instant,
    ticks: mpsc::WeakSender<SessionMessage>,
    events: broadcast::Sender<RaceEvent>,
    outcome: watch::Sender<Option<RaceOutcome>>,

    countdown: Option<Ticker>,
    clock: Option<Ticker>,
    speed: Option<Ticker>,
    next_ticker_id: u64,
}

impl<S: Storage + 'static> SessionDriver<S> {
    #[instrument(skip(self, receiver), fields(session = %self.id))]
    async fn run(mut self, mut receiver: mpsc::Receiver<SessionMessage>) {
        while let Some(message) = receiver.recv().await {
            match message {
                SessionMessage::Command(SessionCommand::Shutdown) => break,
                SessionMessage::Command(command) => self.handle_command(command).await,
                SessionMessage::Tick { kind, ticker } => self.handle_tick(kind, ticker).await,
            }
        }
        self.stop_all_tickers();
        debug!("Session driver exited");
    }

    /// Milliseconds since the session was created.
    fn now(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        let now = self.now();
        debug!("Command {:?} at {}ms", command, now);

        let result = match command {
            SessionCommand::Begin => self.attempt.begin(now),
            SessionCommand::Pause => self.attempt.pause(now),
            SessionCommand::Resume => self.attempt.resume(now),
            SessionCommand::Reset => {
                self.outcome.send_replace(None);
                self.attempt.reset()
            }
            SessionCommand::Shutdown => TickResult::default(),
        };

        self.apply(result).await;
    }

    async fn handle_tick(&mut self, kind: TickKind, ticker: u64) {
        let current = match kind {
            TickKind::Countdown => &self.countdown,
            TickKind::Clock => &self.clock,
            TickKind::Speed => &self.speed,
        };
        if current.as_ref().map(|t| t.id) != Some(ticker) {
            return;
        }

        let now = self.now();
        let result = match kind {
            TickKind::Countdown => self.attempt.countdown_tick(now),
            TickKind::Clock => {
                self.attempt.timer_tick(now);
                return;
            }
            TickKind::Speed => self.attempt.speed_tick(now),
        };

        self.apply(result).await;
    }

    /// Reconcile tickers with the attempt's phase, then record and publish.
    async fn apply(&mut self, result: TickResult) {
        self.sync_tickers();

        if let Some(completion) = result.completion {
            self.record(&completion).await;
            self.publish(result.events);
            self.outcome.send_replace(Some(completion.outcome));
        } else {
            self.publish(result.events);
        }
    }

    fn sync_tickers(&mut self) {
        let phase = self.attempt.phase();

        if matches!(phase, RacePhase::Countdown { .. }) {
            if self.countdown.is_none() {
                self.countdown = self.spawn_ticker(TickKind::Countdown, self.config.countdown_period);
            }
        } else if self.countdown.take().is_some() {
            debug!("Countdown ticker stopped");
        }

        if phase == RacePhase::Racing && self.attempt.timer().is_running() {
            if self.clock.is_none() {
                self.clock = self.spawn_ticker(TickKind::Clock, self.config.timer_period);
            }
            if self.speed.is_none() {
                self.speed = self.spawn_ticker(TickKind::Speed, self.config.speed_period);
            }
        } else {
            self.stop_race_tickers();
        }
    }

    fn spawn_ticker(&mut self, kind: TickKind, period: Duration) -> Option<Ticker> {
        let Some(sender) = self.ticks.upgrade() else {
            warn!("Session closing, {:?} ticker not started", kind);
            return None;
        };

        self.next_ticker_id += 1;
        let id = self.next_ticker_id;
        debug!("{:?} ticker {} started", kind, id);

        let task = PeriodicTask::spawn(period, sender, move || SessionMessage::Tick { kind, ticker: id });
        Some(Ticker { id, _task: task })
    }

    fn stop_race_tickers(&mut self) {
        let clock = self.clock.take();
        let speed = self.speed.take();
        if clock.is_some() || speed.is_some() {
            debug!("Race tickers stopped");
        }
    }

    fn stop_all_tickers(&mut self) {
        self.countdown = None;
        self.stop_race_tickers();
    }

    /// The attempt's single write to the profile.
    ///
    /// Storage backends do blocking I/O, so the write runs on the blocking
    /// pool. The driver waits for it before publishing the outcome.
    async fn record(&mut self, completion: &RaceCompletion) {
        let store = self.store.clone();
        let catalog = self.catalog;
        let record = completion.record.clone();

        let recorded = tokio::task::spawn_blocking(move || {
            store.blocking_write().record_race_completion(&record, &catalog)
        })
        .await;

        match recorded {
            Ok((progress, unlocked)) => info!(
                "Session {} recorded P{} (level {} -> {}, {} achievements unlocked)",
                self.id,
                completion.outcome.position,
                progress.previous_level,
                progress.level,
                unlocked.len()
            ),
            Err(e) => warn!("Session {} failed to record its result: {}", self.id, e),
        }
    }

    fn publish(&self, events: Vec<RaceEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::RaceEventData;
    use crate::game::state::GameState;
    use crate::game::store::GameStore;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;

    type TestStore = SharedStore<Arc<MemoryStorage>>;

    fn store() -> (Arc<MemoryStorage>, TestStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = GameStore::open(storage.clone()).into_shared();
        (storage, store)
    }

    fn fast() -> RaceConfig {
        RaceConfig { time_scale: 50.0, ..Default::default() }
    }

    async fn spawn(store: &TestStore, vehicle: &str) -> RaceSessionHandle {
        RaceSession::spawn(
            Catalog::builtin(),
            RaceRequest::new("street", "downtown-dash", vehicle),
            store.clone(),
            fast(),
            SessionConfig::default(),
        )
        .await
        .unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<RaceEvent>) -> Vec<RaceEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => return events,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_session() {
        let (storage, store) = store();
        let mut handle = spawn(&store, "lamborghini-aventador").await;
        let mut rx = handle.subscribe();

        handle.begin().await.unwrap();
        let outcome = handle.outcome().await.unwrap();

        let events = drain(&mut rx);
        let data: Vec<_> = events.iter().map(|e| &e.data).collect();
        assert_eq!(data[0], &RaceEventData::CountdownTick { remaining: 3 });
        assert_eq!(data[1], &RaceEventData::CountdownTick { remaining: 2 });
        assert_eq!(data[2], &RaceEventData::CountdownTick { remaining: 1 });
        assert_eq!(data[3], &RaceEventData::Started);
        assert_eq!(events.last().unwrap().outcome(), Some(&outcome));

        let laps = events
            .iter()
            .filter(|e| matches!(e.data, RaceEventData::LapCompleted { .. }))
            .count();
        assert_eq!(laps, 3);

        // One write, at completion
        assert_eq!(storage.write_count(), 1);
        let guard = store.read().await;
        assert_eq!(guard.state().stats.total_races, 162);
        assert_eq!(guard.state().player.cash, 485_000 + outcome.cash_earned);
        // A compressed race leaves the lap record alone
        assert_eq!(guard.state().stats.best_lap_time.unwrap().to_string(), "1:23.45");

        // Outcome stays available
        drop(guard);
        assert_eq!(handle.outcome().await.unwrap(), outcome);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_tickers() {
        let (_, store) = store();
        let mut handle = spawn(&store, "ford-gt").await;
        let mut rx = handle.subscribe();

        handle.begin().await.unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        handle.pause().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let events = drain(&mut rx);
        assert_eq!(events.last().unwrap().data, RaceEventData::Paused);

        // Nothing happens while paused
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(drain(&mut rx).is_empty());

        handle.resume().await.unwrap();
        let outcome = handle.outcome().await.unwrap();

        // The 30 s pause is not on the clock
        assert!(outcome.final_time.as_millis() < 30_000);
        let events = drain(&mut rx);
        assert_eq!(events[0].data, RaceEventData::Resumed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_attempt() {
        let (storage, store) = store();
        let handle = spawn(&store, "nissan-gtr").await;
        let mut rx = handle.subscribe();

        handle.begin().await.unwrap();
        tokio::time::sleep(Duration::from_millis(4000)).await;
        handle.reset().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let events = drain(&mut rx);
        assert_eq!(events.last().unwrap().data, RaceEventData::Reset);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(storage.write_count(), 0);

        // The attempt can run again after a reset
        handle.begin().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(drain(&mut rx)[0].data, RaceEventData::CountdownTick { remaining: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_tears_down() {
        let (storage, store) = store();
        let handle = spawn(&store, "ford-gt").await;
        handle.begin().await.unwrap();
        drop(handle);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_setup_error() {
        let (_, store) = store();
        let err = RaceSession::spawn(
            Catalog::builtin(),
            RaceRequest::new("street", "downtown-dash", "delorean"),
            store,
            RaceConfig::default(),
            SessionConfig::default(),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err, SessionError::Setup(RaceSetupError::UnknownVehicle("delorean".to_string())));
    }

    #[tokio::test]
    async fn test_commands_after_shutdown() {
        let (_, store) = store();
        let handle = spawn(&store, "ford-gt").await;
        let commands = handle.commands.clone();
        handle.shutdown().await;

        let sent = commands.send(SessionMessage::Command(SessionCommand::Begin)).await;
        assert!(sent.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_writes_file_profile() {
        use crate::storage::FileStorage;

        let dir = std::env::temp_dir().join(format!("redline-session-{}", Uuid::new_v4()));
        let store = GameStore::open(FileStorage::new(&dir)).into_shared();
        let mut handle = RaceSession::spawn(
            Catalog::builtin(),
            RaceRequest::new("street", "downtown-dash", "ford-gt"),
            store.clone(),
            fast(),
            SessionConfig::default(),
        )
        .await
        .unwrap();

        handle.begin().await.unwrap();
        handle.outcome().await.unwrap();
        handle.shutdown().await;

        // The write ran off the runtime and has landed by the time the
        // outcome is visible
        let path = store.read().await.storage().path_for(crate::STORAGE_KEY);
        let saved: GameState = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved.stats.total_races, 162);
        assert_eq!(&saved, store.read().await.state());

        let _ = std::fs::remove_dir_all(dir);
    }
}
