//! Run lifecycle
//!
//! `start` and `stop` are serialized end-to-end by an async gate, so two
//! operators can never race a start against a stop half-way through its
//! sweep. The snapshot state lives behind a separate blocking mutex and is
//! readable at any point of either transition.

use crate::connector::VenueConnector;
use crate::error::SupervisorError;
use crate::status::{RunStatus, StatusSnapshot};
use chrono::{DateTime, Utc};
use ladder_controller::{GATEWAY_CALL_TIMEOUT, LevelController, RunHealth};
use ladder_core::{LogEntry, LogSink, StrategyConfig};
use ladder_gateway::{ExchangeGateway, GatewayError, VenueEndpoint};
use ladder_ledger::LevelLedger;
use log::{info, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};

/// Upper bound on a stop: controller join plus the cancel sweep
const STOP_GRACE: Duration = Duration::from_secs(10);

struct ActiveRun {
    ticker: String,
    started_at: DateTime<Utc>,
    health: Arc<RunHealth>,
    ledger: Arc<LevelLedger>,
    gateway: Arc<dyn ExchangeGateway>,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SupervisorState {
    starting: bool,
    /// Ticker of a run mid-stop; the run itself is already detached
    stopping_ticker: Option<String>,
    run: Option<ActiveRun>,
}

/// Single-run strategy lifecycle manager
pub struct StrategySupervisor {
    connector: Arc<dyn VenueConnector>,
    sink: Arc<LogSink>,
    /// Serializes start/stop transitions end-to-end
    gate: tokio::sync::Mutex<()>,
    state: Mutex<SupervisorState>,
    stop_grace: Duration,
}

impl StrategySupervisor {
    pub fn new(connector: Arc<dyn VenueConnector>, sink: Arc<LogSink>) -> Self {
        Self {
            connector,
            sink,
            gate: tokio::sync::Mutex::new(()),
            state: Mutex::new(SupervisorState::default()),
            stop_grace: STOP_GRACE,
        }
    }

    /// Shorten the stop deadline, mainly for tests
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Validate the config and launch a controller for it
    ///
    /// Fails without touching the venue when the config is invalid or a
    /// run is already active. A run mid-transition counts as active: a
    /// start arriving during a stop sweep is refused immediately rather
    /// than queued behind the gate.
    pub async fn start(&self, config: StrategyConfig) -> Result<(), SupervisorError> {
        config.validate()?;
        self.ensure_idle()?;

        let _gate = self.gate.lock().await;
        {
            let mut state = self.state.lock().expect("supervisor state poisoned");
            if state.starting || state.stopping_ticker.is_some() || state.run.is_some() {
                return Err(SupervisorError::AlreadyRunning);
            }
            state.starting = true;
        }

        let endpoint = VenueEndpoint::select(config.testnet);
        self.note(format!(
            "starting {} on {} ({} levels/side, ttl {:?})",
            config.ticker,
            endpoint.ws_url(),
            config.levels_per_side,
            config.ttl
        ));

        let (snapshots, gateway) = self.connector.connect(&config);
        let ledger = Arc::new(LevelLedger::new());
        let health = Arc::new(RunHealth::new());
        let (stop_tx, stop_rx) = watch::channel(false);

        let controller = LevelController::new(
            config.clone(),
            Arc::clone(&ledger),
            snapshots,
            Arc::clone(&gateway),
            Arc::clone(&self.sink),
            Arc::clone(&health),
        );
        let handle = tokio::spawn(controller.run(stop_rx));

        let mut state = self.state.lock().expect("supervisor state poisoned");
        state.starting = false;
        state.run = Some(ActiveRun {
            ticker: config.ticker,
            started_at: Utc::now(),
            health,
            ledger,
            gateway,
            stop_tx,
            handle,
        });
        Ok(())
    }

    /// Stop the active run, if any; idempotent
    ///
    /// Signals the controller, waits for it within the grace period and
    /// then sweeps whatever the ledger still holds as possibly resting.
    /// Orders the sweep cannot confirm gone are reported and abandoned.
    pub async fn stop(&self) {
        let _gate = self.gate.lock().await;
        let Some(mut run) = self.take_run() else {
            info!("stop requested with no active run");
            return;
        };

        self.note(format!("stopping {}", run.ticker));
        let deadline = Instant::now() + self.stop_grace;

        let _ = run.stop_tx.send(true);
        if timeout(self.stop_grace, &mut run.handle).await.is_err() {
            warn!("[{}] controller did not stop in time, aborting task", run.ticker);
            run.handle.abort();
        }

        self.sweep(&run, deadline).await;

        self.state
            .lock()
            .expect("supervisor state poisoned")
            .stopping_ticker = None;
        self.note(format!("stopped {}", run.ticker));
    }

    /// Current run state; never blocks on a transition in progress
    pub fn status(&self) -> StatusSnapshot {
        let state = self.state.lock().expect("supervisor state poisoned");
        match &state.run {
            Some(run) => {
                let (last_tick_at, last_error) = run.health.snapshot();
                StatusSnapshot {
                    status: RunStatus::Running,
                    ticker: Some(run.ticker.clone()),
                    started_at: Some(run.started_at),
                    last_tick_at,
                    last_error,
                }
            }
            None if state.starting => StatusSnapshot {
                status: RunStatus::Starting,
                ..StatusSnapshot::idle()
            },
            None => match &state.stopping_ticker {
                Some(ticker) => StatusSnapshot {
                    status: RunStatus::Stopping,
                    ticker: Some(ticker.clone()),
                    ..StatusSnapshot::idle()
                },
                None => StatusSnapshot::idle(),
            },
        }
    }

    /// Operator log lines with sequence numbers above `since`
    pub fn logs(&self, since: u64) -> Vec<LogEntry> {
        self.sink.since(since)
    }

    /// Refuse unless the supervisor is fully idle, without awaiting
    fn ensure_idle(&self) -> Result<(), SupervisorError> {
        let state = self.state.lock().expect("supervisor state poisoned");
        if state.starting || state.stopping_ticker.is_some() || state.run.is_some() {
            return Err(SupervisorError::AlreadyRunning);
        }
        Ok(())
    }

    fn take_run(&self) -> Option<ActiveRun> {
        let mut state = self.state.lock().expect("supervisor state poisoned");
        let run = state.run.take();
        if let Some(run) = &run {
            state.stopping_ticker = Some(run.ticker.clone());
        }
        run
    }

    /// Cancel every order the ledger still considers non-terminal,
    /// bounded by the stop deadline. Leftovers are logged by id so an
    /// operator can reconcile them at the venue by hand.
    async fn sweep(&self, run: &ActiveRun, deadline: Instant) {
        let mut orphaned = Vec::new();
        for record in run.ledger.all_non_terminal() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                orphaned.push(record);
                continue;
            }
            let per_call = remaining.min(GATEWAY_CALL_TIMEOUT);
            match timeout(per_call, run.gateway.cancel_order(&record.client_order_id)).await {
                Ok(Ok(())) | Ok(Err(GatewayError::NotFound)) => {
                    run.ledger.remove(&record.client_order_id);
                }
                Ok(Err(_)) | Err(_) => orphaned.push(record),
            }
        }
        for record in orphaned {
            self.note(format!(
                "[{}] order {} orphaned, manual review required",
                run.ticker, record.client_order_id
            ));
        }
    }

    fn note(&self, message: String) {
        info!("{message}");
        self.sink.push(message);
    }
}
