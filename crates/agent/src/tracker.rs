//! Tracker lifecycle management.
//!
//! A long-running task that samples the device position at a fixed
//! interval and relays each fix to the Locator API. Driven by a command
//! channel (start/stop) and observable through a watch channel that
//! publishes every state transition; subscribers use it the way a
//! platform notification advertises a foreground service.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use crate::client::LocationSink;
use crate::location::{LocationSample, LocationSource};
use crate::permissions::PermissionState;
use crate::session::UserSession;

/// Tracker lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Created, waiting for a start command.
    Idle,
    /// Start received, bringing up the foreground presence.
    Starting,
    /// Sampling and relaying fixes.
    Tracking,
    /// Terminal; the task has ended or is about to.
    Stopped,
}

/// Commands accepted by a running tracker.
enum TrackerCommand {
    Start(UserSession),
    Stop,
}

/// Tracker timing configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Target interval between samples.
    pub poll_interval: Duration,

    /// Minimum spacing between two relayed samples; ticks that arrive
    /// earlier are dropped.
    pub min_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            min_interval: Duration::from_secs(5),
        }
    }
}

/// Handle for controlling and observing a tracker.
#[derive(Clone)]
pub struct TrackerHandle {
    commands: mpsc::Sender<TrackerCommand>,
    state: watch::Receiver<TrackerState>,
}

impl TrackerHandle {
    /// Ask the tracker to start relaying for the given session.
    pub async fn start(&self, session: UserSession) -> Result<()> {
        self.commands
            .send(TrackerCommand::Start(session))
            .await
            .map_err(|_| anyhow::anyhow!("tracker task is gone"))
    }

    /// Ask the tracker to stop.
    pub async fn stop(&self) -> Result<()> {
        self.commands
            .send(TrackerCommand::Stop)
            .await
            .map_err(|_| anyhow::anyhow!("tracker task is gone"))
    }

    /// Subscribe to state transitions.
    pub fn state(&self) -> watch::Receiver<TrackerState> {
        self.state.clone()
    }

    /// Wait until the tracker reaches its terminal state.
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| *s == TrackerState::Stopped).await;
    }
}

/// Location relay tracker.
pub struct Tracker {
    config: TrackerConfig,
    permissions: PermissionState,
    source: Arc<dyn LocationSource>,
    sink: Arc<dyn LocationSink>,
    commands: mpsc::Receiver<TrackerCommand>,
    state_tx: watch::Sender<TrackerState>,
}

impl Tracker {
    /// Create a tracker and its control handle.
    pub fn new(
        config: TrackerConfig,
        permissions: PermissionState,
        source: Arc<dyn LocationSource>,
        sink: Arc<dyn LocationSink>,
    ) -> (Self, TrackerHandle) {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (state_tx, state_rx) = watch::channel(TrackerState::Idle);

        let tracker = Self {
            config,
            permissions,
            source,
            sink,
            commands: command_rx,
            state_tx,
        };

        let handle = TrackerHandle {
            commands: command_tx,
            state: state_rx,
        };

        (tracker, handle)
    }

    /// Run the tracker until stopped.
    ///
    /// Permission denial during startup is fatal: the tracker publishes
    /// `Stopped` without ever querying the location source. Individual
    /// submission failures are logged and dropped.
    pub async fn run(mut self) -> Result<()> {
        // Idle: wait for a start command.
        let mut session = loop {
            match self.commands.recv().await {
                Some(TrackerCommand::Start(session)) => break session,
                Some(TrackerCommand::Stop) | None => {
                    self.state_tx.send_replace(TrackerState::Stopped);
                    return Ok(());
                }
            }
        };

        // Foreground presence comes up even when the start command
        // carried no usable user id; the original service behaves the
        // same and only logs the problem.
        self.state_tx.send_replace(TrackerState::Starting);
        if session.user_id < 0 {
            tracing::error!("ID de usuário não encontrado no comando de início.");
        }

        if !self.permissions.fine_location {
            tracing::error!("Permissão de localização negada. Parando o serviço.");
            self.state_tx.send_replace(TrackerState::Stopped);
            return Ok(());
        }

        self.state_tx.send_replace(TrackerState::Tracking);
        tracing::info!(
            user_id = session.user_id,
            interval_secs = self.config.poll_interval.as_secs(),
            "Rastreamento de localização iniciado"
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_relayed: Option<Instant> = None;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(TrackerCommand::Stop) | None => break,
                    Some(TrackerCommand::Start(next)) => {
                        // A repeated start re-targets the session, as a
                        // sticky service would on a new start intent.
                        tracing::warn!(
                            user_id = next.user_id,
                            "Comando de início recebido com rastreamento ativo"
                        );
                        session = next;
                    }
                },
                _ = ticker.tick() => {
                    if let Some(prev) = last_relayed {
                        if prev.elapsed() < self.config.min_interval {
                            continue;
                        }
                    }

                    match self.source.last_known().await {
                        Ok(Some(sample)) => {
                            last_relayed = Some(Instant::now());
                            self.relay(session.user_id, sample);
                        }
                        Ok(None) => {
                            tracing::warn!(
                                "Localização nula. Pode ser que o GPS esteja desligado."
                            );
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Falha ao obter a localização");
                        }
                    }
                }
            }
        }

        self.state_tx.send_replace(TrackerState::Stopped);
        tracing::info!("Rastreamento de localização parado");
        Ok(())
    }

    /// Relay one sample without waiting for the submission to finish.
    ///
    /// At-most-once: the loop keeps accepting updates while submissions
    /// are in flight, so delivery is unordered and a failure only costs
    /// that one sample.
    fn relay(&self, user_id: i64, sample: LocationSample) {
        let sink = self.sink.clone();

        tokio::spawn(async move {
            match sink.submit(user_id, sample).await {
                Ok(()) => {
                    tracing::debug!(
                        user_id,
                        latitude = sample.latitude,
                        longitude = sample.longitude,
                        "Localização enviada com sucesso para a API"
                    );
                }
                Err(e) => {
                    tracing::error!(user_id, error = %e, "Erro ao enviar localização");
                }
            }
        });
    }
}
