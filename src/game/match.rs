//! Session state and the cooperative tick loop

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info};

use crate::util::time::{tick_delta, RENDER_TPS, SIMULATION_TPS};
use crate::ws::protocol::{LocalAction, Notification, RenderFrame, StatusMsg};

use super::dispatch::Dispatcher;
use super::snapshot::{FrameBuilder, Snapshot};
use super::PlayerId;

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// No snapshot received yet
    Waiting,
    /// Match in progress
    InProgress,
    /// A player logged out
    Ended,
}

/// Input queued for the next tick
#[derive(Debug, Clone)]
pub enum SessionInput {
    Snapshot(Snapshot),
    Status(StatusMsg),
    TargetSignal { player: PlayerId, acquired: bool },
    LocalAction(LocalAction),
}

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub input_tx: mpsc::Sender<SessionInput>,
    pub notify_tx: broadcast::Sender<Notification>,
    pub frame_tx: broadcast::Sender<RenderFrame>,
    latest: Arc<RwLock<RenderFrame>>,
}

impl SessionHandle {
    /// Most recently published render frame
    pub fn latest_frame(&self) -> RenderFrame {
        self.latest.read().clone()
    }

    /// The tick loop has stopped
    pub fn is_finished(&self) -> bool {
        self.input_tx.is_closed()
    }
}

/// The local combat session
pub struct GameSession {
    dispatcher: Dispatcher,
    tick: u64,
    input_rx: mpsc::Receiver<SessionInput>,
    notify_tx: broadcast::Sender<Notification>,
    frame_tx: broadcast::Sender<RenderFrame>,
    latest: Arc<RwLock<RenderFrame>>,
    frame_builder: FrameBuilder,
}

impl GameSession {
    pub fn new(dispatcher: Dispatcher) -> (Self, SessionHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (notify_tx, _) = broadcast::channel(64);
        let (frame_tx, _) = broadcast::channel(64);

        let frame_builder = FrameBuilder::new(SIMULATION_TPS / RENDER_TPS);
        let latest = Arc::new(RwLock::new(frame_builder.build(0, &dispatcher)));

        let handle = SessionHandle {
            input_tx,
            notify_tx: notify_tx.clone(),
            frame_tx: frame_tx.clone(),
            latest: latest.clone(),
        };

        let session = Self {
            dispatcher,
            tick: 0,
            input_rx,
            notify_tx,
            frame_tx,
            latest,
            frame_builder,
        };

        (session, handle)
    }

    /// Run the tick loop until the match has ended and every attack has
    /// finished playing out
    pub async fn run(mut self) {
        info!(local_role = %self.dispatcher.role().local_role(), "Session started");

        let tick_duration = Duration::from_micros(1_000_000 / SIMULATION_TPS as u64);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            self.process_inputs();
            self.step(tick_delta());

            if self.is_done() {
                info!(tick = self.tick, "Match ended and all attacks settled");
                break;
            }
        }

        self.publish_frame();
    }

    /// Drain everything queued since the last tick, in arrival order
    fn process_inputs(&mut self) {
        while let Ok(input) = self.input_rx.try_recv() {
            match input {
                SessionInput::Snapshot(snapshot) => {
                    self.dispatcher.apply_snapshot(&snapshot);
                    self.frame_builder.force_next();
                }
                SessionInput::Status(msg) => self.dispatcher.apply_status(&msg),
                SessionInput::TargetSignal { player, acquired } => {
                    self.dispatcher.set_target_acquired(player, acquired);
                }
                SessionInput::LocalAction(action) => {
                    debug!(action = ?action, "Local practice action");
                    self.dispatcher.local_action(action);
                }
            }
        }
    }

    /// Run a single tick
    fn step(&mut self, dt: f64) {
        self.tick += 1;
        self.dispatcher.tick(dt);

        let notifications = self.dispatcher.drain_notifications();
        if !notifications.is_empty() {
            self.frame_builder.force_next();
        }
        for notification in notifications {
            info!(topic = %notification.topic(), "Publishing notification");
            let _ = self.notify_tx.send(notification);
        }

        if self.frame_builder.should_send() {
            self.publish_frame();
        }
    }

    fn publish_frame(&mut self) {
        let frame = self.frame_builder.build(self.tick, &self.dispatcher);
        *self.latest.write() = frame.clone();
        let _ = self.frame_tx.send(frame);
    }

    fn is_done(&self) -> bool {
        self.dispatcher.phase() == MatchPhase::Ended && self.dispatcher.is_settled()
    }
}
