use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::debug;

use super::status::{PlayerState, PlayerStatus, Suspension};

const SIGNAL_CAPACITY: usize = 16;

/// Acknowledgements a suspended command waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSignal {
    AdvanceLine,
    Choose(usize),
}

#[derive(Debug)]
pub(super) struct Channels {
    pub(super) signals: broadcast::Sender<PlayerSignal>,
    pub(super) paused: watch::Sender<bool>,
    pub(super) loading: watch::Sender<bool>,
    pub(super) stopped: watch::Sender<bool>,
    pub(super) status: watch::Sender<PlayerStatus>,
}

impl Channels {
    pub(super) fn new() -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            signals,
            paused: watch::Sender::new(false),
            loading: watch::Sender::new(false),
            stopped: watch::Sender::new(false),
            status: watch::Sender::new(PlayerStatus::default()),
        }
    }

    pub(super) fn enter(&self, state: PlayerState, label: Option<&str>) {
        self.status.send_replace(PlayerStatus {
            state,
            label: label.map(str::to_string),
            command_index: None,
            suspension: Suspension::None,
        });
    }

    pub(super) fn at_command(&self, index: usize) {
        self.status.send_modify(|status| {
            status.command_index = Some(index);
            status.suspension = Suspension::None;
        });
    }

    pub(super) fn suspend(&self, suspension: Suspension) {
        self.status.send_modify(|status| status.suspension = suspension);
    }
}

/// Cloneable control surface for the host: acknowledgements, pause, the
/// loading gate and cancellation.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    pub(super) channels: Arc<Channels>,
}

impl PlayerHandle {
    /// Clears a pending line wait. Dropped when no command is waiting.
    pub fn advance(&self) {
        self.send(PlayerSignal::AdvanceLine);
    }

    /// Answers a pending selection with the option at `index`.
    pub fn choose(&self, index: usize) {
        self.send(PlayerSignal::Choose(index));
    }

    fn send(&self, signal: PlayerSignal) {
        if self.channels.signals.send(signal).is_err() {
            debug!(?signal, "no command is waiting for the signal");
        }
    }

    pub fn pause(&self) {
        self.channels.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.channels.paused.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.channels.paused.borrow()
    }

    /// While loading is set, a starting scenario waits before its first
    /// prefetch.
    pub fn set_loading(&self, loading: bool) {
        self.channels.loading.send_replace(loading);
    }

    /// Abandons the running scenario: pending waits end at once and no further
    /// command runs.
    ///
    /// The request stays latched until a run ends. Sent while the player is
    /// idle, it cancels the next `start_scenario` before anything is shown.
    pub fn stop(&self) {
        self.channels.stopped.send_replace(true);
    }

    pub fn status(&self) -> PlayerStatus {
        self.channels.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PlayerStatus> {
        self.channels.status.subscribe()
    }
}
