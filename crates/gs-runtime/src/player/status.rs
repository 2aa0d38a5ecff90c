#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    Starting,
    PreloadAssets,
    RunningLabel,
    Ending,
}

/// What the running command is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suspension {
    #[default]
    None,
    Line,
    Selection,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerStatus {
    pub state: PlayerState,
    pub label: Option<String>,
    pub command_index: Option<usize>,
    pub suspension: Suspension,
}

impl PlayerStatus {
    pub fn is_idle(&self) -> bool {
        self.state == PlayerState::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Played to the end; `last_label` is the label that finished last.
    Completed { last_label: String },
    /// Abandoned through [`PlayerHandle::stop`](super::PlayerHandle::stop).
    Stopped,
    /// The entry label was missing or had no commands; nothing happened.
    Rejected,
}
