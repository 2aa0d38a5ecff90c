mod control;
mod execute;
mod status;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::asset::AssetManager;
use crate::data_manager::DataManager;
use crate::presentation::Presentation;

use control::Channels;
pub use control::{PlayerHandle, PlayerSignal};
use execute::{execute_command, CommandContext, CommandFlow};
pub use status::{PlaybackOutcome, PlayerState, PlayerStatus, Suspension};

/// The run was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interrupted;

/// Plays one scenario at a time: prefetches each label's assets, then walks
/// its commands in order, suspending on pause and on commands that wait for
/// an acknowledgement.
pub struct ScenarioPlayer {
    data: Arc<DataManager>,
    assets: Arc<AssetManager>,
    presentation: Arc<dyn Presentation>,
    channels: Arc<Channels>,
}

impl ScenarioPlayer {
    pub fn new(
        data: Arc<DataManager>,
        assets: Arc<AssetManager>,
        presentation: Arc<dyn Presentation>,
    ) -> Self {
        Self {
            data,
            assets,
            presentation,
            channels: Arc::new(Channels::new()),
        }
    }

    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            channels: Arc::clone(&self.channels),
        }
    }

    pub fn status(&self) -> PlayerStatus {
        self.channels.status.borrow().clone()
    }

    pub fn data(&self) -> &Arc<DataManager> {
        &self.data
    }

    pub fn assets(&self) -> &Arc<AssetManager> {
        &self.assets
    }

    /// Installs freshly compiled data; takes effect for the next scenario.
    pub fn set_data_manager(&mut self, data: Arc<DataManager>) {
        self.data = data;
    }

    pub async fn start_scenario(&mut self, label: &str) -> PlaybackOutcome {
        if self.data.commands(label).is_empty() {
            warn!(label, "label is missing or has no commands, scenario not started");
            return PlaybackOutcome::Rejected;
        }

        let mut stop = self.channels.stopped.subscribe();
        let _idle = IdleOnDrop(Arc::clone(&self.channels));

        match self.run(label, &mut stop).await {
            Ok(last_label) => PlaybackOutcome::Completed { last_label },
            Err(Interrupted) => {
                info!(label, "scenario stopped");
                PlaybackOutcome::Stopped
            }
        }
    }

    async fn run(
        &self,
        entry: &str,
        stop: &mut watch::Receiver<bool>,
    ) -> Result<String, Interrupted> {
        if *stop.borrow_and_update() {
            return Err(Interrupted);
        }
        self.channels.enter(PlayerState::Starting, Some(entry));
        info!(label = entry, "scenario starting");
        self.presentation.start_scenario();

        let mut loading = self.channels.loading.subscribe();
        interruptible(stop, wait_until_clear(&mut loading)).await?;

        let mut current = entry.to_string();
        loop {
            self.channels.enter(PlayerState::PreloadAssets, Some(&current));
            let required = self.data.required_assets(&current);
            let report = interruptible(stop, self.assets.reconcile(&required)).await?;
            debug!(label = %current, ?report, "label assets resident");

            self.channels.enter(PlayerState::RunningLabel, Some(&current));
            info!(label = %current, "running label");
            let next = self.run_label(&current, stop).await?;

            match next {
                Some(target) if self.data.label(&target).is_some() => {
                    debug!(from = %current, to = %target, "jumping to label");
                    current = target;
                }
                Some(target) => {
                    error!(label = %target, "jump target does not exist, ending scenario");
                    break;
                }
                None => break,
            }
        }

        self.channels.enter(PlayerState::Ending, Some(&current));
        self.presentation.end_scenario();
        info!(label = %current, "scenario ended");
        Ok(current)
    }

    /// Runs every command of `label` and returns the next-label target the
    /// commands left behind.
    async fn run_label(
        &self,
        label: &str,
        stop: &mut watch::Receiver<bool>,
    ) -> Result<Option<String>, Interrupted> {
        let mut next_label = None;
        let mut paused = self.channels.paused.subscribe();

        for (index, command) in self.data.commands(label).iter().enumerate() {
            interruptible(stop, wait_until_clear(&mut paused)).await?;

            self.channels.at_command(index);
            // Subscribe before executing so an acknowledgement sent while the
            // presentation handles the command is not lost.
            let mut signals = self.channels.signals.subscribe();
            debug!(label, index, opcode = command.opcode(), "executing command");

            let flow = execute_command(
                command,
                &mut CommandContext {
                    data: &self.data,
                    assets: &self.assets,
                    presentation: self.presentation.as_ref(),
                    next_label: &mut next_label,
                },
            );

            match flow {
                CommandFlow::Continue => {}
                CommandFlow::AwaitAdvance => {
                    self.channels.suspend(Suspension::Line);
                    interruptible(stop, wait_for_advance(&mut signals)).await??;
                }
                CommandFlow::AwaitSelection(targets) => {
                    self.channels.suspend(Suspension::Selection);
                    let chosen =
                        interruptible(stop, wait_for_choice(&mut signals, targets.len())).await??;
                    next_label = targets.into_iter().nth(chosen);
                }
            }
            self.channels.suspend(Suspension::None);
        }

        Ok(next_label)
    }
}

struct IdleOnDrop(Arc<Channels>);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        self.0.stopped.send_replace(false);
        self.0.enter(PlayerState::Idle, None);
    }
}

async fn interruptible<F: Future>(
    stop: &mut watch::Receiver<bool>,
    future: F,
) -> Result<F::Output, Interrupted> {
    tokio::select! {
        biased;
        _ = stop.wait_for(|stopped| *stopped) => Err(Interrupted),
        output = future => Ok(output),
    }
}

async fn wait_until_clear(flag: &mut watch::Receiver<bool>) {
    // The sender lives in the player's channels, so this never errors while
    // the player exists.
    let _ = flag.wait_for(|set| !*set).await;
}

async fn next_signal(
    signals: &mut broadcast::Receiver<PlayerSignal>,
) -> Result<PlayerSignal, Interrupted> {
    loop {
        match signals.recv().await {
            Ok(signal) => return Ok(signal),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "player signals lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return Err(Interrupted),
        }
    }
}

async fn wait_for_advance(
    signals: &mut broadcast::Receiver<PlayerSignal>,
) -> Result<(), Interrupted> {
    loop {
        if next_signal(signals).await? == PlayerSignal::AdvanceLine {
            return Ok(());
        }
    }
}

async fn wait_for_choice(
    signals: &mut broadcast::Receiver<PlayerSignal>,
    option_count: usize,
) -> Result<usize, Interrupted> {
    loop {
        match next_signal(signals).await? {
            PlayerSignal::Choose(index) if index < option_count => return Ok(index),
            PlayerSignal::Choose(index) => {
                warn!(index, option_count, "choice index out of range, still waiting");
            }
            PlayerSignal::AdvanceLine => {}
        }
    }
}

#[cfg(test)]
mod tests;
