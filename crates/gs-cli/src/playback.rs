use gs_runtime::{PlaybackOutcome, PlayerHandle, ScenarioPlayer, Suspension};
use tokio::io::{AsyncBufRead, Lines};
use tracing::warn;

use crate::ConsolePresentation;

/// Where acknowledgements for suspended commands come from.
pub(crate) enum Responder<R> {
    /// Advance every line and take the first option.
    Auto,
    /// An empty line advances; a number picks that option.
    Interactive(Lines<R>),
}

impl<R: AsyncBufRead + Unpin> Responder<R> {
    /// Returns `false` once input is exhausted.
    async fn answer(
        &mut self,
        suspension: Suspension,
        option_count: usize,
        handle: &PlayerHandle,
    ) -> bool {
        let lines = match (suspension, self) {
            (Suspension::None, _) => return true,
            (Suspension::Line, Responder::Auto) => {
                handle.advance();
                return true;
            }
            (Suspension::Selection, Responder::Auto) => {
                handle.choose(0);
                return true;
            }
            (_, Responder::Interactive(lines)) => lines,
        };

        loop {
            let Some(input) = read_line(lines).await else {
                return false;
            };
            if suspension == Suspension::Line {
                handle.advance();
                return true;
            }
            match input.trim().parse::<usize>() {
                Ok(index) if index < option_count => {
                    handle.choose(index);
                    return true;
                }
                _ => warn!(input = input.trim(), option_count, "expected an option index"),
            }
        }
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> Option<String> {
    match lines.next_line().await {
        Ok(line) => line,
        Err(error) => {
            warn!(%error, "failed to read input");
            None
        }
    }
}

/// Runs `entry_label` to completion, answering every suspension through
/// `responder`. Exhausted input stops the scenario.
pub(crate) async fn drive_player<R: AsyncBufRead + Unpin>(
    player: &mut ScenarioPlayer,
    entry_label: &str,
    console: &ConsolePresentation,
    mut responder: Responder<R>,
) -> PlaybackOutcome {
    let handle = player.handle();
    let mut status = handle.subscribe_status();
    let run = player.start_scenario(entry_label);
    tokio::pin!(run);

    loop {
        tokio::select! {
            outcome = &mut run => return outcome,
            changed = status.changed() => {
                if changed.is_err() {
                    return run.await;
                }
                let suspension = status.borrow_and_update().suspension;
                if !responder
                    .answer(suspension, console.selection_count(), &handle)
                    .await
                {
                    handle.stop();
                }
            }
        }
    }
}
