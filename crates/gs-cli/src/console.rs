use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use gs_core::{CharacterSetting, SelectionItem, Speaker};
use gs_runtime::{AssetHandle, Presentation};
use tracing::warn;

/// Prints playback as line-oriented events.
pub(crate) struct ConsolePresentation {
    out: Mutex<Box<dyn Write + Send>>,
    selection_count: AtomicUsize,
}

impl ConsolePresentation {
    pub(crate) fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            selection_count: AtomicUsize::new(0),
        }
    }

    pub(crate) fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Option count of the most recent selection.
    pub(crate) fn selection_count(&self) -> usize {
        self.selection_count.load(Ordering::Acquire)
    }

    fn emit(&self, lines: &[String]) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        for line in lines {
            if let Err(error) = writeln!(out, "{}", line) {
                warn!(%error, "console write failed");
                return;
            }
        }
        if let Err(error) = out.flush() {
            warn!(%error, "console flush failed");
        }
    }
}

fn json(text: &str) -> String {
    serde_json::to_string(text).expect("string json")
}

impl Presentation for ConsolePresentation {
    fn start_scenario(&self) {
        self.emit(&["EVENT:START".to_string()]);
    }

    fn end_scenario(&self) {
        self.emit(&["EVENT:END".to_string()]);
    }

    fn play_text(&self, speaker: Option<Speaker<'_>>, text: &str) {
        let mut lines = Vec::with_capacity(2);
        if let Some(speaker) = speaker {
            lines.push(format!("SPEAKER_JSON:{}", json(speaker.name)));
        }
        lines.push(format!("TEXT_JSON:{}", json(text)));
        self.emit(&lines);
    }

    fn show_character(&self, layer: &str, setting: &CharacterSetting, _sprite: &AssetHandle) {
        self.emit(&[format!("SHOW:{}|{}", layer, setting.id)]);
    }

    fn hide_layer(&self, layer: &str) {
        self.emit(&[format!("HIDE:{}", layer)]);
    }

    fn show_selections(&self, items: &[SelectionItem]) {
        self.selection_count.store(items.len(), Ordering::Release);
        let lines = items
            .iter()
            .map(|item| format!("CHOICE:{}|{}", item.index, json(&item.text)))
            .collect::<Vec<_>>();
        self.emit(&lines);
    }
}
