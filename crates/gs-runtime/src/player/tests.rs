use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use gs_compiler::CompileOptions;
use gs_core::{CharacterSetting, SelectionItem, Speaker};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use super::*;
use crate::asset::{AssetError, AssetHandle, AssetStore};
use crate::data_manager::ScenarioSources;

const CHARACTERS: &str = "Id,Name,PositionX,PositionY,Scale,Sprite,Voice,Color
Eve,Eve Adams,0,0,1,eve.png,,#FF0000
Bob,Bob,0,0,1,bob.png,,
Ghost,Ghost,0,0,1,missing.png,,
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shown {
    Start,
    End,
    Text {
        speaker: Option<String>,
        text: String,
    },
    Character {
        layer: String,
        character: String,
        sprite: String,
    },
    Hide {
        layer: String,
    },
    Selections(Vec<String>),
}

fn text(value: &str) -> Shown {
    Shown::Text {
        speaker: None,
        text: value.to_string(),
    }
}

fn spoken(speaker: &str, value: &str) -> Shown {
    Shown::Text {
        speaker: Some(speaker.to_string()),
        text: value.to_string(),
    }
}

struct RecordingPresentation {
    events: mpsc::UnboundedSender<Shown>,
}

impl RecordingPresentation {
    fn emit(&self, shown: Shown) {
        let _ = self.events.send(shown);
    }
}

impl Presentation for RecordingPresentation {
    fn start_scenario(&self) {
        self.emit(Shown::Start);
    }

    fn end_scenario(&self) {
        self.emit(Shown::End);
    }

    fn play_text(&self, speaker: Option<Speaker<'_>>, text: &str) {
        self.emit(Shown::Text {
            speaker: speaker.map(|speaker| speaker.name.to_string()),
            text: text.to_string(),
        });
    }

    fn show_character(&self, layer: &str, setting: &CharacterSetting, sprite: &AssetHandle) {
        self.emit(Shown::Character {
            layer: layer.to_string(),
            character: setting.id.clone(),
            sprite: sprite
                .downcast_ref::<String>()
                .cloned()
                .unwrap_or_default(),
        });
    }

    fn hide_layer(&self, layer: &str) {
        self.emit(Shown::Hide {
            layer: layer.to_string(),
        });
    }

    fn show_selections(&self, items: &[SelectionItem]) {
        self.emit(Shown::Selections(
            items.iter().map(|item| item.text.clone()).collect(),
        ));
    }
}

#[derive(Default)]
struct TestStore {
    loads: Mutex<Vec<String>>,
    releases: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl TestStore {
    fn loads(&self) -> Vec<String> {
        self.loads.lock().expect("loads").clone()
    }

    fn releases(&self) -> Vec<String> {
        self.releases.lock().expect("releases").clone()
    }
}

impl AssetStore for TestStore {
    fn load<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<AssetHandle, AssetError>> {
        Box::pin(async move {
            self.loads.lock().expect("loads").push(name.to_string());
            if let Some(gate) = &self.gate {
                gate.acquire()
                    .await
                    .expect("gate should stay open")
                    .forget();
            }
            if name.starts_with("missing") {
                return Err(AssetError::NotFound {
                    name: name.to_string(),
                });
            }
            Ok(Arc::new(name.to_string()) as AssetHandle)
        })
    }

    fn release(&self, name: &str, _handle: AssetHandle) {
        self.releases
            .lock()
            .expect("releases")
            .push(name.to_string());
    }
}

struct Harness {
    player: ScenarioPlayer,
    store: Arc<TestStore>,
    events: mpsc::UnboundedReceiver<Shown>,
}

fn harness(scenario: &str) -> Harness {
    harness_with_store(scenario, TestStore::default())
}

fn harness_with_store(scenario: &str, store: TestStore) -> Harness {
    let sources = ScenarioSources {
        grids: BTreeMap::from([(
            "scenario".to_string(),
            format!("Command,Arg1,Arg2,Arg3,Text\n{}", scenario),
        )]),
        characters: Some(CHARACTERS.to_string()),
    };
    let data = DataManager::compile(&sources, &CompileOptions::default())
        .expect("scenario should compile");
    let store = Arc::new(store);
    let (sender, events) = mpsc::unbounded_channel();
    let player = ScenarioPlayer::new(
        Arc::new(data),
        Arc::new(AssetManager::new(store.clone())),
        Arc::new(RecordingPresentation { events: sender }),
    );
    Harness {
        player,
        store,
        events,
    }
}

fn spawn_start(
    mut player: ScenarioPlayer,
    label: &'static str,
) -> JoinHandle<(ScenarioPlayer, PlaybackOutcome)> {
    tokio::spawn(async move {
        let outcome = player.start_scenario(label).await;
        (player, outcome)
    })
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<Shown>) -> Shown {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("presentation event should arrive")
        .expect("presentation channel should stay open")
}

async fn assert_quiet(events: &mut mpsc::UnboundedReceiver<Shown>) {
    let pending = tokio::time::timeout(Duration::from_millis(50), events.recv()).await;
    assert!(pending.is_err(), "unexpected presentation event {pending:?}");
}

async fn wait_status(handle: &PlayerHandle, predicate: impl Fn(&PlayerStatus) -> bool) {
    let mut status = handle.subscribe_status();
    tokio::time::timeout(
        Duration::from_secs(5),
        status.wait_for(|current| predicate(current)),
    )
    .await
    .expect("status should be reached")
    .expect("status channel should stay open");
}

async fn wait_line(handle: &PlayerHandle, index: usize) {
    wait_status(handle, |status| {
        status.command_index == Some(index) && status.suspension == Suspension::Line
    })
    .await;
}

#[tokio::test]
async fn commands_run_in_order_and_wait_for_advance() {
    let Harness {
        player,
        mut events,
        ..
    } = harness("Label,Start,,,\nText,,,,one\nText,,,,two\nText,,,,three\n");
    let handle = player.handle();
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(next_event(&mut events).await, text("one"));
    wait_line(&handle, 0).await;
    assert_quiet(&mut events).await;

    handle.advance();
    assert_eq!(next_event(&mut events).await, text("two"));
    wait_line(&handle, 1).await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, text("three"));
    wait_line(&handle, 2).await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, Shown::End);

    let (player, outcome) = task.await.expect("player task");
    assert_eq!(
        outcome,
        PlaybackOutcome::Completed {
            last_label: "Start".to_string()
        }
    );
    assert!(player.status().is_idle());
    assert_eq!(player.status().label, None);
}

#[tokio::test]
async fn advance_sent_while_nothing_waits_is_dropped() {
    let Harness { player, .. } = harness("Label,Start,,,\nText,,,,one\n");
    let handle = player.handle();
    handle.advance();
    handle.advance();
    assert!(handle.status().is_idle());
}

#[tokio::test]
async fn stop_between_commands_prevents_the_next_one() {
    let Harness {
        player,
        mut events,
        ..
    } = harness("Label,Start,,,\nText,,,,one\nText,,,,two\n");
    let handle = player.handle();
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(next_event(&mut events).await, text("one"));
    wait_line(&handle, 0).await;
    handle.stop();

    let (player, outcome) = task.await.expect("player task");
    assert_eq!(outcome, PlaybackOutcome::Stopped);
    assert!(player.status().is_idle());
    handle.advance();
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn stop_before_the_first_poll_cancels_the_run() {
    let Harness {
        player,
        store,
        mut events,
    } = harness("Label,Start,,,\nText,,,,one\nText,,,,two\n");
    let handle = player.handle();
    let task = spawn_start(player, "Start");
    handle.stop();

    let (player, outcome) = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("stopped run should finish")
        .expect("player task");
    assert_eq!(outcome, PlaybackOutcome::Stopped);
    assert!(player.status().is_idle());
    assert!(store.loads().is_empty());
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn stop_sent_while_idle_is_consumed_by_one_run_only() {
    let Harness {
        mut player,
        mut events,
        ..
    } = harness("Label,Start,,,\nCharacter,Eve,On,Left,\n");
    let handle = player.handle();
    handle.stop();

    assert_eq!(
        player.start_scenario("Start").await,
        PlaybackOutcome::Stopped
    );
    assert_quiet(&mut events).await;

    assert_eq!(
        player.start_scenario("Start").await,
        PlaybackOutcome::Completed {
            last_label: "Start".to_string()
        }
    );
    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(
        next_event(&mut events).await,
        Shown::Hide {
            layer: "Left".to_string()
        }
    );
    assert_eq!(next_event(&mut events).await, Shown::End);
}

#[tokio::test]
async fn restart_after_stop_begins_a_fresh_cycle() {
    let Harness {
        player,
        mut events,
        ..
    } = harness("Label,Start,,,\nText,,,,one\nText,,,,two\n");
    let handle = player.handle();
    let task = spawn_start(player, "Start");
    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(next_event(&mut events).await, text("one"));
    wait_line(&handle, 0).await;
    handle.stop();
    let (player, _) = task.await.expect("player task");

    let task = spawn_start(player, "Start");
    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(next_event(&mut events).await, text("one"));
    wait_line(&handle, 0).await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, text("two"));
    wait_line(&handle, 1).await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, Shown::End);
    let (_, outcome) = task.await.expect("player task");
    assert!(matches!(outcome, PlaybackOutcome::Completed { .. }));
}

#[tokio::test]
async fn pause_holds_the_next_command() {
    let Harness {
        player,
        mut events,
        ..
    } = harness("Label,Start,,,\nText,,,,one\nText,,,,two\n");
    let handle = player.handle();
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(next_event(&mut events).await, text("one"));
    wait_line(&handle, 0).await;
    handle.pause();
    assert!(handle.is_paused());
    handle.advance();
    wait_status(&handle, |status| status.suspension == Suspension::None).await;
    assert_quiet(&mut events).await;

    handle.resume();
    assert_eq!(next_event(&mut events).await, text("two"));
    wait_line(&handle, 1).await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, Shown::End);
    task.await.expect("player task");
}

#[tokio::test]
async fn stop_while_paused_abandons_the_run() {
    let Harness {
        player,
        mut events,
        ..
    } = harness("Label,Start,,,\nText,,,,one\nText,,,,two\n");
    let handle = player.handle();
    handle.pause();
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    wait_status(&handle, |status| status.state == PlayerState::RunningLabel).await;
    assert_quiet(&mut events).await;
    handle.stop();

    let (_player, outcome) = task.await.expect("player task");
    assert_eq!(outcome, PlaybackOutcome::Stopped);
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn loading_gate_delays_first_prefetch() {
    let Harness {
        player,
        store,
        mut events,
    } = harness("Label,Start,,,\nCharacter,Eve,Off,Left,\nText,,,,hi\n");
    let handle = player.handle();
    handle.set_loading(true);
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(handle.status().state, PlayerState::Starting);
    assert_quiet(&mut events).await;
    assert!(store.loads().is_empty());

    handle.set_loading(false);
    assert!(matches!(next_event(&mut events).await, Shown::Character { .. }));
    assert_eq!(store.loads(), vec!["eve.png".to_string()]);
    assert_eq!(next_event(&mut events).await, text("hi"));
    wait_line(&handle, 1).await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, Shown::End);
    task.await.expect("player task");
}

#[tokio::test]
async fn label_waits_for_every_prefetch_load() {
    let gate = Arc::new(Semaphore::new(0));
    let Harness {
        player,
        store,
        mut events,
    } = harness_with_store(
        "Label,Start,,,\nCharacter,Eve,Off,Left,\nCharacter,Bob,Off,Right,\n",
        TestStore {
            gate: Some(gate.clone()),
            ..TestStore::default()
        },
    );
    let handle = player.handle();
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    wait_status(&handle, |status| status.state == PlayerState::PreloadAssets).await;
    gate.add_permits(1);
    assert_quiet(&mut events).await;
    assert_eq!(handle.status().state, PlayerState::PreloadAssets);

    gate.add_permits(1);
    assert_eq!(
        next_event(&mut events).await,
        Shown::Character {
            layer: "Left".to_string(),
            character: "Eve".to_string(),
            sprite: "eve.png".to_string(),
        }
    );
    assert_eq!(
        next_event(&mut events).await,
        Shown::Character {
            layer: "Right".to_string(),
            character: "Bob".to_string(),
            sprite: "bob.png".to_string(),
        }
    );
    assert_eq!(next_event(&mut events).await, Shown::End);
    let mut loads = store.loads();
    loads.sort();
    assert_eq!(loads, vec!["bob.png".to_string(), "eve.png".to_string()]);
    task.await.expect("player task");
}

#[tokio::test]
async fn jump_drives_the_next_prefetch() {
    let Harness {
        player,
        store,
        mut events,
    } = harness(
        "Label,Start,,,\nCharacter,Eve,Off,Left,\nJump,Next,,,\nLabel,Next,,,\nCharacter,Eve,On,Left,\nCharacter,Bob,Off,Right,\n",
    );
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert!(matches!(
        next_event(&mut events).await,
        Shown::Character { ref character, .. } if character == "Eve"
    ));
    assert_eq!(
        next_event(&mut events).await,
        Shown::Hide {
            layer: "Left".to_string()
        }
    );
    assert!(matches!(
        next_event(&mut events).await,
        Shown::Character { ref character, .. } if character == "Bob"
    ));
    assert_eq!(next_event(&mut events).await, Shown::End);

    let (player, outcome) = task.await.expect("player task");
    assert_eq!(
        outcome,
        PlaybackOutcome::Completed {
            last_label: "Next".to_string()
        }
    );
    assert_eq!(
        store.loads(),
        vec!["eve.png".to_string(), "bob.png".to_string()]
    );
    assert!(store.releases().is_empty());
    assert_eq!(
        player.assets().resident_names(),
        BTreeSet::from(["bob.png".to_string(), "eve.png".to_string()])
    );
}

#[tokio::test]
async fn jump_releases_assets_the_next_label_does_not_need() {
    let Harness {
        player,
        store,
        mut events,
    } = harness(
        "Label,Start,,,\nCharacter,Eve,Off,Left,\nJump,Next,,,\nLabel,Next,,,\nCharacter,Bob,Off,Right,\n",
    );
    let task = spawn_start(player, "Start");
    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert!(matches!(next_event(&mut events).await, Shown::Character { .. }));
    assert!(matches!(next_event(&mut events).await, Shown::Character { .. }));
    assert_eq!(next_event(&mut events).await, Shown::End);

    let (player, _) = task.await.expect("player task");
    assert_eq!(store.releases(), vec!["eve.png".to_string()]);
    assert_eq!(
        player.assets().resident_names(),
        BTreeSet::from(["bob.png".to_string()])
    );
}

#[tokio::test]
async fn missing_character_skips_only_that_command() {
    let Harness {
        player,
        mut events,
        ..
    } = harness(
        "Label,Start,,,\nCharacter,Nobody,Off,Left,Hello?\nText,,,,after\n",
    );
    let handle = player.handle();
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(next_event(&mut events).await, text("after"));
    wait_line(&handle, 1).await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, Shown::End);
    task.await.expect("player task");
}

#[tokio::test]
async fn missing_sprite_still_plays_the_line() {
    let Harness {
        player,
        mut events,
        ..
    } = harness("Label,Start,,,\nCharacter,Ghost,Off,Left,<char=Eve>?\n");
    let handle = player.handle();
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(next_event(&mut events).await, spoken("Ghost", "Eve Adams?"));
    wait_line(&handle, 0).await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, Shown::End);
    task.await.expect("player task");
}

#[tokio::test]
async fn choice_sets_the_next_label() {
    let Harness {
        player,
        mut events,
        ..
    } = harness(
        "Label,Start,,,\nChoice,Left,Right,,Go <char=Eve>|Stay\nText,,,,after choice\nLabel,Left,,,\nText,,,,went left\nLabel,Right,,,\nText,,,,stayed\n",
    );
    let handle = player.handle();
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(
        next_event(&mut events).await,
        Shown::Selections(vec!["Go Eve Adams".to_string(), "Stay".to_string()])
    );
    wait_status(&handle, |status| status.suspension == Suspension::Selection).await;
    handle.advance();
    handle.choose(7);
    assert_quiet(&mut events).await;

    handle.choose(1);
    assert_eq!(next_event(&mut events).await, text("after choice"));
    wait_line(&handle, 1).await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, text("stayed"));
    wait_status(&handle, |status| {
        status.label.as_deref() == Some("Right") && status.suspension == Suspension::Line
    })
    .await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, Shown::End);

    let (_, outcome) = task.await.expect("player task");
    assert_eq!(
        outcome,
        PlaybackOutcome::Completed {
            last_label: "Right".to_string()
        }
    );
}

#[tokio::test]
async fn speaker_line_is_attributed_to_display_name() {
    let Harness {
        player,
        mut events,
        ..
    } = harness("Label,Start,,,\nCharacter,Eve,Off,Stage1,Hello\n");
    let handle = player.handle();
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert!(matches!(next_event(&mut events).await, Shown::Character { .. }));
    assert_eq!(next_event(&mut events).await, spoken("Eve Adams", "Hello"));
    wait_line(&handle, 0).await;
    handle.advance();
    assert_eq!(next_event(&mut events).await, Shown::End);
    task.await.expect("player task");
}

#[tokio::test]
async fn jump_to_unknown_label_ends_scenario() {
    let Harness {
        player,
        mut events,
        ..
    } = harness("Label,Start,,,\nJump,Nowhere,,,\n");
    let task = spawn_start(player, "Start");

    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(next_event(&mut events).await, Shown::End);
    let (_, outcome) = task.await.expect("player task");
    assert_eq!(
        outcome,
        PlaybackOutcome::Completed {
            last_label: "Start".to_string()
        }
    );
}

#[tokio::test]
async fn empty_or_unknown_label_is_rejected_without_side_effects() {
    let Harness {
        mut player,
        store,
        mut events,
    } = harness("Label,Empty,,,\nLabel,Start,,,\nText,,,,x\n");

    assert_eq!(
        player.start_scenario("Empty").await,
        PlaybackOutcome::Rejected
    );
    assert_eq!(
        player.start_scenario("Unknown").await,
        PlaybackOutcome::Rejected
    );
    assert!(player.status().is_idle());
    assert!(store.loads().is_empty());
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn dropping_the_run_resets_status() {
    let Harness {
        mut player,
        mut events,
        ..
    } = harness("Label,Start,,,\nText,,,,one\n");
    let handle = player.handle();
    {
        let run = player.start_scenario("Start");
        let _ = tokio::time::timeout(Duration::from_millis(50), run).await;
    }
    assert_eq!(next_event(&mut events).await, Shown::Start);
    assert_eq!(next_event(&mut events).await, text("one"));
    assert!(handle.status().is_idle());
    handle.advance();
    assert_quiet(&mut events).await;
}
