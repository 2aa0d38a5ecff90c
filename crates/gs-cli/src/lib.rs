use std::ffi::OsString;
use std::sync::Arc;

use clap::Parser;
use gs_api::{compile_data_manager, create_player, CreatePlayerOptions, PreparedPlayer};
use gs_compiler::ScenarioProgram;
use gs_core::{Command, ScenarioError};
use gs_runtime::{AssetStore, PlaybackOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

mod asset_store;
mod cli_args;
mod console;
mod error_map;
mod models;
mod playback;
mod source_loader;

pub(crate) use asset_store::{DirectoryAssetStore, VirtualAssetStore};
pub(crate) use cli_args::{CheckArgs, Cli, Mode, PlayArgs};
pub(crate) use console::ConsolePresentation;
pub(crate) use error_map::{
    emit_error, map_cli_config_invalid, map_cli_runtime, map_cli_source_path, map_cli_source_read,
    map_cli_source_scan,
};
pub(crate) use models::{LoadedScenario, ScenarioConfig, GRID_EXTENSION, SCENARIO_CONFIG_FILE};
pub(crate) use playback::{drive_player, Responder};
pub(crate) use source_loader::{load_source_by_scenario_dir, resolve_dir};
#[cfg(test)]
pub(crate) use source_loader::{read_characters, read_grids_from_dir, read_scenario_config};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, ScenarioError> {
    match cli.command {
        Mode::Check(args) => run_check(args),
        Mode::Play(args) => run_play(args),
    }
}

fn run_check(args: CheckArgs) -> Result<i32, ScenarioError> {
    let scenario = load_source_by_scenario_dir(&args.scenario_dir)?;
    let data = compile_data_manager(&scenario.sources, &scenario.compile_options)?;

    println!("RESULT:OK");
    for label in data.program().labels() {
        println!("LABEL:{}|{}", label.name, label.commands.len());
    }
    for (label, target) in unresolved_targets(data.program()) {
        println!("UNRESOLVED:{}|{}", label, target);
    }
    println!("CHARACTERS:{}", data.characters().len());
    Ok(0)
}

/// Jump and choice targets naming labels the program does not define, as
/// `(label, target)` pairs.
pub(crate) fn unresolved_targets(program: &ScenarioProgram) -> Vec<(String, String)> {
    let mut unresolved = Vec::new();
    for label in program.labels() {
        for command in &label.commands {
            let targets = match command {
                Command::Jump { target_label, .. } => vec![target_label.as_str()],
                Command::Choice { options, .. } => options
                    .iter()
                    .map(|option| option.target_label.as_str())
                    .collect(),
                _ => continue,
            };
            for target in targets {
                if !program.contains_label(target) {
                    unresolved.push((label.name.clone(), target.to_string()));
                }
            }
        }
    }
    unresolved
}

fn run_play(args: PlayArgs) -> Result<i32, ScenarioError> {
    let scenario = load_source_by_scenario_dir(&args.scenario_dir)?;
    let asset_store: Arc<dyn AssetStore> = match &args.assets_dir {
        Some(dir) => Arc::new(DirectoryAssetStore::new(resolve_dir(dir, "assets-dir")?)),
        None => Arc::new(VirtualAssetStore),
    };
    let console = Arc::new(ConsolePresentation::stdout());

    let PreparedPlayer {
        mut player,
        entry_label,
    } = create_player(CreatePlayerOptions {
        sources: scenario.sources,
        compile_options: scenario.compile_options,
        entry_label: args.label,
        asset_store,
        presentation: console.clone(),
    })?;
    info!(scenario = %scenario.id, label = %entry_label, "playing scenario");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(map_cli_runtime)?;

    println!("RESULT:OK");
    let outcome = runtime.block_on(async {
        if args.auto {
            let responder = Responder::<BufReader<tokio::io::Stdin>>::Auto;
            drive_player(&mut player, &entry_label, &console, responder).await
        } else {
            let lines = BufReader::new(tokio::io::stdin()).lines();
            drive_player(
                &mut player,
                &entry_label,
                &console,
                Responder::Interactive(lines),
            )
            .await
        }
    });
    // A pending stdin read cannot be cancelled; do not wait for it.
    runtime.shutdown_background();

    match outcome {
        PlaybackOutcome::Completed { last_label } => {
            println!("OUTCOME:COMPLETED|{}", last_label);
            Ok(0)
        }
        PlaybackOutcome::Stopped => {
            println!("OUTCOME:STOPPED");
            Ok(0)
        }
        PlaybackOutcome::Rejected => Err(ScenarioError::new(
            "CLI_PLAY_REJECTED",
            format!("Label \"{}\" could not be started.", entry_label),
        )),
    }
}
