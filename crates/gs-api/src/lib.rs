use std::sync::Arc;

use gs_compiler::CompileOptions;
use gs_core::ScenarioError;
use gs_runtime::{
    AssetManager, AssetStore, DataManager, Presentation, ScenarioPlayer, ScenarioSources,
};

pub const DEFAULT_ENTRY_LABEL: &str = "Start";

#[derive(Clone)]
pub struct CreatePlayerOptions {
    pub sources: ScenarioSources,
    pub compile_options: CompileOptions,
    pub entry_label: Option<String>,
    pub asset_store: Arc<dyn AssetStore>,
    pub presentation: Arc<dyn Presentation>,
}

/// A compiled, idle player together with the label it should start from.
pub struct PreparedPlayer {
    pub player: ScenarioPlayer,
    pub entry_label: String,
}

pub fn compile_data_manager(
    sources: &ScenarioSources,
    options: &CompileOptions,
) -> Result<DataManager, ScenarioError> {
    DataManager::compile(sources, options)
}

pub fn create_player(options: CreatePlayerOptions) -> Result<PreparedPlayer, ScenarioError> {
    let data = compile_data_manager(&options.sources, &options.compile_options)?;
    let entry_label = resolve_entry_label(&data, options.entry_label)?;

    let player = ScenarioPlayer::new(
        Arc::new(data),
        Arc::new(AssetManager::new(options.asset_store)),
        options.presentation,
    );
    Ok(PreparedPlayer {
        player,
        entry_label,
    })
}

/// Recompiles `sources` and installs the result into an idle player. The
/// player keeps its current data when compilation fails.
pub fn reload_player_data(
    player: &mut ScenarioPlayer,
    sources: &ScenarioSources,
    options: &CompileOptions,
) -> Result<(), ScenarioError> {
    if !player.status().is_idle() {
        return Err(ScenarioError::new(
            "API_PLAYER_BUSY",
            "Scenario data can only be reloaded while the player is idle.",
        ));
    }
    let data = compile_data_manager(sources, options)?;
    player.set_data_manager(Arc::new(data));
    Ok(())
}

fn resolve_entry_label(
    data: &DataManager,
    explicit: Option<String>,
) -> Result<String, ScenarioError> {
    if let Some(entry) = explicit {
        if data.commands(&entry).is_empty() {
            return Err(ScenarioError::new(
                "API_ENTRY_LABEL_NOT_FOUND",
                format!("Entry label \"{}\" is missing or has no commands.", entry),
            ));
        }
        return Ok(entry);
    }

    if !data.commands(DEFAULT_ENTRY_LABEL).is_empty() {
        return Ok(DEFAULT_ENTRY_LABEL.to_string());
    }

    Err(ScenarioError::new(
        "API_ENTRY_START_NOT_FOUND",
        format!(
            "Expected a label named \"{}\" as default entry.",
            DEFAULT_ENTRY_LABEL
        ),
    ))
}
