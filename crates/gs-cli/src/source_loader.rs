use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use gs_core::ScenarioError;
use gs_runtime::ScenarioSources;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    map_cli_config_invalid, map_cli_source_path, map_cli_source_read, map_cli_source_scan,
    LoadedScenario, ScenarioConfig, GRID_EXTENSION, SCENARIO_CONFIG_FILE,
};

pub(crate) fn load_source_by_scenario_dir(
    scenario_dir: &str,
) -> Result<LoadedScenario, ScenarioError> {
    let root = resolve_dir(scenario_dir, "scenario-dir")?;
    let config = read_scenario_config(&root)?;
    let grids = read_grids_from_dir(&root, &config.characters_file)?;
    let characters = read_characters(&root, &config.characters_file)?;

    Ok(LoadedScenario {
        id: format!("scenario-dir:{}", root.display()),
        sources: ScenarioSources { grids, characters },
        compile_options: config.compile,
    })
}

pub(crate) fn resolve_dir(dir: &str, flag: &str) -> Result<PathBuf, ScenarioError> {
    let path = PathBuf::from(dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(ScenarioError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("{} does not exist: {}", flag, absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(ScenarioError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("{} is not a directory: {}", flag, absolute.display()),
        ));
    }

    Ok(absolute)
}

pub(crate) fn read_scenario_config(root: &Path) -> Result<ScenarioConfig, ScenarioError> {
    let path = root.join(SCENARIO_CONFIG_FILE);
    if !path.is_file() {
        return Ok(ScenarioConfig::default());
    }
    let content = fs::read_to_string(&path).map_err(map_cli_source_read)?;
    let config = serde_json::from_str(&content).map_err(map_cli_config_invalid)?;
    debug!(path = %path.display(), ?config, "scenario config loaded");
    Ok(config)
}

/// Every `*.csv` under `root` except the character table, keyed by its
/// `/`-separated path relative to `root`.
pub(crate) fn read_grids_from_dir(
    root: &Path,
    characters_file: &str,
) -> Result<BTreeMap<String, String>, ScenarioError> {
    let mut grids = BTreeMap::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_grid = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case(GRID_EXTENSION));
        if !is_grid {
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");
        if relative == characters_file {
            continue;
        }

        let content = fs::read_to_string(path).map_err(map_cli_source_read)?;
        grids.insert(relative, content);
    }

    if grids.is_empty() {
        return Err(ScenarioError::new(
            "CLI_SOURCE_EMPTY",
            format!("No .csv scenario grids under {}", root.display()),
        ));
    }

    Ok(grids)
}

pub(crate) fn read_characters(
    root: &Path,
    characters_file: &str,
) -> Result<Option<String>, ScenarioError> {
    let path = root.join(characters_file);
    if !path.is_file() {
        warn!(path = %path.display(), "character table not found, no characters loaded");
        return Ok(None);
    }
    fs::read_to_string(&path)
        .map(Some)
        .map_err(map_cli_source_read)
}
