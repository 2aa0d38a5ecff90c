use gs_compiler::CompileOptions;
use gs_runtime::ScenarioSources;
use serde::{Deserialize, Serialize};

pub(crate) const SCENARIO_CONFIG_FILE: &str = "scenario.json";
pub(crate) const DEFAULT_CHARACTERS_FILE: &str = "characters.csv";
pub(crate) const GRID_EXTENSION: &str = "csv";

#[derive(Debug, Clone)]
pub(crate) struct LoadedScenario {
    pub(crate) id: String,
    pub(crate) sources: ScenarioSources,
    pub(crate) compile_options: CompileOptions,
}

/// Optional per-directory settings read from `scenario.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ScenarioConfig {
    #[serde(flatten)]
    pub(crate) compile: CompileOptions,
    pub(crate) characters_file: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            compile: CompileOptions::default(),
            characters_file: DEFAULT_CHARACTERS_FILE.to_string(),
        }
    }
}
