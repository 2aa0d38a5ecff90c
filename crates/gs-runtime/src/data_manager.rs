use std::collections::{BTreeMap, BTreeSet};

use gs_compiler::{
    compile_character_table, compile_scenario_program_with, CharacterTable, CommandFactory,
    CompileOptions, ScenarioProgram,
};
use gs_core::{CharacterSetting, Command, Label, ScenarioError};
use tracing::{info, warn};

use crate::tag_parser::TagParser;

pub const CHARACTER_TAG: &str = "char";
pub const CHARACTER_GRID_NAME: &str = "characters";

/// Raw tabular sources: scenario grids by name plus the character table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioSources {
    pub grids: BTreeMap<String, String>,
    pub characters: Option<String>,
}

/// Owns the compiled program, the character table and the tag parser.
#[derive(Debug)]
pub struct DataManager {
    program: ScenarioProgram,
    characters: CharacterTable,
    tag_parser: TagParser<CharacterTable>,
}

impl DataManager {
    pub fn new(program: ScenarioProgram, characters: CharacterTable) -> Self {
        let mut tag_parser = TagParser::new();
        tag_parser.register_handler(CHARACTER_TAG, display_name_tag);
        Self {
            program,
            characters,
            tag_parser,
        }
    }

    pub fn compile(
        sources: &ScenarioSources,
        options: &CompileOptions,
    ) -> Result<Self, ScenarioError> {
        Self::compile_with(sources, &CommandFactory::with_builtins(), options)
    }

    pub fn compile_with(
        sources: &ScenarioSources,
        factory: &CommandFactory,
        options: &CompileOptions,
    ) -> Result<Self, ScenarioError> {
        let (program, characters) = compile_sources(sources, factory, options)?;
        Ok(Self::new(program, characters))
    }

    /// Recompiles everything; on failure the loaded data stays untouched.
    /// Registered tag handlers survive the reload.
    pub fn reload(
        &mut self,
        sources: &ScenarioSources,
        factory: &CommandFactory,
        options: &CompileOptions,
    ) -> Result<(), ScenarioError> {
        let (program, characters) = compile_sources(sources, factory, options)?;
        self.program = program;
        self.characters = characters;
        info!(labels = self.program.len(), "scenario data reloaded");
        Ok(())
    }

    pub fn program(&self) -> &ScenarioProgram {
        &self.program
    }

    pub fn characters(&self) -> &CharacterTable {
        &self.characters
    }

    pub fn label(&self, name: &str) -> Option<&Label> {
        self.program.label(name)
    }

    pub fn commands(&self, label: &str) -> &[Command] {
        self.program.commands(label)
    }

    pub fn character(&self, id: &str) -> Option<&CharacterSetting> {
        self.characters.get(id)
    }

    pub fn register_tag_handler<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&CharacterTable, &str) -> String + Send + Sync + 'static,
    {
        self.tag_parser.register_handler(name, handler);
    }

    pub fn parse_text(&self, text: &str) -> String {
        self.tag_parser.parse(&self.characters, text)
    }

    /// Sprite files of every character a label's `Character` commands use.
    pub fn required_assets(&self, label: &str) -> BTreeSet<String> {
        let mut required = BTreeSet::new();
        for command in self.commands(label) {
            let Command::Character {
                character_id,
                location,
                ..
            } = command
            else {
                continue;
            };
            match self.characters.get(character_id) {
                Some(setting) if !setting.sprite_file.is_empty() => {
                    required.insert(setting.sprite_file.clone());
                }
                Some(_) => {}
                None => {
                    warn!(%location, character = %character_id, "unknown character, nothing to prefetch");
                }
            }
        }
        required
    }
}

fn compile_sources(
    sources: &ScenarioSources,
    factory: &CommandFactory,
    options: &CompileOptions,
) -> Result<(ScenarioProgram, CharacterTable), ScenarioError> {
    let program = compile_scenario_program_with(&sources.grids, factory, options)?;
    let characters = match &sources.characters {
        Some(source) => compile_character_table(CHARACTER_GRID_NAME, source)?,
        None => CharacterTable::new(),
    };
    Ok((program, characters))
}

fn display_name_tag(characters: &CharacterTable, id: &str) -> String {
    match characters.get(id) {
        Some(setting) => setting.display_name.clone(),
        None => {
            warn!(character = id, "unknown character in text tag");
            id.to_string()
        }
    }
}
