use std::collections::BTreeMap;

use gs_core::{
    CellLocation, ChoiceOption, Command, ScenarioError, OPCODE_CHARACTER, OPCODE_CHOICE,
    OPCODE_JUMP, OPCODE_TEXT,
};
use gs_parser::{GridRow, HeaderMap, ARG_COLUMN_PREFIX, TEXT_COLUMN};

use crate::options::CompileOptions;

pub const CHOICE_CAPTION_SEPARATOR: char = '|';

/// Everything a constructor may read while compiling one data row.
pub struct RowInput<'a> {
    pub header: &'a HeaderMap,
    pub row: &'a GridRow,
    pub location: &'a CellLocation,
    pub options: &'a CompileOptions,
}

impl RowInput<'_> {
    pub fn text(&self) -> &str {
        self.header.cell(self.row, TEXT_COLUMN)
    }

    pub fn arg(&self, n: usize) -> &str {
        self.header.arg(self.row, n).trim()
    }

    fn required_arg(&self, n: usize, what: &str) -> Result<String, ScenarioError> {
        let value = self.arg(n);
        if value.is_empty() {
            let column = self
                .header
                .index(&format!("{}{}", ARG_COLUMN_PREFIX, n))
                .map(|index| self.location.at_column(index))
                .unwrap_or_else(|| self.location.clone());
            return Err(ScenarioError::with_location(
                "COMPILE_ARGUMENT_MISSING",
                format!(
                    "{} requires {} in {}{}.",
                    self.opcode(),
                    what,
                    ARG_COLUMN_PREFIX,
                    n
                ),
                column,
            ));
        }
        Ok(value.to_string())
    }

    fn opcode(&self) -> &str {
        self.header.cell(self.row, gs_parser::COMMAND_COLUMN).trim()
    }
}

pub type CommandConstructor =
    Box<dyn Fn(&RowInput<'_>) -> Result<Command, ScenarioError> + Send + Sync>;

/// Opcode-keyed registry of command constructors. The set of command variants
/// is closed, the opcode spellings that produce them are not.
pub struct CommandFactory {
    constructors: BTreeMap<String, CommandConstructor>,
}

impl CommandFactory {
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut factory = Self::empty();
        factory.register(OPCODE_TEXT, build_text);
        factory.register(OPCODE_CHARACTER, build_character);
        factory.register(OPCODE_JUMP, build_jump);
        factory.register(OPCODE_CHOICE, build_choice);
        factory
    }

    pub fn register<F>(&mut self, opcode: impl Into<String>, constructor: F)
    where
        F: Fn(&RowInput<'_>) -> Result<Command, ScenarioError> + Send + Sync + 'static,
    {
        self.constructors.insert(opcode.into(), Box::new(constructor));
    }

    pub fn contains(&self, opcode: &str) -> bool {
        self.constructors.contains_key(opcode)
    }

    pub fn opcodes(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn build(&self, opcode: &str, input: &RowInput<'_>) -> Result<Command, ScenarioError> {
        if opcode.is_empty() {
            if !input.text().trim().is_empty() {
                return build_text(input);
            }
            return Err(ScenarioError::with_location(
                "COMPILE_OPCODE_MISSING",
                format!(
                    "Row {} in grid \"{}\" has cells but no opcode.",
                    input.location.line, input.location.grid
                ),
                input.location.clone(),
            ));
        }

        let Some(constructor) = self.constructors.get(opcode) else {
            return Err(ScenarioError::with_location(
                "COMPILE_UNKNOWN_OPCODE",
                format!(
                    "Unknown opcode \"{}\" at row {} in grid \"{}\".",
                    opcode, input.location.line, input.location.grid
                ),
                input.location.clone(),
            ));
        };
        constructor(input)
    }
}

impl Default for CommandFactory {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn build_text(input: &RowInput<'_>) -> Result<Command, ScenarioError> {
    Ok(Command::Text {
        text: input.text().to_string(),
        location: input.location.clone(),
    })
}

fn build_character(input: &RowInput<'_>) -> Result<Command, ScenarioError> {
    let character_id = input.required_arg(1, "a character id")?;
    let is_hiding = input.arg(2) == input.options.hide_marker;
    let layer_name = input.required_arg(3, "a layer name")?;
    let text = Some(input.text())
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string);

    Ok(Command::Character {
        character_id,
        is_hiding,
        layer_name,
        text,
        location: input.location.clone(),
    })
}

fn build_jump(input: &RowInput<'_>) -> Result<Command, ScenarioError> {
    Ok(Command::Jump {
        target_label: input.required_arg(1, "a target label")?,
        location: input.location.clone(),
    })
}

fn build_choice(input: &RowInput<'_>) -> Result<Command, ScenarioError> {
    let targets = input
        .header
        .arg_columns()
        .into_iter()
        .map(|(_, index)| input.row.cell(index).trim())
        .filter(|target| !target.is_empty())
        .collect::<Vec<_>>();
    let captions = if input.text().trim().is_empty() {
        Vec::new()
    } else {
        input
            .text()
            .split(CHOICE_CAPTION_SEPARATOR)
            .map(str::trim)
            .collect::<Vec<_>>()
    };

    if targets.is_empty() {
        return Err(ScenarioError::with_location(
            "COMPILE_CHOICE_EMPTY",
            "Choice requires at least one target label.",
            input.location.clone(),
        ));
    }
    if targets.len() != captions.len() {
        return Err(ScenarioError::with_location(
            "COMPILE_CHOICE_MISMATCH",
            format!(
                "Choice has {} target labels but {} captions.",
                targets.len(),
                captions.len()
            ),
            input.location.clone(),
        ));
    }

    Ok(Command::Choice {
        options: captions
            .into_iter()
            .zip(targets)
            .map(|(text, target)| ChoiceOption {
                text: text.to_string(),
                target_label: target.to_string(),
            })
            .collect(),
        location: input.location.clone(),
    })
}
