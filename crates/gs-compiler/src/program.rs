use std::collections::BTreeMap;

use gs_core::{CellLocation, Command, Label, ScenarioError};
use gs_parser::{looks_like_header, parse_grid, Grid, HeaderMap, COMMAND_COLUMN};
use tracing::{debug, warn};

use crate::factory::{CommandFactory, RowInput};
use crate::options::CompileOptions;

/// Every label of every loaded grid, addressed by its globally unique name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioProgram {
    labels: BTreeMap<String, Label>,
}

impl ScenarioProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&self, name: &str) -> Option<&Label> {
        self.labels.get(name)
    }

    pub fn commands(&self, name: &str) -> &[Command] {
        self.labels
            .get(name)
            .map(|label| label.commands.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_label(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn insert_label(&mut self, label: Label, location: &CellLocation) -> Result<(), ScenarioError> {
        if let Some(existing) = self.labels.get(&label.name) {
            return Err(ScenarioError::with_location(
                "COMPILE_DUPLICATE_LABEL",
                format!(
                    "Label \"{}\" in grid \"{}\" is already declared in grid \"{}\".",
                    label.name, label.grid, existing.grid
                ),
                location.clone(),
            ));
        }
        self.labels.insert(label.name.clone(), label);
        Ok(())
    }
}

pub fn compile_scenario_program(
    grids: &BTreeMap<String, String>,
    options: &CompileOptions,
) -> Result<ScenarioProgram, ScenarioError> {
    compile_scenario_program_with(grids, &CommandFactory::with_builtins(), options)
}

pub fn compile_scenario_program_with(
    grids: &BTreeMap<String, String>,
    factory: &CommandFactory,
    options: &CompileOptions,
) -> Result<ScenarioProgram, ScenarioError> {
    let mut program = ScenarioProgram::new();
    for (name, source) in grids {
        let grid = parse_grid(name.clone(), source);
        compile_grid(&grid, factory, options, &mut program)?;
    }
    debug!(labels = program.len(), "compiled scenario program");
    Ok(program)
}

/// Compiles one grid into `program`, failing on the first bad row.
pub fn compile_grid(
    grid: &Grid,
    factory: &CommandFactory,
    options: &CompileOptions,
    program: &mut ScenarioProgram,
) -> Result<(), ScenarioError> {
    let mut header: Option<HeaderMap> = None;
    let mut current: Option<(Label, CellLocation)> = None;

    for row in &grid.rows {
        if row.is_empty() || row.is_comment_out() {
            continue;
        }

        if looks_like_header(row) {
            header = Some(HeaderMap::from_row(row));
            continue;
        }

        let Some(header) = header.as_ref() else {
            debug!(grid = %grid.name, line = row.line(), "skipping row before header");
            continue;
        };

        let location = CellLocation::row(grid.name.clone(), row.line());
        let opcode = header.cell(row, COMMAND_COLUMN).trim();

        if opcode == options.label_marker {
            let name = header.arg(row, 1).trim();
            if name.is_empty() {
                return Err(ScenarioError::with_location(
                    "COMPILE_LABEL_NAME_MISSING",
                    format!(
                        "Label row {} in grid \"{}\" has no name in Arg1.",
                        row.line(),
                        grid.name
                    ),
                    location,
                ));
            }
            if let Some((label, label_location)) = current.take() {
                program.insert_label(label, &label_location)?;
            }
            current = Some((Label::new(name, grid.name.clone()), location));
            continue;
        }

        let input = RowInput {
            header,
            row,
            location: &location,
            options,
        };
        let command = factory.build(opcode, &input)?;

        let Some((label, _)) = current.as_mut() else {
            return Err(ScenarioError::with_location(
                "COMPILE_COMMAND_OUTSIDE_LABEL",
                format!(
                    "Command \"{}\" at row {} in grid \"{}\" precedes any label.",
                    command.opcode(),
                    row.line(),
                    grid.name
                ),
                location,
            ));
        };
        label.commands.push(command);
    }

    if header.is_none() {
        warn!(grid = %grid.name, "grid has no header row; nothing compiled");
    }

    if let Some((label, label_location)) = current.take() {
        program.insert_label(label, &label_location)?;
    }
    Ok(())
}
