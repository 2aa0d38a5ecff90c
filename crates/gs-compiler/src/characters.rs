use std::collections::BTreeMap;

use gs_core::{CellLocation, CharacterSetting, Color, ScenarioError};
use gs_parser::{parse_grid, Grid, GridRow, HeaderMap};
use tracing::warn;

pub const CHARACTER_ID_COLUMN: &str = "Id";
pub const CHARACTER_NAME_COLUMN: &str = "Name";
pub const CHARACTER_POSITION_X_COLUMN: &str = "PositionX";
pub const CHARACTER_POSITION_Y_COLUMN: &str = "PositionY";
pub const CHARACTER_SCALE_COLUMN: &str = "Scale";
pub const CHARACTER_SPRITE_COLUMN: &str = "Sprite";
pub const CHARACTER_VOICE_COLUMN: &str = "Voice";
pub const CHARACTER_COLOR_COLUMN: &str = "Color";

const REQUIRED_COLUMNS: [&str; 6] = [
    CHARACTER_ID_COLUMN,
    CHARACTER_NAME_COLUMN,
    CHARACTER_POSITION_X_COLUMN,
    CHARACTER_POSITION_Y_COLUMN,
    CHARACTER_SCALE_COLUMN,
    CHARACTER_SPRITE_COLUMN,
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterTable {
    entries: BTreeMap<String, CharacterSetting>,
}

impl CharacterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&CharacterSetting> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, setting: CharacterSetting) -> Option<CharacterSetting> {
        self.entries.insert(setting.id.clone(), setting)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CharacterSetting> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn compile_character_table(name: &str, source: &str) -> Result<CharacterTable, ScenarioError> {
    compile_character_grid(&parse_grid(name, source))
}

fn compile_character_grid(grid: &Grid) -> Result<CharacterTable, ScenarioError> {
    let mut header: Option<HeaderMap> = None;
    let mut table = CharacterTable::new();

    for row in &grid.rows {
        if row.is_empty() || row.is_comment_out() {
            continue;
        }

        if header.is_none() {
            let candidate = HeaderMap::from_row(row);
            if candidate.contains_all(&REQUIRED_COLUMNS) {
                header = Some(candidate);
            }
            continue;
        }
        let Some(header) = header.as_ref() else {
            continue;
        };

        let location = CellLocation::row(grid.name.clone(), row.line());
        let setting = compile_setting(header, row, &location)?;
        if table.get(&setting.id).is_some() {
            return Err(ScenarioError::with_location(
                "COMPILE_DUPLICATE_CHARACTER",
                format!("Character \"{}\" is declared twice.", setting.id),
                location,
            ));
        }
        table.insert(setting);
    }

    if header.is_none() {
        return Err(ScenarioError::new(
            "COMPILE_CHARACTER_HEADER_MISSING",
            format!(
                "Character grid \"{}\" has no header with columns {}.",
                grid.name,
                REQUIRED_COLUMNS.join(",")
            ),
        ));
    }

    Ok(table)
}

fn compile_setting(
    header: &HeaderMap,
    row: &GridRow,
    location: &CellLocation,
) -> Result<CharacterSetting, ScenarioError> {
    let id = header.cell(row, CHARACTER_ID_COLUMN).trim();
    if id.is_empty() {
        return Err(ScenarioError::with_location(
            "COMPILE_CHARACTER_ID_MISSING",
            format!("Character row {} has no id.", location.line),
            location.clone(),
        ));
    }

    let voice_file = header.cell(row, CHARACTER_VOICE_COLUMN).trim();

    Ok(CharacterSetting {
        id: id.to_string(),
        display_name: header.cell(row, CHARACTER_NAME_COLUMN).trim().to_string(),
        position_x: parse_number(header, row, CHARACTER_POSITION_X_COLUMN, location)?,
        position_y: parse_number(header, row, CHARACTER_POSITION_Y_COLUMN, location)?,
        scale: parse_number(header, row, CHARACTER_SCALE_COLUMN, location)?,
        sprite_file: header.cell(row, CHARACTER_SPRITE_COLUMN).trim().to_string(),
        voice_file: (!voice_file.is_empty()).then(|| voice_file.to_string()),
        name_color: parse_color(header, row, location),
    })
}

fn parse_number(
    header: &HeaderMap,
    row: &GridRow,
    column: &str,
    location: &CellLocation,
) -> Result<f32, ScenarioError> {
    let raw = header.cell(row, column).trim();
    match raw.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => {
            let location = header
                .index(column)
                .map(|index| location.at_column(index))
                .unwrap_or_else(|| location.clone());
            Err(ScenarioError::with_location(
                "COMPILE_NUMBER_INVALID",
                format!("{} \"{}\" at {} is not a number.", column, raw, location),
                location,
            ))
        }
    }
}

/// Unlike the numeric fields, a bad color only degrades to the default.
fn parse_color(header: &HeaderMap, row: &GridRow, location: &CellLocation) -> Color {
    let raw = header.cell(row, CHARACTER_COLOR_COLUMN).trim();
    if raw.is_empty() {
        return Color::default();
    }
    Color::from_hex(raw).unwrap_or_else(|| {
        warn!(%location, color = raw, "invalid name color, using default");
        Color::default()
    })
}
