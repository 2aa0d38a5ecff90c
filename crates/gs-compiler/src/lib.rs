mod characters;
mod factory;
mod options;
mod program;

pub use characters::{
    compile_character_table, CharacterTable, CHARACTER_COLOR_COLUMN, CHARACTER_ID_COLUMN,
    CHARACTER_NAME_COLUMN, CHARACTER_POSITION_X_COLUMN, CHARACTER_POSITION_Y_COLUMN,
    CHARACTER_SCALE_COLUMN, CHARACTER_SPRITE_COLUMN, CHARACTER_VOICE_COLUMN,
};
pub use factory::{CommandConstructor, CommandFactory, RowInput, CHOICE_CAPTION_SEPARATOR};
pub use options::{CompileOptions, DEFAULT_HIDE_MARKER, DEFAULT_LABEL_MARKER};
pub use program::{
    compile_grid, compile_scenario_program, compile_scenario_program_with, ScenarioProgram,
};
