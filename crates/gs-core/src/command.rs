use serde::{Deserialize, Serialize};

use crate::types::CellLocation;

pub const OPCODE_TEXT: &str = "Text";
pub const OPCODE_CHARACTER: &str = "Character";
pub const OPCODE_JUMP: &str = "Jump";
pub const OPCODE_CHOICE: &str = "Choice";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Command {
    Text {
        text: String,
        location: CellLocation,
    },
    Character {
        character_id: String,
        is_hiding: bool,
        layer_name: String,
        text: Option<String>,
        location: CellLocation,
    },
    Jump {
        target_label: String,
        location: CellLocation,
    },
    Choice {
        options: Vec<ChoiceOption>,
        location: CellLocation,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub text: String,
    pub target_label: String,
}

impl Command {
    pub fn opcode(&self) -> &'static str {
        match self {
            Self::Text { .. } => OPCODE_TEXT,
            Self::Character { .. } => OPCODE_CHARACTER,
            Self::Jump { .. } => OPCODE_JUMP,
            Self::Choice { .. } => OPCODE_CHOICE,
        }
    }

    pub fn location(&self) -> &CellLocation {
        match self {
            Self::Text { location, .. }
            | Self::Character { location, .. }
            | Self::Jump { location, .. }
            | Self::Choice { location, .. } => location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub grid: String,
    pub commands: Vec<Command>,
}

impl Label {
    pub fn new(name: impl Into<String>, grid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grid: grid.into(),
            commands: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
