use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a row (and optionally a cell) inside a named grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellLocation {
    pub grid: String,
    /// 1-based source line.
    pub line: usize,
    /// 0-based column index, when the error concerns a single cell.
    pub column: Option<usize>,
}

impl CellLocation {
    pub fn row(grid: impl Into<String>, line: usize) -> Self {
        Self {
            grid: grid.into(),
            line,
            column: None,
        }
    }

    pub fn cell(grid: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            grid: grid.into(),
            line,
            column: Some(column),
        }
    }

    pub fn at_column(&self, column: usize) -> Self {
        Self {
            grid: self.grid.clone(),
            line: self.line,
            column: Some(column),
        }
    }
}

impl fmt::Display for CellLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{}:{}", self.grid, self.line, column + 1),
            None => write!(f, "{}:{}", self.grid, self.line),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    /// Parses `#RRGGBB` or `#RRGGBBAA`; the leading `#` is optional.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let channel = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16).ok();
        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: alpha,
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02X}{:02X}{:02X}{:02X}",
            self.r, self.g, self.b, self.a
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSetting {
    pub id: String,
    pub display_name: String,
    pub position_x: f32,
    pub position_y: f32,
    pub scale: f32,
    pub sprite_file: String,
    pub voice_file: Option<String>,
    pub name_color: Color,
}

/// Who a displayed line is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Speaker<'a> {
    pub name: &'a str,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionItem {
    pub index: usize,
    pub text: String,
}
