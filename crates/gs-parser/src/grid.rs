use std::sync::OnceLock;

pub const FIELD_DELIMITER: char = ',';
pub const COMMENT_MARKER: &str = "//";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// One raw row of a grid. Cells are split on [`FIELD_DELIMITER`] with no
/// quoting, so a cell can never contain the delimiter itself.
#[derive(Debug, Clone)]
pub struct GridRow {
    cells: Vec<String>,
    line: usize,
    empty: OnceLock<bool>,
    comment_out: OnceLock<bool>,
}

impl GridRow {
    pub fn parse(raw_line: &str, line: usize) -> Self {
        let raw_line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        Self::from_cells(raw_line.split(FIELD_DELIMITER).map(str::to_string), line)
    }

    pub fn from_cells(cells: impl IntoIterator<Item = String>, line: usize) -> Self {
        Self {
            cells: cells.into_iter().collect(),
            line,
            empty: OnceLock::new(),
            comment_out: OnceLock::new(),
        }
    }

    /// Out-of-range access yields an empty string.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn is_empty(&self) -> bool {
        *self
            .empty
            .get_or_init(|| self.cells.iter().all(|cell| cell.trim().is_empty()))
    }

    pub fn is_comment_out(&self) -> bool {
        *self
            .comment_out
            .get_or_init(|| self.cell(0).starts_with(COMMENT_MARKER))
    }
}

impl PartialEq for GridRow {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells && self.line == other.line
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub name: String,
    pub rows: Vec<GridRow>,
}

/// Splits `source` into rows. A leading byte-order mark is dropped.
pub fn parse_grid(name: impl Into<String>, source: &str) -> Grid {
    let source = source.strip_prefix(BYTE_ORDER_MARK).unwrap_or(source);
    let rows = source
        .lines()
        .enumerate()
        .map(|(index, line)| GridRow::parse(line, index + 1))
        .collect();
    Grid {
        name: name.into(),
        rows,
    }
}
