use std::collections::HashMap;

use crate::grid::GridRow;

pub const COMMAND_COLUMN: &str = "Command";
pub const TEXT_COLUMN: &str = "Text";
pub const ARG_COLUMN_PREFIX: &str = "Arg";

/// Column name to index mapping taken from a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn from_row(row: &GridRow) -> Self {
        let mut columns = HashMap::new();
        for (index, cell) in row.cells().iter().enumerate() {
            let name = cell.trim();
            if name.is_empty() {
                continue;
            }
            columns.entry(name.to_string()).or_insert(index);
        }
        Self { columns }
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn contains_all(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.columns.contains_key(*name))
    }

    /// Cell under `name`, or `""` when the column is not declared.
    pub fn cell<'r>(&self, row: &'r GridRow, name: &str) -> &'r str {
        match self.index(name) {
            Some(index) => row.cell(index),
            None => "",
        }
    }

    /// `Arg<n>` cell, 1-based like the column names.
    pub fn arg<'r>(&self, row: &'r GridRow, n: usize) -> &'r str {
        self.cell(row, &format!("{}{}", ARG_COLUMN_PREFIX, n))
    }

    /// Declared `Arg<n>` columns as `(n, index)`, ordered by `n`.
    pub fn arg_columns(&self) -> Vec<(usize, usize)> {
        let mut args = self
            .columns
            .iter()
            .filter_map(|(name, index)| {
                let n = name.strip_prefix(ARG_COLUMN_PREFIX)?.parse::<usize>().ok()?;
                Some((n, *index))
            })
            .collect::<Vec<_>>();
        args.sort_unstable();
        args
    }
}

/// A scenario header names the opcode column, the text column and at least one
/// argument column.
pub fn looks_like_header(row: &GridRow) -> bool {
    if row.is_comment_out() {
        return false;
    }
    let header = HeaderMap::from_row(row);
    header.contains_all(&[COMMAND_COLUMN, TEXT_COLUMN]) && !header.arg_columns().is_empty()
}
