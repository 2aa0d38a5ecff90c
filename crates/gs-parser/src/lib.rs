mod grid;
mod header;

pub use grid::{parse_grid, Grid, GridRow, COMMENT_MARKER, FIELD_DELIMITER};
pub use header::{looks_like_header, HeaderMap, ARG_COLUMN_PREFIX, COMMAND_COLUMN, TEXT_COLUMN};
