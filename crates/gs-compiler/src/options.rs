use serde::{Deserialize, Serialize};

pub const DEFAULT_LABEL_MARKER: &str = "Label";
pub const DEFAULT_HIDE_MARKER: &str = "On";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Opcode-column value that opens a new label; `Arg1` names the label.
    pub label_marker: String,
    /// `Character` hide-flag value that removes the layer instead of showing it.
    pub hide_marker: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            label_marker: DEFAULT_LABEL_MARKER.to_string(),
            hide_marker: DEFAULT_HIDE_MARKER.to_string(),
        }
    }
}
