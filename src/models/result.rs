use serde::{Deserialize, Serialize};

/// One row of the classification result table. `source` is a logical entry
/// (a literal file path or a `####` sequence placeholder); `destination` is
/// the absolute target path including the filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub source: String,
    pub destination: String,
    pub selected: bool,
}

impl ResultRow {
    pub fn new(source: &str, destination: &str) -> Self {
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            selected: false,
        }
    }
}
