use serde::{Deserialize, Serialize};

/// One row of the bulk scanner's persisted JSON array. Field names are
/// capitalized in the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanRecord {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "File")]
    pub file: String,
}

impl ScanRecord {
    pub fn new(path: &str, file: &str) -> Self {
        Self {
            path: path.to_string(),
            file: file.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveMode {
    Overwrite,
    Append,
}

impl std::fmt::Display for SaveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::Append => write!(f, "append"),
        }
    }
}

impl std::str::FromStr for SaveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            _ => Err(format!("unknown save mode: {s}")),
        }
    }
}
