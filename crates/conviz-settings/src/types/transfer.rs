use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;

/// What an import does when a record's id already exists in the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportConflictStrategy {
    /// Abort and roll back the whole import.
    #[default]
    Fail,
    /// Keep the stored record and drop the incoming one.
    Skip,
    /// Insert the incoming record under a freshly assigned id.
    Reassign,
}

impl ImportConflictStrategy {
    /// Lowercase name as used in settings and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Reassign => "reassign",
        }
    }
}

impl fmt::Display for ImportConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportConflictStrategy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            "reassign" => Ok(Self::Reassign),
            _ => Err(SettingsError::InvalidValue(format!(
                "unknown conflict strategy: {s}"
            ))),
        }
    }
}

/// Import settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportSettings {
    /// Conflict handling for ids that already exist.
    pub conflict_strategy: ImportConflictStrategy,
}

/// Export settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    /// Directory export files are written to.
    pub directory: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}
