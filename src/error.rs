// ⚠️ Error kinds for the inventory core
//
// Every failure the registry or the gateway can report is one of four kinds.
// None of them is fatal: the shell prints the error and returns to the menu.

use std::path::PathBuf;
use thiserror::Error;

use crate::vehicle::VehicleId;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

/// A field failed one of the record invariants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending field (`year`, `make`, `model`, `price`, `id`)
    pub field: String,
    /// The constraint that was violated
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// INVENTORY ERROR
// ============================================================================

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("invalid {0}")]
    Validation(#[from] ValidationError),

    #[error("no vehicle with id {id}")]
    NotFound { id: VehicleId },

    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },
}

impl InventoryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InventoryError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(line: u64, message: impl Into<String>) -> Self {
        InventoryError::Parse {
            line,
            message: message.into(),
        }
    }

    /// The field name when this is a validation failure
    pub fn field(&self) -> Option<&str> {
        match self {
            InventoryError::Validation(err) => Some(err.field.as_str()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;
