//! Error types shared by the inventory crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error kinds for inventory loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InventoryErrorKind {
    /// The plugin config file is missing, unreadable or malformed.
    Config,
    /// An external executable could not be started.
    Launch,
    /// An external executable exited with a non-zero status.
    Exit,
    /// Output was not valid UTF-8.
    Decode,
    /// Output was not valid JSON.
    Parse,
    /// JSON was valid but not shaped like an inventory document.
    Structure,
    /// Local filesystem failure (temp script creation, permissions).
    Io,
    /// An external executable did not finish within the configured timeout.
    Timeout,
}

/// Inventory loading error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryError {
    pub kind: InventoryErrorKind,
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(ref d) = self.details {
            write!(f, "\n{}", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for InventoryError {}

impl InventoryError {
    pub fn new(kind: InventoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        kind: InventoryErrorKind,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(InventoryErrorKind::Config, message)
    }

    pub fn launch(program: &str, cause: impl fmt::Display) -> Self {
        Self::new(
            InventoryErrorKind::Launch,
            format!("problem running {} ({})", program, cause),
        )
    }

    /// Non-zero exit of the inventory script; `stderr` is embedded in the message.
    pub fn exit(source: &str, stderr: &str) -> Self {
        let mut err = stderr.to_string();
        if !err.is_empty() && !err.ends_with('\n') {
            err.push('\n');
        }
        Self::new(
            InventoryErrorKind::Exit,
            format!(
                "Inventory script ({}) had an execution error: {}",
                source, err
            ),
        )
    }

    pub fn decode(source: &str, cause: impl fmt::Display) -> Self {
        Self::new(
            InventoryErrorKind::Decode,
            format!(
                "Inventory {} contained characters that cannot be interpreted as UTF-8: {}",
                source, cause
            ),
        )
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(InventoryErrorKind::Parse, message)
    }

    pub fn structure(message: impl Into<String>) -> Self {
        Self::new(InventoryErrorKind::Structure, message)
    }

    pub fn io(context: &str, cause: impl fmt::Display) -> Self {
        Self::new(InventoryErrorKind::Io, format!("{}: {}", context, cause))
    }

    pub fn timeout(program: &str, seconds: u64) -> Self {
        Self::new(
            InventoryErrorKind::Timeout,
            format!("{} did not finish within {}s", program, seconds),
        )
    }
}

/// Convert an `InventoryError` into a plain `String`.
impl From<InventoryError> for String {
    fn from(e: InventoryError) -> String {
        e.to_string()
    }
}

/// Convenience alias.
pub type InventoryResult<T> = Result<T, InventoryError>;
