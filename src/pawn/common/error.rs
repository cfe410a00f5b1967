use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
/// Global error type for the tiebreak engine.
///
/// **Note** that [`serde::Serialize`] is manually implemented for this enum, so
/// the output data might be different from what you expected.
pub enum PawnError {
    #[error(transparent)]
    /// Represents filesystem related errors surfaced by the CLI.
    Io(#[from] std::io::Error),

    #[error(transparent)]
    /// Represents serde's serialization/deserialization errors.
    SerdeError(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    /// Represents a malformed request shape (missing tournament, unknown service, etc).
    InvalidInput(String),

    #[error("Not found: {0}")]
    /// Represents a lookup miss for a tournament or competitor.
    NotFound(String),

    #[error("Business logic error: {0}")]
    /// Represents an internal invariant the engine chooses to surface.
    BusinessLogic(String),
}

#[derive(Serialize)]
#[serde(tag = "kind")]
#[serde(rename_all = "camelCase")]
enum PawnErrorKind {
    Io { message: String, details: String },
    SerdeError { message: String, details: String },
    InvalidInput { message: String, details: String },
    NotFound { message: String, details: String },
    BusinessLogic { message: String, details: String },
}

impl Serialize for PawnError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let error_message = self.to_string();
        let error_kind = match self {
            Self::Io(_) => PawnErrorKind::Io {
                message: "Filesystem IO error".to_string(),
                details: error_message,
            },
            Self::SerdeError(_) => PawnErrorKind::SerdeError {
                message: "Serde serialization error".to_string(),
                details: error_message,
            },
            Self::InvalidInput(_) => PawnErrorKind::InvalidInput {
                message: "Invalid input provided".to_string(),
                details: error_message,
            },
            Self::NotFound(_) => PawnErrorKind::NotFound {
                message: "Resource not found".to_string(),
                details: error_message,
            },
            Self::BusinessLogic(_) => PawnErrorKind::BusinessLogic {
                message: "Business logic violation".to_string(),
                details: error_message,
            },
        };
        error_kind.serialize(serializer)
    }
}
