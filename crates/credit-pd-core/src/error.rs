use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreditPdError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown grade: {0}")]
    UnknownGrade(String),

    #[error("Invalid grade table: {0}")]
    InvalidGradeTable(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CreditPdError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CreditPdError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CreditPdError {
    fn from(e: serde_json::Error) -> Self {
        CreditPdError::SerializationError(e.to_string())
    }
}
