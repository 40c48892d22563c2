//! Service Responses and Faults

use sample_validator::{Field, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Acknowledgement kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseKind {
    Ack,
    Nack,
}

/// Session status reported with every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Response returned by every session operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub kind: ResponseKind,
    pub status: SessionStatus,
    pub message: String,
}

impl ServiceResponse {
    pub fn ack(status: SessionStatus, message: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Ack,
            status,
            message: message.into(),
        }
    }

    pub fn nack(status: SessionStatus, message: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Nack,
            status,
            message: message.into(),
        }
    }

    pub fn is_ack(&self) -> bool {
        self.kind == ResponseKind::Ack
    }
}

/// Structured fault surfaced to the caller
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "fault", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceFault {
    /// Structurally invalid input
    #[error("Data format error: {message}")]
    DataFormat {
        field: Option<Field>,
        message: String,
    },

    /// Well-formed input outside physical bounds
    #[error("Validation error: {message}")]
    Validation {
        field: Option<Field>,
        message: String,
    },
}

impl ServiceFault {
    pub fn message(&self) -> &str {
        match self {
            ServiceFault::DataFormat { message, .. } | ServiceFault::Validation { message, .. } => {
                message
            }
        }
    }

    pub fn field(&self) -> Option<Field> {
        match self {
            ServiceFault::DataFormat { field, .. } | ServiceFault::Validation { field, .. } => *field,
        }
    }
}

impl From<ValidationError> for ServiceFault {
    fn from(err: ValidationError) -> Self {
        let field = err.field();
        let message = err.to_string();
        if err.is_format_error() {
            ServiceFault::DataFormat { field, message }
        } else {
            ServiceFault::Validation { field, message }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_classification() {
        let fault = ServiceFault::from(ValidationError::MissingField(Field::Time));
        assert!(matches!(fault, ServiceFault::DataFormat { field: Some(Field::Time), .. }));

        let fault = ServiceFault::from(ValidationError::NonFinite(Field::WindSpeed));
        assert!(matches!(fault, ServiceFault::Validation { .. }));
        assert_eq!(fault.message(), "WindSpeed is not a valid numeric value");
    }

    #[test]
    fn test_wire_format() {
        let response = ServiceResponse::nack(SessionStatus::Completed, "No active session");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["kind"], "NACK");
        assert_eq!(json["status"], "COMPLETED");

        let fault = ServiceFault::from(ValidationError::MissingSample);
        let json = serde_json::to_value(&fault).unwrap();
        assert_eq!(json["fault"], "DATA_FORMAT");
        assert_eq!(json["message"], "Sample is missing");
    }
}
