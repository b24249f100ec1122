use crate::dto::{
    reply, ApiResponse, RESPONSE_BAD_REQUEST, RESPONSE_FORBIDDEN, RESPONSE_INTERNAL_ERROR,
    RESPONSE_NOT_FOUND, RESPONSE_UNAUTHORIZED,
};
use rocket::serde::Serialize;
use sea_orm::DbErr;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Db(#[from] DbErr),

    #[error("Unknown ledger '{0}', expected dues or pension")]
    UnknownKind(String),

    #[error("Invalid month '{0}'")]
    InvalidMonth(String),

    #[error("Invalid year {0}")]
    InvalidYear(i32),

    #[error("Range start {from} is after range end {to}")]
    InvalidRange { from: String, to: String },

    #[error("Ledger entry {0} kept changing while being toggled")]
    Contended(i32),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authorization header missing")]
    Missing,

    #[error("Authorization header is not a bearer token")]
    Malformed,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    Expired,

    #[error("Administrator access required")]
    Forbidden,

    #[error("Signing key error: {0}")]
    Key(String),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let messages: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("{}: {}", field.field, field.message))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8")]
    Encoding,
}

/// Everything a route can fail with.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),
}

impl ApiError {
    pub fn code(&self) -> u16 {
        match self {
            ApiError::Ledger(LedgerError::Db(_)) | ApiError::Ledger(LedgerError::Contended(_)) => {
                RESPONSE_INTERNAL_ERROR
            }
            ApiError::Ledger(_) => RESPONSE_BAD_REQUEST,
            ApiError::Auth(AuthError::Forbidden) => RESPONSE_FORBIDDEN,
            ApiError::Auth(AuthError::Missing)
            | ApiError::Auth(AuthError::Malformed)
            | ApiError::Auth(AuthError::InvalidToken)
            | ApiError::Auth(AuthError::Expired)
            | ApiError::Unauthorized(_) => RESPONSE_UNAUTHORIZED,
            ApiError::Auth(_) => RESPONSE_INTERNAL_ERROR,
            ApiError::Validation(_) | ApiError::Conflict(_) => RESPONSE_BAD_REQUEST,
            ApiError::NotFound(_) => RESPONSE_NOT_FOUND,
            ApiError::Export(_) | ApiError::Db(_) => RESPONSE_INTERNAL_ERROR,
        }
    }

    /// Message safe to hand back to the caller. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        if self.code() == RESPONSE_INTERNAL_ERROR {
            String::from("System error. Please contact administrator!")
        } else {
            self.to_string()
        }
    }

    pub fn reply<T>(self) -> ApiResponse<T> {
        let code = self.code();
        if code == RESPONSE_INTERNAL_ERROR {
            error!("Request failed: {:?}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        reply(code, self.public_message(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_failures_are_hidden_from_callers() {
        let error = ApiError::from(LedgerError::Db(DbErr::Custom("relation missing".into())));
        assert_eq!(error.code(), RESPONSE_INTERNAL_ERROR);
        assert!(!error.public_message().contains("relation missing"));
    }

    #[test]
    fn validation_errors_list_every_field() {
        let mut validation = ValidationError::default();
        validation.push("sccn", "SCCN must be exactly 12 digits");
        validation.push("last_name", "Last name is required");

        assert!(validation.has("sccn"));
        let error = ApiError::from(validation);
        assert_eq!(error.code(), RESPONSE_BAD_REQUEST);
        assert_eq!(
            error.public_message(),
            "sccn: SCCN must be exactly 12 digits; last_name: Last name is required"
        );
    }

    #[test]
    fn forbidden_and_unauthorized_are_distinct() {
        assert_eq!(ApiError::from(AuthError::Forbidden).code(), RESPONSE_FORBIDDEN);
        assert_eq!(ApiError::from(AuthError::Expired).code(), RESPONSE_UNAUTHORIZED);
    }
}
