use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

use crate::crypto::CryptoError;

/// Error reply published to the requester.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    #[serde(rename = "_error")]
    pub error: &'static str,
    /// Extra detail, only for errors the caller can act on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub const NOT_FOUND: &'static str = "Not found";
    pub const CONFLICT: &'static str = "Conflict";
    pub const UNEXPECTED: &'static str = "Unexpected error";

    pub fn not_found() -> Self {
        Self {
            error: Self::NOT_FOUND,
            message: None,
        }
    }

    pub fn unexpected() -> Self {
        Self {
            error: Self::UNEXPECTED,
            message: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Encryption error: {0}")]
    Encryption(#[from] CryptoError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Failed to encode reply: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl AppError {
    pub fn body(&self) -> ErrorBody {
        match self {
            AppError::NotFound(_) => ErrorBody::not_found(),
            AppError::Conflict(msg) => ErrorBody {
                error: ErrorBody::CONFLICT,
                message: Some(msg.clone()),
            },
            AppError::MalformedInput(_)
            | AppError::Encryption(_)
            | AppError::Database(_)
            | AppError::Encoding(_)
            | AppError::StorageUnavailable(_) => {
                tracing::error!("Internal error: {}", self);
                ErrorBody::unexpected()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
