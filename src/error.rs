//! Error handling utilities for the crate
use std::time::Duration;

use thiserror::Error;

use reqwest::Error as ReqwestError;

/// All errors raised by this crate will be instances of UploaderError
#[derive(Error, Debug)]
pub enum UploaderError {
    #[error("File is too large ({size} bytes), the maximum is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("No file selected")]
    NoFileSelected,
    #[error("An upload is already in progress")]
    UploadInProgress,
    #[error("The uploader has been torn down")]
    TornDown,
    #[error("Internal HTTP error: {0}")]
    HttpError(#[from] ReqwestError),
    #[error("Upload failed with status {0}: {1}")]
    UnexpectedStatus(u16, String),
    #[error("Malformed response from the upload API: {0}")]
    MalformedResponse(String),
    #[error("Upload timed out after {0:?}")]
    Timeout(Duration),
    #[error("Upload was cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl UploaderError {
    pub fn unexpected_status(status_code: reqwest::StatusCode) -> Self {
        UploaderError::UnexpectedStatus(
            status_code.as_u16(),
            status_code
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
        )
    }

    pub fn invalid_config(name: &str, value: &str) -> Self {
        UploaderError::InvalidConfig(format!("{} has an invalid value '{}'", name, value))
    }
}

pub(crate) type Result<T> = std::result::Result<T, UploaderError>;
