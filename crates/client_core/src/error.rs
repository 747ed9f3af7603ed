//! Error types for the summary store adapter and the lifecycle controller.

use shared::domain::SummaryId;
use thiserror::Error;

use crate::Operation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("summary store request failed: {0}")]
    Transport(String),
    #[error("summary store rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("summary store reported an unsuccessful {operation}: {message}")]
    Unsuccessful {
        operation: &'static str,
        message: String,
    },
    #[error("summary {0} not found in store")]
    NotFound(SummaryId),
    #[error("invalid response from summary store: {0}")]
    InvalidResponse(String),
    #[error("invalid summary store base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("summary store is unavailable")]
    Unavailable,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Failure came from the network path rather than from a server verdict.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            StoreError::Transport(_) | StoreError::InvalidResponse(_) | StoreError::Unavailable
        )
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            StoreError::InvalidResponse(value.to_string())
        } else {
            StoreError::Transport(value.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{operation} failed: {source}")]
    Store {
        operation: Operation,
        #[source]
        source: StoreError,
    },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("no pending delete confirmation with token {0}")]
    UnknownConfirmation(u64),
}

impl ClientError {
    pub fn store(operation: Operation, source: StoreError) -> Self {
        ClientError::Store { operation, source }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            ClientError::Store { operation, .. } => Some(*operation),
            ClientError::Validation(_) | ClientError::UnknownConfirmation(_) => None,
        }
    }

    /// Non-fatal text shown to the user. Every failure here is retryable.
    pub fn notice(&self) -> String {
        match self {
            ClientError::Store { operation, source } => failure_notice(*operation, source),
            ClientError::Validation(message) => message.clone(),
            ClientError::UnknownConfirmation(_) => {
                "This delete request has expired. Please try again.".to_string()
            }
        }
    }
}

fn failure_notice(operation: Operation, source: &StoreError) -> String {
    match (operation, source.is_transport()) {
        (Operation::Delete, false) => "Failed to delete summary. Please try again.".to_string(),
        (Operation::Delete, true) => "An error occurred while deleting the summary.".to_string(),
        (Operation::Reload, _) => "Could not load summaries. Please try again.".to_string(),
        (Operation::CreateFromFile, _) => {
            "Failed to create a summary from the uploaded file. Please try again.".to_string()
        }
        (Operation::CreateFromText, _) => {
            "Failed to create a summary from the pasted text. Please try again.".to_string()
        }
        (Operation::Edit, _) => "Failed to save summary changes. Please try again.".to_string(),
    }
}
