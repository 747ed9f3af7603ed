use std::fmt;

use shared::domain::Summary;

pub mod cache;
pub mod controller;
pub mod error;
pub mod presentation;
pub mod sort;
pub mod store;

pub use cache::{SummaryCache, SummaryPatch};
pub use controller::{DeleteOutcome, EditOutcome, PendingDelete, SummaryController};
pub use error::{ClientError, StoreError};
pub use sort::{sort_summaries, SortDirection, SortField, SortOrder};
pub use store::{
    FileUpload, HttpStoreOptions, HttpSummaryStore, MissingSummaryStore, SummaryStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Reload,
    CreateFromFile,
    CreateFromText,
    Edit,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Reload => "reload",
            Operation::CreateFromFile => "create_from_file",
            Operation::CreateFromText => "create_from_text",
            Operation::Edit => "edit",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    SummariesChanged { count: usize },
    LoadingChanged(bool),
    SelectionChanged(Option<Summary>),
    OperationSucceeded(Operation),
    OperationFailed { operation: Operation, notice: String },
}
