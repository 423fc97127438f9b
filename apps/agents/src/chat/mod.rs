//! Restaurant assistant: menu search and reservation management driven by a
//! single planned action per message.

pub mod assistant;
pub mod handlers;
pub mod menu;
pub mod prompts;
pub mod reservations;

use thiserror::Error;

use crate::storage::{StorageError, TableRef};

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub reservations: TableRef,
    /// Bucket holding the menu documents.
    pub bucket: String,
    pub menu_prefix: String,
    pub max_tokens: u32,
}

/// Failures of the assistant's tools. The assistant turns these into replies;
/// they never reach the caller as HTTP errors.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No reservation found with ID: {0}")]
    ReservationNotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
impl ChatSettings {
    pub fn for_tests() -> Self {
        Self {
            reservations: TableRef::new("reservations", "reservation_id"),
            bucket: "restaurant".to_string(),
            menu_prefix: "menu/".to_string(),
            max_tokens: 1024,
        }
    }
}
