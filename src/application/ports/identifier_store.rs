use async_trait::async_trait;

use crate::domain::value_objects::IdentifierTable;

#[derive(Debug)]
pub enum IdentifierStoreError {
    IoError(String),
    Corrupt(String),
}

impl std::fmt::Display for IdentifierStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierStoreError::IoError(msg) => write!(f, "IO error: {}", msg),
            IdentifierStoreError::Corrupt(msg) => write!(f, "Corrupt identifier table: {}", msg),
        }
    }
}

impl std::error::Error for IdentifierStoreError {}

/// Durable home of the catalog identifier table.
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    /// A missing table loads as empty.
    async fn load(&self) -> Result<IdentifierTable, IdentifierStoreError>;
    async fn save(&self, table: &IdentifierTable) -> Result<(), IdentifierStoreError>;
}
