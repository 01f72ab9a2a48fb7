use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use crate::application::ports::identifier_store::{IdentifierStore, IdentifierStoreError};
use crate::domain::value_objects::IdentifierTable;

/// Identifier table persisted as a single JSON file next to the corpus.
pub struct JsonIdentifierStore {
    path: PathBuf,
}

impl JsonIdentifierStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl IdentifierStore for JsonIdentifierStore {
    async fn load(&self) -> Result<IdentifierTable, IdentifierStoreError> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(IdentifierTable::default());
            }
            Err(e) => return Err(IdentifierStoreError::IoError(e.to_string())),
        };

        serde_json::from_str(&json).map_err(|e| IdentifierStoreError::Corrupt(e.to_string()))
    }

    async fn save(&self, table: &IdentifierTable) -> Result<(), IdentifierStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| IdentifierStoreError::IoError(e.to_string()))?;
        }

        let json = serde_json::to_vec_pretty(table)
            .map_err(|e| IdentifierStoreError::Corrupt(e.to_string()))?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)
            .await
            .map_err(|e| IdentifierStoreError::IoError(e.to_string()))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|e| IdentifierStoreError::IoError(e.to_string()))
    }
}
