use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ports::IdentifierStore;
use crate::domain::value_objects::{EntityKind, Identifier, IdentifierError, IdentifierTable};

#[derive(Debug)]
pub enum IdentifierServiceError {
    Allocation(IdentifierError),
    StoreError(String),
}

impl std::fmt::Display for IdentifierServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierServiceError::Allocation(err) => write!(f, "Allocation error: {}", err),
            IdentifierServiceError::StoreError(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl std::error::Error for IdentifierServiceError {}

impl From<IdentifierError> for IdentifierServiceError {
    fn from(err: IdentifierError) -> Self {
        IdentifierServiceError::Allocation(err)
    }
}

/// Serializes catalog identifier allocation and writes the table back after every change.
pub struct IdentifierService {
    store: Arc<dyn IdentifierStore>,
    table: Mutex<IdentifierTable>,
}

impl IdentifierService {
    pub async fn load(store: Arc<dyn IdentifierStore>) -> Result<Self, IdentifierServiceError> {
        let table = store
            .load()
            .await
            .map_err(|e| IdentifierServiceError::StoreError(e.to_string()))?;
        table.verify()?;
        debug!("Loaded identifier table with {} entries", table.len());

        Ok(Self {
            store,
            table: Mutex::new(table),
        })
    }

    pub async fn allocate(
        &self,
        kind: EntityKind,
        natural_key: &str,
    ) -> Result<Identifier, IdentifierServiceError> {
        let mut allocated = self.allocate_all(&[(kind, natural_key)]).await?;
        allocated
            .pop()
            .ok_or_else(|| IdentifierServiceError::StoreError("nothing allocated".to_string()))
    }

    /// Allocates several identifiers under one lock and one table write.
    ///
    /// The table is only replaced once every allocation has succeeded.
    pub async fn allocate_all(
        &self,
        requests: &[(EntityKind, &str)],
    ) -> Result<Vec<Identifier>, IdentifierServiceError> {
        let mut table = self.table.lock().await;
        let before = table.len();

        let mut working = table.clone();
        let allocated = requests
            .iter()
            .map(|(kind, key)| working.allocate(*kind, key))
            .collect::<Result<Vec<_>, _>>()?;

        if working.len() != before {
            self.store
                .save(&working)
                .await
                .map_err(|e| IdentifierServiceError::StoreError(e.to_string()))?;
            *table = working;
        }

        Ok(allocated)
    }

    pub async fn lookup(&self, kind: EntityKind, natural_key: &str) -> Option<Identifier> {
        self.table.lock().await.lookup(kind, natural_key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryIdentifierStore;

    #[tokio::test]
    async fn test_same_key_same_identifier() {
        let store = Arc::new(InMemoryIdentifierStore::default());
        let service = IdentifierService::load(store.clone()).await.unwrap();

        let first = service
            .allocate(EntityKind::Publication, "https://example.org/a")
            .await
            .unwrap();
        let again = service
            .allocate(EntityKind::Publication, "https://example.org/a")
            .await
            .unwrap();
        let second = service
            .allocate(EntityKind::Publication, "https://example.org/b")
            .await
            .unwrap();

        assert_eq!(first.to_string(), "pub_001");
        assert_eq!(first, again);
        assert_eq!(second.to_string(), "pub_002");
        assert_eq!(store.saves(), 2);
    }

    #[tokio::test]
    async fn test_table_survives_reload() {
        let store = Arc::new(InMemoryIdentifierStore::default());
        {
            let service = IdentifierService::load(store.clone()).await.unwrap();
            service
                .allocate_all(&[
                    (EntityKind::Document, "https://example.org/a.pdf"),
                    (EntityKind::Document, "https://example.org/b.pdf"),
                ])
                .await
                .unwrap();
        }

        let reloaded = IdentifierService::load(store).await.unwrap();
        let b = reloaded
            .lookup(EntityKind::Document, "https://example.org/b.pdf")
            .await
            .unwrap();
        assert_eq!(b.to_string(), "doc_002");
        let c = reloaded
            .allocate(EntityKind::Document, "https://example.org/c.pdf")
            .await
            .unwrap();
        assert_eq!(c.to_string(), "doc_003");
    }
}
