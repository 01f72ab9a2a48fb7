use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};

use crate::domain::entities::Document;
use crate::domain::repositories::DocumentRepository;
use crate::domain::repositories::document_repository::DocumentRepositoryError;
use crate::domain::value_objects::Identifier;
use crate::infrastructure::database::models::{DocumentModel, NewDocumentModel};
use crate::infrastructure::database::schema::document;

pub struct PostgresDocumentRepository {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl PostgresDocumentRepository {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    fn get_connection(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<PgConnection>>, DocumentRepositoryError> {
        self.pool.get().map_err(|e| {
            DocumentRepositoryError::DatabaseError(format!(
                "Failed to get database connection: {}",
                e
            ))
        })
    }
}

fn to_domain(model: DocumentModel) -> Result<Document, DocumentRepositoryError> {
    Document::try_from(model).map_err(DocumentRepositoryError::ValidationError)
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn save(&self, record: &Document) -> Result<(), DocumentRepositoryError> {
        let new_document = NewDocumentModel::from(record);
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(document::table)
                .values(&new_document)
                .on_conflict(document::id)
                .do_nothing()
                .execute(&mut conn)
                .map_err(|e| {
                    DocumentRepositoryError::DatabaseError(format!("Failed to save document: {}", e))
                })
        })
        .await
        .map_err(|e| DocumentRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn find_by_id(&self, id: &Identifier) -> Result<Option<Document>, DocumentRepositoryError> {
        let id = id.as_string();
        let mut conn = self.get_connection()?;

        let result = tokio::task::spawn_blocking(move || {
            document::table
                .find(id)
                .select(DocumentModel::as_select())
                .first(&mut conn)
                .optional()
                .map_err(|e| {
                    DocumentRepositoryError::DatabaseError(format!("Failed to find document: {}", e))
                })
        })
        .await
        .map_err(|e| DocumentRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        result.map(to_domain).transpose()
    }

    async fn find_by_publication(
        &self,
        publication_id: &Identifier,
    ) -> Result<Vec<Document>, DocumentRepositoryError> {
        let publication_id = publication_id.as_string();
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            document::table
                .filter(document::publication_id.eq(publication_id))
                .order(document::id.asc())
                .select(DocumentModel::as_select())
                .load(&mut conn)
                .map_err(|e| {
                    DocumentRepositoryError::DatabaseError(format!(
                        "Failed to find documents by publication: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| DocumentRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        models.into_iter().map(to_domain).collect()
    }

    async fn update_storage(&self, record: &Document) -> Result<(), DocumentRepositoryError> {
        let id = record.id().clone();
        let storage_url = record.storage_url().map(str::to_string);
        let file_size = record.file_size();
        let mut conn = self.get_connection()?;

        let key = id.as_string();
        let updated = tokio::task::spawn_blocking(move || {
            diesel::update(document::table.find(key))
                .set((
                    document::storage_url.eq(storage_url),
                    document::file_size.eq(file_size),
                ))
                .execute(&mut conn)
                .map_err(|e| {
                    DocumentRepositoryError::DatabaseError(format!(
                        "Failed to update document storage: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| DocumentRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        if updated == 0 {
            return Err(DocumentRepositoryError::NotFound(id));
        }
        Ok(())
    }
}
