use diesel::prelude::*;
use url::Url;

use crate::domain::entities::Document;
use crate::domain::value_objects::{DocumentType, Identifier};
use crate::infrastructure::database::schema::document;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = document)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentModel {
    pub id: String,
    pub publication_id: String,
    pub document_type: String,
    pub download_url: String,
    pub description: String,
    pub mime_type: String,
    pub charset: String,
    pub storage_url: Option<String>,
    pub file_size: Option<i64>,
    pub language: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = document)]
pub struct NewDocumentModel {
    pub id: String,
    pub publication_id: String,
    pub document_type: String,
    pub download_url: String,
    pub description: String,
    pub mime_type: String,
    pub charset: String,
    pub storage_url: Option<String>,
    pub file_size: Option<i64>,
    pub language: Option<String>,
    pub version: Option<String>,
}

impl From<&Document> for NewDocumentModel {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id().as_string(),
            publication_id: document.publication_id().as_string(),
            document_type: document.document_type().as_str().to_string(),
            download_url: document.download_url().to_string(),
            description: document.description().to_string(),
            mime_type: document.mime_type().to_string(),
            charset: document.charset().to_string(),
            storage_url: document.storage_url().map(str::to_string),
            file_size: document.file_size(),
            language: document.language().map(str::to_string),
            version: document.version().map(str::to_string),
        }
    }
}

impl TryFrom<DocumentModel> for Document {
    type Error = String;

    fn try_from(model: DocumentModel) -> Result<Self, Self::Error> {
        let id = Identifier::parse(&model.id).map_err(|e| e.to_string())?;
        let publication_id = Identifier::parse(&model.publication_id).map_err(|e| e.to_string())?;
        let document_type: DocumentType = model.document_type.parse()?;
        let download_url = Url::parse(&model.download_url)
            .map_err(|e| format!("Invalid download URL for {}: {}", model.id, e))?;

        let mut document = Document::new(
            id,
            publication_id,
            document_type,
            download_url,
            model.description,
            model.mime_type,
            model.charset,
            model.language,
            model.version,
        );
        if let (Some(storage_url), Some(file_size)) = (model.storage_url, model.file_size) {
            document.record_storage(storage_url, file_size)?;
        }
        Ok(document)
    }
}
