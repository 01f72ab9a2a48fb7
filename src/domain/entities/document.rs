use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::value_objects::{DocumentType, Identifier};

/// One physical file belonging to a publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: Identifier,
    publication_id: Identifier,
    document_type: DocumentType,
    download_url: Url,
    description: String,
    mime_type: String,
    charset: String,
    storage_url: Option<String>,
    file_size: Option<i64>,
    language: Option<String>,
    version: Option<String>,
}

impl Document {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Identifier,
        publication_id: Identifier,
        document_type: DocumentType,
        download_url: Url,
        description: String,
        mime_type: String,
        charset: String,
        language: Option<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            id,
            publication_id,
            document_type,
            download_url,
            description,
            mime_type,
            charset,
            storage_url: None,
            file_size: None,
            language,
            version,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn publication_id(&self) -> &Identifier {
        &self.publication_id
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn download_url(&self) -> &Url {
        &self.download_url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn storage_url(&self) -> Option<&str> {
        self.storage_url.as_deref()
    }

    pub fn file_size(&self) -> Option<i64> {
        self.file_size
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_stored(&self) -> bool {
        self.storage_url.is_some()
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case("application/pdf")
    }

    /// Records where the fetched file was uploaded. Only the first upload is accepted.
    pub fn record_storage(&mut self, storage_url: String, file_size: i64) -> Result<(), String> {
        if file_size < 0 {
            return Err("File size must not be negative".to_string());
        }
        if storage_url.trim().is_empty() {
            return Err("Storage URL must not be empty".to_string());
        }
        match &self.storage_url {
            Some(existing) if existing != &storage_url => Err(format!(
                "Document {} is already stored at {}",
                self.id, existing
            )),
            _ => {
                self.storage_url = Some(storage_url);
                self.file_size = Some(file_size);
                Ok(())
            }
        }
    }
}
