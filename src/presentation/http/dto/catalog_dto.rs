use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::application::use_cases::get_publication::ListPublicationsResponse;
use crate::application::use_cases::register_publication::{
    RegisterDocumentRequest, RegisterPublicationRequest, RegisterPublicationResponse,
};
use crate::domain::entities::{Document, Publication};

#[derive(Debug, Deserialize)]
pub struct RegisterDocumentRequestDto {
    pub document_type: String,
    pub download_url: String,
    #[serde(default)]
    pub description: String,
    pub mime_type: String,
    #[serde(default = "default_charset")]
    pub charset: String,
    pub language: Option<String>,
    pub version: Option<String>,
}

fn default_charset() -> String {
    "utf-8".to_string()
}

#[derive(Debug, Deserialize)]
pub struct RegisterPublicationRequestDto {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub citation: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub publication_date: NaiveDate,
    pub source: String,
    pub source_url: String,
    pub uri: String,
    #[serde(default)]
    pub documents: Vec<RegisterDocumentRequestDto>,
}

fn parse_url(field: &str, raw: &str) -> Result<Url, String> {
    Url::parse(raw).map_err(|e| format!("Invalid {} '{}': {}", field, raw, e))
}

impl TryFrom<RegisterDocumentRequestDto> for RegisterDocumentRequest {
    type Error = String;

    fn try_from(dto: RegisterDocumentRequestDto) -> Result<Self, Self::Error> {
        Ok(Self {
            document_type: dto.document_type.parse()?,
            download_url: parse_url("download_url", &dto.download_url)?,
            description: dto.description,
            mime_type: dto.mime_type,
            charset: dto.charset,
            language: dto.language,
            version: dto.version,
        })
    }
}

impl TryFrom<RegisterPublicationRequestDto> for RegisterPublicationRequest {
    type Error = String;

    fn try_from(dto: RegisterPublicationRequestDto) -> Result<Self, Self::Error> {
        let documents = dto
            .documents
            .into_iter()
            .map(RegisterDocumentRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source_url: parse_url("source_url", &dto.source_url)?,
            uri: parse_url("uri", &dto.uri)?,
            title: dto.title,
            abstract_text: dto.abstract_text,
            citation: dto.citation,
            authors: dto.authors,
            publication_date: dto.publication_date,
            source: dto.source,
            documents,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PublicationDto {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub citation: String,
    pub authors: Vec<String>,
    pub publication_date: String,
    pub source: String,
    pub source_url: String,
    pub uri: String,
}

impl From<&Publication> for PublicationDto {
    fn from(publication: &Publication) -> Self {
        Self {
            id: publication.id().to_string(),
            title: publication.title().to_string(),
            abstract_text: publication.abstract_text().map(|s| s.to_string()),
            citation: publication.citation().to_string(),
            authors: publication.authors().to_vec(),
            publication_date: publication.publication_date().to_string(),
            source: publication.source().to_string(),
            source_url: publication.source_url().to_string(),
            uri: publication.uri().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentDto {
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

impl From<&Document> for DocumentDto {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id().to_string(),
            publication_id: document.publication_id().to_string(),
            document_type: document.document_type().to_string(),
            download_url: document.download_url().to_string(),
            description: document.description().to_string(),
            mime_type: document.mime_type().to_string(),
            charset: document.charset().to_string(),
            storage_url: document.storage_url().map(|s| s.to_string()),
            file_size: document.file_size(),
            language: document.language().map(|s| s.to_string()),
            version: document.version().map(|s| s.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterPublicationResponseDto {
    pub publication: PublicationDto,
    pub documents: Vec<DocumentDto>,
}

impl From<RegisterPublicationResponse> for RegisterPublicationResponseDto {
    fn from(response: RegisterPublicationResponse) -> Self {
        Self {
            publication: PublicationDto::from(&response.publication),
            documents: response.documents.iter().map(DocumentDto::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListPublicationsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PublicationListDto {
    pub publications: Vec<PublicationDto>,
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
}

impl From<ListPublicationsResponse> for PublicationListDto {
    fn from(response: ListPublicationsResponse) -> Self {
        Self {
            publications: response
                .publications
                .iter()
                .map(PublicationDto::from)
                .collect(),
            total_count: response.total_count,
            skip: response.skip,
            limit: response.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordStorageRequestDto {
    pub storage_url: String,
    pub file_size: i64,
}
