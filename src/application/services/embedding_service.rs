use pgvector::Vector;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::ports::embedding_provider::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::entities::{ContentNode, Embedding};
use crate::domain::repositories::EmbeddingRepository;
use crate::domain::value_objects::Identifier;

#[derive(Debug)]
pub enum EmbeddingServiceError {
    ProviderError(String),
    RepositoryError(String),
    ValidationError(String),
}

impl std::fmt::Display for EmbeddingServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingServiceError::ProviderError(msg) => write!(f, "Provider error: {}", msg),
            EmbeddingServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            EmbeddingServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for EmbeddingServiceError {}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct EmbeddingBatchReport {
    pub embedded: usize,
    /// Rows that were new; re-embedding unchanged text writes nothing.
    pub stored: usize,
    /// Nodes whose configured embedding source is empty.
    pub skipped: Vec<Identifier>,
}

const BATCH_SIZE: usize = 10;

pub struct EmbeddingService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    embedding_repository: Arc<dyn EmbeddingRepository>,
}

impl EmbeddingService {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        embedding_repository: Arc<dyn EmbeddingRepository>,
    ) -> Self {
        Self {
            embedding_provider,
            embedding_repository,
        }
    }

    /// Embeds each node's source text in batches and stores the vectors.
    pub async fn embed_nodes(
        &self,
        nodes: &[ContentNode],
    ) -> Result<EmbeddingBatchReport, EmbeddingServiceError> {
        let mut report = EmbeddingBatchReport::default();
        let mut sources: Vec<(&Identifier, &str)> = Vec::new();

        for node in nodes {
            match node.embedding_source_text() {
                Ok(text) => sources.push((node.id(), text)),
                Err(e) => {
                    warn!("Skipping embedding: {}", e);
                    report.skipped.push(node.id().clone());
                }
            }
        }

        let max_len = self.embedding_provider.max_input_length();
        let model_name = self.embedding_provider.model_name().to_string();

        for batch in sources.chunks(BATCH_SIZE) {
            let texts: Vec<String> = batch
                .iter()
                .map(|(_, text)| truncate_chars(text, max_len).to_string())
                .collect();

            let response = self
                .embedding_provider
                .embed(EmbeddingRequest {
                    texts,
                    model_name: Some(model_name.clone()),
                })
                .await
                .map_err(|e| EmbeddingServiceError::ProviderError(e.to_string()))?;

            if response.embeddings.len() != batch.len() {
                return Err(EmbeddingServiceError::ProviderError(format!(
                    "Expected {} vectors, got {}",
                    batch.len(),
                    response.embeddings.len()
                )));
            }

            let mut embeddings = Vec::with_capacity(batch.len());
            for ((node_id, text), vector) in batch.iter().zip(response.embeddings) {
                self.check_dimension(&vector)?;
                embeddings.push(Embedding::new(
                    (*node_id).clone(),
                    response.model_name.clone(),
                    text,
                    vector,
                ));
            }

            report.stored += self
                .embedding_repository
                .save_batch(&embeddings)
                .await
                .map_err(|e| EmbeddingServiceError::RepositoryError(e.to_string()))?;
            report.embedded += embeddings.len();
        }

        debug!(
            "Embedded {} nodes ({} new, {} skipped)",
            report.embedded,
            report.stored,
            report.skipped.len()
        );
        Ok(report)
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vector, EmbeddingServiceError> {
        if text.trim().is_empty() {
            return Err(EmbeddingServiceError::ValidationError(
                "Query text must not be empty".to_string(),
            ));
        }

        let max_len = self.embedding_provider.max_input_length();
        let response = self
            .embedding_provider
            .embed(EmbeddingRequest {
                texts: vec![truncate_chars(text, max_len).to_string()],
                model_name: None,
            })
            .await
            .map_err(|e| EmbeddingServiceError::ProviderError(e.to_string()))?;

        let vector = response.embeddings.into_iter().next().ok_or_else(|| {
            EmbeddingServiceError::ProviderError("No vector returned for query".to_string())
        })?;
        self.check_dimension(&vector)?;
        Ok(vector)
    }

    pub async fn health_check(&self) -> Result<bool, EmbeddingServiceError> {
        self.embedding_provider
            .health_check()
            .await
            .map_err(|e| EmbeddingServiceError::ProviderError(e.to_string()))
    }

    pub fn model_name(&self) -> &str {
        self.embedding_provider.model_name()
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_provider.embedding_dimension()
    }

    fn check_dimension(&self, vector: &Vector) -> Result<(), EmbeddingServiceError> {
        let expected = self.embedding_provider.embedding_dimension();
        let found = vector.as_slice().len();
        if found != expected {
            return Err(EmbeddingServiceError::ValidationError(format!(
                "Vector has {} dimensions, expected {}",
                found, expected
            )));
        }
        Ok(())
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}
