use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    ContentNodeType, EmbeddingSource, Identifier, PositionalData, SequenceKey,
};

#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingTextError {
    Missing {
        node_id: Identifier,
        source: EmbeddingSource,
    },
}

impl std::fmt::Display for EmbeddingTextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingTextError::Missing { node_id, source } => {
                write!(f, "Node {} has no {} to embed", node_id, source)
            }
        }
    }
}

impl std::error::Error for EmbeddingTextError {}

/// Leaf semantic unit of a document. Never contains other nodes or components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    id: Identifier,
    document_id: Identifier,
    parent_component_id: Identifier,
    node_type: ContentNodeType,
    content: Option<String>,
    storage_url: Option<String>,
    caption: Option<String>,
    description: Option<String>,
    embedding_source: EmbeddingSource,
    sequence: SequenceKey,
    sequence_in_document: Option<i32>,
    positional_data: PositionalData,
}

impl ContentNode {
    pub fn new(
        id: Identifier,
        document_id: Identifier,
        parent_component_id: Identifier,
        node_type: ContentNodeType,
        sequence: SequenceKey,
    ) -> Self {
        Self {
            id,
            document_id,
            parent_component_id,
            node_type,
            content: None,
            storage_url: None,
            caption: None,
            description: None,
            embedding_source: node_type.default_embedding_source(),
            sequence,
            sequence_in_document: None,
            positional_data: PositionalData::default(),
        }
    }

    pub fn with_content(mut self, content: Option<String>) -> Self {
        self.content = clean(content);
        self
    }

    pub fn with_storage_url(mut self, storage_url: Option<String>) -> Self {
        self.storage_url = clean(storage_url);
        self
    }

    pub fn with_caption(mut self, caption: Option<String>) -> Self {
        self.caption = clean(caption);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = clean(description);
        self
    }

    pub fn with_embedding_source(mut self, embedding_source: EmbeddingSource) -> Self {
        self.embedding_source = embedding_source;
        self
    }

    pub fn with_positions(mut self, positional_data: PositionalData) -> Self {
        self.positional_data = positional_data;
        self
    }

    pub fn with_sequence_in_document(mut self, sequence_in_document: Option<i32>) -> Self {
        self.sequence_in_document = sequence_in_document;
        self
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn document_id(&self) -> &Identifier {
        &self.document_id
    }

    pub fn parent_component_id(&self) -> &Identifier {
        &self.parent_component_id
    }

    pub fn node_type(&self) -> ContentNodeType {
        self.node_type
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn storage_url(&self) -> Option<&str> {
        self.storage_url.as_deref()
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn embedding_source(&self) -> EmbeddingSource {
        self.embedding_source
    }

    pub fn sequence(&self) -> SequenceKey {
        self.sequence
    }

    pub fn sequence_in_document(&self) -> Option<i32> {
        self.sequence_in_document
    }

    pub fn positional_data(&self) -> &PositionalData {
        &self.positional_data
    }

    pub fn is_supplementary(&self) -> bool {
        self.sequence.is_supplementary()
    }

    pub fn covers_page(&self, pdf_page: i32) -> bool {
        self.positional_data.covers_page(pdf_page)
    }

    /// Text that feeds the embedding, chosen by `embedding_source`.
    ///
    /// Never falls back to `content` when the designated field is empty.
    pub fn embedding_source_text(&self) -> Result<&str, EmbeddingTextError> {
        let text = match self.embedding_source {
            EmbeddingSource::Text => self.content.as_deref(),
            EmbeddingSource::Description => self.description.as_deref(),
            EmbeddingSource::Caption => self.caption.as_deref(),
        };

        text.ok_or_else(|| EmbeddingTextError::Missing {
            node_id: self.id.clone(),
            source: self.embedding_source,
        })
    }

    /// Enrichment pass: attach an AI-generated description.
    pub fn describe(&mut self, description: String) {
        self.description = clean(Some(description));
    }

    pub(crate) fn append_continuation(&mut self, text: Option<String>, positions: PositionalData) {
        if let Some(text) = clean(text) {
            self.content = Some(match self.content.take() {
                Some(existing) => format!("{} {}", existing, text),
                None => text,
            });
        }
        self.positional_data.extend(positions);
    }

    /// Copies an attached caption onto a table or figure that has none of its own.
    pub(crate) fn adopt_caption(&mut self, caption: Option<&str>) {
        if self.caption.is_none() {
            self.caption = clean(caption.map(str::to_string));
        }
    }

    pub(crate) fn set_sequence_in_document(&mut self, sequence_in_document: i32) {
        self.sequence_in_document = Some(sequence_in_document);
    }

    pub(crate) fn positional_data_mut(&mut self) -> &mut PositionalData {
        &mut self.positional_data
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
