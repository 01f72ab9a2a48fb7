use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;

use crate::domain::entities::Embedding;
use crate::domain::value_objects::Identifier;
use crate::infrastructure::database::schema::embedding;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = embedding)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmbeddingModel {
    pub id: String,
    pub content_node_id: String,
    pub embedding_vector: Vector,
    pub model_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = embedding)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewEmbeddingModel {
    pub id: String,
    pub content_node_id: String,
    pub embedding_vector: Vector,
    pub model_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Embedding> for NewEmbeddingModel {
    fn from(embedding: &Embedding) -> Self {
        Self {
            id: embedding.id().as_string(),
            content_node_id: embedding.node_id().as_string(),
            embedding_vector: embedding.embedding_vector().clone(),
            model_name: embedding.model_name().to_string(),
            created_at: embedding.created_at(),
        }
    }
}

impl TryFrom<EmbeddingModel> for Embedding {
    type Error = String;

    fn try_from(model: EmbeddingModel) -> Result<Self, Self::Error> {
        Ok(Embedding::restore(
            Identifier::parse(&model.id).map_err(|e| e.to_string())?,
            Identifier::parse(&model.content_node_id).map_err(|e| e.to_string())?,
            model.model_name,
            model.created_at,
            model.embedding_vector,
        ))
    }
}
