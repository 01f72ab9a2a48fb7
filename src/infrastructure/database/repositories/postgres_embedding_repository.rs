use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use pgvector::{Vector, VectorExpressionMethods};

use crate::domain::entities::{ContentNode, Embedding};
use crate::domain::repositories::EmbeddingRepository;
use crate::domain::repositories::embedding_repository::{
    EmbeddingRepositoryError, SimilarityFilter, SimilaritySearchResult,
};
use crate::domain::value_objects::Identifier;
use crate::infrastructure::database::models::{ContentNodeModel, EmbeddingModel, NewEmbeddingModel};
use crate::infrastructure::database::schema::{content_node, embedding};

pub struct PostgresEmbeddingRepository {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl PostgresEmbeddingRepository {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    fn get_connection(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<PgConnection>>, EmbeddingRepositoryError> {
        self.pool.get().map_err(|e| {
            EmbeddingRepositoryError::DatabaseError(format!(
                "Failed to get database connection: {}",
                e
            ))
        })
    }
}

fn to_domain(model: EmbeddingModel) -> Result<Embedding, EmbeddingRepositoryError> {
    Embedding::try_from(model).map_err(EmbeddingRepositoryError::ValidationError)
}

#[async_trait]
impl EmbeddingRepository for PostgresEmbeddingRepository {
    async fn save_batch(&self, embeddings: &[Embedding]) -> Result<usize, EmbeddingRepositoryError> {
        if embeddings.is_empty() {
            return Ok(0);
        }

        let new_embeddings: Vec<NewEmbeddingModel> =
            embeddings.iter().map(NewEmbeddingModel::from).collect();
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(embedding::table)
                .values(&new_embeddings)
                .on_conflict(embedding::id)
                .do_nothing()
                .execute(&mut conn)
                .map_err(|e| {
                    EmbeddingRepositoryError::DatabaseError(format!(
                        "Failed to save embeddings: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| EmbeddingRepositoryError::DatabaseError(format!("Task join error: {}", e)))?
    }

    async fn find_by_node(
        &self,
        node_id: &Identifier,
    ) -> Result<Vec<Embedding>, EmbeddingRepositoryError> {
        let key = node_id.as_string();
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            embedding::table
                .filter(embedding::content_node_id.eq(key))
                .order(embedding::created_at.desc())
                .select(EmbeddingModel::as_select())
                .load(&mut conn)
                .map_err(|e| {
                    EmbeddingRepositoryError::DatabaseError(format!(
                        "Failed to find embeddings: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| EmbeddingRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        models.into_iter().map(to_domain).collect()
    }

    async fn similarity_search(
        &self,
        query_vector: &Vector,
        filter: &SimilarityFilter,
        limit: i64,
    ) -> Result<Vec<SimilaritySearchResult>, EmbeddingRepositoryError> {
        let query_vector = query_vector.clone();
        let node_type = filter.node_type.map(|t| t.as_str());
        let document_id = filter.document_id.as_ref().map(Identifier::as_string);
        let model_name = filter.model_name.clone();
        // Cosine distance is 1 - similarity.
        let max_distance = filter.similarity_threshold.map(|t| 1.0 - f64::from(t));
        let mut conn = self.get_connection()?;

        let rows = tokio::task::spawn_blocking(move || {
            let distance = embedding::embedding_vector.cosine_distance(query_vector.clone());

            let mut query = embedding::table
                .inner_join(content_node::table)
                .select((
                    EmbeddingModel::as_select(),
                    ContentNodeModel::as_select(),
                    embedding::embedding_vector.cosine_distance(query_vector.clone()),
                ))
                .into_boxed();

            let current = diesel::alias!(embedding as current_embedding);
            let current_rows = current
                .select(current.field(embedding::id))
                .distinct_on(current.field(embedding::content_node_id))
                .order((
                    current.field(embedding::content_node_id),
                    current.field(embedding::created_at).desc(),
                ));
            query = query.filter(embedding::id.eq_any(current_rows));

            if let Some(model_name) = model_name {
                query = query.filter(embedding::model_name.eq(model_name));
            }
            if let Some(node_type) = node_type {
                query = query.filter(content_node::content_node_type.eq(node_type));
            }
            if let Some(document_id) = document_id {
                query = query.filter(content_node::document_id.eq(document_id));
            }
            if let Some(max_distance) = max_distance {
                query = query.filter(
                    embedding::embedding_vector
                        .cosine_distance(query_vector.clone())
                        .le(max_distance),
                );
            }

            query
                .order(distance)
                .limit(limit)
                .load::<(EmbeddingModel, ContentNodeModel, f64)>(&mut conn)
                .map_err(|e| {
                    EmbeddingRepositoryError::DatabaseError(format!(
                        "Failed to run similarity search: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| EmbeddingRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        rows.into_iter()
            .map(|(embedding_model, node_model, distance)| {
                let node = ContentNode::try_from(node_model)
                    .map_err(EmbeddingRepositoryError::ValidationError)?;
                Ok(SimilaritySearchResult {
                    embedding: to_domain(embedding_model)?,
                    node,
                    similarity_score: (1.0 - distance) as f32,
                })
            })
            .collect()
    }
}
