use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sql_types::{Integer, Jsonb, Varchar};
use diesel::upsert::excluded;

use crate::domain::entities::{ContentNode, DocumentComponent, Relation};
use crate::domain::graph::{DocumentGraph, RelationDirection};
use crate::domain::repositories::GraphRepository;
use crate::domain::repositories::graph_repository::{CommitSummary, GraphRepositoryError};
use crate::domain::value_objects::{ContentNodeType, Identifier, PositionalData};
use crate::infrastructure::database::models::{ComponentModel, ContentNodeModel, RelationModel};
use crate::infrastructure::database::schema::{content_node, document_component, relation};

/// Rows per INSERT statement; keeps bind parameters under the Postgres limit.
const UPSERT_CHUNK: usize = 1000;

pub struct PostgresGraphRepository {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl PostgresGraphRepository {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    fn get_connection(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<PgConnection>>, GraphRepositoryError> {
        self.pool.get().map_err(|e| {
            GraphRepositoryError::DatabaseError(format!("Failed to get database connection: {}", e))
        })
    }
}

fn join_error(e: tokio::task::JoinError) -> GraphRepositoryError {
    GraphRepositoryError::DatabaseError(format!("Task join error: {}", e))
}

fn nodes_to_domain(models: Vec<ContentNodeModel>) -> Result<Vec<ContentNode>, GraphRepositoryError> {
    models
        .into_iter()
        .map(|m| ContentNode::try_from(m).map_err(GraphRepositoryError::CorruptGraph))
        .collect()
}

fn upsert_graph(
    conn: &mut PgConnection,
    document_id: &str,
    components: &[ComponentModel],
    nodes: &[ContentNodeModel],
    relations: &[RelationModel],
) -> QueryResult<CommitSummary> {
    for chunk in components.chunks(UPSERT_CHUNK) {
        diesel::insert_into(document_component::table)
            .values(chunk)
            .on_conflict(document_component::id)
            .do_update()
            .set((
                document_component::component_type.eq(excluded(document_component::component_type)),
                document_component::title.eq(excluded(document_component::title)),
                document_component::parent_component_id
                    .eq(excluded(document_component::parent_component_id)),
                document_component::sequence_in_parent_major
                    .eq(excluded(document_component::sequence_in_parent_major)),
                document_component::sequence_in_parent_minor
                    .eq(excluded(document_component::sequence_in_parent_minor)),
                document_component::page_range_start.eq(excluded(document_component::page_range_start)),
                document_component::page_range_end.eq(excluded(document_component::page_range_end)),
            ))
            .execute(conn)?;
    }

    for chunk in nodes.chunks(UPSERT_CHUNK) {
        diesel::insert_into(content_node::table)
            .values(chunk)
            .on_conflict(content_node::id)
            .do_update()
            .set((
                content_node::parent_component_id.eq(excluded(content_node::parent_component_id)),
                content_node::content_node_type.eq(excluded(content_node::content_node_type)),
                content_node::content.eq(excluded(content_node::content)),
                content_node::storage_url.eq(excluded(content_node::storage_url)),
                content_node::caption.eq(excluded(content_node::caption)),
                content_node::description.eq(excluded(content_node::description)),
                content_node::embedding_source.eq(excluded(content_node::embedding_source)),
                content_node::sequence_in_parent_major
                    .eq(excluded(content_node::sequence_in_parent_major)),
                content_node::sequence_in_parent_minor
                    .eq(excluded(content_node::sequence_in_parent_minor)),
                content_node::sequence_in_document.eq(excluded(content_node::sequence_in_document)),
                content_node::positional_data.eq(excluded(content_node::positional_data)),
            ))
            .execute(conn)?;
    }

    for chunk in relations.chunks(UPSERT_CHUNK) {
        diesel::insert_into(relation::table)
            .values(chunk)
            .on_conflict(relation::id)
            .do_update()
            .set((
                relation::source_node_id.eq(excluded(relation::source_node_id)),
                relation::target_node_id.eq(excluded(relation::target_node_id)),
                relation::relation_type.eq(excluded(relation::relation_type)),
                relation::marker_text.eq(excluded(relation::marker_text)),
                relation::data_quality_flag.eq(excluded(relation::data_quality_flag)),
            ))
            .execute(conn)?;
    }

    let relation_ids: Vec<&str> = relations.iter().map(|r| r.id.as_str()).collect();
    let node_ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let component_ids: Vec<&str> = components.iter().map(|c| c.id.as_str()).collect();

    // Children first so no stale row is left pointing at a deleted parent.
    let mut removed = diesel::delete(
        relation::table
            .filter(relation::document_id.eq(document_id))
            .filter(relation::id.ne_all(relation_ids)),
    )
    .execute(conn)?;
    removed += diesel::delete(
        content_node::table
            .filter(content_node::document_id.eq(document_id))
            .filter(content_node::id.ne_all(node_ids)),
    )
    .execute(conn)?;
    removed += diesel::delete(
        document_component::table
            .filter(document_component::document_id.eq(document_id))
            .filter(document_component::id.ne_all(component_ids)),
    )
    .execute(conn)?;

    Ok(CommitSummary {
        components: components.len(),
        nodes: nodes.len(),
        relations: relations.len(),
        removed,
    })
}

#[async_trait]
impl GraphRepository for PostgresGraphRepository {
    async fn commit(&self, graph: &DocumentGraph) -> Result<CommitSummary, GraphRepositoryError> {
        let document_id = graph.document_id().as_string();
        let components: Vec<ComponentModel> =
            graph.components().iter().map(ComponentModel::from).collect();
        let nodes: Vec<ContentNodeModel> = graph.nodes().iter().map(ContentNodeModel::from).collect();
        let relations: Vec<RelationModel> =
            graph.relations().iter().map(RelationModel::from).collect();
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            conn.transaction(|conn| {
                upsert_graph(conn, &document_id, &components, &nodes, &relations)
            })
            .map_err(|e| {
                GraphRepositoryError::DatabaseError(format!(
                    "Failed to commit graph for {}: {}",
                    document_id, e
                ))
            })
        })
        .await
        .map_err(join_error)?
    }

    async fn load(&self, document_id: &Identifier) -> Result<DocumentGraph, GraphRepositoryError> {
        let key = document_id.as_string();
        let mut conn = self.get_connection()?;

        let (component_models, node_models, relation_models) =
            tokio::task::spawn_blocking(move || {
                let components = document_component::table
                    .filter(document_component::document_id.eq(&key))
                    .select(ComponentModel::as_select())
                    .load(&mut conn)?;
                let nodes = content_node::table
                    .filter(content_node::document_id.eq(&key))
                    .select(ContentNodeModel::as_select())
                    .load(&mut conn)?;
                let relations = relation::table
                    .filter(relation::document_id.eq(&key))
                    .select(RelationModel::as_select())
                    .load(&mut conn)?;
                Ok::<_, diesel::result::Error>((components, nodes, relations))
            })
            .await
            .map_err(join_error)?
            .map_err(|e| GraphRepositoryError::DatabaseError(format!("Failed to load graph: {}", e)))?;

        let components = component_models
            .into_iter()
            .map(DocumentComponent::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(GraphRepositoryError::CorruptGraph)?;
        let nodes = nodes_to_domain(node_models)?;
        let relations = relation_models
            .into_iter()
            .map(Relation::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(GraphRepositoryError::CorruptGraph)?;

        DocumentGraph::from_parts(document_id.clone(), components, nodes, relations)
            .map_err(|e| GraphRepositoryError::CorruptGraph(e.to_string()))
    }

    async fn find_node(&self, id: &Identifier) -> Result<Option<ContentNode>, GraphRepositoryError> {
        let key = id.as_string();
        let mut conn = self.get_connection()?;

        let result = tokio::task::spawn_blocking(move || {
            content_node::table
                .find(key)
                .select(ContentNodeModel::as_select())
                .first(&mut conn)
                .optional()
                .map_err(|e| GraphRepositoryError::DatabaseError(format!("Failed to find node: {}", e)))
        })
        .await
        .map_err(join_error)??;

        result
            .map(|m| ContentNode::try_from(m).map_err(GraphRepositoryError::CorruptGraph))
            .transpose()
    }

    async fn find_component(
        &self,
        id: &Identifier,
    ) -> Result<Option<DocumentComponent>, GraphRepositoryError> {
        let key = id.as_string();
        let mut conn = self.get_connection()?;

        let result = tokio::task::spawn_blocking(move || {
            document_component::table
                .find(key)
                .select(ComponentModel::as_select())
                .first(&mut conn)
                .optional()
                .map_err(|e| {
                    GraphRepositoryError::DatabaseError(format!("Failed to find component: {}", e))
                })
        })
        .await
        .map_err(join_error)??;

        result
            .map(|m| DocumentComponent::try_from(m).map_err(GraphRepositoryError::CorruptGraph))
            .transpose()
    }

    async fn nodes_by_type(
        &self,
        document_id: &Identifier,
        node_type: ContentNodeType,
    ) -> Result<Vec<ContentNode>, GraphRepositoryError> {
        let key = document_id.as_string();
        let type_name = node_type.as_str();
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            content_node::table
                .filter(content_node::document_id.eq(key))
                .filter(content_node::content_node_type.eq(type_name))
                .order((content_node::sequence_in_document.asc(), content_node::id.asc()))
                .select(ContentNodeModel::as_select())
                .load(&mut conn)
                .map_err(|e| {
                    GraphRepositoryError::DatabaseError(format!("Failed to filter nodes: {}", e))
                })
        })
        .await
        .map_err(join_error)??;

        nodes_to_domain(models)
    }

    async fn nodes_on_page(
        &self,
        document_id: &Identifier,
        pdf_page: i32,
    ) -> Result<Vec<ContentNode>, GraphRepositoryError> {
        let key = document_id.as_string();
        let probe = serde_json::json!([{ "pdf_page": pdf_page }]);
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            diesel::sql_query(
                "SELECT * FROM content_node \
                 WHERE document_id = $1 AND positional_data @> $2 \
                 ORDER BY sequence_in_document, id",
            )
            .bind::<Varchar, _>(key)
            .bind::<Jsonb, _>(probe)
            .load::<ContentNodeModel>(&mut conn)
            .map_err(|e| {
                GraphRepositoryError::DatabaseError(format!("Failed to find nodes on page: {}", e))
            })
        })
        .await
        .map_err(join_error)??;

        nodes_to_domain(models)
    }

    async fn nodes_in_page_range(
        &self,
        document_id: &Identifier,
        start: i32,
        end: i32,
    ) -> Result<Vec<ContentNode>, GraphRepositoryError> {
        let key = document_id.as_string();
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            diesel::sql_query(
                "SELECT * FROM content_node \
                 WHERE document_id = $1 \
                 AND jsonb_path_exists(positional_data, \
                     '$[*] ? (@.pdf_page >= $start && @.pdf_page <= $end)', \
                     jsonb_build_object('start', $2, 'end', $3)) \
                 ORDER BY sequence_in_document, id",
            )
            .bind::<Varchar, _>(key)
            .bind::<Integer, _>(start)
            .bind::<Integer, _>(end)
            .load::<ContentNodeModel>(&mut conn)
            .map_err(|e| {
                GraphRepositoryError::DatabaseError(format!(
                    "Failed to find nodes in page range: {}",
                    e
                ))
            })
        })
        .await
        .map_err(join_error)??;

        nodes_to_domain(models)
    }

    async fn relations_of(
        &self,
        node_id: &Identifier,
        direction: RelationDirection,
    ) -> Result<Vec<Relation>, GraphRepositoryError> {
        let key = node_id.as_string();
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            let query = relation::table.select(RelationModel::as_select()).into_boxed();
            let query = match direction {
                RelationDirection::SourceOf => query.filter(relation::source_node_id.eq(key)),
                RelationDirection::TargetOf => query.filter(relation::target_node_id.eq(key)),
            };
            query
                .order(relation::id.asc())
                .load(&mut conn)
                .map_err(|e| {
                    GraphRepositoryError::DatabaseError(format!("Failed to load relations: {}", e))
                })
        })
        .await
        .map_err(join_error)??;

        models
            .into_iter()
            .map(|m| Relation::try_from(m).map_err(GraphRepositoryError::CorruptGraph))
            .collect()
    }

    async fn update_positional_data(
        &self,
        updates: &[(Identifier, PositionalData)],
    ) -> Result<usize, GraphRepositoryError> {
        let rows: Vec<(String, serde_json::Value)> = updates
            .iter()
            .map(|(id, positions)| (id.as_string(), positions.to_json()))
            .collect();
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            conn.transaction(|conn| {
                let mut updated = 0;
                for (id, positions) in &rows {
                    updated += diesel::update(content_node::table.find(id))
                        .set(content_node::positional_data.eq(positions))
                        .execute(conn)?;
                }
                Ok::<_, diesel::result::Error>(updated)
            })
            .map_err(|e| {
                GraphRepositoryError::DatabaseError(format!(
                    "Failed to update positional data: {}",
                    e
                ))
            })
        })
        .await
        .map_err(join_error)?
    }
}
