//! Test doubles for the repository and port traits.

use async_trait::async_trait;
use pgvector::Vector;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::application::ports::embedding_provider::{
    EmbeddingProvider, EmbeddingProviderError, EmbeddingRequest, EmbeddingResponse,
};
use crate::application::ports::fragment_source::{FragmentSource, FragmentSourceError};
use crate::application::ports::identifier_store::{IdentifierStore, IdentifierStoreError};
use crate::domain::entities::{
    ContentNode, Document, DocumentComponent, Embedding, IngestionJob, Publication, Relation,
    embedding::cosine_similarity,
};
use crate::domain::graph::{DocumentGraph, Fragment, RelationDirection};
use crate::domain::repositories::document_repository::DocumentRepositoryError;
use crate::domain::repositories::embedding_repository::{
    EmbeddingRepositoryError, SimilarityFilter, SimilaritySearchResult,
};
use crate::domain::repositories::graph_repository::{CommitSummary, GraphRepositoryError};
use crate::domain::repositories::job_repository::JobRepositoryError;
use crate::domain::repositories::publication_repository::PublicationRepositoryError;
use crate::domain::repositories::{
    DocumentRepository, EmbeddingRepository, GraphRepository, JobRepository,
    PublicationRepository,
};
use crate::domain::value_objects::{ContentNodeType, Identifier, IdentifierTable, PositionalData};

#[derive(Default)]
pub struct InMemoryIdentifierStore {
    table: Mutex<Option<IdentifierTable>>,
    saves: AtomicUsize,
}

impl InMemoryIdentifierStore {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentifierStore for InMemoryIdentifierStore {
    async fn load(&self) -> Result<IdentifierTable, IdentifierStoreError> {
        Ok(self.table.lock().unwrap().clone().unwrap_or_default())
    }

    async fn save(&self, table: &IdentifierTable) -> Result<(), IdentifierStoreError> {
        *self.table.lock().unwrap() = Some(table.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryFragmentSource {
    streams: Mutex<HashMap<Identifier, Vec<Fragment>>>,
}

impl InMemoryFragmentSource {
    pub fn replace(&self, document_id: &Identifier, fragments: Vec<Fragment>) {
        self.streams
            .lock()
            .unwrap()
            .insert(document_id.clone(), fragments);
    }
}

#[async_trait]
impl FragmentSource for InMemoryFragmentSource {
    async fn load(&self, document_id: &Identifier) -> Result<Vec<Fragment>, FragmentSourceError> {
        self.streams
            .lock()
            .unwrap()
            .get(document_id)
            .cloned()
            .ok_or_else(|| FragmentSourceError::NotFound(document_id.clone()))
    }

    async fn store(
        &self,
        document_id: &Identifier,
        fragments: &[Fragment],
    ) -> Result<(), FragmentSourceError> {
        self.replace(document_id, fragments.to_vec());
        Ok(())
    }

    async fn exists(&self, document_id: &Identifier) -> Result<bool, FragmentSourceError> {
        Ok(self.streams.lock().unwrap().contains_key(document_id))
    }
}

#[derive(Default)]
pub struct InMemoryPublicationRepository {
    publications: Mutex<Vec<Publication>>,
}

#[async_trait]
impl PublicationRepository for InMemoryPublicationRepository {
    async fn save(&self, publication: &Publication) -> Result<(), PublicationRepositoryError> {
        let mut publications = self.publications.lock().unwrap();
        if !publications.iter().any(|p| p.id() == publication.id()) {
            publications.push(publication.clone());
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &Identifier,
    ) -> Result<Option<Publication>, PublicationRepositoryError> {
        Ok(self
            .publications
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id() == id)
            .cloned())
    }

    async fn find_all(
        &self,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Publication>, PublicationRepositoryError> {
        Ok(self
            .publications
            .lock()
            .unwrap()
            .iter()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, PublicationRepositoryError> {
        Ok(self.publications.lock().unwrap().len() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: Mutex<Vec<Document>>,
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn save(&self, document: &Document) -> Result<(), DocumentRepositoryError> {
        let mut documents = self.documents.lock().unwrap();
        if !documents.iter().any(|d| d.id() == document.id()) {
            documents.push(document.clone());
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &Identifier,
    ) -> Result<Option<Document>, DocumentRepositoryError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id() == id)
            .cloned())
    }

    async fn find_by_publication(
        &self,
        publication_id: &Identifier,
    ) -> Result<Vec<Document>, DocumentRepositoryError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.publication_id() == publication_id)
            .cloned()
            .collect())
    }

    async fn update_storage(&self, document: &Document) -> Result<(), DocumentRepositoryError> {
        let mut documents = self.documents.lock().unwrap();
        let stored = documents
            .iter_mut()
            .find(|d| d.id() == document.id())
            .ok_or_else(|| DocumentRepositoryError::NotFound(document.id().clone()))?;
        *stored = document.clone();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryGraphRepository {
    graphs: Mutex<HashMap<Identifier, DocumentGraph>>,
    fail_commits: AtomicBool,
    commits: AtomicUsize,
}

impl InMemoryGraphRepository {
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn stored(&self, document_id: &Identifier) -> Option<DocumentGraph> {
        self.graphs.lock().unwrap().get(document_id).cloned()
    }

    fn find_in_graphs<T>(&self, f: impl Fn(&DocumentGraph) -> Option<T>) -> Option<T> {
        self.graphs.lock().unwrap().values().find_map(f)
    }
}

#[async_trait]
impl GraphRepository for InMemoryGraphRepository {
    async fn commit(&self, graph: &DocumentGraph) -> Result<CommitSummary, GraphRepositoryError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(GraphRepositoryError::DatabaseError(
                "connection reset".to_string(),
            ));
        }

        let mut graphs = self.graphs.lock().unwrap();
        let removed = graphs.get(graph.document_id()).map_or(0, |old| {
            old.components()
                .iter()
                .filter(|c| graph.component(c.id()).is_none())
                .count()
                + old
                    .nodes()
                    .iter()
                    .filter(|n| graph.node(n.id()).is_none())
                    .count()
                + old
                    .relations()
                    .iter()
                    .filter(|r| graph.relation(r.id()).is_none())
                    .count()
        });
        graphs.insert(graph.document_id().clone(), graph.clone());
        self.commits.fetch_add(1, Ordering::SeqCst);

        Ok(CommitSummary {
            components: graph.components().len(),
            nodes: graph.nodes().len(),
            relations: graph.relations().len(),
            removed,
        })
    }

    async fn load(&self, document_id: &Identifier) -> Result<DocumentGraph, GraphRepositoryError> {
        Ok(self
            .stored(document_id)
            .unwrap_or_else(|| DocumentGraph::new(document_id.clone())))
    }

    async fn find_node(&self, id: &Identifier) -> Result<Option<ContentNode>, GraphRepositoryError> {
        Ok(self.find_in_graphs(|g| g.node(id).cloned()))
    }

    async fn find_component(
        &self,
        id: &Identifier,
    ) -> Result<Option<DocumentComponent>, GraphRepositoryError> {
        Ok(self.find_in_graphs(|g| g.component(id).cloned()))
    }

    async fn nodes_by_type(
        &self,
        document_id: &Identifier,
        node_type: ContentNodeType,
    ) -> Result<Vec<ContentNode>, GraphRepositoryError> {
        let graph = self.load(document_id).await?;
        Ok(graph.filter_by_type(node_type).into_iter().cloned().collect())
    }

    async fn nodes_on_page(
        &self,
        document_id: &Identifier,
        pdf_page: i32,
    ) -> Result<Vec<ContentNode>, GraphRepositoryError> {
        let graph = self.load(document_id).await?;
        Ok(graph.nodes_on_page(pdf_page).into_iter().cloned().collect())
    }

    async fn nodes_in_page_range(
        &self,
        document_id: &Identifier,
        start: i32,
        end: i32,
    ) -> Result<Vec<ContentNode>, GraphRepositoryError> {
        let graph = self.load(document_id).await?;
        Ok(graph
            .nodes_in_page_range(start, end)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn relations_of(
        &self,
        node_id: &Identifier,
        direction: RelationDirection,
    ) -> Result<Vec<Relation>, GraphRepositoryError> {
        Ok(self
            .find_in_graphs(|g| {
                g.node(node_id)
                    .map(|_| g.relations_of(node_id, direction).into_iter().cloned().collect())
            })
            .unwrap_or_default())
    }

    async fn update_positional_data(
        &self,
        updates: &[(Identifier, PositionalData)],
    ) -> Result<usize, GraphRepositoryError> {
        let mut graphs = self.graphs.lock().unwrap();
        let mut updated = 0;
        for (node_id, positions) in updates {
            for graph in graphs.values_mut() {
                if let Some(node) = graph.node_mut(node_id) {
                    *node.positional_data_mut() = positions.clone();
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub struct InMemoryEmbeddingRepository {
    embeddings: Mutex<Vec<Embedding>>,
    nodes: Mutex<HashMap<Identifier, ContentNode>>,
}

impl InMemoryEmbeddingRepository {
    pub fn len(&self) -> usize {
        self.embeddings.lock().unwrap().len()
    }

    /// Makes nodes visible to similarity search.
    pub fn index_nodes(&self, nodes: &[ContentNode]) {
        let mut indexed = self.nodes.lock().unwrap();
        for node in nodes {
            indexed.insert(node.id().clone(), node.clone());
        }
    }
}

#[async_trait]
impl EmbeddingRepository for InMemoryEmbeddingRepository {
    async fn save_batch(&self, embeddings: &[Embedding]) -> Result<usize, EmbeddingRepositoryError> {
        let mut stored = self.embeddings.lock().unwrap();
        let mut inserted = 0;
        for embedding in embeddings {
            if !stored.iter().any(|e| e.id() == embedding.id()) {
                stored.push(embedding.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn find_by_node(
        &self,
        node_id: &Identifier,
    ) -> Result<Vec<Embedding>, EmbeddingRepositoryError> {
        Ok(self
            .embeddings
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.node_id() == node_id)
            .cloned()
            .collect())
    }

    async fn similarity_search(
        &self,
        query_vector: &Vector,
        filter: &SimilarityFilter,
        limit: i64,
    ) -> Result<Vec<SimilaritySearchResult>, EmbeddingRepositoryError> {
        let nodes = self.nodes.lock().unwrap();
        let embeddings = self.embeddings.lock().unwrap();
        let mut results: Vec<SimilaritySearchResult> = embeddings
            .iter()
            .filter(|embedding| !embeddings.iter().any(|other| other.supersedes(embedding)))
            .filter(|embedding| {
                filter
                    .model_name
                    .as_deref()
                    .is_none_or(|model| embedding.model_name() == model)
            })
            .filter_map(|embedding| {
                let node = nodes.get(embedding.node_id())?;
                if filter.node_type.is_some_and(|t| node.node_type() != t) {
                    return None;
                }
                if filter
                    .document_id
                    .as_ref()
                    .is_some_and(|d| node.document_id() != d)
                {
                    return None;
                }
                let score = cosine_similarity(
                    query_vector.as_slice(),
                    embedding.embedding_vector().as_slice(),
                )?;
                if filter.similarity_threshold.is_some_and(|t| score < t) {
                    return None;
                }
                Some(SimilaritySearchResult {
                    embedding: embedding.clone(),
                    node: node.clone(),
                    similarity_score: score,
                })
            })
            .collect();

        results.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        results.truncate(limit as usize);
        Ok(results)
    }
}

#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: Mutex<HashMap<Uuid, IngestionJob>>,
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn save(&self, job: &IngestionJob) -> Result<(), JobRepositoryError> {
        self.jobs.lock().unwrap().insert(job.id(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError> {
        Ok(self.jobs.lock().unwrap().get(&job_id).cloned())
    }

    async fn find_by_document(
        &self,
        document_id: &Identifier,
    ) -> Result<Vec<IngestionJob>, JobRepositoryError> {
        let mut jobs: Vec<IngestionJob> = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.document_id() == document_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| std::cmp::Reverse(j.created_at()));
        Ok(jobs)
    }

    async fn last_ingested(
        &self,
        document_id: &Identifier,
    ) -> Result<Option<IngestionJob>, JobRepositoryError> {
        Ok(self
            .find_by_document(document_id)
            .await?
            .into_iter()
            .filter(|j| j.status().is_ingested())
            .max_by_key(|j| j.completed_at()))
    }

    async fn update(&self, job: &IngestionJob) -> Result<(), JobRepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        if !jobs.contains_key(&job.id()) {
            return Err(JobRepositoryError::NotFound(job.id()));
        }
        jobs.insert(job.id(), job.clone());
        Ok(())
    }

    async fn find_active_jobs(&self) -> Result<Vec<IngestionJob>, JobRepositoryError> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.is_active())
            .cloned()
            .collect())
    }
}

/// Deterministic vectors derived from the text bytes.
pub struct FakeEmbeddingProvider {
    dimension: usize,
    batch_calls: AtomicUsize,
}

impl FakeEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> Vector {
        let mut values = vec![0.0f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            values[i % self.dimension] += byte as f32;
        }
        values[0] += 1.0;
        Vector::from(values)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddingProvider {
    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(EmbeddingResponse {
            embeddings: request.texts.iter().map(|t| self.vector_for(t)).collect(),
            model_name: "fake-model".to_string(),
        })
    }

    async fn health_check(&self) -> Result<bool, EmbeddingProviderError> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }

    fn max_input_length(&self) -> usize {
        8192
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }
}
