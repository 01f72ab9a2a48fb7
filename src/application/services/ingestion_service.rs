use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::application::ports::FragmentSource;
use crate::application::ports::fragment_source::FragmentSourceError;
use crate::application::services::EmbeddingService;
use crate::domain::entities::{IngestionJob, IngestionReport};
use crate::domain::graph::{
    AssembledDocument, AssemblyError, Fragment, GraphAssembler, UnresolvedReference,
};
use crate::domain::repositories::{DocumentRepository, GraphRepository, JobRepository};
use crate::domain::value_objects::{Fingerprint, Identifier};

#[derive(Debug)]
pub enum IngestionServiceError {
    DocumentNotFound(Identifier),
    FragmentSource(String),
    Assembly(AssemblyError),
    RepositoryError(String),
    JobStateError(String),
}

impl std::fmt::Display for IngestionServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionServiceError::DocumentNotFound(id) => write!(f, "Document not found: {}", id),
            IngestionServiceError::FragmentSource(msg) => write!(f, "Fragment source error: {}", msg),
            IngestionServiceError::Assembly(err) => write!(f, "Assembly error: {}", err),
            IngestionServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            IngestionServiceError::JobStateError(msg) => write!(f, "Job state error: {}", msg),
        }
    }
}

impl std::error::Error for IngestionServiceError {}

impl From<AssemblyError> for IngestionServiceError {
    fn from(err: AssemblyError) -> Self {
        IngestionServiceError::Assembly(err)
    }
}

impl From<FragmentSourceError> for IngestionServiceError {
    fn from(err: FragmentSourceError) -> Self {
        IngestionServiceError::FragmentSource(err.to_string())
    }
}

impl IngestionServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            IngestionServiceError::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            IngestionServiceError::FragmentSource(_) => "FRAGMENTS_UNAVAILABLE",
            IngestionServiceError::Assembly(err) => err.code(),
            IngestionServiceError::RepositoryError(_) => "REPOSITORY_ERROR",
            IngestionServiceError::JobStateError(_) => "JOB_STATE_ERROR",
        }
    }
}

/// Terminal state of one document's ingestion.
#[derive(Debug, Clone)]
pub struct IngestionOutcome {
    pub job: IngestionJob,
    pub warnings: Vec<UnresolvedReference>,
    pub error_code: Option<&'static str>,
}

enum Prepared {
    Unchanged(Fingerprint),
    Ready {
        fragments: Vec<Fragment>,
        fingerprint: Fingerprint,
    },
}

enum Stage {
    Unchanged(Fingerprint),
    Committed {
        fingerprint: Fingerprint,
        report: IngestionReport,
        warnings: Vec<UnresolvedReference>,
    },
}

pub struct IngestionService {
    assembler: Arc<GraphAssembler>,
    fragment_source: Arc<dyn FragmentSource>,
    document_repository: Arc<dyn DocumentRepository>,
    graph_repository: Arc<dyn GraphRepository>,
    job_repository: Arc<dyn JobRepository>,
    embedding_service: Option<Arc<EmbeddingService>>,
}

impl IngestionService {
    pub fn new(
        assembler: Arc<GraphAssembler>,
        fragment_source: Arc<dyn FragmentSource>,
        document_repository: Arc<dyn DocumentRepository>,
        graph_repository: Arc<dyn GraphRepository>,
        job_repository: Arc<dyn JobRepository>,
    ) -> Self {
        Self {
            assembler,
            fragment_source,
            document_repository,
            graph_repository,
            job_repository,
            embedding_service: None,
        }
    }

    /// Embed every committed node right after its graph lands.
    pub fn with_embedding(mut self, embedding_service: Arc<EmbeddingService>) -> Self {
        self.embedding_service = Some(embedding_service);
        self
    }

    /// Drives a pending job to a terminal state and persists every transition.
    ///
    /// Document-level failures end up in the returned job; `Err` means the job itself could
    /// not be updated.
    pub async fn run_job(
        &self,
        job: &mut IngestionJob,
    ) -> Result<IngestionOutcome, IngestionServiceError> {
        self.begin(job).await?;
        let started = Instant::now();
        let document_id = job.document_id().clone();

        let stage = match self.prepare(&document_id).await {
            Ok(Prepared::Unchanged(fingerprint)) => Ok(Stage::Unchanged(fingerprint)),
            Ok(Prepared::Ready {
                fragments,
                fingerprint,
            }) => match self.assemble(document_id, fragments).await {
                Ok(assembled) => self.commit(assembled, fingerprint, started).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        self.settle(job, stage).await
    }

    /// Assembles every document of a publication in parallel and commits each one on its own.
    pub async fn ingest_publication(
        &self,
        publication_id: &Identifier,
    ) -> Result<Vec<IngestionOutcome>, IngestionServiceError> {
        let documents = self
            .document_repository
            .find_by_publication(publication_id)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;

        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(documents.len());
        let mut waiting: HashMap<Identifier, (IngestionJob, Fingerprint)> = HashMap::new();
        let mut ready = Vec::new();

        for document in &documents {
            let mut job = IngestionJob::new(document.id().clone());
            self.job_repository
                .save(&job)
                .await
                .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;
            self.begin(&mut job).await?;

            match self.prepare(document.id()).await {
                Ok(Prepared::Ready {
                    fragments,
                    fingerprint,
                }) => {
                    ready.push((document.id().clone(), fragments));
                    waiting.insert(document.id().clone(), (job, fingerprint));
                }
                Ok(Prepared::Unchanged(fingerprint)) => {
                    outcomes.push(self.settle(&mut job, Ok(Stage::Unchanged(fingerprint))).await?);
                }
                Err(e) => outcomes.push(self.settle(&mut job, Err(e)).await?),
            }
        }

        let assembler = self.assembler.clone();
        let assembled = tokio::task::spawn_blocking(move || assembler.assemble_batch(ready))
            .await
            .map_err(|e| IngestionServiceError::JobStateError(e.to_string()))?;

        // Each document commits in its own transaction; one failure leaves the others intact.
        let commits = assembled.into_iter().filter_map(|(document_id, result)| {
            let (job, fingerprint) = waiting.remove(&document_id)?;
            Some(self.finish(job, fingerprint, result, started))
        });
        for outcome in join_all(commits).await {
            outcomes.push(outcome?);
        }

        info!(
            "Ingested publication {}: {} documents in {} ms",
            publication_id,
            outcomes.len(),
            started.elapsed().as_millis()
        );
        Ok(outcomes)
    }

    async fn finish(
        &self,
        mut job: IngestionJob,
        fingerprint: Fingerprint,
        assembled: Result<AssembledDocument, AssemblyError>,
        started: Instant,
    ) -> Result<IngestionOutcome, IngestionServiceError> {
        let stage = match assembled {
            Ok(document) => self.commit(document, fingerprint, started).await,
            Err(e) => Err(IngestionServiceError::Assembly(e)),
        };
        self.settle(&mut job, stage).await
    }

    async fn begin(&self, job: &mut IngestionJob) -> Result<(), IngestionServiceError> {
        job.start().map_err(IngestionServiceError::JobStateError)?;
        self.job_repository
            .update(job)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))
    }

    async fn prepare(&self, document_id: &Identifier) -> Result<Prepared, IngestionServiceError> {
        self.document_repository
            .find_by_id(document_id)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?
            .ok_or_else(|| IngestionServiceError::DocumentNotFound(document_id.clone()))?;

        let fragments = self.fragment_source.load(document_id).await?;
        let fingerprint = self
            .assembler
            .fingerprint(&fragments)
            .map_err(|e| IngestionServiceError::FragmentSource(e.to_string()))?;

        let previous = self
            .job_repository
            .last_ingested(document_id)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;
        if previous
            .as_ref()
            .and_then(|job| job.stream_fingerprint())
            .is_some_and(|last| last == &fingerprint)
        {
            return Ok(Prepared::Unchanged(fingerprint));
        }

        Ok(Prepared::Ready {
            fragments,
            fingerprint,
        })
    }

    async fn assemble(
        &self,
        document_id: Identifier,
        fragments: Vec<Fragment>,
    ) -> Result<AssembledDocument, IngestionServiceError> {
        let assembler = self.assembler.clone();
        tokio::task::spawn_blocking(move || assembler.assemble(&document_id, &fragments))
            .await
            .map_err(|e| IngestionServiceError::JobStateError(e.to_string()))?
            .map_err(IngestionServiceError::Assembly)
    }

    async fn commit(
        &self,
        assembled: AssembledDocument,
        fingerprint: Fingerprint,
        started: Instant,
    ) -> Result<Stage, IngestionServiceError> {
        let summary = self
            .graph_repository
            .commit(&assembled.graph)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;

        let embeddings_created = match &self.embedding_service {
            Some(service) => match service.embed_nodes(assembled.graph.nodes()).await {
                Ok(report) => report.embedded,
                Err(e) => {
                    // The graph is already committed; embeddings can be rebuilt on demand.
                    warn!(
                        "Embedding {} after commit failed: {}",
                        assembled.graph.document_id(),
                        e
                    );
                    0
                }
            },
            None => 0,
        };

        let report = IngestionReport {
            components_created: summary.components as i32,
            nodes_created: summary.nodes as i32,
            relations_created: summary.relations as i32,
            unresolved_references: assembled.warnings.len() as i32,
            embeddings_created: embeddings_created as i32,
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        Ok(Stage::Committed {
            fingerprint,
            report,
            warnings: assembled.warnings,
        })
    }

    async fn settle(
        &self,
        job: &mut IngestionJob,
        stage: Result<Stage, IngestionServiceError>,
    ) -> Result<IngestionOutcome, IngestionServiceError> {
        let (warnings, error_code) = match stage {
            Ok(Stage::Unchanged(fingerprint)) => {
                job.skip(fingerprint)
                    .map_err(IngestionServiceError::JobStateError)?;
                info!("Document {} unchanged since last ingestion, skipped", job.document_id());
                (Vec::new(), None)
            }
            Ok(Stage::Committed {
                fingerprint,
                report,
                warnings,
            }) => {
                info!(
                    "Ingested {}: {} components, {} nodes, {} relations, {} unresolved",
                    job.document_id(),
                    report.components_created,
                    report.nodes_created,
                    report.relations_created,
                    report.unresolved_references
                );
                job.complete(fingerprint, report)
                    .map_err(IngestionServiceError::JobStateError)?;
                (warnings, None)
            }
            Err(e) => {
                error!("Ingestion of {} failed: {}", job.document_id(), e);
                job.fail(e.to_string())
                    .map_err(IngestionServiceError::JobStateError)?;
                (Vec::new(), Some(e.code()))
            }
        };

        self.job_repository
            .update(job)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;

        Ok(IngestionOutcome {
            job: job.clone(),
            warnings,
            error_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Document;
    use crate::domain::graph::AssemblyOptions;
    use crate::domain::value_objects::{DocumentType, IngestionStatus, RelationType};
    use crate::infrastructure::in_memory::{
        FakeEmbeddingProvider, InMemoryDocumentRepository, InMemoryEmbeddingRepository,
        InMemoryFragmentSource, InMemoryGraphRepository, InMemoryJobRepository,
    };

    struct Harness {
        service: IngestionService,
        documents: Arc<InMemoryDocumentRepository>,
        fragments: Arc<InMemoryFragmentSource>,
        graphs: Arc<InMemoryGraphRepository>,
        jobs: Arc<InMemoryJobRepository>,
    }

    fn id(raw: &str) -> Identifier {
        Identifier::parse(raw).unwrap()
    }

    fn scenario() -> Vec<Fragment> {
        vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("Intro text¹"),
            Fragment::footnote("1: source note"),
            Fragment::paragraph("More text"),
        ]
    }

    async fn harness(documents: &[&str]) -> Harness {
        let document_repository = Arc::new(InMemoryDocumentRepository::default());
        for raw in documents {
            let document = Document::new(
                id(raw),
                id("pub_001"),
                DocumentType::Main,
                url::Url::parse(&format!("https://example.org/{}.pdf", raw)).unwrap(),
                "Full report".to_string(),
                "application/pdf".to_string(),
                "binary".to_string(),
                Some("en".to_string()),
                None,
            );
            document_repository.save(&document).await.unwrap();
        }

        let fragments = Arc::new(InMemoryFragmentSource::default());
        let graphs = Arc::new(InMemoryGraphRepository::default());
        let jobs = Arc::new(InMemoryJobRepository::default());
        let assembler = Arc::new(GraphAssembler::new(AssemblyOptions::default()).unwrap());

        Harness {
            service: IngestionService::new(
                assembler,
                fragments.clone(),
                document_repository.clone(),
                graphs.clone(),
                jobs.clone(),
            ),
            documents: document_repository,
            fragments,
            graphs,
            jobs,
        }
    }

    impl Harness {
        /// A second service over the same stores, assembling with other options.
        fn service_with(&self, options: AssemblyOptions) -> IngestionService {
            IngestionService::new(
                Arc::new(GraphAssembler::new(options).unwrap()),
                self.fragments.clone(),
                self.documents.clone(),
                self.graphs.clone(),
                self.jobs.clone(),
            )
        }
    }

    async fn queued(h: &Harness, document: &str) -> IngestionJob {
        let job = IngestionJob::new(id(document));
        h.jobs.save(&job).await.unwrap();
        job
    }

    #[tokio::test]
    async fn test_scenario_is_ingested() {
        let h = harness(&["doc_001"]).await;
        h.fragments.replace(&id("doc_001"), scenario());
        let mut job = queued(&h, "doc_001").await;

        let outcome = h.service.run_job(&mut job).await.unwrap();

        assert_eq!(outcome.job.status(), &IngestionStatus::Ingested);
        let report = outcome.job.report().unwrap();
        assert_eq!(report.components_created, 1);
        assert_eq!(report.nodes_created, 4);
        assert_eq!(report.relations_created, 1);
        assert_eq!(report.unresolved_references, 0);
        assert!(outcome.job.stream_fingerprint().is_some());

        let stored = h.jobs.find_by_id(job.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), &IngestionStatus::Ingested);
        assert_eq!(h.graphs.stored(&id("doc_001")).unwrap().nodes().len(), 4);
    }

    #[tokio::test]
    async fn test_unchanged_stream_is_skipped() {
        let h = harness(&["doc_001"]).await;
        h.fragments.replace(&id("doc_001"), scenario());

        let mut first = queued(&h, "doc_001").await;
        h.service.run_job(&mut first).await.unwrap();
        let mut second = queued(&h, "doc_001").await;
        let outcome = h.service.run_job(&mut second).await.unwrap();

        assert_eq!(outcome.job.status(), &IngestionStatus::Skipped);
        assert_eq!(h.graphs.commits(), 1);

        let mut changed = scenario();
        changed.push(Fragment::paragraph("Appendix text"));
        h.fragments.replace(&id("doc_001"), changed);
        let mut third = queued(&h, "doc_001").await;
        let outcome = h.service.run_job(&mut third).await.unwrap();

        assert_eq!(outcome.job.status(), &IngestionStatus::Ingested);
        assert_eq!(h.graphs.commits(), 2);
        assert_eq!(h.graphs.stored(&id("doc_001")).unwrap().nodes().len(), 5);
    }

    #[tokio::test]
    async fn test_changed_options_reingest_unchanged_stream() {
        let h = harness(&["doc_001"]).await;
        h.fragments.replace(&id("doc_001"), scenario());
        let mut first = queued(&h, "doc_001").await;
        h.service.run_job(&mut first).await.unwrap();

        let reconfigured = h.service_with(AssemblyOptions {
            emit_continuation_edges: true,
            ..Default::default()
        });
        let mut second = queued(&h, "doc_001").await;
        let outcome = reconfigured.run_job(&mut second).await.unwrap();

        assert_eq!(outcome.job.status(), &IngestionStatus::Ingested);
        assert_eq!(h.graphs.commits(), 2);
        assert_ne!(first.stream_fingerprint(), outcome.job.stream_fingerprint());
        let stored = h.graphs.stored(&id("doc_001")).unwrap();
        assert!(stored
            .relations()
            .iter()
            .any(|r| r.relation_type() == RelationType::Continues));

        let mut third = queued(&h, "doc_001").await;
        let outcome = reconfigured.run_job(&mut third).await.unwrap();
        assert_eq!(outcome.job.status(), &IngestionStatus::Skipped);
        assert_eq!(h.graphs.commits(), 2);
    }

    #[tokio::test]
    async fn test_fresh_store_reingestion_yields_identical_graph() {
        let h = harness(&["doc_001"]).await;
        h.fragments.replace(&id("doc_001"), scenario());
        let mut first = queued(&h, "doc_001").await;
        h.service.run_job(&mut first).await.unwrap();

        let fresh = harness(&["doc_001"]).await;
        fresh.fragments.replace(&id("doc_001"), scenario());
        let mut again = queued(&fresh, "doc_001").await;
        fresh.service.run_job(&mut again).await.unwrap();

        assert_eq!(
            fresh.graphs.stored(&id("doc_001")).unwrap(),
            h.graphs.stored(&id("doc_001")).unwrap()
        );
        assert_eq!(first.stream_fingerprint(), again.stream_fingerprint());
    }

    #[tokio::test]
    async fn test_fatal_assembly_error_fails_job_and_commits_nothing() {
        let h = harness(&["doc_001"]).await;
        h.fragments.replace(
            &id("doc_001"),
            vec![Fragment::paragraph("Text"), Fragment::footnote("no marker at all")],
        );
        let mut job = queued(&h, "doc_001").await;

        let outcome = h.service.run_job(&mut job).await.unwrap();

        assert!(outcome.job.status().is_failed());
        assert_eq!(outcome.error_code, Some("INVALID_FRAGMENT"));
        assert_eq!(h.graphs.commits(), 0);
        let stored = h.jobs.find_by_id(job.id()).await.unwrap().unwrap();
        assert!(stored.error_message().is_some());
    }

    #[tokio::test]
    async fn test_commit_failure_is_never_reported_as_ingested() {
        let h = harness(&["doc_001"]).await;
        h.fragments.replace(&id("doc_001"), scenario());
        h.graphs.fail_commits(true);
        let mut job = queued(&h, "doc_001").await;

        let outcome = h.service.run_job(&mut job).await.unwrap();

        assert!(outcome.job.status().is_failed());
        assert_eq!(outcome.error_code, Some("REPOSITORY_ERROR"));
        assert!(h.graphs.stored(&id("doc_001")).is_none());
    }

    #[tokio::test]
    async fn test_missing_stream_and_unknown_document() {
        let h = harness(&["doc_001"]).await;

        let mut job = queued(&h, "doc_001").await;
        let outcome = h.service.run_job(&mut job).await.unwrap();
        assert_eq!(outcome.error_code, Some("FRAGMENTS_UNAVAILABLE"));

        let mut job = queued(&h, "doc_009").await;
        let outcome = h.service.run_job(&mut job).await.unwrap();
        assert_eq!(outcome.error_code, Some("DOCUMENT_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_unresolved_references_are_reported_not_fatal() {
        let h = harness(&["doc_001"]).await;
        h.fragments.replace(
            &id("doc_001"),
            vec![Fragment::heading("Ch1", 1), Fragment::paragraph("See [7] and text²")],
        );
        let mut job = queued(&h, "doc_001").await;

        let outcome = h.service.run_job(&mut job).await.unwrap();

        assert_eq!(outcome.job.status(), &IngestionStatus::Ingested);
        assert_eq!(outcome.warnings.len(), 2);
        assert_eq!(outcome.job.report().unwrap().unresolved_references, 2);
        let graph = h.graphs.stored(&id("doc_001")).unwrap();
        assert!(graph.relations().iter().all(|r| r.is_flagged()));
    }

    #[tokio::test]
    async fn test_publication_batch_reports_per_document() {
        let h = harness(&["doc_001", "doc_002", "doc_003"]).await;
        h.fragments.replace(&id("doc_001"), scenario());
        h.fragments.replace(
            &id("doc_002"),
            vec![Fragment::heading("Annex", 1), Fragment::paragraph("Tables")],
        );
        h.fragments
            .replace(&id("doc_003"), vec![Fragment::footnote("orphan without marker")]);

        let mut outcomes = h.service.ingest_publication(&id("pub_001")).await.unwrap();
        outcomes.sort_by(|a, b| a.job.document_id().cmp(b.job.document_id()));

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].job.status(), &IngestionStatus::Ingested);
        assert_eq!(outcomes[1].job.status(), &IngestionStatus::Ingested);
        assert!(outcomes[2].job.status().is_failed());
        assert!(h.graphs.stored(&id("doc_002")).is_some());
        assert!(h.graphs.stored(&id("doc_003")).is_none());
    }

    #[tokio::test]
    async fn test_embed_on_ingest() {
        let h = harness(&["doc_001"]).await;
        let embeddings = Arc::new(InMemoryEmbeddingRepository::default());
        let embedding_service = Arc::new(EmbeddingService::new(
            Arc::new(FakeEmbeddingProvider::new(8)),
            embeddings.clone(),
        ));
        let service = h.service.with_embedding(embedding_service);
        h.fragments.replace(&id("doc_001"), scenario());
        let mut job = IngestionJob::new(id("doc_001"));
        h.jobs.save(&job).await.unwrap();

        let outcome = service.run_job(&mut job).await.unwrap();

        assert_eq!(outcome.job.report().unwrap().embeddings_created, 4);
        assert_eq!(embeddings.len(), 4);
    }
}
