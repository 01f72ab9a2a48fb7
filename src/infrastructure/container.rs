use std::sync::Arc;
use tracing::info;

use crate::{
    application::{
        ports::{EmbeddingProvider, FragmentSource, IdentifierStore, JobQueue},
        services::{EmbeddingService, IdentifierService, IngestionService, QueryService},
        use_cases::{
            EmbedDocumentUseCase, EnrichLogicalPagesUseCase, GetJobStatusUseCase,
            GetPublicationUseCase, IngestPublicationUseCase, QueueIngestionUseCase,
            RecordDocumentStorageUseCase, RegisterPublicationUseCase,
        },
    },
    domain::{
        graph::GraphAssembler,
        repositories::{
            DocumentRepository, EmbeddingRepository, GraphRepository, JobRepository,
            PublicationRepository,
        },
    },
    infrastructure::{
        config::AppConfig,
        database::{
            create_connection_pool,
            repositories::{
                PostgresDocumentRepository, PostgresEmbeddingRepository, PostgresGraphRepository,
                PostgresJobRepository, PostgresPublicationRepository,
            },
            run_migrations,
        },
        external_services::{
            InferenceEmbeddingProvider, inference_client::EmbeddingsClientConfig,
        },
        file_system::{JsonFragmentSource, JsonIdentifierStore},
        messaging::{IngestionWorkerPool, MpscJobQueue},
    },
    presentation::http::handlers::{CatalogHandler, GraphHandler, JobHandler, SearchHandler},
};

pub struct AppContainer {
    // Repositories
    pub publication_repository: Arc<dyn PublicationRepository>,
    pub document_repository: Arc<dyn DocumentRepository>,
    pub graph_repository: Arc<dyn GraphRepository>,
    pub embedding_repository: Arc<dyn EmbeddingRepository>,
    pub job_repository: Arc<dyn JobRepository>,

    // External Services
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub fragment_source: Arc<dyn FragmentSource>,

    // Job Queue and Background Processing
    pub job_queue: Arc<dyn JobQueue>,
    pub worker_pool: Arc<IngestionWorkerPool>,

    // Application Services
    pub identifier_service: Arc<IdentifierService>,
    pub embedding_service: Arc<EmbeddingService>,
    pub ingestion_service: Arc<IngestionService>,
    pub query_service: Arc<QueryService>,

    // HTTP Handlers
    pub catalog_handler: Arc<CatalogHandler>,
    pub job_handler: Arc<JobHandler>,
    pub graph_handler: Arc<GraphHandler>,
    pub search_handler: Arc<SearchHandler>,
}

impl AppContainer {
    pub async fn new(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        // Create database connection pool and bring the schema up to date
        let db_pool = create_connection_pool(&config.database_url, config.database_pool_size)?;
        let applied = run_migrations(&db_pool)
            .map_err(|e| format!("Failed to run database migrations: {}", e))?;
        info!("Applied {} pending migrations", applied);

        // Create repositories
        let publication_repository: Arc<dyn PublicationRepository> =
            Arc::new(PostgresPublicationRepository::new(db_pool.clone()));
        let document_repository: Arc<dyn DocumentRepository> =
            Arc::new(PostgresDocumentRepository::new(db_pool.clone()));
        let graph_repository: Arc<dyn GraphRepository> =
            Arc::new(PostgresGraphRepository::new(db_pool.clone()));
        let embedding_repository: Arc<dyn EmbeddingRepository> =
            Arc::new(PostgresEmbeddingRepository::new(db_pool.clone()));
        let job_repository: Arc<dyn JobRepository> = Arc::new(PostgresJobRepository::new(db_pool));

        // Create external services
        let embedding_provider: Arc<dyn EmbeddingProvider> =
            Arc::new(InferenceEmbeddingProvider::from_config(EmbeddingsClientConfig::new(
                config.embeddings_service_url.clone(),
                config.embedding_model_name.clone(),
                config.embedding_dimension,
            ))?);

        let fragment_store = JsonFragmentSource::new(config.fragment_dir.clone());
        fragment_store
            .ensure_directory_exists()
            .await
            .map_err(|e| format!("Failed to create fragment directory: {}", e))?;
        let fragment_source: Arc<dyn FragmentSource> = Arc::new(fragment_store);

        let identifier_store: Arc<dyn IdentifierStore> =
            Arc::new(JsonIdentifierStore::new(config.identifier_table_path.clone()));
        let identifier_service = Arc::new(IdentifierService::load(identifier_store).await?);

        // Create application services
        let assembler = Arc::new(GraphAssembler::new(config.assembly)?);

        let embedding_service = Arc::new(EmbeddingService::new(
            embedding_provider.clone(),
            embedding_repository.clone(),
        ));

        let mut ingestion_service = IngestionService::new(
            assembler,
            fragment_source.clone(),
            document_repository.clone(),
            graph_repository.clone(),
            job_repository.clone(),
        );
        if config.embed_on_ingest {
            ingestion_service = ingestion_service.with_embedding(embedding_service.clone());
        }
        let ingestion_service = Arc::new(ingestion_service);

        let query_service = Arc::new(QueryService::new(
            graph_repository.clone(),
            embedding_repository.clone(),
            embedding_service.clone(),
        ));

        // Create job queue and worker pool
        let job_queue: Arc<dyn JobQueue> = Arc::new(MpscJobQueue::new());
        let worker_pool = Arc::new(
            IngestionWorkerPool::new(job_queue.clone(), ingestion_service.clone())
                .with_worker_count(config.ingest_workers),
        );

        // Create use cases
        let register_publication_use_case = Arc::new(RegisterPublicationUseCase::new(
            identifier_service.clone(),
            publication_repository.clone(),
            document_repository.clone(),
        ));

        let get_publication_use_case = Arc::new(GetPublicationUseCase::new(
            publication_repository.clone(),
            document_repository.clone(),
        ));

        let record_storage_use_case =
            Arc::new(RecordDocumentStorageUseCase::new(document_repository.clone()));

        let queue_ingestion_use_case = Arc::new(QueueIngestionUseCase::new(
            document_repository.clone(),
            job_repository.clone(),
            fragment_source.clone(),
            job_queue.clone(),
        ));

        let ingest_publication_use_case = Arc::new(IngestPublicationUseCase::new(
            publication_repository.clone(),
            ingestion_service.clone(),
        ));

        let get_job_status_use_case = Arc::new(GetJobStatusUseCase::new(job_repository.clone()));

        let enrich_logical_pages_use_case =
            Arc::new(EnrichLogicalPagesUseCase::new(graph_repository.clone()));

        let embed_document_use_case = Arc::new(EmbedDocumentUseCase::new(
            graph_repository.clone(),
            embedding_service.clone(),
        ));

        // Create HTTP handlers
        let catalog_handler = Arc::new(CatalogHandler::new(
            register_publication_use_case,
            get_publication_use_case,
            record_storage_use_case,
        ));

        let job_handler = Arc::new(JobHandler::new(
            queue_ingestion_use_case,
            ingest_publication_use_case,
            get_job_status_use_case,
        ));

        let graph_handler = Arc::new(GraphHandler::new(
            query_service.clone(),
            enrich_logical_pages_use_case,
        ));

        let search_handler = Arc::new(SearchHandler::new(
            query_service.clone(),
            embed_document_use_case,
        ));

        Ok(Self {
            publication_repository,
            document_repository,
            graph_repository,
            embedding_repository,
            job_repository,
            embedding_provider,
            fragment_source,
            job_queue,
            worker_pool,
            identifier_service,
            embedding_service,
            ingestion_service,
            query_service,
            catalog_handler,
            job_handler,
            graph_handler,
            search_handler,
        })
    }
}
