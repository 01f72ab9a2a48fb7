pub mod embedding_provider;
pub mod fragment_source;
pub mod identifier_store;
pub mod job_queue;

pub use embedding_provider::EmbeddingProvider;
pub use fragment_source::FragmentSource;
pub use identifier_store::IdentifierStore;
pub use job_queue::JobQueue;
