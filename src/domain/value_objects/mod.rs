pub mod identifier;
pub mod ingestion_status;
pub mod node_types;
pub mod positional_data;
pub mod sequence;
pub mod stream_fingerprint;

pub use identifier::{DocumentScope, EntityKind, Identifier, IdentifierError, IdentifierTable};
pub use ingestion_status::IngestionStatus;
pub use node_types::{ComponentType, ContentNodeType, DocumentType, EmbeddingSource, RelationType};
pub use positional_data::{
    BoundingBox, LogicalPageMap, PagePosition, PageNumbering, PageRange, PositionalData,
};
pub use sequence::SequenceKey;
pub use stream_fingerprint::Fingerprint;
