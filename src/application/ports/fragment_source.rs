use async_trait::async_trait;

use crate::domain::graph::Fragment;
use crate::domain::value_objects::Identifier;

#[derive(Debug)]
pub enum FragmentSourceError {
    NotFound(Identifier),
    IoError(String),
    ParseError { document_id: Identifier, message: String },
}

impl std::fmt::Display for FragmentSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentSourceError::NotFound(id) => write!(f, "No fragment stream for {}", id),
            FragmentSourceError::IoError(msg) => write!(f, "IO error: {}", msg),
            FragmentSourceError::ParseError {
                document_id,
                message,
            } => write!(f, "Malformed fragment stream for {}: {}", document_id, message),
        }
    }
}

impl std::error::Error for FragmentSourceError {}

/// Where upstream parsers leave each document's ordered fragment stream.
#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn load(&self, document_id: &Identifier) -> Result<Vec<Fragment>, FragmentSourceError>;

    async fn store(
        &self,
        document_id: &Identifier,
        fragments: &[Fragment],
    ) -> Result<(), FragmentSourceError>;

    async fn exists(&self, document_id: &Identifier) -> Result<bool, FragmentSourceError>;
}
