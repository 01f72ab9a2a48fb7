use crate::domain::value_objects::{Identifier, IdentifierError, RelationType};

/// Fatal problems that abort a single document's assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyError {
    StructuralCycle {
        component_id: Identifier,
        parent_id: Identifier,
    },
    DuplicateIdentifier(String),
    InvalidSequence {
        parent_id: Identifier,
        detail: String,
    },
    UnknownComponent(Identifier),
    UnknownNode(Identifier),
    ForeignEntity {
        entity_id: Identifier,
        document_id: Identifier,
    },
    InvalidFragment {
        index: usize,
        reason: String,
    },
    Identifier(IdentifierError),
}

impl std::fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssemblyError::StructuralCycle {
                component_id,
                parent_id,
            } => write!(
                f,
                "Structural cycle: attaching {} under {} would make it its own ancestor",
                component_id, parent_id
            ),
            AssemblyError::DuplicateIdentifier(id) => write!(f, "Duplicate identifier: {}", id),
            AssemblyError::InvalidSequence { parent_id, detail } => {
                write!(f, "Invalid sequence in {}: {}", parent_id, detail)
            }
            AssemblyError::UnknownComponent(id) => write!(f, "Unknown component: {}", id),
            AssemblyError::UnknownNode(id) => write!(f, "Unknown content node: {}", id),
            AssemblyError::ForeignEntity {
                entity_id,
                document_id,
            } => write!(f, "{} does not belong to document {}", entity_id, document_id),
            AssemblyError::InvalidFragment { index, reason } => {
                write!(f, "Invalid fragment at position {}: {}", index, reason)
            }
            AssemblyError::Identifier(err) => write!(f, "Identifier error: {}", err),
        }
    }
}

impl std::error::Error for AssemblyError {}

impl From<IdentifierError> for AssemblyError {
    fn from(err: IdentifierError) -> Self {
        match err {
            IdentifierError::Duplicate(id) => AssemblyError::DuplicateIdentifier(id),
            other => AssemblyError::Identifier(other),
        }
    }
}

impl AssemblyError {
    /// Stable machine-readable code for reports and API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AssemblyError::StructuralCycle { .. } => "STRUCTURAL_CYCLE",
            AssemblyError::DuplicateIdentifier(_) => "DUPLICATE_IDENTIFIER",
            AssemblyError::InvalidSequence { .. } => "INVALID_SEQUENCE",
            AssemblyError::UnknownComponent(_) | AssemblyError::UnknownNode(_) => {
                "UNKNOWN_ENTITY"
            }
            AssemblyError::ForeignEntity { .. } => "FOREIGN_ENTITY",
            AssemblyError::InvalidFragment { .. } => "INVALID_FRAGMENT",
            AssemblyError::Identifier(_) => "INVALID_IDENTIFIER",
        }
    }
}

/// Non-fatal: a reference whose target never appeared in the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedReference {
    pub document_id: Identifier,
    pub relation_id: Identifier,
    pub source_node_id: Identifier,
    pub relation_type: RelationType,
    pub marker_text: Option<String>,
}

impl UnresolvedReference {
    pub fn flag(&self) -> String {
        match &self.marker_text {
            Some(marker) => format!("unresolved {} marker '{}'", self.relation_type, marker),
            None => format!("unresolved {} without marker", self.relation_type),
        }
    }
}

impl std::fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: relation {} from {} is {}",
            self.document_id,
            self.relation_id,
            self.source_node_id,
            self.flag()
        )
    }
}
