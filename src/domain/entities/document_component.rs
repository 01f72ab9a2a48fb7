use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ComponentType, Identifier, PageRange, SequenceKey};

/// Structural container in a document's component tree.
///
/// Parents are held as identifiers so the tree stays serializable and can be checked for cycles
/// with an ancestor walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentComponent {
    id: Identifier,
    document_id: Identifier,
    component_type: ComponentType,
    title: Option<String>,
    parent_component_id: Option<Identifier>,
    sequence: SequenceKey,
    page_range: Option<PageRange>,
}

impl DocumentComponent {
    pub fn new(
        id: Identifier,
        document_id: Identifier,
        component_type: ComponentType,
        title: Option<String>,
        parent_component_id: Option<Identifier>,
        sequence: SequenceKey,
    ) -> Self {
        Self {
            id,
            document_id,
            component_type,
            title: title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            parent_component_id,
            sequence,
            page_range: None,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn document_id(&self) -> &Identifier {
        &self.document_id
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn parent_component_id(&self) -> Option<&Identifier> {
        self.parent_component_id.as_ref()
    }

    pub fn sequence(&self) -> SequenceKey {
        self.sequence
    }

    pub fn page_range(&self) -> Option<PageRange> {
        self.page_range
    }

    pub fn is_root(&self) -> bool {
        self.parent_component_id.is_none()
    }

    pub fn with_page_range(mut self, page_range: Option<PageRange>) -> Self {
        self.page_range = page_range;
        self
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Identifier>, sequence: SequenceKey) {
        self.parent_component_id = parent;
        self.sequence = sequence;
    }

    pub(crate) fn set_page_range(&mut self, page_range: Option<PageRange>) {
        self.page_range = page_range;
    }

    pub(crate) fn widen_page_range(&mut self, range: PageRange) {
        self.page_range = Some(match self.page_range {
            Some(existing) => existing.union(range),
            None => range,
        });
    }
}
