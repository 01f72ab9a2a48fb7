use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Identifier, RelationType};

/// Directed, typed edge between two content nodes.
///
/// `target_node_id` stays empty while the defining node has not been seen yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    id: Identifier,
    document_id: Identifier,
    source_node_id: Identifier,
    target_node_id: Option<Identifier>,
    relation_type: RelationType,
    marker_text: Option<String>,
    data_quality_flag: Option<String>,
}

impl Relation {
    pub fn pending(
        id: Identifier,
        document_id: Identifier,
        source_node_id: Identifier,
        relation_type: RelationType,
        marker_text: Option<String>,
    ) -> Self {
        Self {
            id,
            document_id,
            source_node_id,
            target_node_id: None,
            relation_type,
            marker_text,
            data_quality_flag: None,
        }
    }

    pub fn resolved(
        id: Identifier,
        document_id: Identifier,
        source_node_id: Identifier,
        target_node_id: Identifier,
        relation_type: RelationType,
        marker_text: Option<String>,
    ) -> Self {
        Self {
            target_node_id: Some(target_node_id),
            ..Self::pending(id, document_id, source_node_id, relation_type, marker_text)
        }
    }

    pub fn with_flag(mut self, flag: Option<String>) -> Self {
        self.data_quality_flag = flag;
        self
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn document_id(&self) -> &Identifier {
        &self.document_id
    }

    pub fn source_node_id(&self) -> &Identifier {
        &self.source_node_id
    }

    pub fn target_node_id(&self) -> Option<&Identifier> {
        self.target_node_id.as_ref()
    }

    pub fn relation_type(&self) -> RelationType {
        self.relation_type
    }

    pub fn marker_text(&self) -> Option<&str> {
        self.marker_text.as_deref()
    }

    pub fn data_quality_flag(&self) -> Option<&str> {
        self.data_quality_flag.as_deref()
    }

    pub fn is_resolved(&self) -> bool {
        self.target_node_id.is_some()
    }

    pub fn is_flagged(&self) -> bool {
        self.data_quality_flag.is_some()
    }

    pub fn touches(&self, node_id: &Identifier) -> bool {
        &self.source_node_id == node_id || self.target_node_id.as_ref() == Some(node_id)
    }

    /// Fills in the deferred target. A resolved relation is immutable.
    pub fn resolve(&mut self, target: Identifier) -> Result<(), String> {
        match &self.target_node_id {
            Some(existing) if existing != &target => Err(format!(
                "Relation {} already resolved to {}",
                self.id, existing
            )),
            _ => {
                self.target_node_id = Some(target);
                self.data_quality_flag = None;
                Ok(())
            }
        }
    }

    pub(crate) fn flag(&mut self, reason: String) {
        self.data_quality_flag = Some(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Relation {
        Relation::pending(
            Identifier::parse("rel_001_0001").unwrap(),
            Identifier::parse("doc_001").unwrap(),
            Identifier::parse("node_001_0002").unwrap(),
            RelationType::ReferencesNote,
            Some("1".to_string()),
        )
    }

    #[test]
    fn test_resolve_once() {
        let mut relation = pending();
        assert!(!relation.is_resolved());

        let target = Identifier::parse("node_001_0003").unwrap();
        relation.resolve(target.clone()).unwrap();
        assert!(relation.is_resolved());
        assert!(relation.touches(&target));

        assert!(relation.resolve(target).is_ok());
        assert!(
            relation
                .resolve(Identifier::parse("node_001_0009").unwrap())
                .is_err()
        );
    }

    #[test]
    fn test_flag_cleared_on_resolution() {
        let mut relation = pending();
        relation.flag("unresolved marker 1".to_string());
        assert!(relation.is_flagged());

        relation
            .resolve(Identifier::parse("node_001_0003").unwrap())
            .unwrap();
        assert!(!relation.is_flagged());
    }
}
