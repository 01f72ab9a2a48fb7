use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::str::FromStr;

use crate::domain::entities::{ContentNode, DocumentComponent, Relation};
use crate::domain::value_objects::{
    ContentNodeType, Identifier, LogicalPageMap, PageRange, RelationType, SequenceKey,
};

use super::errors::AssemblyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationDirection {
    /// Targets of relations the node originates.
    SourceOf,
    /// Sources of relations pointing at the node.
    TargetOf,
}

impl FromStr for RelationDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source_of" | "outgoing" => Ok(RelationDirection::SourceOf),
            "target_of" | "incoming" => Ok(RelationDirection::TargetOf),
            other => Err(format!("Invalid relation direction: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingFormat {
    #[default]
    Plain,
    Markdown,
}

impl FromStr for HeadingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(HeadingFormat::Plain),
            "markdown" => Ok(HeadingFormat::Markdown),
            other => Err(format!("Invalid heading format: {}", other)),
        }
    }
}

/// Heading text in the requested format. Any markdown prefix already present is replaced.
pub fn render_heading_text(text: &str, depth: usize, format: HeadingFormat) -> String {
    let bare = text.trim_start_matches('#').trim();
    match format {
        HeadingFormat::Plain => bare.to_string(),
        HeadingFormat::Markdown => format!("{} {}", "#".repeat(depth.clamp(1, 6)), bare),
    }
}

/// A child of a component in sibling order.
#[derive(Debug, Clone, Copy)]
pub enum GraphEntry<'a> {
    Component(&'a DocumentComponent),
    Node(&'a ContentNode),
}

impl GraphEntry<'_> {
    fn sort_key(&self) -> (SequenceKey, u8) {
        match self {
            GraphEntry::Component(c) => (c.sequence(), 0),
            GraphEntry::Node(n) => (n.sequence(), 1),
        }
    }
}

/// Arena holding one document's components, nodes and relations.
///
/// Parents are identifier lookups into the arena; every insertion and reparenting walks the
/// ancestor chain so the component tree can never become cyclic.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentGraph {
    document_id: Identifier,
    components: Vec<DocumentComponent>,
    nodes: Vec<ContentNode>,
    relations: Vec<Relation>,
    component_index: HashMap<Identifier, usize>,
    node_index: HashMap<Identifier, usize>,
    relation_index: HashMap<Identifier, usize>,
}

impl DocumentGraph {
    pub fn new(document_id: Identifier) -> Self {
        Self {
            document_id,
            components: Vec::new(),
            nodes: Vec::new(),
            relations: Vec::new(),
            component_index: HashMap::new(),
            node_index: HashMap::new(),
            relation_index: HashMap::new(),
        }
    }

    /// Rebuild a graph from stored rows given in any order.
    pub fn from_parts(
        document_id: Identifier,
        components: Vec<DocumentComponent>,
        nodes: Vec<ContentNode>,
        relations: Vec<Relation>,
    ) -> Result<Self, AssemblyError> {
        let mut graph = Self::new(document_id);

        let mut remaining = components;
        while !remaining.is_empty() {
            let before = remaining.len();
            let (ready, blocked): (Vec<_>, Vec<_>) = remaining.into_iter().partition(|c| {
                c.parent_component_id()
                    .is_none_or(|parent| graph.component_index.contains_key(parent))
            });
            for component in ready {
                graph.insert_component(component)?;
            }
            if blocked.len() == before {
                let stuck = &blocked[0];
                let parent = stuck
                    .parent_component_id()
                    .cloned()
                    .unwrap_or_else(|| stuck.id().clone());
                let ids: HashSet<&Identifier> = blocked.iter().map(|c| c.id()).collect();
                return Err(if ids.contains(&parent) {
                    AssemblyError::StructuralCycle {
                        component_id: stuck.id().clone(),
                        parent_id: parent,
                    }
                } else {
                    AssemblyError::UnknownComponent(parent)
                });
            }
            remaining = blocked;
        }

        for node in nodes {
            graph.insert_node(node)?;
        }
        for relation in relations {
            graph.insert_relation(relation)?;
        }
        Ok(graph)
    }

    pub fn document_id(&self) -> &Identifier {
        &self.document_id
    }

    pub fn components(&self) -> &[DocumentComponent] {
        &self.components
    }

    pub fn nodes(&self) -> &[ContentNode] {
        &self.nodes
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn component(&self, id: &Identifier) -> Option<&DocumentComponent> {
        self.component_index.get(id).map(|&i| &self.components[i])
    }

    pub fn node(&self, id: &Identifier) -> Option<&ContentNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn relation(&self, id: &Identifier) -> Option<&Relation> {
        self.relation_index.get(id).map(|&i| &self.relations[i])
    }

    pub(crate) fn node_mut(&mut self, id: &Identifier) -> Option<&mut ContentNode> {
        self.node_index.get(id).map(|&i| &mut self.nodes[i])
    }

    pub(crate) fn relation_mut(&mut self, id: &Identifier) -> Option<&mut Relation> {
        self.relation_index.get(id).map(|&i| &mut self.relations[i])
    }

    pub fn insert_component(&mut self, component: DocumentComponent) -> Result<(), AssemblyError> {
        self.check_owner(component.id(), component.document_id())?;
        if self.component_index.contains_key(component.id()) {
            return Err(AssemblyError::DuplicateIdentifier(component.id().to_string()));
        }
        if let Some(parent) = component.parent_component_id() {
            self.check_ancestry(component.id(), parent)?;
        }

        self.component_index
            .insert(component.id().clone(), self.components.len());
        self.components.push(component);
        Ok(())
    }

    pub fn insert_node(&mut self, node: ContentNode) -> Result<(), AssemblyError> {
        self.check_owner(node.id(), node.document_id())?;
        if self.node_index.contains_key(node.id()) {
            return Err(AssemblyError::DuplicateIdentifier(node.id().to_string()));
        }
        if !self.component_index.contains_key(node.parent_component_id()) {
            return Err(AssemblyError::UnknownComponent(
                node.parent_component_id().clone(),
            ));
        }

        self.node_index.insert(node.id().clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    pub fn insert_relation(&mut self, relation: Relation) -> Result<(), AssemblyError> {
        self.check_owner(relation.id(), relation.document_id())?;
        if self.relation_index.contains_key(relation.id()) {
            return Err(AssemblyError::DuplicateIdentifier(relation.id().to_string()));
        }
        if !self.node_index.contains_key(relation.source_node_id()) {
            return Err(AssemblyError::UnknownNode(relation.source_node_id().clone()));
        }
        if let Some(target) = relation.target_node_id() {
            if !self.node_index.contains_key(target) {
                return Err(AssemblyError::UnknownNode(target.clone()));
            }
        }

        self.relation_index
            .insert(relation.id().clone(), self.relations.len());
        self.relations.push(relation);
        Ok(())
    }

    /// Moves a component under a new parent, refusing moves that would create a cycle.
    pub fn reparent_component(
        &mut self,
        id: &Identifier,
        new_parent: Option<Identifier>,
        sequence: SequenceKey,
    ) -> Result<(), AssemblyError> {
        let index = *self
            .component_index
            .get(id)
            .ok_or_else(|| AssemblyError::UnknownComponent(id.clone()))?;
        if let Some(parent) = &new_parent {
            self.check_ancestry(id, parent)?;
        }
        self.components[index].set_parent(new_parent, sequence);
        Ok(())
    }

    fn check_owner(&self, entity: &Identifier, owner: &Identifier) -> Result<(), AssemblyError> {
        if owner != &self.document_id {
            return Err(AssemblyError::ForeignEntity {
                entity_id: entity.clone(),
                document_id: self.document_id.clone(),
            });
        }
        Ok(())
    }

    /// Walks up from `parent`; reaching `component_id` means the attachment would close a loop.
    fn check_ancestry(
        &self,
        component_id: &Identifier,
        parent: &Identifier,
    ) -> Result<(), AssemblyError> {
        let cycle = || AssemblyError::StructuralCycle {
            component_id: component_id.clone(),
            parent_id: parent.clone(),
        };

        let mut current = Some(parent);
        let mut steps = 0;
        while let Some(id) = current {
            if id == component_id {
                return Err(cycle());
            }
            steps += 1;
            if steps > self.components.len() {
                return Err(cycle());
            }
            let ancestor = self
                .component(id)
                .ok_or_else(|| AssemblyError::UnknownComponent(id.clone()))?;
            current = ancestor.parent_component_id();
        }
        Ok(())
    }

    pub fn verify_acyclic(&self) -> Result<(), AssemblyError> {
        for component in &self.components {
            let mut seen = HashSet::new();
            let mut current = component.parent_component_id();
            while let Some(id) = current {
                if id == component.id() || !seen.insert(id) {
                    return Err(AssemblyError::StructuralCycle {
                        component_id: component.id().clone(),
                        parent_id: id.clone(),
                    });
                }
                current = self.component(id).and_then(|c| c.parent_component_id());
            }
        }
        Ok(())
    }

    pub fn roots(&self) -> Vec<&DocumentComponent> {
        let mut roots: Vec<&DocumentComponent> =
            self.components.iter().filter(|c| c.is_root()).collect();
        roots.sort_by_key(|c| c.sequence());
        roots
    }

    fn child_map(&self) -> HashMap<&Identifier, Vec<GraphEntry<'_>>> {
        let mut children: HashMap<&Identifier, Vec<GraphEntry<'_>>> = HashMap::new();
        for component in &self.components {
            if let Some(parent) = component.parent_component_id() {
                children
                    .entry(parent)
                    .or_default()
                    .push(GraphEntry::Component(component));
            }
        }
        for node in &self.nodes {
            children
                .entry(node.parent_component_id())
                .or_default()
                .push(GraphEntry::Node(node));
        }
        for entries in children.values_mut() {
            entries.sort_by_key(|entry| entry.sort_key());
        }
        children
    }

    pub fn children(&self, component_id: &Identifier) -> Vec<GraphEntry<'_>> {
        self.child_map().remove(component_id).unwrap_or_default()
    }

    /// Depth-first nodes under `component_id` in (major, minor) order.
    pub fn traverse(
        &self,
        component_id: &Identifier,
        include_supplementary: bool,
    ) -> Result<Vec<&ContentNode>, AssemblyError> {
        if !self.component_index.contains_key(component_id) {
            return Err(AssemblyError::UnknownComponent(component_id.clone()));
        }
        let children = self.child_map();
        let mut out = Vec::new();
        collect_depth_first(&children, component_id, include_supplementary, &mut out);
        Ok(out)
    }

    /// Logical reading order of the whole document.
    pub fn reading_order(&self, include_supplementary: bool) -> Vec<&ContentNode> {
        let children = self.child_map();
        let mut out = Vec::new();
        for root in self.roots() {
            collect_depth_first(&children, root.id(), include_supplementary, &mut out);
        }
        out
    }

    /// Number of components from the root down to and including `component_id`.
    pub fn depth(&self, component_id: &Identifier) -> usize {
        let mut depth = 0;
        let mut current = self.component(component_id);
        while let Some(component) = current {
            depth += 1;
            if depth > self.components.len() {
                break;
            }
            current = component
                .parent_component_id()
                .and_then(|parent| self.component(parent));
        }
        depth
    }

    /// Heading text of a HEADING node, formatted from the depth of the component it opens.
    pub fn render_heading(&self, node_id: &Identifier, format: HeadingFormat) -> Option<String> {
        let node = self.node(node_id)?;
        if node.node_type() != ContentNodeType::Heading {
            return None;
        }
        let depth = self.depth(node.parent_component_id());
        Some(render_heading_text(node.content()?, depth, format))
    }

    pub fn assign_reading_order(&mut self) {
        let order: Vec<Identifier> = self
            .reading_order(true)
            .into_iter()
            .map(|n| n.id().clone())
            .collect();
        for (position, id) in order.iter().enumerate() {
            if let Some(node) = self.node_mut(id) {
                node.set_sequence_in_document(position as i32 + 1);
            }
        }
    }

    /// Each component's range becomes the union of page coverage over its whole subtree.
    pub fn compute_page_ranges(&mut self) {
        let mut ranges: HashMap<Identifier, PageRange> = HashMap::new();
        let bound = self.components.len();

        for node in &self.nodes {
            let (Some(first), Some(last)) = (
                node.positional_data().first_page(),
                node.positional_data().last_page(),
            ) else {
                continue;
            };
            let range = PageRange {
                start: first,
                end: last,
            };

            let mut current = Some(node.parent_component_id());
            let mut steps = 0;
            while let Some(id) = current {
                ranges
                    .entry(id.clone())
                    .and_modify(|existing| *existing = existing.union(range))
                    .or_insert(range);
                steps += 1;
                if steps > bound {
                    break;
                }
                current = self.component(id).and_then(|c| c.parent_component_id());
            }
        }

        for component in self.components.iter_mut() {
            component.set_page_range(ranges.get(component.id()).copied());
        }
    }

    /// Checks the sibling-order rules for every parent in the tree.
    pub fn verify_sequences(&self) -> Result<(), AssemblyError> {
        let invalid = |parent: &Identifier, detail: String| AssemblyError::InvalidSequence {
            parent_id: parent.clone(),
            detail,
        };

        let mut root_majors = HashSet::new();
        for root in self.roots() {
            if root.sequence().is_supplementary() {
                return Err(invalid(
                    &self.document_id,
                    format!("component {} has minor {}", root.id(), root.sequence().minor),
                ));
            }
            if !root_majors.insert(root.sequence().major) {
                return Err(invalid(
                    &self.document_id,
                    format!("two root components share major {}", root.sequence().major),
                ));
            }
        }

        for (parent, entries) in self.child_map() {
            let mut primary_majors = HashSet::new();
            let mut node_majors = HashSet::new();
            let mut supplementary = BTreeSet::new();

            for entry in &entries {
                match entry {
                    GraphEntry::Component(c) => {
                        if c.sequence().is_supplementary() {
                            return Err(invalid(
                                parent,
                                format!("component {} has minor {}", c.id(), c.sequence().minor),
                            ));
                        }
                        if !primary_majors.insert(c.sequence().major) {
                            return Err(invalid(
                                parent,
                                format!("two primary entries share major {}", c.sequence().major),
                            ));
                        }
                    }
                    GraphEntry::Node(n) if !n.is_supplementary() => {
                        if !primary_majors.insert(n.sequence().major) {
                            return Err(invalid(
                                parent,
                                format!("two primary entries share major {}", n.sequence().major),
                            ));
                        }
                        node_majors.insert(n.sequence().major);
                    }
                    GraphEntry::Node(n) => {
                        if !n.node_type().may_be_supplementary() {
                            return Err(invalid(
                                parent,
                                format!("{} node {} has minor {}", n.node_type(), n.id(), n.sequence().minor),
                            ));
                        }
                        if !supplementary.insert(n.sequence()) {
                            return Err(invalid(
                                parent,
                                format!("duplicate supplementary position {}", n.sequence()),
                            ));
                        }
                    }
                }
            }

            for entry in &entries {
                if let GraphEntry::Node(n) = entry {
                    if !n.is_supplementary() {
                        continue;
                    }
                    let page_furniture = matches!(
                        n.node_type(),
                        ContentNodeType::PageHeader | ContentNodeType::PageFooter
                    ) && n.sequence().major == 0;
                    if !page_furniture && !node_majors.contains(&n.sequence().major) {
                        return Err(invalid(
                            parent,
                            format!(
                                "supplementary node {} has no primary trigger at major {}",
                                n.id(),
                                n.sequence().major
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Nodes of one type in reading order.
    pub fn filter_by_type(&self, node_type: ContentNodeType) -> Vec<&ContentNode> {
        self.reading_order(true)
            .into_iter()
            .filter(|n| n.node_type() == node_type)
            .collect()
    }

    pub fn nodes_on_page(&self, pdf_page: i32) -> Vec<&ContentNode> {
        self.reading_order(true)
            .into_iter()
            .filter(|n| n.covers_page(pdf_page))
            .collect()
    }

    pub fn nodes_in_page_range(&self, start: i32, end: i32) -> Vec<&ContentNode> {
        self.reading_order(true)
            .into_iter()
            .filter(|n| n.positional_data().overlaps_range(start, end))
            .collect()
    }

    pub fn unresolved_relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(|r| !r.is_resolved())
    }

    pub fn relations_of(
        &self,
        node_id: &Identifier,
        direction: RelationDirection,
    ) -> Vec<&Relation> {
        self.relations
            .iter()
            .filter(|r| match direction {
                RelationDirection::SourceOf => r.source_node_id() == node_id,
                RelationDirection::TargetOf => r.target_node_id() == Some(node_id),
            })
            .collect()
    }

    /// Nodes at the other end of the node's relations, optionally of one type.
    pub fn related_nodes(
        &self,
        node_id: &Identifier,
        relation_type: Option<RelationType>,
        direction: RelationDirection,
    ) -> Result<Vec<&ContentNode>, AssemblyError> {
        if !self.node_index.contains_key(node_id) {
            return Err(AssemblyError::UnknownNode(node_id.clone()));
        }

        Ok(self
            .relations_of(node_id, direction)
            .into_iter()
            .filter(|r| relation_type.is_none_or(|t| r.relation_type() == t))
            .filter_map(|r| match direction {
                RelationDirection::SourceOf => r.target_node_id(),
                RelationDirection::TargetOf => Some(r.source_node_id()),
            })
            .filter_map(|id| self.node(id))
            .collect())
    }

    /// Adds logical page labels; sequence numbers are untouched.
    pub fn apply_logical_pages(&mut self, labels: &LogicalPageMap) -> usize {
        self.nodes
            .iter_mut()
            .map(|node| node.positional_data_mut().apply_labels(labels))
            .sum()
    }
}

fn collect_depth_first<'a>(
    children: &HashMap<&Identifier, Vec<GraphEntry<'a>>>,
    component_id: &Identifier,
    include_supplementary: bool,
    out: &mut Vec<&'a ContentNode>,
) {
    let Some(entries) = children.get(component_id) else {
        return;
    };
    for entry in entries {
        match *entry {
            GraphEntry::Component(c) => {
                collect_depth_first(children, c.id(), include_supplementary, out)
            }
            GraphEntry::Node(n) => {
                if include_supplementary || !n.is_supplementary() {
                    out.push(n);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{ComponentType, PagePosition, PageNumbering, PositionalData};

    fn id(raw: &str) -> Identifier {
        Identifier::parse(raw).unwrap()
    }

    fn component(raw: &str, parent: Option<&str>, major: i32) -> DocumentComponent {
        DocumentComponent::new(
            id(raw),
            id("doc_001"),
            ComponentType::Section,
            None,
            parent.map(id),
            SequenceKey::primary(major),
        )
    }

    fn node(raw: &str, parent: &str, node_type: ContentNodeType, seq: SequenceKey, page: i32) -> ContentNode {
        ContentNode::new(id(raw), id("doc_001"), id(parent), node_type, seq)
            .with_content(Some(raw.to_string()))
            .with_positions(PositionalData::new(vec![PagePosition::on_page(page)]))
    }

    fn sample() -> DocumentGraph {
        let mut graph = DocumentGraph::new(id("doc_001"));
        graph.insert_component(component("cmp_001_0001", None, 1)).unwrap();
        graph
            .insert_component(component("cmp_001_0002", Some("cmp_001_0001"), 2))
            .unwrap();
        graph
            .insert_node(node("node_001_0001", "cmp_001_0001", ContentNodeType::Paragraph, SequenceKey::primary(1), 1))
            .unwrap();
        graph
            .insert_node(node("node_001_0002", "cmp_001_0002", ContentNodeType::Paragraph, SequenceKey::primary(1), 2))
            .unwrap();
        graph
            .insert_node(node("node_001_0003", "cmp_001_0002", ContentNodeType::Note, SequenceKey::supplementary(1, 1), 3))
            .unwrap();
        graph
            .insert_node(node("node_001_0004", "cmp_001_0001", ContentNodeType::Paragraph, SequenceKey::primary(3), 4))
            .unwrap();
        graph
    }

    #[test]
    fn test_depth_first_interleaves_components_and_nodes() {
        let graph = sample();
        let ids: Vec<String> = graph
            .reading_order(true)
            .iter()
            .map(|n| n.id().to_string())
            .collect();
        assert_eq!(
            ids,
            vec!["node_001_0001", "node_001_0002", "node_001_0003", "node_001_0004"]
        );

        let primary: Vec<String> = graph
            .traverse(&id("cmp_001_0002"), false)
            .unwrap()
            .iter()
            .map(|n| n.id().to_string())
            .collect();
        assert_eq!(primary, vec!["node_001_0002"]);
    }

    #[test]
    fn test_reparent_rejects_cycle() {
        let mut graph = sample();
        let result = graph.reparent_component(
            &id("cmp_001_0001"),
            Some(id("cmp_001_0002")),
            SequenceKey::primary(9),
        );
        assert!(matches!(result, Err(AssemblyError::StructuralCycle { .. })));
        assert!(graph.verify_acyclic().is_ok());

        let self_loop = graph.reparent_component(
            &id("cmp_001_0002"),
            Some(id("cmp_001_0002")),
            SequenceKey::primary(9),
        );
        assert!(matches!(self_loop, Err(AssemblyError::StructuralCycle { .. })));
    }

    #[test]
    fn test_insert_rejects_duplicates_and_unknown_parents() {
        let mut graph = sample();
        assert!(matches!(
            graph.insert_component(component("cmp_001_0001", None, 5)),
            Err(AssemblyError::DuplicateIdentifier(_))
        ));
        assert!(matches!(
            graph.insert_node(node("node_001_0009", "cmp_001_0042", ContentNodeType::Paragraph, SequenceKey::primary(1), 1)),
            Err(AssemblyError::UnknownComponent(_))
        ));
    }

    #[test]
    fn test_page_ranges_are_subtree_unions() {
        let mut graph = sample();
        graph.compute_page_ranges();
        assert_eq!(
            graph.component(&id("cmp_001_0001")).unwrap().page_range(),
            Some(PageRange { start: 1, end: 4 })
        );
        assert_eq!(
            graph.component(&id("cmp_001_0002")).unwrap().page_range(),
            Some(PageRange { start: 2, end: 3 })
        );
    }

    #[test]
    fn test_page_queries_follow_reading_order() {
        let graph = sample();
        assert_eq!(graph.nodes_on_page(2).len(), 1);
        let ranged: Vec<String> = graph
            .nodes_in_page_range(2, 4)
            .iter()
            .map(|n| n.id().to_string())
            .collect();
        assert_eq!(ranged, vec!["node_001_0002", "node_001_0003", "node_001_0004"]);
        assert!(graph.nodes_on_page(99).is_empty());
    }

    #[test]
    fn test_verify_sequences_detects_shared_major() {
        let mut graph = sample();
        graph
            .insert_node(node("node_001_0005", "cmp_001_0001", ContentNodeType::Paragraph, SequenceKey::primary(2), 5))
            .unwrap();
        assert!(matches!(
            graph.verify_sequences(),
            Err(AssemblyError::InvalidSequence { .. })
        ));
    }

    #[test]
    fn test_verify_sequences_detects_orphan_supplementary_and_bad_minor() {
        let mut orphan = sample();
        orphan
            .insert_node(node("node_001_0005", "cmp_001_0001", ContentNodeType::Note, SequenceKey::supplementary(7, 1), 5))
            .unwrap();
        assert!(orphan.verify_sequences().is_err());

        let mut bad_minor = sample();
        bad_minor
            .insert_node(node("node_001_0005", "cmp_001_0001", ContentNodeType::Paragraph, SequenceKey::supplementary(1, 1), 5))
            .unwrap();
        assert!(bad_minor.verify_sequences().is_err());

        assert!(sample().verify_sequences().is_ok());
    }

    #[test]
    fn test_related_nodes_by_direction() {
        let mut graph = sample();
        graph
            .insert_relation(Relation::resolved(
                id("rel_001_0001"),
                id("doc_001"),
                id("node_001_0002"),
                id("node_001_0003"),
                RelationType::ReferencesNote,
                Some("1".to_string()),
            ))
            .unwrap();

        let targets = graph
            .related_nodes(&id("node_001_0002"), Some(RelationType::ReferencesNote), RelationDirection::SourceOf)
            .unwrap();
        assert_eq!(targets[0].id(), &id("node_001_0003"));

        let sources = graph
            .related_nodes(&id("node_001_0003"), None, RelationDirection::TargetOf)
            .unwrap();
        assert_eq!(sources[0].id(), &id("node_001_0002"));

        assert!(graph
            .related_nodes(&id("node_001_0002"), Some(RelationType::CrossReferences), RelationDirection::SourceOf)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_from_parts_accepts_any_order() {
        let graph = sample();
        let mut components = graph.components().to_vec();
        components.reverse();

        let rebuilt = DocumentGraph::from_parts(
            id("doc_001"),
            components,
            graph.nodes().to_vec(),
            graph.relations().to_vec(),
        )
        .unwrap();
        assert_eq!(rebuilt.reading_order(true).len(), 4);
    }

    #[test]
    fn test_logical_pages_leave_sequences_alone() {
        let mut graph = sample();
        graph.assign_reading_order();
        let before: Vec<_> = graph.nodes().iter().map(|n| (n.sequence(), n.sequence_in_document())).collect();

        let changed = graph.apply_logical_pages(&LogicalPageMap::from_numbering(PageNumbering {
            first_arabic_page: 2,
            roman_front_matter: true,
        }));
        assert_eq!(changed, 4);

        let after: Vec<_> = graph.nodes().iter().map(|n| (n.sequence(), n.sequence_in_document())).collect();
        assert_eq!(before, after);
        assert_eq!(
            graph.node(&id("node_001_0001")).unwrap().positional_data().positions()[0]
                .logical_page
                .as_deref(),
            Some("i")
        );
    }

    #[test]
    fn test_render_heading_text() {
        assert_eq!(render_heading_text("Ch1", 1, HeadingFormat::Markdown), "# Ch1");
        assert_eq!(render_heading_text("## Methods", 3, HeadingFormat::Markdown), "### Methods");
        assert_eq!(render_heading_text("## Methods", 3, HeadingFormat::Plain), "Methods");
    }
}
