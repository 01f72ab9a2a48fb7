use rayon::prelude::*;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, trace, warn};

use crate::domain::entities::{ContentNode, DocumentComponent, Relation};
use crate::domain::value_objects::{
    ComponentType, ContentNodeType, DocumentScope, EntityKind, Fingerprint, Identifier,
    RelationType, SequenceKey,
};

use super::document_graph::{render_heading_text, DocumentGraph, HeadingFormat};
use super::errors::{AssemblyError, UnresolvedReference};
use super::fragment::{
    stream_fingerprint, BibliographyFragment, CaptionFragment, Fragment, HeadingFragment,
    MarkerSpec, MediaFragment, NoteFragment, SectionStartFragment, TextFragment,
};
use super::markers::{normalize_key, Marker, MarkerKind, MarkerScanner};

/// What to do with running page headers and footers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderFooterPolicy {
    #[default]
    Discard,
    Nodes,
}

impl FromStr for HeaderFooterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discard" => Ok(HeaderFooterPolicy::Discard),
            "nodes" => Ok(HeaderFooterPolicy::Nodes),
            other => Err(format!("Invalid header/footer policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssemblyOptions {
    pub header_footer_policy: HeaderFooterPolicy,
    /// `Markdown` bakes `#` prefixes into heading content at ingestion.
    pub heading_format: HeadingFormat,
    pub emit_continuation_edges: bool,
}

/// Result of one successful pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledDocument {
    pub graph: DocumentGraph,
    pub warnings: Vec<UnresolvedReference>,
    pub fingerprint: Fingerprint,
    pub discarded_fragments: usize,
}

pub struct GraphAssembler {
    options: AssemblyOptions,
    scanner: MarkerScanner,
}

impl GraphAssembler {
    pub fn new(options: AssemblyOptions) -> Result<Self, regex::Error> {
        Ok(Self {
            options,
            scanner: MarkerScanner::new()?,
        })
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Fingerprint of the stream together with the options that shape its graph.
    pub fn fingerprint(&self, fragments: &[Fragment]) -> Result<Fingerprint, serde_json::Error> {
        let stream = stream_fingerprint(fragments)?;
        let options = format!("{:?}", self.options);
        Ok(Fingerprint::from_parts(&[stream.as_str(), &options]))
    }

    /// Builds the graph of one document from its fragment stream.
    pub fn assemble(
        &self,
        document_id: &Identifier,
        fragments: &[Fragment],
    ) -> Result<AssembledDocument, AssemblyError> {
        let fingerprint = self.fingerprint(fragments).map_err(|e| {
            AssemblyError::InvalidFragment {
                index: 0,
                reason: e.to_string(),
            }
        })?;

        let mut pass = AssemblyPass::new(document_id.clone(), &self.options, &self.scanner);
        for (index, fragment) in fragments.iter().enumerate() {
            pass.position = index;
            trace!("{} fragment {} ({})", document_id, index, fragment.kind_name());
            pass.apply(fragment)?;
        }
        let (graph, warnings, discarded_fragments) = pass.finish()?;

        debug!(
            "Assembled {}: {} components, {} nodes, {} relations, {} warnings",
            document_id,
            graph.components().len(),
            graph.nodes().len(),
            graph.relations().len(),
            warnings.len()
        );

        Ok(AssembledDocument {
            graph,
            warnings,
            fingerprint,
            discarded_fragments,
        })
    }

    /// Assembles several documents in parallel; each result stands alone.
    pub fn assemble_batch(
        &self,
        documents: Vec<(Identifier, Vec<Fragment>)>,
    ) -> Vec<(Identifier, Result<AssembledDocument, AssemblyError>)> {
        documents
            .into_par_iter()
            .map(|(document_id, fragments)| {
                let result = self.assemble(&document_id, &fragments);
                (document_id, result)
            })
            .collect()
    }
}

struct OpenComponent {
    id: Identifier,
    level: u32,
}

/// Marker lookup owned by one pass.
///
/// Note keys are scoped to the root component they occur in, since numbering
/// restarts per chapter. The latest definition of a note key answers later calls.
#[derive(Default)]
struct ReferenceIndex {
    pending: HashMap<(MarkerKind, String), Vec<Identifier>>,
    definitions: HashMap<(MarkerKind, String), Identifier>,
    pending_notes: HashMap<(Identifier, String), Vec<Identifier>>,
    notes: HashMap<(Identifier, String), Identifier>,
}

struct AssemblyPass<'a> {
    options: &'a AssemblyOptions,
    scanner: &'a MarkerScanner,
    scope: DocumentScope,
    graph: DocumentGraph,
    stack: Vec<OpenComponent>,
    root_major: i32,
    next_major: HashMap<Identifier, i32>,
    next_minor: HashMap<(Identifier, i32), i32>,
    last_primary: Option<Identifier>,
    last_primary_in: HashMap<Identifier, (Identifier, i32)>,
    references: ReferenceIndex,
    discarded: usize,
    position: usize,
}

impl<'a> AssemblyPass<'a> {
    fn new(document_id: Identifier, options: &'a AssemblyOptions, scanner: &'a MarkerScanner) -> Self {
        Self {
            options,
            scanner,
            scope: DocumentScope::new(document_id.clone()),
            graph: DocumentGraph::new(document_id),
            stack: Vec::new(),
            root_major: 0,
            next_major: HashMap::new(),
            next_minor: HashMap::new(),
            last_primary: None,
            last_primary_in: HashMap::new(),
            references: ReferenceIndex::default(),
            discarded: 0,
            position: 0,
        }
    }

    fn document_id(&self) -> Identifier {
        self.graph.document_id().clone()
    }

    fn apply(&mut self, fragment: &Fragment) -> Result<(), AssemblyError> {
        match fragment {
            Fragment::Heading(heading) => self.heading(heading),
            Fragment::SectionStart(start) => self.section_start(start),
            Fragment::SectionEnd => {
                self.stack.pop();
                Ok(())
            }
            Fragment::Paragraph(text) => self.text(ContentNodeType::Paragraph, text),
            Fragment::ListItem(text) => self.text(ContentNodeType::ListItem, text),
            Fragment::Table(media) => self.media(ContentNodeType::Table, media),
            Fragment::Figure(media) => self.media(ContentNodeType::Figure, media),
            Fragment::Caption(caption) => self.caption(caption),
            Fragment::FootnoteDef(note) => self.footnote(note),
            Fragment::EndnoteDef(note) => self.endnote(note),
            Fragment::BibliographyEntry(entry) => self.bibliography_entry(entry),
            Fragment::Sidebar(text) => self.sidebar(text),
            Fragment::PageHeader(text) => self.page_furniture(ContentNodeType::PageHeader, text),
            Fragment::PageFooter(text) => self.page_furniture(ContentNodeType::PageFooter, text),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> AssemblyError {
        AssemblyError::InvalidFragment {
            index: self.position,
            reason: reason.into(),
        }
    }

    // Component stack

    fn open_component(
        &mut self,
        component_type: ComponentType,
        title: Option<String>,
        level: u32,
    ) -> Result<Identifier, AssemblyError> {
        while self.stack.last().is_some_and(|open| open.level >= level) {
            self.stack.pop();
        }

        let parent = self.stack.last().map(|open| open.id.clone());
        let major = self.take_major(parent.as_ref());
        let id = self.scope.allocate(EntityKind::Component)?;

        self.graph.insert_component(DocumentComponent::new(
            id.clone(),
            self.document_id(),
            component_type,
            title,
            parent,
            SequenceKey::primary(major),
        ))?;
        self.stack.push(OpenComponent {
            id: id.clone(),
            level,
        });
        Ok(id)
    }

    /// Top of the stack, opening an implicit BODY_MATTER root when nothing is open.
    fn current_parent(&mut self) -> Result<Identifier, AssemblyError> {
        match self.stack.last() {
            Some(open) => Ok(open.id.clone()),
            None => self.open_component(ComponentType::BodyMatter, None, 0),
        }
    }

    fn root_of(&self, component: &Identifier) -> Identifier {
        let mut current = component.clone();
        while let Some(parent) = self
            .graph
            .component(&current)
            .and_then(|c| c.parent_component_id())
        {
            current = parent.clone();
        }
        current
    }

    fn root_of_node(&self, node: &Identifier) -> Option<Identifier> {
        self.graph
            .node(node)
            .map(|node| self.root_of(node.parent_component_id()))
    }

    fn take_major(&mut self, parent: Option<&Identifier>) -> i32 {
        match parent {
            None => {
                self.root_major += 1;
                self.root_major
            }
            Some(parent) => {
                let next = self.next_major.entry(parent.clone()).or_insert(1);
                let major = *next;
                *next += 1;
                major
            }
        }
    }

    fn take_minor(&mut self, parent: &Identifier, major: i32) -> i32 {
        let next = self
            .next_minor
            .entry((parent.clone(), major))
            .or_insert(1);
        let minor = *next;
        *next += 1;
        minor
    }

    // Node creation

    fn insert_node(
        &mut self,
        parent: &Identifier,
        node_type: ContentNodeType,
        sequence: SequenceKey,
        decorate: impl FnOnce(ContentNode) -> ContentNode,
    ) -> Result<Identifier, AssemblyError> {
        let id = self.scope.allocate(EntityKind::Node)?;
        let node = decorate(ContentNode::new(
            id.clone(),
            self.document_id(),
            parent.clone(),
            node_type,
            sequence,
        ));
        self.graph.insert_node(node)?;
        Ok(id)
    }

    fn push_primary(
        &mut self,
        node_type: ContentNodeType,
        decorate: impl FnOnce(ContentNode) -> ContentNode,
    ) -> Result<Identifier, AssemblyError> {
        let parent = self.current_parent()?;
        let major = self.take_major(Some(&parent));
        let id = self.insert_node(&parent, node_type, SequenceKey::primary(major), decorate)?;
        self.record_primary(&parent, &id, major)?;
        Ok(id)
    }

    fn push_supplementary(
        &mut self,
        parent: &Identifier,
        major: i32,
        node_type: ContentNodeType,
        decorate: impl FnOnce(ContentNode) -> ContentNode,
    ) -> Result<Identifier, AssemblyError> {
        let minor = self.take_minor(parent, major);
        self.insert_node(
            parent,
            node_type,
            SequenceKey::supplementary(major, minor),
            decorate,
        )
    }

    fn record_primary(
        &mut self,
        parent: &Identifier,
        id: &Identifier,
        major: i32,
    ) -> Result<(), AssemblyError> {
        if self.options.emit_continuation_edges {
            if let Some(previous) = self.last_primary.clone() {
                self.add_relation(id, Some(previous), RelationType::Continues, None)?;
            }
        }
        self.last_primary = Some(id.clone());
        self.last_primary_in
            .insert(parent.clone(), (id.clone(), major));
        Ok(())
    }

    fn add_relation(
        &mut self,
        source: &Identifier,
        target: Option<Identifier>,
        relation_type: RelationType,
        marker_text: Option<String>,
    ) -> Result<Identifier, AssemblyError> {
        let id = self.scope.allocate(EntityKind::Relation)?;
        let relation = match target {
            Some(target) => Relation::resolved(
                id.clone(),
                self.document_id(),
                source.clone(),
                target,
                relation_type,
                marker_text,
            ),
            None => Relation::pending(
                id.clone(),
                self.document_id(),
                source.clone(),
                relation_type,
                marker_text,
            ),
        };
        self.graph.insert_relation(relation)?;
        Ok(id)
    }

    // Reference resolution

    fn markers_for(&self, explicit: Option<&Vec<MarkerSpec>>, text: &str) -> Vec<Marker> {
        match explicit {
            Some(specs) => specs
                .iter()
                .map(|spec| Marker::new(spec.kind, &spec.text))
                .collect(),
            None => self.scanner.scan(text),
        }
    }

    fn link_markers(&mut self, source: &Identifier, markers: Vec<Marker>) -> Result<(), AssemblyError> {
        let root = self
            .root_of_node(source)
            .ok_or_else(|| AssemblyError::UnknownNode(source.clone()))?;

        for marker in markers {
            let relation_type = marker.kind.relation_type();
            let known = match marker.kind {
                MarkerKind::Note => self
                    .references
                    .notes
                    .get(&(root.clone(), marker.key.clone()))
                    .cloned(),
                MarkerKind::Citation | MarkerKind::CrossReference => self
                    .references
                    .definitions
                    .get(&(marker.kind, marker.key.clone()))
                    .cloned(),
            };

            match known {
                Some(target) if &target == source => {}
                Some(target) => {
                    self.add_relation(source, Some(target), relation_type, Some(marker.text))?;
                }
                None => {
                    let relation =
                        self.add_relation(source, None, relation_type, Some(marker.text))?;
                    match marker.kind {
                        MarkerKind::Note => self
                            .references
                            .pending_notes
                            .entry((root.clone(), marker.key))
                            .or_default()
                            .push(relation),
                        MarkerKind::Citation | MarkerKind::CrossReference => self
                            .references
                            .pending
                            .entry((marker.kind, marker.key))
                            .or_default()
                            .push(relation),
                    }
                }
            }
        }
        Ok(())
    }

    /// Registers `node` as the definition for a citation or label key and resolves what was waiting on it.
    fn define(&mut self, kind: MarkerKind, key: String, node: &Identifier) -> Result<(), AssemblyError> {
        let waiting = self
            .references
            .pending
            .remove(&(kind, key.clone()))
            .unwrap_or_default();
        self.references
            .definitions
            .entry((kind, key))
            .or_insert_with(|| node.clone());

        for relation_id in waiting {
            self.resolve(&relation_id, node)?;
        }
        Ok(())
    }

    /// Makes `node` the current definition of a note key under `root`.
    fn define_note(&mut self, root: Identifier, key: String, node: &Identifier) -> Result<(), AssemblyError> {
        let waiting = self
            .references
            .pending_notes
            .remove(&(root.clone(), key.clone()))
            .unwrap_or_default();
        self.references.notes.insert((root, key), node.clone());

        for relation_id in waiting {
            self.resolve(&relation_id, node)?;
        }
        Ok(())
    }

    fn resolve(&mut self, relation_id: &Identifier, target: &Identifier) -> Result<(), AssemblyError> {
        let relation = self
            .graph
            .relation_mut(relation_id)
            .ok_or_else(|| AssemblyError::UnknownNode(relation_id.clone()))?;
        relation
            .resolve(target.clone())
            .map_err(|reason| AssemblyError::InvalidFragment {
                index: self.position,
                reason,
            })?;

        if relation.relation_type() == RelationType::IsCaptionOf {
            let source = relation.source_node_id().clone();
            self.copy_caption(&source, target);
        }
        Ok(())
    }

    fn copy_caption(&mut self, caption_node: &Identifier, target: &Identifier) {
        let text = self
            .graph
            .node(caption_node)
            .and_then(|n| n.content())
            .map(str::to_string);
        if let Some(node) = self.graph.node_mut(target) {
            node.adopt_caption(text.as_deref());
        }
    }

    fn define_label(&mut self, label: Option<String>, node: &Identifier) -> Result<(), AssemblyError> {
        match label {
            Some(label) => self.define(
                MarkerKind::CrossReference,
                normalize_key(MarkerKind::CrossReference, &label),
                node,
            ),
            None => Ok(()),
        }
    }

    // Fragment handlers

    fn heading(&mut self, heading: &HeadingFragment) -> Result<(), AssemblyError> {
        let component_type = heading
            .component_type
            .unwrap_or_else(|| ComponentType::for_heading_level(heading.level));
        let component =
            self.open_component(component_type, Some(heading.text.clone()), heading.level)?;

        let content = match self.options.heading_format {
            HeadingFormat::Plain => heading.text.clone(),
            HeadingFormat::Markdown => {
                render_heading_text(&heading.text, self.stack.len(), HeadingFormat::Markdown)
            }
        };
        let positions = heading.positions.clone();
        let id = self.insert_node(
            &component,
            ContentNodeType::Heading,
            SequenceKey::primary(0),
            |node| node.with_content(Some(content)).with_positions(positions),
        )?;
        self.record_primary(&component, &id, 0)?;

        let label = heading
            .label
            .clone()
            .or_else(|| self.scanner.leading_label(&heading.text));
        self.define_label(label, &id)
    }

    fn section_start(&mut self, start: &SectionStartFragment) -> Result<(), AssemblyError> {
        self.open_component(
            start.component_type,
            start.title.clone(),
            start.effective_level(),
        )?;
        Ok(())
    }

    fn text(&mut self, node_type: ContentNodeType, text: &TextFragment) -> Result<(), AssemblyError> {
        let markers = self.markers_for(text.markers.as_ref(), &text.text);

        if text.continues_previous {
            if let Some(previous) = self.continuation_target() {
                if let Some(node) = self.graph.node_mut(&previous) {
                    node.append_continuation(Some(text.text.clone()), text.positions.clone());
                }
                return self.link_markers(&previous, markers);
            }
        }

        let content = text.text.clone();
        let positions = text.positions.clone();
        let id = self.push_primary(node_type, |node| {
            node.with_content(Some(content)).with_positions(positions)
        })?;
        self.define_label(text.label.clone(), &id)?;
        self.link_markers(&id, markers)
    }

    /// Last primary node of the open component, if it is running text.
    fn continuation_target(&self) -> Option<Identifier> {
        let parent = &self.stack.last()?.id;
        let (previous, _) = self.last_primary_in.get(parent)?;
        let node = self.graph.node(previous)?;
        matches!(
            node.node_type(),
            ContentNodeType::Paragraph | ContentNodeType::ListItem
        )
        .then(|| previous.clone())
    }

    fn media(&mut self, node_type: ContentNodeType, media: &MediaFragment) -> Result<(), AssemblyError> {
        let media = media.clone();
        let label = media.label.clone().or_else(|| {
            media
                .caption
                .as_deref()
                .and_then(|caption| self.scanner.leading_label(caption))
        });

        let id = self.push_primary(node_type, |node| {
            let node = node
                .with_content(media.content)
                .with_caption(media.caption)
                .with_description(media.description)
                .with_storage_url(media.storage_url)
                .with_positions(media.positions);
            match media.embedding_source {
                Some(source) => node.with_embedding_source(source),
                None => node,
            }
        })?;
        self.define_label(label, &id)
    }

    fn caption(&mut self, caption: &CaptionFragment) -> Result<(), AssemblyError> {
        let label = caption
            .label
            .clone()
            .or_else(|| self.scanner.leading_label(&caption.text));
        let parent = self.current_parent()?;
        let target = self.caption_target(&parent, label.as_deref());

        let content = caption.text.clone();
        let positions = caption.positions.clone();
        match target {
            Some((target, major)) => {
                let id = self.push_supplementary(&parent, major, ContentNodeType::Caption, |node| {
                    node.with_content(Some(content)).with_positions(positions)
                })?;
                self.add_relation(&id, Some(target.clone()), RelationType::IsCaptionOf, label.clone())?;
                self.copy_caption(&id, &target);
                self.define_label(label, &target)
            }
            None => {
                let id = self.push_primary(ContentNodeType::Caption, |node| {
                    node.with_content(Some(content)).with_positions(positions)
                })?;
                let relation =
                    self.add_relation(&id, None, RelationType::IsCaptionOf, label.clone())?;
                if let Some(label) = label {
                    let key = normalize_key(MarkerKind::CrossReference, &label);
                    match self
                        .references
                        .definitions
                        .get(&(MarkerKind::CrossReference, key.clone()))
                        .cloned()
                    {
                        Some(defined) => self.resolve(&relation, &defined)?,
                        None => self
                            .references
                            .pending
                            .entry((MarkerKind::CrossReference, key))
                            .or_default()
                            .push(relation),
                    }
                }
                Ok(())
            }
        }
    }

    /// The labelled table/figure in this component, else the immediately preceding one.
    fn caption_target(&self, parent: &Identifier, label: Option<&str>) -> Option<(Identifier, i32)> {
        let is_media = |node: &ContentNode| {
            matches!(
                node.node_type(),
                ContentNodeType::Table | ContentNodeType::Figure
            ) && node.parent_component_id() == parent
                && !node.is_supplementary()
        };

        let labelled = label
            .map(|label| normalize_key(MarkerKind::CrossReference, label))
            .and_then(|key| {
                self.references
                    .definitions
                    .get(&(MarkerKind::CrossReference, key))
            })
            .and_then(|id| self.graph.node(id))
            .filter(|node| is_media(*node));
        if let Some(node) = labelled {
            return Some((node.id().clone(), node.sequence().major));
        }

        let (previous, major) = self.last_primary_in.get(parent)?;
        let node = self.graph.node(previous)?;
        is_media(node).then(|| (previous.clone(), *major))
    }

    fn note_parts(&self, note: &NoteFragment) -> Result<(String, String), AssemblyError> {
        match &note.marker {
            Some(marker) => Ok((marker.clone(), note.text.clone())),
            None => self
                .scanner
                .split_note_prefix(&note.text)
                .ok_or_else(|| self.invalid("note definition without a marker")),
        }
    }

    fn footnote(&mut self, note: &NoteFragment) -> Result<(), AssemblyError> {
        let (marker, body) = self.note_parts(note)?;
        let key = normalize_key(MarkerKind::Note, &marker);
        let positions = note.positions.clone();

        let trigger = self
            .stack
            .first()
            .and_then(|root| {
                self.references
                    .pending_notes
                    .get(&(root.id.clone(), key.clone()))
            })
            .and_then(|waiting| waiting.first())
            .and_then(|relation| self.graph.relation(relation))
            .and_then(|relation| self.graph.node(relation.source_node_id()))
            .map(|node| (node.parent_component_id().clone(), node.sequence().major));

        let placement = match trigger {
            Some(found) => Some(found),
            None => {
                let parent = self.current_parent()?;
                self.last_primary_in
                    .get(&parent)
                    .map(|(_, major)| (parent.clone(), *major))
            }
        };

        let id = match placement {
            Some((parent, major)) => {
                self.push_supplementary(&parent, major, ContentNodeType::Note, |node| {
                    node.with_content(Some(body)).with_positions(positions)
                })?
            }
            None => self.push_primary(ContentNodeType::Note, |node| {
                node.with_content(Some(body)).with_positions(positions)
            })?,
        };
        let root = self
            .root_of_node(&id)
            .ok_or_else(|| AssemblyError::UnknownNode(id.clone()))?;
        self.define_note(root, key, &id)
    }

    /// Endnotes live in their own section and answer the earliest chapter still waiting on the key.
    fn endnote(&mut self, note: &NoteFragment) -> Result<(), AssemblyError> {
        let (marker, body) = self.note_parts(note)?;
        let key = normalize_key(MarkerKind::Note, &marker);
        let positions = note.positions.clone();
        let id = self.push_primary(ContentNodeType::Note, |node| {
            node.with_content(Some(body)).with_positions(positions)
        })?;

        let waiting_root = self
            .references
            .pending_notes
            .keys()
            .filter(|(_, waiting_key)| waiting_key == &key)
            .map(|(root, _)| root)
            .min_by_key(|root| self.graph.component(root).map(|c| c.sequence().major))
            .cloned();
        let root = match waiting_root {
            Some(root) => root,
            None => self
                .root_of_node(&id)
                .ok_or_else(|| AssemblyError::UnknownNode(id.clone()))?,
        };
        self.define_note(root, key, &id)
    }

    fn bibliography_entry(&mut self, entry: &BibliographyFragment) -> Result<(), AssemblyError> {
        let content = entry.text.clone();
        let positions = entry.positions.clone();
        let id = self.push_primary(ContentNodeType::BibliographicEntry, |node| {
            node.with_content(Some(content)).with_positions(positions)
        })?;

        let key = entry
            .key
            .clone()
            .or_else(|| self.scanner.bibliography_key(&entry.text));
        match key {
            Some(key) => self.define(
                MarkerKind::Citation,
                normalize_key(MarkerKind::Citation, &key),
                &id,
            ),
            None => Ok(()),
        }
    }

    fn sidebar(&mut self, text: &TextFragment) -> Result<(), AssemblyError> {
        let parent = self.current_parent()?;
        let content = text.text.clone();
        let positions = text.positions.clone();
        let decorate = |node: ContentNode| node.with_content(Some(content)).with_positions(positions);

        let id = match self.last_primary_in.get(&parent).cloned() {
            Some((trigger, major)) => {
                let id = self.push_supplementary(&parent, major, ContentNodeType::Sidebar, decorate)?;
                self.add_relation(&id, Some(trigger), RelationType::IsSupplementaryTo, None)?;
                id
            }
            None => self.push_primary(ContentNodeType::Sidebar, decorate)?,
        };

        let label = text
            .label
            .clone()
            .or_else(|| self.scanner.leading_label(&text.text));
        self.define_label(label, &id)?;
        let markers = self.markers_for(text.markers.as_ref(), &text.text);
        self.link_markers(&id, markers)
    }

    fn page_furniture(&mut self, node_type: ContentNodeType, text: &TextFragment) -> Result<(), AssemblyError> {
        if self.options.header_footer_policy == HeaderFooterPolicy::Discard {
            self.discarded += 1;
            return Ok(());
        }

        let parent = self.current_parent()?;
        let major = self
            .last_primary_in
            .get(&parent)
            .map(|(_, major)| *major)
            .unwrap_or(0);
        let content = text.text.clone();
        let positions = text.positions.clone();
        self.push_supplementary(&parent, major, node_type, |node| {
            node.with_content(Some(content)).with_positions(positions)
        })?;
        Ok(())
    }

    fn finish(mut self) -> Result<(DocumentGraph, Vec<UnresolvedReference>, usize), AssemblyError> {
        let unresolved: Vec<UnresolvedReference> = self
            .graph
            .unresolved_relations()
            .map(|relation| UnresolvedReference {
                document_id: relation.document_id().clone(),
                relation_id: relation.id().clone(),
                source_node_id: relation.source_node_id().clone(),
                relation_type: relation.relation_type(),
                marker_text: relation.marker_text().map(str::to_string),
            })
            .collect();

        for reference in &unresolved {
            warn!(
                "Unresolved reference in {}: relation {} marker {:?}",
                reference.document_id, reference.relation_id, reference.marker_text
            );
            if let Some(relation) = self.graph.relation_mut(&reference.relation_id) {
                relation.flag(reference.flag());
            }
        }

        self.graph.assign_reading_order();
        self.graph.compute_page_ranges();
        self.graph.verify_acyclic()?;
        self.graph.verify_sequences()?;

        Ok((self.graph, unresolved, self.discarded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::document_graph::RelationDirection;
    use crate::domain::value_objects::{PagePosition, PageRange, PositionalData};

    fn doc() -> Identifier {
        Identifier::parse("doc_001").unwrap()
    }

    fn assembler() -> GraphAssembler {
        GraphAssembler::new(AssemblyOptions::default()).unwrap()
    }

    fn on_page(fragment: Fragment, page: i32) -> Fragment {
        fragment.with_positions(PositionalData::new(vec![PagePosition::on_page(page)]))
    }

    fn text_fragment(text: &str) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            continues_previous: false,
            markers: None,
            label: None,
            positions: PositionalData::default(),
        }
    }

    fn media(label: Option<&str>) -> MediaFragment {
        MediaFragment {
            content: Some("| a | b |".to_string()),
            label: label.map(str::to_string),
            caption: None,
            description: None,
            storage_url: None,
            embedding_source: None,
            positions: PositionalData::default(),
        }
    }

    fn caption(text: &str) -> Fragment {
        Fragment::Caption(CaptionFragment {
            text: text.to_string(),
            label: None,
            positions: PositionalData::default(),
        })
    }

    fn summary(graph: &DocumentGraph) -> Vec<(ContentNodeType, String, String)> {
        graph
            .reading_order(true)
            .iter()
            .map(|n| {
                (
                    n.node_type(),
                    n.sequence().to_string(),
                    n.content().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_chapter_with_footnote_scenario() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("Intro text¹"),
            Fragment::footnote("1: source note"),
            Fragment::paragraph("More text"),
        ];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();
        let graph = &assembled.graph;

        assert_eq!(graph.components().len(), 1);
        let chapter = &graph.components()[0];
        assert_eq!(chapter.component_type(), ComponentType::Chapter);
        assert_eq!(chapter.title(), Some("Ch1"));

        assert_eq!(
            summary(graph),
            vec![
                (ContentNodeType::Heading, "0.0".to_string(), "Ch1".to_string()),
                (ContentNodeType::Paragraph, "1.0".to_string(), "Intro text¹".to_string()),
                (ContentNodeType::Note, "1.1".to_string(), "source note".to_string()),
                (ContentNodeType::Paragraph, "2.0".to_string(), "More text".to_string()),
            ]
        );

        assert_eq!(graph.relations().len(), 1);
        let relation = &graph.relations()[0];
        let intro = graph.reading_order(true)[1].id().clone();
        let note = graph.reading_order(true)[2].id().clone();
        assert_eq!(relation.relation_type(), RelationType::ReferencesNote);
        assert_eq!(relation.source_node_id(), &intro);
        assert_eq!(relation.target_node_id(), Some(&note));
        assert_eq!(relation.marker_text(), Some("1"));
        assert!(assembled.warnings.is_empty());
    }

    #[test]
    fn test_footnote_sits_between_trigger_and_next_primary() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("one"),
            Fragment::paragraph("two"),
            Fragment::paragraph("A with note³"),
            Fragment::footnote("3: the note"),
            Fragment::paragraph("B"),
        ];
        let graph = assembler().assemble(&doc(), &stream).unwrap().graph;
        let keys: Vec<String> = summary(&graph).into_iter().map(|(_, k, _)| k).collect();
        assert_eq!(keys, vec!["0.0", "1.0", "2.0", "3.0", "3.1", "4.0"]);

        let without: Vec<String> = graph
            .reading_order(false)
            .iter()
            .map(|n| n.sequence().to_string())
            .collect();
        assert_eq!(without, vec!["0.0", "1.0", "2.0", "3.0", "4.0"]);
    }

    #[test]
    fn test_heading_levels_nest_and_pop() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("a"),
            Fragment::heading("1.1", 2),
            Fragment::paragraph("b"),
            Fragment::heading("1.1.1", 3),
            Fragment::heading("1.2", 2),
            Fragment::heading("Ch2", 1),
        ];
        let graph = assembler().assemble(&doc(), &stream).unwrap().graph;

        let roots = graph.roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].title(), Some("Ch1"));
        assert_eq!(roots[1].title(), Some("Ch2"));

        let by_title = |title: &str| {
            graph
                .components()
                .iter()
                .find(|c| c.title() == Some(title))
                .unwrap()
                .clone()
        };
        assert_eq!(by_title("1.1").component_type(), ComponentType::Section);
        assert_eq!(by_title("1.1").parent_component_id(), Some(roots[0].id()));
        assert_eq!(by_title("1.1.1").parent_component_id(), Some(by_title("1.1").id()));
        assert_eq!(by_title("1.2").parent_component_id(), Some(roots[0].id()));
        // paragraph "a" is major 1, so "1.1" takes 2 and "1.2" takes 3.
        assert_eq!(by_title("1.1").sequence(), SequenceKey::primary(2));
        assert_eq!(by_title("1.2").sequence(), SequenceKey::primary(3));
    }

    #[test]
    fn test_content_before_heading_opens_body_matter() {
        let stream = vec![Fragment::paragraph("loose text"), Fragment::heading("Ch1", 1)];
        let graph = assembler().assemble(&doc(), &stream).unwrap().graph;

        let roots = graph.roots();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].component_type(), ComponentType::BodyMatter);
        let chapter = graph
            .components()
            .iter()
            .find(|c| c.component_type() == ComponentType::Chapter)
            .unwrap();
        assert_eq!(chapter.parent_component_id(), Some(roots[0].id()));
    }

    #[test]
    fn test_section_start_and_end() {
        let stream = vec![
            Fragment::SectionStart(SectionStartFragment {
                component_type: ComponentType::FrontMatter,
                title: None,
                level: None,
            }),
            Fragment::paragraph("foreword"),
            Fragment::SectionEnd,
            Fragment::paragraph("body"),
        ];
        let graph = assembler().assemble(&doc(), &stream).unwrap().graph;
        let roots = graph.roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].component_type(), ComponentType::FrontMatter);
        assert_eq!(roots[1].component_type(), ComponentType::BodyMatter);
    }

    #[test]
    fn test_unresolved_reference_is_flagged_not_dropped() {
        let stream = vec![Fragment::heading("Ch1", 1), Fragment::paragraph("Dangling⁷")];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();

        assert_eq!(assembled.warnings.len(), 1);
        assert_eq!(assembled.warnings[0].marker_text.as_deref(), Some("7"));
        let relation = &assembled.graph.relations()[0];
        assert!(!relation.is_resolved());
        assert!(relation.is_flagged());
    }

    #[test]
    fn test_orphan_note_definition_is_consumed_by_later_reference() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("first"),
            Fragment::footnote("2: early note"),
            Fragment::paragraph("late reference²"),
        ];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();
        assert!(assembled.warnings.is_empty());

        let graph = &assembled.graph;
        let note = graph.filter_by_type(ContentNodeType::Note)[0];
        let sources = graph
            .related_nodes(note.id(), Some(RelationType::ReferencesNote), RelationDirection::TargetOf)
            .unwrap();
        assert_eq!(sources[0].content(), Some("late reference²"));
    }

    fn note_target<'g>(graph: &'g DocumentGraph, source_text: &str) -> &'g ContentNode {
        let source = graph
            .nodes()
            .iter()
            .find(|n| n.content() == Some(source_text))
            .unwrap();
        graph
            .related_nodes(source.id(), Some(RelationType::ReferencesNote), RelationDirection::SourceOf)
            .unwrap()[0]
    }

    #[test]
    fn test_repeated_note_reference_reuses_definition() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("first¹"),
            Fragment::footnote("1: the note"),
            Fragment::paragraph("again, see note¹"),
        ];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();
        assert!(assembled.warnings.is_empty());

        let graph = &assembled.graph;
        assert_eq!(graph.relations().len(), 2);
        assert!(graph.relations().iter().all(|r| r.is_resolved()));
        assert_eq!(note_target(graph, "first¹").content(), Some("the note"));
        assert_eq!(note_target(graph, "again, see note¹").content(), Some("the note"));
    }

    #[test]
    fn test_note_numbering_restarts_per_chapter() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("first¹"),
            Fragment::footnote("1: ch1 note"),
            Fragment::paragraph("again¹"),
            Fragment::heading("Ch2", 1),
            Fragment::paragraph("second chapter¹"),
            Fragment::footnote("1: ch2 note"),
        ];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();
        assert!(assembled.warnings.is_empty());

        let graph = &assembled.graph;
        assert_eq!(note_target(graph, "again¹").content(), Some("ch1 note"));

        let ch2_note = note_target(graph, "second chapter¹");
        assert_eq!(ch2_note.content(), Some("ch2 note"));
        let chapter = graph.component(ch2_note.parent_component_id()).unwrap();
        assert_eq!(chapter.title(), Some("Ch2"));
        assert_eq!(ch2_note.sequence(), SequenceKey::supplementary(1, 1));
    }

    #[test]
    fn test_endnotes_stay_in_place() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("claim⁴"),
            Fragment::SectionStart(SectionStartFragment {
                component_type: ComponentType::Notes,
                title: Some("Notes".to_string()),
                level: Some(1),
            }),
            Fragment::EndnoteDef(NoteFragment {
                marker: Some("4".to_string()),
                text: "endnote body".to_string(),
                positions: PositionalData::default(),
            }),
        ];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();
        let graph = &assembled.graph;

        let note = graph.filter_by_type(ContentNodeType::Note)[0];
        assert!(!note.is_supplementary());
        let notes_section = graph.component(note.parent_component_id()).unwrap();
        assert_eq!(notes_section.component_type(), ComponentType::Notes);
        assert!(graph.relations()[0].is_resolved());
    }

    #[test]
    fn test_citations_resolve_in_both_directions() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("early [1] and (Smith et al., 2025)"),
            Fragment::BibliographyEntry(BibliographyFragment {
                key: None,
                text: "[1] Doe, A. Water policy.".to_string(),
                positions: PositionalData::default(),
            }),
            Fragment::BibliographyEntry(BibliographyFragment {
                key: None,
                text: "Smith, J. and Lee, K. (2025). Coasts.".to_string(),
                positions: PositionalData::default(),
            }),
            Fragment::paragraph("late [1]"),
        ];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();
        assert!(assembled.warnings.is_empty());

        let citations: Vec<&Relation> = assembled
            .graph
            .relations()
            .iter()
            .filter(|r| r.relation_type() == RelationType::ReferencesCitation)
            .collect();
        assert_eq!(citations.len(), 3);
        assert!(citations.iter().all(|r| r.is_resolved()));
        assert_eq!(citations[0].target_node_id(), citations[2].target_node_id());
    }

    #[test]
    fn test_caption_attaches_to_preceding_table() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("see Table 3 below"),
            Fragment::Table(media(None)),
            caption("Table 3: Emissions by sector"),
        ];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();
        let graph = &assembled.graph;

        let table = graph.filter_by_type(ContentNodeType::Table)[0];
        let caption = graph.filter_by_type(ContentNodeType::Caption)[0];
        assert_eq!(caption.sequence(), SequenceKey::supplementary(table.sequence().major, 1));
        assert_eq!(table.caption(), Some("Table 3: Emissions by sector"));

        let captioned = graph
            .related_nodes(caption.id(), Some(RelationType::IsCaptionOf), RelationDirection::SourceOf)
            .unwrap();
        assert_eq!(captioned[0].id(), table.id());

        // The forward cross-reference is resolved once the caption labels the table.
        let referenced = graph
            .related_nodes(table.id(), Some(RelationType::CrossReferences), RelationDirection::TargetOf)
            .unwrap();
        assert_eq!(referenced.len(), 1);
        assert!(assembled.warnings.is_empty());
    }

    #[test]
    fn test_caption_without_table_waits_on_label() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            caption("Figure 2: Map"),
            Fragment::paragraph("text"),
            Fragment::Figure(media(Some("Figure 2"))),
        ];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();
        let graph = &assembled.graph;

        let caption = graph.filter_by_type(ContentNodeType::Caption)[0];
        assert!(!caption.is_supplementary());
        let figure = graph.filter_by_type(ContentNodeType::Figure)[0];
        assert_eq!(figure.caption(), Some("Figure 2: Map"));
        assert!(assembled.warnings.is_empty());
    }

    #[test]
    fn test_sidebar_attaches_to_preceding_primary() {
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("context"),
            Fragment::Sidebar(text_fragment("Box 1: Case study")),
            Fragment::paragraph("As Box 1 shows"),
        ];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();
        let graph = &assembled.graph;

        let sidebar = graph.filter_by_type(ContentNodeType::Sidebar)[0];
        assert_eq!(sidebar.sequence(), SequenceKey::supplementary(1, 1));
        let anchors = graph
            .related_nodes(sidebar.id(), Some(RelationType::IsSupplementaryTo), RelationDirection::SourceOf)
            .unwrap();
        assert_eq!(anchors[0].content(), Some("context"));

        let cross = graph
            .related_nodes(sidebar.id(), Some(RelationType::CrossReferences), RelationDirection::TargetOf)
            .unwrap();
        assert_eq!(cross[0].content(), Some("As Box 1 shows"));
        // The sidebar's own label is not a reference to itself.
        assert!(graph
            .related_nodes(sidebar.id(), Some(RelationType::CrossReferences), RelationDirection::SourceOf)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_continuation_extends_previous_node() {
        let mut tail = text_fragment("across the page break.");
        tail.continues_previous = true;
        let stream = vec![
            Fragment::heading("Ch1", 1),
            on_page(Fragment::paragraph("A sentence that runs"), 4),
            on_page(Fragment::Paragraph(tail), 5),
        ];
        let graph = assembler().assemble(&doc(), &stream).unwrap().graph;

        let paragraphs = graph.filter_by_type(ContentNodeType::Paragraph);
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(
            paragraphs[0].content(),
            Some("A sentence that runs across the page break.")
        );
        assert_eq!(paragraphs[0].positional_data().positions().len(), 2);
        assert_eq!(graph.nodes_on_page(5).len(), 1);
        assert_eq!(
            graph.components()[0].page_range(),
            Some(PageRange { start: 4, end: 5 })
        );
    }

    #[test]
    fn test_continuation_after_heading_starts_new_paragraph() {
        let mut tail = text_fragment("text flowing from the previous page");
        tail.continues_previous = true;
        let stream = vec![Fragment::heading("Ch1", 1), Fragment::Paragraph(tail)];
        let graph = assembler().assemble(&doc(), &stream).unwrap().graph;

        assert_eq!(
            summary(&graph),
            vec![
                (ContentNodeType::Heading, "0.0".to_string(), "Ch1".to_string()),
                (
                    ContentNodeType::Paragraph,
                    "1.0".to_string(),
                    "text flowing from the previous page".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_continuation_does_not_cross_component_boundary() {
        let mut tail = text_fragment("continued");
        tail.continues_previous = true;
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("closing words of the chapter"),
            Fragment::heading("Scope", 2),
            Fragment::Paragraph(tail),
        ];
        let graph = assembler().assemble(&doc(), &stream).unwrap().graph;

        let paragraphs = graph.filter_by_type(ContentNodeType::Paragraph);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].content(), Some("closing words of the chapter"));
        let scope = graph.component(paragraphs[1].parent_component_id()).unwrap();
        assert_eq!(scope.title(), Some("Scope"));
        let headings = graph.filter_by_type(ContentNodeType::Heading);
        assert_eq!(headings[1].content(), Some("Scope"));
    }

    #[test]
    fn test_page_furniture_policy() {
        let stream = vec![
            Fragment::PageHeader(text_fragment("Annual Report")),
            Fragment::heading("Ch1", 1),
            Fragment::paragraph("body"),
            Fragment::PageFooter(text_fragment("page 3")),
        ];

        let discarded = assembler().assemble(&doc(), &stream).unwrap();
        assert_eq!(discarded.discarded_fragments, 2);
        assert!(discarded.graph.filter_by_type(ContentNodeType::PageFooter).is_empty());

        let kept = GraphAssembler::new(AssemblyOptions {
            header_footer_policy: HeaderFooterPolicy::Nodes,
            ..Default::default()
        })
        .unwrap()
        .assemble(&doc(), &stream)
        .unwrap();
        let header = kept.graph.filter_by_type(ContentNodeType::PageHeader)[0];
        assert_eq!(header.sequence(), SequenceKey::supplementary(0, 1));
        let footer = kept.graph.filter_by_type(ContentNodeType::PageFooter)[0];
        assert_eq!(footer.sequence(), SequenceKey::supplementary(1, 1));
    }

    #[test]
    fn test_markdown_headings_and_continuation_edges() {
        let options = AssemblyOptions {
            heading_format: HeadingFormat::Markdown,
            emit_continuation_edges: true,
            ..Default::default()
        };
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::heading("Scope", 2),
            Fragment::paragraph("text"),
        ];
        let graph = GraphAssembler::new(options)
            .unwrap()
            .assemble(&doc(), &stream)
            .unwrap()
            .graph;

        let headings: Vec<&str> = graph
            .filter_by_type(ContentNodeType::Heading)
            .iter()
            .filter_map(|n| n.content())
            .collect();
        assert_eq!(headings, vec!["# Ch1", "## Scope"]);

        let continues = graph
            .relations()
            .iter()
            .filter(|r| r.relation_type() == RelationType::Continues)
            .count();
        assert_eq!(continues, 2);
    }

    #[test]
    fn test_note_without_marker_is_rejected() {
        let stream = vec![Fragment::heading("Ch1", 1), Fragment::footnote("no marker")];
        let result = assembler().assemble(&doc(), &stream);
        assert!(matches!(
            result,
            Err(AssemblyError::InvalidFragment { index: 1, .. })
        ));
    }

    #[test]
    fn test_explicit_markers_override_scanner() {
        let mut paragraph = text_fragment("mentions Table 9 but cites nothing");
        paragraph.markers = Some(vec![MarkerSpec {
            kind: MarkerKind::Note,
            text: "*".to_string(),
        }]);
        let stream = vec![
            Fragment::heading("Ch1", 1),
            Fragment::Paragraph(paragraph),
            Fragment::FootnoteDef(NoteFragment {
                marker: Some("*".to_string()),
                text: "starred".to_string(),
                positions: PositionalData::default(),
            }),
        ];
        let assembled = assembler().assemble(&doc(), &stream).unwrap();
        assert_eq!(assembled.graph.relations().len(), 1);
        assert!(assembled.warnings.is_empty());
    }

    #[test]
    fn test_batch_assembly_is_independent_per_document() {
        let good = vec![Fragment::heading("Ch1", 1), Fragment::paragraph("ok")];
        let bad = vec![Fragment::footnote("no marker")];
        let results = assembler().assemble_batch(vec![
            (Identifier::parse("doc_001").unwrap(), good),
            (Identifier::parse("doc_002").unwrap(), bad),
        ]);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.to_string(), "doc_001");
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }

    mod properties {
        use super::*;
        use crate::domain::graph::markers::superscript_to_ascii;

        struct Lcg(u64);

        impl Lcg {
            fn next(&mut self) -> u64 {
                self.0 = self
                    .0
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                self.0 >> 33
            }
        }

        fn superscript(n: u32) -> String {
            n.to_string()
                .chars()
                .map(|c| match c {
                    '0' => '⁰',
                    '1' => '¹',
                    '2' => '²',
                    '3' => '³',
                    '4' => '⁴',
                    '5' => '⁵',
                    '6' => '⁶',
                    '7' => '⁷',
                    '8' => '⁸',
                    _ => '⁹',
                })
                .collect()
        }

        fn flush_notes(stream: &mut Vec<Fragment>, pending: &mut Vec<u32>) {
            for n in pending.drain(..) {
                stream.push(Fragment::footnote(&format!("{}: note {}", n, n)));
            }
        }

        /// Random headings and paragraphs; every note reference gets a definition
        /// later in the same top-level component.
        fn generated_stream(seed: u64) -> (Vec<Fragment>, Vec<String>) {
            let mut rng = Lcg(seed);
            let mut stream = Vec::new();
            let mut primary_texts = Vec::new();
            let mut pending = Vec::new();
            let mut notes = 0;
            let mut root_level: Option<u32> = None;

            for i in 0..80 {
                match rng.next() % 7 {
                    0 => {
                        let text = format!("H{}", i);
                        let level = 1 + (rng.next() % 3) as u32;
                        if root_level.map_or(true, |root| level <= root) {
                            flush_notes(&mut stream, &mut pending);
                            root_level = Some(level);
                        }
                        stream.push(Fragment::heading(&text, level));
                        primary_texts.push(text);
                    }
                    1 if !pending.is_empty() => {
                        let n: u32 = pending.remove(0);
                        stream.push(Fragment::footnote(&format!("{}: note {}", n, n)));
                    }
                    _ => {
                        let mut text = format!("P{}", i);
                        if rng.next() % 3 == 0 {
                            notes += 1;
                            text.push_str(&superscript(notes));
                            pending.push(notes);
                        }
                        root_level.get_or_insert(0);
                        stream.push(Fragment::paragraph(&text));
                        primary_texts.push(text);
                    }
                }
            }
            flush_notes(&mut stream, &mut pending);
            (stream, primary_texts)
        }

        #[test]
        fn test_generated_streams_hold_graph_invariants() {
            for seed in 1..25 {
                let (stream, primary_texts) = generated_stream(seed);
                let assembled = assembler().assemble(&doc(), &stream).unwrap();
                let graph = &assembled.graph;

                // acyclic, and components only ever hang under components
                assert!(graph.verify_acyclic().is_ok());
                for component in graph.components() {
                    if let Some(parent) = component.parent_component_id() {
                        assert_eq!(parent.kind(), EntityKind::Component);
                    }
                }
                for node in graph.nodes() {
                    assert!(graph.component(node.parent_component_id()).is_some());
                }

                // reading order reproduces the stream's primary content
                let read: Vec<&str> = graph
                    .reading_order(false)
                    .iter()
                    .filter_map(|n| n.content())
                    .collect();
                assert_eq!(read, primary_texts, "seed {}", seed);

                // every reference was defined, so nothing stays pending
                assert!(assembled.warnings.is_empty(), "seed {}", seed);
                assert!(graph.relations().iter().all(|r| r.is_resolved()));
                for relation in graph.relations() {
                    let marker = relation.marker_text().unwrap();
                    let target = graph.node(relation.target_node_id().unwrap()).unwrap();
                    assert_eq!(target.content(), Some(format!("note {}", marker).as_str()));
                    let source = graph.node(relation.source_node_id()).unwrap();
                    assert_eq!(target.sequence().major, source.sequence().major);
                    assert_eq!(target.parent_component_id(), source.parent_component_id());
                    assert!(superscript_to_ascii(source.content().unwrap()).ends_with(marker));
                }

                // reading-order indices are dense and follow traversal
                let indices: Vec<i32> = graph
                    .reading_order(true)
                    .iter()
                    .filter_map(|n| n.sequence_in_document())
                    .collect();
                assert_eq!(indices, (1..=graph.nodes().len() as i32).collect::<Vec<_>>());
            }
        }

        #[test]
        fn test_reassembly_is_identical() {
            for seed in 1..10 {
                let (stream, _) = generated_stream(seed);
                let first = assembler().assemble(&doc(), &stream).unwrap();
                let second = assembler().assemble(&doc(), &stream).unwrap();
                assert_eq!(first, second);
            }
        }
    }
}
