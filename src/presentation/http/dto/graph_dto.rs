use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::application::use_cases::enrich_logical_pages::EnrichLogicalPagesResponse;
use crate::domain::entities::ContentNode;
use crate::domain::value_objects::{LogicalPageMap, PageNumbering, PositionalData};

#[derive(Debug, Serialize)]
pub struct ContentNodeDto {
    pub id: String,
    pub document_id: String,
    pub parent_component_id: String,
    pub node_type: String,
    pub content: Option<String>,
    pub caption: Option<String>,
    pub description: Option<String>,
    pub storage_url: Option<String>,
    pub embedding_source: String,
    pub sequence: String,
    pub sequence_in_document: Option<i32>,
    pub supplementary: bool,
    pub positional_data: PositionalData,
}

impl From<&ContentNode> for ContentNodeDto {
    fn from(node: &ContentNode) -> Self {
        let sequence = node.sequence();
        Self {
            id: node.id().to_string(),
            document_id: node.document_id().to_string(),
            parent_component_id: node.parent_component_id().to_string(),
            node_type: node.node_type().to_string(),
            content: node.content().map(|s| s.to_string()),
            caption: node.caption().map(|s| s.to_string()),
            description: node.description().map(|s| s.to_string()),
            storage_url: node.storage_url().map(|s| s.to_string()),
            embedding_source: node.embedding_source().to_string(),
            sequence: format!("{}.{}", sequence.major, sequence.minor),
            sequence_in_document: node.sequence_in_document(),
            supplementary: node.is_supplementary(),
            positional_data: node.positional_data().clone(),
        }
    }
}

pub fn node_dtos(nodes: &[ContentNode]) -> Vec<ContentNodeDto> {
    nodes.iter().map(ContentNodeDto::from).collect()
}

#[derive(Debug, Deserialize)]
pub struct NodeTypeQuery {
    #[serde(rename = "type")]
    pub node_type: String,
}

#[derive(Debug, Deserialize)]
pub struct PageRangeQuery {
    pub start: i32,
    pub end: i32,
}

#[derive(Debug, Deserialize)]
pub struct TraverseQuery {
    #[serde(default)]
    pub include_supplementary: bool,
}

#[derive(Debug, Deserialize)]
pub struct RelatedNodesQuery {
    pub relation_type: Option<String>,
    pub direction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HeadingQuery {
    #[serde(default)]
    pub markdown: bool,
}

/// Explicit labels keyed by PDF page, computed numbering, or both. Explicit labels win.
#[derive(Debug, Deserialize)]
pub struct LogicalPagesRequestDto {
    #[serde(default)]
    pub labels: BTreeMap<i32, String>,
    pub numbering: Option<PageNumbering>,
}

impl From<LogicalPagesRequestDto> for LogicalPageMap {
    fn from(dto: LogicalPagesRequestDto) -> Self {
        let map = match dto.numbering {
            Some(numbering) => LogicalPageMap::from_numbering(numbering),
            None => LogicalPageMap::default(),
        };
        dto.labels
            .into_iter()
            .fold(map, |map, (page, label)| map.with_label(page, label))
    }
}

#[derive(Debug, Serialize)]
pub struct LogicalPagesResponseDto {
    pub document_id: String,
    pub positions_labelled: usize,
    pub nodes_updated: usize,
}

impl LogicalPagesResponseDto {
    pub fn new(document_id: String, response: EnrichLogicalPagesResponse) -> Self {
        Self {
            document_id,
            positions_labelled: response.positions_labelled,
            nodes_updated: response.nodes_updated,
        }
    }
}
