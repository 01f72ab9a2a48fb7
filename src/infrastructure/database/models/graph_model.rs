use diesel::prelude::*;

use crate::domain::entities::{ContentNode, DocumentComponent, Relation};
use crate::domain::value_objects::{
    ComponentType, ContentNodeType, EmbeddingSource, Identifier, PageRange, PositionalData,
    RelationType, SequenceKey,
};
use crate::infrastructure::database::schema::{content_node, document_component, relation};

fn parse_id(raw: &str) -> Result<Identifier, String> {
    Identifier::parse(raw).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = document_component)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ComponentModel {
    pub id: String,
    pub document_id: String,
    pub component_type: String,
    pub title: Option<String>,
    pub parent_component_id: Option<String>,
    pub sequence_in_parent_major: i32,
    pub sequence_in_parent_minor: i32,
    pub page_range_start: Option<i32>,
    pub page_range_end: Option<i32>,
}

impl From<&DocumentComponent> for ComponentModel {
    fn from(component: &DocumentComponent) -> Self {
        let range = component.page_range();
        Self {
            id: component.id().as_string(),
            document_id: component.document_id().as_string(),
            component_type: component.component_type().as_str().to_string(),
            title: component.title().map(str::to_string),
            parent_component_id: component.parent_component_id().map(Identifier::as_string),
            sequence_in_parent_major: component.sequence().major,
            sequence_in_parent_minor: component.sequence().minor,
            page_range_start: range.map(|r| r.start),
            page_range_end: range.map(|r| r.end),
        }
    }
}

impl TryFrom<ComponentModel> for DocumentComponent {
    type Error = String;

    fn try_from(model: ComponentModel) -> Result<Self, Self::Error> {
        let component_type: ComponentType = model.component_type.parse()?;
        let parent = model
            .parent_component_id
            .as_deref()
            .map(parse_id)
            .transpose()?;
        let page_range = match (model.page_range_start, model.page_range_end) {
            (Some(start), Some(end)) => Some(PageRange { start, end }),
            (None, None) => None,
            _ => return Err(format!("Component {} has half a page range", model.id)),
        };

        Ok(DocumentComponent::new(
            parse_id(&model.id)?,
            parse_id(&model.document_id)?,
            component_type,
            model.title,
            parent,
            SequenceKey::supplementary(
                model.sequence_in_parent_major,
                model.sequence_in_parent_minor,
            ),
        )
        .with_page_range(page_range))
    }
}

/// Also loadable from raw SQL for the JSONB page queries.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = content_node)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ContentNodeModel {
    pub id: String,
    pub document_id: String,
    pub parent_component_id: String,
    pub content_node_type: String,
    pub content: Option<String>,
    pub storage_url: Option<String>,
    pub caption: Option<String>,
    pub description: Option<String>,
    pub embedding_source: String,
    pub sequence_in_parent_major: i32,
    pub sequence_in_parent_minor: i32,
    pub sequence_in_document: Option<i32>,
    pub positional_data: serde_json::Value,
}

impl From<&ContentNode> for ContentNodeModel {
    fn from(node: &ContentNode) -> Self {
        Self {
            id: node.id().as_string(),
            document_id: node.document_id().as_string(),
            parent_component_id: node.parent_component_id().as_string(),
            content_node_type: node.node_type().as_str().to_string(),
            content: node.content().map(str::to_string),
            storage_url: node.storage_url().map(str::to_string),
            caption: node.caption().map(str::to_string),
            description: node.description().map(str::to_string),
            embedding_source: node.embedding_source().as_str().to_string(),
            sequence_in_parent_major: node.sequence().major,
            sequence_in_parent_minor: node.sequence().minor,
            sequence_in_document: node.sequence_in_document(),
            positional_data: node.positional_data().to_json(),
        }
    }
}

impl TryFrom<ContentNodeModel> for ContentNode {
    type Error = String;

    fn try_from(model: ContentNodeModel) -> Result<Self, Self::Error> {
        let node_type: ContentNodeType = model.content_node_type.parse()?;
        let embedding_source: EmbeddingSource = model.embedding_source.parse()?;
        let positions = PositionalData::try_from(model.positional_data)?;

        Ok(ContentNode::new(
            parse_id(&model.id)?,
            parse_id(&model.document_id)?,
            parse_id(&model.parent_component_id)?,
            node_type,
            SequenceKey::supplementary(
                model.sequence_in_parent_major,
                model.sequence_in_parent_minor,
            ),
        )
        .with_content(model.content)
        .with_storage_url(model.storage_url)
        .with_caption(model.caption)
        .with_description(model.description)
        .with_embedding_source(embedding_source)
        .with_sequence_in_document(model.sequence_in_document)
        .with_positions(positions))
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = relation)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct RelationModel {
    pub id: String,
    pub document_id: String,
    pub source_node_id: String,
    pub target_node_id: Option<String>,
    pub relation_type: String,
    pub marker_text: Option<String>,
    pub data_quality_flag: Option<String>,
}

impl From<&Relation> for RelationModel {
    fn from(relation: &Relation) -> Self {
        Self {
            id: relation.id().as_string(),
            document_id: relation.document_id().as_string(),
            source_node_id: relation.source_node_id().as_string(),
            target_node_id: relation.target_node_id().map(Identifier::as_string),
            relation_type: relation.relation_type().as_str().to_string(),
            marker_text: relation.marker_text().map(str::to_string),
            data_quality_flag: relation.data_quality_flag().map(str::to_string),
        }
    }
}

impl TryFrom<RelationModel> for Relation {
    type Error = String;

    fn try_from(model: RelationModel) -> Result<Self, Self::Error> {
        let relation_type: RelationType = model.relation_type.parse()?;
        let id = parse_id(&model.id)?;
        let document_id = parse_id(&model.document_id)?;
        let source = parse_id(&model.source_node_id)?;

        let relation = match model.target_node_id.as_deref() {
            Some(target) => Relation::resolved(
                id,
                document_id,
                source,
                parse_id(target)?,
                relation_type,
                model.marker_text,
            ),
            None => Relation::pending(id, document_id, source, relation_type, model.marker_text),
        };
        Ok(relation.with_flag(model.data_quality_flag))
    }
}
