use chrono::NaiveDate;
use diesel::prelude::*;
use url::Url;

use crate::domain::entities::Publication;
use crate::domain::value_objects::Identifier;
use crate::infrastructure::database::schema::publication;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = publication)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PublicationModel {
    pub id: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub citation: String,
    pub authors: Vec<String>,
    pub publication_date: NaiveDate,
    pub source: String,
    pub source_url: String,
    pub uri: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = publication)]
pub struct NewPublicationModel {
    pub id: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub citation: String,
    pub authors: Vec<String>,
    pub publication_date: NaiveDate,
    pub source: String,
    pub source_url: String,
    pub uri: String,
}

impl From<&Publication> for NewPublicationModel {
    fn from(publication: &Publication) -> Self {
        Self {
            id: publication.id().as_string(),
            title: publication.title().to_string(),
            abstract_text: publication.abstract_text().map(str::to_string),
            citation: publication.citation().to_string(),
            authors: publication.authors().to_vec(),
            publication_date: publication.publication_date(),
            source: publication.source().to_string(),
            source_url: publication.source_url().to_string(),
            uri: publication.uri().to_string(),
        }
    }
}

impl TryFrom<PublicationModel> for Publication {
    type Error = String;

    fn try_from(model: PublicationModel) -> Result<Self, Self::Error> {
        let id = Identifier::parse(&model.id).map_err(|e| e.to_string())?;
        let source_url = Url::parse(&model.source_url)
            .map_err(|e| format!("Invalid source URL for {}: {}", model.id, e))?;
        let uri =
            Url::parse(&model.uri).map_err(|e| format!("Invalid URI for {}: {}", model.id, e))?;

        Publication::new(
            id,
            model.title,
            model.abstract_text,
            model.citation,
            model.authors,
            model.publication_date,
            model.source,
            source_url,
            uri,
        )
    }
}
