use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::value_objects::Identifier;

/// One cataloged report. Append-only: created once from scraped metadata and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    id: Identifier,
    title: String,
    abstract_text: Option<String>,
    citation: String,
    authors: Vec<String>,
    publication_date: NaiveDate,
    source: String,
    source_url: Url,
    uri: Url,
}

impl Publication {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Identifier,
        title: String,
        abstract_text: Option<String>,
        citation: String,
        authors: Vec<String>,
        publication_date: NaiveDate,
        source: String,
        source_url: Url,
        uri: Url,
    ) -> Result<Self, String> {
        if title.trim().is_empty() {
            return Err("Publication title must not be empty".to_string());
        }
        if source.trim().is_empty() {
            return Err("Publication source must not be empty".to_string());
        }

        Ok(Self {
            id,
            title: title.trim().to_string(),
            abstract_text: abstract_text.filter(|a| !a.trim().is_empty()),
            citation,
            authors,
            publication_date,
            source,
            source_url,
            uri,
        })
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_text.as_deref()
    }

    pub fn citation(&self) -> &str {
        &self.citation
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn publication_date(&self) -> NaiveDate {
        self.publication_date
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_url(&self) -> &Url {
        &self.source_url
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }
}
