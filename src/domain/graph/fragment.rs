use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    ComponentType, EmbeddingSource, Fingerprint, PositionalData,
};

use super::markers::MarkerKind;

/// Reference marker supplied by the producer instead of being scanned from text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub kind: MarkerKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingFragment {
    pub text: String,
    #[serde(default = "default_heading_level")]
    pub level: u32,
    #[serde(default)]
    pub component_type: Option<ComponentType>,
    /// Cross-reference label this heading defines, e.g. "Section 2".
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub positions: PositionalData,
}

fn default_heading_level() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionStartFragment {
    pub component_type: ComponentType,
    #[serde(default)]
    pub title: Option<String>,
    /// Defaults to 0 for front/body/back matter and 1 otherwise.
    #[serde(default)]
    pub level: Option<u32>,
}

impl SectionStartFragment {
    pub fn effective_level(&self) -> u32 {
        self.level.unwrap_or(if self.component_type.is_top_level_matter() {
            0
        } else {
            1
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    /// Page-break continuation of the previous primary node.
    #[serde(default)]
    pub continues_previous: bool,
    #[serde(default)]
    pub markers: Option<Vec<MarkerSpec>>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub positions: PositionalData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFragment {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub storage_url: Option<String>,
    #[serde(default)]
    pub embedding_source: Option<EmbeddingSource>,
    #[serde(default)]
    pub positions: PositionalData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionFragment {
    pub text: String,
    /// Label of the table or figure this caption belongs to.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub positions: PositionalData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteFragment {
    /// Taken from a leading "1:" style prefix of `text` when absent.
    #[serde(default)]
    pub marker: Option<String>,
    pub text: String,
    #[serde(default)]
    pub positions: PositionalData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibliographyFragment {
    /// Citation key, e.g. "12" or "Smith, 2025"; derived from `text` when absent.
    #[serde(default)]
    pub key: Option<String>,
    pub text: String,
    #[serde(default)]
    pub positions: PositionalData,
}

/// One element of the ordered stream an upstream PDF parser emits for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fragment {
    Heading(HeadingFragment),
    SectionStart(SectionStartFragment),
    SectionEnd,
    Paragraph(TextFragment),
    ListItem(TextFragment),
    Table(MediaFragment),
    Figure(MediaFragment),
    Caption(CaptionFragment),
    FootnoteDef(NoteFragment),
    EndnoteDef(NoteFragment),
    BibliographyEntry(BibliographyFragment),
    Sidebar(TextFragment),
    PageHeader(TextFragment),
    PageFooter(TextFragment),
}

impl Fragment {
    pub fn heading(text: &str, level: u32) -> Self {
        Fragment::Heading(HeadingFragment {
            text: text.to_string(),
            level,
            component_type: None,
            label: None,
            positions: PositionalData::default(),
        })
    }

    pub fn paragraph(text: &str) -> Self {
        Fragment::Paragraph(TextFragment {
            text: text.to_string(),
            continues_previous: false,
            markers: None,
            label: None,
            positions: PositionalData::default(),
        })
    }

    pub fn footnote(text: &str) -> Self {
        Fragment::FootnoteDef(NoteFragment {
            marker: None,
            text: text.to_string(),
            positions: PositionalData::default(),
        })
    }

    pub fn with_positions(mut self, positions: PositionalData) -> Self {
        match &mut self {
            Fragment::Heading(f) => f.positions = positions,
            Fragment::Paragraph(f)
            | Fragment::ListItem(f)
            | Fragment::Sidebar(f)
            | Fragment::PageHeader(f)
            | Fragment::PageFooter(f) => f.positions = positions,
            Fragment::Table(f) | Fragment::Figure(f) => f.positions = positions,
            Fragment::Caption(f) => f.positions = positions,
            Fragment::FootnoteDef(f) | Fragment::EndnoteDef(f) => f.positions = positions,
            Fragment::BibliographyEntry(f) => f.positions = positions,
            Fragment::SectionStart(_) | Fragment::SectionEnd => {}
        }
        self
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Fragment::Heading(_) => "heading",
            Fragment::SectionStart(_) => "section_start",
            Fragment::SectionEnd => "section_end",
            Fragment::Paragraph(_) => "paragraph",
            Fragment::ListItem(_) => "list_item",
            Fragment::Table(_) => "table",
            Fragment::Figure(_) => "figure",
            Fragment::Caption(_) => "caption",
            Fragment::FootnoteDef(_) => "footnote_def",
            Fragment::EndnoteDef(_) => "endnote_def",
            Fragment::BibliographyEntry(_) => "bibliography_entry",
            Fragment::Sidebar(_) => "sidebar",
            Fragment::PageHeader(_) => "page_header",
            Fragment::PageFooter(_) => "page_footer",
        }
    }
}

/// SHA-256 over the canonical JSON form of the stream.
pub fn stream_fingerprint(fragments: &[Fragment]) -> Result<Fingerprint, serde_json::Error> {
    let bytes = serde_json::to_vec(fragments)?;
    Ok(Fingerprint::from_bytes(&bytes))
}

pub fn parse_stream(json: &str) -> Result<Vec<Fragment>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_stream() {
        let json = r#"[
            {"kind": "section_start", "component_type": "FRONT_MATTER"},
            {"kind": "heading", "text": "Ch1"},
            {"kind": "paragraph", "text": "Intro", "positions": [{"pdf_page": 3}]},
            {"kind": "paragraph", "text": "tail", "continues_previous": true},
            {"kind": "footnote_def", "text": "1: source note"},
            {"kind": "table", "label": "Table 1", "content": "| a |"},
            {"kind": "section_end"}
        ]"#;

        let fragments = parse_stream(json).unwrap();
        assert_eq!(fragments.len(), 7);

        match &fragments[0] {
            Fragment::SectionStart(start) => assert_eq!(start.effective_level(), 0),
            other => panic!("unexpected fragment {:?}", other),
        }
        match &fragments[1] {
            Fragment::Heading(heading) => assert_eq!(heading.level, 1),
            other => panic!("unexpected fragment {:?}", other),
        }
        match &fragments[2] {
            Fragment::Paragraph(p) => {
                assert!(!p.continues_previous);
                assert!(p.positions.covers_page(3));
            }
            other => panic!("unexpected fragment {:?}", other),
        }
        match &fragments[3] {
            Fragment::Paragraph(p) => assert!(p.continues_previous),
            other => panic!("unexpected fragment {:?}", other),
        }
        assert_eq!(fragments[6], Fragment::SectionEnd);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(parse_stream(r#"[{"kind": "marginalia", "text": "x"}]"#).is_err());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = vec![Fragment::heading("Ch1", 1), Fragment::paragraph("Intro")];
        let b = vec![Fragment::heading("Ch1", 1), Fragment::paragraph("Intro!")];

        assert_eq!(
            stream_fingerprint(&a).unwrap(),
            stream_fingerprint(&a.clone()).unwrap()
        );
        assert_ne!(stream_fingerprint(&a).unwrap(), stream_fingerprint(&b).unwrap());
    }
}
