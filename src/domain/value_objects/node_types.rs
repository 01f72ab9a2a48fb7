use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Closed string-backed enums persisted as VARCHAR columns.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Invalid {}: {}", stringify!($name), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

string_enum!(DocumentType {
    Main => "MAIN",
    Supplemental => "SUPPLEMENTAL",
    Other => "OTHER",
});

string_enum!(ComponentType {
    FrontMatter => "FRONT_MATTER",
    BodyMatter => "BODY_MATTER",
    BackMatter => "BACK_MATTER",
    TableOfContents => "TABLE_OF_CONTENTS",
    Chapter => "CHAPTER",
    Section => "SECTION",
    Subsection => "SUBSECTION",
    Appendix => "APPENDIX",
    Notes => "NOTES",
    Bibliography => "BIBLIOGRAPHY",
    List => "LIST",
    Header => "HEADER",
    Footer => "FOOTER",
});

string_enum!(ContentNodeType {
    Heading => "HEADING",
    Paragraph => "PARAGRAPH",
    ListItem => "LIST_ITEM",
    Table => "TABLE",
    Figure => "FIGURE",
    Caption => "CAPTION",
    Note => "NOTE",
    BibliographicEntry => "BIBLIOGRAPHIC_ENTRY",
    Sidebar => "SIDEBAR",
    PageHeader => "PAGE_HEADER",
    PageFooter => "PAGE_FOOTER",
});

string_enum!(RelationType {
    ReferencesNote => "REFERENCES_NOTE",
    ReferencesCitation => "REFERENCES_CITATION",
    IsCaptionOf => "IS_CAPTION_OF",
    IsSupplementaryTo => "IS_SUPPLEMENTARY_TO",
    Continues => "CONTINUES",
    CrossReferences => "CROSS_REFERENCES",
});

string_enum!(EmbeddingSource {
    Text => "TEXT",
    Description => "DESCRIPTION",
    Caption => "CAPTION",
});

impl ComponentType {
    /// Default container type for a heading at the given nesting level.
    pub fn for_heading_level(level: u32) -> Self {
        match level {
            0 | 1 => ComponentType::Chapter,
            2 => ComponentType::Section,
            _ => ComponentType::Subsection,
        }
    }

    pub fn is_top_level_matter(&self) -> bool {
        matches!(
            self,
            ComponentType::FrontMatter | ComponentType::BodyMatter | ComponentType::BackMatter
        )
    }
}

impl ContentNodeType {
    /// Types allowed to carry a non-zero minor sequence number.
    pub fn may_be_supplementary(&self) -> bool {
        match self {
            ContentNodeType::Note
            | ContentNodeType::Sidebar
            | ContentNodeType::Caption
            | ContentNodeType::PageHeader
            | ContentNodeType::PageFooter => true,
            ContentNodeType::Heading
            | ContentNodeType::Paragraph
            | ContentNodeType::ListItem
            | ContentNodeType::Table
            | ContentNodeType::Figure
            | ContentNodeType::BibliographicEntry => false,
        }
    }

    /// Source field used for embeddings when the producer does not say otherwise.
    pub fn default_embedding_source(&self) -> EmbeddingSource {
        match self {
            ContentNodeType::Figure => EmbeddingSource::Description,
            ContentNodeType::Heading
            | ContentNodeType::Paragraph
            | ContentNodeType::ListItem
            | ContentNodeType::Table
            | ContentNodeType::Caption
            | ContentNodeType::Note
            | ContentNodeType::BibliographicEntry
            | ContentNodeType::Sidebar
            | ContentNodeType::PageHeader
            | ContentNodeType::PageFooter => EmbeddingSource::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_conversion() {
        for node_type in ContentNodeType::ALL {
            let parsed: ContentNodeType = node_type.as_str().parse().unwrap();
            assert_eq!(*node_type, parsed);
        }
        for relation_type in RelationType::ALL {
            let parsed: RelationType = relation_type.to_string().parse().unwrap();
            assert_eq!(*relation_type, parsed);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            "references_note".parse::<RelationType>().unwrap(),
            RelationType::ReferencesNote
        );
        assert_eq!("main".parse::<DocumentType>().unwrap(), DocumentType::Main);
    }

    #[test]
    fn test_invalid_string_parsing() {
        assert!("CHUNK".parse::<ContentNodeType>().is_err());
        assert!("".parse::<EmbeddingSource>().is_err());
    }

    #[test]
    fn test_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&ContentNodeType::BibliographicEntry).unwrap();
        assert_eq!(json, "\"BIBLIOGRAPHIC_ENTRY\"");
        let component: ComponentType = serde_json::from_str("\"FRONT_MATTER\"").unwrap();
        assert_eq!(component, ComponentType::FrontMatter);
    }

    #[test]
    fn test_heading_levels_map_to_containers() {
        assert_eq!(ComponentType::for_heading_level(1), ComponentType::Chapter);
        assert_eq!(ComponentType::for_heading_level(2), ComponentType::Section);
        assert_eq!(ComponentType::for_heading_level(5), ComponentType::Subsection);
        assert!(ComponentType::BackMatter.is_top_level_matter());
        assert!(!ComponentType::Chapter.is_top_level_matter());
    }

    #[test]
    fn test_supplementary_types() {
        assert!(ContentNodeType::Note.may_be_supplementary());
        assert!(!ContentNodeType::Paragraph.may_be_supplementary());
        assert_eq!(
            ContentNodeType::Figure.default_embedding_source(),
            EmbeddingSource::Description
        );
    }
}
