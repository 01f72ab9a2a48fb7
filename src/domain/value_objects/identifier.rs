use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Entity kinds that receive identifiers, each with a distinct prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Publication,
    Document,
    Component,
    Node,
    Relation,
    Embedding,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Publication,
        EntityKind::Document,
        EntityKind::Component,
        EntityKind::Node,
        EntityKind::Relation,
        EntityKind::Embedding,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Publication => "pub",
            EntityKind::Document => "doc",
            EntityKind::Component => "cmp",
            EntityKind::Node => "node",
            EntityKind::Relation => "rel",
            EntityKind::Embedding => "emb",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.prefix() == prefix)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdentifierError {
    Malformed(String),
    WrongKind { expected: EntityKind, found: String },
    Duplicate(String),
}

impl std::fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierError::Malformed(raw) => write!(f, "Malformed identifier: {}", raw),
            IdentifierError::WrongKind { expected, found } => {
                write!(f, "Expected a {} identifier, found {}", expected, found)
            }
            IdentifierError::Duplicate(id) => write!(f, "Duplicate identifier: {}", id),
        }
    }
}

impl std::error::Error for IdentifierError {}

/// A typed identifier rendered as `<prefix>_<body>`, e.g. `pub_001` or `node_004_0012`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    kind: EntityKind,
    body: String,
}

impl Identifier {
    fn new(kind: EntityKind, body: String) -> Self {
        Self { kind, body }
    }

    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let (prefix, body) = raw
            .split_once('_')
            .ok_or_else(|| IdentifierError::Malformed(raw.to_string()))?;

        let kind = EntityKind::from_prefix(prefix)
            .ok_or_else(|| IdentifierError::Malformed(raw.to_string()))?;

        let valid_body = !body.is_empty()
            && body
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_body {
            return Err(IdentifierError::Malformed(raw.to_string()));
        }

        Ok(Self::new(kind, body.to_string()))
    }

    pub fn parse_kind(raw: &str, expected: EntityKind) -> Result<Self, IdentifierError> {
        let id = Self::parse(raw)?;
        if id.kind != expected {
            return Err(IdentifierError::WrongKind {
                expected,
                found: raw.to_string(),
            });
        }
        Ok(id)
    }

    /// Identifier of an entity scoped to a document, numbered by stream position.
    pub fn scoped(kind: EntityKind, document: &Identifier, ordinal: u32) -> Self {
        Self::new(kind, format!("{}_{:04}", document.body, ordinal))
    }

    /// Embedding identifier derived from the owning node and a content fingerprint.
    pub fn for_embedding(node: &Identifier, fingerprint: &str) -> Self {
        let short: String = fingerprint.chars().take(12).collect();
        Self::new(EntityKind::Embedding, format!("{}_{}", node.body, short))
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn as_string(&self) -> String {
        format!("{}_{}", self.kind.prefix(), self.body)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.kind.prefix(), self.body)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Identifier::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.as_string()
    }
}

/// Allocation table for catalog identifiers keyed by natural identity (source or download URL).
///
/// Persisted alongside the corpus so re-runs hand out the same identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifierTable {
    #[serde(default)]
    counters: BTreeMap<EntityKind, u32>,
    #[serde(default)]
    entries: BTreeMap<EntityKind, BTreeMap<String, Identifier>>,
}

impl IdentifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(
        &mut self,
        kind: EntityKind,
        natural_key: &str,
    ) -> Result<Identifier, IdentifierError> {
        if let Some(existing) = self.lookup(kind, natural_key) {
            return Ok(existing.clone());
        }

        let next = self.counters.get(&kind).copied().unwrap_or(0) + 1;
        let candidate = Identifier::new(kind, format!("{:03}", next));

        let entries = self.entries.entry(kind).or_default();
        if entries.values().any(|issued| issued == &candidate) {
            return Err(IdentifierError::Duplicate(candidate.to_string()));
        }

        entries.insert(natural_key.to_string(), candidate.clone());
        self.counters.insert(kind, next);

        Ok(candidate)
    }

    pub fn lookup(&self, kind: EntityKind, natural_key: &str) -> Option<&Identifier> {
        self.entries
            .get(&kind)
            .and_then(|entries| entries.get(natural_key))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|entries| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Confirms that no identifier was issued for two different natural keys.
    pub fn verify(&self) -> Result<(), IdentifierError> {
        let mut seen = HashSet::new();
        for id in self.entries.values().flat_map(|entries| entries.values()) {
            if !seen.insert(id) {
                return Err(IdentifierError::Duplicate(id.to_string()));
            }
        }
        Ok(())
    }
}

/// Per-document allocator for components, nodes and relations.
///
/// Ordinals follow stream position, so assembling the same stream twice yields the same
/// identifiers without any shared state.
#[derive(Debug)]
pub struct DocumentScope {
    document_id: Identifier,
    next_component: u32,
    next_node: u32,
    next_relation: u32,
    issued: HashSet<Identifier>,
}

impl DocumentScope {
    pub fn new(document_id: Identifier) -> Self {
        Self {
            document_id,
            next_component: 0,
            next_node: 0,
            next_relation: 0,
            issued: HashSet::new(),
        }
    }

    pub fn document_id(&self) -> &Identifier {
        &self.document_id
    }

    pub fn allocate(&mut self, kind: EntityKind) -> Result<Identifier, IdentifierError> {
        let counter = match kind {
            EntityKind::Component => &mut self.next_component,
            EntityKind::Node => &mut self.next_node,
            EntityKind::Relation => &mut self.next_relation,
            other => {
                return Err(IdentifierError::WrongKind {
                    expected: EntityKind::Node,
                    found: other.prefix().to_string(),
                });
            }
        };
        *counter += 1;

        let id = Identifier::scoped(kind, &self.document_id, *counter);
        if !self.issued.insert(id.clone()) {
            return Err(IdentifierError::Duplicate(id.to_string()));
        }
        Ok(id)
    }
}
