use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self, String> {
        if x2 < x1 || y2 < y1 {
            return Err(format!(
                "Bounding box corners out of order: ({}, {}) ({}, {})",
                x1, y1, x2, y2
            ));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }
}

/// One physically contiguous piece of a node on a single PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePosition {
    pub pdf_page: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl PagePosition {
    pub fn on_page(pdf_page: i32) -> Self {
        Self {
            pdf_page,
            logical_page: None,
            bounding_box: None,
        }
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }
}

/// Ordered positional tuples of a content node, stored as a JSONB array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionalData(Vec<PagePosition>);

impl PositionalData {
    pub fn new(positions: Vec<PagePosition>) -> Self {
        Self(positions)
    }

    pub fn positions(&self) -> &[PagePosition] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, position: PagePosition) {
        self.0.push(position);
    }

    pub fn extend(&mut self, other: PositionalData) {
        self.0.extend(other.0);
    }

    pub fn covers_page(&self, pdf_page: i32) -> bool {
        self.0.iter().any(|p| p.pdf_page == pdf_page)
    }

    pub fn overlaps_range(&self, start: i32, end: i32) -> bool {
        self.0
            .iter()
            .any(|p| p.pdf_page >= start && p.pdf_page <= end)
    }

    pub fn first_page(&self) -> Option<i32> {
        self.0.iter().map(|p| p.pdf_page).min()
    }

    pub fn last_page(&self) -> Option<i32> {
        self.0.iter().map(|p| p.pdf_page).max()
    }

    /// Fills in logical page labels; returns how many tuples changed.
    pub fn apply_labels(&mut self, labels: &LogicalPageMap) -> usize {
        let mut changed = 0;
        for position in self.0.iter_mut() {
            if let Some(label) = labels.label_for(position.pdf_page) {
                if position.logical_page.as_deref() != Some(label.as_str()) {
                    position.logical_page = Some(label);
                    changed += 1;
                }
            }
        }
        changed
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
    }
}

impl TryFrom<serde_json::Value> for PositionalData {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map_err(|e| format!("Invalid positional data: {}", e))
    }
}

/// Inclusive PDF page range of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: i32,
    pub end: i32,
}

impl PageRange {
    pub fn single(page: i32) -> Self {
        Self {
            start: page,
            end: page,
        }
    }

    pub fn union(self, other: PageRange) -> PageRange {
        PageRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, page: i32) -> bool {
        page >= self.start && page <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNumbering {
    /// First PDF page that carries arabic page number 1.
    pub first_arabic_page: i32,
    /// Label pages before `first_arabic_page` with lowercase roman numerals.
    #[serde(default)]
    pub roman_front_matter: bool,
}

/// Mapping from PDF page index to the human-facing page label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalPageMap {
    #[serde(default)]
    explicit: BTreeMap<i32, String>,
    #[serde(default)]
    numbering: Option<PageNumbering>,
}

impl LogicalPageMap {
    pub fn from_numbering(numbering: PageNumbering) -> Self {
        Self {
            explicit: BTreeMap::new(),
            numbering: Some(numbering),
        }
    }

    pub fn with_label(mut self, pdf_page: i32, label: impl Into<String>) -> Self {
        self.explicit.insert(pdf_page, label.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.explicit.is_empty() && self.numbering.is_none()
    }

    /// Explicit labels win over computed numbering.
    pub fn label_for(&self, pdf_page: i32) -> Option<String> {
        if let Some(label) = self.explicit.get(&pdf_page) {
            return Some(label.clone());
        }

        let numbering = self.numbering.as_ref()?;
        if pdf_page >= numbering.first_arabic_page {
            Some((pdf_page - numbering.first_arabic_page + 1).to_string())
        } else if numbering.roman_front_matter && pdf_page >= 1 {
            Some(to_roman(pdf_page as u32))
        } else {
            None
        }
    }
}

fn to_roman(mut value: u32) -> String {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];

    let mut out = String::new();
    for (amount, numeral) in NUMERALS {
        while value >= amount {
            out.push_str(numeral);
            value -= amount;
        }
    }
    out
}
