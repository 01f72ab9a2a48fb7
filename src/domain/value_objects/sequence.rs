use serde::{Deserialize, Serialize};

/// Position of a node or component among its siblings.
///
/// `minor` is zero for primary-flow entries; supplementary entries share their trigger's
/// `major` and count `minor` from one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceKey {
    pub major: i32,
    pub minor: i32,
}

impl SequenceKey {
    pub fn primary(major: i32) -> Self {
        Self { major, minor: 0 }
    }

    pub fn supplementary(major: i32, minor: i32) -> Self {
        Self { major, minor }
    }

    pub fn is_supplementary(&self) -> bool {
        self.minor != 0
    }
}

impl std::fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
