use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum IngestionStatus {
    #[default]
    Pending,
    Assembling,
    Ingested,
    Skipped,
    Failed(String),
}

impl IngestionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, IngestionStatus::Pending)
    }

    pub fn is_assembling(&self) -> bool {
        matches!(self, IngestionStatus::Assembling)
    }

    pub fn is_ingested(&self) -> bool {
        matches!(self, IngestionStatus::Ingested)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, IngestionStatus::Failed(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IngestionStatus::Ingested | IngestionStatus::Skipped | IngestionStatus::Failed(_)
        )
    }

    pub fn can_transition_to(&self, new_status: &IngestionStatus) -> bool {
        match (self, new_status) {
            (IngestionStatus::Pending, IngestionStatus::Assembling) => true,
            (IngestionStatus::Assembling, IngestionStatus::Ingested) => true,
            (IngestionStatus::Assembling, IngestionStatus::Skipped) => true,
            (IngestionStatus::Assembling, IngestionStatus::Failed(_)) => true,
            (IngestionStatus::Failed(_), IngestionStatus::Pending) => true, // retry
            _ => false,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            IngestionStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Pending => "pending",
            IngestionStatus::Assembling => "assembling",
            IngestionStatus::Ingested => "ingested",
            IngestionStatus::Skipped => "skipped",
            IngestionStatus::Failed(_) => "failed",
        }
    }

    /// Failure details live in a separate column, so `failed` parses with `error_message`.
    pub fn from_parts(status: &str, error_message: Option<&str>) -> Result<Self, String> {
        match status.to_lowercase().as_str() {
            "pending" => Ok(IngestionStatus::Pending),
            "assembling" => Ok(IngestionStatus::Assembling),
            "ingested" => Ok(IngestionStatus::Ingested),
            "skipped" => Ok(IngestionStatus::Skipped),
            "failed" => Ok(IngestionStatus::Failed(
                error_message.unwrap_or("Unknown error").to_string(),
            )),
            other => Err(format!("Invalid ingestion status: {}", other)),
        }
    }
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_checks() {
        assert!(IngestionStatus::Pending.is_pending());
        assert!(IngestionStatus::Assembling.is_assembling());
        assert!(IngestionStatus::Ingested.is_ingested());
        assert!(IngestionStatus::Failed("cycle".to_string()).is_failed());

        assert!(!IngestionStatus::Pending.is_terminal());
        assert!(!IngestionStatus::Assembling.is_terminal());
        assert!(IngestionStatus::Ingested.is_terminal());
        assert!(IngestionStatus::Skipped.is_terminal());
    }

    #[test]
    fn test_transitions() {
        let pending = IngestionStatus::Pending;
        let assembling = IngestionStatus::Assembling;
        let ingested = IngestionStatus::Ingested;
        let failed = IngestionStatus::Failed("error".to_string());

        assert!(pending.can_transition_to(&assembling));
        assert!(assembling.can_transition_to(&ingested));
        assert!(assembling.can_transition_to(&failed));
        assert!(failed.can_transition_to(&pending));

        assert!(!pending.can_transition_to(&ingested));
        assert!(!failed.can_transition_to(&ingested));
        assert!(!ingested.can_transition_to(&assembling));
    }

    #[test]
    fn test_string_conversion() {
        let statuses = vec![
            IngestionStatus::Pending,
            IngestionStatus::Assembling,
            IngestionStatus::Ingested,
            IngestionStatus::Skipped,
            IngestionStatus::Failed("structural cycle".to_string()),
        ];

        for status in statuses {
            let parsed =
                IngestionStatus::from_parts(status.as_str(), status.error_message()).unwrap();
            assert_eq!(status, parsed);
        }
        assert!(IngestionStatus::from_parts("processing", None).is_err());
    }
}
