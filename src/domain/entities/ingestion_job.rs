use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Fingerprint, Identifier, IngestionStatus};

/// Counts reported once a document's graph has been committed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub components_created: i32,
    pub nodes_created: i32,
    pub relations_created: i32,
    pub unresolved_references: i32,
    pub embeddings_created: i32,
    pub processing_time_ms: u64,
}

/// One attempt to assemble and commit the graph of a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionJob {
    id: Uuid,
    document_id: Identifier,
    status: IngestionStatus,
    stream_fingerprint: Option<Fingerprint>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    report: Option<IngestionReport>,
}

impl IngestionJob {
    pub fn new(document_id: Identifier) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            status: IngestionStatus::Pending,
            stream_fingerprint: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            report: None,
        }
    }

    /// Rebuild a job from stored columns.
    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        document_id: Identifier,
        status: IngestionStatus,
        stream_fingerprint: Option<Fingerprint>,
        created_at: DateTime<Utc>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        report: Option<IngestionReport>,
    ) -> Self {
        Self {
            id,
            document_id,
            status,
            stream_fingerprint,
            created_at,
            started_at,
            completed_at,
            report,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_id(&self) -> &Identifier {
        &self.document_id
    }

    pub fn status(&self) -> &IngestionStatus {
        &self.status
    }

    pub fn stream_fingerprint(&self) -> Option<&Fingerprint> {
        self.stream_fingerprint.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.status.error_message()
    }

    pub fn report(&self) -> Option<&IngestionReport> {
        self.report.as_ref()
    }

    pub fn start(&mut self) -> Result<(), String> {
        self.transition(IngestionStatus::Assembling)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(
        &mut self,
        fingerprint: Fingerprint,
        report: IngestionReport,
    ) -> Result<(), String> {
        self.transition(IngestionStatus::Ingested)?;
        self.stream_fingerprint = Some(fingerprint);
        self.report = Some(report);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// The stream matched the fingerprint of the last successful ingestion.
    pub fn skip(&mut self, fingerprint: Fingerprint) -> Result<(), String> {
        self.transition(IngestionStatus::Skipped)?;
        self.stream_fingerprint = Some(fingerprint);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<(), String> {
        self.transition(IngestionStatus::Failed(error))?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn retry(&mut self) -> Result<(), String> {
        self.transition(IngestionStatus::Pending)?;
        self.started_at = None;
        self.completed_at = None;
        self.report = None;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            IngestionStatus::Pending | IngestionStatus::Assembling
        )
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            (Some(start), None) if self.status.is_assembling() => Some(Utc::now() - start),
            _ => None,
        }
    }

    fn transition(&mut self, next: IngestionStatus) -> Result<(), String> {
        if !self.status.can_transition_to(&next) {
            return Err(format!(
                "Job {} cannot move from {} to {}",
                self.id, self.status, next
            ));
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> IngestionJob {
        IngestionJob::new(Identifier::parse("doc_001").unwrap())
    }

    #[test]
    fn test_job_creation() {
        let job = job();
        assert_eq!(job.status(), &IngestionStatus::Pending);
        assert!(job.is_active());
        assert!(job.report().is_none());
    }

    #[test]
    fn test_job_workflow() {
        let mut job = job();
        job.start().unwrap();
        assert!(job.started_at().is_some());

        let report = IngestionReport {
            components_created: 2,
            nodes_created: 5,
            relations_created: 1,
            ..Default::default()
        };
        job.complete(Fingerprint::from_bytes(b"stream"), report)
            .unwrap();

        assert_eq!(job.status(), &IngestionStatus::Ingested);
        assert_eq!(job.report().map(|r| r.nodes_created), Some(5));
        assert!(!job.is_active());
        assert!(job.duration().is_some());
    }

    #[test]
    fn test_cannot_complete_without_starting() {
        let mut job = job();
        assert!(
            job.complete(Fingerprint::from_bytes(b"x"), IngestionReport::default())
                .is_err()
        );
    }

    #[test]
    fn test_failure_and_retry() {
        let mut job = job();
        job.start().unwrap();
        job.fail("structural cycle".to_string()).unwrap();
        assert_eq!(job.error_message(), Some("structural cycle"));

        job.retry().unwrap();
        assert_eq!(job.status(), &IngestionStatus::Pending);
        assert!(job.started_at().is_none());
    }

    #[test]
    fn test_skip() {
        let mut job = job();
        job.start().unwrap();
        job.skip(Fingerprint::from_bytes(b"same")).unwrap();
        assert_eq!(job.status(), &IngestionStatus::Skipped);
        assert!(job.stream_fingerprint().is_some());
    }
}
