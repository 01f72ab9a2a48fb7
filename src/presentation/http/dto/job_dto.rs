use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::ingestion_service::IngestionOutcome;
use crate::application::use_cases::get_job_status::GetJobStatusResponse;
use crate::application::use_cases::ingest_publication::IngestPublicationResponse;
use crate::domain::entities::{IngestionJob, IngestionReport};
use crate::domain::graph::{Fragment, UnresolvedReference};

#[derive(Debug, Serialize)]
pub struct JobStatusDto {
    pub job_id: Uuid,
    pub document_id: String,
    pub status: String,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    pub stream_fingerprint: Option<String>,
    pub report: Option<IngestionReport>,
    /// Unresolved references recorded by the committed graph.
    pub warning_count: i32,
    pub duration_ms: Option<i64>,
    pub is_terminal: bool,
}

impl From<GetJobStatusResponse> for JobStatusDto {
    fn from(response: GetJobStatusResponse) -> Self {
        Self::from_job_with_duration(response.job, response.duration)
    }
}

impl JobStatusDto {
    pub fn from_job(job: IngestionJob) -> Self {
        let duration = job.duration();
        Self::from_job_with_duration(job, duration)
    }

    pub fn from_job_with_duration(job: IngestionJob, duration: Option<chrono::Duration>) -> Self {
        Self {
            job_id: job.id(),
            document_id: job.document_id().to_string(),
            status: job.status().to_string(),
            created_at: job.created_at().to_rfc3339(),
            started_at: job.started_at().map(|dt| dt.to_rfc3339()),
            completed_at: job.completed_at().map(|dt| dt.to_rfc3339()),
            error_message: job.error_message().map(|s| s.to_string()),
            stream_fingerprint: job.stream_fingerprint().map(|f| f.to_string()),
            warning_count: job.report().map_or(0, |r| r.unresolved_references),
            report: job.report().cloned(),
            duration_ms: duration.map(|d| d.num_milliseconds()),
            is_terminal: job.status().is_terminal(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct QueueIngestionRequestDto {
    /// Replaces the stored fragment stream before queuing.
    #[serde(default)]
    pub fragments: Option<Vec<Fragment>>,
}

#[derive(Debug, Serialize)]
pub struct UnresolvedReferenceDto {
    pub relation_id: String,
    pub source_node_id: String,
    pub relation_type: String,
    pub marker_text: Option<String>,
}

impl From<&UnresolvedReference> for UnresolvedReferenceDto {
    fn from(warning: &UnresolvedReference) -> Self {
        Self {
            relation_id: warning.relation_id.to_string(),
            source_node_id: warning.source_node_id.to_string(),
            relation_type: warning.relation_type.to_string(),
            marker_text: warning.marker_text.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestionOutcomeDto {
    pub job: JobStatusDto,
    pub warnings: Vec<UnresolvedReferenceDto>,
    pub error_code: Option<String>,
}

impl From<IngestionOutcome> for IngestionOutcomeDto {
    fn from(outcome: IngestionOutcome) -> Self {
        Self {
            warnings: outcome
                .warnings
                .iter()
                .map(UnresolvedReferenceDto::from)
                .collect(),
            error_code: outcome.error_code.map(|c| c.to_string()),
            job: JobStatusDto::from_job(outcome.job),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicationIngestionDto {
    pub publication_id: String,
    pub documents: usize,
    pub failed: usize,
    pub outcomes: Vec<IngestionOutcomeDto>,
}

impl From<IngestPublicationResponse> for PublicationIngestionDto {
    fn from(response: IngestPublicationResponse) -> Self {
        Self {
            publication_id: response.publication_id.to_string(),
            documents: response.outcomes.len(),
            failed: response.failed(),
            outcomes: response
                .outcomes
                .into_iter()
                .map(IngestionOutcomeDto::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Fingerprint, Identifier};

    #[test]
    fn test_job_status_from_completed_job() {
        let mut job = IngestionJob::new(Identifier::parse("doc_002").unwrap());
        job.start().unwrap();
        job.complete(
            Fingerprint::from_bytes(b"stream"),
            IngestionReport {
                nodes_created: 4,
                unresolved_references: 2,
                ..IngestionReport::default()
            },
        )
        .unwrap();

        let dto = JobStatusDto::from_job(job);
        assert_eq!(dto.document_id, "doc_002");
        assert_eq!(dto.warning_count, 2);
        assert!(dto.is_terminal);
        assert!(dto.stream_fingerprint.is_some());
        assert!(dto.completed_at.is_some());
    }

    #[test]
    fn test_queue_request_body_is_optional() {
        let dto: QueueIngestionRequestDto = serde_json::from_str("{}").unwrap();
        assert!(dto.fragments.is_none());
    }
}
