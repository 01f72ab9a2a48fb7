use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{IngestionJob, IngestionReport};
use crate::domain::value_objects::{Fingerprint, Identifier, IngestionStatus};
use crate::infrastructure::database::schema::ingestion_job;

#[derive(Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name = ingestion_job)]
#[diesel(primary_key(id))]
pub struct JobModel {
    pub id: Uuid,
    pub document_id: String,
    pub status: String,
    pub error_message: Option<String>,
    pub stream_fingerprint: Option<String>,
    pub report: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ingestion_job)]
pub struct NewJobModel {
    pub id: Uuid,
    pub document_id: String,
    pub status: String,
    pub error_message: Option<String>,
    pub stream_fingerprint: Option<String>,
    pub report: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = ingestion_job)]
pub struct UpdateJobModel {
    pub status: String,
    pub error_message: Option<Option<String>>,
    pub stream_fingerprint: Option<Option<String>>,
    pub report: Option<Option<serde_json::Value>>,
    pub started_at: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

fn report_json(job: &IngestionJob) -> Option<serde_json::Value> {
    job.report()
        .and_then(|report| serde_json::to_value(report).ok())
}

impl From<&IngestionJob> for NewJobModel {
    fn from(job: &IngestionJob) -> Self {
        Self {
            id: job.id(),
            document_id: job.document_id().as_string(),
            status: job.status().as_str().to_string(),
            error_message: job.error_message().map(str::to_string),
            stream_fingerprint: job.stream_fingerprint().map(|f| f.as_str().to_string()),
            report: report_json(job),
            created_at: job.created_at(),
            started_at: job.started_at(),
            completed_at: job.completed_at(),
        }
    }
}

impl From<&IngestionJob> for UpdateJobModel {
    fn from(job: &IngestionJob) -> Self {
        Self {
            status: job.status().as_str().to_string(),
            error_message: Some(job.error_message().map(str::to_string)),
            stream_fingerprint: Some(job.stream_fingerprint().map(|f| f.as_str().to_string())),
            report: Some(report_json(job)),
            started_at: Some(job.started_at()),
            completed_at: Some(job.completed_at()),
        }
    }
}

impl TryFrom<JobModel> for IngestionJob {
    type Error = String;

    fn try_from(model: JobModel) -> Result<Self, Self::Error> {
        let document_id = Identifier::parse(&model.document_id).map_err(|e| e.to_string())?;
        let status = IngestionStatus::from_parts(&model.status, model.error_message.as_deref())?;
        let fingerprint = model.stream_fingerprint.map(Fingerprint::new).transpose()?;
        let report = model
            .report
            .map(serde_json::from_value::<IngestionReport>)
            .transpose()
            .map_err(|e| format!("Failed to parse ingestion report: {}", e))?;

        Ok(IngestionJob::from_database(
            model.id,
            document_id,
            status,
            fingerprint,
            model.created_at,
            model.started_at,
            model.completed_at,
            report,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_job_round_trips_error_message() {
        let mut job = IngestionJob::new(Identifier::parse("doc_004").unwrap());
        job.start().unwrap();
        job.fail("STRUCTURAL_CYCLE: cmp_004_0002".to_string()).unwrap();

        let row = NewJobModel::from(&job);
        assert_eq!(row.status, "failed");

        let model = JobModel {
            id: row.id,
            document_id: row.document_id,
            status: row.status,
            error_message: row.error_message,
            stream_fingerprint: row.stream_fingerprint,
            report: row.report,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
        };
        let restored = IngestionJob::try_from(model).unwrap();
        assert_eq!(restored.error_message(), Some("STRUCTURAL_CYCLE: cmp_004_0002"));
        assert!(restored.status().is_failed());
    }
}
