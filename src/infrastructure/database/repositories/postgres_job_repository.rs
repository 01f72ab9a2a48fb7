use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use uuid::Uuid;

use crate::domain::entities::IngestionJob;
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};
use crate::domain::value_objects::{Identifier, IngestionStatus};
use crate::infrastructure::database::models::{JobModel, NewJobModel, UpdateJobModel};
use crate::infrastructure::database::schema::ingestion_job;

pub struct PostgresJobRepository {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl PostgresJobRepository {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    fn get_connection(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<PgConnection>>, JobRepositoryError> {
        self.pool.get().map_err(|e| {
            JobRepositoryError::DatabaseError(format!("Failed to get database connection: {}", e))
        })
    }
}

fn to_domain(model: JobModel) -> Result<IngestionJob, JobRepositoryError> {
    IngestionJob::try_from(model).map_err(|e| {
        JobRepositoryError::DatabaseError(format!("Failed to convert job model: {}", e))
    })
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn save(&self, job: &IngestionJob) -> Result<(), JobRepositoryError> {
        let new_job = NewJobModel::from(job);
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(ingestion_job::table)
                .values(&new_job)
                .execute(&mut conn)
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to save job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError> {
        let mut conn = self.get_connection()?;

        let result = tokio::task::spawn_blocking(move || {
            ingestion_job::table
                .filter(ingestion_job::id.eq(job_id))
                .select(JobModel::as_select())
                .first(&mut conn)
                .optional()
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to find job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        result.map(to_domain).transpose()
    }

    async fn find_by_document(
        &self,
        document_id: &Identifier,
    ) -> Result<Vec<IngestionJob>, JobRepositoryError> {
        let key = document_id.as_string();
        let mut conn = self.get_connection()?;

        let job_models = tokio::task::spawn_blocking(move || {
            ingestion_job::table
                .filter(ingestion_job::document_id.eq(key))
                .order(ingestion_job::created_at.desc())
                .select(JobModel::as_select())
                .load(&mut conn)
                .map_err(|e| {
                    JobRepositoryError::DatabaseError(format!(
                        "Failed to find jobs by document: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        job_models.into_iter().map(to_domain).collect()
    }

    async fn last_ingested(
        &self,
        document_id: &Identifier,
    ) -> Result<Option<IngestionJob>, JobRepositoryError> {
        let key = document_id.as_string();
        let ingested = IngestionStatus::Ingested.as_str();
        let mut conn = self.get_connection()?;

        let result = tokio::task::spawn_blocking(move || {
            ingestion_job::table
                .filter(ingestion_job::document_id.eq(key))
                .filter(ingestion_job::status.eq(ingested))
                .order(ingestion_job::completed_at.desc())
                .select(JobModel::as_select())
                .first(&mut conn)
                .optional()
                .map_err(|e| {
                    JobRepositoryError::DatabaseError(format!(
                        "Failed to find last ingestion: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        result.map(to_domain).transpose()
    }

    async fn update(&self, job: &IngestionJob) -> Result<(), JobRepositoryError> {
        let update_job = UpdateJobModel::from(job);
        let job_id = job.id();
        let mut conn = self.get_connection()?;

        let updated = tokio::task::spawn_blocking(move || {
            diesel::update(ingestion_job::table.filter(ingestion_job::id.eq(job_id)))
                .set(&update_job)
                .execute(&mut conn)
                .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to update job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        if updated == 0 {
            return Err(JobRepositoryError::NotFound(job_id));
        }
        Ok(())
    }

    async fn find_active_jobs(&self) -> Result<Vec<IngestionJob>, JobRepositoryError> {
        let active = vec![
            IngestionStatus::Pending.as_str(),
            IngestionStatus::Assembling.as_str(),
        ];
        let mut conn = self.get_connection()?;

        let job_models = tokio::task::spawn_blocking(move || {
            ingestion_job::table
                .filter(ingestion_job::status.eq_any(active))
                .order(ingestion_job::created_at.asc())
                .select(JobModel::as_select())
                .load(&mut conn)
                .map_err(|e| {
                    JobRepositoryError::DatabaseError(format!("Failed to find active jobs: {}", e))
                })
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        job_models.into_iter().map(to_domain).collect()
    }
}
