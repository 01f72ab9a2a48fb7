use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};

use crate::domain::entities::Publication;
use crate::domain::repositories::PublicationRepository;
use crate::domain::repositories::publication_repository::PublicationRepositoryError;
use crate::domain::value_objects::Identifier;
use crate::infrastructure::database::models::{NewPublicationModel, PublicationModel};
use crate::infrastructure::database::schema::publication;

pub struct PostgresPublicationRepository {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl PostgresPublicationRepository {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    fn get_connection(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<PgConnection>>, PublicationRepositoryError> {
        self.pool.get().map_err(|e| {
            PublicationRepositoryError::DatabaseError(format!(
                "Failed to get database connection: {}",
                e
            ))
        })
    }
}

fn to_domain(model: PublicationModel) -> Result<Publication, PublicationRepositoryError> {
    Publication::try_from(model).map_err(PublicationRepositoryError::ValidationError)
}

#[async_trait]
impl PublicationRepository for PostgresPublicationRepository {
    async fn save(&self, record: &Publication) -> Result<(), PublicationRepositoryError> {
        let new_publication = NewPublicationModel::from(record);
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(publication::table)
                .values(&new_publication)
                .on_conflict(publication::id)
                .do_nothing()
                .execute(&mut conn)
                .map_err(|e| {
                    PublicationRepositoryError::DatabaseError(format!(
                        "Failed to save publication: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| PublicationRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &Identifier,
    ) -> Result<Option<Publication>, PublicationRepositoryError> {
        let id = id.as_string();
        let mut conn = self.get_connection()?;

        let result = tokio::task::spawn_blocking(move || {
            publication::table
                .find(id)
                .select(PublicationModel::as_select())
                .first(&mut conn)
                .optional()
                .map_err(|e| {
                    PublicationRepositoryError::DatabaseError(format!(
                        "Failed to find publication: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| PublicationRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        result.map(to_domain).transpose()
    }

    async fn find_all(
        &self,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Publication>, PublicationRepositoryError> {
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            publication::table
                .order(publication::id.asc())
                .offset(skip)
                .limit(limit)
                .select(PublicationModel::as_select())
                .load(&mut conn)
                .map_err(|e| {
                    PublicationRepositoryError::DatabaseError(format!(
                        "Failed to list publications: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| PublicationRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        models.into_iter().map(to_domain).collect()
    }

    async fn count(&self) -> Result<i64, PublicationRepositoryError> {
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            publication::table.count().get_result::<i64>(&mut conn).map_err(|e| {
                PublicationRepositoryError::DatabaseError(format!(
                    "Failed to count publications: {}",
                    e
                ))
            })
        })
        .await
        .map_err(|e| PublicationRepositoryError::DatabaseError(format!("Task join error: {}", e)))?
    }
}
