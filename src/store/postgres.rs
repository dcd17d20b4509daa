//! Postgres store via sqlx
//!
//! One connection per call, closed afterwards; no pool is kept between
//! scenarios. Columns are cast to text so the checks do not depend on the
//! backend's exact column types (uuid vs text ids, enum statuses, timestamp
//! flavours).

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Connection, FromRow, PgConnection};
use tokio::time::timeout;

use crate::common::{Error, Result};

use super::{PersistedMeeting, PersistedUser, StateStore, UserFixture};

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    created_at: Option<String>,
}

impl From<UserRow> for PersistedUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MeetingRow {
    id: String,
    title: Option<String>,
    status: Option<String>,
    user_id: Option<String>,
    created_at: Option<String>,
}

impl From<MeetingRow> for PersistedMeeting {
    fn from(row: MeetingRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            status: row.status,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

/// Store reached through a Postgres connection string
///
/// `timeout` bounds the connect, every query and the close separately.
pub struct PostgresStore {
    url: String,
    timeout: Duration,
}

impl PostgresStore {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    async fn connect(&self) -> Result<PgConnection> {
        match timeout(self.timeout, PgConnection::connect(&self.url)).await {
            Ok(conn) => Ok(conn?),
            Err(_) => Err(Error::Persistence(format!(
                "timed out connecting after {:?}",
                self.timeout
            ))),
        }
    }

    /// Run one query future under the store's time bound
    async fn bounded<T, F>(&self, what: &str, query: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match timeout(self.timeout, query).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::Persistence(format!(
                "{} timed out after {:?}",
                what, self.timeout
            ))),
        }
    }

    async fn release(&self, conn: PgConnection) {
        match timeout(self.timeout, conn.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Error closing database connection: {}", e),
            Err(_) => tracing::debug!("Closing database connection timed out"),
        }
    }
}

#[async_trait]
impl StateStore for PostgresStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        let result = self
            .bounded(
                "SELECT 1",
                sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&mut conn),
            )
            .await;
        self.release(conn).await;

        match result? {
            1 => Ok(()),
            other => Err(Error::Persistence(format!(
                "SELECT 1 returned {}",
                other
            ))),
        }
    }

    async fn find_user(&self, id: &str) -> Result<Option<PersistedUser>> {
        let mut conn = self.connect().await?;
        let query = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id::text AS id,
                name::text AS name,
                email::text AS email,
                role::text AS role,
                created_at::text AS created_at
            FROM users
            WHERE id::text = $1
            "#,
        )
        .bind(id);
        let result = self
            .bounded("user lookup", query.fetch_optional(&mut conn))
            .await;
        self.release(conn).await;

        Ok(result?.map(PersistedUser::from))
    }

    async fn insert_user(&self, fixture: &UserFixture) -> Result<()> {
        let mut conn = self.connect().await?;
        let query = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            "#,
        )
        .bind(&fixture.id)
        .bind(&fixture.name)
        .bind(&fixture.email)
        .bind(&fixture.role);
        let result = self.bounded("user insert", query.execute(&mut conn)).await;
        self.release(conn).await;

        result?;
        Ok(())
    }

    async fn find_meeting(&self, id: &str) -> Result<Option<PersistedMeeting>> {
        let mut conn = self.connect().await?;
        let query = sqlx::query_as::<_, MeetingRow>(
            r#"
            SELECT
                id::text AS id,
                title::text AS title,
                status::text AS status,
                user_id::text AS user_id,
                created_at::text AS created_at
            FROM meetings
            WHERE id::text = $1
            "#,
        )
        .bind(id);
        let result = self
            .bounded("meeting lookup", query.fetch_optional(&mut conn))
            .await;
        self.release(conn).await;

        Ok(result?.map(PersistedMeeting::from))
    }
}
