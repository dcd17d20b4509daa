//! State verification against the backend's persistent store
//!
//! The harness reads `users` and `meetings` rows to confirm that protocol
//! actions left durable records, and may insert a single user fixture. It
//! never writes meeting rows; those belong to the backend.

mod memory;
mod postgres;

use async_trait::async_trait;
use serde::Serialize;

use crate::common::Result;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Read-only projection of a `users` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<String>,
}

/// Read-only projection of a `meetings` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedMeeting {
    pub id: String,
    pub title: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub created_at: Option<String>,
}

/// User row the harness may create as a precondition
#[derive(Debug, Clone, PartialEq)]
pub struct UserFixture {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Store operations used by the database scenarios
///
/// Each call is one round trip; implementations do not retry.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Open a connection and run a trivial read
    async fn ping(&self) -> Result<()>;

    async fn find_user(&self, id: &str) -> Result<Option<PersistedUser>>;

    /// Unconditional insert; fails if the id already exists
    async fn insert_user(&self, fixture: &UserFixture) -> Result<()>;

    async fn find_meeting(&self, id: &str) -> Result<Option<PersistedMeeting>>;
}

/// What `insert_user_fixture` found or did
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureOutcome {
    Existing(PersistedUser),
    Created,
}

/// Create the user fixture unless a row with its id already exists
///
/// Check-then-insert: safe to repeat sequentially, but two concurrent runs
/// against one store can both see the row missing.
pub async fn insert_user_fixture(
    store: &dyn StateStore,
    fixture: &UserFixture,
) -> Result<FixtureOutcome> {
    if let Some(user) = store.find_user(&fixture.id).await? {
        return Ok(FixtureOutcome::Existing(user));
    }
    store.insert_user(fixture).await?;
    Ok(FixtureOutcome::Created)
}
