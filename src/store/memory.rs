//! In-memory store
//!
//! Backs the mock backend and the engine tests. Inserts follow primary-key
//! semantics so fixture idempotence is observable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::common::{Error, Result};

use super::{PersistedMeeting, PersistedUser, StateStore, UserFixture};

#[derive(Default)]
struct Tables {
    users: HashMap<String, PersistedUser>,
    meetings: HashMap<String, PersistedMeeting>,
}

/// Shared in-memory `users`/`meetings` tables
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails, for outage paths
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        if self.offline {
            return Err(Error::Persistence("connection refused".to_string()));
        }
        self.tables
            .lock()
            .map_err(|_| Error::Internal("store lock poisoned".to_string()))
    }

    /// Create a meeting row the way the backend does on `recording_started`
    pub fn create_meeting(&self, id: &str, user_id: &str, title: &str) -> Result<PersistedMeeting> {
        let meeting = PersistedMeeting {
            id: id.to_string(),
            title: Some(title.to_string()),
            status: Some("recording".to_string()),
            user_id: Some(user_id.to_string()),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        self.tables()?
            .meetings
            .insert(id.to_string(), meeting.clone());
        Ok(meeting)
    }

    /// Update a meeting's status; returns false when the id is unknown
    pub fn set_meeting_status(&self, id: &str, status: &str) -> Result<bool> {
        let mut tables = self.tables()?;
        match tables.meetings.get_mut(id) {
            Some(meeting) => {
                meeting.status = Some(status.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn user_count(&self) -> usize {
        self.tables().map(|t| t.users.len()).unwrap_or(0)
    }

    pub fn meeting_count(&self) -> usize {
        self.tables().map(|t| t.meetings.len()).unwrap_or(0)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.tables().map(|_| ())
    }

    async fn find_user(&self, id: &str) -> Result<Option<PersistedUser>> {
        Ok(self.tables()?.users.get(id).cloned())
    }

    async fn insert_user(&self, fixture: &UserFixture) -> Result<()> {
        let mut tables = self.tables()?;
        if tables.users.contains_key(&fixture.id) {
            return Err(Error::Persistence(format!(
                "duplicate key value violates unique constraint on users.id ({})",
                fixture.id
            )));
        }
        tables.users.insert(
            fixture.id.clone(),
            PersistedUser {
                id: fixture.id.clone(),
                name: Some(fixture.name.clone()),
                email: Some(fixture.email.clone()),
                role: Some(fixture.role.clone()),
                created_at: Some(chrono::Utc::now().to_rfc3339()),
            },
        );
        Ok(())
    }

    async fn find_meeting(&self, id: &str) -> Result<Option<PersistedMeeting>> {
        Ok(self.tables()?.meetings.get(id).cloned())
    }
}
