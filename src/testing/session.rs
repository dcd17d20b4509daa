//! Scenario session state
//!
//! A `Session` is handed to each scenario and handed back afterwards. It
//! carries the run's user id, the meeting id once one has been confirmed by
//! the backend, and the scenario's connection while it is open.

use crate::common::{Error, Result};
use crate::protocol::ProtocolDriver;

pub struct Session {
    user_id: String,
    meeting_id: Option<String>,
    driver: Option<ProtocolDriver>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            meeting_id: None,
            driver: None,
        }
    }

    /// Seed the session with a meeting id captured by an earlier scenario
    pub fn with_meeting_id(mut self, meeting_id: Option<String>) -> Self {
        self.meeting_id = meeting_id;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn meeting_id(&self) -> Option<&str> {
        self.meeting_id.as_deref()
    }

    /// Record the meeting id from a `meeting_created` reply
    ///
    /// Once set, the id is fixed for the session: a repeat of the same id is
    /// accepted, a different one is a protocol violation.
    pub fn capture_meeting_id(&mut self, meeting_id: &str) -> Result<()> {
        match &self.meeting_id {
            None => {
                self.meeting_id = Some(meeting_id.to_string());
                Ok(())
            }
            Some(existing) if existing == meeting_id => Ok(()),
            Some(existing) => Err(Error::ProtocolViolation(format!(
                "meeting id changed mid-session from '{}' to '{}'",
                existing, meeting_id
            ))),
        }
    }

    /// The captured meeting id, or `PreconditionUnmet` naming what needed it
    pub fn require_meeting_id(&self, purpose: &str) -> Result<String> {
        self.meeting_id
            .clone()
            .ok_or_else(|| Error::PreconditionUnmet(format!("No meeting ID available for {}", purpose)))
    }

    /// Take ownership of an open connection for the rest of the scenario
    pub fn attach(&mut self, driver: ProtocolDriver) {
        self.driver = Some(driver);
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    /// The open connection
    pub fn driver(&mut self) -> Result<&mut ProtocolDriver> {
        self.driver
            .as_mut()
            .ok_or_else(|| Error::Internal("scenario step needs an open connection".to_string()))
    }

    /// Close and drop the connection, if any
    pub async fn release(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            tracing::debug!("Closing connection after {} frames", driver.frames_sent());
            if let Err(e) = driver.close().await {
                tracing::debug!("Error closing connection: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use crate::net::transport::memory;

    #[test]
    fn test_meeting_id_is_write_once() {
        let mut session = Session::new("u1");
        assert!(session.meeting_id().is_none());

        session.capture_meeting_id("m1").unwrap();
        session.capture_meeting_id("m1").unwrap();
        assert!(session.capture_meeting_id("m2").is_err());
        assert_eq!(session.meeting_id(), Some("m1"));
    }

    #[test]
    fn test_require_meeting_id() {
        let session = Session::new("u1");
        let err = session.require_meeting_id("audio streaming").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionUnmet);
        assert!(err.to_string().contains("audio streaming"));

        let session = Session::new("u1").with_meeting_id(Some("m9".to_string()));
        assert_eq!(session.require_meeting_id("x").unwrap(), "m9");
    }

    #[tokio::test]
    async fn test_release_closes_connection() {
        let (client, mut server) = memory::pair();
        let mut session = Session::new("u1");
        session.attach(ProtocolDriver::new(Box::new(client)));
        assert!(session.is_connected());

        session.release().await;
        assert!(!session.is_connected());
        assert!(session.driver().is_err());

        // Closing the client end ends the server's receive stream
        use crate::net::Transport;
        assert_eq!(server.recv_text().await.unwrap(), None);
    }
}
