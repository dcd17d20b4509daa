//! Scenario engine
//!
//! Executes one scenario from a suite: probes, protocol exchanges and store
//! checks in a fixed order, each wait bounded by its own timeout. Every
//! scenario yields exactly one `ScenarioResult` and always releases the
//! connection it opened, whether it passed or not.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::common::config::Config;
use crate::common::{Error, ErrorKind, Result};
use crate::net::{Connector, HttpProbe, WsConnector};
use crate::protocol::{codec, MessageKind, ProtocolDriver, ProtocolMessage};
use crate::store::{insert_user_fixture, FixtureOutcome, PostgresStore, StateStore, UserFixture};

use super::config::{PayloadFormat, ScenarioSpec};
use super::report::{Output, StepLog};
use super::session::Session;

/// Outcome of one scenario; never modified after creation
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub error: Option<String>,
    pub kind: Option<ErrorKind>,
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

impl ScenarioResult {
    pub fn from_outcome(
        name: &str,
        outcome: Result<()>,
        warnings: Vec<String>,
        elapsed: Duration,
    ) -> Self {
        let (passed, error, kind) = match outcome {
            Ok(()) => (true, None, None),
            Err(e) => (false, Some(e.to_string()), Some(e.kind())),
        };
        Self {
            name: name.to_string(),
            passed,
            error,
            kind,
            warnings,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// How a scenario treats a `recording_started` that is not answered by a
/// usable `meeting_created`
///
/// The three policies reflect how the individual scenarios have always
/// judged this event; they are deliberately not unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingPolicy {
    /// Any missing or wrong reply fails the scenario
    Required,
    /// Silence is a warning; a wrong or malformed reply fails
    TimeoutTolerated,
    /// Silence, wrong and malformed replies are all warnings
    BestEffort,
}

/// Runs scenarios against one backend
pub struct ScenarioEngine {
    config: Config,
    probe: HttpProbe,
    connector: Arc<dyn Connector>,
    store: Option<Arc<dyn StateStore>>,
    output: Output,
}

impl ScenarioEngine {
    pub fn new(
        config: Config,
        connector: Arc<dyn Connector>,
        store: Option<Arc<dyn StateStore>>,
    ) -> Result<Self> {
        let probe = HttpProbe::new(config.timeouts.probe())?;
        Ok(Self {
            config,
            probe,
            connector,
            store,
            output: Output::Human,
        })
    }

    /// Engine wired to the configured WebSocket endpoint and, when a
    /// database URL is set, the Postgres store
    pub fn from_config(config: Config) -> Result<Self> {
        let connector = Arc::new(WsConnector::new(
            config.backend.ws_url.clone(),
            config.timeouts.probe(),
        ));
        let store = config.database.url.as_ref().map(|url| {
            Arc::new(PostgresStore::new(url.clone(), config.timeouts.probe())) as Arc<dyn StateStore>
        });
        Self::new(config, connector, store)
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn output(&self) -> Output {
        self.output
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one scenario, consuming and returning the session
    pub async fn run(&self, spec: &ScenarioSpec, mut session: Session) -> (ScenarioResult, Session) {
        let started = Instant::now();
        let mut log = StepLog::new(self.output);

        let outcome = self.execute(spec, &mut session, &mut log).await;
        session.release().await;

        if let Err(e) = &outcome {
            tracing::debug!(scenario = spec.name(), kind = e.kind().code(), "scenario failed: {}", e);
        }

        let result = ScenarioResult::from_outcome(
            spec.name(),
            outcome,
            log.into_warnings(),
            started.elapsed(),
        );
        (result, session)
    }

    async fn execute(&self, spec: &ScenarioSpec, session: &mut Session, log: &mut StepLog) -> Result<()> {
        match spec {
            ScenarioSpec::BackendHealth => self.backend_health(log).await,
            ScenarioSpec::AudioEndpoint => self.audio_endpoint(log).await,
            ScenarioSpec::DatabaseConnection => self.database_connection(log).await,
            ScenarioSpec::WebsocketConnection {
                await_response,
                timeout,
            } => {
                self.websocket_connection(session, *await_response, *timeout, log)
                    .await
            }
            ScenarioSpec::UserCreation => self.user_creation(session, log).await,
            ScenarioSpec::MeetingCreation { timeout } => {
                self.meeting_creation(session, *timeout, log).await
            }
            ScenarioSpec::AudioStreaming {
                chunks,
                interval_ms,
                padding,
                payload,
            } => {
                let chunks = chunks.unwrap_or(self.config.streaming.chunk_count);
                let interval = Duration::from_millis(
                    interval_ms.unwrap_or(self.config.streaming.chunk_interval_ms),
                );
                self.audio_streaming(session, chunks, interval, *padding, *payload, log)
                    .await
            }
            ScenarioSpec::DatabaseStorage => self.database_storage(session, log).await,
            ScenarioSpec::ExtensionSimulation {
                timeout,
                chunks,
                interval_ms,
                padding,
                fallback_meeting_id,
            } => {
                let limit = secs(*timeout, self.config.timeouts.session_response_secs);
                let chunks = chunks.unwrap_or(self.config.streaming.simulation_chunks);
                let interval = Duration::from_millis(
                    interval_ms.unwrap_or(self.config.streaming.simulation_interval_ms),
                );
                self.extension_simulation(
                    session,
                    limit,
                    chunks,
                    interval,
                    *padding,
                    fallback_meeting_id,
                    log,
                )
                .await
            }
            ScenarioSpec::BasicSession { timeout, payload } => {
                let limit = secs(*timeout, self.config.timeouts.meeting_response_secs);
                self.basic_session(session, limit, *payload, log).await
            }
        }
    }

    // === Probe scenarios ===

    async fn backend_health(&self, log: &mut StepLog) -> Result<()> {
        let url = self.config.health_url();
        self.probe.check_http_health(&url).await?;
        log.ok(format!("Backend health check passed ({})", url));
        Ok(())
    }

    async fn audio_endpoint(&self, log: &mut StepLog) -> Result<()> {
        let url = self.config.audio_endpoint_url();
        let body = self.probe.fetch_json(&url).await?;
        log.ok("Audio endpoint accessible");
        log.note(format!("Response: {}", codec::excerpt(&body.to_string())));
        Ok(())
    }

    // === Store scenarios ===

    fn store(&self) -> Result<&dyn StateStore> {
        self.store.as_deref().ok_or(Error::DatabaseNotConfigured)
    }

    async fn database_connection(&self, log: &mut StepLog) -> Result<()> {
        self.store()?.ping().await?;
        log.ok("Database connection successful");
        Ok(())
    }

    async fn user_creation(&self, session: &Session, log: &mut StepLog) -> Result<()> {
        let store = self.store()?;
        let fixture = UserFixture {
            id: session.user_id().to_string(),
            name: self.config.fixture.name.clone(),
            email: self.config.fixture.email.clone(),
            role: self.config.fixture.role.clone(),
        };

        match insert_user_fixture(store, &fixture).await? {
            FixtureOutcome::Existing(user) => log.ok(format!(
                "Test user found: {} ({})",
                user.name.as_deref().unwrap_or("unnamed"),
                user.email.as_deref().unwrap_or("no email")
            )),
            FixtureOutcome::Created => log.ok(format!("Test user '{}' created in database", fixture.id)),
        }
        Ok(())
    }

    async fn database_storage(&self, session: &Session, log: &mut StepLog) -> Result<()> {
        let meeting_id = session.require_meeting_id("database storage check")?;
        let store = self.store()?;

        let meeting = store
            .find_meeting(&meeting_id)
            .await?
            .ok_or(Error::RecordNotFound("meeting"))?;

        log.ok(format!(
            "Meeting found in database: {}",
            meeting.title.as_deref().unwrap_or("(untitled)")
        ));
        log.note(format!("Status: {}", meeting.status.as_deref().unwrap_or("unknown")));
        log.note(format!("User ID: {}", meeting.user_id.as_deref().unwrap_or("unknown")));
        log.note(format!("Created: {}", meeting.created_at.as_deref().unwrap_or("unknown")));

        if let Some(owner) = meeting.user_id.as_deref() {
            if owner != session.user_id() {
                return Err(Error::TestAssertion(format!(
                    "meeting {} belongs to user '{}', expected '{}'",
                    meeting.id,
                    owner,
                    session.user_id()
                )));
            }
        }
        Ok(())
    }

    // === Protocol scenarios ===

    async fn websocket_connection(
        &self,
        session: &mut Session,
        await_response: bool,
        timeout: Option<u64>,
        log: &mut StepLog,
    ) -> Result<()> {
        self.connect(session, log).await?;

        let user_id = session.user_id().to_string();
        let driver = session.driver()?;
        driver.send(&ProtocolMessage::test_connection(&user_id)).await?;
        log.ok("Sent test message");

        if await_response {
            let limit = secs(timeout, self.config.timeouts.connect_response_secs);
            match driver.receive(limit).await {
                Ok(reply) => log.ok(format!("Received response: {}", reply.kind)),
                Err(Error::Timeout(_)) => log.warn("No response received (timeout)"),
                Err(e) => log.warn(format!("Reply not usable: {}", e)),
            }
        }
        Ok(())
    }

    async fn meeting_creation(
        &self,
        session: &mut Session,
        timeout: Option<u64>,
        log: &mut StepLog,
    ) -> Result<()> {
        self.connect(session, log).await?;
        let limit = secs(timeout, self.config.timeouts.meeting_response_secs);
        self.start_recording(session, limit, MeetingPolicy::Required, log)
            .await?;
        Ok(())
    }

    async fn audio_streaming(
        &self,
        session: &mut Session,
        chunks: usize,
        interval: Duration,
        padding: usize,
        payload: PayloadFormat,
        log: &mut StepLog,
    ) -> Result<()> {
        // Checked before connecting so nothing is sent without a meeting
        let meeting_id = session.require_meeting_id("audio streaming")?;

        self.connect(session, log).await?;
        self.stream_chunks(
            session,
            &meeting_id,
            ChunkPlan {
                count: chunks,
                interval,
                prefix: "fake_audio_data_chunk",
                padding,
                payload,
            },
            log,
        )
        .await?;
        self.stop_recording(session, Some(&meeting_id), log).await?;
        log.ok("Audio streaming workflow completed");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn extension_simulation(
        &self,
        session: &mut Session,
        limit: Duration,
        chunks: usize,
        interval: Duration,
        padding: usize,
        fallback_meeting_id: &str,
        log: &mut StepLog,
    ) -> Result<()> {
        self.connect(session, log).await?;
        log.note("Extension popup opened");
        log.note("User clicked 'Start Recording'");

        let meeting_id = match self
            .start_recording(session, limit, MeetingPolicy::BestEffort, log)
            .await?
        {
            Some(id) => id,
            None => {
                log.warn(format!(
                    "Streaming with placeholder meeting id '{}'",
                    fallback_meeting_id
                ));
                fallback_meeting_id.to_string()
            }
        };

        log.note(format!(
            "Simulating {} chunks at {:?} intervals",
            chunks, interval
        ));
        self.stream_chunks(
            session,
            &meeting_id,
            ChunkPlan {
                count: chunks,
                interval,
                prefix: "audio_chunk",
                padding,
                payload: PayloadFormat::Text,
            },
            log,
        )
        .await?;
        self.stop_recording(session, Some(&meeting_id), log).await?;
        log.ok("Complete extension simulation successful");
        Ok(())
    }

    async fn basic_session(
        &self,
        session: &mut Session,
        limit: Duration,
        payload: PayloadFormat,
        log: &mut StepLog,
    ) -> Result<()> {
        self.connect(session, log).await?;

        let user_id = session.user_id().to_string();
        session
            .driver()?
            .send(&ProtocolMessage::test_connection(&user_id))
            .await?;
        log.ok("Sent test message");

        let confirmed = self
            .start_recording(session, limit, MeetingPolicy::TimeoutTolerated, log)
            .await?;

        if let Some(meeting_id) = confirmed {
            self.stream_chunks(
                session,
                &meeting_id,
                ChunkPlan {
                    count: 1,
                    interval: Duration::ZERO,
                    prefix: "fake_audio_data",
                    padding: 0,
                    payload,
                },
                log,
            )
            .await?;
            self.stop_recording(session, Some(&meeting_id), log).await?;
        }
        Ok(())
    }

    // === Shared steps ===

    async fn connect(&self, session: &mut Session, log: &mut StepLog) -> Result<()> {
        let transport = self.connector.connect().await?;
        session.attach(ProtocolDriver::new(transport));
        log.ok("WebSocket connected");
        Ok(())
    }

    /// Send `recording_started` and judge the reply under `policy`
    ///
    /// Returns the confirmed meeting id, or `None` when the policy turned a
    /// missing confirmation into a warning. Transport failures are always
    /// errors.
    async fn start_recording(
        &self,
        session: &mut Session,
        limit: Duration,
        policy: MeetingPolicy,
        log: &mut StepLog,
    ) -> Result<Option<String>> {
        let user_id = session.user_id().to_string();
        let driver = session.driver()?;
        driver
            .send(&ProtocolMessage::recording_started(&user_id))
            .await?;
        log.ok("Sent recording start message");

        let reply = driver.receive(limit).await;
        let problem = match reply {
            Ok(reply) if reply.kind == MessageKind::MeetingCreated => match reply.meeting_id() {
                Some(id) => {
                    let id = id.to_string();
                    session.capture_meeting_id(&id)?;
                    log.ok(format!("Meeting created: {}", id));
                    return Ok(Some(id));
                }
                None => Error::ProtocolViolation(
                    "meeting_created reply carries no meetingId".to_string(),
                ),
            },
            Ok(reply) => Error::UnexpectedResponse(describe(&reply)),
            Err(e @ (Error::Timeout(_) | Error::Decode(_))) => e,
            Err(e) => return Err(e),
        };

        let soft = match policy {
            MeetingPolicy::Required => false,
            MeetingPolicy::TimeoutTolerated => matches!(problem, Error::Timeout(_)),
            MeetingPolicy::BestEffort => true,
        };
        if !soft {
            return Err(problem);
        }

        match problem {
            Error::Timeout(_) => log.warn("No meeting creation response (timeout)"),
            other => log.warn(other.to_string()),
        }
        Ok(None)
    }

    async fn stream_chunks(
        &self,
        session: &mut Session,
        meeting_id: &str,
        plan: ChunkPlan,
        log: &mut StepLog,
    ) -> Result<()> {
        let user_id = session.user_id().to_string();
        let driver = session.driver()?;

        for i in 0..plan.count {
            let data = plan.payload.render(plan.prefix, i, plan.padding);
            driver
                .send(&ProtocolMessage::audio_chunk(&user_id, meeting_id, data))
                .await?;
            log.ok(format!("Sent audio chunk {}", i + 1));

            if i + 1 < plan.count && !plan.interval.is_zero() {
                tokio::time::sleep(plan.interval).await;
            }
        }
        Ok(())
    }

    async fn stop_recording(
        &self,
        session: &mut Session,
        meeting_id: Option<&str>,
        log: &mut StepLog,
    ) -> Result<()> {
        let user_id = session.user_id().to_string();
        session
            .driver()?
            .send(&ProtocolMessage::recording_stopped(&user_id, meeting_id))
            .await?;
        log.ok("Sent recording stop message");
        Ok(())
    }
}

/// Pacing and payload shape for a run of audio chunks
struct ChunkPlan {
    count: usize,
    interval: Duration,
    prefix: &'static str,
    padding: usize,
    payload: PayloadFormat,
}

fn secs(value: Option<u64>, default: u64) -> Duration {
    Duration::from_secs(value.unwrap_or(default))
}

fn describe(message: &ProtocolMessage) -> String {
    serde_json::to_string(message)
        .map(|json| codec::excerpt(&json))
        .unwrap_or_else(|_| message.kind.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::transport::memory;
    use crate::net::Transport;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::task::JoinHandle;

    type Reply = dyn Fn(&ProtocolMessage) -> Vec<String> + Send + Sync;

    /// Connector whose peer is a scripted in-process backend
    struct ScriptedConnector {
        reply: Arc<Reply>,
        frames: Arc<Mutex<Vec<ProtocolMessage>>>,
        connections: AtomicUsize,
        tasks: Mutex<Vec<JoinHandle<()>>>,
    }

    impl ScriptedConnector {
        fn new(reply: impl Fn(&ProtocolMessage) -> Vec<String> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                reply: Arc::new(reply),
                frames: Arc::new(Mutex::new(Vec::new())),
                connections: AtomicUsize::new(0),
                tasks: Mutex::new(Vec::new()),
            })
        }

        /// Backend that confirms every recording with the given meeting id
        fn confirming(meeting_id: &'static str) -> Arc<Self> {
            Self::new(move |msg| {
                if msg.kind == MessageKind::RecordingStarted {
                    vec![format!(
                        r#"{{"type":"meeting_created","meetingId":"{}"}}"#,
                        meeting_id
                    )]
                } else {
                    Vec::new()
                }
            })
        }

        fn silent() -> Arc<Self> {
            Self::new(|_| Vec::new())
        }

        /// Wait until every peer has seen its connection close
        async fn finish(&self) -> Vec<ProtocolMessage> {
            let tasks: Vec<_> = self.tasks.lock().unwrap().drain(..).collect();
            for task in tasks {
                task.await.unwrap();
            }
            self.frames.lock().unwrap().clone()
        }

        fn connections(&self) -> usize {
            self.connections.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(&self) -> Result<Box<dyn Transport>> {
            self.connections.fetch_add(1, Ordering::SeqCst);
            let (client, mut server) = memory::pair();
            let reply = self.reply.clone();
            let frames = self.frames.clone();

            let task = tokio::spawn(async move {
                while let Ok(Some(frame)) = server.recv_text().await {
                    let msg = codec::decode(&frame).unwrap();
                    let replies = reply(&msg);
                    frames.lock().unwrap().push(msg);
                    for r in replies {
                        let _ = server.send_text(r).await;
                    }
                }
            });
            self.tasks.lock().unwrap().push(task);
            Ok(Box::new(client))
        }
    }

    struct RefusingConnector;

    #[async_trait]
    impl Connector for RefusingConnector {
        async fn connect(&self) -> Result<Box<dyn Transport>> {
            Err(Error::unreachable("ws://127.0.0.1:1/audio", "connection refused"))
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.streaming.chunk_interval_ms = 1;
        config.streaming.simulation_interval_ms = 1;
        config.streaming.simulation_chunks = 4;
        config.fixture.user_id = "u1".to_string();
        config
    }

    fn engine(connector: Arc<dyn Connector>, store: Option<MemoryStore>) -> ScenarioEngine {
        let store = store.map(|s| Arc::new(s) as Arc<dyn StateStore>);
        ScenarioEngine::new(test_config(), connector, store)
            .unwrap()
            .with_output(Output::Silent)
    }

    fn streaming(chunks: usize) -> ScenarioSpec {
        ScenarioSpec::AudioStreaming {
            chunks: Some(chunks),
            interval_ms: None,
            padding: 0,
            payload: PayloadFormat::Text,
        }
    }

    #[tokio::test]
    async fn test_meeting_creation_captures_id() {
        let connector = ScriptedConnector::confirming("m-1");
        let engine = engine(connector.clone(), None);

        let (result, session) = engine
            .run(&ScenarioSpec::MeetingCreation { timeout: None }, Session::new("u1"))
            .await;

        assert!(result.passed, "{:?}", result.error);
        assert_eq!(session.meeting_id(), Some("m-1"));
        assert!(!session.is_connected());

        let frames = connector.finish().await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, MessageKind::RecordingStarted);
        assert_eq!(frames[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_meeting_id_round_trip_into_streaming() {
        let connector = ScriptedConnector::confirming("m-42");
        let engine = engine(connector.clone(), None);

        let (created, session) = engine
            .run(&ScenarioSpec::MeetingCreation { timeout: None }, Session::new("u1"))
            .await;
        assert!(created.passed);

        let session = Session::new("u1").with_meeting_id(session.meeting_id().map(str::to_string));
        let (streamed, _) = engine.run(&streaming(3), session).await;
        assert!(streamed.passed, "{:?}", streamed.error);

        let frames = connector.finish().await;
        let chunks: Vec<_> = frames
            .iter()
            .filter(|m| m.kind == MessageKind::AudioChunk)
            .collect();
        assert_eq!(chunks.len(), 3);
        for msg in frames.iter().filter(|m| {
            m.kind == MessageKind::AudioChunk || m.kind == MessageKind::RecordingStopped
        }) {
            assert_eq!(msg.meeting_id.as_deref(), Some("m-42"));
        }
        assert_eq!(frames.last().unwrap().kind, MessageKind::RecordingStopped);
    }

    #[tokio::test]
    async fn test_streaming_without_meeting_id_sends_nothing() {
        let connector = ScriptedConnector::confirming("m-1");
        let engine = engine(connector.clone(), None);

        let (result, _) = engine.run(&streaming(3), Session::new("u1")).await;

        assert!(!result.passed);
        assert_eq!(result.kind, Some(ErrorKind::PreconditionUnmet));
        assert!(result.error.unwrap().contains("No meeting ID available"));
        assert_eq!(connector.connections(), 0);
        assert!(connector.finish().await.is_empty());
    }

    #[tokio::test]
    async fn test_meeting_creation_unexpected_reply_fails() {
        let connector = ScriptedConnector::new(|_| vec![r#"{"type":"error","message":"db down"}"#.to_string()]);
        let engine = engine(connector.clone(), None);

        let (result, session) = engine
            .run(&ScenarioSpec::MeetingCreation { timeout: None }, Session::new("u1"))
            .await;

        assert!(!result.passed);
        assert_eq!(result.kind, Some(ErrorKind::ProtocolViolation));
        assert!(result.error.unwrap().contains("Unexpected response"));
        assert!(session.meeting_id().is_none());
        connector.finish().await;
    }

    #[tokio::test]
    async fn test_meeting_created_without_id_fails() {
        let connector = ScriptedConnector::new(|_| vec![r#"{"type":"meeting_created"}"#.to_string()]);
        let engine = engine(connector.clone(), None);

        let (result, _) = engine
            .run(&ScenarioSpec::MeetingCreation { timeout: None }, Session::new("u1"))
            .await;

        assert!(!result.passed);
        assert!(result.error.unwrap().contains("no meetingId"));
        connector.finish().await;
    }

    #[tokio::test]
    async fn test_meeting_creation_timeout_is_hard_failure() {
        let connector = ScriptedConnector::silent();
        let engine = engine(connector.clone(), None);

        let (result, _) = engine
            .run(&ScenarioSpec::MeetingCreation { timeout: Some(1) }, Session::new("u1"))
            .await;

        assert!(!result.passed);
        assert_eq!(result.kind, Some(ErrorKind::Timeout));
        connector.finish().await;
    }

    #[tokio::test]
    async fn test_simulation_without_confirmation_is_warning() {
        let connector = ScriptedConnector::silent();
        let engine = engine(connector.clone(), None);
        let spec = ScenarioSpec::ExtensionSimulation {
            timeout: Some(1),
            chunks: None,
            interval_ms: None,
            padding: 0,
            fallback_meeting_id: "simulation-meeting".to_string(),
        };

        let (result, session) = engine.run(&spec, Session::new("u1")).await;

        assert!(result.passed, "{:?}", result.error);
        assert_eq!(result.warnings.len(), 2);
        assert!(session.meeting_id().is_none());

        let frames = connector.finish().await;
        let chunks: Vec<_> = frames
            .iter()
            .filter(|m| m.kind == MessageKind::AudioChunk)
            .collect();
        assert_eq!(chunks.len(), 4);
        assert!(chunks
            .iter()
            .all(|m| m.meeting_id.as_deref() == Some("simulation-meeting")));
    }

    #[tokio::test]
    async fn test_simulation_uses_confirmed_meeting() {
        let connector = ScriptedConnector::confirming("m-7");
        let engine = engine(connector.clone(), None);
        let spec = ScenarioSpec::ExtensionSimulation {
            timeout: None,
            chunks: Some(2),
            interval_ms: Some(1),
            padding: 10,
            fallback_meeting_id: "simulation-meeting".to_string(),
        };

        let (result, session) = engine.run(&spec, Session::new("u1")).await;

        assert!(result.passed);
        assert!(result.warnings.is_empty());
        assert_eq!(session.meeting_id(), Some("m-7"));
        let frames = connector.finish().await;
        assert!(frames
            .iter()
            .skip(1)
            .all(|m| m.meeting_id.as_deref() == Some("m-7")));
    }

    #[tokio::test]
    async fn test_websocket_connection_unreachable() {
        let engine = engine(Arc::new(RefusingConnector), None);

        let (result, _) = engine
            .run(
                &ScenarioSpec::WebsocketConnection {
                    await_response: false,
                    timeout: None,
                },
                Session::new("u1"),
            )
            .await;

        assert!(!result.passed);
        assert_eq!(result.kind, Some(ErrorKind::Unreachable));
    }

    #[tokio::test]
    async fn test_websocket_connection_response_is_optional() {
        let connector = ScriptedConnector::silent();
        let engine = engine(connector.clone(), None);

        let (result, _) = engine
            .run(
                &ScenarioSpec::WebsocketConnection {
                    await_response: true,
                    timeout: Some(1),
                },
                Session::new("u1"),
            )
            .await;

        assert!(result.passed);
        assert_eq!(result.warnings, vec!["No response received (timeout)".to_string()]);
        let frames = connector.finish().await;
        assert_eq!(frames[0].kind, MessageKind::TestConnection);
    }

    #[tokio::test]
    async fn test_basic_session_tolerates_silence() {
        let connector = ScriptedConnector::silent();
        let engine = engine(connector.clone(), None);

        let (result, _) = engine
            .run(
                &ScenarioSpec::BasicSession {
                    timeout: Some(1),
                    payload: PayloadFormat::Text,
                },
                Session::new("u1"),
            )
            .await;

        assert!(result.passed);
        assert_eq!(result.warnings.len(), 1);
        let frames = connector.finish().await;
        assert_eq!(frames.len(), 2);
    }

    #[tokio::test]
    async fn test_basic_session_rejects_malformed_reply() {
        let connector = ScriptedConnector::new(|msg| {
            if msg.kind == MessageKind::RecordingStarted {
                vec!["<html>oops</html>".to_string()]
            } else {
                Vec::new()
            }
        });
        let engine = engine(connector.clone(), None);

        let (result, _) = engine
            .run(
                &ScenarioSpec::BasicSession {
                    timeout: Some(2),
                    payload: PayloadFormat::DataUrl,
                },
                Session::new("u1"),
            )
            .await;

        assert!(!result.passed);
        assert_eq!(result.kind, Some(ErrorKind::ProtocolViolation));
        connector.finish().await;
    }

    #[tokio::test]
    async fn test_basic_session_full_exchange() {
        let connector = ScriptedConnector::confirming("m-5");
        let engine = engine(connector.clone(), None);

        let (result, _) = engine
            .run(
                &ScenarioSpec::BasicSession {
                    timeout: None,
                    payload: PayloadFormat::DataUrl,
                },
                Session::new("u1"),
            )
            .await;

        assert!(result.passed);
        let frames = connector.finish().await;
        let kinds: Vec<_> = frames.iter().map(|m| m.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                MessageKind::TestConnection,
                MessageKind::RecordingStarted,
                MessageKind::AudioChunk,
                MessageKind::RecordingStopped,
            ]
        );
        assert!(frames[2]
            .data
            .as_deref()
            .unwrap()
            .starts_with("data:audio/webm;base64,"));
    }

    #[tokio::test]
    async fn test_database_storage_missing_meeting() {
        let store = MemoryStore::new();
        let engine = engine(ScriptedConnector::silent(), Some(store));
        let session = Session::new("u1").with_meeting_id(Some("missing".to_string()));

        let (result, _) = engine.run(&ScenarioSpec::DatabaseStorage, session).await;

        assert!(!result.passed);
        assert_eq!(result.error.as_deref(), Some("meeting not found"));
        assert_eq!(result.kind, Some(ErrorKind::PersistenceError));
    }

    #[tokio::test]
    async fn test_database_storage_found() {
        let store = MemoryStore::new();
        store.create_meeting("m-3", "u1", "Standup").unwrap();
        let engine = engine(ScriptedConnector::silent(), Some(store));
        let session = Session::new("u1").with_meeting_id(Some("m-3".to_string()));

        let (result, _) = engine.run(&ScenarioSpec::DatabaseStorage, session).await;
        assert!(result.passed, "{:?}", result.error);
    }

    #[tokio::test]
    async fn test_database_storage_wrong_owner() {
        let store = MemoryStore::new();
        store.create_meeting("m-3", "someone-else", "Standup").unwrap();
        let engine = engine(ScriptedConnector::silent(), Some(store));
        let session = Session::new("u1").with_meeting_id(Some("m-3".to_string()));

        let (result, _) = engine.run(&ScenarioSpec::DatabaseStorage, session).await;
        assert!(!result.passed);
        assert!(result.error.unwrap().contains("someone-else"));
    }

    #[tokio::test]
    async fn test_database_scenarios_without_store() {
        let engine = engine(ScriptedConnector::silent(), None);

        let (result, _) = engine
            .run(&ScenarioSpec::DatabaseConnection, Session::new("u1"))
            .await;
        assert!(!result.passed);
        assert_eq!(result.kind, Some(ErrorKind::PersistenceError));
        assert!(result.error.unwrap().contains("DATABASE_URL"));
    }

    #[tokio::test]
    async fn test_database_outage() {
        let engine = engine(ScriptedConnector::silent(), Some(MemoryStore::offline()));

        let (result, _) = engine
            .run(&ScenarioSpec::DatabaseConnection, Session::new("u1"))
            .await;
        assert!(!result.passed);
        assert_eq!(result.kind, Some(ErrorKind::PersistenceError));
    }

    #[tokio::test]
    async fn test_user_creation_twice_creates_one_row() {
        let store = MemoryStore::new();
        let engine = engine(ScriptedConnector::silent(), Some(store.clone()));

        for _ in 0..2 {
            let (result, _) = engine
                .run(&ScenarioSpec::UserCreation, Session::new("u1"))
                .await;
            assert!(result.passed, "{:?}", result.error);
        }
        assert_eq!(store.user_count(), 1);
    }
}
