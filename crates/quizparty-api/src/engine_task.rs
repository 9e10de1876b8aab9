//! The engine actor: a tokio task that owns the [`SessionEngine`] and
//! processes one message at a time.

use std::ops::ControlFlow;
use std::time::Duration;

use quizparty_core::error::DomainError;
use quizparty_session::application::engine::SessionEngine;
use quizparty_session::application::query_handlers::{
    QuestionStatsView, SessionCreated, SessionView,
};
use quizparty_session::domain::code::SessionCode;
use quizparty_session::domain::commands::ClientCommand;
use quizparty_session::domain::player::ConnectionId;
use quizparty_session::domain::timers::SessionTimer;
use tokio::sync::mpsc::{self, Receiver, Sender, UnboundedReceiver};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::hub::ConnectionHub;
use crate::scheduler::Firing;

const QUEUE_DEPTH: usize = 1024;

type Reply<T> = oneshot::Sender<Result<T, DomainError>>;

/// Work items for the engine task.
#[derive(Debug)]
pub enum EngineMessage {
    Client {
        connection: ConnectionId,
        command: ClientCommand,
        reply: Reply<()>,
    },
    Disconnect(ConnectionId),
    Sweep,
    CreateSession(Reply<SessionCreated>),
    GetSession {
        code: SessionCode,
        reply: Reply<SessionView>,
    },
    Stats(oneshot::Sender<QuestionStatsView>),
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable front door to the engine task.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: Sender<EngineMessage>,
}

impl EngineHandle {
    /// Creates a new session.
    ///
    /// # Errors
    ///
    /// Returns the engine's refusal, or `EngineUnavailable` if it stopped.
    pub async fn create_session(&self) -> Result<SessionCreated, ApiError> {
        self.request(EngineMessage::CreateSession).await
    }

    /// Looks up one session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown code, or `EngineUnavailable`.
    pub async fn session(&self, code: SessionCode) -> Result<SessionView, ApiError> {
        self.request(|reply| EngineMessage::GetSession { code, reply })
            .await
    }

    /// Corpus statistics.
    ///
    /// # Errors
    ///
    /// Returns `EngineUnavailable` if the engine stopped.
    pub async fn stats(&self) -> Result<QuestionStatsView, ApiError> {
        let (reply, response) = oneshot::channel();
        self.send(EngineMessage::Stats(reply)).await?;
        response.await.map_err(|_| ApiError::EngineUnavailable)
    }

    /// Applies a client command on behalf of `connection`.
    ///
    /// # Errors
    ///
    /// Returns why the command was refused, or `EngineUnavailable`.
    pub async fn dispatch(
        &self,
        connection: ConnectionId,
        command: ClientCommand,
    ) -> Result<(), ApiError> {
        self.request(|reply| EngineMessage::Client {
            connection,
            command,
            reply,
        })
        .await
    }

    /// Reports a closed connection. Never fails; a stopped engine has
    /// nothing left to release.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let _ = self.send(EngineMessage::Disconnect(connection)).await;
    }

    /// Runs the expiry sweep.
    pub async fn sweep(&self) {
        let _ = self.send(EngineMessage::Sweep).await;
    }

    /// Closes every session and waits for the notifications to go out.
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        if self.send(EngineMessage::Shutdown(reply)).await.is_ok() {
            let _ = done.await;
        }
    }

    async fn request<T, F>(&self, build: F) -> Result<T, ApiError>
    where
        F: FnOnce(Reply<T>) -> EngineMessage,
    {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response
            .await
            .map_err(|_| ApiError::EngineUnavailable)?
            .map_err(ApiError::from)
    }

    async fn send(&self, message: EngineMessage) -> Result<(), ApiError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| ApiError::EngineUnavailable)
    }
}

/// Spawns the engine task. It runs until every handle is dropped or a
/// shutdown is requested.
#[must_use]
pub fn spawn_engine(
    engine: SessionEngine,
    hub: ConnectionHub,
    timers: UnboundedReceiver<Firing<SessionTimer>>,
) -> (EngineHandle, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
    let task = tokio::spawn(run(engine, hub, receiver, timers));
    (EngineHandle { sender }, task)
}

/// Spawns a task that asks the engine to sweep every `period`.
#[must_use]
pub fn spawn_sweeper(handle: EngineHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            handle.sweep().await;
        }
    })
}

async fn run(
    mut engine: SessionEngine,
    hub: ConnectionHub,
    mut messages: Receiver<EngineMessage>,
    mut timers: UnboundedReceiver<Firing<SessionTimer>>,
) {
    info!("Session engine started");
    loop {
        tokio::select! {
            message = messages.recv() => {
                let Some(message) = message else { break };
                if let ControlFlow::Break(done) = handle(&mut engine, message).await {
                    engine.shutdown();
                    hub.deliver(engine.drain_outbox()).await;
                    let _ = done.send(());
                    break;
                }
            }
            Some((id, timer)) = timers.recv() => {
                engine.fire_timer(id, timer).await;
            }
        }
        hub.deliver(engine.drain_outbox()).await;
    }
    info!("Session engine stopped");
}

/// Applies one message. Breaks with the acknowledgement channel on shutdown.
async fn handle(
    engine: &mut SessionEngine,
    message: EngineMessage,
) -> ControlFlow<oneshot::Sender<()>> {
    match message {
        EngineMessage::Client {
            connection,
            command,
            reply,
        } => {
            let result = engine.dispatch(connection, command).await;
            if let Err(e) = &result {
                debug!(connection = %connection, error = %e, "Command refused");
            }
            let _ = reply.send(result);
        }
        EngineMessage::Disconnect(connection) => engine.disconnect(connection),
        EngineMessage::Sweep => {
            engine.sweep();
        }
        EngineMessage::CreateSession(reply) => {
            let _ = reply.send(engine.create_session().await);
        }
        EngineMessage::GetSession { code, reply } => {
            let _ = reply.send(engine.session_view(&code));
        }
        EngineMessage::Stats(reply) => {
            let _ = reply.send(engine.stats());
        }
        EngineMessage::Shutdown(done) => return ControlFlow::Break(done),
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quizparty_core::clock::Clock;
    use quizparty_questions::application::history_store::UsageHistoryStore;
    use quizparty_questions::application::selector::SelectorConfig;
    use quizparty_questions::domain::corpus::QuestionCorpus;
    use quizparty_questions::domain::history::DEFAULT_HISTORY_CAPACITY;
    use quizparty_session::application::engine::EngineConfig;
    use quizparty_test_support::{CyclingRng, FixedClock, InMemoryHistoryRepository};

    use super::*;
    use crate::scheduler::TokioScheduler;

    async fn start_engine(hub: ConnectionHub) -> EngineHandle {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(
            chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
        ));
        let history = UsageHistoryStore::open(
            DEFAULT_HISTORY_CAPACITY,
            SelectorConfig::default(),
            Arc::new(InMemoryHistoryRepository::default()),
            clock.clone(),
        )
        .await;
        let (scheduler, timers) = TokioScheduler::channel();
        let engine = SessionEngine::new(
            Arc::new(QuestionCorpus::default()),
            Arc::new(history),
            clock,
            Box::new(CyclingRng::default()),
            Arc::new(scheduler),
            EngineConfig::default(),
        );
        let (handle, _task) = spawn_engine(engine, hub, timers);
        handle
    }

    #[tokio::test]
    async fn test_dispatch_delivers_events_through_hub() {
        // Arrange
        let hub = ConnectionHub::new();
        let handle = start_engine(hub.clone()).await;
        let connection = ConnectionId::new();
        let (outbound, mut frames) = mpsc::channel(8);
        hub.register(connection, outbound).await;
        let created = handle.create_session().await.unwrap();

        // Act
        handle
            .dispatch(
                connection,
                ClientCommand::HostJoin {
                    code: created.code.clone(),
                },
            )
            .await
            .unwrap();

        // Assert
        let frame = frames.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["event"], "host-joined");
        assert_eq!(json["data"]["code"], created.code.as_str());
    }

    #[tokio::test]
    async fn test_refused_command_is_returned_to_caller() {
        let handle = start_engine(ConnectionHub::new()).await;

        let result = handle
            .dispatch(
                ConnectionId::new(),
                ClientCommand::HostJoin {
                    code: SessionCode::parse("9999").unwrap(),
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(ApiError::Domain(DomainError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_closes_sessions_and_stops_engine() {
        // Arrange
        let hub = ConnectionHub::new();
        let handle = start_engine(hub.clone()).await;
        let host = ConnectionId::new();
        let (outbound, mut frames) = mpsc::channel(8);
        hub.register(host, outbound).await;
        let created = handle.create_session().await.unwrap();
        handle
            .dispatch(host, ClientCommand::HostJoin { code: created.code })
            .await
            .unwrap();
        frames.recv().await.unwrap();

        // Act
        handle.shutdown().await;

        // Assert
        let frame = frames.recv().await.unwrap();
        assert!(frame.contains("server-shutdown"));
        assert!(matches!(
            handle.create_session().await,
            Err(ApiError::EngineUnavailable)
        ));
    }
}
