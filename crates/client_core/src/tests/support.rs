//! Fakes shared by the flow tests.

use std::{
    collections::VecDeque,
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use shared::{
    domain::{CollaboratorId, Sector},
    protocol::{
        CompareResponse, FormPayload, HistoryEntry, OverallResponse, SaveEvaluationResponse,
    },
};
use tokio::sync::oneshot;
use tracing::{subscriber::DefaultGuard, Event, Level, Subscriber};
use tracing_subscriber::{layer::Context, prelude::*, Layer};

use crate::{ClientError, EvaluationApi};

#[derive(Debug, Clone, Copy)]
pub enum FakeFailure {
    Network,
    Status(u16),
    Malformed,
    Panic,
}

impl FakeFailure {
    fn into_error(self, path: &str) -> ClientError {
        match self {
            Self::Network => ClientError::transport(
                path,
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            ),
            Self::Status(status) => ClientError::status(
                path,
                status,
                r#"{"status":"erro","mensagem":"falha no servidor"}"#,
            ),
            Self::Malformed => ClientError::malformed(path, "expected value at line 1 column 1"),
            Self::Panic => panic!("fake api asked to panic for {path}"),
        }
    }
}

pub struct Reply<T> {
    outcome: Result<T, FakeFailure>,
    gate: Option<oneshot::Receiver<()>>,
}

impl<T> Reply<T> {
    pub fn ok(value: T) -> Self {
        Self {
            outcome: Ok(value),
            gate: None,
        }
    }

    pub fn fail(failure: FakeFailure) -> Self {
        Self {
            outcome: Err(failure),
            gate: None,
        }
    }

    /// Holds the reply until the returned sender fires.
    pub fn gated(mut self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        self.gate = Some(rx);
        (self, tx)
    }

    async fn resolve(self, path: &str) -> Result<T, ClientError> {
        if let Some(gate) = self.gate {
            let _ = gate.await;
        }
        self.outcome.map_err(|failure| failure.into_error(path))
    }
}

pub fn overall(value: serde_json::Value) -> Reply<OverallResponse> {
    Reply::ok(OverallResponse { overall: value })
}

pub fn saved(mensagem: &str) -> Reply<SaveEvaluationResponse> {
    Reply::ok(SaveEvaluationResponse {
        mensagem: mensagem.to_string(),
        status: Some("sucesso".to_string()),
    })
}

/// Scripted [`EvaluationApi`]: replies are consumed in order and every call is
/// recorded before its reply resolves. An exhausted script fails like a
/// refused connection.
#[derive(Default)]
pub struct FakeApi {
    overall_replies: Mutex<VecDeque<Reply<OverallResponse>>>,
    save_replies: Mutex<VecDeque<Reply<SaveEvaluationResponse>>>,
    overall_calls: Mutex<Vec<(CollaboratorId, Sector)>>,
    saved_payloads: Mutex<Vec<FormPayload>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_overall(&self, reply: Reply<OverallResponse>) {
        self.overall_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_save(&self, reply: Reply<SaveEvaluationResponse>) {
        self.save_replies.lock().unwrap().push_back(reply);
    }

    pub fn overall_calls(&self) -> Vec<(CollaboratorId, Sector)> {
        self.overall_calls.lock().unwrap().clone()
    }

    pub fn saved_payloads(&self) -> Vec<FormPayload> {
        self.saved_payloads.lock().unwrap().clone()
    }

    pub async fn wait_for_overall_calls(&self, count: usize) {
        while self.overall_calls.lock().unwrap().len() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl EvaluationApi for FakeApi {
    async fn fetch_overall(
        &self,
        collaborator_id: &CollaboratorId,
        sector: &Sector,
    ) -> Result<OverallResponse, ClientError> {
        self.overall_calls
            .lock()
            .unwrap()
            .push((collaborator_id.clone(), sector.clone()));
        let reply = self.overall_replies.lock().unwrap().pop_front();
        let path = format!("/api/colaborador/{collaborator_id}/overall/{sector}");
        match reply {
            Some(reply) => reply.resolve(&path).await,
            None => Err(FakeFailure::Network.into_error(&path)),
        }
    }

    async fn save_evaluation(
        &self,
        payload: &FormPayload,
    ) -> Result<SaveEvaluationResponse, ClientError> {
        self.saved_payloads.lock().unwrap().push(payload.clone());
        let reply = self.save_replies.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve("/api/salvar_avaliacao").await,
            None => Err(FakeFailure::Network.into_error("/api/salvar_avaliacao")),
        }
    }

    async fn fetch_history(
        &self,
        _collaborator_id: &CollaboratorId,
    ) -> Result<Vec<HistoryEntry>, ClientError> {
        Ok(Vec::new())
    }

    async fn save_badges(
        &self,
        _collaborator_id: &CollaboratorId,
        _badges: &[String],
    ) -> Result<SaveEvaluationResponse, ClientError> {
        Err(FakeFailure::Network.into_error("/api/colaborador/salvar_insignias"))
    }

    async fn compare(&self, _ids: &[CollaboratorId]) -> Result<CompareResponse, ClientError> {
        Err(FakeFailure::Network.into_error("/api/comparar"))
    }
}

/// Counts `ERROR` events emitted while the guard is alive on this thread.
#[derive(Clone, Default)]
pub struct ErrorEvents(Arc<AtomicUsize>);

impl ErrorEvents {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub fn capture_errors() -> (ErrorEvents, DefaultGuard) {
    let events = ErrorEvents::default();
    let guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(events.clone()));
    (events, guard)
}
