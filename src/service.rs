// Submission service seam.
// Forms hand out jobs; a worker waits for the service to announce readiness, runs the
// job and turns the response into an outcome the app dispatches like any other event.
// See DESIGN.md: Submission Service

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LandingError;
use crate::suggestion::SuggestionPayload;

/// `{success, error?, ...}` as answered by the managed service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubmissionResponse {
    pub fn ok() -> Self {
        SubmissionResponse {
            success: true,
            ..Default::default()
        }
    }

    pub fn rejected(error: &str) -> Self {
        SubmissionResponse {
            success: false,
            error: Some(error.to_string()),
            extra: Map::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LandingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// `success: false` becomes `SubmissionRejected`, using `fallback` when the service
    /// gave no reason.
    pub fn into_result(self, fallback: &str) -> Result<(), LandingError> {
        if self.success {
            Ok(())
        } else {
            Err(LandingError::SubmissionRejected(
                self.error.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

/// External email/suggestion backend.
#[allow(async_fn_in_trait)]
pub trait SubmissionService {
    async fn submit_email(&self, email: &str) -> Result<SubmissionResponse, LandingError>;
    async fn submit_suggestion(
        &self,
        payload: &SuggestionPayload,
    ) -> Result<SubmissionResponse, LandingError>;
}

#[derive(Default)]
struct GateState {
    open: bool,
    waiters: Vec<oneshot::Sender<()>>,
}

/// One-time readiness signal. Opens once and releases current and future waiters.
#[derive(Clone, Default)]
pub struct ReadinessGate {
    state: Rc<RefCell<GateState>>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    pub fn open(&self) {
        let waiters = {
            let mut state = self.state.borrow_mut();
            if state.open {
                return;
            }
            state.open = true;
            std::mem::take(&mut state.waiters)
        };
        log::info!("submission service ready, releasing {} waiter(s)", waiters.len());
        for waiter in waiters {
            let _ = waiter.send(());
        }
    }

    pub async fn wait(&self) {
        let receiver = {
            let mut state = self.state.borrow_mut();
            if state.open {
                return;
            }
            let (sender, receiver) = oneshot::channel();
            state.waiters.push(sender);
            receiver
        };
        // A dropped gate never opens; treat it like an open one so the caller gets the
        // service's own error instead of hanging.
        let _ = receiver.await;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionJob {
    Email(String),
    Suggestion(SuggestionPayload),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Email(Result<(), LandingError>),
    Suggestion(Result<(), LandingError>),
}

/// Wait for readiness, then run `job` against `service`.
pub async fn run_job<S: SubmissionService + ?Sized>(
    service: &S,
    gate: &ReadinessGate,
    job: SubmissionJob,
) -> SubmissionOutcome {
    gate.wait().await;

    match job {
        SubmissionJob::Email(email) => {
            let result = match service.submit_email(&email).await {
                Ok(response) => response.into_result("Failed to submit email"),
                Err(err) => Err(err),
            };
            SubmissionOutcome::Email(result)
        }
        SubmissionJob::Suggestion(payload) => {
            let result = match service.submit_suggestion(&payload).await {
                Ok(response) => response.into_result("Submission failed"),
                Err(err) => Err(err),
            };
            SubmissionOutcome::Suggestion(result)
        }
    }
}
