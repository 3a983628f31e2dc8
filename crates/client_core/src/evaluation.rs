//! Submits evaluation forms and reports the outcome in the form's status element.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::{
        ElementKey, StyleProperty, COLOR_FAILURE, COLOR_SUCCESS, SAVE_FAILED_TEXT, SAVING_TEXT,
        STATUS_CLEAR_DELAY,
    },
    protocol::FormPayload,
};
use tokio::{runtime::Handle, task::JoinHandle, time::Instant};
use tracing::{error, info};

use crate::{EvaluationApi, UiRenderer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved(String),
    Failed,
}

/// Result of one submission plus the pending status clear it scheduled.
#[derive(Debug)]
pub struct Submission {
    pub outcome: SubmitOutcome,
    pub clear: JoinHandle<()>,
}

#[derive(Clone)]
pub struct EvaluationFormSubmitter {
    renderer: Arc<dyn UiRenderer>,
    api: Arc<dyn EvaluationApi>,
    clear_delay: Duration,
}

impl EvaluationFormSubmitter {
    pub fn new(renderer: Arc<dyn UiRenderer>, api: Arc<dyn EvaluationApi>) -> Self {
        Self::with_clear_delay(renderer, api, STATUS_CLEAR_DELAY)
    }

    pub fn with_clear_delay(
        renderer: Arc<dyn UiRenderer>,
        api: Arc<dyn EvaluationApi>,
        clear_delay: Duration,
    ) -> Self {
        Self {
            renderer,
            api,
            clear_delay,
        }
    }

    pub fn clear_delay(&self) -> Duration {
        self.clear_delay
    }

    /// Must be called from within a tokio runtime; the status clear runs as
    /// its own task and is never cancelled by later submissions.
    pub async fn submit(&self, status: &ElementKey, payload: FormPayload) -> Submission {
        self.renderer.set_text(status, SAVING_TEXT);
        let mut pending_clear = PendingClear {
            submitter: self,
            status,
            armed: true,
        };

        let outcome = match self.api.save_evaluation(&payload).await {
            Ok(response) => {
                info!(status_element = %status, fields = payload.len(), "evaluation saved");
                self.renderer.set_text(status, &response.mensagem);
                self.renderer
                    .set_style(status, StyleProperty::Color, COLOR_SUCCESS);
                SubmitOutcome::Saved(response.mensagem)
            }
            Err(err) => {
                error!(status_element = %status, error = %err, "failed to save evaluation");
                self.renderer.set_text(status, SAVE_FAILED_TEXT);
                self.renderer
                    .set_style(status, StyleProperty::Color, COLOR_FAILURE);
                SubmitOutcome::Failed
            }
        };

        pending_clear.armed = false;
        Submission {
            outcome,
            clear: self.schedule_clear(status.clone(), Instant::now() + self.clear_delay),
        }
    }

    fn schedule_clear(&self, status: ElementKey, deadline: Instant) -> JoinHandle<()> {
        let renderer = Arc::clone(&self.renderer);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            renderer.set_text(&status, "");
        })
    }
}

/// Schedules the status clear when a submission ends without reaching its
/// normal completion, such as a panicking or dropped request future.
struct PendingClear<'a> {
    submitter: &'a EvaluationFormSubmitter,
    status: &'a ElementKey,
    armed: bool,
}

impl Drop for PendingClear<'_> {
    fn drop(&mut self) {
        if !self.armed || Handle::try_current().is_err() {
            return;
        }
        let deadline = Instant::now() + self.submitter.clear_delay;
        let _ = self.submitter.schedule_clear(self.status.clone(), deadline);
    }
}

#[cfg(test)]
#[path = "tests/evaluation_tests.rs"]
mod tests;
