//! Refreshes a collaborator's overall-score display for a selected sector.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use shared::domain::{
    CollaboratorId, ElementKey, Sector, StyleProperty, OPACITY_NORMAL, OPACITY_UPDATING,
    OVERALL_ERROR_TEXT,
};
use tracing::{debug, error};

use crate::{EvaluationApi, UiRenderer};

/// What to do with a response that resolves after a newer request for the
/// same collaborator was issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleResponsePolicy {
    /// Every response is rendered; the last one to resolve wins the display.
    #[default]
    LastResolvedWins,
    /// Responses superseded by a later trigger are discarded.
    DropStale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Rendered(String),
    Failed,
    MissingTarget,
    Superseded,
}

#[derive(Clone)]
pub struct OverallUpdater {
    renderer: Arc<dyn UiRenderer>,
    api: Arc<dyn EvaluationApi>,
    policy: StaleResponsePolicy,
    latest_request: Arc<Mutex<HashMap<CollaboratorId, u64>>>,
}

impl OverallUpdater {
    pub fn new(renderer: Arc<dyn UiRenderer>, api: Arc<dyn EvaluationApi>) -> Self {
        Self::with_policy(renderer, api, StaleResponsePolicy::default())
    }

    pub fn with_policy(
        renderer: Arc<dyn UiRenderer>,
        api: Arc<dyn EvaluationApi>,
        policy: StaleResponsePolicy,
    ) -> Self {
        Self {
            renderer,
            api,
            policy,
            latest_request: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn policy(&self) -> StaleResponsePolicy {
        self.policy
    }

    pub async fn update(&self, collaborator_id: &CollaboratorId, sector: &Sector) -> UpdateOutcome {
        let display = ElementKey::overall_display(collaborator_id);
        if !self.renderer.has_element(&display) {
            return UpdateOutcome::MissingTarget;
        }

        let token = (self.policy == StaleResponsePolicy::DropStale)
            .then(|| self.issue_token(collaborator_id));
        self.renderer
            .set_style(&display, StyleProperty::Opacity, OPACITY_UPDATING);
        let mut restore = OpacityRestore {
            renderer: self.renderer.as_ref(),
            key: &display,
            armed: true,
        };

        let result = self.api.fetch_overall(collaborator_id, sector).await;

        if !self.is_latest(collaborator_id, token) {
            debug!(
                collaborator_id = %collaborator_id,
                sector = %sector,
                "dropping superseded overall response"
            );
            restore.armed = false;
            return UpdateOutcome::Superseded;
        }

        match result {
            Ok(response) => {
                let text = response.display_text();
                self.renderer.set_text(&display, &text);
                UpdateOutcome::Rendered(text)
            }
            Err(err) => {
                error!(
                    collaborator_id = %collaborator_id,
                    sector = %sector,
                    error = %err,
                    "failed to refresh overall score"
                );
                self.renderer.set_text(&display, OVERALL_ERROR_TEXT);
                UpdateOutcome::Failed
            }
        }
    }

    fn issue_token(&self, collaborator_id: &CollaboratorId) -> u64 {
        let mut latest = self
            .latest_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let token = latest.entry(collaborator_id.clone()).or_insert(0);
        *token += 1;
        *token
    }

    /// Untracked requests (no token) are always current.
    fn is_latest(&self, collaborator_id: &CollaboratorId, token: Option<u64>) -> bool {
        let Some(token) = token else {
            return true;
        };
        self.latest_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collaborator_id)
            .is_some_and(|latest| *latest == token)
    }
}

/// Puts the display back to normal opacity however the update ends,
/// including when the request future panics.
struct OpacityRestore<'a> {
    renderer: &'a dyn UiRenderer,
    key: &'a ElementKey,
    armed: bool,
}

impl Drop for OpacityRestore<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.renderer
                .set_style(self.key, StyleProperty::Opacity, OPACITY_NORMAL);
        }
    }
}

#[cfg(test)]
#[path = "tests/overall_tests.rs"]
mod tests;
