//! Page bootstrap: binds registered selectors and forms to the two flows.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{CollaboratorId, ElementKey, Sector, STATUS_CLEAR_DELAY},
    protocol::FormPayload,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    EvaluationApi, EvaluationFormSubmitter, OverallUpdater, StaleResponsePolicy, Submission,
    UiRenderer, UpdateOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorBinding {
    pub collaborator_id: CollaboratorId,
    /// Value selected when the page is rendered.
    pub sector: Sector,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormBinding {
    /// The form's single status indicator.
    pub status: ElementKey,
}

/// Explicit registration of the page's sector selectors and evaluation forms,
/// keyed by the element that raises their events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBindings {
    #[serde(default)]
    pub selectors: BTreeMap<ElementKey, SelectorBinding>,
    #[serde(default)]
    pub forms: BTreeMap<ElementKey, FormBinding>,
}

impl PageBindings {
    pub fn selector(
        mut self,
        key: impl Into<ElementKey>,
        collaborator_id: impl Into<CollaboratorId>,
        sector: impl Into<Sector>,
    ) -> Self {
        self.selectors.insert(
            key.into(),
            SelectorBinding {
                collaborator_id: collaborator_id.into(),
                sector: sector.into(),
            },
        );
        self
    }

    pub fn form(mut self, key: impl Into<ElementKey>, status: impl Into<ElementKey>) -> Self {
        self.forms.insert(
            key.into(),
            FormBinding {
                status: status.into(),
            },
        );
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub stale_response_policy: StaleResponsePolicy,
    pub status_clear_delay: Duration,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            stale_response_policy: StaleResponsePolicy::default(),
            status_clear_delay: STATUS_CLEAR_DELAY,
        }
    }
}

/// Handle the host feeds selector changes and form submissions into.
pub struct Page {
    updater: OverallUpdater,
    submitter: EvaluationFormSubmitter,
    bindings: PageBindings,
    initial_updates: Vec<JoinHandle<UpdateOutcome>>,
}

/// Wires the bindings to the flows and starts one overall refresh per
/// selector using its rendered sector. Call once, inside a tokio runtime.
pub fn initialize(
    bindings: PageBindings,
    renderer: Arc<dyn UiRenderer>,
    api: Arc<dyn EvaluationApi>,
    options: PageOptions,
) -> Page {
    let updater = OverallUpdater::with_policy(
        Arc::clone(&renderer),
        Arc::clone(&api),
        options.stale_response_policy,
    );
    let submitter =
        EvaluationFormSubmitter::with_clear_delay(renderer, api, options.status_clear_delay);

    let initial_updates = bindings
        .selectors
        .values()
        .map(|binding| {
            spawn_update(
                &updater,
                binding.collaborator_id.clone(),
                binding.sector.clone(),
            )
        })
        .collect();

    info!(
        selectors = bindings.selectors.len(),
        forms = bindings.forms.len(),
        "evaluation page initialized"
    );

    Page {
        updater,
        submitter,
        bindings,
        initial_updates,
    }
}

impl Page {
    pub fn bindings(&self) -> &PageBindings {
        &self.bindings
    }

    /// Starts a refresh for the collaborator bound to `selector`.
    /// Returns `None` for selectors that were never registered.
    pub fn sector_changed(
        &self,
        selector: &ElementKey,
        sector: impl Into<Sector>,
    ) -> Option<JoinHandle<UpdateOutcome>> {
        let Some(binding) = self.bindings.selectors.get(selector) else {
            debug!(selector = %selector, "ignoring change from unregistered selector");
            return None;
        };
        Some(spawn_update(
            &self.updater,
            binding.collaborator_id.clone(),
            sector.into(),
        ))
    }

    /// Starts a submission of the fields of `form`, in document order.
    /// Returns `None` for forms that were never registered.
    pub fn form_submitted<I, K, V>(
        &self,
        form: &ElementKey,
        fields: I,
    ) -> Option<JoinHandle<Submission>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let Some(binding) = self.bindings.forms.get(form) else {
            debug!(form = %form, "ignoring submission from unregistered form");
            return None;
        };
        let payload = FormPayload::from_fields(fields);
        let submitter = self.submitter.clone();
        let status = binding.status.clone();
        Some(tokio::spawn(async move {
            submitter.submit(&status, payload).await
        }))
    }

    pub fn take_initial_updates(&mut self) -> Vec<JoinHandle<UpdateOutcome>> {
        std::mem::take(&mut self.initial_updates)
    }

    /// Waits for the initialization refreshes. A refresh that panicked is
    /// reported as [`UpdateOutcome::Failed`].
    pub async fn settle_initial_updates(&mut self) -> Vec<UpdateOutcome> {
        join_all(self.take_initial_updates())
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|err| {
                    warn!(error = %err, "initial overall refresh aborted");
                    UpdateOutcome::Failed
                })
            })
            .collect()
    }
}

fn spawn_update(
    updater: &OverallUpdater,
    collaborator_id: CollaboratorId,
    sector: Sector,
) -> JoinHandle<UpdateOutcome> {
    let updater = updater.clone();
    tokio::spawn(async move { updater.update(&collaborator_id, &sector).await })
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
