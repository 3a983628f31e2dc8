//! Host-agnostic client glue for the evaluation pages: the overall-score
//! updater, the evaluation-form submitter and the page bootstrap that wires
//! both to registered UI elements.

use async_trait::async_trait;
use shared::{
    domain::{CollaboratorId, Sector},
    protocol::{
        CompareResponse, FormPayload, HistoryEntry, OverallResponse, SaveEvaluationResponse,
    },
};

pub mod error;
pub mod evaluation;
pub mod overall;
pub mod page;
pub mod renderer;
pub mod transport;

pub use error::ClientError;
pub use evaluation::{EvaluationFormSubmitter, SubmitOutcome, Submission};
pub use overall::{OverallUpdater, StaleResponsePolicy, UpdateOutcome};
pub use page::{initialize, FormBinding, Page, PageBindings, PageOptions, SelectorBinding};
pub use renderer::{ElementState, MemoryRenderer, UiRenderer};
pub use transport::HttpEvaluationApi;

/// Requests the page flows issue against the evaluation API.
#[async_trait]
pub trait EvaluationApi: Send + Sync {
    async fn fetch_overall(
        &self,
        collaborator_id: &CollaboratorId,
        sector: &Sector,
    ) -> Result<OverallResponse, ClientError>;

    async fn save_evaluation(
        &self,
        payload: &FormPayload,
    ) -> Result<SaveEvaluationResponse, ClientError>;

    async fn fetch_history(
        &self,
        collaborator_id: &CollaboratorId,
    ) -> Result<Vec<HistoryEntry>, ClientError>;

    async fn save_badges(
        &self,
        collaborator_id: &CollaboratorId,
        badges: &[String],
    ) -> Result<SaveEvaluationResponse, ClientError>;

    /// Side-by-side cards and chart series for 2 to 4 collaborators. The
    /// server owns the count check and answers 400 outside that range.
    async fn compare(&self, ids: &[CollaboratorId]) -> Result<CompareResponse, ClientError>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
