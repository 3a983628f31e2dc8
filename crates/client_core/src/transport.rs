use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{CollaboratorId, Sector},
    protocol::{
        ApiPath, CompareRequest, CompareResponse, FormPayload, HistoryEntry, OverallResponse,
        SaveBadgesRequest, SaveEvaluationResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::{ClientError, EvaluationApi};

/// reqwest-backed [`EvaluationApi`] rooted at the application's base URL.
#[derive(Debug, Clone)]
pub struct HttpEvaluationApi {
    http: Client,
    base_url: Url,
}

impl HttpEvaluationApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut parsed = Url::parse(base_url).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        // Keep any path prefix when joining the absolute API paths.
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ClientError::transport(base_url, err))?;

        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ClientError::InvalidBaseUrl {
                url: format!("{}{}", self.base_url, path),
                source,
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ClientError::transport(path, err))?;
        read_json(path, response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| ClientError::transport(path, err))?;
        read_json(path, response).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| ClientError::transport(path, err))?;
    if !status.is_success() {
        return Err(ClientError::status(path, status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|err| ClientError::malformed(path, err))
}

#[async_trait]
impl EvaluationApi for HttpEvaluationApi {
    async fn fetch_overall(
        &self,
        collaborator_id: &CollaboratorId,
        sector: &Sector,
    ) -> Result<OverallResponse, ClientError> {
        self.get_json(&ApiPath::overall(collaborator_id, sector)?)
            .await
    }

    async fn save_evaluation(
        &self,
        payload: &FormPayload,
    ) -> Result<SaveEvaluationResponse, ClientError> {
        self.post_json(ApiPath::SAVE_EVALUATION, payload).await
    }

    async fn fetch_history(
        &self,
        collaborator_id: &CollaboratorId,
    ) -> Result<Vec<HistoryEntry>, ClientError> {
        self.get_json(&ApiPath::history(collaborator_id)?).await
    }

    async fn save_badges(
        &self,
        collaborator_id: &CollaboratorId,
        badges: &[String],
    ) -> Result<SaveEvaluationResponse, ClientError> {
        let request = SaveBadgesRequest {
            insignias: badges.to_vec(),
        };
        self.post_json(&ApiPath::save_badges(collaborator_id)?, &request)
            .await
    }

    async fn compare(&self, ids: &[CollaboratorId]) -> Result<CompareResponse, ClientError> {
        let request = CompareRequest { ids: ids.to_vec() };
        self.post_json(ApiPath::COMPARE, &request).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
