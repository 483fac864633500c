//! HTTP capability client.
//!
//! Talks to a remote capability service exposing the four workflow
//! capabilities as JSON endpoints:
//!
//! - `POST /evaluate` -> party evaluation
//! - `POST /propose`  -> compromise change delta
//! - `POST /review`   -> review verdict
//! - `POST /merge`    -> merged artifact
//!
//! Transport and status errors are mapped onto [`CapabilityError`] so the
//! engine's retry policy can distinguish transient from permanent
//! failures.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::config::RemoteSettings;
use crate::domain::case::{ArtifactRef, ChangeDelta, ChangeSet};
use crate::domain::foundation::ContractRef;
use crate::ports::{
    CapabilityError, CaseContext, DecisionProvider, EvaluationRequest, MediationRequest, Mediator,
    Merger, PartyEvaluation, ReviewVerdict, Reviewer,
};

/// HTTP adapter implementing all four capability ports.
pub struct RemoteCapabilityClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
    request_timeout: Duration,
}

impl RemoteCapabilityClient {
    /// Creates a client for the given endpoint.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Secret<String>,
        request_timeout: Duration,
    ) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| CapabilityError::network(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            request_timeout,
        })
    }

    /// Creates a client from the `remote` configuration section.
    pub fn from_settings(settings: &RemoteSettings) -> Result<Self, CapabilityError> {
        let base_url = settings
            .base_url
            .clone()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| CapabilityError::invalid_request("remote.base_url is not set"))?;
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| CapabilityError::invalid_request("remote.api_key is not set"))?;

        Self::new(
            base_url,
            api_key,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, CapabilityError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok());
            let detail = response.text().await.unwrap_or_default();
            return Err(map_status(status, retry_after, &detail));
        }

        response
            .json()
            .await
            .map_err(|err| CapabilityError::parse(err.to_string()))
    }

    fn map_transport_error(&self, err: reqwest::Error) -> CapabilityError {
        if err.is_timeout() {
            CapabilityError::timeout(self.request_timeout.as_secs())
        } else {
            CapabilityError::network(err.to_string())
        }
    }
}

/// Maps a non-success HTTP status onto a capability error.
fn map_status(status: StatusCode, retry_after: Option<u32>, detail: &str) -> CapabilityError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => CapabilityError::rate_limited(retry_after.unwrap_or(1)),
        // The capability ran and reported a definitive failure.
        StatusCode::CONFLICT => CapabilityError::failed(detail.to_string()),
        status if status.is_server_error() => {
            CapabilityError::unavailable(format!("{}: {}", status, detail))
        }
        status => CapabilityError::invalid_request(format!("{}: {}", status, detail)),
    }
}

#[derive(Debug, Deserialize)]
struct ReviewResponse {
    verdict: ReviewVerdict,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    reference: String,
    content_hash: String,
}

#[async_trait]
impl DecisionProvider for RemoteCapabilityClient {
    async fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> Result<PartyEvaluation, CapabilityError> {
        self.post("evaluate", &request).await
    }
}

#[async_trait]
impl Mediator for RemoteCapabilityClient {
    async fn propose(&self, request: MediationRequest) -> Result<ChangeDelta, CapabilityError> {
        self.post("propose", &request).await
    }
}

#[async_trait]
impl Reviewer for RemoteCapabilityClient {
    async fn review(&self, context: CaseContext) -> Result<ReviewVerdict, CapabilityError> {
        let response: ReviewResponse = self.post("review", &context).await?;
        Ok(response.verdict)
    }
}

#[async_trait]
impl Merger for RemoteCapabilityClient {
    async fn merge(
        &self,
        contract: &ContractRef,
        accepted: &ChangeSet,
    ) -> Result<ArtifactRef, CapabilityError> {
        let body = json!({"contract": contract, "accepted": accepted});
        let response: MergeResponse = self.post("merge", &body).await?;
        Ok(ArtifactRef::new(response.reference, response.content_hash))
    }
}
