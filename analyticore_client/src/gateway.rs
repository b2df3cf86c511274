use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::utils::{endpoint, parse_base_url};
use crate::{ClientError, ErrorBody, JobRecord, SubmitRequest, SubmitResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed client for the gateway's `/submit` and `/status/{id}` endpoints.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: Url,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        // No overall timeout: a synchronous gateway holds `/submit` open for
        // the whole analysis.
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Submits a text and returns the job id the gateway assigned.
    pub async fn submit(&self, text: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, &["submit"]))
            .json(&SubmitRequest {
                text: text.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body = response.bytes().await?;
        let submitted: SubmitResponse =
            serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(submitted.job_id)
    }

    pub async fn status(&self, job_id: &str) -> Result<JobRecord, ClientError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, &["status", job_id]))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(job_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

async fn rejection(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ClientError::Rejected {
            status,
            message: body.error,
            job_id: body.job_id,
        },
        Err(_) => ClientError::Rejected {
            status,
            message: text,
            job_id: None,
        },
    }
}
