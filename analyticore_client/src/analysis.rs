use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::utils::endpoint;
use crate::{Analysis, ClientError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The service could not be reached (connection refused, DNS, timeout).
    #[error("analysis service unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("analysis service returned status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid analysis response: {0}")]
    InvalidResponse(String),

    #[error("analysis did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Remote sentiment/keyword extraction.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<Analysis, AnalysisError>;
}

// Some analysis services read `texto`, so both names are sent.
#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    texto: &'a str,
}

/// Calls `POST {base}/analyze` on the analysis service. Never retries.
pub struct AnalysisClient {
    client: Client,
    endpoint: Url,
}

impl AnalysisClient {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ClientError> {
        if base_url.cannot_be_a_base() {
            return Err(ClientError::UnsupportedUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint(base_url, &["analyze"]),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(&self, text: &str) -> Result<Analysis, AnalysisError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&AnalyzeRequest { text, texto: text })
            .send()
            .await
            .map_err(AnalysisError::Unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AnalysisError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(AnalysisError::Unavailable)?;
        serde_json::from_slice::<Analysis>(&body)
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sentiment;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> AnalysisClient {
        let base = Url::parse(&server.uri()).unwrap();
        AnalysisClient::new(&base, timeout).unwrap()
    }

    #[tokio::test]
    async fn analyze_returns_service_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_json(json!({ "text": "Hello world", "texto": "Hello world" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sentiment": "positive",
                "keywords": ["hello", "world"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let analysis = client_for(&server, Duration::from_secs(5))
            .analyze("Hello world")
            .await
            .unwrap();
        assert_eq!(analysis.sentiment, Sentiment::Positive);
        assert_eq!(analysis.keywords, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn analyze_accepts_native_service_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sentimiento": "negativo",
                "palabrasClave": ["triste"]
            })))
            .mount(&server)
            .await;

        let analysis = client_for(&server, Duration::from_secs(5))
            .analyze("un día triste")
            .await
            .unwrap();
        assert_eq!(analysis.sentiment, Sentiment::Negative);
    }

    #[tokio::test]
    async fn non_success_status_is_rejected_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .analyze("Hello world")
            .await
            .unwrap_err();
        match err {
            AnalysisError::Rejected { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mood": "ok" })))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .analyze("Hello world")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        // Nothing listens on port 1.
        let base = Url::parse("http://127.0.0.1:1").unwrap();
        let err = AnalysisClient::new(&base, Duration::from_secs(2))
            .unwrap()
            .analyze("Hello world")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Unavailable(_)));
    }

    #[tokio::test]
    async fn slow_service_times_out_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({ "sentiment": "neutral", "keywords": [] })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_millis(100))
            .analyze("Hello world")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Unavailable(_)));
    }

    #[test]
    fn endpoint_is_joined_to_base() {
        let base = Url::parse("http://analysis:8080/v1").unwrap();
        let client = AnalysisClient::new(&base, Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://analysis:8080/v1/analyze");
    }
}
