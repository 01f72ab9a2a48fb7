use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::ports::embedding_provider::{
    EmbeddingProvider, EmbeddingProviderError, EmbeddingRequest, EmbeddingResponse,
};

#[derive(Serialize)]
pub struct EmbeddingsRequest {
    pub text: TextInput,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Single(String),
    Multiple(Vec<String>),
}

impl EmbeddingsRequest {
    /// A lone text goes out as a plain string.
    pub fn for_texts(texts: &[String]) -> Self {
        let text = match texts {
            [single] => TextInput::Single(single.clone()),
            _ => TextInput::Multiple(texts.to_vec()),
        };
        Self { text }
    }
}

#[derive(Deserialize)]
pub struct EmbeddingsResponse {
    pub success: bool,
    pub embeddings: Vec<Vector>,
    #[serde(default)]
    pub shape: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsClientConfig {
    pub service_url: String,
    pub model_name: String,
    pub embedding_dimension: usize,
    pub max_input_length: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
}

impl EmbeddingsClientConfig {
    pub fn new(service_url: String, model_name: String, embedding_dimension: usize) -> Self {
        Self {
            service_url,
            model_name,
            embedding_dimension,
            max_input_length: 8192,
            max_retries: 3,
            timeout_secs: 30,
            backoff_factor: 1.5,
        }
    }
}

#[derive(Debug)]
pub enum EmbeddingsError {
    RequestError(String),
    ParseError(String),
    RateLimited,
    Unavailable,
    /// 4xx other than 429; retrying will not help.
    Rejected(String),
}

impl From<EmbeddingsError> for EmbeddingProviderError {
    fn from(e: EmbeddingsError) -> Self {
        match e {
            EmbeddingsError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
            EmbeddingsError::ParseError(msg) => EmbeddingProviderError::ApiError(msg),
            EmbeddingsError::RateLimited => EmbeddingProviderError::RateLimitExceeded,
            EmbeddingsError::Unavailable => EmbeddingProviderError::ServiceUnavailable,
            EmbeddingsError::Rejected(msg) => EmbeddingProviderError::InvalidInput(msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    config: EmbeddingsClientConfig,
}

impl InferenceClient {
    pub fn new(config: EmbeddingsClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EmbeddingsClientConfig {
        &self.config
    }

    pub async fn get_embeddings(&self, texts: &[String]) -> Result<EmbeddingsResponse, EmbeddingsError> {
        self.send_request(EmbeddingsRequest::for_texts(texts)).await
    }

    async fn send_request(
        &self,
        request: EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.execute_request(&request).await {
                Ok(response) => return Ok(response),
                Err(EmbeddingsError::Rejected(msg)) => return Err(EmbeddingsError::Rejected(msg)),
                Err(e) => {
                    if attempts > self.config.max_retries {
                        return Err(e);
                    }

                    let backoff_time = backoff_delay(self.config.backoff_factor, attempts);
                    warn!(
                        "Embedding request failed (attempt {}), retrying in {:?}: {:?}",
                        attempts, backoff_time, e
                    );
                    tokio::time::sleep(backoff_time).await;
                }
            }
        }
    }

    async fn execute_request(
        &self,
        request: &EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let response = self
            .client
            .post(&self.config.service_url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| EmbeddingsError::RequestError(format!("Error: {}", e.without_url())))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EmbeddingsError::RateLimited);
        }
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(EmbeddingsError::Unavailable);
        }
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingsError::Rejected(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            return Err(EmbeddingsError::RequestError(format!(
                "Embedding service returned {}",
                status
            )));
        }

        let parsed = response
            .json::<EmbeddingsResponse>()
            .await
            .map_err(|e| EmbeddingsError::ParseError(e.to_string()))?;

        if !parsed.success {
            return Err(EmbeddingsError::ParseError(
                "Embedding service reported failure".to_string(),
            ));
        }
        debug!("Embedding service returned shape {:?}", parsed.shape);
        Ok(parsed)
    }
}

fn backoff_delay(backoff_factor: f64, attempt: u32) -> Duration {
    Duration::from_millis((backoff_factor.powi(attempt as i32 - 1) * 1000.0) as u64)
}

pub struct InferenceEmbeddingProvider {
    client: InferenceClient,
}

impl InferenceEmbeddingProvider {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: EmbeddingsClientConfig) -> Result<Self, ReqwestError> {
        Ok(Self::new(InferenceClient::new(config)?))
    }
}

#[async_trait]
impl EmbeddingProvider for InferenceEmbeddingProvider {
    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        if request.texts.is_empty() {
            return Err(EmbeddingProviderError::InvalidInput(
                "No texts to embed".to_string(),
            ));
        }

        let response = self.client.get_embeddings(&request.texts).await?;

        if response.embeddings.len() != request.texts.len() {
            return Err(EmbeddingProviderError::ApiError(format!(
                "Expected {} embeddings, got {}",
                request.texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(EmbeddingResponse {
            embeddings: response.embeddings,
            model_name: request
                .model_name
                .unwrap_or_else(|| self.client.config().model_name.clone()),
        })
    }

    async fn health_check(&self) -> Result<bool, EmbeddingProviderError> {
        let test_request = EmbeddingRequest {
            texts: vec!["health check".to_string()],
            model_name: None,
        };

        match self.embed(test_request).await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    fn model_name(&self) -> &str {
        &self.client.config().model_name
    }

    fn max_input_length(&self) -> usize {
        self.client.config().max_input_length
    }

    fn embedding_dimension(&self) -> usize {
        self.client.config().embedding_dimension
    }
}
