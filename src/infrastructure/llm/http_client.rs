use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;

use crate::domain::DomainError;

/// Stream type for HTTP responses
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, DomainError>> + Send>>;

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn get_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
    ) -> Result<serde_json::Value, DomainError>;

    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;

    async fn post_json_stream(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<ByteStream, DomainError>;
}

/// Real HTTP client using reqwest; errors are attributed to `provider`
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    provider: &'static str,
    timeout: Option<Duration>,
}

impl HttpClient {
    pub fn new(provider: &'static str) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider,
            timeout: None,
        }
    }

    /// Bound connecting, whole JSON calls and stream establishment by
    /// `timeout`. A streamed body may run longer.
    pub fn with_timeout(provider: &'static str, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::backend_unavailable(provider, format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            provider,
            timeout: Some(timeout),
        })
    }

    fn with_request_timeout(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, DomainError> {
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::backend_error(self.provider, format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        let message = format!("HTTP {}: {}", status, error_body);

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(DomainError::rate_limited(self.provider, message))
        } else {
            Err(DomainError::backend_error(self.provider, message))
        }
    }

    async fn read_json(&self, response: reqwest::Response) -> Result<serde_json::Value, DomainError> {
        response.json().await.map_err(|e| {
            DomainError::backend_error(self.provider, format!("Failed to parse response: {}", e))
        })
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn get_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
    ) -> Result<serde_json::Value, DomainError> {
        let mut request = self.with_request_timeout(self.client.get(url));

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = self.send(request).await?;
        self.read_json(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let mut request = self.with_request_timeout(self.client.post(url));

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = self.send(request.json(body)).await?;
        self.read_json(response).await
    }

    async fn post_json_stream(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<ByteStream, DomainError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.send(request.json(body)))
                .await
                .map_err(|_| {
                    DomainError::backend_error(
                        self.provider,
                        format!("No response within {}s", timeout.as_secs()),
                    )
                })??,
            None => self.send(request.json(body)).await?,
        };

        let provider = self.provider;
        let stream = response.bytes_stream().map(move |result| {
            result.map_err(|e| DomainError::backend_error(provider, format!("Stream error: {}", e)))
        });

        Ok(Box::pin(stream))
    }
}


#[cfg(test)]
pub mod mock {
    use super::*;
    use futures::stream;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Canned responses keyed by URL
    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        responses: RwLock<HashMap<String, serde_json::Value>>,
        stream_responses: RwLock<HashMap<String, Vec<Result<Bytes, DomainError>>>>,
        errors: RwLock<HashMap<String, DomainError>>,
        requests: RwLock<Vec<(String, serde_json::Value)>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: impl Into<String>, response: serde_json::Value) -> Self {
            self.responses.write().unwrap().insert(url.into(), response);
            self
        }

        pub fn with_stream_response(self, url: impl Into<String>, chunks: Vec<Bytes>) -> Self {
            self.stream_responses
                .write()
                .unwrap()
                .insert(url.into(), chunks.into_iter().map(Ok).collect());
            self
        }

        /// Stream that yields `chunks` and then fails
        pub fn with_broken_stream(
            self,
            url: impl Into<String>,
            chunks: Vec<Bytes>,
            error: DomainError,
        ) -> Self {
            let mut items: Vec<Result<Bytes, DomainError>> = chunks.into_iter().map(Ok).collect();
            items.push(Err(error));
            self.stream_responses.write().unwrap().insert(url.into(), items);
            self
        }

        pub fn with_error(self, url: impl Into<String>, error: DomainError) -> Self {
            self.errors.write().unwrap().insert(url.into(), error);
            self
        }

        /// Bodies posted so far, with their URLs
        pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
            self.requests.read().unwrap().clone()
        }

        fn check_error(&self, url: &str) -> Result<(), DomainError> {
            match self.errors.read().unwrap().get(url) {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn get_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
        ) -> Result<serde_json::Value, DomainError> {
            self.check_error(url)?;

            self.responses
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| DomainError::backend_error("mock", format!("No mock response for {}", url)))
        }

        async fn post_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            body: &serde_json::Value,
        ) -> Result<serde_json::Value, DomainError> {
            self.requests
                .write()
                .unwrap()
                .push((url.to_string(), body.clone()));
            self.check_error(url)?;

            self.responses
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| DomainError::backend_error("mock", format!("No mock response for {}", url)))
        }

        async fn post_json_stream(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            body: &serde_json::Value,
        ) -> Result<ByteStream, DomainError> {
            self.requests
                .write()
                .unwrap()
                .push((url.to_string(), body.clone()));
            self.check_error(url)?;

            let chunks = self
                .stream_responses
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_default();

            Ok(Box::pin(stream::iter(chunks)))
        }
    }
}
