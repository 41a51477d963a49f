//! HTTP request/response contract and the `reqwest` implementation of it.
//!
//! The engine only talks to [`HttpClient`]; TLS, pooling and timeouts are the
//! implementation's concern.

use crate::error::RequestError;
use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build http client")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_bad_credential_response(&self) -> bool {
        self.status == 401
    }

    /// 401 is the only bad-credential signal; every other non-2xx carries its code.
    pub fn ensure_success(self) -> Result<Self, RequestError> {
        if self.is_bad_credential_response() {
            return Err(RequestError::BadCredentials);
        }
        if !self.is_success() {
            return Err(RequestError::BadResponseCode(self.status));
        }
        Ok(self)
    }

    /// Body of a successful response that is expected to carry content.
    pub fn into_body(self) -> Result<Vec<u8>, RequestError> {
        let response = self.ensure_success()?;
        if response.body.is_empty() {
            return Err(RequestError::NoResponse);
        }
        Ok(response.body)
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, RequestError> {
        let body = self.into_body()?;
        serde_json::from_slice(&body).map_err(|err| RequestError::CouldNotDecode(err.to_string()))
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Performs the request. Non-2xx statuses are returned as responses, not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RequestError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RequestError> {
        debug!("{:?} {}", request.method, request.url);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| RequestError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| RequestError::Transport(err.to_string()))?;

        debug!("{} -> {}", request.url, status);
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
