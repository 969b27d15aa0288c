//! Single-attempt HTTP delivery of a log payload.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use std::fmt;

use crate::config::{Config, Credentials};
use crate::sink::LogSink;

const USER_AGENT: &str = concat!("last9-forwarder/", env!("CARGO_PKG_VERSION"));

/// Why one delivery attempt failed. Exactly one of transport error or
/// response is present.
#[derive(Debug)]
pub enum DeliveryFailure {
    /// The request never produced a response (DNS, connect, TLS, body read).
    Transport(reqwest::Error),
    /// The endpoint answered with anything other than 202.
    UnexpectedStatus { status: StatusCode, body: String },
}

impl DeliveryFailure {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DeliveryFailure::Transport(e) => e.status(),
            DeliveryFailure::UnexpectedStatus { status, .. } => Some(*status),
        }
    }

    /// Structured form written to the log when retries run out.
    pub fn descriptor(&self) -> FailureDescriptor {
        match self {
            DeliveryFailure::Transport(e) => FailureDescriptor {
                transport_error: Some(e.to_string()),
                response: None,
            },
            DeliveryFailure::UnexpectedStatus { status, body } => FailureDescriptor {
                transport_error: None,
                response: Some(ResponseSummary {
                    status: status.as_u16(),
                    body: body.clone(),
                }),
            },
        }
    }
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryFailure::Transport(e) => write!(f, "Transport error: {}", e),
            DeliveryFailure::UnexpectedStatus { status, .. } => {
                write!(f, "Unexpected status: {}", status.as_u16())
            }
        }
    }
}

impl std::error::Error for DeliveryFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeliveryFailure::Transport(e) => Some(e),
            DeliveryFailure::UnexpectedStatus { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDescriptor {
    pub transport_error: Option<String>,
    pub response: Option<ResponseSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    pub status: u16,
    pub body: String,
}

/// One delivery attempt of an already-joined payload.
#[async_trait]
pub trait Deliver: Send + Sync {
    /// Resolves with the response body on 202, fails otherwise. The status of
    /// every response received is logged to `sink`.
    async fn deliver(&self, payload: &str, sink: &dyn LogSink) -> Result<String, DeliveryFailure>;
}

/// Delivery client posting to the Last9 JSON-lines endpoint.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: Url,
    authorization: HeaderValue,
}

impl HttpClient {
    /// Creates a delivery client wrapping the given reqwest Client.
    pub fn new(client: Client, endpoint: Url, credentials: &Credentials) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&credentials.authorization_header())
            .context("Failed to build Authorization header")?;
        authorization.set_sensitive(true);

        Ok(Self {
            client,
            endpoint,
            authorization,
        })
    }

    /// Builds the reqwest Client and the delivery client from resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Self::new(client, config.endpoint.clone(), &config.credentials)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Deliver for HttpClient {
    #[tracing::instrument(skip(self, payload, sink), fields(bytes = payload.len()))]
    async fn deliver(&self, payload: &str, sink: &dyn LogSink) -> Result<String, DeliveryFailure> {
        debug!("POST {} bytes to {}...", payload.len(), self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .body(payload.to_string())
            .send()
            .await
            .map_err(DeliveryFailure::Transport)?;

        let status = response.status();
        sink.log(&format!("Got response:{}", status.as_u16()));

        let body = response.text().await.map_err(DeliveryFailure::Transport)?;

        if status == StatusCode::ACCEPTED {
            Ok(body)
        } else {
            Err(DeliveryFailure::UnexpectedStatus { status, body })
        }
    }
}
