// ABOUTME: HTTP client for the CA server API
// ABOUTME: Health/version check, role and CA listings, public key retrieval and signing

mod envelope;
mod types;

pub use envelope::ServerError;

use envelope::Envelope;
pub use types::{CaInfo, Credentials, PublicKeyUpload, Role};

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// API version this client speaks. The server must report exactly this.
pub const API_VERSION: &str = "1.01";

/// Characters escaped when a CA name becomes a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unable to access CA server URL <{url}>")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server response issue ({reason}). Please contact your administrator.")]
    Protocol { url: String, reason: String },

    #[error("Client version issue. Please update your client code. (server API {found}, client API {expected})")]
    VersionMismatch { expected: String, found: String },

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url} (HTTP {status})")]
    Decode {
        url: String,
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} carried no payload")]
    MissingPayload { url: String },

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to create HTTP client")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// The server's own `error: true` message, if that is what this is.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server(e) => Some(&e.message),
            _ => None,
        }
    }
}

/// Anything that can turn a public key into a signed certificate.
#[async_trait]
pub trait CertificateSigner {
    async fn sign(
        &self,
        ca_name: &str,
        credentials: &Credentials,
        public_key: PublicKeyUpload,
    ) -> Result<String, ApiError>;
}

/// Client for one CA server.
#[derive(Debug, Clone)]
pub struct CaServerClient {
    http: Client,
    base_url: String,
}

impl CaServerClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// Creates a client and refuses to hand it out unless the health check passes.
    pub async fn connect(base_url: &str) -> Result<Self, ApiError> {
        let client = Self::new(base_url)?;
        let version = client.health_check().await?;
        debug!(url = %client.base_url, %version, "CA server healthy");
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks that the server is reachable and speaks [`API_VERSION`].
    pub async fn health_check(&self) -> Result<String, ApiError> {
        let url = self.base_url.clone();
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Unreachable {
                url: url.clone(),
                source: e,
            })?;

        let body = response.text().await.map_err(|e| ApiError::Unreachable {
            url: url.clone(),
            source: e,
        })?;

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| ApiError::Protocol {
                url: url.clone(),
                reason: "response is not JSON".to_string(),
            })?;

        let version = match value.get("version") {
            Some(serde_json::Value::String(version)) => version.clone(),
            Some(other) => other.to_string(),
            None => {
                return Err(ApiError::Protocol {
                    url,
                    reason: "no version reported".to_string(),
                })
            }
        };

        if version != API_VERSION {
            return Err(ApiError::VersionMismatch {
                expected: API_VERSION.to_string(),
                found: version,
            });
        }

        Ok(version)
    }

    /// Roles available to `username`. An empty list is a valid answer.
    pub async fn list_roles(&self, username: &str) -> Result<Vec<Role>, ApiError> {
        let url = self.endpoint("/list/roles");
        let request = self.http.get(&url).query(&[("user", username)]);
        let roles = self.exchange::<Vec<Role>>(&url, request).await?;
        Ok(roles.unwrap_or_default())
    }

    pub async fn list_cas(&self) -> Result<Vec<CaInfo>, ApiError> {
        let url = self.endpoint("/list/cas");
        let request = self.http.get(&url);
        let cas = self.exchange::<Vec<CaInfo>>(&url, request).await?;
        Ok(cas.unwrap_or_default())
    }

    /// Public key material of `ca_name`, as installed in `TrustedUserCAKeys`.
    pub async fn get_public_key(&self, ca_name: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&format!(
            "/get/{}",
            utf8_percent_encode(ca_name, PATH_SEGMENT)
        ));
        let request = self.http.get(&url);
        self.exchange::<String>(&url, request)
            .await?
            .ok_or(ApiError::MissingPayload { url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, ApiError> {
        debug!(%url, "calling CA server");
        let response = request.send().await.map_err(|e| ApiError::Request {
            url: url.to_string(),
            source: e,
        })?;
        let envelope = decode_envelope::<T>(url, response).await?;
        Ok(envelope.into_result()?)
    }
}

#[async_trait]
impl CertificateSigner for CaServerClient {
    async fn sign(
        &self,
        ca_name: &str,
        credentials: &Credentials,
        public_key: PublicKeyUpload,
    ) -> Result<String, ApiError> {
        let url = self.endpoint("/sign");
        let form = Form::new().part(
            "file",
            Part::bytes(public_key.contents).file_name(public_key.file_name),
        );
        let request = self
            .http
            .post(&url)
            .query(&[("ca", ca_name)])
            .basic_auth(&credentials.username, Some(&credentials.password))
            .multipart(form);

        self.exchange::<String>(&url, request)
            .await?
            .ok_or(ApiError::MissingPayload { url })
    }
}

async fn decode_envelope<T: DeserializeOwned>(
    url: &str,
    response: Response,
) -> Result<Envelope<T>, ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| ApiError::Request {
        url: url.to_string(),
        source: e,
    })?;

    serde_json::from_str(&body).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        status: status.as_u16(),
        source: e,
    })
}
