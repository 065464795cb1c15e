//! Request client for the Places API.
//!
//! [`HttpBackend`] is one configured transport: either plain or wrapped with
//! the x402 [`PaymentInterceptor`]. Which one is decided once, by
//! [`Capability::probe`](crate::capability::Capability::probe).
//!
//! Failures are returned as tagged [`BackendError`] variants built from the
//! HTTP status and the transport error, so callers never inspect messages.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use places402_pay::{
    PaymentInterceptor, ReqwestWithPayments, ReqwestWithPaymentsBuild, WalletIdentity,
};
use reqwest::StatusCode;
use reqwest_middleware as rqm;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::Settings;
use crate::payload::{HealthStatus, SearchRequest, SearchResponse, ServiceInfo};

/// A pinned, boxed, `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Failures of a backend call.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    /// The backend answered `402 Payment Required`.
    #[error("Request failed with status code 402: Payment Required")]
    PaymentRequired,

    /// No complete response within the configured timeout.
    #[error("Request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Connection or protocol failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The body was not the expected JSON document.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Any non-2xx status other than 402.
    #[error("Request failed with status code {status}: {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        message: String,
    },

    /// The payment interceptor could not pay.
    #[error("Payment failed: {0}")]
    Payment(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl BackendError {
    /// Stable label of the variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PaymentRequired => "PaymentRequired",
            Self::Timeout(_) => "Timeout",
            Self::Network(_) => "NetworkError",
            Self::MalformedResponse(_) => "MalformedResponse",
            Self::Upstream { .. } => "UpstreamError",
            Self::Payment(_) => "PaymentError",
            Self::ClientBuild(_) => "ClientBuildError",
        }
    }
}

/// The three logical endpoints of the Places API.
pub trait Backend: Send + Sync {
    /// `POST {base}{endpoint_path}`.
    fn search<'a>(
        &'a self,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<SearchResponse, BackendError>>;

    /// `GET {base}/.well-known/x402`.
    fn service_info(&self) -> BoxFuture<'_, Result<ServiceInfo, BackendError>>;

    /// `GET {base}/health`.
    fn health(&self) -> BoxFuture<'_, Result<HealthStatus, BackendError>>;
}

/// HTTP implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: rqm::ClientWithMiddleware,
    search_url: String,
    service_info_url: String,
    health_url: String,
    timeout: Duration,
    paying: bool,
}

impl HttpBackend {
    /// Builds an unwrapped client. Requests that need payment fail with
    /// [`BackendError::PaymentRequired`].
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ClientBuild`] if the TLS backend fails to
    /// initialise.
    pub fn plain(settings: &Settings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(BackendError::ClientBuild)?;
        Ok(Self::with_client(
            settings,
            rqm::ClientBuilder::new(client).build(),
            false,
        ))
    }

    /// Builds a client that pays `402` responses with `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ClientBuild`] if the TLS backend fails to
    /// initialise.
    pub fn paying(settings: &Settings, identity: WalletIdentity) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .with_payments(PaymentInterceptor::new(identity))
            .build()
            .map_err(BackendError::ClientBuild)?;
        Ok(Self::with_client(settings, client, true))
    }

    fn with_client(settings: &Settings, client: rqm::ClientWithMiddleware, paying: bool) -> Self {
        Self {
            client,
            search_url: settings.search_url(),
            service_info_url: settings.service_info_url(),
            health_url: settings.health_url(),
            timeout: settings.request_timeout(),
            paying,
        }
    }

    /// Whether the payment interceptor is installed.
    #[must_use]
    pub const fn is_paying(&self) -> bool {
        self.paying
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BackendError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(res).await
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let res = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(res).await
    }

    async fn decode<T: DeserializeOwned>(&self, res: reqwest::Response) -> Result<T, BackendError> {
        let status = res.status();
        tracing::debug!(url = %res.url(), %status, "Backend responded");

        if status == StatusCode::PAYMENT_REQUIRED {
            return Err(BackendError::PaymentRequired);
        }
        if !status.is_success() {
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_owned(),
            });
        }

        let body = res.bytes().await.map_err(|e| self.reqwest_error(&e))?;
        serde_json::from_slice(&body).map_err(|e| BackendError::MalformedResponse(e.to_string()))
    }

    fn transport_error(&self, err: rqm::Error) -> BackendError {
        match err {
            rqm::Error::Reqwest(e) => self.reqwest_error(&e),
            rqm::Error::Middleware(e) => BackendError::Payment(e.to_string()),
        }
    }

    fn reqwest_error(&self, err: &reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else if err.is_decode() {
            BackendError::MalformedResponse(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

impl Backend for HttpBackend {
    fn search<'a>(
        &'a self,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<SearchResponse, BackendError>> {
        Box::pin(self.post_json(&self.search_url, request))
    }

    fn service_info(&self) -> BoxFuture<'_, Result<ServiceInfo, BackendError>> {
        Box::pin(self.get_json(&self.service_info_url))
    }

    fn health(&self) -> BoxFuture<'_, Result<HealthStatus, BackendError>> {
        Box::pin(self.get_json(&self.health_url))
    }
}
