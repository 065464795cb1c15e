#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Automatic [x402](https://www.x402.org) payments for `reqwest` clients.
//!
//! This crate is the payment collaborator of the places402 MCP server. It
//! offers exactly two operations:
//!
//! - [`derive_identity`] turns a hex private key into a [`WalletIdentity`];
//! - [`ReqwestWithPayments::with_payments`] wraps a `reqwest` client with a
//!   [`PaymentInterceptor`] that pays `402 Payment Required` responses.
//!
//! ```rust,ignore
//! use places402_pay::{PaymentInterceptor, ReqwestWithPayments, ReqwestWithPaymentsBuild};
//!
//! let identity = places402_pay::derive_identity(&private_key)?;
//! let client = reqwest::Client::new()
//!     .with_payments(PaymentInterceptor::new(identity))
//!     .build();
//! let res = client.post(url).json(&body).send().await?;
//! ```
//!
//! Only the "exact" scheme on EVM networks is supported: the interceptor signs
//! an ERC-3009 `transferWithAuthorization` over EIP-712 and retries once.
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation of the payment flow

pub mod error;
pub mod identity;
pub mod middleware;
pub mod networks;
pub mod proto;
pub mod sign;

pub use error::{IdentityError, PaymentError};
pub use identity::{WalletIdentity, derive_identity};
pub use middleware::PaymentInterceptor;

use reqwest::{Client, ClientBuilder};
use reqwest_middleware as rqm;

/// Adds x402 payment handling to reqwest clients.
///
/// Implemented on [`Client`] and [`ClientBuilder`].
pub trait ReqwestWithPayments<A> {
    /// Attaches the payment interceptor.
    fn with_payments(self, interceptor: PaymentInterceptor) -> ReqwestWithPaymentsBuilder<A>;
}

impl ReqwestWithPayments<Self> for Client {
    fn with_payments(self, interceptor: PaymentInterceptor) -> ReqwestWithPaymentsBuilder<Self> {
        ReqwestWithPaymentsBuilder {
            inner: self,
            interceptor,
        }
    }
}

impl ReqwestWithPayments<Self> for ClientBuilder {
    fn with_payments(self, interceptor: PaymentInterceptor) -> ReqwestWithPaymentsBuilder<Self> {
        ReqwestWithPaymentsBuilder {
            inner: self,
            interceptor,
        }
    }
}

/// Builder for a reqwest client with the payment interceptor installed.
#[allow(missing_debug_implementations)] // ClientBuilder does not implement Debug
pub struct ReqwestWithPaymentsBuilder<A> {
    inner: A,
    interceptor: PaymentInterceptor,
}

/// Builds the final client from a [`ReqwestWithPaymentsBuilder`].
pub trait ReqwestWithPaymentsBuild {
    /// The type returned by [`build`](Self::build).
    type BuildResult;
    /// The type returned by [`builder`](Self::builder).
    type BuilderResult;

    /// Builds the client, consuming the builder.
    fn build(self) -> Self::BuildResult;

    /// Returns the middleware client builder with the interceptor added.
    fn builder(self) -> Self::BuilderResult;
}

impl ReqwestWithPaymentsBuild for ReqwestWithPaymentsBuilder<Client> {
    type BuildResult = rqm::ClientWithMiddleware;
    type BuilderResult = rqm::ClientBuilder;

    fn build(self) -> Self::BuildResult {
        self.builder().build()
    }

    fn builder(self) -> Self::BuilderResult {
        rqm::ClientBuilder::new(self.inner).with(self.interceptor)
    }
}

impl ReqwestWithPaymentsBuild for ReqwestWithPaymentsBuilder<ClientBuilder> {
    type BuildResult = Result<rqm::ClientWithMiddleware, reqwest::Error>;
    type BuilderResult = Result<rqm::ClientBuilder, reqwest::Error>;

    fn build(self) -> Self::BuildResult {
        let builder = self.builder()?;
        Ok(builder.build())
    }

    fn builder(self) -> Self::BuilderResult {
        let client = self.inner.build()?;
        Ok(rqm::ClientBuilder::new(client).with(self.interceptor))
    }
}
