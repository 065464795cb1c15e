//! Reqwest middleware that answers `402 Payment Required` responses.
//!
//! [`PaymentInterceptor`] lets the request through untouched; when the server
//! answers 402 it parses the payment requirements, signs an "exact" EVM
//! payment with the configured wallet and replays the request once with the
//! payment header attached.

use std::sync::Arc;

use http::{Extensions, HeaderMap, HeaderName, HeaderValue, StatusCode};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace, warn};

use crate::error::PaymentError;
use crate::identity::WalletIdentity;
use crate::networks::chain_id_for;
use crate::proto::{
    self, EXACT_SCHEME, Offer, PAYMENT_HEADER_V1, PAYMENT_REQUIRED_HEADER,
    PAYMENT_RESPONSE_HEADER, PAYMENT_RESPONSE_HEADER_V1, PAYMENT_SIGNATURE_HEADER,
    PaymentRequired, SettleResponse,
};
use crate::sign::{AuthorizationParams, sign_transfer_authorization};

/// Middleware that pays for 402 responses with a local wallet.
#[derive(Debug, Clone)]
pub struct PaymentInterceptor {
    identity: Arc<WalletIdentity>,
}

impl PaymentInterceptor {
    /// Creates an interceptor that pays from `identity`.
    #[must_use]
    pub fn new(identity: WalletIdentity) -> Self {
        Self {
            identity: Arc::new(identity),
        }
    }

    /// Returns the paying wallet.
    #[must_use]
    pub fn identity(&self) -> &WalletIdentity {
        &self.identity
    }

    /// Builds the payment headers answering a 402 response.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidPaymentRequired`] if the response carries
    /// no requirements, [`PaymentError::NoMatchingPaymentOption`] if no offer is
    /// payable, and signing/encoding errors from the selected offer.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "places402.pay.payment_headers", skip_all, err)
    )]
    pub async fn payment_headers(&self, res: Response) -> Result<HeaderMap, PaymentError> {
        let payment_required = parse_payment_required(res).await?;
        let offer = select_offer(&payment_required).ok_or(PaymentError::NoMatchingPaymentOption)?;

        #[cfg(feature = "telemetry")]
        debug!(
            network = offer.network,
            amount = offer.amount,
            pay_to = offer.pay_to,
            "Selected payment option"
        );

        let params = AuthorizationParams::from_offer(&offer)?;
        let evm_payload = sign_transfer_authorization(&self.identity, &params).await?;

        let (name, value) = match &payment_required {
            PaymentRequired::V1(_) => {
                let payload = proto::v1::PaymentPayload {
                    x402_version: 1,
                    scheme: EXACT_SCHEME.to_owned(),
                    network: offer.network.to_owned(),
                    payload: evm_payload,
                };
                (
                    HeaderName::from_static(PAYMENT_HEADER_V1),
                    proto::encode_header(&payload)?,
                )
            }
            PaymentRequired::V2(required) => {
                let accepted = required
                    .accepts
                    .iter()
                    .find(|r| r.network == offer.network && r.pay_to == offer.pay_to)
                    .cloned()
                    .ok_or(PaymentError::NoMatchingPaymentOption)?;
                let payload = proto::v2::PaymentPayload {
                    x402_version: 2,
                    payload: evm_payload,
                    accepted,
                    resource: required.resource.clone(),
                };
                (
                    HeaderName::from_static(PAYMENT_SIGNATURE_HEADER),
                    proto::encode_header(&payload)?,
                )
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            name,
            HeaderValue::from_str(&value).map_err(|e| PaymentError::Encoding(e.to_string()))?,
        );
        Ok(headers)
    }
}

/// Picks the first "exact" offer on a known EVM network.
fn select_offer(payment_required: &PaymentRequired) -> Option<Offer<'_>> {
    payment_required
        .offers()
        .into_iter()
        .find(|o| o.scheme == EXACT_SCHEME && chain_id_for(o.network).is_some())
}

/// Parses payment requirements from a 402 response.
///
/// The V2 `Payment-Required` header wins over the body; otherwise the body is
/// read as a V1 (or V2) JSON document.
///
/// # Errors
///
/// Returns [`PaymentError::InvalidPaymentRequired`] if neither source decodes.
pub async fn parse_payment_required(res: Response) -> Result<PaymentRequired, PaymentError> {
    if let Some(required) = res
        .headers()
        .get(PAYMENT_REQUIRED_HEADER)
        .and_then(|h| proto::decode_header::<proto::v2::PaymentRequired>(h.as_bytes()))
    {
        #[cfg(feature = "telemetry")]
        debug!("Parsed V2 payment required from header");
        return Ok(PaymentRequired::V2(required));
    }

    let body = res
        .bytes()
        .await
        .map_err(|e| PaymentError::InvalidPaymentRequired(e.to_string()))?;
    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| PaymentError::InvalidPaymentRequired(e.to_string()))?;
    let version = value
        .get("x402Version")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(1);
    let required = if version >= 2 {
        serde_json::from_value(value).map(PaymentRequired::V2)
    } else {
        serde_json::from_value(value).map(PaymentRequired::V1)
    };
    required.map_err(|e| PaymentError::InvalidPaymentRequired(e.to_string()))
}

/// Decodes the settlement receipt attached to a paid response, if any.
#[must_use]
pub fn settlement_receipt(res: &Response) -> Option<SettleResponse> {
    let headers = res.headers();
    headers
        .get(PAYMENT_RESPONSE_HEADER)
        .or_else(|| headers.get(PAYMENT_RESPONSE_HEADER_V1))
        .and_then(|h| proto::decode_header(h.as_bytes()))
}

#[cfg(feature = "telemetry")]
fn log_receipt(res: &Response) {
    match settlement_receipt(res) {
        Some(receipt) if receipt.success => info!(
            transaction = receipt.transaction.as_deref().unwrap_or("-"),
            network = receipt.network.as_deref().unwrap_or("-"),
            "Payment settled"
        ),
        Some(receipt) => warn!(
            reason = receipt.error_reason.as_deref().unwrap_or("-"),
            "Payment settlement failed"
        ),
        None => debug!(status = ?res.status(), "Paid request completed without receipt"),
    }
}

#[cfg(not(feature = "telemetry"))]
const fn log_receipt(_res: &Response) {}

#[cfg_attr(feature = "telemetry", instrument(name = "places402.pay.next", skip_all))]
async fn run_next(
    next: rqm::Next<'_>,
    req: Request,
    extensions: &mut Extensions,
) -> rqm::Result<Response> {
    next.run(req, extensions).await
}

#[async_trait::async_trait]
impl rqm::Middleware for PaymentInterceptor {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "places402.pay.handle", skip_all, err)
    )]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let retry_req = req.try_clone();
        let res = run_next(next.clone(), req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            #[cfg(feature = "telemetry")]
            trace!(status = ?res.status(), "No payment required");
            return Ok(res);
        }

        #[cfg(feature = "telemetry")]
        info!(url = %res.url(), "Received 402 Payment Required, paying");

        let headers = self
            .payment_headers(res)
            .await
            .map_err(rqm::Error::middleware)?;

        let mut retry = retry_req
            .ok_or_else(|| rqm::Error::middleware(PaymentError::RequestNotCloneable))?;
        retry.headers_mut().extend(headers);

        let res = run_next(next, retry, extensions).await?;

        log_receipt(&res);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::derive_identity;
    use crate::{ReqwestWithPayments, ReqwestWithPaymentsBuild};
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn v1_requirements() -> serde_json::Value {
        json!({
            "x402Version": 1,
            "error": "X-PAYMENT header is required",
            "accepts": [
                {
                    "scheme": "exact",
                    "network": "solana",
                    "maxAmountRequired": "10000",
                    "payTo": "2wKupLR9q6wXYppw8Gr2NvWxKBUqm4PPJKkQfoxHDBg4",
                    "maxTimeoutSeconds": 60,
                    "asset": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
                },
                {
                    "scheme": "exact",
                    "network": "base",
                    "maxAmountRequired": "10000",
                    "resource": "https://places.example/api/places/text-search",
                    "description": "Places search",
                    "mimeType": "application/json",
                    "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                    "maxTimeoutSeconds": 60,
                    "asset": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
                    "extra": { "name": "USD Coin", "version": "2" }
                }
            ]
        })
    }

    fn interceptor() -> PaymentInterceptor {
        PaymentInterceptor::new(derive_identity(DEV_KEY).unwrap())
    }

    #[tokio::test]
    async fn pays_v1_requirements_and_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header_exists("x-payment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(402).set_body_json(v1_requirements()))
            .expect(1)
            .mount(&server)
            .await;

        let interceptor = interceptor();
        let expected_from = interceptor.identity().address().to_string();
        let client = reqwest::Client::new().with_payments(interceptor).build();
        let res = client
            .post(format!("{}/search", server.uri()))
            .json(&json!({"query": "pizza"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let requests = server.received_requests().await.unwrap();
        let paid = requests
            .iter()
            .find(|r| r.headers.contains_key("x-payment"))
            .unwrap();
        let payload: proto::v1::PaymentPayload =
            proto::decode_header(paid.headers["x-payment"].as_bytes()).unwrap();
        assert_eq!(payload.x402_version, 1);
        assert_eq!(payload.network, "base");
        assert_eq!(payload.payload.authorization.from, expected_from);
        assert_eq!(payload.payload.authorization.value, "10000");
        assert_eq!(
            payload.payload.authorization.to,
            "0x209693Bc6afc0C5328bA36FaF03C514EF312287C"
        );
    }

    #[tokio::test]
    async fn paid_response_carries_settlement_receipt() {
        let server = MockServer::start().await;
        let receipt = proto::encode_header(&json!({
            "success": true,
            "transaction": "0x5f1c",
            "network": "base"
        }))
        .unwrap();
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header_exists("x-payment"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-PAYMENT-RESPONSE", receipt.as_str())
                    .set_body_json(json!({"results": []})),
            )
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(402).set_body_json(v1_requirements()))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new().with_payments(interceptor()).build();
        let res = client
            .post(format!("{}/search", server.uri()))
            .json(&json!({"query": "pizza"}))
            .send()
            .await
            .unwrap();

        let receipt = settlement_receipt(&res).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.transaction.as_deref(), Some("0x5f1c"));
        assert_eq!(receipt.network.as_deref(), Some("base"));
    }

    #[tokio::test]
    async fn v2_receipt_header_wins_over_v1() {
        let server = MockServer::start().await;
        let v1 = proto::encode_header(&json!({
            "success": true,
            "transaction": "0xaaaa",
            "network": "base"
        }))
        .unwrap();
        let v2 = proto::encode_header(&json!({
            "success": false,
            "errorReason": "insufficient_funds",
            "network": "eip155:8453"
        }))
        .unwrap();
        Mock::given(method("GET"))
            .and(path("/receipt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-PAYMENT-RESPONSE", v1.as_str())
                    .insert_header("Payment-Response", v2.as_str()),
            )
            .mount(&server)
            .await;

        let res = reqwest::get(format!("{}/receipt", server.uri()))
            .await
            .unwrap();
        let receipt = settlement_receipt(&res).unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.error_reason.as_deref(), Some("insufficient_funds"));
        assert_eq!(receipt.network.as_deref(), Some("eip155:8453"));
        assert!(receipt.transaction.is_none());
    }

    #[tokio::test]
    async fn missing_receipt_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let res = reqwest::get(server.uri()).await.unwrap();
        assert!(settlement_receipt(&res).is_none());
    }

    #[tokio::test]
    async fn pays_v2_header_requirements() {
        let server = MockServer::start().await;
        let required = proto::encode_header(&json!({
            "x402Version": 2,
            "resource": { "url": "https://places.example/search" },
            "accepts": [{
                "scheme": "exact",
                "network": "eip155:84532",
                "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
                "amount": "1000",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "maxTimeoutSeconds": 300,
                "extra": { "name": "USDC", "version": "2" }
            }]
        }))
        .unwrap();
        Mock::given(method("GET"))
            .and(path("/paid"))
            .and(header_exists("payment-signature"))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/paid"))
            .respond_with(
                ResponseTemplate::new(402).insert_header("Payment-Required", required.as_str()),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new().with_payments(interceptor()).build();
        let res = client
            .get(format!("{}/paid", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let requests = server.received_requests().await.unwrap();
        let paid = requests
            .iter()
            .find(|r| r.headers.contains_key("payment-signature"))
            .unwrap();
        let payload: proto::v2::PaymentPayload =
            proto::decode_header(paid.headers["payment-signature"].as_bytes()).unwrap();
        assert_eq!(payload.x402_version, 2);
        assert_eq!(payload.accepted.amount, "1000");
        assert_eq!(
            payload.resource.map(|r| r.url).as_deref(),
            Some("https://places.example/search")
        );
    }

    #[tokio::test]
    async fn second_402_is_returned_as_is() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/paid"))
            .respond_with(ResponseTemplate::new(402).set_body_json(v1_requirements()))
            .expect(2)
            .mount(&server)
            .await;

        let client = reqwest::Client::new().with_payments(interceptor()).build();
        let res = client
            .get(format!("{}/paid", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn unparseable_402_is_a_middleware_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/paid"))
            .respond_with(ResponseTemplate::new(402).set_body_string("Payment Required"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new().with_payments(interceptor()).build();
        let err = client
            .get(format!("{}/paid", server.uri()))
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, rqm::Error::Middleware(_)));
        assert!(err.to_string().contains("Invalid 402 response"));
    }

    #[tokio::test]
    async fn non_evm_only_offers_do_not_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/paid"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "x402Version": 1,
                "accepts": [{
                    "scheme": "exact",
                    "network": "solana",
                    "maxAmountRequired": "10000",
                    "payTo": "2wKupLR9q6wXYppw8Gr2NvWxKBUqm4PPJKkQfoxHDBg4",
                    "maxTimeoutSeconds": 60,
                    "asset": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
                }]
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new().with_payments(interceptor()).build();
        let err = client
            .get(format!("{}/paid", server.uri()))
            .send()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No matching payment option"));
    }

    #[tokio::test]
    async fn passes_through_non_402_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new().with_payments(interceptor()).build();
        let res = client
            .get(format!("{}/health", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("x-payment"));
    }
}
