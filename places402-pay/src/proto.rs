//! x402 wire types consumed and produced by the payment interceptor.
//!
//! Only the subset needed by a paying client is modelled: the 402 payment
//! requirements (V1 JSON body, V2 `Payment-Required` header), the signed
//! "exact" EVM payload, and the settlement receipt.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Header names are lowercase so they can be used with `HeaderName::from_static`.

/// Header carrying a V1 signed payment (client → server).
pub const PAYMENT_HEADER_V1: &str = "x-payment";

/// Header carrying a V2 signed payment (client → server).
pub const PAYMENT_SIGNATURE_HEADER: &str = "payment-signature";

/// Header carrying base64 V2 payment requirements (server → client).
pub const PAYMENT_REQUIRED_HEADER: &str = "payment-required";

/// Header carrying a V1 settlement receipt (server → client).
pub const PAYMENT_RESPONSE_HEADER_V1: &str = "x-payment-response";

/// Header carrying a V2 settlement receipt (server → client).
pub const PAYMENT_RESPONSE_HEADER: &str = "payment-response";

/// The only payment scheme this client can pay.
pub const EXACT_SCHEME: &str = "exact";

/// Encodes a value as base64 JSON, the x402 header encoding.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn encode_header<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    Ok(b64.encode(json))
}

/// Decodes a base64 JSON header value. Returns `None` on any decoding failure.
#[must_use]
pub fn decode_header<T: DeserializeOwned>(raw: &[u8]) -> Option<T> {
    let bytes = b64.decode(raw).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// EIP-712 domain of the token contract, carried in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDomain {
    /// Token name as used in the EIP-712 domain.
    pub name: String,
    /// Token version as used in the EIP-712 domain.
    pub version: String,
}

/// V1 wire types (JSON body of the 402 response, `X-PAYMENT` header).
pub mod v1 {
    use super::{ExactEvmPayload, Deserialize, Serialize, Value};

    /// Payment requirements advertised in a V1 402 body.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentRequirements {
        /// Payment scheme, e.g. `"exact"`.
        pub scheme: String,
        /// V1 network name, e.g. `"base"`.
        pub network: String,
        /// Amount in the token's smallest unit, as a decimal string.
        pub max_amount_required: String,
        /// The resource being paid for.
        #[serde(default)]
        pub resource: String,
        /// Human-readable description of the resource.
        #[serde(default)]
        pub description: String,
        /// MIME type of the resource.
        #[serde(default)]
        pub mime_type: String,
        /// Recipient address.
        pub pay_to: String,
        /// Authorization validity window, in seconds.
        pub max_timeout_seconds: u64,
        /// Token contract address.
        pub asset: String,
        /// Scheme-specific extra data (EIP-712 token domain for "exact").
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub extra: Option<Value>,
    }

    /// Body of a V1 402 response.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentRequired {
        /// Protocol version, always `1`.
        pub x402_version: u8,
        /// Acceptable payment options.
        #[serde(default)]
        pub accepts: Vec<PaymentRequirements>,
        /// Server-provided reason.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub error: Option<String>,
    }

    /// Signed V1 payment sent in the `X-PAYMENT` header.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentPayload {
        /// Protocol version, always `1`.
        pub x402_version: u8,
        /// Payment scheme.
        pub scheme: String,
        /// V1 network name.
        pub network: String,
        /// The signed authorization.
        pub payload: ExactEvmPayload,
    }
}

/// V2 wire types (`Payment-Required` / `Payment-Signature` headers).
pub mod v2 {
    use super::{ExactEvmPayload, Deserialize, Serialize, Value};

    /// Description of the paid resource.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResourceInfo {
        /// Resource URL.
        pub url: String,
        /// Human-readable description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        /// MIME type.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub mime_type: Option<String>,
    }

    /// Payment requirements advertised in a V2 header.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentRequirements {
        /// Payment scheme, e.g. `"exact"`.
        pub scheme: String,
        /// CAIP-2 network identifier, e.g. `"eip155:8453"`.
        pub network: String,
        /// Token contract address.
        pub asset: String,
        /// Amount in the token's smallest unit, as a decimal string.
        pub amount: String,
        /// Recipient address.
        pub pay_to: String,
        /// Authorization validity window, in seconds.
        pub max_timeout_seconds: u64,
        /// Scheme-specific extra data.
        #[serde(default)]
        pub extra: Value,
    }

    /// Decoded `Payment-Required` header.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentRequired {
        /// Protocol version, always `2`.
        pub x402_version: u8,
        /// Server-provided reason.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub error: Option<String>,
        /// The paid resource.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub resource: Option<ResourceInfo>,
        /// Acceptable payment options.
        #[serde(default)]
        pub accepts: Vec<PaymentRequirements>,
    }

    /// Signed V2 payment sent in the `Payment-Signature` header.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PaymentPayload {
        /// Protocol version, always `2`.
        pub x402_version: u8,
        /// The signed authorization.
        pub payload: ExactEvmPayload,
        /// The requirements this payment satisfies.
        pub accepted: PaymentRequirements,
        /// The paid resource, echoed from the 402 response.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub resource: Option<ResourceInfo>,
    }
}

/// Payment requirements parsed from a 402 response, in either protocol version.
#[derive(Debug, Clone)]
pub enum PaymentRequired {
    /// Requirements from a V1 JSON body.
    V1(v1::PaymentRequired),
    /// Requirements from a V2 `Payment-Required` header.
    V2(v2::PaymentRequired),
}

impl PaymentRequired {
    /// Returns the payment options in advertised order, flattened across versions.
    #[must_use]
    pub fn offers(&self) -> Vec<Offer<'_>> {
        match self {
            Self::V1(required) => required
                .accepts
                .iter()
                .map(|r| Offer {
                    scheme: &r.scheme,
                    network: &r.network,
                    amount: &r.max_amount_required,
                    pay_to: &r.pay_to,
                    asset: &r.asset,
                    max_timeout_seconds: r.max_timeout_seconds,
                    extra: r.extra.as_ref(),
                })
                .collect(),
            Self::V2(required) => required
                .accepts
                .iter()
                .map(|r| Offer {
                    scheme: &r.scheme,
                    network: &r.network,
                    amount: &r.amount,
                    pay_to: &r.pay_to,
                    asset: &r.asset,
                    max_timeout_seconds: r.max_timeout_seconds,
                    extra: Some(&r.extra),
                })
                .collect(),
        }
    }

    /// Returns the server-provided reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::V1(required) => required.error.as_deref(),
            Self::V2(required) => required.error.as_deref(),
        }
    }
}

/// A version-independent view of one acceptable payment option.
#[derive(Debug, Clone, Copy)]
pub struct Offer<'a> {
    /// Payment scheme.
    pub scheme: &'a str,
    /// Network identifier (V1 name or CAIP-2).
    pub network: &'a str,
    /// Amount in the token's smallest unit.
    pub amount: &'a str,
    /// Recipient address.
    pub pay_to: &'a str,
    /// Token contract address.
    pub asset: &'a str,
    /// Authorization validity window, in seconds.
    pub max_timeout_seconds: u64,
    /// Scheme-specific extra data.
    pub extra: Option<&'a Value>,
}

impl Offer<'_> {
    /// Returns the EIP-712 token domain from `extra`, if present and well formed.
    #[must_use]
    pub fn token_domain(&self) -> Option<TokenDomain> {
        self.extra
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// ERC-3009 `transferWithAuthorization` parameters, as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    /// Payer address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Amount in the token's smallest unit.
    pub value: String,
    /// Unix timestamp after which the authorization is valid.
    pub valid_after: String,
    /// Unix timestamp before which the authorization is valid.
    pub valid_before: String,
    /// Unique 32-byte nonce, hex encoded.
    pub nonce: String,
}

/// Signed "exact" EVM payload: an authorization plus its EIP-712 signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactEvmPayload {
    /// 65-byte signature, hex encoded.
    pub signature: String,
    /// The signed authorization.
    pub authorization: Authorization,
}

/// Settlement receipt returned by a paid endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    /// Whether settlement succeeded.
    #[serde(default)]
    pub success: bool,
    /// Settlement transaction hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    /// Network the payment settled on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Payer address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Failure reason, when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}
