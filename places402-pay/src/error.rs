//! Error types for wallet identity derivation and x402 payment creation.

/// Errors raised while turning a credential into a signing identity.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum IdentityError {
    /// The credential was empty after trimming.
    #[error("Private key is empty")]
    Empty,

    /// The credential is not a valid secp256k1 private key.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),
}

/// Errors raised by the payment interceptor while answering a 402 response.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PaymentError {
    /// The 402 response carried no decodable payment requirements.
    #[error("Invalid 402 response: {0}")]
    InvalidPaymentRequired(String),

    /// None of the advertised payment options can be paid by this wallet.
    #[error("No matching payment option found")]
    NoMatchingPaymentOption,

    /// A selected payment option has a malformed field.
    #[error("Invalid payment requirement: {0}")]
    InvalidRequirement(String),

    /// EIP-712 signing failed.
    #[error("Failed to sign payment: {0}")]
    Signing(String),

    /// The signed payload could not be encoded into a header.
    #[error("Failed to encode payment header: {0}")]
    Encoding(String),

    /// The original request has a streaming body and cannot be replayed.
    #[error("Request object is not cloneable. Are you passing a streaming body?")]
    RequestNotCloneable,
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
