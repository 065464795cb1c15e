//! EIP-712 signing of ERC-3009 `transferWithAuthorization` payments.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, FixedBytes, U256, hex};
use alloy_signer::Signer;
use alloy_sol_types::{SolStruct, eip712_domain, sol};
use rand::{RngExt, rng};

use crate::error::PaymentError;
use crate::identity::WalletIdentity;
use crate::networks::{DEFAULT_USDC_NAME, DEFAULT_USDC_VERSION, chain_id_for};
use crate::proto::{Authorization, ExactEvmPayload, Offer, TokenDomain};

sol!(
    /// ERC-3009 authorization as laid out in the EIP-712 typed data.
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

/// How far in the past `validAfter` is placed, to absorb clock skew.
const VALID_AFTER_SKEW_SECS: u64 = 10 * 60;

/// Concrete signing parameters resolved from an [`Offer`].
#[derive(Debug, Clone)]
pub struct AuthorizationParams {
    /// EIP-155 chain ID.
    pub chain_id: u64,
    /// Token contract (EIP-712 verifying contract).
    pub asset: Address,
    /// Recipient.
    pub pay_to: Address,
    /// Amount in the token's smallest unit.
    pub amount: U256,
    /// Authorization validity window, in seconds.
    pub max_timeout_seconds: u64,
    /// EIP-712 token domain.
    pub domain: TokenDomain,
}

impl AuthorizationParams {
    /// Resolves an advertised offer into signing parameters.
    ///
    /// A missing token domain falls back to the USDC defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidRequirement`] if the network is not a
    /// known EVM network or an address/amount does not parse.
    pub fn from_offer(offer: &Offer<'_>) -> Result<Self, PaymentError> {
        let chain_id = chain_id_for(offer.network).ok_or_else(|| {
            PaymentError::InvalidRequirement(format!("unsupported network {}", offer.network))
        })?;
        let asset = offer
            .asset
            .parse::<Address>()
            .map_err(|e| PaymentError::InvalidRequirement(format!("asset: {e}")))?;
        let pay_to = offer
            .pay_to
            .parse::<Address>()
            .map_err(|e| PaymentError::InvalidRequirement(format!("payTo: {e}")))?;
        let amount = offer
            .amount
            .parse::<U256>()
            .map_err(|e| PaymentError::InvalidRequirement(format!("amount: {e}")))?;
        let domain = offer.token_domain().unwrap_or_else(|| TokenDomain {
            name: DEFAULT_USDC_NAME.to_owned(),
            version: DEFAULT_USDC_VERSION.to_owned(),
        });
        Ok(Self {
            chain_id,
            asset,
            pay_to,
            amount,
            max_timeout_seconds: offer.max_timeout_seconds,
            domain,
        })
    }
}

/// Signs an ERC-3009 `TransferWithAuthorization` for the given parameters.
///
/// `validAfter` is set ten minutes in the past so the authorization is usable
/// immediately; `validBefore` is now plus the advertised timeout.
///
/// # Errors
///
/// Returns [`PaymentError::Signing`] if the signer fails.
pub async fn sign_transfer_authorization(
    identity: &WalletIdentity,
    params: &AuthorizationParams,
) -> Result<ExactEvmPayload, PaymentError> {
    let domain = eip712_domain! {
        name: params.domain.name.clone(),
        version: params.domain.version.clone(),
        chain_id: params.chain_id,
        verifying_contract: params.asset,
    };

    let now = unix_now();
    let valid_after = now.saturating_sub(VALID_AFTER_SKEW_SECS);
    let valid_before = now.saturating_add(params.max_timeout_seconds);
    let nonce: [u8; 32] = rng().random();
    let nonce = FixedBytes(nonce);
    let from = identity.address();

    // Field values here must match the wire authorization exactly; the
    // facilitator rebuilds this struct from it to recover the signer.
    let message = TransferWithAuthorization {
        from,
        to: params.pay_to,
        value: params.amount,
        validAfter: U256::from(valid_after),
        validBefore: U256::from(valid_before),
        nonce,
    };

    let hash = message.eip712_signing_hash(&domain);
    let signature = identity
        .signer()
        .sign_hash(&hash)
        .await
        .map_err(|e| PaymentError::Signing(e.to_string()))?;

    Ok(ExactEvmPayload {
        signature: hex::encode_prefixed(signature.as_bytes()),
        authorization: Authorization {
            from: from.to_string(),
            to: params.pay_to.to_string(),
            value: params.amount.to_string(),
            valid_after: valid_after.to_string(),
            valid_before: valid_before.to_string(),
            nonce: nonce.to_string(),
        },
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
