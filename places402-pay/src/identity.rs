//! Wallet identity derived from a hex private key.

use std::fmt;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;

use crate::error::IdentityError;

/// A local EVM account able to sign x402 payment authorizations.
///
/// The key material never leaves this type; only the address is exposed.
#[derive(Clone)]
pub struct WalletIdentity {
    signer: PrivateKeySigner,
}

impl WalletIdentity {
    /// Returns the wallet address that payments are drawn from.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub(crate) const fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Derives a [`WalletIdentity`] from a hex-encoded secp256k1 private key.
///
/// The `0x` prefix is optional and surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`IdentityError::Empty`] for a blank credential and
/// [`IdentityError::InvalidKey`] when the value is not a 32-byte hex key.
pub fn derive_identity(credential: &str) -> Result<WalletIdentity, IdentityError> {
    let key = credential.trim();
    if key.is_empty() {
        return Err(IdentityError::Empty);
    }
    let signer = key
        .parse::<PrivateKeySigner>()
        .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
    Ok(WalletIdentity { signer })
}
