//! Startup decision between payment-enabled and demo execution.
//!
//! [`Capability::probe`] runs once per process. It returns the capability
//! together with the matching [`HttpBackend`], so the two can never disagree.

use std::fmt;

use places402_pay::derive_identity;

use crate::backend::{BackendError, HttpBackend};
use crate::config::Settings;

/// Marker found in unedited configuration templates, compared case-insensitively.
pub const CREDENTIAL_PLACEHOLDER: &str = "<private key";

/// Classification of the configured credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    /// Unset or blank.
    Absent,
    /// Still the template placeholder.
    Placeholder,
    /// Something that may be a key, trimmed.
    Present(&'a str),
}

/// Classifies a raw credential value without parsing it.
#[must_use]
pub fn inspect_credential(raw: Option<&str>) -> Credential<'_> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Credential::Absent;
    };
    if value.to_ascii_lowercase().contains(CREDENTIAL_PLACEHOLDER) {
        Credential::Placeholder
    } else {
        Credential::Present(value)
    }
}

/// Why payment is disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisabledReason {
    /// No credential configured.
    NoCredential,
    /// The credential is the template placeholder.
    Placeholder,
    /// The credential could not be turned into a wallet.
    InvalidCredential(String),
}

impl fmt::Display for DisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredential => f.write_str("no private key provided"),
            Self::Placeholder => f.write_str("private key is still a placeholder"),
            Self::InvalidCredential(e) => write!(f, "invalid private key: {e}"),
        }
    }
}

/// Payment capability of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMode {
    /// Searches are paid from this wallet.
    Enabled {
        /// Checksummed wallet address.
        address: String,
    },
    /// Searches return demo data.
    Disabled {
        /// Why payment is off.
        reason: DisabledReason,
    },
}

impl PaymentMode {
    /// Whether payment is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }
}

/// Immutable capability state, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    mode: PaymentMode,
}

impl Capability {
    /// Inspects the configured credential and builds the matching transport.
    ///
    /// No network call is made. Exactly one line is logged: the wallet
    /// address when payment is enabled, otherwise the reason for demo mode.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ClientBuild`] only if the HTTP client itself
    /// cannot be constructed.
    pub fn probe(settings: &Settings) -> Result<(Self, HttpBackend), BackendError> {
        let reason = match inspect_credential(settings.credential()) {
            Credential::Present(key) => match derive_identity(key) {
                Ok(identity) => {
                    let address = identity.address().to_string();
                    tracing::info!(%address, "x402 payment client initialized with wallet");
                    let backend = HttpBackend::paying(settings, identity)?;
                    return Ok((
                        Self {
                            mode: PaymentMode::Enabled { address },
                        },
                        backend,
                    ));
                }
                Err(e) => DisabledReason::InvalidCredential(e.to_string()),
            },
            Credential::Placeholder => DisabledReason::Placeholder,
            Credential::Absent => DisabledReason::NoCredential,
        };

        tracing::warn!(%reason, "Running in demo mode");
        let backend = HttpBackend::plain(settings)?;
        Ok((
            Self {
                mode: PaymentMode::Disabled { reason },
            },
            backend,
        ))
    }

    #[cfg(test)]
    pub(crate) const fn from_mode(mode: PaymentMode) -> Self {
        Self { mode }
    }

    /// The payment mode.
    #[must_use]
    pub const fn mode(&self) -> &PaymentMode {
        &self.mode
    }

    /// Whether searches are paid.
    #[must_use]
    pub const fn payment_enabled(&self) -> bool {
        self.mode.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn settings(credential: Option<&str>) -> Settings {
        Settings::new("http://127.0.0.1:9")
            .unwrap()
            .with_credential(credential.map(str::to_owned))
    }

    #[test]
    fn classifies_credentials() {
        assert_eq!(inspect_credential(None), Credential::Absent);
        assert_eq!(inspect_credential(Some("  \n")), Credential::Absent);
        assert_eq!(
            inspect_credential(Some("<private key with USDC on Base>")),
            Credential::Placeholder
        );
        assert_eq!(
            inspect_credential(Some("<PRIVATE KEY>")),
            Credential::Placeholder
        );
        assert_eq!(
            inspect_credential(Some(" 0xabc ")),
            Credential::Present("0xabc")
        );
    }

    #[test]
    fn absent_and_placeholder_disable_payment() {
        let (capability, backend) = Capability::probe(&settings(None)).unwrap();
        assert_eq!(
            capability.mode(),
            &PaymentMode::Disabled {
                reason: DisabledReason::NoCredential
            }
        );
        assert!(!backend.is_paying());

        let (capability, backend) =
            Capability::probe(&settings(Some("<private key here>"))).unwrap();
        assert!(!capability.payment_enabled());
        assert!(!backend.is_paying());
    }

    #[test]
    fn invalid_key_falls_back_to_demo() {
        let (capability, backend) = Capability::probe(&settings(Some("0xnothex"))).unwrap();
        assert!(matches!(
            capability.mode(),
            PaymentMode::Disabled {
                reason: DisabledReason::InvalidCredential(_)
            }
        ));
        assert!(!backend.is_paying());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn probe_logs(credential: Option<&str>) -> Vec<String> {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            Capability::probe(&settings(credential)).unwrap();
        });
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        output
            .lines()
            .filter(|line| line.contains("places402_mcp::capability"))
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn invalid_key_logs_one_startup_line() {
        let lines = probe_logs(Some("0xnothex"));
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("WARN"));
        assert!(lines[0].contains("invalid private key"));
        assert!(lines[0].contains("Running in demo mode"));
    }

    #[test]
    fn valid_key_logs_one_startup_line() {
        let lines = probe_logs(Some(DEV_KEY));
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
    }

    #[test]
    fn valid_key_enables_payment() {
        let (capability, backend) = Capability::probe(&settings(Some(DEV_KEY))).unwrap();
        assert_eq!(
            capability.mode(),
            &PaymentMode::Enabled {
                address: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_owned()
            }
        );
        assert!(backend.is_paying());
    }
}
