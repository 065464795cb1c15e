//! Maps backend failures to outcomes.

use crate::backend::BackendError;
use crate::capability::PaymentMode;
use crate::tools::ToolName;
use crate::types::{Outcome, PaymentRequiredContext};

/// Classifies a failed backend call for `tool`.
///
/// A `402` becomes payment guidance only when this process cannot pay. With
/// payment enabled the interceptor should already have paid, so a `402` that
/// still reaches here is reported as a generic error.
#[must_use]
pub fn classify(error: BackendError, mode: &PaymentMode, tool: ToolName) -> Outcome {
    match error {
        BackendError::PaymentRequired if !mode.is_enabled() => {
            Outcome::PaymentRequired(PaymentRequiredContext { tool })
        }
        other => Outcome::Error {
            kind: other.kind(),
            message: other.to_string(),
        },
    }
}
