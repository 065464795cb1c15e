//! Outcome and envelope types shared by the dispatcher and the formatter.

use serde::{Deserialize, Serialize};

use crate::payload::{HealthStatus, SearchRequest, SearchResponse, ServiceInfo};
use crate::tools::ToolName;

/// A single content item in a tool response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[non_exhaustive]
pub enum ContentItem {
    /// Text content.
    Text {
        /// The text value.
        text: String,
    },
}

impl ContentItem {
    /// Creates a new text content item.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Returns the text content if this is a text item.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
        }
    }
}

/// The single unit returned to the host for one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Exactly one text item.
    pub content: Vec<ContentItem>,
    /// Set only for the generic error template.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ResponseEnvelope {
    /// Wraps rendered text in an envelope.
    #[must_use]
    pub fn text(text: String, is_error: bool) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
            is_error,
        }
    }

    /// Concatenated text of every item.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentItem::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Successfully decoded backend payloads.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A paid search.
    Search {
        /// The request that was sent.
        request: SearchRequest,
        /// What the backend returned.
        response: SearchResponse,
    },
    /// The service description document.
    ServiceInfo(ServiceInfo),
    /// The health report.
    Health(HealthStatus),
}

/// Context for the payment-required guidance template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentRequiredContext {
    /// The tool whose request was refused.
    pub tool: ToolName,
}

/// Result of one tool invocation, before rendering.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The backend answered.
    Success(Payload),
    /// Payment is disabled; canned results stand in for a search.
    Demo(SearchRequest),
    /// The search was called without a usable query.
    MissingQuery,
    /// The backend demanded payment and this process cannot pay.
    PaymentRequired(PaymentRequiredContext),
    /// Any other failure.
    Error {
        /// Stable kind label, e.g. `Timeout`.
        kind: &'static str,
        /// Human-readable message.
        message: String,
    },
}

impl Outcome {
    /// Short label used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Demo(_) => "demo",
            Self::MissingQuery => "missing_query",
            Self::PaymentRequired(_) => "payment_required",
            Self::Error { .. } => "error",
        }
    }
}
