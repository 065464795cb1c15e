//! Request and response bodies exchanged with the Places API.
//!
//! Upstream payloads are partial: every field is optional and a field of the
//! wrong type decodes as absent instead of failing the whole document.
//! Placeholders for absent fields are chosen by [`crate::format`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DefaultOnError, serde_as};

/// Body of the paid search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query, trimmed.
    pub query: String,
    /// Location bias in `lat,lng` form, trimmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Search radius in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// Response of the search endpoint.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// Matching places, best first.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub results: Vec<Place>,
    /// Payment details echoed by the server.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub metadata: Option<PaymentMetadata>,
}

/// One search result.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Place {
    /// Display name.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub name: Option<String>,
    /// Postal address.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub formatted_address: Option<String>,
    /// Average rating out of five.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub rating: Option<f64>,
    /// Price level from 0 (free) to 4 (very expensive).
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub price_level: Option<u8>,
    /// Place categories.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub types: Option<Vec<String>>,
    /// Local phone number.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    /// e.g. `OPERATIONAL`.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub business_status: Option<String>,
    /// Current opening state.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
}

/// Opening hours of a [`Place`].
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct OpeningHours {
    /// Whether the place is open right now.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub open_now: Option<bool>,
}

/// Payment details attached to a paid search response.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentMetadata {
    /// Amount charged, e.g. `$0.01`.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub cost: Option<String>,
    /// Payment protocol label.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub protocol: Option<String>,
    /// How the payment was made.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Settlement network.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub network: Option<String>,
}

/// The `/.well-known/x402` service description.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceInfo {
    /// Service name.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub service: Option<String>,
    /// Human-readable summary.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub description: Option<String>,
    /// Service version.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub version: Option<String>,
    /// Free-form compliance marker; servers send a string or a boolean.
    #[serde(default)]
    pub x402_compliance: Option<Value>,
    /// Payment terms.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub payment: Option<PaymentTerms>,
    /// Published endpoints.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub endpoints: Option<Vec<Endpoint>>,
}

/// Payment terms advertised by the service.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentTerms {
    /// Payment protocol label.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub protocol: Option<String>,
    /// Price per paid request.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub price: Option<String>,
    /// Settlement network.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub network: Option<String>,
    /// Whether the facilitator pays gas.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub gasless: Option<bool>,
}

/// One endpoint listed in [`ServiceInfo`].
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    /// Request path.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub path: Option<String>,
    /// HTTP method.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub method: Option<String>,
    /// What the endpoint does.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub description: Option<String>,
    /// Whether calls must be paid.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub payment_required: Option<bool>,
}

/// The `/health` report.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HealthStatus {
    /// Overall status, `healthy` when fine.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub status: Option<String>,
    /// Service name.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub service: Option<String>,
    /// Service version.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub version: Option<String>,
    /// Deployment environment.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub deployment: Option<String>,
    /// Seconds since the service started.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub uptime: Option<f64>,
    /// Payment subsystem state.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub payment: Option<HealthPayment>,
    /// Feature flags; values are usually booleans.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub features: Option<Map<String, Value>>,
}

/// Payment section of [`HealthStatus`].
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HealthPayment {
    /// Payment protocol label.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub protocol: Option<String>,
    /// Settlement network.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub network: Option<String>,
    /// Facilitator URL.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub facilitator: Option<String>,
    /// Whether the facilitator pays gas.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub gasless: Option<bool>,
}
