//! Rendering of outcomes into response envelopes.
//!
//! Rendering is pure and infallible. Absent upstream fields are replaced by
//! fixed placeholders here and nowhere else.

use serde_json::Value;

use crate::capability::Capability;
use crate::config::{HEALTH_PATH, Settings};
use crate::demo::{DEMO_LOCATION, demo_places};
use crate::payload::{Endpoint, HealthStatus, Place, SearchRequest, SearchResponse, ServiceInfo};
use crate::types::{Outcome, Payload, PaymentRequiredContext, ResponseEnvelope};

/// At most this many places are listed.
pub const MAX_LISTED_PLACES: usize = 8;

const MAX_LISTED_TYPES: usize = 3;

const DEFAULT_COST: &str = "$0.01";
const DEFAULT_PROTOCOL: &str = "x402 v1.0";
const DEFAULT_PAYMENT_METHOD: &str = "gasless_micropayment";
const DEFAULT_NETWORK: &str = "base";
const NOT_AVAILABLE: &str = "Not available";

/// Guidance returned when `search_places` is called without a query.
pub const MISSING_QUERY_TEXT: &str = r#"# ❌ Missing Search Query

**Error**: No search query provided.

**What happened**: The search tool was called without a query parameter.

**How to fix**:
1. Make sure to include what you're searching for in your request
2. Try asking something like: "Find coffee shops in downtown Portland"
3. Be specific about what type of places you want to find

**Example queries**:
- "Find restaurants near me"
- "Search for gas stations in San Francisco"
- "Look for hotels in downtown Seattle"

Please try again with a specific search query."#;

const ENABLEMENT_STEPS: &str = r#"1. **Add your private key** to your MCP host configuration (e.g. Claude Desktop):
   ```json
   {
     "mcpServers": {
       "places-x402": {
         "env": {
           "PRIVATE_KEY": "0xYourWalletPrivateKeyWithUSDC"
         }
       }
     }
   }
   ```

2. **Ensure you have USDC** on Base network
3. **Restart your MCP host** to enable payments"#;

/// Per-process values the templates refer to.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Backend base URL.
    pub base_url: &'a str,
    /// Search endpoint path.
    pub endpoint_path: &'a str,
    /// Whether searches are paid.
    pub payment_enabled: bool,
}

impl<'a> RenderContext<'a> {
    /// Builds the context from the process settings and capability.
    #[must_use]
    pub fn new(settings: &'a Settings, capability: &Capability) -> Self {
        Self {
            base_url: settings.base_url(),
            endpoint_path: settings.endpoint_path(),
            payment_enabled: capability.payment_enabled(),
        }
    }
}

/// Renders an outcome. Only [`Outcome::Error`] produces an error envelope.
#[must_use]
pub fn render(outcome: &Outcome, ctx: &RenderContext<'_>) -> ResponseEnvelope {
    match outcome {
        Outcome::Success(Payload::Search { request, response }) => {
            ResponseEnvelope::text(search_results(request, response), false)
        }
        Outcome::Success(Payload::ServiceInfo(info)) => {
            ResponseEnvelope::text(service_info(info, ctx), false)
        }
        Outcome::Success(Payload::Health(health)) => {
            ResponseEnvelope::text(health_report(health, ctx), false)
        }
        Outcome::Demo(request) => ResponseEnvelope::text(demo_results(request), false),
        Outcome::MissingQuery => ResponseEnvelope::text(MISSING_QUERY_TEXT.to_owned(), false),
        Outcome::PaymentRequired(context) => {
            ResponseEnvelope::text(payment_required(context), false)
        }
        Outcome::Error { kind, message } => {
            ResponseEnvelope::text(generic_error(kind, message, ctx), true)
        }
    }
}

fn search_results(request: &SearchRequest, response: &SearchResponse) -> String {
    let metadata = response.metadata.clone().unwrap_or_default();
    let cost = non_empty(metadata.cost.as_deref()).unwrap_or(DEFAULT_COST);
    let protocol = non_empty(metadata.protocol.as_deref()).unwrap_or(DEFAULT_PROTOCOL);
    let method = non_empty(metadata.payment_method.as_deref()).unwrap_or(DEFAULT_PAYMENT_METHOD);
    let network = non_empty(metadata.network.as_deref()).unwrap_or(DEFAULT_NETWORK);

    let places = if response.results.is_empty() {
        "No places found matching your criteria.".to_owned()
    } else {
        place_list(response.results.iter().take(MAX_LISTED_PLACES))
    };

    format!(
        r#"# 🗺️ Places Search Results

**Query**: "{query}"
**Location**: {location}
**Results Found**: {count}

## 🎯 Places Found:

{places}

---

## 💳 Payment Information
- **Cost**: {cost} paid automatically
- **Protocol**: {protocol}
- **Payment Method**: {method}
- **Network**: {network}
- **Transaction**: ✅ Payment processed successfully

*Real Google Places data retrieved with x402 micropayment*"#,
        query = request.query,
        location = non_empty(request.location.as_deref()).unwrap_or("Not specified"),
        count = response.results.len(),
    )
}

fn demo_results(request: &SearchRequest) -> String {
    let places = demo_places();
    format!(
        r#"# ☕ Demo: Places Search Results

**Query**: "{query}"
**Location**: {location}
**Demo Results**: {count} sample places

## 🎯 Sample Places (Demo Data):

{list}

---

## 💳 Payment Required for Real Data
🔒 **This is demo mode** - To get real Google Places data:

{ENABLEMENT_STEPS}

**Cost**: $0.01 USDC per search (gasless transaction)
**Network**: Base mainnet
**Payment Method**: x402 micropayments via EIP-712 signatures

*Demo shows the format of real results you'll receive after payment setup.*"#,
        query = request.query,
        location = non_empty(request.location.as_deref()).unwrap_or(DEMO_LOCATION),
        count = places.len(),
        list = place_list(places.iter()),
    )
}

fn place_list<'a>(places: impl Iterator<Item = &'a Place>) -> String {
    places
        .enumerate()
        .map(|(i, place)| place_entry(i + 1, place))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn place_entry(position: usize, place: &Place) -> String {
    let rating = place
        .rating
        .filter(|r| *r > 0.0)
        .map_or_else(|| "Not rated".to_owned(), |r| format!("{r}/5.0"));
    let price = place
        .price_level
        .filter(|level| *level > 0)
        .map_or_else(|| "Not specified".to_owned(), |level| "$".repeat(usize::from(level)));
    let types = place
        .types
        .as_deref()
        .filter(|types| !types.is_empty())
        .map_or_else(
            || "General".to_owned(),
            |types| {
                types
                    .iter()
                    .take(MAX_LISTED_TYPES)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        );
    let currently = match place.opening_hours.and_then(|h| h.open_now) {
        Some(true) => "Open",
        Some(false) => "Closed",
        None => "Hours not available",
    };

    format!(
        "**{position}. {name}**
- 📍 **Address**: {address}
- ⭐ **Rating**: {rating}
- 💰 **Price Level**: {price}
- 🏷️ **Type**: {types}
- 📞 **Phone**: {phone}
- 🌐 **Status**: {status}
- 🕒 **Currently**: {currently}",
        name = non_empty(place.name.as_deref()).unwrap_or("Unnamed place"),
        address = non_empty(place.formatted_address.as_deref()).unwrap_or("Address not available"),
        phone = non_empty(place.formatted_phone_number.as_deref()).unwrap_or(NOT_AVAILABLE),
        status = non_empty(place.business_status.as_deref()).unwrap_or("Unknown"),
    )
}

fn service_info(info: &ServiceInfo, ctx: &RenderContext<'_>) -> String {
    let payment = info.payment.clone().unwrap_or_default();
    let endpoints = match info.endpoints.as_deref() {
        Some(endpoints) if !endpoints.is_empty() => endpoints
            .iter()
            .map(endpoint_entry)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => "No endpoints listed".to_owned(),
    };
    let gasless = match payment.gasless {
        Some(true) => "Yes - Facilitator pays gas fees",
        Some(false) => "No",
        None => NOT_AVAILABLE,
    };
    let (enabled, client) = if ctx.payment_enabled {
        ("✅ Yes", "reqwest with x402 payment interceptor")
    } else {
        ("❌ No (demo mode)", "Standard reqwest (demo)")
    };
    let setup = if ctx.payment_enabled {
        ""
    } else {
        "\n\n## ⚠️ Setup Required\nTo enable real payments, add your private key to the MCP host configuration and restart."
    };

    format!(
        "# 🔍 X402 Service Information

## 📋 Service Details
- **Service**: {service}
- **Description**: {description}
- **Version**: {version}
- **X402 Compliance**: {compliance}

## 💰 Payment Configuration
- **Protocol**: {protocol}
- **Price**: {price}
- **Network**: {network}
- **Gasless**: {gasless}

## 🛠️ Available Endpoints
{endpoints}

## 🔧 Current MCP Configuration
- **Payment Enabled**: {enabled}
- **Base URL**: {base_url}
- **Endpoint**: {endpoint_path}
- **Client Type**: {client}{setup}",
        service = or_not_available(info.service.as_deref()),
        description = or_not_available(info.description.as_deref()),
        version = or_not_available(info.version.as_deref()),
        compliance = scalar_text(info.x402_compliance.as_ref()),
        protocol = or_not_available(payment.protocol.as_deref()),
        price = or_not_available(payment.price.as_deref()),
        network = or_not_available(payment.network.as_deref()),
        base_url = ctx.base_url,
        endpoint_path = ctx.endpoint_path,
    )
}

fn endpoint_entry(endpoint: &Endpoint) -> String {
    format!(
        "- **{path}** ({method})\n  - Description: {description}\n  - Payment Required: {paid}",
        path = or_not_available(endpoint.path.as_deref()),
        method = or_not_available(endpoint.method.as_deref()),
        description = or_not_available(endpoint.description.as_deref()),
        paid = if endpoint.payment_required == Some(true) {
            "Yes"
        } else {
            "No"
        },
    )
}

fn health_report(health: &HealthStatus, ctx: &RenderContext<'_>) -> String {
    let payment = health.payment.clone().unwrap_or_default();
    let uptime = health
        .uptime
        .filter(|u| u.is_finite() && *u > 0.0)
        .unwrap_or(0.0)
        .round();
    let features = match &health.features {
        Some(features) if !features.is_empty() => features
            .iter()
            .map(|(name, enabled)| {
                let state = if is_truthy(enabled) {
                    "✅ Enabled"
                } else {
                    "❌ Disabled"
                };
                format!("- **{}**: {state}", name.replace('_', " "))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => "No features listed".to_owned(),
    };
    let client = if ctx.payment_enabled {
        "✅ Configured"
    } else {
        "⚠️ Demo Mode"
    };
    let banner = if health.status.as_deref() == Some("healthy") {
        "🎉 **All systems operational!**"
    } else {
        "⚠️ **Service issues detected**"
    };

    format!(
        "# 💗 Places API Health Status

## 🔧 Service Status
- **Status**: {status}
- **Service**: {service}
- **Version**: {version}
- **Deployment**: {deployment}
- **Uptime**: {uptime:.0} seconds

## ⚡ Payment System
- **Protocol**: {protocol}
- **Network**: {network}
- **Facilitator**: {facilitator}
- **Gasless**: {gasless}

## 🌟 Features
{features}

## 🔗 Connectivity
- **API URL**: {base_url}
- **MCP Integration**: ✅ Working
- **Payment Client**: {client}

{banner}",
        status = or_not_available(health.status.as_deref()),
        service = or_not_available(health.service.as_deref()),
        version = or_not_available(health.version.as_deref()),
        deployment = or_not_available(health.deployment.as_deref()),
        protocol = or_not_available(payment.protocol.as_deref()),
        network = or_not_available(payment.network.as_deref()),
        facilitator = or_not_available(payment.facilitator.as_deref()),
        gasless = if payment.gasless == Some(true) {
            "Enabled"
        } else {
            "Disabled"
        },
        base_url = ctx.base_url,
    )
}

fn payment_required(context: &PaymentRequiredContext) -> String {
    format!(
        "# 💳 Payment Required

The API requires a $0.01 USDC payment for the `{tool}` request.

## 🔧 Setup Real Payments

To enable automatic payments and get real Google Places data:

{ENABLEMENT_STEPS}

## 💰 Payment Details
- **Cost**: $0.01 USDC per search
- **Network**: Base mainnet
- **Method**: Gasless EIP-712 signatures
- **Security**: Your private key stays local, facilitator pays gas

## 🎬 Demo Mode Active
Currently showing sample data. Enable payments for real Google Places results.",
        tool = context.tool,
    )
}

fn generic_error(kind: &str, message: &str, ctx: &RenderContext<'_>) -> String {
    let base_url = ctx.base_url;
    format!(
        "# ❌ Error

**Error Type**: {kind}
**Message**: {message}

## 🔧 Troubleshooting
- Check your internet connection
- Verify the API service is running: {base_url}{HEALTH_PATH}
- Ensure your wallet has sufficient USDC balance (if payments enabled)
- Try restarting your MCP host

## 📞 Support
- **Production API**: {base_url}
- **Service Status**: {base_url}{HEALTH_PATH}"
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn or_not_available(value: Option<&str>) -> &str {
    non_empty(value).unwrap_or(NOT_AVAILABLE)
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_owned(),
        Some(Value::String(s)) => or_not_available(Some(s.as_str())).to_owned(),
        Some(other) => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
