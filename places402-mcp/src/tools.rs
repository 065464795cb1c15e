//! Static tool registry advertised to the MCP host.
//!
//! The registry is identical in demo and payment mode; the distinction is
//! made only when a tool is invoked.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde_json::{Map, Value, json};

/// Upper bound of the `radius` argument, in meters.
pub const MAX_RADIUS_METERS: f64 = 50_000.0;

/// Tools exposed by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    /// Paid places search.
    SearchPlaces,
    /// x402 service description.
    GetServiceInfo,
    /// Backend health report.
    CheckHealth,
}

impl ToolName {
    /// Every tool, in registry order.
    pub const ALL: [Self; 3] = [Self::SearchPlaces, Self::GetServiceInfo, Self::CheckHealth];

    /// Wire name of the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SearchPlaces => "search_places",
            Self::GetServiceInfo => "get_service_info",
            Self::CheckHealth => "check_health",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool name that is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolName {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| UnknownTool(s.to_owned()))
    }
}

/// Metadata advertising one tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Tool identity.
    pub name: ToolName,
    /// Description shown to the model.
    pub description: &'static str,
    /// JSON Schema of the arguments object.
    pub input_schema: Map<String, Value>,
}

static REGISTRY: LazyLock<Vec<ToolDescriptor>> = LazyLock::new(|| {
    vec![
        ToolDescriptor {
            name: ToolName::SearchPlaces,
            description: "Search for places using Google Places API with x402 micropayments",
            input_schema: object_schema(json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search term (e.g., 'pizza restaurants', 'coffee shops')"
                    },
                    "location": {
                        "type": "string",
                        "description": "Optional location bias in 'lat,lng' format (e.g., '37.7749,-122.4194')"
                    },
                    "radius": {
                        "type": "number",
                        "description": "Optional search radius in meters (max 50000)",
                        "minimum": 0,
                        "maximum": MAX_RADIUS_METERS
                    }
                },
                "required": ["query"]
            })),
        },
        ToolDescriptor {
            name: ToolName::GetServiceInfo,
            description: "Get x402 service information and payment requirements",
            input_schema: empty_schema(),
        },
        ToolDescriptor {
            name: ToolName::CheckHealth,
            description: "Check the health status of the Places API service",
            input_schema: empty_schema(),
        },
    ]
});

fn object_schema(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn empty_schema() -> Map<String, Value> {
    object_schema(json!({ "type": "object", "properties": {} }))
}

/// Returns the tool registry. The same slice is returned on every call.
#[must_use]
pub fn list_tools() -> &'static [ToolDescriptor] {
    &REGISTRY
}
