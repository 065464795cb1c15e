//! Tool invocation routing.
//!
//! [`Dispatcher::invoke`] validates arguments, chooses between the paid and
//! the demo path, classifies failures and renders exactly one envelope per
//! call. It never fails.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::backend::{Backend, BackendError};
use crate::capability::Capability;
use crate::classify::classify;
use crate::config::Settings;
use crate::format::{self, RenderContext};
use crate::payload::SearchRequest;
use crate::tools::{MAX_RADIUS_METERS, ToolName};
use crate::types::{Outcome, Payload, ResponseEnvelope};

/// Query values some hosts send when the model omitted the argument.
const QUERY_PLACEHOLDERS: [&str; 2] = ["undefined", "null"];

/// Routes tool invocations. Immutable after construction.
pub struct Dispatcher {
    settings: Settings,
    capability: Capability,
    backend: Arc<dyn Backend>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("settings", &self.settings)
            .field("capability", &self.capability)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over an already-probed capability and backend.
    #[must_use]
    pub fn new(settings: Settings, capability: Capability, backend: Arc<dyn Backend>) -> Self {
        Self {
            settings,
            capability,
            backend,
        }
    }

    /// Probes the capability and builds the HTTP backend it implies.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ClientBuild`] if the HTTP client cannot be
    /// constructed.
    pub fn from_settings(settings: Settings) -> Result<Self, BackendError> {
        let (capability, backend) = Capability::probe(&settings)?;
        Ok(Self::new(settings, capability, Arc::new(backend)))
    }

    /// The process settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The capability fixed at startup.
    #[must_use]
    pub const fn capability(&self) -> &Capability {
        &self.capability
    }

    /// Invokes a tool and renders its outcome.
    pub async fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> ResponseEnvelope {
        let outcome = self.execute(name, arguments).await;
        tracing::info!(tool = name, outcome = outcome.label(), "Tool call handled");
        format::render(
            &outcome,
            &RenderContext::new(&self.settings, &self.capability),
        )
    }

    /// Invokes a tool without rendering.
    pub async fn execute(&self, name: &str, arguments: &Map<String, Value>) -> Outcome {
        let tool = match name.parse::<ToolName>() {
            Ok(tool) => tool,
            Err(e) => {
                tracing::warn!(tool = name, "Unknown tool requested");
                return Outcome::Error {
                    kind: "UnknownTool",
                    message: e.to_string(),
                };
            }
        };
        tracing::debug!(%tool, "Invoking tool");

        match tool {
            ToolName::SearchPlaces => self.search(arguments).await,
            ToolName::GetServiceInfo => match self.backend.service_info().await {
                Ok(info) => Outcome::Success(Payload::ServiceInfo(info)),
                Err(e) => classify(e, self.capability.mode(), tool),
            },
            ToolName::CheckHealth => match self.backend.health().await {
                Ok(health) => Outcome::Success(Payload::Health(health)),
                Err(e) => classify(e, self.capability.mode(), tool),
            },
        }
    }

    async fn search(&self, arguments: &Map<String, Value>) -> Outcome {
        let Some(request) = parse_search_arguments(arguments) else {
            tracing::warn!("search_places called without a usable query");
            return Outcome::MissingQuery;
        };

        if !self.capability.payment_enabled() {
            tracing::debug!(query = %request.query, "Serving demo results");
            return Outcome::Demo(request);
        }

        tracing::info!(query = %request.query, "Making paid search");
        match self.backend.search(&request).await {
            Ok(response) => Outcome::Success(Payload::Search { request, response }),
            Err(e) => classify(e, self.capability.mode(), ToolName::SearchPlaces),
        }
    }
}

/// Extracts a [`SearchRequest`] from tool arguments.
///
/// Returns `None` when `query` is missing, not a string, blank, or a
/// placeholder such as `"undefined"`. A blank `location` and a non-numeric
/// `radius` are dropped; an out-of-range radius is clamped.
#[must_use]
pub fn parse_search_arguments(arguments: &Map<String, Value>) -> Option<SearchRequest> {
    let query = arguments.get("query")?.as_str()?.trim();
    if query.is_empty()
        || QUERY_PLACEHOLDERS
            .iter()
            .any(|p| query.eq_ignore_ascii_case(p))
    {
        return None;
    }

    let location = arguments
        .get("location")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned);
    let radius = arguments
        .get("radius")
        .and_then(Value::as_f64)
        .map(clamp_radius);

    Some(SearchRequest {
        query: query.to_owned(),
        location,
        radius,
    })
}

fn clamp_radius(radius: f64) -> f64 {
    if (0.0..=MAX_RADIUS_METERS).contains(&radius) {
        return radius;
    }
    let clamped = radius.clamp(0.0, MAX_RADIUS_METERS);
    tracing::warn!(radius, clamped, "Search radius out of range");
    clamped
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::backend::BoxFuture;
    use crate::capability::{DisabledReason, PaymentMode};
    use crate::format::MISSING_QUERY_TEXT;
    use crate::payload::{HealthStatus, Place, SearchResponse, ServiceInfo};

    #[derive(Default)]
    struct FakeBackend {
        calls: AtomicUsize,
        payment_required: bool,
    }

    impl FakeBackend {
        fn result<T>(&self, value: T) -> Result<T, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.payment_required {
                Err(BackendError::PaymentRequired)
            } else {
                Ok(value)
            }
        }
    }

    impl Backend for FakeBackend {
        fn search<'a>(
            &'a self,
            _request: &'a SearchRequest,
        ) -> BoxFuture<'a, Result<SearchResponse, BackendError>> {
            let response = SearchResponse {
                results: vec![Place {
                    name: Some("X".to_owned()),
                    formatted_address: Some("Y".to_owned()),
                    rating: Some(4.5),
                    ..Place::default()
                }],
                metadata: None,
            };
            Box::pin(async move { self.result(response) })
        }

        fn service_info(&self) -> BoxFuture<'_, Result<ServiceInfo, BackendError>> {
            Box::pin(async move { self.result(ServiceInfo::default()) })
        }

        fn health(&self) -> BoxFuture<'_, Result<HealthStatus, BackendError>> {
            Box::pin(async move { self.result(HealthStatus::default()) })
        }
    }

    fn dispatcher(enabled: bool, backend: &Arc<FakeBackend>) -> Dispatcher {
        let mode = if enabled {
            PaymentMode::Enabled {
                address: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_owned(),
            }
        } else {
            PaymentMode::Disabled {
                reason: DisabledReason::NoCredential,
            }
        };
        let backend: Arc<dyn Backend> = Arc::<FakeBackend>::clone(backend);
        Dispatcher::new(
            Settings::new("https://places.example").unwrap(),
            Capability::from_mode(mode),
            backend,
        )
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn unusable_queries_never_reach_the_backend() {
        let backend = Arc::new(FakeBackend::default());
        let dispatcher = dispatcher(true, &backend);

        for arguments in [
            json!({}),
            json!({"query": ""}),
            json!({"query": "   "}),
            json!({"query": "undefined"}),
            json!({"query": "NULL"}),
            json!({"query": 42}),
            json!({"location": "37.77,-122.41"}),
        ] {
            let envelope = dispatcher.invoke("search_places", &args(arguments)).await;
            assert_eq!(envelope.joined_text(), MISSING_QUERY_TEXT);
            assert!(!envelope.is_error);
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn demo_mode_search_is_local_and_stable() {
        let backend = Arc::new(FakeBackend::default());
        let dispatcher = dispatcher(false, &backend);
        let arguments = args(json!({"query": "coffee shops"}));

        let first = dispatcher.invoke("search_places", &arguments).await;
        let second = dispatcher.invoke("search_places", &arguments).await;
        assert_eq!(first, second);
        assert!(first.joined_text().contains("Philz Coffee"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn paid_search_renders_backend_results() {
        let backend = Arc::new(FakeBackend::default());
        let dispatcher = dispatcher(true, &backend);

        let envelope = dispatcher
            .invoke("search_places", &args(json!({"query": "pizza"})))
            .await;
        let text = envelope.joined_text();
        assert!(!envelope.is_error);
        assert!(text.contains("**1. X**"));
        assert!(text.contains("4.5/5.0"));
        assert!(text.contains("Payment processed successfully"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn payment_required_depends_on_capability() {
        let backend = Arc::new(FakeBackend {
            payment_required: true,
            ..FakeBackend::default()
        });

        let enabled = dispatcher(true, &backend);
        let outcome = enabled
            .execute("search_places", &args(json!({"query": "pizza"})))
            .await;
        assert!(matches!(
            outcome,
            Outcome::Error {
                kind: "PaymentRequired",
                ..
            }
        ));

        let disabled = dispatcher(false, &backend);
        for tool in ["get_service_info", "check_health"] {
            let outcome = disabled.execute(tool, &Map::new()).await;
            assert!(matches!(outcome, Outcome::PaymentRequired(_)), "{tool}");
        }
    }

    #[tokio::test]
    async fn info_tools_call_backend_in_demo_mode() {
        let backend = Arc::new(FakeBackend::default());
        let dispatcher = dispatcher(false, &backend);

        let info = dispatcher.invoke("get_service_info", &Map::new()).await;
        assert!(info.joined_text().contains("X402 Service Information"));
        let health = dispatcher.invoke("check_health", &Map::new()).await;
        assert!(health.joined_text().contains("Places API Health Status"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_tool_is_a_generic_error() {
        let backend = Arc::new(FakeBackend::default());
        let dispatcher = dispatcher(true, &backend);

        let envelope = dispatcher.invoke("book_table", &Map::new()).await;
        assert!(envelope.is_error);
        let text = envelope.joined_text();
        assert!(text.contains("**Error Type**: UnknownTool"));
        assert!(text.contains("**Message**: Unknown tool: book_table"));
    }

    #[test]
    fn search_arguments_are_normalized() {
        let request = parse_search_arguments(&args(json!({
            "query": "  pizza  ",
            "location": "  ",
            "radius": 80_000
        })))
        .unwrap();
        assert_eq!(request.query, "pizza");
        assert_eq!(request.location, None);
        assert_eq!(request.radius, Some(MAX_RADIUS_METERS));

        let request = parse_search_arguments(&args(json!({
            "query": "pizza",
            "location": " 37.7749,-122.4194 ",
            "radius": "far"
        })))
        .unwrap();
        assert_eq!(request.location.as_deref(), Some("37.7749,-122.4194"));
        assert_eq!(request.radius, None);

        let request =
            parse_search_arguments(&args(json!({"query": "pizza", "radius": -5}))).unwrap();
        assert_eq!(request.radius, Some(0.0));
    }
}
