//! Web server module for ping-exporter.
//!
//! Serves the metrics endpoint, a small index page and a liveness probe.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::collector::PingCollector;
use crate::config::HEALTH_PATH;
use crate::sink::{CONTENT_TYPE, PrometheusSink};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<PingCollector>,
    pub metrics_path: String,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    schedules: usize,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let metrics_path = state.metrics_path.clone();
    let app_state = Arc::new(state);

    let mut router = Router::new().route(&metrics_path, get(metrics_handler));
    if metrics_path != HEALTH_PATH {
        router = router.route(HEALTH_PATH, get(healthz_handler));
    }
    if metrics_path != "/" {
        router = router.route("/", get(index_handler));
    }

    router
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(app_state)
}

/// Index page linking to the metrics endpoint.
async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(&state.metrics_path))
}

fn render_index(metrics_path: &str) -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"<!doctype html>
<html>
<head>
	<meta charset="UTF-8">
	<title>ping Exporter (Version {version})</title>
</head>
<body>
	<h1>ping Exporter</h1>
	<p><a href="{metrics_path}">Metrics</a></p>
</body>
</html>
"#
    )
}

/// Liveness probe.
async fn healthz_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        schedules: state.collector.monitor().schedule_count(),
    })
}

/// Scrape endpoint in the Prometheus text format.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let mut sink = match PrometheusSink::new() {
        Ok(sink) => sink,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build metrics registry");
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response();
        }
    };

    state.collector.collect(&mut sink);

    match sink.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{
        Monitor, MonitorSettings, ProbeError, Prober, ResolveError, Resolver,
    };
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::net::IpAddr;
    use std::time::Duration;
    use tower::ServiceExt;

    struct NoopProber;

    #[async_trait::async_trait]
    impl Prober for NoopProber {
        async fn probe(&self, _: IpAddr, _: Duration, _: u16) -> Result<Duration, ProbeError> {
            Err(ProbeError::Timeout)
        }
    }

    struct NoopResolver;

    #[async_trait::async_trait]
    impl Resolver for NoopResolver {
        async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
            Err(ResolveError::NoAddresses(host.to_string()))
        }
    }

    fn create_test_state(metrics_path: &str) -> AppState {
        let monitor = Arc::new(Monitor::new(
            MonitorSettings::default(),
            ["example.com"],
            Arc::new(NoopProber),
            Arc::new(NoopResolver),
        ));
        AppState {
            collector: Arc::new(PingCollector::new(monitor, "0.0.0-test")),
            metrics_path: metrics_path.to_string(),
        }
    }

    async fn send_get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_metrics_endpoint_reports_up() {
        let app = create_router(create_test_state("/metrics"));
        let (status, body) = send_get(app, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"ping_up{version="0.0.0-test"} 1"#));
        assert!(!body.contains("ping_rtt_mean_ms{"));
    }

    #[tokio::test]
    async fn test_index_links_metrics_path() {
        let app = create_router(create_test_state("/probe"));
        let (status, body) = send_get(app, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<a href="/probe">Metrics</a>"#));
    }

    #[tokio::test]
    async fn test_healthz_endpoint() {
        let app = create_router(create_test_state("/metrics"));
        let (status, body) = send_get(app, "/healthz").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#""status":"ok""#));
    }

    #[tokio::test]
    async fn test_metrics_at_health_path_takes_precedence() {
        let app = create_router(create_test_state("/healthz"));
        let (status, body) = send_get(app, "/healthz").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ping_up"));
    }

    #[tokio::test]
    async fn test_metrics_at_root() {
        let app = create_router(create_test_state("/"));
        let (status, body) = send_get(app, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ping_up"));
    }
}
