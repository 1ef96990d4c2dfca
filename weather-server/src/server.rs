use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, http::HeaderValue, routing::get};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use weather_core::{Config, WeatherProvider, provider_from_config};

use crate::api;

pub const API_V1: &str = "/api/v1";

/// Shared, immutable per-process state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub provider: Arc<dyn WeatherProvider>,
}

/// Routes only; no middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::root))
        .route(&format!("{API_V1}/weather/:city"), get(api::get_weather))
        .fallback(api::not_found)
        .with_state(state)
}

/// `*` allows any origin without credentials; otherwise the listed origins
/// are allowed with credentials and mirrored methods/headers.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin: '{o}'")))
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub fn app(state: AppState, config: &Config) -> Result<Router> {
    Ok(router(state)
        .layer(cors_layer(&config.server.cors_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &Config, bind: &str) -> Result<()> {
    let provider = provider_from_config(config)?;
    let app = app(AppState { provider }, config)?;

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, draining in-flight requests");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use tower::ServiceExt;

    fn config_with_origins(origins: &[&str]) -> Config {
        let mut cfg = Config::default();
        cfg.server.cors_origins = origins.iter().map(|o| o.to_string()).collect();
        cfg
    }

    fn state() -> AppState {
        AppState {
            provider: provider_from_config(&Config::default()).unwrap(),
        }
    }

    #[tokio::test]
    async fn preflight_from_allowed_origin_is_accepted() {
        let cfg = config_with_origins(&["http://localhost:3000"]);
        let app = app(state(), &cfg).unwrap();

        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/weather/London")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn unknown_origin_gets_no_allow_header() {
        let cfg = config_with_origins(&["http://localhost:3000"]);
        let app = app(state(), &cfg).unwrap();

        let req = Request::builder()
            .uri("/")
            .header(header::ORIGIN, "http://evil.test")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();

        assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn wildcard_origin_builds() {
        assert!(cors_layer(&["*".to_string()]).is_ok());
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let err = cors_layer(&["http://bad\norigin".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid CORS origin"));
    }
}
