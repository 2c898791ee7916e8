//! Axum HTTP surface over [`WeatherService`].

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use weather_core::{Params, ServiceError, ValidationError, WeatherService};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build the router. Kept separate from [`run`] so tests can drive it directly.
pub fn router(service: WeatherService) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/weather/:city_id", get(weather_handler))
        .route("/weather/:city_id/", get(weather_handler))
        .route("/cities", get(cities_handler))
        .route("/cities/", get(cities_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Bind to the configured address and serve until the process is stopped.
pub async fn run(service: WeatherService) -> anyhow::Result<()> {
    let addr = format!(
        "{}:{}",
        service.config().server.host,
        service.config().server.port
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}"))?;

    tracing::info!(addr = %addr, "weather API listening");

    axum::serve(listener, router(service)).await?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn weather_handler(
    State(service): State<WeatherService>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<Params>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => return query_rejected(rejection),
    };
    // An undecodable path segment is treated like a missing id.
    let city_id = path.ok().map(|Path(city_id)| city_id);

    match service.weather(city_id.as_deref(), &params).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(&service, &params, err),
    }
}

async fn cities_handler(
    State(service): State<WeatherService>,
    query: Result<Query<Params>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => return query_rejected(rejection),
    };

    match service.cities(&params).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(&service, &params, err),
    }
}

fn query_rejected(rejection: QueryRejection) -> Response {
    tracing::debug!(error = %rejection.body_text(), "rejecting undecodable query string");
    bad_request(ValidationError::InvalidQueryString)
}

fn bad_request(err: ValidationError) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": err.detail() }))).into_response()
}

/// 400 with field detail for validation failures, 500 with a generic localized message otherwise.
fn error_response(service: &WeatherService, params: &Params, err: ServiceError) -> Response {
    match err {
        ServiceError::Validation(err) => bad_request(err),
        err => {
            let language = service.message_language(params);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.user_message(&language) })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, Uri},
    };
    use serde_json::Value;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use tower::ServiceExt;
    use weather_core::{
        Config, ExternalApiError, InMemoryCache, InMemoryCityLookup, WeatherProvider, i18n,
    };

    #[derive(Debug, Default)]
    struct FakeProvider {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch_weather(&self, id: i64, _language: &str) -> Result<Value, ExternalApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ExternalApiError::new(format!("weather:{id}"), "status 500"));
            }
            Ok(json!({
                "weather": [{"description": "few clouds"}],
                "main": {"temp": 32, "temp_min": 32, "temp_max": 33, "pressure": 997, "humidity": 79},
                "wind": {"speed": 3.1, "deg": 150},
                "name": "Dubai"
            }))
        }

        async fn fetch_cities(&self, query: &str, _language: &str) -> Result<Value, ExternalApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ExternalApiError::new(format!("cities:{query}"), "request timed out"));
            }
            Ok(json!({"list": [{"id": 100, "name": "Berlin", "sys": {"country": "DE"}}]}))
        }
    }

    fn app(provider: Arc<FakeProvider>) -> Router {
        let mut config = Config::default();
        config.upstream.api_key = "KEY".into();
        let lookup = InMemoryCityLookup::from_iter([(1, 292223), (2, 2950159)]);
        router(WeatherService::new(
            config,
            provider,
            Arc::new(InMemoryCache::new()),
            Arc::new(lookup),
        ))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn weather_returns_shaped_result() {
        let app = app(Arc::new(FakeProvider::default()));

        let (status, body) = get(&app, "/weather/1?language=en").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "city": "Dubai",
                "description": "few clouds",
                "temperature": {"average": "32°C", "min": "32°C", "max": "33°C"},
                "pressure": "997 hPa",
                "humidity": "79%",
                "wind": {"speed": "3.1 m/s", "direction": "SSE"}
            })
        );
    }

    #[tokio::test]
    async fn repeated_requests_hit_upstream_once() {
        let provider = Arc::new(FakeProvider::default());
        let app = app(provider.clone());

        for uri in ["/weather/2", "/weather/2/", "/cities?query=Berlin", "/cities/?query=BERLIN"] {
            let (status, _) = get(&app, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cities_returns_id_and_label() {
        let app = app(Arc::new(FakeProvider::default()));

        let (status, body) = get(&app, "/cities?query=Berlin&language=de").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"id": 100, "name": "Berlin, DE"}]));
    }

    #[tokio::test]
    async fn invalid_input_is_bad_request_with_field_detail() {
        let app = app(Arc::new(FakeProvider::default()));

        let (status, body) = get(&app, "/weather/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "city_id");
        assert_eq!(body["error"]["code"], "invalid_city_id");

        let (status, body) = get(&app, "/weather/1?language=xx").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_language");

        let (status, body) = get(&app, "/weather/99").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "city_not_found");

        let (status, body) = get(&app, "/cities?query=%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "query");
    }

    #[tokio::test]
    async fn undecodable_path_is_json_bad_request() {
        let provider = Arc::new(FakeProvider::default());
        let app = app(provider.clone());

        for uri in ["/weather/%FF", "/weather/%FF/?language=en"] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["field"], "city_id");
            assert_eq!(body["error"]["code"], "invalid_city_id");
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn query_rejection_is_json_bad_request() {
        let uri: Uri = "/cities?query=Berlin".parse().unwrap();
        let rejection = Query::<Vec<(String, u8)>>::try_from_uri(&uri).unwrap_err();

        let response = query_rejected(rejection);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["field"], "query_string");
        assert_eq!(body["error"]["code"], "invalid_query_string");
    }

    #[tokio::test]
    async fn upstream_failure_is_generic_localized_500() {
        let app = app(Arc::new(FakeProvider {
            fail: true,
            ..FakeProvider::default()
        }));

        let (status, body) = get(&app, "/weather/1?language=de").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": i18n::try_again_later("de")}));

        let (status, body) = get(&app, "/cities?query=Berlin").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"].as_str().unwrap();
        assert_eq!(message, i18n::try_again_later("en"));
        assert!(!message.contains("timed out"));
    }
}
