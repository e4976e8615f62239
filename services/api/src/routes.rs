use crate::state::AppState;
use axum::extract::Path;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use doc_assembly::assembly::Questionnaire;
use doc_assembly::error::AppError;
use doc_assembly::validation::RawAnswers;
use doc_assembly::FillRequest;

const STRATEGY_HEADER: HeaderName = HeaderName::from_static("x-assembly-strategy");
const WARNINGS_HEADER: HeaderName = HeaderName::from_static("x-assembly-warnings");
const FORM_ID_HEADER: HeaderName = HeaderName::from_static("x-official-form-id");

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RenderRequest {
    #[serde(default)]
    pub(crate) answers: RawAnswers,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route(
            "/api/v1/documents/:document_type/:jurisdiction/questions",
            get(questions_endpoint),
        )
        .route(
            "/api/v1/documents/:document_type/:jurisdiction/render",
            post(render_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn questions_endpoint(
    Extension(state): Extension<AppState>,
    Path((document_type, jurisdiction)): Path<(String, String)>,
) -> Result<Json<Questionnaire>, AppError> {
    let questionnaire = state.assembler.questions(&document_type, &jurisdiction)?;
    Ok(Json(questionnaire))
}

/// Rendering reads templates over blocking I/O, so it runs off the async workers.
pub(crate) async fn render_endpoint(
    Extension(state): Extension<AppState>,
    Path((document_type, jurisdiction)): Path<(String, String)>,
    Json(payload): Json<RenderRequest>,
) -> Result<Response, AppError> {
    let request = FillRequest::new(&document_type, &jurisdiction, payload.answers);
    let assembler = Arc::clone(&state.assembler);
    let assembled = tokio::task::spawn_blocking(move || assembler.assemble(&request))
        .await
        .map_err(|e| AppError::Worker(e.to_string()))??;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(
        STRATEGY_HEADER,
        HeaderValue::from_static(assembled.strategy.as_str()),
    );
    if let Some(value) = assembled
        .official_form_id
        .as_deref()
        .and_then(header_value)
    {
        headers.insert(FORM_ID_HEADER, value);
    }
    if let Some(value) = warnings_header(&assembled.warnings) {
        headers.insert(WARNINGS_HEADER, value);
    }
    if let Some(value) = header_value(&format!(
        "inline; filename=\"{}-{}.pdf\"",
        document_type,
        jurisdiction.to_ascii_lowercase()
    )) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((StatusCode::OK, headers, assembled.bytes).into_response())
}

/// Header values must be visible ASCII; anything else becomes `?`.
fn header_value(raw: &str) -> Option<HeaderValue> {
    let sanitized: String = raw
        .chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .collect();
    HeaderValue::from_str(sanitized.trim()).ok()
}

fn warnings_header(warnings: &[String]) -> Option<HeaderValue> {
    if warnings.is_empty() {
        return None;
    }
    header_value(&warnings.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use doc_assembly::assets::{AssetChain, AssetStore, StaticFallbackSource};
    use doc_assembly::documents::RegistryBuilder;
    use doc_assembly::render::{PdfRenderer, RenderLimits};
    use doc_assembly::DocumentAssembler;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> Router {
        let registry = Arc::new(RegistryBuilder::bundled().build().expect("bundled builds"));
        let chain = AssetChain::new(vec![Box::new(StaticFallbackSource::new(Arc::clone(
            &registry,
        )))]);
        let assembler = DocumentAssembler::new(
            registry,
            AssetStore::new(chain),
            PdfRenderer::new(RenderLimits::default()),
        );
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            assembler: Arc::new(assembler),
        };
        router().layer(Extension(state))
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    fn render_request(path: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(true)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let response = app(false)
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "initializing");

        let response = app(true)
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn questions_include_override_and_compliance() {
        let response = app(true)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/documents/vehicle-bill-of-sale/florida/questions")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["document_type"], "vehicle-bill-of-sale");
        assert_eq!(body["jurisdiction"], "FL");
        assert_eq!(body["strategy"], "acroform");
        assert_eq!(body["compliance"]["requires_notary"], true);
        assert_eq!(body["compliance"]["official_form_id"], "HSMV 82050");
    }

    #[tokio::test]
    async fn unknown_documents_are_not_found() {
        let response = app(true)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/documents/lease-agreement/TX/questions")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["errors"][0]["kind"], "document_not_found");
    }

    #[tokio::test]
    async fn invalid_answers_are_unprocessable() {
        let response = app(true)
            .oneshot(render_request(
                "/api/v1/documents/vehicle-bill-of-sale/FL/render",
                json!({ "answers": { "vehicle_year": "nineteen" } }),
            ))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        let errors = body["errors"].as_array().expect("errors array");
        assert!(errors.iter().all(|error| error["kind"] == "validation"));
        assert!(errors.iter().any(|error| error["field"] == "vehicle_year"));
        assert!(errors.iter().any(|error| error["field"] == "buyer_name"));
    }

    #[tokio::test]
    async fn missing_templates_are_server_errors() {
        let response = app(true)
            .oneshot(render_request(
                "/api/v1/documents/vehicle-bill-of-sale/FL/render",
                json!({ "answers": { "vehicle_year": "2020", "buyer_name": "Jane Doe" } }),
            ))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["errors"][0]["kind"], "config_resolution");
    }

    #[test]
    fn warning_headers_are_ascii() {
        let value = warnings_header(&[
            "payment_method has no mapping".to_string(),
            "seller signed \u{2713}".to_string(),
        ])
        .expect("header builds");
        assert_eq!(
            value.to_str().expect("ascii"),
            "payment_method has no mapping; seller signed ?"
        );
        assert!(warnings_header(&[]).is_none());
    }
}
