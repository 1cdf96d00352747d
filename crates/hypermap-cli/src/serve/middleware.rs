//! HAL response enrichment layer.
//!
//! Handlers answer with [`Hal`], which renders plain JSON and stashes the
//! domain [`Payload`] in the response extensions. [`hal_enrichment`] then
//! asks the pipeline whether the request wants hypermedia and, if so,
//! swaps the body for the HAL rendering.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use hypermap_core::pipeline::{EnrichedOutput, Payload, PipelineError, RequestContext};

use super::models::ErrorBody;
use super::AppState;

/// A handler response carrying both its plain rendering and its domain
/// payload.
pub struct Hal<T> {
    pub body: T,
    pub payload: Payload,
}

impl<T> Hal<T> {
    pub fn new(body: T, payload: Payload) -> Self {
        Self { body, payload }
    }
}

impl<T: Serialize> IntoResponse for Hal<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        response.extensions_mut().insert(self.payload);
        response
    }
}

/// Replace eligible responses with their HAL rendering.
pub async fn hal_enrichment(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let ctx = request_context(&state.base_url, &req);
    let response = next.run(req).await;

    let Some(payload) = response.extensions().get::<Payload>().cloned() else {
        return response;
    };
    if !state.pipeline.can_enrich(&ctx, &payload) {
        return response;
    }

    let pipeline = Arc::clone(&state.pipeline);
    let uri = ctx.uri.clone();
    let enriched = tokio::task::spawn_blocking(move || pipeline.enrich(&ctx, &payload)).await;

    match enriched {
        Ok(Ok(output)) => replace_body(response, output),
        Ok(Err(PipelineError::NotApplicable)) => response,
        Ok(Err(e)) => {
            tracing::warn!(%uri, error = %e, "hal enrichment failed");
            error_response(&e)
        }
        Err(e) => {
            tracing::error!(%uri, error = %e, "hal enrichment task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("internal", "enrichment task failed")),
            )
                .into_response()
        }
    }
}

/// Routing facts the pipeline needs, taken from the incoming request.
///
/// The area is the first path segment; the URI is made absolute against
/// `base_url`.
pub fn request_context(base_url: &str, req: &Request) -> RequestContext {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path_and_query.trim_start_matches('/')
    );

    let mut ctx = RequestContext::new(uri);
    if let Some(area) = req.uri().path().split('/').find(|s| !s.is_empty()) {
        ctx = ctx.with_area(area);
    }
    if let Some(accept) = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
    {
        ctx = ctx.with_accept(accept);
    }
    ctx
}

/// Keep status and extensions, swap body and content type.
fn replace_body(response: Response, output: EnrichedOutput) -> Response {
    let (mut parts, _) = response.into_parts();
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(output.content_type()),
    );
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(output.body))
}

/// 405 when the client cannot be given links for the resource, 500 otherwise.
pub fn error_response(err: &PipelineError) -> Response {
    let (status, kind) = if err.is_client_unusable() {
        (StatusCode::METHOD_NOT_ALLOWED, "unsupported_resource")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "enrichment_failed")
    };
    (status, Json(ErrorBody::new(kind, err.to_string()))).into_response()
}
