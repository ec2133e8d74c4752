// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Development aid: show internal error text in 500 responses.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::error::InternalDetail;

/// Error bodies are small; anything bigger is passed through untouched.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Replace the generic message of a 500 envelope with the underlying error.
///
/// Only installed when running in development.
pub async fn expose_internal_errors(req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let Some(InternalDetail(detail)) = response.extensions().get::<InternalDetail>().cloned()
    else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Could not buffer error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let body = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(mut envelope)) => {
            envelope.insert("message".to_string(), Value::String(detail));
            match serde_json::to_vec(&envelope) {
                Ok(rewritten) => {
                    parts.headers.remove(header::CONTENT_LENGTH);
                    Body::from(rewritten)
                }
                Err(_) => Body::from(bytes),
            }
        }
        _ => Body::from(bytes),
    };

    Response::from_parts(parts, body)
}
