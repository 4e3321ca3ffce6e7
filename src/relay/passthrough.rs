//! Route handlers that forward requests to the upstream Seqera API.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error, info};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::Token;
use crate::seqera::TOKEN_HEADER;

use super::error::RelayError;
use super::RelayState;

const API_PREFIX: &str = "/api";
const IMAGE_PREFIX: &str = "/image";

/// `<ANY> /api/<path>?<query>`: forwards to `<upstream>/<path>?<query>`.
///
/// The caller's token comes from the `X-Seqera-Token` header. JSON responses
/// are decoded and re-encoded, anything else is relayed as text; the upstream
/// status code is always kept.
pub async fn api_passthrough(
    State(state): State<RelayState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let path = uri.path().strip_prefix(API_PREFIX).unwrap_or(uri.path());
    let url = state.upstream_url(path, uri.query());

    info!("Proxying {method} {url}");

    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(Token::from)
        .filter(|token| !token.is_empty())
        .ok_or(RelayError::MissingApiToken)?;

    debug!("Token: {}", token.log_prefix());

    let mut request = state
        .client
        .request(method.clone(), &url)
        .bearer_auth(token.as_str())
        .header(CONTENT_TYPE, "application/json");

    if method != Method::GET && method != Method::HEAD {
        let is_json = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let payload = request_payload(&body, is_json)?;
        debug!("Body: {payload}");
        request = request.json(&payload);
    }

    let response = request
        .send()
        .await
        .map_err(|e| RelayError::upstream(&e, state.mode))?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    info!("Response status: {status}");

    if content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("application/json"))
    {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::upstream(&e, state.mode))?;

        if bytes.is_empty() {
            return Ok(status.into_response());
        }

        let data: Value =
            serde_json::from_slice(&bytes).map_err(|e| RelayError::upstream(&e, state.mode))?;

        if status.is_success() {
            debug!("Success");
        } else {
            error!(
                "Error response: {}",
                serde_json::to_string_pretty(&data).unwrap_or_default()
            );
        }

        Ok((status, Json(data)).into_response())
    } else {
        let text = response
            .text()
            .await
            .map_err(|e| RelayError::upstream(&e, state.mode))?;

        if !status.is_success() {
            error!("Error response (text): {text}");
        }

        Ok((status, text).into_response())
    }
}

/// The JSON document forwarded upstream.
///
/// Only bodies declared as `application/json` are parsed; an empty or non-JSON
/// body becomes `{}`.
fn request_payload(body: &Bytes, is_json: bool) -> Result<Value, RelayError> {
    if !is_json || body.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| RelayError::InvalidBody(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    token: Option<String>,
}

/// `GET /image/<path>?token=<bearer>`: forwards to `<upstream>/<path>`.
///
/// Images are loaded by plain element tags that cannot set headers, so the
/// token travels as a query parameter and is not forwarded upstream.
pub async fn image_passthrough(
    State(state): State<RelayState>,
    uri: Uri,
    Query(query): Query<ImageQuery>,
) -> Result<Response, RelayError> {
    let path = uri.path().strip_prefix(IMAGE_PREFIX).unwrap_or(uri.path());
    let url = state.upstream_url(path, None);

    info!("Proxying image: {url}");

    let token = query
        .token
        .map(Token::from)
        .filter(|token| !token.is_empty())
        .ok_or(RelayError::MissingImageToken)?;

    debug!("Using token: {}", token.log_prefix());

    let response = state
        .client
        .get(&url)
        .bearer_auth(token.as_str())
        .send()
        .await
        .map_err(|e| RelayError::ImageProxy(e.to_string()))?;

    let status = response.status();
    info!("Image response status: {status}");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("Image fetch failed: {status}, body: {body}");
        return Err(RelayError::ImageFetchFailed(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    let bytes = response
        .bytes()
        .await
        .map_err(|e| RelayError::ImageProxy(e.to_string()))?;

    info!(
        "Image fetched ({}, {} bytes)",
        content_type.to_str().unwrap_or("binary"),
        bytes.len()
    );

    Ok((StatusCode::OK, [(CONTENT_TYPE, content_type)], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_becomes_empty_object() {
        let payload = request_payload(&Bytes::new(), true).unwrap();
        assert_eq!(payload, serde_json::json!({}));
    }

    #[test]
    fn test_body_is_parsed_as_json() {
        let payload = request_payload(&Bytes::from_static(br#"{"launch":{"id":1}}"#), true).unwrap();
        assert_eq!(payload["launch"]["id"], 1);

        let err = request_payload(&Bytes::from_static(b"not json"), true).unwrap_err();
        assert!(matches!(err, RelayError::InvalidBody(_)));
    }

    #[test]
    fn test_non_json_content_type_becomes_empty_object() {
        let payload = request_payload(&Bytes::from_static(b"hello"), false).unwrap();
        assert_eq!(payload, serde_json::json!({}));
    }
}
