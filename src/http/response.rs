//! HTTP response building module
//!
//! Builders for the responses a static resolver can produce.

use super::body::{self, StaticBody};
use hyper::header::{
    HeaderValue, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED, LOCATION,
};
use hyper::{Response, StatusCode};

/// Validators and representation metadata of a file about to be served
#[derive(Debug, Clone)]
pub struct FileHeaders<'a> {
    pub content_type: &'a str,
    pub content_length: u64,
    pub last_modified: String,
    pub etag: String,
    pub cache_control: Option<&'a str>,
}

/// Build a JSON error response: `{"detail": ..., "status_code": ...}`
pub fn build_error_response(status: StatusCode) -> Response<StaticBody> {
    let detail = match status {
        StatusCode::INTERNAL_SERVER_ERROR => "Internal server error",
        other => other.canonical_reason().unwrap_or("Error"),
    };
    let payload = serde_json::json!({
        "detail": detail,
        "status_code": status.as_u16(),
    })
    .to_string();

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_LENGTH, payload.len())
        .body(body::full(payload))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(body::empty())
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<StaticBody> {
    build_error_response(StatusCode::NOT_FOUND)
}

/// Build 401 Unauthorized response
pub fn build_401_response() -> Response<StaticBody> {
    build_error_response(StatusCode::UNAUTHORIZED)
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<StaticBody> {
    build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<StaticBody> {
    let mut resp = build_error_response(StatusCode::METHOD_NOT_ALLOWED);
    resp.headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
    resp
}

/// Build 307 redirect response
pub fn build_redirect_response(target: &str) -> Response<StaticBody> {
    Response::builder()
        .status(StatusCode::TEMPORARY_REDIRECT)
        .header(LOCATION, target)
        .header(CONTENT_LENGTH, 0)
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error("307", &e);
            build_500_response()
        })
}

/// Build 304 Not Modified response
///
/// Carries the validators only; no representation headers, no body.
pub fn build_304_response(headers: &FileHeaders<'_>) -> Response<StaticBody> {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(ETAG, headers.etag.as_str());
    if let Some(cache_control) = headers.cache_control {
        builder = builder.header(CACHE_CONTROL, cache_control);
    }

    builder.body(body::empty()).unwrap_or_else(|e| {
        log_build_error("304", &e);
        build_500_response()
    })
}

/// Build a file response with full representation headers
///
/// `body` is empty for HEAD requests; `Content-Length` always reports the
/// file size.
pub fn build_file_response(
    status: StatusCode,
    headers: &FileHeaders<'_>,
    body: StaticBody,
) -> Response<StaticBody> {
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, headers.content_type)
        .header(CONTENT_LENGTH, headers.content_length)
        .header(LAST_MODIFIED, headers.last_modified.as_str())
        .header(ETAG, headers.etag.as_str());
    if let Some(cache_control) = headers.cache_control {
        builder = builder.header(CACHE_CONTROL, cache_control);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        build_500_response()
    })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn json_body(resp: Response<StaticBody>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_bodies() {
        let resp = build_405_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[ALLOW], "GET, HEAD");
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({"detail": "Method Not Allowed", "status_code": 405})
        );

        assert_eq!(
            json_body(build_500_response()).await,
            serde_json::json!({"detail": "Internal server error", "status_code": 500})
        );
        assert_eq!(
            json_body(build_401_response()).await,
            serde_json::json!({"detail": "Unauthorized", "status_code": 401})
        );
    }

    #[test]
    fn test_file_response_header_order() {
        let headers = FileHeaders {
            content_type: "text/plain; charset=utf-8",
            content_length: 14,
            last_modified: "Thu, 10 Oct 2013 23:40:00 GMT".to_string(),
            etag: "\"1-e\"".to_string(),
            cache_control: Some("public, max-age=60"),
        };
        let resp = build_file_response(StatusCode::OK, &headers, body::empty());
        let names: Vec<&str> = resp.headers().keys().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            [
                "content-type",
                "content-length",
                "last-modified",
                "etag",
                "cache-control"
            ]
        );
    }

    #[test]
    fn test_304_has_no_representation_headers() {
        let headers = FileHeaders {
            content_type: "text/plain",
            content_length: 14,
            last_modified: "Thu, 10 Oct 2013 23:40:00 GMT".to_string(),
            etag: "\"1-e\"".to_string(),
            cache_control: None,
        };
        let resp = build_304_response(&headers);
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(resp.headers()[ETAG], "\"1-e\"");
        assert!(resp.headers().get(CONTENT_LENGTH).is_none());
        assert!(resp.headers().get(CONTENT_TYPE).is_none());
    }
}
