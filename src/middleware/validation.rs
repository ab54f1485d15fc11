//! Request body validation for user writes
//!
//! Bodies arrive as JSON or as HTML form fields; both decode into the same
//! `Record` so the required-field check and the handlers see one shape.

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde_json::Value;
use std::error::Error as _;

use crate::error::{ApiError, ApiResult};
use crate::models::{Record, REQUIRED_USER_FIELDS};

/// Largest request body accepted on user routes (100 KiB)
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Middleware rejecting user writes that lack a body or a required field.
///
/// The body is buffered, checked and handed on to the handler unchanged.
pub async fn require_user_fields(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(rejection) => return rejection.into_response(),
    };

    if let Err(rejection) =
        parse_payload(&parts.headers, &bytes).and_then(|payload| check_required_fields(&payload))
    {
        return rejection.into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Buffer a request body up to `MAX_BODY_BYTES`
pub async fn read_body(body: Body) -> ApiResult<Bytes> {
    axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(body_error)
}

/// Only an exceeded limit is the client's size problem; any other read failure
/// (aborted upload, broken chunked encoding) is a plain bad request.
fn body_error(err: axum::Error) -> ApiError {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return ApiError::PayloadTooLarge;
        }
        source = cause.source();
    }

    tracing::debug!(error = %err, "Failed to read request body");
    ApiError::UnreadableBody
}

/// Decode a raw body into a non-empty object, from JSON or form fields
pub fn parse_payload(headers: &HeaderMap, bytes: &[u8]) -> ApiResult<Record> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::MissingBody);
    }

    let payload = match body_format(headers) {
        Some(BodyFormat::Json) => parse_json(bytes)?,
        Some(BodyFormat::Form) => parse_form(bytes)?,
        None => return Err(ApiError::UnsupportedMediaType),
    };

    if payload.is_empty() {
        return Err(ApiError::MissingBody);
    }
    Ok(payload)
}

fn parse_json(bytes: &[u8]) -> ApiResult<Record> {
    match serde_json::from_slice::<Value>(bytes).map_err(|_| ApiError::MalformedBody)? {
        Value::Null => Ok(Record::new()),
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::MalformedBody),
    }
}

/// Form fields become strings; a repeated key collects into an array
fn parse_form(bytes: &[u8]) -> ApiResult<Record> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(bytes).map_err(|_| ApiError::MalformedBody)?;

    let mut record = Record::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        match record.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                record.insert(key, value);
            }
        }
    }
    Ok(record)
}

/// Fail on the first required field that is not present, in declaration order
pub fn check_required_fields(payload: &Record) -> ApiResult<()> {
    match REQUIRED_USER_FIELDS
        .into_iter()
        .find(|field| !is_present(payload.get(*field)))
    {
        Some(field) => Err(ApiError::MissingField(field)),
        None => Ok(()),
    }
}

/// A field is present when it exists, is not null and, for strings, is not blank.
/// `0` and `false` count as present.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
}

fn body_format(headers: &HeaderMap) -> Option<BodyFormat> {
    let mime = headers
        .get(header::CONTENT_TYPE)?
        .to_str()
        .ok()?
        .split(';')
        .next()?
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
    {
        Some(BodyFormat::Json)
    } else if mime == "application/x-www-form-urlencoded" {
        Some(BodyFormat::Form)
    } else {
        None
    }
}

/// Extractor yielding the request body (JSON or form fields) as an object
#[derive(Debug, Clone)]
pub struct JsonPayload(pub Record);

#[async_trait]
impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();
        let bytes = read_body(body).await?;

        parse_payload(&parts.headers, &bytes).map(JsonPayload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers_with(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    fn json_headers() -> HeaderMap {
        headers_with("application/json; charset=utf-8")
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_empty_bodies_are_missing() {
        let headers = json_headers();
        for body in ["", "   \n", "null", "{}"] {
            assert!(
                matches!(parse_payload(&headers, body.as_bytes()), Err(ApiError::MissingBody)),
                "body {:?} should count as missing",
                body
            );
        }
    }

    #[test]
    fn test_non_object_bodies_are_malformed() {
        let headers = json_headers();
        for body in ["[1, 2]", "\"alice\"", "{\"name\":", "42"] {
            assert!(matches!(
                parse_payload(&headers, body.as_bytes()),
                Err(ApiError::MalformedBody)
            ));
        }
    }

    #[test]
    fn test_content_type_is_required_for_non_empty_body() {
        let body = br#"{"name":"Alice"}"#;

        assert!(matches!(
            parse_payload(&HeaderMap::new(), body),
            Err(ApiError::UnsupportedMediaType)
        ));

        let headers = headers_with("application/merge-patch+json");
        assert!(parse_payload(&headers, body).is_ok());

        assert!(matches!(
            parse_payload(&headers_with("text/plain"), body),
            Err(ApiError::UnsupportedMediaType)
        ));
    }

    #[test]
    fn test_form_bodies_decode_to_string_fields() {
        let headers = headers_with("application/x-www-form-urlencoded");

        let payload =
            parse_payload(&headers, b"name=Alice+Smith&email=alice%40x.com&tag=a&tag=b").unwrap();
        assert_eq!(payload["name"], "Alice Smith");
        assert_eq!(payload["email"], "alice@x.com");
        assert_eq!(payload["tag"], json!(["a", "b"]));

        let payload = parse_payload(&headers, b"name=Alice&email=").unwrap();
        assert!(matches!(
            check_required_fields(&payload),
            Err(ApiError::MissingField("email"))
        ));

        assert!(matches!(
            parse_payload(&headers, b"  "),
            Err(ApiError::MissingBody)
        ));
    }

    #[tokio::test]
    async fn test_read_body_enforces_limit() {
        let small = read_body(Body::from("{\"name\":\"Alice\"}")).await.unwrap();
        assert_eq!(&small[..], br#"{"name":"Alice"}"#);

        let oversized = Body::from(vec![b'a'; MAX_BODY_BYTES + 1]);
        assert!(matches!(
            read_body(oversized).await,
            Err(ApiError::PayloadTooLarge)
        ));
    }

    #[test]
    fn test_body_read_failures_are_bad_requests() {
        let err = axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "client went away",
        ));
        assert!(matches!(body_error(err), ApiError::UnreadableBody));
    }

    #[test]
    fn test_name_checked_before_email() {
        let err = check_required_fields(&record(json!({"age": 30}))).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("name")));

        let err = check_required_fields(&record(json!({"name": "Alice", "email": "  "})))
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingField("email")));

        assert!(
            check_required_fields(&record(json!({"name": "Alice", "email": "a@x.com"}))).is_ok()
        );
    }

    #[test]
    fn test_presence_predicate() {
        assert!(!is_present(None));
        assert!(!is_present(Some(&Value::Null)));
        assert!(!is_present(Some(&json!(""))));
        assert!(!is_present(Some(&json!(" \t"))));
        assert!(is_present(Some(&json!("Alice"))));
        assert!(is_present(Some(&json!(0))));
        assert!(is_present(Some(&json!(false))));
    }
}
