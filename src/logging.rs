//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Bodies longer than this many bytes are truncated at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 3] = ["usrPassword", "password", "token"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level. Passwords and tokens in
/// JSON bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let body_text = body_to_log(&parts.headers, &body_bytes);

    tracing::info!(
        "Received request: {} {}\nbody: {}",
        parts.method,
        parts.uri,
        truncate(&body_text)
    );
    if body_text.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full request body: {body_text:?}");
    }

    let response = next
        .run(Request::from_parts(parts, Body::from(body_bytes)))
        .await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            Bytes::new()
        }
    };
    let body_text = body_to_log(&parts.headers, &body_bytes);

    tracing::info!(
        "Sending response: {}\nbody: {}",
        parts.status,
        truncate(&body_text)
    );
    if body_text.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full response body: {body_text:?}");
    }

    Response::from_parts(parts, Body::from(body_bytes))
}

fn truncate(text: &str) -> String {
    if text.len() <= LOG_BODY_LENGTH_LIMIT {
        return text.to_owned();
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &text[..end])
}

fn body_to_log(headers: &HeaderMap, body: &[u8]) -> String {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        redact_secrets(body)
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}

/// Replace the values of password and token fields in a JSON body with
/// asterisks, at any depth.
///
/// Bodies that are not valid JSON are returned unchanged.
fn redact_secrets(body: &[u8]) -> String {
    let Ok(mut json) = serde_json::from_slice::<Value>(body) else {
        return String::from_utf8_lossy(body).into_owned();
    };

    redact_value(&mut json);

    json.to_string()
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(object) => {
            for (key, value) in object.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *value = Value::String("********".to_owned());
                } else {
                    redact_value(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_value),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, middleware::from_fn, routing::post};
    use axum_test::TestServer;
    use serde_json::json;

    use super::{LOG_BODY_LENGTH_LIMIT, logging_middleware, redact_secrets, truncate};

    #[test]
    fn redacts_password_fields() {
        let body = json!({"usrUsername": "sara", "usrPassword": "hunter2"}).to_string();

        let redacted = redact_secrets(body.as_bytes());

        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains("sara"));
    }

    #[test]
    fn redacts_nested_tokens() {
        let body = json!({
            "success": true,
            "code": "LOGIN_SUCCESS",
            "data": {"token": "eyJhbGciOiJIUzI1NiJ9.secret", "user": {"usrUsername": "sara"}}
        })
        .to_string();

        let redacted = redact_secrets(body.as_bytes());

        assert!(!redacted.contains("eyJhbGciOiJIUzI1NiJ9"));
        assert!(redacted.contains("LOGIN_SUCCESS"));
        assert!(redacted.contains("sara"));
    }

    #[test]
    fn leaves_non_json_bodies_alone() {
        assert_eq!(redact_secrets(b"not json"), "not json");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let text = "س".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate(&text);

        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= LOG_BODY_LENGTH_LIMIT + 3);
    }

    #[tokio::test]
    async fn passes_body_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let body = json!({"usrPassword": "hunter2"});
        let response = server.post("/echo").json(&body).await;

        response.assert_status_ok();
        response.assert_text(body.to_string());
    }

    #[tokio::test]
    async fn client_still_receives_token() {
        let app = Router::new()
            .route(
                "/log_in",
                post(|| async { Json(json!({"data": {"token": "abc.def.ghi"}})) }),
            )
            .layer(from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.post("/log_in").await;

        response.assert_status_ok();
        response.assert_json(&json!({"data": {"token": "abc.def.ghi"}}));
    }
}
