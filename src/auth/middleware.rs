//! Authentication middleware that validates bearer tokens and checks roles.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejectionReason,
};

use crate::{
    AppState, Error,
    auth::{Claims, JwtKeys, decode_token},
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys used to verify JSON web tokens.
    pub jwt_keys: JwtKeys,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The decoded [Claims] are placed into the request extensions and the
/// request executed normally if the token is valid, otherwise a 401 response
/// is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(claims): Extension<Claims>` to receive the claims.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer =
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(rejection) if matches!(rejection.reason(), TypedHeaderRejectionReason::Missing) => {
                return Error::TokenMissing.into_response();
            }
            Err(rejection) => {
                tracing::debug!("Malformed authorization header: {rejection}");
                return Error::TokenInvalid.into_response();
            }
        };

    let claims = match decode_token(bearer.token(), &state.jwt_keys) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(claims);
    next.run(Request::from_parts(parts, body)).await
}

/// Middleware function that only lets admins and managers through.
///
/// Must run after [auth_guard] so that the claims are available.
pub async fn manager_guard(request: Request, next: Next) -> Response {
    match request.extensions().get::<Claims>() {
        Some(claims) if claims.role.can_manage() => next.run(request).await,
        Some(claims) => {
            tracing::warn!(
                "User {} with role {} tried to access {}",
                claims.id,
                claims.role,
                request.uri().path()
            );
            Error::Forbidden.into_response()
        }
        None => Error::TokenMissing.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Router,
        http::StatusCode,
        middleware::{from_fn, from_fn_with_state},
        routing::get,
    };
    use axum_test::TestServer;
    use time::OffsetDateTime;

    use crate::{
        auth::{Claims, DEFAULT_TOKEN_DURATION, JwtKeys, Role, create_token},
        response::ErrorBody,
    };

    use super::{AuthState, auth_guard, manager_guard};

    async fn whoami(Extension(claims): Extension<Claims>) -> String {
        claims.id
    }

    fn get_test_server() -> (TestServer, JwtKeys) {
        let state = AuthState {
            jwt_keys: JwtKeys::new("foobar"),
        };

        let app = Router::new()
            .route("/managed", get(whoami))
            .route_layer(from_fn(manager_guard))
            .merge(Router::new().route("/protected", get(whoami)))
            .route_layer(from_fn_with_state(state.clone(), auth_guard));

        (
            TestServer::try_new(app).expect("Could not create test server."),
            state.jwt_keys,
        )
    }

    fn token_for(role: Role, keys: &JwtKeys) -> String {
        create_token(
            "P001",
            role,
            OffsetDateTime::now_utc(),
            DEFAULT_TOKEN_DURATION,
            keys,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn valid_token_passes_claims_to_handler() {
        let (server, keys) = get_test_server();

        let response = server
            .get("/protected")
            .authorization_bearer(token_for(Role::Viewer, &keys))
            .await;

        response.assert_status_ok();
        response.assert_text("P001");
    }

    #[tokio::test]
    async fn missing_header_is_token_missing() {
        let (server, _) = get_test_server();

        let response = server.get("/protected").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<ErrorBody>().code, "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn bad_token_is_token_invalid() {
        let (server, _) = get_test_server();

        let response = server
            .get("/protected")
            .authorization_bearer("definitely-not-a-jwt")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<ErrorBody>().code, "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn viewer_is_forbidden_from_managed_route() {
        let (server, keys) = get_test_server();

        let response = server
            .get("/managed")
            .authorization_bearer(token_for(Role::Viewer, &keys))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.json::<ErrorBody>().code, "UNAUTHORIZED_ACCESS");
    }

    #[tokio::test]
    async fn manager_may_use_managed_route() {
        let (server, keys) = get_test_server();

        server
            .get("/managed")
            .authorization_bearer(token_for(Role::Manager, &keys))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn managed_route_still_requires_token() {
        let (server, _) = get_test_server();

        server
            .get("/managed")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
