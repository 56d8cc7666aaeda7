//! Handles log-in requests.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{JwtKeys, UserAccount, UserProfile, create_token, get_user_by_username},
    db::lock_connection,
    response::{Envelope, codes, success},
    user_log::{UserAction, log_user_action},
};

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The keys used to sign JSON web tokens.
    pub jwt_keys: JwtKeys,
    /// How long an issued token stays valid.
    pub token_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials entered by the user.
///
/// The password is a plain string. There is no need for validation here since
/// it will be compared against the hash in the database.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInData {
    pub usr_username: String,
    pub usr_password: String,
}

/// A token and the profile of the user it was issued to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserProfile,
}

impl AuthPayload {
    /// Issue a fresh token for `user`.
    pub(crate) fn issue(
        user: &UserAccount,
        keys: &JwtKeys,
        duration: Duration,
    ) -> Result<Self, Error> {
        let token = create_token(
            &user.per_code,
            user.role,
            OffsetDateTime::now_utc(),
            duration,
            keys,
        )?;

        Ok(Self {
            token,
            user: UserProfile::from(user),
        })
    }
}

/// Handler for log-in requests.
///
/// The database lock is only held for the user lookup and the audit entry,
/// not while the password hash is checked.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the username is unknown, the user
/// is inactive or the password is wrong.
pub async fn log_in(
    State(state): State<LogInState>,
    Json(credentials): Json<LogInData>,
) -> Result<Json<Envelope<AuthPayload>>, Error> {
    let user = find_active_user(&credentials.usr_username, &state.db_connection)?;
    verify_password(&user, &credentials.usr_password)?;

    let payload = AuthPayload::issue(&user, &state.jwt_keys, state.token_duration)?;
    let connection = lock_connection(&state.db_connection)?;
    log_user_action(
        &user.per_code,
        UserAction::LogIn,
        "user_account",
        &user.username,
        &connection,
    )?;

    Ok(success(codes::LOGIN_SUCCESS, payload))
}

fn find_active_user(
    username: &str,
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<UserAccount, Error> {
    let connection = lock_connection(db_connection)?;

    let user = match get_user_by_username(username, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    if !user.is_active {
        tracing::info!("Inactive user {} tried to log in", user.username);
        return Err(Error::InvalidCredentials);
    }

    Ok(user)
}

fn verify_password(user: &UserAccount, raw_password: &str) -> Result<(), Error> {
    let is_password_valid = user
        .password_hash
        .verify(raw_password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState,
        Error,
        auth::{JwtKeys, PasswordHash, Role, ValidatedPassword, decode_token, insert_user_account},
        response::{Envelope, ErrorBody},
    };

    use super::{AuthPayload, find_active_user, log_in, verify_password};

    fn get_test_state() -> AppState {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            "translations",
        )
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        connection
            .execute_batch(
                "INSERT INTO person (per_code, per_name, per_last_name, per_created_at)
                VALUES ('P001', 'Sara', 'Karimi', '2025-01-01T00:00:00Z'),
                       ('P002', 'Reza', '', '2025-01-01T00:00:00Z');",
            )
            .unwrap();
        let hash =
            PasswordHash::new(ValidatedPassword::new_unchecked("averysafepassword"), 4).unwrap();
        insert_user_account("P001", "sara", &hash, Role::Admin, None, &connection).unwrap();
        insert_user_account("P002", "reza", &hash, Role::Viewer, None, &connection).unwrap();
        connection
            .execute(
                "UPDATE user_account SET usr_is_active = 0 WHERE usr_username = 'reza'",
                (),
            )
            .unwrap();
        drop(connection);

        state
    }

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route("/log_in", post(log_in))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_state();
        let keys: JwtKeys = state.jwt_keys.clone();
        let server = get_test_server(state);

        let response = server
            .post("/log_in")
            .json(&json!({"usrUsername": "sara", "usrPassword": "averysafepassword"}))
            .await;

        response.assert_status_ok();
        let body = response.json::<Envelope<AuthPayload>>();
        assert_eq!(body.code, "LOGIN_SUCCESS");
        assert_eq!(body.data.user.usr_name, "Sara Karimi");
        assert_eq!(body.data.user.usr_role, Role::Admin);
        let claims = decode_token(&body.data.token, &keys).unwrap();
        assert_eq!(claims.id, "P001");
    }

    #[tokio::test]
    async fn log_in_writes_audit_entry() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        server
            .post("/log_in")
            .json(&json!({"usrUsername": "sara", "usrPassword": "averysafepassword"}))
            .await
            .assert_status_ok();

        let count: i64 = state
            .db_connection
            .lock()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM user_log WHERE ulg_action = 'login' AND ulg_per_code = 'P001'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = get_test_server(get_test_state());

        let response = server
            .post("/log_in")
            .json(&json!({"usrUsername": "sara", "usrPassword": "wrongpassword"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<ErrorBody>().code, "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_user() {
        let server = get_test_server(get_test_state());

        server
            .post("/log_in")
            .json(&json!({"usrUsername": "nobody", "usrPassword": "averysafepassword"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_for_inactive_user() {
        let server = get_test_server(get_test_state());

        server
            .post("/log_in")
            .json(&json!({"usrUsername": "reza", "usrPassword": "averysafepassword"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn password_is_checked_without_the_database_lock() {
        let state = get_test_state();
        let user = find_active_user("sara", &state.db_connection).unwrap();

        let _other_request = state.db_connection.lock().unwrap();

        assert_eq!(verify_password(&user, "averysafepassword"), Ok(()));
        assert_eq!(
            verify_password(&user, "wrongpassword"),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn user_lookup_releases_the_database_lock() {
        let state = get_test_state();

        find_active_user("sara", &state.db_connection).unwrap();

        assert!(state.db_connection.try_lock().is_ok());
    }
}
