//! Self-service registration of new users.

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
    auth::{
        AuthPayload, JwtKeys, PasswordHash, Role, ValidatedPassword, get_user_by_username,
        insert_user_account, username_exists,
    },
    db::lock_connection,
    person::{PersonForm, create_person},
    response::{Envelope, codes, success},
    user_log::{UserAction, log_user_action},
    wallet::open_wallet,
};

/// Registered users and their person records are created by this pseudo user.
const SYSTEM_USER: &str = "system";

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub jwt_keys: JwtKeys,
    pub token_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data entered by a new user.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    pub usr_username: String,
    pub usr_password: String,
    pub per_name: String,
    #[serde(default)]
    pub per_last_name: Option<String>,
    #[serde(default)]
    pub usr_avatar: Option<String>,
}

/// Handler for registration requests.
///
/// Creates the person, the user account with the `viewer` role and an empty
/// wallet in one transaction, then logs the new user in.
///
/// # Errors
///
/// - [Error::MissingRequiredFields] if the username or name is empty.
/// - [Error::UsernameExists] if the username is taken.
/// - [Error::TooWeak] if the password is easy to guess.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Json(data): Json<RegisterData>,
) -> Result<Json<Envelope<AuthPayload>>, Error> {
    let username = data.usr_username.trim();
    if username.is_empty() || data.per_name.trim().is_empty() {
        return Err(Error::MissingRequiredFields(
            "usrUsername, usrPassword, perName".to_owned(),
        ));
    }

    let password =
        ValidatedPassword::new(&data.usr_password, &[username, data.per_name.as_str()])?;
    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let connection = lock_connection(&state.db_connection)?;

    if username_exists(username, &connection)? {
        return Err(Error::UsernameExists(username.to_owned()));
    }

    let per_code = format!(
        "P{}",
        OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
    );

    let transaction = connection.unchecked_transaction()?;
    create_person(
        &PersonForm {
            per_code: Some(per_code.clone()),
            per_name: Some(data.per_name.clone()),
            per_last_name: Some(data.per_last_name.clone().unwrap_or_default()),
            per_is_active: Some(true),
            ..Default::default()
        },
        SYSTEM_USER,
        &transaction,
    )?;
    insert_user_account(
        &per_code,
        username,
        &password_hash,
        Role::Viewer,
        data.usr_avatar.as_deref(),
        &transaction,
    )?;
    open_wallet(&per_code, &transaction)?;
    log_user_action(
        &per_code,
        UserAction::Register,
        "user_account",
        username,
        &transaction,
    )?;
    transaction.commit()?;

    let user = get_user_by_username(username, &connection)?;
    tracing::info!("Registered user {username} as {per_code}");

    let payload = AuthPayload::issue(&user, &state.jwt_keys, state.token_duration)?;

    Ok(success(codes::REGISTER_SUCCESS, payload))
}
