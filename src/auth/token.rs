//! JSON web tokens issued at log-in and checked by the auth middleware.

use std::fmt::Debug;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::Role};

/// Tokens are valid for one day and cannot be refreshed.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(1);

/// The contents of a JSON web token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The person code of the user.
    pub id: String,
    /// The user's role at the time the token was issued.
    pub role: Role,
    /// When the token was issued, as a Unix timestamp.
    pub iat: i64,
    /// When the token expires, as a Unix timestamp.
    pub exp: i64,
}

/// The HMAC keys derived from the server secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Derive the signing and verification keys from `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys { .. }")
    }
}

/// Sign a token for the user `per_code` that expires `duration` after `issued_at`.
///
/// # Errors
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn create_token(
    per_code: &str,
    role: Role,
    issued_at: OffsetDateTime,
    duration: Duration,
    keys: &JwtKeys,
) -> Result<String, Error> {
    let claims = Claims {
        id: per_code.to_owned(),
        role,
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + duration).unix_timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
/// Returns [Error::TokenInvalid] for malformed, tampered or expired tokens.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding, &Validation::new(Algorithm::HS256))
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected token: {error}");
            Error::TokenInvalid
        })
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        auth::{DEFAULT_TOKEN_DURATION, JwtKeys, Role},
    };

    use super::{create_token, decode_token};

    #[test]
    fn decode_gives_back_claims() {
        let keys = JwtKeys::new("foobar");
        let now = OffsetDateTime::now_utc();

        let token = create_token("P001", Role::Admin, now, DEFAULT_TOKEN_DURATION, &keys).unwrap();
        let claims = decode_token(&token, &keys).unwrap();

        assert_eq!(claims.id, "P001");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_invalid() {
        let keys = JwtKeys::new("foobar");
        let issued_at = OffsetDateTime::now_utc() - Duration::days(2);

        let token =
            create_token("P001", Role::Admin, issued_at, DEFAULT_TOKEN_DURATION, &keys).unwrap();

        assert_eq!(decode_token(&token, &keys), Err(Error::TokenInvalid));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let token = create_token(
            "P001",
            Role::Viewer,
            OffsetDateTime::now_utc(),
            DEFAULT_TOKEN_DURATION,
            &JwtKeys::new("foobar"),
        )
        .unwrap();

        assert_eq!(
            decode_token(&token, &JwtKeys::new("not-foobar")),
            Err(Error::TokenInvalid)
        );
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(
            decode_token("not.a.token", &JwtKeys::new("foobar")),
            Err(Error::TokenInvalid)
        );
    }
}
