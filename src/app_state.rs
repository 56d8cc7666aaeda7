//! Implements a struct that holds the state of the REST server.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_TOKEN_DURATION, JwtKeys},
    db::initialize,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys used to sign and verify JSON web tokens.
    pub jwt_keys: JwtKeys,

    /// How long an issued token stays valid.
    pub token_duration: Duration,

    /// The directory that holds the translation JSON files.
    pub translations_dir: PathBuf,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables and
    /// report views for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        translations_dir: impl Into<PathBuf>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            jwt_keys: JwtKeys::new(jwt_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            translations_dir: translations_dir.into(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
