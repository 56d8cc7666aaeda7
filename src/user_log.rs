//! The audit trail of user actions.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::Error;

pub fn create_user_log_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_log (
            ulg_id INTEGER PRIMARY KEY,
            ulg_per_code TEXT NOT NULL,
            ulg_action TEXT NOT NULL,
            ulg_table_name TEXT,
            ulg_record_key TEXT,
            ulg_desc TEXT,
            ulg_timestamp TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// What the user did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    LogIn,
    Register,
    Create,
    Update,
    Delete,
}

impl UserAction {
    fn as_str(self) -> &'static str {
        match self {
            UserAction::LogIn => "login",
            UserAction::Register => "register",
            UserAction::Create => "create",
            UserAction::Update => "update",
            UserAction::Delete => "delete",
        }
    }
}

/// Record that `per_code` performed `action` on the row `record_key` of `table_name`.
///
/// The caller decides whether this runs inside its transaction.
pub fn log_user_action(
    per_code: &str,
    action: UserAction,
    table_name: &str,
    record_key: &str,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_log (ulg_per_code, ulg_action, ulg_table_name, ulg_record_key, ulg_timestamp)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            per_code,
            action.as_str(),
            table_name,
            record_key,
            OffsetDateTime::now_utc(),
        ),
    )?;

    Ok(())
}
