//! User accounts: the log-in identity attached to a person.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, OptionalExtension, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access.
    Admin,
    /// May manage accounts, journals and reports.
    Manager,
    /// Read access plus the flat CRUD endpoints.
    Viewer,
}

impl Role {
    /// Whether the role may use the accounting and reporting routes.
    pub fn can_manage(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Viewer => "viewer",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "viewer" => Ok(Role::Viewer),
            other => Err(Error::Validation(format!("unknown role \"{other}\""))),
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A user account joined with the owning person's name.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    /// The person code, also the user's ID.
    pub per_code: String,
    pub username: String,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub avatar: Option<String>,
    pub is_active: bool,
    /// `"{perName} {perLastName}"`, trimmed.
    pub display_name: String,
}

/// The user as shown to clients after logging in or registering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub usr_per_code: String,
    pub usr_username: String,
    pub usr_role: Role,
    pub usr_name: String,
    pub usr_avatar: Option<String>,
}

impl From<&UserAccount> for UserProfile {
    fn from(user: &UserAccount) -> Self {
        let usr_name = if user.display_name.is_empty() {
            user.username.clone()
        } else {
            user.display_name.clone()
        };

        Self {
            usr_per_code: user.per_code.clone(),
            usr_username: user.username.clone(),
            usr_role: user.role,
            usr_name,
            usr_avatar: user.avatar.clone(),
        }
    }
}

pub fn create_user_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_account (
            usr_per_code TEXT PRIMARY KEY REFERENCES person(per_code) ON DELETE CASCADE,
            usr_username TEXT NOT NULL UNIQUE,
            usr_password TEXT NOT NULL,
            usr_role TEXT NOT NULL DEFAULT 'viewer',
            usr_avatar TEXT,
            usr_is_active INTEGER NOT NULL DEFAULT 1
        )",
        (),
    )?;

    Ok(())
}

const SELECT_USER: &str = "SELECT u.usr_per_code, u.usr_username, u.usr_password, u.usr_role,
        u.usr_avatar, u.usr_is_active,
        TRIM(COALESCE(p.per_name, '') || ' ' || COALESCE(p.per_last_name, ''))
    FROM user_account u
    LEFT JOIN person p ON p.per_code = u.usr_per_code";

fn map_user_row(row: &Row) -> Result<UserAccount, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(UserAccount {
        per_code: row.get(0)?,
        username: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        role: row.get(3)?,
        avatar: row.get(4)?,
        is_active: row.get(5)?,
        display_name: row.get(6)?,
    })
}

/// Get a user by their username.
///
/// # Errors
/// Returns [Error::NotFound] if no user has the username.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<UserAccount, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE u.usr_username = :username"))?
        .query_row(&[(":username", &username)], map_user_row)
        .map_err(Error::from)
}

/// Whether a user with `username` exists.
pub fn username_exists(username: &str, connection: &Connection) -> Result<bool, Error> {
    let found = connection
        .query_row(
            "SELECT 1 FROM user_account WHERE usr_username = ?1",
            [username],
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

/// Insert a user account for an existing person.
pub fn insert_user_account(
    per_code: &str,
    username: &str,
    password_hash: &PasswordHash,
    role: Role,
    avatar: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_account (usr_per_code, usr_username, usr_password, usr_role, usr_avatar)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (per_code, username, password_hash.as_str(), role, avatar),
    )?;

    Ok(())
}

/// Replace the password hash of the user with `username`.
///
/// # Errors
/// Returns [Error::NotFound] if no user has the username.
pub fn update_password(
    username: &str,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user_account SET usr_password = ?1 WHERE usr_username = ?2",
        (password_hash.as_str(), username),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{PasswordHash, Role, UserProfile},
        db::initialize,
    };

    use super::{get_user_by_username, insert_user_account, update_password, username_exists};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
            .execute(
                "INSERT INTO person (per_code, per_name, per_last_name, per_created_at)
                VALUES ('P001', 'Sara', 'Karimi', '2025-01-01T00:00:00Z')",
                (),
            )
            .unwrap();
        connection
    }

    #[test]
    fn insert_and_get_user() {
        let connection = get_test_connection();
        let hash = PasswordHash::new_unchecked("hash");

        insert_user_account("P001", "sara", &hash, Role::Manager, None, &connection).unwrap();
        let user = get_user_by_username("sara", &connection).unwrap();

        assert_eq!(user.per_code, "P001");
        assert_eq!(user.role, Role::Manager);
        assert_eq!(user.display_name, "Sara Karimi");
        assert!(user.is_active);
    }

    #[test]
    fn get_missing_user_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            get_user_by_username("nobody", &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let connection = get_test_connection();
        let hash = PasswordHash::new_unchecked("hash");
        insert_user_account("P001", "sara", &hash, Role::Viewer, None, &connection).unwrap();

        assert!(username_exists("sara", &connection).unwrap());
        assert!(!username_exists("reza", &connection).unwrap());
    }

    #[test]
    fn update_password_for_missing_user_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            update_password("nobody", &PasswordHash::new_unchecked("x"), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn profile_falls_back_to_username() {
        let connection = get_test_connection();
        connection
            .execute(
                "INSERT INTO person (per_code, per_name, per_created_at)
                VALUES ('P002', '', '2025-01-01T00:00:00Z')",
                (),
            )
            .unwrap();
        let hash = PasswordHash::new_unchecked("hash");
        insert_user_account("P002", "anon", &hash, Role::Viewer, None, &connection).unwrap();

        let user = get_user_by_username("anon", &connection).unwrap();

        assert_eq!(UserProfile::from(&user).usr_name, "anon");
    }
}
