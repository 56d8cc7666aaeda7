//! People known to the system: customers, shareholders, vendors and users.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::Claims,
    db::lock_connection,
    response::{Envelope, codes, success},
};

/// A person record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub per_code: String,
    pub per_name: String,
    pub per_last_name: Option<String>,
    pub per_national_id: Option<String>,
    pub per_mobile: Option<String>,
    pub per_email: Option<String>,
    /// Comma separated roles, e.g. `customer,shareholder`.
    pub per_type_set: Option<String>,
    /// The ledger account linked to the person.
    pub per_acc_code: Option<String>,
    pub per_is_active: bool,
    pub per_created_by: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub per_created_at: OffsetDateTime,
}

/// The fields a client may set on a person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonForm {
    /// Required on create, ignored on update.
    pub per_code: Option<String>,
    pub per_name: Option<String>,
    pub per_last_name: Option<String>,
    pub per_national_id: Option<String>,
    pub per_mobile: Option<String>,
    pub per_email: Option<String>,
    pub per_type_set: Option<String>,
    pub per_acc_code: Option<String>,
    pub per_is_active: Option<bool>,
}

impl PersonForm {
    fn name(&self) -> Result<&str, Error> {
        match self.per_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(Error::MissingRequiredFields("perName".to_owned())),
        }
    }
}

pub fn create_person_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS person (
            per_code TEXT PRIMARY KEY,
            per_name TEXT NOT NULL,
            per_last_name TEXT,
            per_national_id TEXT,
            per_mobile TEXT,
            per_email TEXT,
            per_type_set TEXT,
            per_acc_code TEXT REFERENCES account(acc_code) ON DELETE SET NULL,
            per_is_active INTEGER NOT NULL DEFAULT 1,
            per_created_by TEXT,
            per_created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

const SELECT_PERSON: &str = "SELECT per_code, per_name, per_last_name, per_national_id, per_mobile,
    per_email, per_type_set, per_acc_code, per_is_active, per_created_by, per_created_at
    FROM person";

pub fn map_row_to_person(row: &Row) -> Result<Person, rusqlite::Error> {
    Ok(Person {
        per_code: row.get(0)?,
        per_name: row.get(1)?,
        per_last_name: row.get(2)?,
        per_national_id: row.get(3)?,
        per_mobile: row.get(4)?,
        per_email: row.get(5)?,
        per_type_set: row.get(6)?,
        per_acc_code: row.get(7)?,
        per_is_active: row.get(8)?,
        per_created_by: row.get(9)?,
        per_created_at: row.get(10)?,
    })
}

/// Insert a person.
///
/// # Errors
/// Returns [Error::MissingRequiredFields] if the code or name is missing,
/// [Error::DuplicateRecord] if the code is taken.
pub fn create_person(
    form: &PersonForm,
    created_by: &str,
    connection: &Connection,
) -> Result<Person, Error> {
    let per_code = match form.per_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => return Err(Error::MissingRequiredFields("perCode".to_owned())),
    };
    let per_name = form.name()?;

    connection.execute(
        "INSERT INTO person (per_code, per_name, per_last_name, per_national_id, per_mobile,
            per_email, per_type_set, per_acc_code, per_is_active, per_created_by, per_created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        (
            per_code,
            per_name,
            &form.per_last_name,
            &form.per_national_id,
            &form.per_mobile,
            &form.per_email,
            &form.per_type_set,
            &form.per_acc_code,
            form.per_is_active.unwrap_or(true),
            created_by,
            OffsetDateTime::now_utc(),
        ),
    )?;

    get_person(per_code, connection)
}

pub fn get_person(per_code: &str, connection: &Connection) -> Result<Person, Error> {
    connection
        .prepare(&format!("{SELECT_PERSON} WHERE per_code = :per_code"))?
        .query_row(&[(":per_code", &per_code)], map_row_to_person)
        .map_err(Error::from)
}

pub fn get_all_persons(connection: &Connection) -> Result<Vec<Person>, Error> {
    connection
        .prepare(&format!("{SELECT_PERSON} ORDER BY per_code"))?
        .query_map([], map_row_to_person)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Replace the editable fields of a person.
pub fn update_person(
    per_code: &str,
    form: &PersonForm,
    connection: &Connection,
) -> Result<Person, Error> {
    let rows_affected = connection.execute(
        "UPDATE person SET per_name = ?1, per_last_name = ?2, per_national_id = ?3,
            per_mobile = ?4, per_email = ?5, per_type_set = ?6, per_acc_code = ?7,
            per_is_active = ?8
        WHERE per_code = ?9",
        (
            form.name()?,
            &form.per_last_name,
            &form.per_national_id,
            &form.per_mobile,
            &form.per_email,
            &form.per_type_set,
            &form.per_acc_code,
            form.per_is_active.unwrap_or(true),
            per_code,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_person(per_code, connection)
}

pub fn delete_person(per_code: &str, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM person WHERE per_code = ?1", [per_code])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// The state needed to manage persons.
#[derive(Debug, Clone)]
pub struct PersonState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PersonState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn create_person_endpoint(
    State(state): State<PersonState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<PersonForm>,
) -> Result<Json<Envelope<Person>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let person = create_person(&form, &claims.id, &connection)?;

    Ok(success(codes::RECORD_CREATED, person))
}

pub async fn get_persons_endpoint(
    State(state): State<PersonState>,
) -> Result<Json<Envelope<Vec<Person>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(codes::PERSON_LIST, get_all_persons(&connection)?))
}

pub async fn get_person_endpoint(
    State(state): State<PersonState>,
    Path(per_code): Path<String>,
) -> Result<Json<Envelope<Person>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::PERSON_DETAIL,
        get_person(&per_code, &connection)?,
    ))
}

pub async fn update_person_endpoint(
    State(state): State<PersonState>,
    Path(per_code): Path<String>,
    Json(form): Json<PersonForm>,
) -> Result<Json<Envelope<Person>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let person = update_person(&per_code, &form, &connection)?;

    Ok(success(codes::RECORD_UPDATED, person))
}

pub async fn delete_person_endpoint(
    State(state): State<PersonState>,
    Path(per_code): Path<String>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_person(&per_code, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}
