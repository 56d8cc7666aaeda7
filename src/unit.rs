//! Units: rooms or apartments within a project, keyed by project and unit code.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::{Connection, Row, named_params};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::Claims,
    db::lock_connection,
    response::{Envelope, codes, success},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub unt_prj_code: String,
    pub unt_code: String,
    pub unt_title: String,
    pub unt_type: Option<String>,
    pub unt_area: Option<f64>,
    pub unt_capacity: Option<i64>,
    pub unt_floor: Option<i64>,
    pub unt_block: Option<String>,
    pub unt_is_active: bool,
    pub unt_created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitForm {
    /// Required on create, ignored on update.
    pub unt_prj_code: Option<String>,
    /// Required on create, ignored on update.
    pub unt_code: Option<String>,
    pub unt_title: Option<String>,
    pub unt_type: Option<String>,
    pub unt_area: Option<f64>,
    pub unt_capacity: Option<i64>,
    pub unt_floor: Option<i64>,
    pub unt_block: Option<String>,
    pub unt_is_active: Option<bool>,
}

impl UnitForm {
    fn title(&self) -> Result<&str, Error> {
        match self.unt_title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => Ok(title),
            _ => Err(Error::MissingRequiredFields("untTitle".to_owned())),
        }
    }
}

pub fn create_unit_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS unit (
            unt_prj_code TEXT NOT NULL REFERENCES project(prj_code) ON DELETE CASCADE,
            unt_code TEXT NOT NULL,
            unt_title TEXT NOT NULL,
            unt_type TEXT,
            unt_area REAL,
            unt_capacity INTEGER,
            unt_floor INTEGER,
            unt_block TEXT,
            unt_is_active INTEGER NOT NULL DEFAULT 1,
            unt_created_by TEXT,
            PRIMARY KEY (unt_prj_code, unt_code)
        )",
        (),
    )?;

    Ok(())
}

const SELECT_UNIT: &str = "SELECT unt_prj_code, unt_code, unt_title, unt_type, unt_area,
    unt_capacity, unt_floor, unt_block, unt_is_active, unt_created_by
    FROM unit";

pub fn map_row_to_unit(row: &Row) -> Result<Unit, rusqlite::Error> {
    Ok(Unit {
        unt_prj_code: row.get(0)?,
        unt_code: row.get(1)?,
        unt_title: row.get(2)?,
        unt_type: row.get(3)?,
        unt_area: row.get(4)?,
        unt_capacity: row.get(5)?,
        unt_floor: row.get(6)?,
        unt_block: row.get(7)?,
        unt_is_active: row.get(8)?,
        unt_created_by: row.get(9)?,
    })
}

pub fn create_unit(form: &UnitForm, created_by: &str, connection: &Connection) -> Result<Unit, Error> {
    let mut missing = Vec::new();
    let prj_code = form.unt_prj_code.as_deref().map(str::trim).unwrap_or_default();
    let unt_code = form.unt_code.as_deref().map(str::trim).unwrap_or_default();

    if prj_code.is_empty() {
        missing.push("untPrjCode");
    }
    if unt_code.is_empty() {
        missing.push("untCode");
    }
    if !missing.is_empty() {
        return Err(Error::MissingRequiredFields(missing.join(", ")));
    }

    connection.execute(
        "INSERT INTO unit (unt_prj_code, unt_code, unt_title, unt_type, unt_area, unt_capacity,
            unt_floor, unt_block, unt_is_active, unt_created_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        (
            prj_code,
            unt_code,
            form.title()?,
            &form.unt_type,
            form.unt_area,
            form.unt_capacity,
            form.unt_floor,
            &form.unt_block,
            form.unt_is_active.unwrap_or(true),
            created_by,
        ),
    )?;

    get_unit(prj_code, unt_code, connection)
}

pub fn get_unit(prj_code: &str, unt_code: &str, connection: &Connection) -> Result<Unit, Error> {
    connection
        .prepare(&format!(
            "{SELECT_UNIT} WHERE unt_prj_code = :prj_code AND unt_code = :unt_code"
        ))?
        .query_row(
            named_params! {":prj_code": prj_code, ":unt_code": unt_code},
            map_row_to_unit,
        )
        .map_err(Error::from)
}

pub fn get_all_units(connection: &Connection) -> Result<Vec<Unit>, Error> {
    connection
        .prepare(&format!("{SELECT_UNIT} ORDER BY unt_prj_code, unt_code"))?
        .query_map([], map_row_to_unit)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn update_unit(
    prj_code: &str,
    unt_code: &str,
    form: &UnitForm,
    connection: &Connection,
) -> Result<Unit, Error> {
    let rows_affected = connection.execute(
        "UPDATE unit SET unt_title = ?1, unt_type = ?2, unt_area = ?3, unt_capacity = ?4,
            unt_floor = ?5, unt_block = ?6, unt_is_active = ?7
        WHERE unt_prj_code = ?8 AND unt_code = ?9",
        (
            form.title()?,
            &form.unt_type,
            form.unt_area,
            form.unt_capacity,
            form.unt_floor,
            &form.unt_block,
            form.unt_is_active.unwrap_or(true),
            prj_code,
            unt_code,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_unit(prj_code, unt_code, connection)
}

pub fn delete_unit(prj_code: &str, unt_code: &str, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM unit WHERE unt_prj_code = ?1 AND unt_code = ?2",
        (prj_code, unt_code),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct UnitState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UnitState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn create_unit_endpoint(
    State(state): State<UnitState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<UnitForm>,
) -> Result<Json<Envelope<Unit>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let unit = create_unit(&form, &claims.id, &connection)?;

    Ok(success(codes::RECORD_CREATED, unit))
}

pub async fn get_units_endpoint(
    State(state): State<UnitState>,
) -> Result<Json<Envelope<Vec<Unit>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(codes::UNIT_LIST, get_all_units(&connection)?))
}

pub async fn get_unit_endpoint(
    State(state): State<UnitState>,
    Path((prj_code, unt_code)): Path<(String, String)>,
) -> Result<Json<Envelope<Unit>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::UNIT_DETAIL,
        get_unit(&prj_code, &unt_code, &connection)?,
    ))
}

pub async fn update_unit_endpoint(
    State(state): State<UnitState>,
    Path((prj_code, unt_code)): Path<(String, String)>,
    Json(form): Json<UnitForm>,
) -> Result<Json<Envelope<Unit>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let unit = update_unit(&prj_code, &unt_code, &form, &connection)?;

    Ok(success(codes::RECORD_UPDATED, unit))
}

pub async fn delete_unit_endpoint(
    State(state): State<UnitState>,
    Path((prj_code, unt_code)): Path<(String, String)>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_unit(&prj_code, &unt_code, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        project::{ProjectForm, create_project},
    };

    use super::{UnitForm, create_unit, delete_unit, get_all_units, get_unit, update_unit};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_project(
            &ProjectForm {
                prj_code: Some("PRJ1".to_owned()),
                prj_title: Some("Saba Residence".to_owned()),
                ..Default::default()
            },
            "SabaAdmin",
            &connection,
        )
        .unwrap();
        connection
    }

    fn form(prj_code: &str, unt_code: &str) -> UnitForm {
        UnitForm {
            unt_prj_code: Some(prj_code.to_owned()),
            unt_code: Some(unt_code.to_owned()),
            unt_title: Some(format!("Unit {unt_code}")),
            unt_capacity: Some(4),
            ..Default::default()
        }
    }

    #[test]
    fn same_unit_code_in_other_project_is_distinct() {
        let connection = get_test_connection();
        create_project(
            &ProjectForm {
                prj_code: Some("PRJ2".to_owned()),
                prj_title: Some("Saba Villa".to_owned()),
                ..Default::default()
            },
            "SabaAdmin",
            &connection,
        )
        .unwrap();

        create_unit(&form("PRJ1", "101"), "SabaAdmin", &connection).unwrap();
        create_unit(&form("PRJ2", "101"), "SabaAdmin", &connection).unwrap();

        assert_eq!(get_all_units(&connection).unwrap().len(), 2);
        assert_eq!(
            create_unit(&form("PRJ1", "101"), "SabaAdmin", &connection),
            Err(Error::DuplicateRecord)
        );
    }

    #[test]
    fn unknown_project_is_invalid_foreign_key() {
        let connection = get_test_connection();

        assert_eq!(
            create_unit(&form("PRJ9", "101"), "SabaAdmin", &connection),
            Err(Error::InvalidForeignKey)
        );
    }

    #[test]
    fn missing_keys_are_listed() {
        let connection = get_test_connection();

        assert_eq!(
            create_unit(&UnitForm::default(), "SabaAdmin", &connection),
            Err(Error::MissingRequiredFields("untPrjCode, untCode".to_owned()))
        );
    }

    #[test]
    fn update_then_delete() {
        let connection = get_test_connection();
        create_unit(&form("PRJ1", "101"), "SabaAdmin", &connection).unwrap();
        let mut changed = form("PRJ1", "101");
        changed.unt_floor = Some(3);

        let unit = update_unit("PRJ1", "101", &changed, &connection).unwrap();
        assert_eq!(unit.unt_floor, Some(3));

        delete_unit("PRJ1", "101", &connection).unwrap();
        assert_eq!(get_unit("PRJ1", "101", &connection), Err(Error::NotFound));
        assert_eq!(
            delete_unit("PRJ1", "101", &connection),
            Err(Error::NotFound)
        );
    }
}
