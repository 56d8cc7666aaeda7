//! The shares a person holds in a project.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::Claims,
    db::lock_connection,
    response::{Envelope, codes, success},
    share::{ShareState, required_code},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shareholding {
    pub shr_id: i64,
    pub shr_per_code: String,
    pub shr_prj_code: String,
    pub shr_shares: f64,
    pub shr_unit_price: f64,
    pub shr_total_value: f64,
    pub shr_from_date: Option<Date>,
    pub shr_to_date: Option<Date>,
    pub shr_is_active: bool,
    pub shr_created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareholdingForm {
    pub shr_per_code: Option<String>,
    pub shr_prj_code: Option<String>,
    pub shr_shares: Option<f64>,
    pub shr_unit_price: Option<f64>,
    /// Shares times unit price when absent.
    pub shr_total_value: Option<f64>,
    pub shr_from_date: Option<Date>,
    pub shr_to_date: Option<Date>,
    pub shr_is_active: Option<bool>,
}

impl ShareholdingForm {
    fn amounts(&self) -> (f64, f64, f64) {
        let shares = self.shr_shares.unwrap_or(0.0);
        let unit_price = self.shr_unit_price.unwrap_or(0.0);
        let total_value = self.shr_total_value.unwrap_or(shares * unit_price);

        (shares, unit_price, total_value)
    }
}

pub fn create_shareholding_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS shareholding (
            shr_id INTEGER PRIMARY KEY,
            shr_per_code TEXT NOT NULL REFERENCES person(per_code),
            shr_prj_code TEXT NOT NULL REFERENCES project(prj_code),
            shr_shares REAL NOT NULL DEFAULT 0,
            shr_unit_price REAL NOT NULL DEFAULT 0,
            shr_total_value REAL NOT NULL DEFAULT 0,
            shr_from_date TEXT,
            shr_to_date TEXT,
            shr_is_active INTEGER NOT NULL DEFAULT 1,
            shr_created_by TEXT
        )",
        (),
    )?;

    Ok(())
}

const SELECT_SHAREHOLDING: &str = "SELECT shr_id, shr_per_code, shr_prj_code, shr_shares,
    shr_unit_price, shr_total_value, shr_from_date, shr_to_date, shr_is_active, shr_created_by
    FROM shareholding";

pub fn map_row_to_shareholding(row: &Row) -> Result<Shareholding, rusqlite::Error> {
    Ok(Shareholding {
        shr_id: row.get(0)?,
        shr_per_code: row.get(1)?,
        shr_prj_code: row.get(2)?,
        shr_shares: row.get(3)?,
        shr_unit_price: row.get(4)?,
        shr_total_value: row.get(5)?,
        shr_from_date: row.get(6)?,
        shr_to_date: row.get(7)?,
        shr_is_active: row.get(8)?,
        shr_created_by: row.get(9)?,
    })
}

pub fn create_shareholding(
    form: &ShareholdingForm,
    created_by: &str,
    connection: &Connection,
) -> Result<Shareholding, Error> {
    let per_code = required_code(&form.shr_per_code, "shrPerCode")?;
    let prj_code = required_code(&form.shr_prj_code, "shrPrjCode")?;
    let (shares, unit_price, total_value) = form.amounts();

    connection.execute(
        "INSERT INTO shareholding (shr_per_code, shr_prj_code, shr_shares, shr_unit_price,
            shr_total_value, shr_from_date, shr_to_date, shr_is_active, shr_created_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            per_code,
            prj_code,
            shares,
            unit_price,
            total_value,
            form.shr_from_date,
            form.shr_to_date,
            form.shr_is_active.unwrap_or(true),
            created_by,
        ),
    )?;

    get_shareholding(connection.last_insert_rowid(), connection)
}

pub fn get_shareholding(shr_id: i64, connection: &Connection) -> Result<Shareholding, Error> {
    connection
        .prepare(&format!("{SELECT_SHAREHOLDING} WHERE shr_id = :shr_id"))?
        .query_row(&[(":shr_id", &shr_id)], map_row_to_shareholding)
        .map_err(Error::from)
}

pub fn get_all_shareholdings(connection: &Connection) -> Result<Vec<Shareholding>, Error> {
    connection
        .prepare(&format!("{SELECT_SHAREHOLDING} ORDER BY shr_id"))?
        .query_map([], map_row_to_shareholding)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn update_shareholding(
    shr_id: i64,
    form: &ShareholdingForm,
    connection: &Connection,
) -> Result<Shareholding, Error> {
    let per_code = required_code(&form.shr_per_code, "shrPerCode")?;
    let prj_code = required_code(&form.shr_prj_code, "shrPrjCode")?;
    let (shares, unit_price, total_value) = form.amounts();

    let rows_affected = connection.execute(
        "UPDATE shareholding SET shr_per_code = ?1, shr_prj_code = ?2, shr_shares = ?3,
            shr_unit_price = ?4, shr_total_value = ?5, shr_from_date = ?6, shr_to_date = ?7,
            shr_is_active = ?8
        WHERE shr_id = ?9",
        (
            per_code,
            prj_code,
            shares,
            unit_price,
            total_value,
            form.shr_from_date,
            form.shr_to_date,
            form.shr_is_active.unwrap_or(true),
            shr_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_shareholding(shr_id, connection)
}

pub fn delete_shareholding(shr_id: i64, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM shareholding WHERE shr_id = ?1", [shr_id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub async fn create_shareholding_endpoint(
    State(state): State<ShareState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<ShareholdingForm>,
) -> Result<Json<Envelope<Shareholding>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let shareholding = create_shareholding(&form, &claims.id, &connection)?;

    Ok(success(codes::RECORD_CREATED, shareholding))
}

pub async fn get_shareholdings_endpoint(
    State(state): State<ShareState>,
) -> Result<Json<Envelope<Vec<Shareholding>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::SHAREHOLDING_LIST,
        get_all_shareholdings(&connection)?,
    ))
}

pub async fn get_shareholding_endpoint(
    State(state): State<ShareState>,
    Path(shr_id): Path<i64>,
) -> Result<Json<Envelope<Shareholding>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::SHAREHOLDING_DETAIL,
        get_shareholding(shr_id, &connection)?,
    ))
}

pub async fn update_shareholding_endpoint(
    State(state): State<ShareState>,
    Path(shr_id): Path<i64>,
    Json(form): Json<ShareholdingForm>,
) -> Result<Json<Envelope<Shareholding>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let shareholding = update_shareholding(shr_id, &form, &connection)?;

    Ok(success(codes::RECORD_UPDATED, shareholding))
}

pub async fn delete_shareholding_endpoint(
    State(state): State<ShareState>,
    Path(shr_id): Path<i64>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_shareholding(shr_id, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}

#[cfg(test)]
mod tests {
    use crate::{Error, share::tests::get_test_connection};

    use super::{
        ShareholdingForm, create_shareholding, delete_shareholding, get_shareholding,
        update_shareholding,
    };

    fn form() -> ShareholdingForm {
        ShareholdingForm {
            shr_per_code: Some("P001".to_owned()),
            shr_prj_code: Some("PRJ1".to_owned()),
            shr_shares: Some(10.0),
            shr_unit_price: Some(2.5),
            ..Default::default()
        }
    }

    #[test]
    fn total_value_defaults_to_shares_times_price() {
        let connection = get_test_connection();

        let shareholding = create_shareholding(&form(), "SabaAdmin", &connection).unwrap();

        assert_eq!(shareholding.shr_total_value, 25.0);
        assert!(shareholding.shr_is_active);
    }

    #[test]
    fn unknown_person_is_invalid_foreign_key() {
        let connection = get_test_connection();
        let mut form = form();
        form.shr_per_code = Some("P404".to_owned());

        assert_eq!(
            create_shareholding(&form, "SabaAdmin", &connection),
            Err(Error::InvalidForeignKey)
        );
    }

    #[test]
    fn update_then_delete() {
        let connection = get_test_connection();
        let created = create_shareholding(&form(), "SabaAdmin", &connection).unwrap();
        let mut changed = form();
        changed.shr_total_value = Some(30.0);

        let updated = update_shareholding(created.shr_id, &changed, &connection).unwrap();
        assert_eq!(updated.shr_total_value, 30.0);

        delete_shareholding(created.shr_id, &connection).unwrap();
        assert_eq!(
            get_shareholding(created.shr_id, &connection),
            Err(Error::NotFound)
        );
    }
}
