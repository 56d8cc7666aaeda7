//! Transfers of project shares between persons.

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
pub struct ShareTransfer {
    pub stf_id: i64,
    pub stf_prj_code: String,
    pub stf_from_per_code: String,
    pub stf_to_per_code: String,
    pub stf_shares: f64,
    pub stf_unit_price: f64,
    pub stf_date: Option<Date>,
    pub stf_desc: Option<String>,
    pub stf_created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTransferForm {
    pub stf_prj_code: Option<String>,
    pub stf_from_per_code: Option<String>,
    pub stf_to_per_code: Option<String>,
    pub stf_shares: Option<f64>,
    pub stf_unit_price: Option<f64>,
    pub stf_date: Option<Date>,
    pub stf_desc: Option<String>,
}

struct ValidTransfer<'a> {
    prj_code: &'a str,
    from_per_code: &'a str,
    to_per_code: &'a str,
}

impl ShareTransferForm {
    fn validate(&self) -> Result<ValidTransfer<'_>, Error> {
        let transfer = ValidTransfer {
            prj_code: required_code(&self.stf_prj_code, "stfPrjCode")?,
            from_per_code: required_code(&self.stf_from_per_code, "stfFromPerCode")?,
            to_per_code: required_code(&self.stf_to_per_code, "stfToPerCode")?,
        };

        if transfer.from_per_code == transfer.to_per_code {
            return Err(Error::Validation(
                "a person cannot transfer shares to themselves".to_owned(),
            ));
        }

        Ok(transfer)
    }
}

pub fn create_share_transfer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS share_transfer (
            stf_id INTEGER PRIMARY KEY,
            stf_prj_code TEXT NOT NULL REFERENCES project(prj_code),
            stf_from_per_code TEXT NOT NULL REFERENCES person(per_code),
            stf_to_per_code TEXT NOT NULL REFERENCES person(per_code),
            stf_shares REAL NOT NULL DEFAULT 0,
            stf_unit_price REAL NOT NULL DEFAULT 0,
            stf_date TEXT,
            stf_desc TEXT,
            stf_created_by TEXT
        )",
        (),
    )?;

    Ok(())
}

const SELECT_SHARE_TRANSFER: &str = "SELECT stf_id, stf_prj_code, stf_from_per_code,
    stf_to_per_code, stf_shares, stf_unit_price, stf_date, stf_desc, stf_created_by
    FROM share_transfer";

pub fn map_row_to_share_transfer(row: &Row) -> Result<ShareTransfer, rusqlite::Error> {
    Ok(ShareTransfer {
        stf_id: row.get(0)?,
        stf_prj_code: row.get(1)?,
        stf_from_per_code: row.get(2)?,
        stf_to_per_code: row.get(3)?,
        stf_shares: row.get(4)?,
        stf_unit_price: row.get(5)?,
        stf_date: row.get(6)?,
        stf_desc: row.get(7)?,
        stf_created_by: row.get(8)?,
    })
}

pub fn create_share_transfer(
    form: &ShareTransferForm,
    created_by: &str,
    connection: &Connection,
) -> Result<ShareTransfer, Error> {
    let transfer = form.validate()?;

    connection.execute(
        "INSERT INTO share_transfer (stf_prj_code, stf_from_per_code, stf_to_per_code,
            stf_shares, stf_unit_price, stf_date, stf_desc, stf_created_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            transfer.prj_code,
            transfer.from_per_code,
            transfer.to_per_code,
            form.stf_shares.unwrap_or(0.0),
            form.stf_unit_price.unwrap_or(0.0),
            form.stf_date,
            &form.stf_desc,
            created_by,
        ),
    )?;

    get_share_transfer(connection.last_insert_rowid(), connection)
}

pub fn get_share_transfer(stf_id: i64, connection: &Connection) -> Result<ShareTransfer, Error> {
    connection
        .prepare(&format!("{SELECT_SHARE_TRANSFER} WHERE stf_id = :stf_id"))?
        .query_row(&[(":stf_id", &stf_id)], map_row_to_share_transfer)
        .map_err(Error::from)
}

pub fn get_all_share_transfers(connection: &Connection) -> Result<Vec<ShareTransfer>, Error> {
    connection
        .prepare(&format!("{SELECT_SHARE_TRANSFER} ORDER BY stf_id"))?
        .query_map([], map_row_to_share_transfer)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn update_share_transfer(
    stf_id: i64,
    form: &ShareTransferForm,
    connection: &Connection,
) -> Result<ShareTransfer, Error> {
    let transfer = form.validate()?;

    let rows_affected = connection.execute(
        "UPDATE share_transfer SET stf_prj_code = ?1, stf_from_per_code = ?2,
            stf_to_per_code = ?3, stf_shares = ?4, stf_unit_price = ?5, stf_date = ?6,
            stf_desc = ?7
        WHERE stf_id = ?8",
        (
            transfer.prj_code,
            transfer.from_per_code,
            transfer.to_per_code,
            form.stf_shares.unwrap_or(0.0),
            form.stf_unit_price.unwrap_or(0.0),
            form.stf_date,
            &form.stf_desc,
            stf_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_share_transfer(stf_id, connection)
}

pub fn delete_share_transfer(stf_id: i64, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM share_transfer WHERE stf_id = ?1", [stf_id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub async fn create_share_transfer_endpoint(
    State(state): State<ShareState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<ShareTransferForm>,
) -> Result<Json<Envelope<ShareTransfer>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transfer = create_share_transfer(&form, &claims.id, &connection)?;

    Ok(success(codes::RECORD_CREATED, transfer))
}

pub async fn get_share_transfers_endpoint(
    State(state): State<ShareState>,
) -> Result<Json<Envelope<Vec<ShareTransfer>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::SHARE_TRANSFER_LIST,
        get_all_share_transfers(&connection)?,
    ))
}

pub async fn get_share_transfer_endpoint(
    State(state): State<ShareState>,
    Path(stf_id): Path<i64>,
) -> Result<Json<Envelope<ShareTransfer>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::SHARE_TRANSFER_DETAIL,
        get_share_transfer(stf_id, &connection)?,
    ))
}

pub async fn update_share_transfer_endpoint(
    State(state): State<ShareState>,
    Path(stf_id): Path<i64>,
    Json(form): Json<ShareTransferForm>,
) -> Result<Json<Envelope<ShareTransfer>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transfer = update_share_transfer(stf_id, &form, &connection)?;

    Ok(success(codes::RECORD_UPDATED, transfer))
}

pub async fn delete_share_transfer_endpoint(
    State(state): State<ShareState>,
    Path(stf_id): Path<i64>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_share_transfer(stf_id, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}
