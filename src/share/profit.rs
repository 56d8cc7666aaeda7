//! Profit paid out to shareholders.

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
pub struct ShareProfit {
    pub spt_id: i64,
    pub spt_prj_code: String,
    pub spt_per_code: String,
    pub spt_amount: f64,
    pub spt_date: Option<Date>,
    pub spt_desc: Option<String>,
    pub spt_created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareProfitForm {
    pub spt_prj_code: Option<String>,
    pub spt_per_code: Option<String>,
    pub spt_amount: Option<f64>,
    pub spt_date: Option<Date>,
    pub spt_desc: Option<String>,
}

pub fn create_share_profit_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS share_profit (
            spt_id INTEGER PRIMARY KEY,
            spt_prj_code TEXT NOT NULL REFERENCES project(prj_code),
            spt_per_code TEXT NOT NULL REFERENCES person(per_code),
            spt_amount REAL NOT NULL DEFAULT 0,
            spt_date TEXT,
            spt_desc TEXT,
            spt_created_by TEXT
        )",
        (),
    )?;

    Ok(())
}

const SELECT_SHARE_PROFIT: &str = "SELECT spt_id, spt_prj_code, spt_per_code, spt_amount,
    spt_date, spt_desc, spt_created_by
    FROM share_profit";

pub fn map_row_to_share_profit(row: &Row) -> Result<ShareProfit, rusqlite::Error> {
    Ok(ShareProfit {
        spt_id: row.get(0)?,
        spt_prj_code: row.get(1)?,
        spt_per_code: row.get(2)?,
        spt_amount: row.get(3)?,
        spt_date: row.get(4)?,
        spt_desc: row.get(5)?,
        spt_created_by: row.get(6)?,
    })
}

pub fn create_share_profit(
    form: &ShareProfitForm,
    created_by: &str,
    connection: &Connection,
) -> Result<ShareProfit, Error> {
    connection.execute(
        "INSERT INTO share_profit (spt_prj_code, spt_per_code, spt_amount, spt_date, spt_desc,
            spt_created_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            required_code(&form.spt_prj_code, "sptPrjCode")?,
            required_code(&form.spt_per_code, "sptPerCode")?,
            form.spt_amount.unwrap_or(0.0),
            form.spt_date,
            &form.spt_desc,
            created_by,
        ),
    )?;

    get_share_profit(connection.last_insert_rowid(), connection)
}

pub fn get_share_profit(spt_id: i64, connection: &Connection) -> Result<ShareProfit, Error> {
    connection
        .prepare(&format!("{SELECT_SHARE_PROFIT} WHERE spt_id = :spt_id"))?
        .query_row(&[(":spt_id", &spt_id)], map_row_to_share_profit)
        .map_err(Error::from)
}

pub fn get_all_share_profits(connection: &Connection) -> Result<Vec<ShareProfit>, Error> {
    connection
        .prepare(&format!("{SELECT_SHARE_PROFIT} ORDER BY spt_id"))?
        .query_map([], map_row_to_share_profit)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn update_share_profit(
    spt_id: i64,
    form: &ShareProfitForm,
    connection: &Connection,
) -> Result<ShareProfit, Error> {
    let rows_affected = connection.execute(
        "UPDATE share_profit SET spt_prj_code = ?1, spt_per_code = ?2, spt_amount = ?3,
            spt_date = ?4, spt_desc = ?5
        WHERE spt_id = ?6",
        (
            required_code(&form.spt_prj_code, "sptPrjCode")?,
            required_code(&form.spt_per_code, "sptPerCode")?,
            form.spt_amount.unwrap_or(0.0),
            form.spt_date,
            &form.spt_desc,
            spt_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_share_profit(spt_id, connection)
}

pub fn delete_share_profit(spt_id: i64, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM share_profit WHERE spt_id = ?1", [spt_id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub async fn create_share_profit_endpoint(
    State(state): State<ShareState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<ShareProfitForm>,
) -> Result<Json<Envelope<ShareProfit>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let profit = create_share_profit(&form, &claims.id, &connection)?;

    Ok(success(codes::RECORD_CREATED, profit))
}

pub async fn get_share_profits_endpoint(
    State(state): State<ShareState>,
) -> Result<Json<Envelope<Vec<ShareProfit>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::SHARE_PROFIT_LIST,
        get_all_share_profits(&connection)?,
    ))
}

pub async fn get_share_profit_endpoint(
    State(state): State<ShareState>,
    Path(spt_id): Path<i64>,
) -> Result<Json<Envelope<ShareProfit>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::SHARE_PROFIT_DETAIL,
        get_share_profit(spt_id, &connection)?,
    ))
}

pub async fn update_share_profit_endpoint(
    State(state): State<ShareState>,
    Path(spt_id): Path<i64>,
    Json(form): Json<ShareProfitForm>,
) -> Result<Json<Envelope<ShareProfit>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let profit = update_share_profit(spt_id, &form, &connection)?;

    Ok(success(codes::RECORD_UPDATED, profit))
}

pub async fn delete_share_profit_endpoint(
    State(state): State<ShareState>,
    Path(spt_id): Path<i64>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_share_profit(spt_id, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}
