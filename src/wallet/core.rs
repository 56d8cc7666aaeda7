//! A person's wallet and its balance.

use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    db::lock_connection,
    response::{Envelope, codes, success},
    wallet::WalletState,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub wlt_per_code: String,
    pub wlt_balance: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub wlt_last_update: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletForm {
    /// Required on create, ignored on update.
    pub wlt_per_code: Option<String>,
    pub wlt_balance: Option<f64>,
}

pub fn create_wallet_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS wallet (
            wlt_per_code TEXT PRIMARY KEY REFERENCES person(per_code) ON DELETE CASCADE,
            wlt_balance REAL NOT NULL DEFAULT 0,
            wlt_last_update TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

const SELECT_WALLET: &str = "SELECT wlt_per_code, wlt_balance, wlt_last_update FROM wallet";

pub fn map_row_to_wallet(row: &Row) -> Result<Wallet, rusqlite::Error> {
    Ok(Wallet {
        wlt_per_code: row.get(0)?,
        wlt_balance: row.get(1)?,
        wlt_last_update: row.get(2)?,
    })
}

/// Give `per_code` an empty wallet.
pub fn open_wallet(per_code: &str, connection: &Connection) -> Result<Wallet, Error> {
    create_wallet(
        &WalletForm {
            wlt_per_code: Some(per_code.to_owned()),
            wlt_balance: Some(0.0),
        },
        connection,
    )
}

pub fn create_wallet(form: &WalletForm, connection: &Connection) -> Result<Wallet, Error> {
    let per_code = match form.wlt_per_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => return Err(Error::MissingRequiredFields("wltPerCode".to_owned())),
    };

    connection.execute(
        "INSERT INTO wallet (wlt_per_code, wlt_balance, wlt_last_update) VALUES (?1, ?2, ?3)",
        (
            per_code,
            form.wlt_balance.unwrap_or(0.0),
            OffsetDateTime::now_utc(),
        ),
    )?;

    get_wallet(per_code, connection)
}

pub fn get_wallet(per_code: &str, connection: &Connection) -> Result<Wallet, Error> {
    connection
        .prepare(&format!("{SELECT_WALLET} WHERE wlt_per_code = :per_code"))?
        .query_row(&[(":per_code", &per_code)], map_row_to_wallet)
        .map_err(Error::from)
}

pub fn get_all_wallets(connection: &Connection) -> Result<Vec<Wallet>, Error> {
    connection
        .prepare(&format!("{SELECT_WALLET} ORDER BY wlt_per_code"))?
        .query_map([], map_row_to_wallet)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn update_wallet(
    per_code: &str,
    form: &WalletForm,
    connection: &Connection,
) -> Result<Wallet, Error> {
    let rows_affected = connection.execute(
        "UPDATE wallet SET wlt_balance = ?1, wlt_last_update = ?2 WHERE wlt_per_code = ?3",
        (
            form.wlt_balance.unwrap_or(0.0),
            OffsetDateTime::now_utc(),
            per_code,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_wallet(per_code, connection)
}

pub fn delete_wallet(per_code: &str, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM wallet WHERE wlt_per_code = ?1", [per_code])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub async fn create_wallet_endpoint(
    State(state): State<WalletState>,
    Json(form): Json<WalletForm>,
) -> Result<Json<Envelope<Wallet>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let wallet = create_wallet(&form, &connection)?;

    Ok(success(codes::RECORD_CREATED, wallet))
}

pub async fn get_wallets_endpoint(
    State(state): State<WalletState>,
) -> Result<Json<Envelope<Vec<Wallet>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(codes::WALLET_LIST, get_all_wallets(&connection)?))
}

pub async fn get_wallet_endpoint(
    State(state): State<WalletState>,
    Path(per_code): Path<String>,
) -> Result<Json<Envelope<Wallet>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::WALLET_DETAIL,
        get_wallet(&per_code, &connection)?,
    ))
}

pub async fn update_wallet_endpoint(
    State(state): State<WalletState>,
    Path(per_code): Path<String>,
    Json(form): Json<WalletForm>,
) -> Result<Json<Envelope<Wallet>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let wallet = update_wallet(&per_code, &form, &connection)?;

    Ok(success(codes::RECORD_UPDATED, wallet))
}

pub async fn delete_wallet_endpoint(
    State(state): State<WalletState>,
    Path(per_code): Path<String>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_wallet(&per_code, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}
