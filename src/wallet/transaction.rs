//! Deposits into and withdrawals from wallets.

use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    db::lock_connection,
    response::{Envelope, codes, success},
    wallet::WalletState,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub wtx_id: i64,
    pub wtx_per_code: String,
    pub wtx_amount: f64,
    /// e.g. `deposit`, `withdraw`, `payment`.
    pub wtx_type: String,
    pub wtx_date: Option<Date>,
    pub wtx_desc: Option<String>,
    /// The document that caused the transaction, such as a reservation.
    pub wtx_ref_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransactionForm {
    pub wtx_per_code: Option<String>,
    pub wtx_amount: Option<f64>,
    pub wtx_type: Option<String>,
    pub wtx_date: Option<Date>,
    pub wtx_desc: Option<String>,
    pub wtx_ref_code: Option<String>,
}

impl WalletTransactionForm {
    fn validate(&self) -> Result<(&str, f64, &str), Error> {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .is_some_and(|value| !value.is_empty())
        };

        let mut missing = Vec::new();
        if !text(&self.wtx_per_code) {
            missing.push("wtxPerCode");
        }
        if self.wtx_amount.is_none() {
            missing.push("wtxAmount");
        }
        if !text(&self.wtx_type) {
            missing.push("wtxType");
        }

        match (&self.wtx_per_code, self.wtx_amount, &self.wtx_type) {
            (Some(per_code), Some(amount), Some(wtx_type)) if missing.is_empty() => {
                Ok((per_code.trim(), amount, wtx_type.trim()))
            }
            _ => Err(Error::MissingRequiredFields(missing.join(", "))),
        }
    }
}

pub fn create_wallet_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS wallet_transaction (
            wtx_id INTEGER PRIMARY KEY,
            wtx_per_code TEXT NOT NULL REFERENCES wallet(wlt_per_code) ON DELETE CASCADE,
            wtx_amount REAL NOT NULL,
            wtx_type TEXT NOT NULL,
            wtx_date TEXT,
            wtx_desc TEXT,
            wtx_ref_code TEXT
        )",
        (),
    )?;

    Ok(())
}

const SELECT_WALLET_TRANSACTION: &str = "SELECT wtx_id, wtx_per_code, wtx_amount, wtx_type,
    wtx_date, wtx_desc, wtx_ref_code
    FROM wallet_transaction";

pub fn map_row_to_wallet_transaction(row: &Row) -> Result<WalletTransaction, rusqlite::Error> {
    Ok(WalletTransaction {
        wtx_id: row.get(0)?,
        wtx_per_code: row.get(1)?,
        wtx_amount: row.get(2)?,
        wtx_type: row.get(3)?,
        wtx_date: row.get(4)?,
        wtx_desc: row.get(5)?,
        wtx_ref_code: row.get(6)?,
    })
}

pub fn create_wallet_transaction(
    form: &WalletTransactionForm,
    connection: &Connection,
) -> Result<WalletTransaction, Error> {
    let (per_code, amount, wtx_type) = form.validate()?;

    connection.execute(
        "INSERT INTO wallet_transaction (wtx_per_code, wtx_amount, wtx_type, wtx_date, wtx_desc,
            wtx_ref_code)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            per_code,
            amount,
            wtx_type,
            form.wtx_date,
            &form.wtx_desc,
            &form.wtx_ref_code,
        ),
    )?;

    get_wallet_transaction(connection.last_insert_rowid(), connection)
}

pub fn get_wallet_transaction(
    wtx_id: i64,
    connection: &Connection,
) -> Result<WalletTransaction, Error> {
    connection
        .prepare(&format!("{SELECT_WALLET_TRANSACTION} WHERE wtx_id = :wtx_id"))?
        .query_row(&[(":wtx_id", &wtx_id)], map_row_to_wallet_transaction)
        .map_err(Error::from)
}

pub fn get_all_wallet_transactions(
    connection: &Connection,
) -> Result<Vec<WalletTransaction>, Error> {
    connection
        .prepare(&format!("{SELECT_WALLET_TRANSACTION} ORDER BY wtx_id"))?
        .query_map([], map_row_to_wallet_transaction)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn update_wallet_transaction(
    wtx_id: i64,
    form: &WalletTransactionForm,
    connection: &Connection,
) -> Result<WalletTransaction, Error> {
    let (per_code, amount, wtx_type) = form.validate()?;

    let rows_affected = connection.execute(
        "UPDATE wallet_transaction SET wtx_per_code = ?1, wtx_amount = ?2, wtx_type = ?3,
            wtx_date = ?4, wtx_desc = ?5, wtx_ref_code = ?6
        WHERE wtx_id = ?7",
        (
            per_code,
            amount,
            wtx_type,
            form.wtx_date,
            &form.wtx_desc,
            &form.wtx_ref_code,
            wtx_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_wallet_transaction(wtx_id, connection)
}

pub fn delete_wallet_transaction(wtx_id: i64, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM wallet_transaction WHERE wtx_id = ?1",
        [wtx_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub async fn create_wallet_transaction_endpoint(
    State(state): State<WalletState>,
    Json(form): Json<WalletTransactionForm>,
) -> Result<Json<Envelope<WalletTransaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_wallet_transaction(&form, &connection)?;

    Ok(success(codes::RECORD_CREATED, transaction))
}

pub async fn get_wallet_transactions_endpoint(
    State(state): State<WalletState>,
) -> Result<Json<Envelope<Vec<WalletTransaction>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::WALLET_TRANSACTION_LIST,
        get_all_wallet_transactions(&connection)?,
    ))
}

pub async fn get_wallet_transaction_endpoint(
    State(state): State<WalletState>,
    Path(wtx_id): Path<i64>,
) -> Result<Json<Envelope<WalletTransaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::WALLET_TRANSACTION_DETAIL,
        get_wallet_transaction(wtx_id, &connection)?,
    ))
}

pub async fn update_wallet_transaction_endpoint(
    State(state): State<WalletState>,
    Path(wtx_id): Path<i64>,
    Json(form): Json<WalletTransactionForm>,
) -> Result<Json<Envelope<WalletTransaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transaction = update_wallet_transaction(wtx_id, &form, &connection)?;

    Ok(success(codes::RECORD_UPDATED, transaction))
}

pub async fn delete_wallet_transaction_endpoint(
    State(state): State<WalletState>,
    Path(wtx_id): Path<i64>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_wallet_transaction(wtx_id, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        wallet::{open_wallet, tests::get_test_connection},
    };

    use super::{
        WalletTransactionForm, create_wallet_transaction, delete_wallet_transaction,
        get_all_wallet_transactions, update_wallet_transaction,
    };

    fn form(per_code: &str, amount: f64) -> WalletTransactionForm {
        WalletTransactionForm {
            wtx_per_code: Some(per_code.to_owned()),
            wtx_amount: Some(amount),
            wtx_type: Some("deposit".to_owned()),
            wtx_date: Some(date!(2025 - 03 - 01)),
            ..Default::default()
        }
    }

    #[test]
    fn create_update_delete() {
        let connection = get_test_connection();
        open_wallet("P001", &connection).unwrap();

        let created = create_wallet_transaction(&form("P001", 50.0), &connection).unwrap();
        assert_eq!(created.wtx_type, "deposit");

        let updated =
            update_wallet_transaction(created.wtx_id, &form("P001", 60.0), &connection).unwrap();
        assert_eq!(updated.wtx_amount, 60.0);

        delete_wallet_transaction(created.wtx_id, &connection).unwrap();
        assert_eq!(get_all_wallet_transactions(&connection), Ok(vec![]));
    }

    #[test]
    fn transaction_needs_existing_wallet() {
        let connection = get_test_connection();

        assert_eq!(
            create_wallet_transaction(&form("P001", 50.0), &connection),
            Err(Error::InvalidForeignKey)
        );
    }

    #[test]
    fn missing_fields_are_listed() {
        let connection = get_test_connection();

        assert_eq!(
            create_wallet_transaction(&WalletTransactionForm::default(), &connection),
            Err(Error::MissingRequiredFields(
                "wtxPerCode, wtxAmount, wtxType".to_owned()
            ))
        );
    }
}
