//! Endpoints for the bank details of a bank account.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Error,
    account::{
        AccountBank, AccountState, BankInfoForm,
        create_endpoint::{check_bank_is_leaf, insert_bank_info},
        find_account_bank, get_account,
    },
    auth::Claims,
    db::lock_connection,
    response::{Envelope, codes, success},
};

/// Get the bank details of `acc_code`.
///
/// # Errors
/// Returns [Error::BankInfoNotFound] if the account has no bank details.
pub fn get_bank_info(acc_code: &str, connection: &Connection) -> Result<AccountBank, Error> {
    find_account_bank(acc_code, connection)?
        .ok_or_else(|| Error::BankInfoNotFound(acc_code.to_owned()))
}

/// Add bank details to an existing bank account.
///
/// # Errors
///
/// - [Error::AccountNotFound] if the account does not exist.
/// - [Error::NotBankAccount] if the account is not flagged as a bank account.
/// - [Error::GroupBankAccount] if the account is a group account.
/// - [Error::BankInfoExists] if the account already has bank details.
pub fn save_bank_info(
    acc_code: &str,
    form: &BankInfoForm,
    created_by: &str,
    connection: &Connection,
) -> Result<AccountBank, Error> {
    let account = get_account(acc_code, connection)?;

    if !account.acc_is_bank {
        return Err(Error::NotBankAccount(acc_code.to_owned()));
    }

    check_bank_is_leaf(acc_code, account.acc_is_bank, account.acc_sublevel_format)?;

    if find_account_bank(acc_code, connection)?.is_some() {
        return Err(Error::BankInfoExists(acc_code.to_owned()));
    }

    insert_bank_info(acc_code, form, created_by, connection)?;

    get_bank_info(acc_code, connection)
}

/// Overwrite the bank details given in `form`, keeping the rest.
///
/// # Errors
/// Returns [Error::BankInfoNotFound] if the account has no bank details.
pub fn update_bank_info(
    acc_code: &str,
    form: &BankInfoForm,
    updated_by: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let existing = get_bank_info(acc_code, connection)?;

    let bank_name = match form.abk_bank_name.as_deref().map(str::trim) {
        Some("") => return Err(Error::MissingRequiredFields("abkBankName".to_owned())),
        Some(name) => name.to_owned(),
        None => existing.abk_bank_name,
    };

    connection.execute(
        "UPDATE account_bank SET abk_bank_name = ?1, abk_branch_name = ?2, abk_account_no = ?3,
            abk_sheba = ?4, abk_currency = ?5, abk_is_active = ?6, abk_is_pos = ?7,
            abk_is_check = ?8, abk_updated_by = ?9, abk_updated_at = ?10
        WHERE abk_acc_code = ?11",
        (
            bank_name,
            form.abk_branch_name.as_ref().or(existing.abk_branch_name.as_ref()),
            form.abk_account_no.as_ref().or(existing.abk_account_no.as_ref()),
            form.abk_sheba.as_ref().or(existing.abk_sheba.as_ref()),
            form.abk_currency.as_ref().unwrap_or(&existing.abk_currency),
            form.abk_is_active.unwrap_or(existing.abk_is_active),
            form.abk_is_pos.unwrap_or(existing.abk_is_pos),
            form.abk_is_check.unwrap_or(existing.abk_is_check),
            updated_by,
            OffsetDateTime::now_utc(),
            acc_code,
        ),
    )?;

    Ok(())
}

/// # Errors
/// Returns [Error::BankInfoNotFound] if the account has no bank details.
pub fn delete_bank_info(acc_code: &str, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM account_bank WHERE abk_acc_code = ?1",
        [acc_code],
    )?;

    if rows_affected == 0 {
        return Err(Error::BankInfoNotFound(acc_code.to_owned()));
    }

    Ok(())
}

pub async fn get_bank_info_endpoint(
    State(state): State<AccountState>,
    Path(acc_code): Path<String>,
) -> Result<Json<Envelope<AccountBank>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::BANK_INFO_DETAIL,
        get_bank_info(&acc_code, &connection)?,
    ))
}

pub async fn save_bank_info_endpoint(
    State(state): State<AccountState>,
    Extension(claims): Extension<Claims>,
    Path(acc_code): Path<String>,
    Json(form): Json<BankInfoForm>,
) -> Result<Json<Envelope<AccountBank>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let bank_info = save_bank_info(&acc_code, &form, &claims.id, &connection)?;

    Ok(success(codes::BANK_INFO_SAVED, bank_info))
}

pub async fn update_bank_info_endpoint(
    State(state): State<AccountState>,
    Extension(claims): Extension<Claims>,
    Path(acc_code): Path<String>,
    Json(form): Json<BankInfoForm>,
) -> Result<Json<Envelope<AccountBank>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    update_bank_info(&acc_code, &form, &claims.id, &connection)?;

    Ok(success(
        codes::BANK_INFO_UPDATED,
        get_bank_info(&acc_code, &connection)?,
    ))
}

pub async fn delete_bank_info_endpoint(
    State(state): State<AccountState>,
    Path(acc_code): Path<String>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_bank_info(&acc_code, &connection)?;

    Ok(success(codes::BANK_INFO_DELETED, ()))
}
