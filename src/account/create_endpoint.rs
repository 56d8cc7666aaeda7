//! Defines the endpoint for creating an account.

use axum::{Extension, Json, extract::State};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    account::{
        Account, AccountCategory, AccountState, AccountType, account_exists,
        check_parent_is_group, get_account_with_bank, normalize_parent_code,
    },
    auth::Claims,
    db::lock_connection,
    response::{Envelope, codes, success},
    user_log::{UserAction, log_user_action},
};

/// Bank details sent along with an account or on their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankInfoForm {
    pub abk_bank_name: Option<String>,
    pub abk_branch_name: Option<String>,
    pub abk_account_no: Option<String>,
    pub abk_sheba: Option<String>,
    pub abk_currency: Option<String>,
    pub abk_is_active: Option<bool>,
    pub abk_is_pos: Option<bool>,
    pub abk_is_check: Option<bool>,
}

/// The data for a new account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountForm {
    pub acc_code: Option<String>,
    pub acc_name: Option<String>,
    /// `""`, `"0"` or absent for a root account.
    pub acc_parent_code: Option<String>,
    pub acc_sublevel_format: Option<i64>,
    pub acc_type: Option<String>,
    pub acc_category: Option<String>,
    pub acc_is_bank: Option<bool>,
    pub acc_is_active: Option<bool>,
    pub acc_notes: Option<String>,
    pub bank_info: Option<BankInfoForm>,
}

fn required<'a>(
    value: &'a Option<String>,
    missing: &mut Vec<&'static str>,
    name: &'static str,
) -> &'a str {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => {
            missing.push(name);
            ""
        }
    }
}

pub(crate) fn validate_sublevel_format(sublevel_format: i64) -> Result<i64, Error> {
    if sublevel_format < 0 {
        return Err(Error::Validation(format!(
            "accSublevelFormat must not be negative, got {sublevel_format}"
        )));
    }

    Ok(sublevel_format)
}

/// Bank accounts must be leaves.
pub(crate) fn check_bank_is_leaf(
    acc_code: &str,
    is_bank: bool,
    sublevel_format: i64,
) -> Result<(), Error> {
    if is_bank && sublevel_format > 0 {
        return Err(Error::GroupBankAccount(acc_code.to_owned()));
    }

    Ok(())
}

/// Insert the bank details for `acc_code`, filling in defaults.
pub(crate) fn insert_bank_info(
    acc_code: &str,
    form: &BankInfoForm,
    created_by: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let bank_name = match form.abk_bank_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => return Err(Error::MissingRequiredFields("abkBankName".to_owned())),
    };

    connection.execute(
        "INSERT INTO account_bank (abk_acc_code, abk_bank_name, abk_branch_name, abk_account_no,
            abk_sheba, abk_currency, abk_is_active, abk_is_pos, abk_is_check, abk_created_by,
            abk_created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        (
            acc_code,
            bank_name,
            &form.abk_branch_name,
            &form.abk_account_no,
            &form.abk_sheba,
            form.abk_currency.as_deref().unwrap_or("IRR"),
            form.abk_is_active.unwrap_or(true),
            form.abk_is_pos.unwrap_or(true),
            form.abk_is_check.unwrap_or(true),
            created_by,
            OffsetDateTime::now_utc(),
        ),
    )?;

    Ok(())
}

/// Create an account, and its bank details when given, in one transaction.
///
/// # Errors
///
/// - [Error::MissingRequiredFields] if the code, name, type or category is missing.
/// - [Error::CircularReference] if the account names itself as its parent.
/// - [Error::AccountCodeExists] if the code is taken.
/// - [Error::ParentAccountNotFound] if the parent does not exist.
/// - [Error::ParentNotGroup] if the parent is a leaf.
/// - [Error::GroupBankAccount] if a group account is flagged as a bank account.
pub fn create_account(
    form: &AccountForm,
    created_by: &str,
    connection: &Connection,
) -> Result<Account, Error> {
    let mut missing = Vec::new();
    let acc_code = required(&form.acc_code, &mut missing, "accCode");
    let acc_name = required(&form.acc_name, &mut missing, "accName");
    let acc_type = required(&form.acc_type, &mut missing, "accType");
    let acc_category = required(&form.acc_category, &mut missing, "accCategory");

    if !missing.is_empty() {
        return Err(Error::MissingRequiredFields(missing.join(", ")));
    }

    let acc_type: AccountType = acc_type.parse()?;
    let acc_category: AccountCategory = acc_category.parse()?;
    let sublevel_format = validate_sublevel_format(form.acc_sublevel_format.unwrap_or(0))?;
    let parent_code = normalize_parent_code(form.acc_parent_code.as_deref());

    if parent_code.as_deref() == Some(acc_code) {
        return Err(Error::CircularReference(acc_code.to_owned()));
    }

    let is_bank = form.acc_is_bank.unwrap_or(false);
    check_bank_is_leaf(acc_code, is_bank, sublevel_format)?;

    let transaction = connection.unchecked_transaction()?;

    if account_exists(acc_code, &transaction)? {
        return Err(Error::AccountCodeExists(acc_code.to_owned()));
    }

    if let Some(parent_code) = &parent_code {
        check_parent_is_group(parent_code, &transaction)?;
    }

    transaction.execute(
        "INSERT INTO account (acc_code, acc_name, acc_parent_code, acc_sublevel_format,
            acc_type, acc_category, acc_is_bank, acc_is_active, acc_notes, acc_created_by,
            acc_created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        (
            acc_code,
            acc_name,
            &parent_code,
            sublevel_format,
            acc_type,
            acc_category,
            is_bank,
            form.acc_is_active.unwrap_or(true),
            &form.acc_notes,
            created_by,
            OffsetDateTime::now_utc(),
        ),
    )?;

    if let (true, Some(bank_info)) = (is_bank, &form.bank_info) {
        insert_bank_info(acc_code, bank_info, created_by, &transaction)?;
    }

    log_user_action(
        created_by,
        UserAction::Create,
        "account",
        acc_code,
        &transaction,
    )?;
    transaction.commit()?;

    get_account_with_bank(acc_code, connection)
}

/// A route handler for creating a new account.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<AccountForm>,
) -> Result<Json<Envelope<Account>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let account = create_account(&form, &claims.id, &connection)?;
    tracing::info!("Account {} created by {}", account.acc_code, claims.id);

    Ok(success(codes::ACCOUNT_CREATED, account))
}
