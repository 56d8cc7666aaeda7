//! Defines the endpoint for updating an account.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    account::{
        Account, AccountCategory, AccountState, BankInfoForm, check_parent_is_group,
        count_children, count_journal_lines, find_account_bank, get_account,
        get_account_with_bank, is_self_or_ancestor, normalize_parent_code,
        bank_endpoints::update_bank_info,
        create_endpoint::{check_bank_is_leaf, insert_bank_info, validate_sublevel_format},
    },
    auth::Claims,
    db::lock_connection,
    response::{Envelope, codes, success},
    user_log::{UserAction, log_user_action},
};

/// A partial update of an account. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub acc_name: Option<String>,
    /// Send `""` or `"0"` to make the account a root.
    pub acc_parent_code: Option<String>,
    pub acc_sublevel_format: Option<i64>,
    pub acc_type: Option<String>,
    pub acc_category: Option<String>,
    pub acc_is_bank: Option<bool>,
    pub acc_is_active: Option<bool>,
    pub acc_notes: Option<String>,
    pub bank_info: Option<BankInfoForm>,
}

/// Apply `update` to the account `acc_code` in one transaction.
///
/// Bank details are created or updated when the account is a bank account
/// and `bankInfo` is given, and removed when the account is no longer a bank
/// account.
///
/// # Errors
///
/// - [Error::AccountNotFound] if the account does not exist.
/// - [Error::ParentAccountNotFound] if the new parent does not exist.
/// - [Error::ParentNotGroup] if the new parent is a leaf.
/// - [Error::CircularReference] if the new parent is the account or one of its descendants.
/// - [Error::GroupHasChildren] if a group with children would become a leaf.
/// - [Error::LeafHasTransactions] if a leaf used in journals would become a group.
/// - [Error::GroupBankAccount] if a group account would be a bank account.
pub fn update_account(
    acc_code: &str,
    update: &AccountUpdate,
    updated_by: &str,
    connection: &Connection,
) -> Result<Account, Error> {
    let transaction = connection.unchecked_transaction()?;
    let existing = get_account(acc_code, &transaction)?;

    let parent_code = match &update.acc_parent_code {
        None => existing.acc_parent_code.clone(),
        Some(raw) => {
            let parent_code = normalize_parent_code(Some(raw));

            if let Some(parent_code) = &parent_code {
                if parent_code == acc_code {
                    return Err(Error::CircularReference(acc_code.to_owned()));
                }

                check_parent_is_group(parent_code, &transaction)?;

                if is_self_or_ancestor(acc_code, parent_code, &transaction)? {
                    return Err(Error::CircularReference(acc_code.to_owned()));
                }
            }

            parent_code
        }
    };

    let acc_name = match update.acc_name.as_deref().map(str::trim) {
        Some("") => return Err(Error::MissingRequiredFields("accName".to_owned())),
        Some(name) => name.to_owned(),
        None => existing.acc_name,
    };
    let acc_type = match &update.acc_type {
        Some(acc_type) => acc_type.parse()?,
        None => existing.acc_type,
    };
    let acc_category: AccountCategory = match &update.acc_category {
        Some(category) => category.parse()?,
        None => existing.acc_category,
    };
    let sublevel_format = match update.acc_sublevel_format {
        Some(sublevel_format) => validate_sublevel_format(sublevel_format)?,
        None => existing.acc_sublevel_format,
    };
    let is_bank = update.acc_is_bank.unwrap_or(existing.acc_is_bank);
    check_bank_is_leaf(acc_code, is_bank, sublevel_format)?;

    if existing.acc_sublevel_format > 0
        && sublevel_format == 0
        && count_children(acc_code, &transaction)? > 0
    {
        return Err(Error::GroupHasChildren(acc_code.to_owned()));
    }

    if existing.acc_sublevel_format == 0
        && sublevel_format > 0
        && count_journal_lines(acc_code, &transaction)? > 0
    {
        return Err(Error::LeafHasTransactions(acc_code.to_owned()));
    }

    transaction.execute(
        "UPDATE account SET acc_name = ?1, acc_parent_code = ?2, acc_sublevel_format = ?3,
            acc_type = ?4, acc_category = ?5, acc_is_bank = ?6, acc_is_active = ?7,
            acc_notes = ?8, acc_updated_by = ?9, acc_updated_at = ?10
        WHERE acc_code = ?11",
        (
            acc_name,
            &parent_code,
            sublevel_format,
            acc_type,
            acc_category,
            is_bank,
            update.acc_is_active.unwrap_or(existing.acc_is_active),
            update.acc_notes.as_ref().or(existing.acc_notes.as_ref()),
            updated_by,
            OffsetDateTime::now_utc(),
            acc_code,
        ),
    )?;

    if !is_bank {
        transaction.execute(
            "DELETE FROM account_bank WHERE abk_acc_code = ?1",
            [acc_code],
        )?;
    } else if let Some(bank_info) = &update.bank_info {
        match find_account_bank(acc_code, &transaction)? {
            Some(_) => update_bank_info(acc_code, bank_info, updated_by, &transaction)?,
            None => insert_bank_info(acc_code, bank_info, updated_by, &transaction)?,
        }
    }

    log_user_action(
        updated_by,
        UserAction::Update,
        "account",
        acc_code,
        &transaction,
    )?;
    transaction.commit()?;

    get_account_with_bank(acc_code, connection)
}

/// A route handler for updating an account.
pub async fn edit_account_endpoint(
    State(state): State<AccountState>,
    Extension(claims): Extension<Claims>,
    Path(acc_code): Path<String>,
    Json(update): Json<AccountUpdate>,
) -> Result<Json<Envelope<Account>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let account = update_account(&acc_code, &update, &claims.id, &connection)?;

    Ok(success(codes::ACCOUNT_UPDATED, account))
}
