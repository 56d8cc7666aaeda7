//! Defines the endpoints for deleting one or many accounts.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    account::{AccountState, count_children, count_journal_lines, get_account},
    auth::Claims,
    db::lock_connection,
    response::{Envelope, codes, success},
    user_log::{UserAction, log_user_action},
};

/// Delete an account that has no children and no journal lines, along with
/// its bank details.
///
/// The caller owns the transaction.
fn delete_account_unchecked(
    acc_code: &str,
    deleted_by: &str,
    connection: &Connection,
) -> Result<String, Error> {
    let account = get_account(acc_code, connection)?;

    if count_children(acc_code, connection)? > 0 {
        return Err(Error::AccountHasChildren(acc_code.to_owned()));
    }

    if count_journal_lines(acc_code, connection)? > 0 {
        return Err(Error::AccountHasTransactions(acc_code.to_owned()));
    }

    connection.execute(
        "DELETE FROM account_bank WHERE abk_acc_code = ?1",
        [acc_code],
    )?;
    connection.execute("DELETE FROM account WHERE acc_code = ?1", [acc_code])?;
    log_user_action(
        deleted_by,
        UserAction::Delete,
        "account",
        acc_code,
        connection,
    )?;

    Ok(account.acc_name)
}

/// Delete the account `acc_code` and its bank details.
///
/// # Errors
///
/// - [Error::AccountNotFound] if the account does not exist.
/// - [Error::AccountHasChildren] if other accounts name it as their parent.
/// - [Error::AccountHasTransactions] if journal lines post to it.
pub fn delete_account(
    acc_code: &str,
    deleted_by: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;
    delete_account_unchecked(acc_code, deleted_by, &transaction)?;
    transaction.commit()?;

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub acc_codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedAccount {
    pub acc_code: String,
    pub acc_name: String,
}

/// Why an account in a bulk delete was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteFailure {
    NotFound,
    HasChildren,
    UsedInDocs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedAccount {
    pub acc_code: String,
    pub acc_name: Option<String>,
    pub reason: DeleteFailure,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkDeleteResult {
    pub deleted: Vec<DeletedAccount>,
    pub failed: Vec<FailedAccount>,
}

/// Delete each account in `acc_codes`, in order, within one transaction.
///
/// An account that cannot be deleted is reported in `failed` and does not
/// stop the rest. Deleting a child earlier in the list frees its parent
/// later in the list.
///
/// # Errors
/// Returns [Error::NoAccountsSelected] if `acc_codes` is empty.
pub fn delete_accounts(
    acc_codes: &[String],
    deleted_by: &str,
    connection: &Connection,
) -> Result<BulkDeleteResult, Error> {
    if acc_codes.is_empty() {
        return Err(Error::NoAccountsSelected);
    }

    let transaction = connection.unchecked_transaction()?;
    let mut result = BulkDeleteResult::default();

    for acc_code in acc_codes {
        let reason = match delete_account_unchecked(acc_code, deleted_by, &transaction) {
            Ok(acc_name) => {
                result.deleted.push(DeletedAccount {
                    acc_code: acc_code.clone(),
                    acc_name,
                });
                continue;
            }
            Err(Error::AccountNotFound(_)) => DeleteFailure::NotFound,
            Err(Error::AccountHasChildren(_)) => DeleteFailure::HasChildren,
            Err(Error::AccountHasTransactions(_)) => DeleteFailure::UsedInDocs,
            Err(error) => return Err(error),
        };

        let acc_name = match reason {
            DeleteFailure::NotFound => None,
            _ => Some(get_account(acc_code, &transaction)?.acc_name),
        };

        result.failed.push(FailedAccount {
            acc_code: acc_code.clone(),
            acc_name,
            reason,
        });
    }

    transaction.commit()?;

    Ok(result)
}

/// A route handler for deleting an account.
pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    Extension(claims): Extension<Claims>,
    Path(acc_code): Path<String>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_account(&acc_code, &claims.id, &connection)?;
    tracing::info!("Account {acc_code} deleted by {}", claims.id);

    Ok(success(codes::ACCOUNT_DELETED, ()))
}

/// A route handler for deleting many accounts at once.
pub async fn delete_accounts_endpoint(
    State(state): State<AccountState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<Envelope<BulkDeleteResult>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let result = delete_accounts(&request.acc_codes, &claims.id, &connection)?;

    Ok(success(codes::ACCOUNTS_BULK_DELETED, result))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{AccountForm, BankInfoForm, account_exists, create_account},
        db::initialize,
    };

    use super::{DeleteFailure, delete_account, delete_accounts};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        for (code, parent, sublevel_format) in [
            ("02", None, 1),
            ("02/001", Some("02"), 0),
            ("03", None, 0),
        ] {
            create_account(
                &AccountForm {
                    acc_code: Some(code.to_owned()),
                    acc_name: Some(format!("Account {code}")),
                    acc_parent_code: parent.map(str::to_owned),
                    acc_sublevel_format: Some(sublevel_format),
                    acc_type: Some("debit".to_owned()),
                    acc_category: Some("asset".to_owned()),
                    ..Default::default()
                },
                "P001",
                &connection,
            )
            .unwrap();
        }

        connection
    }

    fn post_to(acc_code: &str, connection: &Connection) {
        connection
            .execute(
                "INSERT INTO journal (jrn_code, jrn_date, jrn_is_posted, jrn_created_at)
                VALUES ('2025.000001', '2025-01-01', 0, '2025-01-01 00:00:00.0+00:00')",
                (),
            )
            .unwrap();
        connection
            .execute(
                "INSERT INTO journal_detail (jrd_jrn_code, jrd_line_no, jrd_acc_code, jrd_debit, jrd_credit)
                VALUES ('2025.000001', 1, ?1, 10.0, 0.0)",
                [acc_code],
            )
            .unwrap();
    }

    #[test]
    fn delete_removes_account_and_bank_details() {
        let connection = get_test_connection();
        create_account(
            &AccountForm {
                acc_code: Some("04".to_owned()),
                acc_name: Some("Bank".to_owned()),
                acc_type: Some("debit".to_owned()),
                acc_category: Some("asset".to_owned()),
                acc_is_bank: Some(true),
                bank_info: Some(BankInfoForm {
                    abk_bank_name: Some("Melli".to_owned()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            "P001",
            &connection,
        )
        .unwrap();

        delete_account("04", "P001", &connection).unwrap();

        assert!(!account_exists("04", &connection).unwrap());
        let banks: i64 = connection
            .query_row("SELECT COUNT(*) FROM account_bank", [], |row| row.get(0))
            .unwrap();
        assert_eq!(banks, 0);
    }

    #[test]
    fn delete_missing_account_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            delete_account("09", "P001", &connection),
            Err(Error::AccountNotFound("09".to_owned()))
        );
    }

    #[test]
    fn delete_group_with_children_fails() {
        let connection = get_test_connection();

        assert_eq!(
            delete_account("02", "P001", &connection),
            Err(Error::AccountHasChildren("02".to_owned()))
        );
    }

    #[test]
    fn delete_account_with_postings_fails() {
        let connection = get_test_connection();
        post_to("03", &connection);

        assert_eq!(
            delete_account("03", "P001", &connection),
            Err(Error::AccountHasTransactions("03".to_owned()))
        );
        assert!(account_exists("03", &connection).unwrap());
    }

    #[test]
    fn bulk_delete_requires_codes() {
        let connection = get_test_connection();

        assert_eq!(
            delete_accounts(&[], "P001", &connection),
            Err(Error::NoAccountsSelected)
        );
    }

    #[test]
    fn bulk_delete_reports_each_account() {
        let connection = get_test_connection();
        post_to("03", &connection);
        let codes = ["02/001", "02", "03", "09"].map(str::to_owned);

        let result = delete_accounts(&codes, "P001", &connection).unwrap();

        let deleted: Vec<_> = result.deleted.iter().map(|d| d.acc_code.as_str()).collect();
        assert_eq!(deleted, vec!["02/001", "02"]);
        let failed: Vec<_> = result
            .failed
            .iter()
            .map(|f| (f.acc_code.as_str(), f.reason))
            .collect();
        assert_eq!(
            failed,
            vec![
                ("03", DeleteFailure::UsedInDocs),
                ("09", DeleteFailure::NotFound)
            ]
        );
        assert_eq!(result.failed[0].acc_name.as_deref(), Some("Account 03"));
    }

    #[test]
    fn bulk_result_serializes_reasons_in_camel_case() {
        let connection = get_test_connection();

        let result = delete_accounts(&["02".to_owned()], "P001", &connection).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["failed"][0]["reason"], "hasChildren");
        assert_eq!(json["failed"][0]["accCode"], "02");
    }
}
