//! Read-only account endpoints: lists, the tree, children and statistics.

use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    account::{
        Account, AccountCategory, AccountNode, AccountState, AccountType, build_account_tree,
        core::{SELECT_ACCOUNT, query_accounts_with_bank},
        get_account_with_bank,
    },
    db::lock_connection,
    response::{Envelope, codes, success},
};

/// All active accounts ordered by code.
pub fn get_active_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    query_accounts_with_bank(
        &format!("{SELECT_ACCOUNT} WHERE acc_is_active = 1 ORDER BY acc_code"),
        [],
        connection,
    )
}

/// The active direct children of `acc_code` ordered by code.
pub fn get_children(acc_code: &str, connection: &Connection) -> Result<Vec<Account>, Error> {
    query_accounts_with_bank(
        &format!(
            "{SELECT_ACCOUNT} WHERE acc_parent_code = ?1 AND acc_is_active = 1 ORDER BY acc_code"
        ),
        [acc_code],
        connection,
    )
}

pub fn get_accounts_by_category(
    category: AccountCategory,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    query_accounts_with_bank(
        &format!(
            "{SELECT_ACCOUNT} WHERE acc_category = ?1 AND acc_is_active = 1 ORDER BY acc_code"
        ),
        [category.as_str()],
        connection,
    )
}

pub fn get_accounts_by_type(
    acc_type: AccountType,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    query_accounts_with_bank(
        &format!("{SELECT_ACCOUNT} WHERE acc_type = ?1 AND acc_is_active = 1 ORDER BY acc_code"),
        [acc_type.as_str()],
        connection,
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub acc_category: AccountCategory,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    pub acc_type: AccountType,
    pub count: i64,
}

/// Counts over the chart of accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStats {
    /// Every account, active or not.
    pub total_accounts: i64,
    pub active_accounts: i64,
    /// Active bank accounts.
    pub bank_accounts: i64,
    pub accounts_by_category: Vec<CategoryCount>,
    pub accounts_by_type: Vec<TypeCount>,
}

pub fn get_account_stats(connection: &Connection) -> Result<AccountStats, Error> {
    let (total_accounts, active_accounts, bank_accounts) = connection.query_row(
        "SELECT COUNT(*),
            COALESCE(SUM(acc_is_active), 0),
            COALESCE(SUM(CASE WHEN acc_is_active = 1 AND acc_is_bank = 1 THEN 1 ELSE 0 END), 0)
        FROM account",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let accounts_by_category = connection
        .prepare(
            "SELECT acc_category, COUNT(*) FROM account WHERE acc_is_active = 1
            GROUP BY acc_category ORDER BY acc_category",
        )?
        .query_map([], |row| {
            Ok(CategoryCount {
                acc_category: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let accounts_by_type = connection
        .prepare(
            "SELECT acc_type, COUNT(*) FROM account WHERE acc_is_active = 1
            GROUP BY acc_type ORDER BY acc_type",
        )?
        .query_map([], |row| {
            Ok(TypeCount {
                acc_type: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AccountStats {
        total_accounts,
        active_accounts,
        bank_accounts,
        accounts_by_category,
        accounts_by_type,
    })
}

pub async fn get_accounts_endpoint(
    State(state): State<AccountState>,
) -> Result<Json<Envelope<Vec<Account>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(codes::ACCOUNT_LIST, get_active_accounts(&connection)?))
}

pub async fn get_account_endpoint(
    State(state): State<AccountState>,
    Path(acc_code): Path<String>,
) -> Result<Json<Envelope<Account>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::ACCOUNT_DETAIL,
        get_account_with_bank(&acc_code, &connection)?,
    ))
}

pub async fn get_account_tree_endpoint(
    State(state): State<AccountState>,
) -> Result<Json<Envelope<Vec<AccountNode>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let accounts = get_active_accounts(&connection)?;

    Ok(success(codes::ACCOUNT_TREE, build_account_tree(&accounts)))
}

pub async fn get_account_children_endpoint(
    State(state): State<AccountState>,
    Path(acc_code): Path<String>,
) -> Result<Json<Envelope<Vec<Account>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::ACCOUNT_CHILDREN,
        get_children(&acc_code, &connection)?,
    ))
}

pub async fn get_account_stats_endpoint(
    State(state): State<AccountState>,
) -> Result<Json<Envelope<AccountStats>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(codes::ACCOUNT_STATS, get_account_stats(&connection)?))
}

pub async fn get_accounts_by_category_endpoint(
    State(state): State<AccountState>,
    Path(category): Path<String>,
) -> Result<Json<Envelope<Vec<Account>>>, Error> {
    let category: AccountCategory = category.parse()?;
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::ACCOUNT_LIST,
        get_accounts_by_category(category, &connection)?,
    ))
}

pub async fn get_accounts_by_type_endpoint(
    State(state): State<AccountState>,
    Path(acc_type): Path<String>,
) -> Result<Json<Envelope<Vec<Account>>>, Error> {
    let acc_type: AccountType = acc_type.parse()?;
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::ACCOUNT_LIST,
        get_accounts_by_type(acc_type, &connection)?,
    ))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        account::{AccountCategory, AccountForm, AccountType, BankInfoForm, create_account},
        db::initialize,
    };

    use super::{
        get_account_stats, get_accounts_by_category, get_accounts_by_type, get_active_accounts,
        get_children,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let accounts = [
            ("05", None, 1, "credit", "income", true, false),
            ("01", None, 1, "debit", "asset", true, false),
            ("01/002", Some("01"), 0, "debit", "asset", true, true),
            ("01/001", Some("01"), 0, "debit", "asset", true, false),
            ("01/003", Some("01"), 0, "debit", "asset", false, false),
        ];

        for (code, parent, sublevel_format, acc_type, category, is_active, is_bank) in accounts {
            create_account(
                &AccountForm {
                    acc_code: Some(code.to_owned()),
                    acc_name: Some(format!("Account {code}")),
                    acc_parent_code: parent.map(str::to_owned),
                    acc_sublevel_format: Some(sublevel_format),
                    acc_type: Some(acc_type.to_owned()),
                    acc_category: Some(category.to_owned()),
                    acc_is_active: Some(is_active),
                    acc_is_bank: Some(is_bank),
                    bank_info: is_bank.then(|| BankInfoForm {
                        abk_bank_name: Some("Melli".to_owned()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                "P001",
                &connection,
            )
            .unwrap();
        }

        connection
    }

    fn codes(accounts: &[crate::account::Account]) -> Vec<&str> {
        accounts.iter().map(|a| a.acc_code.as_str()).collect()
    }

    #[test]
    fn active_accounts_ordered_with_bank_details() {
        let connection = get_test_connection();

        let accounts = get_active_accounts(&connection).unwrap();

        assert_eq!(codes(&accounts), vec!["01", "01/001", "01/002", "05"]);
        assert!(accounts[2].account_bank.is_some());
        assert!(accounts[1].account_bank.is_none());
    }

    #[test]
    fn children_are_active_and_ordered() {
        let connection = get_test_connection();

        let children = get_children("01", &connection).unwrap();

        assert_eq!(codes(&children), vec!["01/001", "01/002"]);
    }

    #[test]
    fn filters_by_category_and_type() {
        let connection = get_test_connection();

        let income = get_accounts_by_category(AccountCategory::Income, &connection).unwrap();
        let credit = get_accounts_by_type(AccountType::Credit, &connection).unwrap();

        assert_eq!(codes(&income), vec!["05"]);
        assert_eq!(codes(&credit), vec!["05"]);
    }

    #[test]
    fn stats_count_all_active_and_bank() {
        let connection = get_test_connection();

        let stats = get_account_stats(&connection).unwrap();

        assert_eq!(stats.total_accounts, 5);
        assert_eq!(stats.active_accounts, 4);
        assert_eq!(stats.bank_accounts, 1);
        let by_category: Vec<_> = stats
            .accounts_by_category
            .iter()
            .map(|c| (c.acc_category, c.count))
            .collect();
        assert_eq!(
            by_category,
            vec![(AccountCategory::Asset, 3), (AccountCategory::Income, 1)]
        );
        let by_type: Vec<_> = stats
            .accounts_by_type
            .iter()
            .map(|t| (t.acc_type, t.count))
            .collect();
        assert_eq!(
            by_type,
            vec![(AccountType::Credit, 1), (AccountType::Debit, 3)]
        );
    }
}
