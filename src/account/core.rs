use std::{collections::HashSet, fmt::Display, str::FromStr};

use rusqlite::{
    Connection, OptionalExtension, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// Which side of the ledger increases the account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Debit,
    Credit,
    Neutral,
}

/// The financial statement section an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountCategory {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Debit => "debit",
            AccountType::Credit => "credit",
            AccountType::Neutral => "neutral",
        }
    }
}

impl AccountCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountCategory::Asset => "asset",
            AccountCategory::Liability => "liability",
            AccountCategory::Equity => "equity",
            AccountCategory::Income => "income",
            AccountCategory::Expense => "expense",
        }
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(AccountType::Debit),
            "credit" => Ok(AccountType::Credit),
            "neutral" => Ok(AccountType::Neutral),
            other => Err(Error::Validation(format!(
                "unknown account type \"{other}\", expected debit, credit or neutral"
            ))),
        }
    }
}

impl FromStr for AccountCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset" => Ok(AccountCategory::Asset),
            "liability" => Ok(AccountCategory::Liability),
            "equity" => Ok(AccountCategory::Equity),
            "income" => Ok(AccountCategory::Income),
            "expense" => Ok(AccountCategory::Expense),
            other => Err(Error::Validation(format!(
                "unknown account category \"{other}\""
            ))),
        }
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for AccountCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for AccountType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

impl ToSql for AccountCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A node in the chart of accounts.
///
/// Codes are path-like, e.g. `02/001/002`. An account with a sublevel format
/// of zero is a leaf and may receive journal postings, any other value makes
/// it a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub acc_code: String,
    pub acc_name: String,
    pub acc_parent_code: Option<String>,
    pub acc_sublevel_format: i64,
    pub acc_type: AccountType,
    pub acc_category: AccountCategory,
    pub acc_is_bank: bool,
    pub acc_is_active: bool,
    pub acc_notes: Option<String>,
    pub acc_created_by: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub acc_created_at: OffsetDateTime,
    pub acc_updated_by: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub acc_updated_at: Option<OffsetDateTime>,
    /// The bank details, only loaded for bank accounts.
    #[serde(default)]
    pub account_bank: Option<AccountBank>,
}

impl Account {
    /// Whether the account may receive postings.
    pub fn is_leaf(&self) -> bool {
        self.acc_sublevel_format == 0
    }
}

/// Bank details attached to a leaf account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBank {
    pub abk_acc_code: String,
    pub abk_bank_name: String,
    pub abk_branch_name: Option<String>,
    pub abk_account_no: Option<String>,
    pub abk_sheba: Option<String>,
    pub abk_currency: String,
    pub abk_is_active: bool,
    pub abk_is_pos: bool,
    pub abk_is_check: bool,
    pub abk_created_by: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub abk_created_at: OffsetDateTime,
    pub abk_updated_by: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub abk_updated_at: Option<OffsetDateTime>,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            acc_code TEXT PRIMARY KEY,
            acc_name TEXT NOT NULL,
            acc_parent_code TEXT REFERENCES account(acc_code),
            acc_sublevel_format INTEGER NOT NULL DEFAULT 0 CHECK (acc_sublevel_format >= 0),
            acc_type TEXT NOT NULL,
            acc_category TEXT NOT NULL,
            acc_is_bank INTEGER NOT NULL DEFAULT 0,
            acc_is_active INTEGER NOT NULL DEFAULT 1,
            acc_notes TEXT,
            acc_created_by TEXT,
            acc_created_at TEXT NOT NULL,
            acc_updated_by TEXT,
            acc_updated_at TEXT
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_parent_code ON account(acc_parent_code)",
        (),
    )?;

    Ok(())
}

pub fn create_account_bank_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account_bank (
            abk_acc_code TEXT PRIMARY KEY REFERENCES account(acc_code) ON DELETE CASCADE,
            abk_bank_name TEXT NOT NULL,
            abk_branch_name TEXT,
            abk_account_no TEXT,
            abk_sheba TEXT,
            abk_currency TEXT NOT NULL DEFAULT 'IRR',
            abk_is_active INTEGER NOT NULL DEFAULT 1,
            abk_is_pos INTEGER NOT NULL DEFAULT 1,
            abk_is_check INTEGER NOT NULL DEFAULT 1,
            abk_created_by TEXT,
            abk_created_at TEXT NOT NULL,
            abk_updated_by TEXT,
            abk_updated_at TEXT
        )",
        (),
    )?;

    Ok(())
}

pub(crate) const SELECT_ACCOUNT: &str = "SELECT acc_code, acc_name, acc_parent_code,
    acc_sublevel_format, acc_type, acc_category, acc_is_bank, acc_is_active, acc_notes,
    acc_created_by, acc_created_at, acc_updated_by, acc_updated_at
    FROM account";

pub(crate) const SELECT_ACCOUNT_BANK: &str = "SELECT abk_acc_code, abk_bank_name,
    abk_branch_name, abk_account_no, abk_sheba, abk_currency, abk_is_active, abk_is_pos,
    abk_is_check, abk_created_by, abk_created_at, abk_updated_by, abk_updated_at
    FROM account_bank";

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        acc_code: row.get(0)?,
        acc_name: row.get(1)?,
        acc_parent_code: row.get(2)?,
        acc_sublevel_format: row.get(3)?,
        acc_type: row.get(4)?,
        acc_category: row.get(5)?,
        acc_is_bank: row.get(6)?,
        acc_is_active: row.get(7)?,
        acc_notes: row.get(8)?,
        acc_created_by: row.get(9)?,
        acc_created_at: row.get(10)?,
        acc_updated_by: row.get(11)?,
        acc_updated_at: row.get(12)?,
        account_bank: None,
    })
}

pub fn map_row_to_account_bank(row: &Row) -> Result<AccountBank, rusqlite::Error> {
    Ok(AccountBank {
        abk_acc_code: row.get(0)?,
        abk_bank_name: row.get(1)?,
        abk_branch_name: row.get(2)?,
        abk_account_no: row.get(3)?,
        abk_sheba: row.get(4)?,
        abk_currency: row.get(5)?,
        abk_is_active: row.get(6)?,
        abk_is_pos: row.get(7)?,
        abk_is_check: row.get(8)?,
        abk_created_by: row.get(9)?,
        abk_created_at: row.get(10)?,
        abk_updated_by: row.get(11)?,
        abk_updated_at: row.get(12)?,
    })
}

/// Map a parent code from a request to the stored value.
///
/// Both an empty string and the legacy sentinel `"0"` mean "no parent".
pub fn normalize_parent_code(parent_code: Option<&str>) -> Option<String> {
    match parent_code.map(str::trim) {
        None | Some("") | Some("0") => None,
        Some(code) => Some(code.to_owned()),
    }
}

/// Get an account without its bank details.
///
/// # Errors
/// Returns [Error::AccountNotFound] if no account has the code.
pub fn get_account(acc_code: &str, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(&format!("{SELECT_ACCOUNT} WHERE acc_code = :acc_code"))?
        .query_row(&[(":acc_code", &acc_code)], map_row_to_account)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::AccountNotFound(acc_code.to_owned()),
            error => error,
        })
}

/// Get an account and, for bank accounts, its bank details.
pub fn get_account_with_bank(acc_code: &str, connection: &Connection) -> Result<Account, Error> {
    let mut account = get_account(acc_code, connection)?;
    account.account_bank = find_account_bank(acc_code, connection)?;

    Ok(account)
}

pub fn find_account_bank(
    acc_code: &str,
    connection: &Connection,
) -> Result<Option<AccountBank>, Error> {
    connection
        .prepare(&format!("{SELECT_ACCOUNT_BANK} WHERE abk_acc_code = :acc_code"))?
        .query_row(&[(":acc_code", &acc_code)], map_row_to_account_bank)
        .optional()
        .map_err(Error::from)
}

/// Run `query` over the account table and attach bank details to each row.
///
/// `query` must select the columns of [SELECT_ACCOUNT] in order.
pub(crate) fn query_accounts_with_bank(
    query: &str,
    params: impl rusqlite::Params,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    let mut accounts = connection
        .prepare(query)?
        .query_map(params, map_row_to_account)?
        .collect::<Result<Vec<_>, _>>()?;

    for account in accounts.iter_mut().filter(|account| account.acc_is_bank) {
        account.account_bank = find_account_bank(&account.acc_code, connection)?;
    }

    Ok(accounts)
}

pub fn account_exists(acc_code: &str, connection: &Connection) -> Result<bool, Error> {
    let found = connection
        .query_row(
            "SELECT 1 FROM account WHERE acc_code = ?1",
            [acc_code],
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

/// Check that `parent_code` names an existing group account.
///
/// # Errors
///
/// - [Error::ParentAccountNotFound] if the parent does not exist.
/// - [Error::ParentNotGroup] if the parent is a leaf.
pub fn check_parent_is_group(
    parent_code: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let parent = get_account(parent_code, connection).map_err(|error| match error {
        Error::AccountNotFound(code) => Error::ParentAccountNotFound(code),
        error => error,
    })?;

    if parent.acc_sublevel_format == 0 {
        return Err(Error::ParentNotGroup(parent_code.to_owned()));
    }

    Ok(())
}

pub fn count_children(acc_code: &str, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(*) FROM account WHERE acc_parent_code = ?1",
            [acc_code],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

pub fn count_journal_lines(acc_code: &str, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(*) FROM journal_detail WHERE jrd_acc_code = ?1",
            [acc_code],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Whether `acc_code` is `candidate` or one of its ancestors.
///
/// Walks the parent chain upwards from `candidate`. A chain that loops back
/// on itself is cut at the first repeated code.
pub fn is_self_or_ancestor(
    acc_code: &str,
    candidate: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    let mut statement =
        connection.prepare("SELECT acc_parent_code FROM account WHERE acc_code = ?1")?;
    let mut visited = HashSet::new();
    let mut current = Some(candidate.to_owned());

    while let Some(code) = current {
        if code == acc_code {
            return Ok(true);
        }

        if !visited.insert(code.clone()) {
            break;
        }

        current = statement
            .query_row([&code], |row| row.get::<_, Option<String>>(0))
            .optional()?
            .flatten();
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{AccountCategory, AccountType},
        db::initialize,
    };

    use super::{
        account_exists, count_children, get_account, is_self_or_ancestor, normalize_parent_code,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
            .execute_batch(
                "INSERT INTO account (acc_code, acc_name, acc_parent_code, acc_sublevel_format,
                    acc_type, acc_category, acc_created_at)
                VALUES ('02', 'Assets', NULL, 1, 'debit', 'asset', '2025-01-01 00:00:00.0+00:00'),
                       ('02/001', 'Current', '02', 1, 'debit', 'asset', '2025-01-01 00:00:00.0+00:00'),
                       ('02/001/001', 'Cash', '02/001', 0, 'debit', 'asset', '2025-01-01 00:00:00.0+00:00');",
            )
            .unwrap();
        connection
    }

    #[test]
    fn get_account_maps_enums() {
        let connection = get_test_connection();

        let account = get_account("02/001/001", &connection).unwrap();

        assert_eq!(account.acc_type, AccountType::Debit);
        assert_eq!(account.acc_category, AccountCategory::Asset);
        assert_eq!(account.acc_parent_code.as_deref(), Some("02/001"));
        assert!(account.is_leaf());
    }

    #[test]
    fn get_missing_account_is_account_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            get_account("09", &connection),
            Err(Error::AccountNotFound("09".to_owned()))
        );
    }

    #[test]
    fn exists_and_children() {
        let connection = get_test_connection();

        assert!(account_exists("02", &connection).unwrap());
        assert!(!account_exists("03", &connection).unwrap());
        assert_eq!(count_children("02", &connection), Ok(1));
        assert_eq!(count_children("02/001/001", &connection), Ok(0));
    }

    #[test]
    fn ancestor_walk_finds_deep_cycles() {
        let connection = get_test_connection();

        assert!(is_self_or_ancestor("02", "02/001/001", &connection).unwrap());
        assert!(is_self_or_ancestor("02/001", "02/001", &connection).unwrap());
        assert!(!is_self_or_ancestor("02/001/001", "02", &connection).unwrap());
    }

    #[test]
    fn ancestor_walk_terminates_on_corrupt_data() {
        let connection = get_test_connection();
        connection
            .execute_batch(
                "PRAGMA foreign_keys = OFF;
                UPDATE account SET acc_parent_code = '02/001' WHERE acc_code = '02';
                PRAGMA foreign_keys = ON;",
            )
            .unwrap();

        assert!(!is_self_or_ancestor("99", "02/001/001", &connection).unwrap());
    }

    #[test]
    fn parent_code_sentinels_mean_root() {
        assert_eq!(normalize_parent_code(None), None);
        assert_eq!(normalize_parent_code(Some("")), None);
        assert_eq!(normalize_parent_code(Some("0")), None);
        assert_eq!(
            normalize_parent_code(Some(" 02 ")),
            Some("02".to_owned())
        );
    }
}
