//! Journal documents, their lines and fiscal year codes.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, account::get_account};

/// The largest suffix a fiscal year code can hold.
pub const MAX_JOURNAL_SEQUENCE: u32 = 999_999;

/// The amount by which debits and credits may differ in a balanced journal.
pub const BALANCE_TOLERANCE: f64 = 0.01;

/// A journal document header and its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    /// `YYYY.NNNNNN`, the fiscal year followed by a sequence number.
    pub jrn_code: String,
    pub jrn_date: Date,
    pub jrn_desc: Option<String>,
    pub jrn_module: Option<String>,
    pub jrn_ref_code: Option<String>,
    pub jrn_is_posted: bool,
    pub jrn_created_by: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub jrn_created_at: OffsetDateTime,
    /// Ordered by line number.
    #[serde(default)]
    pub journal_details: Vec<JournalDetail>,
}

/// One posting line of a journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalDetail {
    pub jrd_jrn_code: String,
    pub jrd_line_no: i64,
    pub jrd_acc_code: String,
    pub jrd_desc: Option<String>,
    pub jrd_debit: f64,
    pub jrd_credit: f64,
}

/// A journal line as sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLineForm {
    pub jrd_acc_code: Option<String>,
    pub jrd_desc: Option<String>,
    pub jrd_debit: Option<f64>,
    pub jrd_credit: Option<f64>,
}

pub fn create_journal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS journal (
            jrn_code TEXT PRIMARY KEY,
            jrn_date TEXT NOT NULL,
            jrn_desc TEXT,
            jrn_module TEXT,
            jrn_ref_code TEXT,
            jrn_is_posted INTEGER NOT NULL DEFAULT 0,
            jrn_created_by TEXT,
            jrn_created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn create_journal_detail_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS journal_detail (
            jrd_jrn_code TEXT NOT NULL REFERENCES journal(jrn_code) ON DELETE CASCADE,
            jrd_line_no INTEGER NOT NULL,
            jrd_acc_code TEXT NOT NULL REFERENCES account(acc_code),
            jrd_desc TEXT,
            jrd_debit REAL NOT NULL DEFAULT 0 CHECK (jrd_debit >= 0),
            jrd_credit REAL NOT NULL DEFAULT 0 CHECK (jrd_credit >= 0),
            PRIMARY KEY (jrd_jrn_code, jrd_line_no)
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_journal_detail_acc_code ON journal_detail(jrd_acc_code)",
        (),
    )?;

    Ok(())
}

const SELECT_JOURNAL: &str = "SELECT jrn_code, jrn_date, jrn_desc, jrn_module, jrn_ref_code,
    jrn_is_posted, jrn_created_by, jrn_created_at
    FROM journal";

pub(crate) const SELECT_JOURNAL_DETAIL: &str = "SELECT jrd_jrn_code, jrd_line_no, jrd_acc_code,
    jrd_desc, jrd_debit, jrd_credit
    FROM journal_detail";

pub fn map_row_to_journal(row: &Row) -> Result<Journal, rusqlite::Error> {
    Ok(Journal {
        jrn_code: row.get(0)?,
        jrn_date: row.get(1)?,
        jrn_desc: row.get(2)?,
        jrn_module: row.get(3)?,
        jrn_ref_code: row.get(4)?,
        jrn_is_posted: row.get(5)?,
        jrn_created_by: row.get(6)?,
        jrn_created_at: row.get(7)?,
        journal_details: Vec::new(),
    })
}

pub fn map_row_to_journal_detail(row: &Row) -> Result<JournalDetail, rusqlite::Error> {
    Ok(JournalDetail {
        jrd_jrn_code: row.get(0)?,
        jrd_line_no: row.get(1)?,
        jrd_acc_code: row.get(2)?,
        jrd_desc: row.get(3)?,
        jrd_debit: row.get(4)?,
        jrd_credit: row.get(5)?,
    })
}

/// Whether `code` has the `YYYY.NNNNNN` shape.
pub fn is_valid_journal_code(code: &str) -> bool {
    let bytes = code.as_bytes();

    bytes.len() == 11
        && bytes[4] == b'.'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

/// Reject codes that are not `YYYY.NNNNNN`.
pub fn check_journal_code(code: &str) -> Result<(), Error> {
    if is_valid_journal_code(code) {
        Ok(())
    } else {
        Err(Error::InvalidJournalCode(code.to_owned()))
    }
}

/// Whether the client asked for a new document.
pub fn is_new_journal_code(code: Option<&str>) -> bool {
    match code.map(str::trim) {
        None | Some("") => true,
        Some(code) => code.eq_ignore_ascii_case("new") || code == "جدید",
    }
}

/// Allocate the next code in the fiscal year of `date`.
///
/// The suffix of the highest existing code in the year is incremented, so
/// gaps left by deleted documents are not reused.
///
/// # Errors
///
/// - [Error::InvalidFiscalYear] if the year does not fit in four digits.
/// - [Error::JournalSequenceExhausted] if the year already has 999999 documents.
pub fn next_journal_code(date: Date, connection: &Connection) -> Result<String, Error> {
    let year = date.year();

    if !(1..=9999).contains(&year) {
        return Err(Error::InvalidFiscalYear(year));
    }

    let prefix = format!("{year:04}.");
    let last_code: Option<String> = connection
        .query_row(
            "SELECT jrn_code FROM journal WHERE substr(jrn_code, 1, 5) = ?1
            ORDER BY jrn_code DESC LIMIT 1",
            [&prefix],
            |row| row.get(0),
        )
        .optional()?;

    let next = match last_code {
        Some(code) => code[prefix.len()..]
            .parse::<u32>()
            .map_err(|_| Error::InvalidJournalCode(code.clone()))?
            + 1,
        None => 1,
    };

    if next > MAX_JOURNAL_SEQUENCE {
        return Err(Error::JournalSequenceExhausted(year));
    }

    Ok(format!("{prefix}{next:06}"))
}

/// Check a line against the chart of accounts and the amount rules.
///
/// `line` is the 1-based position reported back in errors.
pub fn validate_line(
    line: usize,
    form: &JournalLineForm,
    connection: &Connection,
) -> Result<(String, f64, f64), Error> {
    let invalid = |reason: String| Error::InvalidJournalLine { line, reason };

    let acc_code = match form.jrd_acc_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => return Err(invalid("jrdAccCode is required".to_owned())),
    };

    let account = match get_account(acc_code, connection) {
        Ok(account) => account,
        Err(Error::AccountNotFound(_)) => {
            return Err(invalid(format!("account {acc_code} does not exist")));
        }
        Err(error) => return Err(error),
    };

    if !account.is_leaf() {
        return Err(invalid(format!(
            "account {acc_code} is a group account and cannot receive postings"
        )));
    }

    let debit = form.jrd_debit.unwrap_or(0.0);
    let credit = form.jrd_credit.unwrap_or(0.0);

    if !debit.is_finite() || !credit.is_finite() || debit < 0.0 || credit < 0.0 {
        return Err(invalid("amounts must be non-negative numbers".to_owned()));
    }

    if debit != 0.0 && credit != 0.0 {
        return Err(invalid(
            "a line cannot have both a debit and a credit".to_owned(),
        ));
    }

    Ok((acc_code.to_owned(), debit, credit))
}

/// Get the journal `jrn_code` with its lines in order.
///
/// # Errors
///
/// - [Error::InvalidJournalCode] if the code is malformed.
/// - [Error::JournalNotFound] if no journal has the code.
pub fn get_journal(jrn_code: &str, connection: &Connection) -> Result<Journal, Error> {
    check_journal_code(jrn_code)?;

    let mut journal = connection
        .prepare(&format!("{SELECT_JOURNAL} WHERE jrn_code = :jrn_code"))?
        .query_row(&[(":jrn_code", &jrn_code)], map_row_to_journal)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::JournalNotFound(jrn_code.to_owned()),
            error => error,
        })?;

    journal.journal_details = connection
        .prepare(&format!(
            "{SELECT_JOURNAL_DETAIL} WHERE jrd_jrn_code = :jrn_code ORDER BY jrd_line_no"
        ))?
        .query_map(&[(":jrn_code", &jrn_code)], map_row_to_journal_detail)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(journal)
}

/// All journal headers ordered by code, without their lines.
pub fn get_all_journals(connection: &Connection) -> Result<Vec<Journal>, Error> {
    connection
        .prepare(&format!("{SELECT_JOURNAL} ORDER BY jrn_code"))?
        .query_map([], map_row_to_journal)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn journal_exists(jrn_code: &str, connection: &Connection) -> Result<bool, Error> {
    let found = connection
        .query_row(
            "SELECT 1 FROM journal WHERE jrn_code = ?1",
            [jrn_code],
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountForm, create_account},
        db::initialize,
    };

    use super::{
        JournalLineForm, check_journal_code, is_new_journal_code, is_valid_journal_code,
        next_journal_code, validate_line,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        for (code, parent, sublevel_format) in [("01", None, 1), ("01/001", Some("01"), 0)] {
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

    fn insert_journal(code: &str, connection: &Connection) {
        connection
            .execute(
                "INSERT INTO journal (jrn_code, jrn_date, jrn_created_at)
                VALUES (?1, '2025-01-01', '2025-01-01 00:00:00.0+00:00')",
                [code],
            )
            .unwrap();
    }

    #[test]
    fn code_shape() {
        assert!(is_valid_journal_code("2025.000001"));
        assert!(!is_valid_journal_code("2025.00001"));
        assert!(!is_valid_journal_code("2025-000001"));
        assert!(!is_valid_journal_code("20a5.000001"));
        assert!(!is_valid_journal_code("٢٠٢٥.000001"));
        assert_eq!(
            check_journal_code("new"),
            Err(Error::InvalidJournalCode("new".to_owned()))
        );
    }

    #[test]
    fn new_code_markers() {
        assert!(is_new_journal_code(None));
        assert!(is_new_journal_code(Some("new")));
        assert!(is_new_journal_code(Some("جدید")));
        assert!(!is_new_journal_code(Some("2025.000001")));
    }

    #[test]
    fn first_code_of_year() {
        let connection = get_test_connection();

        assert_eq!(
            next_journal_code(date!(2025 - 03 - 21), &connection),
            Ok("2025.000001".to_owned())
        );
    }

    #[test]
    fn next_code_follows_highest_in_same_year() {
        let connection = get_test_connection();
        insert_journal("2025.000007", &connection);
        insert_journal("2025.000003", &connection);
        insert_journal("2026.000100", &connection);

        assert_eq!(
            next_journal_code(date!(2025 - 06 - 01), &connection),
            Ok("2025.000008".to_owned())
        );
        assert_eq!(
            next_journal_code(date!(2024 - 06 - 01), &connection),
            Ok("2024.000001".to_owned())
        );
    }

    #[test]
    fn exhausted_sequence_fails() {
        let connection = get_test_connection();
        insert_journal("2025.999999", &connection);

        assert_eq!(
            next_journal_code(date!(2025 - 06 - 01), &connection),
            Err(Error::JournalSequenceExhausted(2025))
        );
    }

    #[test]
    fn year_zero_is_rejected() {
        let connection = get_test_connection();

        assert_eq!(
            next_journal_code(date!(0000 - 01 - 01), &connection),
            Err(Error::InvalidFiscalYear(0))
        );
    }

    fn line(acc_code: &str, debit: Option<f64>, credit: Option<f64>) -> JournalLineForm {
        JournalLineForm {
            jrd_acc_code: Some(acc_code.to_owned()),
            jrd_desc: None,
            jrd_debit: debit,
            jrd_credit: credit,
        }
    }

    #[test]
    fn valid_line_defaults_missing_amount() {
        let connection = get_test_connection();

        assert_eq!(
            validate_line(1, &line("01/001", Some(5.0), None), &connection),
            Ok(("01/001".to_owned(), 5.0, 0.0))
        );
    }

    #[test]
    fn line_rules() {
        let connection = get_test_connection();
        let rejected = |form: JournalLineForm| {
            matches!(
                validate_line(2, &form, &connection),
                Err(Error::InvalidJournalLine { line: 2, .. })
            )
        };

        assert!(rejected(line("09", Some(1.0), None)));
        assert!(rejected(line("01", Some(1.0), None)));
        assert!(rejected(line("01/001", Some(-1.0), None)));
        assert!(rejected(line("01/001", Some(1.0), Some(1.0))));
        assert!(rejected(JournalLineForm::default()));
    }
}
