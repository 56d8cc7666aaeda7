//! Saving journal documents.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::Claims,
    db::lock_connection,
    journal::{
        BALANCE_TOLERANCE, Journal, JournalLineForm, JournalState, check_journal_code,
        get_journal, is_new_journal_code, journal_exists, next_journal_code, validate_line,
    },
    response::{Envelope, codes, success},
    user_log::{UserAction, log_user_action},
};

/// A journal document as sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalForm {
    /// `new`, `جدید` or absent for a new document, otherwise the code to replace.
    pub jrn_code: Option<String>,
    pub jrn_date: Option<Date>,
    pub jrn_desc: Option<String>,
    pub jrn_module: Option<String>,
    pub jrn_ref_code: Option<String>,
    pub jrn_is_posted: Option<bool>,
    #[serde(default)]
    pub journal_details: Vec<JournalLineForm>,
}

/// Create or replace a journal document.
///
/// A new document gets the next code of its fiscal year. An existing one has
/// its header and lines deleted and written again under the same code. Lines
/// are numbered from 1 in the order given. Posted documents must balance.
///
/// Everything runs in one immediate transaction, so a failure leaves the
/// previous version of the document untouched.
///
/// # Errors
///
/// - [Error::MissingRequiredFields] if `jrnDate` is missing.
/// - [Error::InvalidJournalCode] if an existing code is malformed.
/// - [Error::JournalNotFound] if the document to replace does not exist.
/// - [Error::InvalidJournalLine] if a line breaks the posting rules.
/// - [Error::UnbalancedJournal] if a posted document does not balance.
pub fn save_journal(
    form: &JournalForm,
    created_by: &str,
    connection: &Connection,
) -> Result<Journal, Error> {
    let jrn_date = form
        .jrn_date
        .ok_or_else(|| Error::MissingRequiredFields("jrnDate".to_owned()))?;
    let is_posted = form.jrn_is_posted.unwrap_or(false);

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let (jrn_code, action) = if is_new_journal_code(form.jrn_code.as_deref()) {
        (next_journal_code(jrn_date, &transaction)?, UserAction::Create)
    } else {
        let jrn_code = form.jrn_code.as_deref().unwrap_or_default().trim().to_owned();
        check_journal_code(&jrn_code)?;

        if !journal_exists(&jrn_code, &transaction)? {
            return Err(Error::JournalNotFound(jrn_code));
        }

        transaction.execute(
            "DELETE FROM journal_detail WHERE jrd_jrn_code = ?1",
            [&jrn_code],
        )?;
        transaction.execute("DELETE FROM journal WHERE jrn_code = ?1", [&jrn_code])?;

        (jrn_code, UserAction::Update)
    };

    let mut lines = Vec::with_capacity(form.journal_details.len());
    let (mut total_debit, mut total_credit) = (0.0, 0.0);

    for (index, line) in form.journal_details.iter().enumerate() {
        let (acc_code, debit, credit) = validate_line(index + 1, line, &transaction)?;
        total_debit += debit;
        total_credit += credit;
        lines.push((acc_code, &line.jrd_desc, debit, credit));
    }

    if is_posted && (total_debit - total_credit).abs() > BALANCE_TOLERANCE {
        return Err(Error::UnbalancedJournal {
            debit: total_debit,
            credit: total_credit,
        });
    }

    transaction.execute(
        "INSERT INTO journal (jrn_code, jrn_date, jrn_desc, jrn_module, jrn_ref_code,
            jrn_is_posted, jrn_created_by, jrn_created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            &jrn_code,
            jrn_date,
            &form.jrn_desc,
            &form.jrn_module,
            &form.jrn_ref_code,
            is_posted,
            created_by,
            OffsetDateTime::now_utc(),
        ),
    )?;

    {
        let mut statement = transaction.prepare(
            "INSERT INTO journal_detail (jrd_jrn_code, jrd_line_no, jrd_acc_code, jrd_desc,
                jrd_debit, jrd_credit)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        for (line_no, (acc_code, desc, debit, credit)) in (1_i64..).zip(&lines) {
            statement.execute((&jrn_code, line_no, acc_code, desc, debit, credit))?;
        }
    }

    log_user_action(created_by, action, "journal", &jrn_code, &transaction)?;
    transaction.commit()?;

    get_journal(&jrn_code, connection)
}

/// A route handler for saving a journal, new or existing.
pub async fn save_journal_endpoint(
    State(state): State<JournalState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<JournalForm>,
) -> Result<Json<Envelope<Journal>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let journal = save_journal(&form, &claims.id, &connection)?;
    tracing::info!("Journal {} saved by {}", journal.jrn_code, claims.id);

    Ok(success(codes::RECORD_CREATED, journal))
}

/// A route handler for replacing the journal named in the path.
pub async fn update_journal_endpoint(
    State(state): State<JournalState>,
    Extension(claims): Extension<Claims>,
    Path(jrn_code): Path<String>,
    Json(mut form): Json<JournalForm>,
) -> Result<Json<Envelope<Journal>>, Error> {
    form.jrn_code = Some(jrn_code);
    let connection = lock_connection(&state.db_connection)?;
    let journal = save_journal(&form, &claims.id, &connection)?;
    tracing::info!("Journal {} replaced by {}", journal.jrn_code, claims.id);

    Ok(success(codes::RECORD_CREATED, journal))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountForm, create_account},
        db::initialize,
        journal::{JournalLineForm, get_all_journals, get_journal},
    };

    use super::{JournalForm, save_journal};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        for (code, parent, sublevel_format) in [
            ("01", None, 1),
            ("01/001", Some("01"), 0),
            ("01/002", Some("01"), 0),
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

    fn line(acc_code: &str, debit: f64, credit: f64) -> JournalLineForm {
        JournalLineForm {
            jrd_acc_code: Some(acc_code.to_owned()),
            jrd_desc: None,
            jrd_debit: Some(debit),
            jrd_credit: Some(credit),
        }
    }

    fn balanced_form(code: &str) -> JournalForm {
        JournalForm {
            jrn_code: Some(code.to_owned()),
            jrn_date: Some(date!(2025 - 05 - 01)),
            jrn_desc: Some("Rent".to_owned()),
            jrn_is_posted: Some(true),
            journal_details: vec![line("01/001", 100.0, 0.0), line("01/002", 0.0, 100.0)],
            ..Default::default()
        }
    }

    #[test]
    fn new_journal_gets_code_and_numbered_lines() {
        let connection = get_test_connection();

        let journal = save_journal(&balanced_form("new"), "P001", &connection).unwrap();

        assert_eq!(journal.jrn_code, "2025.000001");
        assert!(journal.jrn_is_posted);
        let line_numbers: Vec<_> = journal
            .journal_details
            .iter()
            .map(|line| line.jrd_line_no)
            .collect();
        assert_eq!(line_numbers, vec![1, 2]);
        assert_eq!(journal.journal_details[0].jrd_acc_code, "01/001");
    }

    #[test]
    fn persian_new_marker_allocates_sequentially() {
        let connection = get_test_connection();
        save_journal(&balanced_form("new"), "P001", &connection).unwrap();

        let journal = save_journal(&balanced_form("جدید"), "P001", &connection).unwrap();

        assert_eq!(journal.jrn_code, "2025.000002");
    }

    #[test]
    fn existing_journal_is_replaced() {
        let connection = get_test_connection();
        save_journal(&balanced_form("new"), "P001", &connection).unwrap();
        let mut form = balanced_form("2025.000001");
        form.jrn_desc = Some("Rent, corrected".to_owned());
        form.journal_details = vec![
            line("01/002", 50.0, 0.0),
            line("01/001", 0.0, 30.0),
            line("01/001", 0.0, 20.0),
        ];

        let journal = save_journal(&form, "P001", &connection).unwrap();

        assert_eq!(journal.jrn_code, "2025.000001");
        assert_eq!(journal.jrn_desc.as_deref(), Some("Rent, corrected"));
        assert_eq!(journal.journal_details.len(), 3);
        assert_eq!(get_all_journals(&connection).unwrap().len(), 1);
    }

    #[test]
    fn replacing_missing_journal_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            save_journal(&balanced_form("2025.000042"), "P001", &connection),
            Err(Error::JournalNotFound("2025.000042".to_owned()))
        );
    }

    #[test]
    fn malformed_code_is_rejected() {
        let connection = get_test_connection();

        assert_eq!(
            save_journal(&balanced_form("2025-42"), "P001", &connection),
            Err(Error::InvalidJournalCode("2025-42".to_owned()))
        );
    }

    #[test]
    fn unbalanced_posted_journal_is_rejected() {
        let connection = get_test_connection();
        let mut form = balanced_form("new");
        form.journal_details = vec![line("01/001", 100.0, 0.0), line("01/002", 0.0, 90.0)];

        assert_eq!(
            save_journal(&form, "P001", &connection),
            Err(Error::UnbalancedJournal {
                debit: 100.0,
                credit: 90.0
            })
        );
    }

    #[test]
    fn unbalanced_draft_is_accepted() {
        let connection = get_test_connection();
        let mut form = balanced_form("new");
        form.jrn_is_posted = None;
        form.journal_details = vec![line("01/001", 100.0, 0.0)];

        let journal = save_journal(&form, "P001", &connection).unwrap();

        assert!(!journal.jrn_is_posted);
    }

    #[test]
    fn balance_tolerates_rounding() {
        let connection = get_test_connection();
        let mut form = balanced_form("new");
        form.journal_details = vec![line("01/001", 100.005, 0.0), line("01/002", 0.0, 100.0)];

        assert!(save_journal(&form, "P001", &connection).is_ok());
    }

    #[test]
    fn failed_replace_keeps_previous_version() {
        let connection = get_test_connection();
        save_journal(&balanced_form("new"), "P001", &connection).unwrap();
        let mut form = balanced_form("2025.000001");
        form.journal_details = vec![line("01/001", 10.0, 0.0), line("01", 0.0, 10.0)];

        let result = save_journal(&form, "P001", &connection);

        assert!(matches!(
            result,
            Err(Error::InvalidJournalLine { line: 2, .. })
        ));
        let journal = get_journal("2025.000001", &connection).unwrap();
        assert_eq!(journal.jrn_desc.as_deref(), Some("Rent"));
        assert_eq!(journal.journal_details.len(), 2);
    }

    #[test]
    fn missing_date_is_rejected() {
        let connection = get_test_connection();
        let mut form = balanced_form("new");
        form.jrn_date = None;

        assert_eq!(
            save_journal(&form, "P001", &connection),
            Err(Error::MissingRequiredFields("jrnDate".to_owned()))
        );
    }
}
