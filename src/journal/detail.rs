//! Editing single journal lines.

use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    db::lock_connection,
    journal::{
        JournalDetail, JournalLineForm, JournalState,
        core::{SELECT_JOURNAL_DETAIL, map_row_to_journal_detail},
        check_journal_code, journal_exists, validate_line,
    },
    response::{Envelope, codes, success},
};

/// A line added to an existing journal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJournalDetail {
    pub jrd_jrn_code: Option<String>,
    /// Appended after the last line when absent.
    pub jrd_line_no: Option<i64>,
    #[serde(flatten)]
    pub line: JournalLineForm,
}

/// Add a line to a journal.
///
/// # Errors
///
/// - [Error::InvalidJournalCode] if the code is malformed.
/// - [Error::JournalNotFound] if the journal does not exist.
/// - [Error::InvalidJournalLine] if the line breaks the posting rules.
/// - [Error::DuplicateRecord] if the line number is taken.
pub fn create_journal_detail(
    form: &NewJournalDetail,
    connection: &Connection,
) -> Result<JournalDetail, Error> {
    let jrn_code = form
        .jrd_jrn_code
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| Error::MissingRequiredFields("jrdJrnCode".to_owned()))?;
    check_journal_code(jrn_code)?;

    if !journal_exists(jrn_code, connection)? {
        return Err(Error::JournalNotFound(jrn_code.to_owned()));
    }

    let line_no = match form.jrd_line_no {
        Some(line_no) if line_no < 1 => {
            return Err(Error::Validation(
                "jrdLineNo must be at least 1".to_owned(),
            ));
        }
        Some(line_no) => line_no,
        None => connection.query_row(
            "SELECT COALESCE(MAX(jrd_line_no), 0) + 1 FROM journal_detail WHERE jrd_jrn_code = ?1",
            [jrn_code],
            |row| row.get(0),
        )?,
    };

    let (acc_code, debit, credit) = validate_line(line_no as usize, &form.line, connection)?;

    connection.execute(
        "INSERT INTO journal_detail (jrd_jrn_code, jrd_line_no, jrd_acc_code, jrd_desc,
            jrd_debit, jrd_credit)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (jrn_code, line_no, acc_code, &form.line.jrd_desc, debit, credit),
    )?;

    get_journal_detail(jrn_code, line_no, connection)
}

/// Every journal line, ordered by journal and line number.
pub fn get_all_journal_details(connection: &Connection) -> Result<Vec<JournalDetail>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_JOURNAL_DETAIL} ORDER BY jrd_jrn_code, jrd_line_no"
        ))?
        .query_map([], map_row_to_journal_detail)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn get_journal_detail(
    jrn_code: &str,
    line_no: i64,
    connection: &Connection,
) -> Result<JournalDetail, Error> {
    check_journal_code(jrn_code)?;

    connection
        .prepare(&format!(
            "{SELECT_JOURNAL_DETAIL} WHERE jrd_jrn_code = :jrn_code AND jrd_line_no = :line_no"
        ))?
        .query_row(
            rusqlite::named_params! {":jrn_code": jrn_code, ":line_no": line_no},
            map_row_to_journal_detail,
        )
        .map_err(Error::from)
}

/// Replace the account, description and amounts of a line.
pub fn update_journal_detail(
    jrn_code: &str,
    line_no: i64,
    form: &JournalLineForm,
    connection: &Connection,
) -> Result<JournalDetail, Error> {
    check_journal_code(jrn_code)?;
    let (acc_code, debit, credit) = validate_line(line_no.max(1) as usize, form, connection)?;

    let rows_affected = connection.execute(
        "UPDATE journal_detail SET jrd_acc_code = ?1, jrd_desc = ?2, jrd_debit = ?3,
            jrd_credit = ?4
        WHERE jrd_jrn_code = ?5 AND jrd_line_no = ?6",
        (acc_code, &form.jrd_desc, debit, credit, jrn_code, line_no),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_journal_detail(jrn_code, line_no, connection)
}

pub fn delete_journal_detail(
    jrn_code: &str,
    line_no: i64,
    connection: &Connection,
) -> Result<(), Error> {
    check_journal_code(jrn_code)?;

    let rows_affected = connection.execute(
        "DELETE FROM journal_detail WHERE jrd_jrn_code = ?1 AND jrd_line_no = ?2",
        (jrn_code, line_no),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

pub async fn create_journal_detail_endpoint(
    State(state): State<JournalState>,
    Json(form): Json<NewJournalDetail>,
) -> Result<Json<Envelope<JournalDetail>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let detail = create_journal_detail(&form, &connection)?;

    Ok(success(codes::RECORD_CREATED, detail))
}

pub async fn get_journal_details_endpoint(
    State(state): State<JournalState>,
) -> Result<Json<Envelope<Vec<JournalDetail>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::JOURNAL_LINE_LIST,
        get_all_journal_details(&connection)?,
    ))
}

pub async fn get_journal_detail_endpoint(
    State(state): State<JournalState>,
    Path((jrn_code, line_no)): Path<(String, i64)>,
) -> Result<Json<Envelope<JournalDetail>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::JOURNAL_LINE_DETAIL,
        get_journal_detail(&jrn_code, line_no, &connection)?,
    ))
}

pub async fn update_journal_detail_endpoint(
    State(state): State<JournalState>,
    Path((jrn_code, line_no)): Path<(String, i64)>,
    Json(form): Json<JournalLineForm>,
) -> Result<Json<Envelope<JournalDetail>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let detail = update_journal_detail(&jrn_code, line_no, &form, &connection)?;

    Ok(success(codes::RECORD_UPDATED, detail))
}

pub async fn delete_journal_detail_endpoint(
    State(state): State<JournalState>,
    Path((jrn_code, line_no)): Path<(String, i64)>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_journal_detail(&jrn_code, line_no, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}
