//! Reading and deleting whole journal documents.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rusqlite::Connection;

use crate::{
    Error,
    auth::Claims,
    db::lock_connection,
    journal::{Journal, JournalState, check_journal_code, get_all_journals, get_journal},
    response::{Envelope, codes, success},
    user_log::{UserAction, log_user_action},
};

/// Delete a journal and its lines in one transaction.
///
/// # Errors
///
/// - [Error::InvalidJournalCode] if the code is malformed.
/// - [Error::JournalNotFound] if no journal has the code.
pub fn delete_journal(
    jrn_code: &str,
    deleted_by: &str,
    connection: &Connection,
) -> Result<(), Error> {
    check_journal_code(jrn_code)?;

    let transaction = connection.unchecked_transaction()?;
    transaction.execute(
        "DELETE FROM journal_detail WHERE jrd_jrn_code = ?1",
        [jrn_code],
    )?;
    let rows_affected =
        transaction.execute("DELETE FROM journal WHERE jrn_code = ?1", [jrn_code])?;

    if rows_affected == 0 {
        return Err(Error::JournalNotFound(jrn_code.to_owned()));
    }

    log_user_action(
        deleted_by,
        UserAction::Delete,
        "journal",
        jrn_code,
        &transaction,
    )?;
    transaction.commit()?;

    Ok(())
}

pub async fn get_journals_endpoint(
    State(state): State<JournalState>,
) -> Result<Json<Envelope<Vec<Journal>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(codes::JOURNAL_LIST, get_all_journals(&connection)?))
}

pub async fn get_journal_endpoint(
    State(state): State<JournalState>,
    Path(jrn_code): Path<String>,
) -> Result<Json<Envelope<Journal>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::JOURNAL_DETAIL,
        get_journal(&jrn_code, &connection)?,
    ))
}

pub async fn delete_journal_endpoint(
    State(state): State<JournalState>,
    Extension(claims): Extension<Claims>,
    Path(jrn_code): Path<String>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_journal(&jrn_code, &claims.id, &connection)?;
    tracing::info!("Journal {jrn_code} deleted by {}", claims.id);

    Ok(success(codes::RECORD_DELETED, ()))
}
