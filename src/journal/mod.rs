//! Journal documents: saving, reading, deleting and line-level edits.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod detail;
mod query;
mod save;

pub use core::{
    BALANCE_TOLERANCE, Journal, JournalDetail, JournalLineForm, MAX_JOURNAL_SEQUENCE,
    check_journal_code, create_journal_detail_table, create_journal_table, get_all_journals,
    get_journal, is_new_journal_code, is_valid_journal_code, journal_exists,
    map_row_to_journal, map_row_to_journal_detail, next_journal_code, validate_line,
};
pub use detail::{
    NewJournalDetail, create_journal_detail, create_journal_detail_endpoint,
    delete_journal_detail, delete_journal_detail_endpoint, get_all_journal_details,
    get_journal_detail, get_journal_detail_endpoint, get_journal_details_endpoint,
    update_journal_detail, update_journal_detail_endpoint,
};
pub use query::{
    delete_journal, delete_journal_endpoint, get_journal_endpoint, get_journals_endpoint,
};
pub use save::{JournalForm, save_journal, save_journal_endpoint, update_journal_endpoint};

/// The state needed by the journal endpoints.
#[derive(Debug, Clone)]
pub struct JournalState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for JournalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
