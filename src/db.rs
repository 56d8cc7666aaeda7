//! Creates the application's database schema.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    account::{create_account_bank_table, create_account_table},
    auth::create_user_account_table,
    journal::{create_journal_detail_table, create_journal_table},
    person::create_person_table,
    project::create_project_table,
    report::create_report_views,
    reservation::create_reservation_table,
    share::{create_share_profit_table, create_share_transfer_table, create_shareholding_table},
    theme::create_theme_tables,
    unit::create_unit_table,
    user_log::create_user_log_table,
    wallet::{create_wallet_table, create_wallet_transaction_table},
};

/// Create the all of the database tables and views for the application.
///
/// Foreign key enforcement is switched on for `connection` first, since
/// SQLite ignores that pragma inside a transaction.
///
/// # Errors
/// This function may return a [rusqlite::Error] if something went wrong creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_account_bank_table(&transaction)?;
    create_person_table(&transaction)?;
    create_user_account_table(&transaction)?;
    create_project_table(&transaction)?;
    create_unit_table(&transaction)?;
    create_reservation_table(&transaction)?;
    create_journal_table(&transaction)?;
    create_journal_detail_table(&transaction)?;
    create_shareholding_table(&transaction)?;
    create_share_transfer_table(&transaction)?;
    create_share_profit_table(&transaction)?;
    create_wallet_table(&transaction)?;
    create_wallet_transaction_table(&transaction)?;
    create_user_log_table(&transaction)?;
    create_theme_tables(&transaction)?;
    create_report_views(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
