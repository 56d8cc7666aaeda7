//! Wallets held by persons and the transactions on them.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod transaction;

pub use core::{
    Wallet, WalletForm, create_wallet, create_wallet_endpoint, create_wallet_table,
    delete_wallet, delete_wallet_endpoint, get_all_wallets, get_wallet, get_wallet_endpoint,
    get_wallets_endpoint, open_wallet, update_wallet, update_wallet_endpoint,
};
pub use transaction::{
    WalletTransaction, WalletTransactionForm, create_wallet_transaction,
    create_wallet_transaction_endpoint, create_wallet_transaction_table,
    delete_wallet_transaction, delete_wallet_transaction_endpoint, get_all_wallet_transactions,
    get_wallet_transaction, get_wallet_transaction_endpoint, get_wallet_transactions_endpoint,
    update_wallet_transaction, update_wallet_transaction_endpoint,
};

/// The state needed by the wallet endpoints.
#[derive(Debug, Clone)]
pub struct WalletState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for WalletState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        person::{PersonForm, create_person},
    };

    /// A database with person `P001`.
    pub(super) fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_person(
            &PersonForm {
                per_code: Some("P001".to_owned()),
                per_name: Some("Sara".to_owned()),
                ..Default::default()
            },
            "SabaAdmin",
            &connection,
        )
        .unwrap();
        connection
    }
}
