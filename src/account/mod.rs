//! The chart of accounts: accounts, their bank details and the account tree.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod bank_endpoints;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod query_endpoints;
mod tree;

pub use bank_endpoints::{
    delete_bank_info_endpoint, get_bank_info, get_bank_info_endpoint, save_bank_info,
    save_bank_info_endpoint, update_bank_info_endpoint,
};
pub use core::{
    Account, AccountBank, AccountCategory, AccountType, account_exists, check_parent_is_group,
    count_children, count_journal_lines, create_account_bank_table, create_account_table,
    find_account_bank, get_account, get_account_with_bank, is_self_or_ancestor,
    map_row_to_account, map_row_to_account_bank, normalize_parent_code,
};
pub use create_endpoint::{AccountForm, BankInfoForm, create_account, create_account_endpoint};
pub use delete_endpoint::{
    BulkDeleteRequest, BulkDeleteResult, DeleteFailure, delete_account, delete_account_endpoint,
    delete_accounts, delete_accounts_endpoint,
};
pub use edit_endpoint::{AccountUpdate, edit_account_endpoint, update_account};
pub use query_endpoints::{
    AccountStats, get_account_children_endpoint, get_account_endpoint, get_account_stats,
    get_account_stats_endpoint, get_account_tree_endpoint, get_accounts_by_category_endpoint,
    get_accounts_by_type_endpoint, get_accounts_endpoint, get_active_accounts, get_children,
};
pub use tree::{AccountNode, build_account_tree};

/// The state needed by the account endpoints.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
