//! Builds the nested chart of accounts from flat rows.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::account::Account;

/// The legacy parent code used for root accounts.
const ROOT_SENTINEL: &str = "0";

/// An account and its sub-accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountNode {
    #[serde(flatten)]
    pub account: Account,
    pub children: Vec<AccountNode>,
}

fn is_root(account: &Account) -> bool {
    match account.acc_parent_code.as_deref() {
        None => true,
        Some(code) => code == ROOT_SENTINEL,
    }
}

/// Nest `accounts` under their parents.
///
/// Roots are accounts without a parent. Children keep the order of
/// `accounts` and are only expanded for group accounts, so leaves always have
/// an empty `children` list. Accounts whose parent is missing from `accounts`
/// do not appear in the tree.
///
/// An account that is already on the path from the root is not expanded
/// again, which keeps corrupt parent links from recursing forever.
pub fn build_account_tree(accounts: &[Account]) -> Vec<AccountNode> {
    let mut path = HashSet::new();

    accounts
        .iter()
        .filter(|account| is_root(account))
        .map(|root| build_node(root, accounts, &mut path))
        .collect()
}

fn build_node<'a>(
    account: &'a Account,
    accounts: &'a [Account],
    path: &mut HashSet<&'a str>,
) -> AccountNode {
    let mut node = AccountNode {
        account: account.clone(),
        children: Vec::new(),
    };

    if account.is_leaf() || !path.insert(account.acc_code.as_str()) {
        return node;
    }

    for child in accounts {
        if child.acc_parent_code.as_deref() != Some(account.acc_code.as_str())
            || path.contains(child.acc_code.as_str())
        {
            continue;
        }

        node.children.push(build_node(child, accounts, path));
    }

    path.remove(account.acc_code.as_str());

    node
}
