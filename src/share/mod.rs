//! Shareholdings in projects, share transfers and profit distributions.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{AppState, Error};

mod profit;
mod shareholding;
mod transfer;

pub use profit::{
    ShareProfit, ShareProfitForm, create_share_profit, create_share_profit_endpoint,
    create_share_profit_table, delete_share_profit, delete_share_profit_endpoint,
    get_all_share_profits, get_share_profit, get_share_profit_endpoint,
    get_share_profits_endpoint, update_share_profit, update_share_profit_endpoint,
};
pub use shareholding::{
    Shareholding, ShareholdingForm, create_shareholding, create_shareholding_endpoint,
    create_shareholding_table, delete_shareholding, delete_shareholding_endpoint,
    get_all_shareholdings, get_shareholding, get_shareholding_endpoint,
    get_shareholdings_endpoint, update_shareholding, update_shareholding_endpoint,
};
pub use transfer::{
    ShareTransfer, ShareTransferForm, create_share_transfer, create_share_transfer_endpoint,
    create_share_transfer_table, delete_share_transfer, delete_share_transfer_endpoint,
    get_all_share_transfers, get_share_transfer, get_share_transfer_endpoint,
    get_share_transfers_endpoint, update_share_transfer, update_share_transfer_endpoint,
};

/// The state needed by the share endpoints.
#[derive(Debug, Clone)]
pub struct ShareState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ShareState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn required_code<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, Error> {
    match value.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(Error::MissingRequiredFields(name.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        person::{PersonForm, create_person},
        project::{ProjectForm, create_project},
    };

    /// A database with project `PRJ1` and persons `P001` and `P002`.
    pub(super) fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_project(
            &ProjectForm {
                prj_code: Some("PRJ1".to_owned()),
                prj_title: Some("Saba Residence".to_owned()),
                ..Default::default()
            },
            "SabaAdmin",
            &connection,
        )
        .unwrap();

        for (code, name) in [("P001", "Sara"), ("P002", "Reza")] {
            create_person(
                &PersonForm {
                    per_code: Some(code.to_owned()),
                    per_name: Some(name.to_owned()),
                    ..Default::default()
                },
                "SabaAdmin",
                &connection,
            )
            .unwrap();
        }

        connection
    }
}
