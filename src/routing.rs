//! Application router configuration with public, authenticated and manager-only route definitions.

use std::path::Path;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
};

use crate::{
    AppState, Error,
    account::{
        create_account_endpoint, delete_account_endpoint, delete_accounts_endpoint,
        delete_bank_info_endpoint, edit_account_endpoint, get_account_children_endpoint,
        get_account_endpoint, get_account_stats_endpoint, get_account_tree_endpoint,
        get_accounts_by_category_endpoint, get_accounts_by_type_endpoint, get_accounts_endpoint,
        get_bank_info_endpoint, save_bank_info_endpoint, update_bank_info_endpoint,
    },
    auth::{auth_guard, log_in, manager_guard, register_user},
    endpoints,
    journal::{
        create_journal_detail_endpoint, delete_journal_detail_endpoint, delete_journal_endpoint,
        get_journal_detail_endpoint, get_journal_details_endpoint, get_journal_endpoint,
        get_journals_endpoint, save_journal_endpoint, update_journal_detail_endpoint,
        update_journal_endpoint,
    },
    person::{
        create_person_endpoint, delete_person_endpoint, get_person_endpoint,
        get_persons_endpoint, update_person_endpoint,
    },
    project::{
        create_project_endpoint, delete_project_endpoint, get_project_endpoint,
        get_projects_endpoint, update_project_endpoint,
    },
    report::get_report_endpoint,
    reservation::{
        create_reservation_endpoint, delete_reservation_endpoint, get_reservation_endpoint,
        get_reservations_endpoint, update_reservation_endpoint,
    },
    share::{
        create_share_profit_endpoint, create_share_transfer_endpoint,
        create_shareholding_endpoint, delete_share_profit_endpoint,
        delete_share_transfer_endpoint, delete_shareholding_endpoint, get_share_profit_endpoint,
        get_share_profits_endpoint, get_share_transfer_endpoint, get_share_transfers_endpoint,
        get_shareholding_endpoint, get_shareholdings_endpoint, update_share_profit_endpoint,
        update_share_transfer_endpoint, update_shareholding_endpoint,
    },
    theme::{
        apply_theme_template_endpoint, create_theme_template_endpoint,
        delete_theme_template_endpoint, get_languages_endpoint, get_links_endpoint,
        get_theme_settings_endpoint, get_theme_templates_endpoint, save_theme_settings_endpoint,
    },
    translation::{
        create_translation_file_endpoint, delete_translation_file_endpoint,
        get_translation_file_content_endpoint, get_translation_files_endpoint,
        update_translation_file_endpoint,
    },
    unit::{
        create_unit_endpoint, delete_unit_endpoint, get_unit_endpoint, get_units_endpoint,
        update_unit_endpoint,
    },
    wallet::{
        create_wallet_endpoint, create_wallet_transaction_endpoint, delete_wallet_endpoint,
        delete_wallet_transaction_endpoint, get_wallet_endpoint, get_wallet_transaction_endpoint,
        get_wallet_transactions_endpoint, get_wallets_endpoint, update_wallet_endpoint,
        update_wallet_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// When `static_dir` is given, requests that match no route are served from
/// that directory, falling back to its `index.html` so that a single page app
/// can handle its own routes.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let public_routes = Router::new()
        .route(endpoints::ROOT, get(get_liveness))
        .route(endpoints::LOG_IN, post(log_in))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::THEME_SETTINGS, get(get_theme_settings_endpoint))
        .route(endpoints::THEME_TEMPLATES, get(get_theme_templates_endpoint))
        .route(endpoints::THEME_LANGUAGES, get(get_languages_endpoint))
        .route(endpoints::THEME_LINKS, get(get_links_endpoint))
        .route(endpoints::TRANSLATIONS, get(get_translation_files_endpoint))
        .route(
            endpoints::TRANSLATION_CONTENT,
            get(get_translation_file_content_endpoint),
        );

    let manager_routes = Router::new()
        .route(endpoints::ACCOUNTS, get(get_accounts_endpoint))
        .route(endpoints::ACCOUNT, get(get_account_endpoint))
        .route(endpoints::CREATE_ACCOUNT, post(create_account_endpoint))
        .route(endpoints::UPDATE_ACCOUNT, put(edit_account_endpoint))
        .route(endpoints::DELETE_ACCOUNT, delete(delete_account_endpoint))
        .route(endpoints::DELETE_ACCOUNTS, post(delete_accounts_endpoint))
        .route(endpoints::ACCOUNT_TREE, get(get_account_tree_endpoint))
        .route(
            endpoints::ACCOUNT_CHILDREN,
            get(get_account_children_endpoint),
        )
        .route(endpoints::GET_BANK_INFO, get(get_bank_info_endpoint))
        .route(endpoints::SAVE_BANK_INFO, post(save_bank_info_endpoint))
        .route(endpoints::UPDATE_BANK_INFO, put(update_bank_info_endpoint))
        .route(endpoints::DELETE_BANK_INFO, delete(delete_bank_info_endpoint))
        .route(endpoints::ACCOUNT_STATS, get(get_account_stats_endpoint))
        .route(
            endpoints::ACCOUNTS_BY_CATEGORY,
            get(get_accounts_by_category_endpoint),
        )
        .route(
            endpoints::ACCOUNTS_BY_TYPE,
            get(get_accounts_by_type_endpoint),
        )
        .route(
            endpoints::JOURNALS,
            get(get_journals_endpoint).post(save_journal_endpoint),
        )
        .route(
            endpoints::JOURNAL,
            get(get_journal_endpoint)
                .put(update_journal_endpoint)
                .delete(delete_journal_endpoint),
        )
        .route(endpoints::LEGACY_SAVE_JOURNAL, post(save_journal_endpoint))
        .route(endpoints::LEGACY_JOURNALS, get(get_journals_endpoint))
        .route(endpoints::LEGACY_JOURNAL, get(get_journal_endpoint))
        .route(
            endpoints::LEGACY_DELETE_JOURNAL,
            delete(delete_journal_endpoint),
        )
        .route(
            endpoints::CREATE_JOURNAL_DETAIL,
            post(create_journal_detail_endpoint),
        )
        .route(endpoints::JOURNAL_DETAILS, get(get_journal_details_endpoint))
        .route(endpoints::JOURNAL_DETAIL, get(get_journal_detail_endpoint))
        .route(
            endpoints::UPDATE_JOURNAL_DETAIL,
            put(update_journal_detail_endpoint),
        )
        .route(
            endpoints::DELETE_JOURNAL_DETAIL,
            delete(delete_journal_detail_endpoint),
        )
        .route(endpoints::REPORT, get(get_report_endpoint))
        .route_layer(from_fn(manager_guard));

    let authenticated_routes = Router::new()
        .route(endpoints::CREATE_PERSON, post(create_person_endpoint))
        .route(endpoints::PERSONS, get(get_persons_endpoint))
        .route(endpoints::PERSON, get(get_person_endpoint))
        .route(endpoints::UPDATE_PERSON, put(update_person_endpoint))
        .route(endpoints::DELETE_PERSON, delete(delete_person_endpoint))
        .route(endpoints::CREATE_PROJECT, post(create_project_endpoint))
        .route(endpoints::PROJECTS, get(get_projects_endpoint))
        .route(endpoints::PROJECT, get(get_project_endpoint))
        .route(endpoints::UPDATE_PROJECT, put(update_project_endpoint))
        .route(endpoints::DELETE_PROJECT, delete(delete_project_endpoint))
        .route(endpoints::CREATE_UNIT, post(create_unit_endpoint))
        .route(endpoints::UNITS, get(get_units_endpoint))
        .route(endpoints::UNIT, get(get_unit_endpoint))
        .route(endpoints::UPDATE_UNIT, put(update_unit_endpoint))
        .route(endpoints::DELETE_UNIT, delete(delete_unit_endpoint))
        .route(
            endpoints::CREATE_RESERVATION,
            post(create_reservation_endpoint),
        )
        .route(endpoints::RESERVATIONS, get(get_reservations_endpoint))
        .route(endpoints::RESERVATION, get(get_reservation_endpoint))
        .route(
            endpoints::UPDATE_RESERVATION,
            put(update_reservation_endpoint),
        )
        .route(
            endpoints::DELETE_RESERVATION,
            delete(delete_reservation_endpoint),
        )
        .route(
            endpoints::CREATE_SHAREHOLDING,
            post(create_shareholding_endpoint),
        )
        .route(endpoints::SHAREHOLDINGS, get(get_shareholdings_endpoint))
        .route(endpoints::SHAREHOLDING, get(get_shareholding_endpoint))
        .route(
            endpoints::UPDATE_SHAREHOLDING,
            put(update_shareholding_endpoint),
        )
        .route(
            endpoints::DELETE_SHAREHOLDING,
            delete(delete_shareholding_endpoint),
        )
        .route(
            endpoints::CREATE_SHARE_TRANSFER,
            post(create_share_transfer_endpoint),
        )
        .route(endpoints::SHARE_TRANSFERS, get(get_share_transfers_endpoint))
        .route(endpoints::SHARE_TRANSFER, get(get_share_transfer_endpoint))
        .route(
            endpoints::UPDATE_SHARE_TRANSFER,
            put(update_share_transfer_endpoint),
        )
        .route(
            endpoints::DELETE_SHARE_TRANSFER,
            delete(delete_share_transfer_endpoint),
        )
        .route(
            endpoints::CREATE_SHARE_PROFIT,
            post(create_share_profit_endpoint),
        )
        .route(endpoints::SHARE_PROFITS, get(get_share_profits_endpoint))
        .route(endpoints::SHARE_PROFIT, get(get_share_profit_endpoint))
        .route(
            endpoints::UPDATE_SHARE_PROFIT,
            put(update_share_profit_endpoint),
        )
        .route(
            endpoints::DELETE_SHARE_PROFIT,
            delete(delete_share_profit_endpoint),
        )
        .route(endpoints::CREATE_WALLET, post(create_wallet_endpoint))
        .route(endpoints::WALLETS, get(get_wallets_endpoint))
        .route(endpoints::WALLET, get(get_wallet_endpoint))
        .route(endpoints::UPDATE_WALLET, put(update_wallet_endpoint))
        .route(endpoints::DELETE_WALLET, delete(delete_wallet_endpoint))
        .route(
            endpoints::CREATE_WALLET_TRANSACTION,
            post(create_wallet_transaction_endpoint),
        )
        .route(
            endpoints::WALLET_TRANSACTIONS,
            get(get_wallet_transactions_endpoint),
        )
        .route(
            endpoints::WALLET_TRANSACTION,
            get(get_wallet_transaction_endpoint),
        )
        .route(
            endpoints::UPDATE_WALLET_TRANSACTION,
            put(update_wallet_transaction_endpoint),
        )
        .route(
            endpoints::DELETE_WALLET_TRANSACTION,
            delete(delete_wallet_transaction_endpoint),
        )
        .route(
            endpoints::THEME_SETTINGS,
            post(save_theme_settings_endpoint),
        )
        .route(
            endpoints::THEME_TEMPLATES,
            post(create_theme_template_endpoint),
        )
        .route(
            endpoints::THEME_TEMPLATE,
            delete(delete_theme_template_endpoint),
        )
        .route(
            endpoints::APPLY_THEME_TEMPLATE,
            post(apply_theme_template_endpoint),
        )
        .route(
            endpoints::TRANSLATIONS,
            post(create_translation_file_endpoint),
        )
        .route(
            endpoints::TRANSLATION,
            put(update_translation_file_endpoint).delete(delete_translation_file_endpoint),
        )
        .merge(manager_routes)
        .route_layer(from_fn_with_state(state.clone(), auth_guard));

    let router = authenticated_routes.merge(public_routes);

    let router = match static_dir {
        Some(static_dir) => router.fallback_service(
            ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html"))),
        ),
        None => router.fallback(get_404_not_found),
    };

    router.layer(CorsLayer::permissive()).with_state(state)
}

/// A plain-text liveness check.
async fn get_liveness() -> &'static str {
    "Saba booking API is running"
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
