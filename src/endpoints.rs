//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/persons/perGetById/{per_code}',
//! use [format_endpoint].

/// The root route, a plain-text liveness check.
pub const ROOT: &str = "/";

/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/usrLogin";
/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/usrRegister";

pub const ACCOUNTS: &str = "/api/accounts/accGetAll";
pub const ACCOUNT: &str = "/api/accounts/accGetById/{acc_code}";
pub const CREATE_ACCOUNT: &str = "/api/accounts/accCreate";
pub const UPDATE_ACCOUNT: &str = "/api/accounts/accUpdate/{acc_code}";
pub const DELETE_ACCOUNT: &str = "/api/accounts/accDelete/{acc_code}";
pub const DELETE_ACCOUNTS: &str = "/api/accounts/accDeleteBulk";
pub const ACCOUNT_TREE: &str = "/api/accounts/accGetTree";
pub const ACCOUNT_CHILDREN: &str = "/api/accounts/accGetChildren/{acc_code}";
pub const GET_BANK_INFO: &str = "/api/accounts/accGetBankInfo/{acc_code}";
pub const SAVE_BANK_INFO: &str = "/api/accounts/accSaveBankInfo/{acc_code}";
pub const UPDATE_BANK_INFO: &str = "/api/accounts/accUpdateBankInfo/{acc_code}";
pub const DELETE_BANK_INFO: &str = "/api/accounts/accDeleteBankInfo/{acc_code}";
pub const ACCOUNT_STATS: &str = "/api/accounts/accGetStats";
pub const ACCOUNTS_BY_CATEGORY: &str = "/api/accounts/accGetByCategory/{category}";
pub const ACCOUNTS_BY_TYPE: &str = "/api/accounts/accGetByType/{acc_type}";

/// Create (POST) or list (GET) journals.
pub const JOURNALS: &str = "/api/journals";
/// Get (GET), save (PUT) or delete (DELETE) a single journal.
pub const JOURNAL: &str = "/api/journals/{jrn_code}";
pub const LEGACY_SAVE_JOURNAL: &str = "/api/journals/jrnSave";
pub const LEGACY_JOURNALS: &str = "/api/journals/jrnGetAll";
pub const LEGACY_JOURNAL: &str = "/api/journals/jrnGetById/{jrn_code}";
pub const LEGACY_DELETE_JOURNAL: &str = "/api/journals/jrnDelete/{jrn_code}";
pub const CREATE_JOURNAL_DETAIL: &str = "/api/journals/jrdCreate";
pub const JOURNAL_DETAILS: &str = "/api/journals/jrdGetAll";
pub const JOURNAL_DETAIL: &str = "/api/journals/jrdGetById/{jrn_code}/{line_no}";
pub const UPDATE_JOURNAL_DETAIL: &str = "/api/journals/jrdUpdate/{jrn_code}/{line_no}";
pub const DELETE_JOURNAL_DETAIL: &str = "/api/journals/jrdDelete/{jrn_code}/{line_no}";

pub const CREATE_PERSON: &str = "/api/persons/perCreate";
pub const PERSONS: &str = "/api/persons/perGetAll";
pub const PERSON: &str = "/api/persons/perGetById/{per_code}";
pub const UPDATE_PERSON: &str = "/api/persons/perUpdate/{per_code}";
pub const DELETE_PERSON: &str = "/api/persons/perDelete/{per_code}";

pub const CREATE_PROJECT: &str = "/api/projects/prjCreate";
pub const PROJECTS: &str = "/api/projects/prjGetAll";
pub const PROJECT: &str = "/api/projects/prjGetById/{prj_code}";
pub const UPDATE_PROJECT: &str = "/api/projects/prjUpdate/{prj_code}";
pub const DELETE_PROJECT: &str = "/api/projects/prjDelete/{prj_code}";

pub const CREATE_UNIT: &str = "/api/units/untCreate";
pub const UNITS: &str = "/api/units/untGetAll";
pub const UNIT: &str = "/api/units/untGetById/{prj_code}/{unt_code}";
pub const UPDATE_UNIT: &str = "/api/units/untUpdate/{prj_code}/{unt_code}";
pub const DELETE_UNIT: &str = "/api/units/untDelete/{prj_code}/{unt_code}";

pub const CREATE_RESERVATION: &str = "/api/reservations/resCreate";
pub const RESERVATIONS: &str = "/api/reservations/resGetAll";
pub const RESERVATION: &str = "/api/reservations/resGetById/{res_id}";
pub const UPDATE_RESERVATION: &str = "/api/reservations/resUpdate/{res_id}";
pub const DELETE_RESERVATION: &str = "/api/reservations/resDelete/{res_id}";

pub const CREATE_SHAREHOLDING: &str = "/api/shares/shrCreate";
pub const SHAREHOLDINGS: &str = "/api/shares/shrGetAll";
pub const SHAREHOLDING: &str = "/api/shares/shrGetById/{shr_id}";
pub const UPDATE_SHAREHOLDING: &str = "/api/shares/shrUpdate/{shr_id}";
pub const DELETE_SHAREHOLDING: &str = "/api/shares/shrDelete/{shr_id}";

pub const CREATE_SHARE_TRANSFER: &str = "/api/shares/stfCreate";
pub const SHARE_TRANSFERS: &str = "/api/shares/stfGetAll";
pub const SHARE_TRANSFER: &str = "/api/shares/stfGetById/{stf_id}";
pub const UPDATE_SHARE_TRANSFER: &str = "/api/shares/stfUpdate/{stf_id}";
pub const DELETE_SHARE_TRANSFER: &str = "/api/shares/stfDelete/{stf_id}";

pub const CREATE_SHARE_PROFIT: &str = "/api/shares/sptCreate";
pub const SHARE_PROFITS: &str = "/api/shares/sptGetAll";
pub const SHARE_PROFIT: &str = "/api/shares/sptGetById/{spt_id}";
pub const UPDATE_SHARE_PROFIT: &str = "/api/shares/sptUpdate/{spt_id}";
pub const DELETE_SHARE_PROFIT: &str = "/api/shares/sptDelete/{spt_id}";

pub const CREATE_WALLET: &str = "/api/wallets/wltCreate";
pub const WALLETS: &str = "/api/wallets/wltGetAll";
pub const WALLET: &str = "/api/wallets/wltGetById/{per_code}";
pub const UPDATE_WALLET: &str = "/api/wallets/wltUpdate/{per_code}";
pub const DELETE_WALLET: &str = "/api/wallets/wltDelete/{per_code}";

pub const CREATE_WALLET_TRANSACTION: &str = "/api/wallets/wtxCreate";
pub const WALLET_TRANSACTIONS: &str = "/api/wallets/wtxGetAll";
pub const WALLET_TRANSACTION: &str = "/api/wallets/wtxGetById/{wtx_id}";
pub const UPDATE_WALLET_TRANSACTION: &str = "/api/wallets/wtxUpdate/{wtx_id}";
pub const DELETE_WALLET_TRANSACTION: &str = "/api/wallets/wtxDelete/{wtx_id}";

/// A report by its route name, e.g. `/api/reports/rptGetTrialBalance`.
pub const REPORT: &str = "/api/reports/{report_name}";

pub const THEME_SETTINGS: &str = "/api/theme/settings";
pub const THEME_TEMPLATES: &str = "/api/theme/templates";
pub const THEME_TEMPLATE: &str = "/api/theme/templates/{id}";
pub const APPLY_THEME_TEMPLATE: &str = "/api/theme/templates/{id}/apply";
pub const THEME_LANGUAGES: &str = "/api/theme/languages";
pub const THEME_LINKS: &str = "/api/theme/links";

pub const TRANSLATIONS: &str = "/api/translations";
pub const TRANSLATION: &str = "/api/translations/{file_name}";
pub const TRANSLATION_CONTENT: &str = "/api/translations/{file_name}/content";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/persons/perGetById/{per_code}',
/// '{per_code}' is the parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };
    let Some(param_length) = endpoint_path[param_start..].find('}') else {
        return endpoint_path.to_owned();
    };

    let param_end = param_start + param_length + 1;

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

#[cfg(test)]
mod tests {
    use super::{ACCOUNT, UNIT, format_endpoint};

    #[test]
    fn replaces_parameter() {
        assert_eq!(
            format_endpoint(ACCOUNT, "1101"),
            "/api/accounts/accGetById/1101"
        );
    }

    #[test]
    fn replaces_first_parameter_only() {
        assert_eq!(
            format_endpoint(UNIT, "PRJ1"),
            "/api/units/untGetById/PRJ1/{unt_code}"
        );
    }

    #[test]
    fn leaves_paths_without_parameters_alone() {
        assert_eq!(format_endpoint("/api/journals", "1"), "/api/journals");
    }
}
