//! The JSON envelope shared by every API response.

use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The body of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Always `true` for this type.
    pub success: bool,
    /// A stable code describing what happened, e.g. `RECORD_CREATED`.
    pub code: String,
    /// An optional human readable message.
    pub message: Option<String>,
    /// The payload.
    pub data: T,
}

/// The body of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `false` for this type.
    pub success: bool,
    /// A stable code describing the error, e.g. `ACCOUNT_NOT_FOUND`.
    pub code: String,
    /// A human readable explanation, omitted for internal errors.
    pub message: Option<String>,
    /// Extra information about the error.
    pub details: Option<Value>,
}

impl ErrorBody {
    /// Create an error body with no details.
    pub fn new(code: &str, message: Option<String>) -> Self {
        Self {
            success: false,
            code: code.to_owned(),
            message,
            details: None,
        }
    }
}

/// Wrap `data` in a success envelope.
pub fn success<T: Serialize>(code: &str, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        code: code.to_owned(),
        message: None,
        data,
    })
}

/// Wrap `data` in a success envelope with a message for the client.
pub fn success_with_message<T: Serialize>(
    code: &str,
    message: impl Into<String>,
    data: T,
) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        code: code.to_owned(),
        message: Some(message.into()),
        data,
    })
}

/// Success codes sent to clients.
pub mod codes {
    pub const LOGIN_SUCCESS: &str = "LOGIN_SUCCESS";
    pub const REGISTER_SUCCESS: &str = "REGISTER_SUCCESS";

    pub const RECORD_CREATED: &str = "RECORD_CREATED";
    pub const RECORD_UPDATED: &str = "RECORD_UPDATED";
    pub const RECORD_DELETED: &str = "RECORD_DELETED";
    pub const RECORD_FOUND: &str = "RECORD_FOUND";
    pub const RECORD_LIST: &str = "RECORD_LIST";

    pub const ACCOUNT_LIST: &str = "ACCOUNT_LIST";
    pub const ACCOUNT_DETAIL: &str = "ACCOUNT_DETAIL";
    pub const ACCOUNT_TREE: &str = "ACCOUNT_TREE";
    pub const ACCOUNT_CHILDREN: &str = "ACCOUNT_CHILDREN";
    pub const ACCOUNT_STATS: &str = "ACCOUNT_STATS";
    pub const ACCOUNT_CREATED: &str = "ACCOUNT_CREATED";
    pub const ACCOUNT_UPDATED: &str = "ACCOUNT_UPDATED";
    pub const ACCOUNT_DELETED: &str = "ACCOUNT_DELETED";
    pub const ACCOUNTS_BULK_DELETED: &str = "ACCOUNTS_BULK_DELETED";

    pub const BANK_INFO_DETAIL: &str = "BANK_INFO_DETAIL";
    pub const BANK_INFO_SAVED: &str = "BANK_INFO_SAVED";
    pub const BANK_INFO_UPDATED: &str = "BANK_INFO_UPDATED";
    pub const BANK_INFO_DELETED: &str = "BANK_INFO_DELETED";

    pub const JOURNAL_LIST: &str = "JOURNAL_LIST";
    pub const JOURNAL_DETAIL: &str = "JOURNAL_DETAIL";
    pub const JOURNAL_LINE_LIST: &str = "JOURNAL_LINE_LIST";
    pub const JOURNAL_LINE_DETAIL: &str = "JOURNAL_LINE_DETAIL";

    pub const PERSON_LIST: &str = "PERSON_LIST";
    pub const PERSON_DETAIL: &str = "PERSON_DETAIL";
    pub const PROJECT_LIST: &str = "PROJECT_LIST";
    pub const PROJECT_DETAIL: &str = "PROJECT_DETAIL";
    pub const UNIT_LIST: &str = "UNIT_LIST";
    pub const UNIT_DETAIL: &str = "UNIT_DETAIL";
    pub const RESERVATION_LIST: &str = "RESERVATION_LIST";
    pub const RESERVATION_DETAIL: &str = "RESERVATION_DETAIL";
    pub const SHAREHOLDING_LIST: &str = "SHAREHOLDING_LIST";
    pub const SHAREHOLDING_DETAIL: &str = "SHAREHOLDING_DETAIL";
    pub const SHARE_TRANSFER_LIST: &str = "SHARE_TRANSFER_LIST";
    pub const SHARE_TRANSFER_DETAIL: &str = "SHARE_TRANSFER_DETAIL";
    pub const SHARE_PROFIT_LIST: &str = "SHARE_PROFIT_LIST";
    pub const SHARE_PROFIT_DETAIL: &str = "SHARE_PROFIT_DETAIL";
    pub const WALLET_LIST: &str = "WALLET_LIST";
    pub const WALLET_DETAIL: &str = "WALLET_DETAIL";
    pub const WALLET_TRANSACTION_LIST: &str = "WALLET_TRANSACTION_LIST";
    pub const WALLET_TRANSACTION_DETAIL: &str = "WALLET_TRANSACTION_DETAIL";

    pub const REPORT_DATA: &str = "REPORT_DATA";

    pub const THEME_SETTINGS: &str = "THEME_SETTINGS";
    pub const THEME_SETTINGS_SAVED: &str = "THEME_SETTINGS_SAVED";
    pub const THEME_TEMPLATE_LIST: &str = "THEME_TEMPLATE_LIST";
    pub const THEME_TEMPLATE_APPLIED: &str = "THEME_TEMPLATE_APPLIED";
    pub const THEME_LANGUAGE_LIST: &str = "THEME_LANGUAGE_LIST";
    pub const THEME_LINK_LIST: &str = "THEME_LINK_LIST";

    pub const TRANSLATION_FILE_LIST: &str = "TRANSLATION_FILE_LIST";
    pub const TRANSLATION_FILE_CONTENT: &str = "TRANSLATION_FILE_CONTENT";
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ErrorBody, success};

    #[test]
    fn success_envelope_has_expected_shape() {
        let body = success("RECORD_CREATED", json!({"perCode": "P001"}));

        assert_eq!(
            serde_json::to_value(&body.0).unwrap(),
            json!({
                "success": true,
                "code": "RECORD_CREATED",
                "message": null,
                "data": {"perCode": "P001"}
            })
        );
    }

    #[test]
    fn error_body_has_expected_shape() {
        let body = ErrorBody::new("RECORD_NOT_FOUND", Some("missing".to_owned()));

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "success": false,
                "code": "RECORD_NOT_FOUND",
                "message": "missing",
                "details": null
            })
        );
    }
}
