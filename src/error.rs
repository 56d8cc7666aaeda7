//! Defines the app level error type and its conversion into JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::response::ErrorBody;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an unknown username or the wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The request did not include an `Authorization: Bearer` header.
    #[error("the authorization token is missing")]
    TokenMissing,

    /// The bearer token could not be decoded, has a bad signature or has expired.
    #[error("the authorization token is invalid or has expired")]
    TokenInvalid,

    /// The user is authenticated but their role may not access the route.
    #[error("you do not have permission to access this resource")]
    Forbidden,

    /// The JSON web token could not be signed.
    ///
    /// The error string should only be logged on the server.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// The username chosen during registration is already registered.
    #[error("the username \"{0}\" already exists")]
    UsernameExists(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The request body failed a domain validation rule.
    #[error("{0}")]
    Validation(String),

    /// One or more required fields were missing or empty.
    #[error("missing required fields: {0}")]
    MissingRequiredFields(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A UNIQUE or PRIMARY KEY constraint failed.
    #[error("a record with the same key already exists")]
    DuplicateRecord,

    /// A FOREIGN KEY constraint failed.
    #[error("the record refers to a record that does not exist")]
    InvalidForeignKey,

    /// The account code is already used by another account.
    #[error("the account \"{0}\" already exists")]
    AccountCodeExists(String),

    /// No account has the given code.
    #[error("the account \"{0}\" could not be found")]
    AccountNotFound(String),

    /// The parent code does not refer to an existing account.
    #[error("the parent account \"{0}\" could not be found")]
    ParentAccountNotFound(String),

    /// Setting the parent would make the account its own ancestor.
    #[error("the account \"{0}\" cannot be its own ancestor")]
    CircularReference(String),

    /// The account still has child accounts.
    #[error("the account \"{0}\" has child accounts and cannot be deleted")]
    AccountHasChildren(String),

    /// The account is used by at least one journal line.
    #[error("the account \"{0}\" is used in journals and cannot be deleted")]
    AccountHasTransactions(String),

    /// The account has no bank details.
    #[error("no bank details exist for the account \"{0}\"")]
    BankInfoNotFound(String),

    /// The account already has bank details.
    #[error("bank details already exist for the account \"{0}\"")]
    BankInfoExists(String),

    /// Bank details were given for an account that is not flagged as a bank.
    #[error("the account \"{0}\" is not a bank account")]
    NotBankAccount(String),

    /// Only leaf accounts may be bank accounts.
    #[error("the account \"{0}\" is a group account and cannot hold bank details")]
    GroupBankAccount(String),

    /// Child accounts must sit under a group account.
    #[error("the parent account \"{0}\" is a leaf account and cannot have children")]
    ParentNotGroup(String),

    /// A group with children cannot become a leaf.
    #[error("the account \"{0}\" has child accounts and must stay a group account")]
    GroupHasChildren(String),

    /// A leaf used by journal lines cannot become a group.
    #[error("the account \"{0}\" is used in journals and must stay a leaf account")]
    LeafHasTransactions(String),

    /// A bulk delete request did not name any accounts.
    #[error("no accounts were selected")]
    NoAccountsSelected,

    /// A journal code did not have the form `YYYY.NNNNNN`.
    #[error("invalid journal code \"{0}\", expected the format YYYY.NNNNNN")]
    InvalidJournalCode(String),

    /// No journal has the given code.
    #[error("the journal \"{0}\" could not be found")]
    JournalNotFound(String),

    /// The fiscal year cannot be written as four digits.
    #[error("the fiscal year {0} is out of range")]
    InvalidFiscalYear(i32),

    /// Every journal code for the fiscal year has been used.
    #[error("no journal codes are left for the fiscal year {0}")]
    JournalSequenceExhausted(i32),

    /// A journal line broke a posting rule.
    #[error("line {line}: {reason}")]
    InvalidJournalLine {
        /// The 1-based line number.
        line: usize,
        /// Why the line was rejected.
        reason: String,
    },

    /// A posted journal must have equal debit and credit totals.
    #[error("total debit ({debit}) must equal total credit ({credit})")]
    UnbalancedJournal {
        /// The sum of the debit column.
        debit: f64,
        /// The sum of the credit column.
        credit: f64,
    },

    /// No theme template has the given ID.
    #[error("the theme template {0} could not be found")]
    TemplateNotFound(i64),

    /// The translation file name is not a plain `.json` file name.
    #[error("invalid translation file name \"{0}\", expected a name ending in .json")]
    InvalidTranslationFileName(String),

    /// A translation file with the same name already exists.
    #[error("the translation file \"{0}\" already exists")]
    TranslationFileExists(String),

    /// No translation file has the given name.
    #[error("the translation file \"{0}\" could not be found")]
    TranslationFileNotFound(String),

    /// The default translation files may not be deleted.
    #[error("the translation file \"{0}\" is a default file and cannot be deleted")]
    ProtectedTranslationFile(String),

    /// Reading or writing a file failed.
    #[error("file system error: {0}")]
    FileSystemError(String),

    /// An error occurred while serializing or parsing JSON.
    #[error("could not process JSON: {0}")]
    JSONSerializationError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(error, _) if error.extended_code == 787 => {
                Error::InvalidForeignKey
            }
            // Codes 1555 and 2067 occur when a PRIMARY KEY or UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(error, _)
                if error.extended_code == 1555 || error.extended_code == 2067 =>
            {
                Error::DuplicateRecord
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl Error {
    /// The HTTP status code sent to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::TokenMissing | Error::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::UsernameExists(_)
            | Error::TooWeak(_)
            | Error::Validation(_)
            | Error::MissingRequiredFields(_)
            | Error::InvalidForeignKey
            | Error::ParentAccountNotFound(_)
            | Error::CircularReference(_)
            | Error::AccountHasChildren(_)
            | Error::AccountHasTransactions(_)
            | Error::NotBankAccount(_)
            | Error::GroupBankAccount(_)
            | Error::ParentNotGroup(_)
            | Error::GroupHasChildren(_)
            | Error::LeafHasTransactions(_)
            | Error::NoAccountsSelected
            | Error::InvalidJournalCode(_)
            | Error::InvalidFiscalYear(_)
            | Error::JournalSequenceExhausted(_)
            | Error::InvalidJournalLine { .. }
            | Error::UnbalancedJournal { .. }
            | Error::InvalidTranslationFileName(_)
            | Error::TranslationFileExists(_)
            | Error::ProtectedTranslationFile(_) => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::AccountNotFound(_)
            | Error::BankInfoNotFound(_)
            | Error::JournalNotFound(_)
            | Error::TemplateNotFound(_)
            | Error::TranslationFileNotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateRecord | Error::AccountCodeExists(_) | Error::BankInfoExists(_) => {
                StatusCode::CONFLICT
            }
            Error::TokenCreation(_)
            | Error::HashingError(_)
            | Error::FileSystemError(_)
            | Error::JSONSerializationError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The stable error code clients use to pick a translated message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidCredentials => "INVALID_CREDENTIALS",
            Error::TokenMissing => "TOKEN_MISSING",
            Error::TokenInvalid => "TOKEN_INVALID",
            Error::Forbidden => "UNAUTHORIZED_ACCESS",
            Error::UsernameExists(_) => "USERNAME_EXISTS",
            Error::TooWeak(_)
            | Error::Validation(_)
            | Error::InvalidForeignKey
            | Error::InvalidJournalCode(_)
            | Error::InvalidFiscalYear(_)
            | Error::JournalSequenceExhausted(_)
            | Error::InvalidJournalLine { .. }
            | Error::UnbalancedJournal { .. }
            | Error::InvalidTranslationFileName(_)
            | Error::TranslationFileExists(_)
            | Error::ProtectedTranslationFile(_) => "VALIDATION_ERROR",
            Error::MissingRequiredFields(_) => "MISSING_REQUIRED_FIELDS",
            Error::NotFound | Error::JournalNotFound(_) | Error::TranslationFileNotFound(_) => {
                "RECORD_NOT_FOUND"
            }
            Error::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            Error::DuplicateRecord | Error::BankInfoExists(_) => "DUPLICATE_RECORD",
            Error::AccountCodeExists(_) => "ACCOUNT_CODE_ALREADY_EXISTS",
            Error::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Error::ParentAccountNotFound(_) => "PARENT_ACCOUNT_NOT_FOUND",
            Error::CircularReference(_) => "CIRCULAR_REFERENCE_NOT_ALLOWED",
            Error::AccountHasChildren(_) => "CANNOT_DELETE_ACCOUNT_WITH_CHILDREN",
            Error::AccountHasTransactions(_) => "CANNOT_DELETE_ACCOUNT_WITH_TRANSACTIONS",
            Error::BankInfoNotFound(_) => "BANK_INFO_NOT_FOUND",
            Error::NotBankAccount(_) => "ACCOUNT_IS_NOT_BANK_ACCOUNT",
            Error::GroupBankAccount(_) => "GROUP_ACCOUNT_CANNOT_BE_BANK_ACCOUNT",
            Error::ParentNotGroup(_) => "PARENT_ACCOUNT_IS_NOT_GROUP",
            Error::GroupHasChildren(_) => "ACCOUNT_WITH_CHILDREN_MUST_BE_GROUP",
            Error::LeafHasTransactions(_) => "ACCOUNT_WITH_TRANSACTIONS_MUST_BE_LEAF",
            Error::NoAccountsSelected => "NO_ACCOUNTS_SELECTED",
            Error::TokenCreation(_)
            | Error::HashingError(_)
            | Error::FileSystemError(_)
            | Error::JSONSerializationError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Details of server side errors are not intended to be shown to the client.
        let body = if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
            ErrorBody::new(self.code(), None)
        } else {
            ErrorBody::new(self.code(), Some(self.to_string()))
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::Error;

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "PRAGMA foreign_keys = ON;
                CREATE TABLE parent (code TEXT PRIMARY KEY);
                CREATE TABLE child (code TEXT PRIMARY KEY, parent_code TEXT NOT NULL REFERENCES parent(code));
                INSERT INTO parent (code) VALUES ('p1');",
            )
            .unwrap();
        connection
    }

    #[test]
    fn primary_key_violation_maps_to_duplicate_record() {
        let connection = get_test_connection();

        let error = connection
            .execute("INSERT INTO parent (code) VALUES ('p1')", [])
            .unwrap_err();

        assert_eq!(Error::from(error), Error::DuplicateRecord);
    }

    #[test]
    fn foreign_key_violation_maps_to_invalid_foreign_key() {
        let connection = get_test_connection();

        let error = connection
            .execute(
                "INSERT INTO child (code, parent_code) VALUES ('c1', 'missing')",
                [],
            )
            .unwrap_err();

        assert_eq!(Error::from(error), Error::InvalidForeignKey);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let connection = get_test_connection();

        let error = connection
            .query_row("SELECT code FROM parent WHERE code = 'nope'", [], |row| {
                row.get::<_, String>(0)
            })
            .unwrap_err();

        assert_eq!(Error::from(error), Error::NotFound);
    }

    #[test]
    fn client_errors_keep_their_status() {
        assert_eq!(
            Error::AccountCodeExists("01".to_owned())
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::AccountHasChildren("01".to_owned())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn server_errors_are_internal() {
        let response = Error::DatabaseLockError.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
