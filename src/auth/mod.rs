//! Password hashing, JSON web tokens, the auth middleware and the log-in and
//! registration endpoints.

mod log_in;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

pub use log_in::{AuthPayload, LogInData, log_in};
pub use middleware::{AuthState, auth_guard, manager_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::{RegisterData, register_user};
pub use token::{Claims, DEFAULT_TOKEN_DURATION, JwtKeys, create_token, decode_token};
pub use user::{
    Role, UserAccount, UserProfile, create_user_account_table, get_user_by_username,
    insert_user_account, update_password, username_exists,
};
