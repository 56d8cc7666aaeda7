//! Site appearance: theme settings, languages, footer links and reusable
//! templates of settings.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod settings;
mod template;

pub use settings::{
    LinkQuery, ThemeLanguage, ThemeLink, ThemeLinkForm, ThemeSetting, ThemeSettingForm,
    ThemeSettings, ThemeSettingsForm, get_languages, get_languages_endpoint, get_links,
    get_links_endpoint, get_theme_settings, get_theme_settings_endpoint, replace_settings,
    save_theme_settings, save_theme_settings_endpoint,
};
pub use template::{
    ThemeTemplate, ThemeTemplateForm, apply_theme_template, apply_theme_template_endpoint,
    create_theme_template, create_theme_template_endpoint, delete_theme_template,
    delete_theme_template_endpoint, get_theme_template, get_theme_templates,
    get_theme_templates_endpoint,
};

/// The language used for settings that do not name one.
pub const DEFAULT_LANGUAGE_CODE: &str = "fa";

pub fn create_theme_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS theme_setting (
            id INTEGER PRIMARY KEY,
            category TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT,
            language_code TEXT NOT NULL DEFAULT 'fa',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT
        );

        CREATE TABLE IF NOT EXISTS theme_language (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            native_name TEXT,
            direction TEXT NOT NULL DEFAULT 'rtl',
            calendar TEXT,
            font_primary TEXT,
            font_fallback TEXT,
            translation_file TEXT,
            date_format TEXT,
            currency TEXT,
            currency_symbol TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_by TEXT
        );

        CREATE TABLE IF NOT EXISTS theme_link (
            id INTEGER PRIMARY KEY,
            type TEXT NOT NULL CHECK (type IN ('social_media', 'license')),
            title TEXT,
            icon TEXT,
            image_path TEXT,
            url TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT
        );

        CREATE TABLE IF NOT EXISTS theme_template (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            preview_image TEXT,
            settings TEXT NOT NULL DEFAULT '[]',
            is_default INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT,
            created_at TEXT NOT NULL
        );",
    )
}

/// The state needed by the theme endpoints.
#[derive(Debug, Clone)]
pub struct ThemeState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ThemeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
