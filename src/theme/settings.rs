//! Theme settings, languages and links.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::Claims,
    db::lock_connection,
    response::{Envelope, codes, success},
    theme::{DEFAULT_LANGUAGE_CODE, ThemeState},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSetting {
    pub category: String,
    pub key: String,
    pub value: Option<String>,
    pub language_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSettingForm {
    pub category: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
    /// Defaults to [DEFAULT_LANGUAGE_CODE].
    pub language_code: Option<String>,
}

fn default_direction() -> String {
    "rtl".to_owned()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeLanguage {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub native_name: Option<String>,
    /// `rtl` or `ltr`.
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default)]
    pub calendar: Option<String>,
    #[serde(default)]
    pub font_primary: Option<String>,
    #[serde(default)]
    pub font_fallback: Option<String>,
    #[serde(default)]
    pub translation_file: Option<String>,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub currency_symbol: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeLink {
    pub id: i64,
    #[serde(rename = "type")]
    pub link_type: String,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub image_path: Option<String>,
    pub url: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeLinkForm {
    /// `social_media` or `license`.
    #[serde(rename = "type")]
    pub link_type: String,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub image_path: Option<String>,
    pub url: Option<String>,
    pub sort_order: Option<i64>,
}

/// Everything the client needs to style the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSettings {
    pub settings: Vec<ThemeSetting>,
    pub languages: Vec<ThemeLanguage>,
    pub links: Vec<ThemeLink>,
}

/// Replaces every setting, language and link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSettingsForm {
    #[serde(default)]
    pub settings: Vec<ThemeSettingForm>,
    #[serde(default)]
    pub languages: Vec<ThemeLanguage>,
    #[serde(default)]
    pub links: Vec<ThemeLinkForm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkQuery {
    #[serde(rename = "type")]
    pub link_type: Option<String>,
}

const LINK_TYPES: [&str; 2] = ["social_media", "license"];

fn map_row_to_setting(row: &Row) -> Result<ThemeSetting, rusqlite::Error> {
    Ok(ThemeSetting {
        category: row.get(0)?,
        key: row.get(1)?,
        value: row.get(2)?,
        language_code: row.get(3)?,
    })
}

const SELECT_LANGUAGE: &str = "SELECT code, name, native_name, direction, calendar,
    font_primary, font_fallback, translation_file, date_format, currency, currency_symbol,
    is_active, is_default
    FROM theme_language";

fn map_row_to_language(row: &Row) -> Result<ThemeLanguage, rusqlite::Error> {
    Ok(ThemeLanguage {
        code: row.get(0)?,
        name: row.get(1)?,
        native_name: row.get(2)?,
        direction: row.get(3)?,
        calendar: row.get(4)?,
        font_primary: row.get(5)?,
        font_fallback: row.get(6)?,
        translation_file: row.get(7)?,
        date_format: row.get(8)?,
        currency: row.get(9)?,
        currency_symbol: row.get(10)?,
        is_active: row.get(11)?,
        is_default: row.get(12)?,
    })
}

const SELECT_LINK: &str =
    "SELECT id, type, title, icon, image_path, url, sort_order, is_active FROM theme_link";

fn map_row_to_link(row: &Row) -> Result<ThemeLink, rusqlite::Error> {
    Ok(ThemeLink {
        id: row.get(0)?,
        link_type: row.get(1)?,
        title: row.get(2)?,
        icon: row.get(3)?,
        image_path: row.get(4)?,
        url: row.get(5)?,
        sort_order: row.get(6)?,
        is_active: row.get(7)?,
    })
}

/// Get the active settings, languages and links.
pub fn get_theme_settings(connection: &Connection) -> Result<ThemeSettings, Error> {
    let settings = connection
        .prepare(
            "SELECT category, key, value, language_code FROM theme_setting
            WHERE is_active = 1 ORDER BY id",
        )?
        .query_map([], map_row_to_setting)?
        .collect::<Result<Vec<_>, _>>()?;

    let languages = connection
        .prepare(&format!(
            "{SELECT_LANGUAGE} WHERE is_active = 1 ORDER BY is_default DESC, code"
        ))?
        .query_map([], map_row_to_language)?
        .collect::<Result<Vec<_>, _>>()?;

    let links = get_links(None, connection)?;

    Ok(ThemeSettings {
        settings,
        languages,
        links,
    })
}

/// Get every language, the default language first.
pub fn get_languages(connection: &Connection) -> Result<Vec<ThemeLanguage>, Error> {
    connection
        .prepare(&format!("{SELECT_LANGUAGE} ORDER BY is_default DESC, code"))?
        .query_map([], map_row_to_language)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Get the active links in sort order.
///
/// `link_type` only filters when it is a known link type, anything else
/// returns every active link.
pub fn get_links(link_type: Option<&str>, connection: &Connection) -> Result<Vec<ThemeLink>, Error> {
    match link_type.filter(|link_type| LINK_TYPES.contains(link_type)) {
        Some(link_type) => connection
            .prepare(&format!(
                "{SELECT_LINK} WHERE is_active = 1 AND type = :type ORDER BY sort_order, id"
            ))?
            .query_map(&[(":type", &link_type)], map_row_to_link)?
            .map(|row| row.map_err(Error::from))
            .collect(),
        None => connection
            .prepare(&format!(
                "{SELECT_LINK} WHERE is_active = 1 ORDER BY sort_order, id"
            ))?
            .query_map([], map_row_to_link)?
            .map(|row| row.map_err(Error::from))
            .collect(),
    }
}

/// Replace every theme setting with `settings`.
///
/// The caller is responsible for wrapping this in a transaction.
pub fn replace_settings(
    settings: &[ThemeSettingForm],
    created_by: &str,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute("DELETE FROM theme_setting", ())?;

    let mut statement = connection.prepare(
        "INSERT INTO theme_setting (category, key, value, language_code, created_by)
        VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    for setting in settings {
        let (Some(category), Some(key)) = (&setting.category, &setting.key) else {
            return Err(Error::MissingRequiredFields("category, key".to_owned()));
        };
        let language_code = setting
            .language_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE_CODE);

        statement.execute((category, key, &setting.value, language_code, created_by))?;
    }

    Ok(())
}

/// Replace all settings, languages and links in one transaction.
pub fn save_theme_settings(
    form: &ThemeSettingsForm,
    created_by: &str,
    connection: &Connection,
) -> Result<(), Error> {
    if let Some(link) = form
        .links
        .iter()
        .find(|link| !LINK_TYPES.contains(&link.link_type.as_str()))
    {
        return Err(Error::Validation(format!(
            "Unknown link type \"{}\", expected one of {}",
            link.link_type,
            LINK_TYPES.join(", ")
        )));
    }

    let transaction = connection.unchecked_transaction()?;

    replace_settings(&form.settings, created_by, &transaction)?;

    transaction.execute("DELETE FROM theme_language", ())?;
    for language in &form.languages {
        transaction.execute(
            "INSERT INTO theme_language (code, name, native_name, direction, calendar,
                font_primary, font_fallback, translation_file, date_format, currency,
                currency_symbol, is_active, is_default, created_by)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            (
                &language.code,
                &language.name,
                &language.native_name,
                &language.direction,
                &language.calendar,
                &language.font_primary,
                &language.font_fallback,
                &language.translation_file,
                &language.date_format,
                &language.currency,
                &language.currency_symbol,
                language.is_active,
                language.is_default,
                created_by,
            ),
        )?;
    }

    transaction.execute("DELETE FROM theme_link", ())?;
    for link in &form.links {
        transaction.execute(
            "INSERT INTO theme_link (type, title, icon, image_path, url, sort_order, created_by)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                &link.link_type,
                &link.title,
                &link.icon,
                &link.image_path,
                &link.url,
                link.sort_order.unwrap_or(0),
                created_by,
            ),
        )?;
    }

    transaction.commit()?;

    Ok(())
}

pub async fn get_theme_settings_endpoint(
    State(state): State<ThemeState>,
) -> Result<Json<Envelope<ThemeSettings>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(codes::THEME_SETTINGS, get_theme_settings(&connection)?))
}

pub async fn save_theme_settings_endpoint(
    State(state): State<ThemeState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<ThemeSettingsForm>,
) -> Result<Json<Envelope<ThemeSettings>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    save_theme_settings(&form, &claims.id, &connection)?;
    tracing::info!("{} replaced the theme settings", claims.id);

    Ok(success(
        codes::THEME_SETTINGS_SAVED,
        get_theme_settings(&connection)?,
    ))
}

pub async fn get_languages_endpoint(
    State(state): State<ThemeState>,
) -> Result<Json<Envelope<Vec<ThemeLanguage>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(codes::THEME_LANGUAGE_LIST, get_languages(&connection)?))
}

pub async fn get_links_endpoint(
    State(state): State<ThemeState>,
    Query(query): Query<LinkQuery>,
) -> Result<Json<Envelope<Vec<ThemeLink>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::THEME_LINK_LIST,
        get_links(query.link_type.as_deref(), &connection)?,
    ))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{Error, db::initialize};

    use super::{
        ThemeSettingForm, ThemeSettingsForm, get_languages, get_links, get_theme_settings,
        save_theme_settings,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn sample_form() -> ThemeSettingsForm {
        serde_json::from_value(json!({
            "settings": [
                {"category": "colors", "key": "primary", "value": "#004d40"},
                {"category": "colors", "key": "primary", "value": "#00695c", "languageCode": "en"}
            ],
            "languages": [
                {"code": "en", "name": "English", "direction": "ltr"},
                {"code": "fa", "name": "Persian", "nativeName": "فارسی", "isDefault": true}
            ],
            "links": [
                {"type": "license", "title": "Permit", "sortOrder": 2},
                {"type": "social_media", "title": "Instagram", "url": "https://instagram.com"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn save_then_get_settings() {
        let connection = get_test_connection();

        save_theme_settings(&sample_form(), "P001", &connection).unwrap();
        let theme = get_theme_settings(&connection).unwrap();

        assert_eq!(theme.settings.len(), 2);
        assert_eq!(theme.settings[0].language_code, "fa");
        assert_eq!(theme.settings[1].language_code, "en");
        assert_eq!(theme.languages[0].code, "fa");
        assert_eq!(theme.languages[1].direction, "ltr");
        assert_eq!(theme.links[0].title.as_deref(), Some("Instagram"));
    }

    #[test]
    fn save_replaces_previous_settings() {
        let connection = get_test_connection();
        save_theme_settings(&sample_form(), "P001", &connection).unwrap();

        let form = ThemeSettingsForm {
            settings: vec![ThemeSettingForm {
                category: Some("fonts".to_owned()),
                key: Some("size".to_owned()),
                value: Some("14".to_owned()),
                language_code: None,
            }],
            ..Default::default()
        };
        save_theme_settings(&form, "P001", &connection).unwrap();

        let theme = get_theme_settings(&connection).unwrap();
        assert_eq!(theme.settings.len(), 1);
        assert!(theme.languages.is_empty());
        assert!(theme.links.is_empty());
    }

    #[test]
    fn unknown_link_type_is_rejected_and_nothing_changes() {
        let connection = get_test_connection();
        save_theme_settings(&sample_form(), "P001", &connection).unwrap();

        let mut form = sample_form();
        form.links[0].link_type = "blog".to_owned();

        assert!(matches!(
            save_theme_settings(&form, "P001", &connection),
            Err(Error::Validation(_))
        ));
        assert_eq!(get_links(None, &connection).unwrap().len(), 2);
    }

    #[test]
    fn missing_setting_key_rolls_back() {
        let connection = get_test_connection();
        save_theme_settings(&sample_form(), "P001", &connection).unwrap();

        let mut form = sample_form();
        form.settings[1].key = None;

        assert_eq!(
            save_theme_settings(&form, "P001", &connection),
            Err(Error::MissingRequiredFields("category, key".to_owned()))
        );
        assert_eq!(get_theme_settings(&connection).unwrap().settings.len(), 2);
    }

    #[test]
    fn link_filter_only_applies_to_known_types() {
        let connection = get_test_connection();
        save_theme_settings(&sample_form(), "P001", &connection).unwrap();

        assert_eq!(get_links(Some("license"), &connection).unwrap().len(), 1);
        assert_eq!(get_links(Some("other"), &connection).unwrap().len(), 2);
    }

    #[test]
    fn languages_list_default_first() {
        let connection = get_test_connection();
        save_theme_settings(&sample_form(), "P001", &connection).unwrap();

        let codes: Vec<String> = get_languages(&connection)
            .unwrap()
            .into_iter()
            .map(|language| language.code)
            .collect();

        assert_eq!(codes, vec!["fa", "en"]);
    }
}
