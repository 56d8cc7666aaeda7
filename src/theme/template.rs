//! Named sets of theme settings that can be applied in one go.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::Claims,
    db::lock_connection,
    response::{Envelope, codes, success},
    theme::{
        ThemeState,
        settings::{ThemeSettingForm, ThemeSettings, get_theme_settings, replace_settings},
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeTemplate {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub preview_image: Option<String>,
    /// An array of settings in the same shape accepted by the settings endpoint.
    pub settings: Value,
    pub is_default: bool,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeTemplateForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub preview_image: Option<String>,
    #[serde(default)]
    pub settings: Option<Value>,
}

const SELECT_TEMPLATE: &str = "SELECT id, name, description, preview_image, settings,
    is_default, is_active, created_at
    FROM theme_template";

fn map_row_to_template(row: &Row) -> Result<ThemeTemplate, rusqlite::Error> {
    let raw_settings: String = row.get(4)?;
    let settings = serde_json::from_str(&raw_settings)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(error)))?;

    Ok(ThemeTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        preview_image: row.get(3)?,
        settings,
        is_default: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn parse_template_settings(settings: &Value) -> Result<Vec<ThemeSettingForm>, Error> {
    serde_json::from_value(settings.clone()).map_err(|error| {
        Error::Validation(format!("Template settings must be a list of settings: {error}"))
    })
}

pub fn create_theme_template(
    form: &ThemeTemplateForm,
    created_by: &str,
    connection: &Connection,
) -> Result<ThemeTemplate, Error> {
    let name = match form.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => return Err(Error::MissingRequiredFields("name".to_owned())),
    };
    let settings = form.settings.clone().unwrap_or(Value::Array(Vec::new()));
    parse_template_settings(&settings)?;

    connection.execute(
        "INSERT INTO theme_template (name, description, preview_image, settings, created_by,
            created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            name,
            &form.description,
            &form.preview_image,
            serde_json::to_string(&settings)?,
            created_by,
            OffsetDateTime::now_utc(),
        ),
    )?;

    get_theme_template(connection.last_insert_rowid(), connection)
}

pub fn get_theme_template(id: i64, connection: &Connection) -> Result<ThemeTemplate, Error> {
    connection
        .prepare(&format!("{SELECT_TEMPLATE} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_row_to_template)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TemplateNotFound(id),
            error => error.into(),
        })
}

/// Get the active templates, newest first.
pub fn get_theme_templates(connection: &Connection) -> Result<Vec<ThemeTemplate>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TEMPLATE} WHERE is_active = 1 ORDER BY created_at DESC, id DESC"
        ))?
        .query_map([], map_row_to_template)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn delete_theme_template(id: i64, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM theme_template WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::TemplateNotFound(id));
    }

    Ok(())
}

/// Replace the theme settings with the settings stored in template `id`.
pub fn apply_theme_template(
    id: i64,
    applied_by: &str,
    connection: &Connection,
) -> Result<ThemeSettings, Error> {
    let template = get_theme_template(id, connection)?;
    let settings = parse_template_settings(&template.settings)?;

    let transaction = connection.unchecked_transaction()?;
    replace_settings(&settings, applied_by, &transaction)?;
    transaction.commit()?;

    get_theme_settings(connection)
}

pub async fn get_theme_templates_endpoint(
    State(state): State<ThemeState>,
) -> Result<Json<Envelope<Vec<ThemeTemplate>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::THEME_TEMPLATE_LIST,
        get_theme_templates(&connection)?,
    ))
}

pub async fn create_theme_template_endpoint(
    State(state): State<ThemeState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<ThemeTemplateForm>,
) -> Result<Json<Envelope<ThemeTemplate>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let template = create_theme_template(&form, &claims.id, &connection)?;

    Ok(success(codes::RECORD_CREATED, template))
}

pub async fn delete_theme_template_endpoint(
    State(state): State<ThemeState>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_theme_template(id, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}

pub async fn apply_theme_template_endpoint(
    State(state): State<ThemeState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<ThemeSettings>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let settings = apply_theme_template(id, &claims.id, &connection)?;
    tracing::info!("{} applied theme template {id}", claims.id);

    Ok(success(codes::THEME_TEMPLATE_APPLIED, settings))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{Error, db::initialize};

    use super::{
        ThemeTemplateForm, apply_theme_template, create_theme_template, delete_theme_template,
        get_theme_templates,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn dark_template() -> ThemeTemplateForm {
        ThemeTemplateForm {
            name: Some("Dark".to_owned()),
            description: Some("Dark colours".to_owned()),
            preview_image: None,
            settings: Some(json!([
                {"category": "colors", "key": "background", "value": "#121212"},
                {"category": "colors", "key": "text", "value": "#ffffff", "languageCode": "en"}
            ])),
        }
    }

    #[test]
    fn create_and_list_templates() {
        let connection = get_test_connection();

        let template = create_theme_template(&dark_template(), "P001", &connection).unwrap();

        assert_eq!(template.name, "Dark");
        assert!(template.is_active);
        assert_eq!(get_theme_templates(&connection), Ok(vec![template]));
    }

    #[test]
    fn template_settings_must_be_a_list() {
        let connection = get_test_connection();
        let form = ThemeTemplateForm {
            settings: Some(json!({"colors": "dark"})),
            ..dark_template()
        };

        assert!(matches!(
            create_theme_template(&form, "P001", &connection),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn apply_copies_settings() {
        let connection = get_test_connection();
        let template = create_theme_template(&dark_template(), "P001", &connection).unwrap();

        let theme = apply_theme_template(template.id, "P001", &connection).unwrap();

        assert_eq!(theme.settings.len(), 2);
        assert_eq!(theme.settings[0].value.as_deref(), Some("#121212"));
        assert_eq!(theme.settings[0].language_code, "fa");
    }

    #[test]
    fn missing_template_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            apply_theme_template(42, "P001", &connection),
            Err(Error::TemplateNotFound(42))
        );
        assert_eq!(
            delete_theme_template(42, &connection),
            Err(Error::TemplateNotFound(42))
        );
    }
}
