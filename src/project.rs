//! Projects: the properties that units, reservations and shares belong to.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    auth::Claims,
    db::lock_connection,
    response::{Envelope, codes, success},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub prj_code: String,
    pub prj_title: String,
    pub prj_location: Option<String>,
    pub prj_type: Option<String>,
    pub prj_model: Option<String>,
    pub prj_start_date: Option<Date>,
    pub prj_end_date: Option<Date>,
    /// Net asset value.
    pub prj_nav: Option<f64>,
    pub prj_is_active: bool,
    pub prj_created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectForm {
    /// Required on create, ignored on update.
    pub prj_code: Option<String>,
    pub prj_title: Option<String>,
    pub prj_location: Option<String>,
    pub prj_type: Option<String>,
    pub prj_model: Option<String>,
    pub prj_start_date: Option<Date>,
    pub prj_end_date: Option<Date>,
    pub prj_nav: Option<f64>,
    pub prj_is_active: Option<bool>,
}

impl ProjectForm {
    fn title(&self) -> Result<&str, Error> {
        match self.prj_title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => Ok(title),
            _ => Err(Error::MissingRequiredFields("prjTitle".to_owned())),
        }
    }
}

pub fn create_project_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS project (
            prj_code TEXT PRIMARY KEY,
            prj_title TEXT NOT NULL,
            prj_location TEXT,
            prj_type TEXT,
            prj_model TEXT,
            prj_start_date TEXT,
            prj_end_date TEXT,
            prj_nav REAL,
            prj_is_active INTEGER NOT NULL DEFAULT 1,
            prj_created_by TEXT
        )",
        (),
    )?;

    Ok(())
}

const SELECT_PROJECT: &str = "SELECT prj_code, prj_title, prj_location, prj_type, prj_model,
    prj_start_date, prj_end_date, prj_nav, prj_is_active, prj_created_by
    FROM project";

pub fn map_row_to_project(row: &Row) -> Result<Project, rusqlite::Error> {
    Ok(Project {
        prj_code: row.get(0)?,
        prj_title: row.get(1)?,
        prj_location: row.get(2)?,
        prj_type: row.get(3)?,
        prj_model: row.get(4)?,
        prj_start_date: row.get(5)?,
        prj_end_date: row.get(6)?,
        prj_nav: row.get(7)?,
        prj_is_active: row.get(8)?,
        prj_created_by: row.get(9)?,
    })
}

pub fn create_project(
    form: &ProjectForm,
    created_by: &str,
    connection: &Connection,
) -> Result<Project, Error> {
    let prj_code = match form.prj_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => return Err(Error::MissingRequiredFields("prjCode".to_owned())),
    };

    connection.execute(
        "INSERT INTO project (prj_code, prj_title, prj_location, prj_type, prj_model,
            prj_start_date, prj_end_date, prj_nav, prj_is_active, prj_created_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        (
            prj_code,
            form.title()?,
            &form.prj_location,
            &form.prj_type,
            &form.prj_model,
            form.prj_start_date,
            form.prj_end_date,
            form.prj_nav,
            form.prj_is_active.unwrap_or(true),
            created_by,
        ),
    )?;

    get_project(prj_code, connection)
}

pub fn get_project(prj_code: &str, connection: &Connection) -> Result<Project, Error> {
    connection
        .prepare(&format!("{SELECT_PROJECT} WHERE prj_code = :prj_code"))?
        .query_row(&[(":prj_code", &prj_code)], map_row_to_project)
        .map_err(Error::from)
}

pub fn get_all_projects(connection: &Connection) -> Result<Vec<Project>, Error> {
    connection
        .prepare(&format!("{SELECT_PROJECT} ORDER BY prj_code"))?
        .query_map([], map_row_to_project)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn update_project(
    prj_code: &str,
    form: &ProjectForm,
    connection: &Connection,
) -> Result<Project, Error> {
    let rows_affected = connection.execute(
        "UPDATE project SET prj_title = ?1, prj_location = ?2, prj_type = ?3, prj_model = ?4,
            prj_start_date = ?5, prj_end_date = ?6, prj_nav = ?7, prj_is_active = ?8
        WHERE prj_code = ?9",
        (
            form.title()?,
            &form.prj_location,
            &form.prj_type,
            &form.prj_model,
            form.prj_start_date,
            form.prj_end_date,
            form.prj_nav,
            form.prj_is_active.unwrap_or(true),
            prj_code,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_project(prj_code, connection)
}

pub fn delete_project(prj_code: &str, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM project WHERE prj_code = ?1", [prj_code])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct ProjectState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProjectState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn create_project_endpoint(
    State(state): State<ProjectState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<ProjectForm>,
) -> Result<Json<Envelope<Project>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let project = create_project(&form, &claims.id, &connection)?;

    Ok(success(codes::RECORD_CREATED, project))
}

pub async fn get_projects_endpoint(
    State(state): State<ProjectState>,
) -> Result<Json<Envelope<Vec<Project>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(codes::PROJECT_LIST, get_all_projects(&connection)?))
}

pub async fn get_project_endpoint(
    State(state): State<ProjectState>,
    Path(prj_code): Path<String>,
) -> Result<Json<Envelope<Project>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::PROJECT_DETAIL,
        get_project(&prj_code, &connection)?,
    ))
}

pub async fn update_project_endpoint(
    State(state): State<ProjectState>,
    Path(prj_code): Path<String>,
    Json(form): Json<ProjectForm>,
) -> Result<Json<Envelope<Project>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let project = update_project(&prj_code, &form, &connection)?;

    Ok(success(codes::RECORD_UPDATED, project))
}

pub async fn delete_project_endpoint(
    State(state): State<ProjectState>,
    Path(prj_code): Path<String>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_project(&prj_code, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}
