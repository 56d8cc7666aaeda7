//! Reservations of units by persons.

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

const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub res_id: i64,
    pub res_prj_code: String,
    pub res_unit_code: String,
    pub res_per_code: String,
    pub res_checkin: Date,
    pub res_checkout: Date,
    pub res_guest_count: Option<i64>,
    pub res_total_price: Option<f64>,
    pub res_status: String,
    pub res_created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationForm {
    pub res_prj_code: Option<String>,
    pub res_unit_code: Option<String>,
    pub res_per_code: Option<String>,
    pub res_checkin: Option<Date>,
    pub res_checkout: Option<Date>,
    pub res_guest_count: Option<i64>,
    pub res_total_price: Option<f64>,
    pub res_status: Option<String>,
}

/// The checked fields of a [ReservationForm].
struct ValidReservation<'a> {
    prj_code: &'a str,
    unit_code: &'a str,
    per_code: &'a str,
    checkin: Date,
    checkout: Date,
    status: &'a str,
}

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

impl ReservationForm {
    fn validate(&self) -> Result<ValidReservation<'_>, Error> {
        let mut missing = Vec::new();
        let prj_code = text(&self.res_prj_code);
        let unit_code = text(&self.res_unit_code);
        let per_code = text(&self.res_per_code);

        for (is_missing, name) in [
            (prj_code.is_none(), "resPrjCode"),
            (unit_code.is_none(), "resUnitCode"),
            (per_code.is_none(), "resPerCode"),
            (self.res_checkin.is_none(), "resCheckin"),
            (self.res_checkout.is_none(), "resCheckout"),
        ] {
            if is_missing {
                missing.push(name);
            }
        }

        match (prj_code, unit_code, per_code, self.res_checkin, self.res_checkout) {
            (Some(prj_code), Some(unit_code), Some(per_code), Some(checkin), Some(checkout)) => {
                if checkout <= checkin {
                    return Err(Error::Validation(
                        "resCheckout must be after resCheckin".to_owned(),
                    ));
                }

                Ok(ValidReservation {
                    prj_code,
                    unit_code,
                    per_code,
                    checkin,
                    checkout,
                    status: text(&self.res_status).unwrap_or(DEFAULT_STATUS),
                })
            }
            _ => Err(Error::MissingRequiredFields(missing.join(", "))),
        }
    }
}

pub fn create_reservation_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS reservation (
            res_id INTEGER PRIMARY KEY,
            res_prj_code TEXT NOT NULL,
            res_unit_code TEXT NOT NULL,
            res_per_code TEXT NOT NULL REFERENCES person(per_code),
            res_checkin TEXT NOT NULL,
            res_checkout TEXT NOT NULL,
            res_guest_count INTEGER,
            res_total_price REAL,
            res_status TEXT NOT NULL DEFAULT 'pending',
            res_created_by TEXT,
            FOREIGN KEY (res_prj_code, res_unit_code) REFERENCES unit(unt_prj_code, unt_code)
        )",
        (),
    )?;

    Ok(())
}

const SELECT_RESERVATION: &str = "SELECT res_id, res_prj_code, res_unit_code, res_per_code,
    res_checkin, res_checkout, res_guest_count, res_total_price, res_status, res_created_by
    FROM reservation";

pub fn map_row_to_reservation(row: &Row) -> Result<Reservation, rusqlite::Error> {
    Ok(Reservation {
        res_id: row.get(0)?,
        res_prj_code: row.get(1)?,
        res_unit_code: row.get(2)?,
        res_per_code: row.get(3)?,
        res_checkin: row.get(4)?,
        res_checkout: row.get(5)?,
        res_guest_count: row.get(6)?,
        res_total_price: row.get(7)?,
        res_status: row.get(8)?,
        res_created_by: row.get(9)?,
    })
}

/// # Errors
///
/// - [Error::MissingRequiredFields] if the unit, person or dates are missing.
/// - [Error::Validation] if check-out is not after check-in.
/// - [Error::InvalidForeignKey] if the unit or person does not exist.
pub fn create_reservation(
    form: &ReservationForm,
    created_by: &str,
    connection: &Connection,
) -> Result<Reservation, Error> {
    let reservation = form.validate()?;

    connection.execute(
        "INSERT INTO reservation (res_prj_code, res_unit_code, res_per_code, res_checkin,
            res_checkout, res_guest_count, res_total_price, res_status, res_created_by)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            reservation.prj_code,
            reservation.unit_code,
            reservation.per_code,
            reservation.checkin,
            reservation.checkout,
            form.res_guest_count,
            form.res_total_price,
            reservation.status,
            created_by,
        ),
    )?;

    get_reservation(connection.last_insert_rowid(), connection)
}

pub fn get_reservation(res_id: i64, connection: &Connection) -> Result<Reservation, Error> {
    connection
        .prepare(&format!("{SELECT_RESERVATION} WHERE res_id = :res_id"))?
        .query_row(&[(":res_id", &res_id)], map_row_to_reservation)
        .map_err(Error::from)
}

pub fn get_all_reservations(connection: &Connection) -> Result<Vec<Reservation>, Error> {
    connection
        .prepare(&format!("{SELECT_RESERVATION} ORDER BY res_checkin, res_id"))?
        .query_map([], map_row_to_reservation)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

pub fn update_reservation(
    res_id: i64,
    form: &ReservationForm,
    connection: &Connection,
) -> Result<Reservation, Error> {
    let reservation = form.validate()?;

    let rows_affected = connection.execute(
        "UPDATE reservation SET res_prj_code = ?1, res_unit_code = ?2, res_per_code = ?3,
            res_checkin = ?4, res_checkout = ?5, res_guest_count = ?6, res_total_price = ?7,
            res_status = ?8
        WHERE res_id = ?9",
        (
            reservation.prj_code,
            reservation.unit_code,
            reservation.per_code,
            reservation.checkin,
            reservation.checkout,
            form.res_guest_count,
            form.res_total_price,
            reservation.status,
            res_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_reservation(res_id, connection)
}

pub fn delete_reservation(res_id: i64, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM reservation WHERE res_id = ?1", [res_id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct ReservationState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReservationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn create_reservation_endpoint(
    State(state): State<ReservationState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<ReservationForm>,
) -> Result<Json<Envelope<Reservation>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let reservation = create_reservation(&form, &claims.id, &connection)?;

    Ok(success(codes::RECORD_CREATED, reservation))
}

pub async fn get_reservations_endpoint(
    State(state): State<ReservationState>,
) -> Result<Json<Envelope<Vec<Reservation>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::RESERVATION_LIST,
        get_all_reservations(&connection)?,
    ))
}

pub async fn get_reservation_endpoint(
    State(state): State<ReservationState>,
    Path(res_id): Path<i64>,
) -> Result<Json<Envelope<Reservation>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(
        codes::RESERVATION_DETAIL,
        get_reservation(res_id, &connection)?,
    ))
}

pub async fn update_reservation_endpoint(
    State(state): State<ReservationState>,
    Path(res_id): Path<i64>,
    Json(form): Json<ReservationForm>,
) -> Result<Json<Envelope<Reservation>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let reservation = update_reservation(res_id, &form, &connection)?;

    Ok(success(codes::RECORD_UPDATED, reservation))
}

pub async fn delete_reservation_endpoint(
    State(state): State<ReservationState>,
    Path(res_id): Path<i64>,
) -> Result<Json<Envelope<()>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_reservation(res_id, &connection)?;

    Ok(success(codes::RECORD_DELETED, ()))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        person::{PersonForm, create_person},
        project::{ProjectForm, create_project},
        unit::{UnitForm, create_unit},
    };

    use super::{
        ReservationForm, create_reservation, delete_reservation, get_all_reservations,
        update_reservation,
    };

    fn get_test_connection() -> Connection {
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
        create_unit(
            &UnitForm {
                unt_prj_code: Some("PRJ1".to_owned()),
                unt_code: Some("101".to_owned()),
                unt_title: Some("Unit 101".to_owned()),
                ..Default::default()
            },
            "SabaAdmin",
            &connection,
        )
        .unwrap();
        create_person(
            &PersonForm {
                per_code: Some("P001".to_owned()),
                per_name: Some("Sara".to_owned()),
                ..Default::default()
            },
            "SabaAdmin",
            &connection,
        )
        .unwrap();
        connection
    }

    fn form(unit_code: &str) -> ReservationForm {
        ReservationForm {
            res_prj_code: Some("PRJ1".to_owned()),
            res_unit_code: Some(unit_code.to_owned()),
            res_per_code: Some("P001".to_owned()),
            res_checkin: Some(date!(2025 - 04 - 01)),
            res_checkout: Some(date!(2025 - 04 - 04)),
            res_guest_count: Some(2),
            res_total_price: Some(900.0),
            res_status: None,
        }
    }

    #[test]
    fn create_defaults_status_to_pending() {
        let connection = get_test_connection();

        let reservation = create_reservation(&form("101"), "SabaAdmin", &connection).unwrap();

        assert_eq!(reservation.res_status, "pending");
        assert_eq!(reservation.res_checkout, date!(2025 - 04 - 04));
    }

    #[test]
    fn unknown_unit_is_invalid_foreign_key() {
        let connection = get_test_connection();

        assert_eq!(
            create_reservation(&form("999"), "SabaAdmin", &connection),
            Err(Error::InvalidForeignKey)
        );
    }

    #[test]
    fn checkout_must_follow_checkin() {
        let connection = get_test_connection();
        let mut form = form("101");
        form.res_checkout = form.res_checkin;

        assert!(matches!(
            create_reservation(&form, "SabaAdmin", &connection),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn missing_fields_are_listed() {
        let connection = get_test_connection();
        let form = ReservationForm {
            res_prj_code: Some("PRJ1".to_owned()),
            res_unit_code: Some("101".to_owned()),
            ..Default::default()
        };

        assert_eq!(
            create_reservation(&form, "SabaAdmin", &connection),
            Err(Error::MissingRequiredFields(
                "resPerCode, resCheckin, resCheckout".to_owned()
            ))
        );
    }

    #[test]
    fn update_then_delete() {
        let connection = get_test_connection();
        let created = create_reservation(&form("101"), "SabaAdmin", &connection).unwrap();
        let mut changed = form("101");
        changed.res_status = Some("confirmed".to_owned());

        let updated = update_reservation(created.res_id, &changed, &connection).unwrap();
        assert_eq!(updated.res_status, "confirmed");

        delete_reservation(created.res_id, &connection).unwrap();
        assert_eq!(get_all_reservations(&connection), Ok(vec![]));
        assert_eq!(
            update_reservation(created.res_id, &changed, &connection),
            Err(Error::NotFound)
        );
    }
}
