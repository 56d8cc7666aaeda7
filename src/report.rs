//! Read-only reports backed by SQL views.
//!
//! Every report is a view created alongside the tables. The endpoints return the
//! view's rows as JSON objects keyed by column name.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::{Connection, Row, types::ValueRef};
use serde_json::{Map, Number, Value};

use crate::{
    AppState, Error,
    db::lock_connection,
    response::{Envelope, codes, success},
};

/// One row of a report.
pub type ReportRow = Map<String, Value>;

/// The reports that can be requested by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    GeneralLedger,
    PersonLedger,
    TrialBalance,
    PersonBalance,
    ConfigMap,
    ReservationSummary,
    WalletBalance,
    WalletTxnHistory,
    ProfitDistribution,
    UserLogAudit,
    ProjectPersonRoles,
    ReservationReportSummary,
    ShareholdingSummary,
}

impl Report {
    pub const ALL: [Report; 13] = [
        Report::GeneralLedger,
        Report::PersonLedger,
        Report::TrialBalance,
        Report::PersonBalance,
        Report::ConfigMap,
        Report::ReservationSummary,
        Report::WalletBalance,
        Report::WalletTxnHistory,
        Report::ProfitDistribution,
        Report::UserLogAudit,
        Report::ProjectPersonRoles,
        Report::ReservationReportSummary,
        Report::ShareholdingSummary,
    ];

    /// The route name, e.g. `rptGetTrialBalance`.
    pub fn route_name(self) -> &'static str {
        match self {
            Report::GeneralLedger => "rptGetGeneralLedger",
            Report::PersonLedger => "rptGetPersonLedger",
            Report::TrialBalance => "rptGetTrialBalance",
            Report::PersonBalance => "rptGetPersonBalance",
            Report::ConfigMap => "rptGetConfigMap",
            Report::ReservationSummary => "rptGetReservationSummary",
            Report::WalletBalance => "rptGetWalletBalance",
            Report::WalletTxnHistory => "rptGetWalletTxnHistory",
            Report::ProfitDistribution => "rptGetProfitDistribution",
            Report::UserLogAudit => "rptGetUserLogAudit",
            Report::ProjectPersonRoles => "rptGetProjectPersonRoles",
            Report::ReservationReportSummary => "rptGetReservationReportSummary",
            Report::ShareholdingSummary => "rptGetShareholdingSummary",
        }
    }

    pub fn view_name(self) -> &'static str {
        match self {
            Report::GeneralLedger => "v_general_ledger",
            Report::PersonLedger => "v_person_ledger",
            Report::TrialBalance => "v_trial_balance",
            Report::PersonBalance => "v_person_balance",
            Report::ConfigMap => "v_config_map",
            Report::ReservationSummary => "v_reservation_summary",
            Report::WalletBalance => "v_wallet_balance",
            Report::WalletTxnHistory => "v_wallet_txn_history",
            Report::ProfitDistribution => "v_profit_distribution",
            Report::UserLogAudit => "v_user_log_audit",
            Report::ProjectPersonRoles => "v_project_person_roles",
            Report::ReservationReportSummary => "v_reservation_report_summary",
            Report::ShareholdingSummary => "v_shareholding_summary",
        }
    }

    pub fn from_route_name(name: &str) -> Option<Report> {
        Report::ALL
            .into_iter()
            .find(|report| report.route_name() == name)
    }
}

/// Create the report views.
///
/// Views are only created when missing, so changing a definition requires
/// dropping the old view first.
pub fn create_report_views(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE VIEW IF NOT EXISTS v_general_ledger AS
        SELECT j.jrn_date, j.jrn_code, j.jrn_desc, jd.jrd_line_no, jd.jrd_acc_code,
            a.acc_name AS account_name, jd.jrd_debit, jd.jrd_credit, jd.jrd_desc AS line_desc,
            j.jrn_module, j.jrn_ref_code
        FROM journal j
        JOIN journal_detail jd ON jd.jrd_jrn_code = j.jrn_code
        JOIN account a ON a.acc_code = jd.jrd_acc_code
        WHERE j.jrn_is_posted = 1
        ORDER BY j.jrn_date, j.jrn_code, jd.jrd_line_no;

        CREATE VIEW IF NOT EXISTS v_person_ledger AS
        SELECT p.per_code, p.per_name, p.per_last_name, p.per_acc_code, j.jrn_date, j.jrn_code,
            j.jrn_desc, jd.jrd_line_no, jd.jrd_debit, jd.jrd_credit, jd.jrd_desc AS line_desc
        FROM person p
        JOIN journal_detail jd ON jd.jrd_acc_code = p.per_acc_code
        JOIN journal j ON j.jrn_code = jd.jrd_jrn_code
        WHERE j.jrn_is_posted = 1
        ORDER BY p.per_code, j.jrn_date, j.jrn_code, jd.jrd_line_no;

        CREATE VIEW IF NOT EXISTS v_trial_balance AS
        SELECT a.acc_code, a.acc_name, a.acc_type, a.acc_category,
            COALESCE(SUM(pd.jrd_debit), 0) AS total_debit,
            COALESCE(SUM(pd.jrd_credit), 0) AS total_credit,
            CASE a.acc_type
                WHEN 'debit' THEN COALESCE(SUM(pd.jrd_debit), 0) - COALESCE(SUM(pd.jrd_credit), 0)
                WHEN 'credit' THEN COALESCE(SUM(pd.jrd_credit), 0) - COALESCE(SUM(pd.jrd_debit), 0)
                ELSE 0
            END AS balance
        FROM account a
        LEFT JOIN (
            SELECT jd.jrd_acc_code, jd.jrd_debit, jd.jrd_credit
            FROM journal_detail jd
            JOIN journal j ON j.jrn_code = jd.jrd_jrn_code
            WHERE j.jrn_is_posted = 1
        ) pd ON pd.jrd_acc_code = a.acc_code
        WHERE a.acc_is_active = 1
        GROUP BY a.acc_code, a.acc_name, a.acc_type, a.acc_category
        ORDER BY a.acc_code;

        CREATE VIEW IF NOT EXISTS v_person_balance AS
        SELECT p.per_code, p.per_name, p.per_last_name, p.per_acc_code,
            COALESCE(SUM(pd.jrd_debit), 0) AS total_debit,
            COALESCE(SUM(pd.jrd_credit), 0) AS total_credit,
            COALESCE(SUM(pd.jrd_debit), 0) - COALESCE(SUM(pd.jrd_credit), 0) AS balance
        FROM person p
        LEFT JOIN (
            SELECT jd.jrd_acc_code, jd.jrd_debit, jd.jrd_credit
            FROM journal_detail jd
            JOIN journal j ON j.jrn_code = jd.jrd_jrn_code
            WHERE j.jrn_is_posted = 1
        ) pd ON pd.jrd_acc_code = p.per_acc_code
        GROUP BY p.per_code, p.per_name, p.per_last_name, p.per_acc_code
        ORDER BY p.per_code;

        CREATE VIEW IF NOT EXISTS v_config_map AS
        SELECT ts.category, ts.key, ts.value, ts.language_code
        FROM theme_setting ts
        WHERE ts.is_active = 1
        ORDER BY ts.category, ts.key, ts.language_code;

        CREATE VIEW IF NOT EXISTS v_reservation_summary AS
        SELECT r.res_id, r.res_prj_code, prj.prj_title AS project_title, r.res_unit_code,
            u.unt_title AS unit_title, r.res_per_code, p.per_name AS person_name,
            r.res_checkin, r.res_checkout, r.res_guest_count, r.res_total_price, r.res_status,
            CAST(julianday(r.res_checkout) - julianday(r.res_checkin) AS INTEGER) AS nights_count
        FROM reservation r
        JOIN project prj ON prj.prj_code = r.res_prj_code
        JOIN unit u ON u.unt_prj_code = r.res_prj_code AND u.unt_code = r.res_unit_code
        JOIN person p ON p.per_code = r.res_per_code
        ORDER BY r.res_checkin DESC;

        CREATE VIEW IF NOT EXISTS v_wallet_balance AS
        SELECT w.wlt_per_code, p.per_name, w.wlt_balance, w.wlt_last_update,
            COALESCE(SUM(wt.wtx_amount), 0) AS total_transactions
        FROM wallet w
        JOIN person p ON p.per_code = w.wlt_per_code
        LEFT JOIN wallet_transaction wt ON wt.wtx_per_code = w.wlt_per_code
        GROUP BY w.wlt_per_code, p.per_name, w.wlt_balance, w.wlt_last_update
        ORDER BY w.wlt_per_code;

        CREATE VIEW IF NOT EXISTS v_wallet_txn_history AS
        SELECT wt.wtx_id, wt.wtx_per_code, p.per_name AS person_name, wt.wtx_amount,
            wt.wtx_type, wt.wtx_date, wt.wtx_desc, wt.wtx_ref_code
        FROM wallet_transaction wt
        JOIN person p ON p.per_code = wt.wtx_per_code
        ORDER BY wt.wtx_date DESC, wt.wtx_id DESC;

        CREATE VIEW IF NOT EXISTS v_profit_distribution AS
        SELECT sp.spt_id, sp.spt_prj_code, prj.prj_title AS project_title, sp.spt_per_code,
            p.per_name AS person_name, sp.spt_amount, sp.spt_date, sp.spt_desc
        FROM share_profit sp
        JOIN project prj ON prj.prj_code = sp.spt_prj_code
        JOIN person p ON p.per_code = sp.spt_per_code
        ORDER BY sp.spt_date DESC, sp.spt_id DESC;

        CREATE VIEW IF NOT EXISTS v_user_log_audit AS
        SELECT ul.ulg_id, ul.ulg_per_code, p.per_name AS person_name, ul.ulg_action,
            ul.ulg_table_name, ul.ulg_record_key, ul.ulg_desc, ul.ulg_timestamp
        FROM user_log ul
        LEFT JOIN person p ON p.per_code = ul.ulg_per_code
        ORDER BY ul.ulg_timestamp DESC, ul.ulg_id DESC;

        CREATE VIEW IF NOT EXISTS v_project_person_roles AS
        SELECT roles.prj_code, prj.prj_title AS project_title, roles.per_code,
            p.per_name AS person_name, roles.role
        FROM (
            SELECT shr_prj_code AS prj_code, shr_per_code AS per_code, 'shareholder' AS role
            FROM shareholding
            UNION
            SELECT res_prj_code, res_per_code, 'guest' FROM reservation
        ) roles
        JOIN project prj ON prj.prj_code = roles.prj_code
        JOIN person p ON p.per_code = roles.per_code
        ORDER BY roles.prj_code, roles.per_code, roles.role;

        CREATE VIEW IF NOT EXISTS v_reservation_report_summary AS
        SELECT r.res_prj_code, prj.prj_title AS project_title, r.res_unit_code,
            u.unt_title AS unit_title,
            COUNT(*) AS reservation_count,
            COALESCE(SUM(r.res_guest_count), 0) AS guest_count,
            CAST(SUM(julianday(r.res_checkout) - julianday(r.res_checkin)) AS INTEGER)
                AS nights_count,
            COALESCE(SUM(r.res_total_price), 0) AS total_price
        FROM reservation r
        JOIN project prj ON prj.prj_code = r.res_prj_code
        JOIN unit u ON u.unt_prj_code = r.res_prj_code AND u.unt_code = r.res_unit_code
        GROUP BY r.res_prj_code, prj.prj_title, r.res_unit_code, u.unt_title
        ORDER BY r.res_prj_code, r.res_unit_code;

        CREATE VIEW IF NOT EXISTS v_shareholding_summary AS
        SELECT s.shr_id, s.shr_per_code, p.per_name AS person_name, s.shr_prj_code,
            prj.prj_title AS project_title, s.shr_shares, s.shr_unit_price, s.shr_total_value,
            s.shr_from_date, s.shr_to_date, s.shr_is_active
        FROM shareholding s
        JOIN person p ON p.per_code = s.shr_per_code
        JOIN project prj ON prj.prj_code = s.shr_prj_code
        ORDER BY s.shr_from_date DESC, s.shr_id;",
    )
}

fn map_value(value: ValueRef) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::from(number),
        ValueRef::Real(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
        ValueRef::Text(text) | ValueRef::Blob(text) => {
            Value::String(String::from_utf8_lossy(text).into_owned())
        }
    }
}

fn map_row_to_report_row(row: &Row, columns: &[String]) -> Result<ReportRow, rusqlite::Error> {
    let mut report_row = Map::with_capacity(columns.len());

    for (index, column) in columns.iter().enumerate() {
        report_row.insert(column.clone(), map_value(row.get_ref(index)?));
    }

    Ok(report_row)
}

/// Get every row of `report`.
pub fn get_report(report: Report, connection: &Connection) -> Result<Vec<ReportRow>, Error> {
    let mut statement = connection.prepare(&format!("SELECT * FROM {}", report.view_name()))?;
    let columns: Vec<String> = statement
        .column_names()
        .into_iter()
        .map(str::to_owned)
        .collect();

    statement
        .query_map([], |row| map_row_to_report_row(row, &columns))?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// The state needed by the report endpoints.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Serve the report named by the path, e.g. `/api/reports/rptGetTrialBalance`.
pub async fn get_report_endpoint(
    State(state): State<ReportState>,
    Path(report_name): Path<String>,
) -> Result<Json<Envelope<Vec<ReportRow>>>, Error> {
    let report = Report::from_route_name(&report_name).ok_or(Error::NotFound)?;
    let connection = lock_connection(&state.db_connection)?;

    Ok(success(codes::REPORT_DATA, get_report(report, &connection)?))
}
