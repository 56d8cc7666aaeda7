use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::macros::date;

use saba_booking::{
    PasswordHash, ValidatedPassword,
    account::{AccountForm, create_account},
    auth::{Role, insert_user_account},
    initialize_db,
    journal::{JournalForm, JournalLineForm, save_journal},
    person::{PersonForm, create_person},
    project::{ProjectForm, create_project},
    wallet::open_wallet,
};

const ADMIN_CODE: &str = "P0001";

/// A utility for creating a seeded database for the Saba booking server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// Username of the admin user.
    #[arg(long, default_value = "admin")]
    username: String,

    /// Password of the admin user. Not checked for strength.
    #[arg(long, default_value = "admin")]
    password: String,
}

/// Create a database with an admin user, a starter chart of accounts and a
/// sample project for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'saba.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;
    initialize_db(&connection)?;

    println!("Creating admin user {}...", args.username);
    seed_admin(&connection, &args.username, &args.password)?;

    println!("Creating chart of accounts...");
    seed_accounts(&connection)?;

    println!("Creating sample project and opening journal...");
    seed_project(&connection)?;

    println!("Success!");

    Ok(())
}

fn seed_admin(
    connection: &Connection,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn Error>> {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(password),
        PasswordHash::DEFAULT_COST,
    )?;

    let transaction = connection.unchecked_transaction()?;
    create_person(
        &PersonForm {
            per_code: Some(ADMIN_CODE.to_owned()),
            per_name: Some("Admin".to_owned()),
            per_is_active: Some(true),
            ..Default::default()
        },
        ADMIN_CODE,
        &transaction,
    )?;
    insert_user_account(
        ADMIN_CODE,
        username,
        &password_hash,
        Role::Admin,
        None,
        &transaction,
    )?;
    open_wallet(ADMIN_CODE, &transaction)?;
    transaction.commit()?;

    Ok(())
}

/// Code, name, parent, sublevel format, type and category of the starter accounts.
const ACCOUNTS: [(&str, &str, Option<&str>, i64, &str, &str); 8] = [
    ("1", "Assets", None, 2, "debit", "asset"),
    ("11", "Current assets", Some("1"), 2, "debit", "asset"),
    ("1101", "Cash", Some("11"), 0, "debit", "asset"),
    ("2", "Liabilities", None, 2, "credit", "liability"),
    ("3", "Equity", None, 2, "credit", "equity"),
    ("3101", "Owner capital", Some("3"), 0, "credit", "equity"),
    ("4", "Income", None, 2, "credit", "income"),
    ("4101", "Booking income", Some("4"), 0, "credit", "income"),
];

fn seed_accounts(connection: &Connection) -> Result<(), Box<dyn Error>> {
    let transaction = connection.unchecked_transaction()?;

    for (code, name, parent, sublevel_format, acc_type, category) in ACCOUNTS {
        create_account(
            &AccountForm {
                acc_code: Some(code.to_owned()),
                acc_name: Some(name.to_owned()),
                acc_parent_code: parent.map(str::to_owned),
                acc_sublevel_format: Some(sublevel_format),
                acc_type: Some(acc_type.to_owned()),
                acc_category: Some(category.to_owned()),
                acc_is_active: Some(true),
                ..Default::default()
            },
            ADMIN_CODE,
            &transaction,
        )?;
    }

    transaction.commit()?;

    Ok(())
}

fn seed_project(connection: &Connection) -> Result<(), Box<dyn Error>> {
    create_project(
        &ProjectForm {
            prj_code: Some("PRJ1".to_owned()),
            prj_title: Some("Saba villa".to_owned()),
            prj_location: Some("Ramsar".to_owned()),
            prj_start_date: Some(date!(2025 - 03 - 21)),
            prj_is_active: Some(true),
            ..Default::default()
        },
        ADMIN_CODE,
        connection,
    )?;

    let journal = save_journal(
        &JournalForm {
            jrn_date: Some(date!(2025 - 03 - 21)),
            jrn_desc: Some("Opening balance".to_owned()),
            jrn_is_posted: Some(true),
            journal_details: vec![
                JournalLineForm {
                    jrd_acc_code: Some("1101".to_owned()),
                    jrd_debit: Some(1_000_000.0),
                    ..Default::default()
                },
                JournalLineForm {
                    jrd_acc_code: Some("3101".to_owned()),
                    jrd_credit: Some(1_000_000.0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        },
        ADMIN_CODE,
        connection,
    )?;
    println!("Saved journal {}", journal.jrn_code);

    Ok(())
}
