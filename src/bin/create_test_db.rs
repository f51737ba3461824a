use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use time::{Duration, OffsetDateTime};

use spendwise_rs::{
    ExpenseStore, SQLiteStore, budget::BudgetUpdate, category::Category, expense::ExpenseRecord,
    user::UserId,
};

/// A utility for creating a test database for spendwise_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The ID of the user that owns the test expenses.
    #[arg(long, short, default_value_t = 1)]
    user_id: i64,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let store = SQLiteStore::open(&args.output_path)?;
    let owner_id = UserId::new(args.user_id);
    let today = OffsetDateTime::now_utc().date();

    println!("Creating test expenses for user {owner_id}...");

    let expenses = [
        (0, 12.5, Category::FoodAndDining, "Coffee and bagel"),
        (1, 64.2, Category::FoodAndDining, "Weekly groceries"),
        (2, 45.0, Category::Transportation, "Fuel"),
        (3, 120.0, Category::BillsAndUtilities, "Power bill"),
        (5, 89.99, Category::Shopping, "Running shoes"),
        (9, 18.0, Category::Entertainment, "Movie tickets"),
        (14, 60.0, Category::Healthcare, "Prescription"),
        (25, 350.0, Category::Travel, "Flights"),
        (40, 42.0, Category::Education, "Textbook"),
        (70, 1500.0, Category::BillsAndUtilities, "Rent"),
        (100, 230.0, Category::Business, "Conference ticket"),
        (150, 9.5, Category::Other, "Gift wrap"),
    ];

    for (days_ago, amount, category, description) in expenses {
        store.insert_expense(
            owner_id,
            ExpenseRecord::build(amount, today - Duration::days(days_ago), description)
                .category(category),
        )?;
    }

    // A category written by an older client, shown as Other.
    store.insert_expense(
        owner_id,
        ExpenseRecord::build(27.0, today - Duration::days(4), "Dog food").category("Pets"),
    )?;

    println!("Saving budget...");

    store.upsert_budget_setting(
        owner_id,
        BudgetUpdate {
            monthly_budget: Some(2500.0),
            weekly_budget: Some(600.0),
        },
    )?;

    println!("Success!");

    Ok(())
}
