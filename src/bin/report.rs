use std::{error::Error, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use time::Date;
use tracing_subscriber::filter::LevelFilter;

use spendwise_rs::{
    AppConfig, ExpenseController, FetchOutcome, SQLiteStore,
    category::Category,
    config::{DEFAULT_RECENT_LIMIT, DEFAULT_TIMEZONE},
    dashboard::{Dashboard, SeriesPoint},
    expense::{ExpenseRecord, parse_date},
    format::currency,
    list_view::{FilterMode, FilterSpec, ListSummary, SortDirection, SortField, SortSpec},
    logging::setup_logging,
    session::{Session, SessionContext},
    timezone::local_today,
    user::UserId,
};

/// Print a user's spending dashboard or transaction list from a spendwise database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the SQLite database.
    #[arg(long, short, env = "SPENDWISE_DB_PATH", default_value = "spendwise.db")]
    db_path: String,

    /// The ID of the user to report on.
    #[arg(long, short, env = "SPENDWISE_USER_ID")]
    user_id: i64,

    /// Canonical timezone name, e.g. "Pacific/Auckland", used to decide
    /// which day it is today.
    #[arg(long, env = "SPENDWISE_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// Seconds to wait for the database before giving up.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// How many expenses to show in the dashboard's recent list.
    #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
    recent_limit: usize,

    /// What to print.
    #[arg(long, value_enum, default_value_t = View::Dashboard)]
    view: View,

    /// How to print it.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Only list expenses in this category, e.g. "Food & Dining".
    #[arg(long, value_parser = parse_category)]
    category: Option<Category>,

    /// Only list expenses on or after this date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date_arg)]
    from: Option<Date>,

    /// Only list expenses on or before this date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date_arg)]
    to: Option<Date>,

    /// Only list expenses of at least this amount.
    #[arg(long)]
    min_amount: Option<f64>,

    /// Only list expenses of at most this amount.
    #[arg(long)]
    max_amount: Option<f64>,

    /// The column to sort the list by.
    #[arg(long, value_enum, default_value_t = SortColumn::Date)]
    sort: SortColumn,

    /// Sort the list in ascending order instead of descending.
    #[arg(long)]
    ascending: bool,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,

    /// Also append logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    Dashboard,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortColumn {
    Date,
    Amount,
    Category,
    Description,
}

impl From<SortColumn> for SortField {
    fn from(column: SortColumn) -> Self {
        match column {
            SortColumn::Date => SortField::Date,
            SortColumn::Amount => SortField::Amount,
            SortColumn::Category => SortField::Category,
            SortColumn::Description => SortField::Description,
        }
    }
}

fn parse_category(label: &str) -> Result<Category, String> {
    Category::from_label(label).ok_or_else(|| {
        let labels: Vec<&str> = Category::ALL.iter().map(|category| category.label()).collect();
        format!("expected one of: {}", labels.join(", "))
    })
}

fn parse_date_arg(text: &str) -> Result<Date, String> {
    parse_date(text).map_err(|error| error.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    setup_logging(args.log_level, args.log_file.as_deref())?;

    let config = AppConfig {
        db_path: args.db_path.clone(),
        local_timezone: args.timezone.clone(),
        store_timeout: Duration::from_secs(args.timeout_secs),
        recent_limit: args.recent_limit,
        filter_mode: FilterMode::Staged,
    };

    let today = local_today(&config.local_timezone)?;
    let store = SQLiteStore::open(&config.db_path)?;
    let user_id = UserId::new(args.user_id);
    let session = SessionContext::signed_in(Session {
        user_id,
        email: String::new(),
        display_name: format!("User {user_id}"),
    });
    let controller = ExpenseController::new(store, session, &config);

    match args.view {
        View::Dashboard => {
            let FetchOutcome::Fresh(dashboard) = controller.load_dashboard(today).await? else {
                return Ok(());
            };

            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
                OutputFormat::Text => print_dashboard(&dashboard),
            }
        }
        View::List => {
            controller.edit_filter(|filter| {
                *filter = FilterSpec {
                    category: args.category,
                    start_date: args.from,
                    end_date: args.to,
                    min_amount: args.min_amount,
                    max_amount: args.max_amount,
                }
            });
            controller.set_sort(SortSpec {
                field: args.sort.into(),
                direction: if args.ascending {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                },
            });

            let outcome = if controller.has_staged_changes() {
                controller.apply_filter().await?
            } else {
                controller.refresh().await?
            };
            let FetchOutcome::Fresh(records) = outcome else {
                return Ok(());
            };
            let summary = controller.summary();

            match args.format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "expenses": records,
                        "summary": summary,
                    }))?
                ),
                OutputFormat::Text => print_list(&records, &summary),
            }
        }
    }

    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    let usage = &dashboard.budget_usage;

    println!("Spending as of {}", dashboard.as_of);
    println!();
    println!("{:<16}{:>14}", "Total", currency(dashboard.summary.total));
    println!("{:<16}{:>14}", "This month", currency(dashboard.summary.this_month));
    println!("{:<16}{:>14}", "This week", currency(dashboard.summary.this_week));
    println!();
    println!(
        "Monthly budget: {} of {} ({:.0}%), {} left",
        currency(usage.monthly_spent),
        currency(usage.monthly_budget),
        usage.monthly_ratio * 100.0,
        currency(usage.monthly_remaining),
    );
    println!(
        "Weekly budget:  {} of {} ({:.0}%), {} left",
        currency(usage.weekly_spent),
        currency(usage.weekly_budget),
        usage.weekly_ratio * 100.0,
        currency(usage.weekly_remaining),
    );

    println!();
    println!("By category");
    for category_total in &dashboard.categories {
        println!(
            "  {} {:<18}{:>14}",
            category_total.category.icon(),
            category_total.category.label(),
            currency(category_total.total)
        );
    }

    print_series("Last 7 days", &dashboard.daily);
    print_series("Last 6 months", &dashboard.monthly);

    println!();
    println!("Recent");
    for record in &dashboard.recent {
        print_record(record);
    }
}

fn print_series(title: &str, points: &[SeriesPoint]) {
    println!();
    println!("{title}");
    for point in points {
        println!("  {:<10}{:>14}", point.label, currency(point.total));
    }
}

fn print_list(records: &[ExpenseRecord], summary: &ListSummary) {
    for record in records {
        print_record(record);
    }

    println!();
    println!(
        "{} expenses, {} total, {} average",
        summary.count,
        currency(summary.sum),
        currency(summary.average)
    );
}

fn print_record(record: &ExpenseRecord) {
    println!(
        "  {:<12}{:<20}{:<30}{:>14}",
        record.date.to_string(),
        record.category.bucket().label(),
        record.description,
        currency(record.amount)
    );
}
