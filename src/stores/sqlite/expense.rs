//! SQLite schema and queries for expenses.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    Error,
    category::Category,
    db::{CreateTable, MapRow},
    expense::{ExpenseId, ExpensePatch, ExpenseRecord, NewExpense},
    list_view::FilterSpec,
    user::UserId,
};

const EXPENSE_COLUMNS: &str =
    "id, owner_id, amount, description, category, date, created_at, updated_at";

impl CreateTable for ExpenseRecord {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT
            )",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_expense_owner_date ON expense(owner_id, date);",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for ExpenseRecord {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            owner_id: UserId::new(row.get(offset + 1)?),
            amount: row.get(offset + 2)?,
            description: row.get(offset + 3)?,
            category: row.get(offset + 4)?,
            date: row.get(offset + 5)?,
            created_at: row.get(offset + 6)?,
            updated_at: row.get(offset + 7)?,
        })
    }
}

/// Retrieve the expenses owned by `owner_id` that pass `filter`, newest first.
///
/// The category and amount bounds narrow the SQL query. Every row is then
/// checked with [FilterSpec::matches], which also applies the date bounds to
/// the parsed date, so the result is the same as filtering locally.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn list_expenses(
    owner_id: UserId,
    filter: Option<&FilterSpec>,
    connection: &Connection,
) -> Result<Vec<ExpenseRecord>, Error> {
    let mut where_clause_parts = vec!["owner_id = ?1".to_owned()];
    let mut query_parameters = vec![Value::Integer(owner_id.as_i64())];

    if let Some(filter) = filter {
        let mut push = |clause: &str, value: Value| {
            query_parameters.push(value);
            where_clause_parts.push(format!("{clause} ?{}", query_parameters.len()));
        };

        // "Other" also covers unrecognised text, which SQL cannot tell apart.
        if let Some(category) = filter.category.filter(|category| *category != Category::Other) {
            push("category =", Value::Text(category.label().to_owned()));
        }
        if let Some(min_amount) = filter.min_amount {
            push("amount >=", Value::Real(min_amount));
        }
        if let Some(max_amount) = filter.max_amount {
            push("amount <=", Value::Real(max_amount));
        }
    }

    let query_string = format!(
        "SELECT {EXPENSE_COLUMNS} FROM expense WHERE {} ORDER BY date DESC, id DESC",
        where_clause_parts.join(" AND ")
    );

    let expenses = connection
        .prepare(&query_string)?
        .query_map(params_from_iter(query_parameters.iter()), ExpenseRecord::map_row)?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    Ok(match filter {
        Some(filter) => expenses
            .into_iter()
            .filter(|expense| filter.matches(expense))
            .collect(),
        None => expenses,
    })
}

/// Create a new expense owned by `owner_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the expense fails validation,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_expense(
    owner_id: UserId,
    expense: NewExpense,
    connection: &Connection,
) -> Result<ExpenseRecord, Error> {
    expense.validate()?;

    let created = connection
        .prepare(&format!(
            "INSERT INTO expense (owner_id, amount, description, category, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                owner_id.as_i64(),
                expense.amount,
                expense.description,
                expense.category,
                expense.date,
                OffsetDateTime::now_utc(),
            ),
            ExpenseRecord::map_row,
        )?;

    Ok(created)
}

/// Apply `patch` to the expense `id` owned by `owner_id`.
///
/// `updated_at` is set to the patch's value, or now if the patch does not set
/// it.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the patch fails validation,
/// - [Error::UpdateMissingExpense] if `owner_id` owns no expense with `id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    owner_id: UserId,
    patch: ExpensePatch,
    connection: &Connection,
) -> Result<ExpenseRecord, Error> {
    patch.validate()?;

    connection
        .prepare(&format!(
            "UPDATE expense SET
                amount = COALESCE(?1, amount),
                description = COALESCE(?2, description),
                category = COALESCE(?3, category),
                date = COALESCE(?4, date),
                updated_at = ?5
             WHERE id = ?6 AND owner_id = ?7
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                patch.amount,
                patch.description,
                patch.category,
                patch.date,
                patch.updated_at.unwrap_or_else(OffsetDateTime::now_utc),
                id,
                owner_id.as_i64(),
            ),
            ExpenseRecord::map_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingExpense,
            error => error.into(),
        })
}

/// Delete the expense `id` if `owner_id` owns it.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn delete_expense(
    id: ExpenseId,
    owner_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND owner_id = ?2",
        (id, owner_id.as_i64()),
    )?;

    if rows_affected == 0 {
        tracing::debug!("No expense {id} owned by user {owner_id} to delete");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        category::{Category, StoredCategory},
        db::initialize,
        expense::{ExpenseDate, ExpensePatch, ExpenseRecord},
        list_view::FilterSpec,
        stores::sqlite::expense::{delete_expense, insert_expense, list_expenses, update_expense},
        user::UserId,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn seed(conn: &Connection, owner_id: UserId) -> Vec<ExpenseRecord> {
        [
            ExpenseRecord::build(50.0, date!(2024 - 01 - 05), "Groceries")
                .category(Category::FoodAndDining),
            ExpenseRecord::build(30.0, date!(2024 - 01 - 10), "Lunch")
                .category(Category::FoodAndDining),
            ExpenseRecord::build(20.0, date!(2024 - 01 - 15), "Taxi").category(Category::Travel),
        ]
        .into_iter()
        .map(|expense| insert_expense(owner_id, expense, conn).unwrap())
        .collect()
    }

    #[test]
    fn insert_returns_stored_record() {
        let conn = get_test_connection();
        let owner_id = UserId::new(1);

        let created = insert_expense(
            owner_id,
            ExpenseRecord::build(12.3, date!(2024 - 01 - 05), "  Coffee  ")
                .category(Category::FoodAndDining),
            &conn,
        )
        .unwrap();

        assert_eq!(created.owner_id, owner_id);
        assert_eq!(created.amount, 12.3);
        assert_eq!(created.description, "Coffee");
        assert_eq!(created.category, StoredCategory::Known(Category::FoodAndDining));
        assert_eq!(created.date, ExpenseDate::Valid(date!(2024 - 01 - 05)));
        assert_eq!(created.updated_at, None);
    }

    #[test]
    fn insert_rejects_invalid_amount() {
        let conn = get_test_connection();

        let result = insert_expense(
            UserId::new(1),
            ExpenseRecord::build(-1.0, date!(2024 - 01 - 05), "Refund"),
            &conn,
        );

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(list_expenses(UserId::new(1), None, &conn).unwrap().is_empty());
    }

    #[test]
    fn list_is_scoped_to_owner_and_newest_first() {
        let conn = get_test_connection();
        let mine = seed(&conn, UserId::new(1));
        seed(&conn, UserId::new(2));

        let got = list_expenses(UserId::new(1), None, &conn).unwrap();

        let ids: Vec<i64> = got.iter().map(|expense| expense.id).collect();
        assert_eq!(ids, vec![mine[2].id, mine[1].id, mine[0].id]);
    }

    #[test]
    fn list_applies_filter() {
        let conn = get_test_connection();
        let mine = seed(&conn, UserId::new(1));
        let filter = FilterSpec {
            category: Some(Category::Travel),
            min_amount: Some(10.0),
            ..Default::default()
        };

        let got = list_expenses(UserId::new(1), Some(&filter), &conn).unwrap();

        assert_eq!(got, vec![mine[2].clone()]);
    }

    #[test]
    fn list_filter_matches_local_predicate_for_odd_rows() {
        let conn = get_test_connection();
        conn.execute(
            "INSERT INTO expense (owner_id, amount, description, category, date, created_at)
             VALUES (1, 5.0, 'Legacy', 'Groceries', 'someday', '2024-01-01T00:00:00Z')",
            (),
        )
        .unwrap();
        seed(&conn, UserId::new(1));

        let other = FilterSpec {
            category: Some(Category::Other),
            ..Default::default()
        };
        let dated = FilterSpec {
            start_date: Some(date!(2024 - 01 - 01)),
            ..Default::default()
        };

        let others = list_expenses(UserId::new(1), Some(&other), &conn).unwrap();
        let in_range = list_expenses(UserId::new(1), Some(&dated), &conn).unwrap();

        assert_eq!(others.len(), 1);
        assert_eq!(others[0].category.as_str(), "Groceries");
        assert_eq!(others[0].date, ExpenseDate::Invalid("someday".to_owned()));
        assert_eq!(in_range.len(), 3);
    }

    #[test]
    fn list_date_filter_accepts_padded_stored_date() {
        let conn = get_test_connection();
        conn.execute(
            "INSERT INTO expense (owner_id, amount, description, category, date, created_at)
             VALUES (1, 5.0, 'Padded', 'Travel', ' 2024-01-05', '2024-01-01T00:00:00Z')",
            (),
        )
        .unwrap();
        let filter = FilterSpec {
            start_date: Some(date!(2024 - 01 - 01)),
            end_date: Some(date!(2024 - 01 - 31)),
            ..Default::default()
        };
        let all = list_expenses(UserId::new(1), None, &conn).unwrap();
        let local: Vec<ExpenseRecord> = all
            .into_iter()
            .filter(|expense| filter.matches(expense))
            .collect();

        let got = list_expenses(UserId::new(1), Some(&filter), &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].date, ExpenseDate::Valid(date!(2024 - 01 - 05)));
        assert_eq!(got, local);
    }

    #[test]
    fn update_merges_and_stamps_updated_at() {
        let conn = get_test_connection();
        let mine = seed(&conn, UserId::new(1));
        let mut patch = ExpensePatch::default().amount(25.0).category(Category::Business);
        patch.updated_at = Some(datetime!(2024-01-16 08:00 UTC));

        let updated = update_expense(mine[2].id, UserId::new(1), patch, &conn).unwrap();

        assert_eq!(updated.amount, 25.0);
        assert_eq!(updated.category.bucket(), Category::Business);
        assert_eq!(updated.description, "Taxi");
        assert_eq!(updated.updated_at, Some(datetime!(2024-01-16 08:00 UTC)));
    }

    #[test]
    fn update_other_users_expense_is_missing() {
        let conn = get_test_connection();
        let theirs = seed(&conn, UserId::new(2));

        let result = update_expense(
            theirs[0].id,
            UserId::new(1),
            ExpensePatch::default().amount(1.0),
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingExpense));
        let unchanged = list_expenses(UserId::new(2), None, &conn).unwrap();
        assert!(unchanged.iter().all(|expense| expense.amount != 1.0));
    }

    #[test]
    fn delete_is_owner_scoped_and_idempotent() {
        let conn = get_test_connection();
        let mine = seed(&conn, UserId::new(1));
        let theirs = seed(&conn, UserId::new(2));

        delete_expense(mine[0].id, UserId::new(1), &conn).unwrap();
        delete_expense(mine[0].id, UserId::new(1), &conn).unwrap();
        delete_expense(theirs[0].id, UserId::new(1), &conn).unwrap();

        assert_eq!(list_expenses(UserId::new(1), None, &conn).unwrap().len(), 2);
        assert_eq!(list_expenses(UserId::new(2), None, &conn).unwrap().len(), 3);
    }
}
