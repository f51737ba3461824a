//! Drives the list view and dashboard for the signed in user.
//!
//! The [ExpenseController] is the only place that talks to the
//! [ExpenseStore]. Store calls run on the blocking thread pool with a timeout,
//! fetch responses that were superseded by a newer fetch are discarded, and
//! only one update or delete may be in flight per expense.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use time::Date;

use crate::{
    Error,
    budget::{BudgetSetting, BudgetUpdate},
    config::AppConfig,
    dashboard::Dashboard,
    expense::{ExpenseId, ExpensePatch, ExpenseRecord, NewExpense},
    list_view::{FilterMode, FilterSpec, ListSummary, ListView, Mutation, SortField, SortSpec},
    request::{InFlightMutations, RequestGuard},
    session::{SessionContext, SessionEvent, SubscriptionId},
    stores::ExpenseStore,
    user::UserId,
};

/// The result of a fetch that may have been overtaken by a newer one.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The response to the most recent fetch.
    Fresh(T),
    /// A newer fetch was issued, or the session changed, before this one
    /// resolved. The response was dropped.
    Superseded,
}

impl<T> FetchOutcome<T> {
    /// The fetched value, or `None` if it was superseded.
    pub fn fresh(self) -> Option<T> {
        match self {
            FetchOutcome::Fresh(value) => Some(value),
            FetchOutcome::Superseded => None,
        }
    }
}

/// Coordinates the expense store, the session and the list view for one user
/// interface.
#[derive(Debug)]
pub struct ExpenseController<S> {
    store: S,
    session: SessionContext,
    list: Arc<Mutex<ListView>>,
    list_fetches: Arc<RequestGuard>,
    dashboard_fetches: Arc<RequestGuard>,
    mutations: InFlightMutations,
    store_timeout: Duration,
    recent_limit: usize,
    subscription: SubscriptionId,
}

impl<S> ExpenseController<S>
where
    S: ExpenseStore + Clone + Send + Sync + 'static,
{
    /// Create a controller for `store` that follows `session`.
    ///
    /// Signing in or out discards the loaded expenses and any fetch still in
    /// flight.
    pub fn new(store: S, session: SessionContext, config: &AppConfig) -> Self {
        let list = Arc::new(Mutex::new(ListView::new(config.filter_mode)));
        let list_fetches = Arc::new(RequestGuard::new());
        let dashboard_fetches = Arc::new(RequestGuard::new());

        let subscription = session.subscribe({
            let list = Arc::clone(&list);
            let list_fetches = Arc::clone(&list_fetches);
            let dashboard_fetches = Arc::clone(&dashboard_fetches);
            let filter_mode = config.filter_mode;

            move |event| match event {
                SessionEvent::SignedIn(_) | SessionEvent::SignedOut => {
                    list_fetches.invalidate();
                    dashboard_fetches.invalidate();
                    *lock_list(&list) = ListView::new(filter_mode);
                }
                SessionEvent::Refreshed(_) => {}
            }
        });

        Self {
            store,
            session,
            list,
            list_fetches,
            dashboard_fetches,
            mutations: InFlightMutations::new(),
            store_timeout: config.store_timeout,
            recent_limit: config.recent_limit,
            subscription,
        }
    }

    /// The session this controller follows.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Load the user's expenses from the store into the working set.
    ///
    /// In [FilterMode::Staged] the applied filter is sent to the store so only
    /// matching expenses are loaded. In [FilterMode::Immediate] every expense
    /// is loaded and filtered locally.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] if nobody is signed in, or the store's
    /// error if the fetch failed. A failed fetch leaves the working set as it
    /// was.
    pub async fn refresh(&self) -> Result<FetchOutcome<Vec<ExpenseRecord>>, Error> {
        let owner_id = self.session.require_user()?;
        let filter = {
            let list = self.list();

            match list.mode() {
                FilterMode::Staged if !list.applied_filter().is_empty() => {
                    Some(list.applied_filter().clone())
                }
                _ => None,
            }
        };

        let ticket = self.list_fetches.issue();
        let records = self
            .call_store(move |store| store.list_expenses(owner_id, filter.as_ref()))
            .await;

        if !self.list_fetches.is_current(ticket) {
            tracing::warn!("Discarding superseded expense list for user {owner_id}");
            return Ok(FetchOutcome::Superseded);
        }

        let mut list = self.list();
        list.replace_working_set(records?);

        Ok(FetchOutcome::Fresh(list.view()))
    }

    /// Compute the dashboard for the signed in user as of `now`.
    ///
    /// The expenses and the budget setting are fetched concurrently. A user
    /// without a saved budget gets the defaults.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] if nobody is signed in, or the first
    /// error from either fetch.
    pub async fn load_dashboard(&self, now: Date) -> Result<FetchOutcome<Dashboard>, Error> {
        let owner_id = self.session.require_user()?;
        let ticket = self.dashboard_fetches.issue();

        let result = tokio::try_join!(
            self.call_store(move |store| store.list_expenses(owner_id, None)),
            self.call_store(move |store| store.get_budget_setting(owner_id)),
        );

        if !self.dashboard_fetches.is_current(ticket) {
            tracing::warn!("Discarding superseded dashboard for user {owner_id}");
            return Ok(FetchOutcome::Superseded);
        }

        let (records, budget) = result?;
        let budget = budget.unwrap_or_else(|| BudgetSetting::default_for(owner_id));

        Ok(FetchOutcome::Fresh(Dashboard::build(
            &records,
            budget,
            now,
            self.recent_limit,
        )))
    }

    /// Create an expense for the signed in user and add it to the working set
    /// once the store accepts it.
    ///
    /// # Errors
    /// Returns [Error::Validation] before contacting the store if the
    /// expense is invalid, [Error::Unauthenticated] if nobody is signed in, or
    /// the store's error.
    pub async fn create(&self, expense: NewExpense) -> Result<ExpenseRecord, Error> {
        let owner_id = self.session.require_user()?;
        expense.validate()?;

        let record = self
            .call_store(move |store| store.insert_expense(owner_id, expense))
            .await?;
        tracing::info!("Created expense {} for user {owner_id}", record.id);

        self.apply_for(owner_id, Mutation::Insert(record.clone()));

        Ok(record)
    }

    /// Change an expense and patch the working set once the store accepts the
    /// change.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::MutationInFlight] if the expense already has a change in flight,
    ///   including one whose wait timed out but whose store call has not returned,
    /// - [Error::PermissionDenied] if the loaded expense belongs to someone else,
    /// - [Error::Validation] if the patch sets an invalid amount,
    /// - [Error::UpdateMissingExpense] if the store has no such expense for the user,
    /// - or the store's error if the request failed.
    pub async fn update(&self, id: ExpenseId, patch: ExpensePatch) -> Result<ExpenseRecord, Error> {
        let owner_id = self.session.require_user()?;
        self.check_owner(id, owner_id)?;
        patch.validate()?;
        let in_flight = self.mutations.begin(id)?;

        // The guard travels with the store call so the id stays marked until
        // the store returns, even if the wait times out first.
        let (record, _in_flight) = self
            .call_store(move |store| {
                store
                    .update_expense(id, owner_id, patch)
                    .map(|record| (record, in_flight))
            })
            .await?;
        tracing::info!("Updated expense {id} for user {owner_id}");

        self.apply_for(
            owner_id,
            Mutation::Replace {
                id,
                patch: ExpensePatch::from(&record),
            },
        );

        Ok(record)
    }

    /// Delete an expense and remove it from the working set once the store
    /// confirms.
    ///
    /// Deleting an expense that is already gone succeeds.
    ///
    /// # Errors
    /// Returns [Error::MutationInFlight] if the expense already has a change
    /// in flight, [Error::PermissionDenied] if the loaded expense belongs to
    /// someone else, or the store's error.
    pub async fn delete(&self, id: ExpenseId) -> Result<(), Error> {
        let owner_id = self.session.require_user()?;
        self.check_owner(id, owner_id)?;
        let in_flight = self.mutations.begin(id)?;

        let _in_flight = self
            .call_store(move |store| store.delete_expense(id, owner_id).map(|()| in_flight))
            .await?;
        tracing::info!("Deleted expense {id} for user {owner_id}");

        self.apply_for(owner_id, Mutation::Remove(id));

        Ok(())
    }

    /// Whether `id` has a change in flight.
    pub fn is_mutating(&self, id: ExpenseId) -> bool {
        self.mutations.contains(id)
    }

    /// Edit the filter. In [FilterMode::Immediate] the view updates straight
    /// away, in [FilterMode::Staged] the edit waits for [Self::apply_filter].
    ///
    /// Returns true if the applied filter changed.
    pub fn edit_filter(&self, edit: impl FnOnce(&mut FilterSpec)) -> bool {
        self.list().edit_filter(edit)
    }

    /// Apply the staged filter and return the new view.
    ///
    /// In [FilterMode::Staged] a changed filter reloads the working set from
    /// the store.
    ///
    /// # Errors
    /// Returns the error from [Self::refresh] if the store was queried.
    pub async fn apply_filter(&self) -> Result<FetchOutcome<Vec<ExpenseRecord>>, Error> {
        let changed = self.list().apply_staged();
        self.after_filter_change(changed).await
    }

    /// Clear the filter, staged edits included, and return the new view.
    ///
    /// # Errors
    /// Returns the error from [Self::refresh] if the store was queried.
    pub async fn clear_filter(&self) -> Result<FetchOutcome<Vec<ExpenseRecord>>, Error> {
        let changed = self.list().clear_filter();
        self.after_filter_change(changed).await
    }

    async fn after_filter_change(
        &self,
        changed: bool,
    ) -> Result<FetchOutcome<Vec<ExpenseRecord>>, Error> {
        if changed && self.list().mode() == FilterMode::Staged {
            return self.refresh().await;
        }

        Ok(FetchOutcome::Fresh(self.view()))
    }

    /// The filter that decides what is shown.
    pub fn applied_filter(&self) -> FilterSpec {
        self.list().applied_filter().clone()
    }

    /// The filter being edited.
    pub fn staged_filter(&self) -> FilterSpec {
        self.list().staged_filter().clone()
    }

    /// Whether there are filter edits waiting to be applied.
    pub fn has_staged_changes(&self) -> bool {
        self.list().has_staged_changes()
    }

    /// The current sort order.
    pub fn sort(&self) -> SortSpec {
        self.list().sort()
    }

    /// Replace the sort order.
    pub fn set_sort(&self, sort: SortSpec) {
        self.list().set_sort(sort);
    }

    /// Sort by `field`, flipping the direction if it is already the sort field.
    pub fn toggle_sort(&self, field: SortField) {
        self.list().toggle_sort(field);
    }

    /// The filtered and sorted expenses to display.
    pub fn view(&self) -> Vec<ExpenseRecord> {
        self.list().view()
    }

    /// Count, sum and average of the displayed expenses.
    pub fn summary(&self) -> ListSummary {
        self.list().summary()
    }

    /// The signed in user's budget, or the defaults if they never saved one.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] if nobody is signed in, or the store's
    /// error.
    pub async fn budget(&self) -> Result<BudgetSetting, Error> {
        let owner_id = self.session.require_user()?;

        let budget = self
            .call_store(move |store| store.get_budget_setting(owner_id))
            .await?;

        Ok(budget.unwrap_or_else(|| BudgetSetting::default_for(owner_id)))
    }

    /// Save the signed in user's budget.
    ///
    /// # Errors
    /// Returns [Error::Validation] before contacting the store if a budget is
    /// not positive, [Error::Unauthenticated] if nobody is signed in, or the
    /// store's error.
    pub async fn save_budget(&self, update: BudgetUpdate) -> Result<BudgetSetting, Error> {
        let owner_id = self.session.require_user()?;
        update.validate()?;

        let budget = self
            .call_store(move |store| store.upsert_budget_setting(owner_id, update))
            .await?;
        tracing::info!("Saved budget for user {owner_id}");

        Ok(budget)
    }

    /// Run `operation` on the blocking thread pool, giving up after the store
    /// timeout.
    async fn call_store<T, F>(&self, operation: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, Error> + Send + 'static,
    {
        let store = self.store.clone();
        let task = tokio::task::spawn_blocking(move || operation(&store));

        match tokio::time::timeout(self.store_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => {
                tracing::error!("Store task failed: {error}");
                Err(Error::Network(error.to_string()))
            }
            Err(_) => {
                tracing::warn!("Store did not respond within {:?}", self.store_timeout);
                Err(Error::Timeout)
            }
        }
    }

    fn check_owner(&self, id: ExpenseId, owner_id: UserId) -> Result<(), Error> {
        match self.list().working_set().iter().find(|record| record.id == id) {
            Some(record) if record.owner_id != owner_id => {
                tracing::warn!("User {owner_id} tried to change expense {id} they do not own");
                Err(Error::PermissionDenied)
            }
            _ => Ok(()),
        }
    }

    /// Patch the working set, unless the user signed out or changed while the
    /// request was in flight.
    ///
    /// List fetches issued before the patch may have read the store before the
    /// change, so they are superseded.
    fn apply_for(&self, owner_id: UserId, mutation: Mutation) {
        let mut list = self.list();

        if self.session.require_user().ok() != Some(owner_id) {
            tracing::debug!("Session changed during request, not applying {mutation:?}");
            return;
        }

        list.apply_mutation(mutation);
        self.list_fetches.invalidate();
    }

    fn list(&self) -> MutexGuard<'_, ListView> {
        lock_list(&self.list)
    }
}

impl<S> Drop for ExpenseController<S> {
    fn drop(&mut self) {
        self.session.unsubscribe(self.subscription);
    }
}

fn lock_list(list: &Mutex<ListView>) -> MutexGuard<'_, ListView> {
    list.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        budget::{BudgetSetting, BudgetUpdate},
        category::Category,
        config::AppConfig,
        controller::{ExpenseController, FetchOutcome},
        expense::{ExpenseId, ExpensePatch, ExpenseRecord, NewExpense, test_utils::record},
        list_view::{FilterMode, FilterSpec},
        session::{Session, SessionContext},
        stores::{ExpenseStore, SQLiteStore},
        user::UserId,
    };

    /// Wraps a [SQLiteStore] to make the first list call and every insert,
    /// update or delete slow.
    #[derive(Debug, Clone)]
    struct SlowStore {
        inner: SQLiteStore,
        list_calls: Arc<AtomicUsize>,
        first_list_delay: Duration,
        /// Read the rows first and then wait, instead of waiting before the read.
        delay_after_read: bool,
        mutation_delay: Duration,
    }

    impl SlowStore {
        fn new(inner: SQLiteStore) -> Self {
            Self {
                inner,
                list_calls: Arc::new(AtomicUsize::new(0)),
                first_list_delay: Duration::ZERO,
                delay_after_read: false,
                mutation_delay: Duration::ZERO,
            }
        }
    }

    impl ExpenseStore for SlowStore {
        fn list_expenses(
            &self,
            owner_id: UserId,
            filter: Option<&FilterSpec>,
        ) -> Result<Vec<ExpenseRecord>, Error> {
            let first = self.list_calls.fetch_add(1, Ordering::SeqCst) == 0;

            if first && !self.delay_after_read {
                thread::sleep(self.first_list_delay);
            }

            let records = self.inner.list_expenses(owner_id, filter);

            if first && self.delay_after_read {
                thread::sleep(self.first_list_delay);
            }

            records
        }

        fn insert_expense(
            &self,
            owner_id: UserId,
            expense: NewExpense,
        ) -> Result<ExpenseRecord, Error> {
            thread::sleep(self.mutation_delay);
            self.inner.insert_expense(owner_id, expense)
        }

        fn update_expense(
            &self,
            id: ExpenseId,
            owner_id: UserId,
            patch: ExpensePatch,
        ) -> Result<ExpenseRecord, Error> {
            thread::sleep(self.mutation_delay);
            self.inner.update_expense(id, owner_id, patch)
        }

        fn delete_expense(&self, id: ExpenseId, owner_id: UserId) -> Result<(), Error> {
            thread::sleep(self.mutation_delay);
            self.inner.delete_expense(id, owner_id)
        }

        fn get_budget_setting(&self, owner_id: UserId) -> Result<Option<BudgetSetting>, Error> {
            self.inner.get_budget_setting(owner_id)
        }

        fn upsert_budget_setting(
            &self,
            owner_id: UserId,
            update: BudgetUpdate,
        ) -> Result<BudgetSetting, Error> {
            self.inner.upsert_budget_setting(owner_id, update)
        }
    }

    fn session(id: i64) -> Session {
        Session {
            user_id: UserId::new(id),
            email: format!("user{id}@example.com"),
            display_name: format!("User {id}"),
        }
    }

    /// A store holding three expenses for user 1 with IDs 1, 2 and 3.
    fn seeded_store() -> SQLiteStore {
        let store = SQLiteStore::new(Connection::open_in_memory().unwrap()).unwrap();
        let owner_id = UserId::new(1);

        for expense in [
            ExpenseRecord::build(50.0, date!(2024 - 01 - 05), "Groceries")
                .category(Category::FoodAndDining),
            ExpenseRecord::build(30.0, date!(2024 - 01 - 10), "Lunch")
                .category(Category::FoodAndDining),
            ExpenseRecord::build(20.0, date!(2024 - 01 - 15), "Taxi").category(Category::Travel),
        ] {
            store.insert_expense(owner_id, expense).unwrap();
        }

        store
    }

    fn config(filter_mode: FilterMode) -> AppConfig {
        AppConfig {
            filter_mode,
            ..Default::default()
        }
    }

    fn ids(records: &[ExpenseRecord]) -> Vec<ExpenseId> {
        records.iter().map(|record| record.id).collect()
    }

    #[tokio::test]
    async fn refresh_loads_working_set() {
        let controller = ExpenseController::new(
            seeded_store(),
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );

        let outcome = controller.refresh().await.unwrap();

        assert_eq!(outcome.fresh().map(|records| ids(&records)), Some(vec![3, 2, 1]));
        assert_eq!(controller.summary().sum, 100.0);
    }

    #[tokio::test]
    async fn superseded_fetch_is_discarded() {
        let mut store = SlowStore::new(seeded_store());
        store.first_list_delay = Duration::from_millis(300);
        let controller = ExpenseController::new(
            store,
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );
        controller.edit_filter(|filter| filter.category = Some(Category::Travel));

        let (first, second) = tokio::join!(controller.apply_filter(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.clear_filter().await
        });

        assert_eq!(first, Ok(FetchOutcome::Superseded));
        assert_eq!(
            second.unwrap().fresh().map(|records| records.len()),
            Some(3)
        );
        assert_eq!(ids(&controller.view()), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let mut store = SlowStore::new(seeded_store());
        store.first_list_delay = Duration::from_millis(500);
        let controller = ExpenseController::new(
            store,
            SessionContext::signed_in(session(1)),
            &AppConfig {
                store_timeout: Duration::from_millis(50),
                ..Default::default()
            },
        );

        let result = controller.refresh().await;

        assert_eq!(result, Err(Error::Timeout));
        assert!(controller.view().is_empty());
    }

    #[tokio::test]
    async fn second_mutation_for_same_expense_is_rejected() {
        let mut store = SlowStore::new(seeded_store());
        store.mutation_delay = Duration::from_millis(100);
        let controller = ExpenseController::new(
            store,
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );
        controller.refresh().await.unwrap();

        let (deleted, updated) = tokio::join!(controller.delete(1), async {
            tokio::task::yield_now().await;
            controller.update(1, ExpensePatch::default().amount(5.0)).await
        });

        assert_eq!(deleted, Ok(()));
        assert_eq!(updated, Err(Error::MutationInFlight(1)));
        assert_eq!(ids(&controller.view()), vec![3, 2]);
        assert!(!controller.is_mutating(1));
    }

    #[tokio::test]
    async fn rejected_update_leaves_working_set_unchanged() {
        let controller = ExpenseController::new(
            seeded_store(),
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );
        controller.refresh().await.unwrap();
        let before = controller.view();

        let invalid = controller
            .update(2, ExpensePatch::default().amount(-1.0))
            .await;
        let missing = controller
            .update(99, ExpensePatch::default().amount(1.0))
            .await;

        assert!(matches!(invalid, Err(Error::Validation(_))));
        assert_eq!(missing, Err(Error::UpdateMissingExpense));
        assert_eq!(controller.view(), before);
    }

    #[tokio::test]
    async fn update_patches_working_set() {
        let controller = ExpenseController::new(
            seeded_store(),
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );
        controller.refresh().await.unwrap();

        let updated = controller
            .update(2, ExpensePatch::default().amount(45.0).description("Team lunch"))
            .await
            .unwrap();

        assert_eq!(updated.amount, 45.0);
        assert!(updated.updated_at.is_some());
        let view = controller.view();
        let shown = view.iter().find(|record| record.id == 2).unwrap();
        assert_eq!(shown.description, "Team lunch");
        assert_eq!(controller.summary().sum, 115.0);
    }

    #[tokio::test]
    async fn create_adds_to_working_set() {
        let controller = ExpenseController::new(
            seeded_store(),
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );
        controller.refresh().await.unwrap();

        let created = controller
            .create(
                ExpenseRecord::build(12.0, date!(2024 - 01 - 20), "Socks")
                    .category(Category::Shopping),
            )
            .await
            .unwrap();

        assert_eq!(created.owner_id, UserId::new(1));
        assert_eq!(ids(&controller.view()), vec![created.id, 3, 2, 1]);
    }

    #[tokio::test]
    async fn change_to_foreign_expense_is_denied() {
        let controller = ExpenseController::new(
            seeded_store(),
            SessionContext::signed_in(session(2)),
            &config(FilterMode::Staged),
        );
        controller.list().replace_working_set(vec![record(
            1,
            50.0,
            "Food & Dining",
            date!(2024 - 01 - 05),
            "Groceries",
        )]);

        assert_eq!(controller.delete(1).await, Err(Error::PermissionDenied));
        assert_eq!(
            controller.update(1, ExpensePatch::default().amount(1.0)).await,
            Err(Error::PermissionDenied)
        );
    }

    #[tokio::test]
    async fn signed_out_calls_are_rejected() {
        let controller = ExpenseController::new(
            seeded_store(),
            SessionContext::new(),
            &config(FilterMode::Staged),
        );

        assert_eq!(controller.refresh().await, Err(Error::Unauthenticated));
        assert_eq!(
            controller
                .create(ExpenseRecord::build(1.0, date!(2024 - 01 - 01), "Gum"))
                .await,
            Err(Error::Unauthenticated)
        );
        assert_eq!(controller.budget().await, Err(Error::Unauthenticated));
    }

    #[tokio::test]
    async fn sign_out_clears_working_set() {
        let session_context = SessionContext::signed_in(session(1));
        let controller = ExpenseController::new(
            seeded_store(),
            session_context.clone(),
            &config(FilterMode::Staged),
        );
        controller.refresh().await.unwrap();

        session_context.sign_out();

        assert!(controller.view().is_empty());
        assert_eq!(controller.refresh().await, Err(Error::Unauthenticated));
    }

    #[tokio::test]
    async fn immediate_mode_filters_without_store() {
        let store = SlowStore::new(seeded_store());
        let list_calls = Arc::clone(&store.list_calls);
        let controller = ExpenseController::new(
            store,
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Immediate),
        );
        controller.refresh().await.unwrap();

        let changed = controller.edit_filter(|filter| filter.min_amount = Some(25.0));

        assert!(changed);
        assert_eq!(ids(&controller.view()), vec![2, 1]);
        assert_eq!(list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn staged_mode_queries_store_on_apply() {
        let store = SlowStore::new(seeded_store());
        let list_calls = Arc::clone(&store.list_calls);
        let controller = ExpenseController::new(
            store,
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );
        controller.refresh().await.unwrap();

        controller.edit_filter(|filter| filter.category = Some(Category::FoodAndDining));
        assert_eq!(controller.view().len(), 3);
        assert!(controller.has_staged_changes());

        let applied = controller.apply_filter().await.unwrap();

        assert_eq!(applied.fresh().map(|records| ids(&records)), Some(vec![2, 1]));
        assert_eq!(list_calls.load(Ordering::SeqCst), 2);
        assert!(!controller.has_staged_changes());
    }

    #[tokio::test]
    async fn dashboard_uses_default_budget() {
        let controller = ExpenseController::new(
            seeded_store(),
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );

        let dashboard = controller
            .load_dashboard(date!(2024 - 01 - 15))
            .await
            .unwrap()
            .fresh()
            .unwrap();

        assert_eq!(dashboard.summary.total, 100.0);
        assert_eq!(dashboard.summary.this_month, 100.0);
        assert_eq!(dashboard.budget, BudgetSetting::default_for(UserId::new(1)));
    }

    #[tokio::test]
    async fn saved_budget_is_used() {
        let controller = ExpenseController::new(
            seeded_store(),
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );

        controller
            .save_budget(BudgetUpdate {
                monthly_budget: Some(400.0),
                weekly_budget: Some(100.0),
            })
            .await
            .unwrap();

        let budget = controller.budget().await.unwrap();
        assert_eq!(budget.monthly_budget, 400.0);
        assert_eq!(budget.weekly_budget, 100.0);
    }

    #[tokio::test]
    async fn invalid_budget_is_rejected_before_store() {
        let controller = ExpenseController::new(
            seeded_store(),
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );

        let result = controller
            .save_budget(BudgetUpdate {
                monthly_budget: Some(0.0),
                weekly_budget: None,
            })
            .await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn list_read_before_delete_does_not_restore_it() {
        let inner = seeded_store();
        let mut store = SlowStore::new(inner.clone());
        store.first_list_delay = Duration::from_millis(300);
        store.delay_after_read = true;
        let controller = ExpenseController::new(
            store,
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );
        controller
            .list()
            .replace_working_set(inner.list_expenses(UserId::new(1), None).unwrap());

        let (refreshed, deleted) = tokio::join!(controller.refresh(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            controller.delete(1).await
        });

        assert_eq!(deleted, Ok(()));
        assert_eq!(refreshed, Ok(FetchOutcome::Superseded));
        assert_eq!(ids(&controller.view()), vec![3, 2]);
    }

    #[tokio::test]
    async fn timed_out_delete_keeps_expense_locked() {
        let mut store = SlowStore::new(seeded_store());
        store.mutation_delay = Duration::from_millis(400);
        let controller = ExpenseController::new(
            store,
            SessionContext::signed_in(session(1)),
            &AppConfig {
                store_timeout: Duration::from_millis(100),
                ..Default::default()
            },
        );

        assert_eq!(controller.delete(1).await, Err(Error::Timeout));
        assert!(controller.is_mutating(1));
        assert_eq!(
            controller.update(1, ExpensePatch::default().amount(5.0)).await,
            Err(Error::MutationInFlight(1))
        );

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(!controller.is_mutating(1));
    }

    #[tokio::test]
    async fn superseded_dashboard_is_discarded() {
        let mut store = SlowStore::new(seeded_store());
        store.first_list_delay = Duration::from_millis(300);
        let controller = ExpenseController::new(
            store,
            SessionContext::signed_in(session(1)),
            &config(FilterMode::Staged),
        );

        let (first, second) = tokio::join!(controller.load_dashboard(date!(2024 - 01 - 15)), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.load_dashboard(date!(2024 - 01 - 20)).await
        });

        assert_eq!(first, Ok(FetchOutcome::Superseded));
        let dashboard = second.unwrap().fresh().unwrap();
        assert_eq!(dashboard.as_of, date!(2024 - 01 - 20));
        assert_eq!(dashboard.summary.this_week, 20.0);
    }

    #[tokio::test]
    async fn sign_out_discards_fetch_in_flight() {
        let mut store = SlowStore::new(seeded_store());
        store.first_list_delay = Duration::from_millis(300);
        let session_context = SessionContext::signed_in(session(1));
        let controller = ExpenseController::new(
            store,
            session_context.clone(),
            &config(FilterMode::Staged),
        );

        let (refreshed, ()) = tokio::join!(controller.refresh(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            session_context.sign_out();
        });

        assert_eq!(refreshed, Ok(FetchOutcome::Superseded));
        assert!(controller.view().is_empty());
    }

    #[tokio::test]
    async fn switching_user_discards_fetch_in_flight() {
        let mut store = SlowStore::new(seeded_store());
        store.first_list_delay = Duration::from_millis(300);
        let session_context = SessionContext::signed_in(session(1));
        let controller = ExpenseController::new(
            store,
            session_context.clone(),
            &config(FilterMode::Staged),
        );

        let (refreshed, ()) = tokio::join!(controller.refresh(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            session_context.sign_in(session(2));
        });

        assert_eq!(refreshed, Ok(FetchOutcome::Superseded));
        assert!(controller.view().is_empty());
    }

    #[tokio::test]
    async fn create_finishing_after_user_switch_is_not_shown() {
        let mut store = SlowStore::new(seeded_store());
        store.mutation_delay = Duration::from_millis(200);
        let session_context = SessionContext::signed_in(session(1));
        let controller = ExpenseController::new(
            store,
            session_context.clone(),
            &config(FilterMode::Staged),
        );

        let (created, ()) = tokio::join!(
            controller.create(ExpenseRecord::build(12.0, date!(2024 - 01 - 20), "Socks")),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                session_context.sign_in(session(2));
            }
        );

        assert_eq!(created.unwrap().owner_id, UserId::new(1));
        assert!(controller.view().is_empty());
    }
}
