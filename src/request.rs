//! Bookkeeping for requests to the store that are still in flight.
//!
//! [RequestGuard] lets a caller discard a fetch response that has been
//! superseded by a newer fetch. [InFlightMutations] stops two changes to the
//! same expense from racing each other.

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{Error, expense::ExpenseId};

/// Identifies one fetch issued by a [RequestGuard].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Hands out monotonically increasing tickets so that only the response to the
/// most recent request is used.
#[derive(Debug, Default)]
pub struct RequestGuard {
    latest: AtomicU64,
}

impl RequestGuard {
    /// Create a guard with no outstanding requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket.
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Supersede every outstanding ticket without starting a new request.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether `ticket` is still the most recent request.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// The expenses that have an update or delete request in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightMutations {
    ids: Arc<Mutex<HashSet<ExpenseId>>>,
}

impl InFlightMutations {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as having a request in flight until the returned guard is
    /// dropped.
    ///
    /// # Errors
    /// Returns [Error::MutationInFlight] if `id` already has a request in
    /// flight.
    pub fn begin(&self, id: ExpenseId) -> Result<InFlightGuard, Error> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);

        if !ids.insert(id) {
            return Err(Error::MutationInFlight(id));
        }

        Ok(InFlightGuard {
            id,
            ids: Arc::clone(&self.ids),
        })
    }

    /// Whether `id` has a request in flight, e.g. to disable its controls.
    pub fn contains(&self, id: ExpenseId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

/// Releases an expense id from [InFlightMutations] when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    id: ExpenseId,
    ids: Arc<Mutex<HashSet<ExpenseId>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
