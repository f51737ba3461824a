//! The transaction list: a working set of expenses plus the filter and sort
//! that decide what is shown.
//!
//! The free functions ([apply_filter], [apply_sort], [derive_summary],
//! [apply_mutation]) are pure and can be called directly. [ListView] holds the
//! state for one user session and recomputes the view from it on demand.

mod filter;
mod mutation;
mod sort;
mod summary;

pub use filter::{FilterSpec, apply_filter};
pub use mutation::{Mutation, apply_mutation};
pub use sort::{SortDirection, SortField, SortSpec, apply_sort};
pub use summary::{ListSummary, derive_summary};

use serde::{Deserialize, Serialize};

use crate::expense::ExpenseRecord;

/// How edits to the filter take effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Every edit is applied straight away.
    Immediate,
    /// Edits are staged until [ListView::apply_staged] is called.
    #[default]
    Staged,
}

/// The state behind the transaction list for one user session.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    mode: FilterMode,
    working_set: Vec<ExpenseRecord>,
    applied: FilterSpec,
    staged: FilterSpec,
    sort: SortSpec,
}

impl ListView {
    /// Create an empty list view.
    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// How filter edits take effect.
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Every loaded record, unfiltered and in no particular order.
    pub fn working_set(&self) -> &[ExpenseRecord] {
        &self.working_set
    }

    /// Swap in a freshly fetched working set.
    pub fn replace_working_set(&mut self, records: Vec<ExpenseRecord>) {
        self.working_set = records;
    }

    /// Patch the working set after the store accepted a change.
    pub fn apply_mutation(&mut self, mutation: Mutation) {
        let working_set = std::mem::take(&mut self.working_set);
        self.working_set = apply_mutation(working_set, mutation);
    }

    /// The filter that decides what is shown.
    pub fn applied_filter(&self) -> &FilterSpec {
        &self.applied
    }

    /// The filter being edited. Same as the applied filter in
    /// [FilterMode::Immediate].
    pub fn staged_filter(&self) -> &FilterSpec {
        &self.staged
    }

    /// Edit the filter.
    ///
    /// Returns true if the applied filter changed, i.e. the view (and any
    /// store side query) needs to be recomputed.
    pub fn edit_filter(&mut self, edit: impl FnOnce(&mut FilterSpec)) -> bool {
        edit(&mut self.staged);

        match self.mode {
            FilterMode::Immediate => self.apply_staged(),
            FilterMode::Staged => false,
        }
    }

    /// Apply the staged filter. Returns true if the applied filter changed.
    pub fn apply_staged(&mut self) -> bool {
        if self.staged == self.applied {
            return false;
        }

        self.applied = self.staged.clone();
        true
    }

    /// Clear the filter straight away, bypassing staging. Returns true if the
    /// applied filter changed.
    pub fn clear_filter(&mut self) -> bool {
        self.staged = FilterSpec::default();
        self.apply_staged()
    }

    /// Whether the staged filter differs from the applied filter.
    pub fn has_staged_changes(&self) -> bool {
        self.staged != self.applied
    }

    /// The current sort order.
    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// Replace the sort order.
    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
    }

    /// Sort by `field` as if its column header was clicked: the active column
    /// flips direction, any other column starts in descending order.
    pub fn toggle_sort(&mut self, field: SortField) {
        self.sort = if self.sort.field == field {
            SortSpec {
                field,
                direction: self.sort.direction.flipped(),
            }
        } else {
            SortSpec {
                field,
                direction: SortDirection::Descending,
            }
        };
    }

    /// The records to display: the working set filtered by the applied filter
    /// and sorted.
    pub fn view(&self) -> Vec<ExpenseRecord> {
        apply_sort(apply_filter(&self.working_set, &self.applied), &self.sort)
    }

    /// Count, sum and average of the filtered records.
    pub fn summary(&self) -> ListSummary {
        derive_summary(&apply_filter(&self.working_set, &self.applied))
    }
}
