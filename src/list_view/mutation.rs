//! Local updates to the working set after the store confirms a change.

use crate::expense::{ExpenseId, ExpensePatch, ExpenseRecord};

/// A change the store has already accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// A newly created expense.
    Insert(ExpenseRecord),
    /// An edit to an existing expense.
    Replace {
        /// The expense that was edited.
        id: ExpenseId,
        /// The fields that changed.
        patch: ExpensePatch,
    },
    /// A deleted expense.
    Remove(ExpenseId),
}

/// Apply `mutation` to `working_set`.
///
/// Replacing or removing an id that is not in the working set leaves it
/// unchanged.
pub fn apply_mutation(
    mut working_set: Vec<ExpenseRecord>,
    mutation: Mutation,
) -> Vec<ExpenseRecord> {
    match mutation {
        Mutation::Insert(record) => working_set.push(record),
        Mutation::Replace { id, patch } => {
            match working_set.iter_mut().find(|record| record.id == id) {
                Some(record) => patch.apply_to(record),
                None => tracing::debug!("Ignoring edit to expense {id} which is not loaded"),
            }
        }
        Mutation::Remove(id) => working_set.retain(|record| record.id != id),
    }

    working_set
}
