//! Checks on a single expense.

use std::collections::HashSet;

use crate::error::{LedgerError, SplitViolation};
use crate::types::{Expense, MemberId};

/// Sanity checks on an expense, stopping at the first violation.
///
/// List of checks, in order:
/// - the amount is positive
/// - there is at least one participant
/// - no participant appears twice
/// - the payer is a member of the group
/// - all participants are members of the group
pub fn validate_expense(expense: &Expense, members: &HashSet<&MemberId>) -> Result<(), LedgerError> {
    validate_expense_shape(expense)?;
    all_members_exist(expense, members)?;
    Ok(())
}

/// The subset of [`validate_expense`] that does not need the member list.
pub fn validate_expense_shape(expense: &Expense) -> Result<(), LedgerError> {
    positive_amount(expense)
        .and_then(|_| at_least_one_participant(expense))
        .and_then(|_| no_duplicate_participants(expense))
        .map_err(|violation| LedgerError::invalid_split(&expense.id, violation))
}

fn positive_amount(expense: &Expense) -> Result<(), SplitViolation> {
    if expense.amount.is_positive() {
        Ok(())
    } else {
        Err(SplitViolation::NonPositiveAmount(expense.amount))
    }
}

fn at_least_one_participant(expense: &Expense) -> Result<(), SplitViolation> {
    if expense.participants.is_empty() {
        Err(SplitViolation::NoParticipants)
    } else {
        Ok(())
    }
}

fn no_duplicate_participants(expense: &Expense) -> Result<(), SplitViolation> {
    // A HashSet returns false upon insertion if the element is already present.
    let mut uniq = HashSet::with_capacity(expense.participants.len());
    match expense.participants.iter().find(|p| !uniq.insert(*p)) {
        Some(duplicate) => Err(SplitViolation::DuplicateParticipant(duplicate.clone())),
        None => Ok(()),
    }
}

fn all_members_exist(expense: &Expense, members: &HashSet<&MemberId>) -> Result<(), LedgerError> {
    match expense.referenced_members().find(|m| !members.contains(m)) {
        Some(unknown) => Err(LedgerError::unknown_member(&expense.id, unknown)),
        None => Ok(()),
    }
}
