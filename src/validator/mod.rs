//! Functions that check the consistency of the records supplied by collaborators.
//!
//! These checks run before any share or balance is computed. Single-expense checks
//! are fail-fast; [`check_expenses`] is the batch entry point that keeps going and
//! collects every failure.

use std::collections::HashSet;

use log::debug;

mod expense;

use crate::config::Config;
use crate::error::LedgerError;
use crate::split::compute_shares_with_config;
use crate::types::{Expense, Member, MemberId};
pub use expense::{validate_expense, validate_expense_shape};

/// Check that member identifiers are unique and return them as a lookup set.
pub fn validate_members(members: &[Member]) -> Result<HashSet<&MemberId>, LedgerError> {
    let mut known = HashSet::with_capacity(members.len());
    for member in members {
        if !known.insert(&member.id) {
            return Err(LedgerError::duplicate_member(&member.id));
        }
    }
    Ok(known)
}

/// Check every expense independently and collect all the errors found.
///
/// An expense counts as valid only if it passes validation and its shares can be
/// computed. The result is empty when the whole set can be fed to the ledger. A
/// duplicate member is reported once and stops the check, since no expense can be
/// judged against an ambiguous member list.
pub fn check_expenses(members: &[Member], expenses: &[Expense], config: &Config) -> Vec<LedgerError> {
    let known = match validate_members(members) {
        Ok(known) => known,
        Err(e) => return vec![e],
    };

    let errors: Vec<_> = expenses
        .iter()
        .filter_map(|expense| {
            validate_expense(expense, &known)
                .and_then(|_| compute_shares_with_config(expense, config))
                .err()
        })
        .collect();

    debug!(
        "Checked {} expenses, {} of them are invalid",
        expenses.len(),
        errors.len()
    );

    errors
}
