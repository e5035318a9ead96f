//! Accumulation of expenses into net balances.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::Level::Debug;
use log::{debug, error, log_enabled};

use crate::config::Config;
use crate::error::{InvariantViolation, LedgerError};
use crate::money::Money;
use crate::split::compute_shares_with_config;
use crate::types::{Balances, Category, Expense, Member, MemberId};
use crate::validator::{validate_expense, validate_members};

/// Totals of a balance map, as shown on a dashboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceSummary {
    /// Sum of all positive balances.
    pub total_owed: Money,
    /// Sum of all negative balances, as a positive amount.
    pub total_owing: Money,
    /// Members with nothing to give or receive.
    pub settled_members: Vec<MemberId>,
}

/// Which expenses a [`SpendingReport`] covers. The default covers all of them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub category: Option<Category>,
    /// Inclusive lower bound on the expense timestamp.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the expense timestamp.
    pub until: Option<DateTime<Utc>>,
}

/// How much was spent over a list of expenses. This is the gross amount paid, not
/// a balance: shares play no part in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpendingReport {
    pub count: usize,
    pub total: Money,
    /// `total / count`, rounded down; zero when there are no expenses.
    pub average: Money,
    /// Only the categories with at least one expense appear.
    pub by_category: BTreeMap<Category, Money>,
}

/// Compute the net balance of every member with the default configuration.
pub fn compute_balances(members: &[Member], expenses: &[Expense]) -> Result<Balances, LedgerError> {
    compute_balances_with_config(members, expenses, &Config::default())
}

/// Compute the net balance of every member.
///
/// Every member appears in the output, at zero if they took part in no expense. For
/// each expense the payer is credited the full amount and every participant is
/// debited their share, so a payer who also participates ends up with the amount
/// paid minus their own share. The result does not depend on the order of the
/// expenses.
///
/// The first invalid expense aborts the computation: use
/// [`check_expenses`](crate::validator::check_expenses) to get all the errors at once.
pub fn compute_balances_with_config(
    members: &[Member],
    expenses: &[Expense],
    config: &Config,
) -> Result<Balances, LedgerError> {
    let known = validate_members(members)?;

    let mut balances: Balances = members.iter().map(|m| (m.id.clone(), Money::ZERO)).collect();

    for expense in expenses {
        validate_expense(expense, &known)?;
        let shares = compute_shares_with_config(expense, config)?;

        credit(&mut balances, expense, &expense.paid_by, expense.amount)?;
        for (participant, share) in shares {
            credit(&mut balances, expense, &participant, -share)?;
        }
    }

    check_zero_sum(&balances)?;

    if log_enabled!(Debug) {
        debug!(
            "Computed balances of {} members from {} expenses: {:?}",
            balances.len(),
            expenses.len(),
            balances
        );
    }

    Ok(balances)
}

/// Aggregate totals of a balance map.
///
/// Fails only if a total does not fit in the minor-unit range, which a balance map
/// produced by [`compute_balances`] can only reach with amounts near the limits.
pub fn summarize(balances: &Balances) -> Result<BalanceSummary, LedgerError> {
    let total_owed = Money::checked_sum(balances.values().copied().filter(|b| b.is_positive()))
        .ok_or(LedgerError::InvariantViolation(InvariantViolation::SumOverflow))?;
    let total_owing = Money::exact_sum(balances.values().copied().filter(|b| b.is_negative()));
    let total_owing = i64::try_from(-total_owing)
        .map(Money::from_minor)
        .map_err(|_| LedgerError::InvariantViolation(InvariantViolation::SumOverflow))?;
    let settled_members = balances
        .iter()
        .filter_map(|(m, b)| if b.is_zero() { Some(m.clone()) } else { None })
        .collect();

    Ok(BalanceSummary {
        total_owed,
        total_owing,
        settled_members,
    })
}

/// Total and average spend over the expenses selected by `filter`, overall and per
/// category. Expenses are not validated: this is a view over the list, independent
/// of the balances.
pub fn spending_report(
    expenses: &[Expense],
    filter: &ExpenseFilter,
) -> Result<SpendingReport, LedgerError> {
    let overflow = || LedgerError::InvariantViolation(InvariantViolation::SumOverflow);

    let selected: Vec<&Expense> = expenses.iter().filter(|e| filter.matches(e)).collect();

    let mut by_category: BTreeMap<Category, Money> = BTreeMap::new();
    for expense in &selected {
        let total = by_category.entry(expense.category).or_insert(Money::ZERO);
        *total = total.checked_add(expense.amount).ok_or_else(overflow)?;
    }

    let total = Money::checked_sum(by_category.values().copied()).ok_or_else(overflow)?;
    let average = match i64::try_from(selected.len()) {
        Ok(0) => Money::ZERO,
        Ok(count) => Money::from_minor(total.minor().div_euclid(count)),
        Err(_) => return Err(overflow()),
    };

    debug!(
        "Spending report over {} of {} expenses: total {}, by category {:?}",
        selected.len(),
        expenses.len(),
        total,
        by_category
    );

    Ok(SpendingReport {
        count: selected.len(),
        total,
        average,
        by_category,
    })
}

impl ExpenseFilter {
    pub fn with_category(mut self, category: Category) -> ExpenseFilter {
        self.category = Some(category);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> ExpenseFilter {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> ExpenseFilter {
        self.until = Some(until);
        self
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        self.category.map_or(true, |c| expense.category == c)
            && self.since.map_or(true, |since| expense.timestamp >= since)
            && self.until.map_or(true, |until| expense.timestamp < until)
    }
}

fn credit(
    balances: &mut Balances,
    expense: &Expense,
    member_id: &MemberId,
    amount: Money,
) -> Result<(), LedgerError> {
    let balance = balances
        .get_mut(member_id)
        .ok_or_else(|| LedgerError::unknown_member(&expense.id, member_id))?;
    *balance = balance
        .checked_add(amount)
        .ok_or_else(|| LedgerError::balance_overflow(member_id))?;
    Ok(())
}

/// Balances must always sum to exactly zero: every expense credits exactly what it
/// debits. A non-zero sum is a defect and is reported, never corrected.
///
/// The sum is exact, so balances near the limits of the range are checked correctly
/// whatever the names of their members.
pub(crate) fn check_zero_sum(balances: &Balances) -> Result<(), LedgerError> {
    let sum = Money::exact_sum(balances.values().copied());
    if sum == 0 {
        return Ok(());
    }

    error!("Balances sum to {sum} instead of zero: {balances:?}");
    match i64::try_from(sum) {
        Ok(sum) => Err(LedgerError::non_zero_sum(Money::from_minor(sum))),
        Err(_) => Err(LedgerError::InvariantViolation(InvariantViolation::SumOverflow)),
    }
}
