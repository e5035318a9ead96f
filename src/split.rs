//! Computation of the share owed by each participant of an expense.
//!
//! Whatever the split rule, the shares returned are non-negative, cover every
//! participant exactly once and sum exactly to the amount of the expense. When an
//! amount cannot be divided exactly, the leftover minor units are assigned
//! deterministically:
//! - equal splits give one extra unit to the first participants in declared order;
//! - percentage splits give one extra unit to the participants with the largest
//!   fractional remainder, ties broken by declared order.

use std::collections::BTreeMap;

use log::trace;

use crate::config::Config;
use crate::error::{LedgerError, SplitViolation};
use crate::money::{Money, Percent};
use crate::types::{Expense, MemberId, Shares, SplitRule};
use crate::validator::validate_expense_shape;

/// Compute the shares of an expense with the default configuration.
pub fn compute_shares(expense: &Expense) -> Result<Shares, LedgerError> {
    compute_shares_with_config(expense, &Config::default())
}

pub fn compute_shares_with_config(expense: &Expense, config: &Config) -> Result<Shares, LedgerError> {
    validate_expense_shape(expense)?;

    let shares = match &expense.split_rule {
        SplitRule::Equal => Ok(equal_shares(expense)),
        SplitRule::Exact(amounts) => exact_shares(expense, amounts),
        SplitRule::Percentage(percents) => {
            percentage_shares(expense, percents, config.percentage_tolerance)
        }
    }
    .map_err(|violation| LedgerError::invalid_split(&expense.id, violation))?;

    trace!("Shares of expense {}: {:?}", expense.id, shares);
    Ok(shares)
}

fn equal_shares(expense: &Expense) -> Shares {
    expense
        .participants
        .iter()
        .cloned()
        .zip(expense.amount.split_even(expense.participants.len()))
        .collect()
}

fn exact_shares(
    expense: &Expense,
    amounts: &BTreeMap<MemberId, Money>,
) -> Result<Shares, SplitViolation> {
    check_share_keys(expense, amounts)?;

    let mut shares = Shares::new();
    let mut total = Money::ZERO;
    for participant in &expense.participants {
        let share = amounts[participant];
        if share.is_negative() {
            return Err(SplitViolation::NegativeShare {
                member_id: participant.clone(),
                share,
            });
        }
        total = total.checked_add(share).ok_or(SplitViolation::Overflow)?;
        shares.insert(participant.clone(), share);
    }

    if total != expense.amount {
        return Err(SplitViolation::SharesSumMismatch {
            expected: expense.amount,
            actual: total,
        });
    }

    Ok(shares)
}

/// Shares proportional to the declared percentages.
///
/// All percentages are brought to a common denominator so that each one becomes an
/// integer weight. Each participant gets `floor(amount * weight / total_weight)`, and
/// the units lost to rounding are redistributed by largest remainder. When the
/// percentages sum to exactly 100 this is `amount * percentage / 100`; within a
/// non-zero tolerance the weights are used as declared and the result still sums to
/// the amount.
fn percentage_shares(
    expense: &Expense,
    percents: &BTreeMap<MemberId, Percent>,
    tolerance: Percent,
) -> Result<Shares, SplitViolation> {
    check_share_keys(expense, percents)?;

    for participant in &expense.participants {
        let percent = percents[participant];
        if !percent.is_within_bounds() {
            return Err(SplitViolation::PercentOutOfRange {
                member_id: participant.clone(),
                percent,
            });
        }
    }

    let common_denominator = expense
        .participants
        .iter()
        .try_fold(1i128, |acc, p| lcm(acc, percents[p].denominator() as i128))
        .ok_or(SplitViolation::Overflow)?;

    let weights = expense
        .participants
        .iter()
        .map(|p| {
            let percent = percents[p];
            (percent.numerator() as i128)
                .checked_mul(common_denominator / percent.denominator() as i128)
        })
        .collect::<Option<Vec<i128>>>()
        .ok_or(SplitViolation::Overflow)?;
    let total_weight = weights
        .iter()
        .try_fold(0i128, |acc, &w| acc.checked_add(w))
        .ok_or(SplitViolation::Overflow)?;

    check_percentage_sum(total_weight, common_denominator, tolerance)?;

    let mut shares = Vec::with_capacity(weights.len());
    let mut leftovers = Vec::with_capacity(weights.len());
    for &weight in &weights {
        let (share, leftover) = expense
            .amount
            .mul_ratio(weight, total_weight)
            .ok_or(SplitViolation::Overflow)?;
        shares.push(share);
        leftovers.push(leftover);
    }

    // Flooring loses less than one unit per participant.
    let distributed = Money::exact_sum(shares.iter().copied());
    let missing_units = usize::try_from(i128::from(expense.amount.minor()) - distributed)
        .map_err(|_| SplitViolation::Overflow)?;

    // Stable sort: equal remainders keep the declared order.
    let mut by_remainder: Vec<usize> = (0..shares.len()).collect();
    by_remainder.sort_by(|&a, &b| leftovers[b].cmp(&leftovers[a]));
    for &idx in by_remainder.iter().take(missing_units) {
        shares[idx] += Money::from_minor(1);
    }

    Ok(expense.participants.iter().cloned().zip(shares).collect())
}

/// Every participant must have exactly one entry, and nobody else may have one.
fn check_share_keys<T>(
    expense: &Expense,
    declared: &BTreeMap<MemberId, T>,
) -> Result<(), SplitViolation> {
    if let Some(missing) = expense
        .participants
        .iter()
        .find(|p| !declared.contains_key(*p))
    {
        return Err(SplitViolation::MissingShare(missing.clone()));
    }

    if let Some(unexpected) = declared
        .keys()
        .find(|member| !expense.participants.contains(*member))
    {
        return Err(SplitViolation::UnexpectedShare(unexpected.clone()));
    }

    Ok(())
}

/// `total_weight / denominator` is the sum of the percentages; it must be within
/// `tolerance` of 100.
fn check_percentage_sum(
    total_weight: i128,
    denominator: i128,
    tolerance: Percent,
) -> Result<(), SplitViolation> {
    let mismatch = || {
        let actual = i64::try_from(total_weight)
            .ok()
            .and_then(|n| i64::try_from(denominator).ok().map(|d| (n, d)))
            .and_then(|(n, d)| Percent::new(n, d));
        match actual {
            Some(actual) => SplitViolation::PercentagesSumMismatch { actual },
            None => SplitViolation::Overflow,
        }
    };

    if total_weight <= 0 {
        return Err(mismatch());
    }

    let hundred = denominator.checked_mul(100).ok_or(SplitViolation::Overflow)?;
    let deviation = total_weight
        .checked_sub(hundred)
        .and_then(i128::checked_abs)
        .ok_or(SplitViolation::Overflow)?;

    // deviation / denominator <= tolerance, cross-multiplied.
    let lhs = deviation
        .checked_mul(tolerance.denominator() as i128)
        .ok_or(SplitViolation::Overflow)?;
    let rhs = (tolerance.numerator() as i128)
        .checked_mul(denominator)
        .ok_or(SplitViolation::Overflow)?;

    if lhs <= rhs {
        Ok(())
    } else {
        Err(mismatch())
    }
}

fn lcm(a: i128, b: i128) -> Option<i128> {
    let mut x = a;
    let mut y = b;
    while y != 0 {
        let t = x % y;
        x = y;
        y = t;
    }
    (a / x).checked_mul(b)
}
