//! The algorithm that computes the money transfers needed to settle debts.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::Level::Debug;
use log::{debug, error, log_enabled, warn};

use crate::error::LedgerError;
use crate::money::Money;
use crate::types::{Balances, MemberId, Transfer};

/// Get a list of transfers which settle all the debts in `balances`.
///
/// The algorithm works as follows:
/// - split members into creditors (positive balance) and debtors (negative balance);
///   members with a zero balance take no part
/// - pick the creditor with the largest credit (*c*) and the debtor with the largest
///   debt (*d*), breaking ties by the lower member identifier
/// - let the debtor give `min(c, d)` to the creditor
/// - whoever reaches zero is done, the other goes back in the pool with what remains
/// - stop when there are no more debtors/creditors
///
/// Every step settles at least one member, so with *N* members having a non-zero
/// balance there are at most *N - 1* transfers. This bound is all the algorithm
/// guarantees: finding the smallest possible number of transfers is NP-hard, and the
/// greedy choice is normally good enough.
///
/// The input is not modified. If some balance is left over when one side runs out
/// (which only happens when the input does not sum to zero), an invariant violation
/// is returned.
pub fn settle(balances: &Balances) -> Result<Vec<Transfer>, LedgerError> {
    // Max-heaps on (remaining amount, lower id first). Debts are kept as magnitudes,
    // which always fit in a u64.
    let mut creditors: BinaryHeap<(Money, Reverse<&MemberId>)> = balances
        .iter()
        .filter(|(_, b)| b.is_positive())
        .map(|(m, &b)| (b, Reverse(m)))
        .collect();
    let mut debtors: BinaryHeap<(u64, Reverse<&MemberId>)> = balances
        .iter()
        .filter(|(_, b)| b.is_negative())
        .map(|(m, b)| (b.unsigned_abs(), Reverse(m)))
        .collect();

    let involved = creditors.len() + debtors.len();
    let mut result = Vec::with_capacity(involved.saturating_sub(1));

    while let (Some((credit, Reverse(creditor))), Some((debt, Reverse(debtor)))) =
        (creditors.peek().copied(), debtors.peek().copied())
    {
        creditors.pop();
        debtors.pop();

        // A debt that does not fit in an i64 is larger than any credit.
        let amount = i64::try_from(debt)
            .map_or(credit, |debt| credit.min(Money::from_minor(debt)));
        result.push(Transfer::new(debtor.clone(), creditor.clone(), amount));

        if credit > amount {
            creditors.push((credit - amount, Reverse(creditor)));
        }
        let debt = debt - amount.unsigned_abs();
        if debt > 0 {
            debtors.push((debt, Reverse(debtor)));
        }
    }

    if let Some((amount, Reverse(creditor))) = creditors.peek() {
        warn!("We ran out of debtors but we still have creditors: {:?}", creditors);
        error!("Settlement left `{creditor}` with a credit of {amount}");
        return Err(LedgerError::residual_balance(creditor, *amount));
    }
    if let Some((amount, Reverse(debtor))) = debtors.peek() {
        warn!("We ran out of creditors but we still have debtors: {:?}", debtors);
        error!("Settlement left `{debtor}` with a debt of {amount}");
        let amount = Money::from_debt(*amount).ok_or_else(|| LedgerError::balance_overflow(debtor))?;
        return Err(LedgerError::residual_balance(debtor, amount));
    }

    if log_enabled!(Debug) {
        debug!(
            "Settled {} members with {} transfers: {:?}",
            involved,
            result.len(),
            result
        );
    }

    Ok(result)
}

/// Apply the transfers in order to a copy of `balances`: the amount is added to the
/// sender's balance and subtracted from the receiver's, so a debtor paying a
/// creditor brings both closer to zero. Members not yet present are added.
///
/// Fails if a balance would leave the representable range.
pub fn apply_transfers(
    balances: &Balances,
    transfers: &[Transfer],
) -> Result<Balances, LedgerError> {
    let mut result = balances.clone();
    for transfer in transfers {
        let from = result.entry(transfer.from.clone()).or_insert(Money::ZERO);
        *from = from
            .checked_add(transfer.amount)
            .ok_or_else(|| LedgerError::balance_overflow(&transfer.from))?;

        let to = result.entry(transfer.to.clone()).or_insert(Money::ZERO);
        *to = to
            .checked_sub(transfer.amount)
            .ok_or_else(|| LedgerError::balance_overflow(&transfer.to))?;
    }
    Ok(result)
}

/// True if every transfer moves a positive amount and, once all of them are
/// applied, every balance is zero.
pub fn is_valid_settlement(balances: &Balances, transfers: &[Transfer]) -> bool {
    transfers.iter().all(|t| t.amount.is_positive())
        && apply_transfers(balances, transfers)
            .map_or(false, |applied| applied.values().all(|b| b.is_zero()))
}

#[cfg(test)]
mod tests {
    use crate::error::InvariantViolation;

    use super::*;

    fn balances(entries: &[(&str, i64)]) -> Balances {
        entries
            .iter()
            .map(|&(n, a)| (MemberId::from(n), Money::from_minor(a)))
            .collect()
    }

    fn transfer(from: &str, to: &str, amount: i64) -> Transfer {
        Transfer::new(from.into(), to.into(), Money::from_minor(amount))
    }

    #[test]
    fn test_settle() -> anyhow::Result<()> {
        let balances = balances(&[
            ("a3", -4140),
            ("b3", -1300),
            ("c2", 2200),
            ("p1", -1100),
            ("p2", 2340),
            ("p4", 2000),
        ]);
        let transfers = settle(&balances)?;

        assert_eq!(
            transfers,
            vec![
                transfer("a3", "p2", 2340),
                transfer("a3", "c2", 1800),
                transfer("b3", "p4", 1300),
                transfer("p1", "p4", 700),
                transfer("p1", "c2", 400),
            ]
        );
        assert!(is_valid_settlement(&balances, &transfers));
        Ok(())
    }

    #[test]
    fn test_settle_ties_prefer_lower_identifier() -> anyhow::Result<()> {
        let balances = balances(&[("c", -33), ("a", 66), ("b", -33)]);
        let transfers = settle(&balances)?;
        assert_eq!(transfers, vec![transfer("b", "a", 33), transfer("c", "a", 33)]);
        Ok(())
    }

    #[test]
    fn test_settle_nothing_to_do() -> anyhow::Result<()> {
        assert!(settle(&Balances::new())?.is_empty());
        assert!(settle(&balances(&[("a", 0), ("b", 0)]))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_settle_single_pair() -> anyhow::Result<()> {
        let transfers = settle(&balances(&[("a", -1), ("b", 1), ("c", 0)]))?;
        assert_eq!(transfers, vec![transfer("a", "b", 1)]);
        Ok(())
    }

    #[test]
    fn test_settle_stays_within_bound() -> anyhow::Result<()> {
        let balances = balances(&[
            ("a", 500),
            ("b", 300),
            ("c", 200),
            ("d", -350),
            ("e", -350),
            ("f", -300),
        ]);
        let transfers = settle(&balances)?;
        assert!(transfers.len() <= 5);
        assert!(is_valid_settlement(&balances, &transfers));
        Ok(())
    }

    #[test]
    fn test_settle_reports_residual_balance() {
        let result = settle(&balances(&[("a", 100), ("b", -60)]));
        assert_eq!(
            result,
            Err(LedgerError::InvariantViolation(
                InvariantViolation::ResidualBalance {
                    member_id: "a".into(),
                    amount: Money::from_minor(40)
                }
            ))
        );

        let result = settle(&balances(&[("a", 10), ("b", -60)]));
        assert_eq!(result, Err(LedgerError::residual_balance(&"b".into(), Money::from_minor(-50))));
    }

    #[test]
    fn test_apply_transfers() -> anyhow::Result<()> {
        let start = balances(&[("a", 66), ("b", -33), ("c", -33)]);
        let applied = apply_transfers(&start, &[transfer("b", "a", 33)])?;
        assert_eq!(applied, balances(&[("a", 33), ("b", 0), ("c", -33)]));

        let applied = apply_transfers(&start, &[transfer("b", "a", 33), transfer("c", "a", 33)])?;
        assert!(applied.values().all(|b| b.is_zero()));
        assert_eq!(start[&MemberId::from("a")], Money::from_minor(66));

        let applied = apply_transfers(&start, &[transfer("b", "new", 1)])?;
        assert_eq!(applied[&MemberId::from("new")], Money::from_minor(-1));

        assert!(!is_valid_settlement(&start, &[transfer("b", "a", 33)]));
        assert!(!is_valid_settlement(
            &balances(&[("a", 0), ("b", 0)]),
            &[transfer("a", "b", 0)]
        ));
        Ok(())
    }

    #[test]
    fn test_apply_transfers_reports_overflow() {
        let start = balances(&[("a", i64::MAX), ("b", 0)]);
        assert_eq!(
            apply_transfers(&start, &[transfer("a", "b", 1)]),
            Err(LedgerError::balance_overflow(&"a".into()))
        );
        assert!(!is_valid_settlement(&start, &[transfer("a", "b", 1)]));
    }

    #[test]
    fn test_settle_extreme_balances() -> anyhow::Result<()> {
        let start = balances(&[("a", i64::MAX), ("b", 1), ("c", i64::MIN)]);
        let transfers = settle(&start)?;
        assert_eq!(
            transfers,
            vec![transfer("c", "a", i64::MAX), transfer("c", "b", 1)]
        );
        assert!(is_valid_settlement(&start, &transfers));

        let start = balances(&[("a", i64::MIN), ("b", i64::MAX)]);
        assert_eq!(
            settle(&start),
            Err(LedgerError::residual_balance(&"a".into(), Money::from_minor(-1)))
        );
        Ok(())
    }
}
