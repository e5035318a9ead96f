use std::collections::BTreeMap;

use proptest::prelude::*;
use splitter_rs::{
    apply_transfers, compute_balances, compute_shares, is_valid_settlement, settle, Balances,
    Expense, Member, MemberId, Money, Percent, SplitRule,
};

const MEMBER_NAMES: [&str; 6] = ["ann", "ben", "cat", "dan", "eve", "fay"];

fn members() -> Vec<Member> {
    MEMBER_NAMES.iter().map(|&n| Member::from_id(n)).collect()
}

/// Pick distinct participants, in the order given by `order`.
fn participants(mask: u8, order: &[usize]) -> Vec<MemberId> {
    let mut picked: Vec<MemberId> = order
        .iter()
        .filter(|&&idx| mask & (1 << idx) != 0)
        .map(|&idx| MemberId::from(MEMBER_NAMES[idx]))
        .collect();
    if picked.is_empty() {
        picked.push(MemberId::from(MEMBER_NAMES[order[0]]));
    }
    picked
}

/// Exact shares: cut the amount at sorted random points.
fn exact_rule(amount: i64, participants: &[MemberId], cuts: &[i64]) -> SplitRule {
    let mut points: Vec<i64> = cuts
        .iter()
        .take(participants.len() - 1)
        .map(|c| c.rem_euclid(amount + 1))
        .collect();
    points.sort_unstable();
    points.push(amount);

    let mut previous = 0;
    let shares = participants
        .iter()
        .zip(points)
        .map(|(p, point)| {
            let share = Money::from_minor(point - previous);
            previous = point;
            (p.clone(), share)
        })
        .collect();
    SplitRule::Exact(shares)
}

/// Percentages in hundredths of a percent that sum to exactly 100%.
fn percentage_rule(participants: &[MemberId], cuts: &[i64]) -> SplitRule {
    let total = 10_000;
    let mut points: Vec<i64> = cuts
        .iter()
        .take(participants.len() - 1)
        .map(|c| c.rem_euclid(total + 1))
        .collect();
    points.sort_unstable();
    points.push(total);

    let mut previous = 0;
    let percents: BTreeMap<_, _> = participants
        .iter()
        .zip(points)
        .map(|(p, point)| {
            let percent = Percent::new(point - previous, 100).expect("non-zero denominator");
            previous = point;
            (p.clone(), percent)
        })
        .collect();
    SplitRule::Percentage(percents)
}

prop_compose! {
    fn arb_expense(id: usize)(
        amount in 1i64..=1_000_000,
        payer in 0usize..MEMBER_NAMES.len(),
        mask in 1u8..64,
        order in Just((0..MEMBER_NAMES.len()).collect::<Vec<_>>()).prop_shuffle(),
        kind in 0u8..3,
        cuts in prop::collection::vec(any::<i64>(), MEMBER_NAMES.len()),
    ) -> Expense {
        let participants = participants(mask, &order);
        let rule = match kind {
            0 => SplitRule::Equal,
            1 => exact_rule(amount, &participants, &cuts),
            _ => percentage_rule(&participants, &cuts),
        };
        Expense::new(
            id.to_string(),
            Money::from_minor(amount),
            MEMBER_NAMES[payer],
            participants,
            rule,
        )
    }
}

fn arb_expenses() -> impl Strategy<Value = Vec<Expense>> {
    (0usize..20).prop_flat_map(|count| (0..count).map(arb_expense).collect::<Vec<_>>())
}

fn arb_balances() -> impl Strategy<Value = Balances> {
    prop::collection::vec(-100_000i64..=100_000, 1..MEMBER_NAMES.len()).prop_map(|values| {
        let mut balances: Balances = values
            .iter()
            .zip(MEMBER_NAMES)
            .map(|(&v, name)| (MemberId::from(name), Money::from_minor(v)))
            .collect();
        // The last member absorbs the difference, so that the total is zero.
        let total = Money::checked_sum(balances.values().copied()).expect("small values");
        balances.insert(MemberId::from(MEMBER_NAMES[values.len()]), -total);
        balances
    })
}

/// Two creditors anywhere in the positive range, and two debtors sharing their total
/// credit with the first one taking as much as an i64 can hold.
fn arb_extreme_balances() -> impl Strategy<Value = Balances> {
    (0i64..=i64::MAX, 0i64..=i64::MAX).prop_map(|(first, second)| {
        let total = i128::from(first) + i128::from(second);
        let first_debt = total.min(1i128 << 63);
        let second_debt = total - first_debt;
        [
            ("ann", i128::from(first)),
            ("ben", -first_debt),
            ("cat", i128::from(second)),
            ("dan", -second_debt),
        ]
        .into_iter()
        .map(|(name, value)| {
            let value = i64::try_from(value).expect("in range by construction");
            (MemberId::from(name), Money::from_minor(value))
        })
        .collect::<Balances>()
    })
}

proptest! {
    #[test]
    fn shares_sum_to_amount(expense in arb_expense(0)) {
        let shares = compute_shares(&expense).expect("generated expenses are valid");
        prop_assert_eq!(Money::checked_sum(shares.values().copied()), Some(expense.amount));
        prop_assert_eq!(shares.len(), expense.participants.len());
        prop_assert!(shares.values().all(|s| !s.is_negative()));
    }

    #[test]
    fn balances_sum_to_zero(expenses in arb_expenses()) {
        let balances = compute_balances(&members(), &expenses).expect("generated expenses are valid");
        prop_assert_eq!(balances.len(), MEMBER_NAMES.len());
        prop_assert_eq!(Money::exact_sum(balances.values().copied()), 0);
    }

    #[test]
    fn balances_do_not_depend_on_expense_order(
        (expenses, shuffled) in arb_expenses().prop_flat_map(|expenses| {
            let shuffled = Just(expenses.clone()).prop_shuffle();
            (Just(expenses), shuffled)
        })
    ) {
        let members = members();
        let balances = compute_balances(&members, &expenses).expect("valid");
        let reordered = compute_balances(&members, &shuffled).expect("valid");
        prop_assert_eq!(balances, reordered);
    }

    #[test]
    fn settlement_zeroes_every_balance(balances in arb_balances()) {
        let transfers = settle(&balances).expect("balances sum to zero");
        let settled = apply_transfers(&balances, &transfers).expect("no overflow");
        prop_assert!(settled.values().all(|b| b.is_zero()));
        prop_assert!(transfers.iter().all(|t| t.amount.is_positive()));
    }

    #[test]
    fn settlement_handles_balances_near_the_limits(balances in arb_extreme_balances()) {
        let transfers = settle(&balances).expect("balances sum to zero");
        prop_assert!(is_valid_settlement(&balances, &transfers));
        let non_zero = balances.values().filter(|b| !b.is_zero()).count();
        prop_assert!(transfers.len() <= non_zero.saturating_sub(1));
    }

    #[test]
    fn settlement_needs_fewer_transfers_than_members(balances in arb_balances()) {
        let transfers = settle(&balances).expect("balances sum to zero");
        let non_zero = balances.values().filter(|b| !b.is_zero()).count();
        prop_assert!(transfers.len() <= non_zero.saturating_sub(1));
    }

    #[test]
    fn computation_is_deterministic(expenses in arb_expenses()) {
        let members = members();
        let first = compute_balances(&members, &expenses).expect("valid");
        let second = compute_balances(&members, &expenses).expect("valid");
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            settle(&first).expect("zero sum"),
            settle(&second).expect("zero sum")
        );
    }
}
