//! Produce the strings shown to users.
//! The formatting consists in rendering amounts in the configured currency and
//! aligning the columns of balance and transfer lists.

use crate::config::Currency;
use crate::money::Money;
use crate::types::{Balances, Transfer};

/// Render an amount with the currency symbol, digit grouping and the number of
/// decimals of the currency: `₹1,23,456.78`, `$1,234.56`, `-€3.00`, `¥1,500`.
///
/// Indian rupees use the Indian grouping (thousands, then groups of two digits).
pub fn format_amount(amount: Money, currency: Currency) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let abs = amount.minor().unsigned_abs();
    let scale = currency.minor_per_major() as u64;

    let major = group_digits(&(abs / scale).to_string(), currency == Currency::Inr);
    if scale == 1 {
        format!("{sign}{}{major}", currency.symbol())
    } else {
        format!(
            "{sign}{}{major}.{:0width$}",
            currency.symbol(),
            abs % scale,
            width = currency.exponent() as usize
        )
    }
}

/// Like [`format_amount`], with an explicit `+` for positive amounts.
pub fn format_signed_amount(amount: Money, currency: Currency) -> String {
    if amount.is_positive() {
        format!("+{}", format_amount(amount, currency))
    } else {
        format_amount(amount, currency)
    }
}

pub fn format_balances(balances: &Balances, currency: Currency) -> String {
    if balances.is_empty() {
        return "Nothing to show!".to_string();
    }

    let max_member_length = balances
        .keys()
        .map(|m| m.as_str().chars().count())
        .max()
        .unwrap_or(0);

    balances
        .iter()
        .map(|(member, &balance)| {
            format!(
                "{}  {}",
                pad(member.as_str(), max_member_length),
                format_signed_amount(balance, currency)
            )
        })
        .fold(String::new(), |a, b| a + &b + "\n")
}

pub fn format_transfers(transfers: &[Transfer], currency: Currency) -> String {
    if transfers.is_empty() {
        return "All clean!".to_string();
    }

    let max_debtor_length = transfers
        .iter()
        .map(|t| t.from.as_str().chars().count())
        .max()
        .unwrap_or(0);

    transfers
        .iter()
        .map(|t| format_transfer(t, max_debtor_length, currency))
        .fold(String::new(), |a, b| a + &b + "\n")
}

fn format_transfer(transfer: &Transfer, target_length: usize, currency: Currency) -> String {
    // We make sure that the amounts are always aligned, by padding the debtors where needed.
    format!(
        "{} pays {} to {}",
        pad(transfer.from.as_str(), target_length),
        format_amount(transfer.amount, currency),
        transfer.to
    )
}

fn pad(s: &str, target_length: usize) -> String {
    let length = s.chars().count();
    if length < target_length {
        s.to_string() + &" ".repeat(target_length - length)
    } else {
        s.to_string()
    }
}

fn group_digits(digits: &str, indian: bool) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let group = if indian { 2 } else { 3 };

    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(group);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    groups.push(last_three);
    groups.join(",")
}
