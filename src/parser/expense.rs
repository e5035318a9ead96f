//! Parse an expense.
//!
//! Syntax: `payer amount participant[/share] ... [#category] [- message]`, where a
//! share is either an amount (`bob/12.50`) or a percentage (`bob/40%`). Without a
//! category the expense is filed under `other`. Since expenses have a more or less
//! complex syntax, we use nom.

use std::collections::BTreeMap;

use nom::{
    bytes::complete::{tag, take_till1},
    character::complete::{char, multispace0, multispace1, not_line_ending},
    combinator::{map, opt},
    multi::many0,
    sequence::{pair, preceded, tuple},
    IResult,
};

use crate::config::Currency;
use crate::error::InputError;
use crate::money::{Money, Percent};
use crate::types::{Category, Expense, ExpenseId, MemberId, SplitRule};

use super::{amount_from_token, decimal, member_name, percent_from_token};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedExpense {
    pub paid_by: MemberId,
    pub amount: Money,
    pub participants: Vec<ParsedParticipant>,
    pub category: Category,
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedParticipant {
    pub id: MemberId,
    pub share: Option<ParsedShare>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParsedShare {
    Amount(Money),
    Percent(Percent),
}

/// Tokens of an expense line, before amounts are interpreted.
struct RawExpense<'a> {
    paid_by: MemberId,
    amount: &'a str,
    participants: Vec<(MemberId, Option<(&'a str, bool)>)>,
    category: Option<&'a str>,
    message: Option<&'a str>,
}

/// Parse an expense submitted as a line of text.
///
/// Some basic checks are performed by the parser (syntax, valid names, amounts
/// representable in the currency), while the consistency of the expense is checked
/// later by the validator.
pub fn parse_expense(s: &str, currency: Currency) -> Result<ParsedExpense, InputError> {
    let (rest, raw) = expense_line(s).map_err(InputError::invalid_expense_syntax)?;
    if !rest.trim().is_empty() {
        return Err(InputError::InvalidExpenseSyntax(rest.trim().to_string()));
    }

    let amount = amount_from_token(raw.amount, currency)?;
    let participants = raw
        .participants
        .into_iter()
        .map(|(id, share)| {
            let share = match share {
                Some((token, true)) => Some(ParsedShare::Percent(percent_from_token(token)?)),
                Some((token, false)) => Some(ParsedShare::Amount(amount_from_token(token, currency)?)),
                None => None,
            };
            Ok(ParsedParticipant { id, share })
        })
        .collect::<Result<Vec<_>, InputError>>()?;
    let category = match raw.category {
        Some(category) => category.parse()?,
        None => Category::default(),
    };

    Ok(ParsedExpense {
        paid_by: raw.paid_by,
        amount,
        participants,
        category,
        message: raw.message.map(|m| m.trim().to_string()),
    })
}

impl ParsedExpense {
    /// Build the expense record, deciding the split rule from the shares: no shares
    /// means an equal split, otherwise all participants must use the same kind of
    /// share.
    pub fn into_expense<I: Into<ExpenseId>>(self, id: I) -> Result<Expense, InputError> {
        let split_rule = split_rule(&self.participants)?;
        let participants = self.participants.into_iter().map(|p| p.id).collect();

        Ok(Expense::new(id, self.amount, self.paid_by, participants, split_rule)
            .with_category(self.category)
            .with_message(self.message))
    }
}

fn split_rule(participants: &[ParsedParticipant]) -> Result<SplitRule, InputError> {
    if participants.iter().all(|p| p.share.is_none()) {
        return Ok(SplitRule::Equal);
    }

    let amounts: Option<BTreeMap<_, _>> = participants
        .iter()
        .map(|p| match p.share {
            Some(ParsedShare::Amount(amount)) => Some((p.id.clone(), amount)),
            _ => None,
        })
        .collect();
    if let Some(amounts) = amounts {
        return Ok(SplitRule::Exact(amounts));
    }

    let percents: Option<BTreeMap<_, _>> = participants
        .iter()
        .map(|p| match p.share {
            Some(ParsedShare::Percent(percent)) => Some((p.id.clone(), percent)),
            _ => None,
        })
        .collect();
    percents
        .map(SplitRule::Percentage)
        .ok_or(InputError::MixedShareKinds)
}

fn expense_line(s: &str) -> IResult<&str, RawExpense> {
    let (s, paid_by) = preceded(multispace0, member_name)(s)?;
    let (s, amount) = preceded(multispace1, decimal)(s)?;
    let (s, participants) = many0(preceded(multispace1, participant))(s)?;
    let (s, category) = parse_category(s)?;
    let (s, message) = parse_message(s)?;

    Ok((
        s,
        RawExpense {
            paid_by,
            amount,
            participants,
            category,
            message,
        },
    ))
}

/// A participant name, optionally followed by `/amount` or `/percentage%`.
fn participant(s: &str) -> IResult<&str, (MemberId, Option<(&str, bool)>)> {
    tuple((
        member_name,
        opt(preceded(
            char('/'),
            map(pair(decimal, opt(char('%'))), |(token, percent)| {
                (token, percent.is_some())
            }),
        )),
    ))(s)
}

fn parse_category(s: &str) -> IResult<&str, Option<&str>> {
    opt(preceded(
        multispace1,
        preceded(char('#'), take_till1(char::is_whitespace)),
    ))(s)
}

fn parse_message(s: &str) -> IResult<&str, Option<&str>> {
    opt(preceded(multispace0, preceded(tag("- "), not_line_ending)))(s)
}
