//! Parse textual input handed over by collaborators.
//!
//! The grammar is small, but amounts and percentages must be read exactly, so the
//! tokens are recognized with nom and then converted to integers by hand.

mod expense;

pub use expense::{parse_expense, ParsedExpense, ParsedParticipant, ParsedShare};

use nom::{
    bytes::complete::{tag, take_till1},
    character::complete::{char, digit1, multispace0, multispace1, one_of},
    combinator::{all_consuming, map, opt, recognize, verify},
    multi::many0,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::config::Currency;
use crate::error::InputError;
use crate::money::{Money, Percent};
use crate::types::{Member, MemberId};

/// Largest number of fractional digits accepted in a percentage.
const MAX_PERCENT_DECIMALS: usize = 12;

/// Parse a complete amount, such as `12`, `-3.5` or `1234,56`.
///
/// The amount may have at most as many fractional digits as the currency allows:
/// extra digits are an error rather than being truncated.
pub fn parse_amount(s: &str, currency: Currency) -> Result<Money, InputError> {
    let s = s.trim();
    let (_, token) = all_consuming(decimal)(s).map_err(|_| InputError::invalid_amount(s, "not a number"))?;
    amount_from_token(token, currency)
}

/// Parse a complete percentage, such as `40%` or `33.25%`.
pub fn parse_percent(s: &str) -> Result<Percent, InputError> {
    let s = s.trim();
    let (_, token) = all_consuming(terminated(decimal, char('%')))(s)
        .map_err(|_| InputError::invalid_percent(s))?;
    percent_from_token(token)
}

/// Parse a members declaration: `members alice bob carol`.
///
/// Names are lower-cased and a leading `@` is stripped. The display name of each
/// member is its identifier.
pub fn parse_members(s: &str) -> Result<Vec<Member>, InputError> {
    let result: IResult<&str, Vec<&str>> = preceded(
        pair(multispace0, tag("members")),
        many0(preceded(multispace1, take_till1(char::is_whitespace))),
    )(s);

    let (rest, names) = result.map_err(|_| InputError::MembersNotProvided)?;
    if !rest.trim().is_empty() {
        return Err(InputError::MembersNotProvided);
    }
    if names.is_empty() {
        return Err(InputError::MembersNotProvided);
    }

    names
        .into_iter()
        .map(|name| {
            let (_, id) = all_consuming(member_name)(name)
                .map_err(|_| InputError::invalid_member_name(name))?;
            Ok(Member::from_id(id))
        })
        .collect()
}

/// Member names must start with a letter and continue with letters, digits or
/// underscores. A leading `@` is allowed and stripped away.
pub fn is_valid_name(name: &str) -> bool {
    let name = name.strip_prefix('@').unwrap_or(name);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// A member name, normalized to lower case without the `@` prefix.
pub(crate) fn member_name(s: &str) -> IResult<&str, MemberId> {
    map(
        // Match until a whitespace or '/' is found, then use is_valid_name to make
        // sure that a name was matched (and not a number, which would be the amount).
        verify(
            take_till1(|c: char| c.is_whitespace() || c == '/'),
            is_valid_name,
        ),
        |name: &str| MemberId::new(name.strip_prefix('@').unwrap_or(name).to_lowercase()),
    )(s)
}

/// A signed decimal number, with `.` or `,` as decimal separator.
pub(crate) fn decimal(s: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(one_of(".,"), digit1)),
    )))(s)
}

/// Split a token recognized by [`decimal`] into sign, integer and fractional digits.
fn split_decimal(token: &str) -> (bool, &str, &str) {
    let (is_negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    match unsigned.split_once(&['.', ','][..]) {
        Some((integer, fraction)) => (is_negative, integer, fraction),
        None => (is_negative, unsigned, ""),
    }
}

/// Interpret `integer.fraction` as an integer count of `10^-scale` units.
fn scaled_integer(integer: &str, fraction: &str, scale: usize) -> Option<i64> {
    let mut digits = String::with_capacity(integer.len() + scale);
    digits.push_str(integer);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(scale - fraction.len()));
    digits.parse::<i64>().ok()
}

pub(crate) fn amount_from_token(token: &str, currency: Currency) -> Result<Money, InputError> {
    let (is_negative, integer, fraction) = split_decimal(token);
    let decimals = currency.exponent() as usize;

    if fraction.len() > decimals {
        return Err(InputError::invalid_amount(
            token,
            format!("{currency} allows at most {decimals} decimal places"),
        ));
    }

    let minor = scaled_integer(integer, fraction, decimals)
        .ok_or_else(|| InputError::invalid_amount(token, "amount too large"))?;
    Ok(Money::from_minor(if is_negative { -minor } else { minor }))
}

pub(crate) fn percent_from_token(token: &str) -> Result<Percent, InputError> {
    let (is_negative, integer, fraction) = split_decimal(token);
    if fraction.len() > MAX_PERCENT_DECIMALS {
        return Err(InputError::invalid_percent(token));
    }

    let numerator = scaled_integer(integer, fraction, fraction.len())
        .ok_or_else(|| InputError::invalid_percent(token))?;
    let denominator = 10i64.pow(fraction.len() as u32);
    let numerator = if is_negative { -numerator } else { numerator };

    Percent::new(numerator, denominator).ok_or_else(|| InputError::invalid_percent(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() -> anyhow::Result<()> {
        assert_eq!(parse_amount("3.45", Currency::Inr)?, Money::from_minor(345));
        assert_eq!(parse_amount("3,45", Currency::Inr)?, Money::from_minor(345));
        assert_eq!(parse_amount("3", Currency::Inr)?, Money::from_minor(300));
        assert_eq!(parse_amount("3.4", Currency::Inr)?, Money::from_minor(340));
        assert_eq!(parse_amount("+3", Currency::Inr)?, Money::from_minor(300));
        assert_eq!(parse_amount("-3.45", Currency::Inr)?, Money::from_minor(-345));
        assert_eq!(parse_amount(" 100.01 ", Currency::Usd)?, Money::from_minor(10001));
        assert_eq!(parse_amount("1500", Currency::Jpy)?, Money::from_minor(1500));
        Ok(())
    }

    #[test]
    fn test_parse_amount_rejects_extra_digits() {
        assert!(parse_amount("3.456", Currency::Inr).is_err());
        assert!(parse_amount("3.5", Currency::Jpy).is_err());
        assert!(parse_amount("3.", Currency::Inr).is_err());
        assert!(parse_amount("abc", Currency::Inr).is_err());
        assert!(parse_amount("99999999999999999999", Currency::Inr).is_err());
    }

    #[test]
    fn test_parse_percent() -> anyhow::Result<()> {
        assert_eq!(parse_percent("40%")?, Percent::whole(40));
        assert_eq!(parse_percent("33.5%")?, Percent::new(67, 2).expect("test"));
        assert_eq!(parse_percent("12,25%")?, Percent::new(49, 4).expect("test"));
        assert_eq!(parse_percent("-1%")?, Percent::whole(-1));
        assert!(parse_percent("40").is_err());
        assert!(parse_percent("%").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_members() -> anyhow::Result<()> {
        let members = parse_members("members Alice  @bob carol_2 ")?;
        let ids: Vec<_> = members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol_2"]);

        assert_eq!(parse_members("members"), Err(InputError::MembersNotProvided));
        assert_eq!(parse_members("alice bob"), Err(InputError::MembersNotProvided));
        assert_eq!(
            parse_members("members alice 2bob"),
            Err(InputError::InvalidMemberName("2bob".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("abc"));
        assert!(is_valid_name("@Abë"));
        assert!(is_valid_name("a_1"));
        assert!(!is_valid_name("1a"));
        assert!(!is_valid_name("-"));
        assert!(!is_valid_name("a-b"));
        assert!(!is_valid_name(""));
    }
}
