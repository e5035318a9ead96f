use thiserror::Error;

use crate::money::{Money, Percent};
use crate::types::{ExpenseId, MemberId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid split for expense `{expense_id}`: {violation}")]
    InvalidSplit {
        expense_id: ExpenseId,
        violation: SplitViolation,
    },

    #[error("expense `{expense_id}` references `{member_id}`, which is not a member of the group")]
    UnknownMember {
        expense_id: ExpenseId,
        member_id: MemberId,
    },

    #[error("`{0}` appears more than once in the member list")]
    DuplicateMember(MemberId),

    /// Internal-consistency fault. Balances are never adjusted to hide it.
    #[error("ledger invariant violated: {0}")]
    InvariantViolation(InvariantViolation),
}

/// Why the shares declared by an expense are inconsistent with its amount or
/// participants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitViolation {
    #[error("the amount must be positive, got {0}")]
    NonPositiveAmount(Money),

    #[error("there are no participants in this expense")]
    NoParticipants,

    #[error("`{0}` appears more than once among the participants")]
    DuplicateParticipant(MemberId),

    #[error("participant `{0}` has no share")]
    MissingShare(MemberId),

    #[error("`{0}` has a share but is not a participant")]
    UnexpectedShare(MemberId),

    #[error("participant `{member_id}` has a negative share {share}")]
    NegativeShare { member_id: MemberId, share: Money },

    #[error("shares sum to {actual}, but the expense amount is {expected}")]
    SharesSumMismatch { expected: Money, actual: Money },

    #[error("participant `{member_id}` has percentage {percent}, outside of [0, 100]")]
    PercentOutOfRange { member_id: MemberId, percent: Percent },

    #[error("percentages sum to {actual}, expected 100%")]
    PercentagesSumMismatch { actual: Percent },

    #[error("the split cannot be computed without overflowing")]
    Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("balances sum to {sum} instead of zero")]
    NonZeroSum { sum: Money },

    #[error("`{member_id}` still has a balance of {amount} after settlement")]
    ResidualBalance { member_id: MemberId, amount: Money },

    #[error("balance of `{member_id}` overflowed")]
    Overflow { member_id: MemberId },

    #[error("the sum of all balances overflowed")]
    SumOverflow,
}

/// Errors in textual input handed over by collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error(
        "invalid syntax for an expense; example of valid syntax: alice 12.50 alice bob/4 carol/8.50 #food - dinner"
    )]
    InvalidExpenseSyntax(String),

    #[error("invalid amount `{0}`: {1}")]
    InvalidAmount(String, String),

    #[error("invalid percentage `{0}`")]
    InvalidPercent(String),

    #[error(
        "invalid member name `{0}`: member names must be alphanumeric and must start with a letter"
    )]
    InvalidMemberName(String),

    #[error("participants must either all have amounts, all have percentages or have no share at all")]
    MixedShareKinds,

    #[error("missing members declaration. Format must be 'members member_name [member_name...]'")]
    MembersNotProvided,

    #[error("unsupported currency `{0}`")]
    UnsupportedCurrency(String),

    #[error("unknown category `{0}`; valid categories are food, transport, accommodation, entertainment, shopping, utilities, health and other")]
    InvalidCategory(String),
}

impl LedgerError {
    pub fn invalid_split(expense_id: &ExpenseId, violation: SplitViolation) -> Self {
        LedgerError::InvalidSplit {
            expense_id: expense_id.clone(),
            violation,
        }
    }

    pub fn unknown_member(expense_id: &ExpenseId, member_id: &MemberId) -> Self {
        LedgerError::UnknownMember {
            expense_id: expense_id.clone(),
            member_id: member_id.clone(),
        }
    }

    pub fn duplicate_member(member_id: &MemberId) -> Self {
        LedgerError::DuplicateMember(member_id.clone())
    }

    pub fn non_zero_sum(sum: Money) -> Self {
        LedgerError::InvariantViolation(InvariantViolation::NonZeroSum { sum })
    }

    pub fn residual_balance(member_id: &MemberId, amount: Money) -> Self {
        LedgerError::InvariantViolation(InvariantViolation::ResidualBalance {
            member_id: member_id.clone(),
            amount,
        })
    }

    pub fn balance_overflow(member_id: &MemberId) -> Self {
        LedgerError::InvariantViolation(InvariantViolation::Overflow {
            member_id: member_id.clone(),
        })
    }

    /// True for errors that only concern a single expense and can be fixed by the
    /// caller, as opposed to internal-consistency faults.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LedgerError::InvariantViolation(_))
    }

    pub fn expense_id(&self) -> Option<&ExpenseId> {
        match self {
            LedgerError::InvalidSplit { expense_id, .. }
            | LedgerError::UnknownMember { expense_id, .. } => Some(expense_id),
            _ => None,
        }
    }
}

impl InputError {
    pub fn invalid_expense_syntax(e: nom::Err<nom::error::Error<&str>>) -> Self {
        InputError::InvalidExpenseSyntax(e.to_string())
    }

    pub fn invalid_amount<T: Into<String>>(amount: &str, reason: T) -> Self {
        InputError::InvalidAmount(amount.to_string(), reason.into())
    }

    pub fn invalid_percent(percent: &str) -> Self {
        InputError::InvalidPercent(percent.to_string())
    }

    pub fn invalid_member_name(name: &str) -> Self {
        InputError::InvalidMemberName(name.to_string())
    }

    pub fn unsupported_currency(code: &str) -> Self {
        InputError::UnsupportedCurrency(code.to_string())
    }

    pub fn invalid_category(category: &str) -> Self {
        InputError::InvalidCategory(category.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_context() {
        let split = LedgerError::invalid_split(&"3".into(), SplitViolation::NoParticipants);
        assert_eq!(split.expense_id(), Some(&ExpenseId::from("3")));
        assert!(split.is_recoverable());

        let unknown = LedgerError::unknown_member(&"4".into(), &"zed".into());
        assert_eq!(unknown.expense_id(), Some(&ExpenseId::from("4")));
        assert!(unknown.is_recoverable());

        let duplicate = LedgerError::duplicate_member(&"a".into());
        assert_eq!(duplicate.expense_id(), None);
        assert!(duplicate.is_recoverable());

        let fault = LedgerError::non_zero_sum(Money::from_minor(1));
        assert_eq!(fault.expense_id(), None);
        assert!(!fault.is_recoverable());
    }

    #[test]
    fn test_messages_carry_context() {
        let e = LedgerError::invalid_split(
            &"7".into(),
            SplitViolation::SharesSumMismatch {
                expected: Money::from_minor(6000),
                actual: Money::from_minor(5990),
            },
        );
        assert_eq!(
            e.to_string(),
            "invalid split for expense `7`: shares sum to 5990, but the expense amount is 6000"
        );
    }
}
