use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::InputError;
use crate::money::{Money, Percent};

/// Net balance of every member: positive means the group owes the member money,
/// negative means the member owes money to the group.
pub type Balances = BTreeMap<MemberId, Money>;

/// How much each participant owes for a single expense.
pub type Shares = BTreeMap<MemberId, Money>;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberId(String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpenseId(String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

/// What an expense was for. It only matters for spending reports, never for
/// balances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Food,
    Transport,
    Accommodation,
    Entertainment,
    Shopping,
    Utilities,
    Health,
    #[default]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitRule {
    Equal,
    Exact(BTreeMap<MemberId, Money>),
    Percentage(BTreeMap<MemberId, Percent>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: ExpenseId,
    pub amount: Money,
    pub paid_by: MemberId,
    /// The order matters: it decides who receives the leftover minor units.
    pub participants: Vec<MemberId>,
    pub split_rule: SplitRule,
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

impl MemberId {
    pub fn new<T: Into<String>>(id: T) -> MemberId {
        MemberId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ExpenseId {
    pub fn new<T: Into<String>>(id: T) -> ExpenseId {
        ExpenseId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> MemberId {
        MemberId::new(id)
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> MemberId {
        MemberId(id)
    }
}

impl From<&str> for ExpenseId {
    fn from(id: &str) -> ExpenseId {
        ExpenseId::new(id)
    }
}

impl From<String> for ExpenseId {
    fn from(id: String) -> ExpenseId {
        ExpenseId(id)
    }
}

impl Member {
    pub fn new<I: Into<MemberId>, N: Into<String>>(id: I, name: N) -> Member {
        Member {
            id: id.into(),
            name: name.into(),
        }
    }

    /// A member whose display name is the identifier itself.
    pub fn from_id<I: Into<MemberId>>(id: I) -> Member {
        let id = id.into();
        let name = id.to_string();
        Member { id, name }
    }
}

impl Expense {
    pub fn new<I, P>(
        id: I,
        amount: Money,
        paid_by: P,
        participants: Vec<MemberId>,
        split_rule: SplitRule,
    ) -> Expense
    where
        I: Into<ExpenseId>,
        P: Into<MemberId>,
    {
        Expense {
            id: id.into(),
            amount,
            paid_by: paid_by.into(),
            participants,
            split_rule,
            timestamp: Utc::now(),
            category: Category::default(),
            message: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Expense {
        self.timestamp = timestamp;
        self
    }

    pub fn with_category(mut self, category: Category) -> Expense {
        self.category = category;
        self
    }

    pub fn with_message(mut self, message: Option<String>) -> Expense {
        self.message = message;
        self
    }

    /// Every member referenced by the expense: the payer first, then the participants
    /// in their declared order.
    pub fn referenced_members(&self) -> impl Iterator<Item = &MemberId> {
        std::iter::once(&self.paid_by).chain(self.participants.iter())
    }
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Transport,
        Category::Accommodation,
        Category::Entertainment,
        Category::Shopping,
        Category::Utilities,
        Category::Health,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Accommodation => "accommodation",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Utilities => "utilities",
            Category::Health => "health",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| InputError::invalid_category(&s))
    }
}

impl Transfer {
    pub fn new(from: MemberId, to: MemberId, amount: Money) -> Transfer {
        Transfer { from, to, amount }
    }
}
