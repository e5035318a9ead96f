//! Exact expense-splitting ledger.
//!
//! Given the members of a group and the expenses they shared, compute what each
//! member is owed or owes ([`compute_balances`]) and a short list of transfers that
//! settles every debt ([`settle`]). All amounts are integer minor units, so balances
//! always sum to exactly zero.
//!
//! ```
//! use splitter_rs::{compute_balances, settle, Expense, Member, MemberId, Money, SplitRule};
//!
//! let members = vec![Member::from_id("a"), Member::from_id("b"), Member::from_id("c")];
//! let participants = vec![MemberId::from("a"), MemberId::from("b"), MemberId::from("c")];
//! let expense = Expense::new("1", Money::from_minor(100), "a", participants, SplitRule::Equal);
//!
//! let balances = compute_balances(&members, &[expense]).unwrap();
//! assert_eq!(balances[&MemberId::from("a")], Money::from_minor(66));
//!
//! let transfers = settle(&balances).unwrap();
//! assert_eq!(transfers.len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod formatter;
pub mod ledger;
pub mod money;
pub mod parser;
pub mod settlement;
pub mod split;
pub mod types;
pub mod validator;

pub use config::{Config, Currency};
pub use error::{InputError, InvariantViolation, LedgerError, SplitViolation};
pub use ledger::{
    compute_balances, compute_balances_with_config, spending_report, summarize, BalanceSummary,
    ExpenseFilter, SpendingReport,
};
pub use money::{Money, Percent};
pub use settlement::{apply_transfers, is_valid_settlement, settle};
pub use split::{compute_shares, compute_shares_with_config};
pub use types::{
    Balances, Category, Expense, ExpenseId, Member, MemberId, Shares, SplitRule, Transfer,
};
pub use validator::check_expenses;
