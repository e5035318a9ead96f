//! Exact monetary arithmetic.
//!
//! Amounts are stored as a signed count of minor units (e.g. cents). The number of
//! decimal places is not stored in every value: it is fixed once per ledger by the
//! configured [`Currency`](crate::config::Currency), and only matters when parsing
//! or formatting.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Magnitude of the amount. Unlike a negation this cannot overflow, even for the
    /// most negative amount.
    pub fn unsigned_abs(self) -> u64 {
        self.0.unsigned_abs()
    }

    /// The negative amount of the given magnitude, if it fits.
    pub fn from_debt(magnitude: u64) -> Option<Money> {
        0i64.checked_sub_unsigned(magnitude).map(Money)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Exact total of `amounts`, computed in 128 bits so that no intermediate sum can
    /// overflow and the result does not depend on the order of the amounts.
    pub fn exact_sum<I: IntoIterator<Item = Money>>(amounts: I) -> i128 {
        amounts.into_iter().map(|m| i128::from(m.0)).sum()
    }

    /// Like [`Money::exact_sum`], returning `None` if the total is out of range.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        i64::try_from(Money::exact_sum(amounts)).ok().map(Money)
    }

    /// Split the amount into `parts` values that sum exactly to the original amount.
    ///
    /// The remainder (`amount mod parts` minor units) is handed out one unit at a time
    /// to the first parts, so the result depends only on the position of each part.
    /// Returns an empty vector when `parts` is zero.
    pub fn split_even(self, parts: usize) -> Vec<Money> {
        if parts == 0 {
            return vec![];
        }

        let n = parts as i64;
        let base = self.0.div_euclid(n);
        let remainder = self.0.rem_euclid(n) as usize;

        (0..parts)
            .map(|idx| if idx < remainder { Money(base + 1) } else { Money(base) })
            .collect()
    }

    /// Multiply by the rational `numerator / denominator`, rounding towards negative
    /// infinity.
    ///
    /// Returns the rounded amount together with the leftover numerator, i.e. the
    /// exact result is `amount + leftover / denominator`, with
    /// `0 <= leftover < denominator`. Returns `None` if the denominator is not
    /// positive or the result does not fit in the minor-unit range.
    pub fn mul_ratio(self, numerator: i128, denominator: i128) -> Option<(Money, i128)> {
        if denominator <= 0 {
            return None;
        }
        let product = (self.0 as i128).checked_mul(numerator)?;
        let quotient = product.div_euclid(denominator);
        let leftover = product.rem_euclid(denominator);
        let quotient = i64::try_from(quotient).ok()?;
        Some((Money(quotient), leftover))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

/// An exact percentage, stored as a reduced fraction with a positive denominator.
///
/// `Percent::new(100, 3)` is exactly 33⅓%.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Percent {
    numerator: i64,
    denominator: i64,
}

impl Percent {
    pub const ZERO: Percent = Percent {
        numerator: 0,
        denominator: 1,
    };

    pub const HUNDRED: Percent = Percent {
        numerator: 100,
        denominator: 1,
    };

    /// Build a percentage from a fraction. Returns `None` if the denominator is zero.
    pub fn new(numerator: i64, denominator: i64) -> Option<Percent> {
        if denominator == 0 {
            return None;
        }
        let (numerator, denominator) = if denominator < 0 {
            (numerator.checked_neg()?, denominator.checked_neg()?)
        } else {
            (numerator, denominator)
        };
        let divisor = gcd(numerator.unsigned_abs(), denominator.unsigned_abs()).max(1) as i64;
        Some(Percent {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }

    pub const fn whole(value: i64) -> Percent {
        Percent {
            numerator: value,
            denominator: 1,
        }
    }

    pub fn numerator(self) -> i64 {
        self.numerator
    }

    pub fn denominator(self) -> i64 {
        self.denominator
    }

    pub fn is_negative(self) -> bool {
        self.numerator < 0
    }

    /// True if the percentage lies in the closed range `[0, 100]`.
    pub fn is_within_bounds(self) -> bool {
        !self.is_negative() && self <= Percent::HUNDRED
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::ZERO
    }
}

impl PartialOrd for Percent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Percent {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as i128 * other.denominator as i128;
        let rhs = other.numerator as i128 * self.denominator as i128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}%", self.numerator)
        } else {
            write!(f, "{}/{}%", self.numerator, self.denominator)
        }
    }
}

pub(crate) fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
