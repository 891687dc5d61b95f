//! Integer money and basis-point percentages.
//!
//! All amounts are counted in minor units (cents). Conservation checks across the
//! ledger are therefore exact equalities, never epsilon comparisons.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::value_object::ValueObject;

/// Signed amount of money in minor units (e.g. cents).
///
/// Checked arithmetic keeps values within `±i64::MAX`; `i64::MIN` is never produced, so
/// negation and `abs` are total.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Minor units per major unit.
    pub const SCALE: i64 = 100;

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole major units (`Money::from_major(12)` is 12.00).
    pub const fn from_major(major: i64) -> Self {
        Self(major * Self::SCALE)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub fn checked_add(self, rhs: Money) -> LedgerResult<Money> {
        Self::in_range(self.0.checked_add(rhs.0))
    }

    pub fn checked_sub(self, rhs: Money) -> LedgerResult<Money> {
        Self::in_range(self.0.checked_sub(rhs.0))
    }

    /// Narrow an `i128` accumulator back to `Money`.
    pub fn from_wide(cents: i128) -> LedgerResult<Money> {
        Self::in_range(i64::try_from(cents).ok())
    }

    /// Like [`from_wide`](Self::from_wide), clamping to `±i64::MAX` instead of failing.
    pub fn saturating_from_wide(cents: i128) -> Money {
        let max = i128::from(i64::MAX);
        Money(cents.clamp(-max, max) as i64)
    }

    pub const fn wide(self) -> i128 {
        self.0 as i128
    }

    fn in_range(cents: Option<i64>) -> LedgerResult<Money> {
        match cents {
            Some(c) if c != i64::MIN => Ok(Money(c)),
            _ => Err(LedgerError::Overflow),
        }
    }

    /// Checked sum of an iterator of amounts.
    pub fn checked_sum<I>(amounts: I) -> LedgerResult<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
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
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE as u64;
        write!(f, "{sign}{}.{:02}", abs / scale, abs % scale)
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    /// Parses `12`, `12.3`, `12.34`, `-0.5`. More than two fractional digits is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if major.is_empty() || !all_digits(major) || !all_digits(minor) {
            return Err(LedgerError::invalid_amount(format!("not a money literal: {s:?}")));
        }
        if minor.len() > 2 {
            return Err(LedgerError::invalid_amount(format!(
                "more than two fractional digits: {s:?}"
            )));
        }

        let major: i64 = major
            .parse()
            .map_err(|_| LedgerError::invalid_amount(format!("out of range: {s:?}")))?;
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| LedgerError::invalid_amount(s))? * 10,
            _ => minor.parse::<i64>().map_err(|_| LedgerError::invalid_amount(s))?,
        };

        let cents = major
            .checked_mul(Self::SCALE)
            .and_then(|c| c.checked_add(minor))
            .ok_or(LedgerError::Overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

/// A percentage in basis points (1/100 of a percent), between 0% and 100%.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Percent(u32);

impl ValueObject for Percent {}

impl Percent {
    /// Basis points in 100%.
    pub const FULL_BASIS_POINTS: u32 = 10_000;

    pub const HUNDRED: Percent = Percent(Self::FULL_BASIS_POINTS);

    pub fn from_basis_points(bp: u32) -> LedgerResult<Self> {
        if bp > Self::FULL_BASIS_POINTS {
            return Err(LedgerError::invalid_amount(format!(
                "percentage above 100% ({bp} basis points)"
            )));
        }
        Ok(Self(bp))
    }

    /// Whole percent (`Percent::from_whole(40)` is 40%).
    pub fn from_whole(pct: u32) -> LedgerResult<Self> {
        let bp = pct
            .checked_mul(100)
            .ok_or_else(|| LedgerError::invalid_amount(format!("percentage out of range: {pct}")))?;
        Self::from_basis_points(bp)
    }

    pub const fn basis_points(self) -> u32 {
        self.0
    }

    /// `amount × self`, floored toward zero to the minor unit.
    pub fn of(self, amount: Money) -> Money {
        let scaled = i128::from(amount.cents()) * i128::from(self.0)
            / i128::from(Self::FULL_BASIS_POINTS);
        // |scaled| <= |amount| since self <= 100%.
        Money::from_cents(scaled as i64)
    }
}

impl TryFrom<u32> for Percent {
    type Error = LedgerError;

    fn try_from(bp: u32) -> Result<Self, Self::Error> {
        Self::from_basis_points(bp)
    }
}

impl From<Percent> for u32 {
    fn from(value: Percent) -> Self {
        value.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}
