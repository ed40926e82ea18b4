//! Assumptions attached to symbols.
//!
//! A small flag set modelled after the assumption keywords model authors use
//! (`positive`, `integer`, ...). Flags are closed under implication when they
//! are constructed, so `positive` also reports `nonnegative`, `nonzero` and
//! `real`.

use std::fmt;
use std::str::FromStr;

use num_rational::BigRational;
use num_traits::{Signed, Zero};

use crate::error::AstError;

/// Set of assumptions about the value of a symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Assumptions(u8);

impl Assumptions {
    pub const NONE: Assumptions = Assumptions(0);
    pub const REAL: Assumptions = Assumptions(1);
    pub const RATIONAL: Assumptions = Assumptions(1 << 1);
    pub const INTEGER: Assumptions = Assumptions(1 << 2);
    pub const NONZERO: Assumptions = Assumptions(1 << 3);
    pub const NONNEGATIVE: Assumptions = Assumptions(1 << 4);
    pub const POSITIVE: Assumptions = Assumptions(1 << 5);

    const NAMES: [(&'static str, Assumptions); 6] = [
        ("positive", Self::POSITIVE),
        ("nonnegative", Self::NONNEGATIVE),
        ("nonzero", Self::NONZERO),
        ("integer", Self::INTEGER),
        ("rational", Self::RATIONAL),
        ("real", Self::REAL),
    ];

    /// Union of two sets, closed under implication.
    #[must_use]
    pub fn with(self, other: Assumptions) -> Self {
        Assumptions(self.0 | other.0).closure()
    }

    #[inline]
    pub fn contains(self, other: Assumptions) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn closure(self) -> Self {
        let mut bits = self.0;
        if bits & Self::POSITIVE.0 != 0 {
            bits |= Self::NONNEGATIVE.0 | Self::NONZERO.0 | Self::REAL.0;
        }
        if bits & Self::NONNEGATIVE.0 != 0 {
            bits |= Self::REAL.0;
        }
        if bits & Self::INTEGER.0 != 0 {
            bits |= Self::RATIONAL.0;
        }
        if bits & Self::RATIONAL.0 != 0 {
            bits |= Self::REAL.0;
        }
        Assumptions(bits)
    }

    /// Whether an exact rational value is compatible with every flag.
    pub fn admits(self, value: &BigRational) -> bool {
        if self.contains(Self::POSITIVE) && !value.is_positive() {
            return false;
        }
        if self.contains(Self::NONNEGATIVE) && value.is_negative() {
            return false;
        }
        if self.contains(Self::NONZERO) && value.is_zero() {
            return false;
        }
        if self.contains(Self::INTEGER) && !value.is_integer() {
            return false;
        }
        true
    }

    /// Names of the flags that were set explicitly or by implication.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Build a set from assumption keywords.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, AstError> {
        names
            .into_iter()
            .try_fold(Self::NONE, |acc, name| Ok(acc.with(name.parse()?)))
    }
}

impl FromStr for Assumptions {
    type Err = AstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, flag)| flag.closure())
            .ok_or_else(|| AstError::UnknownAssumption(s.trim().to_string()))
    }
}

impl fmt::Display for Assumptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(", "))
    }
}
