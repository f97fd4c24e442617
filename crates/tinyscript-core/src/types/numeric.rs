//! Ranged numeric types.
//!
//! Literals produce singleton ranges and arithmetic widens them, so a
//! declaration like `b = a + 1` carries `Int[2, 2]` when `a = 1`.

use std::fmt;

/// An inclusive range of 64-bit integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub const FULL: IntRange = IntRange {
        min: i64::MIN,
        max: i64::MAX,
    };

    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn singleton(value: i64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.min == i64::MIN && self.max == i64::MAX
    }

    /// Range inclusion: every value of `other` lies in `self`.
    #[must_use]
    pub const fn contains(&self, other: &IntRange) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    /// Smallest range covering both.
    #[must_use]
    pub fn hull(&self, other: &IntRange) -> IntRange {
        IntRange::new(self.min.min(other.min), self.max.max(other.max))
    }

    #[must_use]
    pub fn add(&self, other: &IntRange) -> IntRange {
        match (
            self.min.checked_add(other.min),
            self.max.checked_add(other.max),
        ) {
            (Some(min), Some(max)) => IntRange::new(min, max),
            _ => IntRange::FULL,
        }
    }

    #[must_use]
    pub fn sub(&self, other: &IntRange) -> IntRange {
        match (
            self.min.checked_sub(other.max),
            self.max.checked_sub(other.min),
        ) {
            (Some(min), Some(max)) => IntRange::new(min, max),
            _ => IntRange::FULL,
        }
    }

    #[must_use]
    pub fn mul(&self, other: &IntRange) -> IntRange {
        let corners = [
            self.min.checked_mul(other.min),
            self.min.checked_mul(other.max),
            self.max.checked_mul(other.min),
            self.max.checked_mul(other.max),
        ];
        let mut values = Vec::with_capacity(4);
        for corner in corners {
            match corner {
                Some(value) => values.push(value),
                None => return IntRange::FULL,
            }
        }
        let min = values.iter().copied().min().unwrap_or(i64::MIN);
        let max = values.iter().copied().max().unwrap_or(i64::MAX);
        IntRange::new(min, max)
    }

    #[must_use]
    pub fn neg(&self) -> IntRange {
        match (self.max.checked_neg(), self.min.checked_neg()) {
            (Some(min), Some(max)) => IntRange::new(min, max),
            _ => IntRange::FULL,
        }
    }
}

impl fmt::Display for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_full() {
            write!(f, "Int")
        } else {
            write!(f, "Int[{}, {}]", self.min, self.max)
        }
    }
}

/// An inclusive range of 64-bit floats. Bounds are never NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

impl FloatRange {
    pub const FULL: FloatRange = FloatRange {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    /// Builds a range, widening to the full range if either bound is NaN.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        if min.is_nan() || max.is_nan() {
            return FloatRange::FULL;
        }
        Self { min, max }
    }

    #[must_use]
    pub fn singleton(value: f64) -> Self {
        Self::new(value, value)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.min == f64::NEG_INFINITY && self.max == f64::INFINITY
    }

    #[must_use]
    pub fn contains(&self, other: &FloatRange) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    #[must_use]
    pub fn hull(&self, other: &FloatRange) -> FloatRange {
        FloatRange::new(self.min.min(other.min), self.max.max(other.max))
    }

    #[must_use]
    pub fn add(&self, other: &FloatRange) -> FloatRange {
        FloatRange::new(self.min + other.min, self.max + other.max)
    }

    #[must_use]
    pub fn sub(&self, other: &FloatRange) -> FloatRange {
        FloatRange::new(self.min - other.max, self.max - other.min)
    }

    #[must_use]
    pub fn mul(&self, other: &FloatRange) -> FloatRange {
        let corners = [
            self.min * other.min,
            self.min * other.max,
            self.max * other.min,
            self.max * other.max,
        ];
        if corners.iter().any(|corner| corner.is_nan()) {
            return FloatRange::FULL;
        }
        let min = corners.iter().copied().fold(f64::INFINITY, f64::min);
        let max = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        FloatRange::new(min, max)
    }

    #[must_use]
    pub fn neg(&self) -> FloatRange {
        FloatRange::new(-self.max, -self.min)
    }
}

impl fmt::Display for FloatRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_full() {
            write!(f, "Float")
        } else {
            write!(f, "Float[{:?}, {:?}]", self.min, self.max)
        }
    }
}
