//! Distance functions: finitely supported maps from signed distance to count.
//!
//! A [`DistanceFunction`] is stored as an integer `offset` plus a dense
//! coefficient vector, so `counts[k]` is the number of reconciliations at
//! distance `offset + k`. Everything outside `[offset, max_index]` is zero.
//!
//! All combinators return fresh values. Tables produced by the inside pass
//! are read again by the outside pass, so nothing here mutates a receiver.

use num::{BigUint, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Function from ℤ to ℕ with finite support, indexed by signed distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DistanceFunctionRepr", into = "DistanceFunctionRepr")]
pub struct DistanceFunction {
    /// Distance mapped to `counts[0]`.
    offset: i64,
    counts: Vec<BigUint>,
    /// Last distance with a stored coefficient; `offset - 1` when empty.
    max_index: i64,
}

/// Unit impulse: value 1 at `index`, zero elsewhere.
pub fn kronicker(index: i64) -> DistanceFunction {
    DistanceFunction::from_parts(index, vec![BigUint::from(1u32)])
}

impl DistanceFunction {
    /// The identically-zero function.
    pub fn zero() -> Self {
        Self::from_parts(0, Vec::new())
    }

    /// Build from an offset and the counts at `offset, offset + 1, ...`.
    pub fn from_counts<I, C>(offset: i64, counts: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<BigUint>,
    {
        Self::from_parts(offset, counts.into_iter().map(Into::into).collect())
    }

    fn from_parts(offset: i64, counts: Vec<BigUint>) -> Self {
        let mut f = Self {
            offset,
            counts,
            max_index: 0,
        };
        f.reset_max_index();
        f
    }

    fn reset_max_index(&mut self) {
        self.max_index = self.offset + self.counts.len() as i64 - 1;
    }

    /// Smallest distance with a stored coefficient.
    pub fn min_index(&self) -> i64 {
        self.offset
    }

    /// Largest distance with a stored coefficient (`min_index() - 1` if empty).
    pub fn max_index(&self) -> i64 {
        self.max_index
    }

    /// True if no coefficients are stored.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count at distance `index`; zero outside the stored support.
    ///
    /// # Panics
    ///
    /// Panics if the recorded maximum index disagrees with the stored
    /// coefficient vector. That can only follow from a bug in this module.
    pub fn evaluate(&self, index: i64) -> BigUint {
        if index < self.offset || index > self.max_index {
            return BigUint::zero();
        }
        let slot = (index - self.offset) as usize;
        assert!(
            slot < self.counts.len(),
            "distance function bookkeeping corrupted: index {} within [{}, {}] but only {} coefficients",
            index,
            self.offset,
            self.max_index,
            self.counts.len()
        );
        self.counts[slot].clone()
    }

    /// Translate the function by `amount`: `g(i) = f(i - amount)`.
    pub fn shift(&self, amount: i64) -> Self {
        Self::from_parts(self.offset + amount, self.counts.clone())
    }

    /// Discrete convolution (polynomial product).
    ///
    /// The joint distance of two independent substructures is the sum of
    /// their distances, and their counts multiply.
    pub fn convolve(&self, other: &Self) -> Self {
        let offset = self.offset + other.offset;
        if self.is_empty() || other.is_empty() {
            return Self::from_parts(offset, Vec::new());
        }

        let mut counts = vec![BigUint::zero(); self.counts.len() + other.counts.len() - 1];
        for (i, a) in self.counts.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.counts.iter().enumerate() {
                counts[i + j] += a * b;
            }
        }
        Self::from_parts(offset, counts)
    }

    /// Pointwise sum over the union of both supports, zero-filling gaps.
    pub fn sum(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }

        let offset = self.offset.min(other.offset);
        let max_index = self.max_index.max(other.max_index);
        let counts = (offset..=max_index)
            .map(|i| self.evaluate(i) + other.evaluate(i))
            .collect();
        Self::from_parts(offset, counts)
    }

    /// Sum of every coefficient: the number of reconciliations tallied.
    pub fn total(&self) -> BigUint {
        self.counts.iter().sum()
    }

    /// Iterate `(distance, count)` over the stored support, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &BigUint)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(move |(k, c)| (self.offset + k as i64, c))
    }
}

impl Default for DistanceFunction {
    fn default() -> Self {
        Self::zero()
    }
}

// Equality is on the function, not the storage: zero padding is ignored.
impl PartialEq for DistanceFunction {
    fn eq(&self, other: &Self) -> bool {
        let lo = self.offset.min(other.offset);
        let hi = self.max_index.max(other.max_index);
        (lo..=hi).all(|i| self.evaluate(i) == other.evaluate(i))
    }
}

impl Eq for DistanceFunction {}

impl fmt::Display for DistanceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, (index, count)) in self.iter().enumerate() {
            if k > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", index, count)?;
        }
        Ok(())
    }
}

/// Wire form: counts as decimal strings so they survive any JSON reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DistanceFunctionRepr {
    offset: i64,
    counts: Vec<String>,
}

impl From<DistanceFunction> for DistanceFunctionRepr {
    fn from(f: DistanceFunction) -> Self {
        Self {
            offset: f.offset,
            counts: f.counts.iter().map(|c| c.to_str_radix(10)).collect(),
        }
    }
}

impl TryFrom<DistanceFunctionRepr> for DistanceFunction {
    type Error = String;

    fn try_from(repr: DistanceFunctionRepr) -> Result<Self, Self::Error> {
        let counts = repr
            .counts
            .iter()
            .map(|s| {
                BigUint::parse_bytes(s.as_bytes(), 10)
                    .ok_or_else(|| format!("invalid count {:?}", s))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_parts(repr.offset, counts))
    }
}
