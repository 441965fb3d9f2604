// Copyright 2025 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! A set of non-overlapping inclusive ranges of unsigned integers.
//!
//! Ranges are inclusive on both ends so that a range may end at `T::max_value()`,
//! e.g. the last port `65535` or the last IPv6 address.

use num_traits::{ConstOne, PrimInt, Unsigned};
use serde::{Deserialize, Serialize};

/// A set of non-overlapping, non-adjacent ranges, sorted by start.
#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
pub struct RangeSet<T: PrimInt + ConstOne + Unsigned> {
    ranges: Vec<Range<T>>,
}

impl<T: PrimInt + ConstOne + Unsigned> RangeSet<T> {
    /// Builds the union of arbitrary ranges. Overlapping and adjacent ranges are merged.
    pub fn union<I: IntoIterator<Item = Range<T>>>(ranges: I) -> Self {
        let mut ranges: Vec<Range<T>> = ranges.into_iter().collect();
        ranges.sort_by(|a, b| a.first.cmp(&b.first).then(a.last.cmp(&b.last)));

        let mut merged: Vec<Range<T>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(prev) if prev.touches(&range) => {
                    prev.last = prev.last.max(range.last);
                }
                _ => merged.push(range),
            }
        }
        Self { ranges: merged }
    }

    /// Returns the number of values in the set, or `None` if it does not fit into `T`.
    pub fn len(&self) -> Option<T> {
        self.ranges
            .iter()
            .try_fold(T::zero(), |acc, range| acc.checked_add(&range.len()?))
    }

    /// Returns the ranges in the set.
    pub fn ranges(&self) -> &[Range<T>] {
        &self.ranges
    }
}

/// An inclusive range of unsigned integers.
#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone, Copy)]
pub struct Range<T: PrimInt + ConstOne + Unsigned> {
    /// First value of the range.
    pub first: T,
    /// Last value of the range.
    pub last: T,
}

impl<T: PrimInt + ConstOne + Unsigned> Range<T> {
    /// Creates a new range.
    pub fn new(first: T, last: T) -> Self {
        Self { first, last }
    }

    /// Return the number of values in the range, or `None` if it does not fit into `T`.
    pub fn len(&self) -> Option<T> {
        (self.last - self.first).checked_add(&T::ONE)
    }

    /// True if `other` starts no later than one past the end of this range.
    /// Assumes `self.first <= other.first`.
    fn touches(&self, other: &Range<T>) -> bool {
        other.first <= self.last || self.last.checked_add(&T::ONE) == Some(other.first)
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn check_rangeset_invariants<T: PrimInt + ConstOne + Unsigned + std::fmt::Debug>(
        rangeset: &RangeSet<T>,
    ) {
        let ranges = rangeset.ranges();
        for range in ranges {
            assert!(range.first <= range.last, "Invalid range: {range:?}");
        }
        for i in 1..ranges.len() {
            assert!(
                ranges[i - 1].last < ranges[i].first,
                "Ranges not ordered or overlapping: {:?} and {:?}",
                ranges[i - 1],
                ranges[i]
            );
            assert!(
                ranges[i - 1].last + T::ONE < ranges[i].first,
                "Adjacent ranges not merged: {:?} and {:?}",
                ranges[i - 1],
                ranges[i]
            );
        }
    }

    fn covers<T: PrimInt + ConstOne + Unsigned>(ranges: &[Range<T>], value: T) -> bool {
        ranges.iter().any(|r| r.first <= value && value <= r.last)
    }

    #[test]
    fn test_union_merges_overlapping_and_adjacent() {
        let set = RangeSet::union(vec![
            Range::new(10u32, 14),
            Range::new(1, 4),
            Range::new(5, 6),
            Range::new(12, 20),
            Range::new(30, 30),
        ]);
        check_rangeset_invariants(&set);
        assert_eq!(
            set.ranges(),
            &[Range::new(1, 6), Range::new(10, 20), Range::new(30, 30)]
        );
        assert_eq!(set.len(), Some(6 + 11 + 1));
    }

    #[test]
    fn test_union_at_type_boundaries() {
        let set = RangeSet::union(vec![Range::new(u16::MAX - 1, u16::MAX), Range::new(0, 0)]);
        check_rangeset_invariants(&set);
        assert_eq!(
            set.ranges(),
            &[Range::new(0, 0), Range::new(u16::MAX - 1, u16::MAX)]
        );
        assert_eq!(set.len(), Some(3));

        let full = RangeSet::union(vec![Range::new(0u128, u128::MAX)]);
        assert_eq!(full.len(), None);
        assert_eq!(Range::new(0u128, u128::MAX - 1).len(), Some(u128::MAX));
    }

    #[test]
    fn test_empty_union() {
        let set = RangeSet::<u16>::union(Vec::new());
        assert!(set.ranges().is_empty());
        assert_eq!(set.len(), Some(0));
    }

    #[test]
    fn test_random_union_matches_membership() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..50 {
            let ranges: Vec<Range<u16>> = (0..20)
                .map(|_| {
                    let first = rng.random_range(0..1000u16);
                    Range::new(first, first + rng.random_range(0..20u16))
                })
                .collect();
            let set = RangeSet::union(ranges.clone());
            check_rangeset_invariants(&set);

            let mut count = 0u16;
            for value in 0..1100u16 {
                let expected = covers(&ranges, value);
                assert_eq!(covers(set.ranges(), value), expected, "value {value}");
                count += u16::from(expected);
            }
            assert_eq!(set.len(), Some(count));
        }
    }
}
