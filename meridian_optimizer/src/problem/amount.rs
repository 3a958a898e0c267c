use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Index, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

type Vector = SmallVec<[i64; 2]>;

/// Multi-dimensional integer demand/capacity vector. All amounts of a
/// given problem share the same dimension; a missing component reads as
/// zero so partially sized vectors stay harmless in arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount(Vector);

impl Amount {
    pub const EMPTY: Amount = Amount(Vector::new_const());

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn zeros(dimension: usize) -> Self {
        Amount(SmallVec::from_elem(0, dimension))
    }

    pub fn from_vec(values: Vec<i64>) -> Self {
        Amount(SmallVec::from_vec(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> i64 {
        self.0.get(index).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    pub fn resize(&mut self, dimension: usize) {
        self.0.resize(dimension, 0);
    }

    pub fn reset(&mut self) {
        self.0.fill(0);
    }

    /// Copies the values of `other` into self.
    pub fn update(&mut self, other: &Amount) {
        self.0.resize(other.0.len(), 0);
        self.0.copy_from_slice(&other.0);
    }

    /// Componentwise maximum, in place.
    pub fn update_max(&mut self, other: &Amount) {
        if self.0.len() < other.0.len() {
            self.0.resize(other.0.len(), 0);
        }
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a = (*a).max(*b);
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }

    /// Pointwise `self <= capacity`.
    pub fn fits_in(&self, capacity: &Amount) -> bool {
        let dimension = self.len().max(capacity.len());
        (0..dimension).all(|i| self.get(i) <= capacity.get(i))
    }

    /// Lexicographic comparison, used where a total order over amounts is
    /// needed (e.g. seeding by highest amount).
    pub fn lex_cmp(&self, other: &Amount) -> Ordering {
        let dimension = self.len().max(other.len());
        for i in 0..dimension {
            match self.get(i).cmp(&other.get(i)) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        Ordering::Equal
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Index<usize> for Amount {
    type Output = i64;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        if self.0.len() < rhs.0.len() {
            self.0.resize(rhs.0.len(), 0);
        }
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a += *b;
        }
    }
}

impl SubAssign<&Amount> for Amount {
    fn sub_assign(&mut self, rhs: &Amount) {
        if self.0.len() < rhs.0.len() {
            self.0.resize(rhs.0.len(), 0);
        }
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a -= *b;
        }
    }
}

impl Add<&Amount> for &Amount {
    type Output = Amount;

    fn add(self, rhs: &Amount) -> Amount {
        let mut result = self.clone();
        result += rhs;
        result
    }
}

impl Sub<&Amount> for &Amount {
    type Output = Amount;

    fn sub(self, rhs: &Amount) -> Amount {
        let mut result = self.clone();
        result -= rhs;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assign_with_shorter_lhs() {
        let mut a = Amount::from_vec(vec![10, 20]);
        let b = Amount::from_vec(vec![5, 15, 25]);

        a += &b;

        assert_eq!(a.get(0), 15);
        assert_eq!(a.get(1), 35);
        assert_eq!(a.get(2), 25);
    }

    #[test]
    fn test_sub_assign() {
        let mut a = Amount::from_vec(vec![10, 20, 30]);
        let b = Amount::from_vec(vec![5, 15]);

        a -= &b;

        assert_eq!(a, Amount::from_vec(vec![5, 5, 30]));
    }

    #[test]
    fn test_fits_in() {
        let load = Amount::from_vec(vec![10, 20]);
        let capacity = Amount::from_vec(vec![10, 25]);
        let too_small = Amount::from_vec(vec![9, 25]);

        assert!(load.fits_in(&capacity));
        assert!(!load.fits_in(&too_small));
    }

    #[test]
    fn test_lex_cmp() {
        let a = Amount::from_vec(vec![10, 20]);
        let b = Amount::from_vec(vec![10, 21]);

        assert_eq!(a.lex_cmp(&b), Ordering::Less);
        assert_eq!(b.lex_cmp(&a), Ordering::Greater);
        assert_eq!(a.lex_cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_update_max() {
        let mut a = Amount::from_vec(vec![10, 20]);
        a.update_max(&Amount::from_vec(vec![5, 30, 2]));

        assert_eq!(a, Amount::from_vec(vec![10, 30, 2]));
    }
}
