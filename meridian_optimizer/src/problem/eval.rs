use std::cmp::Ordering;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::Serialize;

use super::travel_matrix::{Cost, Distance, Duration};

/// The incremental evaluation unit: a (cost, duration, distance) triple.
/// Cost is the primary comparison key; ties break by duration, then
/// distance. All three scalars are integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Eval {
    pub cost: Cost,
    pub duration: Duration,
    pub distance: Distance,
}

impl Eval {
    pub const ZERO: Eval = Eval {
        cost: 0,
        duration: 0,
        distance: 0,
    };

    /// Sentinel for the absence of a valid evaluation. Never fed into
    /// arithmetic; only compared against.
    pub const NO_EVAL: Eval = Eval {
        cost: Cost::MAX,
        duration: 0,
        distance: 0,
    };

    pub fn new(cost: Cost, duration: Duration, distance: Distance) -> Self {
        Eval {
            cost,
            duration,
            distance,
        }
    }

    pub fn cost_only(cost: Cost) -> Self {
        Eval {
            cost,
            duration: 0,
            distance: 0,
        }
    }

    pub fn is_no_eval(&self) -> bool {
        self.cost == Cost::MAX
    }

    pub fn is_positive(&self) -> bool {
        *self > Eval::ZERO
    }
}

impl Ord for Eval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.duration.cmp(&other.duration))
            .then_with(|| self.distance.cmp(&other.distance))
    }
}

impl PartialOrd for Eval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Eval {
    type Output = Eval;

    fn add(self, rhs: Eval) -> Eval {
        Eval {
            cost: self.cost + rhs.cost,
            duration: self.duration + rhs.duration,
            distance: self.distance + rhs.distance,
        }
    }
}

impl Sub for Eval {
    type Output = Eval;

    fn sub(self, rhs: Eval) -> Eval {
        Eval {
            cost: self.cost - rhs.cost,
            duration: self.duration - rhs.duration,
            distance: self.distance - rhs.distance,
        }
    }
}

impl Neg for Eval {
    type Output = Eval;

    fn neg(self) -> Eval {
        Eval {
            cost: -self.cost,
            duration: -self.duration,
            distance: -self.distance,
        }
    }
}

impl AddAssign for Eval {
    fn add_assign(&mut self, rhs: Eval) {
        *self = *self + rhs;
    }
}

impl SubAssign for Eval {
    fn sub_assign(&mut self, rhs: Eval) {
        *self = *self - rhs;
    }
}

impl Sum for Eval {
    fn sum<I: Iterator<Item = Eval>>(iter: I) -> Eval {
        iter.fold(Eval::ZERO, |acc, e| acc + e)
    }
}
