use crate::problem::amount::Amount;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

/// Ordered job sequence for one vehicle, with the cached load profile that
/// makes capacity checks O(1).
///
/// `current_loads[s]` is the load carried on step `s`: step 0 is before
/// the first job, step `n` after the last one. Serving the job at rank `r`
/// turns step `r` into step `r + 1` by subtracting its delivery and adding
/// its pickup. `fwd_peaks[s]` / `bwd_peaks[s]` are the componentwise
/// maxima of `current_loads` over `0..=s` / `s..=n`.
#[derive(Clone)]
pub struct RawRoute {
    pub vehicle_rank: usize,
    pub route: Vec<usize>,

    current_loads: Vec<Amount>,
    fwd_peaks: Vec<Amount>,
    bwd_peaks: Vec<Amount>,

    // Prefix sums over job deliveries/pickups, inclusive of their rank.
    fwd_deliveries: Vec<Amount>,
    fwd_pickups: Vec<Amount>,
}

impl RawRoute {
    pub fn new(problem: &VehicleRoutingProblem, vehicle_rank: usize) -> Self {
        let mut route = RawRoute {
            vehicle_rank,
            route: Vec::new(),
            current_loads: Vec::new(),
            fwd_peaks: Vec::new(),
            bwd_peaks: Vec::new(),
            fwd_deliveries: Vec::new(),
            fwd_pickups: Vec::new(),
        };
        route.update_amounts(problem);
        route
    }

    pub fn len(&self) -> usize {
        self.route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }

    pub fn job_at(&self, rank: usize) -> usize {
        self.route[rank]
    }

    pub fn has_start(&self, problem: &VehicleRoutingProblem) -> bool {
        problem.vehicle(self.vehicle_rank).start_location_id().is_some()
    }

    pub fn has_end(&self, problem: &VehicleRoutingProblem) -> bool {
        problem.vehicle(self.vehicle_rank).end_location_id().is_some()
    }

    pub fn load_at_step(&self, step: usize) -> &Amount {
        &self.current_loads[step]
    }

    pub fn max_load(&self) -> &Amount {
        &self.fwd_peaks[self.len()]
    }

    pub fn fwd_peak(&self, step: usize) -> &Amount {
        &self.fwd_peaks[step]
    }

    pub fn bwd_peak(&self, step: usize) -> &Amount {
        &self.bwd_peaks[step]
    }

    /// Total delivery amount over ranks `[first, last)`.
    pub fn delivery_in_range(&self, first: usize, last: usize) -> Amount {
        if first >= last {
            return self.fwd_deliveries.first().map_or(Amount::EMPTY, |a| {
                let mut zero = a.clone();
                zero.reset();
                zero
            });
        }
        let up_to_last = &self.fwd_deliveries[last - 1];
        if first == 0 {
            up_to_last.clone()
        } else {
            up_to_last - &self.fwd_deliveries[first - 1]
        }
    }

    /// Total pickup amount over ranks `[first, last)`.
    pub fn pickup_in_range(&self, first: usize, last: usize) -> Amount {
        if first >= last {
            return self.fwd_pickups.first().map_or(Amount::EMPTY, |a| {
                let mut zero = a.clone();
                zero.reset();
                zero
            });
        }
        let up_to_last = &self.fwd_pickups[last - 1];
        if first == 0 {
            up_to_last.clone()
        } else {
            up_to_last - &self.fwd_pickups[first - 1]
        }
    }

    /// Full load-profile recompute; every mutation goes through here so a
    /// route is never observable with stale amounts.
    pub fn update_amounts(&mut self, problem: &VehicleRoutingProblem) {
        let n = self.len();
        let zero = problem.zero_amount();

        self.fwd_deliveries.resize_with(n, || zero.clone());
        self.fwd_pickups.resize_with(n, || zero.clone());
        self.current_loads.resize_with(n + 1, || zero.clone());
        self.fwd_peaks.resize_with(n + 1, || zero.clone());
        self.bwd_peaks.resize_with(n + 1, || zero.clone());

        let mut deliveries = zero.clone();
        let mut pickups = zero.clone();
        for (i, &job_rank) in self.route.iter().enumerate() {
            let job = problem.job(job_rank);
            deliveries += job.delivery();
            pickups += job.pickup();
            self.fwd_deliveries[i].update(&deliveries);
            self.fwd_pickups[i].update(&pickups);
        }

        // Everything to deliver is on board when the route starts.
        self.current_loads[0].update(&deliveries);
        for (i, &job_rank) in self.route.iter().enumerate() {
            let job = problem.job(job_rank);
            let mut load = self.current_loads[i].clone();
            load -= job.delivery();
            load += job.pickup();
            self.current_loads[i + 1].update(&load);
        }

        let mut peak = self.current_loads[0].clone();
        self.fwd_peaks[0].update(&peak);
        for i in 1..=n {
            peak.update_max(&self.current_loads[i]);
            self.fwd_peaks[i].update(&peak);
        }

        peak.update(&self.current_loads[n]);
        self.bwd_peaks[n].update(&peak);
        for i in (0..n).rev() {
            peak.update_max(&self.current_loads[i]);
            self.bwd_peaks[i].update(&peak);
        }
    }

    pub fn set_route(&mut self, problem: &VehicleRoutingProblem, jobs: Vec<usize>) {
        self.route = jobs;
        self.update_amounts(problem);
    }

    pub fn insert(&mut self, problem: &VehicleRoutingProblem, job_rank: usize, rank: usize) {
        self.route.insert(rank, job_rank);
        self.update_amounts(problem);
    }

    pub fn remove(&mut self, problem: &VehicleRoutingProblem, rank: usize, count: usize) {
        self.route.drain(rank..rank + count);
        self.update_amounts(problem);
    }

    /// Replaces ranks `[first_rank, last_rank)` with the given jobs.
    pub fn replace(
        &mut self,
        problem: &VehicleRoutingProblem,
        jobs: impl Iterator<Item = usize>,
        first_rank: usize,
        last_rank: usize,
    ) {
        self.route.splice(first_rank..last_rank, jobs);
        self.update_amounts(problem);
    }

    /// O(1) check for inserting one job with the given pickup and
    /// delivery amounts at `rank`: the delivery raises every load before
    /// the insertion point, the pickup every load after it.
    pub fn is_valid_addition_for_capacity(
        &self,
        problem: &VehicleRoutingProblem,
        pickup: &Amount,
        delivery: &Amount,
        rank: usize,
    ) -> bool {
        let capacity = problem.vehicle(self.vehicle_rank).capacity();

        (&self.fwd_peaks[rank] + delivery).fits_in(capacity)
            && (&self.bwd_peaks[rank] + pickup).fits_in(capacity)
    }

    /// Aggregate check for replacing ranks `[first_rank, last_rank)` with
    /// a slice of total `pickup`/`delivery`. Exact on both sides of the
    /// replaced range; the interior of the inserted slice needs the
    /// `_inclusion` variant.
    pub fn is_valid_addition_for_capacity_margins(
        &self,
        problem: &VehicleRoutingProblem,
        pickup: &Amount,
        delivery: &Amount,
        first_rank: usize,
        last_rank: usize,
    ) -> bool {
        debug_assert!(first_rank <= last_rank && last_rank <= self.len());
        let capacity = problem.vehicle(self.vehicle_rank).capacity();

        let removed_deliveries = self.delivery_in_range(first_rank, last_rank);
        let removed_pickups = self.pickup_in_range(first_rank, last_rank);

        (&(&self.fwd_peaks[first_rank] - &removed_deliveries) + delivery).fits_in(capacity)
            && (&(&self.bwd_peaks[last_rank] - &removed_pickups) + pickup).fits_in(capacity)
    }

    /// Exact check for replacing ranks `[first_rank, last_rank)` with the
    /// given jobs: walks the whole modified load profile. `delivery` is
    /// the total delivery amount of the inserted jobs.
    pub fn is_valid_addition_for_capacity_inclusion(
        &self,
        problem: &VehicleRoutingProblem,
        delivery: &Amount,
        jobs: impl Iterator<Item = usize> + Clone,
        first_rank: usize,
        last_rank: usize,
    ) -> bool {
        debug_assert!(first_rank <= last_rank && last_rank <= self.len());
        let capacity = problem.vehicle(self.vehicle_rank).capacity();

        let removed_deliveries = self.delivery_in_range(first_rank, last_rank);
        let mut current = &(&self.current_loads[0] - &removed_deliveries) + delivery;

        if !current.fits_in(capacity) {
            return false;
        }

        let head = self.route[..first_rank].iter().copied();
        let tail = self.route[last_rank..].iter().copied();

        for job_rank in head.chain(jobs).chain(tail) {
            let job = problem.job(job_rank);
            current -= job.delivery();
            current += job.pickup();
            if !current.fits_in(capacity) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_load_profile() {
        // j0 delivers 10, j1 delivers 20, j2 picks up 10.
        let problem = test_utils::problem_with_amounts(
            vec![(10, 0), (20, 0), (0, 10)],
            vec![40],
        );

        let mut route = RawRoute::new(&problem, 0);
        route.set_route(&problem, vec![0, 2, 1]);

        assert_eq!(route.load_at_step(0), &Amount::from_vec(vec![30]));
        assert_eq!(route.load_at_step(1), &Amount::from_vec(vec![20]));
        assert_eq!(route.load_at_step(2), &Amount::from_vec(vec![30]));
        assert_eq!(route.load_at_step(3), &Amount::from_vec(vec![10]));

        assert_eq!(route.fwd_peak(3), &Amount::from_vec(vec![30]));
        assert_eq!(route.bwd_peak(2), &Amount::from_vec(vec![30]));
        assert_eq!(route.bwd_peak(3), &Amount::from_vec(vec![10]));
        assert_eq!(route.max_load(), &Amount::from_vec(vec![30]));

        assert_eq!(route.delivery_in_range(0, 2), Amount::from_vec(vec![10]));
        assert_eq!(route.pickup_in_range(1, 3), Amount::from_vec(vec![10]));
    }

    #[test]
    fn test_is_valid_addition_for_capacity() {
        let problem = test_utils::problem_with_amounts(
            vec![(10, 0), (20, 0), (15, 0)],
            vec![30],
        );

        let mut route = RawRoute::new(&problem, 0);
        route.set_route(&problem, vec![0, 1]);

        // Start load is 30; another delivery of 15 would exceed capacity
        // at the start, wherever it is inserted.
        let delivery = Amount::from_vec(vec![15]);
        let none = Amount::from_vec(vec![0]);
        assert!(!route.is_valid_addition_for_capacity(&problem, &none, &delivery, 0));
        assert!(!route.is_valid_addition_for_capacity(&problem, &none, &delivery, 2));

        // A pickup of 15 fits at the end, where only 0 is on board, but
        // not at the start.
        let pickup = Amount::from_vec(vec![15]);
        assert!(route.is_valid_addition_for_capacity(&problem, &pickup, &none, 2));
        assert!(!route.is_valid_addition_for_capacity(&problem, &pickup, &none, 0));
    }

    #[test]
    fn test_margins_match_inclusion_on_replacement() {
        let problem = test_utils::problem_with_amounts(
            vec![(10, 0), (20, 0), (15, 0), (0, 5)],
            vec![35],
        );

        let mut route = RawRoute::new(&problem, 0);
        route.set_route(&problem, vec![0, 1, 3]);

        // Replace rank 1 (delivers 20) with job 2 (delivers 15).
        let delivery = Amount::from_vec(vec![15]);
        let pickup = Amount::from_vec(vec![0]);

        assert!(route.is_valid_addition_for_capacity_margins(
            &problem, &pickup, &delivery, 1, 2
        ));
        assert!(route.is_valid_addition_for_capacity_inclusion(
            &problem,
            &delivery,
            std::iter::once(2),
            1,
            2
        ));
    }

    #[test]
    fn test_mutations_recompute_loads() {
        let problem = test_utils::problem_with_amounts(
            vec![(10, 0), (20, 0), (15, 0)],
            vec![100],
        );

        let mut route = RawRoute::new(&problem, 0);
        route.insert(&problem, 0, 0);
        route.insert(&problem, 1, 1);
        assert_eq!(route.load_at_step(0), &Amount::from_vec(vec![30]));

        route.remove(&problem, 0, 1);
        assert_eq!(route.load_at_step(0), &Amount::from_vec(vec![20]));
        assert_eq!(route.len(), 1);

        route.replace(&problem, [0, 2].iter().copied(), 0, 1);
        assert_eq!(route.route, vec![0, 2]);
        assert_eq!(route.load_at_step(0), &Amount::from_vec(vec![25]));
    }
}
