use fxhash::FxHashSet;

use crate::problem::eval::Eval;
use crate::problem::job::Priority;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::tw_route::TwRoute;

/// Per-solution precomputed tables, rebuilt per route after any mutation.
/// Everything here is recomputable from the route sequences; operators
/// read it, the driver maintains it.
pub struct SolutionState {
    /// `fwd_costs[v][v2][r]`: sum of the job-to-job edge evals of route
    /// `v` from rank 0 up to rank `r`, using vehicle `v2`'s profile.
    pub fwd_costs: Vec<Vec<Vec<Eval>>>,
    /// Same edges summed in the reverse direction (edge `r -> r-1`).
    pub bwd_costs: Vec<Vec<Vec<Eval>>>,

    /// `fwd_skill_rank[v][v2]`: length of the longest prefix of route `v`
    /// whose jobs are all skill-compatible with vehicle `v2`.
    pub fwd_skill_rank: Vec<Vec<usize>>,
    /// `bwd_skill_rank[v][v2]`: smallest rank such that every job from it
    /// to the end of route `v` is skill-compatible with vehicle `v2`.
    pub bwd_skill_rank: Vec<Vec<usize>>,

    /// Eval saved by removing the single job at a rank.
    pub node_gains: Vec<Vec<Eval>>,
    pub node_candidates: Vec<Option<usize>>,
    /// Eval saved by removing the pair at (rank, rank + 1).
    pub edge_gains: Vec<Vec<Eval>>,
    pub edge_candidates: Vec<Option<usize>>,
    /// Eval saved by removing a pickup and its matching delivery
    /// together, keyed by pickup rank (NO_EVAL elsewhere).
    pub pd_gains: Vec<Vec<Eval>>,

    /// Dense rank-keyed matching tables.
    pub matching_delivery_rank: Vec<Vec<Option<usize>>>,
    pub matching_pickup_rank: Vec<Vec<Option<usize>>>,

    /// Priority prefix/suffix sums, inclusive of their rank.
    pub fwd_priority: Vec<Vec<Priority>>,
    pub bwd_priority: Vec<Vec<Priority>>,

    /// Total route evals, including fixed cost for non-empty routes.
    pub route_evals: Vec<Eval>,

    pub unassigned: FxHashSet<usize>,
}

impl SolutionState {
    pub fn new(problem: &VehicleRoutingProblem) -> Self {
        let nb_vehicles = problem.nb_vehicles();

        SolutionState {
            fwd_costs: vec![vec![Vec::new(); nb_vehicles]; nb_vehicles],
            bwd_costs: vec![vec![Vec::new(); nb_vehicles]; nb_vehicles],
            fwd_skill_rank: vec![vec![0; nb_vehicles]; nb_vehicles],
            bwd_skill_rank: vec![vec![0; nb_vehicles]; nb_vehicles],
            node_gains: vec![Vec::new(); nb_vehicles],
            node_candidates: vec![None; nb_vehicles],
            edge_gains: vec![Vec::new(); nb_vehicles],
            edge_candidates: vec![None; nb_vehicles],
            pd_gains: vec![Vec::new(); nb_vehicles],
            matching_delivery_rank: vec![Vec::new(); nb_vehicles],
            matching_pickup_rank: vec![Vec::new(); nb_vehicles],
            fwd_priority: vec![Vec::new(); nb_vehicles],
            bwd_priority: vec![Vec::new(); nb_vehicles],
            route_evals: vec![Eval::ZERO; nb_vehicles],
            unassigned: (0..problem.nb_jobs()).collect(),
        }
    }

    pub fn setup(&mut self, problem: &VehicleRoutingProblem, routes: &[TwRoute]) {
        for (v, route) in routes.iter().enumerate() {
            self.update_route(problem, v, route);
        }
    }

    /// Rebuilds every cached table for one route.
    pub fn update_route(&mut self, problem: &VehicleRoutingProblem, v: usize, route: &TwRoute) {
        self.update_costs(problem, v, route);
        self.update_skills(problem, v, route);
        self.update_priorities(problem, v, route);
        self.set_node_gains(problem, v, route);
        self.set_edge_gains(problem, v, route);
        self.set_pd_matching(problem, v, route);
        self.route_evals[v] = Self::route_eval_from_scratch(problem, v, route);
    }

    fn update_costs(&mut self, problem: &VehicleRoutingProblem, v: usize, route: &TwRoute) {
        let n = route.len();
        for v2 in 0..problem.nb_vehicles() {
            let fwd = &mut self.fwd_costs[v][v2];
            let bwd = &mut self.bwd_costs[v][v2];
            fwd.resize(n, Eval::ZERO);
            bwd.resize(n, Eval::ZERO);

            let mut fwd_sum = Eval::ZERO;
            let mut bwd_sum = Eval::ZERO;
            for i in 0..n {
                if i > 0 {
                    let from = problem.job_index(route.job_at(i - 1));
                    let to = problem.job_index(route.job_at(i));
                    fwd_sum += problem.eval(v2, from, to);
                    bwd_sum += problem.eval(v2, to, from);
                }
                fwd[i] = fwd_sum;
                bwd[i] = bwd_sum;
            }
        }
    }

    fn update_skills(&mut self, problem: &VehicleRoutingProblem, v: usize, route: &TwRoute) {
        let n = route.len();
        for v2 in 0..problem.nb_vehicles() {
            let mut fwd = 0;
            while fwd < n && problem.vehicle_ok_with_job(v2, route.job_at(fwd)) {
                fwd += 1;
            }
            self.fwd_skill_rank[v][v2] = fwd;

            let mut bwd = n;
            while bwd > 0 && problem.vehicle_ok_with_job(v2, route.job_at(bwd - 1)) {
                bwd -= 1;
            }
            self.bwd_skill_rank[v][v2] = bwd;
        }
    }

    fn update_priorities(&mut self, problem: &VehicleRoutingProblem, v: usize, route: &TwRoute) {
        let n = route.len();
        let fwd = &mut self.fwd_priority[v];
        let bwd = &mut self.bwd_priority[v];
        fwd.resize(n, 0);
        bwd.resize(n, 0);

        let mut sum = 0;
        for i in 0..n {
            sum += problem.job(route.job_at(i)).priority();
            fwd[i] = sum;
        }
        sum = 0;
        for i in (0..n).rev() {
            sum += problem.job(route.job_at(i)).priority();
            bwd[i] = sum;
        }
    }

    /// Eval around a rank: the two legs it sits on minus the shortcut
    /// bypassing it.
    fn gain_for_removal(
        problem: &VehicleRoutingProblem,
        v: usize,
        route: &TwRoute,
        first_rank: usize,
        last_rank: usize,
    ) -> Eval {
        let before = if first_rank > 0 {
            Some(problem.job_index(route.job_at(first_rank - 1)))
        } else {
            problem.vehicle_start_index(v)
        };
        let after = if last_rank < route.len() {
            Some(problem.job_index(route.job_at(last_rank)))
        } else {
            problem.vehicle_end_index(v)
        };

        let first = problem.job_index(route.job_at(first_rank));
        let last = problem.job_index(route.job_at(last_rank - 1));

        let mut removed = Eval::ZERO;
        if let Some(b) = before {
            removed += problem.eval(v, b, first);
        }
        if let Some(a) = after {
            removed += problem.eval(v, last, a);
        }
        for i in first_rank..last_rank - 1 {
            removed += problem.eval(
                v,
                problem.job_index(route.job_at(i)),
                problem.job_index(route.job_at(i + 1)),
            );
        }

        let shortcut = match (before, after) {
            (Some(b), Some(a)) => problem.eval(v, b, a),
            _ => Eval::ZERO,
        };

        removed - shortcut
    }

    fn set_node_gains(&mut self, problem: &VehicleRoutingProblem, v: usize, route: &TwRoute) {
        let n = route.len();
        let gains = &mut self.node_gains[v];
        gains.resize(n, Eval::ZERO);

        let mut best: Option<usize> = None;
        for rank in 0..n {
            let gain = Self::gain_for_removal(problem, v, route, rank, rank + 1);
            gains[rank] = gain;
            if best.is_none_or(|b| gains[b] < gain) {
                best = Some(rank);
            }
        }
        self.node_candidates[v] = best;
    }

    fn set_edge_gains(&mut self, problem: &VehicleRoutingProblem, v: usize, route: &TwRoute) {
        let n = route.len();
        let len = n.saturating_sub(1);
        let gains = &mut self.edge_gains[v];
        gains.resize(len, Eval::ZERO);

        let mut best: Option<usize> = None;
        for rank in 0..len {
            let gain = Self::gain_for_removal(problem, v, route, rank, rank + 2);
            gains[rank] = gain;
            if best.is_none_or(|b| gains[b] < gain) {
                best = Some(rank);
            }
        }
        self.edge_candidates[v] = best;
    }

    fn set_pd_matching(&mut self, problem: &VehicleRoutingProblem, v: usize, route: &TwRoute) {
        let n = route.len();
        let matching_delivery = &mut self.matching_delivery_rank[v];
        let matching_pickup = &mut self.matching_pickup_rank[v];
        matching_delivery.clear();
        matching_delivery.resize(n, None);
        matching_pickup.clear();
        matching_pickup.resize(n, None);

        for rank in 0..n {
            let job_rank = route.job_at(rank);
            if problem.job(job_rank).is_pickup() {
                let delivery_job = problem.matching_delivery(job_rank);
                let delivery_rank = (rank + 1..n)
                    .find(|&r| route.job_at(r) == delivery_job)
                    .expect("pickup in route without its delivery");
                matching_delivery[rank] = Some(delivery_rank);
                matching_pickup[delivery_rank] = Some(rank);
            }
        }

        let gains = &mut self.pd_gains[v];
        gains.clear();
        gains.resize(n, Eval::NO_EVAL);
        for rank in 0..n {
            let Some(delivery_rank) = self.matching_delivery_rank[v][rank] else {
                continue;
            };
            let gain = if delivery_rank == rank + 1 {
                Self::gain_for_removal(problem, v, route, rank, rank + 2)
            } else {
                Self::gain_for_removal(problem, v, route, rank, rank + 1)
                    + Self::gain_for_removal(problem, v, route, delivery_rank, delivery_rank + 1)
            };
            self.pd_gains[v][rank] = gain;
        }
    }

    /// Route eval recomputed by walking the sequence, fixed cost included
    /// for non-empty routes. The cached `route_evals` must always agree
    /// with this.
    pub fn route_eval_from_scratch(
        problem: &VehicleRoutingProblem,
        v: usize,
        route: &TwRoute,
    ) -> Eval {
        if route.is_empty() {
            return Eval::ZERO;
        }

        let mut eval = Eval::cost_only(problem.vehicle(v).fixed_cost());

        let first = problem.job_index(route.job_at(0));
        let last = problem.job_index(route.job_at(route.len() - 1));
        if let Some(start) = problem.vehicle_start_index(v) {
            eval += problem.eval(v, start, first);
        }
        if let Some(end) = problem.vehicle_end_index(v) {
            eval += problem.eval(v, last, end);
        }
        for i in 1..route.len() {
            eval += problem.eval(
                v,
                problem.job_index(route.job_at(i - 1)),
                problem.job_index(route.job_at(i)),
            );
        }

        eval
    }

    pub fn priority_sum_of(&self, v: usize) -> Priority {
        self.fwd_priority[v].last().copied().unwrap_or(0)
    }

    /// Full consistency recompute-and-compare, used in debug builds after
    /// each local-search step to catch operators that forget to list a
    /// touched vehicle in their update candidates.
    pub fn assert_consistent(&self, problem: &VehicleRoutingProblem, routes: &[TwRoute]) {
        for (v, route) in routes.iter().enumerate() {
            debug_assert_eq!(
                self.route_evals[v],
                Self::route_eval_from_scratch(problem, v, route),
                "stale route eval for vehicle {v}"
            );
            debug_assert_eq!(
                self.node_gains[v].len(),
                route.len(),
                "stale node gains for vehicle {v}"
            );
        }

        let mut seen = FxHashSet::default();
        for route in routes {
            for rank in 0..route.len() {
                let job = route.job_at(rank);
                debug_assert!(seen.insert(job), "job {job} present twice");
                debug_assert!(
                    !self.unassigned.contains(&job),
                    "job {job} both assigned and unassigned"
                );
            }
        }
        debug_assert_eq!(
            seen.len() + self.unassigned.len(),
            problem.nb_jobs(),
            "jobs lost between routes and the unassigned set"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_state_tables_for_simple_route() {
        let problem = test_utils::line_problem(4);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![0, 1, 2, 3]);

        let mut state = SolutionState::new(&problem);
        state.setup(&problem, &routes);

        // Edges are 100 apart on the line.
        assert_eq!(state.fwd_costs[0][0][0], Eval::ZERO);
        assert_eq!(state.fwd_costs[0][0][3].cost, 300);
        assert_eq!(state.bwd_costs[0][0][3].cost, 300);

        // Removing an interior job saves two 100-edges minus a 200
        // shortcut.
        assert_eq!(state.node_gains[0][1].cost, 0);
        // Removing the last job saves the 100 edge in plus 400 back out,
        // minus the 300 shortcut.
        assert_eq!(state.node_gains[0][3].cost, 200);
        assert_eq!(state.node_candidates[0], Some(3));

        assert_eq!(state.route_evals[0].cost, 800);
        state.assert_consistent(&problem, &routes);
    }

    #[test]
    fn test_priority_and_skill_ranks() {
        let problem = test_utils::problem_with_skills_and_priorities();
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![0, 1]);

        let mut state = SolutionState::new(&problem);
        state.unassigned.remove(&0);
        state.unassigned.remove(&1);
        state.setup(&problem, &routes);

        assert_eq!(state.fwd_priority[0], vec![1, 4]);
        assert_eq!(state.bwd_priority[0], vec![4, 3]);

        // Vehicle 1 lacks the skill required by job 1.
        assert_eq!(state.fwd_skill_rank[0][1], 1);
        assert_eq!(state.bwd_skill_rank[0][1], 2);
        // Vehicle 0 can take everything.
        assert_eq!(state.fwd_skill_rank[0][0], 2);
        assert_eq!(state.bwd_skill_rank[0][0], 0);
    }

    #[test]
    fn test_pd_matching_ranks() {
        let problem = test_utils::shipment_problem();
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![0, 2, 1]);

        let mut state = SolutionState::new(&problem);
        state.setup(&problem, &routes);

        assert_eq!(state.matching_delivery_rank[0][0], Some(2));
        assert_eq!(state.matching_pickup_rank[0][2], Some(0));
        assert_eq!(state.matching_delivery_rank[0][1], None);
        assert!(state.pd_gains[0][0] != Eval::NO_EVAL);
        assert!(state.pd_gains[0][1] == Eval::NO_EVAL);
    }
}
