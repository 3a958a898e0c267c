use std::cmp::Ordering;

use serde::Serialize;

use crate::problem::eval::Eval;
use crate::problem::travel_matrix::{Cost, Duration};
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::solution_state::SolutionState;
use super::tw_route::TwRoute;

/// Lexicographic solution quality: more priority served, then more jobs
/// assigned, then less priority left unassigned, then cheaper, then fewer
/// vehicles. `Greater` means better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolutionIndicators {
    pub priority_sum: u64,
    pub assigned: usize,
    pub unassigned_priority_sum: u64,
    pub eval: Eval,
    pub nb_routes: usize,
}

impl SolutionIndicators {
    pub fn compute(
        problem: &VehicleRoutingProblem,
        routes: &[TwRoute],
        state: &SolutionState,
    ) -> Self {
        let mut priority_sum = 0u64;
        let mut assigned = 0;
        let mut eval = Eval::ZERO;
        let mut nb_routes = 0;

        for (v, route) in routes.iter().enumerate() {
            if route.is_empty() {
                continue;
            }
            nb_routes += 1;
            assigned += route.len();
            priority_sum += u64::from(state.priority_sum_of(v));
            eval += state.route_evals[v];
        }

        let unassigned_priority_sum = state
            .unassigned
            .iter()
            .map(|&j| u64::from(problem.job(j).priority()))
            .sum();

        SolutionIndicators {
            priority_sum,
            assigned,
            unassigned_priority_sum,
            eval,
            nb_routes,
        }
    }

    pub fn is_better_than(&self, other: &SolutionIndicators) -> bool {
        self.cmp(other) == Ordering::Greater
    }
}

impl Ord for SolutionIndicators {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority_sum
            .cmp(&other.priority_sum)
            .then_with(|| self.assigned.cmp(&other.assigned))
            .then_with(|| {
                other
                    .unassigned_priority_sum
                    .cmp(&self.unassigned_priority_sum)
            })
            .then_with(|| other.eval.cmp(&self.eval))
            .then_with(|| other.nb_routes.cmp(&self.nb_routes))
    }
}

impl PartialOrd for SolutionIndicators {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One vehicle's share of the final solution.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionRoute {
    pub vehicle_id: String,
    pub vehicle_rank: usize,
    pub job_ids: Vec<String>,
    pub job_ranks: Vec<usize>,
    pub eval: Eval,
    pub fixed_cost: Cost,
    pub setup: Duration,
    pub service: Duration,
    pub waiting: Duration,
    pub priority_sum: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolutionSummary {
    pub cost: Cost,
    pub duration: Duration,
    pub distance: i64,
    pub setup: Duration,
    pub service: Duration,
    pub waiting: Duration,
    pub priority_sum: u64,
    pub assigned: usize,
    pub unassigned: usize,
    pub nb_routes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub routes: Vec<SolutionRoute>,
    pub unassigned_ids: Vec<String>,
    pub unassigned_ranks: Vec<usize>,
    pub summary: SolutionSummary,
}

impl Solution {
    pub fn build(
        problem: &VehicleRoutingProblem,
        routes: &[TwRoute],
        state: &SolutionState,
    ) -> Solution {
        let mut solution_routes = Vec::new();
        let mut summary = SolutionSummary {
            cost: 0,
            duration: 0,
            distance: 0,
            setup: 0,
            service: 0,
            waiting: 0,
            priority_sum: 0,
            assigned: 0,
            unassigned: state.unassigned.len(),
            nb_routes: 0,
        };

        for (v, route) in routes.iter().enumerate() {
            if route.is_empty() {
                continue;
            }
            let vehicle = problem.vehicle(v);

            let mut setup = 0;
            let mut service = 0;
            for rank in 0..route.len() {
                let job_rank = route.job_at(rank);
                service += problem.job_service(v, job_rank);
                setup += route.action_times[rank] - problem.job_service(v, job_rank);
            }
            let waiting = route.total_waiting(problem);
            let eval = state.route_evals[v];
            let priority_sum = u64::from(state.priority_sum_of(v));

            summary.cost += eval.cost;
            summary.duration += eval.duration;
            summary.distance += eval.distance;
            summary.setup += setup;
            summary.service += service;
            summary.waiting += waiting;
            summary.priority_sum += priority_sum;
            summary.assigned += route.len();
            summary.nb_routes += 1;

            solution_routes.push(SolutionRoute {
                vehicle_id: vehicle.external_id().to_string(),
                vehicle_rank: v,
                job_ids: route
                    .raw()
                    .route
                    .iter()
                    .map(|&j| problem.job(j).external_id().to_string())
                    .collect(),
                job_ranks: route.raw().route.clone(),
                eval,
                fixed_cost: vehicle.fixed_cost(),
                setup,
                service,
                waiting,
                priority_sum,
            });
        }

        let mut unassigned_ranks: Vec<usize> = state.unassigned.iter().copied().collect();
        unassigned_ranks.sort_unstable();

        Solution {
            unassigned_ids: unassigned_ranks
                .iter()
                .map(|&j| problem.job(j).external_id().to_string())
                .collect(),
            unassigned_ranks,
            routes: solution_routes,
            summary,
        }
    }
}
