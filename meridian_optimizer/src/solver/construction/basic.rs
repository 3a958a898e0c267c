use std::cmp::Ordering;

use fxhash::FxHashSet;
use tracing::debug;

use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;
use crate::solver::solver_params::{InitStrategy, SortStrategy};

use super::{fill_route, job_vehicle_eval, seed_route};

/// Availability ordering: longer shifts first, then larger capacity,
/// looser caps and finally rank for determinism.
fn availability_cmp(problem: &VehicleRoutingProblem, a: usize, b: usize) -> Ordering {
    let va = problem.vehicle(a);
    let vb = problem.vehicle(b);

    vb.time_window()
        .length()
        .cmp(&va.time_window().length())
        .then_with(|| vb.capacity().lex_cmp(va.capacity()))
        .then_with(|| {
            vb.max_travel_time()
                .unwrap_or(i64::MAX)
                .cmp(&va.max_travel_time().unwrap_or(i64::MAX))
        })
        .then_with(|| {
            vb.max_distance()
                .unwrap_or(i64::MAX)
                .cmp(&va.max_distance().unwrap_or(i64::MAX))
        })
        .then_with(|| a.cmp(&b))
}

fn vehicle_order(problem: &VehicleRoutingProblem, sort: SortStrategy) -> Vec<usize> {
    let mut order: Vec<usize> = (0..problem.nb_vehicles()).collect();
    match sort {
        SortStrategy::Availability => {
            order.sort_by(|&a, &b| availability_cmp(problem, a, b));
        }
        SortStrategy::Cost => {
            order.sort_by(|&a, &b| {
                problem
                    .vehicle(a)
                    .fixed_cost()
                    .cmp(&problem.vehicle(b).fixed_cost())
                    .then_with(|| availability_cmp(problem, a, b))
            });
        }
    }
    order
}

/// Static-sort regret insertion: vehicles are ordered once, each route is
/// seeded and filled in turn; a job's regret is its cheapest placement
/// with any later vehicle (its own when no later vehicle can take it).
pub fn basic_heuristic(
    problem: &VehicleRoutingProblem,
    routes: &mut [TwRoute],
    unassigned: &mut FxHashSet<usize>,
    init: InitStrategy,
    regret_permille: i64,
    sort: SortStrategy,
) -> Eval {
    let order = vehicle_order(problem, sort);
    let nb_jobs = problem.nb_jobs();

    // regrets[i][j]: cheapest single-vehicle eval of job j over vehicles
    // strictly after position i in the ordering.
    let mut regrets: Vec<Vec<Eval>> = vec![vec![Eval::NO_EVAL; nb_jobs]; order.len()];
    for position in (0..order.len().saturating_sub(1)).rev() {
        let later_vehicle = order[position + 1];
        for job in 0..nb_jobs {
            regrets[position][job] = regrets[position + 1][job]
                .min(job_vehicle_eval(problem, job, later_vehicle));
        }
    }

    for (position, &v) in order.iter().enumerate() {
        if unassigned.is_empty() {
            break;
        }
        let route = &mut routes[v];

        seed_route(problem, route, unassigned, init);

        let own_fallback: Vec<Eval> = (0..nb_jobs)
            .map(|job| {
                let later = regrets[position][job];
                if later.is_no_eval() {
                    // No later vehicle can take the job: regret collapses
                    // to its own cost.
                    job_vehicle_eval(problem, job, v)
                } else {
                    later
                }
            })
            .collect();

        fill_route(
            problem,
            route,
            unassigned,
            &|job| own_fallback[job],
            regret_permille,
        );
    }

    let total: Eval = (0..routes.len())
        .map(|v| SolutionState::route_eval_from_scratch(problem, v, &routes[v]))
        .sum();
    debug!(
        cost = total.cost,
        unassigned = unassigned.len(),
        "basic construction done"
    );
    total
}
