use fxhash::FxHashSet;
use tracing::debug;

use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;
use crate::solver::solver_params::InitStrategy;

use super::{fill_route, job_vehicle_eval, seed_route};

/// Dynamic-choice regret insertion: at each step the vehicle currently
/// closest to the largest number of unassigned jobs is picked from the
/// pool, filled with regrets built from the min/second-min placement
/// costs, and retired.
pub fn dynamic_heuristic(
    problem: &VehicleRoutingProblem,
    routes: &mut [TwRoute],
    unassigned: &mut FxHashSet<usize>,
    init: InitStrategy,
    regret_permille: i64,
) -> Eval {
    let mut pool: Vec<usize> = (0..problem.nb_vehicles()).collect();

    while !unassigned.is_empty() && !pool.is_empty() {
        let jobs: Vec<usize> = {
            let mut jobs: Vec<usize> = unassigned
                .iter()
                .copied()
                .filter(|&j| problem.job(j).job_type() != JobType::Delivery)
                .collect();
            jobs.sort_unstable();
            jobs
        };

        // Per job: cheapest and second-cheapest placement over the still
        // available vehicles, and who achieves the minimum.
        let mut closest_count = vec![0usize; problem.nb_vehicles()];
        let mut min_eval = vec![Eval::NO_EVAL; problem.nb_jobs()];
        let mut second_eval = vec![Eval::NO_EVAL; problem.nb_jobs()];
        let mut min_vehicle = vec![usize::MAX; problem.nb_jobs()];

        for &job in &jobs {
            for &v in &pool {
                let eval = job_vehicle_eval(problem, job, v);
                if eval < min_eval[job] {
                    second_eval[job] = min_eval[job];
                    min_eval[job] = eval;
                    min_vehicle[job] = v;
                } else if eval < second_eval[job] {
                    second_eval[job] = eval;
                }
            }
            if min_vehicle[job] != usize::MAX {
                closest_count[min_vehicle[job]] += 1;
            }
        }

        // The vehicle that is the cheapest option for the most jobs; ties
        // break on the lowest rank for reproducibility.
        let Some(&chosen) = pool
            .iter()
            .max_by(|&&a, &&b| closest_count[a].cmp(&closest_count[b]).then(b.cmp(&a)))
        else {
            break;
        };
        pool.retain(|&v| v != chosen);

        let route = &mut routes[chosen];
        seed_route(problem, route, unassigned, init);

        let regret_of = |job: usize| -> Eval {
            if min_vehicle[job] == chosen {
                if second_eval[job].is_no_eval() {
                    min_eval[job]
                } else {
                    second_eval[job]
                }
            } else if min_eval[job].is_no_eval() {
                job_vehicle_eval(problem, job, chosen)
            } else {
                min_eval[job]
            }
        };

        fill_route(problem, route, unassigned, &regret_of, regret_permille);
    }

    let total: Eval = (0..routes.len())
        .map(|v| SolutionState::route_eval_from_scratch(problem, v, &routes[v]))
        .sum();
    debug!(
        cost = total.cost,
        unassigned = unassigned.len(),
        "dynamic construction done"
    );
    total
}
