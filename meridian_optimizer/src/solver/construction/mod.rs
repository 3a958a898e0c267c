pub mod basic;
pub mod dynamic;
pub mod insertion_search;

use fxhash::FxHashSet;

use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::solution::tw_route::TwRoute;
use crate::solver::solver_params::InitStrategy;

use insertion_search::{
    apply_insertion, compute_best_insertion, insertion_lower_bound,
};

/// Eval of serving a job alone with a vehicle (start/end legs only);
/// the proxy cost behind regrets and init seeding. NO_EVAL when the
/// vehicle is skill- or capacity-incompatible.
pub fn job_vehicle_eval(
    problem: &VehicleRoutingProblem,
    job_rank: usize,
    vehicle_rank: usize,
) -> Eval {
    if !problem
        .compatible_vehicles_for_job(job_rank)
        .contains(&vehicle_rank)
    {
        return Eval::NO_EVAL;
    }

    let job = problem.job(job_rank);
    let mut locations = Vec::with_capacity(4);
    if let Some(start) = problem.vehicle_start_index(vehicle_rank) {
        locations.push(start);
    }
    locations.push(problem.job_index(job_rank));
    if job.job_type() == JobType::Pickup {
        locations.push(problem.job_index(problem.matching_delivery(job_rank)));
    }
    if let Some(end) = problem.vehicle_end_index(vehicle_rank) {
        locations.push(end);
    }

    locations
        .windows(2)
        .map(|pair| problem.eval(vehicle_rank, pair[0], pair[1]))
        .sum()
}

/// Seeds an empty route with the "best" first job for the chosen init
/// strategy, scanning candidates in criterion order until one fits.
pub fn seed_route(
    problem: &VehicleRoutingProblem,
    route: &mut TwRoute,
    unassigned: &mut FxHashSet<usize>,
    init: InitStrategy,
) {
    if init == InitStrategy::None || !route.is_empty() {
        return;
    }
    let v = route.vehicle_rank;

    let mut candidates: Vec<usize> = unassigned
        .iter()
        .copied()
        .filter(|&j| {
            problem.job(j).job_type() != JobType::Delivery
                && problem.compatible_vehicles_for_job(j).contains(&v)
        })
        .collect();

    match init {
        InitStrategy::None => return,
        InitStrategy::HigherAmount => candidates.sort_by(|&a, &b| {
            let amount = |j: usize| {
                let job = problem.job(j);
                job.delivery() + job.pickup()
            };
            amount(b).lex_cmp(&amount(a)).then(a.cmp(&b))
        }),
        InitStrategy::Furthest => candidates.sort_by(|&a, &b| {
            job_vehicle_eval(problem, b, v)
                .cmp(&job_vehicle_eval(problem, a, v))
                .then(a.cmp(&b))
        }),
        InitStrategy::Nearest => candidates.sort_by(|&a, &b| {
            job_vehicle_eval(problem, a, v)
                .cmp(&job_vehicle_eval(problem, b, v))
                .then(a.cmp(&b))
        }),
        InitStrategy::EarliestDeadline => candidates.sort_by(|&a, &b| {
            problem
                .job(a)
                .deadline()
                .cmp(&problem.job(b).deadline())
                .then(a.cmp(&b))
        }),
    }

    for job in candidates {
        let insertion = compute_best_insertion(problem, route, job, Eval::NO_EVAL);
        if insertion.is_feasible() {
            apply_insertion(problem, route, job, &insertion);
            unassigned.remove(&job);
            if problem.job(job).job_type() == JobType::Pickup {
                unassigned.remove(&problem.matching_delivery(job));
            }
            return;
        }
    }
}

/// Fills one route with unassigned jobs, repeatedly inserting the job
/// maximizing `regret_permille/1000 * regret - insertion_cost`. Regrets
/// are supplied by the calling regime.
pub fn fill_route(
    problem: &VehicleRoutingProblem,
    route: &mut TwRoute,
    unassigned: &mut FxHashSet<usize>,
    regret_of: &dyn Fn(usize) -> Eval,
    regret_permille: i64,
) {
    loop {
        let mut candidates: Vec<usize> = unassigned
            .iter()
            .copied()
            .filter(|&j| problem.job(j).job_type() != JobType::Delivery)
            .collect();
        candidates.sort_unstable();

        let mut best_score = i64::MIN;
        let mut best_choice: Option<usize> = None;

        for job in candidates.drain(..) {
            let regret = regret_of(job);
            let regret_cost = if regret.is_no_eval() { 0 } else { regret.cost };

            // A cheap bound on the insertion cost prunes the full scan.
            if best_choice.is_some() {
                let bound = insertion_lower_bound(problem, route, job);
                if regret_permille * regret_cost / 1000 - bound.cost <= best_score {
                    continue;
                }
            }

            let insertion = compute_best_insertion(problem, route, job, Eval::NO_EVAL);
            if !insertion.is_feasible() {
                continue;
            }
            let score = regret_permille * regret_cost / 1000 - insertion.eval.cost;
            if score > best_score {
                best_score = score;
                best_choice = Some(job);
            }
        }

        let Some(job) = best_choice else { break };
        let insertion = compute_best_insertion(problem, route, job, Eval::NO_EVAL);
        apply_insertion(problem, route, job, &insertion);
        unassigned.remove(&job);
        if problem.job(job).job_type() == JobType::Pickup {
            unassigned.remove(&problem.matching_delivery(job));
        }
    }
}
