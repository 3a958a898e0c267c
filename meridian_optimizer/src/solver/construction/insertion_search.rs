use crate::problem::amount::Amount;
use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::single_addition_delta;
use crate::solver::solution::tw_route::TwRoute;

/// Best found insertion of one job or one shipment into a route.
/// `eval` is the cost increase; `NO_EVAL` means nothing feasible.
#[derive(Debug, Clone)]
pub struct RouteInsertion {
    pub eval: Eval,
    pub delivery: Amount,
    pub single_rank: usize,
    pub pickup_rank: usize,
    pub delivery_rank: usize,
}

impl RouteInsertion {
    pub fn none() -> Self {
        RouteInsertion {
            eval: Eval::NO_EVAL,
            delivery: Amount::EMPTY,
            single_rank: 0,
            pickup_rank: 0,
            delivery_rank: 0,
        }
    }

    pub fn is_feasible(&self) -> bool {
        !self.eval.is_no_eval()
    }
}

/// Cheap necessary bound on the cost of inserting `job_rank` anywhere in
/// the route: the smallest edge into the job plus the smallest edge out of
/// it, minus the largest edge currently in the route.
pub fn insertion_lower_bound(
    problem: &VehicleRoutingProblem,
    route: &TwRoute,
    job_rank: usize,
) -> Eval {
    let v = route.vehicle_rank;
    let location = problem.job_index(job_rank);

    let mut nodes: Vec<usize> = Vec::with_capacity(route.len() + 2);
    if let Some(start) = problem.vehicle_start_index(v) {
        nodes.push(start);
    }
    for rank in 0..route.len() {
        nodes.push(problem.job_index(route.job_at(rank)));
    }
    if let Some(end) = problem.vehicle_end_index(v) {
        nodes.push(end);
    }
    if nodes.is_empty() {
        return Eval::ZERO;
    }

    let min_to = nodes
        .iter()
        .map(|&n| problem.eval(v, n, location))
        .min()
        .unwrap_or(Eval::ZERO);
    let min_from = nodes
        .iter()
        .map(|&n| problem.eval(v, location, n))
        .min()
        .unwrap_or(Eval::ZERO);
    let max_edge = nodes
        .windows(2)
        .map(|pair| problem.eval(v, pair[0], pair[1]))
        .max()
        .unwrap_or(Eval::ZERO);

    min_to + min_from - max_edge
}

/// Cheapest feasible position for a single job, scanning every rank.
/// Positions whose edge delta cannot beat `cutoff` skip the feasibility
/// checks.
pub fn compute_single_insertion(
    problem: &VehicleRoutingProblem,
    route: &TwRoute,
    job_rank: usize,
    cutoff: Eval,
) -> RouteInsertion {
    let v = route.vehicle_rank;
    let job = problem.job(job_rank);

    if !problem.vehicle_ok_with_job(v, job_rank)
        || route.len() >= problem.vehicle(v).max_tasks()
    {
        return RouteInsertion::none();
    }

    let mut best = RouteInsertion::none();
    let mut threshold = cutoff;

    for rank in 0..=route.len() {
        let delta = single_addition_delta(problem, route, job_rank, rank);
        if delta >= threshold {
            continue;
        }
        if !route.is_valid_addition_for_capacity(problem, job.pickup(), job.delivery(), rank) {
            continue;
        }
        if !route.is_valid_addition_for_tw(
            problem,
            job.delivery(),
            std::iter::once(job_rank),
            rank,
            rank,
        ) {
            continue;
        }

        threshold = delta;
        best = RouteInsertion {
            eval: delta,
            delivery: job.delivery().clone(),
            single_rank: rank,
            pickup_rank: 0,
            delivery_rank: 0,
        };
    }

    best
}

/// Cheapest feasible (pickup_rank, delivery_rank) pair for a shipment,
/// enumerating all pairs with `pickup_rank <= delivery_rank`. The
/// delivery's incremental cost is precomputed once per rank and reused.
pub fn compute_pd_insertion(
    problem: &VehicleRoutingProblem,
    route: &TwRoute,
    pickup_job: usize,
    cutoff: Eval,
) -> RouteInsertion {
    let v = route.vehicle_rank;
    let delivery_job = problem.matching_delivery(pickup_job);
    let pickup = problem.job(pickup_job);
    let vehicle = problem.vehicle(v);

    if !problem.vehicle_ok_with_job(v, pickup_job)
        || !problem.vehicle_ok_with_job(v, delivery_job)
        || route.len() + 2 > vehicle.max_tasks()
        || !pickup.pickup().fits_in(vehicle.capacity())
    {
        return RouteInsertion::none();
    }

    let mut threshold = cutoff;
    if !threshold.is_no_eval() {
        let bound = insertion_lower_bound(problem, route, pickup_job)
            + insertion_lower_bound(problem, route, delivery_job);
        if bound >= threshold {
            return RouteInsertion::none();
        }
    }

    let delivery_adds: Vec<Eval> = (0..=route.len())
        .map(|rank| single_addition_delta(problem, route, delivery_job, rank))
        .collect();

    let mut best = RouteInsertion::none();

    for pickup_rank in 0..=route.len() {
        let pickup_add = single_addition_delta(problem, route, pickup_job, pickup_rank);
        if pickup_add >= threshold {
            continue;
        }
        if !route.is_valid_addition_for_capacity(
            problem,
            pickup.pickup(),
            pickup.delivery(),
            pickup_rank,
        ) {
            continue;
        }

        for delivery_rank in pickup_rank..=route.len() {
            let pair_eval = if delivery_rank == pickup_rank {
                contiguous_pair_delta(problem, route, pickup_job, delivery_job, pickup_rank)
            } else {
                pickup_add + delivery_adds[delivery_rank]
            };
            if pair_eval >= threshold {
                continue;
            }

            let modified = std::iter::once(pickup_job)
                .chain(
                    route.raw().route[pickup_rank..delivery_rank]
                        .iter()
                        .copied(),
                )
                .chain(std::iter::once(delivery_job));
            let mut delivery_total = route.delivery_in_range(pickup_rank, delivery_rank);
            delivery_total += problem.job(delivery_job).delivery();

            if !route.is_valid_addition_for_capacity_inclusion(
                problem,
                &delivery_total,
                modified.clone(),
                pickup_rank,
                delivery_rank,
            ) {
                continue;
            }
            if !route.is_valid_addition_for_tw(
                problem,
                &delivery_total,
                modified,
                pickup_rank,
                delivery_rank,
            ) {
                continue;
            }

            threshold = pair_eval;
            best = RouteInsertion {
                eval: pair_eval,
                delivery: delivery_total,
                single_rank: 0,
                pickup_rank,
                delivery_rank,
            };
        }
    }

    best
}

/// Applies a feasible insertion found by the searches above, mutating the
/// route. For shipments both legs land in one replace.
pub fn apply_insertion(
    problem: &VehicleRoutingProblem,
    route: &mut TwRoute,
    job_rank: usize,
    insertion: &RouteInsertion,
) {
    use crate::problem::job::JobType;
    debug_assert!(insertion.is_feasible());

    match problem.job(job_rank).job_type() {
        JobType::Single => route.insert(problem, job_rank, insertion.single_rank),
        JobType::Pickup => {
            let delivery_job = problem.matching_delivery(job_rank);
            let modified: Vec<usize> = std::iter::once(job_rank)
                .chain(
                    route.raw().route[insertion.pickup_rank..insertion.delivery_rank]
                        .iter()
                        .copied(),
                )
                .chain(std::iter::once(delivery_job))
                .collect();
            route.replace(
                problem,
                modified.into_iter(),
                insertion.pickup_rank,
                insertion.delivery_rank,
            );
        }
        JobType::Delivery => unreachable!("deliveries are inserted with their pickup"),
    }
}

/// Cost of inserting pickup immediately followed by delivery at `rank`.
fn contiguous_pair_delta(
    problem: &VehicleRoutingProblem,
    route: &TwRoute,
    pickup_job: usize,
    delivery_job: usize,
    rank: usize,
) -> Eval {
    let v = route.vehicle_rank;
    let pickup_loc = problem.job_index(pickup_job);
    let delivery_loc = problem.job_index(delivery_job);

    let before = if rank > 0 {
        Some(problem.job_index(route.job_at(rank - 1)))
    } else {
        problem.vehicle_start_index(v)
    };
    let after = if rank < route.len() {
        Some(problem.job_index(route.job_at(rank)))
    } else {
        problem.vehicle_end_index(v)
    };

    let mut added = problem.eval(v, pickup_loc, delivery_loc);
    if let Some(b) = before {
        added += problem.eval(v, b, pickup_loc);
    }
    if let Some(a) = after {
        added += problem.eval(v, delivery_loc, a);
    }
    if !route.is_empty()
        && let (Some(b), Some(a)) = (before, after)
    {
        added -= problem.eval(v, b, a);
    }
    added
}

/// Best insertion for any job type; delivery jobs ride along with their
/// pickup and have no insertion of their own.
pub fn compute_best_insertion(
    problem: &VehicleRoutingProblem,
    route: &TwRoute,
    job_rank: usize,
    cutoff: Eval,
) -> RouteInsertion {
    use crate::problem::job::JobType;

    match problem.job(job_rank).job_type() {
        JobType::Single => compute_single_insertion(problem, route, job_rank, cutoff),
        JobType::Pickup => compute_pd_insertion(problem, route, job_rank, cutoff),
        JobType::Delivery => RouteInsertion::none(),
    }
}
