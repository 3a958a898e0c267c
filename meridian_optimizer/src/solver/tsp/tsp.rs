use std::time::Instant;

use rayon::prelude::*;

use crate::problem::eval::Eval;
use crate::problem::travel_matrix::Cost;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::christofides::christofides_tour;

/// Single-route reordering: Christofides construction followed by 2-opt,
/// or-opt and relocate passes until no positive gain remains or the
/// deadline expires. Returns the input job ranks in improved order.
pub fn solve(
    problem: &VehicleRoutingProblem,
    vehicle_rank: usize,
    jobs: &[usize],
    deadline: Option<Instant>,
) -> Vec<usize> {
    if jobs.len() <= 2 {
        return jobs.to_vec();
    }

    // Node 0 is the depot pseudo-node anchored on the vehicle start (or
    // end when there is no start); nodes 1..=n are the jobs.
    let depot = problem
        .vehicle_start_index(vehicle_rank)
        .or(problem.vehicle_end_index(vehicle_rank))
        .expect("vehicle without start or end");
    let locations: Vec<usize> = std::iter::once(depot)
        .chain(jobs.iter().map(|&j| problem.job_index(j)))
        .collect();

    let symmetric_cost = |i: usize, j: usize| -> i64 {
        let a = problem.eval(vehicle_rank, locations[i], locations[j]).cost;
        let b = problem.eval(vehicle_rank, locations[j], locations[i]).cost;
        (a + b) / 2
    };

    let tour = christofides_tour(locations.len(), symmetric_cost);

    // Rotate the depot to the front and drop it.
    let depot_position = tour.iter().position(|&n| n == 0).unwrap_or(0);
    let mut order: Vec<usize> = tour[depot_position + 1..]
        .iter()
        .chain(tour[..depot_position].iter())
        .map(|&node| jobs[node - 1])
        .collect();

    // The cycle direction is arbitrary; keep the cheaper orientation of
    // the actual asymmetric route.
    let forward = path_cost(problem, vehicle_rank, &order);
    let reversed: Vec<usize> = order.iter().rev().copied().collect();
    if path_cost(problem, vehicle_rank, &reversed) < forward {
        order = reversed;
    }

    improve(problem, vehicle_rank, &mut order, deadline);
    order
}

/// Eval cost of serving `jobs` in order, start/end legs included.
pub fn path_cost(problem: &VehicleRoutingProblem, vehicle_rank: usize, jobs: &[usize]) -> Cost {
    let mut eval = Eval::ZERO;
    let mut previous = problem.vehicle_start_index(vehicle_rank);
    for &job in jobs {
        let location = problem.job_index(job);
        if let Some(p) = previous {
            eval += problem.eval(vehicle_rank, p, location);
        }
        previous = Some(location);
    }
    if let (Some(p), Some(end)) = (previous, problem.vehicle_end_index(vehicle_rank)) {
        eval += problem.eval(vehicle_rank, p, end);
    }
    eval.cost
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

fn improve(
    problem: &VehicleRoutingProblem,
    vehicle_rank: usize,
    order: &mut Vec<usize>,
    deadline: Option<Instant>,
) {
    let mut current_cost = path_cost(problem, vehicle_rank, order);

    loop {
        if deadline_passed(deadline) {
            return;
        }

        let two_opt = best_two_opt(problem, vehicle_rank, order, current_cost);
        let or_opt = best_or_opt(problem, vehicle_rank, order, current_cost);

        let best = [two_opt, or_opt]
            .into_iter()
            .flatten()
            .min_by_key(|&(cost, _)| cost);

        match best {
            Some((cost, candidate)) if cost < current_cost => {
                *order = candidate;
                current_cost = cost;
            }
            _ => return,
        }
    }
}

/// Best segment reversal, with the candidate scans distributed across
/// worker threads; each writes a private best and the caller reduces.
fn best_two_opt(
    problem: &VehicleRoutingProblem,
    vehicle_rank: usize,
    order: &[usize],
    current_cost: Cost,
) -> Option<(Cost, Vec<usize>)> {
    let n = order.len();

    (0..n.saturating_sub(1))
        .into_par_iter()
        .filter_map(|i| {
            let mut best: Option<(Cost, Vec<usize>)> = None;
            for j in i + 1..n {
                let mut candidate = order.to_vec();
                candidate[i..=j].reverse();
                let cost = path_cost(problem, vehicle_rank, &candidate);
                if cost < best.as_ref().map_or(current_cost, |(c, _)| *c) {
                    best = Some((cost, candidate));
                }
            }
            best
        })
        .min_by_key(|&(cost, _)| cost)
}

/// Best move of a sequence of 1, 2 or 3 jobs to another position
/// (relocate is the length-1 case).
fn best_or_opt(
    problem: &VehicleRoutingProblem,
    vehicle_rank: usize,
    order: &[usize],
    current_cost: Cost,
) -> Option<(Cost, Vec<usize>)> {
    let n = order.len();
    let mut best: Option<(Cost, Vec<usize>)> = None;

    for length in 1..=3usize.min(n) {
        for from in 0..=n - length {
            for to in 0..=n - length {
                if to == from {
                    continue;
                }
                let mut candidate: Vec<usize> = order.to_vec();
                let segment: Vec<usize> = candidate.drain(from..from + length).collect();
                candidate.splice(to..to, segment);
                let cost = path_cost(problem, vehicle_rank, &candidate);
                if cost < best.as_ref().map_or(current_cost, |(c, _)| *c) {
                    best = Some((cost, candidate));
                }
            }
        }
    }

    best
}
