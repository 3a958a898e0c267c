use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::solution::solution_state::SolutionState;
use super::solution::tw_route::TwRoute;

fn boundary_locations(
    problem: &VehicleRoutingProblem,
    route: &TwRoute,
    first_rank: usize,
    last_rank: usize,
) -> (Option<usize>, Option<usize>) {
    let v = route.vehicle_rank;
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
    (before, after)
}

/// Change in route `v1`'s eval when ranks `[first_rank, last_rank)` of
/// its sequence are replaced by the jobs `[ins_first, ins_last)` of route
/// `v2`, evaluated with `v1`'s cost profile. Returns the straight and the
/// reversed-orientation deltas (positive means the route gets worse).
/// Fixed cost is folded in when the mutation empties or fills the route.
pub fn addition_cost_delta(
    problem: &VehicleRoutingProblem,
    state: &SolutionState,
    routes: &[TwRoute],
    v1: usize,
    first_rank: usize,
    last_rank: usize,
    v2: usize,
    ins_first: usize,
    ins_last: usize,
) -> (Eval, Eval) {
    let r1 = &routes[v1];
    let r2 = &routes[v2];
    let (before, after) = boundary_locations(problem, r1, first_rank, last_rank);

    // Edges disappearing from v1.
    let mut removed = Eval::ZERO;
    if first_rank < last_rank {
        let first_loc = problem.job_index(r1.job_at(first_rank));
        let last_loc = problem.job_index(r1.job_at(last_rank - 1));
        if let Some(b) = before {
            removed += problem.eval(v1, b, first_loc);
        }
        if let Some(a) = after {
            removed += problem.eval(v1, last_loc, a);
        }
        removed += state.fwd_costs[v1][v1][last_rank - 1] - state.fwd_costs[v1][v1][first_rank];
    } else if !r1.is_empty()
        && let (Some(b), Some(a)) = (before, after)
    {
        removed += problem.eval(v1, b, a);
    }

    let new_len = r1.len() - (last_rank - first_rank) + (ins_last - ins_first);

    // Edges appearing in v1.
    let (mut added, mut added_reversed) = (Eval::ZERO, Eval::ZERO);
    if ins_first < ins_last {
        let slice_first = problem.job_index(r2.job_at(ins_first));
        let slice_last = problem.job_index(r2.job_at(ins_last - 1));
        let inner = state.fwd_costs[v2][v1][ins_last - 1] - state.fwd_costs[v2][v1][ins_first];
        let inner_reversed =
            state.bwd_costs[v2][v1][ins_last - 1] - state.bwd_costs[v2][v1][ins_first];

        added = inner;
        added_reversed = inner_reversed;
        if let Some(b) = before {
            added += problem.eval(v1, b, slice_first);
            added_reversed += problem.eval(v1, b, slice_last);
        }
        if let Some(a) = after {
            added += problem.eval(v1, slice_last, a);
            added_reversed += problem.eval(v1, slice_first, a);
        }
    } else if new_len > 0
        && let (Some(b), Some(a)) = (before, after)
    {
        let shortcut = problem.eval(v1, b, a);
        added = shortcut;
        added_reversed = shortcut;
    }

    let mut fixed = 0;
    if r1.is_empty() && new_len > 0 {
        fixed += problem.vehicle(v1).fixed_cost();
    }
    if !r1.is_empty() && new_len == 0 {
        fixed -= problem.vehicle(v1).fixed_cost();
    }
    let fixed = Eval::cost_only(fixed);

    (added - removed + fixed, added_reversed - removed + fixed)
}

/// Eval saved by removing ranks `[first_rank, last_rank)` from route `v`
/// (positive means the route gets cheaper). Fixed cost included when the
/// route empties.
pub fn removal_cost_delta(
    problem: &VehicleRoutingProblem,
    state: &SolutionState,
    routes: &[TwRoute],
    v: usize,
    first_rank: usize,
    last_rank: usize,
) -> Eval {
    let (delta, _) =
        addition_cost_delta(problem, state, routes, v, first_rank, last_rank, v, 0, 0);
    -delta
}

/// Change in eval when the job at `rank` is swapped for `job_rank`.
pub fn in_place_delta_cost(
    problem: &VehicleRoutingProblem,
    route: &TwRoute,
    job_rank: usize,
    rank: usize,
) -> Eval {
    let v = route.vehicle_rank;
    let (before, after) = boundary_locations(problem, route, rank, rank + 1);
    let old_loc = problem.job_index(route.job_at(rank));
    let new_loc = problem.job_index(job_rank);

    let mut delta = Eval::ZERO;
    if let Some(b) = before {
        delta += problem.eval(v, b, new_loc) - problem.eval(v, b, old_loc);
    }
    if let Some(a) = after {
        delta += problem.eval(v, new_loc, a) - problem.eval(v, old_loc, a);
    }
    delta
}

/// Cost increase of inserting a single job at `rank` (fixed cost
/// excluded).
pub fn single_addition_delta(
    problem: &VehicleRoutingProblem,
    route: &TwRoute,
    job_rank: usize,
    rank: usize,
) -> Eval {
    let v = route.vehicle_rank;
    let (before, after) = boundary_locations(problem, route, rank, rank);
    let location = problem.job_index(job_rank);

    let mut added = Eval::ZERO;
    if let Some(b) = before {
        added += problem.eval(v, b, location);
    }
    if let Some(a) = after {
        added += problem.eval(v, location, a);
    }
    if !route.is_empty()
        && let (Some(b), Some(a)) = (before, after)
    {
        added -= problem.eval(v, b, a);
    }
    added
}

/// Change in route `v`'s eval when ranks `[first, last)` are replaced by
/// the given explicit job sequence, computed by walking the affected
/// edges. O(range + inserted), exact for any overlap or reordering, which
/// makes it the reference primitive for intra-route moves.
pub fn sequence_replace_delta(
    problem: &VehicleRoutingProblem,
    route: &TwRoute,
    jobs: impl Iterator<Item = usize> + Clone,
    first: usize,
    last: usize,
) -> Eval {
    let v = route.vehicle_rank;
    let (before, after) = boundary_locations(problem, route, first, last);

    let walk = |sequence: &mut dyn Iterator<Item = usize>| -> (Eval, usize) {
        let mut eval = Eval::ZERO;
        let mut count = 0;
        let mut previous: Option<usize> = None;
        for job_rank in sequence {
            let location = problem.job_index(job_rank);
            match previous {
                Some(p) => eval += problem.eval(v, p, location),
                None => {
                    if let Some(b) = before {
                        eval += problem.eval(v, b, location);
                    }
                }
            }
            previous = Some(location);
            count += 1;
        }
        if let Some(p) = previous
            && let Some(a) = after
        {
            eval += problem.eval(v, p, a);
        }
        (eval, count)
    };

    let mut old_iter = route.raw().route[first..last].iter().copied();
    let (mut old_eval, old_count) = walk(&mut old_iter);
    let mut new_iter = jobs.clone();
    let (mut new_eval, new_count) = walk(&mut new_iter);

    // An empty side contributes only the bypass edge, and only while the
    // route keeps other jobs.
    let rest = route.len() - (last - first);
    if old_count == 0
        && !route.is_empty()
        && let (Some(b), Some(a)) = (before, after)
    {
        old_eval = problem.eval(v, b, a);
    }
    if new_count == 0 {
        new_eval = if rest > 0
            && let (Some(b), Some(a)) = (before, after)
        {
            problem.eval(v, b, a)
        } else {
            Eval::ZERO
        };
    }

    let mut fixed = 0;
    if route.is_empty() && new_count > 0 {
        fixed += problem.vehicle(v).fixed_cost();
    }
    if !route.is_empty() && rest + new_count == 0 {
        fixed -= problem.vehicle(v).fixed_cost();
    }

    new_eval - old_eval + Eval::cost_only(fixed)
}

/// Eval of serving ranks `[first, last)` of route `owner`'s sequence with
/// `vehicle` instead, start/end legs and fixed cost included.
pub fn slice_route_eval(
    problem: &VehicleRoutingProblem,
    state: &SolutionState,
    routes: &[TwRoute],
    owner: usize,
    vehicle: usize,
    first: usize,
    last: usize,
) -> Eval {
    if first >= last {
        return Eval::ZERO;
    }
    let route = &routes[owner];

    let mut eval = Eval::cost_only(problem.vehicle(vehicle).fixed_cost());
    let first_loc = problem.job_index(route.job_at(first));
    let last_loc = problem.job_index(route.job_at(last - 1));

    if let Some(start) = problem.vehicle_start_index(vehicle) {
        eval += problem.eval(vehicle, start, first_loc);
    }
    if let Some(end) = problem.vehicle_end_index(vehicle) {
        eval += problem.eval(vehicle, last_loc, end);
    }
    eval += state.fwd_costs[owner][vehicle][last - 1] - state.fwd_costs[owner][vehicle][first];

    eval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    fn setup() -> (
        crate::problem::vehicle_routing_problem::VehicleRoutingProblem,
        Vec<TwRoute>,
        SolutionState,
    ) {
        let problem = test_utils::line_problem_with_vehicles(6, 2);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![0, 1, 2]);
        routes[1].set_route(&problem, vec![3, 4, 5]);
        let mut state = SolutionState::new(&problem);
        for j in 0..6 {
            state.unassigned.remove(&j);
        }
        state.setup(&problem, &routes);
        (problem, routes, state)
    }

    /// Brute-force eval of an explicit sequence under a vehicle.
    fn eval_sequence(
        problem: &crate::problem::vehicle_routing_problem::VehicleRoutingProblem,
        v: usize,
        jobs: &[usize],
    ) -> Eval {
        let mut route = test_utils::empty_routes(problem).swap_remove(v);
        route.set_route(problem, jobs.to_vec());
        SolutionState::route_eval_from_scratch(problem, v, &route)
    }

    #[test]
    fn test_addition_delta_matches_brute_force() {
        let (problem, routes, state) = setup();

        // Replace rank 1 of route 0 with jobs [3, 4] from route 1.
        let (delta, _) = addition_cost_delta(&problem, &state, &routes, 0, 1, 2, 1, 0, 2);

        let before = eval_sequence(&problem, 0, &[0, 1, 2]);
        let after = eval_sequence(&problem, 0, &[0, 3, 4, 2]);
        assert_eq!(delta, after - before);
    }

    #[test]
    fn test_reversed_addition_matches_brute_force() {
        let (problem, routes, state) = setup();

        let (_, reversed) = addition_cost_delta(&problem, &state, &routes, 0, 1, 2, 1, 0, 2);

        let before = eval_sequence(&problem, 0, &[0, 1, 2]);
        let after = eval_sequence(&problem, 0, &[0, 4, 3, 2]);
        assert_eq!(reversed, after - before);
    }

    #[test]
    fn test_removal_delta_matches_brute_force() {
        let (problem, routes, state) = setup();

        let gain = removal_cost_delta(&problem, &state, &routes, 0, 0, 2);

        let before = eval_sequence(&problem, 0, &[0, 1, 2]);
        let after = eval_sequence(&problem, 0, &[2]);
        assert_eq!(gain, before - after);
    }

    #[test]
    fn test_removal_of_whole_route_recovers_fixed_cost() {
        let (problem, routes, state) = setup();

        let gain = removal_cost_delta(&problem, &state, &routes, 0, 0, 3);
        let before = eval_sequence(&problem, 0, &[0, 1, 2]);
        assert_eq!(gain, before);
    }

    #[test]
    fn test_in_place_delta() {
        let (problem, routes, _) = setup();

        let delta = in_place_delta_cost(&problem, &routes[0], 5, 1);

        let before = eval_sequence(&problem, 0, &[0, 1, 2]);
        let after = eval_sequence(&problem, 0, &[0, 5, 2]);
        assert_eq!(delta, after - before);
    }

    #[test]
    fn test_single_addition_delta() {
        let (problem, routes, _) = setup();

        let delta = single_addition_delta(&problem, &routes[0], 4, 2);

        let before = eval_sequence(&problem, 0, &[0, 1, 2]);
        let after = eval_sequence(&problem, 0, &[0, 1, 4, 2]);
        assert_eq!(delta, after - before);
    }

    #[test]
    fn test_sequence_replace_delta_matches_brute_force() {
        let (problem, routes, _) = setup();

        // Rotate jobs 0..3 of route 0 into [1, 2, 0].
        let new_order = [1usize, 2, 0];
        let delta = sequence_replace_delta(
            &problem,
            &routes[0],
            new_order.iter().copied(),
            0,
            3,
        );

        let before = eval_sequence(&problem, 0, &[0, 1, 2]);
        let after = eval_sequence(&problem, 0, &[1, 2, 0]);
        assert_eq!(delta, after - before);
    }

    #[test]
    fn test_slice_route_eval() {
        let (problem, routes, state) = setup();

        let eval = slice_route_eval(&problem, &state, &routes, 1, 0, 1, 3);
        assert_eq!(eval, eval_sequence(&problem, 0, &[4, 5]));
    }
}
