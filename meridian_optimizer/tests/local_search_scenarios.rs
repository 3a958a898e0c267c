mod test_utils;

use fxhash::FxHashSet;

use meridian_optimizer::problem::location::Location;
use meridian_optimizer::problem::vehicle_routing_problem::VehicleRoutingProblem;
use meridian_optimizer::solver::local_search::local_search::LocalSearch;
use meridian_optimizer::solver::solution::solution_state::SolutionState;
use meridian_optimizer::solver::solution::tw_route::TwRoute;

use test_utils::*;

fn search_from(
    problem: &VehicleRoutingProblem,
    assignments: Vec<Vec<usize>>,
    depth: usize,
) -> LocalSearch<'_> {
    let mut routes: Vec<TwRoute> = (0..problem.nb_vehicles())
        .map(|v| TwRoute::new(problem, v).unwrap())
        .collect();
    let mut state = SolutionState::new(problem);
    for (v, jobs) in assignments.into_iter().enumerate() {
        for &j in &jobs {
            state.unassigned.remove(&j);
        }
        routes[v].set_route(problem, jobs);
    }
    state.setup(problem, &routes);
    LocalSearch::new(problem, routes, state, depth, None)
}

/// Two interleaved clusters: the seeded assignment zig-zags between them,
/// which a deep search with the ruin phase untangles.
fn clustered_problem() -> VehicleRoutingProblem {
    let mut locations = vec![Location::from_cartesian(0.0, 0.0)];
    for i in 0..6 {
        locations.push(Location::from_cartesian(10.0 + i as f64, 0.0));
    }
    for i in 0..6 {
        locations.push(Location::from_cartesian(-10.0 - i as f64, 0.0));
    }

    let jobs = (0..12).map(|i| basic_job(i, i + 1).build()).collect();
    let vehicles = (0..2).map(|v| basic_vehicle(v, 0).build()).collect();
    build_problem(locations, jobs, vehicles)
}

#[test]
fn test_deep_search_with_ruin_improves_interleaved_seed() {
    let problem = clustered_problem();

    // Alternate jobs across the two vehicles so every route crosses
    // between the clusters repeatedly.
    let even: Vec<usize> = (0..12).filter(|j| j % 2 == 0).collect();
    let odd: Vec<usize> = (0..12).filter(|j| j % 2 == 1).collect();

    let mut search = search_from(&problem, vec![even, odd], 15);
    let initial = search.best_indicators();
    search.run();
    let improved = search.best_indicators();

    assert!(improved.eval.cost < initial.eval.cost);
    assert_eq!(improved.assigned, 12);
}

#[test]
fn test_depth_zero_runs_single_step() {
    let problem = clustered_problem();
    let mut search = search_from(&problem, vec![(0..6).collect(), (6..12).collect()], 0);

    let initial = search.best_indicators();
    search.run();

    // A single ls-step still only ever adopts improvements.
    assert!(!initial.is_better_than(&search.best_indicators()));
}

#[test]
fn test_all_jobs_accounted_for_after_search() {
    let problem = clustered_problem();
    let mut search = search_from(&problem, vec![(0..8).collect(), (8..12).collect()], 5);
    search.run();

    let (routes, state) = search.into_parts();
    let mut seen: FxHashSet<usize> = state.unassigned.clone();
    for route in &routes {
        for rank in 0..route.len() {
            assert!(seen.insert(route.job_at(rank)));
        }
    }
    assert_eq!(seen.len(), problem.nb_jobs());
}
