mod test_utils;

use std::time::{Duration, Instant};

use meridian_optimizer::problem::amount::Amount;
use meridian_optimizer::{Solver, SolverParams};

use test_utils::*;

#[test]
fn test_single_vehicle_single_job() {
    let problem = build_problem(
        line_locations(1),
        vec![basic_job(0, 1).build()],
        vec![basic_vehicle(0, 0).build()],
    );
    let solver = Solver::new(problem).unwrap();

    let solution = solver.solve(&SolverParams::default());

    assert_eq!(solution.summary.assigned, 1);
    assert_eq!(solution.summary.unassigned, 0);
    assert_eq!(solution.routes[0].job_ranks, vec![0]);
    assert_eq!(solution.summary.cost, 200);
    assert_solution_invariants(solver.problem(), &solution);
}

#[test]
fn test_two_jobs_one_vehicle_symmetric_matrix() {
    // Symmetric 3x3 matrix with every off-diagonal entry at 10.
    let durations = vec![vec![0, 10, 10], vec![10, 0, 10], vec![10, 10, 0]];
    let problem = build_problem_with_matrix(
        durations,
        vec![basic_job(0, 1).build(), basic_job(1, 2).build()],
        vec![basic_vehicle(0, 0).build()],
    );
    let solver = Solver::new(problem).unwrap();

    let solution = solver.solve(&SolverParams::default());

    assert_eq!(solution.summary.assigned, 2);
    let route = &solution.routes[0].job_ranks;
    assert!(route == &vec![0, 1] || route == &vec![1, 0]);
    // Start leg + inter-job edge + end leg.
    assert_eq!(solution.summary.cost, 30);
    assert_solution_invariants(solver.problem(), &solution);
}

#[test]
fn test_skill_incompatible_job_lands_unassigned() {
    let mut job = basic_job(0, 1);
    job.add_skill(42);
    let problem = build_problem(
        line_locations(1),
        vec![job.build()],
        vec![basic_vehicle(0, 0).build()],
    );
    let solver = Solver::new(problem).unwrap();

    let solution = solver.solve(&SolverParams::default());

    assert_eq!(solution.summary.assigned, 0);
    assert_eq!(solution.summary.unassigned, 1);
    assert_eq!(solution.summary.cost, 0);
    assert!(solution.routes.is_empty());
    assert_solution_invariants(solver.problem(), &solution);
}

#[test]
fn test_oversized_shipment_lands_unassigned_as_pair() {
    let (pickup, delivery) = shipment_pair(0, 1, 1, 2, 100);
    let mut vehicle = basic_vehicle(0, 0);
    vehicle.set_capacity(Amount::from_vec(vec![10]));
    let problem = build_problem(line_locations(2), vec![pickup, delivery], vec![vehicle.build()]);
    let solver = Solver::new(problem).unwrap();

    let solution = solver.solve(&SolverParams::default());

    assert_eq!(solution.summary.unassigned, 2);
    assert_eq!(solution.summary.cost, 0);
    assert_solution_invariants(solver.problem(), &solution);
}

#[test]
fn test_shipment_with_impossible_window_order_lands_unassigned() {
    // The delivery's window closes before the pickup's opens.
    let (pickup, delivery) = {
        let mut pickup = basic_job(0, 1);
        pickup.set_job_type(meridian_optimizer::problem::job::JobType::Pickup);
        pickup.set_pickup(Amount::from_vec(vec![1]));
        pickup.set_time_window(tw(5_000, 6_000));
        let mut delivery = basic_job(1, 2);
        delivery.set_job_type(meridian_optimizer::problem::job::JobType::Delivery);
        delivery.set_delivery(Amount::from_vec(vec![1]));
        delivery.set_time_window(tw(0, 1_000));
        (pickup.build(), delivery.build())
    };
    let problem = build_problem(line_locations(2), vec![pickup, delivery], vec![
        basic_vehicle(0, 0).build(),
    ]);
    let solver = Solver::new(problem).unwrap();

    let solution = solver.solve(&SolverParams::default());

    assert_eq!(solution.summary.unassigned, 2);
    assert_solution_invariants(solver.problem(), &solution);
}

#[test]
fn test_two_identical_jobs_are_never_duplicated() {
    let jobs = vec![basic_job(0, 1).build(), basic_job(1, 1).build()];
    let problem = build_problem(line_locations(1), jobs, vec![basic_vehicle(0, 0).build()]);
    let solver = Solver::new(problem).unwrap();

    let solution = solver.solve(&SolverParams::default());

    assert_eq!(solution.summary.assigned, 2);
    assert_solution_invariants(solver.problem(), &solution);
}

#[test]
fn test_priority_replace_end_to_end() {
    // Two priority-0 jobs fill the vehicle; the priority-5 job needs the
    // whole capacity for itself.
    let mut j0 = basic_job(0, 1);
    j0.set_delivery(Amount::from_vec(vec![5]));
    let mut j1 = basic_job(1, 2);
    j1.set_delivery(Amount::from_vec(vec![5]));
    let mut urgent = basic_job(2, 3);
    urgent.set_priority(5);
    urgent.set_delivery(Amount::from_vec(vec![10]));
    let mut vehicle = basic_vehicle(0, 0);
    vehicle.set_capacity(Amount::from_vec(vec![10]));

    let problem = build_problem(
        line_locations(3),
        vec![j0.build(), j1.build(), urgent.build()],
        vec![vehicle.build()],
    );
    let solver = Solver::new(problem).unwrap();

    let solution = solver.solve(&SolverParams::default());

    assert_eq!(solution.summary.priority_sum, 5);
    assert_eq!(solution.summary.assigned, 1);
    assert_eq!(solution.routes[0].job_ranks, vec![2]);
    assert_eq!(solution.summary.unassigned, 2);
    assert_solution_invariants(solver.problem(), &solution);
}

#[test]
fn test_shipments_stay_paired_through_full_solve() {
    let (p0, d0) = shipment_pair(0, 1, 1, 3, 3);
    let (p1, d1) = shipment_pair(2, 2, 3, 4, 4);
    let mut vehicle = basic_vehicle(0, 0);
    vehicle.set_capacity(Amount::from_vec(vec![10]));

    let problem = build_problem(
        line_locations(4),
        vec![p0, d0, p1, d1],
        vec![vehicle.build()],
    );
    let solver = Solver::new(problem).unwrap();

    let solution = solver.solve(&SolverParams::default());

    assert_eq!(solution.summary.assigned, 4);
    assert_solution_invariants(solver.problem(), &solution);
}

#[test]
fn test_deadline_is_respected() {
    // A grid big enough that depth 10000 could never finish in time.
    let locations: Vec<_> = (0..40)
        .map(|i| {
            meridian_optimizer::problem::location::Location::from_cartesian(
                (i % 8) as f64,
                (i / 8) as f64,
            )
        })
        .collect();
    let jobs = (0..39).map(|i| basic_job(i, i + 1).build()).collect();
    let vehicles = (0..3).map(|v| basic_vehicle(v, 0).build()).collect();
    let problem = build_problem(locations, jobs, vehicles);
    let solver = Solver::new(problem).unwrap();

    let params = SolverParams::default()
        .with_depth(10_000)
        .with_timeout(Duration::from_millis(50));

    let started = Instant::now();
    let solution = solver.solve(&params);
    let elapsed = started.elapsed();

    // Generous slack over the 50ms budget to absorb scheduling noise.
    assert!(elapsed < Duration::from_secs(5), "driver ignored deadline");
    assert_solution_invariants(solver.problem(), &solution);
}

#[test]
fn test_solution_serializes_to_json() {
    let problem = build_problem(
        line_locations(2),
        vec![basic_job(0, 1).build(), basic_job(1, 2).build()],
        vec![basic_vehicle(0, 0).build()],
    );
    let solver = Solver::new(problem).unwrap();
    let solution = solver.solve(&SolverParams::default());

    let json = serde_json::to_value(&solution).unwrap();
    assert!(json["routes"].is_array());
    assert!(json["summary"]["cost"].is_i64());
    assert_eq!(json["summary"]["assigned"], 2);
}
