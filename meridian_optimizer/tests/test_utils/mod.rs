#![allow(dead_code)]

use fxhash::FxHashSet;

use meridian_optimizer::problem::amount::Amount;
use meridian_optimizer::problem::job::{Job, JobBuilder, JobType};
use meridian_optimizer::problem::location::Location;
use meridian_optimizer::problem::time_window::TimeWindow;
use meridian_optimizer::problem::travel_matrix::{Matrix, ProfileMatrices};
use meridian_optimizer::problem::vehicle::{Vehicle, VehicleBuilder};
use meridian_optimizer::problem::vehicle_routing_problem::{
    VehicleRoutingProblem, VehicleRoutingProblemBuilder,
};
use meridian_optimizer::Solution;

pub fn line_locations(nb_jobs: usize) -> Vec<Location> {
    (0..=nb_jobs)
        .map(|i| Location::from_cartesian(i as f64, 0.0))
        .collect()
}

pub fn basic_job(id: usize, location_id: usize) -> JobBuilder {
    let mut builder = JobBuilder::default();
    builder.set_external_id(id.to_string());
    builder.set_location_id(location_id);
    builder
}

pub fn basic_vehicle(id: usize, location_id: usize) -> VehicleBuilder {
    let mut builder = VehicleBuilder::default();
    builder.set_external_id(id.to_string());
    builder.set_start_location_id(location_id);
    builder.set_end_location_id(location_id);
    builder
}

pub fn build_problem(
    locations: Vec<Location>,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
) -> VehicleRoutingProblem {
    let mut builder = VehicleRoutingProblemBuilder::default();
    builder.add_matrix(
        String::from("car"),
        ProfileMatrices::from_euclidean(&locations),
    );
    builder.set_locations(locations);
    builder.set_jobs(jobs);
    builder.set_vehicles(vehicles);
    builder.build().expect("valid test problem")
}

pub fn build_problem_with_matrix(
    durations: Vec<Vec<i64>>,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
) -> VehicleRoutingProblem {
    let locations = (0..durations.len())
        .map(Location::from_matrix_index)
        .collect();
    let matrix = Matrix::from_rows(durations).expect("square test matrix");

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder.add_matrix(
        String::from("car"),
        ProfileMatrices::new(matrix.clone(), matrix),
    );
    builder.set_locations(locations);
    builder.set_jobs(jobs);
    builder.set_vehicles(vehicles);
    builder.build().expect("valid test problem")
}

pub fn shipment_pair(
    pickup_id: usize,
    pickup_location: usize,
    delivery_id: usize,
    delivery_location: usize,
    amount: i64,
) -> (Job, Job) {
    let mut pickup = basic_job(pickup_id, pickup_location);
    pickup.set_job_type(JobType::Pickup);
    pickup.set_pickup(Amount::from_vec(vec![amount]));
    let mut delivery = basic_job(delivery_id, delivery_location);
    delivery.set_job_type(JobType::Delivery);
    delivery.set_delivery(Amount::from_vec(vec![amount]));
    (pickup.build(), delivery.build())
}

pub fn tw(start: i64, end: i64) -> TimeWindow {
    TimeWindow::new(start, end)
}

/// Universal solution invariants: every job exactly once, pickups before
/// deliveries, no duplicates, counters consistent.
pub fn assert_solution_invariants(problem: &VehicleRoutingProblem, solution: &Solution) {
    let mut seen: FxHashSet<usize> = FxHashSet::default();

    for route in &solution.routes {
        for &job in &route.job_ranks {
            assert!(seen.insert(job), "job {job} appears twice");
        }
        // Pairing: pickup before its delivery, same route.
        for (position, &job) in route.job_ranks.iter().enumerate() {
            if problem.job(job).is_pickup() {
                let delivery = problem.matching_delivery(job);
                let delivery_position = route
                    .job_ranks
                    .iter()
                    .position(|&j| j == delivery)
                    .expect("delivery rides another route");
                assert!(position < delivery_position, "delivery precedes pickup");
            }
        }
    }

    for &job in &solution.unassigned_ranks {
        assert!(seen.insert(job), "unassigned job {job} is also assigned");
    }
    assert_eq!(
        seen.len(),
        problem.nb_jobs(),
        "jobs lost between routes and unassigned"
    );
    assert_eq!(
        solution.summary.assigned + solution.summary.unassigned,
        problem.nb_jobs()
    );
}
