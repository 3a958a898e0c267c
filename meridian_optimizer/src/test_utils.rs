use crate::problem::amount::Amount;
use crate::problem::job::{Job, JobBuilder, JobType};
use crate::problem::location::Location;
use crate::problem::time_window::TimeWindow;
use crate::problem::travel_matrix::{Matrix, ProfileMatrices};
use crate::problem::vehicle::{Vehicle, VehicleBuilder};
use crate::problem::vehicle_routing_problem::{
    VehicleRoutingProblem, VehicleRoutingProblemBuilder,
};
use crate::solver::solution::tw_route::TwRoute;

/// Locations 0..=n on a line, one unit (100 cost/duration/distance
/// units) apart. Location 0 is the depot.
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

/// `nb_jobs` jobs on a line at locations 1..=n, one depot vehicle.
pub fn line_problem(nb_jobs: usize) -> VehicleRoutingProblem {
    line_problem_with_vehicles(nb_jobs, 1)
}

pub fn line_problem_with_vehicles(
    nb_jobs: usize,
    nb_vehicles: usize,
) -> VehicleRoutingProblem {
    let locations = line_locations(nb_jobs);
    let jobs = (0..nb_jobs).map(|i| basic_job(i, i + 1).build()).collect();
    let vehicles = (0..nb_vehicles).map(|v| basic_vehicle(v, 0).build()).collect();
    build_problem(locations, jobs, vehicles)
}

/// One vehicle with the given capacity; jobs with explicit
/// (delivery, pickup) scalar amounts at locations 1..=n.
pub fn problem_with_amounts(
    amounts: Vec<(i64, i64)>,
    capacity: Vec<i64>,
) -> VehicleRoutingProblem {
    let locations = line_locations(amounts.len());
    let jobs = amounts
        .iter()
        .enumerate()
        .map(|(i, &(delivery, pickup))| {
            let mut builder = basic_job(i, i + 1);
            if delivery != 0 {
                builder.set_delivery(Amount::from_vec(vec![delivery]));
            }
            if pickup != 0 {
                builder.set_pickup(Amount::from_vec(vec![pickup]));
            }
            builder.build()
        })
        .collect();

    let mut vehicle = basic_vehicle(0, 0);
    vehicle.set_capacity(Amount::from_vec(capacity));
    build_problem(locations, jobs, vec![vehicle.build()])
}

/// Line problem with per-job time windows, a shared service duration and
/// a vehicle shift window.
pub fn line_problem_with_tw(
    nb_jobs: usize,
    service: i64,
    windows: Vec<Option<TimeWindow>>,
    vehicle_tw: TimeWindow,
) -> VehicleRoutingProblem {
    let locations = line_locations(nb_jobs);
    let jobs = windows
        .iter()
        .enumerate()
        .map(|(i, window)| {
            let mut builder = basic_job(i, i + 1);
            builder.set_service(service);
            if let Some(tw) = window {
                builder.set_time_window(*tw);
            }
            builder.build()
        })
        .collect();

    let mut vehicle = basic_vehicle(0, 0);
    vehicle.set_time_window(vehicle_tw);
    build_problem(locations, jobs, vec![vehicle.build()])
}

/// Line problem whose single vehicle carries one break.
pub fn line_problem_with_break(
    nb_jobs: usize,
    break_tw: TimeWindow,
    break_service: i64,
) -> VehicleRoutingProblem {
    let locations = line_locations(nb_jobs);
    let jobs = (0..nb_jobs).map(|i| basic_job(i, i + 1).build()).collect();

    let mut vehicle = basic_vehicle(0, 0);
    vehicle.set_time_window(TimeWindow::new(0, 100_000));
    vehicle.add_break(crate::problem::vehicle::Break::new(
        String::from("break"),
        vec![break_tw],
        break_service,
    ));
    build_problem(locations, jobs, vec![vehicle.build()])
}

/// Two jobs with priorities 1 and 3; the second needs skill 7, which only
/// vehicle 0 carries.
pub fn problem_with_skills_and_priorities() -> VehicleRoutingProblem {
    let locations = line_locations(2);

    let mut j0 = basic_job(0, 1);
    j0.set_priority(1);
    let mut j1 = basic_job(1, 2);
    j1.set_priority(3);
    j1.add_skill(7);

    let mut v0 = basic_vehicle(0, 0);
    v0.add_skill(7);
    let v1 = basic_vehicle(1, 0);

    build_problem(locations, vec![j0.build(), j1.build()], vec![v0.build(), v1.build()])
}

/// A pickup/delivery pair (jobs 0 and 1, amount 5) plus a single job 2.
pub fn shipment_problem() -> VehicleRoutingProblem {
    let locations = line_locations(3);

    let mut pickup = basic_job(0, 1);
    pickup.set_job_type(JobType::Pickup);
    pickup.set_pickup(Amount::from_vec(vec![5]));
    let mut delivery = basic_job(1, 2);
    delivery.set_job_type(JobType::Delivery);
    delivery.set_delivery(Amount::from_vec(vec![5]));
    let single = basic_job(2, 3);

    let mut vehicle = basic_vehicle(0, 0);
    vehicle.set_capacity(Amount::from_vec(vec![10]));

    build_problem(
        locations,
        vec![pickup.build(), delivery.build(), single.build()],
        vec![vehicle.build()],
    )
}

/// Problem over explicit matrix indices with a hand-written symmetric
/// duration/distance table.
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

/// Two-route instance where the in-place job swap is feasible but a
/// best-position swap is strictly cheaper: job 0 belongs at the front of
/// route 1, job 3 alone on route 0.
pub fn swap_star_problem() -> VehicleRoutingProblem {
    // Locations: 0 = depot A, 1 = depot B, 2 = job 0, 3 = job 1,
    // 4 = job 2, 5 = job 3.
    let d = vec![
        vec![0, 100, 50, 100, 100, 10],
        vec![100, 0, 5, 20, 25, 30],
        vec![50, 5, 0, 5, 30, 60],
        vec![100, 20, 5, 0, 5, 25],
        vec![100, 25, 30, 5, 0, 10],
        vec![10, 30, 60, 25, 10, 0],
    ];

    let jobs = vec![
        basic_job(0, 2).build(),
        basic_job(1, 3).build(),
        basic_job(2, 4).build(),
        basic_job(3, 5).build(),
    ];

    let mut v0 = VehicleBuilder::default();
    v0.set_external_id(String::from("0"));
    v0.set_start_location_id(0);
    v0.set_end_location_id(0);
    let mut v1 = VehicleBuilder::default();
    v1.set_external_id(String::from("1"));
    v1.set_start_location_id(1);
    v1.set_end_location_id(1);

    build_problem_with_matrix(d, jobs, vec![v0.build(), v1.build()])
}

/// A shipment whose amount exceeds every vehicle's capacity.
pub fn oversized_shipment_problem() -> VehicleRoutingProblem {
    let locations = line_locations(2);

    let mut pickup = basic_job(0, 1);
    pickup.set_job_type(JobType::Pickup);
    pickup.set_pickup(Amount::from_vec(vec![50]));
    let mut delivery = basic_job(1, 2);
    delivery.set_job_type(JobType::Delivery);
    delivery.set_delivery(Amount::from_vec(vec![50]));

    let mut vehicle = basic_vehicle(0, 0);
    vehicle.set_capacity(Amount::from_vec(vec![10]));

    build_problem(
        locations,
        vec![pickup.build(), delivery.build()],
        vec![vehicle.build()],
    )
}

/// Two clusters of two jobs each, a vehicle parked at the origin between
/// them and one idle vehicle per cluster.
pub fn route_split_problem() -> VehicleRoutingProblem {
    let locations = vec![
        Location::from_cartesian(0.0, 0.0),   // shared depot
        Location::from_cartesian(10.0, 0.0),  // job 0
        Location::from_cartesian(11.0, 0.0),  // job 1
        Location::from_cartesian(-10.0, 0.0), // job 2
        Location::from_cartesian(-11.0, 0.0), // job 3
        Location::from_cartesian(9.0, 0.0),   // east depot
        Location::from_cartesian(-9.0, 0.0),  // west depot
    ];

    let jobs = (0..4).map(|i| basic_job(i, i + 1).build()).collect();
    let vehicles = vec![
        basic_vehicle(0, 0).build(),
        basic_vehicle(1, 5).build(),
        basic_vehicle(2, 6).build(),
    ];

    build_problem(locations, jobs, vehicles)
}

/// Two priority-0 jobs filling the vehicle, plus a priority-5 job whose
/// delivery alone uses the whole capacity: it cannot coexist with either.
pub fn priority_capacity_problem() -> VehicleRoutingProblem {
    let locations = line_locations(3);

    let mut j0 = basic_job(0, 1);
    j0.set_delivery(Amount::from_vec(vec![5]));
    let mut j1 = basic_job(1, 2);
    j1.set_delivery(Amount::from_vec(vec![5]));
    let mut urgent = basic_job(2, 3);
    urgent.set_priority(5);
    urgent.set_delivery(Amount::from_vec(vec![10]));

    let mut vehicle = basic_vehicle(0, 0);
    vehicle.set_capacity(Amount::from_vec(vec![10]));

    build_problem(
        locations,
        vec![j0.build(), j1.build(), urgent.build()],
        vec![vehicle.build()],
    )
}

/// Two priority-0 jobs plus a priority-5 job, one vehicle.
pub fn priority_replace_problem() -> VehicleRoutingProblem {
    let locations = line_locations(3);

    let j0 = basic_job(0, 1);
    let j1 = basic_job(1, 2);
    let mut urgent = basic_job(2, 3);
    urgent.set_priority(5);

    build_problem(
        locations,
        vec![j0.build(), j1.build(), urgent.build()],
        vec![basic_vehicle(0, 0).build()],
    )
}

/// The shipment problem again, with a second identical vehicle.
pub fn shipment_problem_with_two_vehicles() -> VehicleRoutingProblem {
    let locations = line_locations(3);

    let mut pickup = basic_job(0, 1);
    pickup.set_job_type(JobType::Pickup);
    pickup.set_pickup(Amount::from_vec(vec![5]));
    let mut delivery = basic_job(1, 2);
    delivery.set_job_type(JobType::Delivery);
    delivery.set_delivery(Amount::from_vec(vec![5]));
    let single = basic_job(2, 3);

    let vehicles = (0..2)
        .map(|v| {
            let mut vehicle = basic_vehicle(v, 0);
            vehicle.set_capacity(Amount::from_vec(vec![10]));
            vehicle.build()
        })
        .collect();

    build_problem(
        locations,
        vec![pickup.build(), delivery.build(), single.build()],
        vehicles,
    )
}

/// A pickup/delivery pair (jobs 0 and 1, amount 5) plus single fillers
/// 2 and 3.
pub fn shipment_problem_with_filler() -> VehicleRoutingProblem {
    let locations = line_locations(4);

    let mut pickup = basic_job(0, 1);
    pickup.set_job_type(JobType::Pickup);
    pickup.set_pickup(Amount::from_vec(vec![5]));
    let mut delivery = basic_job(1, 2);
    delivery.set_job_type(JobType::Delivery);
    delivery.set_delivery(Amount::from_vec(vec![5]));
    let x = basic_job(2, 3);
    let y = basic_job(3, 4);

    let mut vehicle = basic_vehicle(0, 0);
    vehicle.set_capacity(Amount::from_vec(vec![10]));

    build_problem(
        locations,
        vec![pickup.build(), delivery.build(), x.build(), y.build()],
        vec![vehicle.build()],
    )
}

/// One empty `TwRoute` per vehicle.
pub fn empty_routes(problem: &VehicleRoutingProblem) -> Vec<TwRoute> {
    (0..problem.nb_vehicles())
        .map(|v| TwRoute::new(problem, v).expect("consistent vehicle breaks"))
        .collect()
}
