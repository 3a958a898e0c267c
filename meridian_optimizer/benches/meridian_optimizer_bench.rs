use criterion::{Criterion, criterion_group, criterion_main};

use meridian_optimizer::problem::location::Location;
use meridian_optimizer::problem::job::JobBuilder;
use meridian_optimizer::problem::travel_matrix::ProfileMatrices;
use meridian_optimizer::problem::vehicle::VehicleBuilder;
use meridian_optimizer::problem::vehicle_routing_problem::VehicleRoutingProblemBuilder;
use meridian_optimizer::{Solver, SolverParams};

fn grid_solver(width: usize, height: usize, nb_vehicles: usize) -> Solver {
    let mut locations = vec![Location::from_cartesian(0.0, 0.0)];
    for y in 0..height {
        for x in 0..width {
            locations.push(Location::from_cartesian(x as f64, y as f64));
        }
    }

    let jobs = (0..width * height)
        .map(|i| {
            let mut builder = JobBuilder::default();
            builder.set_external_id(i.to_string());
            builder.set_location_id(i + 1);
            builder.build()
        })
        .collect();

    let vehicles = (0..nb_vehicles)
        .map(|v| {
            let mut builder = VehicleBuilder::default();
            builder.set_external_id(v.to_string());
            builder.set_start_location_id(0);
            builder.set_end_location_id(0);
            builder.build()
        })
        .collect();

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder.add_matrix(
        String::from("car"),
        ProfileMatrices::from_euclidean(&locations),
    );
    builder.set_locations(locations);
    builder.set_jobs(jobs);
    builder.set_vehicles(vehicles);

    Solver::new(builder.build().expect("valid grid problem")).expect("consistent vehicles")
}

fn bench_solve_grid(c: &mut Criterion) {
    let solver = grid_solver(5, 4, 2);
    let params = SolverParams::default().with_depth(2);

    c.bench_function("solve 20-job grid", |b| {
        b.iter(|| solver.solve(&params));
    });
}

criterion_group!(benches, bench_solve_grid);
criterion_main!(benches);
