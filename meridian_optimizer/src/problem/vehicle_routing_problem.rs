use fxhash::FxHashMap;

use crate::error::ConfigError;

use super::amount::Amount;
use super::eval::Eval;
use super::job::{Job, JobType};
use super::location::{Location, LocationKey};
use super::time_window::windows_are_consistent;
use super::travel_matrix::{Duration, ProfileMatrices};
use super::vehicle::Vehicle;

/// The immutable problem model shared by every solver component: jobs,
/// vehicles, deduplicated locations, per-profile travel tables and the
/// precomputed compatibility matrices.
pub struct VehicleRoutingProblem {
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
    locations: Vec<Location>,
    matrices: FxHashMap<String, ProfileMatrices>,
    amount_dimension: usize,

    vehicle_ok_with_job: Vec<Vec<bool>>,
    vehicle_ok_with_vehicle: Vec<Vec<bool>>,
    compatible_vehicles_for_job: Vec<Vec<usize>>,

    has_shipments: bool,
    has_jobs_tw: bool,
}

impl VehicleRoutingProblem {
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, job_rank: usize) -> &Job {
        &self.jobs[job_rank]
    }

    pub fn nb_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, vehicle_rank: usize) -> &Vehicle {
        &self.vehicles[vehicle_rank]
    }

    pub fn nb_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn amount_dimension(&self) -> usize {
        self.amount_dimension
    }

    pub fn zero_amount(&self) -> Amount {
        Amount::zeros(self.amount_dimension)
    }

    pub fn has_shipments(&self) -> bool {
        self.has_shipments
    }

    pub fn has_jobs_tw(&self) -> bool {
        self.has_jobs_tw
    }

    /// Dense matrix index of a job's location.
    pub fn job_index(&self, job_rank: usize) -> usize {
        self.locations[self.jobs[job_rank].location_id()].index()
    }

    pub fn vehicle_start_index(&self, vehicle_rank: usize) -> Option<usize> {
        self.vehicles[vehicle_rank]
            .start_location_id()
            .map(|id| self.locations[id].index())
    }

    pub fn vehicle_end_index(&self, vehicle_rank: usize) -> Option<usize> {
        self.vehicles[vehicle_rank]
            .end_location_id()
            .map(|id| self.locations[id].index())
    }

    pub fn job_setup(&self, vehicle_rank: usize, job_rank: usize) -> Duration {
        self.jobs[job_rank].setup(self.vehicles[vehicle_rank].profile())
    }

    pub fn job_service(&self, vehicle_rank: usize, job_rank: usize) -> Duration {
        self.jobs[job_rank].service(self.vehicles[vehicle_rank].profile())
    }

    /// For a pickup job, the rank of its matching delivery.
    pub fn matching_delivery(&self, pickup_rank: usize) -> usize {
        debug_assert!(self.jobs[pickup_rank].is_pickup());
        pickup_rank + 1
    }

    /// For a delivery job, the rank of its matching pickup.
    pub fn matching_pickup(&self, delivery_rank: usize) -> usize {
        debug_assert!(self.jobs[delivery_rank].is_delivery());
        delivery_rank - 1
    }

    /// Travel evaluation between two dense location indices using the
    /// vehicle's profile, speed factor and cost coefficients.
    /// Deterministic and idempotent.
    pub fn eval(&self, vehicle_rank: usize, from: usize, to: usize) -> Eval {
        let vehicle = &self.vehicles[vehicle_rank];
        let matrices = &self.matrices[vehicle.profile()];

        let duration = vehicle.scale_duration(matrices.durations.get(from, to));
        let distance = matrices.distances.get(from, to);
        let cost = match &matrices.costs {
            Some(costs) => costs.get(from, to),
            None => {
                let coefficients = vehicle.costs();
                coefficients.per_hour * duration / 3600 + coefficients.per_km * distance / 1000
            }
        };

        Eval {
            cost,
            duration,
            distance,
        }
    }

    pub fn duration(&self, vehicle_rank: usize, from: usize, to: usize) -> Duration {
        let vehicle = &self.vehicles[vehicle_rank];
        vehicle.scale_duration(self.matrices[vehicle.profile()].durations.get(from, to))
    }

    pub fn vehicle_ok_with_job(&self, vehicle_rank: usize, job_rank: usize) -> bool {
        self.vehicle_ok_with_job[vehicle_rank][job_rank]
    }

    pub fn vehicle_ok_with_vehicle(&self, v1: usize, v2: usize) -> bool {
        self.vehicle_ok_with_vehicle[v1][v2]
    }

    pub fn compatible_vehicles_for_job(&self, job_rank: usize) -> &[usize] {
        &self.compatible_vehicles_for_job[job_rank]
    }
}

#[derive(Default)]
pub struct VehicleRoutingProblemBuilder {
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
    locations: Vec<Location>,
    matrices: FxHashMap<String, ProfileMatrices>,
}

impl VehicleRoutingProblemBuilder {
    pub fn set_jobs(&mut self, jobs: Vec<Job>) {
        self.jobs = jobs;
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) {
        self.vehicles = vehicles;
    }

    pub fn set_locations(&mut self, locations: Vec<Location>) {
        self.locations = locations;
    }

    pub fn add_matrix(&mut self, profile: String, matrices: ProfileMatrices) {
        self.matrices.insert(profile, matrices);
    }

    pub fn build(self) -> Result<VehicleRoutingProblem, ConfigError> {
        let mut jobs = self.jobs;
        let mut vehicles = self.vehicles;
        let mut locations = self.locations;

        Self::resolve_locations(&mut locations)?;
        let amount_dimension = Self::check_amounts(&mut jobs, &mut vehicles)?;
        Self::check_vehicles(&vehicles)?;
        Self::check_jobs(&jobs)?;
        Self::check_matrices(&self.matrices, &vehicles, &locations)?;

        let vehicle_ok_with_job: Vec<Vec<bool>> = vehicles
            .iter()
            .map(|v| jobs.iter().map(|j| v.ok_with_skills(j)).collect())
            .collect();

        let vehicle_ok_with_vehicle: Vec<Vec<bool>> = (0..vehicles.len())
            .map(|v1| {
                (0..vehicles.len())
                    .map(|v2| {
                        v1 == v2
                            || (0..jobs.len()).any(|j| {
                                vehicle_ok_with_job[v1][j] && vehicle_ok_with_job[v2][j]
                            })
                    })
                    .collect()
            })
            .collect();

        let compatible_vehicles_for_job: Vec<Vec<usize>> = (0..jobs.len())
            .map(|j| {
                (0..vehicles.len())
                    .filter(|&v| {
                        vehicle_ok_with_job[v][j]
                            && jobs[j].delivery().fits_in(vehicles[v].capacity())
                            && jobs[j].pickup().fits_in(vehicles[v].capacity())
                    })
                    .collect()
            })
            .collect();

        let has_shipments = jobs.iter().any(|j| j.job_type() != JobType::Single);
        let has_jobs_tw = jobs.iter().any(|j| !j.has_default_tw());

        Ok(VehicleRoutingProblem {
            jobs,
            vehicles,
            locations,
            matrices: self.matrices,
            amount_dimension,
            vehicle_ok_with_job,
            vehicle_ok_with_vehicle,
            compatible_vehicles_for_job,
            has_shipments,
            has_jobs_tw,
        })
    }

    /// Locations are deduplicated on insertion: entries with the same key
    /// resolve to the same dense index.
    fn resolve_locations(locations: &mut [Location]) -> Result<(), ConfigError> {
        let with_index = locations.iter().filter(|l| l.has_matrix_index()).count();
        if with_index != 0 && with_index != locations.len() {
            return Err(ConfigError::MixedLocationKinds);
        }

        let mut seen: FxHashMap<LocationKey, usize> = FxHashMap::default();
        let mut next_index = 0;

        for location in locations.iter_mut() {
            if location.has_matrix_index() {
                // User-assigned indices are the dense indices.
                continue;
            }
            let key = location.dedup_key();
            let index = *seen.entry(key).or_insert_with(|| {
                let index = next_index;
                next_index += 1;
                index
            });
            location.set_index(index);
        }

        Ok(())
    }

    /// The shared amount dimension is the largest one used anywhere;
    /// every non-empty amount must already have that dimension, empty
    /// amounts are padded with zeros.
    fn check_amounts(
        jobs: &mut [Job],
        vehicles: &mut [Vehicle],
    ) -> Result<usize, ConfigError> {
        let mut dimension = 0;
        for job in jobs.iter() {
            dimension = dimension.max(job.delivery().len()).max(job.pickup().len());
        }
        for vehicle in vehicles.iter() {
            dimension = dimension.max(vehicle.capacity().len());
        }

        for job in jobs.iter() {
            for amount in [job.delivery(), job.pickup()] {
                if !amount.is_empty() && amount.len() != dimension {
                    return Err(ConfigError::AmountDimension {
                        entity: format!("job {}", job.external_id()),
                        expected: dimension,
                        actual: amount.len(),
                    });
                }
            }
        }
        for vehicle in vehicles.iter() {
            if !vehicle.capacity().is_empty() && vehicle.capacity().len() != dimension {
                return Err(ConfigError::AmountDimension {
                    entity: format!("vehicle {}", vehicle.external_id()),
                    expected: dimension,
                    actual: vehicle.capacity().len(),
                });
            }
        }

        for job in jobs.iter_mut() {
            job.normalize_amounts(dimension);
        }
        for vehicle in vehicles.iter_mut() {
            vehicle.normalize_amounts(dimension);
        }

        Ok(dimension)
    }

    fn check_vehicles(vehicles: &[Vehicle]) -> Result<(), ConfigError> {
        for vehicle in vehicles {
            if vehicle.start_location_id().is_none() && vehicle.end_location_id().is_none() {
                return Err(ConfigError::MissingVehicleLocation {
                    id: vehicle.external_id().to_string(),
                });
            }
            if !vehicle.time_window().is_valid() {
                return Err(ConfigError::InvalidTimeWindow {
                    entity: format!("vehicle {}", vehicle.external_id()),
                    start: vehicle.time_window().start,
                    end: vehicle.time_window().end,
                });
            }
            for b in vehicle.breaks() {
                if b.time_windows.is_empty() || !windows_are_consistent(&b.time_windows) {
                    return Err(ConfigError::InconsistentBreaks {
                        id: vehicle.external_id().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_jobs(jobs: &[Job]) -> Result<(), ConfigError> {
        for (rank, job) in jobs.iter().enumerate() {
            if !windows_are_consistent(job.time_windows()) {
                let tw = job.time_windows()[0];
                return Err(ConfigError::InvalidTimeWindow {
                    entity: format!("job {}", job.external_id()),
                    start: tw.start,
                    end: tw.end,
                });
            }

            match job.job_type() {
                JobType::Single => {}
                JobType::Pickup => {
                    let delivery = jobs.get(rank + 1);
                    match delivery {
                        Some(d) if d.is_delivery() => {
                            if job.pickup() != d.delivery() {
                                return Err(ConfigError::ShipmentAmountMismatch {
                                    pickup: job.external_id().to_string(),
                                    delivery: d.external_id().to_string(),
                                });
                            }
                        }
                        _ => {
                            return Err(ConfigError::DanglingShipment {
                                id: job.external_id().to_string(),
                            });
                        }
                    }
                }
                JobType::Delivery => {
                    if rank == 0 || !jobs[rank - 1].is_pickup() {
                        return Err(ConfigError::DanglingShipment {
                            id: job.external_id().to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn check_matrices(
        matrices: &FxHashMap<String, ProfileMatrices>,
        vehicles: &[Vehicle],
        locations: &[Location],
    ) -> Result<(), ConfigError> {
        let max_index = locations.iter().map(Location::index).max().unwrap_or(0);

        for vehicle in vehicles {
            let Some(profile_matrices) = matrices.get(vehicle.profile()) else {
                return Err(ConfigError::MissingMatrix {
                    profile: vehicle.profile().to_string(),
                });
            };
            if profile_matrices.size() <= max_index {
                return Err(ConfigError::MatrixTooSmall {
                    profile: vehicle.profile().to_string(),
                    size: profile_matrices.size(),
                    index: max_index,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::job::JobBuilder;
    use crate::problem::time_window::TimeWindow;
    use crate::problem::vehicle::VehicleBuilder;

    fn basic_job(id: &str, location_id: usize) -> JobBuilder {
        let mut builder = JobBuilder::default();
        builder.set_external_id(String::from(id));
        builder.set_location_id(location_id);
        builder
    }

    fn basic_vehicle(id: &str, location_id: usize) -> VehicleBuilder {
        let mut builder = VehicleBuilder::default();
        builder.set_external_id(String::from(id));
        builder.set_start_location_id(location_id);
        builder
    }

    fn grid_locations(n: usize) -> Vec<Location> {
        (0..n).map(|i| Location::from_cartesian(i as f64, 0.0)).collect()
    }

    #[test]
    fn test_build_computes_compatibility() {
        let locations = grid_locations(3);

        let mut j0 = basic_job("j0", 1);
        j0.add_skill(1);
        let j1 = basic_job("j1", 2);

        let mut v0 = basic_vehicle("v0", 0);
        v0.add_skill(1);
        let v1 = basic_vehicle("v1", 0);

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder.add_matrix(
            String::from("car"),
            ProfileMatrices::from_euclidean(&locations),
        );
        builder.set_locations(locations);
        builder.set_jobs(vec![j0.build(), j1.build()]);
        builder.set_vehicles(vec![v0.build(), v1.build()]);

        let problem = builder.build().unwrap();

        assert!(problem.vehicle_ok_with_job(0, 0));
        assert!(!problem.vehicle_ok_with_job(1, 0));
        assert!(problem.vehicle_ok_with_job(1, 1));
        assert_eq!(problem.compatible_vehicles_for_job(0), &[0]);
        assert_eq!(problem.compatible_vehicles_for_job(1), &[0, 1]);
        assert!(problem.vehicle_ok_with_vehicle(0, 1));
    }

    #[test]
    fn test_capacity_restricts_compatible_vehicles() {
        let locations = grid_locations(2);

        let mut job = basic_job("big", 1);
        job.set_delivery(Amount::from_vec(vec![10]));

        let mut small = basic_vehicle("small", 0);
        small.set_capacity(Amount::from_vec(vec![5]));
        let mut large = basic_vehicle("large", 0);
        large.set_capacity(Amount::from_vec(vec![20]));

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder.add_matrix(
            String::from("car"),
            ProfileMatrices::from_euclidean(&locations),
        );
        builder.set_locations(locations);
        builder.set_jobs(vec![job.build()]);
        builder.set_vehicles(vec![small.build(), large.build()]);

        let problem = builder.build().unwrap();
        assert_eq!(problem.compatible_vehicles_for_job(0), &[1]);
    }

    #[test]
    fn test_vehicle_without_location_is_rejected() {
        let locations = grid_locations(1);
        let mut vehicle = VehicleBuilder::default();
        vehicle.set_external_id(String::from("nowhere"));

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder.add_matrix(
            String::from("car"),
            ProfileMatrices::from_euclidean(&locations),
        );
        builder.set_locations(locations);
        builder.set_vehicles(vec![vehicle.build()]);

        assert!(matches!(
            builder.build(),
            Err(ConfigError::MissingVehicleLocation { .. })
        ));
    }

    #[test]
    fn test_dangling_pickup_is_rejected() {
        let locations = grid_locations(2);
        let mut pickup = basic_job("p", 1);
        pickup.set_job_type(JobType::Pickup);
        pickup.set_pickup(Amount::from_vec(vec![1]));

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder.add_matrix(
            String::from("car"),
            ProfileMatrices::from_euclidean(&locations),
        );
        builder.set_locations(locations);
        builder.set_jobs(vec![pickup.build()]);
        builder.set_vehicles(vec![basic_vehicle("v", 0).build()]);

        assert!(matches!(
            builder.build(),
            Err(ConfigError::DanglingShipment { .. })
        ));
    }

    #[test]
    fn test_shipment_amount_mismatch_is_rejected() {
        let locations = grid_locations(3);
        let mut pickup = basic_job("p", 1);
        pickup.set_job_type(JobType::Pickup);
        pickup.set_pickup(Amount::from_vec(vec![2]));
        let mut delivery = basic_job("d", 2);
        delivery.set_job_type(JobType::Delivery);
        delivery.set_delivery(Amount::from_vec(vec![3]));

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder.add_matrix(
            String::from("car"),
            ProfileMatrices::from_euclidean(&locations),
        );
        builder.set_locations(locations);
        builder.set_jobs(vec![pickup.build(), delivery.build()]);
        builder.set_vehicles(vec![basic_vehicle("v", 0).build()]);

        assert!(matches!(
            builder.build(),
            Err(ConfigError::ShipmentAmountMismatch { .. })
        ));
    }

    #[test]
    fn test_inconsistent_breaks_are_rejected() {
        let locations = grid_locations(1);
        let mut vehicle = basic_vehicle("v", 0);
        vehicle.add_break(crate::problem::vehicle::Break::new(
            String::from("b"),
            vec![TimeWindow::new(20, 10)],
            300,
        ));

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder.add_matrix(
            String::from("car"),
            ProfileMatrices::from_euclidean(&locations),
        );
        builder.set_locations(locations);
        builder.set_vehicles(vec![vehicle.build()]);

        assert!(matches!(
            builder.build(),
            Err(ConfigError::InconsistentBreaks { .. })
        ));
    }

    #[test]
    fn test_eval_uses_speed_factor_and_costs() {
        let locations = grid_locations(2);

        let mut vehicle = basic_vehicle("v", 0);
        vehicle.set_speed_factor(2.0);

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder.add_matrix(
            String::from("car"),
            ProfileMatrices::from_constant(2, 100, 2000),
        );
        builder.set_locations(locations);
        builder.set_jobs(vec![basic_job("j", 1).build()]);
        builder.set_vehicles(vec![vehicle.build()]);

        let problem = builder.build().unwrap();
        let eval = problem.eval(0, 0, 1);

        // duration halved by speed factor; default costs make cost ==
        // duration.
        assert_eq!(eval.duration, 50);
        assert_eq!(eval.cost, 50);
        assert_eq!(eval.distance, 2000);
    }
}
