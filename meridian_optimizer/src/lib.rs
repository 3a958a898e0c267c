pub mod error;
pub mod problem;
pub mod solver;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::ConfigError;
pub use problem::vehicle_routing_problem::{
    VehicleRoutingProblem, VehicleRoutingProblemBuilder,
};
pub use solver::solution::solution::Solution;
pub use solver::solver::Solver;
pub use solver::solver_params::SolverParams;
