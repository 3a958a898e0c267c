pub mod amount;
pub mod eval;
pub mod job;
pub mod location;
pub mod time_window;
pub mod travel_matrix;
pub mod vehicle;
pub mod vehicle_routing_problem;
