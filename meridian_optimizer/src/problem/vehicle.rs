use fxhash::FxHashSet;

use super::amount::Amount;
use super::job::{Job, Skill};
use super::location::LocationId;
use super::time_window::TimeWindow;
use super::travel_matrix::{Cost, Distance, Duration};

pub type VehicleId = usize;

pub const DEFAULT_PROFILE: &str = "car";

/// Cost coefficients. With the defaults, cost equals travel duration in
/// seconds, which keeps cost and duration interchangeable for problems
/// that do not price vehicles explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleCosts {
    pub fixed: Cost,
    pub per_hour: Cost,
    pub per_km: Cost,
}

impl Default for VehicleCosts {
    fn default() -> Self {
        VehicleCosts {
            fixed: 0,
            per_hour: 3600,
            per_km: 0,
        }
    }
}

/// A driver break: a service duration that must start within one of the
/// permitted windows, optionally with a cap on the load carried while the
/// break is taken.
#[derive(Debug, Clone)]
pub struct Break {
    pub external_id: String,
    pub time_windows: Vec<TimeWindow>,
    pub service: Duration,
    pub max_load: Option<Amount>,
}

impl Break {
    pub fn new(external_id: String, time_windows: Vec<TimeWindow>, service: Duration) -> Self {
        Break {
            external_id,
            time_windows,
            service,
            max_load: None,
        }
    }

    pub fn with_max_load(mut self, max_load: Amount) -> Self {
        self.max_load = Some(max_load);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    external_id: String,
    profile: String,
    start_location_id: Option<LocationId>,
    end_location_id: Option<LocationId>,
    capacity: Amount,
    skills: FxHashSet<Skill>,
    time_window: TimeWindow,
    breaks: Vec<Break>,
    speed_factor: f64,
    max_tasks: usize,
    max_travel_time: Option<Duration>,
    max_distance: Option<Distance>,
    costs: VehicleCosts,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn start_location_id(&self) -> Option<LocationId> {
        self.start_location_id
    }

    pub fn end_location_id(&self) -> Option<LocationId> {
        self.end_location_id
    }

    pub fn capacity(&self) -> &Amount {
        &self.capacity
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn breaks(&self) -> &[Break] {
        &self.breaks
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    pub fn max_travel_time(&self) -> Option<Duration> {
        self.max_travel_time
    }

    pub fn max_distance(&self) -> Option<Distance> {
        self.max_distance
    }

    pub fn costs(&self) -> &VehicleCosts {
        &self.costs
    }

    pub fn fixed_cost(&self) -> Cost {
        self.costs.fixed
    }

    /// Skill compatibility: the vehicle must carry every skill the job
    /// requires.
    pub fn ok_with_skills(&self, job: &Job) -> bool {
        job.skills().is_subset(&self.skills)
    }

    pub fn ok_for_travel_time(&self, duration: Duration) -> bool {
        self.max_travel_time.is_none_or(|max| duration <= max)
    }

    pub fn ok_for_distance(&self, distance: Distance) -> bool {
        self.max_distance.is_none_or(|max| distance <= max)
    }

    /// Matrix durations are divided by the speed factor, rounded toward
    /// zero.
    pub fn scale_duration(&self, duration: Duration) -> Duration {
        if self.speed_factor == 1.0 {
            duration
        } else {
            (duration as f64 / self.speed_factor) as Duration
        }
    }

    pub(crate) fn normalize_amounts(&mut self, dimension: usize) {
        self.capacity.resize(dimension);
        for b in &mut self.breaks {
            if let Some(max_load) = &mut b.max_load {
                max_load.resize(dimension);
            }
        }
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    profile: Option<String>,
    start_location_id: Option<LocationId>,
    end_location_id: Option<LocationId>,
    capacity: Option<Amount>,
    skills: FxHashSet<Skill>,
    time_window: Option<TimeWindow>,
    breaks: Vec<Break>,
    speed_factor: Option<f64>,
    max_tasks: Option<usize>,
    max_travel_time: Option<Duration>,
    max_distance: Option<Distance>,
    costs: Option<VehicleCosts>,
}

impl VehicleBuilder {
    pub fn set_external_id(&mut self, external_id: String) {
        self.external_id = Some(external_id);
    }

    pub fn set_profile(&mut self, profile: String) {
        self.profile = Some(profile);
    }

    pub fn set_start_location_id(&mut self, location_id: LocationId) {
        self.start_location_id = Some(location_id);
    }

    pub fn set_end_location_id(&mut self, location_id: LocationId) {
        self.end_location_id = Some(location_id);
    }

    pub fn set_capacity(&mut self, capacity: Amount) {
        self.capacity = Some(capacity);
    }

    pub fn add_skill(&mut self, skill: Skill) {
        self.skills.insert(skill);
    }

    pub fn set_skills(&mut self, skills: FxHashSet<Skill>) {
        self.skills = skills;
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) {
        self.time_window = Some(time_window);
    }

    pub fn add_break(&mut self, b: Break) {
        self.breaks.push(b);
    }

    pub fn set_speed_factor(&mut self, speed_factor: f64) {
        self.speed_factor = Some(speed_factor);
    }

    pub fn set_max_tasks(&mut self, max_tasks: usize) {
        self.max_tasks = Some(max_tasks);
    }

    pub fn set_max_travel_time(&mut self, max_travel_time: Duration) {
        self.max_travel_time = Some(max_travel_time);
    }

    pub fn set_max_distance(&mut self, max_distance: Distance) {
        self.max_distance = Some(max_distance);
    }

    pub fn set_costs(&mut self, costs: VehicleCosts) {
        self.costs = Some(costs);
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            external_id: self.external_id.expect("vehicle external id is required"),
            profile: self.profile.unwrap_or_else(|| String::from(DEFAULT_PROFILE)),
            start_location_id: self.start_location_id,
            end_location_id: self.end_location_id,
            capacity: self.capacity.unwrap_or_default(),
            skills: self.skills,
            time_window: self.time_window.unwrap_or_default(),
            breaks: self.breaks,
            speed_factor: self.speed_factor.unwrap_or(1.0),
            max_tasks: self.max_tasks.unwrap_or(usize::MAX),
            max_travel_time: self.max_travel_time,
            max_distance: self.max_distance,
            costs: self.costs.unwrap_or_default(),
        }
    }
}
