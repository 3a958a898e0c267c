use fxhash::{FxHashMap, FxHashSet};

use super::amount::Amount;
use super::location::LocationId;
use super::time_window::TimeWindow;
use super::travel_matrix::Duration;

pub type Priority = u32;
pub type Skill = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    Single,
    Pickup,
    Delivery,
}

/// Immutable task description. A pickup job at dense index `p` is always
/// immediately followed by its matching delivery at `p + 1`; this
/// adjacency is the sole pairing mechanism.
#[derive(Debug, Clone)]
pub struct Job {
    external_id: String,
    location_id: LocationId,
    setup: Duration,
    service: Duration,
    setup_overrides: FxHashMap<String, Duration>,
    service_overrides: FxHashMap<String, Duration>,
    delivery: Amount,
    pickup: Amount,
    skills: FxHashSet<Skill>,
    priority: Priority,
    time_windows: Vec<TimeWindow>,
    job_type: JobType,
}

impl Job {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn setup(&self, profile: &str) -> Duration {
        self.setup_overrides
            .get(profile)
            .copied()
            .unwrap_or(self.setup)
    }

    pub fn service(&self, profile: &str) -> Duration {
        self.service_overrides
            .get(profile)
            .copied()
            .unwrap_or(self.service)
    }

    pub fn delivery(&self) -> &Amount {
        &self.delivery
    }

    pub fn pickup(&self) -> &Amount {
        &self.pickup
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn time_windows(&self) -> &[TimeWindow] {
        &self.time_windows
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn is_pickup(&self) -> bool {
        self.job_type == JobType::Pickup
    }

    pub fn is_delivery(&self) -> bool {
        self.job_type == JobType::Delivery
    }

    pub fn has_default_tw(&self) -> bool {
        self.time_windows.len() == 1 && self.time_windows[0].is_default()
    }

    /// Whether some window admits an arrival at `time`.
    pub fn tw_ok(&self, time: Duration) -> bool {
        self.time_windows.iter().any(|tw| tw.contains(time))
    }

    /// Earliest window whose end is still reachable from `time`.
    pub fn first_reachable_tw(&self, time: Duration) -> Option<&TimeWindow> {
        self.time_windows.iter().find(|tw| time <= tw.end)
    }

    /// Deadline of the last usable window.
    pub fn deadline(&self) -> Duration {
        self.time_windows.last().map(|tw| tw.end).unwrap_or(0)
    }

    pub(crate) fn normalize_amounts(&mut self, dimension: usize) {
        self.delivery.resize(dimension);
        self.pickup.resize(dimension);
    }
}

#[derive(Default)]
pub struct JobBuilder {
    external_id: Option<String>,
    location_id: Option<LocationId>,
    setup: Option<Duration>,
    service: Option<Duration>,
    setup_overrides: FxHashMap<String, Duration>,
    service_overrides: FxHashMap<String, Duration>,
    delivery: Option<Amount>,
    pickup: Option<Amount>,
    skills: FxHashSet<Skill>,
    priority: Option<Priority>,
    time_windows: Vec<TimeWindow>,
    job_type: Option<JobType>,
}

impl JobBuilder {
    pub fn set_external_id(&mut self, external_id: String) {
        self.external_id = Some(external_id);
    }

    pub fn set_location_id(&mut self, location_id: LocationId) {
        self.location_id = Some(location_id);
    }

    pub fn set_setup(&mut self, setup: Duration) {
        self.setup = Some(setup);
    }

    pub fn set_service(&mut self, service: Duration) {
        self.service = Some(service);
    }

    pub fn set_setup_override(&mut self, profile: String, setup: Duration) {
        self.setup_overrides.insert(profile, setup);
    }

    pub fn set_service_override(&mut self, profile: String, service: Duration) {
        self.service_overrides.insert(profile, service);
    }

    pub fn set_delivery(&mut self, delivery: Amount) {
        self.delivery = Some(delivery);
    }

    pub fn set_pickup(&mut self, pickup: Amount) {
        self.pickup = Some(pickup);
    }

    pub fn add_skill(&mut self, skill: Skill) {
        self.skills.insert(skill);
    }

    pub fn set_skills(&mut self, skills: FxHashSet<Skill>) {
        self.skills = skills;
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = Some(priority);
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) {
        self.time_windows.push(time_window);
    }

    pub fn set_job_type(&mut self, job_type: JobType) {
        self.job_type = Some(job_type);
    }

    pub fn build(self) -> Job {
        let mut time_windows = self.time_windows;
        if time_windows.is_empty() {
            time_windows.push(TimeWindow::default());
        }
        time_windows.sort();

        Job {
            external_id: self.external_id.expect("job external id is required"),
            location_id: self.location_id.expect("job location is required"),
            setup: self.setup.unwrap_or(0),
            service: self.service.unwrap_or(0),
            setup_overrides: self.setup_overrides,
            service_overrides: self.service_overrides,
            delivery: self.delivery.unwrap_or_default(),
            pickup: self.pickup.unwrap_or_default(),
            skills: self.skills,
            priority: self.priority.unwrap_or(0),
            time_windows,
            job_type: self.job_type.unwrap_or(JobType::Single),
        }
    }
}
