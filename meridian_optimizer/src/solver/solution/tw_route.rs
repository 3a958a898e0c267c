use std::ops::Deref;

use crate::error::ConfigError;
use crate::problem::amount::Amount;
use crate::problem::travel_matrix::Duration;
use crate::problem::vehicle::Vehicle;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::raw_route::RawRoute;

/// Earliest placement of one break within a leg, with the share of the
/// leg's travel performed before the break starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ForwardPlacement {
    earliest: Duration,
    margin_before: Duration,
}

/// Latest placement of one break within a leg, with the share of the
/// leg's travel performed after the break ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BackwardPlacement {
    latest: Duration,
    margin_after: Duration,
}

/// Sentinel for schedule slots whose date has not been computed yet.
const STALE: Duration = -1;

/// Route variant that also maintains earliest/latest schedules and break
/// placements on top of the raw load profile.
///
/// `earliest[r]`/`latest[r]` bound the service start at rank `r`;
/// `action_times[r]` is the setup+service actually charged there (setup
/// only when the location changes from the previous step). Breaks are
/// anchored to rank boundaries: `breaks_at_rank[b]` counts the vehicle
/// breaks taken between ranks `b - 1` and `b` (boundary 0 is before the
/// first job, boundary `len` before the end leg).
#[derive(Clone)]
pub struct TwRoute {
    raw: RawRoute,

    pub earliest: Vec<Duration>,
    pub latest: Vec<Duration>,
    pub action_times: Vec<Duration>,

    pub breaks_at_rank: Vec<usize>,
    pub breaks_counts: Vec<usize>,
    pub break_earliest: Vec<Duration>,
    pub break_latest: Vec<Duration>,
    pub breaks_travel_margin_before: Vec<Duration>,
    pub breaks_travel_margin_after: Vec<Duration>,

    pub earliest_end: Duration,
    v_start: Duration,
    v_end: Duration,
}

impl Deref for TwRoute {
    type Target = RawRoute;

    fn deref(&self) -> &RawRoute {
        &self.raw
    }
}

impl TwRoute {
    pub fn new(
        problem: &VehicleRoutingProblem,
        vehicle_rank: usize,
    ) -> Result<Self, ConfigError> {
        let vehicle = problem.vehicle(vehicle_rank);
        let nb_breaks = vehicle.breaks().len();

        let mut route = TwRoute {
            raw: RawRoute::new(problem, vehicle_rank),
            earliest: Vec::new(),
            latest: Vec::new(),
            action_times: Vec::new(),
            breaks_at_rank: vec![nb_breaks],
            breaks_counts: vec![nb_breaks],
            break_earliest: vec![0; nb_breaks],
            break_latest: vec![0; nb_breaks],
            breaks_travel_margin_before: vec![0; nb_breaks],
            breaks_travel_margin_after: vec![0; nb_breaks],
            earliest_end: vehicle.time_window().start,
            v_start: vehicle.time_window().start,
            v_end: vehicle.time_window().end,
        };

        if !route.try_update_schedule(problem, 0, 0) {
            return Err(ConfigError::InconsistentBreaks {
                id: vehicle.external_id().to_string(),
            });
        }

        Ok(route)
    }

    pub fn raw(&self) -> &RawRoute {
        &self.raw
    }

    pub fn vehicle_start(&self) -> Duration {
        self.v_start
    }

    pub fn vehicle_end(&self) -> Duration {
        self.v_end
    }

    fn location_at(&self, problem: &VehicleRoutingProblem, rank: usize) -> usize {
        problem.job_index(self.raw.route[rank])
    }

    /// Breaks anchored at boundaries `[first, last]`, as an index range
    /// into the vehicle's break list.
    fn breaks_in_boundaries(&self, first: usize, last: usize) -> (usize, usize) {
        let lo = self.breaks_counts[first] - self.breaks_at_rank[first];
        let hi = self.breaks_counts[last];
        (lo, hi)
    }

    /// Earliest arrival at the end of a leg of the given travel time, with
    /// the breaks `break_lo..break_hi` taken along the way. `None` when a
    /// break misses all of its windows.
    fn walk_leg_forward(
        vehicle: &Vehicle,
        break_lo: usize,
        break_hi: usize,
        departure: Duration,
        travel: Duration,
        placements: Option<&mut Vec<ForwardPlacement>>,
    ) -> Option<Duration> {
        let mut remaining = travel;
        let mut current = departure;
        let mut placements = placements;

        for b in &vehicle.breaks()[break_lo..break_hi] {
            let tw = b.time_windows.iter().find(|tw| current <= tw.end)?;
            let margin_before = remaining.min((tw.start - current).max(0));
            let earliest = (current + margin_before).max(tw.start);

            if let Some(out) = placements.as_deref_mut() {
                out.push(ForwardPlacement {
                    earliest,
                    margin_before,
                });
            }

            remaining -= margin_before;
            current = earliest + b.service;
        }

        Some(current + remaining)
    }

    /// Latest completion time of the action preceding a leg, given the
    /// deadline for arriving at its end.
    fn walk_leg_backward(
        vehicle: &Vehicle,
        break_lo: usize,
        break_hi: usize,
        arrival_deadline: Duration,
        travel: Duration,
        placements: Option<&mut Vec<BackwardPlacement>>,
    ) -> Option<Duration> {
        let mut remaining = travel;
        let mut current = arrival_deadline;
        let mut placements = placements;

        for b in vehicle.breaks()[break_lo..break_hi].iter().rev() {
            // Latest start within some window whose service still ends by
            // `current`; windows are ordered so scan from the back.
            let latest = b.time_windows.iter().rev().find_map(|tw| {
                let start = (current - b.service).min(tw.end);
                (start >= tw.start).then_some(start)
            })?;

            let margin_after = remaining.min((current - (latest + b.service)).max(0));

            if let Some(out) = placements.as_deref_mut() {
                out.push(BackwardPlacement {
                    latest,
                    margin_after,
                });
            }

            remaining -= margin_after;
            current = latest;
        }

        if let Some(out) = placements.as_deref_mut() {
            out.reverse();
        }

        Some(current - remaining)
    }

    fn setup_at(
        problem: &VehicleRoutingProblem,
        vehicle_rank: usize,
        job_rank: usize,
        previous_location: Option<usize>,
    ) -> Duration {
        let location = problem.job_index(job_rank);
        if previous_location == Some(location) {
            0
        } else {
            problem.job_setup(vehicle_rank, job_rank)
        }
    }

    fn compute_action_times(&mut self, problem: &VehicleRoutingProblem) {
        let v = self.raw.vehicle_rank;
        let n = self.raw.len();
        self.action_times.resize(n, 0);

        let mut previous_location = problem.vehicle_start_index(v);
        for i in 0..n {
            let job_rank = self.raw.route[i];
            let setup = Self::setup_at(problem, v, job_rank, previous_location);
            self.action_times[i] = setup + problem.job_service(v, job_rank);
            previous_location = Some(problem.job_index(job_rank));
        }
    }

    fn refresh_breaks_counts(&mut self) {
        self.breaks_counts.resize(self.breaks_at_rank.len(), 0);
        let mut total = 0;
        for (i, &count) in self.breaks_at_rank.iter().enumerate() {
            total += count;
            self.breaks_counts[i] = total;
        }
    }

    /// Greedy break re-anchoring: walk a break-less schedule and attach
    /// each break to the first boundary reached after its first window
    /// opens. Returns the proposed anchoring.
    fn propose_break_anchors(&self, problem: &VehicleRoutingProblem) -> Vec<usize> {
        let v = self.raw.vehicle_rank;
        let vehicle = problem.vehicle(v);
        let n = self.raw.len();

        let mut boundary_times = Vec::with_capacity(n + 1);
        let mut current = self.v_start;
        let mut previous_location = problem.vehicle_start_index(v);

        for i in 0..n {
            let job_rank = self.raw.route[i];
            let location = problem.job_index(job_rank);
            let travel = match previous_location {
                Some(from) => problem.duration(v, from, location),
                None => 0,
            };
            let arrival = current + travel;
            boundary_times.push(arrival);

            let begin = problem
                .job(job_rank)
                .first_reachable_tw(arrival)
                .map_or(arrival, |tw| arrival.max(tw.start));
            let setup = Self::setup_at(problem, v, job_rank, previous_location);
            current = begin + setup + problem.job_service(v, job_rank);
            previous_location = Some(location);
        }
        boundary_times.push(current);

        let mut anchors = vec![0; n + 1];
        let mut previous_anchor = 0;
        for b in vehicle.breaks() {
            let open = b.time_windows[0].start;
            let close = b.time_windows.last().map_or(open, |tw| tw.end);

            let mut rank = (previous_anchor..=n)
                .find(|&r| boundary_times[r] >= open)
                .unwrap_or(n);
            if boundary_times[rank] > close && rank > previous_anchor {
                rank -= 1;
            }

            anchors[rank] += 1;
            previous_anchor = rank;
        }

        anchors
    }

    /// Marks every schedule slot stale so the next passes recompute it;
    /// computed dates are never negative, which makes -1 a safe sentinel.
    fn invalidate_schedule(&mut self) {
        self.earliest.fill(STALE);
        self.latest.fill(STALE);
    }

    /// Schedule recompute after a mutation that replaced ranks starting at
    /// `first_rank` with `added` jobs: action times, break anchoring, a
    /// forward earliest pass and a backward latest pass, both allowed to
    /// stop early only outside the mutated zone. Returns false when no
    /// consistent schedule exists for the current sequence.
    fn try_update_schedule(
        &mut self,
        problem: &VehicleRoutingProblem,
        first_rank: usize,
        added: usize,
    ) -> bool {
        let n = self.raw.len();

        self.compute_action_times(problem);
        self.earliest.resize(n, STALE);
        self.latest.resize(n, STALE);
        self.breaks_at_rank.resize(n + 1, 0);
        self.refresh_breaks_counts();

        if !problem.vehicle(self.raw.vehicle_rank).breaks().is_empty() {
            let anchors = self.propose_break_anchors(problem);
            if anchors != self.breaks_at_rank {
                let previous = std::mem::replace(&mut self.breaks_at_rank, anchors);
                self.refresh_breaks_counts();
                self.invalidate_schedule();
                if !self.run_passes(problem, 0, 0) {
                    // The greedy anchoring may overconstrain; fall back to
                    // the placement the mutation left behind.
                    self.breaks_at_rank = previous;
                    self.refresh_breaks_counts();
                    self.invalidate_schedule();
                    return self.run_passes(problem, 0, 0);
                }
                return true;
            }
        }

        self.run_passes(problem, first_rank, added)
    }

    fn finish_mutation(&mut self, problem: &VehicleRoutingProblem, first_rank: usize, added: usize) {
        assert!(
            self.try_update_schedule(problem, first_rank, added),
            "schedule update on an unvalidated route mutation"
        );
    }

    /// Full recompute of the whole schedule.
    pub fn update_schedule(&mut self, problem: &VehicleRoutingProblem) {
        self.invalidate_schedule();
        self.finish_mutation(problem, 0, self.raw.len());
    }

    fn run_passes(
        &mut self,
        problem: &VehicleRoutingProblem,
        first_rank: usize,
        added: usize,
    ) -> bool {
        let n = self.raw.len();
        // An early stop is only sound where the sequence structure is
        // untouched: past the zone for the forward pass, before it for the
        // backward one. Stale slots never compare equal anyway.
        let fwd_stop_from = first_rank + added;
        let bwd_start = (first_rank + added).min(n.saturating_sub(1));

        self.fwd_update_earliest_from(problem, first_rank, fwd_stop_from)
            && self.bwd_update_latest_from(problem, bwd_start, first_rank)
            && self
                .earliest
                .iter()
                .zip(&self.latest)
                .all(|(e, l)| e <= l)
    }

    /// Forward pass: recomputes `earliest[i]` for `i >= rank`, choosing
    /// for each job the earliest window whose end is still reachable and
    /// placing the leg's breaks greedily. Stops as soon as a value no
    /// longer changes past the mutated zone.
    fn fwd_update_earliest_from(
        &mut self,
        problem: &VehicleRoutingProblem,
        rank: usize,
        stop_ok_from: usize,
    ) -> bool {
        let v = self.raw.vehicle_rank;
        let vehicle = problem.vehicle(v);
        let n = self.raw.len();

        let mut placements = Vec::new();
        let mut current;
        let mut previous_location;

        if rank == 0 {
            current = self.v_start;
            previous_location = problem.vehicle_start_index(v);
        } else {
            current = self.earliest[rank - 1] + self.action_times[rank - 1];
            previous_location = Some(self.location_at(problem, rank - 1));
        }

        for i in rank..n {
            let job_rank = self.raw.route[i];
            let location = problem.job_index(job_rank);
            let travel = match previous_location {
                Some(from) => problem.duration(v, from, location),
                None => 0,
            };

            let (break_lo, break_hi) = self.breaks_in_boundaries(i, i);
            placements.clear();
            let Some(arrival) = Self::walk_leg_forward(
                vehicle,
                break_lo,
                break_hi,
                current,
                travel,
                Some(&mut placements),
            ) else {
                return false;
            };
            for (offset, placement) in placements.iter().enumerate() {
                self.break_earliest[break_lo + offset] = placement.earliest;
                self.breaks_travel_margin_before[break_lo + offset] = placement.margin_before;
            }

            let Some(tw) = problem.job(job_rank).first_reachable_tw(arrival) else {
                return false;
            };
            let earliest = arrival.max(tw.start);

            if i >= stop_ok_from && earliest == self.earliest[i] {
                // Unchanged date on an unchanged suffix: nothing
                // downstream can change either.
                return true;
            }

            self.earliest[i] = earliest;
            current = earliest + self.action_times[i];
            previous_location = Some(location);
        }

        // End leg, with the trailing breaks.
        let travel = match (previous_location, problem.vehicle_end_index(v)) {
            (Some(from), Some(to)) => problem.duration(v, from, to),
            _ => 0,
        };
        let (break_lo, break_hi) = self.breaks_in_boundaries(n, n);
        placements.clear();
        let Some(end) = Self::walk_leg_forward(
            vehicle,
            break_lo,
            break_hi,
            current,
            travel,
            Some(&mut placements),
        ) else {
            return false;
        };
        for (offset, placement) in placements.iter().enumerate() {
            self.break_earliest[break_lo + offset] = placement.earliest;
            self.breaks_travel_margin_before[break_lo + offset] = placement.margin_before;
        }

        self.earliest_end = end;
        end <= self.v_end
    }

    /// Backward pass: tightens `latest[i]` walking leftward from `rank`,
    /// seeding the deadline from the (unchanged) successor when there is
    /// one. Stops as soon as a value no longer changes before the mutated
    /// zone.
    fn bwd_update_latest_from(
        &mut self,
        problem: &VehicleRoutingProblem,
        rank: usize,
        stop_ok_until: usize,
    ) -> bool {
        let v = self.raw.vehicle_rank;
        let vehicle = problem.vehicle(v);
        let n = self.raw.len();

        let mut placements = Vec::new();
        let mut deadline = if rank + 1 < n {
            self.latest[rank + 1]
        } else {
            self.v_end
        };

        for i in (0..n.min(rank + 1)).rev() {
            let job_rank = self.raw.route[i];
            let location = problem.job_index(job_rank);

            let (to, break_boundary) = if i + 1 < n {
                (self.location_at(problem, i + 1), i + 1)
            } else {
                match problem.vehicle_end_index(v) {
                    Some(end) => (end, n),
                    None => {
                        // No end leg: the action itself must finish by the
                        // shift end, and the trailing breaks still apply.
                        (location, n)
                    }
                }
            };
            let travel = if i + 1 == n && problem.vehicle_end_index(v).is_none() {
                0
            } else {
                problem.duration(v, location, to)
            };

            let (break_lo, break_hi) = self.breaks_in_boundaries(break_boundary, break_boundary);
            placements.clear();
            let Some(completion) = Self::walk_leg_backward(
                vehicle,
                break_lo,
                break_hi,
                deadline,
                travel,
                Some(&mut placements),
            ) else {
                return false;
            };
            for (offset, placement) in placements.iter().enumerate() {
                self.break_latest[break_lo + offset] = placement.latest;
                self.breaks_travel_margin_after[break_lo + offset] = placement.margin_after;
            }

            let candidate = completion - self.action_times[i];
            let job = problem.job(job_rank);
            let Some(latest) = job
                .time_windows()
                .iter()
                .rev()
                .find_map(|tw| (tw.start <= candidate).then_some(candidate.min(tw.end)))
            else {
                return false;
            };

            if latest < self.earliest[i] {
                return false;
            }
            if i <= stop_ok_until && latest == self.latest[i] {
                // Unchanged date on an unchanged prefix.
                return self.bwd_check_start(problem);
            }
            self.latest[i] = latest;
            deadline = latest;
        }

        // Leading breaks (boundary 0) must fit between the shift start and
        // the first deadline.
        let first_travel = if n > 0 {
            match problem.vehicle_start_index(v) {
                Some(from) => problem.duration(v, from, self.location_at(problem, 0)),
                None => 0,
            }
        } else {
            match (problem.vehicle_start_index(v), problem.vehicle_end_index(v)) {
                (Some(from), Some(to)) => problem.duration(v, from, to),
                _ => 0,
            }
        };
        let (break_lo, break_hi) = self.breaks_in_boundaries(0, 0);
        placements.clear();
        let Some(completion) = Self::walk_leg_backward(
            vehicle,
            break_lo,
            break_hi,
            deadline,
            first_travel,
            Some(&mut placements),
        ) else {
            return false;
        };
        for (offset, placement) in placements.iter().enumerate() {
            self.break_latest[break_lo + offset] = placement.latest;
            self.breaks_travel_margin_after[break_lo + offset] = placement.margin_after;
        }

        completion >= self.v_start
    }

    /// Re-checks only the boundary-0 breaks against the (unchanged)
    /// first deadline; used when the backward pass stops early.
    fn bwd_check_start(&mut self, problem: &VehicleRoutingProblem) -> bool {
        let v = self.raw.vehicle_rank;
        let vehicle = problem.vehicle(v);

        let deadline = if self.raw.is_empty() {
            self.v_end
        } else {
            self.latest[0]
        };
        let travel = if self.raw.is_empty() {
            match (problem.vehicle_start_index(v), problem.vehicle_end_index(v)) {
                (Some(from), Some(to)) => problem.duration(v, from, to),
                _ => 0,
            }
        } else {
            match problem.vehicle_start_index(v) {
                Some(from) => problem.duration(v, from, self.location_at(problem, 0)),
                None => 0,
            }
        };

        let (break_lo, break_hi) = self.breaks_in_boundaries(0, 0);
        match Self::walk_leg_backward(vehicle, break_lo, break_hi, deadline, travel, None) {
            Some(completion) => completion >= self.v_start,
            None => false,
        }
    }

    /// Simulates replacing ranks `[first_rank, last_rank)` with the given
    /// jobs, without mutating. Fails when no job time window admits the
    /// arrival, when a break cannot be fit, when a break's max load is
    /// exceeded, or when the successor's latest date is violated.
    pub fn is_valid_addition_for_tw(
        &self,
        problem: &VehicleRoutingProblem,
        delivery: &Amount,
        jobs: impl Iterator<Item = usize> + Clone,
        first_rank: usize,
        last_rank: usize,
    ) -> bool {
        debug_assert!(first_rank <= last_rank && last_rank <= self.raw.len());
        let v = self.raw.vehicle_rank;
        let vehicle = problem.vehicle(v);
        let n = self.raw.len();

        let mut current;
        let mut previous_location;
        if first_rank == 0 {
            current = self.v_start;
            previous_location = problem.vehicle_start_index(v);
        } else {
            current = self.earliest[first_rank - 1] + self.action_times[first_rank - 1];
            previous_location = Some(self.location_at(problem, first_rank - 1));
        }

        // Breaks anchored in the replaced zone are re-placed greedily on
        // the first new leg, exactly as `replace` will leave them.
        let (pending_lo, pending_hi) = self.breaks_in_boundaries(first_rank, last_rank);

        // Load tracking for break max-load caps.
        let removed_deliveries = self.raw.delivery_in_range(first_rank, last_rank);
        let mut load = &(self.raw.load_at_step(first_rank) - &removed_deliveries) + delivery;
        if !self.break_load_ok(vehicle, pending_lo, pending_hi, &load) {
            return false;
        }

        let mut first_leg = true;
        for job_rank in jobs {
            let job = problem.job(job_rank);
            let location = problem.job_index(job_rank);
            let travel = match previous_location {
                Some(from) => problem.duration(v, from, location),
                None => 0,
            };

            let (lo, hi) = if first_leg {
                (pending_lo, pending_hi)
            } else {
                (pending_hi, pending_hi)
            };
            let Some(arrival) =
                Self::walk_leg_forward(vehicle, lo, hi, current, travel, None)
            else {
                return false;
            };
            first_leg = false;

            let Some(tw) = job.first_reachable_tw(arrival) else {
                return false;
            };
            let begin = arrival.max(tw.start);
            let setup = Self::setup_at(problem, v, job_rank, previous_location);
            current = begin + setup + problem.job_service(v, job_rank);
            previous_location = Some(location);

            load -= job.delivery();
            load += job.pickup();
        }

        let (remaining_lo, remaining_hi) = if first_leg {
            (pending_lo, pending_hi)
        } else {
            (pending_hi, pending_hi)
        };

        if last_rank < n {
            let location = self.location_at(problem, last_rank);
            let travel = match previous_location {
                Some(from) => problem.duration(v, from, location),
                None => 0,
            };
            let Some(arrival) =
                Self::walk_leg_forward(vehicle, remaining_lo, remaining_hi, current, travel, None)
            else {
                return false;
            };
            arrival <= self.latest[last_rank]
        } else {
            let travel = match (previous_location, problem.vehicle_end_index(v)) {
                (Some(from), Some(to)) => problem.duration(v, from, to),
                _ => 0,
            };
            let Some(end) =
                Self::walk_leg_forward(vehicle, remaining_lo, remaining_hi, current, travel, None)
            else {
                return false;
            };
            end <= self.v_end
        }
    }

    fn break_load_ok(
        &self,
        vehicle: &Vehicle,
        break_lo: usize,
        break_hi: usize,
        load: &Amount,
    ) -> bool {
        vehicle.breaks()[break_lo..break_hi]
            .iter()
            .all(|b| b.max_load.as_ref().is_none_or(|max| load.fits_in(max)))
    }

    /// Total waiting time implied by the earliest schedule.
    pub fn total_waiting(&self, problem: &VehicleRoutingProblem) -> Duration {
        let v = self.raw.vehicle_rank;
        let n = self.raw.len();
        let mut waiting = 0;
        let mut previous_location = problem.vehicle_start_index(v);
        let mut current = self.v_start;

        for i in 0..n {
            let location = self.location_at(problem, i);
            let travel = match previous_location {
                Some(from) => problem.duration(v, from, location),
                None => 0,
            };
            // Break service in the leg shrinks apparent waiting; keep the
            // simple definition of wait before service start.
            let (break_lo, break_hi) = self.breaks_in_boundaries(i, i);
            let break_service: Duration = problem.vehicle(v).breaks()[break_lo..break_hi]
                .iter()
                .map(|b| b.service)
                .sum();
            let arrival = current + travel + break_service;
            waiting += (self.earliest[i] - arrival).max(0);
            current = self.earliest[i] + self.action_times[i];
            previous_location = Some(location);
        }

        waiting
    }

    // Mutating primitives. Schedule arrays are spliced in parallel with
    // the raw sequence, then recomputed.

    pub fn insert(&mut self, problem: &VehicleRoutingProblem, job_rank: usize, rank: usize) {
        self.raw.insert(problem, job_rank, rank);
        self.earliest.insert(rank, STALE);
        self.latest.insert(rank, STALE);
        self.breaks_at_rank.insert(rank + 1, 0);
        self.finish_mutation(problem, rank, 1);
    }

    pub fn remove(&mut self, problem: &VehicleRoutingProblem, rank: usize, count: usize) {
        self.raw.remove(problem, rank, count);
        self.earliest.drain(rank..rank + count);
        self.latest.drain(rank..rank + count);
        let displaced: usize = self.breaks_at_rank[rank + 1..rank + 1 + count].iter().sum();
        self.breaks_at_rank.drain(rank + 1..rank + 1 + count);
        self.breaks_at_rank[rank] += displaced;
        self.finish_mutation(problem, rank, 0);
    }

    pub fn replace(
        &mut self,
        problem: &VehicleRoutingProblem,
        jobs: impl Iterator<Item = usize>,
        first_rank: usize,
        last_rank: usize,
    ) {
        let added: Vec<usize> = jobs.collect();

        // Breaks strictly inside the zone collapse onto its first
        // boundary, matching the validity simulation.
        let displaced: usize = self.breaks_at_rank[first_rank + 1..last_rank + 1]
            .iter()
            .sum();
        self.breaks_at_rank.drain(first_rank + 1..last_rank + 1);
        self.breaks_at_rank[first_rank] += displaced;
        for _ in 0..added.len() {
            self.breaks_at_rank.insert(first_rank + 1, 0);
        }

        self.earliest
            .splice(first_rank..last_rank, added.iter().map(|_| STALE));
        self.latest
            .splice(first_rank..last_rank, added.iter().map(|_| STALE));

        let added_count = added.len();
        self.raw
            .replace(problem, added.into_iter(), first_rank, last_rank);
        self.finish_mutation(problem, first_rank, added_count);
    }

    pub fn set_route(&mut self, problem: &VehicleRoutingProblem, jobs: Vec<usize>) {
        let len = self.raw.len();
        self.replace(problem, jobs.into_iter(), 0, len);
    }
}
