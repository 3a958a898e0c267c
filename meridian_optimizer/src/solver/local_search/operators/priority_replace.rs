use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::sequence_replace_delta;
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext, route_caps_ok};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Priority-Replace**
///
/// Replaces a contiguous prefix or suffix of a route with a single
/// unassigned job of strictly higher priority than everything it
/// displaces. Candidates are ranked by (priority gain, assigned count,
/// cost gain), lexicographically.
pub struct PriorityReplace {
    pub vehicle: usize,
    /// Replace `[0, s_rank)` when `at_start`, `[s_rank, len)` otherwise.
    pub s_rank: usize,
    pub at_start: bool,
    pub unassigned_job: usize,
    delta: Eval,
    priority_gain: i64,
    assigned_delta: i64,
}

impl PriorityReplace {
    pub fn evaluate(
        ctx: &MoveContext,
        vehicle: usize,
        s_rank: usize,
        unassigned_job: usize,
    ) -> Option<Self> {
        let route = &ctx.routes[vehicle];
        if route.is_empty()
            || ctx.problem.job(unassigned_job).job_type() != JobType::Single
            || !ctx.problem.vehicle_ok_with_job(vehicle, unassigned_job)
        {
            return None;
        }
        let priority = i64::from(ctx.problem.job(unassigned_job).priority());

        let mut best: Option<PriorityReplace> = None;

        // Prefix [0, s_rank).
        if 0 < s_rank && s_rank <= route.len() {
            let removed_priority = i64::from(ctx.state.fwd_priority[vehicle][s_rank - 1]);
            let priority_gain = priority - removed_priority;
            if priority_gain > 0 {
                let delta = sequence_replace_delta(
                    ctx.problem,
                    route,
                    std::iter::once(unassigned_job),
                    0,
                    s_rank,
                );
                best = Some(PriorityReplace {
                    vehicle,
                    s_rank,
                    at_start: true,
                    unassigned_job,
                    delta,
                    priority_gain,
                    assigned_delta: 1 - s_rank as i64,
                });
            }
        }

        // Suffix [s_rank, len).
        if s_rank < route.len() {
            let removed_priority = i64::from(ctx.state.bwd_priority[vehicle][s_rank]);
            let priority_gain = priority - removed_priority;
            if priority_gain > 0 {
                let delta = sequence_replace_delta(
                    ctx.problem,
                    route,
                    std::iter::once(unassigned_job),
                    s_rank,
                    route.len(),
                );
                let candidate = PriorityReplace {
                    vehicle,
                    s_rank,
                    at_start: false,
                    unassigned_job,
                    delta,
                    priority_gain,
                    assigned_delta: 1 - (route.len() - s_rank) as i64,
                };
                let better = match &best {
                    None => true,
                    Some(b) => {
                        (candidate.priority_gain, candidate.assigned_delta, -candidate.delta)
                            > (b.priority_gain, b.assigned_delta, -b.delta)
                    }
                };
                if better {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn range(&self, route: &TwRoute) -> (usize, usize) {
        if self.at_start {
            (0, self.s_rank)
        } else {
            (self.s_rank, route.len())
        }
    }
}

impl LocalSearchOperator for PriorityReplace {
    fn gain(&self) -> Eval {
        -self.delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let route = &ctx.routes[self.vehicle];
        let (first, last) = self.range(route);
        let job = ctx.problem.job(self.unassigned_job);

        // Shipments must not straddle the replaced range.
        let straddles = (first..last).any(|rank| {
            match ctx.state.matching_delivery_rank[self.vehicle][rank] {
                Some(delivery_rank) => delivery_rank >= last,
                None => ctx.state.matching_pickup_rank[self.vehicle][rank]
                    .is_some_and(|pickup_rank| pickup_rank < first),
            }
        });

        !straddles
            && route_caps_ok(ctx, self.vehicle, self.delta, self.assigned_delta)
            && route.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                job.delivery(),
                std::iter::once(self.unassigned_job),
                first,
                last,
            )
            && route.is_valid_addition_for_tw(
                ctx.problem,
                job.delivery(),
                std::iter::once(self.unassigned_job),
                first,
                last,
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        state: &mut SolutionState,
    ) {
        let route = &mut routes[self.vehicle];
        let (first, last) = self.range(route);
        let removed: Vec<usize> = route.raw().route[first..last].to_vec();
        route.replace(problem, std::iter::once(self.unassigned_job), first, last);

        state.unassigned.remove(&self.unassigned_job);
        for job in removed {
            state.unassigned.insert(job);
        }
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }

    fn priority_gain(&self) -> i64 {
        self.priority_gain
    }

    fn assigned_delta(&self) -> i64 {
        self.assigned_delta
    }
}
