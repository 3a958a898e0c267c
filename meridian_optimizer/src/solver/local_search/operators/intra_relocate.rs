use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::sequence_replace_delta;
use crate::solver::local_search::operator::{
    LocalSearchOperator, MoveContext, pd_pairs_ok_after_replace, route_caps_ok,
};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Intra-Relocate**
///
/// Moves the job at `s_rank` so that it ends up at rank `t_rank` of the
/// same route.
///
/// ```text
/// BEFORE:  ... (A) -> [J] -> (C) ... (X) -> (Y) ...
/// AFTER:   ... (A) -> (C) ... (X) -> [J] -> (Y) ...
/// ```
pub struct IntraRelocate {
    pub vehicle: usize,
    pub s_rank: usize,
    pub t_rank: usize,
    delta: Eval,
}

impl IntraRelocate {
    pub fn evaluate(
        ctx: &MoveContext,
        vehicle: usize,
        s_rank: usize,
        t_rank: usize,
    ) -> Option<Self> {
        if s_rank == t_rank {
            return None;
        }

        let route = &ctx.routes[vehicle];
        let (first, last) = (s_rank.min(t_rank), s_rank.max(t_rank) + 1);
        let replacement = Self::rotated(route, s_rank, t_rank);
        let delta = sequence_replace_delta(
            ctx.problem,
            route,
            replacement.iter().copied(),
            first,
            last,
        );

        Some(IntraRelocate {
            vehicle,
            s_rank,
            t_rank,
            delta,
        })
    }

    /// The affected range with the job moved to its new position.
    fn rotated(route: &TwRoute, s_rank: usize, t_rank: usize) -> Vec<usize> {
        let job = route.job_at(s_rank);
        let mut jobs: Vec<usize> = if s_rank < t_rank {
            route.raw().route[s_rank + 1..=t_rank].to_vec()
        } else {
            route.raw().route[t_rank..s_rank].to_vec()
        };
        if s_rank < t_rank {
            jobs.push(job);
        } else {
            jobs.insert(0, job);
        }
        jobs
    }
}

impl LocalSearchOperator for IntraRelocate {
    fn gain(&self) -> Eval {
        -self.delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let route = &ctx.routes[self.vehicle];
        let (first, last) = (
            self.s_rank.min(self.t_rank),
            self.s_rank.max(self.t_rank) + 1,
        );
        let replacement = Self::rotated(route, self.s_rank, self.t_rank);
        let delivery = route.delivery_in_range(first, last);

        route_caps_ok(ctx, self.vehicle, self.delta, 0)
            && pd_pairs_ok_after_replace(ctx, self.vehicle, first, last, &replacement)
            && route.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &delivery,
                replacement.iter().copied(),
                first,
                last,
            )
            && route.is_valid_addition_for_tw(
                ctx.problem,
                &delivery,
                replacement.iter().copied(),
                first,
                last,
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let route = &mut routes[self.vehicle];
        let (first, last) = (
            self.s_rank.min(self.t_rank),
            self.s_rank.max(self.t_rank) + 1,
        );
        let replacement = Self::rotated(route, self.s_rank, self.t_rank);
        route.replace(problem, replacement.into_iter(), first, last);
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }
}
