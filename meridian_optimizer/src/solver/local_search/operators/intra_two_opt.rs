use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::sequence_replace_delta;
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext, route_caps_ok};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Intra-Two-Opt**
///
/// Reverses the contiguous segment `[s_rank, t_rank]` within one route.
/// Segments holding shipment jobs are rejected: reversal would reorder a
/// pickup against its delivery.
///
/// ```text
/// BEFORE:  ... -> [A -> B -> C] -> ...
/// AFTER:   ... -> [C -> B -> A] -> ...
/// ```
pub struct IntraTwoOpt {
    pub vehicle: usize,
    pub s_rank: usize,
    pub t_rank: usize,
    delta: Eval,
}

impl IntraTwoOpt {
    pub fn evaluate(
        ctx: &MoveContext,
        vehicle: usize,
        s_rank: usize,
        t_rank: usize,
    ) -> Option<Self> {
        if s_rank >= t_rank {
            return None;
        }
        let route = &ctx.routes[vehicle];

        let delta = sequence_replace_delta(
            ctx.problem,
            route,
            route.raw().route[s_rank..=t_rank].iter().rev().copied(),
            s_rank,
            t_rank + 1,
        );

        Some(IntraTwoOpt {
            vehicle,
            s_rank,
            t_rank,
            delta,
        })
    }

    fn reversed(&self, route: &TwRoute) -> Vec<usize> {
        route.raw().route[self.s_rank..=self.t_rank]
            .iter()
            .rev()
            .copied()
            .collect()
    }
}

impl LocalSearchOperator for IntraTwoOpt {
    fn gain(&self) -> Eval {
        -self.delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let route = &ctx.routes[self.vehicle];

        // No shipment job may sit inside a reversed segment.
        if route.raw().route[self.s_rank..=self.t_rank]
            .iter()
            .any(|&job| ctx.problem.job(job).job_type() != JobType::Single)
        {
            return false;
        }

        let replacement = self.reversed(route);
        let delivery = route.delivery_in_range(self.s_rank, self.t_rank + 1);

        route_caps_ok(ctx, self.vehicle, self.delta, 0)
            && route.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &delivery,
                replacement.iter().copied(),
                self.s_rank,
                self.t_rank + 1,
            )
            && route.is_valid_addition_for_tw(
                ctx.problem,
                &delivery,
                replacement.iter().copied(),
                self.s_rank,
                self.t_rank + 1,
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let route = &mut routes[self.vehicle];
        let replacement = self.reversed(route);
        route.replace(problem, replacement.into_iter(), self.s_rank, self.t_rank + 1);
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }
}
