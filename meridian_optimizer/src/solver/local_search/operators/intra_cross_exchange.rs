use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::sequence_replace_delta;
use crate::solver::local_search::operator::{
    LocalSearchOperator, MoveContext, pd_pairs_ok_after_replace, route_caps_ok,
};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Intra-Cross-Exchange**
///
/// Swaps the two non-adjacent edges at `s_rank` and `t_rank` within one
/// route, trying all four orientation combinations.
///
/// ```text
/// BEFORE:  ... -> [S1 -> S2] -> ... -> [T1 -> T2] -> ...
/// AFTER:   ... -> [T1 -> T2] -> ... -> [S1 -> S2] -> ...
/// ```
pub struct IntraCrossExchange {
    pub vehicle: usize,
    pub s_rank: usize,
    pub t_rank: usize,
    pub reverse_s_edge: bool,
    pub reverse_t_edge: bool,
    delta: Eval,
}

impl IntraCrossExchange {
    pub fn evaluate(
        ctx: &MoveContext,
        vehicle: usize,
        s_rank: usize,
        t_rank: usize,
    ) -> Option<Self> {
        let route = &ctx.routes[vehicle];
        if s_rank + 3 > t_rank || t_rank + 1 >= route.len() {
            return None;
        }

        let s_edge = [route.job_at(s_rank), route.job_at(s_rank + 1)];
        let t_edge = [route.job_at(t_rank), route.job_at(t_rank + 1)];
        let s_reversible = s_edge
            .iter()
            .all(|&j| ctx.problem.job(j).job_type() == JobType::Single);
        let t_reversible = t_edge
            .iter()
            .all(|&j| ctx.problem.job(j).job_type() == JobType::Single);

        let mut best = Eval::NO_EVAL;
        let mut orientation = (false, false);
        for reverse_s in [false, true] {
            if reverse_s && !s_reversible {
                continue;
            }
            for reverse_t in [false, true] {
                if reverse_t && !t_reversible {
                    continue;
                }
                let delta = sequence_replace_delta(
                    ctx.problem,
                    route,
                    Self::rearranged(route, s_rank, t_rank, reverse_s, reverse_t)
                        .into_iter(),
                    s_rank,
                    t_rank + 2,
                );
                if delta < best {
                    best = delta;
                    orientation = (reverse_s, reverse_t);
                }
            }
        }

        Some(IntraCrossExchange {
            vehicle,
            s_rank,
            t_rank,
            reverse_s_edge: orientation.0,
            reverse_t_edge: orientation.1,
            delta: best,
        })
    }

    fn rearranged(
        route: &TwRoute,
        s_rank: usize,
        t_rank: usize,
        reverse_s: bool,
        reverse_t: bool,
    ) -> Vec<usize> {
        let mut s_edge = [route.job_at(s_rank), route.job_at(s_rank + 1)];
        let mut t_edge = [route.job_at(t_rank), route.job_at(t_rank + 1)];
        if reverse_s {
            s_edge.swap(0, 1);
        }
        if reverse_t {
            t_edge.swap(0, 1);
        }

        let mut jobs = Vec::with_capacity(t_rank + 2 - s_rank);
        jobs.extend(t_edge);
        jobs.extend_from_slice(&route.raw().route[s_rank + 2..t_rank]);
        jobs.extend(s_edge);
        jobs
    }
}

impl LocalSearchOperator for IntraCrossExchange {
    fn gain(&self) -> Eval {
        -self.delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        if self.delta.is_no_eval() {
            return false;
        }
        let route = &ctx.routes[self.vehicle];
        let replacement = Self::rearranged(
            route,
            self.s_rank,
            self.t_rank,
            self.reverse_s_edge,
            self.reverse_t_edge,
        );
        let delivery = route.delivery_in_range(self.s_rank, self.t_rank + 2);

        route_caps_ok(ctx, self.vehicle, self.delta, 0)
            && pd_pairs_ok_after_replace(
                ctx,
                self.vehicle,
                self.s_rank,
                self.t_rank + 2,
                &replacement,
            )
            && route.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &delivery,
                replacement.iter().copied(),
                self.s_rank,
                self.t_rank + 2,
            )
            && route.is_valid_addition_for_tw(
                ctx.problem,
                &delivery,
                replacement.iter().copied(),
                self.s_rank,
                self.t_rank + 2,
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let route = &mut routes[self.vehicle];
        let replacement = Self::rearranged(
            route,
            self.s_rank,
            self.t_rank,
            self.reverse_s_edge,
            self.reverse_t_edge,
        );
        route.replace(problem, replacement.into_iter(), self.s_rank, self.t_rank + 2);
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }
}
