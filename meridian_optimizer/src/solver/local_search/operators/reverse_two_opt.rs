use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::addition_cost_delta;
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext, route_caps_ok};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Reverse-Two-Opt**
///
/// Swaps the tail of `s` after `s_rank` for the reversed head of `t` up
/// to `t_rank`; the displaced segments flip direction.
///
/// ```text
/// BEFORE:
///    s: (S0 .. S_i) -> [S_i+1 .. S_n]     t: [T0 .. T_j] -> (T_j+1 ..)
/// AFTER:
///    s: (S0 .. S_i) -> [T_j .. T0]        t: [S_n .. S_i+1] -> (T_j+1 ..)
/// ```
pub struct ReverseTwoOpt {
    pub s_vehicle: usize,
    pub s_rank: usize,
    pub t_vehicle: usize,
    pub t_rank: usize,
    s_delta: Eval,
    t_delta: Eval,
}

impl ReverseTwoOpt {
    pub fn evaluate(
        ctx: &MoveContext,
        s_vehicle: usize,
        s_rank: usize,
        t_vehicle: usize,
        t_rank: usize,
    ) -> Option<Self> {
        debug_assert!(s_vehicle != t_vehicle);
        let source = &ctx.routes[s_vehicle];
        let target = &ctx.routes[t_vehicle];
        let s_len = source.len();

        // Skill prefix/suffix compatibility of the exchanged segments.
        if ctx.state.fwd_skill_rank[t_vehicle][s_vehicle] < t_rank + 1
            || ctx.state.bwd_skill_rank[s_vehicle][t_vehicle] > s_rank + 1
        {
            return None;
        }

        // Reversal forbids shipment jobs in either moved segment.
        let moved_s = &source.raw().route[s_rank + 1..];
        let moved_t = &target.raw().route[..t_rank + 1];
        if moved_s
            .iter()
            .chain(moved_t.iter())
            .any(|&job| ctx.problem.job(job).job_type() != JobType::Single)
        {
            return None;
        }

        let (_, s_delta) = addition_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            s_vehicle,
            s_rank + 1,
            s_len,
            t_vehicle,
            0,
            t_rank + 1,
        );
        let (_, t_delta) = addition_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            t_vehicle,
            0,
            t_rank + 1,
            s_vehicle,
            s_rank + 1,
            s_len,
        );

        Some(ReverseTwoOpt {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            s_delta,
            t_delta,
        })
    }

    fn incoming_s(&self, routes: &[TwRoute]) -> Vec<usize> {
        routes[self.t_vehicle].raw().route[..self.t_rank + 1]
            .iter()
            .rev()
            .copied()
            .collect()
    }

    fn incoming_t(&self, routes: &[TwRoute]) -> Vec<usize> {
        routes[self.s_vehicle].raw().route[self.s_rank + 1..]
            .iter()
            .rev()
            .copied()
            .collect()
    }
}

impl LocalSearchOperator for ReverseTwoOpt {
    fn gain(&self) -> Eval {
        -(self.s_delta + self.t_delta)
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let source = &ctx.routes[self.s_vehicle];
        let target = &ctx.routes[self.t_vehicle];
        let s_len = source.len();

        let into_s = self.incoming_s(ctx.routes);
        let into_t = self.incoming_t(ctx.routes);
        let len_delta = into_s.len() as i64 - into_t.len() as i64;

        let s_delivery = target.delivery_in_range(0, self.t_rank + 1);
        let t_delivery = source.delivery_in_range(self.s_rank + 1, s_len);

        route_caps_ok(ctx, self.s_vehicle, self.s_delta, len_delta)
            && route_caps_ok(ctx, self.t_vehicle, self.t_delta, -len_delta)
            && source.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &s_delivery,
                into_s.iter().copied(),
                self.s_rank + 1,
                s_len,
            )
            && target.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &t_delivery,
                into_t.iter().copied(),
                0,
                self.t_rank + 1,
            )
            && source.is_valid_addition_for_tw(
                ctx.problem,
                &s_delivery,
                into_s.iter().copied(),
                self.s_rank + 1,
                s_len,
            )
            && target.is_valid_addition_for_tw(
                ctx.problem,
                &t_delivery,
                into_t.iter().copied(),
                0,
                self.t_rank + 1,
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let into_s = self.incoming_s(routes);
        let into_t = self.incoming_t(routes);
        let s_len = routes[self.s_vehicle].len();

        routes[self.s_vehicle].replace(problem, into_s.into_iter(), self.s_rank + 1, s_len);
        routes[self.t_vehicle].replace(problem, into_t.into_iter(), 0, self.t_rank + 1);
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    #[test]
    fn test_reverse_two_opt_swaps_reversed_segments() {
        let problem = test_utils::line_problem_with_vehicles(6, 2);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![0, 1, 5, 4]);
        routes[1].set_route(&problem, vec![3, 2]);
        let mut state = SolutionState::new(&problem);
        for j in 0..6 {
            state.unassigned.remove(&j);
        }
        state.setup(&problem, &routes);

        let ctx = MoveContext {
            problem: &problem,
            state: &state,
            routes: &routes,
        };

        // s keeps [0, 1], gains reversed t-head [2, 3]; t becomes
        // reversed s-tail [4, 5].
        let reverse = ReverseTwoOpt::evaluate(&ctx, 0, 1, 1, 1).unwrap();
        assert!(reverse.is_valid(&ctx));

        drop(ctx);
        reverse.apply(&problem, &mut routes, &mut state);
        assert_eq!(routes[0].raw().route, vec![0, 1, 2, 3]);
        assert_eq!(routes[1].raw().route, vec![4, 5]);
    }
}
