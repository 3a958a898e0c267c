use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::addition_cost_delta;
use crate::solver::local_search::operator::{
    LocalSearchOperator, MoveContext, no_pd_straddle, route_caps_ok,
};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Two-Opt**
///
/// Swaps the tails of routes `s` and `t` after the chosen positions.
///
/// ```text
/// BEFORE:
///    s: (S0 .. S_i) -> [S_i+1 .. ]        t: (T0 .. T_j) -> [T_j+1 .. ]
/// AFTER:
///    s: (S0 .. S_i) -> [T_j+1 .. ]        t: (T0 .. T_j) -> [S_i+1 .. ]
/// ```
pub struct TwoOpt {
    pub s_vehicle: usize,
    pub s_rank: usize,
    pub t_vehicle: usize,
    pub t_rank: usize,
    s_delta: Eval,
    t_delta: Eval,
}

impl TwoOpt {
    pub fn evaluate(
        ctx: &MoveContext,
        s_vehicle: usize,
        s_rank: usize,
        t_vehicle: usize,
        t_rank: usize,
    ) -> Option<Self> {
        debug_assert!(s_vehicle != t_vehicle);
        let s_len = ctx.routes[s_vehicle].len();
        let t_len = ctx.routes[t_vehicle].len();

        // Skill compatibility of the full incoming tails, using the
        // cached skill ranks for O(1) rejection.
        if ctx.state.bwd_skill_rank[t_vehicle][s_vehicle] > t_rank + 1
            || ctx.state.bwd_skill_rank[s_vehicle][t_vehicle] > s_rank + 1
        {
            return None;
        }

        let (s_delta, _) = addition_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            s_vehicle,
            s_rank + 1,
            s_len,
            t_vehicle,
            t_rank + 1,
            t_len,
        );
        let (t_delta, _) = addition_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            t_vehicle,
            t_rank + 1,
            t_len,
            s_vehicle,
            s_rank + 1,
            s_len,
        );

        Some(TwoOpt {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            s_delta,
            t_delta,
        })
    }
}

impl LocalSearchOperator for TwoOpt {
    fn gain(&self) -> Eval {
        -(self.s_delta + self.t_delta)
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let source = &ctx.routes[self.s_vehicle];
        let target = &ctx.routes[self.t_vehicle];
        let s_len = source.len();
        let t_len = target.len();

        let s_tail_len = (s_len - self.s_rank - 1) as i64;
        let t_tail_len = (t_len - self.t_rank - 1) as i64;

        let into_s = &target.raw().route[self.t_rank + 1..];
        let into_t = &source.raw().route[self.s_rank + 1..];

        let s_delivery = target.delivery_in_range(self.t_rank + 1, t_len);
        let t_delivery = source.delivery_in_range(self.s_rank + 1, s_len);

        no_pd_straddle(ctx, self.s_vehicle, self.s_rank + 1)
            && no_pd_straddle(ctx, self.t_vehicle, self.t_rank + 1)
            && route_caps_ok(ctx, self.s_vehicle, self.s_delta, t_tail_len - s_tail_len)
            && route_caps_ok(ctx, self.t_vehicle, self.t_delta, s_tail_len - t_tail_len)
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
                self.t_rank + 1,
                t_len,
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
                self.t_rank + 1,
                t_len,
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let s_tail: Vec<usize> = routes[self.s_vehicle].raw().route[self.s_rank + 1..].to_vec();
        let t_tail: Vec<usize> = routes[self.t_vehicle].raw().route[self.t_rank + 1..].to_vec();

        let s_len = routes[self.s_vehicle].len();
        let t_len = routes[self.t_vehicle].len();
        routes[self.s_vehicle].replace(problem, t_tail.into_iter(), self.s_rank + 1, s_len);
        routes[self.t_vehicle].replace(problem, s_tail.into_iter(), self.t_rank + 1, t_len);
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
    fn test_two_opt_swaps_tails() {
        let problem = test_utils::line_problem_with_vehicles(6, 2);
        let mut routes = test_utils::empty_routes(&problem);
        // Tails are on the wrong vehicles.
        routes[0].set_route(&problem, vec![0, 1, 4, 5]);
        routes[1].set_route(&problem, vec![2, 3]);
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

        let two_opt = TwoOpt::evaluate(&ctx, 0, 1, 1, 1).unwrap();
        assert!(two_opt.is_valid(&ctx));

        drop(ctx);
        two_opt.apply(&problem, &mut routes, &mut state);
        assert_eq!(routes[0].raw().route, vec![0, 1]);
        assert_eq!(routes[1].raw().route, vec![2, 3, 4, 5]);
    }
}
