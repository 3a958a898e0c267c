use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::sequence_replace_delta;
use crate::solver::local_search::operator::{
    LocalSearchOperator, MoveContext, pd_pairs_ok_after_replace, route_caps_ok,
};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Intra-Or-Opt**
///
/// Moves the edge at `s_rank` so that it starts at rank `t_rank` of the
/// same route, optionally reversed.
pub struct IntraOrOpt {
    pub vehicle: usize,
    pub s_rank: usize,
    pub t_rank: usize,
    pub reversed: bool,
    delta: Eval,
}

impl IntraOrOpt {
    pub fn evaluate(
        ctx: &MoveContext,
        vehicle: usize,
        s_rank: usize,
        t_rank: usize,
    ) -> Option<Self> {
        let route = &ctx.routes[vehicle];
        // Target rank addresses the edge start in the resulting route.
        if t_rank == s_rank || t_rank + 1 >= route.len() || s_rank + 1 >= route.len() {
            return None;
        }

        let (j1, j2) = (route.job_at(s_rank), route.job_at(s_rank + 1));
        let can_reverse = ctx.problem.job(j1).job_type() == JobType::Single
            && ctx.problem.job(j2).job_type() == JobType::Single;

        let (first, last) = Self::range(s_rank, t_rank);
        let straight = sequence_replace_delta(
            ctx.problem,
            route,
            Self::rearranged(route, s_rank, t_rank, false).into_iter(),
            first,
            last,
        );
        let reversed_delta = if can_reverse {
            sequence_replace_delta(
                ctx.problem,
                route,
                Self::rearranged(route, s_rank, t_rank, true).into_iter(),
                first,
                last,
            )
        } else {
            Eval::NO_EVAL
        };

        let (delta, reversed) = if reversed_delta < straight {
            (reversed_delta, true)
        } else {
            (straight, false)
        };

        Some(IntraOrOpt {
            vehicle,
            s_rank,
            t_rank,
            reversed,
            delta,
        })
    }

    fn range(s_rank: usize, t_rank: usize) -> (usize, usize) {
        (s_rank.min(t_rank), s_rank.max(t_rank) + 2)
    }

    fn rearranged(
        route: &TwRoute,
        s_rank: usize,
        t_rank: usize,
        reversed: bool,
    ) -> Vec<usize> {
        let (j1, j2) = (route.job_at(s_rank), route.job_at(s_rank + 1));
        let edge = if reversed { [j2, j1] } else { [j1, j2] };

        let mut jobs: Vec<usize> = if s_rank < t_rank {
            route.raw().route[s_rank + 2..t_rank + 2].to_vec()
        } else {
            route.raw().route[t_rank..s_rank].to_vec()
        };
        if s_rank < t_rank {
            jobs.extend(edge);
        } else {
            jobs.splice(0..0, edge);
        }
        jobs
    }
}

impl LocalSearchOperator for IntraOrOpt {
    fn gain(&self) -> Eval {
        -self.delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        if self.delta.is_no_eval() {
            return false;
        }
        let route = &ctx.routes[self.vehicle];
        let (first, last) = Self::range(self.s_rank, self.t_rank);
        let replacement = Self::rearranged(route, self.s_rank, self.t_rank, self.reversed);
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
        let (first, last) = Self::range(self.s_rank, self.t_rank);
        let replacement = Self::rearranged(route, self.s_rank, self.t_rank, self.reversed);
        route.replace(problem, replacement.into_iter(), first, last);
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    #[test]
    fn test_intra_or_opt_moves_edge() {
        let problem = test_utils::line_problem(5);
        let mut routes = test_utils::empty_routes(&problem);
        // Edge (0, 1) stuck at the end of the line tour.
        routes[0].set_route(&problem, vec![2, 3, 4, 0, 1]);
        let mut state = SolutionState::new(&problem);
        for j in 0..5 {
            state.unassigned.remove(&j);
        }
        state.setup(&problem, &routes);

        let ctx = MoveContext {
            problem: &problem,
            state: &state,
            routes: &routes,
        };

        let or_opt = IntraOrOpt::evaluate(&ctx, 0, 3, 0).unwrap();
        assert!(or_opt.gain().cost > 0);
        assert!(or_opt.is_valid(&ctx));

        drop(ctx);
        or_opt.apply(&problem, &mut routes, &mut state);
        assert_eq!(routes[0].raw().route, vec![0, 1, 2, 3, 4]);
    }
}
