use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::sequence_replace_delta;
use crate::solver::local_search::operator::{
    LocalSearchOperator, MoveContext, pd_pairs_ok_after_replace, route_caps_ok,
};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Intra-Exchange**
///
/// Swaps the two non-adjacent jobs at `s_rank < t_rank` within one route.
///
/// ```text
/// BEFORE:  ... -> [J1] -> ... -> [J2] -> ...
/// AFTER:   ... -> [J2] -> ... -> [J1] -> ...
/// ```
pub struct IntraExchange {
    pub vehicle: usize,
    pub s_rank: usize,
    pub t_rank: usize,
    delta: Eval,
}

impl IntraExchange {
    pub fn evaluate(
        ctx: &MoveContext,
        vehicle: usize,
        s_rank: usize,
        t_rank: usize,
    ) -> Option<Self> {
        if s_rank + 2 > t_rank {
            return None;
        }

        let route = &ctx.routes[vehicle];
        let replacement = Self::swapped(route, s_rank, t_rank);
        let delta = sequence_replace_delta(
            ctx.problem,
            route,
            replacement.iter().copied(),
            s_rank,
            t_rank + 1,
        );

        Some(IntraExchange {
            vehicle,
            s_rank,
            t_rank,
            delta,
        })
    }

    fn swapped(route: &TwRoute, s_rank: usize, t_rank: usize) -> Vec<usize> {
        let mut jobs: Vec<usize> = route.raw().route[s_rank..=t_rank].to_vec();
        jobs.swap(0, t_rank - s_rank);
        jobs
    }
}

impl LocalSearchOperator for IntraExchange {
    fn gain(&self) -> Eval {
        -self.delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let route = &ctx.routes[self.vehicle];
        let replacement = Self::swapped(route, self.s_rank, self.t_rank);
        let delivery = route.delivery_in_range(self.s_rank, self.t_rank + 1);

        route_caps_ok(ctx, self.vehicle, self.delta, 0)
            && pd_pairs_ok_after_replace(
                ctx,
                self.vehicle,
                self.s_rank,
                self.t_rank + 1,
                &replacement,
            )
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
        let replacement = Self::swapped(route, self.s_rank, self.t_rank);
        route.replace(problem, replacement.into_iter(), self.s_rank, self.t_rank + 1);
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
    fn test_intra_exchange_swaps_jobs() {
        let problem = test_utils::line_problem(4);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![3, 1, 2, 0]);
        let mut state = SolutionState::new(&problem);
        for j in 0..4 {
            state.unassigned.remove(&j);
        }
        state.setup(&problem, &routes);

        let ctx = MoveContext {
            problem: &problem,
            state: &state,
            routes: &routes,
        };

        let exchange = IntraExchange::evaluate(&ctx, 0, 0, 3).unwrap();
        assert!(exchange.gain().cost > 0);
        assert!(exchange.is_valid(&ctx));

        drop(ctx);
        exchange.apply(&problem, &mut routes, &mut state);
        assert_eq!(routes[0].raw().route, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_adjacent_ranks_are_rejected_at_factory() {
        let problem = test_utils::line_problem(4);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![0, 1, 2, 3]);
        let mut state = SolutionState::new(&problem);
        for j in 0..4 {
            state.unassigned.remove(&j);
        }
        state.setup(&problem, &routes);

        let ctx = MoveContext {
            problem: &problem,
            state: &state,
            routes: &routes,
        };

        assert!(IntraExchange::evaluate(&ctx, 0, 1, 2).is_none());
    }
}
