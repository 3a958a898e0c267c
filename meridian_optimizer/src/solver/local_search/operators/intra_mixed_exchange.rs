use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::sequence_replace_delta;
use crate::solver::local_search::operator::{
    LocalSearchOperator, MoveContext, pd_pairs_ok_after_replace, route_caps_ok,
};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Intra-Mixed-Exchange**
///
/// Swaps the single job at `s_rank` with the non-adjacent edge starting
/// at `t_rank` within one route.
///
/// ```text
/// BEFORE:  ... -> [J] -> ... -> [E1 -> E2] -> ...
/// AFTER:   ... -> [E1 -> E2] -> ... -> [J] -> ...
/// ```
pub struct IntraMixedExchange {
    pub vehicle: usize,
    pub s_rank: usize,
    pub t_rank: usize,
    delta: Eval,
}

impl IntraMixedExchange {
    pub fn evaluate(
        ctx: &MoveContext,
        vehicle: usize,
        s_rank: usize,
        t_rank: usize,
    ) -> Option<Self> {
        let route = &ctx.routes[vehicle];
        if t_rank + 1 >= route.len() {
            return None;
        }
        // Job strictly apart from the edge on either side.
        let apart = (s_rank + 2 <= t_rank) || (t_rank + 2 < s_rank);
        if !apart {
            return None;
        }

        let (first, last) = Self::range(s_rank, t_rank);
        let replacement = Self::rearranged(route, s_rank, t_rank);
        let delta = sequence_replace_delta(
            ctx.problem,
            route,
            replacement.iter().copied(),
            first,
            last,
        );

        Some(IntraMixedExchange {
            vehicle,
            s_rank,
            t_rank,
            delta,
        })
    }

    fn range(s_rank: usize, t_rank: usize) -> (usize, usize) {
        if s_rank < t_rank {
            (s_rank, t_rank + 2)
        } else {
            (t_rank, s_rank + 1)
        }
    }

    fn rearranged(route: &TwRoute, s_rank: usize, t_rank: usize) -> Vec<usize> {
        let job = route.job_at(s_rank);
        let edge = [route.job_at(t_rank), route.job_at(t_rank + 1)];

        if s_rank < t_rank {
            // [J] ... [E1 E2]  ->  [E1 E2] ... [J]
            let mut jobs = Vec::with_capacity(t_rank + 2 - s_rank);
            jobs.extend(edge);
            jobs.extend_from_slice(&route.raw().route[s_rank + 1..t_rank]);
            jobs.push(job);
            jobs
        } else {
            // [E1 E2] ... [J]  ->  [J] ... [E1 E2]
            let mut jobs = Vec::with_capacity(s_rank + 1 - t_rank);
            jobs.push(job);
            jobs.extend_from_slice(&route.raw().route[t_rank + 2..s_rank]);
            jobs.extend(edge);
            jobs
        }
    }
}

impl LocalSearchOperator for IntraMixedExchange {
    fn gain(&self) -> Eval {
        -self.delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let route = &ctx.routes[self.vehicle];
        let (first, last) = Self::range(self.s_rank, self.t_rank);
        let replacement = Self::rearranged(route, self.s_rank, self.t_rank);
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
        let replacement = Self::rearranged(route, self.s_rank, self.t_rank);
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
    fn test_intra_mixed_exchange_swaps_job_and_edge() {
        let problem = test_utils::line_problem(5);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![3, 2, 0, 1, 4]);
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

        // Swap job 3 (rank 0) with edge (0, 1) at rank 2.
        let exchange = IntraMixedExchange::evaluate(&ctx, 0, 0, 2).unwrap();
        assert!(exchange.gain().cost > 0);
        assert!(exchange.is_valid(&ctx));

        drop(ctx);
        exchange.apply(&problem, &mut routes, &mut state);
        assert_eq!(routes[0].raw().route, vec![0, 1, 2, 3, 4]);
    }
}
