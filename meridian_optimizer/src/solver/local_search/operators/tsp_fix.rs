use std::time::Instant;

use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::sequence_replace_delta;
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext, route_caps_ok};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;
use crate::solver::tsp;

/// **TSP-Fix**
///
/// Re-solves the intra-route ordering as a TSP and keeps the result when
/// it is strictly cheaper and still feasible.
pub struct TspFix {
    pub vehicle: usize,
    order: Vec<usize>,
    delta: Eval,
}

impl TspFix {
    pub fn evaluate(
        ctx: &MoveContext,
        vehicle: usize,
        deadline: Option<Instant>,
    ) -> Option<Self> {
        let route = &ctx.routes[vehicle];
        if route.len() < 4 {
            return None;
        }

        let order = tsp::tsp::solve(ctx.problem, vehicle, &route.raw().route, deadline);
        if order == route.raw().route {
            return None;
        }

        let delta = sequence_replace_delta(
            ctx.problem,
            route,
            order.iter().copied(),
            0,
            route.len(),
        );

        Some(TspFix {
            vehicle,
            order,
            delta,
        })
    }
}

impl LocalSearchOperator for TspFix {
    fn gain(&self) -> Eval {
        -self.delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let route = &ctx.routes[self.vehicle];
        let delivery = route.delivery_in_range(0, route.len());

        // Reordering may break pickup-before-delivery.
        let position_of = |job: usize| self.order.iter().position(|&j| j == job);
        let pairs_ok = !ctx.problem.has_shipments()
            || self.order.iter().all(|&job| {
                if !ctx.problem.job(job).is_pickup() {
                    return true;
                }
                let delivery_job = ctx.problem.matching_delivery(job);
                match (position_of(job), position_of(delivery_job)) {
                    (Some(p), Some(d)) => p < d,
                    _ => false,
                }
            });

        pairs_ok
            && route_caps_ok(ctx, self.vehicle, self.delta, 0)
            && route.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &delivery,
                self.order.iter().copied(),
                0,
                route.len(),
            )
            && route.is_valid_addition_for_tw(
                ctx.problem,
                &delivery,
                self.order.iter().copied(),
                0,
                route.len(),
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let len = routes[self.vehicle].len();
        routes[self.vehicle].replace(problem, self.order.iter().copied(), 0, len);
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
    fn test_tsp_fix_reorders_scrambled_route() {
        let problem = test_utils::line_problem(6);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![3, 0, 5, 1, 4, 2]);
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

        let fix = TspFix::evaluate(&ctx, 0, None).unwrap();
        assert!(fix.gain().cost > 0);
        assert!(fix.is_valid(&ctx));

        drop(ctx);
        fix.apply(&problem, &mut routes, &mut state);
        let cost = tsp::tsp::path_cost(&problem, 0, &routes[0].raw().route);
        assert_eq!(cost, tsp::tsp::path_cost(&problem, 0, &[0, 1, 2, 3, 4, 5]));
    }
}
