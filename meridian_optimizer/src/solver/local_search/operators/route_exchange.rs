use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::slice_route_eval;
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Route-Exchange**
///
/// Swaps the entire job sequences of two vehicles. Requires mutual
/// skill compatibility of the full routes.
pub struct RouteExchange {
    pub s_vehicle: usize,
    pub t_vehicle: usize,
    new_s_eval: Eval,
    new_t_eval: Eval,
    gain: Eval,
}

impl RouteExchange {
    pub fn evaluate(ctx: &MoveContext, s_vehicle: usize, t_vehicle: usize) -> Option<Self> {
        debug_assert!(s_vehicle != t_vehicle);
        let source = &ctx.routes[s_vehicle];
        let target = &ctx.routes[t_vehicle];

        if source.is_empty() && target.is_empty() {
            return None;
        }
        if ctx.state.fwd_skill_rank[t_vehicle][s_vehicle] < target.len()
            || ctx.state.fwd_skill_rank[s_vehicle][t_vehicle] < source.len()
        {
            return None;
        }

        let new_s_eval = slice_route_eval(
            ctx.problem,
            ctx.state,
            ctx.routes,
            t_vehicle,
            s_vehicle,
            0,
            target.len(),
        );
        let new_t_eval = slice_route_eval(
            ctx.problem,
            ctx.state,
            ctx.routes,
            s_vehicle,
            t_vehicle,
            0,
            source.len(),
        );

        let gain = ctx.state.route_evals[s_vehicle] + ctx.state.route_evals[t_vehicle]
            - new_s_eval
            - new_t_eval;

        Some(RouteExchange {
            s_vehicle,
            t_vehicle,
            new_s_eval,
            new_t_eval,
            gain,
        })
    }
}

impl LocalSearchOperator for RouteExchange {
    fn gain(&self) -> Eval {
        self.gain
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let source = &ctx.routes[self.s_vehicle];
        let target = &ctx.routes[self.t_vehicle];
        let s_vehicle = ctx.problem.vehicle(self.s_vehicle);
        let t_vehicle = ctx.problem.vehicle(self.t_vehicle);

        source.max_load().fits_in(t_vehicle.capacity())
            && target.max_load().fits_in(s_vehicle.capacity())
            && source.len() <= t_vehicle.max_tasks()
            && target.len() <= s_vehicle.max_tasks()
            && s_vehicle.ok_for_travel_time(self.new_s_eval.duration)
            && s_vehicle.ok_for_distance(self.new_s_eval.distance)
            && t_vehicle.ok_for_travel_time(self.new_t_eval.duration)
            && t_vehicle.ok_for_distance(self.new_t_eval.distance)
            && source.is_valid_addition_for_tw(
                ctx.problem,
                &target.delivery_in_range(0, target.len()),
                target.raw().route.iter().copied(),
                0,
                source.len(),
            )
            && target.is_valid_addition_for_tw(
                ctx.problem,
                &source.delivery_in_range(0, source.len()),
                source.raw().route.iter().copied(),
                0,
                target.len(),
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let s_jobs = routes[self.s_vehicle].raw().route.clone();
        let t_jobs = routes[self.t_vehicle].raw().route.clone();
        routes[self.s_vehicle].set_route(problem, t_jobs);
        routes[self.t_vehicle].set_route(problem, s_jobs);
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
    fn test_route_exchange_swaps_sequences() {
        let problem = test_utils::line_problem_with_vehicles(4, 2);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![2, 3]);
        routes[1].set_route(&problem, vec![0, 1]);
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

        let exchange = RouteExchange::evaluate(&ctx, 0, 1).unwrap();
        assert!(exchange.is_valid(&ctx));

        drop(ctx);
        exchange.apply(&problem, &mut routes, &mut state);
        assert_eq!(routes[0].raw().route, vec![0, 1]);
        assert_eq!(routes[1].raw().route, vec![2, 3]);
    }
}
