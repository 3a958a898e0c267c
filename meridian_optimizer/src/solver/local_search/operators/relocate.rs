use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::{addition_cost_delta, removal_cost_delta};
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext, route_caps_ok};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Relocate**
///
/// Moves one job from route `s` to a position in route `t`.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [J] -> (B) ...      t: ... (X) -> (Y) ...
/// AFTER:
///    s: ... (A) -> (B) ...             t: ... (X) -> [J] -> (Y) ...
/// ```
pub struct Relocate {
    pub s_vehicle: usize,
    pub s_rank: usize,
    pub t_vehicle: usize,
    pub t_rank: usize,
    s_gain: Eval,
    t_delta: Eval,
}

impl Relocate {
    pub fn evaluate(
        ctx: &MoveContext,
        s_vehicle: usize,
        s_rank: usize,
        t_vehicle: usize,
        t_rank: usize,
    ) -> Option<Self> {
        debug_assert!(s_vehicle != t_vehicle);
        let job_rank = ctx.routes[s_vehicle].job_at(s_rank);

        if ctx.problem.job(job_rank).job_type() != JobType::Single
            || !ctx.problem.vehicle_ok_with_job(t_vehicle, job_rank)
        {
            return None;
        }

        let s_gain = removal_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            s_vehicle,
            s_rank,
            s_rank + 1,
        );
        let (t_delta, _) = addition_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            t_vehicle,
            t_rank,
            t_rank,
            s_vehicle,
            s_rank,
            s_rank + 1,
        );

        Some(Relocate {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            s_gain,
            t_delta,
        })
    }
}

impl LocalSearchOperator for Relocate {
    fn gain(&self) -> Eval {
        self.s_gain - self.t_delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let target = &ctx.routes[self.t_vehicle];
        let job_rank = ctx.routes[self.s_vehicle].job_at(self.s_rank);
        let job = ctx.problem.job(job_rank);

        route_caps_ok(ctx, self.s_vehicle, -self.s_gain, -1)
            && route_caps_ok(ctx, self.t_vehicle, self.t_delta, 1)
            && target.is_valid_addition_for_capacity(
                ctx.problem,
                job.pickup(),
                job.delivery(),
                self.t_rank,
            )
            && target.is_valid_addition_for_tw(
                ctx.problem,
                job.delivery(),
                std::iter::once(job_rank),
                self.t_rank,
                self.t_rank,
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let job_rank = routes[self.s_vehicle].job_at(self.s_rank);
        routes[self.s_vehicle].remove(problem, self.s_rank, 1);
        routes[self.t_vehicle].insert(problem, job_rank, self.t_rank);
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
    fn test_relocate_gain_and_apply() {
        let problem = test_utils::line_problem_with_vehicles(4, 2);
        let mut routes = test_utils::empty_routes(&problem);
        // Job 3 is far out on route 1 while route 0 already drives past
        // its neighbourhood.
        routes[0].set_route(&problem, vec![0, 1, 2]);
        routes[1].set_route(&problem, vec![3]);
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

        let relocate = Relocate::evaluate(&ctx, 1, 0, 0, 3).unwrap();
        // Route 1 disappears (800 round trip), route 0 extends from job 2
        // to job 3 and back (200 extra).
        assert_eq!(relocate.gain().cost, 600);
        assert!(relocate.is_valid(&ctx));

        drop(ctx);
        relocate.apply(&problem, &mut routes, &mut state);
        assert_eq!(routes[0].raw().route, vec![0, 1, 2, 3]);
        assert!(routes[1].is_empty());
    }

    #[test]
    fn test_relocate_then_inverse_restores_routes() {
        let problem = test_utils::line_problem_with_vehicles(4, 2);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![0, 1]);
        routes[1].set_route(&problem, vec![2, 3]);
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
        let forward = Relocate::evaluate(&ctx, 0, 1, 1, 0).unwrap();
        drop(ctx);
        forward.apply(&problem, &mut routes, &mut state);
        state.setup(&problem, &routes);

        let ctx = MoveContext {
            problem: &problem,
            state: &state,
            routes: &routes,
        };
        let inverse = Relocate::evaluate(&ctx, 1, 0, 0, 1).unwrap();
        assert_eq!(inverse.gain(), -forward.gain());
        drop(ctx);
        inverse.apply(&problem, &mut routes, &mut state);

        assert_eq!(routes[0].raw().route, vec![0, 1]);
        assert_eq!(routes[1].raw().route, vec![2, 3]);
    }
}
