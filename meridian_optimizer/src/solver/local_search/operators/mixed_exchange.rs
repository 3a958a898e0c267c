use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::addition_cost_delta;
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext, route_caps_ok};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Mixed-Exchange**
///
/// Swaps the single job at `s_rank` of route `s` with the edge at
/// `t_rank` of route `t`; the edge may enter `s` reversed.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [J] -> (B) ...        t: ... (X) -> [T1 -> T2] -> (Y) ...
/// AFTER:
///    s: ... (A) -> [T1 -> T2] -> (B) ... t: ... (X) -> [J] -> (Y) ...
/// ```
pub struct MixedExchange {
    pub s_vehicle: usize,
    pub s_rank: usize,
    pub t_vehicle: usize,
    pub t_rank: usize,
    pub reverse_t_edge: bool,
    s_delta: Eval,
    t_delta: Eval,
}

impl MixedExchange {
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

        let s_job = source.job_at(s_rank);
        let t_jobs = [target.job_at(t_rank), target.job_at(t_rank + 1)];

        if ctx.problem.job(s_job).job_type() != JobType::Single
            || !ctx.problem.vehicle_ok_with_job(t_vehicle, s_job)
        {
            return None;
        }
        for &job in t_jobs.iter() {
            if ctx.problem.job(job).job_type() != JobType::Single
                || !ctx.problem.vehicle_ok_with_job(s_vehicle, job)
            {
                return None;
            }
        }

        let (s_straight, s_reversed) = addition_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            s_vehicle,
            s_rank,
            s_rank + 1,
            t_vehicle,
            t_rank,
            t_rank + 2,
        );
        let (t_delta, _) = addition_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            t_vehicle,
            t_rank,
            t_rank + 2,
            s_vehicle,
            s_rank,
            s_rank + 1,
        );

        let (s_delta, reverse_t_edge) = if s_reversed < s_straight {
            (s_reversed, true)
        } else {
            (s_straight, false)
        };

        Some(MixedExchange {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            reverse_t_edge,
            s_delta,
            t_delta,
        })
    }

    fn incoming_s(&self, routes: &[TwRoute]) -> [usize; 2] {
        let target = &routes[self.t_vehicle];
        let jobs = [target.job_at(self.t_rank), target.job_at(self.t_rank + 1)];
        if self.reverse_t_edge {
            [jobs[1], jobs[0]]
        } else {
            jobs
        }
    }
}

impl LocalSearchOperator for MixedExchange {
    fn gain(&self) -> Eval {
        -(self.s_delta + self.t_delta)
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let source = &ctx.routes[self.s_vehicle];
        let target = &ctx.routes[self.t_vehicle];
        let into_s = self.incoming_s(ctx.routes);
        let s_job = source.job_at(self.s_rank);

        let s_delivery = target.delivery_in_range(self.t_rank, self.t_rank + 2);
        let t_delivery = source.delivery_in_range(self.s_rank, self.s_rank + 1);

        route_caps_ok(ctx, self.s_vehicle, self.s_delta, 1)
            && route_caps_ok(ctx, self.t_vehicle, self.t_delta, -1)
            && source.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &s_delivery,
                into_s.iter().copied(),
                self.s_rank,
                self.s_rank + 1,
            )
            && target.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &t_delivery,
                std::iter::once(s_job),
                self.t_rank,
                self.t_rank + 2,
            )
            && source.is_valid_addition_for_tw(
                ctx.problem,
                &s_delivery,
                into_s.iter().copied(),
                self.s_rank,
                self.s_rank + 1,
            )
            && target.is_valid_addition_for_tw(
                ctx.problem,
                &t_delivery,
                std::iter::once(s_job),
                self.t_rank,
                self.t_rank + 2,
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let into_s = self.incoming_s(routes);
        let s_job = routes[self.s_vehicle].job_at(self.s_rank);

        routes[self.s_vehicle].replace(
            problem,
            into_s.into_iter(),
            self.s_rank,
            self.s_rank + 1,
        );
        routes[self.t_vehicle].replace(
            problem,
            std::iter::once(s_job),
            self.t_rank,
            self.t_rank + 2,
        );
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
    fn test_mixed_exchange_swaps_job_for_edge() {
        let problem = test_utils::line_problem_with_vehicles(6, 2);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![0, 4, 5]);
        routes[1].set_route(&problem, vec![1, 2, 3]);
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

        // Swap job 4 (route 0, rank 1) against edge (2, 3) of route 1:
        // not improving on a line, but well-formed either way.
        let exchange = MixedExchange::evaluate(&ctx, 0, 1, 1, 1).unwrap();
        assert!(exchange.is_valid(&ctx));

        drop(ctx);
        exchange.apply(&problem, &mut routes, &mut state);
        assert_eq!(routes[0].raw().route, vec![0, 2, 3, 5]);
        assert_eq!(routes[1].raw().route, vec![1, 4]);
    }
}
