use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::addition_cost_delta;
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext, route_caps_ok};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Cross-Exchange**
///
/// Swaps the edge at `s_rank` of route `s` with the edge at `t_rank` of
/// route `t`; all four orientation combinations are tried and the best
/// feasible one kept.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [S1 -> S2] -> (B) ...    t: ... (X) -> [T1 -> T2] -> (Y) ...
/// AFTER:
///    s: ... (A) -> [T1 -> T2] -> (B) ...    t: ... (X) -> [S1 -> S2] -> (Y) ...
/// ```
pub struct CrossExchange {
    pub s_vehicle: usize,
    pub s_rank: usize,
    pub t_vehicle: usize,
    pub t_rank: usize,
    pub reverse_t_edge: bool,
    pub reverse_s_edge: bool,
    s_delta: Eval,
    t_delta: Eval,
}

impl CrossExchange {
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

        let s_jobs = [source.job_at(s_rank), source.job_at(s_rank + 1)];
        let t_jobs = [target.job_at(t_rank), target.job_at(t_rank + 1)];

        for &job in s_jobs.iter() {
            if ctx.problem.job(job).job_type() != JobType::Single
                || !ctx.problem.vehicle_ok_with_job(t_vehicle, job)
            {
                return None;
            }
        }
        for &job in t_jobs.iter() {
            if ctx.problem.job(job).job_type() != JobType::Single
                || !ctx.problem.vehicle_ok_with_job(s_vehicle, job)
            {
                return None;
            }
        }

        // t's edge into s's slot, both orientations.
        let (s_straight, s_reversed) = addition_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            s_vehicle,
            s_rank,
            s_rank + 2,
            t_vehicle,
            t_rank,
            t_rank + 2,
        );
        let (t_straight, t_reversed) = addition_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            t_vehicle,
            t_rank,
            t_rank + 2,
            s_vehicle,
            s_rank,
            s_rank + 2,
        );

        let (s_delta, reverse_t_edge) = if s_reversed < s_straight {
            (s_reversed, true)
        } else {
            (s_straight, false)
        };
        let (t_delta, reverse_s_edge) = if t_reversed < t_straight {
            (t_reversed, true)
        } else {
            (t_straight, false)
        };

        Some(CrossExchange {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            reverse_t_edge,
            reverse_s_edge,
            s_delta,
            t_delta,
        })
    }

    fn oriented(jobs: [usize; 2], reversed: bool) -> [usize; 2] {
        if reversed { [jobs[1], jobs[0]] } else { jobs }
    }

    fn incoming_s(&self, routes: &[TwRoute]) -> [usize; 2] {
        let target = &routes[self.t_vehicle];
        Self::oriented(
            [target.job_at(self.t_rank), target.job_at(self.t_rank + 1)],
            self.reverse_t_edge,
        )
    }

    fn incoming_t(&self, routes: &[TwRoute]) -> [usize; 2] {
        let source = &routes[self.s_vehicle];
        Self::oriented(
            [source.job_at(self.s_rank), source.job_at(self.s_rank + 1)],
            self.reverse_s_edge,
        )
    }
}

impl LocalSearchOperator for CrossExchange {
    fn gain(&self) -> Eval {
        -(self.s_delta + self.t_delta)
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let source = &ctx.routes[self.s_vehicle];
        let target = &ctx.routes[self.t_vehicle];
        let into_s = self.incoming_s(ctx.routes);
        let into_t = self.incoming_t(ctx.routes);

        let s_delivery = target.delivery_in_range(self.t_rank, self.t_rank + 2);
        let t_delivery = source.delivery_in_range(self.s_rank, self.s_rank + 2);

        route_caps_ok(ctx, self.s_vehicle, self.s_delta, 0)
            && route_caps_ok(ctx, self.t_vehicle, self.t_delta, 0)
            && source.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &s_delivery,
                into_s.iter().copied(),
                self.s_rank,
                self.s_rank + 2,
            )
            && target.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &t_delivery,
                into_t.iter().copied(),
                self.t_rank,
                self.t_rank + 2,
            )
            && source.is_valid_addition_for_tw(
                ctx.problem,
                &s_delivery,
                into_s.iter().copied(),
                self.s_rank,
                self.s_rank + 2,
            )
            && target.is_valid_addition_for_tw(
                ctx.problem,
                &t_delivery,
                into_t.iter().copied(),
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
        let into_t = self.incoming_t(routes);
        routes[self.s_vehicle].replace(
            problem,
            into_s.into_iter(),
            self.s_rank,
            self.s_rank + 2,
        );
        routes[self.t_vehicle].replace(
            problem,
            into_t.into_iter(),
            self.t_rank,
            self.t_rank + 2,
        );
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}
