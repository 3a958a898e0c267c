use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::{addition_cost_delta, removal_cost_delta};
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext, route_caps_ok};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Or-Opt**
///
/// Moves the edge (two adjacent jobs) at `s_rank` of route `s` to a
/// position in route `t`, optionally reversing it.
///
/// ```text
/// BEFORE:
///    s: ... (A) -> [J1 -> J2] -> (B) ...    t: ... (X) -> (Y) ...
/// AFTER:
///    s: ... (A) -> (B) ...                  t: ... (X) -> [J1 -> J2] -> (Y) ...
/// ```
pub struct OrOpt {
    pub s_vehicle: usize,
    pub s_rank: usize,
    pub t_vehicle: usize,
    pub t_rank: usize,
    pub reversed: bool,
    s_gain: Eval,
    t_delta: Eval,
}

impl OrOpt {
    pub fn evaluate(
        ctx: &MoveContext,
        s_vehicle: usize,
        s_rank: usize,
        t_vehicle: usize,
        t_rank: usize,
    ) -> Option<Self> {
        debug_assert!(s_vehicle != t_vehicle);
        let source = &ctx.routes[s_vehicle];
        let (j1, j2) = (source.job_at(s_rank), source.job_at(s_rank + 1));

        if ctx.problem.job(j1).job_type() != JobType::Single
            || ctx.problem.job(j2).job_type() != JobType::Single
            || !ctx.problem.vehicle_ok_with_job(t_vehicle, j1)
            || !ctx.problem.vehicle_ok_with_job(t_vehicle, j2)
        {
            return None;
        }

        let s_gain = removal_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            s_vehicle,
            s_rank,
            s_rank + 2,
        );
        let (straight, reversed) = addition_cost_delta(
            ctx.problem,
            ctx.state,
            ctx.routes,
            t_vehicle,
            t_rank,
            t_rank,
            s_vehicle,
            s_rank,
            s_rank + 2,
        );

        let (t_delta, use_reversed) = if reversed < straight {
            (reversed, true)
        } else {
            (straight, false)
        };

        Some(OrOpt {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            reversed: use_reversed,
            s_gain,
            t_delta,
        })
    }

    fn moved_jobs(&self, routes: &[TwRoute]) -> [usize; 2] {
        let source = &routes[self.s_vehicle];
        let (j1, j2) = (source.job_at(self.s_rank), source.job_at(self.s_rank + 1));
        if self.reversed { [j2, j1] } else { [j1, j2] }
    }
}

impl LocalSearchOperator for OrOpt {
    fn gain(&self) -> Eval {
        self.s_gain - self.t_delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let source = &ctx.routes[self.s_vehicle];
        let target = &ctx.routes[self.t_vehicle];
        let jobs = self.moved_jobs(ctx.routes);

        let pickup = source.pickup_in_range(self.s_rank, self.s_rank + 2);
        let delivery = source.delivery_in_range(self.s_rank, self.s_rank + 2);

        route_caps_ok(ctx, self.s_vehicle, -self.s_gain, -2)
            && route_caps_ok(ctx, self.t_vehicle, self.t_delta, 2)
            && target.is_valid_addition_for_capacity_margins(
                ctx.problem,
                &pickup,
                &delivery,
                self.t_rank,
                self.t_rank,
            )
            && target.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &delivery,
                jobs.iter().copied(),
                self.t_rank,
                self.t_rank,
            )
            && target.is_valid_addition_for_tw(
                ctx.problem,
                &delivery,
                jobs.iter().copied(),
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
        let jobs = self.moved_jobs(routes);
        routes[self.s_vehicle].remove(problem, self.s_rank, 2);
        routes[self.t_vehicle].replace(problem, jobs.into_iter(), self.t_rank, self.t_rank);
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}
