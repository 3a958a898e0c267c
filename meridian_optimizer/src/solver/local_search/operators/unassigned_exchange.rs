use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::sequence_replace_delta;
use crate::solver::local_search::operator::{
    LocalSearchOperator, MoveContext, pd_pairs_ok_after_replace, route_caps_ok,
};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Unassigned-Exchange**
///
/// Replaces the job at `s_rank` of a route with an unassigned job `u`,
/// inserted so that it ends up at rank `t_rank`. The displaced job goes
/// back to the unassigned set.
pub struct UnassignedExchange {
    pub vehicle: usize,
    pub s_rank: usize,
    pub t_rank: usize,
    pub unassigned_job: usize,
    delta: Eval,
    priority_gain: i64,
}

impl UnassignedExchange {
    pub fn evaluate(
        ctx: &MoveContext,
        vehicle: usize,
        s_rank: usize,
        t_rank: usize,
        unassigned_job: usize,
    ) -> Option<Self> {
        let route = &ctx.routes[vehicle];
        if ctx.problem.job(unassigned_job).job_type() != JobType::Single
            || !ctx.problem.vehicle_ok_with_job(vehicle, unassigned_job)
        {
            return None;
        }
        let removed = route.job_at(s_rank);
        if ctx.problem.job(removed).job_type() != JobType::Single {
            return None;
        }

        let (first, last) = Self::range(s_rank, t_rank);
        let replacement = Self::rearranged(route, s_rank, t_rank, unassigned_job);
        let delta = sequence_replace_delta(
            ctx.problem,
            route,
            replacement.iter().copied(),
            first,
            last,
        );

        let priority_gain = i64::from(ctx.problem.job(unassigned_job).priority())
            - i64::from(ctx.problem.job(removed).priority());
        // Trading served priority away is never an improvement under the
        // lexicographic solution order.
        if priority_gain < 0 {
            return None;
        }

        Some(UnassignedExchange {
            vehicle,
            s_rank,
            t_rank,
            unassigned_job,
            delta,
            priority_gain,
        })
    }

    fn range(s_rank: usize, t_rank: usize) -> (usize, usize) {
        (s_rank.min(t_rank), s_rank.max(t_rank) + 1)
    }

    fn rearranged(route: &TwRoute, s_rank: usize, t_rank: usize, incoming: usize) -> Vec<usize> {
        if t_rank <= s_rank {
            let mut jobs = vec![incoming];
            jobs.extend_from_slice(&route.raw().route[t_rank..s_rank]);
            jobs
        } else {
            let mut jobs = route.raw().route[s_rank + 1..=t_rank].to_vec();
            jobs.push(incoming);
            jobs
        }
    }
}

impl LocalSearchOperator for UnassignedExchange {
    fn gain(&self) -> Eval {
        -self.delta
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let route = &ctx.routes[self.vehicle];
        let (first, last) = Self::range(self.s_rank, self.t_rank);
        let replacement =
            Self::rearranged(route, self.s_rank, self.t_rank, self.unassigned_job);

        let mut delivery = route.delivery_in_range(first, last);
        delivery -= ctx.problem.job(route.job_at(self.s_rank)).delivery();
        delivery += ctx.problem.job(self.unassigned_job).delivery();

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
        state: &mut SolutionState,
    ) {
        let route = &mut routes[self.vehicle];
        let removed = route.job_at(self.s_rank);
        let (first, last) = Self::range(self.s_rank, self.t_rank);
        let replacement = Self::rearranged(route, self.s_rank, self.t_rank, self.unassigned_job);
        route.replace(problem, replacement.into_iter(), first, last);

        state.unassigned.remove(&self.unassigned_job);
        state.unassigned.insert(removed);
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.vehicle]
    }

    fn priority_gain(&self) -> i64 {
        self.priority_gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    #[test]
    fn test_unassigned_exchange_swaps_in_job() {
        let problem = test_utils::line_problem(3);
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![0, 2]);
        let mut state = SolutionState::new(&problem);
        state.unassigned.remove(&0);
        state.unassigned.remove(&2);
        state.setup(&problem, &routes);

        let ctx = MoveContext {
            problem: &problem,
            state: &state,
            routes: &routes,
        };

        let exchange = UnassignedExchange::evaluate(&ctx, 0, 1, 1, 1).unwrap();
        assert!(exchange.is_valid(&ctx));
        assert_eq!(exchange.priority_gain(), 0);

        drop(ctx);
        exchange.apply(&problem, &mut routes, &mut state);
        assert_eq!(routes[0].raw().route, vec![0, 1]);
        assert!(state.unassigned.contains(&2));
        assert!(!state.unassigned.contains(&1));
    }
}
