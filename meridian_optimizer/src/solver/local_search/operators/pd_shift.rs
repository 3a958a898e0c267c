use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::construction::insertion_search::{RouteInsertion, compute_pd_insertion};
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext, route_caps_ok};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **PD-Shift**
///
/// Moves a pickup and its matching delivery from route `s` to the best
/// feasible pair of positions in route `t`.
///
/// ```text
/// BEFORE:
///    s: ... [P] ... [D] ...      t: ... (X) -> (Y) ...
/// AFTER:
///    s: ... ...                  t: ... [P] ... [D] ...
/// ```
pub struct PdShift {
    pub s_vehicle: usize,
    pub pickup_rank: usize,
    pub delivery_rank: usize,
    pub t_vehicle: usize,
    insertion: RouteInsertion,
    s_gain: Eval,
}

impl PdShift {
    pub fn evaluate(
        ctx: &MoveContext,
        s_vehicle: usize,
        pickup_rank: usize,
        t_vehicle: usize,
    ) -> Option<Self> {
        debug_assert!(s_vehicle != t_vehicle);
        let source = &ctx.routes[s_vehicle];
        let pickup_job = source.job_at(pickup_rank);
        if !ctx.problem.job(pickup_job).is_pickup() {
            return None;
        }
        let delivery_rank = ctx.state.matching_delivery_rank[s_vehicle][pickup_rank]?;

        let mut s_gain = ctx.state.pd_gains[s_vehicle][pickup_rank];
        if source.len() == 2 {
            s_gain += Eval::cost_only(ctx.problem.vehicle(s_vehicle).fixed_cost());
        }

        let mut insertion =
            compute_pd_insertion(ctx.problem, &ctx.routes[t_vehicle], pickup_job, Eval::NO_EVAL);
        if !insertion.is_feasible() {
            return None;
        }
        if ctx.routes[t_vehicle].is_empty() {
            insertion.eval += Eval::cost_only(ctx.problem.vehicle(t_vehicle).fixed_cost());
        }

        Some(PdShift {
            s_vehicle,
            pickup_rank,
            delivery_rank,
            t_vehicle,
            insertion,
            s_gain,
        })
    }
}

impl LocalSearchOperator for PdShift {
    fn gain(&self) -> Eval {
        self.s_gain - self.insertion.eval
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        // Feasibility in the target was established by the insertion
        // search; the caps remain to check on both sides.
        route_caps_ok(ctx, self.s_vehicle, -self.s_gain, -2)
            && route_caps_ok(ctx, self.t_vehicle, self.insertion.eval, 2)
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let source = &mut routes[self.s_vehicle];
        let pickup_job = source.job_at(self.pickup_rank);
        let delivery_job = problem.matching_delivery(pickup_job);

        source.remove(problem, self.delivery_rank, 1);
        source.remove(problem, self.pickup_rank, 1);

        let target = &mut routes[self.t_vehicle];
        let modified: Vec<usize> = std::iter::once(pickup_job)
            .chain(
                target.raw().route[self.insertion.pickup_rank..self.insertion.delivery_rank]
                    .iter()
                    .copied(),
            )
            .chain(std::iter::once(delivery_job))
            .collect();
        target.replace(
            problem,
            modified.into_iter(),
            self.insertion.pickup_rank,
            self.insertion.delivery_rank,
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
    fn test_pd_shift_moves_pair() {
        let problem = test_utils::shipment_problem_with_two_vehicles();
        let mut routes = test_utils::empty_routes(&problem);
        routes[0].set_route(&problem, vec![0, 1]);
        let mut state = SolutionState::new(&problem);
        state.unassigned.remove(&0);
        state.unassigned.remove(&1);
        state.setup(&problem, &routes);

        let ctx = MoveContext {
            problem: &problem,
            state: &state,
            routes: &routes,
        };

        let shift = PdShift::evaluate(&ctx, 0, 0, 1).unwrap();
        assert!(shift.is_valid(&ctx));

        drop(ctx);
        shift.apply(&problem, &mut routes, &mut state);
        assert!(routes[0].is_empty());
        assert_eq!(routes[1].raw().route, vec![0, 1]);
    }
}
