use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::slice_route_eval;
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Route-Split**
///
/// Splits one route across two empty vehicles, choosing the split rank
/// and the vehicle pair minimizing total cost. When the best empty
/// vehicle is the same for both halves, the runner-up combinations break
/// the tie.
pub struct RouteSplit {
    pub s_vehicle: usize,
    pub split_rank: usize,
    pub head_vehicle: usize,
    pub tail_vehicle: usize,
    gain: Eval,
}

/// Best and second-best empty vehicle for serving a slice.
fn rank_empty_vehicles(
    ctx: &MoveContext,
    s_vehicle: usize,
    empty_vehicles: &[usize],
    first: usize,
    last: usize,
) -> Vec<(Eval, usize)> {
    let route = &ctx.routes[s_vehicle];
    let mut candidates: Vec<(Eval, usize)> = empty_vehicles
        .iter()
        .filter(|&&e| {
            let vehicle = ctx.problem.vehicle(e);
            last - first <= vehicle.max_tasks()
                && (first..last).all(|rank| {
                    ctx.problem.vehicle_ok_with_job(e, route.job_at(rank))
                })
                && route
                    .delivery_in_range(first, last)
                    .fits_in(vehicle.capacity())
                && route
                    .pickup_in_range(first, last)
                    .fits_in(vehicle.capacity())
        })
        .map(|&e| {
            (
                slice_route_eval(ctx.problem, ctx.state, ctx.routes, s_vehicle, e, first, last),
                e,
            )
        })
        .collect();
    candidates.sort();
    candidates.truncate(2);
    candidates
}

impl RouteSplit {
    pub fn evaluate(
        ctx: &MoveContext,
        s_vehicle: usize,
        empty_vehicles: &[usize],
    ) -> Option<Self> {
        let route = &ctx.routes[s_vehicle];
        if route.len() < 2 || empty_vehicles.len() < 2 {
            return None;
        }

        let current = ctx.state.route_evals[s_vehicle];
        let mut best: Option<RouteSplit> = None;

        for split_rank in 1..route.len() {
            let heads = rank_empty_vehicles(ctx, s_vehicle, empty_vehicles, 0, split_rank);
            let tails =
                rank_empty_vehicles(ctx, s_vehicle, empty_vehicles, split_rank, route.len());
            if heads.is_empty() || tails.is_empty() {
                continue;
            }

            // Best pair of distinct vehicles; when the cheapest candidate
            // coincides, pick the better of the two runner-up mixes.
            let mut combos: Vec<(Eval, usize, usize)> = Vec::new();
            for &(head_eval, head_vehicle) in &heads {
                for &(tail_eval, tail_vehicle) in &tails {
                    if head_vehicle != tail_vehicle {
                        combos.push((head_eval + tail_eval, head_vehicle, tail_vehicle));
                    }
                }
            }
            let Some(&(total, head_vehicle, tail_vehicle)) = combos.iter().min() else {
                continue;
            };

            let gain = current - total;
            if best.as_ref().is_none_or(|b| gain > b.gain) {
                best = Some(RouteSplit {
                    s_vehicle,
                    split_rank,
                    head_vehicle,
                    tail_vehicle,
                    gain,
                });
            }
        }

        best
    }

    fn halves(&self, routes: &[TwRoute]) -> (Vec<usize>, Vec<usize>) {
        let route = &routes[self.s_vehicle];
        (
            route.raw().route[..self.split_rank].to_vec(),
            route.raw().route[self.split_rank..].to_vec(),
        )
    }
}

impl LocalSearchOperator for RouteSplit {
    fn gain(&self) -> Eval {
        self.gain
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let (head, tail) = self.halves(ctx.routes);
        let source = &ctx.routes[self.s_vehicle];

        // No shipment may straddle the split.
        if ctx.problem.has_shipments() {
            let straddle = (0..self.split_rank).any(|rank| {
                ctx.state.matching_delivery_rank[self.s_vehicle][rank]
                    .is_some_and(|d| d >= self.split_rank)
            });
            if straddle {
                return false;
            }
        }

        for (half, vehicle) in [(&head, self.head_vehicle), (&tail, self.tail_vehicle)] {
            let empty = &ctx.routes[vehicle];
            let delivery = half
                .iter()
                .fold(ctx.problem.zero_amount(), |mut acc, &job| {
                    acc += ctx.problem.job(job).delivery();
                    acc
                });
            if !empty.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &delivery,
                half.iter().copied(),
                0,
                0,
            ) || !empty.is_valid_addition_for_tw(
                ctx.problem,
                &delivery,
                half.iter().copied(),
                0,
                0,
            ) {
                return false;
            }
            let slice_eval = slice_route_eval(
                ctx.problem,
                ctx.state,
                ctx.routes,
                self.s_vehicle,
                vehicle,
                if vehicle == self.head_vehicle { 0 } else { self.split_rank },
                if vehicle == self.head_vehicle {
                    self.split_rank
                } else {
                    source.len()
                },
            );
            let v = ctx.problem.vehicle(vehicle);
            if !v.ok_for_travel_time(slice_eval.duration) || !v.ok_for_distance(slice_eval.distance)
            {
                return false;
            }
        }

        true
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let (head, tail) = self.halves(routes);
        let len = routes[self.s_vehicle].len();
        routes[self.s_vehicle].remove(problem, 0, len);
        routes[self.head_vehicle].set_route(problem, head);
        routes[self.tail_vehicle].set_route(problem, tail);
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.s_vehicle, self.head_vehicle, self.tail_vehicle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::solution::solution_state::SolutionState;
    use crate::test_utils;

    #[test]
    fn test_route_split_uses_two_empty_vehicles() {
        let problem = test_utils::route_split_problem();
        let mut routes = test_utils::empty_routes(&problem);
        // One long route visiting both clusters; vehicles 1 and 2 sit
        // idle, one per cluster.
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

        let split = RouteSplit::evaluate(&ctx, 0, &[1, 2]).unwrap();
        assert!(split.gain().cost > 0);
        assert!(split.is_valid(&ctx));
        assert_eq!(split.split_rank, 2);

        drop(ctx);
        split.apply(&problem, &mut routes, &mut state);
        assert!(routes[0].is_empty());
        assert_eq!(routes[split.head_vehicle].raw().route, vec![0, 1]);
        assert_eq!(routes[split.tail_vehicle].raw().route, vec![2, 3]);
    }
}
