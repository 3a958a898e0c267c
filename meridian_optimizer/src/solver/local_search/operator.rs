use fxhash::FxHashMap;

use crate::problem::eval::Eval;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

use super::operators::cross_exchange::CrossExchange;
use super::operators::intra_cross_exchange::IntraCrossExchange;
use super::operators::intra_exchange::IntraExchange;
use super::operators::intra_mixed_exchange::IntraMixedExchange;
use super::operators::intra_or_opt::IntraOrOpt;
use super::operators::intra_relocate::IntraRelocate;
use super::operators::intra_two_opt::IntraTwoOpt;
use super::operators::mixed_exchange::MixedExchange;
use super::operators::or_opt::OrOpt;
use super::operators::pd_shift::PdShift;
use super::operators::priority_replace::PriorityReplace;
use super::operators::relocate::Relocate;
use super::operators::reverse_two_opt::ReverseTwoOpt;
use super::operators::route_exchange::RouteExchange;
use super::operators::route_split::RouteSplit;
use super::operators::swap_star::SwapStar;
use super::operators::tsp_fix::TspFix;
use super::operators::two_opt::TwoOpt;
use super::operators::unassigned_exchange::UnassignedExchange;

/// Read-only view handed to operators for one evaluate/apply cycle.
/// Operators never store it and never maintain any of the cached state.
pub struct MoveContext<'a> {
    pub problem: &'a VehicleRoutingProblem,
    pub state: &'a SolutionState,
    pub routes: &'a [TwRoute],
}

/// The contract every move operator implements. Construction failures are
/// pre-checked at the factory (`try_new`/`evaluate` returning `None`);
/// the driver never learns about unviable moves.
pub trait LocalSearchOperator {
    /// Eval saved by applying this move; may be negative.
    fn gain(&self) -> Eval;
    /// Whether application preserves all hard constraints.
    fn is_valid(&self, ctx: &MoveContext) -> bool;
    /// Mutates the involved routes. Operators touching the unassigned
    /// set also refresh it here; cached tables are the driver's job.
    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        state: &mut SolutionState,
    );
    /// Vehicle ranks whose cached state must be rebuilt afterwards.
    fn update_candidates(&self) -> Vec<usize>;
    /// Net change in served priority.
    fn priority_gain(&self) -> i64 {
        0
    }
    /// Net change in assigned job count.
    fn assigned_delta(&self) -> i64 {
        0
    }
    /// Cheap bound the driver can use to prune before calling `gain`
    /// or `is_valid`; defaults to the exact gain.
    fn upper_bound_on_gain(&self) -> Eval {
        self.gain()
    }
}

/// Common obligation: the affected vehicle still honors its travel-time
/// and distance caps and its task cap after its eval changes by `delta`
/// and its length by `len_delta`.
pub(crate) fn route_caps_ok(
    ctx: &MoveContext,
    v: usize,
    delta: Eval,
    len_delta: i64,
) -> bool {
    let vehicle = ctx.problem.vehicle(v);
    let new_eval = ctx.state.route_evals[v] + delta;
    let new_len = ctx.routes[v].len() as i64 + len_delta;

    vehicle.ok_for_travel_time(new_eval.duration)
        && vehicle.ok_for_distance(new_eval.distance)
        && new_len <= vehicle.max_tasks() as i64
}

/// Pickup/delivery pairing check after replacing ranks `[first, last)` of
/// route `v` with `replacement`: every pickup anywhere in the resulting
/// sequence must still precede its delivery within the same route.
pub(crate) fn pd_pairs_ok_after_replace(
    ctx: &MoveContext,
    v: usize,
    first: usize,
    last: usize,
    replacement: &[usize],
) -> bool {
    let route = &ctx.routes[v];
    if !ctx.problem.has_shipments() {
        return true;
    }

    let mut position: FxHashMap<usize, usize> = FxHashMap::default();
    let mut rank = 0;
    for &job in &route.raw().route[..first] {
        position.insert(job, rank);
        rank += 1;
    }
    for &job in replacement {
        position.insert(job, rank);
        rank += 1;
    }
    for &job in &route.raw().route[last..] {
        position.insert(job, rank);
        rank += 1;
    }

    for (&job, &job_position) in &position {
        if ctx.problem.job(job).is_pickup() {
            let delivery = ctx.problem.matching_delivery(job);
            match position.get(&delivery) {
                Some(&delivery_position) if job_position < delivery_position => {}
                _ => return false,
            }
        }
    }

    true
}

/// Tail swaps must not separate a pickup from its delivery: no shipment
/// may straddle the cut after `boundary` (exclusive prefix length).
pub(crate) fn no_pd_straddle(ctx: &MoveContext, v: usize, boundary: usize) -> bool {
    if !ctx.problem.has_shipments() {
        return true;
    }
    let matching = &ctx.state.matching_delivery_rank[v];
    (0..boundary.min(matching.len()))
        .all(|rank| matching[rank].is_none_or(|delivery_rank| delivery_rank < boundary))
}

/// Closed catalogue of move operators, dispatched without dynamic
/// allocation.
pub enum Move {
    Relocate(Relocate),
    OrOpt(OrOpt),
    CrossExchange(CrossExchange),
    MixedExchange(MixedExchange),
    TwoOpt(TwoOpt),
    ReverseTwoOpt(ReverseTwoOpt),
    IntraRelocate(IntraRelocate),
    IntraOrOpt(IntraOrOpt),
    IntraExchange(IntraExchange),
    IntraMixedExchange(IntraMixedExchange),
    IntraCrossExchange(IntraCrossExchange),
    IntraTwoOpt(IntraTwoOpt),
    PdShift(PdShift),
    RouteExchange(RouteExchange),
    UnassignedExchange(UnassignedExchange),
    PriorityReplace(PriorityReplace),
    SwapStar(SwapStar),
    RouteSplit(RouteSplit),
    TspFix(TspFix),
}

macro_rules! dispatch {
    ($self:ident, $op:ident => $body:expr) => {
        match $self {
            Move::Relocate($op) => $body,
            Move::OrOpt($op) => $body,
            Move::CrossExchange($op) => $body,
            Move::MixedExchange($op) => $body,
            Move::TwoOpt($op) => $body,
            Move::ReverseTwoOpt($op) => $body,
            Move::IntraRelocate($op) => $body,
            Move::IntraOrOpt($op) => $body,
            Move::IntraExchange($op) => $body,
            Move::IntraMixedExchange($op) => $body,
            Move::IntraCrossExchange($op) => $body,
            Move::IntraTwoOpt($op) => $body,
            Move::PdShift($op) => $body,
            Move::RouteExchange($op) => $body,
            Move::UnassignedExchange($op) => $body,
            Move::PriorityReplace($op) => $body,
            Move::SwapStar($op) => $body,
            Move::RouteSplit($op) => $body,
            Move::TspFix($op) => $body,
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(impl From<$ty> for Move {
            fn from(op: $ty) -> Move {
                Move::$variant(op)
            }
        })*
    };
}

impl_from!(
    Relocate => Relocate,
    OrOpt => OrOpt,
    CrossExchange => CrossExchange,
    MixedExchange => MixedExchange,
    TwoOpt => TwoOpt,
    ReverseTwoOpt => ReverseTwoOpt,
    IntraRelocate => IntraRelocate,
    IntraOrOpt => IntraOrOpt,
    IntraExchange => IntraExchange,
    IntraMixedExchange => IntraMixedExchange,
    IntraCrossExchange => IntraCrossExchange,
    IntraTwoOpt => IntraTwoOpt,
    PdShift => PdShift,
    RouteExchange => RouteExchange,
    UnassignedExchange => UnassignedExchange,
    PriorityReplace => PriorityReplace,
    SwapStar => SwapStar,
    RouteSplit => RouteSplit,
    TspFix => TspFix,
);

impl Move {
    pub fn operator_name(&self) -> &'static str {
        match self {
            Move::Relocate(_) => "Relocate",
            Move::OrOpt(_) => "Or-Opt",
            Move::CrossExchange(_) => "Cross-Exchange",
            Move::MixedExchange(_) => "Mixed-Exchange",
            Move::TwoOpt(_) => "Two-Opt",
            Move::ReverseTwoOpt(_) => "Reverse-Two-Opt",
            Move::IntraRelocate(_) => "Intra-Relocate",
            Move::IntraOrOpt(_) => "Intra-Or-Opt",
            Move::IntraExchange(_) => "Intra-Exchange",
            Move::IntraMixedExchange(_) => "Intra-Mixed-Exchange",
            Move::IntraCrossExchange(_) => "Intra-Cross-Exchange",
            Move::IntraTwoOpt(_) => "Intra-Two-Opt",
            Move::PdShift(_) => "PD-Shift",
            Move::RouteExchange(_) => "Route-Exchange",
            Move::UnassignedExchange(_) => "Unassigned-Exchange",
            Move::PriorityReplace(_) => "Priority-Replace",
            Move::SwapStar(_) => "Swap-Star",
            Move::RouteSplit(_) => "Route-Split",
            Move::TspFix(_) => "TSP-Fix",
        }
    }
}

impl LocalSearchOperator for Move {
    fn gain(&self) -> Eval {
        dispatch!(self, op => op.gain())
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        dispatch!(self, op => op.is_valid(ctx))
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        state: &mut SolutionState,
    ) {
        dispatch!(self, op => op.apply(problem, routes, state))
    }

    fn update_candidates(&self) -> Vec<usize> {
        dispatch!(self, op => op.update_candidates())
    }

    fn priority_gain(&self) -> i64 {
        dispatch!(self, op => op.priority_gain())
    }

    fn assigned_delta(&self) -> i64 {
        dispatch!(self, op => op.assigned_delta())
    }

    fn upper_bound_on_gain(&self) -> Eval {
        dispatch!(self, op => op.upper_bound_on_gain())
    }
}
