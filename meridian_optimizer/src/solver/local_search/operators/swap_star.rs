use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::cost_delta::{sequence_replace_delta, single_addition_delta};
use crate::solver::local_search::operator::{LocalSearchOperator, MoveContext, route_caps_ok};
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

/// **Swap-Star**
///
/// For each pair of jobs (a in `s`, b in `t`), considers not only the
/// same-position swap but also inserting each swapped job at one of its
/// three cheapest positions in the other route, and keeps the best
/// feasible of the resulting configurations.
pub struct SwapStar {
    pub s_vehicle: usize,
    pub t_vehicle: usize,
    pub a_rank: usize,
    pub b_rank: usize,
    /// Resulting rank of b in `s` and of a in `t`.
    pub s_insert_rank: usize,
    pub t_insert_rank: usize,
    s_delta: Eval,
    t_delta: Eval,
}

/// Range affected when the job at `removed` ends up replaced by `incoming`
/// landing at `target` (resulting rank).
fn exchange_range(removed: usize, target: usize) -> (usize, usize) {
    (removed.min(target), removed.max(target) + 1)
}

fn exchange_replacement(
    route: &TwRoute,
    removed: usize,
    target: usize,
    incoming: usize,
) -> Vec<usize> {
    if target <= removed {
        let mut jobs = vec![incoming];
        jobs.extend_from_slice(&route.raw().route[target..removed]);
        jobs
    } else {
        let mut jobs = route.raw().route[removed + 1..=target].to_vec();
        jobs.push(incoming);
        jobs
    }
}

/// The three cheapest insertion ranks for a job on the current route.
fn top_insertion_ranks(
    problem: &VehicleRoutingProblem,
    route: &TwRoute,
    job_rank: usize,
) -> Vec<usize> {
    let mut scored: Vec<(Eval, usize)> = (0..=route.len())
        .map(|rank| (single_addition_delta(problem, route, job_rank, rank), rank))
        .collect();
    scored.sort();
    scored.truncate(3);
    scored.into_iter().map(|(_, rank)| rank).collect()
}

impl SwapStar {
    pub fn evaluate(ctx: &MoveContext, s_vehicle: usize, t_vehicle: usize) -> Option<Self> {
        debug_assert!(s_vehicle != t_vehicle);
        let source = &ctx.routes[s_vehicle];
        let target = &ctx.routes[t_vehicle];
        if source.is_empty() || target.is_empty() {
            return None;
        }

        let s_candidates: Vec<usize> = (0..source.len())
            .filter(|&rank| {
                let job = source.job_at(rank);
                ctx.problem.job(job).job_type() == JobType::Single
                    && ctx.problem.vehicle_ok_with_job(t_vehicle, job)
            })
            .collect();
        let t_candidates: Vec<usize> = (0..target.len())
            .filter(|&rank| {
                let job = target.job_at(rank);
                ctx.problem.job(job).job_type() == JobType::Single
                    && ctx.problem.vehicle_ok_with_job(s_vehicle, job)
            })
            .collect();
        if s_candidates.is_empty() || t_candidates.is_empty() {
            return None;
        }

        // Cheapest insertion ranks of each candidate into the other
        // route, on the unmodified sequences.
        let b_tops: Vec<(usize, Vec<usize>)> = t_candidates
            .iter()
            .map(|&b_rank| {
                (
                    b_rank,
                    top_insertion_ranks(ctx.problem, source, target.job_at(b_rank)),
                )
            })
            .collect();
        let a_tops: Vec<(usize, Vec<usize>)> = s_candidates
            .iter()
            .map(|&a_rank| {
                (
                    a_rank,
                    top_insertion_ranks(ctx.problem, target, source.job_at(a_rank)),
                )
            })
            .collect();

        let mut best: Option<SwapStar> = None;

        for (a_idx, &a_rank) in s_candidates.iter().enumerate() {
            for (b_idx, &b_rank) in t_candidates.iter().enumerate() {
                let b_job = target.job_at(b_rank);
                let a_job = source.job_at(a_rank);

                let mut s_positions = vec![a_rank];
                for &ins in &b_tops[b_idx].1 {
                    let resulting = if ins > a_rank { ins - 1 } else { ins };
                    let resulting = resulting.min(source.len() - 1);
                    if !s_positions.contains(&resulting) {
                        s_positions.push(resulting);
                    }
                }
                let mut t_positions = vec![b_rank];
                for &ins in &a_tops[a_idx].1 {
                    let resulting = if ins > b_rank { ins - 1 } else { ins };
                    let resulting = resulting.min(target.len() - 1);
                    if !t_positions.contains(&resulting) {
                        t_positions.push(resulting);
                    }
                }

                for &s_pos in &s_positions {
                    let (s_first, s_last) = exchange_range(a_rank, s_pos);
                    let s_replacement = exchange_replacement(source, a_rank, s_pos, b_job);
                    let s_delta = sequence_replace_delta(
                        ctx.problem,
                        source,
                        s_replacement.iter().copied(),
                        s_first,
                        s_last,
                    );

                    for &t_pos in &t_positions {
                        let (t_first, t_last) = exchange_range(b_rank, t_pos);
                        let t_replacement =
                            exchange_replacement(target, b_rank, t_pos, a_job);
                        let t_delta = sequence_replace_delta(
                            ctx.problem,
                            target,
                            t_replacement.iter().copied(),
                            t_first,
                            t_last,
                        );

                        let candidate = SwapStar {
                            s_vehicle,
                            t_vehicle,
                            a_rank,
                            b_rank,
                            s_insert_rank: s_pos,
                            t_insert_rank: t_pos,
                            s_delta,
                            t_delta,
                        };
                        let better = match &best {
                            None => true,
                            Some(b) => candidate.gain() > b.gain(),
                        };
                        if better {
                            best = Some(candidate);
                        }
                    }
                }
            }
        }

        best
    }
}

impl LocalSearchOperator for SwapStar {
    fn gain(&self) -> Eval {
        -(self.s_delta + self.t_delta)
    }

    fn is_valid(&self, ctx: &MoveContext) -> bool {
        let source = &ctx.routes[self.s_vehicle];
        let target = &ctx.routes[self.t_vehicle];
        let a_job = source.job_at(self.a_rank);
        let b_job = target.job_at(self.b_rank);

        let (s_first, s_last) = exchange_range(self.a_rank, self.s_insert_rank);
        let (t_first, t_last) = exchange_range(self.b_rank, self.t_insert_rank);
        let s_replacement =
            exchange_replacement(source, self.a_rank, self.s_insert_rank, b_job);
        let t_replacement =
            exchange_replacement(target, self.b_rank, self.t_insert_rank, a_job);

        let mut s_delivery = source.delivery_in_range(s_first, s_last);
        s_delivery -= ctx.problem.job(a_job).delivery();
        s_delivery += ctx.problem.job(b_job).delivery();
        let mut t_delivery = target.delivery_in_range(t_first, t_last);
        t_delivery -= ctx.problem.job(b_job).delivery();
        t_delivery += ctx.problem.job(a_job).delivery();

        route_caps_ok(ctx, self.s_vehicle, self.s_delta, 0)
            && route_caps_ok(ctx, self.t_vehicle, self.t_delta, 0)
            && source.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &s_delivery,
                s_replacement.iter().copied(),
                s_first,
                s_last,
            )
            && target.is_valid_addition_for_capacity_inclusion(
                ctx.problem,
                &t_delivery,
                t_replacement.iter().copied(),
                t_first,
                t_last,
            )
            && source.is_valid_addition_for_tw(
                ctx.problem,
                &s_delivery,
                s_replacement.iter().copied(),
                s_first,
                s_last,
            )
            && target.is_valid_addition_for_tw(
                ctx.problem,
                &t_delivery,
                t_replacement.iter().copied(),
                t_first,
                t_last,
            )
    }

    fn apply(
        &self,
        problem: &VehicleRoutingProblem,
        routes: &mut [TwRoute],
        _state: &mut SolutionState,
    ) {
        let a_job = routes[self.s_vehicle].job_at(self.a_rank);
        let b_job = routes[self.t_vehicle].job_at(self.b_rank);

        let (s_first, s_last) = exchange_range(self.a_rank, self.s_insert_rank);
        let s_replacement =
            exchange_replacement(&routes[self.s_vehicle], self.a_rank, self.s_insert_rank, b_job);
        routes[self.s_vehicle].replace(problem, s_replacement.into_iter(), s_first, s_last);

        let (t_first, t_last) = exchange_range(self.b_rank, self.t_insert_rank);
        let t_replacement =
            exchange_replacement(&routes[self.t_vehicle], self.b_rank, self.t_insert_rank, a_job);
        routes[self.t_vehicle].replace(problem, t_replacement.into_iter(), t_first, t_last);
    }

    fn update_candidates(&self) -> Vec<usize> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}
