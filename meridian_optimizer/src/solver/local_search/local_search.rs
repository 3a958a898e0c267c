use std::time::Instant;

use fxhash::FxHashSet;
use tracing::{debug, trace};

use crate::problem::eval::Eval;
use crate::problem::job::JobType;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use crate::solver::construction::insertion_search::{
    apply_insertion, compute_best_insertion, insertion_lower_bound,
};
use crate::solver::solution::solution::SolutionIndicators;
use crate::solver::solution::solution_state::SolutionState;
use crate::solver::solution::tw_route::TwRoute;

use super::operator::{LocalSearchOperator, Move, MoveContext};
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

/// Priority-move ranking: (priority gain, assigned delta, cost gain).
type PriorityKey = (i64, i64, Eval);

/// Best-move local search with a ruin-and-recreate escape loop. Owns the
/// routes and the state cache for the duration of the search; operators
/// borrow them for one evaluate/apply cycle.
pub struct LocalSearch<'a> {
    problem: &'a VehicleRoutingProblem,
    routes: Vec<TwRoute>,
    state: SolutionState,
    depth: usize,
    deadline: Option<Instant>,

    best_routes: Vec<TwRoute>,
    best_unassigned: FxHashSet<usize>,
    best_indicators: SolutionIndicators,
}

impl<'a> LocalSearch<'a> {
    pub fn new(
        problem: &'a VehicleRoutingProblem,
        routes: Vec<TwRoute>,
        state: SolutionState,
        depth: usize,
        deadline: Option<Instant>,
    ) -> Self {
        let best_indicators = SolutionIndicators::compute(problem, &routes, &state);

        LocalSearch {
            best_routes: routes.clone(),
            best_unassigned: state.unassigned.clone(),
            problem,
            routes,
            state,
            depth,
            deadline,
            best_indicators,
        }
    }

    pub fn into_parts(self) -> (Vec<TwRoute>, SolutionState) {
        (self.routes, self.state)
    }

    pub fn best_indicators(&self) -> SolutionIndicators {
        self.best_indicators
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Outer improvement loop: ls-steps with best-so-far tracking,
    /// unassigned refills with a decaying regret coefficient and a ruin
    /// phase every ten rounds.
    pub fn run(&mut self) {
        let mut round = 0usize;
        let mut completed_depth = 0usize;

        loop {
            if self.deadline_passed() {
                break;
            }

            self.run_ls_step();

            let indicators =
                SolutionIndicators::compute(self.problem, &self.routes, &self.state);
            if indicators.is_better_than(&self.best_indicators) {
                self.best_indicators = indicators;
                self.best_routes = self.routes.clone();
                self.best_unassigned = self.state.unassigned.clone();
                trace!(cost = indicators.eval.cost, "new best solution");
            } else {
                self.restore_best();
            }

            completed_depth += 1;
            if completed_depth > self.depth {
                break;
            }

            if !self.state.unassigned.is_empty() {
                let regret_permille = (1000 / completed_depth as i64).max(100);
                self.try_job_additions(regret_permille);
            }

            round += 1;
            if round % 10 == 0 {
                if self.deadline_passed() {
                    break;
                }
                self.ruin_and_recreate();
            }
        }

        self.restore_best();
        debug!(
            cost = self.best_indicators.eval.cost,
            assigned = self.best_indicators.assigned,
            depth = completed_depth,
            "local search done"
        );
    }

    fn restore_best(&mut self) {
        self.routes = self.best_routes.clone();
        self.state.unassigned = self.best_unassigned.clone();
        self.state.setup(self.problem, &self.routes);
    }

    fn empty_vehicles(&self) -> Vec<usize> {
        (0..self.problem.nb_vehicles())
            .filter(|&v| self.routes[v].is_empty())
            .collect()
    }

    /// One ls-step: repeatedly scan the (s, t) vehicle grid for the best
    /// move, apply it and refresh only the touched pairs, until nothing
    /// improves or the deadline passes.
    fn run_ls_step(&mut self) {
        let nb_vehicles = self.problem.nb_vehicles();

        let mut best_cost_moves: Vec<Vec<Option<Move>>> = (0..nb_vehicles)
            .map(|_| (0..nb_vehicles).map(|_| None).collect())
            .collect();
        let mut best_priority_moves: Vec<Option<Move>> = (0..nb_vehicles).map(|_| None).collect();

        let mut pairs: FxHashSet<(usize, usize)> = FxHashSet::default();
        for s in 0..nb_vehicles {
            for t in 0..nb_vehicles {
                if s == t || self.problem.vehicle_ok_with_vehicle(s, t) {
                    pairs.insert((s, t));
                }
            }
        }

        loop {
            if self.deadline_passed() {
                break;
            }

            for &(s, t) in &pairs {
                if s == t {
                    best_cost_moves[s][t] = self.best_intra_move(s);
                    best_priority_moves[s] = self.best_priority_move(s);
                } else {
                    best_cost_moves[s][t] = self.best_inter_move(s, t);
                }
            }
            pairs.clear();

            // Priority-impact moves come first, then plain cost gain.
            let chosen_move = if let Some((s, _)) = Self::pick_priority_move(&best_priority_moves)
            {
                best_priority_moves[s].take().unwrap()
            } else if let Some((s, t)) = Self::pick_cost_move(&best_cost_moves) {
                best_cost_moves[s][t].take().unwrap()
            } else {
                break;
            };

            trace!(
                operator = chosen_move.operator_name(),
                gain = chosen_move.gain().cost,
                "applying move"
            );

            chosen_move.apply(self.problem, &mut self.routes, &mut self.state);
            let updated = chosen_move.update_candidates();
            for &v in &updated {
                let route = &self.routes[v];
                self.state.update_route(self.problem, v, route);
            }

            #[cfg(debug_assertions)]
            self.state.assert_consistent(self.problem, &self.routes);

            for &v in &updated {
                best_priority_moves[v] = None;
                for other in 0..nb_vehicles {
                    best_cost_moves[v][other] = None;
                    best_cost_moves[other][v] = None;
                    if v == other || self.problem.vehicle_ok_with_vehicle(v, other) {
                        pairs.insert((v, other));
                        pairs.insert((other, v));
                    }
                }
            }

            // A move that touched the unassigned set invalidates every
            // retained candidate built against it, or a later application
            // could re-insert a job that is no longer unassigned.
            if matches!(
                chosen_move,
                Move::PriorityReplace(_) | Move::UnassignedExchange(_)
            ) {
                for v in 0..nb_vehicles {
                    best_priority_moves[v] = None;
                    best_cost_moves[v][v] = None;
                    pairs.insert((v, v));
                }
            }
        }
    }

    fn pick_priority_move(moves: &[Option<Move>]) -> Option<(usize, usize)> {
        let mut best: Option<(PriorityKey, usize)> = None;
        for (s, candidate) in moves.iter().enumerate() {
            let Some(m) = candidate else { continue };
            let key = (m.priority_gain(), m.assigned_delta(), m.gain());
            if key.0 <= 0 {
                continue;
            }
            if best.as_ref().is_none_or(|(b, _)| key > *b) {
                best = Some((key, s));
            }
        }
        best.map(|(_, s)| (s, s))
    }

    fn pick_cost_move(moves: &[Vec<Option<Move>>]) -> Option<(usize, usize)> {
        let mut best: Option<(Eval, (usize, usize))> = None;
        for (s, row) in moves.iter().enumerate() {
            for (t, candidate) in row.iter().enumerate() {
                let Some(m) = candidate else { continue };
                let gain = m.gain();
                if !gain.is_positive() {
                    continue;
                }
                if best.as_ref().is_none_or(|(b, _)| gain > *b) {
                    best = Some((gain, (s, t)));
                }
            }
        }
        best.map(|(_, pair)| pair)
    }

    /// Keeps `candidate` when it beats `best`, validating lazily: the
    /// validity check only runs for candidates that would win.
    fn retain_better(
        ctx: &MoveContext,
        best: &mut Option<Move>,
        candidate: Option<impl Into<Move>>,
    ) {
        let Some(candidate) = candidate else { return };
        let candidate: Move = candidate.into();
        let current = best.as_ref().map_or(Eval::ZERO, |m| m.gain());
        if candidate.upper_bound_on_gain() <= current {
            return;
        }
        if candidate.gain() > current && candidate.is_valid(ctx) {
            *best = Some(candidate);
        }
    }

    fn best_intra_move(&self, v: usize) -> Option<Move> {
        let ctx = MoveContext {
            problem: self.problem,
            state: &self.state,
            routes: &self.routes,
        };
        let n = self.routes[v].len();
        let mut best: Option<Move> = None;

        for s_rank in 0..n {
            for t_rank in 0..n {
                if s_rank != t_rank {
                    Self::retain_better(
                        &ctx,
                        &mut best,
                        IntraRelocate::evaluate(&ctx, v, s_rank, t_rank),
                    );
                }
            }
        }
        if n >= 2 {
            for s_rank in 0..n - 1 {
                for t_rank in 0..n - 1 {
                    Self::retain_better(
                        &ctx,
                        &mut best,
                        IntraOrOpt::evaluate(&ctx, v, s_rank, t_rank),
                    );
                }
                for t_rank in s_rank + 2..n {
                    Self::retain_better(
                        &ctx,
                        &mut best,
                        IntraExchange::evaluate(&ctx, v, s_rank, t_rank),
                    );
                }
            }
            for s_rank in 0..n {
                for t_rank in 0..n - 1 {
                    Self::retain_better(
                        &ctx,
                        &mut best,
                        IntraMixedExchange::evaluate(&ctx, v, s_rank, t_rank),
                    );
                }
            }
            for s_rank in 0..n - 1 {
                for t_rank in s_rank + 3..n - 1 {
                    Self::retain_better(
                        &ctx,
                        &mut best,
                        IntraCrossExchange::evaluate(&ctx, v, s_rank, t_rank),
                    );
                }
                for t_rank in s_rank + 1..n {
                    Self::retain_better(
                        &ctx,
                        &mut best,
                        IntraTwoOpt::evaluate(&ctx, v, s_rank, t_rank),
                    );
                }
            }
        }

        Self::retain_better(&ctx, &mut best, TspFix::evaluate(&ctx, v, self.deadline));

        let empty = self.empty_vehicles();
        Self::retain_better(&ctx, &mut best, RouteSplit::evaluate(&ctx, v, &empty));

        // Cost-neutral-or-better swaps with the unassigned set.
        for &job in &self.state.unassigned {
            if self.problem.job(job).job_type() != JobType::Single {
                continue;
            }
            for s_rank in 0..n {
                for t_rank in 0..n {
                    Self::retain_better(
                        &ctx,
                        &mut best,
                        UnassignedExchange::evaluate(&ctx, v, s_rank, t_rank, job),
                    );
                }
            }
        }

        best
    }

    /// Best candidate improving the priority tuple rather than cost.
    fn best_priority_move(&self, v: usize) -> Option<Move> {
        let ctx = MoveContext {
            problem: self.problem,
            state: &self.state,
            routes: &self.routes,
        };
        let n = self.routes[v].len();
        let mut best: Option<Move> = None;
        let mut best_key: PriorityKey = (0, i64::MIN, Eval::NO_EVAL);

        for &job in &self.state.unassigned {
            if self.problem.job(job).job_type() != JobType::Single {
                continue;
            }
            for s_rank in 0..=n {
                if let Some(candidate) = PriorityReplace::evaluate(&ctx, v, s_rank, job) {
                    let key = (
                        candidate.priority_gain(),
                        candidate.assigned_delta(),
                        candidate.gain(),
                    );
                    if key > best_key && candidate.is_valid(&ctx) {
                        best_key = key;
                        best = Some(Move::PriorityReplace(candidate));
                    }
                }
            }
            // Priority-improving swaps against assigned jobs.
            for s_rank in 0..n {
                for t_rank in 0..n {
                    if let Some(candidate) =
                        UnassignedExchange::evaluate(&ctx, v, s_rank, t_rank, job)
                    {
                        let key = (
                            candidate.priority_gain(),
                            candidate.assigned_delta(),
                            candidate.gain(),
                        );
                        if key.0 > 0 && key > best_key && candidate.is_valid(&ctx) {
                            best_key = key;
                            best = Some(Move::UnassignedExchange(candidate));
                        }
                    }
                }
            }
        }

        best
    }

    fn best_inter_move(&self, s: usize, t: usize) -> Option<Move> {
        let ctx = MoveContext {
            problem: self.problem,
            state: &self.state,
            routes: &self.routes,
        };
        let s_len = self.routes[s].len();
        let t_len = self.routes[t].len();
        let mut best: Option<Move> = None;

        for s_rank in 0..s_len {
            for t_rank in 0..=t_len {
                Self::retain_better(&ctx, &mut best, Relocate::evaluate(&ctx, s, s_rank, t, t_rank));
            }
            Self::retain_better(&ctx, &mut best, PdShift::evaluate(&ctx, s, s_rank, t));
        }
        if s_len >= 2 {
            for s_rank in 0..s_len - 1 {
                for t_rank in 0..=t_len {
                    Self::retain_better(
                        &ctx,
                        &mut best,
                        OrOpt::evaluate(&ctx, s, s_rank, t, t_rank),
                    );
                }
            }
        }
        if t_len >= 2 {
            for s_rank in 0..s_len {
                for t_rank in 0..t_len - 1 {
                    Self::retain_better(
                        &ctx,
                        &mut best,
                        MixedExchange::evaluate(&ctx, s, s_rank, t, t_rank),
                    );
                }
            }
        }
        for s_rank in 0..s_len {
            for t_rank in 0..t_len {
                Self::retain_better(
                    &ctx,
                    &mut best,
                    ReverseTwoOpt::evaluate(&ctx, s, s_rank, t, t_rank),
                );
            }
        }

        // Symmetric families only need the ordered half of the grid.
        if s < t {
            if s_len >= 2 && t_len >= 2 {
                for s_rank in 0..s_len - 1 {
                    for t_rank in 0..t_len - 1 {
                        Self::retain_better(
                            &ctx,
                            &mut best,
                            CrossExchange::evaluate(&ctx, s, s_rank, t, t_rank),
                        );
                    }
                }
            }
            for s_rank in 0..s_len {
                for t_rank in 0..t_len {
                    Self::retain_better(
                        &ctx,
                        &mut best,
                        TwoOpt::evaluate(&ctx, s, s_rank, t, t_rank),
                    );
                }
            }
            Self::retain_better(&ctx, &mut best, RouteExchange::evaluate(&ctx, s, t));
            Self::retain_better(&ctx, &mut best, SwapStar::evaluate(&ctx, s, t));
        }

        best
    }

    /// Regret-guided refill of the unassigned set; the coefficient is in
    /// permille so all scoring stays in integers.
    pub fn try_job_additions(&mut self, regret_permille: i64) {
        loop {
            let mut best_score = i64::MIN;
            let mut best_choice: Option<(usize, usize)> = None;

            let mut unassigned: Vec<usize> = self.state.unassigned.iter().copied().collect();
            unassigned.sort_unstable();

            for &job in &unassigned {
                if self.problem.job(job).job_type() == JobType::Delivery {
                    continue;
                }

                let mut best_eval = Eval::NO_EVAL;
                let mut second_eval = Eval::NO_EVAL;
                let mut best_vehicle = 0;

                for v in 0..self.problem.nb_vehicles() {
                    let mut insertion =
                        compute_best_insertion(self.problem, &self.routes[v], job, Eval::NO_EVAL);
                    if !insertion.is_feasible() {
                        continue;
                    }
                    if self.routes[v].is_empty() {
                        insertion.eval +=
                            Eval::cost_only(self.problem.vehicle(v).fixed_cost());
                    }
                    if insertion.eval < best_eval {
                        second_eval = best_eval;
                        best_eval = insertion.eval;
                        best_vehicle = v;
                    } else if insertion.eval < second_eval {
                        second_eval = insertion.eval;
                    }
                }

                if best_eval.is_no_eval() {
                    continue;
                }
                let alternative = if second_eval.is_no_eval() {
                    best_eval
                } else {
                    second_eval
                };
                let score = regret_permille * alternative.cost / 1000 - best_eval.cost;
                if score > best_score {
                    best_score = score;
                    best_choice = Some((job, best_vehicle));
                }
            }

            let Some((job, vehicle)) = best_choice else {
                break;
            };

            // Recompute the winning insertion and apply it.
            let insertion =
                compute_best_insertion(self.problem, &self.routes[vehicle], job, Eval::NO_EVAL);
            if !insertion.is_feasible() {
                break;
            }
            apply_insertion(self.problem, &mut self.routes[vehicle], job, &insertion);
            self.state.unassigned.remove(&job);
            if self.problem.job(job).job_type() == JobType::Pickup {
                self.state
                    .unassigned
                    .remove(&self.problem.matching_delivery(job));
            }
            let route = &self.routes[vehicle];
            self.state.update_route(self.problem, vehicle, route);

            trace!(job, vehicle, "job added back");
        }
    }

    /// Ruin phase: drop the jobs whose removal gain most exceeds the
    /// lower bound of relocating them elsewhere, then refill with a high
    /// regret coefficient.
    fn ruin_and_recreate(&mut self) {
        let nb_jobs = self.problem.nb_jobs();
        let to_remove = 3.min((nb_jobs as f64).sqrt().ceil() as usize);
        debug!(to_remove, "ruin phase");

        for _ in 0..to_remove {
            let mut best_score: Option<Eval> = None;
            let mut best_choice: Option<(usize, usize)> = None;

            for v in 0..self.problem.nb_vehicles() {
                for rank in 0..self.routes[v].len() {
                    let job = self.routes[v].job_at(rank);
                    let removal_gain = match self.problem.job(job).job_type() {
                        JobType::Single => self.state.node_gains[v][rank],
                        JobType::Pickup => self.state.pd_gains[v][rank],
                        JobType::Delivery => continue,
                    };
                    if removal_gain.is_no_eval() {
                        continue;
                    }

                    let relocation_bound = self
                        .problem
                        .compatible_vehicles_for_job(job)
                        .iter()
                        .filter(|&&other| other != v)
                        .map(|&other| {
                            insertion_lower_bound(self.problem, &self.routes[other], job)
                        })
                        .min()
                        .unwrap_or(Eval::ZERO);

                    let score = removal_gain - relocation_bound;
                    if best_score.is_none_or(|b| score > b) {
                        best_score = Some(score);
                        best_choice = Some((v, rank));
                    }
                }
            }

            let Some((v, rank)) = best_choice else { break };
            let job = self.routes[v].job_at(rank);
            match self.problem.job(job).job_type() {
                JobType::Single => {
                    self.routes[v].remove(self.problem, rank, 1);
                    self.state.unassigned.insert(job);
                }
                JobType::Pickup => {
                    let delivery_rank = self.state.matching_delivery_rank[v][rank]
                        .expect("pickup without delivery in route");
                    self.routes[v].remove(self.problem, delivery_rank, 1);
                    self.routes[v].remove(self.problem, rank, 1);
                    self.state.unassigned.insert(job);
                    self.state.unassigned.insert(self.problem.matching_delivery(job));
                }
                JobType::Delivery => unreachable!(),
            }
            let route = &self.routes[v];
            self.state.update_route(self.problem, v, route);
        }

        self.try_job_additions(1500);
    }
}
