use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::debug;

use crate::error::ConfigError;
use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::construction::basic::basic_heuristic;
use super::construction::dynamic::dynamic_heuristic;
use super::local_search::local_search::LocalSearch;
use super::solution::solution::{Solution, SolutionIndicators};
use super::solution::solution_state::SolutionState;
use super::solution::tw_route::TwRoute;
use super::solver_params::{ConstructionRegime, HeuristicParams, SolverParams};

/// Solve entry point: owns the problem, fans parameter combinations out
/// across worker threads and reduces to the lexicographically best
/// solution.
pub struct Solver {
    problem: Arc<VehicleRoutingProblem>,
}

impl Solver {
    /// Validates what only a schedule can see (break chains against the
    /// shift), then takes ownership of the problem.
    pub fn new(problem: VehicleRoutingProblem) -> Result<Self, ConfigError> {
        for v in 0..problem.nb_vehicles() {
            TwRoute::new(&problem, v)?;
        }
        Ok(Solver {
            problem: Arc::new(problem),
        })
    }

    pub fn problem(&self) -> &VehicleRoutingProblem {
        &self.problem
    }

    fn solve_one(
        &self,
        combination: &HeuristicParams,
        depth: usize,
        deadline: Option<Instant>,
    ) -> (SolutionIndicators, Vec<TwRoute>, SolutionState) {
        let problem = &*self.problem;
        let mut routes: Vec<TwRoute> = (0..problem.nb_vehicles())
            .map(|v| TwRoute::new(problem, v).expect("breaks validated in Solver::new"))
            .collect();
        let mut state = SolutionState::new(problem);

        let regret_permille = (combination.regret * 1000.0).round() as i64;
        match combination.regime {
            ConstructionRegime::Basic => {
                basic_heuristic(
                    problem,
                    &mut routes,
                    &mut state.unassigned,
                    combination.init,
                    regret_permille,
                    combination.sort,
                );
            }
            ConstructionRegime::Dynamic => {
                dynamic_heuristic(
                    problem,
                    &mut routes,
                    &mut state.unassigned,
                    combination.init,
                    regret_permille,
                );
            }
        }
        state.setup(problem, &routes);

        let mut search = LocalSearch::new(problem, routes, state, depth, deadline);
        search.run();
        let indicators = search.best_indicators();
        let (routes, state) = search.into_parts();
        (indicators, routes, state)
    }

    pub fn solve(&self, params: &SolverParams) -> Solution {
        let deadline = params.timeout.map(|t| Instant::now() + t);

        let fallback = [HeuristicParams {
            regime: ConstructionRegime::Basic,
            init: crate::solver::solver_params::InitStrategy::None,
            regret: 0.3,
            sort: crate::solver::solver_params::SortStrategy::Availability,
        }];
        let combinations: &[HeuristicParams] = if params.heuristics.is_empty() {
            &fallback
        } else {
            &params.heuristics
        };

        let results: Vec<(SolutionIndicators, Vec<TwRoute>, SolutionState)> = combinations
            .par_iter()
            .map(|combination| self.solve_one(combination, params.depth, deadline))
            .collect();

        // Best indicators win; equal scores keep the lowest combination
        // index for reproducibility.
        let mut best: Option<(usize, SolutionIndicators)> = None;
        for (index, (indicators, _, _)) in results.iter().enumerate() {
            if best
                .as_ref()
                .is_none_or(|(_, b)| indicators.is_better_than(b))
            {
                best = Some((index, *indicators));
            }
        }

        let (winner, indicators) = best.expect("at least one parameter combination");
        debug!(
            combination = winner,
            cost = indicators.eval.cost,
            assigned = indicators.assigned,
            "combination selected"
        );

        let (_, routes, state) = &results[winner];
        Solution::build(&self.problem, routes, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_solve_simple_line() {
        let problem = test_utils::line_problem_with_vehicles(4, 1);
        let solver = Solver::new(problem).unwrap();

        let solution = solver.solve(&SolverParams::default());

        assert_eq!(solution.summary.assigned, 4);
        assert_eq!(solution.summary.unassigned, 0);
        assert_eq!(solution.routes.len(), 1);
        // The line tour in order: out 400 and back 400.
        assert_eq!(solution.summary.cost, 800);
    }

    #[test]
    fn test_depth_zero_still_solves() {
        let problem = test_utils::line_problem(1);
        let solver = Solver::new(problem).unwrap();
        let params = SolverParams::default().with_depth(0);

        let solution = solver.solve(&params);
        assert_eq!(solution.summary.assigned, 1);
    }
}
