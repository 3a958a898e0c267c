use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionRegime {
    Basic,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStrategy {
    None,
    HigherAmount,
    Nearest,
    Furthest,
    EarliestDeadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortStrategy {
    Availability,
    Cost,
}

/// One construction parameter combination; the solver explores several in
/// parallel and keeps the best outcome.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicParams {
    pub regime: ConstructionRegime,
    pub init: InitStrategy,
    /// Regret coefficient in [0, 1.5].
    pub regret: f64,
    pub sort: SortStrategy,
}

pub struct SolverParams {
    pub heuristics: Vec<HeuristicParams>,
    /// Improvement depth of the local-search outer loop.
    pub depth: usize,
    /// Wall-clock budget for the whole solve.
    pub timeout: Option<Duration>,
}

impl Default for SolverParams {
    fn default() -> Self {
        use ConstructionRegime::{Basic, Dynamic};
        use InitStrategy::{EarliestDeadline, Furthest, HigherAmount, Nearest, None as NoInit};
        use SortStrategy::{Availability, Cost};

        let combo = |regime, init, regret, sort| HeuristicParams {
            regime,
            init,
            regret,
            sort,
        };

        SolverParams {
            heuristics: vec![
                combo(Basic, HigherAmount, 0.3, Availability),
                combo(Basic, Nearest, 0.3, Availability),
                combo(Basic, Furthest, 0.3, Availability),
                combo(Basic, EarliestDeadline, 0.3, Availability),
                combo(Basic, NoInit, 0.5, Cost),
                combo(Dynamic, HigherAmount, 0.3, Availability),
                combo(Dynamic, Nearest, 0.3, Availability),
                combo(Dynamic, NoInit, 1.0, Cost),
            ],
            depth: 4,
            timeout: None,
        }
    }
}

impl SolverParams {
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
