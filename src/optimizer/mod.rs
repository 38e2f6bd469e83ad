pub mod bounds;
pub mod captain;
pub mod constraints;
pub mod dominance;
pub mod feasibility;
pub mod multi_squad;
pub mod ranking;
pub mod solver;
pub mod squad;

pub use captain::select_captain;
pub use constraints::ConstraintModel;
pub use multi_squad::{MultiSquadGenerator, SquadOption, SquadSet, StopReason};
pub use solver::{solve, ExhaustionPolicy, SearchLimits, SquadSolver};
pub use squad::{Lineup, Optimality, Squad};

use crate::data::candidate::Candidate;
use crate::error::SquadError;

/// Default number of alternative squads requested from the generator.
pub const DEFAULT_SQUAD_COUNT: usize = 3;

/// One optimization call: constraints, search budget and how many squads to produce.
#[derive(Debug, Clone)]
pub struct OptimizationRequest {
    pub constraints: ConstraintModel,
    pub limits: SearchLimits,
    /// Only used by [optimize_multiple].
    pub squad_count: usize,
}

impl Default for OptimizationRequest {
    fn default() -> Self {
        Self {
            constraints: ConstraintModel::default(),
            limits: SearchLimits::default(),
            squad_count: DEFAULT_SQUAD_COUNT,
        }
    }
}

impl OptimizationRequest {
    pub fn solver(&self) -> SquadSolver {
        SquadSolver::with_limits(self.limits.clone())
    }
}

/// Single-solve path: pool → solver → captain-annotated squad.
pub fn optimize_squad(
    pool: &[Candidate],
    request: &OptimizationRequest,
) -> Result<Squad, SquadError> {
    request.solver().solve(pool, &request.constraints)
}

/// Multi-solve path: up to `request.squad_count` disjoint squads in generation order.
pub fn optimize_multiple(pool: &[Candidate], request: &OptimizationRequest) -> SquadSet {
    MultiSquadGenerator::new(request.solver()).generate(
        pool,
        &request.constraints,
        request.squad_count,
    )
}
