//! Solve one pool under several budget caps in parallel. Each solve stays single-threaded
//! and owns nothing shared but read-only inputs; results keep the input order.

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::data::candidate::Candidate;
use crate::error::SquadError;
use crate::optimizer::constraints::ConstraintModel;
use crate::optimizer::solver::SquadSolver;
use crate::optimizer::squad::Squad;
use crate::parallel::pool::WorkerPool;

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSweepResult {
    pub budget_cap: Decimal,
    pub outcome: Result<Squad, SquadError>,
}

/// Serializable summary row of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSweepRow {
    pub budget_cap: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BudgetSweepResult {
    pub fn row(&self) -> BudgetSweepRow {
        match &self.outcome {
            Ok(squad) => BudgetSweepRow {
                budget_cap: self.budget_cap,
                total_score: Some(squad.total_score()),
                total_price: Some(squad.total_price()),
                error: None,
            },
            Err(err) => BudgetSweepRow {
                budget_cap: self.budget_cap,
                total_score: None,
                total_price: None,
                error: Some(err.to_string()),
            },
        }
    }
}

pub fn sweep_budgets(
    pool: &[Candidate],
    constraints: &ConstraintModel,
    budgets: &[Decimal],
    solver: &SquadSolver,
    workers: &WorkerPool,
) -> Vec<BudgetSweepResult> {
    let solve_one = |budget_cap: &Decimal| BudgetSweepResult {
        budget_cap: *budget_cap,
        outcome: constraints
            .with_budget_cap(*budget_cap)
            .and_then(|constraints| solver.solve(pool, &constraints)),
    };

    workers.install(|| budgets.par_iter().map(solve_one).collect())
}
