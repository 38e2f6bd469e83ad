//! Several disjoint squads, each the optimum of the pool left over by earlier rounds.
//!
//! This is greedy diversification on purpose: round `i` solves exactly over what rounds
//! `1..i` left behind and never revisits them, so the set as a whole is not a jointly
//! optimal partition. Exclusion is by candidate id, so distinct candidates sharing a
//! display name are never excluded by accident.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use crate::data::candidate::{Candidate, CandidateId};
use crate::error::ErrorKind;
use crate::optimizer::constraints::ConstraintModel;
use crate::optimizer::solver::SquadSolver;
use crate::optimizer::squad::Squad;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadOption {
    /// 1-based round number.
    pub number: usize,
    pub label: String,
    pub description: String,
    pub squad: Squad,
}

/// Why generation ended before producing the requested count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    PoolExhausted { remaining: usize },
    SolveFailed { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadSet {
    pub squads: Vec<SquadOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_early: Option<StopReason>,
}

impl SquadSet {
    pub fn len(&self) -> usize {
        self.squads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squads.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MultiSquadGenerator {
    solver: SquadSolver,
}

impl MultiSquadGenerator {
    pub fn new(solver: SquadSolver) -> Self {
        Self { solver }
    }

    /// Runs up to `count` rounds. Round failures end generation and are recorded in
    /// [SquadSet::stopped_early] instead of being returned as errors.
    pub fn generate(
        &self,
        pool: &[Candidate],
        constraints: &ConstraintModel,
        count: usize,
    ) -> SquadSet {
        let mut excluded: HashSet<CandidateId> = HashSet::new();
        let mut squads = Vec::with_capacity(count.min(pool.len()));
        let mut stopped_early = None;

        for number in 1..=count {
            let available: Vec<Candidate> = pool
                .iter()
                .filter(|candidate| !excluded.contains(&candidate.id))
                .cloned()
                .collect();
            let remaining = available
                .iter()
                .filter(|candidate| constraints.is_eligible(candidate.category))
                .count();
            if remaining < constraints.squad_size() {
                info!(round = number, remaining, "too few candidates left for another squad");
                stopped_early = Some(StopReason::PoolExhausted { remaining });
                break;
            }

            match self.solver.solve(&available, constraints) {
                Ok(squad) => {
                    info!(
                        round = number,
                        total_score = squad.total_score(),
                        total_price = %squad.total_price(),
                        "squad generated"
                    );
                    excluded.extend(squad.ids());
                    squads.push(SquadOption {
                        number,
                        label: format!("Squad Option {number}"),
                        description: format!(
                            "Optimal squad #{number} maximizing predicted points"
                        ),
                        squad,
                    });
                }
                Err(error) => {
                    info!(round = number, %error, "squad generation stopped");
                    stopped_early = Some(StopReason::SolveFailed {
                        kind: error.kind(),
                        message: error.to_string(),
                    });
                    break;
                }
            }
        }

        SquadSet {
            squads,
            stopped_early,
        }
    }
}
