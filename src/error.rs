use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::data::candidate::{CandidateId, Category};

/// Errors produced by constraint construction and squad solving.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SquadError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid candidate {id}: {reason}")]
    InvalidCandidate { id: CandidateId, reason: String },

    #[error("no feasible squad: {0}")]
    Infeasible(InfeasibleReason),

    #[error("search budget exhausted after {nodes_explored} nodes without a certified optimum")]
    Timeout { nodes_explored: u64 },
}

/// What the solver proved about an infeasible instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InfeasibleReason {
    #[error("category {category} requires {required} candidates but only {available} are available")]
    InsufficientCandidates {
        category: Category,
        required: usize,
        available: usize,
    },

    #[error("cheapest quota-satisfying selection costs {cheapest}, above the budget cap {budget_cap}")]
    BudgetTooLow { cheapest: Decimal, budget_cap: Decimal },

    #[error("group cap {group_cap} allows at most {max_selectable} of the {squad_size} required selections")]
    GroupCapUnsatisfiable {
        group_cap: usize,
        max_selectable: usize,
        squad_size: usize,
    },

    #[error("budget cap {budget_cap} and group cap {group_cap} cannot be met together")]
    JointlyUnsatisfiable { budget_cap: Decimal, group_cap: usize },
}

/// Machine-distinguishable error kind for callers that serialize failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidConfiguration,
    InvalidCandidate,
    Infeasible,
    Timeout,
}

impl SquadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::InvalidCandidate { .. } => ErrorKind::InvalidCandidate,
            Self::Infeasible(_) => ErrorKind::Infeasible,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

/// Errors reading candidate pools or configuration files.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unable to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse json '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to parse yaml '{path}': {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unable to parse csv '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}
