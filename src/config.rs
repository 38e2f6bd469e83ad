//! File-backed optimizer configuration (YAML; JSON is accepted as a YAML subset).
//! Every field has a default, so an empty file yields the standard 15-candidate convention.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::data::candidate::Category;
use crate::error::{LoadError, SquadError};
use crate::logging::LoggingConfig;
use crate::optimizer::constraints::{
    ConstraintModel, DEFAULT_GROUP_CAP, DEFAULT_QUOTAS, DEFAULT_SQUAD_SIZE,
};
use crate::optimizer::solver::{ExhaustionPolicy, SearchLimits, DEFAULT_MAX_NODES};
use crate::optimizer::{OptimizationRequest, DEFAULT_SQUAD_COUNT};

/// Environment variable consulted when no `--config` path is given.
pub const CONFIG_ENV_VAR: &str = "QUARTERMASTER_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub squad_size: usize,
    pub category_quota: BTreeMap<Category, usize>,
    pub budget_cap: Decimal,
    pub group_cap: usize,
    pub squad_count: usize,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// `null` disables the node budget.
    pub max_nodes: Option<u64>,
    pub time_limit_ms: Option<u64>,
    pub on_exhaustion: ExhaustionPolicy,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            squad_size: DEFAULT_SQUAD_SIZE,
            category_quota: DEFAULT_QUOTAS.into_iter().collect(),
            budget_cap: Decimal::ONE_HUNDRED,
            group_cap: DEFAULT_GROUP_CAP,
            squad_count: DEFAULT_SQUAD_COUNT,
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_nodes: Some(DEFAULT_MAX_NODES),
            time_limit_ms: None,
            on_exhaustion: ExhaustionPolicy::Fail,
        }
    }
}

impl OptimizerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: display.clone(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| LoadError::Yaml {
            path: display,
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Explicit path first, then [CONFIG_ENV_VAR], then defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, LoadError> {
        match explicit {
            Some(path) => Self::load(path),
            None => match std::env::var(CONFIG_ENV_VAR) {
                Ok(path) if !path.trim().is_empty() => Self::load(path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn constraints(&self) -> Result<ConstraintModel, SquadError> {
        ConstraintModel::new(
            self.squad_size,
            self.category_quota.clone(),
            self.budget_cap,
            self.group_cap,
        )
    }

    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            max_nodes: self.search.max_nodes,
            time_limit: self.search.time_limit_ms.map(Duration::from_millis),
            on_exhaustion: self.search.on_exhaustion,
        }
    }

    pub fn request(&self) -> Result<OptimizationRequest, SquadError> {
        Ok(OptimizationRequest {
            constraints: self.constraints()?,
            limits: self.search_limits(),
            squad_count: self.squad_count,
        })
    }
}
