//! Exact squad solver: per-category combination search with branch-and-bound.
//!
//! Categories are filled one after another; inside a category, candidates are tried in
//! (score desc, id asc) order and each branch picks the next member at a later position.
//! Nodes are pruned on group cap, on exact budget (cheapest completion over the remaining
//! slots) and on a Lagrangian score bound. Among squads with equal total score the one with
//! the lexicographically smallest sorted id list wins. Totals within [tie_slack] of each other
//! count as equal, so rounding in the float sums never decides a tie.
//!
//! Candidates priced above the budget cap never enter the search. Together with the cap bound
//! in [ConstraintModel::new], that keeps every price sum the search forms representable.

use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::candidate::{Candidate, CandidateId, Category};
use crate::error::{InfeasibleReason, SquadError};
use crate::optimizer::bounds::{price_multipliers, SlotItem, SuffixTables};
use crate::optimizer::constraints::ConstraintModel;
use crate::optimizer::dominance::retain_undominated;
use crate::optimizer::feasibility;
use crate::optimizer::squad::{Optimality, Squad};

pub const DEFAULT_MAX_NODES: u64 = 20_000_000;
/// How often (in nodes) the wall clock is consulted when a time limit is set.
const TIME_CHECK_INTERVAL: u64 = 1024;
/// Relative tolerance under which two squad totals are treated as equal.
const TIE_EPSILON: f64 = 1e-9;

/// Largest gap between two totals near `total` that still counts as a tie.
pub(crate) fn tie_slack(total: f64) -> f64 {
    TIE_EPSILON * (1.0 + total.abs())
}

/// What to do when the search budget runs out before optimality is proven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Fail with [SquadError::Timeout].
    #[default]
    Fail,
    /// Return the best squad found so far tagged [Optimality::Uncertified]
    /// (still `Timeout` if none was found).
    BestEffort,
}

/// Bounded search budget. A node is one tentative inclusion of a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLimits {
    pub max_nodes: Option<u64>,
    pub time_limit: Option<Duration>,
    pub on_exhaustion: ExhaustionPolicy,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_nodes: Some(DEFAULT_MAX_NODES),
            time_limit: None,
            on_exhaustion: ExhaustionPolicy::Fail,
        }
    }
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        Self {
            max_nodes: None,
            time_limit: None,
            on_exhaustion: ExhaustionPolicy::Fail,
        }
    }
}

/// Stateless solver; the limits are the only configuration and are read-only.
#[derive(Debug, Clone, Default)]
pub struct SquadSolver {
    limits: SearchLimits,
}

impl SquadSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: SearchLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    /// Finds the value-maximizing squad satisfying every constraint in `constraints`.
    pub fn solve(
        &self,
        pool: &[Candidate],
        constraints: &ConstraintModel,
    ) -> Result<Squad, SquadError> {
        validate_pool(pool)?;

        let eligible: Vec<&Candidate> = pool
            .iter()
            .filter(|candidate| constraints.is_eligible(candidate.category))
            .collect();
        feasibility::diagnose(&eligible, constraints).map_err(SquadError::Infeasible)?;

        let affordable: Vec<&Candidate> = eligible
            .iter()
            .copied()
            .filter(|candidate| candidate.price <= constraints.budget_cap())
            .collect();
        let problem = SearchProblem::build(&affordable, constraints);
        let mut search = Search::new(&problem, &self.limits);
        search.run();

        debug!(
            eligible = eligible.len(),
            affordable = affordable.len(),
            dominated = problem.dominated,
            retained = problem.retained(),
            nodes = search.nodes,
            exhausted = search.exhausted,
            "squad search finished"
        );

        let optimality = match (search.exhausted, self.limits.on_exhaustion) {
            (false, _) => Optimality::Certified,
            (true, ExhaustionPolicy::BestEffort) if search.best.is_some() => {
                warn!(
                    nodes = search.nodes,
                    "search budget exhausted, returning uncertified squad"
                );
                Optimality::Uncertified
            }
            (true, _) => {
                warn!(nodes = search.nodes, "search budget exhausted");
                return Err(SquadError::Timeout {
                    nodes_explored: search.nodes,
                });
            }
        };

        let Some(best) = search.best else {
            return Err(SquadError::Infeasible(
                InfeasibleReason::JointlyUnsatisfiable {
                    budget_cap: constraints.budget_cap(),
                    group_cap: constraints.group_cap(),
                },
            ));
        };

        let members = best
            .picks
            .iter()
            .map(|&index| affordable[index].clone())
            .collect();
        Squad::from_members(members, optimality).ok_or_else(|| {
            SquadError::InvalidConfiguration("solved squad has no representable total".to_string())
        })
    }
}

/// Solve with the default search limits.
pub fn solve(pool: &[Candidate], constraints: &ConstraintModel) -> Result<Squad, SquadError> {
    SquadSolver::default().solve(pool, constraints)
}

fn validate_pool(pool: &[Candidate]) -> Result<(), SquadError> {
    let mut seen = HashSet::with_capacity(pool.len());
    for candidate in pool {
        if !seen.insert(candidate.id) {
            return Err(SquadError::InvalidCandidate {
                id: candidate.id,
                reason: "duplicate candidate id".to_string(),
            });
        }
        if candidate.price.is_sign_negative() && !candidate.price.is_zero() {
            return Err(SquadError::InvalidCandidate {
                id: candidate.id,
                reason: format!("negative price {}", candidate.price),
            });
        }
        if !candidate.predicted_score.is_finite() {
            return Err(SquadError::InvalidCandidate {
                id: candidate.id,
                reason: "predicted score is not finite".to_string(),
            });
        }
    }
    Ok(())
}

struct CategorySlots {
    quota: usize,
    items: Vec<SlotItem>,
    tables: SuffixTables,
}

struct SearchProblem {
    slots: Vec<CategorySlots>,
    /// Cheapest price of the quotas of categories after index `i`.
    rest_min_price: Vec<Decimal>,
    /// `rest_relaxed[m][i]`: relaxed bound for categories after index `i` under multiplier `m`.
    rest_relaxed: Vec<Vec<f64>>,
    multipliers: Vec<f64>,
    budget_cap: Decimal,
    group_cap: usize,
    groups: usize,
    dominated: usize,
}

impl SearchProblem {
    fn build(eligible: &[&Candidate], constraints: &ConstraintModel) -> Self {
        let tie_tolerance = tie_slack(score_scale(eligible, constraints.squad_size()));
        let mut group_ids: BTreeMap<&str, usize> = BTreeMap::new();
        for candidate in eligible {
            let next = group_ids.len();
            group_ids.entry(candidate.group.as_str()).or_insert(next);
        }

        let mut per_category: Vec<(usize, Vec<SlotItem>)> = Vec::new();
        let mut dominated = 0;
        for category in constraints.active_categories() {
            let quota = constraints.quota(category);
            let items = category_items(eligible, category, &group_ids);
            let (items, dropped) = retain_undominated(
                items,
                quota,
                constraints.squad_size(),
                constraints.group_cap(),
                tie_tolerance,
            );
            dominated += dropped;
            per_category.push((quota, items));
        }

        let multipliers =
            price_multipliers(per_category.iter().flat_map(|(_, items)| items.iter()));

        let slots: Vec<CategorySlots> = per_category
            .into_iter()
            .map(|(quota, items)| {
                let tables = SuffixTables::build(&items, quota, &multipliers);
                CategorySlots {
                    quota,
                    items,
                    tables,
                }
            })
            .collect();

        let mut rest_min_price = vec![Decimal::ZERO; slots.len()];
        let mut rest_relaxed = vec![vec![0.0; slots.len()]; multipliers.len()];
        for index in (0..slots.len().saturating_sub(1)).rev() {
            let next = &slots[index + 1];
            rest_min_price[index] = rest_min_price[index + 1]
                + next.tables.min_price(0, next.quota).unwrap_or(Decimal::ZERO);
            for (multiplier, rest) in rest_relaxed.iter_mut().enumerate() {
                rest[index] = rest[index + 1] + next.tables.relaxed(multiplier, 0, next.quota);
            }
        }

        Self {
            slots,
            rest_min_price,
            rest_relaxed,
            multipliers,
            budget_cap: constraints.budget_cap(),
            group_cap: constraints.group_cap(),
            groups: group_ids.len(),
            dominated,
        }
    }

    fn retained(&self) -> usize {
        self.slots.iter().map(|slot| slot.items.len()).sum()
    }
}

/// Upper bound on the absolute value of any squad total.
fn score_scale(eligible: &[&Candidate], squad_size: usize) -> f64 {
    let mut magnitudes: Vec<f64> = eligible
        .iter()
        .map(|candidate| candidate.predicted_score.abs())
        .collect();
    magnitudes.sort_by(|left, right| right.total_cmp(left));
    magnitudes.iter().take(squad_size).sum()
}

fn category_items(
    eligible: &[&Candidate],
    category: Category,
    group_ids: &BTreeMap<&str, usize>,
) -> Vec<SlotItem> {
    let mut items: Vec<SlotItem> = eligible
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.category == category)
        .map(|(pool_index, candidate)| SlotItem {
            pool_index,
            id: candidate.id,
            group: group_ids
                .get(candidate.group.as_str())
                .copied()
                .unwrap_or_default(),
            price: candidate.price,
            price_f64: candidate.price.to_f64().unwrap_or(f64::MAX),
            score: candidate.predicted_score,
        })
        .collect();
    items.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then_with(|| left.id.cmp(&right.id))
    });
    items
}

struct Incumbent {
    total: f64,
    ids: Vec<CandidateId>,
    picks: Vec<usize>,
}

struct Search<'p> {
    problem: &'p SearchProblem,
    limits: &'p SearchLimits,
    started: Instant,
    nodes: u64,
    exhausted: bool,
    chosen: Vec<&'p SlotItem>,
    group_counts: Vec<usize>,
    spent: Decimal,
    score: f64,
    best: Option<Incumbent>,
}

impl<'p> Search<'p> {
    fn new(problem: &'p SearchProblem, limits: &'p SearchLimits) -> Self {
        Self {
            problem,
            limits,
            started: Instant::now(),
            nodes: 0,
            exhausted: false,
            chosen: Vec::new(),
            group_counts: vec![0; problem.groups],
            spent: Decimal::ZERO,
            score: 0.0,
            best: None,
        }
    }

    fn run(&mut self) {
        if let Some(first) = self.problem.slots.first() {
            self.descend(0, 0, first.quota);
        }
    }

    fn descend(&mut self, category: usize, start: usize, need: usize) {
        let problem = self.problem;
        if need == 0 {
            match problem.slots.get(category + 1) {
                Some(next) => self.descend(category + 1, 0, next.quota),
                None => self.record(),
            }
            return;
        }

        let slot = &problem.slots[category];
        let Some(last) = slot.items.len().checked_sub(need) else {
            return;
        };

        for position in start..=last {
            let item = &slot.items[position];
            let threshold = self.prune_threshold();

            // Items are score-ordered, so this bound only shrinks as `position` grows.
            let optimistic = self.score
                + item.score
                + slot.tables.relaxed(0, position + 1, need - 1)
                + problem.rest_relaxed[0][category];
            if optimistic < threshold {
                break;
            }

            if self.group_counts[item.group] >= problem.group_cap {
                continue;
            }

            let spent = self.spent + item.price;
            let Some(completion) = slot.tables.min_price(position + 1, need - 1) else {
                break;
            };
            if spent + completion + problem.rest_min_price[category] > problem.budget_cap {
                continue;
            }

            if threshold > f64::NEG_INFINITY
                && self.score + item.score + self.remaining_bound(category, position, need, spent)
                    < threshold
            {
                continue;
            }

            if !self.admit_node() {
                return;
            }

            let previous_spent = self.spent;
            let previous_score = self.score;
            self.group_counts[item.group] += 1;
            self.spent = spent;
            self.score += item.score;
            self.chosen.push(item);

            self.descend(category, position + 1, need - 1);

            self.chosen.pop();
            self.score = previous_score;
            self.spent = previous_spent;
            self.group_counts[item.group] -= 1;

            if self.exhausted {
                return;
            }
        }
    }

    /// Upper bound on the score still obtainable after taking `slots[category].items[position]`.
    fn remaining_bound(&self, category: usize, position: usize, need: usize, spent: Decimal) -> f64 {
        let problem = self.problem;
        let tables = &problem.slots[category].tables;
        let remaining = (problem.budget_cap - spent)
            .to_f64()
            .unwrap_or(f64::INFINITY);

        problem
            .multipliers
            .iter()
            .enumerate()
            .map(|(multiplier, lambda)| {
                lambda * remaining
                    + tables.relaxed(multiplier, position + 1, need - 1)
                    + problem.rest_relaxed[multiplier][category]
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// Bounds below this cannot beat or tie the incumbent.
    fn prune_threshold(&self) -> f64 {
        match &self.best {
            Some(best) => best.total - tie_slack(best.total),
            None => f64::NEG_INFINITY,
        }
    }

    fn admit_node(&mut self) -> bool {
        if let Some(max_nodes) = self.limits.max_nodes {
            if self.nodes >= max_nodes {
                self.exhausted = true;
                return false;
            }
        }
        if let Some(limit) = self.limits.time_limit {
            if self.nodes % TIME_CHECK_INTERVAL == 0 && self.started.elapsed() >= limit {
                self.exhausted = true;
                return false;
            }
        }
        self.nodes += 1;
        true
    }

    fn record(&mut self) {
        let mut picked: Vec<&SlotItem> = self.chosen.clone();
        picked.sort_by_key(|item| item.id);
        let total: f64 = picked.iter().map(|item| item.score).sum();
        let ids: Vec<CandidateId> = picked.iter().map(|item| item.id).collect();

        let improves = match &self.best {
            None => true,
            Some(best) if (total - best.total).abs() <= tie_slack(best.total) => ids < best.ids,
            Some(best) => total > best.total,
        };
        if improves {
            self.best = Some(Incumbent {
                total,
                ids,
                picks: picked.iter().map(|item| item.pool_index).collect(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn candidate(id: u32, category: Category, price: i64, score: f64) -> Candidate {
        Candidate::new(id, format!("c{id}"), format!("g{id}"), category, Decimal::new(price, 0), score)
    }

    fn two_slot_model(budget: i64) -> ConstraintModel {
        ConstraintModel::new(
            2,
            [(Category::Goalkeeper, 1), (Category::Defender, 1)]
                .into_iter()
                .collect(),
            Decimal::new(budget, 0),
            3,
        )
        .expect("valid")
    }

    /// Greedy first path finds {1, 4} (11); the optimum {2, 3} (13) needs a third node.
    fn greedy_trap_pool() -> Vec<Candidate> {
        vec![
            candidate(1, Category::Goalkeeper, 10, 10.0),
            candidate(2, Category::Goalkeeper, 1, 1.0),
            candidate(3, Category::Defender, 10, 12.0),
            candidate(4, Category::Defender, 1, 1.0),
        ]
    }

    fn ids(squad: &Squad) -> Vec<u32> {
        let mut ids: Vec<u32> = squad.ids().map(|id| id.0).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn unbounded_search_certifies_optimum() {
        let squad = solve(&greedy_trap_pool(), &two_slot_model(12)).expect("feasible");
        assert_eq!(ids(&squad), vec![2, 3]);
        assert_eq!(squad.total_score(), 13.0);
        assert!(squad.is_certified());
    }

    #[test]
    fn exhausted_search_fails_by_default() {
        let solver = SquadSolver::with_limits(SearchLimits {
            max_nodes: Some(2),
            ..SearchLimits::default()
        });
        let err = solver
            .solve(&greedy_trap_pool(), &two_slot_model(12))
            .unwrap_err();
        assert_eq!(err, SquadError::Timeout { nodes_explored: 2 });
    }

    #[test]
    fn exhausted_search_returns_uncertified_incumbent_on_best_effort() {
        let solver = SquadSolver::with_limits(SearchLimits {
            max_nodes: Some(2),
            time_limit: None,
            on_exhaustion: ExhaustionPolicy::BestEffort,
        });
        let squad = solver
            .solve(&greedy_trap_pool(), &two_slot_model(12))
            .expect("incumbent should be returned");
        assert_eq!(ids(&squad), vec![1, 4]);
        assert_eq!(squad.optimality(), Optimality::Uncertified);
    }

    #[test]
    fn best_effort_without_incumbent_is_timeout() {
        let solver = SquadSolver::with_limits(SearchLimits {
            max_nodes: Some(0),
            time_limit: None,
            on_exhaustion: ExhaustionPolicy::BestEffort,
        });
        let err = solver
            .solve(&greedy_trap_pool(), &two_slot_model(12))
            .unwrap_err();
        assert_eq!(err, SquadError::Timeout { nodes_explored: 0 });
    }

    #[test]
    fn zero_time_limit_exhausts_immediately() {
        let solver = SquadSolver::with_limits(SearchLimits {
            max_nodes: None,
            time_limit: Some(Duration::ZERO),
            on_exhaustion: ExhaustionPolicy::Fail,
        });
        assert!(matches!(
            solver.solve(&greedy_trap_pool(), &two_slot_model(12)),
            Err(SquadError::Timeout { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_ids_and_bad_values() {
        let mut pool = greedy_trap_pool();
        pool.push(candidate(1, Category::Defender, 2, 2.0));
        assert!(matches!(
            solve(&pool, &two_slot_model(12)),
            Err(SquadError::InvalidCandidate { id: CandidateId(1), .. })
        ));

        let mut pool = greedy_trap_pool();
        pool[0].price = Decimal::NEGATIVE_ONE;
        assert!(matches!(
            solve(&pool, &two_slot_model(12)),
            Err(SquadError::InvalidCandidate { .. })
        ));

        let mut pool = greedy_trap_pool();
        pool[1].predicted_score = f64::NAN;
        assert!(matches!(
            solve(&pool, &two_slot_model(12)),
            Err(SquadError::InvalidCandidate { .. })
        ));
    }

    #[test]
    fn joint_budget_and_group_conflict_is_reported() {
        // Cheap pair shares a group; group cap 1 forces an expensive pick.
        let pool = vec![
            Candidate::new(1, "a", "X", Category::Goalkeeper, Decimal::new(1, 0), 1.0),
            Candidate::new(2, "b", "X", Category::Defender, Decimal::new(1, 0), 1.0),
            Candidate::new(3, "c", "Y", Category::Defender, Decimal::new(9, 0), 1.0),
        ];
        let constraints = ConstraintModel::new(
            2,
            [(Category::Goalkeeper, 1), (Category::Defender, 1)]
                .into_iter()
                .collect(),
            Decimal::new(5, 0),
            1,
        )
        .expect("valid");
        assert_eq!(
            solve(&pool, &constraints),
            Err(SquadError::Infeasible(
                InfeasibleReason::JointlyUnsatisfiable {
                    budget_cap: Decimal::new(5, 0),
                    group_cap: 1,
                }
            ))
        );
    }

    #[test]
    fn ineligible_categories_are_ignored() {
        let mut pool = greedy_trap_pool();
        pool.push(candidate(9, Category::Forward, 0, 100.0));
        let squad = solve(&pool, &two_slot_model(12)).expect("feasible");
        assert!(!squad.contains(CandidateId(9)));
    }

    #[test]
    fn totals_equal_up_to_rounding_tie_break_on_ids() {
        // {3, 4} sums to 0.30000000000000004 in f64, {1, 2} to exactly 0.3.
        let pool = vec![
            Candidate::new(3, "c", "Z", Category::Goalkeeper, Decimal::ONE, 0.1),
            Candidate::new(1, "a", "X", Category::Goalkeeper, Decimal::ONE, 0.3),
            Candidate::new(4, "d", "X", Category::Defender, Decimal::ONE, 0.2),
            Candidate::new(2, "b", "Y", Category::Defender, Decimal::ONE, 0.0),
        ];
        let constraints = ConstraintModel::new(
            2,
            [(Category::Goalkeeper, 1), (Category::Defender, 1)]
                .into_iter()
                .collect(),
            Decimal::new(10, 0),
            1,
        )
        .expect("valid");
        let squad = solve(&pool, &constraints).expect("feasible");
        assert_eq!(ids(&squad), vec![1, 2]);
    }

    #[test]
    fn tie_slack_scales_with_magnitude() {
        assert!(tie_slack(0.0) >= 1e-9);
        assert!(tie_slack(1e6) > tie_slack(1.0));
        assert!((0.1 + 0.2 - 0.3_f64).abs() <= tie_slack(0.3));
    }

    #[test]
    fn prices_summing_past_decimal_range_are_budget_too_low() {
        let huge = Decimal::MAX / Decimal::TWO + Decimal::ONE;
        let pool = vec![
            candidate(1, Category::Goalkeeper, 0, 5.0),
            candidate(2, Category::Goalkeeper, 0, 4.0),
        ]
        .into_iter()
        .map(|mut candidate| {
            candidate.price = huge;
            candidate
        })
        .collect::<Vec<_>>();
        let constraints = ConstraintModel::new(
            2,
            [(Category::Goalkeeper, 2)].into_iter().collect(),
            Decimal::new(100, 0),
            2,
        )
        .expect("valid");
        assert_eq!(
            solve(&pool, &constraints),
            Err(SquadError::Infeasible(InfeasibleReason::BudgetTooLow {
                cheapest: Decimal::MAX,
                budget_cap: Decimal::new(100, 0),
            }))
        );
    }

    #[test]
    fn unaffordable_outlier_price_does_not_disturb_the_search() {
        let mut pool = greedy_trap_pool();
        let mut outlier = candidate(7, Category::Defender, 0, 1000.0);
        outlier.price = Decimal::MAX;
        pool.push(outlier);
        let squad = solve(&pool, &two_slot_model(12)).expect("feasible");
        assert_eq!(ids(&squad), vec![2, 3]);
        assert!(squad.is_certified());
    }
}
