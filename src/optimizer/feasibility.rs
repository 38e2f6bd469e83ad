//! Pre-search infeasibility checks. Each check relaxes the other constraints, so a failure
//! here is a proof, and passing all of them leaves only joint budget/group conflicts.

use std::collections::{BTreeMap, VecDeque};

use rust_decimal::Decimal;

use crate::data::candidate::{Candidate, Category};
use crate::error::InfeasibleReason;
use crate::optimizer::constraints::ConstraintModel;

pub fn diagnose(
    eligible: &[&Candidate],
    constraints: &ConstraintModel,
) -> Result<(), InfeasibleReason> {
    check_category_counts(eligible, constraints)?;
    check_cheapest_selection(eligible, constraints)?;
    check_group_cap(eligible, constraints)
}

fn check_category_counts(
    eligible: &[&Candidate],
    constraints: &ConstraintModel,
) -> Result<(), InfeasibleReason> {
    for category in constraints.active_categories() {
        let required = constraints.quota(category);
        let available = eligible
            .iter()
            .filter(|candidate| candidate.category == category)
            .count();
        if available < required {
            return Err(InfeasibleReason::InsufficientCandidates {
                category,
                required,
                available,
            });
        }
    }
    Ok(())
}

/// Cheapest price of any quota-satisfying selection, ignoring the group cap. Saturates at
/// [Decimal::MAX] when the true total is not representable.
pub fn cheapest_selection_price(
    eligible: &[&Candidate],
    constraints: &ConstraintModel,
) -> Option<Decimal> {
    let mut total = Decimal::ZERO;
    for category in constraints.active_categories() {
        let mut prices: Vec<Decimal> = eligible
            .iter()
            .filter(|candidate| candidate.category == category)
            .map(|candidate| candidate.price)
            .collect();
        let required = constraints.quota(category);
        if prices.len() < required {
            return None;
        }
        prices.sort();
        total = prices
            .iter()
            .take(required)
            .fold(total, |sum, price| sum.saturating_add(*price));
    }
    Some(total)
}

fn check_cheapest_selection(
    eligible: &[&Candidate],
    constraints: &ConstraintModel,
) -> Result<(), InfeasibleReason> {
    match cheapest_selection_price(eligible, constraints) {
        Some(cheapest) if cheapest > constraints.budget_cap() => {
            Err(InfeasibleReason::BudgetTooLow {
                cheapest,
                budget_cap: constraints.budget_cap(),
            })
        }
        _ => Ok(()),
    }
}

fn check_group_cap(
    eligible: &[&Candidate],
    constraints: &ConstraintModel,
) -> Result<(), InfeasibleReason> {
    let max_selectable = max_selectable_under_group_cap(eligible, constraints);
    if max_selectable < constraints.squad_size() {
        return Err(InfeasibleReason::GroupCapUnsatisfiable {
            group_cap: constraints.group_cap(),
            max_selectable,
            squad_size: constraints.squad_size(),
        });
    }
    Ok(())
}

/// Largest number of quota slots fillable when no group exceeds the cap (budget ignored).
///
/// Max-flow over source → group (cap) → category (available count) → sink (quota).
pub fn max_selectable_under_group_cap(
    eligible: &[&Candidate],
    constraints: &ConstraintModel,
) -> usize {
    let mut per_group: BTreeMap<&str, [usize; Category::COUNT]> = BTreeMap::new();
    for candidate in eligible {
        per_group.entry(candidate.group.as_str()).or_default()[candidate.category.index()] += 1;
    }

    let groups = per_group.len();
    let source = 0;
    let sink = groups + Category::COUNT + 1;
    let category_node = |category: usize| groups + 1 + category;
    let mut network = FlowNetwork::new(sink + 1);

    for (offset, counts) in per_group.values().enumerate() {
        let group_node = offset + 1;
        network.add_edge(source, group_node, constraints.group_cap());
        for (category, count) in counts.iter().enumerate() {
            if *count > 0 {
                network.add_edge(group_node, category_node(category), *count);
            }
        }
    }
    for category in Category::ALL {
        network.add_edge(
            category_node(category.index()),
            sink,
            constraints.quota(category),
        );
    }

    network.max_flow(source, sink)
}

/// Dense residual-capacity network; node counts here are a few dozen.
struct FlowNetwork {
    capacity: Vec<Vec<usize>>,
}

impl FlowNetwork {
    fn new(nodes: usize) -> Self {
        Self {
            capacity: vec![vec![0; nodes]; nodes],
        }
    }

    fn add_edge(&mut self, from: usize, to: usize, capacity: usize) {
        self.capacity[from][to] += capacity;
    }

    /// Edmonds-Karp.
    fn max_flow(&mut self, source: usize, sink: usize) -> usize {
        let nodes = self.capacity.len();
        let mut total = 0;
        loop {
            let mut parent: Vec<Option<usize>> = vec![None; nodes];
            parent[source] = Some(source);
            let mut queue = VecDeque::from([source]);
            while let Some(node) = queue.pop_front() {
                if node == sink {
                    break;
                }
                for next in 0..nodes {
                    if parent[next].is_none() && self.capacity[node][next] > 0 {
                        parent[next] = Some(node);
                        queue.push_back(next);
                    }
                }
            }
            if parent[sink].is_none() {
                return total;
            }

            let mut bottleneck = usize::MAX;
            let mut node = sink;
            while node != source {
                let Some(prev) = parent[node] else { break };
                bottleneck = bottleneck.min(self.capacity[prev][node]);
                node = prev;
            }
            let mut node = sink;
            while node != source {
                let Some(prev) = parent[node] else { break };
                self.capacity[prev][node] -= bottleneck;
                self.capacity[node][prev] += bottleneck;
                node = prev;
            }
            total += bottleneck;
        }
    }
}
