//! Suffix tables for branch-and-bound pruning.
//!
//! For each category the candidates are kept in a fixed order and, for every suffix start `j`
//! and count `k` up to the quota, we precompute:
//! - the cheapest total price of `k` items drawn from `j..`, used for exact budget pruning;
//! - for each price multiplier `λ`, the best sum of `score - λ·price` over `k` items from `j..`.
//!
//! `λ·remaining_budget + Σ best(score - λ·price)` is an upper bound on the remaining score for
//! every `λ >= 0` (Lagrangian relaxation of the budget), so the minimum over the sampled
//! multipliers is a valid bound. Multiplier 0 is always present at index 0.

use rust_decimal::Decimal;

use crate::data::candidate::CandidateId;

/// Number of positive score/price ratios sampled as multipliers.
const MULTIPLIER_SAMPLES: usize = 12;

#[derive(Debug, Clone)]
pub(crate) struct SlotItem {
    /// Index into the eligible candidate list the problem was built from.
    pub pool_index: usize,
    pub id: CandidateId,
    pub group: usize,
    pub price: Decimal,
    pub price_f64: f64,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct SuffixTables {
    width: usize,
    min_price: Vec<Option<Decimal>>,
    relaxed: Vec<Vec<f64>>,
}

impl SuffixTables {
    pub fn build(items: &[SlotItem], quota: usize, multipliers: &[f64]) -> Self {
        let width = quota + 1;
        let rows = items.len() + 1;
        let mut min_price: Vec<Option<Decimal>> = vec![None; rows * width];
        let mut relaxed = vec![vec![f64::NEG_INFINITY; rows * width]; multipliers.len()];

        for row in (0..rows).rev() {
            min_price[row * width] = Some(Decimal::ZERO);
            for table in relaxed.iter_mut() {
                table[row * width] = 0.0;
            }
            let Some(item) = items.get(row) else {
                continue;
            };
            let next = (row + 1) * width;

            for k in 1..width {
                let take = min_price[next + k - 1].map(|rest| rest + item.price);
                let skip = min_price[next + k];
                min_price[row * width + k] = match (take, skip) {
                    (Some(take), Some(skip)) => Some(take.min(skip)),
                    (take, skip) => take.or(skip),
                };
            }

            for (table, lambda) in relaxed.iter_mut().zip(multipliers) {
                let value = item.score - lambda * item.price_f64;
                for k in 1..width {
                    let take = table[next + k - 1] + value;
                    let skip = table[next + k];
                    table[row * width + k] = take.max(skip);
                }
            }
        }

        Self {
            width,
            min_price,
            relaxed,
        }
    }

    /// Cheapest price of `count` items from `start..`; `None` if fewer remain.
    pub fn min_price(&self, start: usize, count: usize) -> Option<Decimal> {
        self.min_price[start * self.width + count]
    }

    /// Best relaxed value of `count` items from `start..`; `-inf` if fewer remain.
    pub fn relaxed(&self, multiplier: usize, start: usize, count: usize) -> f64 {
        self.relaxed[multiplier][start * self.width + count]
    }
}

/// Multiplier 0 followed by evenly spaced quantiles of positive score/price ratios.
pub(crate) fn price_multipliers<'a>(items: impl Iterator<Item = &'a SlotItem>) -> Vec<f64> {
    let mut ratios: Vec<f64> = items
        .filter(|item| item.score > 0.0 && item.price_f64 > 0.0)
        .map(|item| item.score / item.price_f64)
        .filter(|ratio| ratio.is_finite())
        .collect();
    ratios.sort_by(f64::total_cmp);

    let mut multipliers = vec![0.0];
    if let Some(last) = ratios.len().checked_sub(1) {
        for step in 0..MULTIPLIER_SAMPLES {
            multipliers.push(ratios[step * last / (MULTIPLIER_SAMPLES - 1)]);
        }
    }
    multipliers.dedup();
    multipliers
}
