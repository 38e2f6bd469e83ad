//! Dominance pruning within a category.
//!
//! `y` dominates `x` when both share a category, `y` costs no more, and `y` either has a
//! smaller id and no lower score or beats `x` by more than the tie tolerance. Totals closer
//! than that tolerance count as tied, so a smaller score gap alone would not be an improvement.
//! If `x` sits in a feasible squad and enough
//! dominators exist that one is outside the squad in a group with spare room, swapping `x` for
//! it keeps the squad feasible and strictly improves it under the (score, ids) ordering. So
//! such an `x` can never be in the tie-broken optimum.

use std::collections::HashMap;

use crate::optimizer::bounds::SlotItem;

/// `items` must be ordered by score descending, then id ascending. `tie_tolerance` must be at
/// least the slack used when comparing squad totals.
/// Returns the retained items (same order) and how many were dropped.
pub(crate) fn retain_undominated(
    items: Vec<SlotItem>,
    quota: usize,
    squad_size: usize,
    group_cap: usize,
    tie_tolerance: f64,
) -> (Vec<SlotItem>, usize) {
    // Groups other than x's that a squad containing x can have at the cap.
    let blocked_groups = (squad_size - 1) / group_cap;

    let keep: Vec<bool> = (0..items.len())
        .map(|position| !is_dominated(&items, position, quota, blocked_groups, tie_tolerance))
        .collect();

    let dropped = keep.iter().filter(|kept| !**kept).count();
    let retained = items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, kept)| kept.then_some(item))
        .collect();
    (retained, dropped)
}

fn is_dominated(
    items: &[SlotItem],
    position: usize,
    quota: usize,
    blocked_groups: usize,
    tie_tolerance: f64,
) -> bool {
    let target = &items[position];
    // Items ahead of the target never score lower.
    let mut per_group: HashMap<usize, usize> = HashMap::new();
    let mut total = 0usize;
    for other in &items[..position] {
        let ranks_ahead = other.id < target.id || other.score - target.score > tie_tolerance;
        if ranks_ahead && other.price <= target.price {
            total += 1;
            if other.group != target.group {
                *per_group.entry(other.group).or_default() += 1;
            }
        }
    }
    if total < quota {
        return false;
    }

    let mut counts: Vec<usize> = per_group.into_values().collect();
    counts.sort_unstable_by(|left, right| right.cmp(left));
    let unreachable: usize = counts.iter().take(blocked_groups).sum();
    // At most quota - 1 dominators can already be in the squad alongside x.
    total - unreachable >= quota
}
