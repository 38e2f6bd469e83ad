//! Captain selection: highest predicted score, smallest id on ties.

use std::cmp::Ordering;

use crate::data::candidate::Candidate;

/// Returns `None` only for an empty slice.
pub fn select_captain(members: &[Candidate]) -> Option<&Candidate> {
    members.iter().min_by(|left, right| captain_order(left, right))
}

/// Orders better captain choices first.
fn captain_order(left: &Candidate, right: &Candidate) -> Ordering {
    right
        .predicted_score
        .total_cmp(&left.predicted_score)
        .then_with(|| left.id.cmp(&right.id))
}
