use serde::Serialize;

use crate::data::candidate::{Candidate, CandidateId, Category};

/// Compact view of a candidate for prediction listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub id: CandidateId,
    pub name: String,
    pub group: String,
    pub category: Category,
    pub price: rust_decimal::Decimal,
    pub predicted_score: f64,
}

/// Both ends of the ranking in one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub total_candidates: usize,
    pub top: Vec<RankedCandidate>,
    pub bottom: Vec<RankedCandidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    Highest,
    Lowest,
}

/// Highest predicted scores first; ties by ascending id.
pub fn top_candidates(pool: &[Candidate], limit: usize) -> Vec<RankedCandidate> {
    rank_candidates(pool, limit, RankOrder::Highest)
}

/// Lowest predicted scores first; ties by ascending id.
pub fn bottom_candidates(pool: &[Candidate], limit: usize) -> Vec<RankedCandidate> {
    rank_candidates(pool, limit, RankOrder::Lowest)
}

/// `limit` highest and `limit` lowest; the lists overlap when the pool is small.
pub fn prediction_summary(pool: &[Candidate], limit: usize) -> PredictionSummary {
    PredictionSummary {
        total_candidates: pool.len(),
        top: top_candidates(pool, limit),
        bottom: bottom_candidates(pool, limit),
    }
}

pub fn rank_candidates(pool: &[Candidate], limit: usize, order: RankOrder) -> Vec<RankedCandidate> {
    let mut sorted: Vec<&Candidate> = pool.iter().collect();
    sorted.sort_by(|left, right| {
        let by_score = match order {
            RankOrder::Highest => right.predicted_score.total_cmp(&left.predicted_score),
            RankOrder::Lowest => left.predicted_score.total_cmp(&right.predicted_score),
        };
        by_score.then_with(|| left.id.cmp(&right.id))
    });

    sorted
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, candidate)| RankedCandidate {
            rank: index + 1,
            id: candidate.id,
            name: candidate.name.clone(),
            group: candidate.group.clone(),
            category: candidate.category,
            price: candidate.price,
            predicted_score: candidate.predicted_score,
        })
        .collect()
}
