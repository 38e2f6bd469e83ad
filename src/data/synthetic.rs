//! Deterministic synthetic candidate pools for demos, benches and tests.
//!
//! Each club fields `per_club[category]` candidates. Price tracks a hidden quality draw and
//! the predicted score tracks the same quality plus noise, so expensive candidates tend to
//! score higher without strictly dominating cheap ones.

use rust_decimal::Decimal;

use crate::data::candidate::{Candidate, Category};
use crate::data::rng::Rng;

#[derive(Debug, Clone)]
pub struct SyntheticPoolSpec {
    pub seed: u64,
    pub clubs: usize,
    /// Candidates per club, indexed by [Category::index].
    pub per_club: [usize; Category::COUNT],
}

impl Default for SyntheticPoolSpec {
    fn default() -> Self {
        Self {
            seed: 0,
            clubs: 20,
            per_club: [2, 5, 5, 3],
        }
    }
}

/// Price floor and span in tenths of a currency unit, per category.
fn price_band(category: Category) -> (i64, i64) {
    match category {
        Category::Goalkeeper => (40, 20),
        Category::Defender => (40, 35),
        Category::Midfielder => (45, 85),
        Category::Forward => (45, 95),
    }
}

pub fn generate_pool(spec: &SyntheticPoolSpec) -> Vec<Candidate> {
    let mut rng = Rng::new(spec.seed);
    let mut pool = Vec::with_capacity(spec.clubs * spec.per_club.iter().sum::<usize>());
    let mut next_id: u32 = 1;

    for club in 0..spec.clubs {
        let group = format!("Club {:02}", club + 1);
        for category in Category::ALL {
            let (floor, span) = price_band(category);
            for _ in 0..spec.per_club[category.index()] {
                let quality = rng.next_f64();
                let tenths = floor + (quality * span as f64).round() as i64;
                let noise = rng.next_f64() * 3.0 - 1.5;
                let score = ((1.0 + 7.0 * quality + noise) * 100.0).round() / 100.0;
                pool.push(Candidate::new(
                    next_id,
                    format!("Player {next_id}"),
                    group.clone(),
                    category,
                    Decimal::new(tenths, 1),
                    score,
                ));
                next_id += 1;
            }
        }
    }

    // Callers must not rely on generation order.
    rng.shuffle(&mut pool);
    pool
}
