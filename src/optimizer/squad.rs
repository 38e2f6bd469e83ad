//! Solved squads and their derived totals.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::data::candidate::{Candidate, CandidateId, Category};
use crate::optimizer::captain::select_captain;

/// Whether a squad was proven score-maximal or returned from an exhausted search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Optimality {
    Certified,
    Uncertified,
}

/// Member ids per category in category order, serialized under plural labels
/// (`goalkeepers`, `defenders`, ...). Categories without members are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Lineup(Vec<(Category, Vec<CandidateId>)>);

impl Lineup {
    fn from_sorted(members: &[Candidate]) -> Self {
        let mut groups: Vec<(Category, Vec<CandidateId>)> = Vec::new();
        for member in members {
            match groups.last_mut() {
                Some((category, ids)) if *category == member.category => ids.push(member.id),
                _ => groups.push((member.category, vec![member.id])),
            }
        }
        Self(groups)
    }

    pub fn ids(&self, category: Category) -> &[CandidateId] {
        self.0
            .iter()
            .find(|(entry, _)| *entry == category)
            .map_or(&[], |(_, ids)| ids.as_slice())
    }
}

impl Serialize for Lineup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, ids) in &self.0 {
            map.serialize_entry(category.plural_label(), ids)?;
        }
        map.end()
    }
}

/// Immutable solve result. Members are ordered by category, then score descending, then id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Squad {
    members: Vec<Candidate>,
    lineup: Lineup,
    captain: Candidate,
    total_price: Decimal,
    total_score: f64,
    /// `total_score` plus the captain's score once more (additive bonus).
    total_with_bonus: f64,
    optimality: Optimality,
}

impl Squad {
    /// Returns `None` when `members` is empty or their prices overflow.
    pub(crate) fn from_members(mut members: Vec<Candidate>, optimality: Optimality) -> Option<Self> {
        members.sort_by(|left, right| {
            left.category
                .cmp(&right.category)
                .then_with(|| right.predicted_score.total_cmp(&left.predicted_score))
                .then_with(|| left.id.cmp(&right.id))
        });
        let captain = select_captain(&members)?.clone();
        let total_price = members
            .iter()
            .try_fold(Decimal::ZERO, |sum, member| sum.checked_add(member.price))?;
        let total_score: f64 = members.iter().map(|member| member.predicted_score).sum();
        let total_with_bonus = total_score + captain.predicted_score;

        let lineup = Lineup::from_sorted(&members);

        Some(Self {
            members,
            lineup,
            captain,
            total_price,
            total_score,
            total_with_bonus,
            optimality,
        })
    }

    pub fn members(&self) -> &[Candidate] {
        &self.members
    }

    pub fn lineup(&self) -> &Lineup {
        &self.lineup
    }

    pub fn captain(&self) -> &Candidate {
        &self.captain
    }

    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    pub fn total_with_bonus(&self) -> f64 {
        self.total_with_bonus
    }

    pub fn optimality(&self) -> Optimality {
        self.optimality
    }

    pub fn is_certified(&self) -> bool {
        self.optimality == Optimality::Certified
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: CandidateId) -> bool {
        self.members.iter().any(|member| member.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = CandidateId> + '_ {
        self.members.iter().map(|member| member.id)
    }

    /// Members grouped by category, each group keeping the squad's member order.
    pub fn by_category(&self) -> BTreeMap<Category, Vec<&Candidate>> {
        let mut grouped: BTreeMap<Category, Vec<&Candidate>> = BTreeMap::new();
        for member in &self.members {
            grouped.entry(member.category).or_default().push(member);
        }
        grouped
    }
}
