//! Validated squad composition rules shared read-only across solves.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::data::candidate::Category;
use crate::error::SquadError;

pub const DEFAULT_SQUAD_SIZE: usize = 15;
pub const DEFAULT_GROUP_CAP: usize = 3;
pub const DEFAULT_QUOTAS: [(Category, usize); Category::COUNT] = [
    (Category::Goalkeeper, 2),
    (Category::Defender, 5),
    (Category::Midfielder, 5),
    (Category::Forward, 3),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintModel {
    squad_size: usize,
    category_quota: BTreeMap<Category, usize>,
    budget_cap: Decimal,
    group_cap: usize,
    #[serde(skip)]
    quotas: [usize; Category::COUNT],
}

impl ConstraintModel {
    /// Categories missing from `category_quota` get a quota of zero and are never selected.
    pub fn new(
        squad_size: usize,
        category_quota: BTreeMap<Category, usize>,
        budget_cap: Decimal,
        group_cap: usize,
    ) -> Result<Self, SquadError> {
        if squad_size == 0 {
            return Err(SquadError::InvalidConfiguration(
                "squad_size must be positive".to_string(),
            ));
        }
        if let Some((category, _)) = category_quota.iter().find(|(_, count)| **count == 0) {
            return Err(SquadError::InvalidConfiguration(format!(
                "quota for {category} must be positive"
            )));
        }
        let quota_total: usize = category_quota.values().sum();
        if quota_total != squad_size {
            return Err(SquadError::InvalidConfiguration(format!(
                "category quotas sum to {quota_total} but squad_size is {squad_size}"
            )));
        }
        if budget_cap <= Decimal::ZERO {
            return Err(SquadError::InvalidConfiguration(format!(
                "budget_cap must be positive, got {budget_cap}"
            )));
        }
        // Every member costs at most the cap, so this bounds any squad's price sum.
        if budget_cap.checked_mul(Decimal::from(squad_size)).is_none() {
            return Err(SquadError::InvalidConfiguration(format!(
                "budget_cap {budget_cap} is too large to total over {squad_size} members"
            )));
        }
        if group_cap == 0 {
            return Err(SquadError::InvalidConfiguration(
                "group_cap must be positive".to_string(),
            ));
        }

        let mut quotas = [0; Category::COUNT];
        for (category, count) in &category_quota {
            quotas[category.index()] = *count;
        }

        Ok(Self {
            squad_size,
            category_quota,
            budget_cap,
            group_cap,
            quotas,
        })
    }

    /// Same rules with a different budget cap, revalidated.
    pub fn with_budget_cap(&self, budget_cap: Decimal) -> Result<Self, SquadError> {
        Self::new(
            self.squad_size,
            self.category_quota.clone(),
            budget_cap,
            self.group_cap,
        )
    }

    pub fn squad_size(&self) -> usize {
        self.squad_size
    }

    pub fn quota(&self, category: Category) -> usize {
        self.quotas[category.index()]
    }

    pub fn category_quota(&self) -> &BTreeMap<Category, usize> {
        &self.category_quota
    }

    pub fn budget_cap(&self) -> Decimal {
        self.budget_cap
    }

    pub fn group_cap(&self) -> usize {
        self.group_cap
    }

    /// Categories with a positive quota, in solve order.
    pub fn active_categories(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL
            .into_iter()
            .filter(move |category| self.quota(*category) > 0)
    }

    pub fn is_eligible(&self, category: Category) -> bool {
        self.quota(category) > 0
    }
}

impl Default for ConstraintModel {
    fn default() -> Self {
        let category_quota: BTreeMap<Category, usize> = DEFAULT_QUOTAS.into_iter().collect();
        let mut quotas = [0; Category::COUNT];
        for (category, count) in DEFAULT_QUOTAS {
            quotas[category.index()] = count;
        }
        Self {
            squad_size: DEFAULT_SQUAD_SIZE,
            category_quota,
            budget_cap: Decimal::ONE_HUNDRED,
            group_cap: DEFAULT_GROUP_CAP,
            quotas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotas(entries: &[(Category, usize)]) -> BTreeMap<Category, usize> {
        entries.iter().copied().collect()
    }

    #[test]
    fn default_matches_validated_construction() {
        let built = ConstraintModel::new(
            15,
            DEFAULT_QUOTAS.into_iter().collect(),
            Decimal::ONE_HUNDRED,
            3,
        )
        .expect("default convention should validate");
        assert_eq!(built, ConstraintModel::default());
        assert_eq!(built.quota(Category::Defender), 5);
    }

    #[test]
    fn rejects_quotas_not_summing_to_squad_size() {
        let err = ConstraintModel::new(
            11,
            quotas(&[(Category::Goalkeeper, 1), (Category::Defender, 4)]),
            Decimal::ONE_HUNDRED,
            3,
        )
        .unwrap_err();
        assert!(matches!(err, SquadError::InvalidConfiguration(ref msg) if msg.contains("sum to 5")));
    }

    #[test]
    fn rejects_budget_cap_whose_squad_total_would_overflow() {
        let err = ConstraintModel::new(
            2,
            quotas(&[(Category::Goalkeeper, 2)]),
            Decimal::MAX,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, SquadError::InvalidConfiguration(ref msg) if msg.contains("too large")));

        assert!(ConstraintModel::new(1, quotas(&[(Category::Goalkeeper, 1)]), Decimal::MAX, 1).is_ok());
    }

    #[test]
    fn rejects_zero_quota_size_budget_and_group_cap() {
        assert!(ConstraintModel::new(
            2,
            quotas(&[(Category::Goalkeeper, 2), (Category::Forward, 0)]),
            Decimal::TEN,
            1
        )
        .is_err());
        assert!(ConstraintModel::new(0, BTreeMap::new(), Decimal::TEN, 1).is_err());
        assert!(ConstraintModel::new(
            1,
            quotas(&[(Category::Goalkeeper, 1)]),
            Decimal::ZERO,
            1
        )
        .is_err());
        assert!(ConstraintModel::new(
            1,
            quotas(&[(Category::Goalkeeper, 1)]),
            Decimal::NEGATIVE_ONE,
            1
        )
        .is_err());
        assert!(ConstraintModel::new(
            1,
            quotas(&[(Category::Goalkeeper, 1)]),
            Decimal::TEN,
            0
        )
        .is_err());
    }

    #[test]
    fn missing_categories_are_ineligible() {
        let model = ConstraintModel::new(
            3,
            quotas(&[(Category::Midfielder, 3)]),
            Decimal::TEN,
            2,
        )
        .expect("valid");
        assert!(!model.is_eligible(Category::Goalkeeper));
        assert_eq!(
            model.active_categories().collect::<Vec<_>>(),
            vec![Category::Midfielder]
        );
    }

    #[test]
    fn with_budget_cap_revalidates() {
        let model = ConstraintModel::default();
        assert_eq!(
            model.with_budget_cap(Decimal::TEN).map(|m| m.budget_cap()),
            Ok(Decimal::TEN)
        );
        assert!(model.with_budget_cap(Decimal::ZERO).is_err());
    }
}
