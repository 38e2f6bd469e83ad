use std::collections::{HashMap, HashSet};
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::data::candidate::{Candidate, Category};
use crate::optimizer::constraints::ConstraintModel;

/// Ordered from most to least serious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    /// Record or category the message is about.
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    fn note(&mut self, severity: ValidationSeverity, context: &str, message: String) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.to_owned(),
            message,
        });
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(ValidationSeverity::Error) > 0
    }
}

/// Checks a pool for record-level problems and for categories too thin to meet `constraints`.
pub fn validate_pool(pool: &[Candidate], constraints: &ConstraintModel) -> ValidationReport {
    use ValidationSeverity::{Error, Info, Warning};

    let mut report = ValidationReport::default();
    let mut seen_ids = HashSet::new();
    let mut per_category: HashMap<Category, usize> = HashMap::new();
    let mut groups = HashSet::new();

    for (index, candidate) in pool.iter().enumerate() {
        let context = format!("candidate[{index}] id={}", candidate.id);

        if !seen_ids.insert(candidate.id) {
            report.note(Error, &context, format!("duplicate id {}", candidate.id));
        }
        if candidate.price < Decimal::ZERO {
            report.note(Error, &context, format!("negative price {}", candidate.price));
        }
        if !candidate.predicted_score.is_finite() {
            report.note(Error, &context, "predicted_score is not finite".into());
        }
        if candidate.name.trim().is_empty() {
            report.note(Warning, &context, "name is blank".into());
        }
        if candidate.group.trim().is_empty() {
            report.note(
                Warning,
                &context,
                "group is blank; blank groups share one cap".into(),
            );
        }

        *per_category.entry(candidate.category).or_default() += 1;
        groups.insert(candidate.group.as_str());
    }

    for category in Category::ALL {
        let available = per_category.get(&category).copied().unwrap_or(0);
        let required = constraints.quota(category);
        let context = format!("category {category}");
        if !constraints.is_eligible(category) {
            if available > 0 {
                report.note(
                    Info,
                    &context,
                    format!("{available} candidate(s) have no quota and will be ignored"),
                );
            }
        } else if available < required {
            report.note(
                Warning,
                &context,
                format!("{available} candidate(s) available, quota requires {required}"),
            );
        }
    }

    report.note(
        Info,
        "pool",
        format!("{} candidate(s) across {} group(s)", pool.len(), groups.len()),
    );
    report
}
