use crate::assembler::GenerationResult;
use crate::types::Marks;

/// How a generated paper's marks spread across its requirements.
#[derive(Clone, Debug, PartialEq)]
pub struct MarksSpread {
    /// Marks across every requirement.
    pub total: Marks,
    /// Number of requirements in the paper.
    pub requirements: usize,
    /// Smallest requirement sum.
    pub min: Marks,
    /// Largest requirement sum.
    pub max: Marks,
    /// Mean requirement sum.
    pub mean: f64,
    /// Largest requirement's share of `total`, in `[0, 1]`.
    pub max_share: f64,
    /// Smallest requirement's share of `total`, in `[0, 1]`.
    pub min_share: f64,
    /// Per-requirement breakdown, largest first.
    pub per_requirement: Vec<RequirementShare>,
}

/// One requirement's share of the paper's marks.
#[derive(Clone, Debug, PartialEq)]
pub struct RequirementShare {
    /// Requirement name.
    pub requirement: String,
    /// Items selected for the requirement.
    pub items: usize,
    /// Marks selected for the requirement.
    pub marks: Marks,
    /// Fraction of the paper total.
    pub share: f64,
}

/// Compute the marks spread of `result`, largest contributors first.
pub fn marks_spread(result: &GenerationResult) -> Option<MarksSpread> {
    let reports = &result.requirements;
    let min = reports.iter().map(|report| report.sum).min()?;
    let max = reports.iter().map(|report| report.sum).max()?;
    let total: Marks = reports.iter().map(|report| report.sum).sum();
    let share_of = |marks: Marks| {
        if total == 0 {
            0.0
        } else {
            f64::from(marks) / f64::from(total)
        }
    };
    let mut per_requirement: Vec<RequirementShare> = reports
        .iter()
        .map(|report| RequirementShare {
            requirement: report.name.clone(),
            items: report.count,
            marks: report.sum,
            share: share_of(report.sum),
        })
        .collect();
    per_requirement.sort_by(|a, b| {
        b.marks
            .cmp(&a.marks)
            .then_with(|| a.requirement.cmp(&b.requirement))
    });
    Some(MarksSpread {
        total,
        requirements: reports.len(),
        min,
        max,
        mean: f64::from(total) / reports.len() as f64,
        max_share: share_of(max),
        min_share: share_of(min),
        per_requirement,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::assembler::{GenerationStats, RequirementReport, ValidationReport};

    fn result_with(sums: &[(&str, usize, Marks)]) -> GenerationResult {
        let total = sums.iter().map(|(_, _, marks)| marks).sum();
        GenerationResult {
            paper: "p".into(),
            title: "P".into(),
            items: Vec::new(),
            requirements: sums
                .iter()
                .map(|(name, count, marks)| RequirementReport {
                    name: name.to_string(),
                    strategy: "exact_remainder",
                    count: *count,
                    sum: *marks,
                    target_min: *marks,
                    target_max: *marks,
                })
                .collect(),
            validation: ValidationReport {
                unique_ids: true,
                exact_sums: true,
                range_sums: true,
                count_bounds: true,
                total_conserved: true,
            },
            stats: GenerationStats {
                total_marks: total,
                target_total: total,
                item_count: 0,
                attempts: 1,
                elapsed: Duration::ZERO,
                generated_at: Utc::now(),
            },
        }
    }

    #[test]
    fn spread_reports_shares() {
        let spread = marks_spread(&result_with(&[
            ("section-1", 16, 50),
            ("section-2", 8, 80),
        ]))
        .expect("spread");
        assert_eq!(spread.total, 130);
        assert_eq!(spread.min, 50);
        assert_eq!(spread.max, 80);
        assert!((spread.mean - 65.0).abs() < 1e-6);
        assert!((spread.max_share - 80.0 / 130.0).abs() < 1e-6);
        assert_eq!(spread.per_requirement[0].requirement, "section-2");
        assert_eq!(spread.per_requirement[1].items, 16);
    }

    #[test]
    fn empty_result_has_no_spread() {
        assert!(marks_spread(&result_with(&[])).is_none());
    }
}
