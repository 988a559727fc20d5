use serde::Serialize;
use std::collections::HashMap;

use crate::record::StudentRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAverage {
    pub label: String,
    pub average_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPoint {
    pub x: f64,
    pub y: f64,
    pub category: String,
}

/// Averages `value` per category, in first-appearance order.
///
/// Records for which `category` returns `None` are left out. Sums are kept
/// per group and divided once at the end.
pub fn group_by_category<R, C, V>(records: &[R], category: C, value: V) -> Vec<GroupAverage>
where
    C: Fn(&R) -> Option<String>,
    V: Fn(&R) -> f64,
{
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();

    for record in records {
        let Some(label) = category(record) else {
            continue;
        };
        let entry = sums.entry(label.clone()).or_insert_with(|| {
            order.push(label);
            (0.0, 0)
        });
        entry.0 += value(record);
        entry.1 += 1;
    }

    order
        .into_iter()
        .map(|label| {
            let (sum, count) = sums[&label];
            GroupAverage {
                label,
                average_value: sum / count as f64,
            }
        })
        .collect()
}

/// Percentage of records per category for which `predicate` holds.
pub fn rate_by_category<R, C, P>(records: &[R], category: C, predicate: P) -> Vec<GroupAverage>
where
    C: Fn(&R) -> Option<String>,
    P: Fn(&R) -> bool,
{
    group_by_category(records, category, |r| if predicate(r) { 100.0 } else { 0.0 })
}

/// `"none"` maps to "No Prep"; any other course value counts as prepared.
pub fn test_prep_label(record: &StudentRecord) -> Option<String> {
    let r = record.as_demographic()?;
    let label = if r.test_prep_course == "none" {
        "No Prep"
    } else {
        "Completed Prep"
    };
    Some(label.to_string())
}

pub fn parent_education(record: &StudentRecord) -> Option<String> {
    record.as_demographic().map(|r| r.parent_education.clone())
}

pub fn gender(record: &StudentRecord) -> Option<String> {
    record.as_demographic().map(|r| r.gender.clone())
}

pub fn course(record: &StudentRecord) -> Option<String> {
    record.as_engagement().map(|r| r.course.clone())
}

/// Math / Reading / Writing averages across demographic records.
pub fn subject_averages(records: &[StudentRecord]) -> Vec<GroupAverage> {
    let rows: Vec<_> = records.iter().filter_map(StudentRecord::as_demographic).collect();
    if rows.is_empty() {
        return Vec::new();
    }

    let n = rows.len() as f64;
    let subject = |label: &str, pick: fn(&crate::record::DemographicRecord) -> f64| GroupAverage {
        label: label.to_string(),
        average_value: rows.iter().map(|r| pick(r)).sum::<f64>() / n,
    };

    vec![
        subject("Math", |r| r.math_score),
        subject("Reading", |r| r.reading_score),
        subject("Writing", |r| r.writing_score),
    ]
}

/// Per-record projection, preserving input order.
pub fn correlate_by<R, X, Y, C>(records: &[R], x: X, y: Y, category: C) -> Vec<CorrelationPoint>
where
    X: Fn(&R) -> f64,
    Y: Fn(&R) -> f64,
    C: Fn(&R) -> String,
{
    records
        .iter()
        .map(|r| CorrelationPoint {
            x: x(r),
            y: y(r),
            category: category(r),
        })
        .collect()
}

/// Engagement: hours watched vs overall score, by course.
/// Demographic: math vs reading score, by test-prep label.
pub fn correlate(records: &[StudentRecord]) -> Vec<CorrelationPoint> {
    correlate_by(
        records,
        |r| match r {
            StudentRecord::Engagement(e) => e.hours_watched,
            StudentRecord::Demographic(d) => d.math_score,
        },
        |r| match r {
            StudentRecord::Engagement(_) => r.overall_score(),
            StudentRecord::Demographic(d) => d.reading_score,
        },
        |r| match r {
            StudentRecord::Engagement(e) => e.course.clone(),
            StudentRecord::Demographic(_) => test_prep_label(r).unwrap_or_default(),
        },
    )
}
