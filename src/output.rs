//! Output formatting and persistence for dashboard results.
//!
//! Supports pretty-printing, JSON serialization, plain-text tables and CSV
//! append of stats history.

use anyhow::Result;
use serde::Serialize;
use std::fmt::{Debug, Write};
use tracing::{debug, info};

use crate::record::StudentRecord;
use crate::stats::{AggregateStats, StatsRow};
use crate::view::{DashboardView, NOT_AVAILABLE, Series, or_not_available, text_or_not_available};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", to_json(value)?);
    Ok(())
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Appends a [`StatsRow`] to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &Path, row: &StatsRow) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(row)?;
    writer.flush()?;

    Ok(())
}

pub fn render_stats(stats: &AggregateStats) -> String {
    format!(
        "Total students:   {}\n\
         Active students:  {}\n\
         Completion rate:  {:.1}%\n\
         Dropout rate:     {:.1}%\n\
         Average score:    {:.1}\n",
        stats.total_students,
        stats.active_students,
        stats.completion_rate,
        stats.dropout_rate,
        stats.average_score,
    )
}

/// One titled table per series; empty series print `N/A`.
pub fn render_series(title: &str, series: &Series) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));

    if series.is_empty() {
        let _ = writeln!(out, "  {NOT_AVAILABLE}");
        return out;
    }

    match series {
        Series::Counts(counts) => {
            for c in counts {
                let _ = writeln!(out, "  {:<24} {:>6}", c.label, c.count);
            }
        }
        Series::Averages(averages) => {
            for a in averages {
                let _ = writeln!(out, "  {:<24} {:>8.1}", a.label, a.average_value);
            }
        }
        Series::Points(points) => {
            for p in points {
                let _ = writeln!(out, "  {:<24} {:>8.1} {:>8.1}", p.category, p.x, p.y);
            }
        }
    }
    out
}

pub fn render_view(view: &DashboardView) -> String {
    let mut out = render_stats(&view.stats);
    for chart in &view.charts {
        out.push('\n');
        out.push_str(&render_series(chart.title, &chart.series));
    }
    out
}

/// One line per matching record.
pub fn render_search_results(results: &[&StudentRecord]) -> String {
    let mut out = String::new();
    for record in results {
        let line = match record {
            StudentRecord::Engagement(r) => format!(
                "{} | {} | {} | hours {:.1} | score {:.1} | {} | dropout week {}",
                r.student_id,
                text_or_not_available(&r.name),
                text_or_not_available(&r.course),
                r.hours_watched,
                r.overall_score(),
                if r.completed { "completed" } else { "not completed" },
                or_not_available(r.dropout_week),
            ),
            StudentRecord::Demographic(r) => format!(
                "#{} | {} | {} | {} | {} | prep {} | math {:.0} reading {:.0} writing {:.0}",
                r.row,
                text_or_not_available(&r.gender),
                text_or_not_available(&r.ethnicity),
                text_or_not_available(&r.parent_education),
                text_or_not_available(&r.lunch_type),
                text_or_not_available(&r.test_prep_course),
                r.math_score,
                r.reading_score,
                r.writing_score,
            ),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}
