//! CSV ingestion for student records.
//!
//! Fields are split on commas with quoting disabled, so a value containing a
//! comma shifts the row and is not supported. Header names are trimmed and
//! then matched exactly (case-sensitive) against each column's accepted
//! names.

use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::analyzers::standing::OutcomePolicy;
use crate::error::{DashboardError, Result};
use crate::fetch::{BasicClient, fetch_bytes};
use crate::record::{DemographicRecord, EngagementRecord, Schema, StudentRecord, check_score};

struct Column {
    name: &'static str,
    aliases: &'static [&'static str],
}

const ENGAGEMENT_COLUMNS: &[Column] = &[
    Column { name: "StudentID", aliases: &[] },
    Column { name: "CourseCategory", aliases: &[] },
    Column { name: "TimeSpentOnCourse", aliases: &[] },
    Column { name: "QuizScores", aliases: &[] },
    Column { name: "CompletionRate", aliases: &[] },
];

// Aliases cover the raw dataset headers and the snake_case names its cleaning step produces.
const DEMOGRAPHIC_COLUMNS: &[Column] = &[
    Column { name: "gender", aliases: &[] },
    Column { name: "ethnicity", aliases: &["race_ethnicity", "race/ethnicity"] },
    Column {
        name: "parent_education",
        aliases: &["parental_level_of_education", "parental level of education"],
    },
    Column { name: "lunch_type", aliases: &["lunch"] },
    Column {
        name: "test_prep_course",
        aliases: &["test_preparation_course", "test preparation course"],
    },
    Column { name: "math_score", aliases: &["math score"] },
    Column { name: "reading_score", aliases: &["reading score"] },
    Column { name: "writing_score", aliases: &["writing score"] },
];

impl Schema {
    fn columns(self) -> &'static [Column] {
        match self {
            Schema::Demographic => DEMOGRAPHIC_COLUMNS,
            Schema::Engagement => ENGAGEMENT_COLUMNS,
        }
    }

    /// Canonical names of the columns this schema requires.
    pub fn required_columns(self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.name).collect()
    }
}

/// Maps every required column to its header position, or lists all that are missing.
fn resolve_columns(header: &StringRecord, schema: Schema) -> Result<Vec<usize>> {
    let names: Vec<&str> = header.iter().map(str::trim).collect();
    let mut indices = Vec::new();
    let mut missing = Vec::new();

    for column in schema.columns() {
        let found = names
            .iter()
            .position(|h| *h == column.name || column.aliases.contains(h));
        match found {
            Some(i) => indices.push(i),
            None => missing.push(column.name.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(DashboardError::Schema { missing })
    }
}

fn number(raw: &str, column: &str) -> std::result::Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("{column} is not a number: {raw:?}")),
    }
}

fn score(raw: &str, column: &str, max: f64) -> std::result::Result<f64, String> {
    check_score(number(raw, column)?, column, max)
}

fn engagement_row(
    fields: &[&str],
    idx: &[usize],
    policy: &OutcomePolicy,
) -> std::result::Result<StudentRecord, String> {
    let student_id = fields[idx[0]].trim();
    if student_id.is_empty() {
        return Err("StudentID is empty".into());
    }

    let hours_watched = number(fields[idx[2]], "TimeSpentOnCourse")?;
    if hours_watched < 0.0 {
        return Err(format!("TimeSpentOnCourse is negative: {hours_watched}"));
    }
    let quiz_score = score(fields[idx[3]], "QuizScores", policy.score_max)?;
    let completion_rate = number(fields[idx[4]], "CompletionRate")?;

    Ok(StudentRecord::Engagement(EngagementRecord {
        student_id: student_id.to_string(),
        name: format!("Student {student_id}"),
        course: fields[idx[1]].trim().to_string(),
        hours_watched,
        quiz_scores: vec![quiz_score],
        completed: completion_rate >= policy.completion_rate_threshold,
        dropout_week: None,
    }))
}

fn demographic_row(
    row: usize,
    fields: &[&str],
    idx: &[usize],
    policy: &OutcomePolicy,
) -> std::result::Result<StudentRecord, String> {
    let text = |i: usize| fields[idx[i]].trim().to_string();

    let record = DemographicRecord {
        row,
        math_score: number(fields[idx[5]], "math_score")?,
        reading_score: number(fields[idx[6]], "reading_score")?,
        writing_score: number(fields[idx[7]], "writing_score")?,
        gender: text(0),
        ethnicity: text(1),
        parent_education: text(2),
        lunch_type: text(3),
        test_prep_course: text(4),
    };
    record.validate(policy.score_max)?;
    Ok(StudentRecord::Demographic(record))
}

/// Parses CSV text into records of the given schema.
///
/// Blank input fails with [`DashboardError::EmptyInput`]; a header with no
/// data rows is an empty success. Rows that are short, non-numeric, out of
/// range or lack an identity are dropped whole.
pub fn ingest(text: &str, schema: Schema, policy: &OutcomePolicy) -> Result<Vec<StudentRecord>> {
    if text.trim().is_empty() {
        return Err(DashboardError::EmptyInput);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(text.trim().as_bytes());

    let header = reader.headers()?.clone();
    let idx = resolve_columns(&header, schema)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (n, result) in reader.records().enumerate() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        if row.len() < header.len() {
            debug!(line, fields = row.len(), expected = header.len(), "Skipping short row");
            skipped += 1;
            continue;
        }

        let fields: Vec<&str> = row.iter().collect();
        let parsed = match schema {
            Schema::Engagement => engagement_row(&fields, &idx, policy),
            Schema::Demographic => demographic_row(n + 1, &fields, &idx, policy),
        };

        match parsed {
            Ok(record) => records.push(record),
            Err(reason) => {
                debug!(line, %reason, "Skipping invalid row");
                skipped += 1;
            }
        }
    }

    info!(?schema, kept = records.len(), skipped, "CSV ingested");
    Ok(records)
}

/// Reads and ingests a CSV file.
pub fn ingest_path(path: &Path, schema: Schema, policy: &OutcomePolicy) -> Result<Vec<StudentRecord>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| DashboardError::Parse(format!("{}: {e}", path.display())))?;
    ingest(&text, schema, policy)
}

/// Loads CSV text from a local file path or fetches it over HTTP, then ingests it.
#[instrument(skip(policy), fields(source = %source))]
pub async fn load_source(
    source: &str,
    schema: Schema,
    policy: &OutcomePolicy,
) -> Result<Vec<StudentRecord>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let client = BasicClient::new();
        let bytes = fetch_bytes(&client, source).await?;
        let text = String::from_utf8(bytes)
            .map_err(|e| DashboardError::Parse(format!("{source}: {e}")))?;
        ingest(&text, schema, policy)
    } else {
        ingest_path(Path::new(source), schema, policy)
    }
}
