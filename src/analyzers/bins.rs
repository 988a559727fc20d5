use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::record::StudentRecord;

/// A labeled score range. `upper` is exclusive unless `inclusive_upper` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    #[serde(default)]
    pub inclusive_upper: bool,
}

impl Bin {
    pub fn contains(&self, score: f64) -> bool {
        score >= self.lower && (score < self.upper || (self.inclusive_upper && score == self.upper))
    }
}

/// Ordered, contiguous, non-overlapping bins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinSpec {
    bins: Vec<Bin>,
}

impl BinSpec {
    pub fn new(bins: Vec<Bin>) -> Result<Self> {
        if bins.is_empty() {
            return Err(DashboardError::InvalidBinSpec("no bins given".into()));
        }

        for (i, bin) in bins.iter().enumerate() {
            if !(bin.lower.is_finite() && bin.upper.is_finite()) || bin.lower >= bin.upper {
                return Err(DashboardError::InvalidBinSpec(format!(
                    "bin '{}' has an empty or invalid range",
                    bin.label
                )));
            }
            if bin.inclusive_upper && i + 1 != bins.len() {
                return Err(DashboardError::InvalidBinSpec(format!(
                    "only the last bin may include its upper bound, '{}' does",
                    bin.label
                )));
            }
            if let Some(next) = bins.get(i + 1) {
                if next.lower != bin.upper {
                    return Err(DashboardError::InvalidBinSpec(format!(
                        "bins '{}' and '{}' are not contiguous",
                        bin.label, next.label
                    )));
                }
            }
        }

        Ok(Self { bins })
    }

    /// Fail / Pass / Good / Very Good / Excellent bands scaled to `score_max`.
    ///
    /// | Band      | Range (on 100) |
    /// |-----------|----------------|
    /// | Fail      | [0, 60)        |
    /// | Pass      | [60, 70)       |
    /// | Good      | [70, 80)       |
    /// | Very Good | [80, 90)       |
    /// | Excellent | [90, 100]      |
    ///
    /// `score_max` must be positive; see [`OutcomePolicy::validate`](crate::analyzers::standing::OutcomePolicy::validate).
    pub fn grade_bands(score_max: f64) -> Self {
        const BANDS: &[(&str, f64, f64)] = &[
            ("Fail", 0.0, 60.0),
            ("Pass", 60.0, 70.0),
            ("Good", 70.0, 80.0),
            ("Very Good", 80.0, 90.0),
            ("Excellent", 90.0, 100.0),
        ];

        let scale = score_max / 100.0;
        let bins = BANDS
            .iter()
            .enumerate()
            .map(|(i, (name, lo, hi))| {
                let last = i + 1 == BANDS.len();
                let (lower, upper) = (lo * scale, hi * scale);
                let shown_upper = if last { upper } else { upper - 1.0 };
                Bin {
                    label: format!("{lower}-{shown_upper} ({name})"),
                    lower,
                    upper,
                    inclusive_upper: last,
                }
            })
            .collect();

        Self { bins }
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Index of the bin holding `score`. Scores outside the covered range
    /// clamp into the first or last bin.
    pub fn locate(&self, score: f64) -> usize {
        let last = self.bins.len() - 1;
        if score < self.bins[0].lower {
            return 0;
        }
        self.bins
            .iter()
            .position(|b| b.contains(score))
            .unwrap_or(last)
    }
}

impl TryFrom<Vec<Bin>> for BinSpec {
    type Error = DashboardError;

    fn try_from(bins: Vec<Bin>) -> Result<Self> {
        BinSpec::new(bins)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinCount {
    pub label: String,
    pub count: usize,
}

/// Counts overall scores per bin. Output follows `spec` order and lists every bin.
pub fn bin_by_score(records: &[StudentRecord], spec: &BinSpec) -> Vec<BinCount> {
    let mut counts = vec![0usize; spec.bins.len()];

    for record in records {
        counts[spec.locate(record.overall_score())] += 1;
    }

    spec.bins
        .iter()
        .zip(counts)
        .map(|(bin, count)| BinCount {
            label: bin.label.clone(),
            count,
        })
        .collect()
}
