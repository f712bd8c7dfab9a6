use std::fmt;

use serde::{Serialize, Serializer};

/// Lower edge of the decile bucket that holds the learned cutoffs.
const CUTOFF_BUCKET_FLOOR: Decile = Decile(5);
/// Upper edge of the decile bucket that holds the learned cutoffs.
const CUTOFF_BUCKET_CEIL: Decile = Decile(6);
const DECILE_TOLERANCE: f64 = 1.0e-9;

/// Probability bucket expressed in tenths, `Decile(3)` is the 0.3 key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decile(u8);

impl Decile {
    /// Returns `None` for buckets above 1.0.
    pub const fn new(tenths: u8) -> Option<Self> {
        if tenths <= 10 {
            Some(Self(tenths))
        } else {
            None
        }
    }

    pub const fn tenths(self) -> u8 {
        self.0
    }

    pub fn threshold(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// Floor and ceiling buckets around a probability, clamped to [0, 1].
    ///
    /// Probabilities within a billionth of a decile count as exactly on it.
    pub fn bounds(probability: f64) -> (Decile, Decile) {
        let scaled = clamp_probability(probability) * 10.0;
        let nearest = scaled.round();
        let scaled = if (scaled - nearest).abs() < DECILE_TOLERANCE {
            nearest
        } else {
            scaled
        };

        (Decile(scaled.floor() as u8), Decile(scaled.ceil() as u8))
    }
}

impl fmt::Display for Decile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.threshold())
    }
}

impl Serialize for Decile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.threshold())
    }
}

/// One row of a cohort table: out of 100 patients in this bucket, `count` need the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CohortEntry {
    pub decile: Decile,
    pub count: u8,
}

/// Sparse, ordered decile table. Always holds at least one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CohortTable {
    entries: Vec<CohortEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CohortTableError {
    #[error("cohort table needs at least one entry")]
    Empty,
    #[error("decile {0} tenths is above 1.0")]
    DecileOutOfRange(u8),
    #[error("decile {0} appears more than once")]
    DuplicateDecile(Decile),
    #[error("count {count} at decile {decile} exceeds 100")]
    CountOutOfRange { decile: Decile, count: u8 },
}

impl CohortTable {
    /// Builds a table from `(tenths, count)` pairs in any order.
    pub fn from_pairs(pairs: &[(u8, u8)]) -> Result<Self, CohortTableError> {
        let mut entries = Vec::with_capacity(pairs.len());
        for &(tenths, count) in pairs {
            let decile = Decile::new(tenths).ok_or(CohortTableError::DecileOutOfRange(tenths))?;
            if count > 100 {
                return Err(CohortTableError::CountOutOfRange { decile, count });
            }
            entries.push(CohortEntry { decile, count });
        }

        entries.sort_by_key(|entry| entry.decile);
        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].decile == pair[1].decile)
        {
            return Err(CohortTableError::DuplicateDecile(pair[0].decile));
        }
        if entries.is_empty() {
            return Err(CohortTableError::Empty);
        }

        Ok(Self { entries })
    }

    /// Builds a table from constant rows that are already sorted, unique, and in range.
    pub(crate) fn from_static(rows: &'static [(u8, u8)]) -> Self {
        let entries = rows
            .iter()
            .map(|&(tenths, count)| CohortEntry {
                decile: Decile(tenths.min(10)),
                count: count.min(100),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CohortEntry] {
        &self.entries
    }

    pub fn count_at(&self, decile: Decile) -> Option<u8> {
        self.entries
            .iter()
            .find(|entry| entry.decile == decile)
            .map(|entry| entry.count)
    }

    /// Nearest present entry at or below `decile`, falling back to the smallest key.
    pub fn snap_down(&self, decile: Decile) -> CohortEntry {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.decile <= decile)
            .or_else(|| self.entries.first())
            .copied()
            .unwrap_or(EMPTY_ENTRY)
    }

    /// Nearest present entry at or above `decile`, falling back to the largest key.
    pub fn snap_up(&self, decile: Decile) -> CohortEntry {
        self.entries
            .iter()
            .find(|entry| entry.decile >= decile)
            .or_else(|| self.entries.last())
            .copied()
            .unwrap_or(EMPTY_ENTRY)
    }
}

// Unreachable through `from_pairs`, keeps the snap helpers total.
const EMPTY_ENTRY: CohortEntry = CohortEntry {
    decile: Decile(0),
    count: 0,
};

/// Illustrative "out of 100 similar patients" figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CohortEstimate {
    Single { count: u8 },
    Range { low: u8, high: u8 },
}

impl CohortEstimate {
    fn between(first: u8, second: u8) -> Self {
        if first == second {
            Self::Single { count: first }
        } else {
            Self::Range {
                low: first.min(second),
                high: first.max(second),
            }
        }
    }

    pub fn interpretation(&self) -> String {
        match self {
            Self::Single { count } => format!(
                "Out of 100 similar patients, {count} will need a PEG within 6 months."
            ),
            Self::Range { low, high } => format!(
                "Out of 100 similar patients, between {low} and {high} will need a PEG within 6 months."
            ),
        }
    }
}

/// Maps a probability onto the cohort table.
///
/// With a learned cutoff, probabilities strictly between 0.5 and the cutoff report
/// the 0.5 row and probabilities strictly between the cutoff and 0.6 report the
/// 0.6 row. Everything else brackets the probability with the floor and ceiling
/// deciles, snapped outward to keys the table has.
pub fn estimate(table: &CohortTable, cutoff: Option<f64>, probability: f64) -> CohortEstimate {
    let probability = clamp_probability(probability);

    if let Some(cutoff) = cutoff {
        let floor = CUTOFF_BUCKET_FLOOR.threshold();
        let ceil = CUTOFF_BUCKET_CEIL.threshold();
        if floor < probability && probability < cutoff {
            let entry = table.snap_down(CUTOFF_BUCKET_FLOOR);
            return CohortEstimate::Single { count: entry.count };
        }
        if cutoff < probability && probability < ceil {
            let entry = table.snap_up(CUTOFF_BUCKET_CEIL);
            return CohortEstimate::Single { count: entry.count };
        }
    }

    let (lower, upper) = Decile::bounds(probability);
    let lower = table.snap_down(lower);
    let upper = table.snap_up(upper);

    CohortEstimate::between(lower.count, upper.count)
}

fn clamp_probability(probability: f64) -> f64 {
    if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    }
}
