use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical checkpoints of a session timeline, in minutes.
///
/// Shared with every serialization of a session record; changing it is a
/// schema change.
pub const MINUTE_MARKS: [u32; 12] = [5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60];

/// Default session length in minutes (last canonical mark).
pub const DEFAULT_SESSION_MINUTES: u32 = 60;

/// What a tracked row measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A problem behavior being reduced.
    Behavior,
    /// A skill-acquisition demand.
    Demand,
    /// A generic tracked event.
    Event,
}

impl TargetKind {
    pub const ALL: [TargetKind; 3] = [TargetKind::Behavior, TargetKind::Demand, TargetKind::Event];

    /// Stable wire name, also used as the id prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Behavior => "behavior",
            TargetKind::Demand => "demand",
            TargetKind::Event => "event",
        }
    }

    /// Noun used when auto-generating row labels.
    pub fn display_name(self) -> &'static str {
        match self {
            TargetKind::Behavior => "Comportamento problema",
            TargetKind::Demand => "Demanda",
            TargetKind::Event => "Evento",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "behavior" | "comportamento" => Ok(TargetKind::Behavior),
            "demand" | "demanda" => Ok(TargetKind::Demand),
            "event" | "evento" => Ok(TargetKind::Event),
            other => Err(format!(
                "unknown target kind '{other}' (expected behavior, demand or event)"
            )),
        }
    }
}

/// Which half of a bucket a write addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TallyField {
    Correct,
    Incorrect,
}

impl FromStr for TallyField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correct" | "acerto" | "+" => Ok(TallyField::Correct),
            "incorrect" | "erro" | "-" => Ok(TallyField::Incorrect),
            other => Err(format!(
                "unknown tally field '{other}' (expected correct or incorrect)"
            )),
        }
    }
}

/// One checkpoint bucket. Both counts at zero means "no trials yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    pub minute_mark: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
}

impl TimeInterval {
    pub fn empty(minute_mark: u32) -> Self {
        Self {
            minute_mark,
            correct_count: 0,
            incorrect_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.correct_count == 0 && self.incorrect_count == 0
    }

    pub fn get(&self, field: TallyField) -> u32 {
        match field {
            TallyField::Correct => self.correct_count,
            TallyField::Incorrect => self.incorrect_count,
        }
    }

    fn set(&mut self, field: TallyField, value: u32) {
        match field {
            TallyField::Correct => self.correct_count = value,
            TallyField::Incorrect => self.incorrect_count = value,
        }
    }
}

/// One empty bucket per canonical minute mark.
pub fn empty_intervals() -> Vec<TimeInterval> {
    MINUTE_MARKS.iter().map(|&m| TimeInterval::empty(m)).collect()
}

/// Correct/incorrect aggregate with its derived trial count and percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyTotals {
    pub correct: u64,
    pub incorrect: u64,
    pub trials: u64,
    pub percent: u32,
}

impl TallyTotals {
    pub fn from_counts(correct: u64, incorrect: u64) -> Self {
        let trials = correct + incorrect;
        Self {
            correct,
            incorrect,
            trials,
            percent: percent_of(correct, trials),
        }
    }

    /// Sum of two aggregates, percentage recomputed from the summed counts.
    pub fn merge(self, other: TallyTotals) -> Self {
        Self::from_counts(self.correct + other.correct, self.incorrect + other.incorrect)
    }
}

/// `round(part * 100 / whole)` with round-half-up, or 0 when `whole` is 0.
pub fn percent_of(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let scaled = (part as u128 * 200 + whole as u128) / (whole as u128 * 2);
    scaled.min(u32::MAX as u128) as u32
}

/// Coerce raw text input into a tally count.
///
/// Reads an optional sign and the leading run of digits after trimming.
/// Anything non-numeric or negative becomes 0; oversized values saturate.
pub fn normalize_count(raw: &str) -> u32 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() || negative {
        return 0;
    }
    digits.parse::<u64>().map_or(u32::MAX, |n| n.min(u32::MAX as u64) as u32)
}

/// A tracked behavior, demand or event row with its bucketed tallies.
///
/// Derived totals are recomputed from `intervals` on every write and are
/// never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedTarget {
    pub id: String,
    pub kind: TargetKind,
    pub label: String,
    pub order: u32,
    intervals: Vec<TimeInterval>,
    #[serde(default)]
    total_correct: u64,
    #[serde(default)]
    total_incorrect: u64,
    #[serde(default)]
    total_trials: u64,
    #[serde(default)]
    percent_correct: u32,
}

impl TrackedTarget {
    /// Build a fresh row with the auto-generated label `"<Noun> <order>°"`.
    pub fn new(id: impl Into<String>, kind: TargetKind, order: u32) -> Self {
        Self {
            id: id.into(),
            kind,
            label: format!("{} {order}°", kind.display_name()),
            order,
            intervals: empty_intervals(),
            total_correct: 0,
            total_incorrect: 0,
            total_trials: 0,
            percent_correct: 0,
        }
    }

    /// Rebuild a row from stored buckets; derived totals are recomputed.
    pub fn with_intervals(
        id: impl Into<String>,
        kind: TargetKind,
        label: impl Into<String>,
        order: u32,
        intervals: Vec<TimeInterval>,
    ) -> Self {
        let mut target = Self {
            id: id.into(),
            kind,
            label: label.into(),
            order,
            intervals,
            total_correct: 0,
            total_incorrect: 0,
            total_trials: 0,
            percent_correct: 0,
        };
        target.recompute();
        target
    }

    pub fn intervals(&self) -> &[TimeInterval] {
        &self.intervals
    }

    pub fn interval(&self, minute_mark: u32) -> Option<&TimeInterval> {
        self.intervals.iter().find(|i| i.minute_mark == minute_mark)
    }

    pub fn total_correct(&self) -> u64 {
        self.total_correct
    }

    pub fn total_incorrect(&self) -> u64 {
        self.total_incorrect
    }

    pub fn total_trials(&self) -> u64 {
        self.total_trials
    }

    pub fn percent_correct(&self) -> u32 {
        self.percent_correct
    }

    pub fn totals(&self) -> TallyTotals {
        TallyTotals {
            correct: self.total_correct,
            incorrect: self.total_incorrect,
            trials: self.total_trials,
            percent: self.percent_correct,
        }
    }

    /// Overwrite one field of the bucket at `minute_mark`, then recompute.
    /// Returns `false` (and changes nothing) when no bucket has that mark.
    pub(crate) fn set_count(&mut self, minute_mark: u32, field: TallyField, value: u32) -> bool {
        let Some(bucket) = self
            .intervals
            .iter_mut()
            .find(|i| i.minute_mark == minute_mark)
        else {
            return false;
        };
        bucket.set(field, value);
        self.recompute();
        true
    }

    /// Reshape stored buckets onto the canonical marks: missing marks become
    /// empty buckets, unknown marks are dropped. Derived totals follow.
    pub(crate) fn conform(&mut self) {
        let stored = std::mem::take(&mut self.intervals);
        self.intervals = MINUTE_MARKS
            .iter()
            .map(|&m| {
                stored
                    .iter()
                    .find(|i| i.minute_mark == m)
                    .copied()
                    .unwrap_or_else(|| TimeInterval::empty(m))
            })
            .collect();
        self.recompute();
    }

    /// Full re-scan of this row's buckets. Reads no other row.
    pub(crate) fn recompute(&mut self) {
        let correct: u64 = self.intervals.iter().map(|i| i.correct_count as u64).sum();
        let incorrect: u64 = self.intervals.iter().map(|i| i.incorrect_count as u64).sum();
        let totals = TallyTotals::from_counts(correct, incorrect);
        self.total_correct = totals.correct;
        self.total_incorrect = totals.incorrect;
        self.total_trials = totals.trials;
        self.percent_correct = totals.percent;
        tracing::trace!(target_id = %self.id, ?totals, "recomputed target totals");
    }
}
