use crate::types::{normalize_count, TallyField, TallyTotals, TargetKind, TrackedTarget};
use serde::{Deserialize, Serialize};

/// Session-wide summary: overall totals plus how many problem behaviors and
/// demands the session worked on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    pub totals: TallyTotals,
    pub behavior_count: usize,
    pub demand_count: usize,
}

/// The tracked rows of one therapy session.
///
/// Every public operation leaves the ledger valid: bad counts are clamped,
/// unknown ids and minute marks are ignored. Per-row totals are recomputed on
/// every write; session totals are computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialTallyLedger {
    session_id: String,
    targets: Vec<TrackedTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl TrialTallyLedger {
    /// Start an empty ledger for a session.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            targets: Vec::new(),
            notes: None,
        }
    }

    /// Resume a ledger from previously stored rows.
    ///
    /// Buckets are reshaped onto the canonical minute marks and every derived
    /// total is recomputed, so stale persisted totals never survive a load.
    pub fn from_targets(
        session_id: impl Into<String>,
        targets: Vec<TrackedTarget>,
        notes: Option<String>,
    ) -> Self {
        let mut targets = targets;
        for target in &mut targets {
            target.conform();
        }
        Self {
            session_id: session_id.into(),
            targets,
            notes,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes.filter(|n| !n.trim().is_empty());
    }

    /// Rows in creation order.
    pub fn targets(&self) -> &[TrackedTarget] {
        &self.targets
    }

    pub fn target(&self, id: &str) -> Option<&TrackedTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Rows of one kind, in creation order.
    pub fn targets_of(&self, kind: TargetKind) -> impl Iterator<Item = &TrackedTarget> {
        self.targets.iter().filter(move |t| t.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Append a new row of `kind`.
    ///
    /// The ordinal is the current number of same-kind rows plus one, so after
    /// a removal a new row may repeat an existing label.
    pub fn add_target(&mut self, kind: TargetKind) -> &TrackedTarget {
        let order = self.targets_of(kind).count() as u32 + 1;
        let id = self.fresh_id(kind);
        tracing::debug!(session_id = %self.session_id, %id, %kind, order, "add target");
        self.targets.push(TrackedTarget::new(id, kind, order));
        &self.targets[self.targets.len() - 1]
    }

    /// Remove the row with `id`. Unknown ids are ignored.
    /// Returns whether a row was removed.
    pub fn remove_target(&mut self, id: &str) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| t.id != id);
        let removed = self.targets.len() != before;
        if removed {
            tracing::debug!(session_id = %self.session_id, %id, "remove target");
        }
        removed
    }

    /// Overwrite one bucket field with an absolute count.
    ///
    /// Unknown target ids and minute marks are silent no-ops. Returns whether
    /// a bucket was written.
    pub fn set_interval_count(
        &mut self,
        target_id: &str,
        minute_mark: u32,
        field: TallyField,
        value: u32,
    ) -> bool {
        match self.targets.iter_mut().find(|t| t.id == target_id) {
            Some(target) => target.set_count(minute_mark, field, value),
            None => false,
        }
    }

    /// Same as [`set_interval_count`](Self::set_interval_count) for raw form
    /// input: non-numeric or negative text is stored as 0.
    pub fn set_interval_text(
        &mut self,
        target_id: &str,
        minute_mark: u32,
        field: TallyField,
        raw: &str,
    ) -> bool {
        self.set_interval_count(target_id, minute_mark, field, normalize_count(raw))
    }

    /// Replace a row's label. Counts and totals are untouched.
    pub fn rename_target(&mut self, target_id: &str, label: impl Into<String>) -> bool {
        match self.targets.iter_mut().find(|t| t.id == target_id) {
            Some(target) => {
                target.label = label.into();
                true
            }
            None => false,
        }
    }

    /// Aggregate over every row regardless of kind.
    pub fn session_totals(&self) -> TallyTotals {
        aggregate(self.targets.iter())
    }

    /// Aggregate restricted to one kind.
    pub fn totals_by_kind(&self, kind: TargetKind) -> TallyTotals {
        aggregate(self.targets_of(kind))
    }

    pub fn statistics(&self) -> SessionStatistics {
        SessionStatistics {
            totals: self.session_totals(),
            behavior_count: self.targets_of(TargetKind::Behavior).count(),
            demand_count: self.targets_of(TargetKind::Demand).count(),
        }
    }

    fn fresh_id(&self, kind: TargetKind) -> String {
        loop {
            let id = format!(
                "{}-{}",
                kind.as_str(),
                ulid::Ulid::new().to_string().to_lowercase()
            );
            if self.target(&id).is_none() {
                return id;
            }
        }
    }
}

fn aggregate<'a>(targets: impl Iterator<Item = &'a TrackedTarget>) -> TallyTotals {
    let (correct, incorrect) = targets.fold((0u64, 0u64), |(c, i), t| {
        (c + t.total_correct(), i + t.total_incorrect())
    });
    TallyTotals::from_counts(correct, incorrect)
}
