use serde::{Deserialize, Serialize};
use tally_core::{TrackedTarget, TrialTallyLedger, DEFAULT_SESSION_MINUTES};
use time::format_description::well_known::Rfc3339;

/// Persisted shape of one session's data sheet.
///
/// Field names mirror the in-memory model so load → edit → save is lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    #[serde(default)]
    pub child_id: String,
    #[serde(default)]
    pub child_name: String,
    pub date: String,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub targets: Vec<TrackedTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_duration() -> u32 {
    DEFAULT_SESSION_MINUTES
}

impl SessionRecord {
    /// A record with no rows, dated now.
    pub fn empty(
        session_id: impl Into<String>,
        child_id: impl Into<String>,
        child_name: impl Into<String>,
    ) -> Self {
        let now = now_rfc3339();
        Self {
            session_id: session_id.into(),
            child_id: child_id.into(),
            child_name: child_name.into(),
            date: now.clone(),
            duration_minutes: DEFAULT_SESSION_MINUTES,
            targets: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: None,
        }
    }

    /// Build the editable ledger for this record.
    pub fn to_ledger(&self) -> TrialTallyLedger {
        TrialTallyLedger::from_targets(
            self.session_id.clone(),
            self.targets.clone(),
            self.notes.clone(),
        )
    }

    /// Copy of this record carrying the ledger's rows and notes.
    pub fn with_ledger(&self, ledger: &TrialTallyLedger) -> Self {
        Self {
            targets: ledger.targets().to_vec(),
            notes: ledger.notes().map(str::to_string),
            ..self.clone()
        }
    }
}

/// Current UTC time at second precision.
pub(crate) fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc();
    let now = now.replace_nanosecond(0).unwrap_or(now);
    now.format(&Rfc3339).expect("UTC time formats as RFC 3339")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{TallyField, TargetKind};

    #[test]
    fn empty_record_defaults() {
        let rec = SessionRecord::empty("42", "7", "Ana");
        assert_eq!(rec.session_id, "42");
        assert_eq!(rec.duration_minutes, 60);
        assert!(rec.targets.is_empty());
        assert_eq!(rec.date, rec.created_at);
        assert!(rec.updated_at.is_none());
        let created = time::OffsetDateTime::parse(&rec.created_at, &Rfc3339).unwrap();
        assert_eq!(created.nanosecond(), 0);
    }

    #[test]
    fn ledger_round_trip_is_lossless() {
        let rec = SessionRecord::empty("42", "7", "Ana");
        let mut ledger = rec.to_ledger();
        let id = ledger.add_target(TargetKind::Demand).id.clone();
        ledger.set_interval_count(&id, 15, TallyField::Incorrect, 2);
        ledger.set_notes(Some("boa sessão".into()));

        let saved = rec.with_ledger(&ledger);
        let json = serde_json::to_string(&saved).unwrap();
        let loaded: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.to_ledger(), ledger);
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let json = r#"{"sessionId":"9","date":"2024-03-15T10:00:00Z","createdAt":"2024-03-15T10:00:00Z"}"#;
        let rec: SessionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.duration_minutes, 60);
        assert!(rec.targets.is_empty());
        assert_eq!(rec.child_id, "");
    }
}
