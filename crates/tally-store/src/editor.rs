use tally_core::TrialTallyLedger;

use crate::error::StoreResult;
use crate::record::{now_rfc3339, SessionRecord};
use crate::source::DataSource;

/// Editing context for one session's data sheet: the live ledger plus the
/// record metadata it was loaded from.
///
/// The editor owns its ledger; callers borrow it for reads and edits and hand
/// the editor a data source only when saving.
#[derive(Debug, Clone)]
pub struct SessionEditor {
    record: SessionRecord,
    ledger: TrialTallyLedger,
    dirty: bool,
}

impl SessionEditor {
    pub fn from_record(record: SessionRecord) -> Self {
        let ledger = record.to_ledger();
        Self {
            record,
            ledger,
            dirty: false,
        }
    }

    /// Load an existing record. `None` if the source has no such session.
    pub fn open(source: &dyn DataSource, session_id: &str) -> StoreResult<Option<Self>> {
        let record = source.load(session_id)?;
        tracing::debug!(
            session_id,
            source = source.name(),
            found = record.is_some(),
            "open session"
        );
        Ok(record.map(Self::from_record))
    }

    /// Load an existing record or start an empty, unsaved one.
    pub fn open_or_create(
        source: &dyn DataSource,
        session_id: &str,
        child_id: &str,
        child_name: &str,
    ) -> StoreResult<Self> {
        match Self::open(source, session_id)? {
            Some(editor) => Ok(editor),
            None => {
                let mut editor =
                    Self::from_record(SessionRecord::empty(session_id, child_id, child_name));
                editor.dirty = true;
                Ok(editor)
            }
        }
    }

    pub fn ledger(&self) -> &TrialTallyLedger {
        &self.ledger
    }

    /// Mutable access for edits; marks the editor dirty.
    pub fn ledger_mut(&mut self) -> &mut TrialTallyLedger {
        self.dirty = true;
        &mut self.ledger
    }

    /// Metadata as of the last load or successful save.
    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    /// Whether edits happened since the last load or successful save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The record that [`save`](Self::save) would send, without timestamps
    /// touched.
    pub fn snapshot(&self) -> SessionRecord {
        self.record.with_ledger(&self.ledger)
    }

    /// Persist the current ledger.
    ///
    /// On failure the ledger, metadata and dirty flag are exactly as before
    /// the call, so the caller can retry.
    pub fn save(&mut self, source: &mut dyn DataSource) -> StoreResult<()> {
        let mut candidate = self.snapshot();
        candidate.updated_at = Some(now_rfc3339());
        match source.save(&candidate) {
            Ok(()) => {
                tracing::info!(
                    session_id = %candidate.session_id,
                    source = source.name(),
                    targets = candidate.targets.len(),
                    "session saved"
                );
                self.record = candidate;
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %candidate.session_id,
                    source = source.name(),
                    error = %e,
                    "session save failed"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::fixture::InMemoryFixtureDataSource;
    use tally_core::{TallyField, TargetKind};

    /// Accepts loads, rejects every save.
    struct FailingDataSource {
        inner: InMemoryFixtureDataSource,
        attempts: usize,
    }

    impl DataSource for FailingDataSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn load(&self, session_id: &str) -> StoreResult<Option<SessionRecord>> {
            self.inner.load(session_id)
        }

        fn save(&mut self, record: &SessionRecord) -> StoreResult<()> {
            self.attempts += 1;
            Err(StoreError::Api {
                url: format!("test://{}", record.session_id),
                status: 503,
                message: "unavailable".to_string(),
            })
        }
    }

    #[test]
    fn open_missing_session_is_none() {
        let source = InMemoryFixtureDataSource::with_sample_data();
        assert!(SessionEditor::open(&source, "nope").unwrap().is_none());
    }

    #[test]
    fn open_or_create_starts_dirty_and_empty() {
        let source = InMemoryFixtureDataSource::new();
        let editor = SessionEditor::open_or_create(&source, "5", "c1", "Rui").unwrap();
        assert!(editor.is_dirty());
        assert!(editor.ledger().is_empty());
        assert_eq!(editor.record().child_name, "Rui");
    }

    #[test]
    fn edit_save_reload() {
        let mut source = InMemoryFixtureDataSource::with_sample_data();
        let mut editor = SessionEditor::open(&source, "1").unwrap().unwrap();
        assert!(!editor.is_dirty());

        let ledger = editor.ledger_mut();
        let id = ledger.add_target(TargetKind::Event).id.clone();
        ledger.set_interval_count(&id, 55, TallyField::Correct, 3);
        assert!(editor.is_dirty());

        editor.save(&mut source).unwrap();
        assert!(!editor.is_dirty());
        assert!(editor.record().updated_at.is_some());

        let reloaded = SessionEditor::open(&source, "1").unwrap().unwrap();
        assert_eq!(reloaded.ledger(), editor.ledger());
        assert_eq!(reloaded.ledger().len(), 7);
        assert_eq!(reloaded.ledger().target(&id).unwrap().total_correct(), 3);
        assert_eq!(reloaded.record().child_name, "João Silva");
    }

    #[test]
    fn failed_save_leaves_state_unchanged() {
        let mut source = FailingDataSource {
            inner: InMemoryFixtureDataSource::with_sample_data(),
            attempts: 0,
        };
        let mut editor = SessionEditor::open(&source, "1").unwrap().unwrap();
        let id = editor.ledger().targets()[1].id.clone();
        editor
            .ledger_mut()
            .set_interval_count(&id, 5, TallyField::Incorrect, 4);

        let ledger_before = editor.ledger().clone();
        let record_before = editor.record().clone();

        let err = editor.save(&mut source).unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 503, .. }));
        assert_eq!(editor.ledger(), &ledger_before);
        assert_eq!(editor.record(), &record_before);
        assert!(editor.is_dirty());

        // retry sends the same edits, nothing lost or doubled
        assert!(editor.save(&mut source).is_err());
        assert_eq!(source.attempts, 2);
        assert_eq!(editor.ledger(), &ledger_before);
        assert_eq!(
            editor.ledger().target(&id).unwrap().interval(5).unwrap().incorrect_count,
            4
        );
    }
}
