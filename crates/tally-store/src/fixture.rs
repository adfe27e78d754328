use std::collections::HashMap;
use std::path::PathBuf;

use tally_core::{TargetKind, TimeInterval, TrackedTarget, MINUTE_MARKS};

use crate::error::StoreResult;
use crate::paths::{write_atomic, TallyPaths};
use crate::record::SessionRecord;
use crate::source::DataSource;

/// Offline data source holding records in memory.
///
/// Used for tests and as the working set of [`FileFixtureDataSource`].
/// Saves never fail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFixtureDataSource {
    records: HashMap<String, SessionRecord>,
}

impl InMemoryFixtureDataSource {
    /// Empty fixture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixture seeded with the demo session `"1"`.
    pub fn with_sample_data() -> Self {
        let mut source = Self::new();
        let sample = sample_session();
        source.records.insert(sample.session_id.clone(), sample);
        source
    }

    pub fn insert(&mut self, record: SessionRecord) {
        self.records.insert(record.session_id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by session id.
    fn sorted(&self) -> Vec<&SessionRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        records
    }
}

impl DataSource for InMemoryFixtureDataSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn load(&self, session_id: &str) -> StoreResult<Option<SessionRecord>> {
        Ok(self.records.get(session_id).cloned())
    }

    fn save(&mut self, record: &SessionRecord) -> StoreResult<()> {
        tracing::debug!(session_id = %record.session_id, "fixture save");
        self.records
            .insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    fn is_fixture(&self) -> bool {
        true
    }
}

/// Demo data source persisted to `.tally/fixture.json`.
///
/// The file is a JSON array of session records. Until the first save it does
/// not exist and the source serves the demo session `"1"`.
#[derive(Debug)]
pub struct FileFixtureDataSource {
    path: PathBuf,
    records: InMemoryFixtureDataSource,
}

impl FileFixtureDataSource {
    pub fn open(paths: &TallyPaths) -> StoreResult<Self> {
        let path = paths.fixture_json.clone();
        let records = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let stored: Vec<SessionRecord> = serde_json::from_str(&content)?;
                let mut records = InMemoryFixtureDataSource::new();
                for record in stored {
                    records.insert(record);
                }
                records
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                InMemoryFixtureDataSource::with_sample_data()
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), sessions = records.len(), "fixture opened");
        Ok(Self { path, records })
    }
}

impl DataSource for FileFixtureDataSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn load(&self, session_id: &str) -> StoreResult<Option<SessionRecord>> {
        self.records.load(session_id)
    }

    /// Writes the whole file; the in-memory set only changes once it is on disk.
    fn save(&mut self, record: &SessionRecord) -> StoreResult<()> {
        let mut next = self.records.clone();
        next.insert(record.clone());
        let json = serde_json::to_string_pretty(&next.sorted())?;
        write_atomic(&self.path, json.as_bytes())?;
        tracing::debug!(session_id = %record.session_id, path = %self.path.display(), "fixture save");
        self.records = next;
        Ok(())
    }

    fn is_fixture(&self) -> bool {
        true
    }
}

// (correct, incorrect) per minute mark, in MINUTE_MARKS order.
type Sheet = [(u32, u32); 12];

fn sheet_row(id: &str, kind: TargetKind, order: u32, sheet: Sheet) -> TrackedTarget {
    let intervals = MINUTE_MARKS
        .iter()
        .zip(sheet)
        .map(|(&minute_mark, (correct_count, incorrect_count))| TimeInterval {
            minute_mark,
            correct_count,
            incorrect_count,
        })
        .collect();
    let label = format!("{} {order}°", kind.display_name());
    TrackedTarget::with_intervals(id, kind, label, order, intervals)
}

fn sample_session() -> SessionRecord {
    const O: (u32, u32) = (0, 0);
    const C: (u32, u32) = (1, 0);
    const E: (u32, u32) = (0, 1);

    let targets = vec![
        sheet_row(
            "behavior-1",
            TargetKind::Behavior,
            1,
            [O, O, O, O, O, O, (2, 0), O, O, O, O, O],
        ),
        sheet_row("demand-1", TargetKind::Demand, 1, [O, C, O, O, O, C, O, O, O, C, O, O]),
        sheet_row("demand-2", TargetKind::Demand, 2, [C, C, O, C, O, O, O, O, O, O, O, O]),
        sheet_row("demand-3", TargetKind::Demand, 3, [C, C, O, C, C, C, C, O, O, O, O, O]),
        sheet_row("demand-4", TargetKind::Demand, 4, [O, O, O, O, E, O, C, O, O, O, O, O]),
        sheet_row("demand-5", TargetKind::Demand, 5, [O, O, O, O, O, O, O, C, C, C, O, C]),
    ];

    SessionRecord {
        session_id: "1".to_string(),
        child_id: "1".to_string(),
        child_name: "João Silva".to_string(),
        date: "2024-03-15T10:00:00Z".to_string(),
        duration_minutes: 60,
        targets,
        notes: Some("Sessão produtiva, criança respondeu bem aos estímulos.".to_string()),
        created_at: "2024-03-15T10:00:00Z".to_string(),
        updated_at: Some("2024-03-15T11:00:00Z".to_string()),
    }
}
