use crate::config::{DataSourceKind, TallyConfig};
use crate::error::StoreResult;
use crate::fixture::FileFixtureDataSource;
use crate::paths::TallyPaths;
use crate::record::SessionRecord;
use crate::remote::RemoteDataSource;

/// Where session records are loaded from and saved to.
///
/// Chosen once by the caller; nothing downstream switches sources when a call
/// fails.
pub trait DataSource {
    /// Short name for logs and status output.
    fn name(&self) -> &'static str;

    /// Fetch the record for `session_id`, or `None` if the source has none.
    fn load(&self, session_id: &str) -> StoreResult<Option<SessionRecord>>;

    /// Persist `record`, replacing any previous version.
    fn save(&mut self, record: &SessionRecord) -> StoreResult<()>;

    /// Whether this source serves local demo data instead of clinic records.
    fn is_fixture(&self) -> bool {
        false
    }
}

/// Build the data source selected by `config`. The fixture lives under `paths`.
pub fn open_data_source(
    config: &TallyConfig,
    paths: &TallyPaths,
) -> StoreResult<Box<dyn DataSource>> {
    let source: Box<dyn DataSource> = match config.source {
        DataSourceKind::Fixture => Box::new(FileFixtureDataSource::open(paths)?),
        DataSourceKind::Remote => Box::new(RemoteDataSource::from_config(config)?),
    };
    tracing::info!(source = source.name(), "data source selected");
    Ok(source)
}
