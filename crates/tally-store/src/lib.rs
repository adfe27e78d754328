pub mod config;
pub mod editor;
pub mod error;
pub mod fixture;
pub mod paths;
pub mod record;
pub mod remote;
pub mod source;

pub use config::{DataSourceKind, TallyConfig};
pub use editor::SessionEditor;
pub use error::{StoreError, StoreResult};
pub use fixture::{FileFixtureDataSource, InMemoryFixtureDataSource};
pub use paths::TallyPaths;
pub use record::SessionRecord;
pub use remote::RemoteDataSource;
pub use source::{open_data_source, DataSource};
