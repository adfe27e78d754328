use std::path::Path;

use tally_store::{
    open_data_source, DataSource, DataSourceKind, SessionEditor, TallyConfig, TallyPaths,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "TALLY_LOG";

/// Install the stderr subscriber. Level comes from `TALLY_LOG`
/// (e.g. `TALLY_LOG=tally_store=debug`), default `warn`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// The data source chosen for this invocation.
pub struct Context {
    source: Box<dyn DataSource>,
}

impl Context {
    /// Read `.tally/config.json`, apply flag overrides, build the source.
    pub fn open(
        repo_root: &Path,
        source: Option<DataSourceKind>,
        api_url: Option<String>,
    ) -> anyhow::Result<Self> {
        let paths = TallyPaths::discover(repo_root);
        let mut config = TallyConfig::load(&paths)?;
        if let Some(kind) = source {
            config.source = kind;
        }
        if let Some(url) = api_url {
            config.api_url = url;
        }
        Ok(Self::with_source(open_data_source(&config, &paths)?))
    }

    pub fn with_source(source: Box<dyn DataSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &dyn DataSource {
        self.source.as_ref()
    }

    /// Open an existing session or fail with a user-facing message.
    pub fn editor(&self, session_id: &str) -> anyhow::Result<SessionEditor> {
        match SessionEditor::open(self.source(), session_id)? {
            Some(editor) => Ok(editor),
            None => anyhow::bail!(
                "no data sheet for session '{session_id}' in {} source. Run `tally new {session_id}` first.",
                self.source.name()
            ),
        }
    }

    pub fn save(&mut self, editor: &mut SessionEditor) -> anyhow::Result<()> {
        editor.save(self.source.as_mut())?;
        if self.source.is_fixture() {
            tracing::warn!("fixture data source: sheet saved under .tally/, not to the clinic API");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cmd_edit, cmd_new};
    use tally_core::TargetKind;

    #[test]
    fn fixture_edits_persist_across_invocations() {
        let tmp = tempfile::tempdir().unwrap();

        let mut ctx = Context::open(tmp.path(), None, None).unwrap();
        assert_eq!(ctx.source().name(), "fixture");
        cmd_new::execute(&mut ctx, "7", "c7", "Bia").unwrap();

        let mut ctx = Context::open(tmp.path(), None, None).unwrap();
        let editor = ctx.editor("7").unwrap();
        assert_eq!(editor.record().child_name, "Bia");
        cmd_edit::add(&mut ctx, "1", TargetKind::Demand).unwrap();

        let ctx = Context::open(tmp.path(), None, None).unwrap();
        let demo = ctx.editor("1").unwrap();
        assert_eq!(demo.ledger().targets_of(TargetKind::Demand).count(), 6);
        assert!(ctx.editor("7").is_ok());
    }

    #[test]
    fn missing_session_names_the_source() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = Context::open(tmp.path(), Some(DataSourceKind::Fixture), None).unwrap();
        let err = ctx.editor("99").unwrap_err().to_string();
        assert!(err.contains("fixture source"));
        assert!(err.contains("tally new 99"));
    }
}
