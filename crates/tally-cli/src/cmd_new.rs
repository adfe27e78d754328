use crate::context::Context;
use tally_store::SessionEditor;

/// `tally new <session>`: create and save an empty data sheet.
/// An existing sheet is left untouched.
pub fn execute(
    ctx: &mut Context,
    session_id: &str,
    child_id: &str,
    child_name: &str,
) -> anyhow::Result<String> {
    let mut editor = SessionEditor::open_or_create(ctx.source(), session_id, child_id, child_name)?;
    if !editor.is_dirty() {
        return Ok(format!(
            "Session {session_id} already has a data sheet ({} rows)\n",
            editor.ledger().len()
        ));
    }
    ctx.save(&mut editor)?;
    Ok(format!("Created data sheet for session {session_id}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_store::InMemoryFixtureDataSource;

    #[test]
    fn creates_once() {
        let mut ctx = Context::with_source(Box::new(InMemoryFixtureDataSource::new()));
        let out = execute(&mut ctx, "7", "c7", "Bia").unwrap();
        assert!(out.starts_with("Created"));
        let editor = ctx.editor("7").unwrap();
        assert_eq!(editor.record().child_name, "Bia");
        assert!(editor.ledger().is_empty());

        let again = execute(&mut ctx, "7", "other", "Other").unwrap();
        assert!(again.contains("already has a data sheet"));
        assert_eq!(ctx.editor("7").unwrap().record().child_name, "Bia");
    }

    #[test]
    fn existing_fixture_session_is_kept() {
        let mut ctx = Context::with_source(Box::new(InMemoryFixtureDataSource::with_sample_data()));
        let out = execute(&mut ctx, "1", "", "").unwrap();
        assert!(out.contains("6 rows"));
    }
}
