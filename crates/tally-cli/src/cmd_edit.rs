use crate::context::Context;
use tally_core::{TallyField, TargetKind, MINUTE_MARKS};

/// `tally add <session> <kind>`
pub fn add(ctx: &mut Context, session_id: &str, kind: TargetKind) -> anyhow::Result<String> {
    let mut editor = ctx.editor(session_id)?;
    let target = editor.ledger_mut().add_target(kind);
    let out = format!("{} {}\n", target.id, target.label);
    ctx.save(&mut editor)?;
    Ok(out)
}

/// `tally remove <session> <target>`; removing an absent row is not an error.
pub fn remove(ctx: &mut Context, session_id: &str, target_id: &str) -> anyhow::Result<String> {
    let mut editor = ctx.editor(session_id)?;
    if !editor.ledger_mut().remove_target(target_id) {
        return Ok(format!("{target_id} not present, nothing to remove\n"));
    }
    ctx.save(&mut editor)?;
    Ok(format!("Removed {target_id}\n"))
}

/// `tally set <session> <target> <minute> <field> <value>`
pub fn set(
    ctx: &mut Context,
    session_id: &str,
    target_id: &str,
    minute: u32,
    field: TallyField,
    raw_value: &str,
) -> anyhow::Result<String> {
    let mut editor = ctx.editor(session_id)?;
    if editor.ledger().target(target_id).is_none() {
        anyhow::bail!("no row '{target_id}' in session {session_id}");
    }
    if !editor
        .ledger_mut()
        .set_interval_text(target_id, minute, field, raw_value)
    {
        tracing::warn!(minute, "not a canonical minute mark, nothing changed");
        return Ok(format!(
            "No interval at minute {minute} (expected one of {MINUTE_MARKS:?})\n"
        ));
    }
    ctx.save(&mut editor)?;

    let ledger = editor.ledger();
    let Some(target) = ledger.target(target_id) else {
        anyhow::bail!("row '{target_id}' vanished during save");
    };
    let bucket = target.interval(minute).map(|b| b.get(field)).unwrap_or(0);
    Ok(format!(
        "{} @ {minute}' {} = {bucket} -> {}/{} ({}%)\n",
        target.label,
        field_name(field),
        target.total_correct(),
        target.total_trials(),
        target.percent_correct()
    ))
}

/// `tally rename <session> <target> <label>`
pub fn rename(
    ctx: &mut Context,
    session_id: &str,
    target_id: &str,
    label: &str,
) -> anyhow::Result<String> {
    let label = label.trim();
    if label.is_empty() {
        anyhow::bail!("label must not be empty");
    }
    let mut editor = ctx.editor(session_id)?;
    if !editor.ledger_mut().rename_target(target_id, label) {
        anyhow::bail!("no row '{target_id}' in session {session_id}");
    }
    ctx.save(&mut editor)?;
    Ok(format!("{target_id} is now \"{label}\"\n"))
}

/// `tally notes <session> [text]`
pub fn notes(ctx: &mut Context, session_id: &str, text: Option<String>) -> anyhow::Result<String> {
    let mut editor = ctx.editor(session_id)?;
    editor.ledger_mut().set_notes(text);
    ctx.save(&mut editor)?;
    Ok(match editor.ledger().notes() {
        Some(n) => format!("Notes: {n}\n"),
        None => "Notes cleared\n".to_string(),
    })
}

pub(crate) fn field_name(field: TallyField) -> &'static str {
    match field {
        TallyField::Correct => "correct",
        TallyField::Incorrect => "incorrect",
    }
}
