use std::fmt::{self, Write};

use crate::context::Context;
use tally_core::{TrackedTarget, TrialTallyLedger, MINUTE_MARKS};

/// `tally show <session>`
pub fn execute(ctx: &Context, session_id: &str, json: bool) -> anyhow::Result<String> {
    let editor = ctx.editor(session_id)?;
    if json {
        let mut out = serde_json::to_string_pretty(&editor.snapshot())?;
        out.push('\n');
        return Ok(out);
    }
    let record = editor.record();
    let mut out = String::new();
    writeln!(
        out,
        "Session {} | {} | {} min | source: {}",
        record.session_id,
        if record.child_name.is_empty() { "-" } else { record.child_name.as_str() },
        record.duration_minutes,
        ctx.source().name()
    )?;
    out.push_str(&render_grid(editor.ledger())?);
    if let Some(notes) = editor.ledger().notes() {
        writeln!(out, "Notes: {notes}")?;
    }
    Ok(out)
}

const LABEL_WIDTH: usize = 28;
const CELL_WIDTH: usize = 5;

/// Text grid: one line per row, `correct/incorrect` per interval, `.` for
/// untouched buckets, then the row totals and a session total line.
pub fn render_grid(ledger: &TrialTallyLedger) -> Result<String, fmt::Error> {
    let mut out = String::new();
    if ledger.is_empty() {
        out.push_str("(no rows yet: `tally add <session> demand`)\n");
        return Ok(out);
    }

    write!(out, "{:<LABEL_WIDTH$}", "row")?;
    for m in MINUTE_MARKS {
        write!(out, "{:>CELL_WIDTH$}", format!("{m}'"))?;
    }
    writeln!(out, "{:>6}{:>6}{:>6}{:>6}", "C", "E", "T", "%")?;

    for target in ledger.targets() {
        out.push_str(&render_row(target)?);
    }

    let totals = ledger.session_totals();
    write!(out, "{:<LABEL_WIDTH$}", "Total")?;
    out.push_str(&" ".repeat(CELL_WIDTH * MINUTE_MARKS.len()));
    writeln!(
        out,
        "{:>6}{:>6}{:>6}{:>5}%",
        totals.correct, totals.incorrect, totals.trials, totals.percent
    )?;
    Ok(out)
}

fn render_row(target: &TrackedTarget) -> Result<String, fmt::Error> {
    let mut line = String::new();
    write!(line, "{:<LABEL_WIDTH$}", truncate(&target.label, LABEL_WIDTH - 1))?;
    for bucket in target.intervals() {
        let cell = if bucket.is_empty() {
            ".".to_string()
        } else {
            format!("{}/{}", bucket.correct_count, bucket.incorrect_count)
        };
        write!(line, "{cell:>CELL_WIDTH$}")?;
    }
    writeln!(
        line,
        "{:>6}{:>6}{:>6}{:>5}%  {}",
        target.total_correct(),
        target.total_incorrect(),
        target.total_trials(),
        target.percent_correct(),
        target.id
    )?;
    Ok(line)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('~');
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{TallyField, TargetKind};
    use tally_store::InMemoryFixtureDataSource;

    #[test]
    fn empty_ledger_hint() {
        let ledger = TrialTallyLedger::new("s");
        assert!(render_grid(&ledger).unwrap().contains("no rows yet"));
    }

    #[test]
    fn grid_has_header_rows_and_total() {
        let mut ledger = TrialTallyLedger::new("s");
        let id = ledger.add_target(TargetKind::Demand).id.clone();
        ledger.set_interval_count(&id, 5, TallyField::Correct, 1);
        ledger.set_interval_count(&id, 10, TallyField::Correct, 1);
        ledger.set_interval_count(&id, 15, TallyField::Incorrect, 1);

        let grid = render_grid(&ledger).unwrap();
        let lines: Vec<_> = grid.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("60'"));
        assert!(lines[1].starts_with("Demanda 1°"));
        assert!(lines[1].contains("1/0"));
        assert!(lines[1].contains("0/1"));
        assert!(lines[1].contains("67%"));
        assert!(lines[1].ends_with(&id));
        assert!(lines[2].starts_with("Total"));
        assert!(lines[2].trim_end().ends_with("67%"));
    }

    #[test]
    fn long_labels_are_truncated() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdefgh", 5), "abcd~");
    }

    #[test]
    fn show_fixture_session() {
        let ctx = Context::with_source(Box::new(InMemoryFixtureDataSource::with_sample_data()));
        let out = execute(&ctx, "1", false).unwrap();
        assert!(out.contains("João Silva"));
        assert!(out.contains("Comportamento problema 1°"));
        assert!(out.contains("Notes: Sessão produtiva"));

        let json = execute(&ctx, "1", true).unwrap();
        let val: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(val["sessionId"], "1");
        assert_eq!(val["targets"].as_array().unwrap().len(), 6);
    }
}
