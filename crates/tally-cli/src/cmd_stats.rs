use std::fmt::Write;

use crate::context::Context;
use tally_core::{TallyTotals, TargetKind};

/// `tally stats <session>`: session totals over every row, plus demand-only
/// and behavior-only summaries.
pub fn execute(ctx: &Context, session_id: &str, json: bool) -> anyhow::Result<String> {
    let editor = ctx.editor(session_id)?;
    let ledger = editor.ledger();
    let stats = ledger.statistics();
    let demands = ledger.totals_by_kind(TargetKind::Demand);
    let behaviors = ledger.totals_by_kind(TargetKind::Behavior);
    let events = ledger.totals_by_kind(TargetKind::Event);

    if json {
        let rows: Vec<_> = ledger
            .targets()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "kind": t.kind,
                    "label": t.label,
                    "totals": t.totals(),
                })
            })
            .collect();
        let val = serde_json::json!({
            "sessionId": ledger.session_id(),
            "statistics": stats,
            "byKind": {
                "demand": demands,
                "behavior": behaviors,
                "event": events,
            },
            "rows": rows,
        });
        return Ok(format!("{}\n", serde_json::to_string_pretty(&val)?));
    }

    let mut out = String::new();
    writeln!(out, "Session {}", ledger.session_id())?;
    writeln!(out, "  {}", summary_line("All rows", stats.totals))?;
    writeln!(out, "  {}", summary_line("Demands", demands))?;
    writeln!(out, "  {}", summary_line("Problem behaviors", behaviors))?;
    writeln!(out, "  {}", summary_line("Events", events))?;
    writeln!(
        out,
        "  Rows: {} demands, {} problem behaviors, {} total",
        stats.demand_count,
        stats.behavior_count,
        ledger.len()
    )?;
    Ok(out)
}

fn summary_line(name: &str, totals: TallyTotals) -> String {
    format!(
        "{name:<18} {:>4} correct {:>4} incorrect {:>4} trials {:>4}%",
        totals.correct, totals.incorrect, totals.trials, totals.percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_store::InMemoryFixtureDataSource;

    fn ctx() -> Context {
        Context::with_source(Box::new(InMemoryFixtureDataSource::with_sample_data()))
    }

    #[test]
    fn text_stats_for_fixture() {
        let out = execute(&ctx(), "1", false).unwrap();
        assert!(out.contains("Rows: 5 demands, 1 problem behaviors, 6 total"));
        let all = out.lines().find(|l| l.contains("All rows")).unwrap();
        assert!(all.contains("19 correct"));
        assert!(all.trim_end().ends_with("95%"));
        let demands = out.lines().find(|l| l.contains("Demands")).unwrap();
        assert!(demands.contains("17 correct"));
    }

    #[test]
    fn json_stats_sum_across_kinds() {
        let out = execute(&ctx(), "1", true).unwrap();
        let val: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(val["statistics"]["totals"]["correct"], 19);
        assert_eq!(val["statistics"]["demandCount"], 5);
        assert_eq!(val["byKind"]["behavior"]["correct"], 2);
        assert_eq!(val["byKind"]["event"]["trials"], 0);
        assert_eq!(val["rows"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn unknown_session_is_an_error() {
        assert!(execute(&ctx(), "missing", false).is_err());
    }
}
