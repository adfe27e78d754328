mod cmd_config;
mod cmd_edit;
mod cmd_new;
mod cmd_show;
mod cmd_stats;
mod context;

use clap::{Parser, Subcommand};
use tally_core::{TallyField, TargetKind};
use tally_store::DataSourceKind;

#[derive(Parser)]
#[command(name = "tally", version, about = "Discrete-trial session data sheets")]
struct Cli {
    /// Data source (overrides `.tally/config.json`)
    #[arg(long, global = true)]
    source: Option<DataSourceKind>,
    /// API base URL for the remote source
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty data sheet for a session
    New {
        /// Session ID
        session: String,
        /// Child ID
        #[arg(long, default_value = "")]
        child_id: String,
        /// Child display name
        #[arg(long, default_value = "")]
        child_name: String,
    },
    /// Show the trial grid of a session
    Show {
        session: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a behavior, demand or event row
    Add {
        session: String,
        /// behavior | demand | event
        kind: TargetKind,
    },
    /// Remove a row (no-op if it does not exist)
    Remove {
        session: String,
        target: String,
    },
    /// Set the correct/incorrect count of one interval
    Set {
        session: String,
        target: String,
        /// Minute mark (5, 10, ... 60)
        minute: u32,
        /// correct | incorrect
        field: TallyField,
        /// New absolute count; negative or non-numeric input is stored as 0
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Rename a row
    Rename {
        session: String,
        target: String,
        label: String,
    },
    /// Set or clear the session notes
    Notes {
        session: String,
        /// Note text; omit to clear
        text: Option<String>,
    },
    /// Session statistics
    Stats {
        session: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Config operations (set, get, list)
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

fn main() -> anyhow::Result<()> {
    context::init_tracing();
    let cli = Cli::parse();
    let repo_root = std::env::current_dir()?;
    let open = || context::Context::open(&repo_root, cli.source, cli.api_url.clone());

    let out = match cli.cmd {
        Command::New {
            session,
            child_id,
            child_name,
        } => cmd_new::execute(&mut open()?, &session, &child_id, &child_name)?,
        Command::Show { session, json } => cmd_show::execute(&open()?, &session, json)?,
        Command::Add { session, kind } => cmd_edit::add(&mut open()?, &session, kind)?,
        Command::Remove { session, target } => cmd_edit::remove(&mut open()?, &session, &target)?,
        Command::Set {
            session,
            target,
            minute,
            field,
            value,
        } => cmd_edit::set(&mut open()?, &session, &target, minute, field, &value)?,
        Command::Rename {
            session,
            target,
            label,
        } => cmd_edit::rename(&mut open()?, &session, &target, &label)?,
        Command::Notes { session, text } => cmd_edit::notes(&mut open()?, &session, text)?,
        Command::Stats { session, json } => cmd_stats::execute(&open()?, &session, json)?,
        Command::Config { cmd } => return cmd_config::run(cmd, &repo_root),
    };
    print!("{out}");
    Ok(())
}
