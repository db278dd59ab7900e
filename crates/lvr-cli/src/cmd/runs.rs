//! `lvr runs`: list recent projection runs from the store.

use crate::output::{OutputMode, pretty_rule, render};
use chrono::Local;
use clap::Args;
use lvr_core::Store;
use lvr_core::config::ServiceConfig;
use lvr_core::model::activity::ProjectionRun;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunsArgs {
    /// Maximum rows to show (1-1000).
    #[arg(long)]
    pub limit: Option<i64>,

    /// SQLite database file.
    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub fn run_runs(args: &RunsArgs, config: &ServiceConfig, output: OutputMode) -> anyhow::Result<()> {
    let db_path = args.db.as_ref().unwrap_or(&config.storage.db_path);
    let store = Store::open(db_path)?;
    let runs = store.list_runs(args.limit)?;
    render(output, &runs, |runs, w| render_human(runs, w))
}

fn render_human(runs: &[ProjectionRun], w: &mut dyn Write) -> io::Result<()> {
    if runs.is_empty() {
        return writeln!(w, "no projection runs recorded");
    }
    writeln!(w, "{:<19}  {:<6}  {:<20}  {:<24}  ACTOR", "WHEN", "ACTION", "OWNER", "SLUG")?;
    pretty_rule(w)?;
    for entry in runs {
        let run = &entry.run;
        let when = entry.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
        let actor = run
            .actor_name
            .as_deref()
            .or(run.actor_email.as_deref())
            .unwrap_or("-");
        writeln!(
            w,
            "{when:<19}  {:<6}  {:<20}  {:<24}  {actor}",
            run.action.as_str(),
            run.owner_slug,
            run.slug
        )?;
    }
    Ok(())
}
