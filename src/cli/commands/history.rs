//! `selfheal history`: list the checkpoints of a past run.

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Cell;
use serde::Serialize;

use crate::adapters::JsonlCheckpointStore;
use crate::cli::commands::run::parse_session_id;
use crate::cli::display::{colorize_stage, list_table, output, render_list, CommandOutput};
use crate::domain::models::config::Config;
use crate::domain::models::snapshot::StateSnapshot;
use crate::domain::ports::CheckpointStore;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Session id printed by `selfheal run`
    #[arg(value_parser = parse_session_id)]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryOutput {
    pub session_id: String,
    pub snapshots: Vec<StateSnapshot>,
}

impl CommandOutput for HistoryOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["step", "completed", "next", "iteration", "recorded"]);
        for snapshot in &self.snapshots {
            table.add_row(vec![
                Cell::new(snapshot.step),
                Cell::new(snapshot.completed.name()),
                Cell::new(colorize_stage(&snapshot.next.to_string())),
                Cell::new(snapshot.state.iteration_count),
                Cell::new(snapshot.recorded_at.format("%Y-%m-%d %H:%M:%S")),
            ]);
        }
        render_list("snapshot", &table, self.snapshots.len())
    }
}

pub async fn execute(args: HistoryArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = JsonlCheckpointStore::new(&config.checkpoints.dir);
    let snapshots = store
        .load(&args.session_id)
        .await
        .with_context(|| format!("Failed to load history for {}", args.session_id))?;

    output(
        &HistoryOutput {
            session_id: args.session_id,
            snapshots,
        },
        json_mode,
    );
    Ok(())
}
