use std::path::PathBuf;

use anyhow::Result;
use mindlog_core::export::{DirectorySink, cleanup_exported_files, export_events};
use owo_colors::OwoColorize;

use super::Session;
use crate::render::Render;

pub fn run(session: &Session, output: Option<PathBuf>, clean: bool) -> Result<()> {
    let dir = output.unwrap_or_else(|| session.config.export_path());

    if clean {
        let removed = cleanup_exported_files(&dir)?;
        if removed > 0 {
            println!("{}", format!("  Removed {} old export(s)", removed).dimmed());
        }
    }

    let sink = DirectorySink::new(dir);
    let today = chrono::Local::now().date_naive();
    let result = export_events(session.store.snapshot(), &sink, today);

    println!("{}", result.render());
    if !result.success {
        anyhow::bail!("{}", result.message);
    }
    Ok(())
}
