use anyhow::Result;
use mindlog_core::store::EventPatch;
use mindlog_core::timeline::EventKind;
use owo_colors::OwoColorize;

use super::Session;

pub fn run(session: &mut Session, id: &str, undo: bool) -> Result<()> {
    let event = session.store.resolve(id)?;
    if event.kind == EventKind::Diary {
        anyhow::bail!("Diary entries cannot be completed");
    }
    let id = event.id.clone();

    let updated = session.store.update(
        &id,
        EventPatch {
            is_completed: Some(!undo),
            ..Default::default()
        },
    )?;
    session.refresh_reminder(&id)?;

    if undo {
        println!("{}", format!("  Reopened: {}", updated.title).yellow());
    } else {
        println!("{}", format!("  Done: {}", updated.title).green());
    }
    Ok(())
}
