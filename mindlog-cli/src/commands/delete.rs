use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use super::Session;

pub fn run(session: &mut Session, id: &str, yes: bool) -> Result<()> {
    let event = session.store.resolve(id)?;
    let (id, title) = (event.id.clone(), event.title.clone());

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("  Delete \"{}\"?", title))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "  Kept".dimmed());
            return Ok(());
        }
    }

    session.store.delete(&id, &mut session.reminders)?;
    println!("{}", format!("  Deleted: {}", title).red());
    Ok(())
}
