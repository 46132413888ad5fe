//! Event command implementations.

use crate::cli::{EventArgs, EventCommands, ListArgs};
use crate::config::DatabaseSettings;
use crate::error::Result;
use crate::model::{Event, EventFilter};
use crate::storage::{open_storage, EventStorage};
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct CreateOutput {
    id: i64,
}

#[derive(Serialize)]
struct MutationOutput<'a> {
    id: i64,
    action: &'a str,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    events: &'a [Event],
    count: usize,
}

/// Execute event commands against the configured backend.
///
/// The store is closed after the command, also when the command fails.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the operation fails.
pub fn execute(command: &EventCommands, settings: &DatabaseSettings, json: bool) -> Result<()> {
    let storage = open_storage(settings)?;
    let result = run(command, storage.as_ref(), json);
    let closed = storage.close();
    result.and(closed)
}

fn run(command: &EventCommands, storage: &dyn EventStorage, json: bool) -> Result<()> {
    match command {
        EventCommands::Create(args) => create(args, storage, json),
        EventCommands::Get { id } => get(*id, storage, json),
        EventCommands::Update { id, event } => update(*id, event, storage, json),
        EventCommands::Delete { id } => delete(*id, storage, json),
        EventCommands::List(args) => list(args, storage, json),
    }
}

fn event_from_args(args: &EventArgs) -> Event {
    Event::new(args.title.clone(), args.start, args.end, args.user)
        .with_description(args.description.clone())
        .with_notify_period(args.notify.unwrap_or_default())
}

fn create(args: &EventArgs, storage: &dyn EventStorage, json: bool) -> Result<()> {
    let mut event = event_from_args(args);
    let id = storage.create_event(&mut event)?;

    if json {
        println!("{}", serde_json::to_string(&CreateOutput { id })?);
    } else {
        println!("{id}");
    }
    Ok(())
}

fn get(id: i64, storage: &dyn EventStorage, json: bool) -> Result<()> {
    let event = storage.get_event(id)?;

    if json {
        println!("{}", serde_json::to_string(&event)?);
    } else {
        print_event(&event);
    }
    Ok(())
}

fn update(id: i64, args: &EventArgs, storage: &dyn EventStorage, json: bool) -> Result<()> {
    let mut event = event_from_args(args);
    event.id = id;
    storage.update_event(&event)?;

    if json {
        let output = MutationOutput {
            id,
            action: "updated",
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Updated event {id}");
    }
    Ok(())
}

fn delete(id: i64, storage: &dyn EventStorage, json: bool) -> Result<()> {
    storage.delete_event(id)?;

    if json {
        let output = MutationOutput {
            id,
            action: "deleted",
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Deleted event {id}");
    }
    Ok(())
}

fn list(args: &ListArgs, storage: &dyn EventStorage, json: bool) -> Result<()> {
    let filter = EventFilter {
        user_id: args.user,
        date_from: args.from,
        date_to: args.to,
    };
    let events = storage.get_events(&filter)?;

    if json {
        let output = ListOutput {
            events: &events,
            count: events.len(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No events found.");
        return Ok(());
    }

    println!("{} ({})", "Events".cyan().bold(), events.len());
    for event in &events {
        println!(
            "  {}  {}  {}  user={}",
            event.start_time.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            event.id.to_string().yellow(),
            event.title,
            event.user_id
        );
    }
    Ok(())
}

fn print_event(event: &Event) {
    println!("{} {}", event.id.to_string().yellow(), event.title.bold());
    println!("  start:  {}", event.start_time.to_rfc3339());
    println!("  end:    {}", event.end_time.to_rfc3339());
    println!("  user:   {}", event.user_id);
    if let Some(at) = event.notify_at() {
        println!(
            "  notify: {} before ({})",
            humantime::format_duration(event.notify_period),
            at.to_rfc3339()
        );
    }
    if !event.description.is_empty() {
        println!("  {}", event.description);
    }
}
