//! Line-oriented interactive play.
//!
//! The engine never loops on bad input; this front end owns the re-prompt.
//! Rejections and unknown ids print a reason and ask again without
//! consuming a turn.

use anyhow::{Context, Result};
use colored::Colorize;
use orrery_engine::{
    Engine, EngineError, Fact, GameSession, RejectReason, SessionStatus, SessionStore, TurnOutcome,
};
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::seeds::SeedInfo;
use crate::store::FileStore;

pub fn run(engine: &Engine, info: &SeedInfo, save_dir: &Path, verbose: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let store = FileStore::new(save_dir.to_path_buf());
    let mut session = engine.create_session(info.seed);

    print_banner(engine, info);
    loop {
        print_status(&session);
        print_actions(engine, &session);
        print!("{} ", ">".bright_white());
        io::stdout().flush().context("flush prompt")?;

        let Some(line) = lines.next() else {
            println!("\nInput closed; abandoning session.");
            return Ok(());
        };
        let line = line.context("read command")?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match parse_command(input) {
            Command::Quit => {
                println!("Session abandoned at turn {}.", session.turn());
                return Ok(());
            }
            Command::Help => print_help(),
            Command::Status => println!(
                "{}",
                serde_json::to_string_pretty(&session.status_view()).context("render status")?
            ),
            Command::Save(name) => match store.save(&name, &session.snapshot()) {
                Ok(()) => println!("Saved as {}.", name.bright_white()),
                Err(err) => println!("{} {err}", "Save failed:".red()),
            },
            Command::Load(name) => match store.load(&name) {
                Ok(Some(snapshot)) => {
                    session = engine.resume_session(snapshot);
                    println!("Loaded {} at turn {}.", name.bright_white(), session.turn());
                }
                Ok(None) => println!("No save named {name}."),
                Err(err) => println!("{} {err}", "Load failed:".red()),
            },
            Command::Action(id) => {
                if submit_action(engine, &mut session, &id, verbose) {
                    return Ok(());
                }
            }
        }
    }
}

enum Command {
    Action(String),
    Status,
    Save(String),
    Load(String),
    Help,
    Quit,
}

fn parse_command(input: &str) -> Command {
    let (head, rest) = input
        .split_once(char::is_whitespace)
        .map_or((input, ""), |(head, rest)| (head, rest.trim()));
    match head {
        "quit" | "exit" => Command::Quit,
        "help" | "?" => Command::Help,
        "status" => Command::Status,
        "save" if !rest.is_empty() => Command::Save(rest.to_string()),
        "load" if !rest.is_empty() => Command::Load(rest.to_string()),
        _ => Command::Action(input.to_string()),
    }
}

/// Submit one action id. Returns true when the session ended.
fn submit_action(engine: &Engine, session: &mut GameSession, id: &str, verbose: bool) -> bool {
    match engine.submit(session, id) {
        Ok(report) => {
            match &report.outcome {
                TurnOutcome::Accepted { trace, facts, .. } => {
                    for fact in facts {
                        println!("  {}", render_fact(engine, fact));
                    }
                    if verbose && let Some(trace) = trace {
                        println!(
                            "  {} roll {:.3} in `{}` -> {}",
                            "trace:".dimmed(),
                            trace.roll,
                            trace.table,
                            trace.chosen
                        );
                    }
                }
                TurnOutcome::Rejected { reason } => {
                    println!("  {}", render_rejection(reason).yellow());
                }
            }
            if report.status.is_over() {
                print_ending(engine, session);
                return true;
            }
            false
        }
        Err(EngineError::UnknownAction(id)) => {
            println!(
                "  {}",
                format!("No such action `{id}`; type `help` for commands.").yellow()
            );
            false
        }
        Err(err) => {
            println!("  {}", err.to_string().red());
            true
        }
    }
}

fn print_banner(engine: &Engine, info: &SeedInfo) {
    let meta = &engine.config().meta;
    println!();
    println!("{}", meta.name.bold().bright_white());
    if !meta.desc.is_empty() {
        println!("{}", meta.desc.dimmed());
    }
    println!("Seed code: {}", info.share_code().bright_white());
    println!("Type `help` for commands.");
}

fn print_status(session: &GameSession) {
    let resources = session
        .ledger()
        .slots()
        .iter()
        .map(|slot| match slot.max {
            Some(max) => format!("{} {}/{max}", slot.name, slot.value),
            None => format!("{} {}", slot.name, slot.value),
        })
        .collect::<Vec<_>>()
        .join(" | ");
    println!();
    println!("{} | {resources}", format!("Turn {}", session.turn()).bold());
}

fn print_actions(engine: &Engine, session: &GameSession) {
    let available = engine.available_actions(session);
    for id in &available {
        if let Some(action) = engine.config().actions.get(id) {
            let costs = action
                .cost
                .iter()
                .map(|(resource, amount)| format!("{resource} {amount}"))
                .collect::<Vec<_>>()
                .join(", ");
            if costs.is_empty() {
                println!("  {} - {}", id.bright_white(), action.display_label());
            } else {
                println!(
                    "  {} - {} (costs {})",
                    id.bright_white(),
                    action.display_label(),
                    costs
                );
            }
        }
    }
}

fn print_ending(engine: &Engine, session: &GameSession) {
    let verdict = match session.status() {
        SessionStatus::Won => "You won!".green().bold(),
        SessionStatus::Lost => "You lost.".red().bold(),
        SessionStatus::Running => "Still running?".yellow(),
    };
    let desc = session
        .ended_by()
        .and_then(|rule_id| {
            engine
                .config()
                .rules
                .iter()
                .find(|rule| rule.id == rule_id)
        })
        .map(|rule| rule.desc.clone())
        .unwrap_or_default();
    println!();
    println!(
        "{verdict} {} (turn {})",
        desc.dimmed(),
        session.turn()
    );
}

fn print_help() {
    println!("  <action-id>   submit an action for this turn");
    println!("  status        full session status as JSON");
    println!("  save <name>   snapshot the session to disk");
    println!("  load <name>   resume a saved snapshot");
    println!("  quit          abandon the session");
}

fn render_rejection(reason: &RejectReason) -> String {
    match reason {
        RejectReason::RequirementFailed {
            resource,
            cmp,
            threshold,
            actual,
        } => format!("Needs {resource} {cmp} {threshold} (currently {actual}). Turn not used."),
        RejectReason::InsufficientResource {
            resource,
            needed,
            available,
        } => format!("Not enough {resource}: need {needed}, have {available}. Turn not used."),
    }
}

fn render_fact(engine: &Engine, fact: &Fact) -> String {
    match fact {
        Fact::ActionResolved { action } => {
            let label = engine
                .config()
                .actions
                .get(action)
                .map_or(action.as_str(), |def| def.display_label());
            label.to_string()
        }
        Fact::ResourceChanged {
            resource,
            delta,
            value,
        } => {
            let signed = if *delta >= 0 {
                format!("+{delta}").green()
            } else {
                delta.to_string().red()
            };
            format!("{resource} {signed} (now {value})")
        }
        Fact::ResourceClamped { resource, edge, .. } => match edge {
            orrery_engine::ClampEdge::Floor => format!("{resource} depleted").yellow().to_string(),
            orrery_engine::ClampEdge::Ceiling => format!("{resource} full").yellow().to_string(),
        },
        Fact::EventStruck { event, table } => {
            let desc = engine
                .config()
                .event_tables
                .get(table)
                .and_then(|t| t.events.iter().find(|e| e.id == *event))
                .map(|e| e.desc.clone())
                .unwrap_or_default();
            if desc.is_empty() {
                format!("Event: {event}").cyan().to_string()
            } else {
                desc.cyan().to_string()
            }
        }
        Fact::Note { text } => text.clone(),
        Fact::SessionEnded { status, rule } => format!("{status:?} ({rule})"),
    }
}
