//! Scripted autoplay: bot strategies driving full sessions across seeds.

use anyhow::{Result, bail};
use clap::ValueEnum;
use colored::Colorize;
use log::debug;
use orrery_engine::numbers::{round_f64_to_i64, u64_to_f64, usize_to_f64};
use orrery_engine::{Engine, GameSession, SessionStatus};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::seeds::SeedInfo;

/// How the bot picks among the currently available actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BotStrategy {
    /// Uniform pick from the available list, seeded per session.
    Random,
    /// Always the first available action in declaration order.
    First,
    /// Rotate through the available list by turn number.
    RoundRobin,
}

impl BotStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::First => "first",
            Self::RoundRobin => "round-robin",
        }
    }
}

/// Why a session stopped short of a win or loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// Hit the harness turn cap while still running.
    TurnCap,
    /// No action was available while still running.
    Stalemate,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub seed: u64,
    pub code: String,
    pub iteration: usize,
    pub turns: u32,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted: Option<HaltReason>,
    pub final_resources: Vec<(String, i64)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoplayReport {
    pub game: String,
    pub strategy: &'static str,
    pub sessions: Vec<SessionSummary>,
    pub wins: usize,
    pub losses: usize,
    pub halted: usize,
    pub win_rate_pct: i64,
    pub average_turns: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub determinism_ok: Option<bool>,
}

pub struct AutoplayPlan {
    pub strategy: BotStrategy,
    pub iterations: usize,
    pub max_turns: u32,
    pub check_determinism: bool,
    pub verbose: bool,
}

/// Run the full seed x iteration grid and aggregate the outcomes.
///
/// # Errors
///
/// Fails when the determinism check finds a divergent replay.
pub fn run(
    engine: &Engine,
    game: &str,
    seeds: &[SeedInfo],
    plan: &AutoplayPlan,
    report_format: &str,
) -> Result<()> {
    let mut sessions = Vec::new();
    let mut divergent: Vec<String> = Vec::new();

    for info in seeds {
        for iteration in 0..plan.iterations {
            let iteration_seed = info.seed.wrapping_add(iteration as u64);
            let (summary, session) = play_session(engine, iteration_seed, plan, info, iteration);

            if plan.check_determinism {
                let (_, replay) = play_session(engine, iteration_seed, plan, info, iteration);
                if replay.snapshot() != session.snapshot() {
                    divergent.push(format!(
                        "seed {iteration_seed} (iteration {iteration}) diverged on replay"
                    ));
                }
            }

            if plan.verbose {
                println!(
                    "  seed {} iter {} -> {:?} after {} turns",
                    summary.seed, summary.iteration, summary.status, summary.turns
                );
            }
            sessions.push(summary);
        }
    }

    let report = aggregate(engine, game, plan, sessions, &divergent);
    match report_format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => render_console(&report),
    }

    if !divergent.is_empty() {
        for line in &divergent {
            eprintln!("{}", line.red());
        }
        bail!("determinism check failed for {} session(s)", divergent.len());
    }
    Ok(())
}

fn aggregate(
    engine: &Engine,
    game: &str,
    plan: &AutoplayPlan,
    sessions: Vec<SessionSummary>,
    divergent: &[String],
) -> AutoplayReport {
    let wins = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Won)
        .count();
    let losses = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Lost)
        .count();
    let halted = sessions.len() - wins - losses;
    let total_turns: u64 = sessions.iter().map(|s| u64::from(s.turns)).sum();
    let (average_turns, win_rate_pct) = if sessions.is_empty() {
        (0.0, 0)
    } else {
        let count = usize_to_f64(sessions.len());
        (
            u64_to_f64(total_turns) / count,
            round_f64_to_i64(usize_to_f64(wins) * 100.0 / count),
        )
    };
    let name = if engine.config().meta.name.is_empty() {
        game.to_string()
    } else {
        engine.config().meta.name.clone()
    };
    AutoplayReport {
        game: name,
        strategy: plan.strategy.label(),
        sessions,
        wins,
        losses,
        halted,
        win_rate_pct,
        average_turns,
        determinism_ok: plan.check_determinism.then_some(divergent.is_empty()),
    }
}

/// Drive one session to completion or the turn cap.
fn play_session(
    engine: &Engine,
    seed: u64,
    plan: &AutoplayPlan,
    info: &SeedInfo,
    iteration: usize,
) -> (SessionSummary, GameSession) {
    let mut session = engine.create_session(seed);
    // Bot choices draw from their own stream so they never touch the
    // session's engine streams.
    let mut picker = ChaCha8Rng::seed_from_u64(seed ^ 0x0BB0_7C01);
    let mut halted = None;

    while session.status() == SessionStatus::Running {
        if session.turn() >= plan.max_turns {
            halted = Some(HaltReason::TurnCap);
            break;
        }
        let available = engine.available_actions(&session);
        if available.is_empty() {
            halted = Some(HaltReason::Stalemate);
            break;
        }
        let index = match plan.strategy {
            BotStrategy::First => 0,
            BotStrategy::Random => picker.gen_range(0..available.len()),
            BotStrategy::RoundRobin => session.turn() as usize % available.len(),
        };
        let action = &available[index];
        let report = engine
            .submit(&mut session, action)
            .expect("available action must submit");
        debug!(
            "seed {seed} turn {}: {action} -> {:?}",
            report.turn, report.status
        );
    }

    let summary = SessionSummary {
        seed,
        code: info.share_code(),
        iteration,
        turns: session.turn(),
        status: session.status(),
        ended_by: session.ended_by().map(str::to_string),
        halted,
        final_resources: session
            .ledger()
            .slots()
            .iter()
            .map(|slot| (slot.name.clone(), slot.value))
            .collect(),
    };
    (summary, session)
}

fn render_console(report: &AutoplayReport) {
    println!();
    println!(
        "{} {} ({} strategy)",
        "Autoplay report:".bold(),
        report.game.bright_white(),
        report.strategy
    );
    println!(
        "  sessions {} | {} {} ({}%) | {} {} | halted {} | avg turns {:.1}",
        report.sessions.len(),
        "wins".green(),
        report.wins,
        report.win_rate_pct,
        "losses".red(),
        report.losses,
        report.halted,
        report.average_turns
    );
    if let Some(ok) = report.determinism_ok {
        let verdict = if ok {
            "identical on replay".green()
        } else {
            "DIVERGED on replay".red().bold()
        };
        println!("  determinism: {verdict}");
    }
    for summary in &report.sessions {
        let status = match summary.status {
            SessionStatus::Won => "won".green(),
            SessionStatus::Lost => "lost".red(),
            SessionStatus::Running => "running".yellow(),
        };
        let ending = summary.ended_by.as_deref().unwrap_or("-");
        println!(
            "  {} iter {:>2} | {:>4} turns | {} ({})",
            summary.code, summary.iteration, summary.turns, status, ending
        );
    }
}
