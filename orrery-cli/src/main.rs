mod autoplay;
mod interactive;
mod seeds;
mod store;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use orrery_engine::Engine;
use std::fs;
use std::path::PathBuf;

use autoplay::{AutoplayPlan, BotStrategy};
use seeds::resolve_seed_inputs;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RunMode {
    /// Interactive play over stdin/stdout
    Play,
    /// Scripted bot play across seeds and iterations
    Auto,
    /// Load and validate a config, then exit
    Validate,
}

#[derive(Debug, Parser)]
#[command(name = "orrery", version)]
#[command(about = "Console front end and QA harness for the Orrery turn engine")]
struct Args {
    /// Run mode
    #[arg(long, value_enum, default_value_t = RunMode::Play)]
    mode: RunMode,

    /// Bundled game (salvage, homestead) or path to a config JSON file
    #[arg(long, default_value = "salvage")]
    game: String,

    /// Seeds to run (comma-separated integers or friendly codes)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Iterations per seed (auto mode)
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Safety cap on turns per session (auto mode)
    #[arg(long, default_value_t = 2000)]
    max_turns: u32,

    /// Bot strategy (auto mode)
    #[arg(long, value_enum, default_value_t = BotStrategy::Random)]
    strategy: BotStrategy,

    /// Output report format (auto mode)
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Replay every session and fail on any divergence (auto mode)
    #[arg(long)]
    check_determinism: bool,

    /// Directory for interactive save files
    #[arg(long, default_value = ".orrery-saves")]
    save_dir: PathBuf,

    /// Verbose per-turn output
    #[arg(long)]
    verbose: bool,
}

const BUNDLED_GAMES: [(&str, &str); 2] = [
    ("salvage", include_str!("../assets/salvage.json")),
    ("homestead", include_str!("../assets/homestead.json")),
];

fn load_config_json(game: &str) -> Result<String> {
    if let Some((_, json)) = BUNDLED_GAMES.iter().find(|(name, _)| *name == game) {
        return Ok((*json).to_string());
    }
    fs::read_to_string(game).with_context(|| format!("reading game config `{game}`"))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let json = load_config_json(&args.game)?;
    let engine = match Engine::from_json(&json) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("{} {err}", "Config rejected:".red().bold());
            bail!("config `{}` failed validation", args.game);
        }
    };

    let seeds = resolve_seed_inputs(&args.seeds)?;

    match args.mode {
        RunMode::Validate => {
            let config = engine.config();
            println!(
                "{} {} ({} resources, {} actions, {} rules)",
                "Config OK:".green().bold(),
                if config.meta.name.is_empty() {
                    args.game.as_str()
                } else {
                    config.meta.name.as_str()
                },
                config.resources.len(),
                config.actions.len(),
                config.rules.len()
            );
            Ok(())
        }
        RunMode::Auto => {
            let plan = AutoplayPlan {
                strategy: args.strategy,
                iterations: args.iterations,
                max_turns: args.max_turns,
                check_determinism: args.check_determinism,
                verbose: args.verbose,
            };
            autoplay::run(&engine, &args.game, &seeds, &plan, &args.report)
        }
        RunMode::Play => {
            let info = seeds.first().expect("seed list is never empty");
            interactive::run(&engine, info, &args.save_dir, args.verbose)
        }
    }
}
