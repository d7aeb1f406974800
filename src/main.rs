//! # Eramud Main Entry Point
//!
//! Initializes logging, loads or creates a game, starts the background
//! upkeep ticker, and runs the line-oriented command loop over stdin.

use clap::Parser;
use eramud::{
    daily_top_up, input, CharacterClass, EramudError, EramudResult, GameState, MacroStore,
    UpkeepTicker,
};
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Command line arguments for Eramud.
#[derive(Parser, Debug)]
#[command(name = "eramud")]
#[command(about = "A single-player text MUD across the eras")]
#[command(version)]
struct Args {
    /// Random seed for world generation (new games only)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Save file to load on start and write on exit
    #[arg(long)]
    save: Option<PathBuf>,

    /// Directory for macro profiles
    #[arg(long, default_value = "profiles")]
    profile_dir: PathBuf,

    /// Character name (new games only)
    #[arg(long, default_value = "Drifter")]
    name: String,

    /// Character class: drifter, enforcer, or tinker (new games only)
    #[arg(long, default_value = "drifter")]
    class: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> EramudResult<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&args.log_level),
    )
    .init();

    info!("Starting Eramud v{}", eramud::VERSION);

    let mut state = load_or_create(&args)?;
    let start_year = state.player.year;
    let arrival = state.enter_year(start_year)?;

    // Catch the world up with the calendar before play begins.
    daily_top_up(&mut state.world, chrono::Local::now().date_naive());

    println!("Eramud v{} -- the years are open.", eramud::VERSION);
    println!("It is {}. Type 'help' for commands.", state.player.year);
    for line in arrival {
        println!("{}", line);
    }

    let state = Arc::new(Mutex::new(state));
    let ticker = UpkeepTicker::start(state.clone());
    let mut macros = MacroStore::new(args.profile_dir.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let keep_going = {
            let mut guard = match state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            input::dispatch_line(&mut guard, &mut macros, &line)
        };
        if !keep_going {
            break;
        }
        prompt()?;
    }

    ticker.stop().await;

    if let Some(path) = &args.save {
        let guard = match state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::fs::write(path, guard.save_to_json()?)?;
        info!("saved game to {}", path.display());
    }
    Ok(())
}

/// Loads the save file when one exists, otherwise rolls a new character.
fn load_or_create(args: &Args) -> EramudResult<GameState> {
    if let Some(path) = &args.save {
        if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            let state = GameState::load_from_json(&raw)?;
            info!("loaded save from {}", path.display());
            return Ok(state);
        }
    }
    let class = CharacterClass::parse(&args.class).ok_or_else(|| {
        EramudError::InvalidAction(format!("unknown class '{}'", args.class))
    })?;
    let seed = args.seed.unwrap_or(12345);
    info!("new game: seed {}, class {}", seed, class.name());
    Ok(GameState::new(seed, args.name.clone(), class))
}

fn prompt() -> EramudResult<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
