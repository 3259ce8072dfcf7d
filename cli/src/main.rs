use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use arcade_accounts::{AccountError, Accounts};
use arcade_core::minesweeper::{Difficulty, Minesweeper};
use arcade_core::pairs::Pairs;
use arcade_core::snake::Snake;
use arcade_core::tennis::Tennis;
use arcade_core::{Game, GameKind, JsonFilePreferences, Preferences, keys};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::ArcadeConfig;

mod config;
mod render;
mod run;
mod terminal;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Config file, `arcade.toml` is used when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account, the password is read from stdin
    Register { username: String, email: String },
    /// Log in, the password is read from stdin
    Login { username: String },
    Logout,
    /// Show who is logged in
    Whoami,
    /// List the best scores
    Scores,
    /// Play a game, requires being logged in
    Play {
        #[arg(value_enum)]
        game: GameArg,
        /// Board preset, only used by minesweeper
        #[arg(short, long, value_enum)]
        difficulty: Option<DifficultyArg>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum GameArg {
    Minesweeper,
    Snake,
    Tennis,
    Pairs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::EASY,
            DifficultyArg::Medium => Difficulty::MEDIUM,
            DifficultyArg::Hard => Difficulty::HARD,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    pretty_env_logger::formatted_builder()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let config = ArcadeConfig::load(args.config.as_deref())?;
    let prefs = JsonFilePreferences::open(&config.data_file)
        .with_context(|| format!("Could not open {}", config.data_file.display()))?;
    let seed = args.seed.unwrap_or_else(rand::random);
    log::debug!("seed: {}", seed);

    match args.command {
        Command::Register { username, email } => {
            let password = read_password()?;
            let mut accounts = Accounts::new(prefs);
            match accounts.register(&username, &email, &password) {
                Ok(record) => println!("Welcome, {}!", record.username),
                Err(AccountError::Invalid(errors)) => {
                    for error in &errors {
                        eprintln!("{}: {}", error.field(), error);
                    }
                    bail!("Registration failed");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Login { username } => {
            let password = read_password()?;
            let record = Accounts::new(prefs).login(&username, &password)?;
            println!("Welcome back, {}!", record.username);
        }
        Command::Logout => Accounts::new(prefs).logout()?,
        Command::Whoami => match Accounts::new(prefs).current_user() {
            Some(username) => println!("{username}"),
            None => println!("Not logged in"),
        },
        Command::Scores => print_scores(&prefs),
        Command::Play { game, difficulty } => {
            let accounts = Accounts::new(prefs);
            let Some(player) = accounts.current_user() else {
                bail!("Log in first with `arcade login <username>`");
            };
            let prefs = Box::new(accounts.into_inner());
            match game {
                GameArg::Minesweeper => {
                    let difficulty = difficulty.map_or(config.minesweeper, Difficulty::from);
                    run::play(Minesweeper::new(difficulty, seed)?, prefs, &player)?
                }
                GameArg::Snake => run::play(Snake::new(config.snake, seed)?, prefs, &player)?,
                GameArg::Tennis => run::play(Tennis::new(config.tennis, seed)?, prefs, &player)?,
                GameArg::Pairs => run::play(Pairs::new(config.pairs, seed)?, prefs, &player)?,
            }
        }
    }
    Ok(())
}

/// Takes the first line of stdin, so a password can be piped in.
fn read_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut password = String::new();
    io::stdin()
        .lock()
        .read_line(&mut password)
        .context("Could not read password")?;
    Ok(password.trim_end_matches(['\r', '\n']).to_owned())
}

fn print_scores(prefs: &impl Preferences) {
    let show = |label: &str, key: String, unit: &str| match prefs.get_int_opt(&key) {
        Some(best) => println!("{label:<24} {best}{unit}"),
        None => println!("{label:<24} -"),
    };
    for kind in GameKind::ALL {
        if kind == GameKind::Minesweeper {
            for (name, difficulty) in [
                ("easy", Difficulty::EASY),
                ("medium", Difficulty::MEDIUM),
                ("hard", Difficulty::HARD),
            ] {
                let key = Minesweeper::score_key_for(difficulty);
                show(&format!("{kind} ({name})"), key, "s");
            }
        } else {
            show(kind.slug(), keys::best_score(kind), "");
        }
    }
}
