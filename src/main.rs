use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use dice_match::{
    autoplay::{Autoplayer, Pacing},
    config::{ConfigLoader, DiceProfile},
    snapshot::SnapshotWriter,
    GameConfig, LevelSession, LevelStatus,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileArg {
    Classic,
    Adaptive,
}

impl From<ProfileArg> for DiceProfile {
    fn from(value: ProfileArg) -> Self {
        match value {
            ProfileArg::Classic => DiceProfile::Classic,
            ProfileArg::Adaptive => DiceProfile::Adaptive,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless dice-match runner")]
struct Cli {
    /// Path to a game config YAML file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the master seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of levels to clear
    #[arg(long, default_value_t = 5)]
    levels: u32,

    /// Level to start from
    #[arg(long, default_value_t = 1)]
    start_level: u32,

    /// Override the dice profile
    #[arg(long, value_enum)]
    profile: Option<ProfileArg>,

    /// Attempts per level before giving up
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Directory for per-level JSON snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Sleep the configured animation delays between actions
    #[arg(long)]
    paced: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::new(".")
            .load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(profile) = cli.profile {
        config.dice.profile = profile.into();
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let pacing = if cli.paced {
        Pacing::from_config(&config.pacing)
    } else {
        Pacing::headless()
    };
    let mut writer = cli.snapshot_dir.as_ref().map(|dir| SnapshotWriter::new(dir));

    let mut session = LevelSession::new(config);
    log::info!("seed {}", session.seed());
    session.start_level(cli.start_level);

    let player = Autoplayer::new(pacing, cli.max_attempts);
    let mut write_error = None;
    let summary = player.run(&mut session, cli.levels, |session, report| {
        let outcome = match report.status {
            LevelStatus::Won { stars, bonus } => format!("won {stars}* (+{bonus})"),
            LevelStatus::Failed { percent } => format!("failed at {percent}%"),
            LevelStatus::Playing | LevelStatus::Idle => "abandoned".to_string(),
        };
        println!(
            "level {:>3} attempt {}: {outcome}, {} rolls, {} dice left, score {}",
            report.level, report.attempt, report.rolls, report.dice_left, report.score
        );
        if let Some(writer) = writer.as_mut() {
            if let Err(err) = writer.write(&session.snapshot()) {
                write_error.get_or_insert(err);
            }
        }
    });
    if let Some(err) = write_error {
        return Err(err).context("Failed to write snapshot");
    }

    println!(
        "Cleared {} of {} levels (seed {}). Final score: {}{}",
        summary.levels_won,
        cli.levels,
        session.seed(),
        summary.final_score,
        if summary.gave_up { " (gave up)" } else { "" }
    );
    Ok(())
}
