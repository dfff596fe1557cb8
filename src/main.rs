#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use std::io::{self, Write};

#[cfg(feature = "std")]
use clap::{Parser, Subcommand};
#[cfg(feature = "std")]
use rand::{rngs::SmallRng, SeedableRng};
#[cfg(feature = "std")]
use seabattle::{
    init_logging, simulate,
    ui::{parse_coord, render_boards},
    AiPlayer, EngineConfig, InMemoryLedger, InMemoryStore, MatchId, MatchResult, MatchService,
    Mode, NullNotifier, PlacementSpec, PlayerId, Side,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[arg(long, global = true, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
    seed: Option<u64>,
    #[arg(long, global = true, help = "Let auto-placed ships touch each other")]
    allow_touching: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[cfg(feature = "std")]
enum Commands {
    /// Play against the computer at the terminal.
    Play,
    /// Let the computer play both sides and report the results.
    Simulate {
        #[arg(long, default_value_t = 1)]
        games: u32,
    },
}

#[cfg(feature = "std")]
const HUMAN: PlayerId = PlayerId(1);

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = EngineConfig {
        no_touching: !cli.allow_touching,
        seed: cli.seed,
        ..EngineConfig::default()
    };
    if let Some(s) = cli.seed {
        println!("Using fixed seed: {} (game will be reproducible)", s);
    }

    match cli.command {
        Commands::Play => play(config).await,
        Commands::Simulate { games } => run_simulations(&config, games),
    }
}

#[cfg(feature = "std")]
async fn show(service: &MatchService, id: MatchId) -> anyhow::Result<()> {
    let own = service.view_grid(id, Side::Host, true).await?;
    let enemy = service.view_grid(id, Side::Guest, false).await?;
    println!("\n{}", render_boards(&own, &enemy));
    Ok(())
}

#[cfg(feature = "std")]
async fn play(config: EngineConfig) -> anyhow::Result<()> {
    let ledger = InMemoryLedger::new();
    let service = MatchService::new(InMemoryStore::new(), NullNotifier, ledger.clone(), config);
    let id = service.create_match(Mode::AutomatedOpponent, HUMAN).await?.id();
    service
        .populate_side(id, Side::Host, PlacementSpec::Auto)
        .await?;
    println!("Your fleet is in position. Enter targets like B7, or 'quit' to surrender.");

    loop {
        show(&service, id).await?;
        print!("Target> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 || line.trim().eq_ignore_ascii_case("quit") {
            service.surrender(id, Side::Host).await?;
            println!("You surrendered.");
            break;
        }
        let Some(target) = parse_coord(&line) else {
            println!("Not a cell on the board: {}", line.trim());
            continue;
        };

        let report = service.attack(id, Side::Host, target.x, target.y).await?;
        if report.already_shot {
            println!("Already fired there, pick another cell.");
            continue;
        }
        match (report.hit, report.sunk) {
            (true, true) => println!("Hit and sunk!"),
            (true, false) => println!("Hit!"),
            _ => println!("Miss."),
        }
        for shot in &report.opponent_moves {
            println!(
                "Enemy fires at {}: {}",
                shot.coord,
                if shot.sunk {
                    "sunk"
                } else if shot.hit {
                    "hit"
                } else {
                    "miss"
                }
            );
        }
        if report.match_finished {
            show(&service, id).await?;
            match report.winner {
                Some(MatchResult::HostWin) => println!("VICTORY! You have sunk all enemy ships!"),
                _ => println!("DEFEAT. All your ships have been destroyed."),
            }
            break;
        }
    }

    let stats = ledger.stats(HUMAN);
    println!(
        "Rating {} ({} wins, {} losses)",
        stats.rating, stats.wins, stats.losses
    );
    Ok(())
}

#[cfg(feature = "std")]
fn run_simulations(config: &EngineConfig, games: u32) -> anyhow::Result<()> {
    let mut rng = match config.seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_rng(&mut rand::rng()),
    };
    let (mut host_wins, mut total_shots) = (0u32, 0usize);
    for n in 1..=games {
        let (summary, _) = simulate(config, &AiPlayer, &AiPlayer, &mut rng)?;
        if summary.result == MatchResult::HostWin {
            host_wins += 1;
        }
        total_shots += summary.host_shots + summary.guest_shots;
        println!(
            "game {:>3}: {:?} after {} host / {} guest shots",
            n, summary.result, summary.host_shots, summary.guest_shots
        );
    }
    if games > 0 {
        println!(
            "host won {}/{} games, {:.1} shots per game",
            host_wins,
            games,
            total_shots as f64 / games as f64
        );
    }
    Ok(())
}
