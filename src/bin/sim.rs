use rand::{rngs::SmallRng, SeedableRng};
use seabattle::{simulate, AiPlayer, EngineConfig, MatchResult};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <seed>", args[0]);
        std::process::exit(1);
    }
    let seed: u64 = args[1].parse()?;

    let config = EngineConfig::seeded(seed);
    let mut rng = SmallRng::seed_from_u64(seed);
    let (summary, game) = simulate(&config, &AiPlayer, &AiPlayer, &mut rng)?;

    let winner = match summary.result {
        MatchResult::HostWin => Some("host"),
        MatchResult::GuestWin => Some("guest"),
        MatchResult::Surrender => None,
    };

    let result = json!({
        "seed": seed,
        "host": {"shots": summary.host_shots},
        "guest": {"shots": summary.guest_shots},
        "moves": game.record().moves(),
        "winner": winner,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
