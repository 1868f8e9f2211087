use anyhow::Context;
use clap::Parser;
use court_rotation::domain::model::{ParticipantId, ScoreInput, Session};
use court_rotation::utils::{logger, validation::Validate};
use court_rotation::{CliConfig, ErrorKind, InMemoryStore, RotationConfig, SessionOrchestrator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting court-rotation simulator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = cli
        .load_rotation_config()
        .with_context(|| format!("failed to load config {:?}", cli.config))?;

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, config).await {
        tracing::error!("Simulation failed: {} (kind: {:?})", e, e.kind());
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.kind() {
            ErrorKind::Validation => 2,
            ErrorKind::State | ErrorKind::NotFound => 3,
            ErrorKind::Concurrency => 4,
            ErrorKind::Storage => 5,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(cli: &CliConfig, config: RotationConfig) -> court_rotation::Result<()> {
    let store = InMemoryStore::new();
    let (orchestrator, mut score_rng) = match cli.seed {
        Some(seed) => (
            SessionOrchestrator::with_seed(store, config, seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (SessionOrchestrator::new(store, config), StdRng::from_entropy()),
    };

    let session = orchestrator.create_session(&cli.players, cli.courts).await?;
    println!(
        "Session {} with {} players on {} courts",
        session.id,
        session.participants.len(),
        session.num_courts
    );

    for _ in 0..cli.rounds {
        let session = orchestrator.start_round(session.id).await?;
        let Some(round) = session.current_round.as_ref() else {
            continue;
        };

        println!("\nRound {}", round.round_number);
        let mut scores = Vec::with_capacity(round.matches.len());
        for m in &round.matches {
            let losing = score_rng.gen_range(0..=9);
            let (team1_score, team2_score) = if score_rng.gen_bool(0.5) {
                (11, losing)
            } else {
                (losing, 11)
            };
            println!(
                "  Court {}: {} & {}  {:>2} - {:<2}  {} & {}",
                m.court,
                name(&session, m.team1.player1),
                name(&session, m.team1.player2),
                team1_score,
                team2_score,
                name(&session, m.team2.player1),
                name(&session, m.team2.player2),
            );
            scores.push(ScoreInput {
                match_id: m.id,
                team1_score,
                team2_score,
            });
        }
        if !round.benched.is_empty() {
            let benched: Vec<String> = round.benched.iter().map(|id| name(&session, *id)).collect();
            println!("  Bench: {}", benched.join(", "));
        }

        orchestrator.complete_round(session.id, &scores).await?;
    }

    let session = orchestrator.end_session(session.id).await?;
    print_standings(&session);
    Ok(())
}

fn name(session: &Session, id: ParticipantId) -> String {
    session
        .participant(id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "?".to_string())
}

fn print_standings(session: &Session) {
    let mut standings: Vec<_> = session.participants.iter().collect();
    standings.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(b.point_differential.cmp(&a.point_differential))
    });

    println!("\n{:<30} {:>3} {:>3} {:>3} {:>5} {:>4}", "Player", "GP", "W", "L", "+/-", "Sat");
    for p in standings {
        println!(
            "{:<30} {:>3} {:>3} {:>3} {:>+5} {:>4}",
            p.name, p.games_played, p.wins, p.losses, p.point_differential, p.rounds_sat_out
        );
    }
}
