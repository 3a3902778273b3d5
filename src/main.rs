use minesweeper_kb::util::{play, Board, GameConfig, Outcome};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

/// Usage: `minesweeper-kb [height width mines [seed]]`, logging controlled by
/// `RUST_LOG` (default `info`).
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GameConfig::from_args(std::env::args().skip(1))?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let board = Board::random(&config, &mut rng)?;
    tracing::info!(dimensions = %config.dimensions, mines = config.mines, "new game");

    let game = play(&board, &mut rng)?;
    println!("{board}");
    match game.outcome {
        Outcome::Won => println!("Won after {} guesses", game.guesses),
        Outcome::Lost(cell) => println!("Lost: hit the mine at {cell}"),
        Outcome::Stuck => println!("Stuck: no moves left"),
    }
    Ok(())
}
