use anyhow::{bail, Context, Result};
use clap::Parser;
use fishboard::{Session, SessionConfig};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "fishboard-analyze", about = "Print the engine's best move and evaluation for one position")]
struct Args {
    /// Position to analyze (standard start position when omitted)
    #[arg(long)]
    fen: Option<String>,
    #[arg(long, default_value = "stockfish")]
    engine: String,
    #[arg(long, default_value_t = fishboard::uci::DEFAULT_DEPTH)]
    depth: u32,
    #[arg(long, default_value_t = 60_000)]
    timeout_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let a = Args::parse();
    let config = SessionConfig { engine_path: a.engine, depth: a.depth, start_fen: a.fen, ..SessionConfig::default() };
    let mut session = Session::launch(config).context("could not start the engine")?;
    session.analyze()?;
    let finished = session.wait_for_search(Duration::from_millis(a.timeout_ms))?;
    println!("FEN: {}", session.position().fen());
    println!("{}", session.display());
    session.shutdown()?;
    if !finished { bail!("search did not finish within {} ms", a.timeout_ms); }
    Ok(())
}
