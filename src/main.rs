use anyhow::{Context, Result};
use clap::Parser;
use cozy_chess::Color;
use fishboard::board::{parse_drag, MoveOutcome, Status};
use fishboard::engine::Transport;
use fishboard::{Session, SessionConfig, Side};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Play chess in the terminal with Stockfish analysis", long_about = None)]
struct Args {
    /// JSON session config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine executable
    #[arg(long)]
    engine: Option<String>,

    /// Search depth for every analysis
    #[arg(long)]
    depth: Option<u32>,

    /// Starting FEN position
    #[arg(long)]
    fen: Option<String>,

    /// Let the engine play this side
    #[arg(long, value_enum)]
    engine_plays: Option<Side>,

    /// Send `stop` to a running search when a new move supersedes it
    #[arg(long)]
    cancel_superseded: bool,

    /// How long to wait for an analysis after each move (ms)
    #[arg(long, default_value_t = 30_000)]
    wait_ms: u64,
}

fn build_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(engine) = &args.engine { config.engine_path = engine.clone(); }
    if let Some(depth) = args.depth { config.depth = depth; }
    if let Some(fen) = &args.fen { config.start_fen = Some(fen.clone()); }
    if let Some(side) = args.engine_plays { config.engine_plays = Some(side); }
    if args.cancel_superseded { config.cancel_superseded = true; }
    Ok(config)
}

fn print_state<T: Transport>(session: &Session<T>) {
    let pos = session.position();
    println!("\n{}'s turn", if pos.side_to_move() == Color::White { "White" } else { "Black" });
    println!("{}", pos.diagram());
    println!("{}", session.display());
}

fn print_help() {
    println!("Commands:");
    println!("  e2e4 | e2 e4   move a piece (pawns always promote to a queen)");
    println!("  new            start a new game");
    println!("  fen            print the current FEN");
    println!("  help           show this help");
    println!("  quit           exit");
}

fn announce_result(status: Status) {
    match status {
        Status::Ongoing => {}
        Status::Checkmate { winner: Color::White } => println!("\nCheckmate! White wins! Type `new` to play again."),
        Status::Checkmate { winner: Color::Black } => println!("\nCheckmate! Black wins! Type `new` to play again."),
        Status::Drawn => println!("\nGame is drawn! Type `new` to play again."),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = build_config(&args)?;
    let wait = Duration::from_millis(args.wait_ms);

    println!("Starting engine: {}", config.engine_path);
    let mut session = Session::launch(config).context("could not start the engine")?;
    session.new_game()?;
    if session.is_searching() && !session.wait_for_search(wait)? {
        println!("(engine still thinking)");
    }
    print_help();

    loop {
        print_state(&session);
        announce_result(session.status());

        print!("Enter your move (e.g., e2e4): ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 { break; }
        let input = input.trim();

        match input {
            "" => { session.pump()?; continue; }
            "quit" | "exit" => break,
            "help" => { print_help(); continue; }
            "fen" => { println!("{}", session.position().fen()); continue; }
            "new" => { session.new_game()?; }
            _ => match parse_drag(input) {
                Ok((from, to)) => match session.on_drop(from, to)? {
                    MoveOutcome::Applied(_) => {}
                    MoveOutcome::Rejected => { println!("Illegal move!"); continue; }
                },
                Err(e) => { println!("{}", e); continue; }
            },
        }

        if session.is_searching() && !session.wait_for_search(wait)? {
            println!("(engine still thinking; press Enter to refresh)");
        }
    }

    session.shutdown()?;
    Ok(())
}
