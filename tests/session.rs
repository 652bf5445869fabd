mod common;

use common::FakeEngine;
use cozy_chess::{Color, Square};
use fishboard::board::{MoveOutcome, Position};
use fishboard::session::{BEST_MOVE_PLACEHOLDER, EVALUATION_PLACEHOLDER};
use fishboard::{Session, SessionConfig, Side};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn session_with(config: SessionConfig) -> (Session<FakeEngine>, FakeEngine) {
    let fake = FakeEngine::new();
    let session = Session::new(fake.clone(), config).expect("session");
    (session, fake)
}

fn session() -> (Session<FakeEngine>, FakeEngine) { session_with(SessionConfig::default()) }

#[test]
fn displays_start_with_placeholders() {
    let (s, _) = session();
    assert_eq!(s.display().best_move_text(), BEST_MOVE_PLACEHOLDER);
    assert_eq!(s.display().evaluation_text(), EVALUATION_PLACEHOLDER);
    assert_eq!(s.display().to_string(), "Best Move: Calculating...\nEvaluation: Evaluating...");
}

#[test]
fn legal_move_updates_position_and_sends_two_commands() {
    let (mut s, fake) = session();
    let outcome = s.on_drop(Square::E2, Square::E4).unwrap();
    assert!(matches!(outcome, MoveOutcome::Applied(_)));
    assert_eq!(s.position().side_to_move(), Color::Black);
    let fen = s.position().fen();
    assert_eq!(fake.sent(), vec![format!("position fen {fen}"), "go depth 15".to_string()]);
    assert!(s.is_searching());
}

#[test]
fn illegal_move_changes_nothing_and_sends_nothing() {
    let (mut s, fake) = session();
    let before = s.position().fen();
    let outcome = s.on_drop(Square::E2, Square::E5).unwrap();
    assert!(matches!(outcome, MoveOutcome::Rejected));
    assert_eq!(s.position().fen(), before);
    assert!(fake.sent().is_empty());
    assert_eq!(s.latest_request(), None);
}

#[test]
fn engine_lines_fill_displays_from_whites_view() {
    let (mut s, fake) = session();
    s.on_drop(Square::E2, Square::E4).unwrap();
    fake.push("info depth 15 seldepth 20 score cp 50 nodes 1000 pv e7e5");
    fake.push("bestmove e7e5 ponder g1f3");
    assert!(s.wait_for_search(Duration::from_millis(50)).unwrap());
    assert_eq!(s.display().evaluation.as_deref(), Some("-0.5"));
    assert_eq!(s.display().best_move.as_deref(), Some("e7e5"));
    assert!(!s.is_searching());
}

#[test]
fn black_move_keeps_engine_sign() {
    let (mut s, fake) = session();
    s.on_drop(Square::E2, Square::E4).unwrap();
    fake.push("bestmove e7e5");
    s.pump().unwrap();
    s.on_drop(Square::E7, Square::E5).unwrap();
    fake.push("info depth 15 score cp 50 pv g1f3");
    s.pump().unwrap();
    assert_eq!(s.display().evaluation.as_deref(), Some("0.5"));
}

#[test]
fn stale_replies_are_ignored() {
    let (mut s, fake) = session();
    s.on_drop(Square::E2, Square::E4).unwrap();
    s.on_drop(Square::E7, Square::E5).unwrap();
    // Output of the first, superseded search.
    fake.push("info depth 15 score cp 35 pv e7e5");
    fake.push("bestmove e7e5");
    s.pump().unwrap();
    assert_eq!(s.display().best_move, None);
    assert_eq!(s.display().evaluation, None);
    assert!(s.is_searching());

    fake.push("info depth 15 score mate -2 pv g1f3");
    fake.push("bestmove g1f3");
    s.pump().unwrap();
    assert_eq!(s.display().best_move.as_deref(), Some("g1f3"));
    assert_eq!(s.display().evaluation.as_deref(), Some("Mate in 2"));
}

#[test]
fn unknown_lines_leave_displays_alone() {
    let (mut s, fake) = session();
    s.on_drop(Square::E2, Square::E4).unwrap();
    fake.push("info depth 3 score cp 12 pv e7e5");
    fake.push("info string something odd");
    fake.push("info depth 4 nodes 400");
    assert_eq!(s.pump().unwrap(), 3);
    assert_eq!(s.display().evaluation.as_deref(), Some("-0.12"));
}

#[test]
fn wait_times_out_without_bestmove() {
    let (mut s, fake) = session();
    s.on_drop(Square::D2, Square::D4).unwrap();
    fake.push("info depth 1 score cp 20");
    assert!(!s.wait_for_search(Duration::from_millis(5)).unwrap());
    assert!(s.is_searching());
}

#[test]
fn cancel_superseded_sends_stop() {
    let config = SessionConfig { cancel_superseded: true, depth: 8, ..SessionConfig::default() };
    let (mut s, fake) = session_with(config);
    s.on_drop(Square::E2, Square::E4).unwrap();
    fake.clear_sent();
    s.on_drop(Square::E7, Square::E5).unwrap();
    let sent = fake.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0], "stop");
    assert_eq!(sent[2], "go depth 8");
}

#[test]
fn engine_answers_for_its_side() {
    let config = SessionConfig { engine_plays: Some(Side::Black), ..SessionConfig::default() };
    let (mut s, fake) = session_with(config);
    s.on_drop(Square::E2, Square::E4).unwrap();
    fake.clear_sent();
    fake.push("info depth 15 score cp 30 pv c7c5");
    fake.push("bestmove c7c5 ponder g1f3");
    assert!(!s.wait_for_search(Duration::from_millis(5)).unwrap(), "analysis of the reply is still pending");

    let expected = Position::set_from_start_and_moves(&["e2e4".to_string(), "c7c5".to_string()]).unwrap();
    assert_eq!(s.position().fen(), expected.fen());
    assert_eq!(s.position().side_to_move(), Color::White);
    assert_eq!(fake.sent(), vec![format!("position fen {}", expected.fen()), "go depth 15".to_string()]);
}

#[test]
fn engine_does_not_move_for_the_human() {
    let config = SessionConfig { engine_plays: Some(Side::White), ..SessionConfig::default() };
    let (mut s, fake) = session_with(config);
    s.new_game().unwrap();
    assert_eq!(fake.sent()[0], "ucinewgame");
    assert!(s.is_searching(), "engine plays white so it starts thinking");
    fake.push("bestmove d2d4");
    s.pump().unwrap();
    assert_eq!(s.position().side_to_move(), Color::Black);

    fake.push("bestmove e7e5");
    s.pump().unwrap();
    assert_eq!(s.position().side_to_move(), Color::Black, "black is the human");
}

#[test]
fn new_game_resets_state() {
    let (mut s, fake) = session();
    s.on_drop(Square::E2, Square::E4).unwrap();
    fake.push("bestmove e7e5");
    s.pump().unwrap();
    s.new_game().unwrap();
    assert_eq!(s.position().fen(), Position::startpos().fen());
    assert_eq!(s.display().best_move, None);
    assert_eq!(s.latest_request(), None);
    assert_eq!(fake.sent().last().map(String::as_str), Some("ucinewgame"));
}

#[test]
fn start_fen_from_config() {
    let fen = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
    let (mut s, _) = session_with(SessionConfig { start_fen: Some(fen.to_string()), ..SessionConfig::default() });
    assert!(s.on_drop(Square::E7, Square::E8).unwrap().is_applied());
    assert!(s.position().fen().starts_with("4Q3/"));
}

#[test]
fn bad_start_fen_fails_construction() {
    let config = SessionConfig { start_fen: Some("garbage".to_string()), ..SessionConfig::default() };
    assert!(Session::new(FakeEngine::new(), config).is_err());
}

#[test]
fn shutdown_terminates_engine() {
    let (mut s, fake) = session();
    s.on_drop(Square::E2, Square::E4).unwrap();
    fake.push("bestmove e7e5");
    s.shutdown().unwrap();
    assert!(fake.terminated());
    assert_eq!(fake.pending_lines(), 0, "queued output is discarded on teardown");
}

#[test]
fn unusable_engine_moves_leave_position_alone() {
    for bad in ["bestmove (none)", "bestmove e7e4", "bestmove e2e4"] {
        let config = SessionConfig { engine_plays: Some(Side::Black), ..SessionConfig::default() };
        let (mut s, fake) = session_with(config);
        s.on_drop(Square::E2, Square::E4).unwrap();
        let before = s.position().fen();
        fake.clear_sent();
        fake.push(bad);
        s.pump().unwrap();
        assert_eq!(s.position().fen(), before, "{bad}");
        assert!(fake.sent().is_empty(), "no new search after {bad}");
        assert!(!s.is_searching());
    }
}

#[test]
fn no_engine_move_after_mate() {
    let mated = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    let config = SessionConfig {
        engine_plays: Some(Side::White),
        start_fen: Some(mated.to_string()),
        ..SessionConfig::default()
    };
    let (mut s, fake) = session_with(config);
    s.analyze().unwrap();
    fake.clear_sent();
    fake.push("info depth 0 score mate 0");
    fake.push("bestmove (none)");
    s.pump().unwrap();
    assert_eq!(s.position().fen(), Position::from_fen(mated).unwrap().fen());
    assert_eq!(s.display().best_move.as_deref(), Some("(none)"));
    assert_eq!(s.display().evaluation.as_deref(), Some("Mate in 0"));
    assert!(fake.sent().is_empty());
}
