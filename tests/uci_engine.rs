use std::sync::Arc;
use std::time::{Duration, Instant};

use piechess_server::board::{Position, STARTPOS_FEN};
use piechess_server::engine::{Analyzer, EngineError, EngineOptions, EnginePool, Score, UciEngine};

fn stub(args: &[&str]) -> EngineOptions {
    let mut opts = EngineOptions::new(env!("CARGO_BIN_EXE_uci-stub"));
    opts.args = args.iter().map(|a| a.to_string()).collect();
    opts.grace = Duration::from_millis(300);
    opts.threads = Some(1);
    opts
}

#[test]
fn handshake_reads_engine_name() {
    let engine = UciEngine::spawn(stub(&[])).expect("stub engine starts");
    assert_eq!(engine.name(), "PieChess Stub");
    assert!(engine.is_running());
}

#[test]
fn analyse_startpos() {
    let mut engine = UciEngine::spawn(stub(&[])).expect("stub engine starts");
    let a = engine.analyse(STARTPOS_FEN, Duration::from_millis(50)).expect("analysis");
    let best = a.best_move.clone().expect("a move");
    assert!(Position::startpos().legal_moves().contains(&best));
    assert_eq!(a.score, Some(Score::Cp(0)));
    assert_eq!(a.depth, 1);
    assert_eq!(a.nodes, 20);
    assert_eq!(a.pv, vec![best]);
}

#[test]
fn engine_state_follows_each_query() {
    let mut engine = UciEngine::spawn(stub(&[])).expect("stub engine starts");
    // Black to move, a queen down.
    let a = engine.analyse("k7/8/8/8/8/8/4Q3/7K b - - 0 1", Duration::from_millis(20)).expect("analysis");
    assert_eq!(a.score, Some(Score::Cp(-900)));
    let b = engine.best_move(STARTPOS_FEN, Duration::from_millis(20)).expect("best move");
    assert!(b.is_some());
}

#[test]
fn no_move_in_a_mated_position() {
    let mut engine = UciEngine::spawn(stub(&[])).expect("stub engine starts");
    let fen = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    assert_eq!(engine.best_move(fen, Duration::from_millis(20)).expect("answer"), None);
}

#[test]
fn stalled_engine_answers_after_stop() {
    let mut engine = UciEngine::spawn(stub(&["--stall"])).expect("stub engine starts");
    let t0 = Instant::now();
    let a = engine.analyse(STARTPOS_FEN, Duration::from_millis(20)).expect("answer after stop");
    assert!(a.best_move.is_some());
    assert!(t0.elapsed() >= Duration::from_millis(300), "stop should only be sent after budget + grace");
    assert!(engine.is_running());
}

#[test]
fn deaf_engine_times_out_and_is_restarted() {
    let mut engine = UciEngine::spawn(stub(&["--deaf"])).expect("stub engine starts");
    let err = engine.analyse(STARTPOS_FEN, Duration::from_millis(20)).unwrap_err();
    assert!(matches!(err, EngineError::Timeout(_)), "{err:?}");
    assert!(!engine.is_running(), "a timed out engine is discarded");
    let err = engine.analyse(STARTPOS_FEN, Duration::from_millis(20)).unwrap_err();
    assert!(matches!(err, EngineError::Timeout(_)), "restarted engine should be queried again: {err:?}");
}

#[test]
fn missing_executable_is_a_spawn_error() {
    let err = UciEngine::spawn(EngineOptions::new("/nonexistent/uci-engine")).err().expect("spawn fails");
    assert!(matches!(err, EngineError::Spawn { .. }), "{err:?}");
}

#[test]
fn quit_twice_is_harmless() {
    let mut engine = UciEngine::spawn(stub(&[])).expect("stub engine starts");
    engine.quit().expect("quit");
    assert!(!engine.is_running());
    engine.quit().expect("second quit");
}

#[tokio::test]
async fn pool_gives_each_query_its_own_engine() {
    let pool = Arc::new(EnginePool::spawn_uci(&stub(&[]), 2).expect("pool starts"));
    assert_eq!(pool.size(), 2);
    assert_eq!(pool.name(), "PieChess Stub");
    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            pool.run(|engine| engine.analyse(STARTPOS_FEN, Duration::from_millis(10))).await
        }));
    }
    for h in handles {
        let a = h.await.expect("task").expect("analysis");
        assert_eq!(a.nodes, 20);
    }
    pool.shutdown().await;
}

#[tokio::test]
async fn pool_refuses_work_after_shutdown() {
    let pool = EnginePool::spawn_uci(&stub(&[]), 1).expect("pool starts");
    pool.shutdown().await;
    let err = pool.run(|engine| engine.best_move(STARTPOS_FEN, Duration::from_millis(10))).await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)), "{err:?}");
}
