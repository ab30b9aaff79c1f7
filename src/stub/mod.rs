//! A stand-in UCI responder for smoke runs without a real engine installed.
//! It does not search: `go` answers with the first legal move and a material count.

pub mod eval;

use std::io::{self, BufRead, Write};

use crate::board::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StubMode {
    /// Answer `go` immediately.
    #[default]
    Prompt,
    /// Hold the answer to `go` until `stop`.
    Stall,
    /// Never answer `go`, ignore `stop`.
    Deaf,
}

pub struct StubEngine {
    pos: Position,
    mode: StubMode,
    pending: Vec<String>,
}

impl StubEngine {
    pub fn new(mode: StubMode) -> Self { Self { pos: Position::startpos(), mode, pending: Vec::new() } }

    pub fn position(&self) -> &Position { &self.pos }

    fn cmd_uci(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "id name PieChess Stub")?;
        writeln!(out, "id author PieBot Team")?;
        writeln!(out, "option name Threads type spin default 1 min 1 max 512")?;
        writeln!(out, "option name Hash type spin default 16 min 1 max 16384")?;
        writeln!(out, "uciok")
    }

    fn cmd_position(&mut self, args: &str) {
        // 'position startpos [moves ...]' or 'position fen <fen> [moves ...]'
        let (setup, moves) = match args.split_once(" moves ") {
            Some((s, m)) => (s.trim(), m.split_whitespace().collect::<Vec<_>>()),
            None => (args.trim().trim_end_matches(" moves"), Vec::new()),
        };
        let base = match setup.split_once(' ') {
            _ if setup == "startpos" => Some(Position::startpos()),
            Some(("fen", fen)) => Position::from_fen(fen).ok(),
            _ => None,
        };
        let Some(mut pos) = base else { return };
        for m in moves {
            if pos.play_uci(m).is_err() { return; }
        }
        self.pos = pos;
    }

    fn reply_to_go(&self) -> Vec<String> {
        let moves = self.pos.legal_moves();
        match moves.first() {
            Some(best) => vec![
                format!("info depth 1 score cp {} nodes {} pv {}", eval::material_cp(self.pos.board()), moves.len(), best),
                format!("bestmove {best}"),
            ],
            None => vec![
                format!("info depth 0 score {} nodes 0", if self.pos.is_check() { "mate 0" } else { "cp 0" }),
                "bestmove (none)".to_string(),
            ],
        }
    }

    /// Handles one command line; returns `false` on `quit`.
    pub fn handle(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let line = line.trim();
        match line {
            "" => {}
            "uci" => self.cmd_uci(out)?,
            "isready" => writeln!(out, "readyok")?,
            "ucinewgame" => self.pos = Position::startpos(),
            "quit" => return Ok(false),
            "stop" => {
                if self.mode != StubMode::Deaf {
                    for l in self.pending.drain(..) { writeln!(out, "{l}")?; }
                }
            }
            _ => {
                if let Some(rest) = line.strip_prefix("position ") {
                    self.cmd_position(rest);
                } else if line == "go" || line.starts_with("go ") {
                    let reply = self.reply_to_go();
                    match self.mode {
                        StubMode::Prompt => for l in reply { writeln!(out, "{l}")?; },
                        StubMode::Stall => self.pending = reply,
                        StubMode::Deaf => {}
                    }
                }
            }
        }
        out.flush()?;
        Ok(true)
    }

    pub fn run_loop(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for line in stdin.lock().lines() {
            if !self.handle(&line?, &mut out)? { break; }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(engine: &mut StubEngine, cmds: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        for c in cmds { engine.handle(c, &mut out).expect("write to vec"); }
        String::from_utf8(out).expect("utf8").lines().map(str::to_string).collect()
    }

    #[test]
    fn handshake() {
        let lines = run(&mut StubEngine::new(StubMode::Prompt), &["uci", "isready"]);
        assert_eq!(lines.first().map(String::as_str), Some("id name PieChess Stub"));
        assert!(lines.iter().any(|l| l == "uciok"));
        assert_eq!(lines.last().map(String::as_str), Some("readyok"));
    }

    #[test]
    fn position_with_moves_applies_them() {
        let mut e = StubEngine::new(StubMode::Prompt);
        run(&mut e, &["position startpos moves e2e4 e7e5"]);
        assert_eq!(e.position().fen(), "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2");
        run(&mut e, &["position fen 8/8/8/8/8/8/8/K6k w - - 0 1 moves a1a2"]);
        assert_eq!(e.position().fen(), "8/8/8/8/8/8/K7/7k b - - 1 1");
    }

    #[test]
    fn go_answers_with_a_legal_move() {
        let mut e = StubEngine::new(StubMode::Prompt);
        let lines = run(&mut e, &["position startpos", "go movetime 10"]);
        let best = lines.last().and_then(|l| l.strip_prefix("bestmove ")).expect("bestmove line");
        assert!(e.position().legal_moves().iter().any(|m| m == best));
    }

    #[test]
    fn mated_side_has_no_move() {
        let mut e = StubEngine::new(StubMode::Prompt);
        let lines = run(&mut e, &["position fen rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3", "go"]);
        assert_eq!(lines.last().map(String::as_str), Some("bestmove (none)"));
    }

    #[test]
    fn stall_waits_for_stop() {
        let mut e = StubEngine::new(StubMode::Stall);
        assert!(run(&mut e, &["go movetime 5"]).is_empty());
        let lines = run(&mut e, &["stop"]);
        assert!(lines.last().is_some_and(|l| l.starts_with("bestmove ")));
    }

    #[test]
    fn quit_ends_the_loop() {
        let mut out = Vec::new();
        assert!(!StubEngine::new(StubMode::Deaf).handle("quit", &mut out).expect("write"));
    }
}
