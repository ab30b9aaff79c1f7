use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};

use super::{Analysis, Analyzer, EngineError, Score};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    pub handshake_timeout: Duration,
    /// Slack on top of each search budget before `stop`, and again before giving up.
    pub grace: Duration,
}

impl EngineOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            threads: None,
            hash_mb: None,
            handshake_timeout: Duration::from_secs(10),
            grace: Duration::from_secs(2),
        }
    }
}

struct Process {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
}

impl Process {
    fn spawn(opts: &EngineOptions) -> Result<Self, EngineError> {
        let path = opts.path.display().to_string();
        let mut child = Command::new(&opts.path)
            .args(&opts.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn { path: path.clone(), source })?;
        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(i), Some(o)) => (i, o),
            _ => {
                let _ = child.kill();
                return Err(EngineError::Unavailable(format!("no stdio pipes for '{path}'")));
            }
        };
        let (tx, rx) = mpsc::channel();
        let reader = thread::Builder::new().name("uci-reader".into()).spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() { break; }
            }
        });
        if let Err(e) = reader {
            let _ = child.kill();
            return Err(EngineError::Unavailable(format!("reader thread: {e}")));
        }
        debug!("spawned engine '{}' (pid {})", path, child.id());
        Ok(Self { child, stdin, lines: rx })
    }

    fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        trace!(">> {cmd}");
        writeln!(self.stdin, "{cmd}")
            .and_then(|_| self.stdin.flush())
            .map_err(|e| EngineError::Unavailable(format!("write failed: {e}")))
    }

    /// Next line, or `None` once `deadline` passes.
    fn recv_until(&mut self, deadline: Instant) -> Result<Option<String>, EngineError> {
        let wait = deadline.saturating_duration_since(Instant::now());
        match self.lines.recv_timeout(wait) {
            Ok(line) => { trace!("<< {line}"); Ok(Some(line)) }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Unavailable("engine process exited".into())),
        }
    }

    /// Reads until a line starting with `token`; returns the lines before it.
    fn wait_for(&mut self, token: &str, timeout: Duration) -> Result<Vec<String>, EngineError> {
        let deadline = Instant::now() + timeout;
        let mut seen = Vec::new();
        loop {
            match self.recv_until(deadline)? {
                Some(line) if line.trim().starts_with(token) => return Ok(seen),
                Some(line) => seen.push(line),
                None => return Err(EngineError::Timeout(timeout)),
            }
        }
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A UCI engine subprocess. Not shareable: callers need `&mut` for every query.
pub struct UciEngine {
    opts: EngineOptions,
    name: String,
    proc: Option<Process>,
}

impl UciEngine {
    pub fn spawn(opts: EngineOptions) -> Result<Self, EngineError> {
        let name = opts.path.display().to_string();
        let mut engine = Self { opts, name, proc: None };
        engine.start()?;
        Ok(engine)
    }

    pub fn is_running(&self) -> bool { self.proc.is_some() }

    fn start(&mut self) -> Result<(), EngineError> {
        let timeout = self.opts.handshake_timeout;
        let mut p = Process::spawn(&self.opts)?;
        p.send("uci")?;
        let ids = p.wait_for("uciok", timeout)?;
        if let Some(name) = ids.iter().find_map(|l| l.trim().strip_prefix("id name ")) {
            self.name = name.trim().to_string();
        }
        if let Some(t) = self.opts.threads { p.send(&format!("setoption name Threads value {t}"))?; }
        if let Some(h) = self.opts.hash_mb { p.send(&format!("setoption name Hash value {h}"))?; }
        p.send("isready")?;
        p.wait_for("readyok", timeout)?;
        info!("engine '{}' ready (pid {})", self.name, p.child.id());
        self.proc = Some(p);
        Ok(())
    }

    fn process(&mut self) -> Result<&mut Process, EngineError> {
        if self.proc.is_none() {
            warn!("restarting engine '{}'", self.name);
            self.start().map_err(|e| EngineError::Unavailable(format!("restart failed: {e}")))?;
        }
        self.proc.as_mut().ok_or_else(|| EngineError::Unavailable("engine not running".into()))
    }
}

impl Analyzer for UciEngine {
    fn name(&self) -> &str { &self.name }

    fn analyse(&mut self, fen: &str, budget: Duration) -> Result<Analysis, EngineError> {
        let grace = self.opts.grace;
        let result = search(self.process()?, fen, budget, grace);
        if let Err(e @ (EngineError::Timeout(_) | EngineError::Unavailable(_))) = &result {
            warn!("dropping engine '{}' after failure: {e}", self.name);
            self.proc = None;
        }
        result
    }

    fn quit(&mut self) -> Result<(), EngineError> {
        let Some(mut p) = self.proc.take() else { return Ok(()) };
        p.send("quit")?;
        let deadline = Instant::now() + self.opts.grace;
        loop {
            match p.child.try_wait() {
                Ok(Some(status)) => {
                    info!("engine '{}' exited ({status})", self.name);
                    return Ok(());
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                Ok(None) => {
                    warn!("engine '{}' ignored quit; killing", self.name);
                    return Ok(());
                }
                Err(e) => {
                    warn!("engine '{}' status unknown after quit ({e}); killing", self.name);
                    return Ok(());
                }
            }
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) { let _ = self.quit(); }
}

fn search(p: &mut Process, fen: &str, budget: Duration, grace: Duration) -> Result<Analysis, EngineError> {
    p.send("isready")?;
    p.wait_for("readyok", grace)?;
    p.send(&format!("position fen {fen}"))?;
    p.send(&format!("go movetime {}", budget.as_millis().max(1)))?;
    let mut analysis = Analysis::default();
    let mut deadline = Instant::now() + budget + grace;
    let mut stopped = false;
    loop {
        match p.recv_until(deadline)? {
            Some(line) => {
                let line = line.trim();
                if let Some(rest) = line.strip_prefix("bestmove") {
                    analysis.best_move = parse_bestmove(rest);
                    return Ok(analysis);
                }
                if let Some(rest) = line.strip_prefix("info ") {
                    merge_info(&mut analysis, parse_info(rest));
                }
            }
            None if !stopped => {
                warn!("no bestmove after {:?}; sending stop", budget + grace);
                p.send("stop")?;
                stopped = true;
                deadline = Instant::now() + grace;
            }
            None => return Err(EngineError::Timeout(budget + grace + grace)),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct InfoLine {
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub pv: Vec<String>,
}

pub(crate) fn parse_info(rest: &str) -> InfoLine {
    let mut info = InfoLine::default();
    let mut tokens = rest.split_whitespace();
    while let Some(tok) = tokens.next() {
        match tok {
            "depth" => info.depth = tokens.next().and_then(|s| s.parse().ok()),
            "nodes" => info.nodes = tokens.next().and_then(|s| s.parse().ok()),
            "multipv" => info.multipv = tokens.next().and_then(|s| s.parse().ok()),
            "score" => {
                let kind = tokens.next();
                let value = tokens.next().and_then(|s| s.parse::<i32>().ok());
                info.score = match (kind, value) {
                    (Some("cp"), Some(v)) => Some(Score::Cp(v)),
                    (Some("mate"), Some(v)) => Some(Score::Mate(v)),
                    _ => None,
                };
            }
            "pv" => info.pv = tokens.by_ref().map(str::to_string).collect(),
            // free text runs to end of line
            "string" => break,
            "seldepth" | "time" | "nps" | "hashfull" | "tbhits" | "sbhits" | "cpuload"
            | "currmove" | "currmovenumber" => { tokens.next(); }
            _ => {}
        }
    }
    info
}

fn merge_info(analysis: &mut Analysis, info: InfoLine) {
    if info.multipv.unwrap_or(1) != 1 { return; }
    if let Some(d) = info.depth { analysis.depth = d; }
    if let Some(n) = info.nodes { analysis.nodes = n; }
    if info.score.is_some() { analysis.score = info.score; }
    if !info.pv.is_empty() { analysis.pv = info.pv; }
}

pub(crate) fn parse_bestmove(rest: &str) -> Option<String> {
    match rest.split_whitespace().next() {
        None | Some("(none)") | Some("0000") => None,
        Some(mv) => Some(mv.to_string()),
    }
}
