use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::engine::EngineOptions;

#[derive(clap::Parser, Debug, Clone)]
#[command(name = "piechess-server", version, about = "Chess position and engine analysis over HTTP/JSON")]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "CHESS_SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CHESS_SERVER_PORT", default_value_t = 5000)]
    pub port: u16,

    /// UCI engine executable
    #[arg(long, env = "CHESS_SERVER_ENGINE", default_value = "/usr/games/stockfish")]
    pub engine: PathBuf,

    /// Extra argument passed to the engine (repeatable)
    #[arg(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Number of engine processes; concurrent analysis requests beyond this wait
    #[arg(long, env = "CHESS_SERVER_ENGINES", default_value_t = 1)]
    pub engines: usize,

    /// UCI Threads option for each engine
    #[arg(long)]
    pub engine_threads: Option<u32>,

    /// UCI Hash option (MB) for each engine
    #[arg(long)]
    pub engine_hash: Option<u32>,

    /// Search time in seconds when a request gives no time_limit
    #[arg(long, default_value_t = 1.0)]
    pub default_time_limit: f64,

    /// Largest time_limit in seconds a request may ask for
    #[arg(long, default_value_t = 30.0)]
    pub max_time_limit: f64,

    /// Slack in milliseconds before an unresponsive engine is stopped
    #[arg(long, default_value_t = 2000)]
    pub engine_grace_ms: u64,
}

/// Bounds applied to caller-supplied search times, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeLimits {
    pub default: f64,
    pub max: f64,
}

impl Default for TimeLimits {
    fn default() -> Self { Self { default: 1.0, max: 30.0 } }
}

impl TimeLimits {
    /// Validates a requested budget; `None` means the default.
    pub fn budget(&self, requested: Option<f64>) -> Result<Duration, String> {
        let secs = requested.unwrap_or(self.default);
        if !secs.is_finite() || secs <= 0.0 {
            return Err(format!("{secs} is not a positive number of seconds"));
        }
        if secs > self.max {
            return Err(format!("{secs}s exceeds the {}s maximum", self.max));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.engines == 0 { bail!("--engines must be at least 1"); }
        if !(self.max_time_limit.is_finite() && self.max_time_limit > 0.0) {
            bail!("--max-time-limit must be positive");
        }
        if !(self.default_time_limit > 0.0 && self.default_time_limit <= self.max_time_limit) {
            bail!("--default-time-limit must be in (0, {}]", self.max_time_limit);
        }
        if self.engine_grace_ms == 0 { bail!("--engine-grace-ms must be positive"); }
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        let mut opts = EngineOptions::new(self.engine.clone());
        opts.args = self.engine_args.clone();
        opts.threads = self.engine_threads;
        opts.hash_mb = self.engine_hash;
        opts.grace = Duration::from_millis(self.engine_grace_ms);
        opts
    }

    pub fn time_limits(&self) -> TimeLimits {
        TimeLimits { default: self.default_time_limit, max: self.max_time_limit }
    }
}
