use piechess_server::stub::{StubEngine, StubMode};

#[derive(clap::Parser, Debug)]
#[command(name = "uci-stub", about = "Minimal UCI responder: plays the first legal move, scores by material")]
struct Args {
    /// Answer `go` only after `stop`
    #[arg(long, default_value_t = false, conflicts_with = "deaf")]
    stall: bool,
    /// Never answer `go`
    #[arg(long, default_value_t = false)]
    deaf: bool,
}

fn main() -> anyhow::Result<()> {
    use clap::Parser;
    let args = Args::parse();
    let mode = if args.deaf { StubMode::Deaf } else if args.stall { StubMode::Stall } else { StubMode::Prompt };
    StubEngine::new(mode).run_loop()?;
    Ok(())
}
