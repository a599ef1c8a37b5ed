//! Headless driver for the explainer demos.
//!
//! Examples:
//!   darp-cli query 400 200
//!   darp-cli query 120 80 --k 8
//!   darp-cli run divergence --frames 600 --every 60
//!   darp-cli --seed 7 run multimodal --frames 400
//!   darp-cli --config darp.json config
//!
//! Frames go to stdout as JSON lines; logs go to stderr.

use std::io::{self, Write};
use std::process;

use darp::config::DarpConfig;
use darp::demos::{Demo, DemoKind, Divergence, Explorer, Frame, Multimodal, RenderSink};
use darp::scheduler::{Animate, FixedStepTicks, Transport};
use darp::Vec2;

fn usage() -> ! {
    eprintln!("darp-cli (nearest-neighbor demo driver)");
    eprintln!("Usage: darp-cli [--config path] [--seed n] [--verbose] <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  query <x> <y> [--k N]                       Lock an explorer query and print its frame");
    eprintln!("  run <divergence|multimodal> [--frames N] [--every N]");
    eprintln!("                                              Play an animated demo, one JSON frame per line");
    eprintln!("  config                                      Print the effective configuration");
    process::exit(1);
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    process::exit(1);
}

struct Options {
    config: Option<String>,
    seed: Option<u64>,
    verbose: bool,
}

fn parse_args() -> (Options, Vec<String>) {
    let mut opts = Options {
        config: None,
        seed: None,
        verbose: false,
    };
    let mut rest = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => opts.config = Some(args.next().unwrap_or_else(|| usage())),
            "--seed" => {
                let v = args.next().unwrap_or_else(|| usage());
                opts.seed = Some(v.parse().unwrap_or_else(|_| fail("--seed must be an unsigned integer")));
            }
            "--verbose" | "-v" => opts.verbose = true,
            "--help" | "-h" => usage(),
            _ => rest.push(arg),
        }
    }
    if rest.is_empty() {
        usage();
    }
    (opts, rest)
}

/// Value following `flag` in `args`, parsed; `default` when absent.
fn flag_value<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    match args.iter().position(|a| a == flag) {
        Some(i) => args
            .get(i + 1)
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| fail(format!("{flag} needs a numeric value"))),
        None => default,
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();
}

fn load_config(opts: &Options) -> DarpConfig {
    let mut cfg = match &opts.config {
        Some(path) => DarpConfig::load(path).unwrap_or_else(|e| fail(e)),
        None => DarpConfig::default(),
    };
    if let Some(seed) = opts.seed {
        cfg.seed = seed;
    }
    cfg
}

/// Writes each frame as one JSON line; remembers the first failure.
struct JsonLines<W: Write> {
    out: W,
    error: Option<String>,
}

impl<W: Write> RenderSink for JsonLines<W> {
    fn emit(&mut self, frame: &Frame) {
        if self.error.is_some() {
            return;
        }
        let written = serde_json::to_string(frame)
            .map_err(|e| e.to_string())
            .and_then(|line| writeln!(self.out, "{line}").map_err(|e| e.to_string()));
        if let Err(e) = written {
            self.error = Some(e);
        }
    }
}

fn query(cfg: &DarpConfig, args: &[String]) {
    if args.len() < 3 {
        usage();
    }
    let x: f32 = args[1].parse().unwrap_or_else(|_| fail("x must be a number"));
    let y: f32 = args[2].parse().unwrap_or_else(|_| fail("y must be a number"));
    let mut explorer_cfg = cfg.explorer.clone();
    explorer_cfg.neighbor_count = flag_value(args, "--k", explorer_cfg.neighbor_count);

    let mut explorer = Explorer::new(explorer_cfg, DemoKind::Explorer.rng(cfg.seed));
    explorer.click(Vec2::new(x, y));

    let mut sink = JsonLines {
        out: io::stdout().lock(),
        error: None,
    };
    explorer.render(&mut sink);
    if let Some(e) = sink.error {
        fail(e);
    }
}

fn run<D: Animate + Demo>(mut demo: D, frames: usize, every: usize) {
    let mut ticks = FixedStepTicks::new();
    let mut transport = Transport::new();
    let mut sink = JsonLines {
        out: io::stdout().lock(),
        error: None,
    };

    transport.play(&mut ticks);
    let mut n = 0usize;
    let delivered = ticks.pump(&mut demo, frames, |d| {
        n += 1;
        if n % every == 0 || n == frames {
            d.render(&mut sink);
        }
    });
    transport.pause(&mut ticks);
    tracing::debug!(kind = demo.kind().label(), delivered, "run finished");

    if let Some(e) = sink.error {
        fail(e);
    }
}

fn main() {
    let (opts, args) = parse_args();
    init_logging(opts.verbose);
    let cfg = load_config(&opts);

    match args[0].as_str() {
        "query" => query(&cfg, &args),
        "run" => {
            let kind = args
                .get(1)
                .and_then(|s| DemoKind::parse(s))
                .unwrap_or_else(|| usage());
            let frames: usize = flag_value(&args, "--frames", 300);
            let every: usize = flag_value(&args, "--every", 1).max(1);
            if !kind.is_animated() {
                fail(format!("{} is pointer-driven; use `query`", kind.label()));
            }
            match kind {
                DemoKind::Divergence => run(Divergence::from_config(&cfg), frames, every),
                DemoKind::Multimodal => run(Multimodal::from_config(&cfg), frames, every),
                DemoKind::Explorer => unreachable!("checked above"),
            }
        }
        "config" => match cfg.to_json_pretty() {
            Ok(json) => println!("{json}"),
            Err(e) => fail(e),
        },
        _ => usage(),
    }
}
