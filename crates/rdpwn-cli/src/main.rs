mod artifacts;
mod config;
mod logging;

use artifacts::{save_canvases, write_run_report, RunReport, TargetInfo};
use clap::Parser;
use config::RunConfig;
use rdpwn_runtime::{run_replay, Outcome, ReplayReport, SessionContext, SessionTrace, DEFAULT_PORT};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    about = "Replay a recorded RDP login-screen session through the accessibility-key escalation and type commands into the resulting prompt",
    long_about = "Replay a recorded RDP login-screen session through the accessibility-key escalation and type commands into the resulting prompt.\n\nThe run is driven entirely by the --trace file; no network connection is made. --ip and --port identify the recorded target in the log and run.json.",
    version
)]
struct Args {
    /// Recorded target host, reported in run.json.
    #[arg(short = 'i', long)]
    ip: String,
    /// Recorded target port, reported in run.json.
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Save initial.bmp and final.bmp into the output directory.
    #[arg(short = 's', long)]
    save: bool,
    /// Recorded session trace that drives the run. No live connection is made.
    #[arg(long)]
    trace: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    log_level: Option<String>,
    /// Commands typed into the prompt, one per line.
    #[arg(required = true, num_args = 1..)]
    commands: Vec<String>,
}

fn main() {
    let args = Args::parse();
    match run(args) {
        Ok(summary) => print_summary(&summary),
        Err(err) => {
            eprintln!("rdpwn error: {err}");
            std::process::exit(1);
        }
    }
}

struct RunSummary {
    report: ReplayReport,
    saved: Vec<PathBuf>,
    report_path: Option<PathBuf>,
}

fn resolve_config(args: &Args) -> Result<RunConfig, String> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if args.save {
        config.output.save = true;
    }
    if let Some(dir) = &args.out_dir {
        config.output.dir = dir.clone();
    }
    if let Some(level) = &args.log_level {
        config.log.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn load_trace(path: &Path) -> Result<SessionTrace, String> {
    let src = std::fs::read_to_string(path)
        .map_err(|err| format!("read trace {}: {err}", path.display()))?;
    SessionTrace::parse(&src)
}

fn run(args: Args) -> Result<RunSummary, String> {
    let config = resolve_config(&args)?;
    logging::init_tracing(&config.log)?;

    let trace = load_trace(&args.trace)?;
    info!(ip = %args.ip, port = args.port, trace = %args.trace.display(), "starting session");
    let context = SessionContext {
        width: config.screen.width,
        height: config.screen.height,
        commands: args.commands.clone(),
        save: config.output.save,
    };
    let report = run_replay(&trace, context).map_err(|err| err.to_string())?;

    let artifacts = if config.output.save {
        save_canvases(&report, &config.output.dir)?
    } else {
        Vec::new()
    };
    let saved = artifacts.iter().map(|artifact| PathBuf::from(&artifact.path)).collect();

    let report_path = if config.output.report {
        let target = TargetInfo {
            ip: args.ip.clone(),
            port: args.port,
        };
        let mut run_report = RunReport::new(target, &args.trace, &report);
        run_report.artifacts = artifacts;
        Some(write_run_report(&run_report, &config.output.dir)?)
    } else {
        None
    };

    Ok(RunSummary {
        report,
        saved,
        report_path,
    })
}

fn print_summary(summary: &RunSummary) {
    let report = &summary.report;
    match report.outcome {
        Some(Outcome::Success { method }) => println!(
            "Prompt reached via {method}; typed {} key events",
            report.command_events_sent
        ),
        Some(Outcome::Exhausted) => println!("No prompt: escalation methods exhausted"),
        None => println!("Session ended before any method was classified"),
    }
    for attempt in &report.attempts {
        println!(
            "- {} at {}ms: ratio {:.2}",
            attempt.method, attempt.fired_at_ms, attempt.classification.ratio
        );
    }
    for path in &summary.saved {
        println!("Saved {}", path.display());
    }
    if let Some(path) = &summary.report_path {
        println!("run.json: {}", path.display());
    }
}
