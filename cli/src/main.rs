//! rmsim - run a revenue-management simulation scenario
//!
//! Loads a JSON scenario, validates it, runs the configured trials and
//! prints the summary tables as JSON. `RUST_LOG=debug` shows per-sample
//! progress.

use clap::Parser;
use rm_simulator_core_rs::{
    run_trials_parallel, DetailSink, JsonlSink, NullSink, ScenarioConfig, Simulation,
    StepRegistry,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rmsim", about = "Airline revenue-management simulator")]
struct Args {
    /// Scenario definition (JSON)
    scenario: PathBuf,

    /// Write per-DCP detail snapshots to this JSON-lines file
    /// (overrides the scenario's db.filename)
    #[arg(long)]
    details: Option<PathBuf>,

    /// Only validate the scenario, then exit
    #[arg(long)]
    validate: bool,

    /// Run trials concurrently, one worker per trial
    #[arg(long)]
    parallel: bool,
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let text = std::fs::read_to_string(&args.scenario)
        .map_err(|e| format!("cannot read {}: {}", args.scenario.display(), e))?;
    let mut config = ScenarioConfig::from_json(&text).map_err(|e| e.to_string())?;

    if let Some(details) = &args.details {
        config.db.filename = Some(details.clone());
    }

    if args.validate {
        config
            .validate(&StepRegistry::with_builtins())
            .map_err(|e| e.to_string())?;
        println!("scenario {:?} is valid", config.scenario);
        return Ok(());
    }

    let make_sink = |trial: Option<u64>| -> Result<Box<dyn DetailSink>, String> {
        match &config.db.filename {
            Some(path) => {
                let path = match trial {
                    // One file per trial in parallel mode.
                    Some(t) => path.with_extension(format!("trial{}.jsonl", t)),
                    None => path.clone(),
                };
                let sink = JsonlSink::create(&path, &config.db)
                    .map_err(|e| format!("cannot open sink {}: {}", path.display(), e))?;
                Ok(Box::new(sink))
            }
            None => Ok(Box::new(NullSink)),
        }
    };

    if args.parallel {
        let summaries = run_trials_parallel(&config, |trial| {
            make_sink(Some(trial)).unwrap_or_else(|message| {
                log::warn!("{}; details disabled for trial {}", message, trial);
                Box::new(NullSink)
            })
        })
        .map_err(|e| e.to_string())?;
        let json = serde_json::to_string_pretty(&summaries).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        let mut sim =
            Simulation::new(config.clone(), make_sink(None)?).map_err(|e| e.to_string())?;
        let summary = sim.run().map_err(|e| e.to_string())?;
        println!("{}", summary.to_json_pretty().map_err(|e| e.to_string())?);
    }

    Ok(())
}
