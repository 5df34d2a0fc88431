use clap::Parser;
use generator::profile::{build_scenario, ScenarioConfig};
use report::model::RunReport;
use report::writer::{render_summary, write_report};
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::inputs::load_inputs;
use workflow::runner::Runner;

mod generator;
mod parsers;
mod report;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Detector time-to-detect validation driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Evaluate a seeded synthetic flyby instead of log files
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 60.0)]
    window: f64,
    #[arg(long, default_value_t = 600.0)]
    gap: f64,
    #[arg(long, default_value_t = 15.0)]
    max_time_deviation: f64,
    /// Where the JSON report is written
    #[arg(long, default_value = "tools/data/time_to_detect.json")]
    report: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        let config = WorkflowConfig::from_args(args.window, args.gap, args.max_time_deviation);
        config.check()?;
        config
    };

    let (inputs, tallies) = if args.synthetic {
        let scenario = ScenarioConfig {
            seed: args.seed,
            ..Default::default()
        };
        (build_scenario(&scenario, workflow_config.detector.fov)?, Vec::new())
    } else {
        if workflow_config.inputs.is_empty() {
            anyhow::bail!("no input logs configured; pass --workflow or --synthetic");
        }
        load_inputs(&workflow_config)?
    };

    let runner = Runner::new(workflow_config.clone());
    let result = runner.execute(&inputs)?;
    let report = RunReport::new(runner.config(), tallies, result);

    print!("{}", render_summary(&report));
    write_report(&args.report, &report)?;

    Ok(())
}
