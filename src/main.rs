use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cellar::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    systems::{AttritionSystem, ConstrictionSystem, ScavengeSystem, WanderSystem},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Dungeon entity store soak runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/small_level.yaml")]
    scenario: PathBuf,

    /// Override turn count (uses scenario default when omitted)
    #[arg(long)]
    turns: Option<u64>,

    /// Override how often the consistency check runs, in turns (0 disables)
    #[arg(long)]
    audit_interval: Option<u64>,

    /// Directory for audit reports
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Override the periodic audit report interval in turns
    #[arg(long)]
    report_interval: Option<u64>,

    /// Print the final audit as JSON instead of a summary line
    #[arg(long)]
    json: bool,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    init_tracing(&scenario.logging.level);

    let mut world = scenario.build_world()?;
    let turns = scenario.turns(cli.turns);
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        audit_interval_turns: cli.audit_interval.unwrap_or(scenario.audit_interval_turns),
        report_interval_turns: cli
            .report_interval
            .unwrap_or(scenario.report_interval_turns),
        report_dir: cli.report_dir.unwrap_or_else(|| PathBuf::from("reports")),
    };

    let mut engine = EngineBuilder::new(settings)
        .with_system(WanderSystem::new(&scenario.churn))
        .with_system(ScavengeSystem::new(&scenario.churn))
        .with_system(ConstrictionSystem::new(&scenario.churn))
        .with_system(AttritionSystem::new(&scenario.churn, scenario.level.roster()))
        .build();

    let summary = engine.run(&mut world, turns)?;
    let report = world.audit();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Scenario '{}' completed {} turns: {} audits, {} violations. Final store: {} monsters, {} items",
            scenario.name,
            summary.turns,
            summary.audits,
            summary.violations,
            world.monsters().len(),
            world.items().len()
        );
    }
    Ok(())
}
