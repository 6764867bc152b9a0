use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    report::AuditReportWriter,
    rng::{RngManager, SystemRng},
    world::World,
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    /// Run the consistency check every this many turns; 0 disables it.
    pub audit_interval_turns: u64,
    pub report_interval_turns: u64,
    pub report_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            report_writer: AuditReportWriter::new(
                &self.settings.report_dir,
                self.settings.report_interval_turns,
            ),
            settings: self.settings,
            turn: 0,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    report_writer: AuditReportWriter,
    settings: EngineSettings,
    turn: u64,
}

/// What happened on one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    pub turn: u64,
    pub monsters: usize,
    pub items: usize,
    /// Violations found this turn; `None` when no audit ran.
    pub violations: Option<usize>,
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub turns: u64,
    pub audits: u64,
    pub violations: usize,
    pub reports_written: usize,
}

impl Engine {
    pub fn run(&mut self, world: &mut World, turns: u64) -> Result<RunSummary> {
        self.run_with_hook(world, turns, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, world: &mut World, turns: u64, mut hook: F) -> Result<RunSummary>
    where
        F: FnMut(&TurnSummary),
    {
        let mut summary = RunSummary::default();

        for _ in 0..turns {
            self.turn += 1;
            let turn = self.turn;
            for system in &mut self.systems {
                let mut rng_stream = self.rng.stream(system.name());
                let ctx = TurnContext {
                    turn,
                    scenario_name: &self.settings.scenario_name,
                };
                system
                    .run(&ctx, world, &mut rng_stream)
                    .with_context(|| format!("{} system failed on turn {turn}", system.name()))?;
            }

            let interval = self.settings.audit_interval_turns;
            let checked = (interval > 0 && turn % interval == 0)
                .then(|| world.run_consistency_check());
            if let Some(violations) = &checked {
                summary.audits += 1;
                summary.violations += violations.len();
            }

            let report = self.report_writer.maybe_write(
                turn,
                &self.settings.scenario_name,
                world,
                checked.as_deref(),
            )?;
            if report.is_some() {
                summary.reports_written += 1;
            }

            summary.turns += 1;
            hook(&TurnSummary {
                turn,
                monsters: world.monsters().len(),
                items: world.items().len(),
                violations: checked.as_ref().map(Vec::len),
                report,
            });
        }

        info!(
            scenario = %self.settings.scenario_name,
            turns = summary.turns,
            audits = summary.audits,
            violations = summary.violations,
            "run finished"
        );
        Ok(summary)
    }
}

pub struct TurnContext<'a> {
    pub turn: u64,
    pub scenario_name: &'a str,
}

/// One step of the simulation, run once per turn in registration order.
pub trait System {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &TurnContext, world: &mut World, rng: &mut SystemRng<'_>) -> Result<()>;
}
