use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::validator::Violation;
use crate::world::World;

/// One audit written to disk.
#[derive(Debug, Serialize)]
pub struct AuditRecord<'a> {
    pub scenario: &'a str,
    pub turn: u64,
    pub written_at: DateTime<Utc>,
    pub monsters: usize,
    pub items: usize,
    pub clean: bool,
    pub violations: &'a [Violation],
}

/// Writes `<dir>/<scenario>/turn_NNNNNN.json` every `interval` turns, and
/// on any turn whose audit found something.
pub struct AuditReportWriter {
    dir: PathBuf,
    interval: u64,
}

impl AuditReportWriter {
    pub fn new(dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval,
        }
    }

    /// `checked` holds this turn's audit result, if one ran. When a report
    /// is due on a turn without one, a fresh audit is taken.
    pub fn maybe_write(
        &self,
        turn: u64,
        scenario: &str,
        world: &World,
        checked: Option<&[Violation]>,
    ) -> Result<Option<PathBuf>> {
        let due = self.interval > 0 && turn % self.interval == 0;
        let dirty = checked.is_some_and(|violations| !violations.is_empty());
        if !due && !dirty {
            return Ok(None);
        }

        let path = match checked {
            Some(violations) => self.write(turn, scenario, world, violations)?,
            None => self.write(turn, scenario, world, &world.audit().violations)?,
        };
        Ok(Some(path))
    }

    pub fn write(
        &self,
        turn: u64,
        scenario: &str,
        world: &World,
        violations: &[Violation],
    ) -> Result<PathBuf> {
        let dir = self.dir.join(scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;

        let record = AuditRecord {
            scenario,
            turn,
            written_at: Utc::now(),
            monsters: world.monsters().len(),
            items: world.items().len(),
            clean: violations.is_empty(),
            violations,
        };
        let path = dir.join(format!("turn_{turn:06}.json"));
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write audit report {}", path.display()))?;
        info!(path = %path.display(), violations = violations.len(), "audit report written");
        Ok(path)
    }
}
