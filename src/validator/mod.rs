//! Read-only consistency audit of the entity store.
//!
//! The audit walks every cell stack, every allocated item, every live
//! monster, the identity cache and the player, and collects each broken
//! invariant it finds. It never repairs anything.

mod items;
mod monsters;
mod violation;

use serde::Serialize;

use crate::world::World;

pub use violation::{Severity, Violation, ViolationKind};

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub violations: Vec<Violation>,
    pub items_scanned: usize,
    pub monsters_scanned: usize,
    pub cells_scanned: usize,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.violations.iter().any(Violation::is_fatal)
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn contains(&self, kind: ViolationKind) -> bool {
        self.count(kind) > 0
    }

    pub(crate) fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }
}

pub fn audit(world: &World) -> AuditReport {
    let mut report = AuditReport::default();

    let floor = items::scan_stacks(world, &mut report);
    items::scan_items(world, &floor, &mut report);
    monsters::scan_cells(world, &mut report);
    monsters::scan_monsters(world, &mut report);
    monsters::scan_inventories(world, &mut report);
    monsters::scan_mid_cache(world, &mut report);
    monsters::scan_player(world, &mut report);

    report
}
