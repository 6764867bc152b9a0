use crate::coord::Coord;
use crate::entity::{ItemLocation, MAX_ITEMS};
use crate::world::World;

use super::{AuditReport, Violation, ViolationKind};

/// Which cell's stack each item slot was reached from.
pub(super) struct FloorScan {
    linked_at: Vec<Option<Coord>>,
}

impl FloorScan {
    fn linked_at(&self, index: usize) -> Option<Coord> {
        self.linked_at[index]
    }
}

/// Walks every cell's stack. A slot reached twice ends the walk: from the
/// same cell it is a cycle, from another cell the two stacks share a tail.
pub(super) fn scan_stacks(world: &World, report: &mut AuditReport) -> FloorScan {
    let items = world.items();
    let mut linked_at: Vec<Option<Coord>> = vec![None; MAX_ITEMS];

    for (cell, entry) in world.grid().iter() {
        report.cells_scanned += 1;
        let mut cursor = entry.item_head;
        let mut steps = 0;

        while let Some(current) = cursor {
            if steps == MAX_ITEMS {
                report.push(
                    Violation::new(
                        ViolationKind::UnterminatedStack,
                        format!("stack still going after {MAX_ITEMS} links"),
                    )
                    .at(cell),
                );
                break;
            }
            steps += 1;

            let index = current.index() as usize;
            if !items.in_range(current) {
                report.push(
                    Violation::new(ViolationKind::StaleLink, "link past the end of the item arena")
                        .at(cell)
                        .item(current.index()),
                );
                break;
            }
            if !items.is_occupied(index) {
                report.push(
                    Violation::new(ViolationKind::FreeItemLinked, "stack links a free item slot")
                        .at(cell)
                        .item(current.index()),
                );
                break;
            }
            let Some(item) = items.get(current) else {
                report.push(
                    Violation::new(
                        ViolationKind::StaleLink,
                        format!("link generation {} is stale", current.generation()),
                    )
                    .at(cell)
                    .item(current.index()),
                );
                break;
            };

            match linked_at[index] {
                Some(seen) if seen == cell => {
                    report.push(
                        Violation::new(ViolationKind::Cycle, "stack revisits an item")
                            .at(cell)
                            .item(current.index()),
                    );
                    break;
                }
                Some(seen) => {
                    report.push(
                        Violation::new(
                            ViolationKind::DoubleLinked,
                            format!("item is also linked from {seen}"),
                        )
                        .at(cell)
                        .item(current.index()),
                    );
                    break;
                }
                None => linked_at[index] = Some(cell),
            }

            if item.quantity == 0 {
                report.push(
                    Violation::new(ViolationKind::FreeItemLinked, "stack links an empty item")
                        .at(cell)
                        .item(current.index()),
                );
            }

            if item.location != ItemLocation::Floor(cell) {
                report.push(
                    Violation::new(
                        ViolationKind::MisplacedItem,
                        format!("linked here but located at {:?}", item.location),
                    )
                    .at(cell)
                    .item(current.index()),
                );
            }
            cursor = item.next;
        }
    }

    FloorScan { linked_at }
}

/// Checks every allocated item against where it claims to be.
pub(super) fn scan_items(world: &World, floor: &FloorScan, report: &mut AuditReport) {
    let items = world.items();

    for (id, item) in items.iter() {
        report.items_scanned += 1;
        let index = id.index() as usize;

        if item.quantity == 0 {
            report.push(
                Violation::new(ViolationKind::EmptyAllocatedItem, "allocated with zero quantity")
                    .item(id.index()),
            );
        }

        match item.location {
            ItemLocation::Detached => report.push(
                Violation::new(
                    ViolationKind::UnlinkedTemporaryItem,
                    "allocated but never placed",
                )
                .item(id.index()),
            ),
            ItemLocation::Floor(cell) if !cell.in_bounds() => report.push(
                Violation::new(ViolationKind::OutOfBoundsItem, "floor position is off the map")
                    .at(cell)
                    .item(id.index()),
            ),
            ItemLocation::Floor(cell) => {
                if item.summoned {
                    report.push(
                        Violation::new(
                            ViolationKind::SummonedItemOnFloor,
                            "summoned item resting on the floor",
                        )
                        .at(cell)
                        .item(id.index()),
                    );
                }
                if floor.linked_at(index) != Some(cell) {
                    report.push(
                        Violation::new(
                            ViolationKind::UnlinkedItem,
                            "not reachable from its cell's stack",
                        )
                        .at(cell)
                        .item(id.index()),
                    );
                }
            }
            ItemLocation::Monster(holder) => {
                let monster = world
                    .monsters()
                    .in_range(holder)
                    .then(|| world.monster(holder))
                    .flatten();
                match monster {
                    None => report.push(
                        Violation::new(
                            ViolationKind::DanglingHolderReference,
                            "held by a dead or recycled monster",
                        )
                        .item(id.index())
                        .monster(holder.index()),
                    ),
                    Some(monster) if !monster.inventory.contains(&Some(id)) => report.push(
                        Violation::new(
                            ViolationKind::DanglingHolderReference,
                            "holder does not list the item",
                        )
                        .item(id.index())
                        .monster(holder.index())
                        .mid(monster.mid),
                    ),
                    Some(_) => {}
                }
            }
            ItemLocation::Player => {
                if !world.player().inventory.contains(&Some(id)) {
                    report.push(
                        Violation::new(
                            ViolationKind::DanglingHolderReference,
                            "player pack does not list the item",
                        )
                        .item(id.index())
                        .mid(world.player().mid),
                    );
                }
            }
        }
    }
}
