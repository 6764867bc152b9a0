use std::collections::BTreeSet;

use crate::entity::{ItemId, ItemLocation, Mid, MAX_ITEMS};
use crate::world::World;

use super::{AuditReport, Violation, ViolationKind};

/// Every cell that names a monster must name a live one standing there.
pub(super) fn scan_cells(world: &World, report: &mut AuditReport) {
    let monsters = world.monsters();

    for (cell, entry) in world.grid().iter() {
        let Some(id) = entry.monster else {
            continue;
        };
        if !monsters.in_range(id) {
            report.push(
                Violation::new(
                    ViolationKind::StaleCellReference,
                    "cell names a slot past the end of the monster arena",
                )
                .at(cell)
                .monster(id.index()),
            );
            continue;
        }
        match monsters.get(id) {
            None => report.push(
                Violation::new(ViolationKind::StaleCellReference, "cell names a freed monster")
                    .at(cell)
                    .monster(id.index()),
            ),
            Some(monster) if !monster.alive => report.push(
                Violation::new(ViolationKind::StaleCellReference, "cell names a dead monster")
                    .at(cell)
                    .monster(id.index())
                    .mid(monster.mid),
            ),
            Some(monster) if monster.position != cell => report.push(
                Violation::new(
                    ViolationKind::MismatchedPosition,
                    format!("monster thinks it is at {}", monster.position),
                )
                .at(cell)
                .monster(id.index())
                .mid(monster.mid),
            ),
            Some(_) => {}
        }
    }
}

pub(super) fn scan_monsters(world: &World, report: &mut AuditReport) {
    for (id, monster) in world.monsters().iter().filter(|(_, m)| m.alive) {
        report.monsters_scanned += 1;
        let mid = monster.mid;
        let position = monster.position;

        if mid.is_reserved() {
            report.push(
                Violation::new(ViolationKind::ReservedMid, "live monster carries a reserved mid")
                    .monster(id.index())
                    .mid(mid),
            );
        }

        if !position.in_bounds() {
            report.push(
                Violation::new(ViolationKind::OutOfBoundsMonster, "monster is off the map")
                    .at(position)
                    .monster(id.index())
                    .mid(mid),
            );
        } else if world.grid().monster_at(position) != Some(id) {
            report.push(
                Violation::new(ViolationKind::FloatingMonster, "its cell does not name it")
                    .at(position)
                    .monster(id.index())
                    .mid(mid),
            );
        }

        match world.mid_cache().resolve(mid) {
            None => report.push(
                Violation::new(ViolationKind::MidCacheMissing, "no cache entry for live monster")
                    .monster(id.index())
                    .mid(mid),
            ),
            Some(cached) if cached == id => {}
            Some(cached) => {
                let other_owner = world.monsters().in_range(cached)
                    && world
                        .monster(cached)
                        .is_some_and(|other| other.mid == mid);
                let kind = if other_owner {
                    ViolationKind::DuplicateMid
                } else {
                    ViolationKind::MidCacheMismatch
                };
                report.push(
                    Violation::new(kind, format!("cache resolves to slot {}", cached.index()))
                        .monster(id.index())
                        .mid(mid),
                );
            }
        }

        scan_constriction(
            world,
            mid,
            Some(id.index()),
            &monster.constricting,
            monster.constricted_by,
            report,
        );
    }
}

/// Monster and player inventories against the items they list. An item
/// listed in more than one slot, by anyone, is double held.
pub(super) fn scan_inventories(world: &World, report: &mut AuditReport) {
    let mut held = vec![false; MAX_ITEMS];

    for (id, monster) in world.monsters().iter().filter(|(_, m)| m.alive) {
        for (slot, item) in monster.carried() {
            let holder = Holder {
                location: ItemLocation::Monster(id),
                monster: Some(id.index()),
                mid: monster.mid,
                slot: format!("{slot:?}"),
            };
            check_held(world, item, &holder, &mut held, report);
        }
    }

    let player = world.player();
    for (slot, item) in player.inventory.iter().enumerate() {
        let Some(item) = item else {
            continue;
        };
        let holder = Holder {
            location: ItemLocation::Player,
            monster: None,
            mid: player.mid,
            slot: format!("pack slot {slot}"),
        };
        check_held(world, *item, &holder, &mut held, report);
    }
}

/// Every cache entry must point at a live monster carrying that mid.
pub(super) fn scan_mid_cache(world: &World, report: &mut AuditReport) {
    let monsters = world.monsters();

    for (mid, id) in world.mid_cache().iter() {
        let problem = if !monsters.in_range(id) {
            Some("entry points past the end of the monster arena".to_string())
        } else {
            match monsters.get(id) {
                None => Some("entry points at a freed slot".to_string()),
                Some(monster) if !monster.alive => Some("entry points at a dead monster".to_string()),
                Some(monster) if monster.mid != mid => {
                    Some(format!("slot now holds {}", monster.mid))
                }
                Some(_) => None,
            }
        };
        if let Some(detail) = problem {
            report.push(
                Violation::new(ViolationKind::MidCacheMismatch, detail)
                    .monster(id.index())
                    .mid(mid),
            );
        }
    }
}

pub(super) fn scan_player(world: &World, report: &mut AuditReport) {
    let player = world.player();

    if let Some(position) = player.position {
        if !position.in_bounds() {
            report.push(
                Violation::new(ViolationKind::OutOfBoundsMonster, "player is off the map")
                    .at(position)
                    .mid(player.mid),
            );
        } else if let Some(id) = world.monster_at(position) {
            report.push(
                Violation::new(ViolationKind::PlayerSharesCell, "player stands on a monster")
                    .at(position)
                    .monster(id.index())
                    .mid(player.mid),
            );
        }
    }

    scan_constriction(
        world,
        player.mid,
        None,
        &player.constricting,
        player.constricted_by,
        report,
    );
}

struct Holder {
    location: ItemLocation,
    monster: Option<u32>,
    mid: Mid,
    slot: String,
}

fn check_held(
    world: &World,
    item: ItemId,
    holder: &Holder,
    held: &mut [bool],
    report: &mut AuditReport,
) {
    let items = world.items();
    let violation = |kind, detail: String| {
        let violation = Violation::new(kind, detail)
            .item(item.index())
            .mid(holder.mid);
        match holder.monster {
            Some(index) => violation.monster(index),
            None => violation,
        }
    };

    if !items.in_range(item) {
        report.push(violation(
            ViolationKind::InventoryLocationMismatch,
            format!("{} names a slot past the end of the item arena", holder.slot),
        ));
        return;
    }
    let Some(entry) = items.get(item) else {
        // a stale handle does not claim the slot's current occupant
        report.push(violation(
            ViolationKind::InventoryLocationMismatch,
            format!("{} holds a freed item", holder.slot),
        ));
        return;
    };
    if entry.location != holder.location {
        report.push(violation(
            ViolationKind::InventoryLocationMismatch,
            format!("{} holds an item located at {:?}", holder.slot, entry.location),
        ));
    }

    let index = item.index() as usize;
    if held[index] {
        report.push(violation(
            ViolationKind::DoubleHeldItem,
            format!("{} lists an item already held elsewhere", holder.slot),
        ));
    }
    held[index] = true;
}

fn scan_constriction(
    world: &World,
    mid: Mid,
    monster: Option<u32>,
    constricting: &BTreeSet<Mid>,
    constricted_by: Option<Mid>,
    report: &mut AuditReport,
) {
    let violation = |kind, detail: String| {
        let violation = Violation::new(kind, detail).mid(mid);
        match monster {
            Some(index) => violation.monster(index),
            None => violation,
        }
    };

    if let Some(by) = constricted_by {
        match world.actor(by) {
            None => report.push(violation(
                ViolationKind::UnresolvedConstrictor,
                format!("constrictor {by} does not exist"),
            )),
            Some(constrictor) if !constrictor.constricting.contains(&mid) => {
                report.push(violation(
                    ViolationKind::AsymmetricConstriction,
                    format!("constrictor {by} does not list it"),
                ))
            }
            Some(_) => {}
        }
    }

    for &victim in constricting {
        let held_by_us = world
            .actor(victim)
            .is_some_and(|actor| actor.constricted_by == Some(mid));
        if !held_by_us {
            report.push(violation(
                ViolationKind::AsymmetricConstriction,
                format!("victim {victim} is not held by it"),
            ));
        }
    }
}
