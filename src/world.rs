//! The entity store: arenas, location index, identity cache and the player,
//! kept mutually consistent by the operations below.

use std::collections::BTreeSet;

use tracing::{debug, error, warn};

use crate::coord::Coord;
use crate::entity::{
    InvSlot, Item, ItemArena, ItemId, ItemKind, ItemLocation, Mid, Monster, MonsterArena,
    MonsterId, MonsterKind, Player, MID_FIRST_RESERVED, MID_PLAYER,
};
use crate::error::StoreError;
use crate::grid::LocationIndex;
use crate::mid_cache::MidCache;
use crate::stack::{self, StackIter};
use crate::validator::{self, AuditReport, Violation};

/// Where an item should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Floor(Coord),
    Monster { holder: MonsterId, slot: InvSlot },
    /// First empty pack slot.
    Player,
}

/// Read-only view of a monster or the player, looked up by mid.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub mid: Mid,
    pub position: Option<Coord>,
    pub constricting: &'a BTreeSet<Mid>,
    pub constricted_by: Option<Mid>,
}

pub struct World {
    items: ItemArena,
    monsters: MonsterArena,
    grid: LocationIndex,
    mid_cache: MidCache,
    player: Player,
    next_mid: Mid,
}

impl World {
    pub fn new() -> Self {
        Self {
            items: ItemArena::new("item"),
            monsters: MonsterArena::new("monster"),
            grid: LocationIndex::new(),
            mid_cache: MidCache::new(),
            player: Player::new(),
            next_mid: Mid(1),
        }
    }

    pub fn spawn_item(
        &mut self,
        kind: ItemKind,
        quantity: u32,
        placement: Placement,
    ) -> Result<ItemId, StoreError> {
        if quantity == 0 {
            return Err(StoreError::ZeroQuantity);
        }
        self.check_placement(Some(kind), placement)?;

        let id = self.items.allocate()?;
        let item = self.items.require_mut(id)?;
        item.kind = Some(kind);
        item.quantity = quantity;
        self.link_item(id, placement)?;
        debug!(item = ?id, ?kind, quantity, ?placement, "item spawned");
        Ok(id)
    }

    pub fn spawn_monster(
        &mut self,
        kind: MonsterKind,
        position: Coord,
    ) -> Result<MonsterId, StoreError> {
        self.check_free_cell(position, None)?;
        if self.next_mid >= MID_FIRST_RESERVED {
            return Err(StoreError::MidsExhausted);
        }

        let id = self.monsters.allocate()?;
        let mid = self.next_mid;
        let monster = self.monsters.require_mut(id)?;
        monster.kind = Some(kind);
        monster.alive = true;
        monster.mid = mid;
        monster.position = position;
        self.grid.set_monster_at(position, Some(id));
        self.mid_cache.register(mid, id);
        self.next_mid = Mid(mid.0 + 1);
        debug!(monster = ?id, %mid, ?kind, %position, "monster spawned");
        Ok(id)
    }

    /// Moves an item to `placement`. The destination is checked first, so a
    /// failed move changes nothing.
    pub fn move_item(&mut self, id: ItemId, placement: Placement) -> Result<(), StoreError> {
        let item = self.items.require(id)?;
        let kind = item.kind;
        let already_there = match placement {
            Placement::Player => item.location == ItemLocation::Player,
            Placement::Monster { holder, slot } => {
                self.monster(holder).and_then(|monster| monster.slot(slot)) == Some(id)
            }
            Placement::Floor(_) => false,
        };
        if already_there {
            return Ok(());
        }
        self.check_placement(kind, placement)?;
        self.unlink_item(id)?;
        self.link_item(id, placement)
    }

    /// Flags an item as summoned; it will vanish rather than be dropped.
    pub fn mark_summoned(&mut self, id: ItemId) -> Result<(), StoreError> {
        self.items.require_mut(id)?.summoned = true;
        Ok(())
    }

    pub fn destroy_item(&mut self, id: ItemId) -> Result<(), StoreError> {
        self.items.require(id)?;
        self.unlink_item(id)?;
        self.items.free(id);
        debug!(item = ?id, "item destroyed");
        Ok(())
    }

    /// Removes a monster. Refuses while it still carries items; see
    /// [`kill_monster`](Self::kill_monster) for the dropping variant.
    pub fn destroy_monster(&mut self, id: MonsterId) -> Result<(), StoreError> {
        let monster = self.live_monster(id)?;
        let count = monster.carried_count();
        if count > 0 {
            return Err(StoreError::MonsterHoldsItems { count });
        }
        let mid = monster.mid;
        let position = monster.position;
        let victims: Vec<Mid> = monster.constricting.iter().copied().collect();
        let constrictor = monster.constricted_by;

        for victim in victims {
            self.release_constriction(victim).ok();
        }
        if constrictor.is_some() {
            self.release_constriction(mid).ok();
        }
        if position.in_bounds() && self.grid.monster_at(position) == Some(id) {
            self.grid.set_monster_at(position, None);
        }
        if self.mid_cache.resolve(mid) == Some(id) {
            self.mid_cache.unregister(mid);
        }
        self.monsters.free(id);
        debug!(monster = ?id, %mid, "monster destroyed");
        Ok(())
    }

    /// Drops everything the monster carries onto its cell. Summoned items
    /// vanish instead of landing on the floor. Returns how many items landed.
    pub fn drop_inventory(&mut self, id: MonsterId) -> Result<usize, StoreError> {
        let monster = self.live_monster(id)?;
        let position = monster.position;
        let carried: Vec<ItemId> = monster.carried().map(|(_, item)| item).collect();

        let mut dropped = 0;
        for item in carried {
            if self.items.require(item)?.summoned {
                self.destroy_item(item)?;
            } else {
                self.move_item(item, Placement::Floor(position))?;
                dropped += 1;
            }
        }
        Ok(dropped)
    }

    pub fn kill_monster(&mut self, id: MonsterId) -> Result<(), StoreError> {
        self.drop_inventory(id)?;
        self.destroy_monster(id)
    }

    /// Moves a monster to `to` and releases any constriction it can no
    /// longer maintain from there.
    pub fn move_monster(&mut self, id: MonsterId, to: Coord) -> Result<(), StoreError> {
        let monster = self.live_monster(id)?;
        let from = monster.position;
        let mid = monster.mid;
        if from == to {
            return Ok(());
        }
        self.check_free_cell(to, Some(id))?;

        if from.in_bounds() && self.grid.monster_at(from) == Some(id) {
            self.grid.set_monster_at(from, None);
        }
        self.grid.set_monster_at(to, Some(id));
        self.monsters.require_mut(id)?.position = to;
        self.release_distant_constrictions(mid);
        Ok(())
    }

    pub fn place_player(&mut self, position: Coord) -> Result<(), StoreError> {
        if !position.in_bounds() {
            return Err(StoreError::OutOfBounds(position));
        }
        if self.monster_at(position).is_some() {
            return Err(StoreError::CellOccupied(position));
        }
        self.player.position = Some(position);
        self.release_distant_constrictions(MID_PLAYER);
        Ok(())
    }

    pub fn start_constriction(&mut self, constrictor: Mid, victim: Mid) -> Result<(), StoreError> {
        if constrictor == victim {
            return Err(StoreError::SelfConstriction(victim));
        }
        if !self.actor_exists(constrictor) {
            return Err(StoreError::UnknownActor(constrictor));
        }
        let held = self
            .actor(victim)
            .ok_or(StoreError::UnknownActor(victim))?
            .constricted_by;
        if let Some(by) = held {
            return Err(StoreError::AlreadyConstricted { victim, by });
        }

        if let Some((constricting, _)) = self.constriction_state_mut(constrictor) {
            constricting.insert(victim);
        }
        if let Some((_, constricted_by)) = self.constriction_state_mut(victim) {
            *constricted_by = Some(constrictor);
        }
        debug!(%constrictor, %victim, "constriction started");
        Ok(())
    }

    pub fn release_constriction(&mut self, victim: Mid) -> Result<(), StoreError> {
        let (_, constricted_by) = self
            .constriction_state_mut(victim)
            .ok_or(StoreError::UnknownActor(victim))?;
        let constrictor = constricted_by.take().ok_or(StoreError::NotConstricted(victim))?;

        if let Some((constricting, _)) = self.constriction_state_mut(constrictor) {
            constricting.remove(&victim);
        }
        debug!(%constrictor, %victim, "constriction released");
        Ok(())
    }

    pub fn items_at(&self, cell: Coord) -> StackIter<'_> {
        stack::iter(&self.items, &self.grid, cell)
    }

    /// The live monster standing on `cell`, if any.
    pub fn monster_at(&self, cell: Coord) -> Option<MonsterId> {
        self.grid
            .monster_at(cell)
            .filter(|id| self.monsters.in_range(*id) && self.monster(*id).is_some())
    }

    pub fn resolve_mid(&self, mid: Mid) -> Option<MonsterId> {
        let id = self
            .mid_cache
            .resolve(mid)
            .filter(|id| self.monsters.in_range(*id))?;
        self.monster(id)
            .filter(|monster| monster.mid == mid)
            .map(|_| id)
    }

    pub fn actor(&self, mid: Mid) -> Option<Actor<'_>> {
        if mid == MID_PLAYER {
            return Some(Actor {
                mid,
                position: self.player.position,
                constricting: &self.player.constricting,
                constricted_by: self.player.constricted_by,
            });
        }
        let monster = self.monster(self.resolve_mid(mid)?)?;
        Some(Actor {
            mid,
            position: Some(monster.position),
            constricting: &monster.constricting,
            constricted_by: monster.constricted_by,
        })
    }

    pub fn actor_exists(&self, mid: Mid) -> bool {
        self.actor(mid).is_some()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    /// A monster that is allocated and alive.
    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.get(id).filter(|monster| monster.alive)
    }

    pub fn next_mid(&self) -> Mid {
        self.next_mid
    }

    /// Scans the whole store. Never mutates.
    pub fn audit(&self) -> AuditReport {
        validator::audit(self)
    }

    /// Audits the store and logs every violation. A fatal violation means
    /// entity identity is corrupt: the report is dumped and the process
    /// panics.
    pub fn run_consistency_check(&self) -> Vec<Violation> {
        #[cfg(debug_assertions)]
        {
            self.items.debug_validate_invariants();
            self.monsters.debug_validate_invariants();
        }
        let report = self.audit();
        for violation in &report.violations {
            if violation.is_fatal() {
                error!(%violation, "store consistency");
            } else {
                warn!(%violation, "store consistency");
            }
        }

        if let Some(fatal) = report.violations.iter().find(|v| v.is_fatal()) {
            match serde_json::to_string_pretty(&report) {
                Ok(dump) => error!(target: "cellar::dump", "{dump}"),
                Err(err) => error!(%err, "failed to serialize audit report"),
            }
            panic!("mid cache bogosity: {fatal}");
        }
        report.violations
    }

    /// Tears the level down: every monster and every item not in the
    /// player's pack is freed. The player and the mid counter survive.
    pub fn reset_level(&mut self) {
        let doomed: Vec<ItemId> = self
            .items
            .iter()
            .filter(|(_, item)| item.location != ItemLocation::Player)
            .map(|(id, _)| id)
            .collect();
        for id in doomed {
            self.items.free(id);
        }
        self.monsters.clear();
        self.grid.clear();
        self.mid_cache.clear();
        self.player.position = None;
        self.player.constricting.clear();
        self.player.constricted_by = None;
        debug!(next_mid = %self.next_mid, "level reset");
    }

    pub fn items(&self) -> &ItemArena {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut ItemArena {
        &mut self.items
    }

    pub fn monsters(&self) -> &MonsterArena {
        &self.monsters
    }

    pub fn monsters_mut(&mut self) -> &mut MonsterArena {
        &mut self.monsters
    }

    pub fn grid(&self) -> &LocationIndex {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut LocationIndex {
        &mut self.grid
    }

    pub fn mid_cache(&self) -> &MidCache {
        &self.mid_cache
    }

    pub fn mid_cache_mut(&mut self) -> &mut MidCache {
        &mut self.mid_cache
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    fn live_monster(&self, id: MonsterId) -> Result<&Monster, StoreError> {
        self.monster(id).ok_or(StoreError::StaleHandle {
            arena: self.monsters.name(),
            index: id.index(),
            generation: id.generation(),
        })
    }

    fn check_free_cell(&self, cell: Coord, mover: Option<MonsterId>) -> Result<(), StoreError> {
        if !cell.in_bounds() {
            return Err(StoreError::OutOfBounds(cell));
        }
        let blocked = self.player.position == Some(cell)
            || self
                .monster_at(cell)
                .is_some_and(|occupant| Some(occupant) != mover);
        if blocked {
            return Err(StoreError::CellOccupied(cell));
        }
        Ok(())
    }

    fn check_placement(
        &self,
        kind: Option<ItemKind>,
        placement: Placement,
    ) -> Result<(), StoreError> {
        match placement {
            Placement::Floor(cell) if !cell.in_bounds() => Err(StoreError::OutOfBounds(cell)),
            Placement::Floor(_) => Ok(()),
            Placement::Monster { holder, slot } => {
                let monster = self.live_monster(holder)?;
                if let Some(kind) = kind {
                    if !kind.inv_slots().contains(&slot) {
                        return Err(StoreError::WrongSlot { kind, slot });
                    }
                }
                if monster.slot(slot).is_some() {
                    return Err(StoreError::SlotOccupied(slot));
                }
                Ok(())
            }
            Placement::Player => self
                .player
                .free_pack_slot()
                .map(|_| ())
                .ok_or(StoreError::PackFull),
        }
    }

    fn link_item(&mut self, id: ItemId, placement: Placement) -> Result<(), StoreError> {
        let location = match placement {
            Placement::Floor(cell) => {
                stack::push(&mut self.items, &mut self.grid, cell, id)?;
                ItemLocation::Floor(cell)
            }
            Placement::Monster { holder, slot } => {
                self.monsters.require_mut(holder)?.inventory[slot.index()] = Some(id);
                ItemLocation::Monster(holder)
            }
            Placement::Player => {
                let slot = self.player.free_pack_slot().ok_or(StoreError::PackFull)?;
                self.player.inventory[slot] = Some(id);
                ItemLocation::Player
            }
        };
        self.items.require_mut(id)?.location = location;
        Ok(())
    }

    fn unlink_item(&mut self, id: ItemId) -> Result<(), StoreError> {
        let location = self.items.require(id)?.location;
        match location {
            ItemLocation::Detached => {}
            ItemLocation::Floor(cell) => {
                stack::remove(&mut self.items, &mut self.grid, cell, id)?;
            }
            ItemLocation::Monster(holder) => match self.monsters.get_mut(holder) {
                Some(monster) => clear_references(&mut monster.inventory, id),
                None => warn!(item = ?id, holder = ?holder, "item held by a freed monster"),
            },
            ItemLocation::Player => clear_references(&mut self.player.inventory, id),
        }
        self.items.require_mut(id)?.location = ItemLocation::Detached;
        Ok(())
    }

    fn constriction_state_mut(
        &mut self,
        mid: Mid,
    ) -> Option<(&mut BTreeSet<Mid>, &mut Option<Mid>)> {
        if mid == MID_PLAYER {
            let player = &mut self.player;
            return Some((&mut player.constricting, &mut player.constricted_by));
        }
        let id = self.resolve_mid(mid)?;
        let monster = self.monsters.get_mut(id)?;
        Some((&mut monster.constricting, &mut monster.constricted_by))
    }

    fn release_distant_constrictions(&mut self, mid: Mid) {
        let Some(actor) = self.actor(mid) else {
            return;
        };
        let here = actor.position;
        let constrictor = actor.constricted_by;
        let victims: Vec<Mid> = actor.constricting.iter().copied().collect();

        let out_of_reach = |world: &World, other: Mid| {
            let there = world.actor(other).and_then(|actor| actor.position);
            match (here, there) {
                (Some(a), Some(b)) => !a.adjacent(b),
                _ => true,
            }
        };

        for victim in victims {
            if out_of_reach(self, victim) {
                self.release_constriction(victim).ok();
            }
        }
        if let Some(constrictor) = constrictor {
            if out_of_reach(self, constrictor) {
                self.release_constriction(mid).ok();
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn clear_references(slots: &mut [Option<ItemId>], id: ItemId) {
    for slot in slots.iter_mut().filter(|slot| **slot == Some(id)) {
        *slot = None;
    }
}
