//! Item, monster and player records.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arena::{Handle, SlotArena};
use crate::coord::Coord;

pub const MAX_ITEMS: usize = 2000;
pub const MAX_MONSTERS: usize = 700;
/// Number of pack slots the player has.
pub const ENDOFPACK: usize = 52;

pub type ItemId = Handle<Item>;
pub type MonsterId = Handle<Monster>;
pub type ItemArena = SlotArena<Item, MAX_ITEMS>;
pub type MonsterArena = SlotArena<Monster, MAX_MONSTERS>;

/// Permanent actor identity. Issued once per monster and never reused.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Mid(pub u32);

pub const MID_NOBODY: Mid = Mid(0);
pub const MID_PLAYER: Mid = Mid(0xffff_ffff);
/// Start of the range kept back for special actors.
pub const MID_FIRST_RESERVED: Mid = Mid(0xffff_0000);

impl Mid {
    pub fn is_reserved(self) -> bool {
        self == MID_NOBODY || self >= MID_FIRST_RESERVED
    }
}

impl fmt::Display for Mid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == MID_PLAYER {
            write!(f, "mid:player")
        } else {
            write!(f, "mid:{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Weapon,
    Missile,
    Armour,
    Shield,
    Wand,
    Jewellery,
    Potion,
    Scroll,
    Misc,
    Gold,
}

impl ItemKind {
    pub const ALL: [ItemKind; 10] = [
        ItemKind::Weapon,
        ItemKind::Missile,
        ItemKind::Armour,
        ItemKind::Shield,
        ItemKind::Wand,
        ItemKind::Jewellery,
        ItemKind::Potion,
        ItemKind::Scroll,
        ItemKind::Misc,
        ItemKind::Gold,
    ];

    /// Monster inventory slots this kind of item may occupy, in preference order.
    pub fn inv_slots(self) -> &'static [InvSlot] {
        match self {
            ItemKind::Weapon => &[InvSlot::Weapon, InvSlot::AltWeapon],
            ItemKind::Missile => &[InvSlot::Missile],
            ItemKind::Armour => &[InvSlot::Armour],
            ItemKind::Shield => &[InvSlot::Shield],
            ItemKind::Wand => &[InvSlot::Wand],
            ItemKind::Jewellery => &[InvSlot::Jewellery],
            ItemKind::Potion => &[InvSlot::Potion],
            ItemKind::Scroll => &[InvSlot::Scroll],
            ItemKind::Misc => &[InvSlot::Misc],
            ItemKind::Gold => &[InvSlot::Gold],
        }
    }
}

/// Monster equipment/carry categories, one item each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvSlot {
    Weapon,
    AltWeapon,
    Missile,
    Armour,
    Shield,
    Wand,
    Jewellery,
    Potion,
    Scroll,
    Misc,
    Gold,
}

pub const NUM_INV_SLOTS: usize = 11;

impl InvSlot {
    pub const ALL: [InvSlot; NUM_INV_SLOTS] = [
        InvSlot::Weapon,
        InvSlot::AltWeapon,
        InvSlot::Missile,
        InvSlot::Armour,
        InvSlot::Shield,
        InvSlot::Wand,
        InvSlot::Jewellery,
        InvSlot::Potion,
        InvSlot::Scroll,
        InvSlot::Misc,
        InvSlot::Gold,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Where an item currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemLocation {
    /// Allocated but not placed anywhere yet.
    #[default]
    Detached,
    Floor(Coord),
    Monster(MonsterId),
    Player,
}

#[derive(Debug, Clone, Default)]
pub struct Item {
    pub kind: Option<ItemKind>,
    /// Zero only while the slot is free.
    pub quantity: u32,
    pub location: ItemLocation,
    /// Next item in the same cell's stack.
    pub next: Option<ItemId>,
    /// Summoned items vanish when dropped and should never rest on the floor.
    pub summoned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterKind {
    Rat,
    Goblin,
    Orc,
    Ogre,
    Naga,
    Anaconda,
}

impl MonsterKind {
    pub fn can_constrict(self) -> bool {
        matches!(self, MonsterKind::Naga | MonsterKind::Anaconda)
    }

    /// Whether the monster bothers picking things up.
    pub fn scavenges(self) -> bool {
        !matches!(self, MonsterKind::Rat | MonsterKind::Anaconda)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Monster {
    pub kind: Option<MonsterKind>,
    pub alive: bool,
    pub mid: Mid,
    pub position: Coord,
    pub inventory: [Option<ItemId>; NUM_INV_SLOTS],
    pub constricting: BTreeSet<Mid>,
    pub constricted_by: Option<Mid>,
}

impl Monster {
    pub fn slot(&self, slot: InvSlot) -> Option<ItemId> {
        self.inventory[slot.index()]
    }

    /// The first empty inventory slot that can take an item of `kind`.
    pub fn free_slot_for(&self, kind: ItemKind) -> Option<InvSlot> {
        kind.inv_slots()
            .iter()
            .copied()
            .find(|slot| self.inventory[slot.index()].is_none())
    }

    pub fn carried(&self) -> impl Iterator<Item = (InvSlot, ItemId)> + '_ {
        InvSlot::ALL
            .iter()
            .filter_map(|slot| self.inventory[slot.index()].map(|item| (*slot, item)))
    }

    pub fn carried_count(&self) -> usize {
        self.inventory.iter().flatten().count()
    }
}

/// The one actor that lives outside the monster arena.
#[derive(Debug, Clone)]
pub struct Player {
    pub mid: Mid,
    pub position: Option<Coord>,
    pub inventory: [Option<ItemId>; ENDOFPACK],
    pub constricting: BTreeSet<Mid>,
    pub constricted_by: Option<Mid>,
}

impl Player {
    pub fn new() -> Self {
        Self {
            mid: MID_PLAYER,
            position: None,
            inventory: [None; ENDOFPACK],
            constricting: BTreeSet::new(),
            constricted_by: None,
        }
    }

    pub fn free_pack_slot(&self) -> Option<usize> {
        self.inventory.iter().position(Option::is_none)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_slot_prefers_primary() {
        let mut monster = Monster::default();
        assert_eq!(monster.free_slot_for(ItemKind::Weapon), Some(InvSlot::Weapon));
        monster.inventory[InvSlot::Weapon.index()] = Some(Handle::from_raw(3, 0));
        assert_eq!(
            monster.free_slot_for(ItemKind::Weapon),
            Some(InvSlot::AltWeapon)
        );
        monster.inventory[InvSlot::AltWeapon.index()] = Some(Handle::from_raw(4, 0));
        assert_eq!(monster.free_slot_for(ItemKind::Weapon), None);
        assert_eq!(monster.carried_count(), 2);
    }

    #[test]
    fn test_every_kind_maps_to_slots() {
        for kind in ItemKind::ALL {
            assert!(!kind.inv_slots().is_empty());
        }
        for (position, slot) in InvSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), position);
        }
    }

    #[test]
    fn test_reserved_mids() {
        assert!(MID_NOBODY.is_reserved());
        assert!(MID_PLAYER.is_reserved());
        assert!(!Mid(1).is_reserved());
        assert_eq!(MID_PLAYER.to_string(), "mid:player");
    }
}
