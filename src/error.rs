use thiserror::Error;

use crate::coord::Coord;
use crate::entity::{InvSlot, ItemKind, Mid};

/// Failures reported by store operations. None of them leave the store in a
/// partially updated state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{arena} arena is full ({capacity} slots)")]
    OutOfCapacity {
        arena: &'static str,
        capacity: usize,
    },
    #[error("stale {arena} handle: slot {index} generation {generation}")]
    StaleHandle {
        arena: &'static str,
        index: u32,
        generation: u32,
    },
    #[error("{0} is outside the map")]
    OutOfBounds(Coord),
    #[error("cell {0} is already occupied")]
    CellOccupied(Coord),
    #[error("items must have a positive quantity")]
    ZeroQuantity,
    #[error("inventory slot {0:?} is already in use")]
    SlotOccupied(InvSlot),
    #[error("{kind:?} cannot be carried in slot {slot:?}")]
    WrongSlot { kind: ItemKind, slot: InvSlot },
    #[error("the player's pack is full")]
    PackFull,
    #[error("item slot {item} is not in the stack at {cell}")]
    NotInStack { item: u32, cell: Coord },
    #[error("monster still holds {count} item(s)")]
    MonsterHoldsItems { count: usize },
    #[error("no monster ids left to issue")]
    MidsExhausted,
    #[error("no live actor with mid {0}")]
    UnknownActor(Mid),
    #[error("{victim} is already constricted by {by}")]
    AlreadyConstricted { victim: Mid, by: Mid },
    #[error("{0} cannot constrict itself")]
    SelfConstriction(Mid),
    #[error("{0} is not constricted")]
    NotConstricted(Mid),
}
