use std::fmt;

use serde::Serialize;

use crate::coord::Coord;
use crate::entity::Mid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Reported; the simulation may carry on.
    Recoverable,
    /// Entity identity can no longer be trusted.
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    // item stacks
    StaleLink,
    Cycle,
    UnterminatedStack,
    MisplacedItem,
    FreeItemLinked,
    DoubleLinked,
    // item records
    UnlinkedItem,
    UnlinkedTemporaryItem,
    EmptyAllocatedItem,
    OutOfBoundsItem,
    SummonedItemOnFloor,
    DanglingHolderReference,
    // monsters and cells
    StaleCellReference,
    MismatchedPosition,
    FloatingMonster,
    OutOfBoundsMonster,
    PlayerSharesCell,
    // inventories
    InventoryLocationMismatch,
    DoubleHeldItem,
    // constriction
    UnresolvedConstrictor,
    AsymmetricConstriction,
    // identity cache
    MidCacheMissing,
    MidCacheMismatch,
    DuplicateMid,
    ReservedMid,
}

impl ViolationKind {
    pub fn severity(self) -> Severity {
        match self {
            ViolationKind::MidCacheMissing
            | ViolationKind::MidCacheMismatch
            | ViolationKind::DuplicateMid
            | ViolationKind::ReservedMid => Severity::Fatal,
            _ => Severity::Recoverable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::StaleLink => "stale_link",
            ViolationKind::Cycle => "cycle",
            ViolationKind::UnterminatedStack => "unterminated_stack",
            ViolationKind::MisplacedItem => "misplaced_item",
            ViolationKind::FreeItemLinked => "free_item_linked",
            ViolationKind::DoubleLinked => "double_linked",
            ViolationKind::UnlinkedItem => "unlinked_item",
            ViolationKind::UnlinkedTemporaryItem => "unlinked_temporary_item",
            ViolationKind::EmptyAllocatedItem => "empty_allocated_item",
            ViolationKind::OutOfBoundsItem => "out_of_bounds_item",
            ViolationKind::SummonedItemOnFloor => "summoned_item_on_floor",
            ViolationKind::DanglingHolderReference => "dangling_holder_reference",
            ViolationKind::StaleCellReference => "stale_cell_reference",
            ViolationKind::MismatchedPosition => "mismatched_position",
            ViolationKind::FloatingMonster => "floating_monster",
            ViolationKind::OutOfBoundsMonster => "out_of_bounds_monster",
            ViolationKind::PlayerSharesCell => "player_shares_cell",
            ViolationKind::InventoryLocationMismatch => "inventory_location_mismatch",
            ViolationKind::DoubleHeldItem => "double_held_item",
            ViolationKind::UnresolvedConstrictor => "unresolved_constrictor",
            ViolationKind::AsymmetricConstriction => "asymmetric_constriction",
            ViolationKind::MidCacheMissing => "mid_cache_missing",
            ViolationKind::MidCacheMismatch => "mid_cache_mismatch",
            ViolationKind::DuplicateMid => "duplicate_mid",
            ViolationKind::ReservedMid => "reserved_mid",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One broken invariant, with whatever indices locate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<Coord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monster: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mid: Option<Mid>,
    pub detail: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            cell: None,
            item: None,
            monster: None,
            mid: None,
            detail: detail.into(),
        }
    }

    pub fn at(mut self, cell: Coord) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn item(mut self, index: u32) -> Self {
        self.item = Some(index);
        self
    }

    pub fn monster(mut self, index: u32) -> Self {
        self.monster = Some(index);
        self
    }

    pub fn mid(mut self, mid: Mid) -> Self {
        self.mid = Some(mid);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(cell) = self.cell {
            write!(f, " at {cell}")?;
        }
        if let Some(item) = self.item {
            write!(f, " item #{item}")?;
        }
        if let Some(monster) = self.monster {
            write!(f, " monster #{monster}")?;
        }
        if let Some(mid) = self.mid {
            write!(f, " {mid}")?;
        }
        write!(f, ": {}", self.detail)
    }
}
