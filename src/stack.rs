//! Intrusive per-cell item stacks, threaded through `Item::next`.

use tracing::warn;

use crate::coord::Coord;
use crate::entity::{ItemArena, ItemId, MAX_ITEMS};
use crate::error::StoreError;
use crate::grid::LocationIndex;

/// Puts `item` on top of the stack at `cell`.
pub fn push(
    items: &mut ItemArena,
    grid: &mut LocationIndex,
    cell: Coord,
    item: ItemId,
) -> Result<(), StoreError> {
    debug_assert!(
        !contains(items, grid, cell, item),
        "item {item:?} pushed twice onto {cell}"
    );
    let head = grid.item_stack_head(cell);
    items.require_mut(item)?.next = head;
    grid.set_item_stack_head(cell, Some(item));
    debug_assert_eq!(grid.item_stack_head(cell), Some(item));
    Ok(())
}

/// Splices `item` out of the stack at `cell`. An item that is not in the
/// stack is a caller bug: it is logged and nothing changes.
pub fn remove(
    items: &mut ItemArena,
    grid: &mut LocationIndex,
    cell: Coord,
    item: ItemId,
) -> Result<(), StoreError> {
    let mut prev: Option<ItemId> = None;
    let mut cursor = grid.item_stack_head(cell);
    let mut steps = 0;

    while let Some(current) = cursor {
        if steps >= MAX_ITEMS {
            break;
        }
        steps += 1;
        let Some(entry) = items.get(current) else {
            break;
        };
        let next = entry.next;
        if current == item {
            match prev {
                None => grid.set_item_stack_head(cell, next),
                Some(prev) => items.require_mut(prev)?.next = next,
            }
            items.require_mut(item)?.next = None;
            debug_assert!(!contains(items, grid, cell, item));
            return Ok(());
        }
        prev = Some(current);
        cursor = next;
    }

    warn!(item = ?item, %cell, "removing item that is not in the stack");
    Err(StoreError::NotInStack {
        item: item.index(),
        cell,
    })
}

pub fn contains(items: &ItemArena, grid: &LocationIndex, cell: Coord, item: ItemId) -> bool {
    iter(items, grid, cell).any(|linked| linked == item)
}

pub fn iter<'a>(items: &'a ItemArena, grid: &LocationIndex, cell: Coord) -> StackIter<'a> {
    StackIter {
        items,
        next: grid.item_stack_head(cell),
        remaining: MAX_ITEMS,
    }
}

/// Walks a stack top to bottom. Stops at a stale link, and after at most
/// `MAX_ITEMS` steps so a corrupted (cyclic) stack cannot hang the caller.
/// The validator reports both conditions; this iterator only refuses to loop.
pub struct StackIter<'a> {
    items: &'a ItemArena,
    next: Option<ItemId>,
    remaining: usize,
}

impl Iterator for StackIter<'_> {
    type Item = ItemId;

    fn next(&mut self) -> Option<ItemId> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        let item = self.items.get(current)?;
        self.remaining -= 1;
        self.next = item.next;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ItemKind;

    fn spawn(items: &mut ItemArena) -> ItemId {
        let id = items.allocate().unwrap();
        let item = items.get_mut(id).unwrap();
        item.kind = Some(ItemKind::Gold);
        item.quantity = 1;
        id
    }

    #[test]
    fn test_push_is_lifo() {
        let mut items = ItemArena::new("item");
        let mut grid = LocationIndex::new();
        let cell = Coord::new(2, 2);
        let a = spawn(&mut items);
        let b = spawn(&mut items);
        let c = spawn(&mut items);
        for id in [a, b, c] {
            push(&mut items, &mut grid, cell, id).unwrap();
        }
        assert_eq!(iter(&items, &grid, cell).collect::<Vec<_>>(), vec![c, b, a]);
    }

    #[test]
    fn test_remove_head_middle_and_tail() {
        let mut items = ItemArena::new("item");
        let mut grid = LocationIndex::new();
        let cell = Coord::new(2, 2);
        let ids: Vec<_> = (0..4).map(|_| spawn(&mut items)).collect();
        for id in &ids {
            push(&mut items, &mut grid, cell, *id).unwrap();
        }

        remove(&mut items, &mut grid, cell, ids[2]).unwrap();
        remove(&mut items, &mut grid, cell, ids[3]).unwrap();
        remove(&mut items, &mut grid, cell, ids[0]).unwrap();
        assert_eq!(iter(&items, &grid, cell).collect::<Vec<_>>(), vec![ids[1]]);
        assert_eq!(items.get(ids[0]).unwrap().next, None);
    }

    #[test]
    fn test_remove_missing_item_is_noop() {
        let mut items = ItemArena::new("item");
        let mut grid = LocationIndex::new();
        let cell = Coord::new(2, 2);
        let a = spawn(&mut items);
        let stray = spawn(&mut items);
        push(&mut items, &mut grid, cell, a).unwrap();

        let err = remove(&mut items, &mut grid, cell, stray).unwrap_err();
        assert_eq!(
            err,
            StoreError::NotInStack {
                item: stray.index(),
                cell
            }
        );
        assert_eq!(iter(&items, &grid, cell).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_iteration_is_capped_on_cycle() {
        let mut items = ItemArena::new("item");
        let mut grid = LocationIndex::new();
        let cell = Coord::new(0, 0);
        let a = spawn(&mut items);
        let b = spawn(&mut items);
        push(&mut items, &mut grid, cell, a).unwrap();
        push(&mut items, &mut grid, cell, b).unwrap();
        items.get_mut(a).unwrap().next = Some(b);

        assert_eq!(iter(&items, &grid, cell).count(), MAX_ITEMS);
    }
}
