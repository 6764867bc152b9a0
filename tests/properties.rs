use std::collections::BTreeMap;

use cellar::{
    arena::{Handle, SlotArena},
    coord::Coord,
    entity::{ItemId, ItemKind, Mid, MonsterId, MonsterKind, MID_PLAYER},
    Placement, World,
};
use proptest::prelude::*;

const MONSTER_KINDS: [MonsterKind; 6] = [
    MonsterKind::Rat,
    MonsterKind::Goblin,
    MonsterKind::Orc,
    MonsterKind::Ogre,
    MonsterKind::Naga,
    MonsterKind::Anaconda,
];

/// A cramped corner of the map, so operations collide often.
fn small_cell() -> impl Strategy<Value = Coord> {
    (0i32..6, 0i32..6).prop_map(|(x, y)| Coord::new(x, y))
}

#[derive(Debug, Clone)]
enum Op {
    SpawnMonster(usize, Coord),
    SpawnItem(usize, Coord),
    PickUp(usize, usize),
    DropItem(usize, Coord),
    GiveToPlayer(usize),
    DestroyItem(usize),
    MoveMonster(usize, Coord),
    KillMonster(usize),
    DestroyMonster(usize),
    PlacePlayer(Coord),
    Constrict(usize, usize),
    Release(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..6, small_cell()).prop_map(|(k, c)| Op::SpawnMonster(k, c)),
        (0usize..10, small_cell()).prop_map(|(k, c)| Op::SpawnItem(k, c)),
        (any::<usize>(), any::<usize>()).prop_map(|(i, m)| Op::PickUp(i, m)),
        (any::<usize>(), small_cell()).prop_map(|(i, c)| Op::DropItem(i, c)),
        any::<usize>().prop_map(Op::GiveToPlayer),
        any::<usize>().prop_map(Op::DestroyItem),
        (any::<usize>(), small_cell()).prop_map(|(m, c)| Op::MoveMonster(m, c)),
        any::<usize>().prop_map(Op::KillMonster),
        any::<usize>().prop_map(Op::DestroyMonster),
        small_cell().prop_map(Op::PlacePlayer),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Constrict(a, b)),
        any::<usize>().prop_map(Op::Release),
    ]
}

fn pick_item(world: &World, pick: usize) -> Option<ItemId> {
    let handles = world.items().handles();
    (!handles.is_empty()).then(|| handles[pick % handles.len()])
}

fn pick_monster(world: &World, pick: usize) -> Option<MonsterId> {
    let handles = world.monsters().handles();
    (!handles.is_empty()).then(|| handles[pick % handles.len()])
}

/// Mids of every monster plus the player, in a stable order.
fn pick_actor(world: &World, pick: usize) -> Mid {
    let mut mids: Vec<Mid> = world
        .monsters()
        .iter()
        .map(|(_, monster)| monster.mid)
        .collect();
    mids.push(MID_PLAYER);
    mids[pick % mids.len()]
}

/// Applies one operation through the public store API. Refusals are fine;
/// the point is that whatever succeeds leaves the store consistent.
fn apply(world: &mut World, op: &Op) {
    match *op {
        Op::SpawnMonster(kind, cell) => {
            let _ = world.spawn_monster(MONSTER_KINDS[kind], cell);
        }
        Op::SpawnItem(kind, cell) => {
            let _ = world.spawn_item(ItemKind::ALL[kind], 1, Placement::Floor(cell));
        }
        Op::PickUp(item, holder) => {
            let (Some(item), Some(holder)) = (pick_item(world, item), pick_monster(world, holder))
            else {
                return;
            };
            let slot = world
                .item(item)
                .and_then(|entry| entry.kind)
                .and_then(|kind| world.monster(holder)?.free_slot_for(kind));
            if let Some(slot) = slot {
                let _ = world.move_item(item, Placement::Monster { holder, slot });
            }
        }
        Op::DropItem(item, cell) => {
            if let Some(item) = pick_item(world, item) {
                let _ = world.move_item(item, Placement::Floor(cell));
            }
        }
        Op::GiveToPlayer(item) => {
            if let Some(item) = pick_item(world, item) {
                let _ = world.move_item(item, Placement::Player);
            }
        }
        Op::DestroyItem(item) => {
            if let Some(item) = pick_item(world, item) {
                let _ = world.destroy_item(item);
            }
        }
        Op::MoveMonster(monster, cell) => {
            if let Some(monster) = pick_monster(world, monster) {
                let _ = world.move_monster(monster, cell);
            }
        }
        Op::KillMonster(monster) => {
            if let Some(monster) = pick_monster(world, monster) {
                let _ = world.kill_monster(monster);
            }
        }
        Op::DestroyMonster(monster) => {
            if let Some(monster) = pick_monster(world, monster) {
                let _ = world.destroy_monster(monster);
            }
        }
        Op::PlacePlayer(cell) => {
            let _ = world.place_player(cell);
        }
        Op::Constrict(a, b) => {
            let constrictor = pick_actor(world, a);
            let victim = pick_actor(world, b);
            let _ = world.start_constriction(constrictor, victim);
        }
        Op::Release(a) => {
            let victim = pick_actor(world, a);
            let _ = world.release_constriction(victim);
        }
    }
}

proptest! {
    #[test]
    fn successful_operations_leave_no_dangling_references(
        ops in prop::collection::vec(arb_op(), 1..120),
    ) {
        let mut world = World::new();
        for op in &ops {
            apply(&mut world, op);
        }
        let report = world.audit();
        prop_assert!(report.is_clean(), "violations after {:?}: {:?}", ops, report.violations);
    }

    #[test]
    fn free_list_never_aliases_live_slots(
        ops in prop::collection::vec((any::<bool>(), any::<usize>()), 1..200),
    ) {
        let mut arena: SlotArena<u32, 16> = SlotArena::new("prop");
        let mut live: Vec<(Handle<u32>, u32)> = Vec::new();
        let mut next_value = 1;

        for (allocate, pick) in ops {
            if allocate || live.is_empty() {
                match arena.allocate() {
                    Ok(handle) => {
                        *arena.get_mut(handle).unwrap() = next_value;
                        live.push((handle, next_value));
                        next_value += 1;
                    }
                    Err(_) => prop_assert_eq!(live.len(), 16),
                }
            } else {
                let (handle, value) = live.swap_remove(pick % live.len());
                prop_assert_eq!(arena.free(handle), value);
                prop_assert!(arena.get(handle).is_none());
            }

            for (handle, value) in &live {
                prop_assert_eq!(arena.get(*handle), Some(value));
            }
            prop_assert_eq!(arena.len(), live.len());
        }
    }

    #[test]
    fn stack_matches_pushes_in_lifo_order(
        ops in prop::collection::vec((any::<bool>(), any::<usize>()), 1..80),
    ) {
        let mut world = World::new();
        let cell = Coord::new(4, 4);
        let elsewhere = Coord::new(5, 4);
        let mut expected: Vec<ItemId> = Vec::new();

        for (push, pick) in ops {
            if push || expected.is_empty() {
                let item = world
                    .spawn_item(ItemKind::Gold, 1, Placement::Floor(cell))
                    .unwrap();
                expected.insert(0, item);
            } else {
                let item = expected.remove(pick % expected.len());
                if pick % 2 == 0 {
                    world.destroy_item(item).unwrap();
                } else {
                    world.move_item(item, Placement::Floor(elsewhere)).unwrap();
                }
            }
            prop_assert_eq!(world.items_at(cell).collect::<Vec<_>>(), expected.clone());
        }
        prop_assert!(world.audit().is_clean());
    }

    #[test]
    fn mids_resolve_for_life_and_never_again(
        ops in prop::collection::vec((any::<bool>(), any::<usize>()), 1..100),
    ) {
        let mut world = World::new();
        let mut alive: BTreeMap<Mid, MonsterId> = BTreeMap::new();
        let mut retired: Vec<Mid> = Vec::new();
        let mut column = 0;

        for (spawn, pick) in ops {
            if spawn || alive.is_empty() {
                let cell = Coord::from_index(column);
                column += 1;
                let id = world.spawn_monster(MonsterKind::Goblin, cell).unwrap();
                let mid = world.monster(id).unwrap().mid;
                prop_assert!(!retired.contains(&mid));
                alive.insert(mid, id);
            } else {
                let mid = *alive.keys().nth(pick % alive.len()).unwrap();
                let id = alive.remove(&mid).unwrap();
                world.destroy_monster(id).unwrap();
                retired.push(mid);
            }

            for (mid, id) in &alive {
                prop_assert_eq!(world.resolve_mid(*mid), Some(*id));
            }
            for mid in &retired {
                prop_assert_eq!(world.resolve_mid(*mid), None);
            }
        }
    }
}
